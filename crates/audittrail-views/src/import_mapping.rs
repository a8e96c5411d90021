//! Column mapping for spreadsheet import

use crate::error::{FormError, FormResult};
use audittrail_model::{ColumnMappingRequest, ImportUploadResponse};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event field a spreadsheet column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportField {
    /// `event_date`
    EventDate,
    /// `event_time`
    EventTime,
    /// `event_type`
    EventType,
    /// `file_name`
    FileName,
    /// `file_count`
    FileCount,
    /// `file_description`
    FileDescription,
    /// `file_type`
    FileType,
}

impl ImportField {
    /// All targets, in menu order
    pub const ALL: [ImportField; 7] = [
        ImportField::EventDate,
        ImportField::EventTime,
        ImportField::EventType,
        ImportField::FileName,
        ImportField::FileCount,
        ImportField::FileDescription,
        ImportField::FileType,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportField::EventDate => "event_date",
            ImportField::EventTime => "event_time",
            ImportField::EventType => "event_type",
            ImportField::FileName => "file_name",
            ImportField::FileCount => "file_count",
            ImportField::FileDescription => "file_description",
            ImportField::FileType => "file_type",
        }
    }

    /// Menu label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ImportField::EventDate => "Event Date",
            ImportField::EventTime => "Event Time",
            ImportField::EventType => "Event Type",
            ImportField::FileName => "File Name",
            ImportField::FileCount => "File Count",
            ImportField::FileDescription => "File Description",
            ImportField::FileType => "File Type",
        }
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImportField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| FormError::UnknownEventField(s.to_string()))
    }
}

/// Header → target assignment for one uploaded sheet
///
/// Every header starts skipped. Skipped headers are left out of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapper {
    session_id: String,
    mappings: IndexMap<String, Option<ImportField>>,
}

impl ColumnMapper {
    /// Mapper over the headers of an upload
    #[must_use]
    pub fn new(upload: &ImportUploadResponse) -> Self {
        Self {
            session_id: upload.session_id.clone(),
            mappings: upload.headers.iter().map(|h| (h.clone(), None)).collect(),
        }
    }

    /// Assign a header, or skip it with `None`
    pub fn assign(&mut self, header: &str, target: Option<ImportField>) -> FormResult<()> {
        let slot = self
            .mappings
            .get_mut(header)
            .ok_or_else(|| FormError::UnknownColumn(header.to_string()))?;
        *slot = target;
        Ok(())
    }

    /// Target of a header
    #[must_use]
    pub fn target(&self, header: &str) -> Option<ImportField> {
        self.mappings.get(header).copied().flatten()
    }

    /// Some column feeds `event_date`
    #[must_use]
    pub fn has_date_mapping(&self) -> bool {
        self.mappings.values().any(|t| *t == Some(ImportField::EventDate))
    }

    /// Number of non-skipped columns
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.mappings.values().filter(|t| t.is_some()).count()
    }

    /// Validation request; fails without a date mapping
    pub fn to_request(&self) -> FormResult<ColumnMappingRequest> {
        if !self.has_date_mapping() {
            return Err(FormError::MissingDateMapping);
        }
        let mappings = self
            .mappings
            .iter()
            .filter_map(|(header, target)| target.map(|t| (header.clone(), t.as_str().to_string())))
            .collect();
        Ok(ColumnMappingRequest {
            session_id: self.session_id.clone(),
            mappings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upload() -> ImportUploadResponse {
        ImportUploadResponse {
            session_id: "s-1".into(),
            filename: "events.xlsx".into(),
            headers: vec!["Date".into(), "Name".into(), "Notes".into()],
            row_count: 4,
            preview_rows: Vec::new(),
        }
    }

    #[test]
    fn starts_all_skipped() {
        let mapper = ColumnMapper::new(&upload());
        assert_eq!(mapper.active_count(), 0);
        assert_eq!(mapper.to_request(), Err(FormError::MissingDateMapping));
    }

    #[test]
    fn skipped_columns_are_not_sent() {
        let mut mapper = ColumnMapper::new(&upload());
        mapper.assign("Date", Some(ImportField::EventDate)).unwrap();
        mapper.assign("Name", Some(ImportField::FileName)).unwrap();
        mapper.assign("Name", Some(ImportField::FileName)).unwrap();

        let request = mapper.to_request().unwrap();
        assert_eq!(request.session_id, "s-1");
        let pairs: Vec<_> = request.mappings.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, vec![("Date", "event_date"), ("Name", "file_name")]);
    }

    #[test]
    fn unknown_header_is_rejected() {
        let mut mapper = ColumnMapper::new(&upload());
        assert_eq!(
            mapper.assign("Missing", Some(ImportField::EventDate)),
            Err(FormError::UnknownColumn("Missing".into()))
        );
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("file_count".parse::<ImportField>(), Ok(ImportField::FileCount));
        assert!("__skip__".parse::<ImportField>().is_err());
    }
}
