//! Server-assigned identifiers
//!
//! Ids are opaque strings on the wire. An empty id is representable on
//! purpose: it stands for "not known yet" and disables dependent reads.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id
            #[inline]
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Raw id text
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when no id has been assigned yet
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Case identifier
    CaseId
);
string_id!(
    /// Timeline event identifier
    EventId
);
string_id!(
    /// File batch identifier
    BatchId
);
string_id!(
    /// User identifier
    UserId
);
string_id!(
    /// Audit type identifier
    AuditTypeId
);
string_id!(
    /// Issue-tracker field mapping identifier
    MappingId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_transparently() {
        let id = CaseId::new("c-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c-1\"");
        let back: CaseId = serde_json::from_str("\"c-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn default_id_is_empty() {
        assert!(EventId::default().is_empty());
        assert!(!EventId::from("e").is_empty());
    }
}
