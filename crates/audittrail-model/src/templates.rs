//! Predefined file batch templates

use crate::batch::CreateFileBatchRequest;

/// A named starting point for a new file batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTemplate {
    /// Stable template id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// What the template is for
    pub description: &'static str,
    /// Pre-filled label
    pub label: &'static str,
    /// Pre-filled file types
    pub file_types: &'static str,
    /// Pre-filled batch description
    pub batch_description: &'static str,
}

impl BatchTemplate {
    /// Look up a template by id
    #[must_use]
    pub fn find(id: &str) -> Option<&'static BatchTemplate> {
        BATCH_TEMPLATES.iter().find(|t| t.id == id)
    }

    /// Create request pre-filled from this template
    #[must_use]
    pub fn to_request(&self, file_count: u32) -> CreateFileBatchRequest {
        CreateFileBatchRequest::from_form(
            self.label,
            file_count,
            self.file_types,
            self.batch_description,
        )
    }
}

/// Built-in templates, in display order
pub const BATCH_TEMPLATES: &[BatchTemplate] = &[
    BatchTemplate {
        id: "usb-file-copy",
        name: "USB File Copy",
        description: "Files copied to/from USB storage device",
        label: "USB File Copy",
        file_types: ".pdf, .docx, .xlsx, .pptx, .txt",
        batch_description: "Files copied to/from USB storage device",
    },
    BatchTemplate {
        id: "email-attachments",
        name: "Email Attachments",
        description: "Attachments extracted from email messages",
        label: "Email Attachments",
        file_types: ".pdf, .docx, .xlsx, .zip, .msg",
        batch_description: "Attachments extracted from email messages",
    },
    BatchTemplate {
        id: "network-transfer",
        name: "Network Transfer",
        description: "Files transferred via network share or mapped drive",
        label: "Network File Transfer",
        file_types: ".pdf, .docx, .xlsx, .csv",
        batch_description: "Files transferred via network share or mapped drive",
    },
    BatchTemplate {
        id: "print-job",
        name: "Print Job",
        description: "Documents sent to printer",
        label: "Print Job",
        file_types: ".pdf, .docx",
        batch_description: "Documents sent to printer",
    },
    BatchTemplate {
        id: "cloud-upload",
        name: "Cloud Upload",
        description: "Files uploaded to cloud storage service",
        label: "Cloud Upload",
        file_types: ".pdf, .docx, .xlsx, .zip",
        batch_description: "Files uploaded to cloud storage service",
    },
    BatchTemplate {
        id: "custom",
        name: "Custom",
        description: "Create a custom file batch from scratch",
        label: "",
        file_types: "",
        batch_description: "",
    },
];
