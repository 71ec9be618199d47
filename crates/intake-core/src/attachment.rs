use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// Largest accepted upload: 10 MiB, inclusive.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Document formats the endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Doc,
    Docx,
    PlainText,
    Jpeg,
    Png,
}

impl DocumentType {
    pub const ALL: &[DocumentType] = &[
        DocumentType::Pdf,
        DocumentType::Doc,
        DocumentType::Docx,
        DocumentType::PlainText,
        DocumentType::Jpeg,
        DocumentType::Png,
    ];

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "application/pdf",
            DocumentType::Doc => "application/msword",
            DocumentType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentType::PlainText => "text/plain",
            DocumentType::Jpeg => "image/jpeg",
            DocumentType::Png => "image/png",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "PDF",
            DocumentType::Doc => "Word (.doc)",
            DocumentType::Docx => "Word (.docx)",
            DocumentType::PlainText => "Text",
            DocumentType::Jpeg => "JPEG",
            DocumentType::Png => "PNG",
        }
    }

    /// Exact MIME match, ignoring parameters such as `; charset=utf-8`.
    pub fn from_mime(s: &str) -> Option<Self> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        DocumentType::ALL
            .iter()
            .copied()
            .find(|t| t.mime().eq_ignore_ascii_case(essence))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentType::Pdf),
            "doc" => Some(DocumentType::Doc),
            "docx" => Some(DocumentType::Docx),
            "txt" => Some(DocumentType::PlainText),
            "jpg" | "jpeg" => Some(DocumentType::Jpeg),
            "png" => Some(DocumentType::Png),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Why a selected file was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentRejection {
    UnsupportedType(String),
    TooLarge(u64),
}

impl fmt::Display for AttachmentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentRejection::UnsupportedType(mime) if mime.is_empty() => {
                f.write_str("unsupported file type; use PDF, Word, text, JPEG or PNG")
            }
            AttachmentRejection::UnsupportedType(mime) => write!(
                f,
                "unsupported file type {mime}; use PDF, Word, text, JPEG or PNG"
            ),
            AttachmentRejection::TooLarge(size) => write!(
                f,
                "file is {:.1} MiB, the limit is 10 MiB",
                *size as f64 / (1024.0 * 1024.0)
            ),
        }
    }
}

/// The single optional document attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub name: String,
    pub content_type: String,
    size_bytes: u64,
    data: Bytes,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size_bytes: data.len() as u64,
            data,
        }
    }

    /// Always `data().len()`.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Type and size constraints. Both are checked on selection only.
    pub fn check(&self) -> Result<DocumentType, AttachmentRejection> {
        check_constraints(&self.content_type, self.size_bytes)
    }

    /// Load a file from disk, inferring the MIME type from its extension.
    ///
    /// Oversized or unsupported files are rejected from metadata alone,
    /// before any bytes are read.
    pub fn from_path(path: &Path) -> Result<Self, IntakeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| IntakeError::Attachment(format!("{} is not a file", path.display())))?;
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentType::from_extension)
            .map(|t| t.mime().to_string())
            .unwrap_or_default();

        let meta = std::fs::metadata(path)
            .map_err(|e| IntakeError::Attachment(format!("{}: {e}", path.display())))?;
        if !meta.is_file() {
            return Err(IntakeError::Attachment(format!(
                "{} is not a file",
                path.display()
            )));
        }
        check_constraints(&content_type, meta.len()).map_err(IntakeError::AttachmentRejected)?;

        let data = std::fs::read(path)
            .map_err(|e| IntakeError::Attachment(format!("{}: {e}", path.display())))?;
        Ok(Self::new(name, content_type, Bytes::from(data)))
    }
}

pub fn check_constraints(content_type: &str, size_bytes: u64) -> Result<DocumentType, AttachmentRejection> {
    let doc_type = DocumentType::from_mime(content_type)
        .ok_or_else(|| AttachmentRejection::UnsupportedType(content_type.to_string()))?;
    if size_bytes > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentRejection::TooLarge(size_bytes));
    }
    Ok(doc_type)
}
