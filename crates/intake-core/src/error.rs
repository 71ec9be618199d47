use std::time::Duration;

use thiserror::Error;

use crate::attachment::AttachmentRejection;
use crate::form::{FieldErrors, FormField};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("please correct {} highlighted field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("attachment rejected: {0}")]
    AttachmentRejected(AttachmentRejection),

    #[error("the access link is invalid or has expired")]
    TokenInvalid,

    #[error("the request timed out after {0:?}, please try again")]
    NetworkTimeout(Duration),

    #[error("could not reach the server: {0}")]
    NetworkFailure(String),

    /// Non-2xx response. Displays as the extracted server message only.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("a submission is already in progress")]
    Busy,

    #[error("{} is read-only", .0.display_name())]
    ReadOnly(FormField),

    #[error("could not read attachment: {0}")]
    Attachment(String),
}

impl IntakeError {
    /// The inline field errors, when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            IntakeError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
