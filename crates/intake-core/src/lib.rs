pub mod attachment;
pub mod controller;
pub mod error;
pub mod form;
pub mod submission;

pub use attachment::{AttachmentRef, DocumentType};
pub use controller::FormController;
pub use error::IntakeError;
pub use form::{FieldErrors, FormField, FormRecord};
pub use submission::{FormContext, Submission, SubmissionOutcome, SubmissionState, SubmitReceipt};
