mod blocking;
pub mod flow;
mod http;
mod traits;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use blocking::BlockingHttpSubmitter;
pub use flow::submit_form;
pub use http::{extract_error_message, HttpSubmitter};
pub use traits::SubmissionService;
