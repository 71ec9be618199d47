use std::time::Duration;

use intake_core::{FormController, IntakeError, Submission, SubmitReceipt};
use tokio::runtime::Runtime;

use crate::{flow, HttpSubmitter, SubmissionService};

/// Blocking wrapper around the async `HttpSubmitter`.
///
/// Creates an internal tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpSubmitter {
    inner: HttpSubmitter,
    rt: Runtime,
}

impl BlockingHttpSubmitter {
    pub fn new(base_url: &str) -> std::io::Result<Self> {
        Self::from_inner(HttpSubmitter::new(base_url))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> std::io::Result<Self> {
        Self::from_inner(HttpSubmitter::new(base_url).with_timeout(timeout))
    }

    fn from_inner(inner: HttpSubmitter) -> std::io::Result<Self> {
        Ok(Self {
            inner,
            rt: Runtime::new()?,
        })
    }

    pub fn endpoint(&self) -> String {
        self.inner.endpoint()
    }

    pub fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, IntakeError> {
        self.rt.block_on(self.inner.submit(submission))
    }

    /// Run the controller's full submit flow against the endpoint.
    pub fn submit_form(&self, controller: &mut FormController) -> Result<SubmitReceipt, IntakeError> {
        self.rt.block_on(flow::submit_form(controller, &self.inner))
    }
}
