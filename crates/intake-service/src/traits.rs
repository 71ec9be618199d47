use async_trait::async_trait;
use intake_core::{IntakeError, Submission, SubmitReceipt};

/// The remote end of the form.
///
/// `HttpSubmitter` posts to the real endpoint; tests substitute their own
/// implementations to script delays and failures.
#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Deliver one submission. Implementations make exactly one attempt.
    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, IntakeError>;
}
