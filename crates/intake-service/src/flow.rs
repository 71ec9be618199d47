//! The submit operation: controller preconditions, one delivery attempt,
//! and a cleanup path that always lands the controller back in `Idle`.

use intake_core::{FormController, IntakeError, SubmitReceipt};
use tracing::{debug, info};

use crate::SubmissionService;

/// Holds the controller while a request is in flight. If the submit future
/// is dropped before settling, `Drop` puts the controller back in `Idle`.
struct InFlight<'a> {
    controller: &'a mut FormController,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(controller: &'a mut FormController) -> Self {
        Self {
            controller,
            settled: false,
        }
    }

    fn settle(
        mut self,
        result: Result<SubmitReceipt, IntakeError>,
    ) -> Result<SubmitReceipt, IntakeError> {
        self.settled = true;
        self.controller.finish_submit(result)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("submission dropped before completion");
            self.controller.abort_submit();
        }
    }
}

/// Validate, send once, and apply the result to `controller`.
///
/// No network call is made when the token is marked invalid, the record
/// fails validation, or another submission is in flight.
pub async fn submit_form<S>(
    controller: &mut FormController,
    service: &S,
) -> Result<SubmitReceipt, IntakeError>
where
    S: SubmissionService + ?Sized,
{
    let submission = controller.begin_submit()?;
    let fields: Vec<&str> = submission.record.fields().map(|(k, _)| k).collect();
    info!(
        "submitting fields {fields:?} (attachment: {}, missing fields: {})",
        submission.attachment.is_some(),
        submission.missing_fields.len()
    );

    let guard = InFlight::new(controller);
    let result = service.submit(&submission).await;
    guard.settle(result)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use intake_core::{FormContext, FormField, Submission, SubmissionState};

    use super::*;

    enum Script {
        Accept,
        Reject(u16, &'static str),
        Hang,
    }

    struct ScriptedService {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubmissionService for ScriptedService {
        async fn submit(&self, _submission: &Submission) -> Result<SubmitReceipt, IntakeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Accept => Ok(SubmitReceipt::from_body(200, "{}")),
                Script::Reject(status, message) => Err(IntakeError::Server {
                    status,
                    message: message.into(),
                }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("hang script never completes")
                }
            }
        }
    }

    fn filled(ctx: FormContext) -> FormController {
        let mut c = FormController::new(ctx);
        c.update_field(FormField::FirstName, "Jane").unwrap();
        c.update_field(FormField::LastName, "Doe").unwrap();
        if !c.is_read_only(FormField::Email) {
            c.update_field(FormField::Email, "jane@example.com").unwrap();
        }
        c.update_field(FormField::Phone, "5551234567").unwrap();
        c.update_field(FormField::Address, "12 Main Street").unwrap();
        c
    }

    #[tokio::test]
    async fn invalid_record_never_calls_service() {
        let svc = ScriptedService::new(Script::Accept);
        let mut c = filled(FormContext::new());
        c.update_field(FormField::Address, "x").unwrap();

        let err = submit_form(&mut c, &svc).await.unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(svc.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_token_never_calls_service() {
        let svc = ScriptedService::new(Script::Accept);
        let mut ctx = FormContext::new().with_token("abc");
        ctx.token.as_mut().unwrap().mark_invalid();
        let mut c = filled(ctx);

        let err = submit_form(&mut c, &svc).await.unwrap_err();
        assert!(matches!(err, IntakeError::TokenInvalid));
        assert_eq!(svc.calls(), 0);
    }

    #[tokio::test]
    async fn success_resets_form() {
        let svc = ScriptedService::new(Script::Accept);
        let mut c = filled(FormContext::new().with_email("jane@example.com"));

        submit_form(&mut c, &svc).await.unwrap();
        assert_eq!(svc.calls(), 1);
        assert_eq!(c.state(), SubmissionState::Idle);
        assert_eq!(c.record().first_name, "");
        assert_eq!(c.record().email, "jane@example.com");
    }

    #[tokio::test]
    async fn server_error_surfaces_and_idles() {
        let svc = ScriptedService::new(Script::Reject(401, "token expired"));
        let mut c = filled(FormContext::new());

        let err = submit_form(&mut c, &svc).await.unwrap_err();
        assert_eq!(err.to_string(), "token expired");
        assert_eq!(c.state(), SubmissionState::Idle);
        assert_eq!(c.record().first_name, "Jane");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submission_returns_to_idle() {
        let svc = ScriptedService::new(Script::Hang);
        let mut c = filled(FormContext::new());

        let res =
            tokio::time::timeout(Duration::from_secs(5), submit_form(&mut c, &svc)).await;
        assert!(res.is_err());
        assert_eq!(svc.calls(), 1);
        assert_eq!(c.state(), SubmissionState::Idle);
        assert!(!c.last_outcome().unwrap().is_success());
    }
}
