use crate::attachment::AttachmentRef;
use crate::error::IntakeError;
use crate::form::{FieldErrors, FormField, FormRecord};
use crate::submission::{
    FormContext, Submission, SubmissionOutcome, SubmissionState, SubmitReceipt,
};

/// Owns the form state and the submission lifecycle.
///
/// Network I/O lives elsewhere: callers take a [`Submission`] from
/// [`begin_submit`](Self::begin_submit), send it, and hand the result back to
/// [`finish_submit`](Self::finish_submit). Every path out of `Submitting`
/// lands in `Idle`.
#[derive(Debug, Clone)]
pub struct FormController {
    context: FormContext,
    record: FormRecord,
    attachment: Option<AttachmentRef>,
    state: SubmissionState,
    errors: FieldErrors,
    /// Set by the first submit attempt; edits re-validate from then on.
    attempted: bool,
    last_outcome: Option<SubmissionOutcome>,
}

impl FormController {
    pub fn new(context: FormContext) -> Self {
        let record = FormRecord::with_email(context.email.as_deref());
        Self {
            context,
            record,
            attachment: None,
            state: SubmissionState::Idle,
            errors: FieldErrors::default(),
            attempted: false,
            last_outcome: None,
        }
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn attachment(&self) -> Option<&AttachmentRef> {
        self.attachment.as_ref()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    /// Inline errors currently shown next to fields.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    pub fn is_read_only(&self, field: FormField) -> bool {
        field == FormField::Email && self.context.email.is_some()
    }

    /// Whether the field was flagged as missing when the form was opened.
    pub fn was_flagged_missing(&self, field: FormField) -> bool {
        self.context
            .missing_fields
            .iter()
            .any(|name| FormField::from_key(name) == Some(field))
    }

    pub fn update_field(&mut self, field: FormField, value: impl Into<String>) -> Result<(), IntakeError> {
        self.ensure_idle()?;
        if self.is_read_only(field) {
            return Err(IntakeError::ReadOnly(field));
        }
        self.record.set(field, value.into());
        if self.attempted {
            self.errors = self.record.check();
        }
        Ok(())
    }

    /// Replace the attachment if the candidate passes the type and size
    /// constraints. On rejection the current attachment is kept.
    pub fn select_attachment(&mut self, candidate: AttachmentRef) -> Result<(), IntakeError> {
        self.ensure_idle()?;
        candidate.check().map_err(IntakeError::AttachmentRejected)?;
        self.attachment = Some(candidate);
        Ok(())
    }

    pub fn remove_attachment(&mut self) -> Option<AttachmentRef> {
        self.attachment.take()
    }

    pub fn validate(&self) -> FieldErrors {
        self.record.check()
    }

    /// Check the preconditions and enter `Submitting`.
    pub fn begin_submit(&mut self) -> Result<Submission, IntakeError> {
        self.ensure_idle()?;

        if self.context.token.as_ref().is_some_and(|t| t.is_invalid()) {
            return Err(self.settle_failure(IntakeError::TokenInvalid));
        }

        self.attempted = true;
        self.errors = self.record.check();
        if !self.errors.is_empty() {
            return Err(self.settle_failure(IntakeError::Validation(self.errors.clone())));
        }

        self.state = SubmissionState::Submitting;
        Ok(Submission {
            record: self.record.clone(),
            attachment: self.attachment.clone(),
            token: self.context.token.as_ref().map(|t| t.value().to_string()),
            missing_fields: self.context.missing_fields.clone(),
        })
    }

    /// Apply the endpoint's answer and return to `Idle`.
    pub fn finish_submit(
        &mut self,
        result: Result<SubmitReceipt, IntakeError>,
    ) -> Result<SubmitReceipt, IntakeError> {
        self.state = SubmissionState::Idle;
        match result {
            Ok(receipt) => {
                self.reset();
                let message = receipt
                    .message
                    .clone()
                    .unwrap_or_else(|| "Information submitted successfully".into());
                self.last_outcome = Some(SubmissionOutcome::Succeeded { message });
                Ok(receipt)
            }
            Err(e) => Err(self.settle_failure(e)),
        }
    }

    /// Leave `Submitting` without a result, e.g. when the request was dropped.
    pub fn abort_submit(&mut self) {
        if self.is_submitting() {
            self.state = SubmissionState::Idle;
            self.last_outcome = Some(SubmissionOutcome::Failed {
                message: "submission cancelled".into(),
            });
        }
    }

    /// Clear the form, keeping a pre-filled email.
    pub fn reset(&mut self) {
        self.record = FormRecord::with_email(self.context.email.as_deref());
        self.attachment = None;
        self.errors = FieldErrors::default();
        self.attempted = false;
    }

    fn ensure_idle(&self) -> Result<(), IntakeError> {
        if self.is_submitting() {
            Err(IntakeError::Busy)
        } else {
            Ok(())
        }
    }

    fn settle_failure(&mut self, e: IntakeError) -> IntakeError {
        self.last_outcome = Some(SubmissionOutcome::Failed {
            message: e.to_string(),
        });
        e
    }
}
