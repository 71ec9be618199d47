use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::AttachmentRef;
use crate::form::FormRecord;

/// Path of the endpoint, appended to the configured base URL.
pub const SUBMIT_PATH: &str = "/api/client/submit-missing-info";

/// Bounded wait for one submission.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between a successful submission and the confirmation view.
pub const CONFIRMATION_DELAY: Duration = Duration::from_secs(2);

/// Whether the form currently accepts edits and submit attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the most recent submit attempt settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded { message: String },
    Failed { message: String },
}

impl SubmissionOutcome {
    pub fn message(&self) -> &str {
        match self {
            SubmissionOutcome::Succeeded { message } | SubmissionOutcome::Failed { message } => {
                message
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStatus {
    /// Nothing has judged the token; it is passed through as-is.
    #[default]
    Unchecked,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    status: TokenStatus,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status: TokenStatus::Unchecked,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn status(&self) -> TokenStatus {
        self.status
    }

    pub fn is_invalid(&self) -> bool {
        self.status == TokenStatus::Invalid
    }

    /// Record that an external check rejected this token.
    pub fn mark_invalid(&mut self) {
        self.status = TokenStatus::Invalid;
    }
}

/// Parameters handed to the form when it is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormContext {
    /// Pre-filled email; when present the email field is read-only.
    pub email: Option<String>,
    pub token: Option<AccessToken>,
    /// Field names previously flagged as missing. Informational only.
    pub missing_fields: Vec<String>,
}

impl FormContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        let email = email.trim();
        self.email = (!email.is_empty()).then(|| email.to_string());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then(|| AccessToken::new(token));
        self
    }

    pub fn with_missing_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_fields = fields
            .into_iter()
            .map(Into::into)
            .filter(|f: &String| !f.trim().is_empty())
            .collect();
        self
    }
}

/// Snapshot of everything one POST carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub record: FormRecord,
    pub attachment: Option<AttachmentRef>,
    pub token: Option<String>,
    pub missing_fields: Vec<String>,
}

impl Submission {
    /// JSON array sent as the `missingFields` part, `None` when empty.
    pub fn missing_fields_json(&self) -> Option<String> {
        if self.missing_fields.is_empty() {
            return None;
        }
        serde_json::to_string(&self.missing_fields).ok()
    }
}

/// A 2xx response from the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub status: u16,
    pub message: Option<String>,
    /// Parsed response body, `Null` when empty or not JSON.
    pub body: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

impl SubmitReceipt {
    pub fn from_body(status: u16, text: &str) -> Self {
        let body: serde_json::Value = serde_json::from_str(text).unwrap_or_default();
        let message = body["message"].as_str().map(String::from);
        Self {
            status,
            message,
            body,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_context_values_are_dropped() {
        let ctx = FormContext::new()
            .with_email("  ")
            .with_token("")
            .with_missing_fields(["phone", " ", "address"]);
        assert_eq!(ctx.email, None);
        assert_eq!(ctx.token, None);
        assert_eq!(ctx.missing_fields, vec!["phone", "address"]);
    }

    #[test]
    fn prefilled_email_is_trimmed() {
        let ctx = FormContext::new().with_email(" jane@example.com \n");
        assert_eq!(ctx.email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn token_starts_unchecked() {
        let mut token = AccessToken::new("abc");
        assert_eq!(token.status(), TokenStatus::Unchecked);
        assert!(!token.is_invalid());
        token.mark_invalid();
        assert!(token.is_invalid());
    }

    #[test]
    fn missing_fields_encode_as_json_list() {
        let mut submission = Submission {
            record: FormRecord::default(),
            attachment: None,
            token: None,
            missing_fields: vec![],
        };
        assert_eq!(submission.missing_fields_json(), None);
        submission.missing_fields = vec!["phone".into(), "address".into()];
        assert_eq!(
            submission.missing_fields_json().as_deref(),
            Some(r#"["phone","address"]"#)
        );
    }

    #[test]
    fn receipt_tolerates_non_json_body() {
        let receipt = SubmitReceipt::from_body(204, "");
        assert_eq!(receipt.body, serde_json::Value::Null);
        assert_eq!(receipt.message, None);

        let receipt = SubmitReceipt::from_body(200, r#"{"message":"Saved","id":7}"#);
        assert_eq!(receipt.message.as_deref(), Some("Saved"));
        assert_eq!(receipt.body["id"], 7);
    }
}
