use std::time::Duration;

use async_trait::async_trait;
use intake_core::submission::{SUBMIT_PATH, SUBMIT_TIMEOUT};
use intake_core::{IntakeError, Submission, SubmitReceipt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::SubmissionService;

/// Async HTTP client for the missing-information endpoint.
pub struct HttpSubmitter {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpSubmitter {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            timeout: SUBMIT_TIMEOUT,
        }
    }

    /// Override the bounded wait (30s by default).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self) -> String {
        format!("{}{SUBMIT_PATH}", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> IntakeError {
        if e.is_timeout() {
            IntakeError::NetworkTimeout(self.timeout)
        } else {
            IntakeError::NetworkFailure(e.to_string())
        }
    }
}

#[async_trait]
impl SubmissionService for HttpSubmitter {
    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, IntakeError> {
        let form = build_form(submission)?;
        match &submission.attachment {
            Some(att) => info!(
                "submitting to {} with attachment {} ({} bytes)",
                self.endpoint(),
                att.name,
                att.size_bytes()
            ),
            None => info!("submitting to {}", self.endpoint()),
        }

        let request = self.client.post(self.endpoint()).multipart(form);
        // Dropping this future on timeout cancels the in-flight request.
        let exchange = async {
            let resp = request.send().await.map_err(|e| self.transport_error(e))?;
            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| self.transport_error(e))?;
            Ok::<_, IntakeError>((status, text))
        };

        let (status, text) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.inspect_err(|e| warn!("submission failed: {e}"))?,
            Err(_elapsed) => {
                warn!("submission timed out after {:?}", self.timeout);
                return Err(IntakeError::NetworkTimeout(self.timeout));
            }
        };

        handle_response(status, &text)
    }
}

fn build_form(submission: &Submission) -> Result<Form, IntakeError> {
    let mut form = Form::new();
    for (key, value) in submission.record.fields() {
        form = form.text(key, value.to_string());
    }
    if let Some(token) = &submission.token {
        form = form.text("token", token.clone());
    }
    if let Some(missing) = submission.missing_fields_json() {
        form = form.text("missingFields", missing);
    }
    if let Some(att) = &submission.attachment {
        let part = Part::bytes(att.data().to_vec())
            .file_name(att.name.clone())
            .mime_str(&att.content_type)
            .map_err(|e| IntakeError::Attachment(format!("{}: {e}", att.name)))?;
        form = form.part("document", part);
    }
    Ok(form)
}

fn handle_response(status: StatusCode, text: &str) -> Result<SubmitReceipt, IntakeError> {
    if status.is_success() {
        info!("submission accepted ({status})");
        Ok(SubmitReceipt::from_body(status.as_u16(), text))
    } else {
        let message = extract_error_message(status.as_u16(), text);
        warn!("submission rejected ({status}): {message}");
        Err(IntakeError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Best-effort human message from a non-2xx body.
///
/// Tries, in order: a JSON body's `detail` (string, or list of `{"msg": ..}`
/// entries) or `message`; the raw text; a generic status line.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Some(msg) = parse_error_body(trimmed) {
        return msg;
    }
    let raw = strip_wrapping_quotes(trimmed).trim();
    if !raw.is_empty() {
        return raw.to_string();
    }
    format!("Request failed with status {status}")
}

fn parse_error_body(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(strip_wrapping_quotes(text))
        .or_else(|_| serde_json::from_str(text))
        .ok()?;
    // A JSON string whose content is itself JSON.
    let value = match value {
        Value::String(inner) => serde_json::from_str(&inner).ok()?,
        other => other,
    };
    let body: ErrorBody = serde_json::from_value(value).ok()?;

    let detail = body.detail.and_then(|d| match d {
        Value::String(s) => Some(s),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other["msg"].as_str().map(String::from),
                })
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    });
    detail
        .or(body.message)
        .filter(|m| !m.trim().is_empty())
}

/// Drop one stray `"` from each end, independently.
fn strip_wrapping_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
