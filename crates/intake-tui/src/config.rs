use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use intake_core::submission::{CONFIRMATION_DELAY, SUBMIT_TIMEOUT};
use intake_core::FormContext;

#[derive(Debug, Parser)]
#[command(name = "intake", about = "Collect and submit missing client information")]
pub struct Config {
    /// Base URL of the API receiving submissions
    #[arg(long, env = "INTAKE_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Pre-filled email; shown read-only in the form
    #[arg(long, env = "INTAKE_EMAIL")]
    pub email: Option<String>,

    /// Access token from the invitation link, forwarded with the submission
    #[arg(long, env = "INTAKE_TOKEN")]
    pub token: Option<String>,

    /// Field previously flagged as missing (repeatable or comma separated)
    #[arg(
        long = "missing-field",
        env = "INTAKE_MISSING_FIELDS",
        value_delimiter = ','
    )]
    pub missing_fields: Vec<String>,

    /// Request timeout (seconds)
    #[arg(long, env = "INTAKE_TIMEOUT", default_value_t = SUBMIT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Seconds between a successful submission and the confirmation view
    #[arg(long, default_value_t = CONFIRMATION_DELAY.as_secs())]
    pub confirmation_delay: u64,

    /// Write logs to this file (the interactive form never logs to the terminal)
    #[arg(long, env = "INTAKE_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit from flags without opening the form. Uses --email as the email.
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub address: String,

    /// Document to attach (pdf, doc, docx, txt, jpg, png; 10 MiB max)
    #[arg(long)]
    pub document: Option<PathBuf>,
}

impl Config {
    pub fn form_context(&self) -> FormContext {
        let mut ctx = FormContext::new().with_missing_fields(self.missing_fields.iter().cloned());
        if let Some(email) = &self.email {
            ctx = ctx.with_email(email.clone());
        }
        if let Some(token) = &self.token {
            ctx = ctx.with_token(token.clone());
        }
        ctx
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(self.confirmation_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["intake"]).unwrap();
        assert_eq!(config.timeout(), SUBMIT_TIMEOUT);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.confirmation_delay(), CONFIRMATION_DELAY);
        assert_eq!(config.confirmation_delay(), Duration::from_secs(2));
        assert!(config.command.is_none());
    }

    #[test]
    fn context_from_flags() {
        let config = Config::try_parse_from([
            "intake",
            "--email",
            "a@b.co",
            "--token",
            "t0k",
            "--missing-field",
            "phone,address",
            "--missing-field",
            "email",
        ])
        .unwrap();
        let ctx = config.form_context();
        assert_eq!(ctx.email.as_deref(), Some("a@b.co"));
        assert_eq!(ctx.token.unwrap().value(), "t0k");
        assert_eq!(ctx.missing_fields, vec!["phone", "address", "email"]);
    }

    #[test]
    fn submit_subcommand() {
        let config = Config::try_parse_from([
            "intake",
            "--email",
            "a@b.co",
            "submit",
            "--first-name",
            "Jane",
            "--last-name",
            "Doe",
            "--phone",
            "5551234567",
            "--address",
            "12 Main Street",
            "--document",
            "id.pdf",
        ])
        .unwrap();
        let Some(Command::Submit(args)) = config.command else {
            panic!("expected submit subcommand");
        };
        assert_eq!(args.first_name, "Jane");
        assert_eq!(args.document, Some(PathBuf::from("id.pdf")));
    }
}
