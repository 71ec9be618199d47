use anyhow::{bail, Context, Result};
use intake_core::{AttachmentRef, FormController, FormField, IntakeError};
use intake_service::BlockingHttpSubmitter;
use tracing::info;

use crate::config::{Config, SubmitArgs};

/// Fill the controller from flags and submit once.
pub fn run(config: &Config, args: &SubmitArgs) -> Result<()> {
    let service = BlockingHttpSubmitter::with_timeout(&config.api_url, config.timeout())
        .context("failed to create tokio runtime")?;
    let mut controller = FormController::new(config.form_context());
    fill(&mut controller, args)?;

    info!("posting to {}", service.endpoint());
    match service.submit_form(&mut controller) {
        Ok(receipt) => {
            let message = receipt
                .message
                .unwrap_or_else(|| "Information submitted successfully".into());
            println!("{message}");
            Ok(())
        }
        Err(IntakeError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            bail!("{} field(s) failed validation", errors.len())
        }
        Err(e) => Err(e).context("submission failed"),
    }
}

pub fn fill(controller: &mut FormController, args: &SubmitArgs) -> Result<()> {
    let values = [
        (FormField::FirstName, &args.first_name),
        (FormField::LastName, &args.last_name),
        (FormField::Phone, &args.phone),
        (FormField::Address, &args.address),
    ];
    for (field, value) in values {
        controller.update_field(field, value.as_str())?;
    }
    if let Some(path) = &args.document {
        let attachment = AttachmentRef::from_path(path)?;
        controller.select_attachment(attachment)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use intake_core::FormContext;

    use super::*;

    fn args(document: Option<PathBuf>) -> SubmitArgs {
        SubmitArgs {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: "5551234567".into(),
            address: "12 Main Street".into(),
            document,
        }
    }

    #[test]
    fn fill_sets_fields_and_keeps_email() {
        let mut c = FormController::new(FormContext::new().with_email("jane@example.com"));
        fill(&mut c, &args(None)).unwrap();
        assert!(c.validate().is_empty());
        assert_eq!(c.record().email, "jane@example.com");
    }

    #[test]
    fn fill_rejects_unsupported_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.rtf");
        std::fs::write(&path, b"{\\rtf1}").unwrap();

        let mut c = FormController::new(FormContext::new());
        let err = fill(&mut c, &args(Some(path))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IntakeError>(),
            Some(IntakeError::AttachmentRejected(_))
        ));
        assert!(c.attachment().is_none());
    }
}
