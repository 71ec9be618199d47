use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// The fields of the missing-information form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
}

impl FormField {
    pub const ALL: &[FormField] = &[
        FormField::FirstName,
        FormField::LastName,
        FormField::Email,
        FormField::Phone,
        FormField::Address,
    ];

    /// Multipart / JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Address => "address",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FormField::FirstName => "First name",
            FormField::LastName => "Last name",
            FormField::Email => "Email",
            FormField::Phone => "Phone",
            FormField::Address => "Address",
        }
    }

    /// Accepts the wire key (`firstName`) or the snake_case name (`first_name`).
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "firstName" | "first_name" => Some(FormField::FirstName),
            "lastName" | "last_name" => Some(FormField::LastName),
            "email" => Some(FormField::Email),
            "phone" => Some(FormField::Phone),
            "address" => Some(FormField::Address),
            _ => None,
        }
    }

    /// Message used when a rule fails without carrying its own.
    fn default_message(&self) -> &'static str {
        match self {
            FormField::FirstName => "First name must be at least 2 characters",
            FormField::LastName => "Last name must be at least 2 characters",
            FormField::Email => "Please enter a valid email address",
            FormField::Phone => "Phone number must be at least 10 digits",
            FormField::Address => "Address must be at least 5 characters",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,

    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 10, message = "Phone number must be at least 10 digits"))]
    pub phone: String,

    #[validate(length(min = 5, message = "Address must be at least 5 characters"))]
    pub address: String,
}

impl FormRecord {
    /// An empty record, optionally carrying a pre-filled email.
    pub fn with_email(email: Option<&str>) -> Self {
        Self {
            email: email.unwrap_or_default().trim().to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
            FormField::Phone => &self.phone,
            FormField::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Email => &mut self.email,
            FormField::Phone => &mut self.phone,
            FormField::Address => &mut self.address,
        };
        *slot = value;
    }

    /// `(key, value)` pairs in display order, as sent in the multipart body.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FormField::ALL.iter().map(|f| (f.as_str(), self.get(*f)))
    }

    /// Run every field rule. Empty result means the record may be submitted.
    pub fn check(&self) -> FieldErrors {
        let mut out = FieldErrors::default();
        let Err(errors) = self.validate() else {
            return out;
        };
        for (key, field_errors) in errors.field_errors() {
            let Some(field) = FormField::from_key(&key) else {
                continue;
            };
            let message = field_errors
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| field.default_message().to_string());
            out.insert(field, message);
        }
        out
    }
}

/// Failed rules keyed by field, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: FormField, message: String) {
        self.0.insert(field, message);
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> + '_ {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> FormRecord {
        FormRecord {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            phone: "5551234567".into(),
            address: "12 Main Street".into(),
        }
    }

    #[test]
    fn valid_record_has_no_errors() {
        assert!(valid_record().check().is_empty());
    }

    #[test]
    fn empty_record_fails_every_field() {
        let errors = FormRecord::default().check();
        assert_eq!(errors.len(), FormField::ALL.len());
        assert_eq!(
            errors.get(FormField::Email),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn each_rule_fails_independently() {
        let cases: [(FormField, &str); 5] = [
            (FormField::FirstName, "J"),
            (FormField::LastName, "D"),
            (FormField::Email, "not-an-email"),
            (FormField::Phone, "555123456"),
            (FormField::Address, "12 M"),
        ];
        for (field, bad) in cases {
            let mut record = valid_record();
            record.set(field, bad.to_string());
            let errors = record.check();
            assert_eq!(errors.len(), 1, "{field:?} should be the only failure");
            assert!(errors.get(field).is_some());
        }
    }

    #[test]
    fn boundary_lengths_pass() {
        let mut record = valid_record();
        record.first_name = "Al".into();
        record.last_name = "Li".into();
        record.phone = "0123456789".into();
        record.address = "1 Rd.".into();
        assert!(record.check().is_empty());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let mut record = valid_record();
        // one character, two bytes
        record.first_name = "É".into();
        assert!(record.check().get(FormField::FirstName).is_some());
    }

    #[test]
    fn field_key_round_trip() {
        for f in FormField::ALL {
            assert_eq!(FormField::from_key(f.as_str()), Some(*f));
        }
        assert_eq!(FormField::from_key("first_name"), Some(FormField::FirstName));
        assert_eq!(FormField::from_key("zip"), None);
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(valid_record()).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Doe");
    }

    #[test]
    fn fields_follow_display_order() {
        let keys: Vec<_> = valid_record().fields().map(|(k, _)| k).collect();
        assert_eq!(keys, ["firstName", "lastName", "email", "phone", "address"]);
    }
}
