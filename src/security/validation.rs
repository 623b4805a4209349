//! Field-level validation for public form input.
//!
//! A [`Validator`] cleans each field, records every problem it finds and
//! hands back the cleaned values; callers persist nothing unless
//! [`Validator::finish`] succeeds.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::security::sanitize::clean_text;

/// Maximum lengths, in characters.
pub mod limits {
    pub const NAME_MAX: usize = 100;
    pub const NAME_MIN: usize = 2;
    pub const EMAIL_MAX: usize = 254;
    pub const PHONE_MAX: usize = 30;
    pub const COMPANY_MAX: usize = 100;
    pub const SUBJECT_MAX: usize = 200;
    pub const SUBJECT_MIN: usize = 3;
    pub const MESSAGE_MAX: usize = 5000;
    pub const MESSAGE_MIN: usize = 10;
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^\s@<>()\[\],;:"\\]+@[^\s@<>()\[\],;:"\\]+\.[A-Za-z]{2,}$"#).expect("static regex")
});

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{M}][\p{L}\p{M} '.\-]*$").expect("static regex"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ().\-]+$").expect("static regex"));

static SUSPICIOUS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<\s*/?\s*script",
        r"(?i)javascript\s*:",
        r#"(?i)<[^>]*\bon[a-z]+\s*="#,
        r#"(?i)\bon[a-z]+\s*=\s*["'`]"#,
        r"(?i)<\s*iframe",
        r"(?i)\bunion\b\s+(all\s+)?\bselect\b",
        r"(?i);\s*(drop|delete|insert|update|alter|truncate)\b",
        r"--(\s|$)",
        r"/\*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Message attached to fields rejected by [`contains_suspicious_content`].
pub const DISALLOWED_CONTENT: &str = "contains disallowed content";

/// A rejected field and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// True when the text contains markup or query fragments that have no
/// business in a contact form.
pub fn contains_suspicious_content(value: &str) -> bool {
    value
        .lines()
        .any(|line| SUSPICIOUS.iter().any(|re| re.is_match(line)))
}

pub fn is_valid_email(value: &str) -> bool {
    value.chars().count() <= limits::EMAIL_MAX && EMAIL.is_match(value)
}

/// Collects field errors across a whole submission.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Required free text with length bounds and the suspicious-content
    /// check. Returns the cleaned value.
    pub fn text(&mut self, field: &'static str, raw: &str, min: usize, max: usize) -> String {
        let value = clean_text(raw);
        let len = value.chars().count();
        if len == 0 {
            self.reject(field, "is required");
        } else if len < min {
            self.reject(field, format!("must be at least {} characters", min));
        } else if len > max {
            self.reject(field, format!("must be at most {} characters", max));
        } else if contains_suspicious_content(&value) {
            self.reject(field, DISALLOWED_CONTENT);
        }
        value
    }

    /// Optional free text; empty becomes `None`.
    pub fn optional_text(&mut self, field: &'static str, raw: Option<&str>, max: usize) -> Option<String> {
        let value = clean_text(raw?);
        if value.is_empty() {
            return None;
        }
        if value.chars().count() > max {
            self.reject(field, format!("must be at most {} characters", max));
        } else if contains_suspicious_content(&value) {
            self.reject(field, DISALLOWED_CONTENT);
        }
        Some(value)
    }

    /// A person's name: letters, spaces and `'-.` only.
    pub fn name(&mut self, field: &'static str, raw: &str) -> String {
        let before = self.errors.len();
        let value = self.text(field, raw, limits::NAME_MIN, limits::NAME_MAX);
        if self.errors.len() == before && !NAME.is_match(&value) {
            self.reject(field, "contains invalid characters");
        }
        value
    }

    /// Email address, lower-cased.
    pub fn email(&mut self, field: &'static str, raw: &str) -> String {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            self.reject(field, "is required");
        } else if value.chars().count() > limits::EMAIL_MAX {
            self.reject(field, format!("must be at most {} characters", limits::EMAIL_MAX));
        } else if !EMAIL.is_match(&value) {
            self.reject(field, "is not a valid email address");
        }
        value
    }

    pub fn phone(&mut self, field: &'static str, raw: Option<&str>) -> Option<String> {
        let value = raw.map(str::trim).filter(|v| !v.is_empty())?;
        if value.chars().count() > limits::PHONE_MAX {
            self.reject(field, format!("must be at most {} characters", limits::PHONE_MAX));
        } else if !PHONE.is_match(value) {
            self.reject(field, "contains invalid characters");
        }
        Some(value.to_string())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
