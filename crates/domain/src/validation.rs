// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Validation of submitted applications against a permit type's fields.
//!
//! Validation never fails outright: it returns one [`FieldError`] per
//! offending field so the applicant can fix everything in one pass.

use crate::error::DomainError;
use crate::fields::{FieldDefinition, FieldType};
use crate::payload::{ApplicationPayload, is_blank, value_as_decimal, value_as_text};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;
use time::Date;
use time::macros::format_description;

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[allow(clippy::expect_used)]
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9(][0-9 ().-]*[0-9]$").expect("phone pattern compiles"));

/// Digits a phone number may carry, E.164 included.
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 7..=15;

/// Whether fields hidden by their display condition are still validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFieldPolicy {
    /// Hidden fields are validated like any other field.
    #[default]
    ValidateAll,
    /// Hidden fields are ignored.
    SkipHidden,
}

impl HiddenFieldPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidateAll => "validate_all",
            Self::SkipHidden => "skip_hidden",
        }
    }
}

impl FromStr for HiddenFieldPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "validate_all" => Ok(Self::ValidateAll),
            "skip_hidden" => Ok(Self::SkipHidden),
            other => Err(DomainError::InvalidPermitType(format!(
                "Unknown hidden field policy '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for HiddenFieldPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A problem with one submitted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The field's name.
    pub field: String,
    /// The field's label, as shown to the applicant.
    pub label: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &FieldDefinition, message: String) -> Self {
        Self {
            field: field.name.clone(),
            label: field.label.clone(),
            message,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Returns true if the field is shown for this payload.
///
/// Fields without a display condition are always visible.
#[must_use]
pub fn is_field_visible(field: &FieldDefinition, payload: &ApplicationPayload) -> bool {
    field
        .conditional_display
        .as_ref()
        .is_none_or(|condition| condition.is_satisfied_by(payload))
}

/// Validates a payload against a form definition.
///
/// Returns at most one error per field, in field order. An empty result
/// means the payload is acceptable.
#[must_use]
pub fn validate_application(
    fields: &[FieldDefinition],
    payload: &ApplicationPayload,
    policy: HiddenFieldPolicy,
) -> Vec<FieldError> {
    fields
        .iter()
        .filter(|field| policy == HiddenFieldPolicy::ValidateAll || is_field_visible(field, payload))
        .filter_map(|field| {
            validate_field(field, payload.get(&field.name)).map(|message| FieldError::new(field, message))
        })
        .collect()
}

fn is_missing(field: &FieldDefinition, value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Bool(false)) if field.field_type == FieldType::Checkbox => true,
        Some(value) => is_blank(value),
    }
}

/// Returns the message for the first failing check, if any.
fn validate_field(field: &FieldDefinition, value: Option<&Value>) -> Option<String> {
    let label: &str = &field.label;

    if is_missing(field, value) {
        return field.required.then(|| format!("{label} is required"));
    }
    let value: &Value = value?;

    match field.field_type {
        FieldType::Email => {
            let text: String = value_as_text(value).unwrap_or_default();
            (!EMAIL_RE.is_match(text.trim()))
                .then(|| format!("{label} must be a valid email address"))
        }
        FieldType::Phone => {
            let text: String = value_as_text(value).unwrap_or_default();
            let text: &str = text.trim();
            let digits: usize = text.chars().filter(char::is_ascii_digit).count();
            (!(PHONE_RE.is_match(text) && PHONE_DIGITS.contains(&digits)))
                .then(|| format!("{label} must be a valid phone number"))
        }
        FieldType::Date => {
            let text: String = value_as_text(value).unwrap_or_default();
            Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
                .is_err()
                .then(|| format!("{label} must be a date in YYYY-MM-DD format"))
        }
        kind if kind.is_enumerated() => {
            let chosen: Option<String> = value_as_text(value);
            (!chosen.is_some_and(|chosen| field.has_option(&chosen)))
                .then(|| format!("{label} must be one of the listed options"))
        }
        kind if kind.is_numeric() => validate_number(field, value),
        kind if kind.is_textual() => validate_text(field, value),
        _ => None,
    }
}

fn validate_number(field: &FieldDefinition, value: &Value) -> Option<String> {
    let label: &str = &field.label;
    let Some(number) = value_as_decimal(value) else {
        return Some(format!("{label} must be a number"));
    };
    if let Some(min) = field.constraints.min
        && number < min
    {
        return Some(format!("{label} must be at least {min}"));
    }
    if let Some(max) = field.constraints.max
        && number > max
    {
        return Some(format!("{label} must be at most {max}"));
    }
    None
}

fn validate_text(field: &FieldDefinition, value: &Value) -> Option<String> {
    let label: &str = &field.label;
    let Some(text) = value_as_text(value) else {
        return Some(format!("{label} must be text"));
    };
    let length: usize = text.chars().count();
    if let Some(min_length) = field.constraints.min_length
        && length < min_length
    {
        return Some(format!("{label} must be at least {min_length} characters"));
    }
    if let Some(max_length) = field.constraints.max_length
        && length > max_length
    {
        return Some(format!("{label} must be at most {max_length} characters"));
    }
    if let Some(pattern) = &field.constraints.pattern
        && !pattern.is_match(&text)
    {
        return Some(
            field
                .constraints
                .pattern_message
                .clone()
                .unwrap_or_else(|| format!("{label} has an invalid format")),
        );
    }
    None
}
