// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dynamic application field definitions.
//!
//! A permit type's application form is a list of [`FieldDefinition`]s. Each
//! definition is checked for internal consistency when the permit type is
//! authored; cross-field checks (unique names, `depends_on` targets) happen
//! in [`crate::PermitTypeDefinition`].

use crate::error::DomainError;
use crate::payload::{ApplicationPayload, value_as_decimal, value_as_text};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input type of an application field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Number,
    Currency,
    Date,
    Select,
    Radio,
    Checkbox,
    File,
}

impl FieldType {
    /// Returns true if values of this type must be one of the field's options.
    #[must_use]
    pub const fn is_enumerated(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }

    /// Returns true if values of this type are numbers.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Currency)
    }

    /// Returns true if length and pattern constraints apply.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Textarea)
    }
}

/// One choice of an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// A regular expression a text value must match.
///
/// Compiled once when constructed or deserialized; serializes as its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPattern {
    source: String,
    regex: Regex,
}

impl FieldPattern {
    /// Compiles `source`.
    ///
    /// # Errors
    ///
    /// Returns the compile error if `source` is not a valid regular expression.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for FieldPattern {}

impl TryFrom<String> for FieldPattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<FieldPattern> for String {
    fn from(pattern: FieldPattern) -> Self {
        pattern.source
    }
}

/// Value constraints checked by the validation engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConstraints {
    /// Inclusive lower bound for numeric fields.
    pub min: Option<Decimal>,
    /// Inclusive upper bound for numeric fields.
    pub max: Option<Decimal>,
    /// Minimum length in characters for text fields.
    pub min_length: Option<usize>,
    /// Maximum length in characters for text fields.
    pub max_length: Option<usize>,
    /// Regular expression a text value must match.
    pub pattern: Option<FieldPattern>,
    /// Message reported when `pattern` does not match.
    pub pattern_message: Option<String>,
}

/// Comparison used by a conditional display rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// Shows a field only when another field's value satisfies a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalDisplay {
    /// Name of the controlling field.
    pub depends_on: String,
    /// Value the controlling field is compared against.
    pub value: Value,
    #[serde(default)]
    pub operator: ConditionOperator,
}

impl ConditionalDisplay {
    #[must_use]
    pub fn new(depends_on: &str, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self {
            depends_on: depends_on.to_string(),
            value: value.into(),
            operator,
        }
    }

    /// Evaluates the rule against a payload.
    ///
    /// A missing controlling value satisfies only `NotEquals`.
    #[must_use]
    pub fn is_satisfied_by(&self, payload: &ApplicationPayload) -> bool {
        let Some(actual) = payload.get(&self.depends_on) else {
            return self.operator == ConditionOperator::NotEquals;
        };

        match self.operator {
            ConditionOperator::Equals => loosely_equal(actual, &self.value),
            ConditionOperator::NotEquals => !loosely_equal(actual, &self.value),
            ConditionOperator::Contains => match actual {
                Value::Array(items) => items.iter().any(|item| loosely_equal(item, &self.value)),
                _ => match (value_as_text(actual), value_as_text(&self.value)) {
                    (Some(haystack), Some(needle)) => haystack.contains(&needle),
                    _ => false,
                },
            },
            ConditionOperator::GreaterThan => {
                match (value_as_decimal(actual), value_as_decimal(&self.value)) {
                    (Some(a), Some(b)) => a > b,
                    _ => false,
                }
            }
            ConditionOperator::LessThan => {
                match (value_as_decimal(actual), value_as_decimal(&self.value)) {
                    (Some(a), Some(b)) => a < b,
                    _ => false,
                }
            }
        }
    }
}

/// Compares two submitted values the way form inputs are compared:
/// numerically when both are numbers, otherwise by their text.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (value_as_decimal(a), value_as_decimal(b)) {
        return x == y;
    }
    match (value_as_text(a), value_as_text(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// One dynamically configured input of a permit application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique key of the field within its permit type.
    pub name: String,
    /// Human-readable label used in error messages.
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub constraints: FieldConstraints,
    #[serde(default)]
    pub conditional_display: Option<ConditionalDisplay>,
}

impl FieldDefinition {
    /// Creates an optional field with no constraints.
    #[must_use]
    pub fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
            options: Vec::new(),
            constraints: FieldConstraints::default(),
            conditional_display: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    #[must_use]
    pub fn shown_when(mut self, condition: ConditionalDisplay) -> Self {
        self.conditional_display = Some(condition);
        self
    }

    /// Returns true if `value` is one of this field's option values.
    #[must_use]
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    /// Checks that the definition is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFieldDefinition` if:
    /// - the name or label is empty
    /// - an enumerated field has no options
    /// - `min` exceeds `max` or `min_length` exceeds `max_length`
    /// - numeric bounds are set on a non-numeric field
    /// - length or pattern constraints are set on a non-text field
    /// - the field's display depends on itself
    pub fn validate_definition(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidFieldDefinition {
            field: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.label.trim().is_empty() {
            return Err(invalid("label cannot be empty"));
        }
        if self.field_type.is_enumerated() && self.options.is_empty() {
            return Err(invalid("select and radio fields need at least one option"));
        }
        if let (Some(min), Some(max)) = (self.constraints.min, self.constraints.max)
            && min > max
        {
            return Err(invalid("min cannot exceed max"));
        }
        if let (Some(min), Some(max)) = (self.constraints.min_length, self.constraints.max_length)
            && min > max
        {
            return Err(invalid("min_length cannot exceed max_length"));
        }
        let constraints: &FieldConstraints = &self.constraints;
        let bounded: bool = constraints.min.is_some() || constraints.max.is_some();
        if bounded && !self.field_type.is_numeric() {
            return Err(invalid("min and max apply only to number and currency fields"));
        }
        if !self.field_type.is_textual()
            && (constraints.min_length.is_some()
                || constraints.max_length.is_some()
                || constraints.pattern.is_some())
        {
            return Err(invalid("length and pattern constraints apply only to text fields"));
        }
        if let Some(condition) = &self.conditional_display
            && condition.depends_on == self.name
        {
            return Err(invalid("display cannot depend on the field itself"));
        }

        Ok(())
    }
}
