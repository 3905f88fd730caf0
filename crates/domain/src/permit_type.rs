// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-municipality permit type configuration.
//!
//! A [`PermitTypeDefinition`] can only be obtained from a
//! [`PermitTypeConfig`] that passed validation, so every definition in the
//! system has unique field names, resolvable display dependencies, well
//! formed fee rules and tiers sorted by their lower bound.

use crate::department::Department;
use crate::error::DomainError;
use crate::fees::FeeRule;
use crate::fields::FieldDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Permit type configuration as authored by municipal staff.
///
/// This is the unvalidated form; convert it with
/// [`PermitTypeDefinition::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitTypeConfig {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub fee_rules: Vec<FeeRule>,
    #[serde(default)]
    pub required_departments: BTreeSet<Department>,
    #[serde(default)]
    pub required_inspections: Vec<String>,
    #[serde(default)]
    pub estimated_processing_days: Option<u32>,
}

impl PermitTypeConfig {
    /// Creates an empty configuration for a permit type.
    #[must_use]
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
            fee_rules: Vec::new(),
            required_departments: BTreeSet::new(),
            required_inspections: Vec::new(),
            estimated_processing_days: None,
        }
    }
}

/// A validated permit type: application schema, fee schedule, and the
/// departments and inspections every permit of this type requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PermitTypeConfig", into = "PermitTypeConfig")]
pub struct PermitTypeDefinition {
    code: String,
    name: String,
    fields: Vec<FieldDefinition>,
    fee_rules: Vec<FeeRule>,
    required_departments: BTreeSet<Department>,
    required_inspections: Vec<String>,
    estimated_processing_days: Option<u32>,
}

impl PermitTypeDefinition {
    /// Validates an authored configuration.
    ///
    /// Tiered fee rules have their tiers sorted by `min`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the code or name is empty
    /// - any field definition is malformed
    /// - two fields share a name
    /// - a display rule depends on an unknown field
    /// - any fee rule is malformed or reads a field the form does not define
    pub fn new(config: PermitTypeConfig) -> Result<Self, DomainError> {
        if config.code.trim().is_empty() {
            return Err(DomainError::InvalidPermitType(String::from(
                "Permit type code cannot be empty",
            )));
        }
        if config.name.trim().is_empty() {
            return Err(DomainError::InvalidPermitType(String::from(
                "Permit type name cannot be empty",
            )));
        }

        let mut names: HashSet<&str> = HashSet::new();
        for field in &config.fields {
            field.validate_definition()?;
            if !names.insert(field.name.as_str()) {
                return Err(DomainError::DuplicateFieldName(field.name.clone()));
            }
        }

        for field in &config.fields {
            if let Some(condition) = &field.conditional_display
                && !names.contains(condition.depends_on.as_str())
            {
                return Err(DomainError::InvalidFieldDefinition {
                    field: field.name.clone(),
                    reason: format!("depends on unknown field '{}'", condition.depends_on),
                });
            }
        }

        for (index, rule) in config.fee_rules.iter().enumerate() {
            rule.validate(index)?;
            if let Some(input) = rule.input_field()
                && !names.contains(input)
            {
                return Err(DomainError::InvalidFeeRule {
                    index,
                    reason: format!("input field '{input}' is not part of the application"),
                });
            }
        }

        let fee_rules: Vec<FeeRule> = config
            .fee_rules
            .into_iter()
            .map(FeeRule::normalized)
            .collect();

        Ok(Self {
            code: config.code.trim().to_string(),
            name: config.name.trim().to_string(),
            fields: config.fields,
            fee_rules,
            required_departments: config.required_departments,
            required_inspections: config.required_inspections,
            estimated_processing_days: config.estimated_processing_days,
        })
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns the field named `name`, if the form defines one.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn fee_rules(&self) -> &[FeeRule] {
        &self.fee_rules
    }

    #[must_use]
    pub const fn required_departments(&self) -> &BTreeSet<Department> {
        &self.required_departments
    }

    #[must_use]
    pub fn required_inspections(&self) -> &[String] {
        &self.required_inspections
    }

    #[must_use]
    pub const fn estimated_processing_days(&self) -> Option<u32> {
        self.estimated_processing_days
    }
}

impl TryFrom<PermitTypeConfig> for PermitTypeDefinition {
    type Error = DomainError;

    fn try_from(config: PermitTypeConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl From<PermitTypeDefinition> for PermitTypeConfig {
    fn from(definition: PermitTypeDefinition) -> Self {
        Self {
            code: definition.code,
            name: definition.name,
            fields: definition.fields,
            fee_rules: definition.fee_rules,
            required_departments: definition.required_departments,
            required_inspections: definition.required_inspections,
            estimated_processing_days: definition.estimated_processing_days,
        }
    }
}
