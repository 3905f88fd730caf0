// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Workflow configuration.
//!
//! Settings come from `PERMIT_*` environment variables. Unset variables keep
//! their defaults.

use permit_portal::ApplyContext;
use permit_portal_audit::Actor;
use permit_portal_domain::{DEFAULT_EXPIRATION_MONTHS, HiddenFieldPolicy};
use thiserror::Error;
use time::OffsetDateTime;

pub const HIDDEN_FIELD_POLICY_VAR: &str = "PERMIT_HIDDEN_FIELD_POLICY";
pub const EXPIRATION_MONTHS_VAR: &str = "PERMIT_EXPIRATION_MONTHS";
pub const SYSTEM_ACTOR_ID_VAR: &str = "PERMIT_SYSTEM_ACTOR_ID";
pub const NUMBER_ALLOCATION_ATTEMPTS_VAR: &str = "PERMIT_NUMBER_ALLOCATION_ATTEMPTS";

/// Upper bound on the approval-to-expiration span.
const MAX_EXPIRATION_MONTHS: u32 = 120;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The hidden field policy is not one of the known policies.
    #[error("{key} must be 'validate_all' or 'skip_hidden', got '{value}'")]
    InvalidHiddenFieldPolicy { key: &'static str, value: String },

    /// A numeric setting does not parse.
    #[error("{key} must be a whole number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    /// A numeric setting is outside its allowed range.
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The system actor ID is blank.
    #[error("{key} must not be blank")]
    BlankSystemActor { key: &'static str },
}

/// Settings for the permit workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Whether fields hidden by their display condition are validated.
    pub hidden_field_policy: HiddenFieldPolicy,
    /// Months from approval until a permit expires.
    pub expiration_months: u32,
    /// Actor ID recorded on automatic approvals.
    pub system_actor_id: String,
    /// How many times a write that lost a race is attempted in total.
    pub max_number_allocation_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            hidden_field_policy: HiddenFieldPolicy::default(),
            expiration_months: DEFAULT_EXPIRATION_MONTHS,
            system_actor_id: String::from("permit-workflow"),
            max_number_allocation_attempts: 3,
        }
    }
}

impl WorkflowConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from any key/value source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = Self::default();

        if let Some(value) = lookup(HIDDEN_FIELD_POLICY_VAR) {
            config.hidden_field_policy =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidHiddenFieldPolicy {
                        key: HIDDEN_FIELD_POLICY_VAR,
                        value,
                    })?;
        }
        if let Some(value) = lookup(EXPIRATION_MONTHS_VAR) {
            config.expiration_months =
                parse_bounded(EXPIRATION_MONTHS_VAR, &value, 1, MAX_EXPIRATION_MONTHS)?;
        }
        if let Some(value) = lookup(SYSTEM_ACTOR_ID_VAR) {
            let trimmed: &str = value.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::BlankSystemActor {
                    key: SYSTEM_ACTOR_ID_VAR,
                });
            }
            config.system_actor_id = trimmed.to_string();
        }
        if let Some(value) = lookup(NUMBER_ALLOCATION_ATTEMPTS_VAR) {
            config.max_number_allocation_attempts =
                parse_bounded(NUMBER_ALLOCATION_ATTEMPTS_VAR, &value, 1, 20)?;
        }

        Ok(config)
    }

    /// Returns the context for changes made at `now`.
    #[must_use]
    pub fn apply_context(&self, now: OffsetDateTime) -> ApplyContext {
        ApplyContext::new(now)
            .with_expiration_months(self.expiration_months)
            .with_hidden_field_policy(self.hidden_field_policy)
    }

    /// Returns the actor recorded on automatic approvals.
    #[must_use]
    pub fn system_actor(&self) -> Actor {
        Actor::system(&self.system_actor_id)
    }
}

fn parse_bounded(key: &'static str, value: &str, min: u32, max: u32) -> Result<u32, ConfigError> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })?;
    if parsed < min || parsed > max {
        return Err(ConfigError::OutOfRange {
            key,
            value: parsed,
            min,
            max,
        });
    }
    Ok(parsed)
}
