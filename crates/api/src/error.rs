// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use permit_portal::CoreError;
use permit_portal_domain::{DomainError, FieldError, PermitStatus};
use permit_portal_persistence::{ModifyError, PersistenceError};

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The actor may not perform the action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The application does not satisfy the permit type's fields.
    ValidationFailed {
        /// One error per invalid field.
        errors: Vec<FieldError>,
    },
    /// The requested status is not reachable from the current one.
    InvalidTransition {
        current: PermitStatus,
        requested: PermitStatus,
        /// The statuses reachable from `current`.
        allowed: Vec<PermitStatus>,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// Municipality or permit type configuration is malformed.
    ///
    /// Meant for staff authoring the configuration, not for applicants.
    ConfigurationError {
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// Another writer got there first. Repeating the request may succeed.
    RetryableConflict {
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns true if the request may succeed when repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableConflict { .. })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role}")
            }
            Self::ValidationFailed { errors } => {
                let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
                write!(f, "Validation failed: {}", messages.join("; "))
            }
            Self::InvalidTransition {
                current,
                requested,
                allowed,
            } => {
                let allowed_list: Vec<&str> = allowed.iter().map(PermitStatus::as_str).collect();
                write!(
                    f,
                    "Cannot move permit from '{current}' to '{requested}'; allowed: [{}]",
                    allowed_list.join(", ")
                )
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ConfigurationError { message } => {
                write!(f, "Configuration error: {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::RetryableConflict { message } => {
                write!(f, "Conflicting update, please retry: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<ModifyError<Self>> for ApiError {
    fn from(err: ModifyError<Self>) -> Self {
        match err {
            ModifyError::Persistence(persistence_err) => translate_persistence_error(persistence_err),
            ModifyError::Rejected(api_err) => api_err,
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidStatusTransition { from, to, allowed } => ApiError::InvalidTransition {
            current: from,
            requested: to,
            allowed,
        },
        DomainError::InvalidPermitStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("'{status}' is not a permit status"),
        },
        DomainError::InvalidReviewStatus { status } => ApiError::InvalidInput {
            field: String::from("review_status"),
            message: format!("Invalid review status: {status}"),
        },
        DomainError::InvalidPermitNumber(msg) => ApiError::InvalidInput {
            field: String::from("permit_number"),
            message: msg,
        },
        DomainError::DateArithmeticOverflow { operation } => ApiError::DomainRuleViolation {
            rule: String::from("lifecycle_dates"),
            message: format!("Date arithmetic overflow while {operation}"),
        },
        overflow @ DomainError::FeeAmountOverflow { .. } => ApiError::DomainRuleViolation {
            rule: String::from("fee_amount"),
            message: overflow.to_string(),
        },
        configuration_err @ (DomainError::InvalidDepartment(_)
        | DomainError::InvalidFieldDefinition { .. }
        | DomainError::DuplicateFieldName(_)
        | DomainError::InvalidFeeRule { .. }
        | DomainError::InvalidFeeLimits(_)
        | DomainError::InvalidPermitType(_)
        | DomainError::InvalidMunicipality(_)
        | DomainError::InvalidTimezone { .. }) => ApiError::ConfigurationError {
            message: configuration_err.to_string(),
        },
    }
}

/// Translates a core error into an API error.
///
/// A department outside the permit's required set is an authorization
/// failure, not bad input.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::ValidationFailed(errors) => ApiError::ValidationFailed { errors },
        CoreError::DepartmentNotAssigned { department } => ApiError::Unauthorized {
            action: format!("review for department '{department}'"),
            required_role: String::from("a department required by the permit"),
        },
        CoreError::ReviewsNotOpen { status } => ApiError::DomainRuleViolation {
            rule: String::from("reviews_open"),
            message: format!("Department reviews are not open while the permit is {status}"),
        },
        CoreError::AmendmentNotAllowed { status } => ApiError::DomainRuleViolation {
            rule: String::from("amendment_window"),
            message: format!("The application cannot be amended while the permit is {status}"),
        },
        err @ CoreError::FeeInvariantViolated { .. } => ApiError::Internal {
            message: err.to_string(),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    if err.is_retryable() {
        return ApiError::RetryableConflict {
            message: err.to_string(),
        };
    }

    match err {
        PersistenceError::MunicipalityNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Municipality"),
            message: format!("Municipality with ID {id} does not exist"),
        },
        PersistenceError::PermitTypeNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Permit type"),
            message: format!("Permit type with ID {id} does not exist"),
        },
        PersistenceError::PermitNotFound(key) => ApiError::ResourceNotFound {
            resource_type: String::from("Permit"),
            message: format!("Permit {key} does not exist"),
        },
        PersistenceError::NotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message: msg,
        },
        PersistenceError::DuplicateMunicipality(msg) => ApiError::DomainRuleViolation {
            rule: String::from("unique_municipality_name"),
            message: msg,
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
