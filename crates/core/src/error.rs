// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use permit_portal_domain::{Department, DomainError, FieldError, PermitStatus};
use rust_decimal::Decimal;

/// Errors that can occur while applying a change to a permit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The submitted application does not satisfy the permit type's fields.
    ValidationFailed(Vec<FieldError>),
    /// The department is not one of the permit's required departments.
    DepartmentNotAssigned { department: Department },
    /// Department reviews cannot be recorded or reset in this status.
    ReviewsNotOpen { status: PermitStatus },
    /// The application cannot be amended in this status.
    AmendmentNotAllowed { status: PermitStatus },
    /// The stored total does not equal the sum of the fee line items.
    FeeInvariantViolated { total: Decimal, sum: Decimal },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::ValidationFailed(errors) => {
                write!(f, "Application has {} invalid field(s)", errors.len())?;
                for error in errors {
                    write!(f, "; {}", error.message)?;
                }
                Ok(())
            }
            Self::DepartmentNotAssigned { department } => write!(
                f,
                "Department '{department}' is not assigned to review this permit"
            ),
            Self::ReviewsNotOpen { status } => {
                write!(f, "Department reviews are not open while the permit is {status}")
            }
            Self::AmendmentNotAllowed { status } => {
                write!(f, "The application cannot be amended while the permit is {status}")
            }
            Self::FeeInvariantViolated { total, sum } => write!(
                f,
                "Total fees {total} do not equal the sum of fee line items {sum}"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
