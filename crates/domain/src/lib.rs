// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod department;
mod error;
mod fees;
mod fields;
mod lifecycle;
mod municipality;
mod payload;
mod permit_number;
mod permit_type;
mod status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use department::{Department, DepartmentReview, ReviewStatus};
pub use error::DomainError;
pub use fees::{
    FeeCalculation, FeeLimits, FeeLineItem, FeeRule, FeeTier, TierCharge, apply_fee_limits,
    calculate_fees, round_currency,
};
pub use fields::{
    ConditionOperator, ConditionalDisplay, FieldConstraints, FieldDefinition, FieldOption,
    FieldPattern, FieldType,
};
pub use lifecycle::{DEFAULT_EXPIRATION_MONTHS, LifecycleDates, add_months};
pub use municipality::{Municipality, MunicipalitySnapshot, municipality_code};
pub use payload::ApplicationPayload;
pub use permit_number::PermitNumber;
pub use permit_type::{PermitTypeConfig, PermitTypeDefinition};
pub use status::PermitStatus;
pub use types::{ApplicantInfo, ContractorInfo};
pub use validation::{FieldError, HiddenFieldPolicy, is_field_visible, validate_application};
