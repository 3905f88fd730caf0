// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Fee rules and the fee calculation engine.
//!
//! Every rule contributes independently; contributions become line items
//! rounded to cents and the total is the sum of the line items. Amounts are
//! `Decimal` throughout.

use crate::error::DomainError;
use crate::payload::ApplicationPayload;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds an amount to cents, midpoint away from zero, with a scale of exactly 2.
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded: Decimal =
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Charge applied by a matching fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierCharge {
    /// Flat amount.
    Amount(Decimal),
    /// Percentage of the base value.
    Percentage(Decimal),
}

/// One range of a tiered fee rule. Bounds are inclusive; a missing `max`
/// leaves the tier open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub min: Decimal,
    #[serde(default)]
    pub max: Option<Decimal>,
    #[serde(flatten)]
    pub charge: TierCharge,
}

impl FeeTier {
    #[must_use]
    pub const fn new(min: Decimal, max: Option<Decimal>, charge: TierCharge) -> Self {
        Self { min, max, charge }
    }

    /// Returns true if `value` falls inside this tier.
    #[must_use]
    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }
}

/// One component of a permit type's fee schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeRule {
    /// A flat fee charged on every application.
    Fixed { description: String, amount: Decimal },
    /// A percentage of a numeric application field.
    Percentage {
        description: String,
        percentage: Decimal,
        base_field: String,
    },
    /// A unit price multiplied by a numeric application field.
    PerUnit {
        description: String,
        unit_amount: Decimal,
        unit_field: String,
    },
    /// The first tier containing a numeric application field's value.
    Tiered {
        description: String,
        base_field: String,
        tiers: Vec<FeeTier>,
    },
}

impl FeeRule {
    /// Returns the line item description of this rule.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Fixed { description, .. }
            | Self::Percentage { description, .. }
            | Self::PerUnit { description, .. }
            | Self::Tiered { description, .. } => description,
        }
    }

    /// Returns the application field this rule reads, if any.
    #[must_use]
    pub fn input_field(&self) -> Option<&str> {
        match self {
            Self::Fixed { .. } => None,
            Self::Percentage { base_field, .. } | Self::Tiered { base_field, .. } => {
                Some(base_field)
            }
            Self::PerUnit { unit_field, .. } => Some(unit_field),
        }
    }

    /// Checks that the rule is well formed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFeeRule` if:
    /// - the description is empty
    /// - an amount, unit amount or percentage is negative
    /// - a percentage, per-unit or tiered rule names no input field
    /// - a tiered rule has no tiers or a tier with `min > max`
    pub fn validate(&self, index: usize) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidFeeRule { index, reason };

        if self.description().trim().is_empty() {
            return Err(invalid(String::from("description cannot be empty")));
        }
        if let Some(field) = self.input_field()
            && field.trim().is_empty()
        {
            return Err(invalid(String::from("rule must name its input field")));
        }

        match self {
            Self::Fixed { amount, .. } if amount.is_sign_negative() => {
                Err(invalid(String::from("amount cannot be negative")))
            }
            Self::Percentage { percentage, .. } if percentage.is_sign_negative() => {
                Err(invalid(String::from("percentage cannot be negative")))
            }
            Self::PerUnit { unit_amount, .. } if unit_amount.is_sign_negative() => {
                Err(invalid(String::from("unit amount cannot be negative")))
            }
            Self::Tiered { tiers, .. } => {
                if tiers.is_empty() {
                    return Err(invalid(String::from("tiered rule needs at least one tier")));
                }
                for (position, tier) in tiers.iter().enumerate() {
                    if let Some(max) = tier.max
                        && tier.min > max
                    {
                        return Err(invalid(format!("tier {position} has min above max")));
                    }
                    let charge: Decimal = match tier.charge {
                        TierCharge::Amount(value) | TierCharge::Percentage(value) => value,
                    };
                    if charge.is_sign_negative() {
                        return Err(invalid(format!("tier {position} has a negative charge")));
                    }
                }
                Ok(())
            }
            Self::Fixed { .. } | Self::Percentage { .. } | Self::PerUnit { .. } => Ok(()),
        }
    }

    /// Returns the rule with tiered ranges sorted by `min`.
    ///
    /// The sort is stable, so tiers sharing a `min` keep their authored order.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Tiered {
                description,
                base_field,
                mut tiers,
            } => {
                tiers.sort_by(|a, b| a.min.cmp(&b.min));
                Self::Tiered {
                    description,
                    base_field,
                    tiers,
                }
            }
            other => other,
        }
    }

    /// Computes this rule's unrounded contribution.
    ///
    /// Returns `Ok(None)` when the rule does not apply: its input field is
    /// missing or not numeric, or no tier contains the base value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FeeAmountOverflow` if the submitted value is too
    /// large for the charge to be represented.
    pub fn contribution(
        &self,
        payload: &ApplicationPayload,
    ) -> Result<Option<Decimal>, DomainError> {
        let overflow = || DomainError::FeeAmountOverflow {
            description: self.description().to_string(),
            field: self.input_field().map(str::to_string),
        };

        let amount: Option<Decimal> = match self {
            Self::Fixed { amount, .. } => Some(*amount),
            Self::Percentage {
                percentage,
                base_field,
                ..
            } => match payload.decimal(base_field) {
                Some(base) => Some(percentage_of(base, *percentage).ok_or_else(overflow)?),
                None => None,
            },
            Self::PerUnit {
                unit_amount,
                unit_field,
                ..
            } => match payload.decimal(unit_field) {
                Some(units) => Some(units.checked_mul(*unit_amount).ok_or_else(overflow)?),
                None => None,
            },
            Self::Tiered {
                base_field, tiers, ..
            } => {
                let Some(base) = payload.decimal(base_field) else {
                    return Ok(None);
                };
                let Some(tier) = tiers.iter().find(|tier| tier.contains(base)) else {
                    return Ok(None);
                };
                Some(match tier.charge {
                    TierCharge::Amount(amount) => amount,
                    TierCharge::Percentage(percentage) => {
                        percentage_of(base, percentage).ok_or_else(overflow)?
                    }
                })
            }
        };
        Ok(amount)
    }
}

fn percentage_of(base: Decimal, percentage: Decimal) -> Option<Decimal> {
    base.checked_mul(percentage)?.checked_div(ONE_HUNDRED)
}

/// One charged line of a permit's fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLineItem {
    pub description: String,
    pub amount: Decimal,
}

impl FeeLineItem {
    #[must_use]
    pub fn new(description: &str, amount: Decimal) -> Self {
        Self {
            description: description.to_string(),
            amount,
        }
    }
}

/// Result of running a fee schedule against an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeCalculation {
    pub line_items: Vec<FeeLineItem>,
    pub total: Decimal,
}

impl FeeCalculation {
    /// Builds a calculation whose total is the rounded sum of `line_items`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FeeAmountOverflow` if the line items cannot be summed.
    pub fn from_line_items(line_items: Vec<FeeLineItem>) -> Result<Self, DomainError> {
        let sum: Decimal = line_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.amount))
            .ok_or_else(|| DomainError::FeeAmountOverflow {
                description: String::from("fee total"),
                field: None,
            })?;
        Ok(Self {
            line_items,
            total: round_currency(sum),
        })
    }
}

/// Computes the fees owed for an application.
///
/// Rules that do not apply contribute no line item. Negative contributions
/// (from negative submitted values) are clamped to zero, so the total is
/// never negative.
///
/// # Errors
///
/// Returns `DomainError::FeeAmountOverflow` if a submitted value is too
/// large to price.
pub fn calculate_fees(
    rules: &[FeeRule],
    payload: &ApplicationPayload,
) -> Result<FeeCalculation, DomainError> {
    let mut line_items: Vec<FeeLineItem> = Vec::with_capacity(rules.len());
    for rule in rules {
        if let Some(amount) = rule.contribution(payload)? {
            line_items.push(FeeLineItem::new(
                rule.description(),
                round_currency(amount.max(Decimal::ZERO)),
            ));
        }
    }

    FeeCalculation::from_line_items(line_items)
}

/// Municipality-wide bounds on a permit's total fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeLimits {
    pub minimum_fee: Option<Decimal>,
    pub maximum_fee: Option<Decimal>,
}

impl FeeLimits {
    /// Checks that the limits are non-negative and ordered.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFeeLimits` if either bound is negative or
    /// the minimum exceeds the maximum.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.minimum_fee.is_some_and(|min| min.is_sign_negative())
            || self.maximum_fee.is_some_and(|max| max.is_sign_negative())
        {
            return Err(DomainError::InvalidFeeLimits(String::from(
                "fee limits cannot be negative",
            )));
        }
        if let (Some(min), Some(max)) = (self.minimum_fee, self.maximum_fee)
            && min > max
        {
            return Err(DomainError::InvalidFeeLimits(format!(
                "minimum fee {min} exceeds maximum fee {max}"
            )));
        }
        Ok(())
    }
}

/// Brings a calculation's total within the municipality's limits.
///
/// The correction is added as its own line item so that the total still
/// equals the sum of the line items.
///
/// # Errors
///
/// Returns `DomainError::FeeAmountOverflow` if the adjusted total cannot be summed.
pub fn apply_fee_limits(
    calculation: FeeCalculation,
    limits: &FeeLimits,
) -> Result<FeeCalculation, DomainError> {
    let total: Decimal = calculation.total;
    let adjustment: Option<FeeLineItem> = match (limits.minimum_fee, limits.maximum_fee) {
        (Some(min), _) if total < min => Some(FeeLineItem::new(
            "Minimum fee adjustment",
            round_currency(min - total),
        )),
        (_, Some(max)) if total > max => Some(FeeLineItem::new(
            "Maximum fee adjustment",
            round_currency(max - total),
        )),
        _ => None,
    };

    match adjustment {
        Some(item) => {
            let mut line_items: Vec<FeeLineItem> = calculation.line_items;
            line_items.push(item);
            FeeCalculation::from_line_items(line_items)
        }
        None => Ok(calculation),
    }
}
