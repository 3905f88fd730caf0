// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    ApplicationPayload, DomainError, FeeCalculation, FeeLimits, FeeRule, FeeTier, TierCharge,
    apply_fee_limits, calculate_fees, round_currency,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn assert_sum_invariant(calculation: &FeeCalculation) {
    let sum: Decimal = calculation.line_items.iter().map(|item| item.amount).sum();
    assert_eq!(calculation.total, sum);
    assert_eq!(calculation.total.scale(), 2);
    assert!(!calculation.total.is_sign_negative());
}

fn valuation_tiers() -> FeeRule {
    FeeRule::Tiered {
        description: String::from("Valuation fee"),
        base_field: String::from("valuation"),
        tiers: vec![
            FeeTier::new(dec("0"), Some(dec("10000")), TierCharge::Amount(dec("100"))),
            FeeTier::new(dec("10000"), Some(dec("50000")), TierCharge::Amount(dec("300"))),
        ],
    }
}

#[test]
fn test_tiered_fee_uses_matching_tier() {
    let payload = ApplicationPayload::new().with("valuation", 25000);
    let calculation = calculate_fees(&[valuation_tiers()], &payload).unwrap();

    assert_eq!(calculation.total, dec("300.00"));
    assert_eq!(calculation.line_items.len(), 1);
    assert_eq!(calculation.line_items[0].description, "Valuation fee");
    assert_sum_invariant(&calculation);
}

#[test]
fn test_tiered_fee_boundary_uses_first_tier() {
    let payload = ApplicationPayload::new().with("valuation", 10000);
    let calculation = calculate_fees(&[valuation_tiers()], &payload).unwrap();

    assert_eq!(calculation.total, dec("100.00"));
}

#[test]
fn test_tiered_fee_outside_all_tiers_contributes_nothing() {
    let payload = ApplicationPayload::new().with("valuation", 75000);
    let calculation = calculate_fees(&[valuation_tiers()], &payload).unwrap();

    assert_eq!(calculation.total, dec("0.00"));
    assert_sum_invariant(&calculation);
}

#[test]
fn test_open_ended_tier_percentage() {
    let rule = FeeRule::Tiered {
        description: String::from("Large project"),
        base_field: String::from("valuation"),
        tiers: vec![FeeTier::new(
            dec("50000"),
            None,
            TierCharge::Percentage(dec("0.5")),
        )],
    };
    let payload = ApplicationPayload::new().with("valuation", "$1,000,000");
    let calculation = calculate_fees(&[rule], &payload).unwrap();

    assert_eq!(calculation.total, dec("5000.00"));
}

#[test]
fn test_base_fee_plus_percentage() {
    let rules = vec![
        FeeRule::Fixed {
            description: String::from("Base permit fee"),
            amount: dec("150.00"),
        },
        FeeRule::Percentage {
            description: String::from("Project value fee"),
            percentage: dec("1"),
            base_field: String::from("project_value"),
        },
    ];
    let payload = ApplicationPayload::new().with("project_value", 80000);
    let calculation = calculate_fees(&rules, &payload).unwrap();

    assert_eq!(calculation.line_items[1].amount, dec("800.00"));
    assert_eq!(calculation.total, dec("950.00"));
    assert_sum_invariant(&calculation);
}

#[test]
fn test_missing_input_contributes_nothing() {
    let rules = vec![
        FeeRule::Percentage {
            description: String::from("Project value fee"),
            percentage: dec("1"),
            base_field: String::from("project_value"),
        },
        FeeRule::PerUnit {
            description: String::from("Fixture fee"),
            unit_amount: dec("12.50"),
            unit_field: String::from("fixtures"),
        },
    ];
    let payload = ApplicationPayload::new().with("project_value", "not a number");
    let calculation = calculate_fees(&rules, &payload).unwrap();

    assert_eq!(calculation.total, dec("0.00"));
    assert_sum_invariant(&calculation);
}

#[test]
fn test_per_unit_fee_rounds_half_away_from_zero() {
    let rule = FeeRule::PerUnit {
        description: String::from("Fixture fee"),
        unit_amount: dec("0.125"),
        unit_field: String::from("fixtures"),
    };
    let payload = ApplicationPayload::new().with("fixtures", 1);
    let calculation = calculate_fees(&[rule], &payload).unwrap();

    assert_eq!(calculation.total, dec("0.13"));
}

#[test]
fn test_negative_input_is_clamped() {
    let rule = FeeRule::PerUnit {
        description: String::from("Fixture fee"),
        unit_amount: dec("10"),
        unit_field: String::from("fixtures"),
    };
    let payload = ApplicationPayload::new().with("fixtures", -4);
    let calculation = calculate_fees(&[rule], &payload).unwrap();

    assert_eq!(calculation.total, dec("0.00"));
    assert_sum_invariant(&calculation);
}

#[test]
fn test_oversized_percentage_base_reports_overflow() {
    let rule = FeeRule::Percentage {
        description: String::from("Project value fee"),
        percentage: dec("10"),
        base_field: String::from("project_value"),
    };
    let payload =
        ApplicationPayload::new().with("project_value", "10000000000000000000000000000");

    assert_eq!(
        calculate_fees(&[rule], &payload),
        Err(DomainError::FeeAmountOverflow {
            description: String::from("Project value fee"),
            field: Some(String::from("project_value")),
        })
    );
}

#[test]
fn test_oversized_unit_count_reports_overflow() {
    let rule = FeeRule::PerUnit {
        description: String::from("Fixture fee"),
        unit_amount: dec("12.50"),
        unit_field: String::from("fixtures"),
    };
    let payload = ApplicationPayload::new().with("fixtures", Decimal::MAX.to_string());

    assert!(matches!(
        calculate_fees(&[rule], &payload),
        Err(DomainError::FeeAmountOverflow { field: Some(field), .. }) if field == "fixtures"
    ));
}

#[test]
fn test_line_item_sum_overflow_is_an_error() {
    let rules = vec![
        FeeRule::Fixed {
            description: String::from("First"),
            amount: Decimal::MAX,
        },
        FeeRule::Fixed {
            description: String::from("Second"),
            amount: Decimal::MAX,
        },
    ];

    assert!(matches!(
        calculate_fees(&rules, &ApplicationPayload::new()),
        Err(DomainError::FeeAmountOverflow { field: None, .. })
    ));
}

#[test]
fn test_round_currency_keeps_two_places() {
    assert_eq!(round_currency(dec("12")).to_string(), "12.00");
    assert_eq!(round_currency(dec("2.675")).to_string(), "2.68");
    assert_eq!(round_currency(dec("-2.675")).to_string(), "-2.68");
}

#[test]
fn test_minimum_fee_adds_adjustment_line() {
    let rules = vec![FeeRule::Fixed {
        description: String::from("Base permit fee"),
        amount: dec("20"),
    }];
    let limits = FeeLimits {
        minimum_fee: Some(dec("50")),
        maximum_fee: None,
    };
    let calculation = apply_fee_limits(
        calculate_fees(&rules, &ApplicationPayload::new()).unwrap(),
        &limits,
    )
    .unwrap();

    assert_eq!(calculation.total, dec("50.00"));
    assert_eq!(calculation.line_items.len(), 2);
    assert_eq!(calculation.line_items[1].description, "Minimum fee adjustment");
    assert_sum_invariant(&calculation);
}

#[test]
fn test_maximum_fee_adds_negative_adjustment() {
    let rules = vec![FeeRule::Fixed {
        description: String::from("Base permit fee"),
        amount: dec("900"),
    }];
    let limits = FeeLimits {
        minimum_fee: None,
        maximum_fee: Some(dec("500")),
    };
    let calculation = apply_fee_limits(
        calculate_fees(&rules, &ApplicationPayload::new()).unwrap(),
        &limits,
    )
    .unwrap();

    assert_eq!(calculation.total, dec("500.00"));
    assert_eq!(calculation.line_items[1].amount, dec("-400.00"));
    assert_sum_invariant(&calculation);
}

#[test]
fn test_fee_limits_must_be_ordered() {
    let limits = FeeLimits {
        minimum_fee: Some(dec("100")),
        maximum_fee: Some(dec("50")),
    };
    assert!(limits.validate().is_err());
}

#[test]
fn test_fee_rule_json_shape() {
    let json = r#"{
        "type": "tiered",
        "description": "Valuation fee",
        "base_field": "valuation",
        "tiers": [
            {"min": "10000", "max": "50000", "amount": "300"},
            {"min": "0", "max": "10000", "amount": "100"}
        ]
    }"#;
    let rule: FeeRule = serde_json::from_str(json).unwrap();
    let FeeRule::Tiered { tiers, .. } = rule.normalized() else {
        panic!("expected a tiered rule");
    };

    assert_eq!(tiers[0].min, dec("0"));
    assert_eq!(tiers[0].charge, TierCharge::Amount(dec("100")));
}
