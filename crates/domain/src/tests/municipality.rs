// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{DomainError, FeeLimits, Municipality, municipality_code};
use rust_decimal::Decimal;
use time::macros::datetime;

#[test]
fn test_municipality_code_strips_and_truncates() {
    assert_eq!(municipality_code("Spring Valley"), "SPRING");
    assert_eq!(municipality_code("St. Paul"), "STPAUL");
    assert_eq!(municipality_code("Oak"), "OAK");
    assert_eq!(municipality_code("Winston-Salem"), "WINSTO");
}

#[test]
fn test_municipality_requires_letters() {
    assert!(matches!(
        Municipality::new(""),
        Err(DomainError::InvalidMunicipality(_))
    ));
    assert!(matches!(
        Municipality::new("123 456"),
        Err(DomainError::InvalidMunicipality(_))
    ));
}

#[test]
fn test_snapshot_copies_name_and_code() {
    let municipality = Municipality::new("Spring Valley").unwrap();
    let snapshot = municipality.snapshot();

    assert_eq!(snapshot.name, "Spring Valley");
    assert_eq!(snapshot.code, "SPRING");
}

#[test]
fn test_unknown_timezone_rejected() {
    let result = Municipality::new("Oak").unwrap().with_timezone("Mars/Olympus");
    assert!(matches!(result, Err(DomainError::InvalidTimezone { .. })));
}

#[test]
fn test_local_year_uses_timezone() {
    let instant = datetime!(2027-01-01 03:00 UTC);

    let utc = Municipality::new("Oak").unwrap();
    assert_eq!(utc.local_year(instant), Ok(2027));

    let pacific = Municipality::new("Oak")
        .unwrap()
        .with_timezone("America/Los_Angeles")
        .unwrap();
    assert_eq!(pacific.local_year(instant), Ok(2026));
}

#[test]
fn test_invalid_fee_limits_rejected() {
    let limits = FeeLimits {
        minimum_fee: Some(Decimal::from(-5)),
        maximum_fee: None,
    };
    assert!(Municipality::new("Oak").unwrap().with_fee_limits(limits).is_err());
}
