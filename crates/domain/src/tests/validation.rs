// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    ApplicationPayload, ConditionOperator, ConditionalDisplay, FieldConstraints, FieldDefinition,
    FieldOption, FieldPattern, FieldType, HiddenFieldPolicy, validate_application,
};
use rust_decimal::Decimal;

fn building_permit_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("owner_name", "Owner Name", FieldType::Text)
            .required()
            .with_constraints(FieldConstraints {
                min_length: Some(2),
                max_length: Some(80),
                ..FieldConstraints::default()
            }),
        FieldDefinition::new("owner_email", "Owner Email", FieldType::Email).required(),
        FieldDefinition::new("project_value", "Project Value", FieldType::Currency)
            .required()
            .with_constraints(FieldConstraints {
                min: Some(Decimal::ZERO),
                max: Some(Decimal::from(10_000_000)),
                ..FieldConstraints::default()
            }),
        FieldDefinition::new("work_type", "Type of Work", FieldType::Select)
            .required()
            .with_options(vec![
                FieldOption::new("new", "New Construction"),
                FieldOption::new("addition", "Addition"),
                FieldOption::new("remodel", "Remodel"),
            ]),
        FieldDefinition::new("start_date", "Start Date", FieldType::Date).required(),
        FieldDefinition::new("owner_phone", "Owner Phone", FieldType::Phone),
        FieldDefinition::new("parcel", "Parcel Number", FieldType::Text).with_constraints(
            FieldConstraints {
                pattern: Some(FieldPattern::new(r"^\d{3}-\d{4}$").unwrap()),
                pattern_message: Some(String::from("Parcel Number must look like 123-4567")),
                ..FieldConstraints::default()
            },
        ),
    ]
}

fn valid_payload() -> ApplicationPayload {
    ApplicationPayload::new()
        .with("owner_name", "Dana Whitfield")
        .with("owner_email", "dana@example.org")
        .with("project_value", "$80,000.00")
        .with("work_type", "addition")
        .with("start_date", "2026-05-01")
        .with("parcel", "123-4567")
        .with("owner_phone", "+1 (555) 123-4567")
}

fn validate(payload: &ApplicationPayload) -> Vec<crate::FieldError> {
    validate_application(&building_permit_fields(), payload, HiddenFieldPolicy::ValidateAll)
}

#[test]
fn test_valid_payload_has_no_errors() {
    assert!(validate(&valid_payload()).is_empty());
}

#[test]
fn test_every_required_field_removed_yields_exactly_its_error() {
    for field in building_permit_fields().iter().filter(|f| f.required) {
        let mut payload = valid_payload();
        payload.remove(&field.name);

        let errors = validate(&payload);
        assert_eq!(errors.len(), 1, "removing {}", field.name);
        assert_eq!(errors[0].field, field.name);
        assert_eq!(errors[0].message, format!("{} is required", field.label));
    }
}

#[test]
fn test_blank_string_is_missing() {
    let payload = valid_payload().with("owner_name", "   ");
    let errors = validate(&payload);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Owner Name is required");
}

#[test]
fn test_optional_field_may_be_absent() {
    let mut payload = valid_payload();
    payload.remove("parcel");
    assert!(validate(&payload).is_empty());
}

#[test]
fn test_invalid_email() {
    let payload = valid_payload().with("owner_email", "dana at example");
    let errors = validate(&payload);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Owner Email must be a valid email address");
}

#[test]
fn test_non_numeric_currency() {
    let payload = valid_payload().with("project_value", "eighty thousand");
    let errors = validate(&payload);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Project Value must be a number");
}

#[test]
fn test_numeric_bounds() {
    let errors = validate(&valid_payload().with("project_value", -1));
    assert_eq!(errors[0].message, "Project Value must be at least 0");

    let errors = validate(&valid_payload().with("project_value", 20_000_000));
    assert_eq!(errors[0].message, "Project Value must be at most 10000000");
}

#[test]
fn test_text_length_bounds() {
    let errors = validate(&valid_payload().with("owner_name", "D"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Owner Name must be at least 2 characters");
}

#[test]
fn test_pattern_uses_custom_message() {
    let errors = validate(&valid_payload().with("parcel", "12-34"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Parcel Number must look like 123-4567");
}

#[test]
fn test_pattern_survives_json_round_trip() {
    let field = &building_permit_fields()[6];
    let json = serde_json::to_value(field).unwrap();
    assert_eq!(json["constraints"]["pattern"], r"^\d{3}-\d{4}$");

    let restored: FieldDefinition = serde_json::from_value(json).unwrap();
    assert_eq!(&restored, field);
    assert!(
        serde_json::from_value::<FieldPattern>(serde_json::json!("([unclosed")).is_err()
    );
}

#[test]
fn test_phone_numbers() {
    for accepted in ["555-123-4567", "(555) 123-4567", "+44 20 7946 0958", "555.123.4567"] {
        assert!(
            validate(&valid_payload().with("owner_phone", accepted)).is_empty(),
            "{accepted}"
        );
    }
    for rejected in ["call me", "12345", "555-CALL-NOW", "+1 555 123 4567 890 12"] {
        let errors = validate(&valid_payload().with("owner_phone", rejected));
        assert_eq!(errors.len(), 1, "{rejected}");
        assert_eq!(errors[0].message, "Owner Phone must be a valid phone number");
    }
}

#[test]
fn test_select_requires_known_option() {
    let errors = validate(&valid_payload().with("work_type", "demolition"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Type of Work must be one of the listed options");
}

#[test]
fn test_date_format() {
    let errors = validate(&valid_payload().with("start_date", "05/01/2026"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Start Date must be a date in YYYY-MM-DD format");

    let errors = validate(&valid_payload().with("start_date", "2026-02-30"));
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_multiple_fields_report_independently() {
    let payload = valid_payload()
        .with("owner_email", "nope")
        .with("work_type", "demolition");
    let errors = validate(&payload);

    let names: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(names, vec!["owner_email", "work_type"]);
}

fn pool_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("has_pool", "Has Pool", FieldType::Radio)
            .required()
            .with_options(vec![FieldOption::new("yes", "Yes"), FieldOption::new("no", "No")]),
        FieldDefinition::new("pool_depth", "Pool Depth", FieldType::Number)
            .required()
            .shown_when(ConditionalDisplay::new(
                "has_pool",
                ConditionOperator::Equals,
                "yes",
            )),
    ]
}

#[test]
fn test_hidden_required_field_validated_by_default() {
    let payload = ApplicationPayload::new().with("has_pool", "no");
    let errors = validate_application(&pool_fields(), &payload, HiddenFieldPolicy::ValidateAll);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "pool_depth");
}

#[test]
fn test_hidden_required_field_skipped_when_configured() {
    let payload = ApplicationPayload::new().with("has_pool", "no");
    let errors = validate_application(&pool_fields(), &payload, HiddenFieldPolicy::SkipHidden);
    assert!(errors.is_empty());

    let payload = ApplicationPayload::new().with("has_pool", "yes");
    let errors = validate_application(&pool_fields(), &payload, HiddenFieldPolicy::SkipHidden);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_condition_operators() {
    let payload = ApplicationPayload::new()
        .with("stories", 3)
        .with("uses", serde_json::json!(["residential", "retail"]))
        .with("zone", "R-1");

    assert!(ConditionalDisplay::new("stories", ConditionOperator::GreaterThan, 2).is_satisfied_by(&payload));
    assert!(!ConditionalDisplay::new("stories", ConditionOperator::LessThan, "3").is_satisfied_by(&payload));
    assert!(ConditionalDisplay::new("stories", ConditionOperator::Equals, "3").is_satisfied_by(&payload));
    assert!(ConditionalDisplay::new("uses", ConditionOperator::Contains, "retail").is_satisfied_by(&payload));
    assert!(ConditionalDisplay::new("zone", ConditionOperator::Contains, "R-").is_satisfied_by(&payload));
    assert!(ConditionalDisplay::new("zone", ConditionOperator::NotEquals, "C-2").is_satisfied_by(&payload));
    assert!(ConditionalDisplay::new("missing", ConditionOperator::NotEquals, "x").is_satisfied_by(&payload));
    assert!(!ConditionalDisplay::new("missing", ConditionOperator::Equals, "x").is_satisfied_by(&payload));
}
