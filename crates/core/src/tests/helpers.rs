// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    ApplyContext, Command, NewPermit, PermitRecord, TransitionResult, apply, create_permit,
};
use permit_portal_audit::{Actor, Cause};
use permit_portal_domain::{
    ApplicantInfo, ApplicationPayload, Department, FeeRule, FieldDefinition, FieldOption,
    FieldType, Municipality, PermitStatus, PermitTypeConfig, PermitTypeDefinition,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::macros::datetime;

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("staff-123"), String::from("staff"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Staff request"))
}

pub fn create_reviewer_actor(department: &str) -> Actor {
    Actor::new(format!("{department}-reviewer"), String::from("reviewer"))
}

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-02 15:30 UTC)
}

pub fn create_test_context() -> ApplyContext {
    ApplyContext::new(test_now())
}

pub fn department(code: &str) -> Department {
    Department::new(code).unwrap()
}

pub fn create_test_municipality() -> Municipality {
    Municipality::new("Spring Valley").unwrap().with_id(1)
}

/// A building permit reviewed by the building and fire departments.
pub fn create_test_permit_type() -> PermitTypeDefinition {
    let mut config = PermitTypeConfig::new("building", "Residential Building Permit");
    config.fields = vec![
        FieldDefinition::new("project_value", "Project Value", FieldType::Currency).required(),
        FieldDefinition::new("work_type", "Type of Work", FieldType::Select)
            .required()
            .with_options(vec![
                FieldOption::new("addition", "Addition"),
                FieldOption::new("remodel", "Remodel"),
            ]),
        FieldDefinition::new("description", "Description", FieldType::Textarea),
    ];
    config.fee_rules = vec![
        FeeRule::Fixed {
            description: String::from("Base permit fee"),
            amount: Decimal::new(15000, 2),
        },
        FeeRule::Percentage {
            description: String::from("Project value fee"),
            percentage: Decimal::ONE,
            base_field: String::from("project_value"),
        },
    ];
    config.required_departments = [department("building"), department("fire")]
        .into_iter()
        .collect();
    config.required_inspections = vec![String::from("framing"), String::from("final")];
    PermitTypeDefinition::new(config).unwrap()
}

pub fn create_test_payload() -> ApplicationPayload {
    ApplicationPayload::new()
        .with("project_value", 80000)
        .with("work_type", "addition")
}

pub fn create_test_applicant() -> ApplicantInfo {
    ApplicantInfo::new("Dana Whitfield", "dana@example.org")
}

/// A freshly submitted permit for the test permit type.
pub fn create_submitted_permit() -> PermitRecord {
    let municipality = create_test_municipality();
    let permit_type = create_test_permit_type();
    let request = NewPermit {
        municipality: &municipality,
        permit_type_id: 10,
        permit_type: &permit_type,
        applicant: create_test_applicant(),
        contractor: None,
        payload: create_test_payload(),
        as_draft: false,
    };
    let mut record = create_permit(
        request,
        Actor::new(String::from("applicant-1"), String::from("applicant")),
        create_test_cause(),
        &create_test_context(),
    )
    .unwrap()
    .new_record;
    record.permit_id = Some(100);
    record
}

/// Applies a transition as staff, panicking if it is rejected.
pub fn transition(record: &PermitRecord, target: PermitStatus) -> PermitRecord {
    let result: TransitionResult = apply(
        record,
        Command::Transition {
            target,
            notes: None,
        },
        create_test_actor(),
        create_test_cause(),
        &create_test_context(),
    )
    .unwrap();
    result.new_record
}

/// A submitted permit moved into review.
pub fn create_under_review_permit() -> PermitRecord {
    transition(&create_submitted_permit(), PermitStatus::UnderReview)
}
