// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use permit_portal_audit::Cause;
use permit_portal_domain::{
    ApplicantInfo, ApplicationPayload, Department, FeeRule, FieldDefinition, FieldOption,
    FieldType, PermitTypeConfig,
};
use permit_portal_persistence::SqlitePersistence;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    AuthenticatedActor, DepartmentReviewRequest, DepartmentReviewResponse, PermitResponse,
    RegisterMunicipalityRequest, Role, SavePermitTypeRequest, SubmitPermitRequest,
    TransitionPermitRequest, WorkflowConfig, register_municipality, save_permit_type,
    submit_department_review, submit_permit, transition_permit,
};

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-02 15:30 UTC)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn create_test_config() -> WorkflowConfig {
    WorkflowConfig::default()
}

pub fn department(code: &str) -> Department {
    Department::new(code).unwrap()
}

pub fn create_test_admin() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("admin-1"), Role::Administrator)
}

pub fn create_test_applicant() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("applicant-1"), Role::Applicant)
}

pub fn create_other_applicant() -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("applicant-2"), Role::Applicant)
}

pub fn create_test_staff(municipality_id: i64) -> AuthenticatedActor {
    AuthenticatedActor::new(String::from("staff-1"), Role::Staff).with_municipality(municipality_id)
}

pub fn create_test_reviewer(municipality_id: i64, code: &str) -> AuthenticatedActor {
    AuthenticatedActor::new(format!("{code}-reviewer"), Role::Reviewer)
        .with_municipality(municipality_id)
        .with_departments([department(code)])
}

/// A building permit reviewed by the building and fire departments.
///
/// Fees are $150.00 plus 1% of the project value.
pub fn create_test_permit_type() -> PermitTypeConfig {
    let mut config = PermitTypeConfig::new("building", "Residential Building Permit");
    config.fields = vec![
        FieldDefinition::new("project_value", "Project Value", FieldType::Currency).required(),
        FieldDefinition::new("work_type", "Type of Work", FieldType::Select)
            .required()
            .with_options(vec![
                FieldOption::new("addition", "Addition"),
                FieldOption::new("remodel", "Remodel"),
            ]),
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
    config
}

pub fn create_test_payload() -> ApplicationPayload {
    ApplicationPayload::new()
        .with("project_value", 80000)
        .with("work_type", "addition")
}

/// A registered municipality with the building permit type.
pub struct Fixture {
    pub municipality_id: i64,
    pub permit_type_id: i64,
}

/// Registers Spring Valley and its building permit type.
pub fn setup_fixture(persistence: &mut SqlitePersistence) -> Fixture {
    let municipality = register_municipality(
        persistence,
        &RegisterMunicipalityRequest {
            name: String::from("Spring Valley"),
            timezone: Some(String::from("America/Chicago")),
            minimum_fee: None,
            maximum_fee: None,
        },
        &create_test_admin(),
    )
    .unwrap();

    let permit_type = save_permit_type(
        persistence,
        SavePermitTypeRequest {
            municipality_id: municipality.municipality_id,
            definition: create_test_permit_type(),
        },
        &create_test_staff(municipality.municipality_id),
        test_now(),
    )
    .unwrap();

    Fixture {
        municipality_id: municipality.municipality_id,
        permit_type_id: permit_type.permit_type_id,
    }
}

pub fn create_submit_request(fixture: &Fixture) -> SubmitPermitRequest {
    SubmitPermitRequest {
        permit_type_id: fixture.permit_type_id,
        applicant: ApplicantInfo::new("Dana Whitfield", "dana@example.org"),
        contractor: None,
        payload: create_test_payload(),
        as_draft: false,
    }
}

/// Submits the standard application as the test applicant.
pub fn submit_test_permit(persistence: &mut SqlitePersistence, fixture: &Fixture) -> PermitResponse {
    submit_permit(
        persistence,
        create_submit_request(fixture),
        &create_test_applicant(),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    )
    .unwrap()
}

/// Moves a permit to `new_status` as staff.
pub fn staff_transition(
    persistence: &mut SqlitePersistence,
    fixture: &Fixture,
    permit_id: i64,
    new_status: &str,
) -> PermitResponse {
    transition_permit(
        persistence,
        &TransitionPermitRequest {
            permit_id,
            new_status: String::from(new_status),
            notes: None,
        },
        &create_test_staff(fixture.municipality_id),
        &create_test_cause(),
        &create_test_config(),
        test_now(),
    )
    .unwrap()
}

/// Submits the standard application and moves it into review.
pub fn submit_under_review(persistence: &mut SqlitePersistence, fixture: &Fixture) -> PermitResponse {
    let submitted = submit_test_permit(persistence, fixture);
    staff_transition(persistence, fixture, submitted.permit_id, "under_review")
}

/// Records a verdict as the department's reviewer.
pub fn review(
    persistence: &mut SqlitePersistence,
    fixture: &Fixture,
    permit_id: i64,
    code: &str,
    status: &str,
) -> DepartmentReviewResponse {
    submit_department_review(
        persistence,
        &DepartmentReviewRequest {
            permit_id,
            department: String::from(code),
            status: String::from(status),
            notes: None,
        },
        &create_test_reviewer(fixture.municipality_id, code),
        &create_test_cause(),
        &create_test_config(),
        test_now(),
    )
    .unwrap()
}
