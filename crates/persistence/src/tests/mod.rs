// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use crate::SqlitePersistence;
use permit_portal::{ApplyContext, Command, NewPermit, PermitRecord, create_permit};
use permit_portal::{TransitionResult, apply};
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

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-02 15:30 UTC)
}

pub fn create_test_context() -> ApplyContext {
    ApplyContext::new(test_now())
}

pub fn department(code: &str) -> Department {
    Department::new(code).unwrap()
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

/// A registered municipality and one of its permit types.
pub struct Catalog {
    pub municipality: Municipality,
    pub permit_type_id: i64,
    pub permit_type: PermitTypeDefinition,
}

/// Registers a municipality under `name` with the building permit type.
pub fn setup_named_catalog(
    persistence: &mut SqlitePersistence,
    name: &str,
    timezone: Option<&str>,
) -> Catalog {
    let mut municipality = Municipality::new(name).unwrap();
    if let Some(timezone) = timezone {
        municipality = municipality.with_timezone(timezone).unwrap();
    }
    let municipality = persistence.register_municipality(&municipality).unwrap();
    let permit_type = create_test_permit_type();
    let permit_type_id = persistence
        .save_permit_type(
            municipality.municipality_id().unwrap(),
            &permit_type,
            test_now(),
        )
        .unwrap();

    Catalog {
        municipality,
        permit_type_id,
        permit_type,
    }
}

/// Spring Valley, in US Central time.
pub fn setup_catalog(persistence: &mut SqlitePersistence) -> Catalog {
    setup_named_catalog(persistence, "Spring Valley", Some("America/Chicago"))
}

/// Builds an unsaved permit created at `now`.
pub fn new_permit_record(catalog: &Catalog, now: OffsetDateTime) -> PermitRecord {
    let request = NewPermit {
        municipality: &catalog.municipality,
        permit_type_id: catalog.permit_type_id,
        permit_type: &catalog.permit_type,
        applicant: ApplicantInfo::new("Dana Whitfield", "dana@example.org"),
        contractor: None,
        payload: create_test_payload(),
        as_draft: false,
    };
    create_permit(
        request,
        Actor::new(String::from("applicant-1"), String::from("applicant")),
        create_test_cause(),
        &ApplyContext::new(now),
    )
    .unwrap()
    .new_record
}

/// Submits and stores a permit.
pub fn submit_permit(persistence: &mut SqlitePersistence, catalog: &Catalog) -> PermitRecord {
    persistence
        .insert_permit(&new_permit_record(catalog, test_now()))
        .unwrap()
}

/// Applies a staff transition without saving it.
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

/// Stores a permit that has been moved into review.
pub fn submit_permit_under_review(
    persistence: &mut SqlitePersistence,
    catalog: &Catalog,
) -> PermitRecord {
    let submitted = submit_permit(persistence, catalog);
    persistence
        .update_permit(&transition(&submitted, PermitStatus::UnderReview))
        .unwrap()
}
