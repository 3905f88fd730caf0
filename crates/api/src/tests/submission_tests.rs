// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    create_other_applicant, create_submit_request, create_test_applicant, create_test_cause,
    create_test_config, create_test_reviewer, create_test_staff, setup_fixture,
    submit_test_permit, test_now,
};
use crate::{
    ApiError, AuthenticatedActor, PermitResponse, Role, get_permit, get_permit_audit_trail,
    get_permit_by_number, submit_permit,
};
use permit_portal_domain::{PermitStatus, ReviewStatus};
use permit_portal_persistence::SqlitePersistence;
use rust_decimal::Decimal;

#[test]
fn test_submit_computes_fees_and_assigns_number() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);

    let permit: PermitResponse = submit_test_permit(&mut persistence, &fixture);

    assert_eq!(permit.permit_number, "P2026-SPRING-001");
    assert_eq!(permit.status, PermitStatus::Submitted);
    assert_eq!(permit.fees.len(), 2);
    assert_eq!(permit.fees[1].amount, Decimal::new(80000, 2));
    assert_eq!(permit.total_fees, Decimal::new(95000, 2));
    assert_eq!(permit.submitted_at, Some(test_now()));
    assert_eq!(permit.municipality_name, "Spring Valley");
    assert_eq!(permit.required_departments, vec!["building", "fire"]);
    assert_eq!(permit.required_inspections, vec!["framing", "final"]);
    assert!(
        permit
            .reviews
            .iter()
            .all(|review| review.status == ReviewStatus::Pending)
    );
}

#[test]
fn test_numbers_increase_per_submission() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);

    submit_test_permit(&mut persistence, &fixture);
    let second = submit_test_permit(&mut persistence, &fixture);

    assert_eq!(second.permit_number, "P2026-SPRING-002");
}

#[test]
fn test_submit_as_draft_is_not_stamped_submitted() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let mut request = create_submit_request(&fixture);
    request.as_draft = true;

    let draft = submit_permit(
        &mut persistence,
        request,
        &create_test_applicant(),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    )
    .unwrap();

    assert_eq!(draft.status, PermitStatus::Draft);
    assert_eq!(draft.submitted_at, None);
    assert_eq!(draft.permit_number, "P2026-SPRING-001");
}

#[test]
fn test_missing_required_field_is_reported_by_label() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let mut request = create_submit_request(&fixture);
    request.payload.remove("work_type");

    let result = submit_permit(
        &mut persistence,
        request,
        &create_test_applicant(),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    );

    let Err(ApiError::ValidationFailed { errors }) = result else {
        panic!("expected ValidationFailed, got {result:?}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "work_type");
    assert_eq!(errors[0].message, "Type of Work is required");
    assert!(
        persistence
            .list_permit_ids(fixture.municipality_id, None)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_unknown_permit_type_is_not_found() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let mut request = create_submit_request(&fixture);
    request.permit_type_id = 404;

    let result = submit_permit(
        &mut persistence,
        request,
        &create_test_applicant(),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_reviewer_cannot_submit() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);

    let result = submit_permit(
        &mut persistence,
        create_submit_request(&fixture),
        &create_test_reviewer(fixture.municipality_id, "fire"),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_staff_can_only_submit_for_their_municipality() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);

    let own = submit_permit(
        &mut persistence,
        create_submit_request(&fixture),
        &create_test_staff(fixture.municipality_id),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    );
    let other = submit_permit(
        &mut persistence,
        create_submit_request(&fixture),
        &create_test_staff(fixture.municipality_id + 1),
        create_test_cause(),
        &create_test_config(),
        test_now(),
    );

    assert!(own.is_ok());
    assert!(matches!(other, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_submission_starts_the_audit_trail() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let permit = submit_test_permit(&mut persistence, &fixture);

    let trail = get_permit_audit_trail(&mut persistence, permit.permit_id, &create_test_applicant())
        .unwrap();

    assert_eq!(trail.events.len(), 1);
    assert_eq!(trail.events[0].action, "SubmitPermit");
    assert_eq!(trail.events[0].actor_id, "applicant-1");
    assert_eq!(trail.events[0].actor_type, "applicant");
    assert_eq!(trail.events[0].recorded_at, test_now());
}

#[test]
fn test_applicants_only_see_their_own_permits() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let permit = submit_test_permit(&mut persistence, &fixture);

    assert!(get_permit(&mut persistence, permit.permit_id, &create_test_applicant()).is_ok());
    assert!(matches!(
        get_permit(&mut persistence, permit.permit_id, &create_other_applicant()),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        get_permit_audit_trail(&mut persistence, permit.permit_id, &create_other_applicant()),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_get_permit_by_number() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let permit = submit_test_permit(&mut persistence, &fixture);
    let staff: AuthenticatedActor = create_test_staff(fixture.municipality_id);

    let found = get_permit_by_number(&mut persistence, "P2026-SPRING-001", &staff).unwrap();
    assert_eq!(found, permit);

    assert!(matches!(
        get_permit_by_number(&mut persistence, "P2026-SPRING-002", &staff),
        Err(ApiError::ResourceNotFound { .. })
    ));
    assert!(matches!(
        get_permit_by_number(&mut persistence, "not-a-number", &staff),
        Err(ApiError::InvalidInput { .. })
    ));
}

#[test]
fn test_missing_permit_is_not_found() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    setup_fixture(&mut persistence);
    let admin = AuthenticatedActor::new(String::from("admin-1"), Role::Administrator);

    assert!(matches!(
        get_permit(&mut persistence, 77, &admin),
        Err(ApiError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_permit_response_serializes_statuses_in_snake_case() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let fixture = setup_fixture(&mut persistence);
    let permit = submit_test_permit(&mut persistence, &fixture);

    let json: serde_json::Value = serde_json::to_value(&permit).unwrap();

    assert_eq!(json["status"], "submitted");
    assert_eq!(json["permit_number"], "P2026-SPRING-001");
    assert_eq!(json["reviews"][0]["status"], "pending");
    assert_eq!(json["payload"]["work_type"], "addition");
}
