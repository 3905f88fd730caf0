// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    create_reviewer_actor, create_submitted_permit, create_test_actor, create_test_cause,
    create_test_context, create_under_review_permit, department, transition,
};
use crate::{
    AUTO_APPROVAL_NOTE, AutoApprovalDecision, Command, CoreError, PermitRecord,
    TransitionResult, apply, apply_auto_approval, evaluate_auto_approval,
};
use permit_portal_audit::Actor;
use permit_portal_domain::{Department, PermitStatus, ReviewStatus};

fn review(
    record: &PermitRecord,
    code: &str,
    status: ReviewStatus,
) -> Result<TransitionResult, CoreError> {
    apply(
        record,
        Command::RecordDepartmentReview {
            department: department(code),
            status,
            notes: Some(format!("{code} says {status}")),
            reviewer: format!("{code} reviewer"),
        },
        create_reviewer_actor(code),
        create_test_cause(),
        &create_test_context(),
    )
}

fn review_and_auto_approve(record: &PermitRecord, code: &str, status: ReviewStatus) -> PermitRecord {
    let reviewed = review(record, code, status).unwrap().new_record;
    match apply_auto_approval(&reviewed, Actor::system("permit-engine"), &create_test_context())
        .unwrap()
    {
        Some(result) => result.new_record,
        None => reviewed,
    }
}

fn reset(record: &PermitRecord, departments: Vec<Department>) -> Result<TransitionResult, CoreError> {
    apply(
        record,
        Command::ResetReviews {
            departments,
            notes: Some(String::from("Plans revised")),
        },
        create_test_actor(),
        create_test_cause(),
        &create_test_context(),
    )
}

#[test]
fn test_review_is_recorded_with_attribution() {
    let record = create_under_review_permit();
    let result = review(&record, "fire", ReviewStatus::Approved).unwrap();

    let fire = &result.new_record.reviews[&department("fire")];
    assert_eq!(fire.status, ReviewStatus::Approved);
    assert_eq!(fire.reviewer.as_deref(), Some("fire reviewer"));
    assert_eq!(fire.notes.as_deref(), Some("fire says approved"));
    assert_eq!(fire.reviewed_at, Some(create_test_context().now));
    assert_eq!(result.audit_event.action.name, "RecordDepartmentReview");
    assert_eq!(result.audit_event.action.details.as_deref(), Some("fire: approved"));
    assert_eq!(result.new_record.status, PermitStatus::UnderReview);
}

#[test]
fn test_unassigned_department_is_rejected() {
    let record = create_under_review_permit();
    let result = review(&record, "zoning", ReviewStatus::Approved);

    assert_eq!(
        result,
        Err(CoreError::DepartmentNotAssigned {
            department: department("zoning")
        })
    );
}

#[test]
fn test_reviews_not_open_before_review() {
    let record = create_submitted_permit();
    let result = review(&record, "fire", ReviewStatus::Approved);

    assert_eq!(
        result,
        Err(CoreError::ReviewsNotOpen {
            status: PermitStatus::Submitted
        })
    );
}

#[test]
fn test_pending_is_not_a_verdict() {
    let record = create_under_review_permit();
    assert!(matches!(
        review(&record, "fire", ReviewStatus::Pending),
        Err(CoreError::DomainViolation(_))
    ));
}

#[test]
fn test_reviews_accepted_while_awaiting_information() {
    let record = transition(&create_under_review_permit(), PermitStatus::AdditionalInfo);
    assert!(review(&record, "building", ReviewStatus::ChangesRequested).is_ok());
}

#[test]
fn test_all_approvals_trigger_auto_approval() {
    let record = create_under_review_permit();

    let after_building = review_and_auto_approve(&record, "building", ReviewStatus::Approved);
    assert_eq!(after_building.status, PermitStatus::UnderReview);

    let after_fire = review_and_auto_approve(&after_building, "fire", ReviewStatus::Approved);
    assert_eq!(after_fire.status, PermitStatus::Approved);
    assert!(after_fire.dates.approved.is_some());
    assert!(after_fire.dates.expiration.is_some());

    let approval = after_fire.notes.last().unwrap();
    assert!(approval.actor.is_system());
    assert_eq!(approval.actor.id, "permit-engine");
    assert_eq!(approval.notes.as_deref(), Some(AUTO_APPROVAL_NOTE));
    assert_eq!(
        approval.action.details.as_deref(),
        Some("under_review -> approved")
    );
}

#[test]
fn test_rejection_blocks_auto_approval() {
    let record = create_under_review_permit();

    let after_fire = review_and_auto_approve(&record, "fire", ReviewStatus::Rejected);
    let after_building = review_and_auto_approve(&after_fire, "building", ReviewStatus::Approved);

    assert_eq!(after_building.status, PermitStatus::UnderReview);
    assert_eq!(
        evaluate_auto_approval(&after_building),
        AutoApprovalDecision::BlockedByRejection(vec![department("fire")])
    );
}

#[test]
fn test_changes_requested_does_not_block() {
    let record = create_under_review_permit();
    let after_fire = review(&record, "fire", ReviewStatus::ChangesRequested)
        .unwrap()
        .new_record;
    let after_building = review(&after_fire, "building", ReviewStatus::Approved)
        .unwrap()
        .new_record;

    assert_eq!(evaluate_auto_approval(&after_building), AutoApprovalDecision::Ready);
}

#[test]
fn test_awaiting_reviews_lists_pending_departments() {
    let record = create_under_review_permit();
    let after_fire = review(&record, "fire", ReviewStatus::Approved)
        .unwrap()
        .new_record;

    assert_eq!(
        evaluate_auto_approval(&after_fire),
        AutoApprovalDecision::AwaitingReviews(vec![department("building")])
    );
}

#[test]
fn test_auto_approval_only_under_review() {
    let record = create_submitted_permit();
    assert_eq!(
        evaluate_auto_approval(&record),
        AutoApprovalDecision::NotUnderReview
    );
    assert_eq!(
        apply_auto_approval(&record, Actor::system("permit-engine"), &create_test_context()),
        Ok(None)
    );
}

#[test]
fn test_review_summary_counts() {
    let record = create_under_review_permit();
    let record = review(&record, "fire", ReviewStatus::Rejected)
        .unwrap()
        .new_record;
    let summary = record.review_summary();

    assert_eq!(summary.per_department.len(), 2);
    assert_eq!(summary.pending, vec![department("building")]);
    assert_eq!(summary.rejected, vec![department("fire")]);
    assert!(summary.approved.is_empty());
    assert!(!summary.all_approved());
}

#[test]
fn test_reset_after_approval_returns_to_review() {
    let record = create_under_review_permit();
    let record = review_and_auto_approve(&record, "building", ReviewStatus::Approved);
    let approved = review_and_auto_approve(&record, "fire", ReviewStatus::Approved);
    assert_eq!(approved.status, PermitStatus::Approved);

    let result = reset(&approved, vec![department("fire")]).unwrap();
    let reset_record = result.new_record;

    assert_eq!(reset_record.status, PermitStatus::UnderReview);
    assert_eq!(reset_record.reviews[&department("fire")].status, ReviewStatus::Pending);
    assert_eq!(reset_record.reviews[&department("fire")].reviewer, None);
    assert_eq!(
        reset_record.reviews[&department("building")].status,
        ReviewStatus::Approved
    );
    assert_eq!(reset_record.dates.approved, approved.dates.approved);
    assert_eq!(result.audit_event.action.name, "ResetDepartmentReviews");
    assert_eq!(result.audit_event.notes.as_deref(), Some("Plans revised"));
}

#[test]
fn test_reset_with_empty_selection_resets_all() {
    let record = create_under_review_permit();
    let record = review(&record, "fire", ReviewStatus::Rejected)
        .unwrap()
        .new_record;
    let record = review(&record, "building", ReviewStatus::Approved)
        .unwrap()
        .new_record;

    let reset_record = reset(&record, Vec::new()).unwrap().new_record;

    assert_eq!(reset_record.status, PermitStatus::UnderReview);
    assert_eq!(reset_record.review_summary().pending.len(), 2);
}

#[test]
fn test_reset_rejects_unknown_department() {
    let record = create_under_review_permit();
    assert_eq!(
        reset(&record, vec![department("zoning")]),
        Err(CoreError::DepartmentNotAssigned {
            department: department("zoning")
        })
    );
}

#[test]
fn test_reset_rejected_outside_review() {
    let record = create_submitted_permit();
    assert_eq!(
        reset(&record, Vec::new()),
        Err(CoreError::ReviewsNotOpen {
            status: PermitStatus::Submitted
        })
    );

    let active = transition(
        &transition(&create_under_review_permit(), PermitStatus::Approved),
        PermitStatus::Active,
    );
    assert!(matches!(
        reset(&active, Vec::new()),
        Err(CoreError::ReviewsNotOpen { .. })
    ));
}
