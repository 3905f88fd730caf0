// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authorization types and services.
//!
//! Identity is established by the caller. These types only decide what an
//! already authenticated actor may do.

use permit_portal::PermitRecord;
use permit_portal_audit::Actor;
use permit_portal_domain::{Department, PermitStatus};
use std::collections::BTreeSet;

use crate::error::AuthError;

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A member of the public applying for permits.
    ///
    /// Applicants may submit applications and, on their own permits:
    /// - submit a draft
    /// - resubmit after a request for information or corrections
    /// - cancel
    /// - amend the application while it is open for amendment
    Applicant,
    /// A department reviewer. Records reviews for assigned departments only.
    Reviewer,
    /// Municipal staff. Performs every transition, review reset, amendment
    /// and permit type authoring within their municipality.
    Staff,
    /// System administrator. Unrestricted, across all municipalities.
    Administrator,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Reviewer => "reviewer",
            Self::Staff => "staff",
            Self::Administrator => "administrator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The role assigned to this actor.
    pub role: Role,
    /// The municipality staff and reviewers work for.
    pub municipality_id: Option<i64>,
    /// The departments a reviewer reviews for.
    pub departments: BTreeSet<Department>,
    /// The actor's verified email address, if the caller established one.
    pub email: Option<String>,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor with no municipality or departments.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `role` - The role assigned to this actor
    #[must_use]
    pub const fn new(id: String, role: Role) -> Self {
        Self {
            id,
            role,
            municipality_id: None,
            departments: BTreeSet::new(),
            email: None,
        }
    }

    /// Returns this actor scoped to a municipality.
    #[must_use]
    pub const fn with_municipality(mut self, municipality_id: i64) -> Self {
        self.municipality_id = Some(municipality_id);
        self
    }

    /// Returns this actor with a verified email address.
    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.trim().to_string());
        self
    }

    /// Returns this actor with the given review departments.
    #[must_use]
    pub fn with_departments(mut self, departments: impl IntoIterator<Item = Department>) -> Self {
        self.departments.extend(departments);
        self
    }

    /// Converts this authenticated actor into an audit Actor.
    ///
    /// This is used when recording audit events to attribute actions
    /// to the authenticated actor.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.id.clone(), String::from(self.role.as_str()))
    }

    fn works_for(&self, municipality_id: i64) -> bool {
        self.municipality_id == Some(municipality_id)
    }

    /// An actor owns a permit they created, recorded by its first audit
    /// event, or one filed for them: their verified email is the applicant's.
    fn owns(&self, record: &PermitRecord) -> bool {
        let created: bool = record
            .notes
            .first()
            .is_some_and(|event| event.actor.id == self.id);
        let named: bool = self
            .email
            .as_deref()
            .is_some_and(|email| email.eq_ignore_ascii_case(record.applicant.email.trim()));
        created || named
    }
}

fn unauthorized(action: &str, required_role: &str) -> AuthError {
    AuthError::Unauthorized {
        action: String::from(action),
        required_role: String::from(required_role),
    }
}

/// Statuses an applicant may request on their own permit.
const fn applicant_may_request(current: PermitStatus, target: PermitStatus) -> bool {
    matches!(
        (current, target),
        (_, PermitStatus::Cancelled)
            | (PermitStatus::Draft, PermitStatus::Submitted)
            | (
                PermitStatus::AdditionalInfo | PermitStatus::PendingCorrections,
                PermitStatus::UnderReview
            )
    )
}

/// Authorization service for enforcing role-based access control.
///
/// Staff and reviewers are confined to their own municipality.
/// Administrators are not.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks if an actor may submit an application to a municipality.
    ///
    /// # Errors
    ///
    /// Returns an error for reviewers and for staff of other municipalities.
    pub fn authorize_submit(
        actor: &AuthenticatedActor,
        municipality_id: i64,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Applicant | Role::Administrator => Ok(()),
            Role::Staff if actor.works_for(municipality_id) => Ok(()),
            Role::Staff | Role::Reviewer => Err(unauthorized(
                "submit_permit",
                "Applicant, or Staff of the municipality",
            )),
        }
    }

    /// Checks if an actor may move a permit to `target`.
    ///
    /// Applicants may only submit drafts, resubmit and cancel, and only on
    /// permits they created.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor may not request this status.
    pub fn authorize_transition(
        actor: &AuthenticatedActor,
        record: &PermitRecord,
        target: PermitStatus,
    ) -> Result<(), AuthError> {
        let allowed: bool = match actor.role {
            Role::Administrator => true,
            Role::Staff => actor.works_for(record.municipality_id),
            Role::Applicant => actor.owns(record) && applicant_may_request(record.status, target),
            Role::Reviewer => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(unauthorized(
                &format!("transition permit to {target}"),
                "Staff of the municipality",
            ))
        }
    }

    /// Checks if an actor may record a review for `department`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the actor reviews for `department` in the
    /// permit's municipality.
    pub fn authorize_department_review(
        actor: &AuthenticatedActor,
        record: &PermitRecord,
        department: &Department,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Administrator => Ok(()),
            Role::Reviewer
                if actor.works_for(record.municipality_id)
                    && actor.departments.contains(department) =>
            {
                Ok(())
            }
            Role::Reviewer | Role::Applicant | Role::Staff => Err(unauthorized(
                &format!("review for department '{department}'"),
                "Reviewer assigned to the department",
            )),
        }
    }

    /// Checks if an actor may reset a permit's department reviews.
    ///
    /// # Errors
    ///
    /// Returns an error unless the actor is staff of the permit's
    /// municipality or an administrator.
    pub fn authorize_reset_reviews(
        actor: &AuthenticatedActor,
        record: &PermitRecord,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Administrator => Ok(()),
            Role::Staff if actor.works_for(record.municipality_id) => Ok(()),
            Role::Staff | Role::Applicant | Role::Reviewer => Err(unauthorized(
                "reset_reviews",
                "Staff of the municipality",
            )),
        }
    }

    /// Checks if an actor may amend a permit's application.
    ///
    /// # Errors
    ///
    /// Returns an error unless the actor created the permit, is staff of
    /// its municipality or is an administrator.
    pub fn authorize_amend(
        actor: &AuthenticatedActor,
        record: &PermitRecord,
    ) -> Result<(), AuthError> {
        let allowed: bool = match actor.role {
            Role::Administrator => true,
            Role::Staff => actor.works_for(record.municipality_id),
            Role::Applicant => actor.owns(record),
            Role::Reviewer => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(unauthorized(
                "amend_application",
                "the permit's applicant, or Staff of the municipality",
            ))
        }
    }

    /// Checks if an actor may read a permit, its reviews and its audit trail.
    ///
    /// # Errors
    ///
    /// Returns an error if the permit is neither the actor's own nor in the
    /// actor's municipality.
    pub fn authorize_view_permit(
        actor: &AuthenticatedActor,
        record: &PermitRecord,
    ) -> Result<(), AuthError> {
        let allowed: bool = match actor.role {
            Role::Administrator => true,
            Role::Staff | Role::Reviewer => actor.works_for(record.municipality_id),
            Role::Applicant => actor.owns(record),
        };
        if allowed {
            Ok(())
        } else {
            Err(unauthorized(
                "view_permit",
                "the permit's applicant, or Staff of the municipality",
            ))
        }
    }

    /// Checks if an actor may list a municipality's permits.
    ///
    /// # Errors
    ///
    /// Returns an error for applicants and for actors of other
    /// municipalities.
    pub fn authorize_list_permits(
        actor: &AuthenticatedActor,
        municipality_id: i64,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Administrator => Ok(()),
            Role::Staff | Role::Reviewer if actor.works_for(municipality_id) => Ok(()),
            Role::Staff | Role::Reviewer | Role::Applicant => Err(unauthorized(
                "list_permits",
                "Staff or Reviewer of the municipality",
            )),
        }
    }

    /// Checks if an actor may author permit types for a municipality.
    ///
    /// # Errors
    ///
    /// Returns an error unless the actor is staff of the municipality or an
    /// administrator.
    pub fn authorize_manage_permit_types(
        actor: &AuthenticatedActor,
        municipality_id: i64,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Administrator => Ok(()),
            Role::Staff if actor.works_for(municipality_id) => Ok(()),
            Role::Staff | Role::Applicant | Role::Reviewer => Err(unauthorized(
                "save_permit_type",
                "Staff of the municipality",
            )),
        }
    }

    /// Checks if an actor may register municipalities.
    ///
    /// Only administrators may register municipalities.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an administrator.
    pub fn authorize_register_municipality(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Administrator => Ok(()),
            Role::Staff | Role::Applicant | Role::Reviewer => {
                Err(unauthorized("register_municipality", "Administrator"))
            }
        }
    }
}
