// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

//! The permit workflow engine.
//!
//! Every change to a permit is a pure function from the current
//! [`PermitRecord`] to a [`TransitionResult`]: the new record plus the one
//! audit event describing the change. Persistence decides when the result
//! becomes durable.

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use apply::{
    AUTO_APPROVAL_NOTE, AutoApprovalDecision, NewPermit, amend_application, apply,
    apply_auto_approval, create_permit, evaluate_auto_approval,
};
pub use command::Command;
pub use error::CoreError;
pub use state::{ApplyContext, PermitRecord, ReviewSummary, TransitionResult};
