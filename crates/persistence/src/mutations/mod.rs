// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side mutations.
//!
//! Mutations never open transactions themselves. The `Persistence`
//! adapter wraps each public write in a single immediate transaction.

pub mod audit;
pub mod catalog;
pub mod permits;
