// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side queries.
//!
//! Every function takes a plain connection and never opens a transaction,
//! so callers can compose them inside their own.

pub mod audit;
pub mod catalog;
pub mod permits;
