// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-specific connection setup.
//!
//! `SQLite` is the only supported backend. Everything that cannot be
//! expressed in Diesel's query DSL lives here.

pub mod sqlite;
