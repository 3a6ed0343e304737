// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Total ordering over BSON values.
//!
//! The order is a type ladder followed by within-type comparison; all three
//! numeric widths share one rung and compare by mathematical value.

pub use compare::{compare, compare_documents, type_rank};

mod compare;
