// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

pub use catalog::{Catalog, CollectionDef, CATALOG_SUB_STORE};

mod catalog;

pub type Result<T> = std::result::Result<T, doclite_type::Error>;
