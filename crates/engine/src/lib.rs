// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

pub use cursor::Cursor;
pub use database::{Database, DatabaseOptions, FindOptions};
pub use matcher::Matcher;
pub use matcher::regex_cache;
pub use update::apply_update;

pub mod document;

mod cursor;
mod database;
mod matcher;
mod update;

pub type Result<T> = std::result::Result<T, doclite_type::Error>;
