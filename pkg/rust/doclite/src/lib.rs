// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! DocLite: an embedded, single-process document database.
//!
//! Schemaless BSON documents live in named collections over a
//! transactional ordered key/value store. One handle serves auto-commit
//! operations and explicit multi-statement transactions.
//!
//! ```no_run
//! use doclite::{Database, DatabaseOptions};
//! use doclite::bson::doc;
//!
//! # fn main() -> doclite::Result<()> {
//! let db = Database::open("/tmp/example-db", DatabaseOptions::default())?;
//! db.create_collection("people")?;
//! let id = db.insert_one("people", &doc! { "name": "amy", "age": 31 })?;
//! let found = db.find_one("people", Some(&doc! { "_id": id }))?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

pub use bson;

pub use doclite_catalog::{Catalog, CollectionDef};
pub use doclite_engine::{
	Cursor, Database, DatabaseOptions, FindOptions, Matcher, apply_update, document,
	regex_cache,
};
pub use doclite_store::{StoreEnv, StoreError, StoreOptions};
pub use doclite_transaction::TransactionManager;
pub use doclite_type::{Error, value};

pub type Result<T> = std::result::Result<T, Error>;
