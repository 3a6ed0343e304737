// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Thin adapter presenting the embedded SQLite engine as a transactional
//! ordered byte-key/byte-value store with named sub-stores.
//!
//! Everything above this crate only sees the adapter contract: environments,
//! read/write transactions, no-overwrite puts and byte-ordered cursors. The
//! backing engine is interchangeable as long as that contract holds.

pub use cursor::KvCursor;
pub use env::{StoreEnv, StoreOptions};
pub use error::StoreError;
pub use sub_store::SubStore;
pub use txn::{Txn, TxnMode};

mod cursor;
mod env;
mod error;
mod sub_store;
mod txn;

pub type Result<T> = std::result::Result<T, StoreError>;
