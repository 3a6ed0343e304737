// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use crate::{Result, StoreError};

/// Prefix separating sub-store tables from anything else in the engine's
/// schema catalog.
pub(crate) const TABLE_PREFIX: &str = "ss_";

/// Handle to a named sub-store. Creating the handle validates the name;
/// whether the sub-store exists is a per-transaction question answered by
/// [`crate::Txn::sub_store_exists`].
#[derive(Clone, Debug)]
pub struct SubStore {
	name: String,
	table: String,
}

impl SubStore {
	pub fn new(name: &str) -> Result<SubStore> {
		validate_name(name)?;
		Ok(SubStore {
			name: name.to_string(),
			table: format!("\"{TABLE_PREFIX}{name}\""),
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Quoted identifier, safe to splice into SQL.
	pub(crate) fn table(&self) -> &str {
		&self.table
	}

	/// Unquoted table name, for schema-catalog lookups.
	pub(crate) fn table_name(&self) -> String {
		format!("{TABLE_PREFIX}{}", self.name)
	}
}

fn validate_name(name: &str) -> Result<()> {
	let valid = !name.is_empty()
		&& name.len() <= 120
		&& name.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));
	if valid {
		Ok(())
	} else {
		Err(StoreError::InvalidName(name.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::SubStore;

	#[test]
	fn test_name_validation() {
		assert!(SubStore::new("users").is_ok());
		assert!(SubStore::new("__catalog").is_ok());
		assert!(SubStore::new("a.b-c_d9").is_ok());
		assert!(SubStore::new("").is_err());
		assert!(SubStore::new("with space").is_err());
		assert!(SubStore::new("quote\"name").is_err());
		assert!(SubStore::new("semi;colon").is_err());
	}
}
