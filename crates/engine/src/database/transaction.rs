// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use tracing::instrument;

use super::Database;
use crate::Result;

impl Database {
	/// Starts an explicit multi-statement transaction. Every operation on
	/// this handle joins it until commit or rollback.
	#[instrument(name = "database::begin_transaction", level = "debug", skip(self))]
	pub fn begin_transaction(&self) -> Result<()> {
		self.manager().begin()
	}

	#[instrument(name = "database::commit_transaction", level = "debug", skip(self))]
	pub fn commit_transaction(&self) -> Result<()> {
		self.manager().commit()
	}

	#[instrument(name = "database::rollback_transaction", level = "debug", skip(self))]
	pub fn rollback_transaction(&self) -> Result<()> {
		self.manager().rollback()
	}

	/// Whether an explicit transaction is active.
	pub fn in_transaction(&self) -> bool {
		self.manager().in_transaction()
	}

	/// Documents inserted, updated or deleted through this handle since
	/// open, counting committed work only.
	pub fn changes(&self) -> u64 {
		self.manager().changes()
	}
}
