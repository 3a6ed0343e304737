// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Minimal tour: collections, inserts, predicates, modifier updates and
//! an explicit transaction.

use doclite::bson::doc;
use doclite::{Database, DatabaseOptions, FindOptions};

fn main() -> doclite::Result<()> {
	let dir = std::env::temp_dir().join("doclite-quickstart");
	let db = Database::open(&dir, DatabaseOptions::default())?;

	if !db.collection_exists("people")? {
		db.create_collection("people")?;
	}
	db.delete_many("people", None)?;

	let amy = db.insert_one("people", &doc! { "name": "amy", "age": 31, "tags": ["admin"] })?;
	db.insert_many(
		"people",
		&[
			doc! { "name": "bob", "age": 45 },
			doc! { "name": "carol", "age": 28, "tags": ["ops", "admin"] },
		],
	)?;

	let admins = db.find(
		"people",
		Some(&doc! { "tags": "admin" }),
		FindOptions { sort: Some(doc! { "age": 1 }), ..Default::default() },
	)?;
	for person in admins {
		println!("admin: {}", person?);
	}

	db.update_one("people", Some(&doc! { "_id": amy }), &doc! { "$inc": { "age": 1 } })?;
	println!("amy now: {:?}", db.find_one("people", Some(&doc! { "_id": amy }))?);

	db.begin_transaction()?;
	db.insert_one("people", &doc! { "name": "dave" })?;
	db.rollback_transaction()?;

	println!("count: {}", db.count("people", None)?);
	println!("changes this session: {}", db.changes());
	Ok(())
}
