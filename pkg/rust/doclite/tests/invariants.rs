// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

//! Cross-cutting invariants: insert/find round trips, counter/scan
//! agreement, identifier stability and persistence.

use bson::{Bson, Document, doc, oid::ObjectId};
use doclite::{Database, DatabaseOptions, FindOptions};
use doclite_testing::tempdir::temp_dir;

fn open_db(path: &std::path::Path) -> Database {
	let db = Database::open(path, DatabaseOptions::default()).expect("open database");
	db.create_collection("docs").unwrap();
	db
}

fn varied_documents() -> Vec<Document> {
	vec![
		doc! {},
		doc! { "s": "text", "n": 1 },
		doc! { "nested": { "deep": { "er": [1, 2, 3] } } },
		doc! { "kinds": [Bson::Null, true, 2.5, "four", { "five": 5 }] },
		doc! { "bin": Bson::Binary(bson::Binary {
			subtype: bson::spec::BinarySubtype::Generic,
			bytes: vec![0, 1, 2, 255],
		}) },
		doc! { "when": bson::DateTime::from_millis(1_700_000_000_000_i64) },
		doc! { "ts": Bson::Timestamp(bson::Timestamp { time: 9, increment: 2 }) },
		doc! { "big": i64::MAX, "small": i64::MIN, "f": f64::MAX },
	]
}

#[test]
fn test_every_insert_is_findable_by_id() {
	temp_dir(|path| {
		let db = open_db(path);
		for source in varied_documents() {
			let id = db.insert_one("docs", &source).unwrap();
			let found = db.find_one("docs", Some(&doc! { "_id": id })).unwrap().unwrap();

			// The stored document is the input with the identifier
			// prepended.
			let mut expected = doc! { "_id": id };
			for (key, value) in source.iter() {
				expected.insert(key.clone(), value.clone());
			}
			assert_eq!(found, expected);
		}
	})
}

#[test]
fn test_counter_equals_scan_after_every_commit() {
	temp_dir(|path| {
		let db = open_db(path);
		let mut ids = Vec::new();
		for (i, source) in varied_documents().into_iter().enumerate() {
			ids.push(db.insert_one("docs", &source).unwrap());
			if i % 3 == 0 {
				db.delete_one("docs", Some(&doc! { "_id": ids[0] })).unwrap();
				ids.remove(0);
			}
			let scanned = db.find("docs", None, FindOptions::default()).unwrap().count() as u64;
			assert_eq!(db.count("docs", None).unwrap(), scanned);
		}
	})
}

#[test]
fn test_scan_ids_are_distinct() {
	temp_dir(|path| {
		let db = open_db(path);
		for source in varied_documents() {
			db.insert_one("docs", &source).unwrap();
		}
		let ids: Vec<ObjectId> = db
			.find("docs", None, FindOptions::default())
			.unwrap()
			.map(|d| d.unwrap().get_object_id("_id").unwrap())
			.collect();
		let mut unique = ids.clone();
		unique.sort();
		unique.dedup();
		assert_eq!(unique.len(), ids.len());
		assert_eq!(ids.len() as u64, db.count("docs", None).unwrap());
	})
}

#[test]
fn test_reopen_preserves_every_document_bit_for_bit() {
	temp_dir(|path| {
		let before: Vec<Vec<u8>>;
		{
			let db = open_db(path);
			for source in varied_documents() {
				db.insert_one("docs", &source).unwrap();
			}
			before = collect_encoded(&db);
		}
		let db = Database::open(path, DatabaseOptions::default()).unwrap();
		let after = collect_encoded(&db);
		assert_eq!(before, after);
		assert_eq!(before.len(), varied_documents().len());
	})
}

fn collect_encoded(db: &Database) -> Vec<Vec<u8>> {
	db.find("docs", None, FindOptions::default())
		.unwrap()
		.map(|d| {
			let mut bytes = Vec::new();
			d.unwrap().to_writer(&mut bytes).unwrap();
			bytes
		})
		.collect()
}

#[test]
fn test_updates_and_replaces_never_move_a_document() {
	temp_dir(|path| {
		let db = open_db(path);
		let id = db.insert_one("docs", &doc! { "state": 0 }).unwrap();

		db.update_one("docs", Some(&doc! { "_id": id }), &doc! { "$set": { "state": 1 } })
			.unwrap();
		db.update_one("docs", Some(&doc! { "_id": id }), &doc! { "$push": { "log": "a" } })
			.unwrap();
		db.replace_one("docs", Some(&doc! { "_id": id }), &doc! { "state": 2 }).unwrap();
		db.update_one(
			"docs",
			Some(&doc! { "_id": id }),
			&doc! { "$rename": { "state": "phase" } },
		)
		.unwrap();

		// One document, same identity, through every mutation.
		assert_eq!(db.count("docs", None).unwrap(), 1);
		let found = db.find_one("docs", None).unwrap().unwrap();
		assert_eq!(found, doc! { "_id": id, "phase": 2 });
	})
}

#[test]
fn test_counter_survives_reopen_without_reconciliation() {
	temp_dir(|path| {
		{
			let db = open_db(path);
			for n in 0..9 {
				db.insert_one("docs", &doc! { "n": n }).unwrap();
			}
			db.delete_many("docs", Some(&doc! { "n": { "$gte": 6 } })).unwrap();
		}
		let db = Database::open(path, DatabaseOptions::default()).unwrap();
		assert_eq!(db.count("docs", None).unwrap(), 6);
		assert_eq!(db.collection_info("docs").unwrap().count, 6);
	})
}
