// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::cmp::Ordering;

use bson::{Bson, Document};

/// Position of a value's type on the comparison ladder.
///
/// MinKey < Null < numbers < strings < documents < arrays < binary <
/// object id < boolean < datetime < timestamp < regex < MaxKey. The legacy
/// javascript/db-pointer types are never produced by this system; they are
/// ranked between regex and MaxKey so the order stays total if they are
/// ever read back from foreign data.
pub fn type_rank(value: &Bson) -> u8 {
	match value {
		Bson::MinKey => 0,
		Bson::Null | Bson::Undefined => 1,
		Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
		Bson::String(_) | Bson::Symbol(_) => 3,
		Bson::Document(_) => 4,
		Bson::Array(_) => 5,
		Bson::Binary(_) => 6,
		Bson::ObjectId(_) => 7,
		Bson::Boolean(_) => 8,
		Bson::DateTime(_) => 9,
		Bson::Timestamp(_) => 10,
		Bson::RegularExpression(_) => 11,
		Bson::JavaScriptCode(_) => 12,
		Bson::JavaScriptCodeWithScope(_) => 13,
		Bson::DbPointer(_) => 14,
		Bson::MaxKey => 255,
	}
}

/// Compares two values under the total order.
pub fn compare(a: &Bson, b: &Bson) -> Ordering {
	let (ra, rb) = (type_rank(a), type_rank(b));
	if ra != rb {
		return ra.cmp(&rb);
	}
	match (a, b) {
		(Bson::MinKey, Bson::MinKey) | (Bson::MaxKey, Bson::MaxKey) => Ordering::Equal,
		(Bson::Null | Bson::Undefined, Bson::Null | Bson::Undefined) => Ordering::Equal,
		_ if ra == 2 => compare_numbers(a, b),
		(Bson::String(_) | Bson::Symbol(_), Bson::String(_) | Bson::Symbol(_)) => {
			text_of(a).as_bytes().cmp(text_of(b).as_bytes())
		}
		(Bson::Document(da), Bson::Document(db)) => compare_documents(da, db),
		(Bson::Array(aa), Bson::Array(ab)) => compare_arrays(aa, ab),
		(Bson::Binary(ba), Bson::Binary(bb)) => {
			// (length, subtype, bytes) lexicographic tuple.
			ba.bytes
				.len()
				.cmp(&bb.bytes.len())
				.then_with(|| u8::from(ba.subtype).cmp(&u8::from(bb.subtype)))
				.then_with(|| ba.bytes.cmp(&bb.bytes))
		}
		(Bson::ObjectId(oa), Bson::ObjectId(ob)) => oa.bytes().cmp(&ob.bytes()),
		(Bson::Boolean(va), Bson::Boolean(vb)) => va.cmp(vb),
		(Bson::DateTime(da), Bson::DateTime(db)) => {
			da.timestamp_millis().cmp(&db.timestamp_millis())
		}
		(Bson::Timestamp(ta), Bson::Timestamp(tb)) => {
			ta.time.cmp(&tb.time).then_with(|| ta.increment.cmp(&tb.increment))
		}
		(Bson::RegularExpression(ra), Bson::RegularExpression(rb)) => ra
			.pattern
			.as_bytes()
			.cmp(rb.pattern.as_bytes())
			.then_with(|| ra.options.as_bytes().cmp(rb.options.as_bytes())),
		(Bson::JavaScriptCode(ca), Bson::JavaScriptCode(cb)) => ca.as_bytes().cmp(cb.as_bytes()),
		(Bson::JavaScriptCodeWithScope(ca), Bson::JavaScriptCodeWithScope(cb)) => ca
			.code
			.as_bytes()
			.cmp(cb.code.as_bytes())
			.then_with(|| compare_documents(&ca.scope, &cb.scope)),
		// Legacy pointer payloads are opaque here; same-rank values tie.
		_ => Ordering::Equal,
	}
}

/// Compares two documents pairwise in insertion order: key bytes first,
/// then values recursively; on an equal prefix the shorter document is
/// less.
pub fn compare_documents(a: &Document, b: &Document) -> Ordering {
	for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
		let key_order = ka.as_bytes().cmp(kb.as_bytes());
		if key_order != Ordering::Equal {
			return key_order;
		}
		let value_order = compare(va, vb);
		if value_order != Ordering::Equal {
			return value_order;
		}
	}
	a.len().cmp(&b.len())
}

/// Arrays follow the document rule over decimal-string indices. Positions
/// enumerate identically on both sides, so the index keys always tie and
/// the rule reduces to element-wise comparison with a length tiebreak.
fn compare_arrays(a: &[Bson], b: &[Bson]) -> Ordering {
	for (va, vb) in a.iter().zip(b.iter()) {
		let value_order = compare(va, vb);
		if value_order != Ordering::Equal {
			return value_order;
		}
	}
	a.len().cmp(&b.len())
}

fn text_of(value: &Bson) -> &str {
	match value {
		Bson::String(s) | Bson::Symbol(s) => s,
		_ => unreachable!("rank 3 is string or symbol"),
	}
}

enum Number {
	Int(i64),
	Float(f64),
}

fn number_of(value: &Bson) -> Option<Number> {
	match value {
		Bson::Int32(v) => Some(Number::Int(i64::from(*v))),
		Bson::Int64(v) => Some(Number::Int(*v)),
		Bson::Double(v) => Some(Number::Float(*v)),
		_ => None,
	}
}

/// Numeric comparison across physical widths. Exact: i64 magnitudes beyond
/// 2^53 are never pushed through a lossy f64 cast. NaN compares equal to
/// itself and greater than every other number so the order stays total.
fn compare_numbers(a: &Bson, b: &Bson) -> Ordering {
	match (number_of(a), number_of(b)) {
		(Some(na), Some(nb)) => match (na, nb) {
			(Number::Int(x), Number::Int(y)) => x.cmp(&y),
			(Number::Float(x), Number::Float(y)) => compare_f64(x, y),
			(Number::Int(x), Number::Float(y)) => compare_i64_f64(x, y),
			(Number::Float(x), Number::Int(y)) => compare_i64_f64(y, x).reverse(),
		},
		// Decimal128 is carried opaquely: decimals order among themselves
		// by their raw little-endian payload and after the other widths.
		(None, None) => match (a, b) {
			(Bson::Decimal128(da), Bson::Decimal128(db)) => da.bytes().cmp(&db.bytes()),
			_ => Ordering::Equal,
		},
		(None, Some(_)) => Ordering::Greater,
		(Some(_), None) => Ordering::Less,
	}
}

fn compare_f64(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
	}
}

fn compare_i64_f64(int: i64, float: f64) -> Ordering {
	if float.is_nan() {
		// NaN sorts above every number.
		return Ordering::Less;
	}
	if float == f64::INFINITY {
		return Ordering::Less;
	}
	if float == f64::NEG_INFINITY {
		return Ordering::Greater;
	}
	// i64::MAX as f64 rounds up to exactly 2^63, so everything at or above
	// it is strictly greater than any i64; i64::MIN as f64 is exact.
	if float >= i64::MAX as f64 {
		return Ordering::Less;
	}
	if float < i64::MIN as f64 {
		return Ordering::Greater;
	}
	let truncated = float.trunc();
	let whole = truncated as i64;
	match int.cmp(&whole) {
		Ordering::Equal => {
			let fraction = float - truncated;
			if fraction > 0.0 {
				Ordering::Less
			} else if fraction < 0.0 {
				Ordering::Greater
			} else {
				Ordering::Equal
			}
		}
		order => order,
	}
}
