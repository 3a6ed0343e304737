// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use std::cmp::Ordering;

use bson::raw::{RawArray, RawBsonRef, RawDocument};
use bson::{Bson, Document};
use doclite_type::value::{compare, type_rank};
use regex::Regex;

use super::{FieldOp, FieldPredicate, Predicate};

pub(crate) fn eval(predicate: &Predicate, document: &RawDocument) -> bool {
	match predicate {
		Predicate::All => true,
		Predicate::And(children) => children.iter().all(|c| eval(c, document)),
		Predicate::Or(children) => children.iter().any(|c| eval(c, document)),
		Predicate::Nor(children) => !children.iter().any(|c| eval(c, document)),
		Predicate::Not(child) => !eval(child, document),
		Predicate::Field(field) => eval_field(field, document),
	}
}

fn eval_field(field: &FieldPredicate, document: &RawDocument) -> bool {
	let mut candidates = Vec::new();
	resolve(document, &field.path, &mut candidates);
	match &field.op {
		FieldOp::Exists(want) => *want == !candidates.is_empty(),
		FieldOp::Eq(operand) => any_eq(&candidates, operand),
		FieldOp::Ne(operand) => !any_eq(&candidates, operand),
		FieldOp::Gt(operand) => any_ordered(&candidates, operand, |o| o == Ordering::Greater),
		FieldOp::Gte(operand) => any_ordered(&candidates, operand, |o| o != Ordering::Less),
		FieldOp::Lt(operand) => any_ordered(&candidates, operand, |o| o == Ordering::Less),
		FieldOp::Lte(operand) => any_ordered(&candidates, operand, |o| o != Ordering::Greater),
		FieldOp::In(list) => list.iter().any(|v| any_eq(&candidates, v)),
		FieldOp::Nin(list) => !list.iter().any(|v| any_eq(&candidates, v)),
		FieldOp::Type(tag) => candidates.iter().any(|c| type_matches(*c, *tag)),
		FieldOp::Size(n) => candidates.iter().any(|c| array_len(*c) == Some(*n)),
		FieldOp::All(list) => candidates.iter().any(|c| all_of(*c, list)),
		FieldOp::ElemMatch(sub) => candidates.iter().any(|c| elem_match(*c, sub)),
		FieldOp::Regex(regex) => candidates.iter().any(|c| regex_match(*c, regex)),
	}
}

// ── Path resolution ─────────────────────────────────────────────
//
// Dotted paths descend embedded documents. At an array, a numeric segment
// indexes into it; a non-numeric segment recurses element-wise over the
// embedded documents and every reached value becomes a candidate.

fn resolve<'a>(document: &'a RawDocument, path: &[String], out: &mut Vec<RawBsonRef<'a>>) {
	let Some(first) = path.first() else { return };
	let value = match document.get(first.as_str()) {
		Ok(Some(value)) => value,
		_ => return,
	};
	descend(value, &path[1..], out);
}

fn descend<'a>(value: RawBsonRef<'a>, rest: &[String], out: &mut Vec<RawBsonRef<'a>>) {
	if rest.is_empty() {
		out.push(value);
		return;
	}
	match value {
		RawBsonRef::Document(document) => resolve(document, rest, out),
		RawBsonRef::Array(array) => {
			if let Ok(index) = rest[0].parse::<usize>() {
				if let Some(element) = array_index(array, index) {
					descend(element, &rest[1..], out);
				}
			} else {
				for element in array.into_iter().flatten() {
					if let RawBsonRef::Document(element) = element {
						resolve(element, rest, out);
					}
				}
			}
		}
		_ => {}
	}
}

fn array_index<'a>(array: &'a RawArray, index: usize) -> Option<RawBsonRef<'a>> {
	array.into_iter().flatten().nth(index)
}

// ── Operator evaluation ─────────────────────────────────────────

/// Equality with array-element fallback: the operand matches when it
/// equals the candidate itself or, for array candidates, any element.
/// An absent field compares equal to null.
fn any_eq(candidates: &[RawBsonRef], operand: &Bson) -> bool {
	if candidates.is_empty() {
		return matches!(operand, Bson::Null);
	}
	candidates.iter().any(|c| value_eq(*c, operand))
}

fn value_eq(candidate: RawBsonRef, operand: &Bson) -> bool {
	let Some(value) = to_owned(candidate) else { return false };
	if compare(&value, operand) == Ordering::Equal {
		return true;
	}
	if let Bson::Array(elements) = &value {
		elements.iter().any(|e| compare(e, operand) == Ordering::Equal)
	} else {
		false
	}
}

/// Ordered comparisons only fire within the operand's type rung; the type
/// ladder itself is for sorting, not for range predicates.
fn any_ordered(
	candidates: &[RawBsonRef],
	operand: &Bson,
	accept: impl Fn(Ordering) -> bool,
) -> bool {
	candidates.iter().any(|c| {
		let Some(value) = to_owned(*c) else { return false };
		if type_rank(&value) == type_rank(operand) && accept(compare(&value, operand)) {
			return true;
		}
		if let Bson::Array(elements) = &value {
			elements
				.iter()
				.any(|e| type_rank(e) == type_rank(operand) && accept(compare(e, operand)))
		} else {
			false
		}
	})
}

fn type_matches(candidate: RawBsonRef, tag: u8) -> bool {
	if element_tag(candidate) == tag {
		return true;
	}
	match candidate {
		RawBsonRef::Array(array) => {
			array.into_iter().flatten().any(|element| element_tag(element) == tag)
		}
		_ => false,
	}
}

fn array_len(candidate: RawBsonRef) -> Option<i64> {
	match candidate {
		RawBsonRef::Array(array) => Some(array.into_iter().count() as i64),
		_ => None,
	}
}

fn all_of(candidate: RawBsonRef, list: &[Bson]) -> bool {
	let Some(value) = to_owned(candidate) else { return false };
	match &value {
		Bson::Array(elements) => list
			.iter()
			.all(|want| elements.iter().any(|e| compare(e, want) == Ordering::Equal)),
		other => list.iter().all(|want| compare(other, want) == Ordering::Equal),
	}
}

/// At least one array element, taken as its own document, satisfies the
/// sub-predicate.
fn elem_match(candidate: RawBsonRef, sub: &Predicate) -> bool {
	match candidate {
		RawBsonRef::Array(array) => array.into_iter().flatten().any(|element| match element {
			RawBsonRef::Document(document) => eval(sub, document),
			_ => false,
		}),
		_ => false,
	}
}

fn regex_match(candidate: RawBsonRef, regex: &Regex) -> bool {
	match candidate {
		RawBsonRef::String(s) => regex.is_match(s),
		RawBsonRef::Array(array) => array.into_iter().flatten().any(|element| match element {
			RawBsonRef::String(s) => regex.is_match(s),
			_ => false,
		}),
		_ => false,
	}
}

// ── Materialization ─────────────────────────────────────────────

/// The wire-format tag byte.
fn element_tag(value: RawBsonRef) -> u8 {
	match value {
		RawBsonRef::Double(_) => 0x01,
		RawBsonRef::String(_) => 0x02,
		RawBsonRef::Document(_) => 0x03,
		RawBsonRef::Array(_) => 0x04,
		RawBsonRef::Binary(_) => 0x05,
		RawBsonRef::Undefined => 0x06,
		RawBsonRef::ObjectId(_) => 0x07,
		RawBsonRef::Boolean(_) => 0x08,
		RawBsonRef::DateTime(_) => 0x09,
		RawBsonRef::Null => 0x0A,
		RawBsonRef::RegularExpression(_) => 0x0B,
		RawBsonRef::DbPointer(_) => 0x0C,
		RawBsonRef::JavaScriptCode(_) => 0x0D,
		RawBsonRef::Symbol(_) => 0x0E,
		RawBsonRef::JavaScriptCodeWithScope(_) => 0x0F,
		RawBsonRef::Int32(_) => 0x10,
		RawBsonRef::Timestamp(_) => 0x11,
		RawBsonRef::Int64(_) => 0x12,
		RawBsonRef::Decimal128(_) => 0x13,
		RawBsonRef::MaxKey => 0x7F,
		RawBsonRef::MinKey => 0xFF,
	}
}

/// Materializes a leaf value for the comparator. Legacy types outside the
/// supported set yield `None`, which evaluates as "no match".
fn to_owned(value: RawBsonRef) -> Option<Bson> {
	Some(match value {
		RawBsonRef::Double(v) => Bson::Double(v),
		RawBsonRef::String(v) => Bson::String(v.to_string()),
		RawBsonRef::Document(v) => Bson::Document(Document::try_from(v).ok()?),
		RawBsonRef::Array(v) => Bson::Array(owned_elements(v)?),
		RawBsonRef::Binary(v) => Bson::Binary(bson::Binary {
			subtype: v.subtype,
			bytes: v.bytes.to_vec(),
		}),
		RawBsonRef::ObjectId(v) => Bson::ObjectId(v),
		RawBsonRef::Boolean(v) => Bson::Boolean(v),
		RawBsonRef::DateTime(v) => Bson::DateTime(v),
		RawBsonRef::Null => Bson::Null,
		RawBsonRef::Undefined => Bson::Undefined,
		RawBsonRef::RegularExpression(v) => Bson::RegularExpression(bson::Regex {
			pattern: v.pattern.to_string(),
			options: v.options.to_string(),
		}),
		RawBsonRef::Symbol(v) => Bson::Symbol(v.to_string()),
		RawBsonRef::Int32(v) => Bson::Int32(v),
		RawBsonRef::Timestamp(v) => Bson::Timestamp(v),
		RawBsonRef::Int64(v) => Bson::Int64(v),
		RawBsonRef::Decimal128(v) => Bson::Decimal128(v),
		RawBsonRef::MinKey => Bson::MinKey,
		RawBsonRef::MaxKey => Bson::MaxKey,
		_ => return None,
	})
}

fn owned_elements(array: &RawArray) -> Option<Vec<Bson>> {
	let mut elements = Vec::new();
	for element in array {
		elements.push(to_owned(element.ok()?)?);
	}
	Some(elements)
}
