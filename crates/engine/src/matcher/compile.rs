// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 DocLite

use bson::{Bson, Document};
use doclite_type::Error;

use super::{FieldOp, FieldPredicate, Predicate, regex_cache};
use crate::Result;

pub(crate) fn compile(filter: &Document) -> Result<Predicate> {
	let mut nodes = Vec::with_capacity(filter.len());
	for (key, value) in filter.iter() {
		if let Some(op) = key.strip_prefix('$') {
			nodes.push(compile_logical(op, value)?);
		} else {
			nodes.push(compile_field(key, value)?);
		}
	}
	Ok(match nodes.len() {
		0 => Predicate::All,
		1 => nodes.pop().expect("one node"),
		_ => Predicate::And(nodes),
	})
}

fn compile_logical(op: &str, value: &Bson) -> Result<Predicate> {
	match op {
		"and" | "or" | "nor" => {
			let Bson::Array(items) = value else {
				return Err(Error::PredicateCompile(format!("${op} requires an array")));
			};
			if items.is_empty() {
				return Err(Error::PredicateCompile(format!("${op} requires a non-empty array")));
			}
			let mut children = Vec::with_capacity(items.len());
			for item in items {
				let Bson::Document(sub) = item else {
					return Err(Error::PredicateCompile(format!(
						"${op} elements must be documents"
					)));
				};
				children.push(compile(sub)?);
			}
			Ok(match op {
				"and" => Predicate::And(children),
				"or" => Predicate::Or(children),
				_ => Predicate::Nor(children),
			})
		}
		"not" => {
			let Bson::Document(sub) = value else {
				return Err(Error::PredicateCompile("$not requires a document".into()));
			};
			Ok(Predicate::Not(Box::new(compile(sub)?)))
		}
		other => Err(Error::PredicateCompile(format!("unknown operator: ${other}"))),
	}
}

fn compile_field(key: &str, value: &Bson) -> Result<Predicate> {
	let path: Vec<String> = key.split('.').map(str::to_string).collect();
	match value {
		Bson::Document(operand) if leads_with_operator(operand) => {
			if !operand.keys().all(|k| k.starts_with('$')) {
				return Err(Error::PredicateCompile(format!(
					"cannot mix operators and fields in predicate for {key}"
				)));
			}
			compile_operator_document(path, operand)
		}
		Bson::RegularExpression(regex) => {
			let regex = regex_cache::compile(&regex.pattern, &regex.options)?;
			Ok(Predicate::Field(FieldPredicate { path, op: FieldOp::Regex(regex) }))
		}
		other => Ok(Predicate::Field(FieldPredicate { path, op: FieldOp::Eq(other.clone()) })),
	}
}

fn leads_with_operator(operand: &Document) -> bool {
	operand.keys().next().is_some_and(|k| k.starts_with('$'))
}

/// A document of operators on one path compiles to a conjunction of field
/// predicates. `$regex`/`$options` pair up before compilation.
fn compile_operator_document(path: Vec<String>, operand: &Document) -> Result<Predicate> {
	let mut ops = Vec::with_capacity(operand.len());
	let mut pattern: Option<String> = None;
	let mut options: Option<String> = None;
	for (op_key, op_value) in operand.iter() {
		match op_key.as_str() {
			"$regex" => match op_value {
				Bson::String(p) => pattern = Some(p.clone()),
				Bson::RegularExpression(r) => {
					pattern = Some(r.pattern.clone());
					if !r.options.is_empty() {
						options.get_or_insert_with(|| r.options.clone());
					}
				}
				_ => {
					return Err(Error::PredicateCompile(
						"$regex requires a string or regex".into(),
					));
				}
			},
			"$options" => match op_value {
				Bson::String(o) => options = Some(o.clone()),
				_ => return Err(Error::PredicateCompile("$options requires a string".into())),
			},
			other => ops.push(compile_operator(other, op_value)?),
		}
	}
	match (pattern, options) {
		(Some(pattern), options) => {
			ops.push(FieldOp::Regex(regex_cache::compile(&pattern, options.as_deref().unwrap_or(""))?));
		}
		(None, Some(_)) => {
			return Err(Error::PredicateCompile("$options requires $regex".into()));
		}
		(None, None) => {}
	}
	let mut nodes: Vec<Predicate> = ops
		.into_iter()
		.map(|op| Predicate::Field(FieldPredicate { path: path.clone(), op }))
		.collect();
	Ok(match nodes.len() {
		0 => Predicate::All,
		1 => nodes.pop().expect("one node"),
		_ => Predicate::And(nodes),
	})
}

fn compile_operator(op: &str, value: &Bson) -> Result<FieldOp> {
	Ok(match op {
		"$eq" => FieldOp::Eq(value.clone()),
		"$ne" => FieldOp::Ne(value.clone()),
		"$gt" => FieldOp::Gt(value.clone()),
		"$gte" => FieldOp::Gte(value.clone()),
		"$lt" => FieldOp::Lt(value.clone()),
		"$lte" => FieldOp::Lte(value.clone()),
		"$in" => FieldOp::In(expect_array(op, value)?),
		"$nin" => FieldOp::Nin(expect_array(op, value)?),
		"$all" => FieldOp::All(expect_array(op, value)?),
		"$exists" => FieldOp::Exists(truthy(value)),
		"$type" => FieldOp::Type(parse_type_tag(value)?),
		"$size" => match value {
			Bson::Int32(n) => FieldOp::Size(i64::from(*n)),
			Bson::Int64(n) => FieldOp::Size(*n),
			_ => return Err(Error::PredicateCompile("$size requires an integer".into())),
		},
		"$elemMatch" => match value {
			Bson::Document(sub) => FieldOp::ElemMatch(Box::new(compile(sub)?)),
			_ => return Err(Error::PredicateCompile("$elemMatch requires a document".into())),
		},
		other => return Err(Error::PredicateCompile(format!("unknown operator: ${other}"))),
	})
}

fn expect_array(op: &str, value: &Bson) -> Result<Vec<Bson>> {
	match value {
		Bson::Array(items) => Ok(items.clone()),
		_ => Err(Error::PredicateCompile(format!("{op} requires an array"))),
	}
}

fn truthy(value: &Bson) -> bool {
	match value {
		Bson::Boolean(b) => *b,
		Bson::Int32(n) => *n != 0,
		Bson::Int64(n) => *n != 0,
		Bson::Double(n) => *n != 0.0,
		Bson::Null => false,
		_ => true,
	}
}

fn parse_type_tag(value: &Bson) -> Result<u8> {
	match value {
		Bson::Int32(n) if (1..=255).contains(n) => Ok(*n as u8),
		Bson::Int64(n) if (1..=255).contains(n) => Ok(*n as u8),
		Bson::String(alias) => type_alias(alias)
			.ok_or_else(|| Error::PredicateCompile(format!("unknown type alias: {alias}"))),
		_ => Err(Error::PredicateCompile("$type requires a tag or alias".into())),
	}
}

fn type_alias(alias: &str) -> Option<u8> {
	Some(match alias {
		"double" => 0x01,
		"string" => 0x02,
		"object" => 0x03,
		"array" => 0x04,
		"binData" => 0x05,
		"undefined" => 0x06,
		"objectId" => 0x07,
		"bool" => 0x08,
		"date" => 0x09,
		"null" => 0x0A,
		"regex" => 0x0B,
		"javascript" => 0x0D,
		"symbol" => 0x0E,
		"int" => 0x10,
		"timestamp" => 0x11,
		"long" => 0x12,
		"decimal" => 0x13,
		"minKey" => 0xFF,
		"maxKey" => 0x7F,
		_ => return None,
	})
}
