//! Filter evaluation for in-memory document matching.
//!
//! This module walks a compiled [`Expr`] against a document's payload. All
//! comparisons go through two primitives:
//!
//! - **match-equality** ([`match_eq`]): `null` only equals `null`; two
//!   operands that both read as numbers (numbers or numeric strings) compare
//!   numerically; two strings compare as strings; anything else falls back to
//!   structural equality.
//! - **ordering** ([`compare`]): numeric when both operands read as numbers,
//!   otherwise a lexical comparison of their rendered forms. The lexical
//!   fallback can order mixed types in surprising ways (`"abc" > 100`,
//!   `"9" > "10"` is only false because both are numeric).

use std::{cmp::Ordering, convert::Infallible};

use peerdoc_core::{
    document::Document,
    query::{Condition, Expr, FieldOp, FieldPath, QueryVisitor},
    value::{Map, Value},
};

/// Match-equality between a resolved field value and a filter operand.
pub(crate) fn match_eq(value: &Value, operand: &Value) -> bool {
    if value.is_null() || operand.is_null() {
        return value.is_null() && operand.is_null();
    }

    if let (Some(left), Some(right)) = (value.to_number(), operand.to_number()) {
        return left == right;
    }

    if let (Value::String(left), Value::String(right)) = (value, operand) {
        return left == right;
    }

    value.structurally_eq(operand)
}

/// Orders a field value against a filter operand.
///
/// Returns `None` only when a numeric comparison involves `NaN`.
pub(crate) fn compare(value: &Value, operand: &Value) -> Option<Ordering> {
    match (value.to_number(), operand.to_number()) {
        (Some(left), Some(right)) => left.partial_cmp(&right),
        _ => Some(value.to_string().cmp(&operand.to_string())),
    }
}

fn contains(list: &Value, value: &Value) -> Option<bool> {
    list.as_array()
        .map(|items| items.iter().any(|item| match_eq(value, item)))
}

fn evaluate_op(value: &Value, op: &FieldOp) -> bool {
    match op {
        FieldOp::Eq(operand) => match_eq(value, operand),
        FieldOp::Ne(operand) => !match_eq(value, operand),
        FieldOp::Gt(operand) => compare(value, operand) == Some(Ordering::Greater),
        FieldOp::Gte(operand) => matches!(
            compare(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FieldOp::Lt(operand) => compare(value, operand) == Some(Ordering::Less),
        FieldOp::Lte(operand) => matches!(
            compare(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FieldOp::In(list) => contains(list, value).unwrap_or(false),
        FieldOp::Nin(list) => contains(list, value).is_some_and(|found| !found),
        FieldOp::Exists(operand) => operand
            .as_bool()
            .is_some_and(|should_exist| should_exist == !value.is_null()),
        FieldOp::Regex(pattern) => match (value, &pattern.compiled) {
            (Value::String(text), Some(regex)) => regex.is_match(text),
            _ => false,
        },
    }
}

/// Evaluates compiled filters against one document payload.
pub(crate) struct DocumentMatcher<'a> {
    data: &'a Map,
}

impl<'a> DocumentMatcher<'a> {
    pub fn new(data: &'a Map) -> Self {
        Self { data }
    }

    pub fn matches(&mut self, expr: &Expr) -> bool {
        match self.visit_expr(expr) {
            Ok(matched) => matched,
            Err(never) => match never {},
        }
    }

    /// Returns clones of the documents whose payload satisfies `expr`.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> Vec<Document> {
        documents
            .into_iter()
            .filter(|doc| DocumentMatcher::new(&doc.data).matches(expr))
            .cloned()
            .collect()
    }
}

impl<'a> QueryVisitor for DocumentMatcher<'a> {
    type Output = bool;
    type Error = Infallible;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_field(&mut self, path: &FieldPath, condition: &Condition) -> Result<Self::Output, Self::Error> {
        // Absent paths behave as null.
        let value = path.resolve(self.data).unwrap_or(&Value::Null);

        Ok(match condition {
            Condition::Equals(operand) => match_eq(value, operand),
            Condition::Operators(ops) => ops.iter().all(|op| evaluate_op(value, op)),
        })
    }

    fn visit_literal(&mut self, value: bool) -> Result<Self::Output, Self::Error> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerdoc_core::query::Filter;
    use serde_json::json;

    fn data(value: serde_json::Value) -> Map {
        Value::from(value).into_map().unwrap()
    }

    fn matches(doc: &Map, filter: serde_json::Value) -> bool {
        let expr = Filter::try_from_json(filter)
            .unwrap()
            .compile()
            .unwrap();

        DocumentMatcher::new(doc).matches(&expr)
    }

    fn alice() -> Map {
        data(json!({ "name": "Alice", "age": 30 }))
    }

    #[test]
    fn gte_compares_numerically() {
        assert!(matches(&alice(), json!({ "age": { "$gte": 18 } })));
        assert!(!matches(&alice(), json!({ "age": { "$gte": 31 } })));
        assert!(matches(&alice(), json!({ "age": { "$gte": 30 } })));
    }

    #[test]
    fn filter_documents_keeps_only_matches() {
        let docs = vec![
            Document::new(alice()),
            Document::new(data(json!({ "name": "Bob", "age": 12 }))),
        ];
        let expr = Filter::try_from_json(json!({ "age": { "$gte": 18 } }))
            .unwrap()
            .compile()
            .unwrap();

        let matched: Vec<Document> = DocumentMatcher::filter_documents(&docs, &expr);

        assert_eq!(matched, vec![docs[0].clone()]);
        assert!(DocumentMatcher::filter_documents(&[], &Expr::Or(Vec::new())).is_empty());
    }

    #[test]
    fn range_operators_cover_bounds() {
        let doc = alice();

        assert!(matches(&doc, json!({ "age": { "$gt": 29, "$lt": 31 } })));
        assert!(!matches(&doc, json!({ "age": { "$gt": 30 } })));
        assert!(matches(&doc, json!({ "age": { "$lte": 30 } })));
        assert!(!matches(&doc, json!({ "age": { "$lt": 30 } })));
    }

    #[test]
    fn numeric_strings_compare_numerically() {
        let doc = data(json!({ "count": "9" }));

        assert!(!matches(&doc, json!({ "count": { "$gt": 10 } })));
        assert!(!matches(&doc, json!({ "count": { "$gt": "10" } })));
        assert!(matches(&doc, json!({ "count": 9 })));
        assert!(matches(&doc, json!({ "count": { "$eq": 9.0 } })));
    }

    #[test]
    fn non_numeric_operands_compare_lexically() {
        let doc = data(json!({ "name": "bob", "version": 100 }));

        assert!(matches(&doc, json!({ "name": { "$gt": "alice" } })));
        assert!(!matches(&doc, json!({ "name": { "$lt": "alice" } })));
        // "100" < "abc" as strings.
        assert!(matches(&doc, json!({ "version": { "$lt": "abc" } })));
    }

    #[test]
    fn and_or_combine_sub_filters() {
        let doc = alice();

        assert!(matches(&doc, json!({ "$and": [{ "age": { "$gte": 18 } }, { "name": "Alice" }] })));
        assert!(matches(&doc, json!({ "$or": [{ "age": { "$gte": 99 } }, { "name": "Alice" }] })));
        assert!(!matches(&doc, json!({ "$or": [{ "age": { "$gte": 99 } }, { "name": "Bob" }] })));
        assert!(!matches(&doc, json!({ "$and": [{ "age": { "$gte": 18 } }, { "name": "Bob" }] })));
    }

    #[test]
    fn empty_and_is_vacuously_true() {
        assert!(matches(&alice(), json!({ "$and": [] })));
    }

    #[test]
    fn empty_or_is_vacuously_false() {
        assert!(!matches(&alice(), json!({ "$or": [] })));
    }

    #[test]
    fn non_array_logical_operand_never_matches() {
        assert!(!matches(&alice(), json!({ "$and": { "name": "Alice" } })));
        assert!(!matches(&alice(), json!({ "$or": "Alice" })));
    }

    #[test]
    fn not_and_nor_are_skipped() {
        assert!(matches(&alice(), json!({ "$not": [{ "name": "Alice" }] })));
        assert!(matches(&alice(), json!({ "$nor": [{ "name": "Alice" }], "age": 30 })));
    }

    #[test]
    fn mixes_fields_and_logical_keys_as_implicit_and() {
        let doc = alice();

        assert!(matches(&doc, json!({ "name": "Alice", "$or": [{ "age": 30 }] })));
        assert!(!matches(&doc, json!({ "name": "Bob", "$or": [{ "age": 30 }] })));
    }

    #[test]
    fn nested_paths_resolve_through_maps() {
        let doc = data(json!({ "address": { "city": "NYC" } }));

        assert!(matches(&doc, json!({ "address.city": "NYC" })));
        assert!(!matches(&doc, json!({ "address.zip": "10001" })));
        assert!(matches(&doc, json!({ "address.zip": null })));
        assert!(!matches(&doc, json!({ "address.city.name": "NYC" })));
    }

    #[test]
    fn null_matches_only_null() {
        let doc = data(json!({ "nickname": null, "name": "Alice" }));

        assert!(matches(&doc, json!({ "nickname": null })));
        assert!(matches(&doc, json!({ "missing": null })));
        assert!(!matches(&doc, json!({ "name": null })));
        assert!(!matches(&doc, json!({ "nickname": "" })));
    }

    #[test]
    fn structural_equality_for_containers() {
        let doc = data(json!({ "tags": ["a", "b"], "meta": { "x": 1 } }));

        assert!(matches(&doc, json!({ "tags": ["a", "b"] })));
        assert!(!matches(&doc, json!({ "tags": ["b", "a"] })));
        assert!(matches(&doc, json!({ "tags": { "$eq": ["a", "b"] } })));
        assert!(matches(&doc, json!({ "active": { "$ne": true } })));
    }

    #[test]
    fn map_condition_without_operators_matches_everything() {
        // Non-operator keys in a condition map are ignored.
        let doc = data(json!({ "address": { "city": "NYC" } }));

        assert!(matches(&doc, json!({ "address": { "city": "LA" } })));
    }

    #[test]
    fn in_and_nin_use_match_equality() {
        let doc = alice();

        assert!(matches(&doc, json!({ "age": { "$in": [10, "30", 50] } })));
        assert!(!matches(&doc, json!({ "age": { "$in": [10, 20] } })));
        assert!(matches(&doc, json!({ "name": { "$nin": ["Bob", "Carol"] } })));
        assert!(!matches(&doc, json!({ "name": { "$nin": ["Alice"] } })));
    }

    #[test]
    fn in_and_nin_with_non_array_operand_never_match() {
        let doc = alice();

        assert!(!matches(&doc, json!({ "age": { "$in": 30 } })));
        assert!(!matches(&doc, json!({ "age": { "$nin": 31 } })));
    }

    #[test]
    fn exists_checks_non_null() {
        let doc = data(json!({ "name": "Alice", "nickname": null }));

        assert!(matches(&doc, json!({ "name": { "$exists": true } })));
        assert!(!matches(&doc, json!({ "name": { "$exists": false } })));
        assert!(matches(&doc, json!({ "nickname": { "$exists": false } })));
        assert!(matches(&doc, json!({ "missing": { "$exists": false } })));
        assert!(!matches(&doc, json!({ "name": { "$exists": "yes" } })));
    }

    #[test]
    fn regex_matches_anywhere_in_strings() {
        let doc = data(json!({ "email": "alice@example.com", "age": 30 }));

        assert!(matches(&doc, json!({ "email": { "$regex": "example" } })));
        assert!(matches(&doc, json!({ "email": { "$regex": "^alice@" } })));
        assert!(!matches(&doc, json!({ "email": { "$regex": "^bob" } })));
        assert!(!matches(&doc, json!({ "age": { "$regex": "3" } })));
        assert!(!matches(&doc, json!({ "email": { "$regex": "(" } })));
    }

    #[test]
    fn unevaluated_operators_are_ignored() {
        let doc = data(json!({ "tags": ["a"] }));

        assert!(matches(&doc, json!({ "tags": { "$size": 5 } })));
        assert!(matches(&doc, json!({ "tags": { "$size": 5, "$exists": true } })));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(&alice(), json!({})));
    }

    #[test]
    fn compare_orders_mixed_values() {
        assert_eq!(compare(&Value::from(2), &Value::from("10")), Some(Ordering::Less));
        assert_eq!(compare(&Value::from("b"), &Value::from("a")), Some(Ordering::Greater));
        assert_eq!(compare(&Value::Number(f64::NAN), &Value::from(1)), None);
    }
}
