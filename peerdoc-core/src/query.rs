//! Filter language for querying documents.
//!
//! A filter is a mapping from keys to conditions, in the style of MongoDB:
//!
//! ```ignore
//! use peerdoc_core::query::Filter;
//! use serde_json::json;
//!
//! let filter = Filter::try_from_json(json!({
//!     "age": { "$gte": 18 },
//!     "$or": [{ "name": "Alice" }, { "address.city": "NYC" }],
//! }))?;
//! let expr = filter.compile()?;
//! ```
//!
//! Keys starting with [`OPERATOR_SIGIL`] are operators; every other key is a
//! dot-separated field path into the document payload. [`validate_filter`]
//! checks that every operator anywhere in the tree is known, and
//! [`Filter::compile`] lowers a validated filter into an [`Expr`] tree that
//! backends walk with a [`QueryVisitor`].
//!
//! # Operators
//!
//! | Category   | Operators                                         | Evaluated                   |
//! |------------|---------------------------------------------------|-----------------------------|
//! | Comparison | `$eq $ne $gt $gte $lt $lte $in $nin`              | all                         |
//! | Logical    | `$and $or $not $nor`                              | `$and`, `$or`               |
//! | Element    | `$exists $type`                                   | `$exists`                   |
//! | Evaluation | `$regex $mod`                                     | `$regex`                    |
//! | Array      | `$all $size $elemMatch`                           | none                        |
//!
//! Operators that are known but not evaluated pass validation and are ignored
//! while matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    value::{Map, Value},
};

/// Prefix that marks a filter key as an operator.
pub const OPERATOR_SIGIL: char = '$';

/// Separator between segments of a field path.
pub const PATH_SEPARATOR: char = '.';

/// Grouping of operators, following MongoDB's documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    Comparison,
    Logical,
    Element,
    Evaluation,
    Array,
}

/// Every operator name the filter language recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    And,
    Or,
    Not,
    Nor,
    Exists,
    Type,
    Regex,
    Mod,
    All,
    Size,
    ElemMatch,
}

impl Operator {
    pub const ALL: [Operator; 19] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Nin,
        Operator::And,
        Operator::Or,
        Operator::Not,
        Operator::Nor,
        Operator::Exists,
        Operator::Type,
        Operator::Regex,
        Operator::Mod,
        Operator::All,
        Operator::Size,
        Operator::ElemMatch,
    ];

    /// The operator's name as written in a filter, including the sigil.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::And => "$and",
            Operator::Or => "$or",
            Operator::Not => "$not",
            Operator::Nor => "$nor",
            Operator::Exists => "$exists",
            Operator::Type => "$type",
            Operator::Regex => "$regex",
            Operator::Mod => "$mod",
            Operator::All => "$all",
            Operator::Size => "$size",
            Operator::ElemMatch => "$elemMatch",
        }
    }

    /// Looks up an operator by its name (sigil included).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == name)
    }

    pub fn category(&self) -> OperatorCategory {
        match self {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte
            | Operator::In
            | Operator::Nin => OperatorCategory::Comparison,
            Operator::And | Operator::Or | Operator::Not | Operator::Nor => OperatorCategory::Logical,
            Operator::Exists | Operator::Type => OperatorCategory::Element,
            Operator::Regex | Operator::Mod => OperatorCategory::Evaluation,
            Operator::All | Operator::Size | Operator::ElemMatch => OperatorCategory::Array,
        }
    }

    pub fn is_logical(&self) -> bool {
        self.category() == OperatorCategory::Logical
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if the key is written as an operator.
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with(OPERATOR_SIGIL)
}

/// Recursively checks that every operator key in the filter is known.
///
/// Descends into nested maps and into maps found inside arrays. The first
/// unknown operator aborts the walk.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidOperator`] naming the offending key.
pub fn validate_filter(filter: &Map) -> DocumentStoreResult<()> {
    for (key, value) in filter {
        if is_operator_key(key) && Operator::from_name(key).is_none() {
            return Err(DocumentStoreError::InvalidOperator(key.clone()));
        }

        match value {
            Value::Map(nested) => validate_filter(nested)?,
            Value::Array(items) => {
                for nested in items.iter().filter_map(Value::as_map) {
                    validate_filter(nested)?;
                }
            },
            _ => {},
        }
    }

    Ok(())
}

/// A filter as supplied by a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map);

impl Filter {
    pub fn new(conditions: Map) -> Self {
        Self(conditions)
    }

    /// A filter with no conditions, matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a filter from an untyped value; `Null` means "match everything".
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidFilterShape`] if the value is neither a map nor null.
    pub fn try_from_value(value: Value) -> DocumentStoreResult<Self> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::Map(map) => Ok(Self(map)),
            other => Err(DocumentStoreError::InvalidFilterShape(format!(
                "expected an object, found {}",
                other.kind()
            ))),
        }
    }

    pub fn try_from_json(value: serde_json::Value) -> DocumentStoreResult<Self> {
        Self::try_from_value(Value::from(value))
    }

    pub fn conditions(&self) -> &Map {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// See [`validate_filter`].
    pub fn validate(&self) -> DocumentStoreResult<()> {
        validate_filter(&self.0)
    }

    /// Validates the filter and lowers it into an [`Expr`] tree.
    ///
    /// The returned expression is an implicit `And` over the filter's
    /// top-level keys. Logical operators other than `$and`/`$or` are dropped,
    /// as are unevaluated operators inside field conditions.
    pub fn compile(&self) -> DocumentStoreResult<Expr> {
        self.validate()?;

        Ok(lower_filter(&self.0))
    }
}

/// A dot-separated path addressing a value nested inside a document payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(path: &str) -> Self {
        Self(
            path
                .split(PATH_SEPARATOR)
                .map(str::to_string)
                .collect()
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Resolves the path against a payload.
    ///
    /// Returns `None` as soon as a segment is missing or an intermediate value
    /// is not a map.
    pub fn resolve<'a>(&self, data: &'a Map) -> Option<&'a Value> {
        let (last, parents) = self.0.split_last()?;
        let mut current = data;

        for segment in parents {
            current = current.get(segment)?.as_map()?;
        }

        current.get(last)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A compiled `$regex` operand.
///
/// `compiled` is `None` when the operand was not a string or failed to
/// compile; such a pattern never matches.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: Value,
    pub compiled: Option<Regex>,
}

impl Pattern {
    pub fn new(source: Value) -> Self {
        let compiled = source
            .as_str()
            .and_then(|pattern| Regex::new(pattern).ok());

        Self { source, compiled }
    }
}

/// A single evaluated operator inside a field condition.
#[derive(Debug, Clone)]
pub enum FieldOp {
    /// Match-equality.
    Eq(Value),
    /// Negated match-equality.
    Ne(Value),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal to.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal to.
    Lte(Value),
    /// Equal to any element of the operand array.
    In(Value),
    /// Equal to no element of the operand array.
    Nin(Value),
    /// The field is (or is not) non-null.
    Exists(Value),
    /// The field is a string matching the pattern anywhere.
    Regex(Pattern),
}

impl FieldOp {
    fn lower(op: Operator, operand: &Value) -> Option<Self> {
        let operand = operand.clone();

        match op {
            Operator::Eq => Some(FieldOp::Eq(operand)),
            Operator::Ne => Some(FieldOp::Ne(operand)),
            Operator::Gt => Some(FieldOp::Gt(operand)),
            Operator::Gte => Some(FieldOp::Gte(operand)),
            Operator::Lt => Some(FieldOp::Lt(operand)),
            Operator::Lte => Some(FieldOp::Lte(operand)),
            Operator::In => Some(FieldOp::In(operand)),
            Operator::Nin => Some(FieldOp::Nin(operand)),
            Operator::Exists => Some(FieldOp::Exists(operand)),
            Operator::Regex => Some(FieldOp::Regex(Pattern::new(operand))),
            _ => None,
        }
    }
}

/// The condition attached to a field path.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A plain value, compared with match-equality.
    Equals(Value),
    /// A map of operators; all must hold. An empty list always holds.
    Operators(Vec<FieldOp>),
}

/// A compiled filter expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// All expressions must match (true when empty).
    And(Vec<Expr>),
    /// At least one expression must match (false when empty).
    Or(Vec<Expr>),
    /// The value at `path` must satisfy `condition`.
    Field {
        path: FieldPath,
        condition: Condition,
    },
    /// A constant outcome, used for malformed logical operands.
    Literal(bool),
}

fn lower_filter(filter: &Map) -> Expr {
    let mut clauses = Vec::with_capacity(filter.len());

    for (key, condition) in filter {
        if is_operator_key(key) {
            match Operator::from_name(key) {
                Some(Operator::And) => clauses.push(lower_logical(condition, Expr::And)),
                Some(Operator::Or) => clauses.push(lower_logical(condition, Expr::Or)),
                _ => {},
            }
            continue;
        }

        clauses.push(Expr::Field {
            path: FieldPath::parse(key),
            condition: lower_condition(condition),
        });
    }

    Expr::And(clauses)
}

// Non-map elements of the operand array are skipped; a non-array operand fails.
fn lower_logical(operand: &Value, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    match operand.as_array() {
        Some(items) => combine(
            items
                .iter()
                .filter_map(Value::as_map)
                .map(lower_filter)
                .collect()
        ),
        None => Expr::Literal(false),
    }
}

fn lower_condition(condition: &Value) -> Condition {
    match condition {
        Value::Map(ops) => Condition::Operators(
            ops
                .iter()
                .filter_map(|(key, operand)| {
                    Operator::from_name(key).and_then(|op| FieldOp::lower(op, operand))
                })
                .collect()
        ),
        other => Condition::Equals(other.clone()),
    }
}

/// Walks a compiled [`Expr`] tree.
///
/// Backends implement this trait to evaluate or translate filters.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        path: &FieldPath,
        condition: &Condition,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_literal(&mut self, value: bool) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Field { path, condition } => self.visit_field(path, condition),
            Expr::Literal(value) => self.visit_literal(*value),
        }
    }
}

/// Documents matched by a query, with their count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub documents: Vec<Document>,
    pub count: usize,
}

impl From<Vec<Document>> for QueryResult {
    fn from(documents: Vec<Document>) -> Self {
        Self {
            count: documents.len(),
            documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: serde_json::Value) -> Filter {
        Filter::try_from_json(value).unwrap()
    }

    #[test]
    fn operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.as_str()), Some(op));
        }
        assert_eq!(Operator::from_name("$bogus"), None);
        assert_eq!(Operator::from_name("eq"), None);
    }

    #[test]
    fn logical_operators_are_categorized() {
        let logical = Operator::ALL
            .iter()
            .filter(|op| op.is_logical())
            .count();

        assert_eq!(logical, 4);
        assert_eq!(Operator::ElemMatch.category(), OperatorCategory::Array);
        assert_eq!(Operator::Mod.category(), OperatorCategory::Evaluation);
    }

    #[test]
    fn rejects_unknown_top_level_operator() {
        let err = filter(json!({ "$bogus": 1 })).validate().unwrap_err();

        assert_eq!(err, DocumentStoreError::InvalidOperator("$bogus".to_string()));
    }

    #[test]
    fn rejects_unknown_operator_in_field_condition() {
        let err = filter(json!({ "age": { "$between": [1, 2] } })).validate().unwrap_err();

        assert_eq!(err, DocumentStoreError::InvalidOperator("$between".to_string()));
    }

    #[test]
    fn rejects_unknown_operator_inside_logical_list() {
        let err = filter(json!({
            "$or": [{ "name": "Alice" }, { "age": { "$nope": 3 } }],
        }))
        .compile()
        .unwrap_err();

        assert_eq!(err, DocumentStoreError::InvalidOperator("$nope".to_string()));
    }

    #[test]
    fn accepts_known_but_unevaluated_operators() {
        let compiled = filter(json!({
            "$nor": [{ "a": 1 }],
            "tags": { "$size": 2, "$all": ["x"], "$elemMatch": { "$gt": 1 } },
            "n": { "$mod": [2, 0], "$type": "number" },
        }))
        .compile();

        assert!(compiled.is_ok());
    }

    #[test]
    fn non_map_filter_is_invalid_shape() {
        assert!(matches!(
            Filter::try_from_json(json!([1, 2])),
            Err(DocumentStoreError::InvalidFilterShape(_))
        ));
        assert!(Filter::try_from_json(json!(null)).unwrap().is_empty());
    }

    #[test]
    fn lowers_into_implicit_and() {
        let expr = filter(json!({
            "name": "Alice",
            "age": { "$gte": 18, "$type": "number" },
            "$or": [{ "a": 1 }, 5],
            "$not": [{ "b": 2 }],
        }))
        .compile()
        .unwrap();

        let Expr::And(clauses) = expr else {
            panic!("expected top-level and");
        };
        assert_eq!(clauses.len(), 3);

        assert!(clauses.iter().any(|clause| matches!(clause, Expr::Or(items) if items.len() == 1)));
        assert!(clauses.iter().any(|clause| matches!(
            clause,
            Expr::Field { condition: Condition::Operators(ops), .. } if ops.len() == 1
        )));
    }

    #[test]
    fn non_array_logical_operand_lowers_to_false() {
        let expr = filter(json!({ "$and": { "a": 1 } })).compile().unwrap();

        let Expr::And(clauses) = expr else {
            panic!("expected top-level and");
        };
        assert!(matches!(clauses.as_slice(), [Expr::Literal(false)]));
    }

    #[test]
    fn invalid_regex_compiles_to_never_matching_pattern() {
        assert!(Pattern::new(Value::from("(unclosed")).compiled.is_none());
        assert!(Pattern::new(Value::from(3)).compiled.is_none());
        assert!(Pattern::new(Value::from("^A")).compiled.is_some());
    }

    #[test]
    fn resolves_nested_paths() {
        let data = Value::from(json!({
            "address": { "city": "NYC", "geo": { "lat": 40.7 } },
            "name": "Alice",
        }))
        .into_map()
        .unwrap();

        assert_eq!(
            FieldPath::parse("address.city").resolve(&data),
            Some(&Value::from("NYC"))
        );
        assert_eq!(
            FieldPath::parse("address.geo.lat").resolve(&data),
            Some(&Value::Number(40.7))
        );
        assert_eq!(FieldPath::parse("address.zip").resolve(&data), None);
        assert_eq!(FieldPath::parse("name.first").resolve(&data), None);
        assert_eq!(FieldPath::parse("address.city").to_string(), "address.city");
    }

    #[test]
    fn query_result_counts_documents() {
        let result = QueryResult::from(vec![Document::new(Map::new()), Document::new(Map::new())]);

        assert_eq!(result.count, 2);
    }
}
