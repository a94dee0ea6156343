//! Filter-query construction
//!
//! Builds strings of the form `field[.<type>_value] OP literal`, combined with
//! `AND` / `OR` and parentheses. The builder never validates field names or
//! operator/type compatibility: the server owns the grammar and reports
//! problems as 4xx responses. A [`FilterQuery::raw`] string is sent
//! byte-for-byte.

use std::fmt;

/// Typed-value suffix for custom-property fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
}

impl ValueType {
    pub fn suffix(&self) -> &'static str {
        match self {
            ValueType::String => "string_value",
            ValueType::Int => "int_value",
            ValueType::Float => "float_value",
            ValueType::Bool => "bool_value",
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
    ILike,
    In,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::In => "IN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Literal>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

/// A single `field OP literal` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value_type: Option<ValueType>,
    pub op: Operator,
    pub literal: Literal,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;
        if let Some(value_type) = self.value_type {
            write!(f, ".{}", value_type.suffix())?;
        }
        write!(f, " {} {}", self.op, self.literal)
    }
}

/// Left-hand side under construction
#[derive(Debug, Clone)]
pub struct FieldRef {
    field: String,
    value_type: Option<ValueType>,
}

impl FieldRef {
    fn compare(self, op: Operator, literal: Literal) -> FilterQuery {
        FilterQuery::Condition(Condition {
            field: self.field,
            value_type: self.value_type,
            op,
            literal,
        })
    }

    pub fn eq(self, literal: impl Into<Literal>) -> FilterQuery {
        self.compare(Operator::Eq, literal.into())
    }

    pub fn ne(self, literal: impl Into<Literal>) -> FilterQuery {
        self.compare(Operator::Ne, literal.into())
    }

    pub fn lt(self, literal: impl Into<Literal>) -> FilterQuery {
        self.compare(Operator::Lt, literal.into())
    }

    pub fn gt(self, literal: impl Into<Literal>) -> FilterQuery {
        self.compare(Operator::Gt, literal.into())
    }

    pub fn le(self, literal: impl Into<Literal>) -> FilterQuery {
        self.compare(Operator::Le, literal.into())
    }

    pub fn ge(self, literal: impl Into<Literal>) -> FilterQuery {
        self.compare(Operator::Ge, literal.into())
    }

    pub fn like(self, pattern: impl Into<String>) -> FilterQuery {
        self.compare(Operator::Like, Literal::String(pattern.into()))
    }

    pub fn ilike(self, pattern: impl Into<String>) -> FilterQuery {
        self.compare(Operator::ILike, Literal::String(pattern.into()))
    }

    pub fn is_in<I, L>(self, values: I) -> FilterQuery
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let items = values.into_iter().map(Into::into).collect();
        self.compare(Operator::In, Literal::List(items))
    }
}

/// A filter expression ready to be sent as `filterQuery`
#[derive(Debug, Clone, PartialEq)]
pub enum FilterQuery {
    /// Caller-supplied text, sent verbatim
    Raw(String),
    Condition(Condition),
    And(Vec<FilterQuery>),
    Or(Vec<FilterQuery>),
    Group(Box<FilterQuery>),
}

impl FilterQuery {
    /// Wrap a pre-built filter string; it is never rewritten
    pub fn raw(query: impl Into<String>) -> Self {
        FilterQuery::Raw(query.into())
    }

    /// Start a condition on a plain field (`name`, `state`, ...)
    pub fn field(name: impl Into<String>) -> FieldRef {
        FieldRef {
            field: name.into(),
            value_type: None,
        }
    }

    /// Start a condition on a custom property, rendered as
    /// `name.<type>_value`
    pub fn property(name: impl Into<String>, value_type: ValueType) -> FieldRef {
        FieldRef {
            field: name.into(),
            value_type: Some(value_type),
        }
    }

    pub fn and(self, other: FilterQuery) -> Self {
        match self {
            FilterQuery::And(mut parts) => {
                parts.push(other);
                FilterQuery::And(parts)
            }
            first => FilterQuery::And(vec![first, other]),
        }
    }

    pub fn or(self, other: FilterQuery) -> Self {
        match self {
            FilterQuery::Or(mut parts) => {
                parts.push(other);
                FilterQuery::Or(parts)
            }
            first => FilterQuery::Or(vec![first, other]),
        }
    }

    /// Force parentheses around this expression
    pub fn group(self) -> Self {
        FilterQuery::Group(Box::new(self))
    }

    /// The exact string that goes on the wire
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }

    fn write_joined(
        f: &mut fmt::Formatter<'_>,
        parts: &[FilterQuery],
        connective: &str,
        needs_parens: fn(&FilterQuery) -> bool,
    ) -> fmt::Result {
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", connective)?;
            }
            if needs_parens(part) {
                write!(f, "({})", part)?;
            } else {
                write!(f, "{}", part)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterQuery::Raw(s) => f.write_str(s),
            FilterQuery::Condition(c) => write!(f, "{}", c),
            FilterQuery::And(parts) => Self::write_joined(f, parts, "AND", |p| {
                matches!(p, FilterQuery::Or(_) | FilterQuery::Raw(_))
            }),
            FilterQuery::Or(parts) => Self::write_joined(f, parts, "OR", |p| {
                matches!(p, FilterQuery::And(_) | FilterQuery::Raw(_))
            }),
            FilterQuery::Group(inner) => write!(f, "({})", inner),
        }
    }
}

impl From<&str> for FilterQuery {
    fn from(value: &str) -> Self {
        FilterQuery::raw(value)
    }
}

impl From<String> for FilterQuery {
    fn from(value: String) -> Self {
        FilterQuery::Raw(value)
    }
}

impl From<Condition> for FilterQuery {
    fn from(value: Condition) -> Self {
        FilterQuery::Condition(value)
    }
}
