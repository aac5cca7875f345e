//! Predicate construction and normalized tree merging.

use std::fmt;

use crate::expr::{Comparison, Connective, Expression, Predicate};

/// The compare token handed to [`query_builder`] was not one of the four
/// recognized operators.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidOperator {
    pub token: String,
}

impl fmt::Display for InvalidOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a valid compare notation: `{}`", self.token)
    }
}

impl std::error::Error for InvalidOperator {}

/// The existing tree handed to [`query_joiner`] has no connective at its
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidJoin;

impl fmt::Display for InvalidJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "existing query is invalid without a joiner at the root")
    }
}

impl std::error::Error for InvalidJoin {}

/// A scalar or sequence value handed to [`query_builder`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Many(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Build a predicate from an attribute key, a compare token (`$EQ`, `$NEQ`,
/// `$IN`, `$NIN`) and a value. The key, the token and every value are
/// trimmed. A sequence value is a membership test whichever token arrives,
/// so `$EQ`/`$NEQ` with a sequence are stored as `$IN`/`$NIN`.
pub fn query_builder(
    key: &str,
    compare: &str,
    value: impl Into<FilterValue>,
) -> Result<Predicate, InvalidOperator> {
    let comparison = match (compare.trim(), value.into()) {
        ("$EQ", FilterValue::Single(value)) => Comparison::Eq(value),
        ("$EQ", FilterValue::Many(values)) => Comparison::In(values),
        ("$NEQ", FilterValue::Single(value)) => Comparison::Neq(value),
        ("$NEQ", FilterValue::Many(values)) => Comparison::Nin(values),
        ("$IN", FilterValue::Single(value)) => Comparison::In(vec![value]),
        ("$IN", FilterValue::Many(values)) => Comparison::In(values),
        ("$NIN", FilterValue::Single(value)) => Comparison::Nin(vec![value]),
        ("$NIN", FilterValue::Many(values)) => Comparison::Nin(values),
        (other, _) => {
            return Err(InvalidOperator {
                token: other.to_string(),
            })
        }
    };
    Ok(Predicate::new(key, comparison))
}

/// Merge `incoming` into `existing` under `connective`, keeping
/// same-connective runs flat instead of nesting.
///
/// An empty existing tree adopts the incoming expression, wrapping a bare
/// predicate in a one-child `OR` group; an existing tree whose root is not
/// a group fails with [`InvalidJoin`]. A single-child existing group of the
/// colliding shape splices the incoming expression in as a sibling of that
/// child rather than nesting another level; repeated same-connective joins
/// therefore grow one flat children list.
pub fn query_joiner(
    existing: Option<Expression>,
    connective: Connective,
    incoming: Option<Expression>,
) -> Result<Option<Expression>, InvalidJoin> {
    let Some(existing) = existing else {
        return Ok(match incoming {
            None => None,
            Some(group @ Expression::Group { .. }) => Some(group),
            Some(leaf) => Some(Expression::group(Connective::Or, vec![leaf])),
        });
    };

    let (existing_connective, mut existing_children) = match existing {
        Expression::Group {
            connective,
            children,
        } => (connective, children),
        Expression::Predicate(_) => return Err(InvalidJoin),
    };

    let Some(incoming) = incoming else {
        return Ok(Some(Expression::group(
            existing_connective,
            existing_children,
        )));
    };

    let merged = match incoming {
        Expression::Group {
            connective: incoming_connective,
            children: mut incoming_children,
        } => {
            if incoming_connective == connective && existing_connective == connective {
                existing_children.append(&mut incoming_children);
                Expression::group(connective, existing_children)
            } else if existing_connective == connective && existing_children.len() == 1 {
                existing_children.push(Expression::group(
                    incoming_connective,
                    incoming_children,
                ));
                Expression::group(connective, existing_children)
            } else {
                Expression::group(
                    connective,
                    vec![
                        Expression::group(existing_connective, existing_children),
                        Expression::group(incoming_connective, incoming_children),
                    ],
                )
            }
        }
        leaf => {
            if existing_connective == connective || existing_children.len() == 1 {
                existing_children.push(leaf);
                Expression::group(connective, existing_children)
            } else {
                Expression::group(
                    connective,
                    vec![
                        Expression::group(existing_connective, existing_children),
                        leaf,
                    ],
                )
            }
        }
    };
    Ok(Some(merged))
}
