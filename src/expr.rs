//! The expression tree shared by the parser, serializer and joiner.

use std::fmt;

use serde_json::{Map, Value};

/// Boolean combinator joining sibling clauses in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// The separator word used in the textual query grammar.
    pub fn word(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }

    /// The key used in the structural (wire) encoding.
    pub fn token(&self) -> &'static str {
        match self {
            Connective::And => "$AND",
            Connective::Or => "$OR",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$AND" => Some(Connective::And),
            "$OR" => Some(Connective::Or),
            _ => None,
        }
    }
}

/// A comparison applied to a single attribute. `Eq`/`Neq` carry one value,
/// `In`/`Nin` carry an ordered value list.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(String),
    Neq(String),
    In(Vec<String>),
    Nin(Vec<String>),
}

impl Comparison {
    /// The operator key used in the structural encoding.
    pub fn token(&self) -> &'static str {
        match self {
            Comparison::Eq(_) => "$EQ",
            Comparison::Neq(_) => "$NEQ",
            Comparison::In(_) => "$IN",
            Comparison::Nin(_) => "$NIN",
        }
    }

    /// The splitter character used in the textual leaf form.
    pub fn splitter(&self) -> char {
        match self {
            Comparison::Eq(_) | Comparison::In(_) => ':',
            Comparison::Neq(_) | Comparison::Nin(_) => '!',
        }
    }

    /// Comma-joined rendering of the value side of a leaf.
    pub fn render_values(&self) -> String {
        match self {
            Comparison::Eq(value) | Comparison::Neq(value) => value.clone(),
            Comparison::In(values) | Comparison::Nin(values) => values.join(","),
        }
    }

    fn trimmed(self) -> Self {
        let trim_all = |values: Vec<String>| {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .collect::<Vec<_>>()
        };
        match self {
            Comparison::Eq(value) => Comparison::Eq(value.trim().to_string()),
            Comparison::Neq(value) => Comparison::Neq(value.trim().to_string()),
            Comparison::In(values) => Comparison::In(trim_all(values)),
            Comparison::Nin(values) => Comparison::Nin(trim_all(values)),
        }
    }
}

/// A single attribute/operator/value leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub attribute: String,
    pub comparison: Comparison,
}

impl Predicate {
    /// The attribute and every value are stored trimmed.
    pub fn new(attribute: &str, comparison: Comparison) -> Self {
        Self {
            attribute: attribute.trim().to_string(),
            comparison: comparison.trimmed(),
        }
    }
}

/// Either a single predicate leaf or a connective group of child expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Predicate(Predicate),
    Group {
        connective: Connective,
        children: Vec<Expression>,
    },
}

impl Expression {
    pub fn predicate(attribute: &str, comparison: Comparison) -> Self {
        Expression::Predicate(Predicate::new(attribute, comparison))
    }

    pub fn group(connective: Connective, children: Vec<Expression>) -> Self {
        Expression::Group {
            connective,
            children,
        }
    }

    /// The root connective, or `None` for a bare predicate.
    pub fn connective(&self) -> Option<Connective> {
        match self {
            Expression::Group { connective, .. } => Some(*connective),
            Expression::Predicate(_) => None,
        }
    }

    /// Encode into the structural wire shape: a group is an object with the
    /// connective token as its sole key mapping to the child list, a
    /// predicate is `{attribute: {op_token: value-or-list}}`.
    pub fn to_value(&self) -> Value {
        match self {
            Expression::Predicate(predicate) => {
                let payload = match &predicate.comparison {
                    Comparison::Eq(value) | Comparison::Neq(value) => {
                        Value::String(value.clone())
                    }
                    Comparison::In(values) | Comparison::Nin(values) => Value::Array(
                        values.iter().map(|v| Value::String(v.clone())).collect(),
                    ),
                };
                let mut operation = Map::new();
                operation.insert(predicate.comparison.token().to_string(), payload);
                let mut outer = Map::new();
                outer.insert(predicate.attribute.clone(), Value::Object(operation));
                Value::Object(outer)
            }
            Expression::Group {
                connective,
                children,
            } => {
                let encoded = children.iter().map(Expression::to_value).collect();
                let mut outer = Map::new();
                outer.insert(connective.token().to_string(), Value::Array(encoded));
                Value::Object(outer)
            }
        }
    }

    /// Decode the structural wire shape produced by [`Expression::to_value`].
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let (key, inner) = single_entry(value)?;
        if let Some(connective) = Connective::from_token(key) {
            let items = inner.as_array().ok_or_else(|| {
                DecodeError::new(format!("`{key}` must map to a list of children"))
            })?;
            if items.is_empty() {
                return Err(DecodeError::new(format!(
                    "`{key}` group must have at least one child"
                )));
            }
            let children = items
                .iter()
                .map(Expression::from_value)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Expression::group(connective, children));
        }

        let (operator, payload) = single_entry(inner)?;
        let comparison = match operator.as_str() {
            "$EQ" => Comparison::Eq(string_payload(operator, payload)?),
            "$NEQ" => Comparison::Neq(string_payload(operator, payload)?),
            "$IN" => Comparison::In(list_payload(operator, payload)?),
            "$NIN" => Comparison::Nin(list_payload(operator, payload)?),
            other => {
                return Err(DecodeError::new(format!(
                    "unrecognized operator key `{other}`"
                )))
            }
        };
        Ok(Expression::predicate(key, comparison))
    }
}

fn single_entry(value: &Value) -> Result<(&String, &Value), DecodeError> {
    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::new("expected an object node".to_string()))?;
    match (object.len(), object.iter().next()) {
        (1, Some((key, inner))) => Ok((key, inner)),
        (found, _) => Err(DecodeError::new(format!(
            "expected an object with exactly one key, found {found}"
        ))),
    }
}

fn string_payload(operator: &str, payload: &Value) -> Result<String, DecodeError> {
    payload
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DecodeError::new(format!("`{operator}` must carry a single string value")))
}

fn list_payload(operator: &str, payload: &Value) -> Result<Vec<String>, DecodeError> {
    let items = payload
        .as_array()
        .ok_or_else(|| DecodeError::new(format!("`{operator}` must carry a list of values")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| DecodeError::new(format!("`{operator}` values must be strings")))
        })
        .collect()
}

/// A structural encoding could not be decoded back into an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid filter encoding: {}", self.message)
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predicate_encoding_shape() {
        let expr = Expression::predicate("area", Comparison::Eq("Area1".to_string()));
        assert_eq!(expr.to_value(), json!({"area": {"$EQ": "Area1"}}));

        let expr = Expression::predicate(
            "iteration",
            Comparison::In(vec!["it1".to_string(), "it2".to_string()]),
        );
        assert_eq!(expr.to_value(), json!({"iteration": {"$IN": ["it1", "it2"]}}));
    }

    #[test]
    fn test_group_encoding_shape() {
        let expr = Expression::group(
            Connective::And,
            vec![
                Expression::predicate("area", Comparison::Eq("Area1".to_string())),
                Expression::predicate("workitemtype", Comparison::Neq("bug".to_string())),
            ],
        );
        assert_eq!(
            expr.to_value(),
            json!({"$AND": [
                {"area": {"$EQ": "Area1"}},
                {"workitemtype": {"$NEQ": "bug"}}
            ]})
        );
    }

    #[test]
    fn test_encoding_round_trip() {
        let expr = Expression::group(
            Connective::Or,
            vec![
                Expression::group(
                    Connective::And,
                    vec![
                        Expression::predicate("area", Comparison::Eq("planner".to_string())),
                        Expression::predicate(
                            "assignee",
                            Comparison::Nin(vec!["7".to_string(), "42".to_string()]),
                        ),
                    ],
                ),
                Expression::predicate("workitemtype", Comparison::Eq("bug".to_string())),
            ],
        );
        let decoded = Expression::from_value(&expr.to_value()).unwrap();
        assert_eq!(decoded, expr);
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(Expression::from_value(&json!("area:Area1")).is_err());
        assert!(Expression::from_value(&json!({"$AND": []})).is_err());
        assert!(Expression::from_value(&json!({"$AND": "not-a-list"})).is_err());
        assert!(Expression::from_value(&json!({"area": {"$GT": "5"}})).is_err());
        assert!(Expression::from_value(&json!({"area": {"$IN": "scalar"}})).is_err());
        assert!(
            Expression::from_value(&json!({"area": {"$EQ": "x"}, "type": {"$EQ": "y"}})).is_err()
        );
    }

    #[test]
    fn test_predicate_trims_attribute_and_values() {
        let predicate = Predicate::new(
            "  iteration ",
            Comparison::In(vec![" it1".to_string(), "it2  ".to_string()]),
        );
        assert_eq!(predicate.attribute, "iteration");
        assert_eq!(
            predicate.comparison,
            Comparison::In(vec!["it1".to_string(), "it2".to_string()])
        );
    }

    #[test]
    fn test_connective_tokens() {
        assert_eq!(Connective::And.word(), "AND");
        assert_eq!(Connective::Or.token(), "$OR");
        assert_eq!(Connective::from_token("$AND"), Some(Connective::And));
        assert_eq!(Connective::from_token("AND"), None);
    }
}
