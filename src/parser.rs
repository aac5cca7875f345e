//! Textual filter queries -> expression trees.
//!
//! The grammar has no operator precedence: a level is either a pure `OR`
//! split or, failing that, a pure `AND` split of its top-level terms.
//! Parenthesized groups are lifted out first (balanced-paren scan) and
//! replaced with a placeholder so connective splitting ignores anything
//! nested, then substituted back before recursing into each term. A term
//! with neither connective nor group is a leaf of the form `attr:v1,v2`
//! (membership) or `attr!v1,v2` (negated membership).

use std::fmt;

use crate::expr::{Comparison, Connective, Expression, Predicate};

const GROUP_PLACEHOLDER: &str = "__group__";

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A term carried no `:`/`!` operator, or was empty.
    MalformedQuery(String),
    /// Parenthesis depth did not return to zero.
    UnbalancedParens,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedQuery(term) if term.is_empty() => {
                write!(f, "empty filter term")
            }
            ParseError::MalformedQuery(term) => {
                write!(f, "filter term `{term}` has no `:` or `!` operator")
            }
            ParseError::UnbalancedParens => write!(f, "unbalanced parentheses"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a textual filter query into an expression tree.
///
/// A top-level single predicate (or single parenthesized predicate) is
/// wrapped in a one-child `OR` group, so a freshly parsed lone predicate has
/// the same shape as one produced through the query builder and joiner.
pub fn parse(query: &str) -> Result<Expression, ParseError> {
    parse_level(query, true)
}

fn parse_level(query: &str, first_level: bool) -> Result<Expression, ParseError> {
    let (stripped, groups) = extract_groups(query)?;
    let mut groups = groups.into_iter();

    for connective in [Connective::Or, Connective::And] {
        let separator = format!(" {} ", connective.word());
        let parts: Vec<&str> = stripped.split(separator.as_str()).collect();
        if parts.len() > 1 {
            let children = parts
                .iter()
                .map(|part| parse_level(&resolve(part.trim(), &mut groups), false))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Expression::group(connective, children));
        }
    }

    let resolved = resolve(stripped.trim(), &mut groups);
    if resolved.trim() != query.trim() && (has_connective(&resolved) || resolved.contains('(')) {
        // the whole level was one parenthesized group; parse its body
        return parse_level(&resolved, false);
    }
    let term = resolved.trim();
    if term.contains('(') {
        return Err(ParseError::MalformedQuery(term.to_string()));
    }
    let leaf = parse_leaf(term)?;
    if first_level {
        Ok(Expression::group(Connective::Or, vec![leaf]))
    } else {
        Ok(leaf)
    }
}

/// Lift out top-level parenthesized groups, replacing each with a
/// placeholder and collecting the group bodies in source order.
fn extract_groups(query: &str) -> Result<(String, Vec<String>), ParseError> {
    let mut stripped = String::with_capacity(query.len());
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut open = None;

    for (index, ch) in query.char_indices() {
        match ch {
            '(' => {
                if open.is_none() {
                    open = Some(index);
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(ParseError::UnbalancedParens);
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = open.take() {
                        groups.push(query[start + 1..index].to_string());
                        stripped.push_str(GROUP_PLACEHOLDER);
                    }
                }
            }
            _ => {
                if open.is_none() {
                    stripped.push(ch);
                }
            }
        }
    }
    if depth != 0 {
        return Err(ParseError::UnbalancedParens);
    }
    Ok((stripped, groups))
}

/// Substitute extracted group bodies back into a split term. A term that is
/// exactly the placeholder becomes the raw body; a placeholder embedded in a
/// longer term is re-parenthesized so nested grouping survives the
/// recursion.
fn resolve<I>(term: &str, groups: &mut I) -> String
where
    I: Iterator<Item = String>,
{
    if term == GROUP_PLACEHOLDER {
        return groups.next().unwrap_or_default();
    }
    let mut resolved = term.to_string();
    let mut search_from = 0;
    while let Some(offset) = resolved[search_from..].find(GROUP_PLACEHOLDER) {
        let Some(body) = groups.next() else { break };
        let at = search_from + offset;
        let replacement = format!("({body})");
        resolved.replace_range(at..at + GROUP_PLACEHOLDER.len(), &replacement);
        search_from = at + replacement.len();
    }
    resolved
}

fn has_connective(term: &str) -> bool {
    term.contains(" AND ") || term.contains(" OR ")
}

fn parse_leaf(term: &str) -> Result<Expression, ParseError> {
    if term.is_empty() {
        return Err(ParseError::MalformedQuery(String::new()));
    }
    let Some((index, splitter)) = term.char_indices().find(|(_, c)| *c == ':' || *c == '!')
    else {
        return Err(ParseError::MalformedQuery(term.to_string()));
    };

    let attribute = &term[..index];
    let mut values: Vec<String> = term[index + 1..]
        .split(',')
        .map(|value| value.trim().to_string())
        .collect();

    let comparison = match (splitter, values.len() > 1) {
        ('!', true) => Comparison::Nin(values),
        ('!', false) => Comparison::Neq(values.pop().unwrap_or_default()),
        (_, true) => Comparison::In(values),
        (_, false) => Comparison::Eq(values.pop().unwrap_or_default()),
    };
    Ok(Expression::Predicate(Predicate::new(attribute, comparison)))
}
