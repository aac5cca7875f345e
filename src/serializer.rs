//! Expression trees -> textual filter queries.

use crate::expr::Expression;

/// Serialize an expression into the textual grammar.
///
/// Groups are always parenthesized and their children joined with the
/// connective word; leaves render as `attr:v1,v2` (membership) or
/// `attr!v1,v2` (negated membership). This is the left inverse of
/// [`crate::parser::parse`] for trees built through the query builder and
/// joiner, up to whitespace and parenthesization normalization.
pub fn serialize(expr: &Expression) -> String {
    match expr {
        Expression::Predicate(predicate) => format!(
            "{}{}{}",
            predicate.attribute,
            predicate.comparison.splitter(),
            predicate.comparison.render_values()
        ),
        Expression::Group {
            connective,
            children,
        } => {
            let separator = format!(" {} ", connective.word());
            let body = children
                .iter()
                .map(serialize)
                .collect::<Vec<_>>()
                .join(&separator);
            format!("({body})")
        }
    }
}

/// AND-merge `key:value` options into an existing query string.
///
/// Both inputs and the result are in the decoded textual grammar; percent
/// encoding and decoding belong to the transport layer. An empty option set
/// returns the existing query unchanged; an empty existing query returns
/// just the rendered options. Otherwise the existing query is enclosed in
/// parentheses when it carries a connective but is not already enclosed,
/// and the two sides are joined under `AND`.
pub fn construct_query_url(existing_query: &str, options: &[(&str, &str)]) -> String {
    let rendered: Vec<String> = options
        .iter()
        .map(|(key, value)| format!("{key}:{value}"))
        .collect();
    let processed = match rendered.len() {
        0 => return existing_query.to_string(),
        1 => rendered.into_iter().next().unwrap_or_default(),
        _ => format!("({})", rendered.join(" AND ")),
    };

    if existing_query.is_empty() {
        return processed;
    }

    let mut existing = existing_query.to_string();
    if (existing.contains(" AND ") || existing.contains(" OR "))
        && !(existing.starts_with('(') && existing.ends_with(')'))
    {
        existing = format!("({existing})");
    }
    format!("({existing} AND {processed})")
}
