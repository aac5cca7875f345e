//! Interactive console for the filter expression engine.
//!
//! Grows a query tree one predicate at a time the way the UI does, shows
//! the textual and structural encodings side by side, and matches a small
//! set of sample work items against the active filter list.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde_json::{json, Value};

use workitem_filter::config::FilterCatalog;
use workitem_filter::expr::{Connective, Expression};
use workitem_filter::joiner::{query_builder, query_joiner, FilterValue};
use workitem_filter::parser::parse;
use workitem_filter::serializer::serialize;
use workitem_filter::session::FilterSession;

struct Console {
    catalog: FilterCatalog,
    session: FilterSession,
    query: Option<Expression>,
    records: Vec<Value>,
}

fn main() -> Result<()> {
    println!("--- workitem_filter: filter query console ---");

    let catalog = match FilterCatalog::from_json_file("filters.json") {
        Ok(catalog) => {
            println!(
                "loaded {} filter definitions from filters.json",
                catalog.filters().len()
            );
            catalog
        }
        Err(e) => {
            println!("{e}; using the built-in catalog");
            FilterCatalog::default()
        }
    };

    let mut console = Console {
        catalog,
        session: FilterSession::new(),
        query: None,
        records: sample_records(),
    };

    println!("{} sample work items loaded; type `help` for commands", console.records.len());

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(&line)?;
                if line == "quit" || line == "exit" {
                    break;
                }
                if let Err(e) = console.dispatch(&line) {
                    println!("error: {e}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

impl Console {
    fn dispatch(&mut self, line: &str) -> Result<()> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "help" => print_help(),
            "filters" => {
                for definition in self.catalog.filters() {
                    let kind = if definition.multi_valued { "multi" } else { "single" };
                    println!("  {:<14} {:<12} ({kind})", definition.id, definition.title);
                }
            }
            "parse" => {
                let expr = parse(rest)?;
                println!("{expr:#?}");
                println!("{}", serde_json::to_string_pretty(&expr.to_value())?);
            }
            "and" | "or" => {
                let connective = if command == "and" {
                    Connective::And
                } else {
                    Connective::Or
                };
                self.join(connective, rest)?;
                self.show();
            }
            "show" => self.show(),
            "reset" => {
                self.query = None;
                println!("query tree cleared");
            }
            "set" => match rest.split_once(char::is_whitespace) {
                Some((id, value)) => {
                    self.session.set_filter_value(id, value.trim());
                    println!("filter[{id}] = {}", value.trim());
                }
                None => anyhow::bail!("usage: set <id> <value>"),
            },
            "clear" => {
                let ids: Vec<&str> = rest.split_whitespace().collect();
                self.session.clear_filters(&ids);
                println!("{} filters active", self.session.applied_filters().len());
            }
            "active" => {
                for (key, value) in self.session.query_params() {
                    println!("  {key}={value}");
                }
            }
            "match" => {
                for record in &self.records {
                    let id = record.get("id").and_then(Value::as_str).unwrap_or("?");
                    let verdict = if self.session.matches(record) {
                        "matches"
                    } else {
                        "filtered out"
                    };
                    println!("  {id:<6} {verdict}");
                }
            }
            _ => anyhow::bail!("unknown command `{command}`; type `help`"),
        }
        Ok(())
    }

    /// `and`/`or` command bodies look like `<attribute> <$OP> <v1,v2,...>`.
    fn join(&mut self, connective: Connective, rest: &str) -> Result<()> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let [attribute, compare, raw_values] = tokens[..] else {
            anyhow::bail!(
                "usage: {} <attribute> <$EQ|$NEQ|$IN|$NIN> <v1,v2,...>",
                connective.word().to_lowercase()
            );
        };

        let values: Vec<String> = raw_values.split(',').map(str::to_string).collect();
        let value = if values.len() > 1 {
            FilterValue::Many(values)
        } else {
            FilterValue::Single(raw_values.to_string())
        };

        let predicate = query_builder(attribute, compare, value)?;
        self.query = query_joiner(
            self.query.take(),
            connective,
            Some(Expression::Predicate(predicate)),
        )?;
        Ok(())
    }

    fn show(&self) {
        match &self.query {
            Some(expr) => {
                println!("{}", serialize(expr));
                match serde_json::to_string_pretty(&expr.to_value()) {
                    Ok(encoded) => println!("{encoded}"),
                    Err(e) => println!("error: {e}"),
                }
            }
            None => println!("query tree is empty"),
        }
    }
}

fn print_help() {
    println!("  parse <query>                 parse a textual query, print tree + encoding");
    println!("  and <attr> <$OP> <values>     join a predicate into the tree under AND");
    println!("  or <attr> <$OP> <values>      join a predicate into the tree under OR");
    println!("  show                          serialize the current tree");
    println!("  reset                         drop the current tree");
    println!("  set <id> <value>              apply an active filter");
    println!("  clear [id ...]                clear listed filters, or all");
    println!("  active                        list active filter query params");
    println!("  match                         match sample work items");
    println!("  filters                       list available filter definitions");
    println!("  quit                          leave the console");
}

fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "id": "wi-1",
            "attributes": { "system.title": "Fix login crash" },
            "relationships": {
                "assignees": { "data": [ { "id": "42" }, { "id": "7" } ] },
                "area": { "data": { "id": "planner" } },
                "baseType": { "data": { "id": "bug" } },
                "iteration": { "data": { "id": "it1" } }
            }
        }),
        json!({
            "id": "wi-2",
            "attributes": { "system.title": "Polish board layout" },
            "relationships": {
                "assignees": { "data": [ { "id": "7" } ] },
                "area": { "data": { "id": "ui" } },
                "baseType": { "data": { "id": "task" } },
                "iteration": { "data": { "id": "it2" } }
            }
        }),
        json!({
            "id": "wi-3",
            "attributes": { "system.title": "Plan iteration scope" },
            "relationships": {
                "assignees": { "data": [] },
                "area": { "data": { "id": "planner" } },
                "baseType": { "data": { "id": "task" } },
                "iteration": { "data": { "id": "it1" } }
            }
        }),
    ]
}
