// SPDX-License-Identifier: MIT

//! Edge condition expressions
//!
//! Conditions guard edges in a workflow graph. They are parsed once at
//! graph-creation time and evaluated against the run's state after every
//! node execution. The grammar is deliberately small:
//! - `is_summary_short_enough == true`
//! - `score >= 0.8`
//! - `intent == 'search' and confidence > 0.5`
//! - `tags contains 'urgent'`

use crate::error::EngineError;
use crate::workflow::state::WorkflowState;
use serde_json::Value;

/// A parsed edge condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `path op literal`
    Compare {
        path: String,
        op: Comparator,
        value: Literal,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    /// Literal `true`
    Always,
    /// Literal `false`
    Never,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring match for strings, membership for arrays
    Contains,
}

/// Literal values on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Condition {
    /// Parse a condition expression, rejecting bad syntax up front
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EngineError::validation("empty condition expression"));
        }
        match input {
            "true" => return Ok(Condition::Always),
            "false" => return Ok(Condition::Never),
            _ => {}
        }

        // Split on the first top-level connective; `or` first so that
        // `and` binds tighter.
        if let Some((lhs, rhs)) = split_top_level(input, " or ") {
            return Ok(Condition::Or(
                Box::new(Condition::parse(lhs)?),
                Box::new(Condition::parse(rhs)?),
            ));
        }
        if let Some((lhs, rhs)) = split_top_level(input, " and ") {
            return Ok(Condition::And(
                Box::new(Condition::parse(lhs)?),
                Box::new(Condition::parse(rhs)?),
            ));
        }

        parse_comparison(input)
    }

    /// Evaluate the condition against the current state
    ///
    /// A missing path compares like JSON null; it never aborts the run.
    pub fn evaluate(&self, state: &WorkflowState) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::And(a, b) => a.evaluate(state) && b.evaluate(state),
            Condition::Or(a, b) => a.evaluate(state) || b.evaluate(state),
            Condition::Compare { path, op, value } => {
                let lhs = state.get_path(path);
                match op {
                    Comparator::Eq => literal_eq(lhs, value),
                    Comparator::NotEq => !literal_eq(lhs, value),
                    Comparator::Gt => numeric(lhs, value, |a, b| a > b),
                    Comparator::Gte => numeric(lhs, value, |a, b| a >= b),
                    Comparator::Lt => numeric(lhs, value, |a, b| a < b),
                    Comparator::Lte => numeric(lhs, value, |a, b| a <= b),
                    Comparator::Contains => contains(lhs, value),
                }
            }
        }
    }
}

/// Find `sep` outside quotes and split there, or None if absent
fn split_top_level<'a>(input: &'a str, sep: &str) -> Option<(&'a str, &'a str)> {
    let mut quoted = false;
    for (i, c) in input.char_indices() {
        match c {
            '\'' | '"' => quoted = !quoted,
            _ if !quoted && input[i..].starts_with(sep) => {
                return Some((&input[..i], &input[i + sep.len()..]));
            }
            _ => {}
        }
    }
    None
}

fn parse_comparison(input: &str) -> Result<Condition, EngineError> {
    // Longest operators first so ">=" is not read as ">".
    const OPS: [(&str, Comparator); 7] = [
        ("!=", Comparator::NotEq),
        (">=", Comparator::Gte),
        ("<=", Comparator::Lte),
        ("==", Comparator::Eq),
        (">", Comparator::Gt),
        ("<", Comparator::Lt),
        (" contains ", Comparator::Contains),
    ];

    for (symbol, op) in OPS {
        if let Some((lhs, rhs)) = split_top_level(input, symbol) {
            let path = lhs.trim();
            if path.is_empty() {
                return Err(EngineError::validation(format!(
                    "condition '{input}' has no left-hand side"
                )));
            }
            return Ok(Condition::Compare {
                path: path.to_string(),
                op,
                value: parse_literal(rhs.trim())?,
            });
        }
    }

    Err(EngineError::validation(format!(
        "cannot parse condition '{input}'"
    )))
}

fn parse_literal(input: &str) -> Result<Literal, EngineError> {
    match input {
        "null" => return Ok(Literal::Null),
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        _ => {}
    }

    if input.len() >= 2
        && ((input.starts_with('\'') && input.ends_with('\''))
            || (input.starts_with('"') && input.ends_with('"')))
    {
        return Ok(Literal::String(input[1..input.len() - 1].to_string()));
    }

    input
        .parse::<f64>()
        .map(Literal::Number)
        .map_err(|_| EngineError::validation(format!("cannot parse literal '{input}'")))
}

fn literal_eq(lhs: Option<&Value>, rhs: &Literal) -> bool {
    match (lhs, rhs) {
        (None | Some(Value::Null), Literal::Null) => true,
        (Some(Value::String(s)), Literal::String(expected)) => s == expected,
        (Some(Value::Bool(b)), Literal::Bool(expected)) => b == expected,
        (Some(Value::Number(n)), Literal::Number(expected)) => n
            .as_f64()
            .map(|f| (f - expected).abs() < f64::EPSILON)
            .unwrap_or(false),
        _ => false,
    }
}

fn numeric<F>(lhs: Option<&Value>, rhs: &Literal, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (lhs.and_then(Value::as_f64), rhs) {
        (Some(l), Literal::Number(r)) => cmp(l, *r),
        _ => false,
    }
}

fn contains(lhs: Option<&Value>, rhs: &Literal) -> bool {
    match (lhs, rhs) {
        (Some(Value::String(s)), Literal::String(needle)) => s.contains(needle),
        (Some(Value::Array(items)), needle) => items.iter().any(|item| match needle {
            Literal::String(s) => item.as_str() == Some(s.as_str()),
            Literal::Number(n) => item
                .as_f64()
                .map(|f| (f - n).abs() < f64::EPSILON)
                .unwrap_or(false),
            Literal::Bool(b) => item.as_bool() == Some(*b),
            Literal::Null => item.is_null(),
        }),
        _ => false,
    }
}
