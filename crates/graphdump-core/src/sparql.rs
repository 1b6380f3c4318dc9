//! SPARQL terms, escaping and result parsing.
//!
//! The same term shape (`{"type": ..., "value": ...}`) is used by delta
//! notifications and by `application/sparql-results+json`, so both share
//! [`Term`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CoreError;
use crate::vocab::{XSD_DATETIME, XSD_INTEGER};

/// Kind of an RDF term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    TypedLiteral,
    Bnode,
}

/// A single RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,

    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,

    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    /// A URI term.
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// A plain literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn is_uri(&self) -> bool {
        self.kind == TermKind::Uri
    }

    /// True if this term is the URI `uri`.
    pub fn is_uri_eq(&self, uri: &str) -> bool {
        self.is_uri() && self.value == uri
    }
}

/// One solution row of a SELECT query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(HashMap<String, Term>);

impl Binding {
    /// Builder used to assemble rows by hand.
    pub fn with(mut self, var: impl Into<String>, term: Term) -> Self {
        self.0.insert(var.into(), term);
        self
    }

    pub fn get(&self, var: &str) -> Option<&Term> {
        self.0.get(var)
    }

    /// Value of `var`, which must be bound to a URI.
    pub fn uri(&self, var: &str) -> Result<&str, CoreError> {
        let term = self
            .get(var)
            .ok_or_else(|| CoreError::MissingBinding(var.to_string()))?;
        if !term.is_uri() {
            return Err(CoreError::InvalidValue {
                var: var.to_string(),
                reason: format!("expected a URI, got {:?}", term.kind),
            });
        }
        Ok(&term.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// `application/sparql-results+json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub head: ResultHead,

    #[serde(default)]
    pub results: ResultSet,
}

impl QueryResults {
    pub fn from_rows(vars: &[&str], rows: Vec<Binding>) -> Self {
        Self {
            head: ResultHead {
                vars: vars.iter().map(|v| v.to_string()).collect(),
            },
            results: ResultSet { bindings: rows },
        }
    }

    pub fn parse(body: &str) -> Result<Self, CoreError> {
        serde_json::from_str(body).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn rows(&self) -> &[Binding] {
        &self.results.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }
}

/// Escape a URI for inclusion in a query.
pub fn escape_uri(uri: &str) -> String {
    format!("<{}>", escape_chars(uri, &['\\', '"', '<', '>']))
}

/// Escape a string literal using long-quote syntax.
pub fn escape_string(value: &str) -> String {
    format!("\"\"\"{}\"\"\"", escape_chars(value, &['\\', '"']))
}

pub fn escape_int(value: i64) -> String {
    format!("\"{}\"^^<{}>", value, XSD_INTEGER)
}

pub fn escape_datetime(value: DateTime<Utc>) -> String {
    format!(
        "\"{}\"^^<{}>",
        value.to_rfc3339_opts(SecondsFormat::Millis, true),
        XSD_DATETIME
    )
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
