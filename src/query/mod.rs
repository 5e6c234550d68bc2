//! Continuous-query AST and text rendering.
//!
//! A [`ContinuousQuery`] is the logical form the compiler emits: a head
//! (CONSTRUCT template or SELECT projection), a windowed stream source, a
//! static knowledge-base source, and a nested [`SelectBody`]. Rendering is
//! the only place query syntax lives; everything upstream works on the AST.

mod body;
mod functions;
mod graph;
mod variables;

pub use body::{Selection, SelectBody};
pub use functions::{signature, AggregateSignature, INPUT_VARIABLE};
pub use graph::{GraphPattern, TriplePattern};
pub use variables::{inner_variable, QueryVariable};

use std::fmt::Write as _;

use uuid::Uuid;

use crate::error::QueryBuildError;
use crate::vocab;

/// Head of a continuous query.
#[derive(Debug, Clone, PartialEq)]
enum QueryHead {
    /// CONSTRUCT with a triple template.
    Construct(GraphPattern),
    /// Plain SELECT projection.
    Select(Vec<QueryVariable>),
}

/// Windowed stream source.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StreamClause {
    uri: String,
    range_secs: u32,
    step_secs: u32,
}

/// A continuous query over a windowed stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousQuery {
    name: String,
    prefixes: Vec<(String, String)>,
    head: Option<QueryHead>,
    stream: Option<StreamClause>,
    static_sources: Vec<String>,
    body: Option<SelectBody>,
}

impl ContinuousQuery {
    /// Creates a query with the standard prefix set bound.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut query = Self {
            name: name.into(),
            prefixes: Vec::new(),
            head: None,
            stream: None,
            static_sources: Vec::new(),
            body: None,
        };
        query
            .prefix("xsd", vocab::XSD_URI)
            .prefix("rdf", vocab::RDF_URI)
            .prefix("rdfs", vocab::RDFS_URI)
            .prefix(vocab::PREFIX, vocab::URI)
            .prefix(vocab::FUNCTIONS_PREFIX, vocab::FUNCTIONS_URI);
        query
    }

    /// The query's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds a namespace prefix. Chainable.
    pub fn prefix(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> &mut Self {
        self.prefixes.push((prefix.into(), uri.into()));
        self
    }

    /// Sets a CONSTRUCT head. Chainable.
    pub fn construct(&mut self, template: GraphPattern) -> &mut Self {
        self.head = Some(QueryHead::Construct(template));
        self
    }

    /// Sets a SELECT head. Chainable.
    pub fn select(&mut self, vars: Vec<QueryVariable>) -> &mut Self {
        self.head = Some(QueryHead::Select(vars));
        self
    }

    /// Sets the windowed stream source. Chainable.
    pub fn from_stream(&mut self, uri: impl Into<String>, range_secs: u32, step_secs: u32) -> &mut Self {
        self.stream = Some(StreamClause {
            uri: uri.into(),
            range_secs,
            step_secs,
        });
        self
    }

    /// Adds a static FROM source. Chainable.
    pub fn from(&mut self, url: impl Into<String>) -> &mut Self {
        self.static_sources.push(url.into());
        self
    }

    /// Sets the WHERE body. Chainable.
    pub fn body(&mut self, body: SelectBody) -> &mut Self {
        self.body = Some(body);
        self
    }

    /// Renders the full query text.
    ///
    /// Fails if the query is structurally incomplete; an incomplete query
    /// is a compiler bug surfacing, not a user error.
    pub fn render(&self) -> Result<String, QueryBuildError> {
        let head = self.head.as_ref().ok_or_else(|| malformed(&self.name, "no head"))?;
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| malformed(&self.name, "no stream source"))?;
        let body = self.body.as_ref().ok_or_else(|| malformed(&self.name, "no body"))?;
        if body.is_empty() {
            return Err(malformed(&self.name, "empty body projection"));
        }

        let mut out = String::new();
        let _ = writeln!(out, "REGISTER QUERY {} AS", self.name);
        for (prefix, uri) in &self.prefixes {
            let _ = writeln!(out, "PREFIX {prefix}: <{uri}>");
        }
        match head {
            QueryHead::Construct(template) => {
                let _ = writeln!(out, "CONSTRUCT {{");
                out.push_str(&template.render("\t"));
                let _ = writeln!(out, "}}");
            }
            QueryHead::Select(vars) => {
                let projection: Vec<String> = vars.iter().map(ToString::to_string).collect();
                let _ = writeln!(out, "SELECT {}", projection.join(" "));
            }
        }
        let _ = writeln!(
            out,
            "FROM STREAM <{}> [RANGE {}s STEP {}s]",
            stream.uri, stream.range_secs, stream.step_secs
        );
        for source in &self.static_sources {
            let _ = writeln!(out, "FROM <{source}>");
        }
        let _ = writeln!(out, "WHERE {{");
        out.push_str(&body.render("\t"));
        let _ = writeln!(out, "}}");
        Ok(out)
    }
}

fn malformed(name: &str, reason: &str) -> QueryBuildError {
    QueryBuildError::MalformedQuery {
        reason: format!("query {name}: {reason}"),
    }
}

/// Escapes a rule id into a valid query name.
///
/// Keeps ASCII alphanumerics, drops everything else, and guards against an
/// empty or digit-leading result.
#[must_use]
pub fn escape_name(raw: &str) -> String {
    let escaped: String = raw.chars().filter(char::is_ascii_alphanumeric).collect();
    match escaped.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => escaped,
        _ => format!("q{escaped}"),
    }
}

/// Generates a random query name for collision retries.
#[must_use]
pub fn random_name() -> String {
    format!("q{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_name_keeps_alphanumerics_only() {
        assert_eq!(escape_name("R1"), "R1");
        assert_eq!(escape_name("avg-response_time"), "avgresponsetime");
        assert_eq!(escape_name("1rule"), "q1rule");
        assert_eq!(escape_name("---"), "q");
    }

    #[test]
    fn random_names_are_distinct_and_valid() {
        let a = random_name();
        let b = random_name();
        assert_ne!(a, b);
        assert_eq!(a, escape_name(&a));
    }

    #[test]
    fn render_rejects_incomplete_queries() {
        let query = ContinuousQuery::new("q1");
        assert!(matches!(
            query.render(),
            Err(QueryBuildError::MalformedQuery { .. })
        ));
    }

    #[test]
    fn render_emits_register_prefixes_window_and_body() {
        let mut pattern = GraphPattern::new();
        pattern.add("?datum", vocab::VALUE, "?input");

        let mut body = SelectBody::new();
        body.select(QueryVariable::Input).where_graph(pattern);

        let mut query = ContinuousQuery::new("q1");
        query
            .select(vec![QueryVariable::Input])
            .from_stream("http://vigil.dev/streams/ResponseTime", 60, 10)
            .from("http://kb:3030/data?graph=default")
            .body(body);

        let text = query.render().unwrap();
        assert!(text.starts_with("REGISTER QUERY q1 AS\n"));
        assert!(text.contains(&format!("PREFIX mo: <{}>", vocab::URI)));
        assert!(text.contains(&format!("PREFIX f: <{}>", vocab::FUNCTIONS_URI)));
        assert!(text.contains(
            "FROM STREAM <http://vigil.dev/streams/ResponseTime> [RANGE 60s STEP 10s]"
        ));
        assert!(text.contains("FROM <http://kb:3030/data?graph=default>"));
        assert!(text.contains("SELECT ?input"));
        assert!(text.contains("?datum mo:value ?input ."));
    }
}
