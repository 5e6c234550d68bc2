//! Triple patterns for WHERE clauses and CONSTRUCT templates.

use std::fmt::Write as _;

/// A single subject-predicate-object pattern.
///
/// Terms are stored pre-rendered (prefixed names, variables or literals);
/// the graph does not interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    /// Subject term.
    pub subject: String,
    /// Predicate term.
    pub predicate: String,
    /// Object term.
    pub object: String,
}

/// An ordered set of triple patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphPattern {
    triples: Vec<TriplePattern>,
}

impl GraphPattern {
    /// Creates an empty pattern.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a triple. Chainable.
    pub fn add(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> &mut Self {
        self.triples.push(TriplePattern {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        });
        self
    }

    /// The triples in insertion order.
    #[must_use]
    pub fn triples(&self) -> &[TriplePattern] {
        &self.triples
    }

    /// True if no triples were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Renders the pattern, one subject group per line.
    ///
    /// Consecutive triples sharing a subject are folded into a `;` list so
    /// a blank-node subject (`[]`) stays one node instead of becoming a
    /// fresh node per triple.
    #[must_use]
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < self.triples.len() {
            let triple = &self.triples[i];
            let _ = write!(out, "{indent}{} {} {}", triple.subject, triple.predicate, triple.object);
            let mut j = i + 1;
            while j < self.triples.len() && self.triples[j].subject == triple.subject {
                let next = &self.triples[j];
                let _ = write!(out, " ;\n{indent}\t{} {}", next.predicate, next.object);
                j += 1;
            }
            out.push_str(" .\n");
            i = j;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_folds_shared_subjects() {
        let mut graph = GraphPattern::new();
        graph
            .add("?datum", "mo:metric", "mo:ResponseTime")
            .add("?datum", "mo:value", "?input")
            .add("?target", "mo:id", "\"vm1\"");

        let text = graph.render("");
        assert_eq!(
            text,
            "?datum mo:metric mo:ResponseTime ;\n\tmo:value ?input .\n?target mo:id \"vm1\" .\n"
        );
    }

    #[test]
    fn render_keeps_blank_node_as_one_group() {
        let mut graph = GraphPattern::new();
        graph
            .add("[]", "mo:metric", "mo:AvgResponseTime")
            .add("[]", "mo:value", "?output");

        let text = graph.render("  ");
        assert_eq!(text.matches("[]").count(), 1);
        assert!(text.contains(';'));
    }

    #[test]
    fn empty_pattern_renders_empty() {
        assert_eq!(GraphPattern::new().render("  "), "");
        assert!(GraphPattern::new().is_empty());
    }
}
