//! SELECT bodies: projections, nesting, grouping and having.

use std::fmt::Write as _;

use crate::query::graph::GraphPattern;
use crate::query::variables::QueryVariable;

/// One element of a SELECT projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A plain variable, rendered as `?var`.
    Variable(QueryVariable),
    /// A computed binding, rendered as `(FUNC(args) AS ?alias)`.
    ///
    /// Covers both aggregate calls (`MAX`, `AVG`, …) and engine functions
    /// in the `f:` namespace.
    Computed {
        /// Variable the call is bound to.
        alias: QueryVariable,
        /// Function name as it appears in query text.
        function: String,
        /// Pre-rendered argument terms, in call order.
        arguments: Vec<String>,
    },
}

impl Selection {
    fn render(&self) -> String {
        match self {
            Self::Variable(var) => var.to_string(),
            Self::Computed {
                alias,
                function,
                arguments,
            } => format!("({}({}) AS {alias})", function, arguments.join(", ")),
        }
    }
}

/// Contents of a body's WHERE clause.
#[derive(Debug, Clone, PartialEq)]
enum WhereClause {
    Graph(GraphPattern),
    Body(Box<SelectBody>),
}

/// A SELECT body, possibly nesting another body.
///
/// The compiler builds two of these per main query: the outer aggregated
/// body and the inner per-event body wrapping the graph pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectBody {
    selections: Vec<Selection>,
    where_clause: Option<WhereClause>,
    group_by: Option<QueryVariable>,
    having: Option<String>,
}

impl SelectBody {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects a plain variable. Chainable.
    pub fn select(&mut self, var: QueryVariable) -> &mut Self {
        self.selections.push(Selection::Variable(var));
        self
    }

    /// Projects a computed binding. Chainable.
    pub fn select_computed(
        &mut self,
        alias: QueryVariable,
        function: impl Into<String>,
        arguments: Vec<String>,
    ) -> &mut Self {
        self.selections.push(Selection::Computed {
            alias,
            function: function.into(),
            arguments,
        });
        self
    }

    /// Sets the WHERE clause to a graph pattern.
    pub fn where_graph(&mut self, graph: GraphPattern) -> &mut Self {
        self.where_clause = Some(WhereClause::Graph(graph));
        self
    }

    /// Sets the WHERE clause to a nested body.
    pub fn where_body(&mut self, body: SelectBody) -> &mut Self {
        self.where_clause = Some(WhereClause::Body(Box::new(body)));
        self
    }

    /// Sets the GROUP BY variable. `None` leaves the body ungrouped.
    pub fn group_by(&mut self, var: Option<QueryVariable>) -> &mut Self {
        self.group_by = var;
        self
    }

    /// Sets the HAVING condition. `None` leaves the body unconditioned.
    pub fn having(&mut self, condition: Option<String>) -> &mut Self {
        self.having = condition;
        self
    }

    /// True if nothing is projected yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Renders the body at the given indentation.
    #[must_use]
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        let projection: Vec<String> = self.selections.iter().map(Selection::render).collect();
        let _ = writeln!(out, "{indent}SELECT {}", projection.join(" "));
        let _ = writeln!(out, "{indent}WHERE {{");
        let inner_indent = format!("{indent}\t");
        match &self.where_clause {
            Some(WhereClause::Graph(graph)) => out.push_str(&graph.render(&inner_indent)),
            Some(WhereClause::Body(body)) => out.push_str(&body.render(&inner_indent)),
            None => {}
        }
        let _ = writeln!(out, "{indent}}}");
        if let Some(group) = &self.group_by {
            let _ = writeln!(out, "{indent}GROUP BY {group}");
        }
        if let Some(condition) = &self.having {
            let _ = writeln!(out, "{indent}HAVING ({condition})");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_projection_where_group_by_and_having() {
        let mut graph = GraphPattern::new();
        graph.add("?datum", "mo:value", "?input");

        let mut inner = SelectBody::new();
        inner.select(QueryVariable::Input).where_graph(graph);

        let mut outer = SelectBody::new();
        outer
            .select(QueryVariable::Target)
            .select_computed(
                QueryVariable::Output,
                "AVG",
                vec![QueryVariable::Input.to_string()],
            )
            .where_body(inner)
            .group_by(Some(QueryVariable::Grouping("CloudProvider".to_string())))
            .having(Some("?output > 200".to_string()));

        let text = outer.render("");
        assert!(text.starts_with("SELECT ?target (AVG(?input) AS ?output)\n"));
        assert!(text.contains("\tSELECT ?input\n"));
        assert!(text.contains("\t\t?datum mo:value ?input .\n"));
        assert!(text.contains("GROUP BY ?CloudProvider\n"));
        assert!(text.contains("HAVING (?output > 200)\n"));
    }

    #[test]
    fn ungrouped_body_omits_group_by_and_having() {
        let mut body = SelectBody::new();
        body.select(QueryVariable::Target);
        let text = body.render("");
        assert!(!text.contains("GROUP BY"));
        assert!(!text.contains("HAVING"));
    }
}
