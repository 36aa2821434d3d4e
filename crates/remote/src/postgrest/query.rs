use std::fmt::Display;

/// Builder for one table read: column selection, equality filters, ordering,
/// and an optional row limit, rendered as PostgREST query parameters.
#[derive(Debug, Clone)]
pub(crate) struct Query {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl Query {
    pub(crate) fn table(table: &'static str) -> Self {
        Self {
            table,
            params: vec![("select".into(), "*".into())],
        }
    }

    pub(crate) fn select(mut self, columns: &str) -> Self {
        self.params[0].1 = columns.to_owned();
        self
    }

    pub(crate) fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    pub(crate) fn order_asc(mut self, column: &str) -> Self {
        self.params.push(("order".into(), format!("{column}.asc")));
        self
    }

    pub(crate) fn order_desc(mut self, column: &str) -> Self {
        self.params.push(("order".into(), format!("{column}.desc")));
        self
    }

    pub(crate) fn limit(mut self, n: u32) -> Self {
        self.params.push(("limit".into(), n.to_string()));
        self
    }

    pub(crate) fn name(&self) -> &'static str {
        self.table
    }

    pub(crate) fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Filter params only, for write requests that target matching rows.
    pub(crate) fn filter_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(key, _)| key != "select" && key != "order" && key != "limit")
            .cloned()
            .collect()
    }
}
