use crate::domain::ports::QuerySource;
use std::collections::HashMap;

/// Query parameters of the current navigation target, e.g. `price=49`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationQuery {
    params: HashMap<String, String>,
}

impl NavigationQuery {
    /// Parses a URL query string. A leading `?` is ignored; later keys win.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { params }
    }
}

impl QuerySource for NavigationQuery {
    fn query(&self, key: &str) -> Option<String> {
        self.params.get(key).cloned()
    }
}
