use crate::domain::model::ResponseFormat;

/// Fields left out of search results unless the caller picks fields itself.
pub const DEFAULT_EXCLUDES: [&str; 1] = ["embedding*"];

/// Query-string parameters for collection and search requests.
///
/// The query text is passed through untouched; the API interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: Option<String>,
    pub format: ResponseFormat,
    pub size: u32,
    pub sort: Option<String>,
    pub include_fields: Vec<String>,
    pub exclude_fields: Vec<String>,
}

impl SearchParams {
    pub fn new(format: ResponseFormat, size: u32) -> Self {
        Self {
            query: None,
            format,
            size,
            sort: None,
            include_fields: Vec::new(),
            exclude_fields: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Stable ordering, needed so page N+1 continues where page N ended.
    pub fn sorted_by_id(mut self) -> Self {
        self.sort = Some("id:asc".to_string());
        self
    }

    /// Restricts `_source` to `fields` when any are given, otherwise excludes
    /// `excludes`, falling back to [`DEFAULT_EXCLUDES`].
    pub fn with_source_filter(mut self, fields: &[String], excludes: &[String]) -> Self {
        if !fields.is_empty() {
            self.include_fields = fields.to_vec();
            self.exclude_fields.clear();
        } else if !excludes.is_empty() {
            self.include_fields.clear();
            self.exclude_fields = excludes.to_vec();
        } else {
            self.include_fields.clear();
            self.exclude_fields = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    /// Same request in another response format.
    pub fn with_format(&self, format: ResponseFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("as".to_string(), self.format.as_str().to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(query) = &self.query {
            pairs.push(("query".to_string(), query.clone()));
        }
        for field in &self.include_fields {
            pairs.push(("_source_includes".to_string(), field.clone()));
        }
        for field in &self.exclude_fields {
            pairs.push(("_source_excludes".to_string(), field.clone()));
        }
        pairs
    }
}
