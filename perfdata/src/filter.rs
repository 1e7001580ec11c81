//! Substring pre-filtering of benchmark logs.
//!
//! Logs are usually dominated by unrelated output. Before parsing, only the
//! lines containing one of a filter group's strings are kept.

/// Keeps lines containing any of its patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFilter {
    patterns: Vec<String>,
}

impl LineFilter {
    /// A filter with no patterns keeps every line.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, line: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| line.contains(p.as_str()))
    }

    /// The lines of `text` this filter keeps, in order.
    pub fn apply<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        text.lines().filter(move |line| self.matches(line))
    }
}
