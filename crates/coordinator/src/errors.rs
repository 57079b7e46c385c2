use thiserror::Error;

use page_gateway::GatewayError;
use practice_cache::CacheError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Resolution failed even after the fallback scrape.
    #[error("practice not found: {query}")]
    NotFound {
        query: String,
        suggestions: Vec<String>,
    },

    /// The full-list scrape failed; the cache was left as it was.
    #[error("practice scrape failed: {0}")]
    ScrapeFailed(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl CoordinatorError {
    pub fn not_found(query: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::NotFound {
            query: query.into(),
            suggestions,
        }
    }

    /// Terse one-line rendering for end users.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { query, suggestions } if suggestions.is_empty() => {
                format!("{query} not found")
            }
            Self::NotFound { query, suggestions } => {
                format!("{query} not found, did you mean: {}", suggestions.join(", "))
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_lists_suggestions() {
        let err = CoordinatorError::not_found("oak", vec!["Oak Clinic".into(), "Oakwood".into()]);
        assert_eq!(err.user_message(), "oak not found, did you mean: Oak Clinic, Oakwood");
        let err = CoordinatorError::not_found("zz", vec![]);
        assert_eq!(err.user_message(), "zz not found");
    }
}
