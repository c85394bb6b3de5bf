//! Search query tokenization.

use super::error::InvoiceError;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_LEN: usize = 100;

/// A parsed free-text invoice search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    /// Lowercased `LIKE` pattern with wildcards escaped, wrapped in `%`.
    pub pattern: String,
    /// `(first, last)` when the query is exactly two words, lowercased.
    pub name_pair: Option<(String, String)>,
}

impl SearchTerms {
    /// Parses a raw query string.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Validation` if the query is blank or too long.
    pub fn parse(raw: &str) -> Result<Self, InvoiceError> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(InvoiceError::validation("search query must not be empty"));
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(InvoiceError::validation(format!(
                "search query must be at most {MAX_QUERY_LEN} characters"
            )));
        }

        let lowered = query.to_lowercase();
        let pattern = format!("%{}%", escape_like(&lowered));

        let words: Vec<&str> = lowered.split_whitespace().collect();
        let name_pair = match words[..] {
            [first, last] => Some((first.to_string(), last.to_string())),
            _ => None,
        };

        Ok(Self { pattern, name_pair })
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
