//! Autocomplete seed derivation.
//!
//! Runs the document's text fields through the index analyzer and keeps the tokens worth
//! completing on. The district is always added so district names complete even when the
//! analyzer splits them.

use tracing::debug;

use house_search_repository::{AnalyzedToken, SearchIndexError, SearchIndexProvider};
use house_search_shared::{HouseDocument, HouseSuggest};

/// Analyzer token types that denote numbers.
pub const NUMERIC_TOKEN_TYPES: [&str; 3] = ["<NUM>", "ARABIC", "TYPE_CNUM"];

/// Shortest token kept, in characters.
pub const MIN_SUGGEST_CHARS: usize = 2;

/// Derive the completion inputs of a document.
pub async fn derive_suggestions(
    provider: &dyn SearchIndexProvider,
    document: &HouseDocument,
) -> Result<Vec<HouseSuggest>, SearchIndexError> {
    let sources = document.suggest_sources();
    let tokens = if sources.is_empty() {
        Vec::new()
    } else {
        provider.analyze(&sources).await?
    };
    debug!(
        house_id = document.house_id,
        token_count = tokens.len(),
        "Analyzed suggest sources"
    );

    Ok(filter_tokens(tokens, &document.district))
}

/// Keep non-numeric tokens of at least two characters, then append the district.
pub fn filter_tokens(tokens: Vec<AnalyzedToken>, district: &str) -> Vec<HouseSuggest> {
    let mut suggestions: Vec<HouseSuggest> = tokens
        .into_iter()
        .filter(|token| !NUMERIC_TOKEN_TYPES.contains(&token.token_type.as_str()))
        .filter(|token| token.token.chars().count() >= MIN_SUGGEST_CHARS)
        .map(|token| HouseSuggest::new(token.token))
        .collect();

    if !district.is_empty() {
        suggestions.push(HouseSuggest::new(district));
    }
    suggestions
}
