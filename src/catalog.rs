//! Token catalog collaborator
//!
//! Loads the token list offered for donation. Market data (prices, volume)
//! is out of scope here; the catalog carries only what the pipeline needs:
//! identity, mint address and decimals.

use anyhow::Context;

use crate::types::Token;

/// Catalog of donatable tokens, immutable once loaded.
#[derive(Debug, Clone)]
pub struct TokenCatalog {
    tokens: Vec<Token>,
}

impl TokenCatalog {
    /// Load the catalog from a JSON file (an array of token records).
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token catalog: {}", path))?;
        let tokens: Vec<Token> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token catalog: {}", path))?;
        Ok(Self { tokens })
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Look a token up by catalog id or ticker symbol (case-insensitive).
    pub fn find(&self, query: &str) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|t| t.id == query || t.symbol.eq_ignore_ascii_case(query))
    }

    /// Tokens that can actually be transferred on this network.
    pub fn transferable(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_transferable())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
