//! Logical-coin-to-provider-symbol resolution.
//!
//! Each feed provider speaks its own pair notation on the wire; the rest of
//! the system only knows logical coin ids. A [`SymbolTable`] is the total,
//! case-normalized mapping for one provider. A miss means the coin has no
//! live feed there — callers must not substitute a default pair; the
//! dashboard degrades to snapshot polling instead.

use ahash::AHashMap;

/// One provider's mapping from logical coin ids to wire symbols.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: AHashMap<String, String>,
}

impl SymbolTable {
    /// Build a table from `(logical_id, provider_symbol)` pairs. Logical
    /// ids are lowercased on the way in.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let map = pairs
            .iter()
            .map(|(id, symbol)| (id.to_ascii_lowercase(), (*symbol).to_string()))
            .collect();
        Self { map }
    }

    /// Resolve a logical coin id. Pure lookup — no fallback, no side
    /// effects.
    pub fn resolve(&self, coin_id: &str) -> Option<&str> {
        self.map.get(coin_id.to_ascii_lowercase().as_str()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
