use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A reward symbol shown on the reels.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The set of symbols a win is drawn from and a loss is displayed with.
///
/// A set always holds at least two distinct, non-empty symbols. With a
/// single symbol every three-reel display would be three-of-a-kind, so a
/// losing spin could never be shown as a loss.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
}

impl SymbolSet {
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, TypeError> {
        if symbols.len() < 2 {
            return Err(TypeError::InvalidSymbolSet(format!(
                "need at least 2 symbols, got {}",
                symbols.len()
            )));
        }
        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if symbol.as_str().is_empty() {
                return Err(TypeError::InvalidSymbolSet("empty symbol".into()));
            }
            if !seen.insert(symbol) {
                return Err(TypeError::InvalidSymbolSet(format!(
                    "duplicate symbol {symbol}"
                )));
            }
        }
        Ok(Self { symbols })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always `false` for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol at `index`, wrapping around the set.
    pub fn get(&self, index: usize) -> &Symbol {
        &self.symbols[index % self.symbols.len()]
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self {
            symbols: ["💎", "💰", "👑", "🍀", "⭐"]
                .into_iter()
                .map(Symbol::from)
                .collect(),
        }
    }
}

impl TryFrom<Vec<Symbol>> for SymbolSet {
    type Error = TypeError;

    fn try_from(symbols: Vec<Symbol>) -> Result<Self, Self::Error> {
        Self::new(symbols)
    }
}

impl From<SymbolSet> for Vec<Symbol> {
    fn from(set: SymbolSet) -> Self {
        set.symbols
    }
}
