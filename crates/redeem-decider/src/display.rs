//! Reel display for a decision.
//!
//! A win shows three copies of the winning symbol. A loss shows three
//! independent draws, redrawn while all three match, so a loss never looks
//! like a win. Two matching reels on a loss are allowed.

use redeem_types::{Symbol, SymbolSet};

use crate::decider::Decision;
use crate::random::RandomSource;

/// The three symbols shown to the player.
pub type Reels = [Symbol; 3];

pub fn display_symbols(decision: &Decision, symbols: &SymbolSet, rng: &dyn RandomSource) -> Reels {
    match decision {
        Decision::Win { symbol } => [symbol.clone(), symbol.clone(), symbol.clone()],
        Decision::Lose => losing_reels(symbols, rng),
    }
}

fn losing_reels(symbols: &SymbolSet, rng: &dyn RandomSource) -> Reels {
    // SymbolSet guarantees two distinct symbols, so this terminates.
    loop {
        let reels = [draw(symbols, rng), draw(symbols, rng), draw(symbols, rng)];
        if !(reels[0] == reels[1] && reels[1] == reels[2]) {
            return reels;
        }
    }
}

fn draw(symbols: &SymbolSet, rng: &dyn RandomSource) -> Symbol {
    symbols.get(rng.index(symbols.len())).clone()
}
