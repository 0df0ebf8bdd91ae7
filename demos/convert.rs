//! Converts a small automaton and prints the resulting expression.
//!
//! Run with: cargo run --example convert

use fa2regex::{fa_to_regex, CharSet, FaSource, Options};

const MAX: u32 = 0xFFFF;

/// Accepts identifiers: an ASCII letter followed by letters or digits.
struct Identifiers;

impl FaSource for Identifiers {
    type State = u8;

    fn initial(&self) -> u8 {
        0
    }

    fn is_final(&self, state: &u8) -> bool {
        *state == 1
    }

    fn out_edges(&self, state: &u8) -> Vec<(u8, CharSet)> {
        let letters = CharSet::from_ranges(
            MAX,
            [
                fa2regex::CharRange::new('A' as u32, 'Z' as u32),
                fa2regex::CharRange::new('a' as u32, 'z' as u32),
            ],
        )
        .unwrap();
        let digits =
            CharSet::from_ranges(MAX, [fa2regex::CharRange::new('0' as u32, '9' as u32)]).unwrap();
        match state {
            0 => vec![(1, letters)],
            1 => vec![(1, letters.union(&digits).unwrap())],
            _ => Vec::new(),
        }
    }
}

fn main() {
    let expr = fa_to_regex(&Identifiers, &Options::default()).expect("conversion failed");
    println!("identifier automaton converts to: {}", expr);
}
