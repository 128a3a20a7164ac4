//! Canonical position keys for repetition counting.
//!
//! Two positions repeat only if the board, the side to move, the castling
//! rights and the en-passant target all match. Each of those gets random
//! 64-bit keys and a position's key is the XOR of the keys that apply.

use std::sync::OnceLock;

use crate::engine::board::Position;
use crate::engine::types::{Color, Piece, Square};

/// Pre-computed random keys, generated once from a fixed seed so keys are
/// reproducible across runs.
struct Keys {
    /// piece\[color\]\[kind\]\[square index\].
    piece: [[[u64; Square::NUM]; 6]; 2],
    black_to_move: u64,
    /// One key per castling-rights bitmask (0..15).
    castling: [u64; 16],
    /// One key per en-passant file.
    en_passant: [u64; 8],
}

fn keys() -> &'static Keys {
    static KEYS: OnceLock<Keys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = Xorshift64::new(0x3243_F6A8_885A_308D);
        let mut piece = [[[0u64; Square::NUM]; 6]; 2];
        for key in piece.iter_mut().flatten().flatten() {
            *key = rng.next_u64();
        }
        let black_to_move = rng.next_u64();
        let castling = std::array::from_fn(|_| rng.next_u64());
        let en_passant = std::array::from_fn(|_| rng.next_u64());
        Keys {
            piece,
            black_to_move,
            castling,
            en_passant,
        }
    })
}

fn piece_key(piece: Piece, sq: Square) -> u64 {
    keys().piece[piece.color.index()][piece.kind.index()][sq.index()]
}

/// Key identifying `pos` for repetition purposes. Move counters are ignored.
pub fn position_key(pos: &Position) -> u64 {
    let k = keys();
    let mut hash = pos
        .board
        .pieces()
        .fold(0u64, |acc, (sq, piece)| acc ^ piece_key(piece, sq));
    if pos.side_to_move == Color::Black {
        hash ^= k.black_to_move;
    }
    hash ^= k.castling[pos.castling_rights.0 as usize & 0xF];
    if let Some(ep) = pos.en_passant {
        hash ^= k.en_passant[ep.col() as usize];
    }
    hash
}

/// xorshift64; never yields zero from a nonzero seed.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Xorshift64 {
            state: seed.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}
