//! Movement offsets shared by move generation and attack detection.
//!
//! Offsets are `(d_row, d_col)` pairs on the row/column grid. Leapers use them
//! once; sliders repeat a direction until they hit the edge or a piece.

use crate::engine::board::Board;
use crate::engine::types::{Color, Piece, PieceType, Square};

/// The eight knight jumps.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// One step in every direction.
pub const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Ray directions for a sliding piece kind; empty for leapers and pawns.
pub fn slider_directions(kind: PieceType) -> &'static [(i8, i8)] {
    match kind {
        PieceType::Bishop => &BISHOP_DIRECTIONS,
        PieceType::Rook => &ROOK_DIRECTIONS,
        PieceType::Queen => &KING_OFFSETS,
        _ => &[],
    }
}

/// Squares a pawn of `color` standing on `sq` attacks.
pub fn pawn_attacks(color: Color, sq: Square) -> impl Iterator<Item = Square> {
    let dir = color.pawn_direction();
    [-1i8, 1]
        .into_iter()
        .filter_map(move |d_col| sq.offset(dir, d_col))
}

/// Walk from `from` along `dir` and return the first occupied square and its
/// occupant, if any.
pub fn first_blocker(board: &Board, from: Square, dir: (i8, i8)) -> Option<(Square, Piece)> {
    let mut cur = from;
    while let Some(next) = cur.offset(dir.0, dir.1) {
        if let Some(piece) = board.get(next) {
            return Some((next, piece));
        }
        cur = next;
    }
    None
}

/// Is `sq` attacked by any piece of colour `by`?
///
/// Works backwards from the target: a piece of kind K attacks `sq` iff a K
/// standing on `sq` would reach it with K's movement.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    // A pawn of `by` attacks `sq` from the squares a pawn of the other colour
    // on `sq` would attack.
    let pawn = Piece::new(by, PieceType::Pawn);
    if pawn_attacks(!by, sq).any(|from| board.get(from) == Some(pawn)) {
        return true;
    }

    let knight = Piece::new(by, PieceType::Knight);
    if KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(dr, dc)| sq.offset(dr, dc))
        .any(|from| board.get(from) == Some(knight))
    {
        return true;
    }

    let king = Piece::new(by, PieceType::King);
    if KING_OFFSETS
        .iter()
        .filter_map(|&(dr, dc)| sq.offset(dr, dc))
        .any(|from| board.get(from) == Some(king))
    {
        return true;
    }

    // Rook / Queen (straight lines).
    for &dir in &ROOK_DIRECTIONS {
        if let Some((_, p)) = first_blocker(board, sq, dir)
            && p.color == by
            && matches!(p.kind, PieceType::Rook | PieceType::Queen)
        {
            return true;
        }
    }

    // Bishop / Queen (diagonals).
    for &dir in &BISHOP_DIRECTIONS {
        if let Some((_, p)) = first_blocker(board, sq, dir)
            && p.color == by
            && matches!(p.kind, PieceType::Bishop | PieceType::Queen)
        {
            return true;
        }
    }

    false
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board_with(pieces: &[(&str, Color, PieceType)]) -> Board {
        let mut board = Board::empty();
        for &(name, color, kind) in pieces {
            board.set(sq(name), Some(Piece::new(color, kind)));
        }
        board
    }

    #[test]
    fn white_pawn_attacks_forward_diagonals() {
        let targets: Vec<_> = pawn_attacks(Color::White, sq("e4")).collect();
        assert_eq!(targets, vec![sq("d5"), sq("f5")]);
    }

    #[test]
    fn edge_pawn_attacks_one_square() {
        let targets: Vec<_> = pawn_attacks(Color::Black, sq("a7")).collect();
        assert_eq!(targets, vec![sq("b6")]);
    }

    #[test]
    fn pawn_attack_detection() {
        let board = board_with(&[("d5", Color::Black, PieceType::Pawn)]);
        assert!(is_square_attacked(&board, sq("e4"), Color::Black));
        assert!(is_square_attacked(&board, sq("c4"), Color::Black));
        assert!(!is_square_attacked(&board, sq("d4"), Color::Black));
        assert!(!is_square_attacked(&board, sq("e6"), Color::Black));
    }

    #[test]
    fn knight_attack_detection() {
        let board = board_with(&[("g1", Color::White, PieceType::Knight)]);
        assert!(is_square_attacked(&board, sq("f3"), Color::White));
        assert!(is_square_attacked(&board, sq("e2"), Color::White));
        assert!(!is_square_attacked(&board, sq("g3"), Color::White));
        assert!(!is_square_attacked(&board, sq("f3"), Color::Black));
    }

    #[test]
    fn slider_attack_stops_at_blocker() {
        let board = board_with(&[
            ("a1", Color::White, PieceType::Rook),
            ("a4", Color::Black, PieceType::Pawn),
            ("c1", Color::White, PieceType::Bishop),
        ]);
        assert!(is_square_attacked(&board, sq("a4"), Color::White));
        assert!(!is_square_attacked(&board, sq("a5"), Color::White));
        assert!(is_square_attacked(&board, sq("b1"), Color::White));
        assert!(!is_square_attacked(&board, sq("d1"), Color::White));
        assert!(is_square_attacked(&board, sq("h6"), Color::White));
    }

    #[test]
    fn queen_attacks_both_axes() {
        let board = board_with(&[("d4", Color::Black, PieceType::Queen)]);
        assert!(is_square_attacked(&board, sq("d8"), Color::Black));
        assert!(is_square_attacked(&board, sq("h8"), Color::Black));
        assert!(is_square_attacked(&board, sq("a1"), Color::Black));
        assert!(!is_square_attacked(&board, sq("e6"), Color::Black));
    }

    #[test]
    fn first_blocker_reports_piece() {
        let board = board_with(&[("e7", Color::Black, PieceType::King)]);
        let hit = first_blocker(&board, sq("e1"), (-1, 0));
        assert_eq!(
            hit,
            Some((sq("e7"), Piece::new(Color::Black, PieceType::King)))
        );
        assert_eq!(first_blocker(&board, sq("e1"), (0, 1)), None);
    }
}
