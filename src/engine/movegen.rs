//! Legal move generation.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves (ignoring pins / check evasion).
//!   2. Filter: play the move on a scratch copy, keep it only if the mover's
//!      king is not attacked afterwards.
//!
//! Pins, double checks and the en-passant discovered check all fall out of
//! step 2 without special cases.

use crate::engine::attacks::{self, KING_OFFSETS, KNIGHT_OFFSETS};
use crate::engine::board::Position;
use crate::engine::types::{CastlingRights, Color, Move, MoveFlags, Piece, PieceType, Square};

// =========================================================================
// Public API
// =========================================================================

/// Generate all legal moves for the side to move.
///
/// Promotions appear once per destination with `promotion: None`; the kind is
/// chosen when the move is played.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(64);
    generate_pseudo_legal(pos, &mut pseudo);

    let us = pos.side_to_move;
    pseudo
        .into_iter()
        .filter(|&mv| {
            let mut scratch = pos.clone();
            scratch.make_move(mv);
            !scratch.is_square_attacked(scratch.king_sq(us), !us)
        })
        .collect()
}

/// Generate all legal moves originating from a specific square.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    legal_moves(pos)
        .into_iter()
        .filter(|m| m.from == from)
        .collect()
}

/// Count leaf nodes `depth` plies deep, expanding every promotion into its
/// four possible pieces.
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0u64;
    for mv in legal_moves(pos) {
        if mv.is_pawn_promotion() {
            for kind in PieceType::PROMOTIONS {
                nodes += perft_child(pos, mv.promoting_to(kind), depth);
            }
        } else {
            nodes += perft_child(pos, mv, depth);
        }
    }
    nodes
}

fn perft_child(pos: &Position, mv: Move, depth: u32) -> u64 {
    if depth == 1 {
        return 1;
    }
    let mut child = pos.clone();
    child.make_move(mv);
    perft(&child, depth - 1)
}

// =========================================================================
// Pseudo-legal generation (internal)
// =========================================================================

fn generate_pseudo_legal(pos: &Position, moves: &mut Vec<Move>) {
    let us = pos.side_to_move;
    for (from, piece) in pos.board.pieces() {
        if piece.color != us {
            continue;
        }
        match piece.kind {
            PieceType::Pawn => generate_pawn_moves(pos, from, piece, moves),
            PieceType::Knight => generate_leaper_moves(pos, from, piece, &KNIGHT_OFFSETS, moves),
            PieceType::King => generate_leaper_moves(pos, from, piece, &KING_OFFSETS, moves),
            PieceType::Bishop | PieceType::Rook | PieceType::Queen => {
                generate_slider_moves(pos, from, piece, moves)
            }
        }
    }
    generate_castling_moves(pos, us, moves);
}

// =========================================================================
// Pawn moves
// =========================================================================

fn generate_pawn_moves(pos: &Position, from: Square, pawn: Piece, moves: &mut Vec<Move>) {
    let us = pawn.color;
    let dir = us.pawn_direction();
    let promotes = |to: Square| to.row() == us.promotion_row();
    let push_flags = |to: Square| {
        if promotes(to) {
            MoveFlags::PROMOTION
        } else {
            MoveFlags::NONE
        }
    };

    // --- Single push ---
    if let Some(to) = from.offset(dir, 0)
        && pos.board.is_empty(to)
    {
        moves.push(Move::with_flags(from, to, pawn, None, push_flags(to)));

        // --- Double push ---
        if from.row() == us.pawn_start_row()
            && let Some(to2) = to.offset(dir, 0)
            && pos.board.is_empty(to2)
        {
            moves.push(Move::with_flags(from, to2, pawn, None, MoveFlags::DOUBLE_PUSH));
        }
    }

    // --- Captures (including promotion captures) ---
    for to in attacks::pawn_attacks(us, from) {
        match pos.board.get(to) {
            Some(target) if target.color != us => {
                moves.push(Move::with_flags(from, to, pawn, Some(target), push_flags(to)));
            }
            // --- En passant ---
            None if pos.en_passant == Some(to) => {
                let victim = Square::at(from.row(), to.col());
                if let Some(target) = pos.board.get(victim)
                    && target == Piece::new(!us, PieceType::Pawn)
                {
                    moves.push(Move::with_flags(
                        from,
                        to,
                        pawn,
                        Some(target),
                        MoveFlags::EN_PASSANT,
                    ));
                }
            }
            _ => {}
        }
    }
}

// =========================================================================
// Knight and king moves (non-castling)
// =========================================================================

fn generate_leaper_moves(
    pos: &Position,
    from: Square,
    piece: Piece,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for to in offsets.iter().filter_map(|&(dr, dc)| from.offset(dr, dc)) {
        match pos.board.get(to) {
            None => moves.push(Move::new(from, to, piece, None)),
            Some(target) if target.color != piece.color => {
                moves.push(Move::new(from, to, piece, Some(target)))
            }
            Some(_) => {}
        }
    }
}

// =========================================================================
// Slider moves (bishop, rook, queen)
// =========================================================================

fn generate_slider_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    for &(dr, dc) in attacks::slider_directions(piece.kind) {
        let mut cur = from;
        while let Some(to) = cur.offset(dr, dc) {
            match pos.board.get(to) {
                None => moves.push(Move::new(from, to, piece, None)),
                Some(target) => {
                    if target.color != piece.color {
                        moves.push(Move::new(from, to, piece, Some(target)));
                    }
                    break;
                }
            }
            cur = to;
        }
    }
}

// =========================================================================
// Castling
// =========================================================================

fn generate_castling_moves(pos: &Position, us: Color, moves: &mut Vec<Move>) {
    let them = !us;
    let row = us.home_row();
    let king_sq = Square::at(row, 4);
    let king = Piece::new(us, PieceType::King);
    let rook = Piece::new(us, PieceType::Rook);

    if pos.board.get(king_sq) != Some(king) {
        return;
    }
    // Can't castle while in check.
    if pos.is_square_attacked(king_sq, them) {
        return;
    }

    let empty = |col: u8| pos.board.is_empty(Square::at(row, col));
    let safe = |col: u8| !pos.is_square_attacked(Square::at(row, col), them);

    // Kingside: king moves e→g, path through f and g must be clear and not attacked.
    if pos.castling_rights.has(CastlingRights::kingside(us))
        && pos.board.get(Square::at(row, 7)) == Some(rook)
        && empty(5)
        && empty(6)
        && safe(5)
        && safe(6)
    {
        moves.push(Move::with_flags(
            king_sq,
            Square::at(row, 6),
            king,
            None,
            MoveFlags::CASTLING,
        ));
    }

    // Queenside: king moves e→c, path through b, c, d must be clear; c and d not attacked.
    if pos.castling_rights.has(CastlingRights::queenside(us))
        && pos.board.get(Square::at(row, 0)) == Some(rook)
        && empty(1)
        && empty(2)
        && empty(3)
        && safe(2)
        && safe(3)
    {
        moves.push(Move::with_flags(
            king_sq,
            Square::at(row, 2),
            king,
            None,
            MoveFlags::CASTLING,
        ));
    }
}

// =========================================================================
// Tests
// =========================================================================
