//! Mailbox board and the full position built on top of it.
//!
//! `Board` is an 8×8 grid of optional pieces and nothing else. `Position` adds
//! side to move, castling rights, the en-passant target and move counters, and
//! owns the low-level make/undo used both by legality filtering and by `Game`.

use std::fmt;

use crate::engine::attacks;
use crate::engine::builder::PositionBuilder;
use crate::engine::types::{CastlingRights, Color, Move, Piece, PieceType, Square};

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// An 8×8 grid of cells addressed by `Square` (row 0 = rank 8).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// A board with no pieces.
    pub const fn empty() -> Self {
        Board {
            cells: [[None; 8]; 8],
        }
    }

    /// The standard initial arrangement.
    pub fn starting() -> Self {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        let mut board = Board::empty();
        for color in [Color::White, Color::Black] {
            for (col, &kind) in BACK_RANK.iter().enumerate() {
                board.cells[color.home_row() as usize][col] = Some(Piece::new(color, kind));
                board.cells[color.pawn_start_row() as usize][col] =
                    Some(Piece::new(color, PieceType::Pawn));
            }
        }
        board
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.row() as usize][sq.col() as usize]
    }

    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.row() as usize][sq.col() as usize] = piece;
    }

    /// Empty `sq` and return what stood there.
    #[inline]
    pub fn take(&mut self, sq: Square) -> Option<Piece> {
        self.cells[sq.row() as usize][sq.col() as usize].take()
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// Rows of cells, row 0 (rank 8) first.
    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.cells
    }

    /// Every occupied square with its piece, row-major.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|p| (sq, p)))
    }

    /// Squares holding exactly `piece`.
    pub fn find(&self, piece: Piece) -> impl Iterator<Item = Square> + '_ {
        self.pieces()
            .filter(move |&(_, p)| p == piece)
            .map(|(sq, _)| sq)
    }

    /// How many pieces of this colour and kind are on the board.
    pub fn count(&self, color: Color, kind: PieceType) -> usize {
        self.find(Piece::new(color, kind)).count()
    }

    /// Row-major serialization: 64 two-character cells from a8 to h1, `--`
    /// for an empty square and codes like `wK`/`bP` otherwise.
    pub fn signature(&self) -> String {
        let mut s = String::with_capacity(128);
        for sq in Square::all() {
            match self.get(sq) {
                Some(piece) => s.push_str(&piece.code()),
                None => s.push_str("--"),
            }
        }
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board(")?;
        for row in 0..8u8 {
            write!(f, "  {} ", 8 - row)?;
            for col in 0..8u8 {
                let ch = self
                    .get(Square::at(row, col))
                    .map_or('.', |p| p.to_char());
                write!(f, "{ch}")?;
                if col < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "    a b c d e f g h)")
    }
}

// ---------------------------------------------------------------------------
// UndoInfo: saved state for reversing a move
// ---------------------------------------------------------------------------

/// State that must be saved before making a move so it can be restored on
/// undo. Rights and the en-passant target are not derivable from the move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoInfo {
    pub captured: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position: the board plus every right that legality
/// depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub board: Board,

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q).
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule (reset on pawn move or capture).
    pub halfmove_clock: u16,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u16,
}

impl Position {
    /// Empty board, white to move, no rights.
    pub fn empty() -> Self {
        Position {
            board: Board::empty(),
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Position {
            board: Board::starting(),
            castling_rights: CastlingRights::ALL,
            ..Position::empty()
        }
    }

    /// Start a fluent builder for an arbitrary position.
    pub fn builder() -> PositionBuilder {
        PositionBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    /// Find the king square for the given colour.
    pub fn king_sq(&self, color: Color) -> Square {
        match self.board.find(Piece::new(color, PieceType::King)).next() {
            Some(sq) => sq,
            None => panic!("no {color} king on the board:\n{:?}", self.board),
        }
    }

    /// Is `sq` attacked by any piece of colour `by`?
    #[inline]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        attacks::is_square_attacked(&self.board, sq, by)
    }

    /// Is the side-to-move's king currently in check?
    #[inline]
    pub fn is_in_check(&self) -> bool {
        let king = self.king_sq(self.side_to_move);
        self.is_square_attacked(king, !self.side_to_move)
    }

    /// Verify exactly one king per colour. Available in debug and test builds.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_consistent(&self) {
        for color in [Color::White, Color::Black] {
            let kings = self.board.count(color, PieceType::King);
            assert_eq!(kings, 1, "{color} has {kings} kings:\n{:?}", self.board);
        }
    }

    // -----------------------------------------------------------------------
    // Make / Undo move
    // -----------------------------------------------------------------------

    /// Apply a move to the position. Returns `UndoInfo` for reversal.
    ///
    /// The caller is responsible for passing a move generated for this
    /// position. A promotion move without a chosen kind leaves the pawn on
    /// the last rank.
    pub fn make_move(&mut self, mv: Move) -> UndoInfo {
        let us = self.side_to_move;

        let mut undo = UndoInfo {
            captured: None,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        // ---- Handle capture ----
        if let Some(cap_sq) = mv.capture_square() {
            undo.captured = self.board.take(cap_sq);
        }

        // ---- Move the piece ----
        let moving = match self.board.take(mv.from) {
            Some(piece) => piece,
            None => panic!("no piece on {} for move {mv}:\n{:?}", mv.from, self.board),
        };
        let landing = match mv.promotion {
            Some(kind) => Piece::new(moving.color, kind),
            None => moving,
        };
        self.board.set(mv.to, Some(landing));

        // ---- Castling: move the rook ----
        if mv.is_castle() {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            let rook = self.board.take(rook_from);
            self.board.set(rook_to, rook);
        }

        // ---- Update castling rights ----
        self.castling_rights.revoke_touching(mv.from);
        self.castling_rights.revoke_touching(mv.to);

        // ---- En passant target: only right after a double push ----
        self.en_passant = if mv.flags.is_double_push() {
            mv.from.offset(us.pawn_direction(), 0)
        } else {
            None
        };

        // ---- Counters ----
        if moving.kind == PieceType::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = !us;
        undo
    }

    /// Reverse a move previously applied with `make_move`.
    pub fn undo_move(&mut self, mv: Move, undo: &UndoInfo) {
        self.side_to_move = !self.side_to_move;

        // The origin always gets back the piece as it was before moving, so a
        // promoted piece turns back into its pawn.
        self.board.set(mv.to, None);
        self.board.set(mv.from, Some(mv.piece_moved));

        if let Some(cap_sq) = mv.capture_square() {
            self.board.set(cap_sq, undo.captured);
        }

        if mv.is_castle() {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            let rook = self.board.take(rook_to);
            self.board.set(rook_from, rook);
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as text with `viewer`'s pieces at the bottom.
    pub fn board_string(&self, viewer: Color) -> String {
        let mut s = String::with_capacity(200);
        for view_row in 0..8u8 {
            let row = match viewer {
                Color::White => view_row,
                Color::Black => 7 - view_row,
            };
            s.push((b'0' + 8 - row) as char);
            s.push(' ');
            for view_col in 0..8u8 {
                let col = match viewer {
                    Color::White => view_col,
                    Color::Black => 7 - view_col,
                };
                let ch = self
                    .board
                    .get(Square::at(row, col))
                    .map_or('.', |p| p.to_char());
                s.push(ch);
                if view_col < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        match viewer {
            Color::White => s.push_str("  a b c d e f g h"),
            Color::Black => s.push_str("  h g f e d c b a"),
        }
        s
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board_string(Color::White))
    }
}

// ---------------------------------------------------------------------------
// Castling helpers (free functions)
// ---------------------------------------------------------------------------

/// For a king-destination square (after castling), return (rook_from, rook_to).
pub(crate) fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    let row = king_to.row();
    match king_to.col() {
        // Kingside: king e→g, rook h→f.
        6 => (Square::at(row, 7), Square::at(row, 5)),
        // Queenside: king e→c, rook a→d.
        2 => (Square::at(row, 0), Square::at(row, 3)),
        _ => panic!("invalid castling king destination: {king_to}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::MoveFlags;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn piece(color: Color, kind: PieceType) -> Piece {
        Piece::new(color, kind)
    }

    // ===================================================================
    // Starting position
    // ===================================================================

    #[test]
    fn starting_position_rights() {
        let pos = Position::starting();
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.castling_rights, CastlingRights::ALL);
        assert_eq!(pos.en_passant, None);
        assert_eq!(pos.halfmove_clock, 0);
        assert_eq!(pos.fullmove_number, 1);
    }

    #[test]
    fn starting_position_pieces() {
        let pos = Position::starting();
        assert_eq!(pos.board.pieces().count(), 32);
        assert_eq!(pos.piece_at(sq("e1")), Some(piece(Color::White, PieceType::King)));
        assert_eq!(pos.piece_at(sq("d8")), Some(piece(Color::Black, PieceType::Queen)));
        assert_eq!(pos.piece_at(sq("h1")), Some(piece(Color::White, PieceType::Rook)));
        assert_eq!(pos.piece_at(sq("g8")), Some(piece(Color::Black, PieceType::Knight)));
        for col in 0..8 {
            assert_eq!(
                pos.board.get(Square::at(6, col)),
                Some(piece(Color::White, PieceType::Pawn))
            );
            assert_eq!(
                pos.board.get(Square::at(1, col)),
                Some(piece(Color::Black, PieceType::Pawn))
            );
        }
        for row in 2..6 {
            for col in 0..8 {
                assert!(pos.board.is_empty(Square::at(row, col)));
            }
        }
        pos.assert_consistent();
    }

    #[test]
    fn king_sq_starting() {
        let pos = Position::starting();
        assert_eq!(pos.king_sq(Color::White), sq("e1"));
        assert_eq!(pos.king_sq(Color::Black), sq("e8"));
    }

    #[test]
    #[should_panic(expected = "no black king")]
    fn missing_king_is_a_defect() {
        let mut pos = Position::starting();
        pos.board.set(sq("e8"), None);
        pos.king_sq(Color::Black);
    }

    // ===================================================================
    // Signature & display
    // ===================================================================

    #[test]
    fn signature_layout() {
        let sig = Board::starting().signature();
        assert_eq!(sig.len(), 128);
        assert!(sig.starts_with("bRbNbBbQbKbBbNbR"));
        assert!(sig.ends_with("wRwNwBwQwKwBwNwR"));
        assert_eq!(&sig[32..48], "----------------");
        assert_ne!(sig, Board::empty().signature());
    }

    #[test]
    fn board_string_orientation() {
        let pos = Position::starting();
        let white = pos.board_string(Color::White);
        let black = pos.board_string(Color::Black);
        assert!(white.starts_with("8 r n b q k b n r"));
        assert!(black.starts_with("1 R N B K Q B N R"));
        assert!(black.ends_with("h g f e d c b a"));
    }

    // ===================================================================
    // make_move / undo_move
    // ===================================================================

    #[test]
    fn double_push_sets_en_passant() {
        let mut pos = Position::starting();
        let pawn = piece(Color::White, PieceType::Pawn);
        let mv = Move::with_flags(sq("e2"), sq("e4"), pawn, None, MoveFlags::DOUBLE_PUSH);
        let undo = pos.make_move(mv);
        assert_eq!(pos.en_passant, Some(sq("e3")));
        assert_eq!(pos.side_to_move, Color::Black);
        assert_eq!(pos.piece_at(sq("e4")), Some(pawn));
        assert!(pos.board.is_empty(sq("e2")));

        pos.undo_move(mv, &undo);
        assert_eq!(pos, Position::starting());
    }

    #[test]
    fn en_passant_clears_on_next_move() {
        let mut pos = Position::starting();
        let pawn = piece(Color::White, PieceType::Pawn);
        pos.make_move(Move::with_flags(
            sq("e2"),
            sq("e4"),
            pawn,
            None,
            MoveFlags::DOUBLE_PUSH,
        ));
        let knight = piece(Color::Black, PieceType::Knight);
        pos.make_move(Move::new(sq("g8"), sq("f6"), knight, None));
        assert_eq!(pos.en_passant, None);
        assert_eq!(pos.fullmove_number, 2);
        assert_eq!(pos.halfmove_clock, 1);
    }

    #[test]
    fn en_passant_capture_and_undo() {
        let white_pawn = piece(Color::White, PieceType::Pawn);
        let black_pawn = piece(Color::Black, PieceType::Pawn);
        let mut pos = Position::empty();
        pos.board.set(sq("e1"), Some(piece(Color::White, PieceType::King)));
        pos.board.set(sq("e8"), Some(piece(Color::Black, PieceType::King)));
        pos.board.set(sq("e5"), Some(white_pawn));
        pos.board.set(sq("d5"), Some(black_pawn));
        pos.en_passant = Some(sq("d6"));
        let before = pos.clone();

        let mv = Move::with_flags(
            sq("e5"),
            sq("d6"),
            white_pawn,
            Some(black_pawn),
            MoveFlags::EN_PASSANT,
        );
        let undo = pos.make_move(mv);
        assert_eq!(undo.captured, Some(black_pawn));
        assert!(pos.board.is_empty(sq("d5")));
        assert_eq!(pos.piece_at(sq("d6")), Some(white_pawn));

        pos.undo_move(mv, &undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn castling_moves_rook_and_revokes_rights() {
        let mut pos = Position::empty();
        let king = piece(Color::White, PieceType::King);
        let rook = piece(Color::White, PieceType::Rook);
        pos.board.set(sq("e1"), Some(king));
        pos.board.set(sq("a1"), Some(rook));
        pos.board.set(sq("e8"), Some(piece(Color::Black, PieceType::King)));
        pos.castling_rights = CastlingRights::ALL;
        let before = pos.clone();

        let mv = Move::with_flags(sq("e1"), sq("c1"), king, None, MoveFlags::CASTLING);
        let undo = pos.make_move(mv);
        assert_eq!(pos.piece_at(sq("c1")), Some(king));
        assert_eq!(pos.piece_at(sq("d1")), Some(rook));
        assert!(pos.board.is_empty(sq("a1")));
        assert!(!pos.castling_rights.can_castle_queenside(Color::White));
        assert!(!pos.castling_rights.can_castle_kingside(Color::White));
        assert!(pos.castling_rights.can_castle_kingside(Color::Black));

        pos.undo_move(mv, &undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn capturing_rook_at_home_revokes_right() {
        let mut pos = Position::empty();
        pos.board.set(sq("e1"), Some(piece(Color::White, PieceType::King)));
        pos.board.set(sq("e8"), Some(piece(Color::Black, PieceType::King)));
        pos.board.set(sq("h8"), Some(piece(Color::Black, PieceType::Rook)));
        let bishop = piece(Color::White, PieceType::Bishop);
        pos.board.set(sq("b2"), Some(bishop));
        pos.castling_rights = CastlingRights(CastlingRights::BLACK_KINGSIDE);

        let mv = Move::new(
            sq("b2"),
            sq("h8"),
            bishop,
            Some(piece(Color::Black, PieceType::Rook)),
        );
        pos.make_move(mv);
        assert_eq!(pos.castling_rights, CastlingRights::NONE);
        assert_eq!(pos.halfmove_clock, 0);
    }

    #[test]
    fn promotion_with_and_without_kind() {
        let pawn = piece(Color::White, PieceType::Pawn);
        let mut pos = Position::empty();
        pos.board.set(sq("a1"), Some(piece(Color::White, PieceType::King)));
        pos.board.set(sq("h8"), Some(piece(Color::Black, PieceType::King)));
        pos.board.set(sq("e7"), Some(pawn));
        let before = pos.clone();

        let mv = Move::with_flags(sq("e7"), sq("e8"), pawn, None, MoveFlags::PROMOTION);
        let undo = pos.make_move(mv);
        assert_eq!(pos.piece_at(sq("e8")), Some(pawn));
        pos.undo_move(mv, &undo);
        assert_eq!(pos, before);

        let queen_mv = mv.promoting_to(PieceType::Queen);
        let undo = pos.make_move(queen_mv);
        assert_eq!(pos.piece_at(sq("e8")), Some(piece(Color::White, PieceType::Queen)));
        pos.undo_move(queen_mv, &undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn in_check_detection() {
        let mut pos = Position::empty();
        pos.board.set(sq("e1"), Some(piece(Color::White, PieceType::King)));
        pos.board.set(sq("e8"), Some(piece(Color::Black, PieceType::King)));
        assert!(!pos.is_in_check());
        pos.board.set(sq("e5"), Some(piece(Color::Black, PieceType::Rook)));
        assert!(pos.is_in_check());
        pos.board.set(sq("e3"), Some(piece(Color::White, PieceType::Knight)));
        assert!(!pos.is_in_check());
    }

    #[test]
    fn castling_rook_squares_by_destination() {
        assert_eq!(castling_rook_squares(sq("g1")), (sq("h1"), sq("f1")));
        assert_eq!(castling_rook_squares(sq("c1")), (sq("a1"), sq("d1")));
        assert_eq!(castling_rook_squares(sq("g8")), (sq("h8"), sq("f8")));
        assert_eq!(castling_rook_squares(sq("c8")), (sq("a8"), sq("d8")));
    }

    #[test]
    fn counters_saturate_at_max() {
        let mut pos = Position::empty();
        pos.board.set(sq("e1"), Some(piece(Color::White, PieceType::King)));
        pos.board.set(sq("e8"), Some(piece(Color::Black, PieceType::King)));
        pos.side_to_move = Color::Black;
        pos.halfmove_clock = u16::MAX;
        pos.fullmove_number = u16::MAX;
        let before = pos.clone();

        let mv = Move::new(sq("e8"), sq("d8"), piece(Color::Black, PieceType::King), None);
        let undo = pos.make_move(mv);
        assert_eq!(pos.halfmove_clock, u16::MAX);
        assert_eq!(pos.fullmove_number, u16::MAX);
        pos.undo_move(mv, &undo);
        assert_eq!(pos, before);
    }
}
