//! Fluent builder for constructing positions piece by piece.
//!
//! ```
//! use chess_rules::engine::{Color, PieceType, Position, Square};
//!
//! let pos = Position::builder()
//!     .piece("e1".parse::<Square>().unwrap(), Color::White, PieceType::King)
//!     .piece("e8".parse::<Square>().unwrap(), Color::Black, PieceType::King)
//!     .side_to_move(Color::Black)
//!     .build()
//!     .unwrap();
//! assert!(!pos.is_in_check());
//! ```

use crate::engine::board::{Board, Position};
use crate::engine::types::{CastlingRights, ChessError, Color, Piece, PieceType, Square};

/// Builds a validated `Position`.
#[derive(Clone, Debug)]
pub struct PositionBuilder {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
}

impl Default for PositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionBuilder {
    /// An empty board, white to move, no castling rights.
    #[must_use]
    pub fn new() -> Self {
        PositionBuilder {
            board: Board::empty(),
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Start from the standard initial position.
    #[must_use]
    pub fn starting_position() -> Self {
        PositionBuilder {
            board: Board::starting(),
            castling_rights: CastlingRights::ALL,
            ..Self::new()
        }
    }

    /// Place a piece, replacing whatever stood on `square`.
    #[must_use]
    pub fn piece(mut self, square: Square, color: Color, kind: PieceType) -> Self {
        self.board.set(square, Some(Piece::new(color, kind)));
        self
    }

    /// Empty a square.
    #[must_use]
    pub fn clear(mut self, square: Square) -> Self {
        self.board.set(square, None);
        self
    }

    /// Replace the whole board with a diagram: eight rows from rank 8 down to
    /// rank 1, eight characters each, `.` for empty and piece letters
    /// otherwise (uppercase = white). Spaces are ignored.
    pub fn diagram(mut self, rows: [&str; 8]) -> Result<Self, ChessError> {
        let mut board = Board::empty();
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != 8 {
                return Err(ChessError::InvalidPosition(format!(
                    "diagram row {} has {} cells instead of 8",
                    row + 1,
                    cells.len()
                )));
            }
            for (col, ch) in cells.into_iter().enumerate() {
                if ch == '.' {
                    continue;
                }
                let (color, kind) = PieceType::from_char(ch).ok_or_else(|| {
                    ChessError::InvalidPosition(format!("invalid piece character '{ch}'"))
                })?;
                board.set(Square::at(row as u8, col as u8), Some(Piece::new(color, kind)));
            }
        }
        self.board = board;
        Ok(self)
    }

    #[must_use]
    pub const fn side_to_move(mut self, color: Color) -> Self {
        self.side_to_move = color;
        self
    }

    #[must_use]
    pub const fn castling(mut self, rights: CastlingRights) -> Self {
        self.castling_rights = rights;
        self
    }

    /// Enable kingside castling for a colour.
    #[must_use]
    pub fn castle_kingside(mut self, color: Color) -> Self {
        self.castling_rights.insert(CastlingRights::kingside(color));
        self
    }

    /// Enable queenside castling for a colour.
    #[must_use]
    pub fn castle_queenside(mut self, color: Color) -> Self {
        self.castling_rights.insert(CastlingRights::queenside(color));
        self
    }

    #[must_use]
    pub const fn en_passant(mut self, target: Square) -> Self {
        self.en_passant = Some(target);
        self
    }

    #[must_use]
    pub const fn halfmove_clock(mut self, clock: u16) -> Self {
        self.halfmove_clock = clock;
        self
    }

    #[must_use]
    pub const fn fullmove_number(mut self, number: u16) -> Self {
        self.fullmove_number = number;
        self
    }

    /// Validate and build the position.
    ///
    /// Requires exactly one king per side, no pawns on the first or last
    /// rank, and an en-passant target on the 6th rank for white to move or
    /// the 3rd for black. Castling rights whose king or rook is missing from
    /// its home square are dropped.
    pub fn build(self) -> Result<Position, ChessError> {
        for color in [Color::White, Color::Black] {
            let kings = self.board.count(color, PieceType::King);
            if kings != 1 {
                return Err(ChessError::InvalidPosition(format!(
                    "{color} has {kings} kings (expected 1)"
                )));
            }
        }

        if let Some((sq, _)) = self
            .board
            .pieces()
            .find(|&(sq, p)| p.kind == PieceType::Pawn && (sq.row() == 0 || sq.row() == 7))
        {
            return Err(ChessError::InvalidPosition(format!(
                "pawn on {sq} cannot stand on a back rank"
            )));
        }

        if let Some(ep) = self.en_passant {
            let expected_rank = match self.side_to_move {
                Color::White => 6,
                Color::Black => 3,
            };
            if ep.rank() != expected_rank {
                return Err(ChessError::InvalidPosition(format!(
                    "en passant square {ep} is not on rank {expected_rank}"
                )));
            }
        }

        if self.fullmove_number == 0 {
            return Err(ChessError::InvalidPosition(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        let mut castling_rights = self.castling_rights;
        for color in [Color::White, Color::Black] {
            let home = color.home_row();
            let king = Piece::new(color, PieceType::King);
            let rook = Piece::new(color, PieceType::Rook);
            if self.board.get(Square::at(home, 4)) != Some(king) {
                castling_rights.revoke_touching(Square::at(home, 4));
            }
            for col in [0, 7] {
                if self.board.get(Square::at(home, col)) != Some(rook) {
                    castling_rights.revoke_touching(Square::at(home, col));
                }
            }
        }

        let pos = Position {
            board: self.board,
            side_to_move: self.side_to_move,
            castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        #[cfg(debug_assertions)]
        pos.assert_consistent();

        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn starting_position_matches() {
        let built = PositionBuilder::starting_position().build().unwrap();
        assert_eq!(built, Position::starting());
    }

    #[test]
    fn two_kings_only() {
        let pos = PositionBuilder::new()
            .piece(sq("e1"), Color::White, PieceType::King)
            .piece(sq("e8"), Color::Black, PieceType::King)
            .build()
            .unwrap();
        assert_eq!(pos.board.pieces().count(), 2);
        assert_eq!(pos.castling_rights, CastlingRights::NONE);
    }

    #[test]
    fn missing_king_rejected() {
        let err = PositionBuilder::new()
            .piece(sq("e1"), Color::White, PieceType::King)
            .build()
            .unwrap_err();
        assert!(matches!(err, ChessError::InvalidPosition(_)));
    }

    #[test]
    fn extra_king_rejected() {
        let result = PositionBuilder::starting_position()
            .piece(sq("d4"), Color::White, PieceType::King)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn pawn_on_back_rank_rejected() {
        let result = PositionBuilder::starting_position()
            .piece(sq("a8"), Color::White, PieceType::Pawn)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn diagram_parses_rows() {
        let pos = PositionBuilder::new()
            .diagram([
                "r . . . k . . r",
                "........",
                "........",
                "........",
                "........",
                "........",
                "........",
                "R . . . K . . R",
            ])
            .unwrap()
            .castling(CastlingRights::ALL)
            .build()
            .unwrap();
        assert_eq!(
            pos.piece_at(sq("h8")),
            Some(Piece::new(Color::Black, PieceType::Rook))
        );
        assert_eq!(pos.castling_rights, CastlingRights::ALL);
    }

    #[test]
    fn diagram_row_length_checked() {
        let result = PositionBuilder::new().diagram([
            "k.......", "........", "........", "........", "........", "........", "........",
            "K......",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn diagram_bad_character() {
        let result = PositionBuilder::new().diagram([
            "k......x", "........", "........", "........", "........", "........", "........",
            "K.......",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn castling_rights_need_pieces_at_home() {
        let pos = PositionBuilder::starting_position()
            .clear(sq("h1"))
            .build()
            .unwrap();
        assert!(!pos.castling_rights.can_castle_kingside(Color::White));
        assert!(pos.castling_rights.can_castle_queenside(Color::White));
        assert!(pos.castling_rights.can_castle_kingside(Color::Black));
    }

    #[test]
    fn en_passant_rank_checked() {
        let ok = PositionBuilder::starting_position()
            .side_to_move(Color::Black)
            .en_passant(sq("e3"))
            .build();
        assert!(ok.is_ok());

        let bad = PositionBuilder::starting_position()
            .en_passant(sq("e3"))
            .build();
        assert!(bad.is_err());
    }
}
