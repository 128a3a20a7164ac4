//! Stateful game controller wrapping Position.
//!
//! `Game` owns the position and the move log, applies and reverses moves,
//! tracks a pending promotion, and recomputes checkmate/stalemate after every
//! completed ply. It is the boundary the presentation layer talks to.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::board::{Board, Position, UndoInfo};
use crate::engine::movegen;
use crate::engine::types::{
    CastlingRights, ChessError, Color, DrawReason, GameStatus, Move, Piece, PieceType, Square,
};
use crate::engine::zobrist;

// =========================================================================
// MoveRecord
// =========================================================================

/// A recorded move in the game history.
#[derive(Clone, Debug)]
pub struct MoveRecord {
    /// The move that was played, with its promotion kind once resolved.
    pub mv: Move,
    /// What game status resulted from this move.
    pub status_after: GameStatus,
    undo: UndoInfo,
}

// =========================================================================
// Game
// =========================================================================

/// A complete chess game with history, undo, and status tracking.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    move_log: Vec<MoveRecord>,
    /// Repetition keys of every completed position, current one last.
    position_keys: Vec<u64>,
    pending_promotion: Option<Square>,
    checkmate: bool,
    stalemate: bool,
    /// The colour seated at the bottom of the oriented board.
    seat: Color,

    // Metadata
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self::with_seat(Color::White)
    }

    /// New game whose oriented board shows `seat`'s pieces at the bottom.
    pub fn with_seat(seat: Color) -> Self {
        let mut game = Self::from_position(Position::starting());
        game.seat = seat;
        game
    }

    /// Start a game from an arbitrary position.
    pub fn from_position(position: Position) -> Self {
        let key = zobrist::position_key(&position);
        let mut game = Self {
            position,
            move_log: Vec::new(),
            position_keys: vec![key],
            pending_promotion: None,
            checkmate: false,
            stalemate: false,
            seat: Color::White,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        game.refresh_terminal_flags();
        game
    }

    /// Throw away the current game and start over with the same seat.
    pub fn reset(&mut self) {
        *self = Self::with_seat(self.seat);
        debug!(game = %self.id, "game reset");
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn board(&self) -> &Board {
        &self.position.board
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.position.piece_at(sq)
    }

    /// Side to move.
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.position.castling_rights
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.position.en_passant
    }

    /// Completed move history, oldest first.
    pub fn move_log(&self) -> &[MoveRecord] {
        &self.move_log
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.move_log.last().map(|r| &r.mv)
    }

    /// Square of a pawn waiting for its promotion piece.
    pub fn pending_promotion(&self) -> Option<Square> {
        self.pending_promotion
    }

    pub fn seat(&self) -> Color {
        self.seat
    }

    /// Fullmove number.
    pub fn fullmove_number(&self) -> u16 {
        self.position.fullmove_number
    }

    /// Halfmove clock (for 50-move rule).
    pub fn halfmove_clock(&self) -> u16 {
        self.position.halfmove_clock
    }

    // -----------------------------------------------------------------
    // Legal moves
    // -----------------------------------------------------------------

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> Result<Vec<Move>, ChessError> {
        self.ensure_no_pending_promotion()?;
        Ok(movegen::legal_moves(&self.position))
    }

    /// Legal moves from a specific square.
    pub fn legal_moves_from(&self, sq: Square) -> Result<Vec<Move>, ChessError> {
        self.ensure_no_pending_promotion()?;
        Ok(movegen::legal_moves_from(&self.position, sq))
    }

    /// Resolve two coordinates into the matching legal move, with all its
    /// flags. Nothing changes when there is no such move.
    pub fn try_move(&self, from: Square, to: Square) -> Result<Move, ChessError> {
        self.legal_moves()?
            .into_iter()
            .find(|m| m.from == from && m.to == to)
            .ok_or_else(|| ChessError::InvalidMove {
                from: from.to_algebraic(),
                to: to.to_algebraic(),
                reason: "not a legal move".into(),
            })
    }

    /// `try_move` followed by `apply_move`. Returns the move played.
    pub fn play(&mut self, from: Square, to: Square) -> Result<Move, ChessError> {
        let mv = self.try_move(from, to)?;
        self.apply_move(mv)?;
        Ok(mv)
    }

    // -----------------------------------------------------------------
    // Apply / promote / undo
    // -----------------------------------------------------------------

    /// Apply a move taken from the current legal set.
    ///
    /// Legality is not re-checked. A promotion move without a chosen kind
    /// leaves the game waiting for `resolve_promotion`; terminal flags are
    /// only recomputed once the ply is complete.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), ChessError> {
        self.ensure_no_pending_promotion()?;
        if let Some(kind) = mv.promotion
            && (!mv.is_pawn_promotion() || !kind.is_promotion_target())
        {
            return Err(ChessError::InvalidPromotion(kind));
        }
        debug_assert_eq!(
            self.position.piece_at(mv.from),
            Some(mv.piece_moved),
            "move {mv} does not match the board"
        );

        let undo = self.position.make_move(mv);
        self.move_log.push(MoveRecord {
            mv,
            status_after: GameStatus::AwaitingPromotion,
            undo,
        });
        debug!(game = %self.id, %mv, "move applied");

        if mv.is_pawn_promotion() && mv.promotion.is_none() {
            self.pending_promotion = Some(mv.to);
            return Ok(());
        }
        self.complete_ply();
        Ok(())
    }

    /// Choose the piece for the pawn that just reached the last rank.
    pub fn resolve_promotion(&mut self, square: Square, kind: PieceType) -> Result<(), ChessError> {
        let pending = self
            .pending_promotion
            .ok_or(ChessError::NoPendingPromotion)?;
        if pending != square {
            return Err(ChessError::PromotionSquareMismatch {
                expected: pending,
                given: square,
            });
        }
        if !kind.is_promotion_target() {
            return Err(ChessError::InvalidPromotion(kind));
        }

        // The promoting side has already handed the move over.
        let color = !self.position.side_to_move;
        self.position.board.set(square, Some(Piece::new(color, kind)));
        if let Some(record) = self.move_log.last_mut() {
            record.mv = record.mv.promoting_to(kind);
        }
        self.pending_promotion = None;
        debug!(game = %self.id, %square, %kind, "promotion resolved");

        self.complete_ply();
        Ok(())
    }

    /// Undo the last move. Returns `None` when there is nothing to undo.
    pub fn undo_last_move(&mut self) -> Option<Move> {
        let record = self.move_log.pop()?;
        // A pending promotion never reached `complete_ply`, so it has no key.
        if self.pending_promotion.take().is_none() {
            self.position_keys.pop();
        }
        self.position.undo_move(record.mv, &record.undo);
        self.checkmate = false;
        self.stalemate = false;
        debug!(game = %self.id, mv = %record.mv, "move undone");
        Some(record.mv)
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    pub fn is_checkmate(&self) -> bool {
        self.checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.stalemate
    }

    /// Is the side to move in check?
    pub fn is_in_check(&self) -> bool {
        self.position.is_in_check()
    }

    /// Summary of the game state. Checkmate and stalemate are authoritative;
    /// draws are advisory and reported after them.
    pub fn status(&self) -> GameStatus {
        if self.pending_promotion.is_some() {
            return GameStatus::AwaitingPromotion;
        }
        if self.checkmate {
            return GameStatus::Checkmate;
        }
        if self.stalemate {
            return GameStatus::Stalemate;
        }
        if let Some(reason) = self.draw_reason() {
            return GameStatus::Draw(reason);
        }
        if self.is_in_check() {
            GameStatus::Check
        } else {
            GameStatus::Active
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_game_over()
    }

    /// Advisory draw condition, checked in order of cheapness.
    pub fn draw_reason(&self) -> Option<DrawReason> {
        if self.pending_promotion.is_some() {
            return None;
        }
        if self.position.halfmove_clock >= 100 {
            return Some(DrawReason::FiftyMoveRule);
        }
        if self.repetition_count() >= 3 {
            return Some(DrawReason::ThreefoldRepetition);
        }
        if self.is_insufficient_material() {
            return Some(DrawReason::InsufficientMaterial);
        }
        None
    }

    /// How many times the current position has occurred, counting side to
    /// move, castling rights and the en-passant target.
    pub fn repetition_count(&self) -> usize {
        match self.position_keys.last() {
            Some(current) => self.position_keys.iter().filter(|&k| k == current).count(),
            None => 0,
        }
    }

    /// Pieces of `color` captured so far, in capture order.
    pub fn captured(&self, color: Color) -> Vec<Piece> {
        self.move_log
            .iter()
            .filter_map(|r| r.mv.piece_captured)
            .filter(|p| p.color == color)
            .collect()
    }

    /// Stable serialization of the board for repetition comparison.
    pub fn board_signature(&self) -> String {
        self.position.board.signature()
    }

    /// Board rows as seen by the seated player: row 0 is the far side.
    pub fn oriented_board(&self) -> [[Option<Piece>; 8]; 8] {
        std::array::from_fn(|row| {
            std::array::from_fn(|col| {
                let view = Square::at(row as u8, col as u8);
                self.position.board.get(self.view_to_board(view))
            })
        })
    }

    /// Map a square on the oriented board to the underlying board square.
    /// The mapping is its own inverse.
    pub fn view_to_board(&self, view: Square) -> Square {
        match self.seat {
            Color::White => view,
            Color::Black => view.flipped(),
        }
    }

    /// Text rendering from the seated player's side.
    pub fn board_string(&self) -> String {
        self.position.board_string(self.seat)
    }

    // -----------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------

    fn ensure_no_pending_promotion(&self) -> Result<(), ChessError> {
        match self.pending_promotion {
            Some(sq) => Err(ChessError::PromotionPending(sq)),
            None => Ok(()),
        }
    }

    /// Bookkeeping once a ply is fully on the board.
    fn complete_ply(&mut self) {
        #[cfg(debug_assertions)]
        self.position.assert_consistent();

        self.position_keys
            .push(zobrist::position_key(&self.position));
        self.refresh_terminal_flags();
        let status = self.status();
        if let Some(record) = self.move_log.last_mut() {
            record.status_after = status.clone();
        }

        match status {
            GameStatus::Checkmate => {
                let winner = !self.side_to_move();
                info!(game = %self.id, %winner, "checkmate")
            }
            GameStatus::Stalemate => info!(game = %self.id, "stalemate"),
            GameStatus::Draw(reason) => {
                info!(game = %self.id, reason = reason.as_str(), "draw available")
            }
            _ => {}
        }
    }

    fn refresh_terminal_flags(&mut self) {
        let no_moves = movegen::legal_moves(&self.position).is_empty();
        let in_check = self.position.is_in_check();
        self.checkmate = no_moves && in_check;
        self.stalemate = no_moves && !in_check;
    }

    /// Insufficient material detection.
    ///
    /// Draws: K vs K, K+B vs K, K+N vs K, K+B vs K+B (same colour bishops).
    fn is_insufficient_material(&self) -> bool {
        let board = &self.position.board;
        let mut minors = [0usize; 2];
        let mut bishop_shades = [None::<u8>; 2];

        for (sq, piece) in board.pieces() {
            match piece.kind {
                PieceType::King => {}
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
                PieceType::Knight => minors[piece.color.index()] += 1,
                PieceType::Bishop => {
                    minors[piece.color.index()] += 1;
                    bishop_shades[piece.color.index()] = Some((sq.row() + sq.col()) & 1);
                }
            }
        }

        match minors {
            // K vs K, K+minor vs K
            [0, 0] | [1, 0] | [0, 1] => true,
            // K+B vs K+B with bishops on same colour squares
            [1, 1] => matches!(bishop_shades, [Some(w), Some(b)] if w == b),
            _ => false,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
