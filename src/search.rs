//! Search Engine Module
//!
//! Fixed-depth negamax with alpha-beta pruning over the full legal move
//! tree. There is no quiescence, move ordering or transposition table: the
//! only root ordering is an optional shuffle so equal-scored moves vary
//! between games.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::board::Move;
use crate::evaluation::{evaluate, evaluate_outcome};
use crate::game_state::GameState;
use crate::move_generator::{MoveGenerator, Outcome};

/// Bound wider than any reachable score.
pub const INFINITY: i32 = 1_000_000;

pub const DEFAULT_DEPTH: u32 = 3;
pub const MAX_DEPTH: u32 = 8;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies searched from the root
    pub depth: u32,
    /// Worker threads sharing the root move list
    pub threads: usize,
    /// Shuffle the root moves before searching
    pub randomize_root: bool,
    /// Fixed shuffle seed; fresh entropy when `None`
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: DEFAULT_DEPTH,
            threads: num_cpus::get(),
            randomize_root: true,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Shuffle `moves` in place if root randomisation is on.
    pub fn order_root_moves(&self, moves: &mut [Move]) {
        if !self.randomize_root {
            return;
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        moves.shuffle(&mut rng);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// `None` when the root had no legal moves or the search was stopped
    /// before finishing its first root move. A stopped search only ranks
    /// root moves whose subtrees were searched to completion.
    pub best_move: Option<Move>,
    /// Score from the side to move's point of view
    pub score: i32,
    pub nodes: u64,
}

/// Any legal move, used when a search produced nothing usable.
pub fn fallback_move(moves: &[Move]) -> Option<Move> {
    moves.choose(&mut rand::thread_rng()).copied()
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

pub struct SearchEngine {
    move_generator: MoveGenerator,
    nodes_searched: u64,
    stop_search: Arc<AtomicBool>,
}

impl SearchEngine {
    pub fn new() -> Self {
        SearchEngine::with_stop_flag(Arc::new(AtomicBool::new(false)))
    }

    /// Engine polling an externally owned stop flag.
    pub fn with_stop_flag(stop_search: Arc<AtomicBool>) -> Self {
        SearchEngine {
            move_generator: MoveGenerator::new(),
            nodes_searched: 0,
            stop_search,
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_search)
    }

    pub fn stop(&self) {
        self.stop_search.store(true, Ordering::Relaxed);
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    #[inline]
    fn stopped(&self) -> bool {
        self.stop_search.load(Ordering::Relaxed)
    }

    /// Search `moves` (the legal moves of `state`, in the order to try them)
    /// to `depth` plies. `state` is restored before returning.
    pub fn search(&mut self, state: &mut GameState, moves: Vec<Move>, depth: u32) -> SearchResult {
        self.nodes_searched = 0;
        let multiplier = state.side_to_move().sign();

        if moves.is_empty() || depth == 0 {
            let score = if moves.is_empty() {
                multiplier * evaluate_outcome(state, self.terminal_outcome(state))
            } else {
                multiplier * evaluate(state)
            };
            return SearchResult { best_move: None, score, nodes: 1 };
        }

        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in moves {
            if self.stopped() {
                break;
            }
            state.make_move(mv);
            let score = -self.negamax(state, depth - 1, -beta, -alpha, -multiplier);
            state.undo_move();
            // an interrupted subtree has no meaningful score
            if self.stopped() {
                break;
            }
            trace!(mv = %mv, score, "root move");

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_score);
        }

        debug!(
            depth,
            score = best_score,
            nodes = self.nodes_searched,
            best = ?best_move.map(|m| m.to_uci()),
            "search finished"
        );
        SearchResult { best_move, score: best_score, nodes: self.nodes_searched }
    }

    /// Negamax score of `state` for the side whose sign is `multiplier`.
    fn negamax(&mut self, state: &mut GameState, depth: u32, mut alpha: i32, beta: i32, multiplier: i32) -> i32 {
        self.nodes_searched += 1;
        if self.stopped() {
            return 0;
        }
        if depth == 0 {
            return multiplier * evaluate(state);
        }

        let moves = self.move_generator.generate_legal_moves(state);
        if moves.is_empty() {
            return multiplier * evaluate_outcome(state, self.terminal_outcome(state));
        }

        let mut best = -INFINITY;
        for mv in moves {
            state.make_move(mv);
            let score = -self.negamax(state, depth - 1, -beta, -alpha, -multiplier);
            state.undo_move();

            best = best.max(score);
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }
        best
    }

    /// Outcome of a position already known to have no legal moves.
    fn terminal_outcome(&self, state: &GameState) -> Outcome {
        if state.in_check() {
            Outcome::Checkmate
        } else {
            Outcome::Stalemate
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new()
    }
}
