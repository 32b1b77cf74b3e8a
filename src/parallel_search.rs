//! Parallel Search Module
//!
//! Two layers sit on top of [`SearchEngine`]:
//! - [`ParallelSearchEngine`] splits the root move list across worker
//!   threads. Each worker owns a clone of the position and searches its
//!   share with a full window, so the best score equals the single-threaded
//!   result.
//! - [`SearchHandle`] runs one such search in the background and hands the
//!   result back through a single-slot channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use tracing::{debug, warn};

use crate::board::Move;
use crate::game_state::GameState;
use crate::move_generator::MoveGenerator;
use crate::search::{SearchConfig, SearchEngine, SearchResult, INFINITY};

pub struct ParallelSearchEngine {
    num_threads: usize,
    stop_search: Arc<AtomicBool>,
}

impl ParallelSearchEngine {
    /// `num_threads == 0` means one thread per logical CPU.
    pub fn new(num_threads: usize) -> Self {
        ParallelSearchEngine::with_stop_flag(num_threads, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_stop_flag(num_threads: usize, stop_search: Arc<AtomicBool>) -> Self {
        let threads = if num_threads == 0 { num_cpus::get() } else { num_threads };
        ParallelSearchEngine { num_threads: threads, stop_search }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn stop(&self) {
        self.stop_search.store(true, Ordering::Relaxed);
    }

    /// Generate, order and search the root moves of `state` as `config` says.
    pub fn think(&self, state: &GameState, config: &SearchConfig) -> SearchResult {
        let mut moves = MoveGenerator::new().generate_legal_moves(state);
        config.order_root_moves(&mut moves);
        self.search(state, moves, config.depth.max(1))
    }

    /// Search `moves` to `depth`, sharing them out between the workers.
    pub fn search(&self, state: &GameState, moves: Vec<Move>, depth: u32) -> SearchResult {
        let threads = self.num_threads.min(moves.len()).max(1);
        if threads == 1 {
            let mut engine = SearchEngine::with_stop_flag(Arc::clone(&self.stop_search));
            return engine.search(&mut state.clone(), moves, depth);
        }

        let chunk_size = moves.len().div_ceil(threads);
        let results: Vec<SearchResult> = thread::scope(|scope| {
            let handles: Vec<_> = moves
                .chunks(chunk_size)
                .enumerate()
                .map(|(thread_id, chunk)| {
                    let stop = Arc::clone(&self.stop_search);
                    let mut worker_state = state.clone();
                    let chunk = chunk.to_vec();
                    scope.spawn(move || {
                        let mut engine = SearchEngine::with_stop_flag(stop);
                        let result = engine.search(&mut worker_state, chunk, depth);
                        debug!(thread_id, score = result.score, nodes = result.nodes, "worker finished");
                        result
                    })
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(result) => Some(result),
                    Err(_) => {
                        warn!("search worker panicked");
                        None
                    }
                })
                .collect()
        });

        combine_results(&results)
    }
}

impl Default for ParallelSearchEngine {
    fn default() -> Self {
        ParallelSearchEngine::new(0)
    }
}

/// Best score wins; ties go to the earliest chunk so the combined result
/// follows the same move order a single thread would.
fn combine_results(results: &[SearchResult]) -> SearchResult {
    let mut combined = SearchResult { best_move: None, score: -INFINITY, nodes: 0 };
    for result in results {
        combined.nodes += result.nodes;
        if result.best_move.is_some() && (combined.best_move.is_none() || result.score > combined.score) {
            combined.best_move = result.best_move;
            combined.score = result.score;
        }
    }
    combined
}

// ============================================================================
// BACKGROUND SEARCH
// ============================================================================

/// A search running on its own thread.
///
/// The worker sends exactly one result into a single-slot channel. Once
/// cancelled, a handle never yields a result, even one that was already
/// waiting in the slot.
pub struct SearchHandle {
    receiver: Receiver<SearchResult>,
    cancelled: Arc<AtomicBool>,
    depth: u32,
    worker: Option<JoinHandle<()>>,
}

impl SearchHandle {
    /// Start searching a private copy of `state`.
    pub fn spawn(state: GameState, config: SearchConfig) -> Self {
        let (sender, receiver) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&cancelled);
        let depth = config.depth.max(1);

        let worker = thread::spawn(move || {
            let engine = ParallelSearchEngine::with_stop_flag(config.threads, stop);
            let result = engine.think(&state, &config);
            if sender.send(result).is_err() {
                debug!("search result dropped, handle already gone");
            }
        });

        SearchHandle { receiver, cancelled, depth, worker: Some(worker) }
    }

    /// Plies this search goes to.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Channel to wait on, e.g. inside `select!`. Results read from it
    /// directly must still go through [`SearchHandle::accept`].
    pub fn receiver(&self) -> &Receiver<SearchResult> {
        &self.receiver
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Drop `result` if the search was cancelled after it was produced.
    pub fn accept(&self, result: SearchResult) -> Option<SearchResult> {
        if self.is_cancelled() {
            debug!("discarding result of cancelled search");
            None
        } else {
            Some(result)
        }
    }

    /// Non-blocking poll.
    pub fn try_result(&self) -> Option<SearchResult> {
        let result = self.receiver.try_recv().ok()?;
        self.accept(result)
    }

    /// Block until the worker reports. `None` if cancelled or the worker died.
    pub fn wait(mut self) -> Option<SearchResult> {
        let result = self.receiver.recv().ok();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("background search panicked");
            }
        }
        self.accept(result?)
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("background search panicked");
            }
        }
    }
}
