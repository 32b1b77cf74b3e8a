//! UCI Protocol Module
//!
//! Text front end over the rules engine and the background search. Input
//! lines arrive from a reader thread and are multiplexed with search results
//! in one `select!` loop, so `stop` and `isready` are answered while a
//! search is running.

use std::io::{self, BufRead, BufReader, Write};
use std::thread;

use crossbeam_channel::{never, select, unbounded, Receiver};
use tracing::{debug, info, warn};

use crate::board::Move;
use crate::error::{ChessError, ChessResult};
use crate::evaluation;
use crate::game_state::GameState;
use crate::move_generator::MoveGenerator;
use crate::parallel_search::SearchHandle;
use crate::search::{fallback_move, SearchConfig, SearchResult, MAX_DEPTH};
use crate::types::*;

// Engine identification
const ENGINE_NAME: &str = "NegamaxChess";
const ENGINE_AUTHOR: &str = "NegamaxChess developers";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Spin { min: i32, max: i32 },
    Check,
}

/// UCI option representation
#[derive(Clone, Debug)]
pub struct UCIOption {
    pub name: String,
    pub kind: OptionKind,
    pub default: String,
    pub value: String,
}

impl UCIOption {
    pub fn spin(name: &str, default: i32, min: i32, max: i32) -> Self {
        UCIOption {
            name: name.to_string(),
            kind: OptionKind::Spin { min, max },
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    pub fn check(name: &str, default: bool) -> Self {
        UCIOption {
            name: name.to_string(),
            kind: OptionKind::Check,
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    pub fn to_uci_string(&self) -> String {
        match self.kind {
            OptionKind::Spin { min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                self.name, self.default, min, max
            ),
            OptionKind::Check => format!("option name {} type check default {}", self.name, self.default),
        }
    }

    /// Returns false (and keeps the old value) when `value_str` is out of range.
    pub fn set_value(&mut self, value_str: &str) -> bool {
        match self.kind {
            OptionKind::Spin { min, max } => match value_str.parse::<i32>() {
                Ok(val) if (min..=max).contains(&val) => {
                    self.value = val.to_string();
                    true
                }
                _ => false,
            },
            OptionKind::Check => {
                self.value = value_str.eq_ignore_ascii_case("true").to_string();
                true
            }
        }
    }

    pub fn get_int(&self) -> i32 {
        self.value.parse().unwrap_or(0)
    }

    pub fn get_bool(&self) -> bool {
        self.value == "true"
    }
}

/// Resolve coordinate text ("e2e4", "e7e8q") against the legal moves of `state`.
pub fn parse_move(state: &GameState, text: &str) -> ChessResult<Move> {
    let invalid = || ChessError::InvalidMoveText(text.to_string());
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(invalid());
    }
    let from = Square::parse(&text[0..2]).map_err(|_| invalid())?;
    let to = Square::parse(&text[2..4]).map_err(|_| invalid())?;
    // only queen promotions exist
    if text.len() == 5 && !text[4..].eq_ignore_ascii_case("q") {
        return Err(invalid());
    }

    MoveGenerator::new()
        .generate_legal_moves(state)
        .into_iter()
        .find(|mv| mv.from() == from && mv.to() == to)
        .ok_or_else(|| ChessError::IllegalMove(text.to_string()))
}

/// UCI protocol handler writing responses to `W`.
pub struct UCIProtocol<W: Write> {
    out: W,
    state: GameState,
    move_generator: MoveGenerator,
    config: SearchConfig,
    search: Option<SearchHandle>,
    running: bool,
    debug_mode: bool,
    options: Vec<UCIOption>,
}

impl UCIProtocol<io::Stdout> {
    pub fn new() -> Self {
        UCIProtocol::with_output(io::stdout())
    }

    /// Serve stdin until `quit` or end of input.
    pub fn run(&mut self) {
        self.run_with(BufReader::new(io::stdin()));
    }
}

impl Default for UCIProtocol<io::Stdout> {
    fn default() -> Self {
        UCIProtocol::new()
    }
}

impl<W: Write> UCIProtocol<W> {
    pub fn with_output(out: W) -> Self {
        let mut protocol = UCIProtocol {
            out,
            state: GameState::new_game(),
            move_generator: MoveGenerator::new(),
            config: SearchConfig::default(),
            search: None,
            running: true,
            debug_mode: false,
            options: Vec::new(),
        };
        protocol.init_options();
        protocol
    }

    fn init_options(&mut self) {
        let default_threads = self.config.threads.clamp(1, 256) as i32;
        self.options = vec![
            UCIOption::spin("Depth", self.config.depth as i32, 1, MAX_DEPTH as i32),
            UCIOption::spin("Threads", default_threads, 1, 256),
            UCIOption::check("RandomizeRoot", self.config.randomize_root),
        ];
    }

    fn apply_options(&mut self) {
        for opt in &self.options {
            match opt.name.as_str() {
                "Depth" => self.config.depth = opt.get_int().max(1) as u32,
                "Threads" => self.config.threads = opt.get_int().max(1) as usize,
                "RandomizeRoot" => self.config.randomize_root = opt.get_bool(),
                _ => {}
            }
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Serve commands read from `input` until `quit` or end of input. At end
    /// of input a search still in flight is allowed to finish and report.
    pub fn run_with<R: BufRead + Send + 'static>(&mut self, input: R) {
        let lines = spawn_reader(input);

        while self.running {
            let results = match &self.search {
                Some(handle) => handle.receiver().clone(),
                None => never(),
            };
            select! {
                recv(lines) -> line => match line {
                    Ok(line) => {
                        let line = line.trim();
                        if !line.is_empty() {
                            self.process_command(line);
                        }
                    }
                    Err(_) => {
                        debug!("input closed");
                        self.finish_pending_search();
                        break;
                    }
                },
                recv(results) -> result => match result {
                    Ok(result) => self.on_search_result(result),
                    Err(_) => {
                        warn!("search worker exited without a result");
                        self.search = None;
                        self.send_fallback();
                    }
                },
            }
        }
        self.cancel_search();
    }

    pub fn process_command(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return;
        };
        debug!(command, ?args, "command");

        match command {
            "uci" => self.cmd_uci(),
            "isready" => self.cmd_isready(),
            "setoption" => self.cmd_setoption(args),
            "ucinewgame" => self.cmd_ucinewgame(),
            "position" => self.cmd_position(args),
            "go" => self.cmd_go(args),
            "stop" => self.cmd_stop(),
            "quit" => self.cmd_quit(),
            "debug" => self.cmd_debug(args),
            "d" => self.cmd_display(),
            "moves" => self.cmd_moves(),
            "play" => self.cmd_play(args),
            "undo" => self.cmd_undo(),
            "eval" => self.cmd_eval(),
            "perft" => self.cmd_perft(args),
            _ => {
                if self.debug_mode {
                    self.send(&format!("info string Unknown command: {}", command));
                }
            }
        }
    }

    fn send(&mut self, message: &str) {
        if let Err(err) = writeln!(self.out, "{}", message).and_then(|_| self.out.flush()) {
            warn!(%err, "failed to write protocol output");
        }
    }

    fn cmd_uci(&mut self) {
        self.send(&format!("id name {} {}", ENGINE_NAME, ENGINE_VERSION));
        self.send(&format!("id author {}", ENGINE_AUTHOR));
        let lines: Vec<String> = self.options.iter().map(UCIOption::to_uci_string).collect();
        for line in lines {
            self.send(&line);
        }
        self.send("uciok");
    }

    fn cmd_isready(&mut self) {
        self.send("readyok");
    }

    fn cmd_setoption(&mut self, args: &[&str]) {
        if args.len() < 2 || args[0] != "name" {
            return;
        }

        let (name_parts, value_str) = match args.iter().position(|&a| a == "value") {
            Some(i) => (&args[1..i], Some(args[i + 1..].join(" "))),
            None => (&args[1..], None),
        };
        let name = name_parts.join(" ");

        let Some(value) = value_str else {
            return;
        };
        let mut message = None;
        match self.options.iter_mut().find(|opt| opt.name.eq_ignore_ascii_case(&name)) {
            Some(opt) => {
                if opt.set_value(&value) {
                    info!(option = %opt.name, value = %opt.value, "option set");
                    if self.debug_mode {
                        message = Some(format!("info string Option {} set to {}", opt.name, opt.value));
                    }
                } else {
                    message = Some(format!("info string Invalid value {} for option {}", value, opt.name));
                }
            }
            None => message = Some(format!("info string Unknown option {}", name)),
        }
        if let Some(msg) = message {
            self.send(&msg);
        }

        self.apply_options();
    }

    fn cmd_ucinewgame(&mut self) {
        self.cancel_search();
        self.state = GameState::new_game();
    }

    fn cmd_position(&mut self, args: &[&str]) {
        let Some(&kind) = args.first() else {
            return;
        };
        self.cancel_search();

        match kind {
            "startpos" => {
                self.state = GameState::new_game();
                if args.get(1) == Some(&"moves") {
                    for text in &args[2..] {
                        if let Err(err) = self.apply_move_text(text) {
                            self.send(&format!("info string {}", err));
                            break;
                        }
                    }
                }
            }
            "fen" => self.send("info string FEN positions are not supported"),
            _ => self.send(&format!("info string Unknown position type {}", kind)),
        }
    }

    fn apply_move_text(&mut self, text: &str) -> ChessResult<Move> {
        let mv = parse_move(&self.state, text)?;
        self.state.make_move(mv);
        Ok(mv)
    }

    fn cmd_go(&mut self, args: &[&str]) {
        if self.search.is_some() {
            self.send("info string Search already running");
            return;
        }

        let mut config = self.config.clone();
        let mut i = 0;
        while i < args.len() {
            match args[i] {
                "depth" if i + 1 < args.len() => {
                    if let Ok(d) = args[i + 1].parse::<u32>() {
                        config.depth = d;
                    }
                    i += 2;
                }
                "wtime" | "btime" | "winc" | "binc" | "movestogo" | "movetime" => i += 2,
                _ => i += 1,
            }
        }
        config.depth = config.depth.clamp(1, MAX_DEPTH);

        if self.move_generator.generate_legal_moves(&self.state).is_empty() {
            self.send("bestmove 0000");
            return;
        }

        info!(depth = config.depth, threads = config.threads, "starting search");
        self.search = Some(SearchHandle::spawn(self.state.clone(), config));
    }

    fn on_search_result(&mut self, result: SearchResult) {
        let Some(handle) = self.search.take() else {
            return;
        };
        let depth = handle.depth();
        let result = handle.accept(result);
        self.report(depth, result);
    }

    /// Block on the search in flight, if any, and report its move.
    fn finish_pending_search(&mut self) {
        if let Some(handle) = self.search.take() {
            let depth = handle.depth();
            let result = handle.wait();
            self.report(depth, result);
        }
    }

    fn report(&mut self, depth: u32, result: Option<SearchResult>) {
        match result {
            Some(SearchResult { best_move: Some(mv), score, nodes }) => {
                self.send(&format!("info depth {} score cp {} nodes {} pv {}", depth, score, nodes, mv.to_uci()));
                self.send(&format!("bestmove {}", mv.to_uci()));
            }
            _ => self.send_fallback(),
        }
    }

    fn send_fallback(&mut self) {
        let moves = self.move_generator.generate_legal_moves(&self.state);
        match fallback_move(&moves) {
            Some(mv) => self.send(&format!("bestmove {}", mv.to_uci())),
            None => self.send("bestmove 0000"),
        }
    }

    /// Cancel and forget the search in flight. Returns whether there was one.
    fn cancel_search(&mut self) -> bool {
        match self.search.take() {
            Some(handle) => {
                handle.cancel();
                debug!("search cancelled");
                true
            }
            None => false,
        }
    }

    fn cmd_stop(&mut self) {
        if self.cancel_search() {
            self.send_fallback();
        }
    }

    fn cmd_quit(&mut self) {
        self.cancel_search();
        self.running = false;
    }

    fn cmd_debug(&mut self, args: &[&str]) {
        if let Some(&flag) = args.first() {
            self.debug_mode = flag == "on";
        }
    }

    fn cmd_display(&mut self) {
        let state = &self.state;
        let mut lines = vec![
            state.board().display(),
            format!("Side to move: {}", state.side_to_move()),
            format!("Castling: {}", state.castling_rights()),
            format!("En passant: {}", state.en_passant().map_or("-".to_string(), |sq| sq.name())),
            format!("In check: {}", self.move_generator.is_in_check(state)),
        ];

        let legal_moves = self.move_generator.generate_legal_moves(state);
        lines.push(format!("Legal moves: {}", legal_moves.len()));
        let move_list: Vec<String> = legal_moves.iter().map(|m| m.to_uci()).collect();
        lines.push(format!("Moves: {}", move_list.join(" ")));

        for line in lines {
            self.send(&line);
        }
    }

    fn cmd_moves(&mut self) {
        let moves = self.move_generator.generate_legal_moves(&self.state);
        let list: Vec<String> = moves.iter().map(Move::notation).collect();
        self.send(&list.join(" "));
    }

    fn cmd_play(&mut self, args: &[&str]) {
        let Some(&text) = args.first() else {
            self.send("info string play needs a move");
            return;
        };
        self.cancel_search();
        match self.apply_move_text(text) {
            Ok(mv) => {
                let outcome = self.move_generator.outcome(&self.state);
                self.send(&format!("info string played {} ({:?})", mv, outcome));
            }
            Err(err) => self.send(&format!("info string {}", err)),
        }
    }

    fn cmd_undo(&mut self) {
        self.cancel_search();
        match self.state.undo_move() {
            Some(mv) => self.send(&format!("info string undid {}", mv)),
            None => self.send("info string Nothing to undo"),
        }
    }

    fn cmd_eval(&mut self) {
        let score = evaluation::evaluate(&self.state);
        self.send(&format!("info string eval {} cp (white)", score));
    }

    fn cmd_perft(&mut self, args: &[&str]) {
        let depth = args.first().and_then(|s| s.parse::<u32>().ok()).unwrap_or(1);
        let mut state = self.state.clone();
        let nodes = self.move_generator.perft(&mut state, depth);
        self.send(&format!("Nodes: {}", nodes));
    }
}

/// Forward input lines to a channel from a dedicated thread.
fn spawn_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<String> {
    let (sender, receiver) = unbounded();
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn protocol() -> UCIProtocol<Vec<u8>> {
        UCIProtocol::with_output(Vec::new())
    }

    fn output(protocol: UCIProtocol<Vec<u8>>) -> String {
        String::from_utf8(protocol.into_output()).unwrap()
    }

    fn run(script: &'static str) -> String {
        let mut uci = protocol();
        uci.run_with(Cursor::new(script));
        output(uci)
    }

    #[test]
    fn uci_handshake_lists_options() {
        let mut uci = protocol();
        uci.process_command("uci");
        uci.process_command("isready");
        let out = output(uci);
        assert!(out.starts_with("id name NegamaxChess"));
        assert!(out.contains("option name Depth type spin default 3 min 1 max 8"));
        assert!(out.contains("option name RandomizeRoot type check default true"));
        assert!(out.contains("uciok\nreadyok\n"));
    }

    #[test]
    fn setoption_updates_config() {
        let mut uci = protocol();
        uci.process_command("setoption name Depth value 5");
        uci.process_command("setoption name RandomizeRoot value false");
        uci.process_command("setoption name Threads value 2");
        assert_eq!(uci.config().depth, 5);
        assert_eq!(uci.config().threads, 2);
        assert!(!uci.config().randomize_root);

        uci.process_command("setoption name Depth value 99");
        assert_eq!(uci.config().depth, 5);
        assert!(output(uci).contains("Invalid value 99"));
    }

    #[test]
    fn position_applies_moves_and_stops_at_illegal_one() {
        let mut uci = protocol();
        uci.process_command("position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(uci.state().history().len(), 3);
        assert_eq!(uci.state().side_to_move(), Color::Black);

        uci.process_command("position startpos moves e2e4 e2e4 d2d4");
        assert_eq!(uci.state().history().len(), 1);
        assert!(output(uci).contains("info string illegal move in this position: e2e4"));
    }

    #[test]
    fn fen_positions_are_refused() {
        let mut uci = protocol();
        uci.process_command("position fen 8/8/8/8/8/8/8/8 w - - 0 1");
        assert_eq!(uci.state(), &GameState::new_game());
        assert!(output(uci).contains("FEN positions are not supported"));
    }

    #[test]
    fn parse_move_checks_text_and_legality() {
        let state = GameState::new_game();
        assert_eq!(parse_move(&state, "g1f3").unwrap().to_uci(), "g1f3");
        assert_eq!(parse_move(&state, "e2e5"), Err(ChessError::IllegalMove("e2e5".into())));
        assert_eq!(parse_move(&state, "e2"), Err(ChessError::InvalidMoveText("e2".into())));
        assert_eq!(parse_move(&state, "e7e8n"), Err(ChessError::InvalidMoveText("e7e8n".into())));
    }

    #[test]
    fn play_and_undo_round_trip() {
        let mut uci = protocol();
        uci.process_command("play e2e4");
        uci.process_command("undo");
        uci.process_command("undo");
        assert_eq!(uci.state(), &GameState::new_game());
        let out = output(uci);
        assert!(out.contains("played e2e4"));
        assert!(out.contains("undid e2e4"));
        assert!(out.contains("Nothing to undo"));
    }

    #[test]
    fn perft_and_eval_commands() {
        let mut uci = protocol();
        uci.process_command("perft 2");
        uci.process_command("eval");
        let out = output(uci);
        assert!(out.contains("Nodes: 400"));
        assert!(out.contains("info string eval 0 cp"));
    }

    #[test]
    fn go_reports_a_legal_bestmove_at_end_of_input() {
        let out = run("setoption name Threads value 2\nposition startpos moves e2e4\ngo depth 2\n");
        let line = out.lines().find(|l| l.starts_with("bestmove")).unwrap();
        let text = line.trim_start_matches("bestmove ");

        let mut state = GameState::new_game();
        state.make_move(parse_move(&state, "e2e4").unwrap());
        assert!(parse_move(&state, text).is_ok(), "{} is not legal", text);
    }

    #[test]
    fn stop_emits_a_fallback_move() {
        let mut uci = protocol();
        uci.process_command("go depth 8");
        assert!(uci.is_searching());
        uci.process_command("stop");
        assert!(!uci.is_searching());
        let out = output(uci);
        let line = out.lines().find(|l| l.starts_with("bestmove")).unwrap();
        assert!(parse_move(&GameState::new_game(), line.trim_start_matches("bestmove ")).is_ok());
    }

    #[test]
    fn undo_discards_a_running_search() {
        let mut uci = protocol();
        uci.process_command("play e2e4");
        uci.process_command("go depth 8");
        uci.process_command("undo");
        assert!(!uci.is_searching());
        assert!(!output(uci).contains("bestmove"));
    }

    #[test]
    fn go_without_legal_moves_answers_null_move() {
        let mut uci = protocol();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            uci.process_command(&format!("play {}", mv));
        }
        uci.process_command("go");
        assert!(!uci.is_searching());
        assert!(output(uci).contains("bestmove 0000"));
    }

    #[test]
    fn info_line_reports_the_depth_searched() {
        let out = run("go depth 2\n");
        assert!(out.contains("info depth 2 score cp "), "{}", out);
        assert!(!out.contains("info depth 3 "));

        let out = run("setoption name Depth value 1\ngo\n");
        assert!(out.contains("info depth 1 score cp "), "{}", out);
    }

    #[test]
    fn quit_stops_the_loop() {
        let out = run("isready\nquit\nisready\n");
        assert_eq!(out.matches("readyok").count(), 1);

        let mut uci = protocol();
        assert!(uci.is_running());
        uci.process_command("quit");
        assert!(!uci.is_running());
    }
}
