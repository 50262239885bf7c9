//! Headless runner implementation.
//!
//! Reads JSON commands line by line, drives a [`DispatchGame`], and writes
//! one or more JSON responses per command.

use std::io::{self, BufRead, Write};

use dispatch_core::config::EngineConfig;
use dispatch_core::difficulty::Difficulty;
use dispatch_core::events::GameEvent;
use dispatch_core::game::{CommandOutcome, DispatchGame};
use dispatch_core::grid::GridPos;
use dispatch_core::math::Fixed;
use dispatch_core::session::Phase;

use crate::protocol::{Command, Response};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output the full state after every command that changes it.
    pub auto_state_output: bool,
    /// Engine data to play with.
    pub engine: EngineConfig,
}

/// Headless runner for controller-driven sessions.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    game: DispatchGame,
}

impl HeadlessRunner {
    /// Create a new headless runner with default config.
    pub fn new() -> Self {
        Self::with_config(HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: HeadlessConfig) -> Self {
        let game = DispatchGame::new(config.engine.clone());
        Self { config, game }
    }

    /// The engine being driven.
    pub fn game(&self) -> &DispatchGame {
        &self.game
    }

    /// Up to `count` clock ticks, stopping once ticks no longer apply.
    fn repeat_clock(&mut self, count: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..count {
            if self.game.phase() != Phase::Active {
                break;
            }
            events.extend(self.game.tick_clock());
        }
        events
    }

    /// Up to `count` travel ticks, stopping once no unit is on the road.
    fn repeat_travel(&mut self, count: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..count {
            if self.game.phase() != Phase::Active || self.game.in_flight().is_none() {
                break;
            }
            events.extend(self.game.travel_tick());
        }
        events
    }

    /// Run the headless loop on stdin/stdout until `quit` or end of input.
    pub fn run(self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the headless loop over arbitrary streams.
    pub fn run_with<R: BufRead, W: Write>(mut self, reader: R, mut writer: W) -> io::Result<()> {
        write_response(&mut writer, &Response::ready(self.game.now_ms()))?;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let responses = match Command::from_json(line) {
                Ok(cmd) => self.handle(cmd),
                Err(e) => vec![Response::error(format!("Parse error: {e}"), None)],
            };

            let quit = responses.iter().any(|r| matches!(r, Response::Bye));
            for response in &responses {
                write_response(&mut writer, response)?;
            }
            if quit {
                return Ok(());
            }
        }

        tracing::info!("Input closed, shutting down");
        write_response(&mut writer, &Response::Bye)
    }

    /// Process one command and return the responses, in output order.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        tracing::debug!(cmd = name, "Processing command");

        let mut responses = match cmd {
            Command::AnswerCall => {
                let outcome = self.game.answer_call();
                self.outcome(name, outcome)
            }
            Command::Start { difficulty } => match difficulty.parse::<Difficulty>() {
                Ok(difficulty) => {
                    let outcome = self.game.start_game(difficulty);
                    self.outcome(name, outcome)
                }
                Err(e) => return vec![Response::error(e.to_string(), Some(name))],
            },
            Command::Dispatch { x, y, label } => match parse_destination(x, y, label) {
                Ok(destination) => {
                    let outcome = self.game.begin_dispatch(destination);
                    self.outcome(name, outcome)
                }
                Err(message) => return vec![Response::error(message, Some(name))],
            },
            Command::Clock { count } => {
                let events = self.repeat_clock(count);
                self.events(events)
            }
            Command::Travel { count } => {
                let events = self.repeat_travel(count);
                self.events(events)
            }
            Command::Advance { fraction } => match Fixed::checked_from_num(fraction) {
                Some(delta) if fraction.is_finite() => {
                    let events = self.game.advance(delta);
                    self.events(events)
                }
                _ => {
                    return vec![Response::error(
                        format!("fraction {fraction} is not representable"),
                        Some(name),
                    )]
                }
            },
            Command::Wait { ms } => {
                let events = self.game.run_for(ms);
                self.events(events)
            }
            Command::Query => return vec![self.state()],
            Command::Debug => {
                let enabled = self.game.toggle_debug();
                return vec![Response::Debug {
                    enabled,
                    view: self.game.debug_view(),
                }];
            }
            Command::Reset => {
                let events = self.game.reset();
                let mut responses = vec![Response::ack(name, true, None)];
                responses.extend(self.events(events));
                responses
            }
            Command::Hash => {
                return vec![Response::Hash {
                    now_ms: self.game.now_ms(),
                    hash: self.game.state_hash(),
                }]
            }
            Command::Quit => {
                tracing::info!("Quit requested");
                return vec![Response::Bye];
            }
        };

        if self.config.auto_state_output {
            responses.push(self.state());
        }
        responses
    }

    fn outcome(&self, name: &str, outcome: CommandOutcome) -> Vec<Response> {
        match outcome {
            CommandOutcome::Applied { events } => {
                let mut responses = vec![Response::ack(name, true, None)];
                responses.extend(self.events(events));
                responses
            }
            CommandOutcome::Ignored { reason } => {
                vec![Response::ack(name, false, Some(reason.to_string()))]
            }
        }
    }

    fn events(&self, events: Vec<GameEvent>) -> Vec<Response> {
        if events.is_empty() {
            return Vec::new();
        }
        vec![Response::Events {
            now_ms: self.game.now_ms(),
            events,
        }]
    }

    fn state(&self) -> Response {
        Response::State {
            now_ms: self.game.now_ms(),
            hash: self.game.state_hash(),
            view: self.game.view(),
        }
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> io::Result<()> {
    writer.write_all(response.to_json_line().as_bytes())?;
    writer.flush()
}

/// Resolve a dispatch target from either coordinates or a map label.
fn parse_destination(
    x: Option<i32>,
    y: Option<i32>,
    label: Option<String>,
) -> Result<GridPos, String> {
    match (x, y, label) {
        (Some(x), Some(y), None) => Ok(GridPos::new(x, y)),
        (None, None, Some(label)) => label.parse::<GridPos>().map_err(|e| e.to_string()),
        _ => Err("dispatch needs either x and y or a label".to_string()),
    }
}
