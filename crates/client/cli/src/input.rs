//! Line-oriented command input.
//!
//! Each stdin line is one command. Movement uses `w a s d` (upper case boosts)
//! or `m <dir>` for the magnet; the remaining verbs are spelled out.

use async_trait::async_trait;
use lasertank_core::{Direction, GameState, Item, LaserType, render_layout};
use lasertank_runtime::{InputProvider, PlayerCommand, Result, RuntimeError};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{0}` is not a direction (use n, e, s or w)")]
    BadDirection(String),

    #[error("`{verb}` needs an argument")]
    MissingArgument { verb: &'static str },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

const HELP: &str = "commands: w a s d (move), W A S D (boost), m <dir> (magnet), t <dir> (turn), \
f (fire), fire <missile|stunner|blue|disruptor>, bomb, heat, ice, u (undo), r (redo), q (quit)";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> std::result::Result<Option<PlayerCommand>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let command = match verb {
        "w" => PlayerCommand::Move { dx: 0, dy: -1 },
        "a" => PlayerCommand::Move { dx: -1, dy: 0 },
        "s" => PlayerCommand::Move { dx: 0, dy: 1 },
        "d" => PlayerCommand::Move { dx: 1, dy: 0 },
        "W" => PlayerCommand::Move { dx: 0, dy: -2 },
        "A" => PlayerCommand::Move { dx: -2, dy: 0 },
        "S" => PlayerCommand::Move { dx: 0, dy: 2 },
        "D" => PlayerCommand::Move { dx: 2, dy: 0 },
        "m" | "magnet" => {
            let (dx, dy) = direction_arg(argument, "magnet")?.delta();
            PlayerCommand::Move { dx: dx * 3, dy: dy * 3 }
        }
        "t" | "turn" => PlayerCommand::Turn(direction_arg(argument, "turn")?),
        "f" => PlayerCommand::Fire(LaserType::Green),
        "fire" => PlayerCommand::Fire(match argument {
            None | Some("green") => LaserType::Green,
            Some("missile") => LaserType::Missile,
            Some("stunner") => LaserType::Stunner,
            Some("blue") => LaserType::Blue,
            Some("disruptor") => LaserType::Disruptor,
            Some(other) => return Err(ParseError::UnknownCommand(format!("fire {other}"))),
        }),
        "bomb" => PlayerCommand::Range(Item::Bomb),
        "heat" => PlayerCommand::Range(Item::HeatBomb),
        "ice" => PlayerCommand::Range(Item::IceBomb),
        "u" | "undo" => PlayerCommand::Undo,
        "r" | "redo" => PlayerCommand::Redo,
        "q" | "quit" => PlayerCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(command))
}

/// Rejects undo or redo when the history has nothing to step over.
pub fn check_history(command: &PlayerCommand, state: &GameState) -> std::result::Result<(), ParseError> {
    match command {
        PlayerCommand::Undo if !state.history.can_undo() => Err(ParseError::NothingToUndo),
        PlayerCommand::Redo if !state.history.can_redo() => Err(ParseError::NothingToRedo),
        _ => Ok(()),
    }
}

fn direction_arg(argument: Option<&str>, verb: &'static str) -> std::result::Result<Direction, ParseError> {
    match argument.ok_or(ParseError::MissingArgument { verb })? {
        "n" | "north" => Ok(Direction::North),
        "e" | "east" => Ok(Direction::East),
        "s" | "south" => Ok(Direction::South),
        "w" | "west" => Ok(Direction::West),
        other => Err(ParseError::BadDirection(other.to_owned())),
    }
}

/// Reads commands from stdin, printing the board before each prompt.
pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
    show_board: bool,
}

impl StdinInput {
    pub fn new(show_board: bool) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            show_board,
        }
    }
}

#[async_trait]
impl InputProvider for StdinInput {
    async fn next_command(&mut self, state: &GameState) -> Result<Option<PlayerCommand>> {
        if self.show_board {
            println!(
                "{}moves {} shots {} | {}",
                render_layout(&state.arena),
                state.score.moves,
                state.score.shots,
                if state.status.dead {
                    "destroyed (u to undo)"
                } else if state.status.solved {
                    "solved"
                } else {
                    "ready"
                }
            );
        }
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .map_err(|err| RuntimeError::provider(err.to_string()))?
            else {
                return Ok(None);
            };
            match parse_command(&line) {
                Ok(Some(command)) => match check_history(&command, state) {
                    Ok(()) => return Ok(Some(command)),
                    Err(err) => eprintln!("{err}"),
                },
                Ok(None) => continue,
                Err(err) => {
                    eprintln!("{err}\n{HELP}");
                }
            }
        }
    }
}
