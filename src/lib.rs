use std::{
    error,
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub const PRIZE_OFFSET: i64 = 10_000_000_000_000;

const BUTTON_A_TOKENS: u128 = 3;
const BUTTON_B_TOKENS: u128 = 1;

#[derive(Debug)]
pub enum Error {
    NoButtonBLine(usize),
    NoPrize(usize),
    InvalidButtonText(String),
    InvalidPrizeText(String),
    UnexpectedButton { expect: char, found: char },
    PrizeOffsetOverflow(Position, i64),
    TotalOverflow,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoButtonBLine(line_ind) => write!(
                f,
                "Expect line {} for button B, but can't find one.",
                line_ind
            ),
            Error::NoPrize(line_ind) => {
                write!(f, "Expect line {} for prize, but can't find one.", line_ind)
            }
            Error::InvalidButtonText(s) => write!(f, "Invalid text({}) for button.", s),
            Error::InvalidPrizeText(s) => write!(f, "Invalid text({}) for prize.", s),
            Error::UnexpectedButton { expect, found } => {
                write!(f, "Expect button {}, but found button {}.", expect, found)
            }
            Error::PrizeOffsetOverflow(prize, offset) => write!(
                f,
                "Prize at ({}, {}) is out of range after moved by {}.",
                prize.x, prize.y, offset
            ),
            Error::TotalOverflow => write!(f, "Sum of tokens is out of range."),
        }
    }
}

impl error::Error for Error {}

#[derive(Debug, Parser)]
pub struct CLIArgs {
    pub input_path: PathBuf,
}

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub x: i64,
    pub y: i64,
}

impl Vector {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    fn widen(&self) -> (i128, i128) {
        (i128::from(self.x), i128::from(self.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    fn widen(&self) -> (i128, i128) {
        (i128::from(self.x), i128::from(self.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsolvable {
    Degenerate,
    NotIntegral,
    Negative,
    Overflow,
}

impl Display for Unsolvable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsolvable::Degenerate => write!(f, "Moves of button A and B are parallel."),
            Unsolvable::NotIntegral => write!(f, "Prize can't be reached by whole presses."),
            Unsolvable::Negative => write!(f, "Prize needs negative presses to reach."),
            Unsolvable::Overflow => write!(f, "Tokens for the prize are out of range."),
        }
    }
}

impl error::Error for Unsolvable {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    button_a_count: u128,
    button_b_count: u128,
    tokens_n: u128,
}

impl Solution {
    fn new(button_a_count: u128, button_b_count: u128) -> Result<Self, Unsolvable> {
        let tokens_n = button_a_count
            .checked_mul(BUTTON_A_TOKENS)
            .zip(button_b_count.checked_mul(BUTTON_B_TOKENS))
            .and_then(|(a_tokens, b_tokens)| a_tokens.checked_add(b_tokens))
            .ok_or(Unsolvable::Overflow)?;
        Ok(Self {
            button_a_count,
            button_b_count,
            tokens_n,
        })
    }

    pub fn button_a_count(&self) -> u128 {
        self.button_a_count
    }

    pub fn button_b_count(&self) -> u128 {
        self.button_b_count
    }

    pub fn tokens_n(&self) -> u128 {
        self.tokens_n
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClawMachine {
    button_a_move: Vector,
    button_b_move: Vector,
    prize: Position,
}

impl ClawMachine {
    pub fn new(button_a_move: Vector, button_b_move: Vector, prize: Position) -> Self {
        Self {
            button_a_move,
            button_b_move,
            prize,
        }
    }

    pub fn button_a_move(&self) -> Vector {
        self.button_a_move
    }

    pub fn button_b_move(&self) -> Vector {
        self.button_b_move
    }

    pub fn prize(&self) -> Position {
        self.prize
    }

    pub fn with_prize_offset(&self, offset: i64) -> Result<Self, Error> {
        let x = self.prize.x.checked_add(offset);
        let y = self.prize.y.checked_add(offset);
        match (x, y) {
            (Some(x), Some(y)) => Ok(Self::new(
                self.button_a_move,
                self.button_b_move,
                Position::new(x, y),
            )),
            _ => Err(Error::PrizeOffsetOverflow(self.prize, offset)),
        }
    }

    pub fn solve(&self) -> Result<Solution, Unsolvable> {
        let a = self.button_a_move.widen();
        let b = self.button_b_move.widen();
        let p = self.prize.widen();

        // Parallel moves leave no unique solution, otherwise the only one is the cheapest.
        let det = cross(a, b);
        if det == 0 {
            return Err(Unsolvable::Degenerate);
        }

        let b_count = exact_div(cross(a, p), det)?;
        let a_count = exact_div(cross(p, b), det)?;
        if a_count < 0 || b_count < 0 {
            return Err(Unsolvable::Negative);
        }

        Solution::new(a_count.unsigned_abs(), b_count.unsigned_abs())
    }

    pub fn min_tokens(&self) -> Option<u128> {
        match self.solve() {
            Ok(solution) => {
                debug!(machine = ?self, ?solution, "won prize");
                Some(solution.tokens_n())
            }
            Err(Unsolvable::Degenerate) => {
                warn!(machine = ?self, "skip machine with parallel button moves");
                None
            }
            Err(reason) => {
                debug!(machine = ?self, %reason, "prize unreachable");
                None
            }
        }
    }
}

// Operands are widened i64, so the result stays within i128.
fn cross(l: (i128, i128), r: (i128, i128)) -> i128 {
    l.0 * r.1 - l.1 * r.0
}

fn exact_div(dividend: i128, divisor: i128) -> Result<i128, Unsolvable> {
    if dividend.checked_rem(divisor).ok_or(Unsolvable::Overflow)? != 0 {
        return Err(Unsolvable::NotIntegral);
    }

    dividend.checked_div(divisor).ok_or(Unsolvable::Overflow)
}

pub fn solve(button_a_move: Vector, button_b_move: Vector, prize: Position) -> Option<u128> {
    ClawMachine::new(button_a_move, button_b_move, prize).min_tokens()
}

pub fn total_min_tokens<'a, I>(machines: I) -> Result<u128, Error>
where
    I: IntoIterator<Item = &'a ClawMachine>,
{
    machines
        .into_iter()
        .filter_map(ClawMachine::min_tokens)
        .try_fold(0u128, |total, tokens| {
            total.checked_add(tokens).ok_or(Error::TotalOverflow)
        })
}

pub fn read_machines<P: AsRef<Path>>(path: P) -> Result<Vec<ClawMachine>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open given file({}).", path.as_ref().display()))?;
    parse_machines(BufReader::new(file)).with_context(|| {
        format!(
            "Failed to parse claw machines in given file({}).",
            path.as_ref().display()
        )
    })
}

pub fn parse_machines<R: BufRead>(reader: R) -> Result<Vec<ClawMachine>> {
    let mut machines = Vec::new();
    let mut lines = reader.lines().enumerate().map(|(ind, line)| {
        let line_ind = ind + 1;
        line.map(|text| (line_ind, text))
            .with_context(|| format!("Failed to read line {}.", line_ind))
    });

    while let Some(line) = lines.next() {
        let (button_a_ind, button_a_line) = line?;
        if button_a_line.trim().is_empty() {
            continue;
        }

        let button_a_move = read_button(&button_a_line, 'A')
            .with_context(|| format!("Invalid line {}.", button_a_ind))?;
        let (button_b_ind, button_b_line) =
            lines.next().ok_or(Error::NoButtonBLine(button_a_ind + 1))??;
        let button_b_move = read_button(&button_b_line, 'B')
            .with_context(|| format!("Invalid line {}.", button_b_ind))?;
        let (prize_ind, prize_line) = lines.next().ok_or(Error::NoPrize(button_b_ind + 1))??;
        let prize =
            read_prize(&prize_line).with_context(|| format!("Invalid line {}.", prize_ind))?;
        machines.push(ClawMachine::new(button_a_move, button_b_move, prize));
    }

    info!(count = machines.len(), "read claw machines");
    Ok(machines)
}

fn read_button(text: &str, expect: char) -> Result<Vector, Error> {
    static BUTTON_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^Button ([A-Z]): X([+-]\d+), Y([+-]\d+)$").expect("valid button pattern")
    });

    let text = text.trim();
    let caps = BUTTON_PATTERN
        .captures(text)
        .ok_or_else(|| Error::InvalidButtonText(text.to_string()))?;
    let found = caps[1].chars().next().unwrap_or_default();
    if found != expect {
        return Err(Error::UnexpectedButton { expect, found });
    }

    match (caps[2].parse::<i64>(), caps[3].parse::<i64>()) {
        (Ok(x), Ok(y)) => Ok(Vector::new(x, y)),
        _ => Err(Error::InvalidButtonText(text.to_string())),
    }
}

fn read_prize(text: &str) -> Result<Position, Error> {
    static PRIZE_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^Prize: X=([+-]?\d+), Y=([+-]?\d+)$").expect("valid prize pattern")
    });

    let text = text.trim();
    let caps = PRIZE_PATTERN
        .captures(text)
        .ok_or_else(|| Error::InvalidPrizeText(text.to_string()))?;
    match (caps[1].parse::<i64>(), caps[2].parse::<i64>()) {
        (Ok(x), Ok(y)) => Ok(Position::new(x, y)),
        _ => Err(Error::InvalidPrizeText(text.to_string())),
    }
}
