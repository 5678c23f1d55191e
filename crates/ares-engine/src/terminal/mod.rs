//! Code-breaking terminals.
//!
//! A terminal shows a partly masked hex sequence and ten candidate codes.
//! The hacker picks codes until they hit the right one or run out of
//! attempts; virus codes cost double and deal ICE damage.

pub mod puzzle;

pub use puzzle::{ANSWER_COUNT, Answer, AnswerKind, PLACEHOLDER, PuzzleParams, TerminalPuzzle};

use std::collections::BTreeMap;

use ares_mechanics::Die;
use rand::rngs::StdRng;

use crate::actor::UserId;
use crate::error::{EngineError, EngineResult};
use crate::feed::{ChangeFeed, ChoiceReceiver};
use crate::markup::{Color, Markup};
use crate::panel::{MessageHandle, Panel, Responder};
use crate::settings::Settings;

const RNG_STREAM: u64 = 1;
const RULE_WIDTH: usize = 37;
const ROW_NOISE: &str = "<(=<(>$$,'};";

/// Outcome of one hack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HackReport {
    /// Kind of the picked answer.
    pub kind: AnswerKind,
    /// Attempts left afterwards.
    pub attempts_remaining: u32,
    /// Damage dealt to the hacker by a virus.
    pub ice_damage: Option<u32>,
    /// Whether the terminal is gone, opened or locked.
    pub closed: bool,
    /// Narration for the channel.
    pub message: String,
}

#[derive(Debug)]
struct Entry {
    puzzle: TerminalPuzzle,
    handle: MessageHandle,
}

/// All active terminals, keyed by name.
pub struct TerminalDeck {
    settings: Settings,
    terminals: BTreeMap<String, Entry>,
    feed: ChangeFeed,
    rng: StdRng,
}

impl TerminalDeck {
    /// An empty deck.
    pub fn new(settings: Settings) -> Self {
        let rng = settings.rng(RNG_STREAM);
        Self {
            settings,
            terminals: BTreeMap::new(),
            feed: ChangeFeed::new("terminals"),
            rng,
        }
    }

    /// Look up a terminal.
    pub fn get(&self, name: &str) -> Option<&TerminalPuzzle> {
        self.terminals.get(name).map(|e| &e.puzzle)
    }

    /// Sorted terminal names.
    pub fn names(&self) -> Vec<String> {
        self.terminals.keys().cloned().collect()
    }

    /// Subscribe to terminal name changes; the current names arrive at once.
    pub fn subscribe(&mut self) -> ChoiceReceiver {
        let names = self.names();
        self.feed.subscribe(names)
    }

    /// Generate a terminal and publish its panel.
    pub fn create(
        &mut self,
        out: &mut dyn Responder,
        name: &str,
        assigned: Option<UserId>,
        params: PuzzleParams,
    ) -> EngineResult<MessageHandle> {
        if self.terminals.contains_key(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        let puzzle = TerminalPuzzle::generate(assigned, params, &mut self.rng)?;
        let handle = out.send(&terminal_panel(&self.settings, name, &puzzle, None));
        tracing::info!(
            terminal = %name,
            difficulty = params.difficulty,
            unknowns = params.unknowns,
            viruses = params.viruses,
            attempts = params.attempts,
            "terminal created"
        );
        self.terminals
            .insert(name.to_string(), Entry { puzzle, handle });
        self.broadcast();
        Ok(handle)
    }

    /// Pick answer `index` on terminal `name`.
    pub fn hack(
        &mut self,
        out: &mut dyn Responder,
        caller: UserId,
        name: &str,
        index: usize,
    ) -> EngineResult<HackReport> {
        let entry = self
            .terminals
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTerminal(name.to_string()))?;
        entry.puzzle.check_hacker(caller)?;
        let kind = entry.puzzle.guess(index)?;
        let attempts_remaining = entry.puzzle.attempts_remaining();

        let ice_damage = (kind == AnswerKind::Virus).then(|| Die::D6.roll(&mut self.rng));
        let result = match kind {
            AnswerKind::Correct => Some(true),
            _ if attempts_remaining == 0 => Some(false),
            _ => None,
        };
        let panel = terminal_panel(&self.settings, name, &entry.puzzle, result);
        entry.handle = out.edit(entry.handle, &panel);

        let mut lines = vec![match ice_damage {
            Some(damage) => format!("ICE detected. You received {damage} damage."),
            None if kind == AnswerKind::Correct => "ACCESS_GRANTED!".to_string(),
            None => "ACCESS_DENIED!".to_string(),
        }];
        if result == Some(false) {
            lines.push("TERMINAL_LOCKED_DOWN".to_string());
        }
        let message = format!("**{}**", lines.join("\n"));

        tracing::info!(terminal = %name, ?kind, attempts_remaining, "terminal hacked");
        let closed = result.is_some();
        if closed {
            self.terminals.remove(name);
            self.broadcast();
        }
        Ok(HackReport {
            kind,
            attempts_remaining,
            ice_damage,
            closed,
            message,
        })
    }

    /// Unmask one digit of the sequence for one attempt.
    pub fn reveal(
        &mut self,
        out: &mut dyn Responder,
        caller: UserId,
        name: &str,
    ) -> EngineResult<String> {
        let entry = self
            .terminals
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTerminal(name.to_string()))?;
        entry.puzzle.check_hacker(caller)?;
        let position = entry.puzzle.reveal_one(&mut self.rng)?;
        let panel = terminal_panel(&self.settings, name, &entry.puzzle, None);
        entry.handle = out.edit(entry.handle, &panel);
        tracing::info!(
            terminal = %name,
            position,
            attempts_remaining = entry.puzzle.attempts_remaining(),
            "digit revealed"
        );
        Ok("Revealed one digit in SEQUENCER_".to_string())
    }

    /// Remove a terminal whatever its state, deleting its panel.
    pub fn terminate(&mut self, out: &mut dyn Responder, name: &str) -> EngineResult<String> {
        let entry = self
            .terminals
            .remove(name)
            .ok_or_else(|| EngineError::UnknownTerminal(name.to_string()))?;
        out.delete(entry.handle);
        tracing::info!(terminal = %name, "terminal terminated");
        self.broadcast();
        Ok(format!("Terminal {name} removed"))
    }

    fn broadcast(&mut self) {
        let names = self.names();
        self.feed.broadcast(names);
    }
}

/// `result` is `Some(true)` once opened, `Some(false)` once locked.
fn terminal_panel(
    settings: &Settings,
    name: &str,
    puzzle: &TerminalPuzzle,
    result: Option<bool>,
) -> Panel {
    let sequence = if result == Some(true) {
        Color::Green
    } else {
        Color::Red
    };
    let mut body = Markup::new();
    body.push("SEQUENCER_")
        .push_colored(puzzle.question(), sequence)
        .newline()
        .push(format!(
            "{} ATTEMPT(S) REMAINING:",
            puzzle.attempts_remaining()
        ))
        .newline()
        .push("-".repeat(RULE_WIDTH))
        .newline();
    for (index, answer) in puzzle.answers().iter().enumerate() {
        body.push(format!("0x00{index}  {ROW_NOISE}  {:0>16}", answer.value))
            .newline();
    }

    let image = match result {
        Some(true) => settings.images.terminal_success.clone(),
        Some(false) => settings.images.terminal_failure.clone(),
        None => None,
    };
    Panel::new()
        .with_title(format!("CODE BREACH\t\t{name}"))
        .with_description(body)
        .with_image(image)
}
