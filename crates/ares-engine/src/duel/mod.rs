//! Tug-of-war duels.
//!
//! A challenger takes on a named opponent. Each round both sides roll a d9
//! and add their bonus; the difference moves a shared 100-point bar. The
//! duel ends when the bar is fully on one side.

use std::collections::BTreeMap;

use ares_mechanics::Die;
use rand::rngs::StdRng;

use crate::actor::{Actor, UserId};
use crate::error::{EngineError, EngineResult, check_range};
use crate::feed::{ChangeFeed, ChoiceReceiver};
use crate::markup::{Color, Markup, Weight};
use crate::panel::{MessageHandle, Panel, Responder};
use crate::settings::Settings;

/// Score every duel starts at.
pub const START_SCORE: u32 = 50;

/// Score at which the challenger wins outright.
pub const MAX_SCORE: u32 = 100;

/// Largest bonus either side may add.
pub const MAX_BONUS: u32 = 100;

const RNG_STREAM: u64 = 2;
const MIN_NAME_WIDTH: usize = 9;

/// One active duel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duel {
    /// The only user who may roll.
    pub challenger: Actor,
    /// Label of the opposing side.
    pub opponent: String,
    /// Supplied bonus plus a hidden d10.
    pub opponent_bonus: u32,
    /// Challenger's share of the bar, 0 to 100.
    pub score: u32,
}

/// Result of one `duel` round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Challenger's d9.
    pub challenger_roll: u32,
    /// Opponent's d9.
    pub opponent_roll: u32,
    /// Challenger total minus opponent total.
    pub delta: i64,
    /// Score after the round.
    pub score: u32,
    /// Whether the bar reached either end.
    pub finished: bool,
    /// Narration for the channel.
    pub message: String,
}

#[derive(Debug)]
struct Entry {
    duel: Duel,
    handle: MessageHandle,
}

/// All active duels, keyed by opponent label.
pub struct DuelArena {
    settings: Settings,
    duels: BTreeMap<String, Entry>,
    feed: ChangeFeed,
    rng: StdRng,
}

impl DuelArena {
    /// An empty arena.
    pub fn new(settings: Settings) -> Self {
        let rng = settings.rng(RNG_STREAM);
        Self {
            settings,
            duels: BTreeMap::new(),
            feed: ChangeFeed::new("duels"),
            rng,
        }
    }

    /// Look up the duel against `opponent`.
    pub fn get(&self, opponent: &str) -> Option<&Duel> {
        self.duels.get(opponent).map(|e| &e.duel)
    }

    /// Sorted opponent labels.
    pub fn names(&self) -> Vec<String> {
        self.duels.keys().cloned().collect()
    }

    /// Subscribe to opponent label changes; the current labels arrive at once.
    pub fn subscribe(&mut self) -> ChoiceReceiver {
        let names = self.names();
        self.feed.subscribe(names)
    }

    /// Open a duel and publish its bar.
    pub fn versus(
        &mut self,
        out: &mut dyn Responder,
        challenger: Actor,
        opponent: &str,
        bonus: u32,
    ) -> EngineResult<MessageHandle> {
        if self.duels.contains_key(opponent) {
            return Err(EngineError::OpponentBusy(opponent.to_string()));
        }
        check_range("bonus", bonus.into(), 0, MAX_BONUS.into())?;

        let duel = Duel {
            challenger,
            opponent: opponent.to_string(),
            opponent_bonus: bonus + Die::D10.roll(&mut self.rng),
            score: START_SCORE,
        };
        let handle = out.send(&duel_panel(&self.settings, &duel));
        tracing::info!(
            opponent = %opponent,
            challenger = %duel.challenger.id,
            "duel opened"
        );
        self.duels
            .insert(opponent.to_string(), Entry { duel, handle });
        self.broadcast();
        Ok(handle)
    }

    /// Play one round against `opponent`.
    pub fn duel(
        &mut self,
        out: &mut dyn Responder,
        caller: UserId,
        opponent: &str,
        bonus: u32,
    ) -> EngineResult<RoundReport> {
        let entry = self
            .duels
            .get_mut(opponent)
            .ok_or_else(|| EngineError::UnknownDuel(opponent.to_string()))?;
        if entry.duel.challenger.id != caller {
            return Err(EngineError::WrongPlayer {
                opponent: opponent.to_string(),
                challenger: entry.duel.challenger.id,
            });
        }
        check_range("bonus", bonus.into(), 0, MAX_BONUS.into())?;

        let challenger_roll = Die::D9.roll(&mut self.rng);
        let opponent_roll = Die::D9.roll(&mut self.rng);
        let challenger_total = i64::from(challenger_roll + bonus);
        let opponent_total = i64::from(opponent_roll + entry.duel.opponent_bonus);
        let delta = challenger_total - opponent_total;

        let moved = (i64::from(entry.duel.score) + delta).clamp(0, i64::from(MAX_SCORE));
        entry.duel.score = u32::try_from(moved).unwrap_or(START_SCORE);
        entry.handle = out.edit(entry.handle, &duel_panel(&self.settings, &entry.duel));

        let mention = entry.duel.challenger.mention();
        let mut message = format!("{mention} rolled {challenger_roll}");
        if bonus > 0 {
            message.push_str(&format!(" (+{bonus})"));
        }
        message.push_str(&format!(" and {opponent} rolled {opponent_roll}\n"));
        message.push_str(&match delta {
            d if d > 0 => format!("{mention} won by {d} points"),
            d if d < 0 => format!("{opponent} won by {} points", -d),
            _ => "Draw".to_string(),
        });

        let score = entry.duel.score;
        let finished = score == 0 || score == MAX_SCORE;
        tracing::info!(opponent = %opponent, delta, score, finished, "duel round");
        if finished {
            self.duels.remove(opponent);
            self.broadcast();
        }
        Ok(RoundReport {
            challenger_roll,
            opponent_roll,
            delta,
            score,
            finished,
            message,
        })
    }

    /// Call off the duel against `opponent` and delete its bar.
    pub fn cancel(&mut self, out: &mut dyn Responder, opponent: &str) -> EngineResult<String> {
        let entry = self
            .duels
            .remove(opponent)
            .ok_or_else(|| EngineError::UnknownDuel(opponent.to_string()))?;
        out.delete(entry.handle);
        tracing::info!(opponent = %opponent, "duel cancelled");
        self.broadcast();
        Ok(format!("Duel with {opponent} cancelled"))
    }

    fn broadcast(&mut self) {
        let names = self.names();
        self.feed.broadcast(names);
    }
}

/// Segment counts of the bar: opponent share, then challenger share.
fn bar_split(score: u32, segments: usize) -> (usize, usize) {
    let score = score as usize;
    let max = MAX_SCORE as usize;
    let red = (max - score) * segments / max;
    let blue = (score * segments).div_ceil(max);
    (red, blue)
}

fn duel_panel(settings: &Settings, duel: &Duel) -> Panel {
    let challenger = &duel.challenger.name;
    let width = challenger
        .chars()
        .count()
        .max(duel.opponent.chars().count())
        .max(MIN_NAME_WIDTH);
    let segments = 2 * width - 8;
    let (red, blue) = bar_split(duel.score, segments);

    let mut body = Markup::new();
    body.push_styled(
        format!("{:>width$}", duel.opponent),
        Some(Color::Red),
        Weight::Bold,
    )
    .push_colored(" v", Color::Red)
    .push_colored("s ", Color::Blue)
    .push_styled(format!("{challenger:<width$}"), Some(Color::Blue), Weight::Bold)
    .newline()
    .push_colored(format!("{:03}%", MAX_SCORE - duel.score), Color::Red)
    .push_colored(" [", Color::Red)
    .push_colored("=".repeat(red), Color::Red)
    .push_colored("=".repeat(blue), Color::Blue)
    .push_colored("] ", Color::Blue)
    .push_colored(format!("{:03}%", duel.score), Color::Blue);

    Panel::new()
        .with_author("VERSUS", settings.icons.duel_embed.clone())
        .with_description(body)
}
