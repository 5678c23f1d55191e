//! The command dispatcher: one typed command per input line.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use ares_engine::combat::TargetEdit;
use ares_engine::feed::latest;
use ares_engine::{
    Actor, Attack, ChoiceReceiver, CombatEncounter, DuelArena, EngineError, Heal, NewTarget,
    PuzzleParams, Responder, Settings, SnapshotStore, TerminalDeck, UserId,
};
use ares_mechanics::{DamageSource, DamageType};

/// A line of table input.
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: TableCommand,
}

#[derive(Subcommand)]
enum TableCommand {
    /// Manage the combat roster
    Combat {
        #[command(subcommand)]
        action: CombatAction,
    },

    /// Attack a target (give exactly one of --damage or --roll)
    Attack {
        /// Target name
        target: String,
        /// melee, projectile or special
        damage_type: DamageType,
        /// Flat damage
        #[arg(short, long)]
        damage: Option<u32>,
        /// Number of d6 to roll
        #[arg(short, long)]
        roll: Option<u32>,
        /// Name shown as the attacker
        #[arg(long)]
        by: Option<String>,
        /// Knock the target out instead of killing it
        #[arg(long)]
        nonlethal: bool,
        /// Line quoted when the target goes down
        #[arg(long)]
        phrase: Option<String>,
    },

    /// Heal a target
    Heal {
        /// Target name
        target: String,
        /// HP to restore
        amount: u32,
        /// Name shown as the healer
        #[arg(long)]
        by: Option<String>,
    },

    /// Show the combat status panel
    Status {
        /// Keep the panel updated after every change
        #[arg(long)]
        live: bool,
    },

    /// Create a hacking terminal
    Terminal {
        /// Terminal name
        name: String,
        /// Only this user id may hack it
        #[arg(long)]
        hacker: Option<u64>,
        /// Code length (2-16)
        #[arg(long, default_value = "8")]
        difficulty: u32,
        /// Masked digits
        #[arg(long, default_value = "4")]
        unknowns: u32,
        /// Near-miss virus codes (0-9)
        #[arg(long, default_value = "1")]
        viruses: u32,
        /// Attempt budget (1-9)
        #[arg(long, default_value = "2")]
        attempts: u32,
    },

    /// Pick an answer on a terminal
    Hack {
        /// Terminal name
        name: String,
        /// Answer slot (0-9)
        answer: usize,
    },

    /// Unmask one digit of a terminal for one attempt
    Reveal {
        /// Terminal name
        name: String,
    },

    /// Remove a terminal
    Terminate {
        /// Terminal name
        name: String,
    },

    /// Challenge an opponent to a duel
    Versus {
        /// Opponent label
        opponent: String,
        /// Bonus added to the opponent's rolls
        #[arg(short, long, default_value = "0")]
        bonus: u32,
    },

    /// Roll one duel round
    Duel {
        /// Opponent label
        opponent: String,
        /// Bonus added to your roll
        #[arg(short, long, default_value = "0")]
        bonus: u32,
    },

    /// Call off a duel
    Contra {
        /// Opponent label
        opponent: String,
    },

    /// Act as another user
    As {
        /// User id
        id: u64,
        /// Display name
        name: String,
    },

    /// List the names each command currently accepts
    Choices,

    /// Save and leave
    #[command(alias = "exit", alias = "q")]
    Quit,
}

#[derive(Subcommand)]
enum CombatAction {
    /// Add a target at full HP and armor
    Add {
        /// Unique name
        name: String,
        /// Maximum HP
        hp: u32,
        /// Maximum armor
        #[arg(short, long, default_value = "0")]
        armor: u32,
        /// Hide the numbers from players
        #[arg(long)]
        hidden: bool,
        /// Fights on the players' side
        #[arg(long)]
        friendly: bool,
    },

    /// Change some fields of a target
    Edit {
        /// Target name
        name: String,
        /// New HP (current and maximum)
        #[arg(long)]
        hp: Option<u32>,
        /// New armor (current and maximum)
        #[arg(long)]
        armor: Option<u32>,
        /// true or false
        #[arg(long)]
        hidden: Option<bool>,
        /// true or false
        #[arg(long)]
        friendly: Option<bool>,
    },

    /// Remove a target
    Remove {
        /// Target name
        name: String,
    },

    /// Start the encounter
    Start {
        /// Encounter name
        name: String,
        /// Banner image
        #[arg(long)]
        banner: Option<String>,
        /// User ids to ping
        #[arg(long)]
        ping: Vec<u64>,
    },

    /// End the encounter and forget the roster
    End,
}

/// What the loop should do after a line.
pub enum Outcome {
    /// Print this and keep going.
    Reply(String),
    /// Save and stop.
    Quit,
}

/// Latest names broadcast by each engine.
struct Choices {
    targets: (ChoiceReceiver, Vec<String>),
    terminals: (ChoiceReceiver, Vec<String>),
    duels: (ChoiceReceiver, Vec<String>),
}

impl Choices {
    fn render(&mut self) -> String {
        let mut out = Vec::new();
        for (label, (rx, names)) in [
            ("targets", &mut self.targets),
            ("terminals", &mut self.terminals),
            ("duels", &mut self.duels),
        ] {
            if let Some(update) = latest(rx) {
                *names = update;
            }
            let shown = if names.is_empty() {
                "-".to_string()
            } else {
                names.join(", ")
            };
            out.push(format!("{label}: {shown}"));
        }
        out.join("\n")
    }
}

/// The three engines, the console and the acting user.
pub struct Table<R> {
    combat: CombatEncounter,
    terminals: TerminalDeck,
    duels: DuelArena,
    choices: Choices,
    out: R,
    actor: Actor,
}

impl<R: Responder> Table<R> {
    pub fn new(settings: Settings, store: Box<dyn SnapshotStore>, out: R, actor: Actor) -> Self {
        let mut combat = CombatEncounter::restore(settings.clone(), store);
        let mut terminals = TerminalDeck::new(settings.clone());
        let mut duels = DuelArena::new(settings);
        let choices = Choices {
            targets: (combat.subscribe(), Vec::new()),
            terminals: (terminals.subscribe(), Vec::new()),
            duels: (duels.subscribe(), Vec::new()),
        };
        Self {
            combat,
            terminals,
            duels,
            choices,
            out,
            actor,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Persist the combat roster.
    pub fn save(&mut self) -> Result<(), String> {
        self.combat
            .save()
            .map_err(|e| format!("failed to save combat: {e}"))
    }

    /// Handle one input line.
    pub fn process(&mut self, input: &str) -> Result<Outcome, String> {
        let words = shlex::split(input).ok_or("unbalanced quotes")?;
        let line = match Line::try_parse_from(words) {
            Ok(line) => line,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp) => {
                return Ok(Outcome::Reply(e.render().to_string()));
            }
            Err(e) => return Err(e.render().to_string().trim_end().to_string()),
        };
        self.dispatch(line.command)
            .map_err(|e| {
                tracing::warn!(kind = %e.kind(), "command failed: {e}");
                e.to_string()
            })
    }

    fn dispatch(&mut self, command: TableCommand) -> Result<Outcome, EngineError> {
        let caller = self.actor.id;
        let reply = match command {
            TableCommand::Combat { action } => self.combat_action(action)?,
            TableCommand::Attack {
                target,
                damage_type,
                damage,
                roll,
                by,
                nonlethal,
                phrase,
            } => {
                let mut attack = Attack::new(
                    target,
                    damage_type,
                    DamageSource::from_options(damage, roll)?,
                )
                .nonlethal(nonlethal);
                attack.attacker = by;
                attack.catch_phrase = phrase;
                self.combat.attack(&mut self.out, &self.actor, attack)?
            }
            TableCommand::Heal { target, amount, by } => {
                let mut heal = Heal::new(target, amount);
                heal.healer = by;
                self.combat.heal(&mut self.out, &self.actor, heal)?
            }
            TableCommand::Status { live } => {
                self.combat.status(&mut self.out, live)?;
                String::new()
            }
            TableCommand::Terminal {
                name,
                hacker,
                difficulty,
                unknowns,
                viruses,
                attempts,
            } => {
                let params = PuzzleParams {
                    difficulty,
                    unknowns,
                    viruses,
                    attempts,
                };
                self.terminals
                    .create(&mut self.out, &name, hacker.map(UserId), params)?;
                String::new()
            }
            TableCommand::Hack { name, answer } => {
                self.terminals
                    .hack(&mut self.out, caller, &name, answer)?
                    .message
            }
            TableCommand::Reveal { name } => self.terminals.reveal(&mut self.out, caller, &name)?,
            TableCommand::Terminate { name } => self.terminals.terminate(&mut self.out, &name)?,
            TableCommand::Versus { opponent, bonus } => {
                self.duels
                    .versus(&mut self.out, self.actor.clone(), &opponent, bonus)?;
                String::new()
            }
            TableCommand::Duel { opponent, bonus } => {
                self.duels
                    .duel(&mut self.out, caller, &opponent, bonus)?
                    .message
            }
            TableCommand::Contra { opponent } => self.duels.cancel(&mut self.out, &opponent)?,
            TableCommand::As { id, name } => {
                self.actor = Actor::new(id, name);
                format!("acting as {} ({})", self.actor.name, self.actor.mention())
            }
            TableCommand::Choices => self.choices.render(),
            TableCommand::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Reply(reply))
    }

    fn combat_action(&mut self, action: CombatAction) -> Result<String, EngineError> {
        match action {
            CombatAction::Add {
                name,
                hp,
                armor,
                hidden,
                friendly,
            } => self.combat.add(
                &mut self.out,
                NewTarget::new(name, hp)
                    .with_armor(armor)
                    .hidden(hidden)
                    .friendly(friendly),
            ),
            CombatAction::Edit {
                name,
                hp,
                armor,
                hidden,
                friendly,
            } => self.combat.edit(
                &mut self.out,
                &name,
                TargetEdit {
                    hp,
                    armor,
                    hidden,
                    friendly,
                },
            ),
            CombatAction::Remove { name } => self.combat.remove(&mut self.out, &name),
            CombatAction::Start { name, banner, ping } => {
                let pings: Vec<UserId> = ping.into_iter().map(UserId).collect();
                self.combat.start(&mut self.out, &name, banner, &pings)
            }
            CombatAction::End => Ok(self.combat.end()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ares_engine::{MemoryStore, RecordingResponder};

    fn table() -> Table<RecordingResponder> {
        Table::new(
            Settings::default().with_seed(3),
            Box::new(MemoryStore::new()),
            RecordingResponder::new(),
            Actor::new(1, "GM"),
        )
    }

    fn reply(table: &mut Table<RecordingResponder>, line: &str) -> String {
        match table.process(line) {
            Ok(Outcome::Reply(text)) => text,
            Ok(Outcome::Quit) => panic!("unexpected quit"),
            Err(e) => panic!("{line}: {e}"),
        }
    }

    #[test]
    fn combat_round_trip() {
        let mut t = table();
        assert_eq!(
            reply(&mut t, "combat add Goblin 20 --armor 2"),
            "target added: Goblin hp[20/20] ap[2/2]"
        );
        assert_eq!(reply(&mut t, "combat start Ambush"), "**COMBAT STARTED_**");
        let hit = reply(&mut t, "attack Goblin special --damage 5 --by 'Big Sal'");
        assert!(hit.starts_with("Big Sal delt **5** Special damage"), "{hit}");
        assert_eq!(reply(&mut t, "combat end"), "**COMBAT ENDED_**");
    }

    #[test]
    fn damage_arguments_are_checked() {
        let mut t = table();
        reply(&mut t, "combat add Goblin 20");
        reply(&mut t, "combat start Ambush");
        let err = t.process("attack Goblin melee").err().unwrap();
        assert!(err.contains("damage"), "{err}");
        assert!(t.process("attack Goblin melee -d 3 -r 2").is_err());
        assert!(t.process("attack Goblin laser -d 3").is_err());
    }

    #[test]
    fn acting_identity_gates_terminals() {
        let mut t = table();
        reply(&mut t, "terminal Vault --hacker 5");
        let err = t.process("hack Vault 0").err().unwrap();
        assert_eq!(err, "expecting <@5>, and you are not them");
        assert_eq!(reply(&mut t, "as 5 Nix"), "acting as Nix (<@5>)");
        assert!(t.process("hack Vault 0").is_ok());
        assert_eq!(t.actor().id, UserId(5));
    }

    #[test]
    fn choices_follow_broadcasts() {
        let mut t = table();
        reply(&mut t, "combat add Orc 10");
        reply(&mut t, "terminal Vault");
        reply(&mut t, "versus Razor");
        assert_eq!(
            reply(&mut t, "choices"),
            "targets: Orc\nterminals: Vault\nduels: Razor"
        );
        reply(&mut t, "contra Razor");
        reply(&mut t, "terminate Vault");
        assert_eq!(
            reply(&mut t, "choices"),
            "targets: Orc\nterminals: -\nduels: -"
        );
    }

    #[test]
    fn quit_and_parse_errors() {
        let mut t = table();
        assert!(matches!(t.process("quit"), Ok(Outcome::Quit)));
        assert!(matches!(t.process("q"), Ok(Outcome::Quit)));
        assert_eq!(t.process("heal 'open").err().unwrap(), "unbalanced quotes");
        assert!(t.process("dance").is_err());
    }
}
