//! Combat encounter roster.
//!
//! Moderators add targets, start the encounter, then resolve attacks and
//! heals against the roster. A status panel can be made "live" so that every
//! later mutation re-renders it in place. The roster is snapshotted through
//! a [`SnapshotStore`] and restored on the next start.

mod narration;
pub mod target;

pub use target::{Target, TargetCategory};

use std::collections::BTreeMap;

use ares_mechanics::{DamageSource, DamageType, resolve};
use rand::rngs::StdRng;

use crate::actor::{Actor, UserId};
use crate::error::{EngineError, EngineResult, check_range};
use crate::feed::{ChangeFeed, ChoiceReceiver};
use crate::panel::{MessageHandle, Panel, Responder};
use crate::settings::Settings;
use crate::store::{MemoryStore, SnapshotStore};

use narration::HitReport;

/// Key the roster snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "combat";

const RNG_STREAM: u64 = 0;

/// Arguments of an `add` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTarget {
    /// Unique roster name.
    pub name: String,
    /// Initial and maximum HP.
    pub max_hp: u32,
    /// Initial and maximum armor.
    pub max_armor: u32,
    /// Conceal numbers from players.
    pub hidden: bool,
    /// Fights on the players' side.
    pub friendly: bool,
}

impl NewTarget {
    /// A visible hostile target with no armor.
    pub fn new(name: impl Into<String>, max_hp: u32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            max_armor: 0,
            hidden: false,
            friendly: false,
        }
    }

    /// Give the target armor.
    pub fn with_armor(mut self, armor: u32) -> Self {
        self.max_armor = armor;
        self
    }

    /// Conceal the target's numbers.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Mark the target as friendly.
    pub fn friendly(mut self, friendly: bool) -> Self {
        self.friendly = friendly;
        self
    }
}

/// Arguments of an `attack` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attack {
    /// Roster name of the target.
    pub target: String,
    /// How the hit interacts with armor.
    pub damage_type: DamageType,
    /// Flat amount or dice count.
    pub source: DamageSource,
    /// Shown instead of the caller's mention.
    pub attacker: Option<String>,
    /// Knock out instead of kill when HP reaches 0.
    pub nonlethal: bool,
    /// Line quoted when the target goes down.
    pub catch_phrase: Option<String>,
}

impl Attack {
    /// An attack with no optional flavor.
    pub fn new(target: impl Into<String>, damage_type: DamageType, source: DamageSource) -> Self {
        Self {
            target: target.into(),
            damage_type,
            source,
            attacker: None,
            nonlethal: false,
            catch_phrase: None,
        }
    }

    /// Name the attacker.
    pub fn by(mut self, attacker: impl Into<String>) -> Self {
        self.attacker = Some(attacker.into());
        self
    }

    /// Make the attack nonlethal.
    pub fn nonlethal(mut self, nonlethal: bool) -> Self {
        self.nonlethal = nonlethal;
        self
    }

    /// Quote a line if the target goes down.
    pub fn with_catch_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.catch_phrase = Some(phrase.into());
        self
    }
}

/// Arguments of a `heal` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heal {
    /// Roster name of the target.
    pub target: String,
    /// HP to restore.
    pub amount: u32,
    /// Shown instead of the caller's mention.
    pub healer: Option<String>,
}

impl Heal {
    /// A heal with no healer name.
    pub fn new(target: impl Into<String>, amount: u32) -> Self {
        Self {
            target: target.into(),
            amount,
            healer: None,
        }
    }
}

/// Fields an `edit` command may change. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetEdit {
    /// New current and maximum HP.
    pub hp: Option<u32>,
    /// New current and maximum armor.
    pub armor: Option<u32>,
    /// New hidden flag.
    pub hidden: Option<bool>,
    /// New friendly flag.
    pub friendly: Option<bool>,
}

impl TargetEdit {
    /// Whether no field was given.
    pub fn is_empty(&self) -> bool {
        self.hp.is_none() && self.armor.is_none() && self.hidden.is_none() && self.friendly.is_none()
    }
}

/// A combat encounter and its roster.
pub struct CombatEncounter {
    settings: Settings,
    name: String,
    targets: BTreeMap<String, Target>,
    started: bool,
    banner: Option<String>,
    live_status: Option<MessageHandle>,
    feed: ChangeFeed,
    store: Box<dyn SnapshotStore>,
    rng: StdRng,
}

impl CombatEncounter {
    /// Create an empty encounter backed by an in-memory store.
    pub fn new(settings: Settings) -> Self {
        Self::with_store(settings, Box::new(MemoryStore::new()), BTreeMap::new())
    }

    /// Create an encounter, restoring the roster from `store`.
    ///
    /// A missing or unreadable snapshot yields an empty roster.
    pub fn restore(settings: Settings, store: Box<dyn SnapshotStore>) -> Self {
        let targets = match store.load(SNAPSHOT_KEY) {
            Ok(Some(blob)) => match toml::from_str::<BTreeMap<String, Target>>(&blob) {
                Ok(targets) => {
                    tracing::info!(targets = targets.len(), "restored previous combat");
                    targets
                        .into_iter()
                        .map(|(name, mut t)| {
                            t.current_hp = t.current_hp.min(t.max_hp);
                            t.current_armor = t.current_armor.min(t.max_armor);
                            (name, t)
                        })
                        .collect()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not read previous combat");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read previous combat");
                BTreeMap::new()
            }
        };
        Self::with_store(settings, store, targets)
    }

    fn with_store(
        settings: Settings,
        store: Box<dyn SnapshotStore>,
        targets: BTreeMap<String, Target>,
    ) -> Self {
        let rng = settings.rng(RNG_STREAM);
        Self {
            settings,
            name: String::new(),
            targets,
            started: false,
            banner: None,
            live_status: None,
            feed: ChangeFeed::new("combat"),
            store,
            rng,
        }
    }

    /// The table settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The encounter name given at start.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Banner image given at start.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Whether the encounter has started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The roster, sorted by name.
    pub fn targets(&self) -> &BTreeMap<String, Target> {
        &self.targets
    }

    /// Look up one target.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Sorted roster names.
    pub fn target_names(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    /// The live status message, if one was requested.
    pub fn live_status(&self) -> Option<MessageHandle> {
        self.live_status
    }

    /// Subscribe to roster name changes; the current names arrive at once.
    pub fn subscribe(&mut self) -> ChoiceReceiver {
        let names = self.target_names();
        self.feed.subscribe(names)
    }

    /// Add a target at full HP and armor.
    pub fn add(&mut self, out: &mut dyn Responder, new: NewTarget) -> EngineResult<String> {
        check_range("target_health", new.max_hp.into(), 1, self.settings.max_hp.into())?;
        check_range("target_armor", new.max_armor.into(), 0, self.settings.max_armor.into())?;
        if self.targets.contains_key(&new.name) {
            return Err(EngineError::DuplicateTarget(new.name));
        }

        let mut target = Target::new(new.max_hp, new.max_armor);
        target.is_hidden = new.hidden;
        target.is_friendly = new.friendly;
        let reply = format!("target added: {} {}", new.name, target.summary());
        tracing::info!(target = %new.name, hp = new.max_hp, armor = new.max_armor, "target added");
        self.targets.insert(new.name, target);

        self.broadcast();
        self.refresh_live(out);
        Ok(reply)
    }

    /// Resolve an attack and narrate it.
    pub fn attack(
        &mut self,
        out: &mut dyn Responder,
        caller: &Actor,
        attack: Attack,
    ) -> EngineResult<String> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }
        let before = self
            .targets
            .get(&attack.target)
            .ok_or_else(|| EngineError::UnknownTarget(attack.target.clone()))?;
        if before.is_down() {
            return Err(EngineError::TargetDown(attack.target));
        }
        match attack.source {
            DamageSource::Flat(amount) => {
                check_range("damage", amount.into(), 1, self.settings.max_damage.into())?
            }
            DamageSource::Dice(count) => {
                check_range("roll", count.into(), 1, self.settings.max_dice.into())?
            }
        }

        let raw = attack.source.roll(&mut self.rng);
        let resolution = resolve(raw.amount, attack.damage_type, before.current_armor);
        let mut after = before.clone();
        after.take_hit(&resolution);

        let attacker = attack.attacker.clone().unwrap_or_else(|| caller.mention());
        let reply = narration::attack_narration(
            &HitReport {
                attacker: &attacker,
                attack: &attack,
                raw: &raw,
                resolution: &resolution,
                after: &after,
            },
            &self.settings,
        );
        tracing::info!(
            target = %attack.target,
            damage_type = %attack.damage_type,
            raw = raw.amount,
            dealt = resolution.dealt(),
            hp = after.current_hp,
            armor = after.current_armor,
            "attack resolved"
        );
        self.targets.insert(attack.target, after);

        self.refresh_live(out);
        Ok(reply)
    }

    /// Restore HP to a target, never beyond its maximum.
    pub fn heal(&mut self, out: &mut dyn Responder, caller: &Actor, heal: Heal) -> EngineResult<String> {
        if !self.started {
            return Err(EngineError::NotStarted);
        }
        check_range("hp", heal.amount.into(), 1, self.settings.max_damage.into())?;
        let target = self
            .targets
            .get_mut(&heal.target)
            .ok_or_else(|| EngineError::UnknownTarget(heal.target.clone()))?;

        let healed = target.heal(heal.amount);
        let healer = heal.healer.clone().unwrap_or_else(|| caller.mention());
        let reply = narration::heal_narration(&healer, &heal.target, healed, target);
        tracing::info!(target = %heal.target, healed, hp = target.current_hp, "target healed");

        self.refresh_live(out);
        Ok(reply)
    }

    /// Change some fields of a target. Editing HP or armor resets both the
    /// current and maximum value.
    pub fn edit(&mut self, out: &mut dyn Responder, name: &str, edit: TargetEdit) -> EngineResult<String> {
        if edit.is_empty() {
            return Err(EngineError::NoFieldsGiven);
        }
        if let Some(hp) = edit.hp {
            check_range("target_health", hp.into(), 1, self.settings.max_hp.into())?;
        }
        if let Some(armor) = edit.armor {
            check_range("target_armor", armor.into(), 0, self.settings.max_armor.into())?;
        }
        let target = self
            .targets
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTarget(name.to_string()))?;

        if let Some(hp) = edit.hp {
            target.current_hp = hp;
            target.max_hp = hp;
        }
        if let Some(armor) = edit.armor {
            target.current_armor = armor;
            target.max_armor = armor;
        }
        if let Some(hidden) = edit.hidden {
            target.is_hidden = hidden;
        }
        if let Some(friendly) = edit.friendly {
            target.is_friendly = friendly;
        }
        let reply = format!("target modified: {name} {}", target.summary());
        tracing::info!(target = %name, "target edited");

        self.refresh_live(out);
        Ok(reply)
    }

    /// Drop a target from the roster.
    pub fn remove(&mut self, out: &mut dyn Responder, name: &str) -> EngineResult<String> {
        if self.targets.remove(name).is_none() {
            return Err(EngineError::NotFound(name.to_string()));
        }
        tracing::info!(target = %name, "target removed");
        self.broadcast();
        self.refresh_live(out);
        Ok(format!("target removed: {name}"))
    }

    /// Start the encounter. If the roster is not empty, a status panel is
    /// rendered right away.
    pub fn start(
        &mut self,
        out: &mut dyn Responder,
        name: &str,
        banner: Option<String>,
        pings: &[UserId],
    ) -> EngineResult<String> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }
        let length = i64::try_from(name.chars().count()).unwrap_or(i64::MAX);
        check_range("name", length, 3, 255)?;

        self.started = true;
        self.name = name.to_string();
        self.banner = banner;

        let mut reply = String::new();
        for user in pings {
            reply.push_str(&format!("{user} "));
        }
        if let Some(emoji) = &self.settings.emojis.combat_start {
            reply.push_str(&format!("{emoji} "));
        }
        reply.push_str("**COMBAT STARTED_**");
        tracing::info!(combat = %self.name, targets = self.targets.len(), "combat started");

        if !self.targets.is_empty() {
            out.send(&narration::status_panel(self));
        }
        Ok(reply)
    }

    /// End the encounter: clear everything and erase the snapshot.
    pub fn end(&mut self) -> String {
        self.targets.clear();
        self.name.clear();
        self.banner = None;
        self.started = false;
        self.live_status = None;
        if let Err(e) = self.store.erase(SNAPSHOT_KEY) {
            tracing::warn!(error = %e, "could not erase combat snapshot");
        }
        tracing::info!("combat ended");
        self.broadcast();
        "**COMBAT ENDED_**".to_string()
    }

    /// Render the roster. With `live`, later mutations re-render this same
    /// message until the encounter ends.
    pub fn status(&mut self, out: &mut dyn Responder, live: bool) -> EngineResult<MessageHandle> {
        if self.targets.is_empty() {
            return Err(EngineError::EmptyRoster);
        }
        let handle = out.send(&self.status_panel());
        if live {
            self.live_status = Some(handle);
        }
        Ok(handle)
    }

    /// The current roster panel.
    pub fn status_panel(&self) -> Panel {
        narration::status_panel(self)
    }

    /// Write the roster snapshot.
    pub fn save(&mut self) -> EngineResult<()> {
        let blob = toml::to_string(&self.targets)?;
        self.store.save(SNAPSHOT_KEY, &blob)?;
        tracing::info!(targets = self.targets.len(), "combat saved");
        Ok(())
    }

    fn broadcast(&mut self) {
        let names = self.target_names();
        self.feed.broadcast(names);
    }

    fn refresh_live(&mut self, out: &mut dyn Responder) {
        if let Some(handle) = self.live_status {
            let panel = narration::status_panel(self);
            self.live_status = Some(out.edit(handle, &panel));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Color;
    use crate::panel::{RecordingResponder, ResponderEvent};
    use proptest::prelude::*;

    fn gm() -> Actor {
        Actor::new(1, "GM")
    }

    fn encounter() -> CombatEncounter {
        CombatEncounter::new(Settings::default().with_seed(7))
    }

    fn started_with(targets: &[NewTarget]) -> (CombatEncounter, RecordingResponder) {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        for t in targets {
            combat.add(&mut out, t.clone()).unwrap();
        }
        combat.start(&mut out, "Ambush", None, &[]).unwrap();
        (combat, out)
    }

    #[test]
    fn goblin_takes_flat_melee_hit() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Goblin", 20)]);
        let reply = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Melee, DamageSource::Flat(10)),
            )
            .unwrap();
        assert_eq!(combat.target("Goblin").unwrap().current_hp, 10);
        assert!(reply.contains("delt **10** Melee damage"), "{reply}");
        assert!(reply.starts_with("<@1> "));
        assert!(reply.contains("to **Goblin** hp[10/20] remaining"));
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Goblin", 20)).unwrap();
        let err = combat.add(&mut out, NewTarget::new("Goblin", 5)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTarget(ref n) if n == "Goblin"));
        assert_eq!(combat.target("Goblin").unwrap().max_hp, 20);
    }

    #[test]
    fn add_validates_limits() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        assert!(matches!(
            combat.add(&mut out, NewTarget::new("Ogre", 0)),
            Err(EngineError::OutOfRange { field: "target_health", .. })
        ));
        assert!(matches!(
            combat.add(&mut out, NewTarget::new("Ogre", 101)),
            Err(EngineError::OutOfRange { .. })
        ));
        assert!(matches!(
            combat.add(&mut out, NewTarget::new("Ogre", 10).with_armor(21)),
            Err(EngineError::OutOfRange { field: "target_armor", .. })
        ));
        assert!(combat.targets().is_empty());
    }

    #[test]
    fn add_then_remove_restores_roster() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Goblin", 20)).unwrap();
        let before = combat.target_names();
        combat.add(&mut out, NewTarget::new("Orc", 30)).unwrap();
        combat.remove(&mut out, "Orc").unwrap();
        assert_eq!(combat.target_names(), before);
    }

    #[test]
    fn remove_missing_is_reported() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        assert!(matches!(
            combat.remove(&mut out, "Ghost"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn attack_and_heal_need_start() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Goblin", 20)).unwrap();
        assert!(matches!(
            combat.attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Melee, DamageSource::Flat(3))
            ),
            Err(EngineError::NotStarted)
        ));
        assert!(matches!(
            combat.heal(&mut out, &gm(), Heal::new("Goblin", 3)),
            Err(EngineError::NotStarted)
        ));
    }

    #[test]
    fn attack_unknown_and_down_targets() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Goblin", 5)]);
        assert!(matches!(
            combat.attack(
                &mut out,
                &gm(),
                Attack::new("Orc", DamageType::Melee, DamageSource::Flat(3))
            ),
            Err(EngineError::UnknownTarget(_))
        ));
        let reply = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Special, DamageSource::Flat(9)),
            )
            .unwrap();
        assert!(reply.contains("target flatlined"));
        assert!(matches!(
            combat.attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Special, DamageSource::Flat(9))
            ),
            Err(EngineError::TargetDown(_))
        ));
    }

    #[test]
    fn nonlethal_with_catch_phrase() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Guard", 5)]);
        let reply = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Guard", DamageType::Melee, DamageSource::Flat(5))
                    .by("Vex")
                    .nonlethal(true)
                    .with_catch_phrase("Sleep tight."),
            )
            .unwrap();
        assert!(reply.starts_with("Vex delt **5** Melee damage"));
        assert!(reply.contains("target knocked unconscious"));
        assert!(reply.ends_with("*\"Sleep tight.\"*"));
        assert!(!reply.contains("flatlined"));
    }

    #[test]
    fn blocked_and_neglected_narrations() {
        let (mut combat, mut out) =
            started_with(&[NewTarget::new("Mech", 40).with_armor(6)]);
        let blocked = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Mech", DamageType::Projectile, DamageSource::Flat(6)),
            )
            .unwrap();
        assert!(blocked.contains("blocked incoming **6** Projectile damage by the 6 ap"));
        let mech = combat.target("Mech").unwrap();
        assert_eq!(mech.current_hp, 40);
        assert_eq!(mech.current_armor, 5);

        let neglected = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Mech", DamageType::Projectile, DamageSource::Flat(2)),
            )
            .unwrap();
        assert!(neglected.contains("neglected incoming **2** Projectile damage by the 5 ap"));
        assert_eq!(combat.target("Mech").unwrap().current_armor, 5);
    }

    #[test]
    fn melee_reduction_is_narrated() {
        let (mut combat, mut out) =
            started_with(&[NewTarget::new("Knight", 30).with_armor(4)]);
        let reply = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Knight", DamageType::Melee, DamageSource::Flat(10)),
            )
            .unwrap();
        assert!(reply.contains("delt **8** Melee damage reduced by 2 armor"));
        assert!(reply.contains("hp[22/30] ap[3/4] remaining"));
    }

    #[test]
    fn dice_attack_shows_breakdown() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Goblin", 100)]);
        let reply = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Special, DamageSource::Dice(3)),
            )
            .unwrap();
        assert!(reply.contains("||("));
        assert!(reply.contains(")||"));
        assert!(combat.target("Goblin").unwrap().current_hp < 100);
    }

    #[test]
    fn critical_roll_is_narrated_with_bonus() {
        let mut combat = CombatEncounter::new(Settings::default().with_seed(14));
        let mut out = RecordingResponder::new();
        combat
            .add(&mut out, NewTarget::new("Knight", 100).with_armor(4))
            .unwrap();
        combat.start(&mut out, "Ambush", None, &[]).unwrap();
        let reply = combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Knight", DamageType::Melee, DamageSource::Dice(4)),
            )
            .unwrap();
        assert!(
            reply.starts_with(
                "<@1> delt critical ||(6+4+2+6)|| **21** Melee damage reduced by 2 armor"
            ),
            "{reply}"
        );
        assert_eq!(combat.target("Knight").unwrap().current_hp, 79);
    }

    #[test]
    fn attack_rejects_out_of_range_source() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Goblin", 20)]);
        assert!(matches!(
            combat.attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Melee, DamageSource::Dice(11))
            ),
            Err(EngineError::OutOfRange { field: "roll", .. })
        ));
        assert_eq!(combat.target("Goblin").unwrap().current_hp, 20);
    }

    #[test]
    fn heal_reports_actual_amount() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Ally", 20).friendly(true)]);
        combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Ally", DamageType::Special, DamageSource::Flat(4)),
            )
            .unwrap();
        let mut healer = Heal::new("Ally", 10);
        healer.healer = Some("Medic".to_string());
        let reply = combat.heal(&mut out, &gm(), healer).unwrap();
        assert_eq!(reply, "Medic healed 4 health of **Ally** hp[20/20] remaining");
    }

    #[test]
    fn edit_requires_a_field() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Goblin", 20)).unwrap();
        assert!(matches!(
            combat.edit(&mut out, "Goblin", TargetEdit::default()),
            Err(EngineError::NoFieldsGiven)
        ));
    }

    #[test]
    fn edit_resets_current_and_max() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Goblin", 20)]);
        combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Special, DamageSource::Flat(5)),
            )
            .unwrap();
        let edit = TargetEdit {
            hp: Some(40),
            hidden: Some(true),
            ..TargetEdit::default()
        };
        combat.edit(&mut out, "Goblin", edit).unwrap();
        let goblin = combat.target("Goblin").unwrap();
        assert_eq!(goblin.current_hp, 40);
        assert_eq!(goblin.max_hp, 40);
        assert!(goblin.is_hidden);
        assert!(matches!(
            combat.edit(
                &mut out,
                "Nobody",
                TargetEdit {
                    friendly: Some(true),
                    ..TargetEdit::default()
                }
            ),
            Err(EngineError::UnknownTarget(_))
        ));
    }

    #[test]
    fn start_only_once() {
        let (mut combat, mut out) = started_with(&[]);
        assert!(combat.is_started());
        assert!(matches!(
            combat.start(&mut out, "Again", None, &[]),
            Err(EngineError::AlreadyStarted)
        ));
        assert_eq!(combat.name(), "Ambush");
    }

    #[test]
    fn start_pings_and_renders_status() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        let reply = combat
            .start(&mut out, "Empty", None, &[UserId(9)])
            .unwrap();
        assert_eq!(reply, "<@9> **COMBAT STARTED_**");
        assert_eq!(out.sent_count(), 0);

        let mut combat = encounter();
        combat.add(&mut out, NewTarget::new("Goblin", 20)).unwrap();
        combat
            .start(&mut out, "Ambush", Some("map.png".to_string()), &[])
            .unwrap();
        assert_eq!(out.sent_count(), 1);
        let panel = out.last_panel().unwrap();
        assert_eq!(panel.author.as_deref(), Some("Ambush"));
        assert_eq!(panel.image.as_deref(), Some("map.png"));
    }

    #[test]
    fn status_panel_fields() {
        let settings = Settings::default().with_seed(1).with_boss_hp_level(50);
        let mut combat = CombatEncounter::new(settings);
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Boss", 60)).unwrap();
        combat
            .add(&mut out, NewTarget::new("Shade", 10).hidden(true))
            .unwrap();
        combat
            .add(&mut out, NewTarget::new("Ally", 12).friendly(true).with_armor(2))
            .unwrap();
        combat.status(&mut out, false).unwrap();
        let panel = out.last_panel().unwrap();
        let fields: Vec<(&str, String)> = panel
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.to_plain()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("Ally", "st [ONLINE_]\nhp [012/012]\nap [002/002]".to_string()),
                ("Boss", "st [ONLINE_]\nhp [060/060]\nap [000/000]".to_string()),
                ("Shade", "st [UNKNOWN]\nhp [???/???]\nap [???/???]".to_string()),
            ]
        );
        let boss_status = &panel.fields[1].value.spans()[1];
        assert_eq!(boss_status.color, Some(Color::Pink));
        let ally_status = &panel.fields[0].value.spans()[1];
        assert_eq!(ally_status.color, Some(Color::Blue));
    }

    #[test]
    fn status_of_empty_roster_fails() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        assert!(matches!(
            combat.status(&mut out, true),
            Err(EngineError::EmptyRoster)
        ));
        assert!(combat.live_status().is_none());
    }

    #[test]
    fn live_status_rerenders_in_place() {
        let (mut combat, mut out) = started_with(&[NewTarget::new("Goblin", 20)]);
        let handle = combat.status(&mut out, true).unwrap();
        let edits_before = out.edit_count();
        combat
            .attack(
                &mut out,
                &gm(),
                Attack::new("Goblin", DamageType::Special, DamageSource::Flat(20)),
            )
            .unwrap();
        assert_eq!(out.edit_count(), edits_before + 1);
        match out.events.last().unwrap() {
            ResponderEvent::Edited(h, panel) => {
                assert_eq!(*h, handle);
                assert_eq!(
                    panel.fields[0].value.to_plain(),
                    "st [OFFLINE]\nhp [000/020]\nap [000/000]"
                );
            }
            other => panic!("expected an edit, got {other:?}"),
        }

        combat.end();
        assert!(combat.live_status().is_none());
        let edits = out.edit_count();
        combat.add(&mut out, NewTarget::new("Orc", 10)).unwrap();
        assert_eq!(out.edit_count(), edits);
    }

    #[test]
    fn subscribers_see_roster_changes() {
        let mut combat = encounter();
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Orc", 10)).unwrap();
        let rx = combat.subscribe();
        assert_eq!(crate::feed::latest(&rx), Some(vec!["Orc".to_string()]));
        combat.add(&mut out, NewTarget::new("Goblin", 10)).unwrap();
        assert_eq!(
            crate::feed::latest(&rx),
            Some(vec!["Goblin".to_string(), "Orc".to_string()])
        );
        combat.end();
        assert_eq!(crate::feed::latest(&rx), Some(Vec::new()));
    }

    #[test]
    fn end_resets_and_erases_snapshot() {
        let store = MemoryStore::new();
        let mut combat = CombatEncounter::restore(Settings::default(), Box::new(store));
        let mut out = RecordingResponder::new();
        combat.add(&mut out, NewTarget::new("Goblin", 20)).unwrap();
        combat.start(&mut out, "Ambush", None, &[]).unwrap();
        combat.save().unwrap();
        assert!(combat.store.load(SNAPSHOT_KEY).unwrap().is_some());
        assert_eq!(combat.end(), "**COMBAT ENDED_**");
        assert!(!combat.is_started());
        assert!(combat.targets().is_empty());
        assert_eq!(combat.name(), "");
        assert!(combat.store.load(SNAPSHOT_KEY).unwrap().is_none());
        combat.start(&mut out, "Round two", None, &[]).unwrap();
    }

    #[test]
    fn snapshot_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = RecordingResponder::new();
        let mut combat = CombatEncounter::restore(
            Settings::default(),
            Box::new(crate::store::FileStore::new(dir.path())),
        );
        combat
            .add(&mut out, NewTarget::new("Big Ogre", 50).with_armor(3).hidden(true))
            .unwrap();
        combat.save().unwrap();

        let restored = CombatEncounter::restore(
            Settings::default(),
            Box::new(crate::store::FileStore::new(dir.path())),
        );
        let ogre = restored.target("Big Ogre").unwrap();
        assert_eq!(ogre.max_hp, 50);
        assert_eq!(ogre.current_armor, 3);
        assert!(ogre.is_hidden);
        assert!(!restored.is_started());
    }

    #[test]
    fn corrupt_snapshot_yields_empty_roster() {
        let store = MemoryStore::with_blob(SNAPSHOT_KEY, "not [valid toml");
        let combat = CombatEncounter::restore(Settings::default(), Box::new(store));
        assert!(combat.targets().is_empty());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn corrupt_snapshot_is_a_warning() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let store = MemoryStore::with_blob(SNAPSHOT_KEY, "not [valid toml");
            CombatEncounter::restore(Settings::default(), Box::new(store));
        });
        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("WARN"), "{text}");
        assert!(text.contains("could not read previous combat"), "{text}");
    }

    proptest! {
        #[test]
        fn hp_and_armor_stay_in_bounds(
            max_hp in 1u32..=100,
            armor in 0u32..=20,
            ops in prop::collection::vec((0u8..4, 1u32..=30), 1..40),
        ) {
            let (mut combat, mut out) =
                started_with(&[NewTarget::new("Dummy", max_hp).with_armor(armor)]);
            for (op, amount) in ops {
                let result = match op {
                    0 => combat.attack(&mut out, &gm(), Attack::new("Dummy", DamageType::Melee, DamageSource::Flat(amount))),
                    1 => combat.attack(&mut out, &gm(), Attack::new("Dummy", DamageType::Projectile, DamageSource::Dice(amount % 10 + 1))),
                    2 => combat.attack(&mut out, &gm(), Attack::new("Dummy", DamageType::Special, DamageSource::Flat(amount))),
                    _ => combat.heal(&mut out, &gm(), Heal::new("Dummy", amount)),
                };
                if let Err(e) = result {
                    prop_assert!(matches!(e, EngineError::TargetDown(_)));
                }
                let t = combat.target("Dummy").unwrap();
                prop_assert!(t.current_hp <= t.max_hp);
                prop_assert!(t.current_armor <= t.max_armor);
            }
        }
    }
}
