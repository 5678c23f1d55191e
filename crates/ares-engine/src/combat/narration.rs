//! Text produced by combat commands: attack narrations and the status panel.

use ares_mechanics::{HitOutcome, RawDamage, Resolution};

use crate::markup::{Color, Markup};
use crate::panel::Panel;
use crate::settings::Settings;

use super::target::{HIDDEN_STAT, Target, stat};
use super::{Attack, CombatEncounter};

/// Everything needed to narrate one resolved attack.
pub(crate) struct HitReport<'a> {
    pub attacker: &'a str,
    pub attack: &'a Attack,
    pub raw: &'a RawDamage,
    pub resolution: &'a Resolution,
    pub after: &'a Target,
}

pub(crate) fn attack_narration(report: &HitReport<'_>, settings: &Settings) -> String {
    let HitReport {
        attacker,
        attack,
        raw,
        resolution,
        after,
    } = report;
    let outcome = resolution.outcome();

    let mut out = format!("{attacker} ");
    out.push_str(match outcome {
        HitOutcome::Dealt => "delt",
        HitOutcome::Blocked => "blocked incoming",
        HitOutcome::Neglected => "neglected incoming",
    });
    if raw.critical {
        out.push_str(" critical");
    }
    if let Some(roll) = &raw.roll {
        out.push_str(&format!(" ||({roll})||"));
    }

    match outcome {
        HitOutcome::Dealt => {
            out.push_str(&format!(
                " **{}** {} damage",
                resolution.dealt(),
                attack.damage_type
            ));
            if resolution.mitigation > 0 {
                out.push_str(&format!(
                    " reduced by {} armor",
                    resolution.mitigation
                ));
            }
            out.push_str(&format!(" to **{}** ", attack.target));
            if after.is_down() {
                if attack.nonlethal {
                    out.push_str("target knocked unconscious");
                } else {
                    out.push_str("target flatlined");
                }
                push_emoji(&mut out, settings.emojis.kill.as_deref());
                if let Some(phrase) = &attack.catch_phrase {
                    out.push_str(&format!("\n*\"{phrase}\"*"));
                }
            } else {
                out.push_str(&after.hp_text());
                if after.current_armor != 0 || after.is_hidden {
                    out.push(' ');
                    out.push_str(&after.ap_text());
                }
                out.push_str(" remaining");
                push_emoji(&mut out, settings.emojis.attack.as_deref());
            }
        }
        HitOutcome::Blocked => out.push_str(&format!(
            " **{}** {} damage by the {} ap, the ap is reduced by 1",
            resolution.raw, attack.damage_type, resolution.armor_before
        )),
        HitOutcome::Neglected => out.push_str(&format!(
            " **{}** {} damage by the {} ap",
            resolution.raw, attack.damage_type, resolution.armor_before
        )),
    }
    out
}

pub(crate) fn heal_narration(healer: &str, name: &str, healed: u32, after: &Target) -> String {
    format!(
        "{healer} healed {healed} health of **{name}** {} remaining",
        after.hp_text()
    )
}

fn push_emoji(out: &mut String, emoji: Option<&str>) {
    if let Some(emoji) = emoji {
        out.push(' ');
        out.push_str(emoji);
    }
}

/// The roster panel: one field per target.
pub(crate) fn status_panel(encounter: &CombatEncounter) -> Panel {
    let settings = encounter.settings();
    let mut panel = Panel::new().with_author(encounter.name(), settings.embed_icon.clone());
    for (name, target) in encounter.targets() {
        panel = panel.with_field(name.clone(), target_block(target, settings));
    }
    panel.with_image(encounter.banner().map(str::to_string))
}

fn target_block(target: &Target, settings: &Settings) -> Markup {
    let alive = target.category(settings).color();
    let numbers = if target.is_down() { Color::Red } else { alive };

    let mut m = Markup::new();
    m.push("st [");
    if target.is_hidden {
        m.push_colored("UNKNOWN", Color::Yellow);
    } else if target.is_down() {
        m.push_colored("OFFLINE", Color::Red);
    } else {
        m.push_colored("ONLINE_", alive);
    }
    m.push("]\nhp [");
    push_fraction(&mut m, target, target.current_hp, target.max_hp, numbers);
    m.push("]\nap [");
    push_fraction(&mut m, target, target.current_armor, target.max_armor, numbers);
    m.push("]");
    m
}

fn push_fraction(m: &mut Markup, target: &Target, current: u32, max: u32, color: Color) {
    if target.is_hidden {
        m.push_colored(format!("{HIDDEN_STAT}/{HIDDEN_STAT}"), Color::Yellow);
    } else {
        m.push_colored(format!("{}/{}", stat(current), stat(max)), color);
    }
}
