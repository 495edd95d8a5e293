// Plain-text rendering of command results. Every function is pure and returns
// the text to print.

use std::fmt::Write as _;

use anyhow::Context;
use serde::Serialize;

use pokedex_api::HeldItem;
use pokedex_app::{GymReport, SeedReport};
use pokedex_core::gym::GymLeader;
use pokedex_core::pokemon::{PokemonDetail, PokemonSummary};
use pokedex_core::roster::{Roster, RosterMember, TeamWeaknesses, MAX_ROSTER_SIZE};
use pokedex_core::types::{join_types, PokemonType};

const NONE: &str = "(none)";

fn type_list(types: &[PokemonType]) -> String {
    if types.is_empty() {
        NONE.to_string()
    } else {
        types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
    }
}

fn name_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        NONE.to_string()
    } else {
        names.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

pub fn listing(entries: &[PokemonSummary]) -> String {
    if entries.is_empty() {
        return "No creatures match.\n".to_string();
    }
    let mut out = String::new();
    for e in entries {
        let _ = writeln!(out, "#{:03}  {:<12} {}", e.number, e.name, join_types(&e.types));
    }
    out
}

#[derive(Serialize)]
struct ListingRow<'a> {
    id: u32,
    name: &'a str,
    types: String,
    image_url: &'a str,
}

/// Listing as CSV with a header row.
pub fn listing_csv(entries: &[PokemonSummary]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for e in entries {
        writer
            .serialize(ListingRow {
                id: e.id,
                name: &e.name,
                types: join_types(&e.types),
                image_url: &e.image_url,
            })
            .context("failed to write CSV row")?;
    }
    let bytes = writer.into_inner().context("failed to flush CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

pub fn detail(d: &PokemonDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{:03} {}  [{}]  {}", d.id, d.name, join_types(&d.types), d.rarity.as_str());
    let _ = writeln!(out, "{}", d.description);
    let _ = writeln!(out);

    let _ = writeln!(out, "Base stats:");
    for s in &d.stats {
        let _ = writeln!(out, "  {:<16} {:>3}", s.name, s.base_stat);
    }
    let _ = writeln!(out, "Abilities:   {}", name_list(d.abilities.iter().map(String::as_str)));
    let _ = writeln!(out);

    let rel = &d.damage_relations;
    let _ = writeln!(out, "Weak to:     {}", type_list(&rel.weaknesses));
    let _ = writeln!(out, "Resists:     {}", type_list(&rel.resistances));
    let _ = writeln!(out, "Immune to:   {}", type_list(&rel.immunities));
    let _ = writeln!(out);

    let chain: Vec<&str> = d.evolution_chain.iter().map(|s| s.name.as_str()).collect();
    if chain.len() > 1 {
        let _ = writeln!(out, "Evolution:   {}", chain.join(" -> "));
    } else {
        let _ = writeln!(out, "Evolution:   does not evolve");
    }

    if d.kanto_locations.is_empty() {
        let _ = writeln!(out, "Locations:   not found in the wild");
    } else {
        let _ = writeln!(out, "Locations:");
        for v in &d.kanto_locations {
            let _ = writeln!(out, "  {:<8} {}", v.version, v.locations.join(", "));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

pub fn member(m: &RosterMember) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{:03} {}  [{}]  Lv. {}", m.pokemon_id, m.name, join_types(&m.types), m.level);
    let _ = writeln!(out, "    ability: {}", m.ability);
    let _ = writeln!(out, "    item:    {}", m.held_item.as_deref().unwrap_or(NONE));
    let _ = writeln!(out, "    moves:   {}", name_list(m.moves.iter().map(String::as_str)));
    let stats: Vec<String> = m
        .calculated_stats()
        .iter()
        .map(|(name, value)| format!("{name} {value}"))
        .collect();
    let _ = writeln!(out, "    stats:   {}", stats.join(", "));
    out
}

pub fn roster(r: &Roster) -> String {
    if r.is_empty() {
        return "Your roster is empty. Add creatures with `pokedex team add <id>`.\n".to_string();
    }
    let mut out = format!("Roster ({}/{MAX_ROSTER_SIZE})\n", r.len());
    for (slot, m) in r.iter().enumerate() {
        let _ = write!(out, "{}. {}", slot + 1, member(m));
    }
    out
}

pub fn weaknesses(w: &TeamWeaknesses) -> String {
    if w.is_empty() {
        return "No weaknesses.\n".to_string();
    }
    let mut out = String::from("Team weaknesses (members hit super effectively):\n");
    for (t, count) in w.sorted() {
        let _ = writeln!(out, "  {:<10} {}", t.name(), count);
    }
    let shared = w.shared(2);
    if !shared.is_empty() {
        let _ = writeln!(out, "Shared by two or more: {}", type_list(&shared));
    }
    out
}

// ---------------------------------------------------------------------------
// Gyms
// ---------------------------------------------------------------------------

pub fn leaders(list: &[GymLeader]) -> String {
    let mut out = String::new();
    for l in list {
        let _ = writeln!(
            out,
            "{}. {:<10} {:<16} {:<9} ({})",
            l.order,
            l.name,
            l.city,
            l.specialty.name(),
            l.id
        );
    }
    out
}

pub fn gym_report(r: &GymReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} of {}, {} specialist (badge {})",
        r.leader.name,
        r.leader.city,
        r.leader.specialty.name(),
        r.leader.order
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Team:");
    for m in &r.team {
        let stats: Vec<String> = m.stats.iter().map(|(k, v)| format!("{k} {v}")).collect();
        let _ = writeln!(
            out,
            "  Lv. {:<3} {:<12} [{}]  {}",
            m.level,
            m.name,
            join_types(&m.types),
            stats.join(", ")
        );
    }
    let _ = writeln!(out);

    let weak: Vec<PokemonType> = r.matchup.leader_weaknesses.iter().copied().collect();
    let resist: Vec<PokemonType> = r.matchup.leader_resistances.iter().copied().collect();
    let _ = writeln!(out, "Leader weak to:    {}", type_list(&weak));
    let _ = writeln!(out, "Leader resists:    {}", type_list(&resist));
    let _ = writeln!(
        out,
        "Advantaged:        {}",
        name_list(r.matchup.advantaged.iter().map(|m| m.name.as_str()))
    );
    let _ = writeln!(
        out,
        "Disadvantaged:     {}",
        name_list(r.matchup.disadvantaged.iter().map(|m| m.name.as_str()))
    );
    out
}

// ---------------------------------------------------------------------------
// Items and maintenance
// ---------------------------------------------------------------------------

pub fn items(list: &[HeldItem]) -> String {
    if list.is_empty() {
        return "No items available.\n".to_string();
    }
    let mut out = String::new();
    for i in list {
        let _ = writeln!(out, "{:<24} {}", i.name, i.description);
    }
    out
}

pub fn seed_report(r: &SeedReport, total_cached: usize) -> String {
    let mut out = format!(
        "Cached {}, skipped {} already complete, {} failed. {} records in cache.\n",
        r.cached,
        r.skipped,
        r.failed.len(),
        total_cached
    );
    if !r.failed.is_empty() {
        let ids: Vec<String> = r.failed.iter().map(u32::to_string).collect();
        let _ = writeln!(out, "Failed ids: {}", ids.join(", "));
    }
    out
}
