// Pure conversions from API payloads to domain records.

use std::collections::HashSet;

use pokedex_core::pokemon::{
    collapse_whitespace, id_from_resource_url, official_artwork_url, sprite_url, BaseStat,
    EvolutionStage, PokemonDetail, PokemonSummary, Rarity, VersionLocations, NO_DESCRIPTION,
};
use pokedex_core::type_chart::{TypeChart, TypeRelations};
use pokedex_core::types::PokemonType;
use tracing::warn;

use crate::dto::{
    ChainLink, EncounterEntry, EvolutionChainResponse, FlavorTextEntry, NamedResource,
    PokemonResponse, SpeciesResponse, TypeResponse, TypeSlot,
};

/// Types in slot order. Names the domain does not know are dropped.
pub fn types_from_slots(slots: &[TypeSlot]) -> Vec<PokemonType> {
    let mut ordered: Vec<&TypeSlot> = slots.iter().collect();
    ordered.sort_by_key(|s| s.slot);
    ordered
        .into_iter()
        .filter_map(|s| {
            let parsed = PokemonType::from_name(&s.kind.name);
            if parsed.is_none() {
                warn!(type_name = %s.kind.name, "ignoring unknown type");
            }
            parsed
        })
        .collect()
}

/// Listing entry for one row of `pokemon?limit=N`. `None` when the resource
/// URL carries no id.
pub fn summary_from_listing(entry: &NamedResource, types: Vec<PokemonType>) -> Option<PokemonSummary> {
    let id = id_from_resource_url(&entry.url)?;
    Some(PokemonSummary {
        id,
        number: id,
        name: entry.name.clone(),
        types,
        image_url: sprite_url(id),
    })
}

/// Walk the chain from its root, following the first branch at each split.
pub fn evolution_stages(chain: &ChainLink) -> Vec<EvolutionStage> {
    let mut stages = Vec::new();
    let mut current = Some(chain);
    while let Some(link) = current {
        let id = id_from_resource_url(&link.species.url).unwrap_or(0);
        stages.push(EvolutionStage {
            id,
            name: link.species.name.clone(),
            image_url: official_artwork_url(id),
        });
        current = link.evolves_to.first();
    }
    stages
}

/// First English flavour text with runs of whitespace (including the form
/// feeds the API embeds) collapsed to single spaces.
pub fn english_flavor_text(entries: &[FlavorTextEntry]) -> String {
    entries
        .iter()
        .find(|e| e.language.name == "en")
        .map(|e| collapse_whitespace(&e.flavor_text))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

/// Encounter locations grouped per requested version, in the order the
/// versions are given. Versions without encounters are omitted.
pub fn version_locations(encounters: &[EncounterEntry], versions: &[String]) -> Vec<VersionLocations> {
    versions
        .iter()
        .filter_map(|version| {
            let mut seen = HashSet::new();
            let locations: Vec<String> = encounters
                .iter()
                .filter(|e| e.version_details.iter().any(|vd| &vd.version.name == version))
                .map(|e| e.location_area.name.replace('-', " "))
                .filter(|name| seen.insert(name.clone()))
                .collect();
            (!locations.is_empty()).then(|| VersionLocations {
                version: version.clone(),
                locations,
            })
        })
        .collect()
}

/// Official artwork, then the default front sprite, then the computed
/// artwork URL.
pub fn artwork_url(pokemon: &PokemonResponse) -> String {
    pokemon
        .sprites
        .other
        .official_artwork
        .as_ref()
        .and_then(|a| a.front_default.clone())
        .or_else(|| pokemon.sprites.front_default.clone())
        .unwrap_or_else(|| official_artwork_url(pokemon.id))
}

/// Assemble the full detail record. Damage relations come from `chart`.
pub fn to_detail(
    pokemon: &PokemonResponse,
    species: &SpeciesResponse,
    encounters: &[EncounterEntry],
    chain: Option<&EvolutionChainResponse>,
    chart: &TypeChart,
    versions: &[String],
) -> PokemonDetail {
    let types = types_from_slots(&pokemon.types);

    let mut abilities: Vec<_> = pokemon.abilities.iter().collect();
    abilities.sort_by_key(|a| a.slot);

    PokemonDetail {
        id: pokemon.id,
        name: pokemon.name.clone(),
        image_url: artwork_url(pokemon),
        abilities: abilities.into_iter().map(|a| a.ability.name.clone()).collect(),
        stats: pokemon
            .stats
            .iter()
            .map(|s| BaseStat {
                name: s.stat.name.clone(),
                base_stat: s.base_stat,
            })
            .collect(),
        description: english_flavor_text(&species.flavor_text_entries),
        evolution_chain: chain.map(|c| evolution_stages(&c.chain)).unwrap_or_default(),
        damage_relations: chart.damage_relations(&types),
        kanto_locations: version_locations(encounters, versions),
        rarity: Rarity::from_flags(species.is_legendary, species.is_mythical),
        types,
    }
}

pub fn type_relations(response: &TypeResponse) -> TypeRelations {
    let names = |list: &[NamedResource]| -> Vec<String> { list.iter().map(|r| r.name.clone()).collect() };
    TypeRelations {
        name: response.name.clone(),
        double_damage_from: names(&response.damage_relations.double_damage_from),
        half_damage_from: names(&response.damage_relations.half_damage_from),
        no_damage_from: names(&response.damage_relations.no_damage_from),
    }
}
