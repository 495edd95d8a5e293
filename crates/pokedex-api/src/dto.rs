// Wire shapes of the species API responses. Only the fields the mapper reads
// are declared; everything else in the payload is ignored.

use serde::Deserialize;

/// `{ name, url }` pair the API uses for every cross-reference.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceUrl {
    pub url: String,
}

// ---------------------------------------------------------------------------
// pokemon?limit=N
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PokemonListResponse {
    pub results: Vec<NamedResource>,
}

// ---------------------------------------------------------------------------
// pokemon/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PokemonResponse {
    pub id: u32,
    pub name: String,
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub sprites: Sprites,
}

#[derive(Debug, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub slot: u32,
}

#[derive(Debug, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Default, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork")]
    pub official_artwork: Option<FrontSprite>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FrontSprite {
    pub front_default: Option<String>,
}

// ---------------------------------------------------------------------------
// pokemon-species/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SpeciesResponse {
    pub id: u32,
    pub evolution_chain: Option<ResourceUrl>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    pub is_legendary: bool,
    #[serde(default)]
    pub is_mythical: bool,
}

#[derive(Debug, Deserialize)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
}

// ---------------------------------------------------------------------------
// pokemon/{id}/encounters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EncounterEntry {
    pub location_area: NamedResource,
    #[serde(default)]
    pub version_details: Vec<VersionEncounter>,
}

#[derive(Debug, Deserialize)]
pub struct VersionEncounter {
    pub version: NamedResource,
}

// ---------------------------------------------------------------------------
// evolution-chain/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EvolutionChainResponse {
    pub chain: ChainLink,
}

#[derive(Debug, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

// ---------------------------------------------------------------------------
// type/{name}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TypeResponse {
    pub name: String,
    pub damage_relations: TypeDamageRelations,
}

#[derive(Debug, Default, Deserialize)]
pub struct TypeDamageRelations {
    #[serde(default)]
    pub double_damage_from: Vec<NamedResource>,
    #[serde(default)]
    pub half_damage_from: Vec<NamedResource>,
    #[serde(default)]
    pub no_damage_from: Vec<NamedResource>,
}

// ---------------------------------------------------------------------------
// item-category/{name} and item/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ItemCategoryResponse {
    #[serde(default)]
    pub items: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub struct ItemResponse {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub flavor_text_entries: Vec<ItemFlavorText>,
    #[serde(default)]
    pub sprites: ItemSprites,
}

#[derive(Debug, Deserialize)]
pub struct ItemFlavorText {
    pub text: String,
    pub language: NamedResource,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemSprites {
    pub default: Option<String>,
}
