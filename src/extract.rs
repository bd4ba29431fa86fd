//! Field extraction from raw upstream JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::DexError;
use crate::view::{DamageRelations, SearchIndexEntry, Stat};

static TRAILING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)/?$").expect("trailing id pattern"));

/// Upstream links end in the numeric id: `.../pokemon-species/25/`.
pub fn id_from_link(url: &str) -> Option<u32> {
    TRAILING_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Fields of an entity (or alternate form) resource before display rules.
#[derive(Debug, Clone)]
pub struct PrimaryRecord {
    pub id: u32,
    pub name: String,
    pub image_url: Option<String>,
    pub types: Vec<String>,
    pub height: u32,
    pub weight: u32,
    pub stats: Vec<Stat>,
    pub abilities: Vec<String>,
    pub moves: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variety {
    pub name: String,
    pub url: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesRecord {
    pub genus: Option<String>,
    pub evolution_chain: Option<String>,
    pub varieties: Vec<Variety>,
    pub gender_rate: Option<i32>,
    pub egg_groups: Vec<String>,
    pub hatch_counter: Option<u32>,
}

pub fn primary_record(raw: &Value) -> Result<PrimaryRecord, DexError> {
    let id = raw
        .get("id")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| DexError::Malformed("entity without id".to_string()))?;
    let name = raw
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DexError::Malformed(format!("entity {id} without name")))?
        .to_string();

    let sprites = raw.get("sprites");
    let image_url = sprites
        .and_then(|v| v.get("other"))
        .and_then(|v| v.get("official-artwork"))
        .and_then(|v| v.get("front_default"))
        .and_then(|v| v.as_str())
        .or_else(|| {
            sprites
                .and_then(|v| v.get("front_default"))
                .and_then(|v| v.as_str())
        })
        .map(|v| v.to_string());

    let types = named_list(raw.get("types"), "type");
    let stats = raw
        .get("stats")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let name = item
                        .get("stat")
                        .and_then(|v| v.get("name"))
                        .and_then(|v| v.as_str())?;
                    let value = item.get("base_stat").and_then(|v| v.as_u64())?;
                    Some(Stat {
                        name: name.to_string(),
                        value: u32::try_from(value).unwrap_or(u32::MAX),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(PrimaryRecord {
        id,
        name,
        image_url,
        types,
        height: small_uint(raw.get("height")),
        weight: small_uint(raw.get("weight")),
        stats,
        abilities: named_list(raw.get("abilities"), "ability"),
        moves: named_list(raw.get("moves"), "move"),
    })
}

pub fn species_record(raw: &Value, language: &str) -> SpeciesRecord {
    let genus = raw
        .get("genera")
        .and_then(|v| v.as_array())
        .and_then(|items| {
            items.iter().find(|item| {
                item.get("language")
                    .and_then(|v| v.get("name"))
                    .and_then(|v| v.as_str())
                    == Some(language)
            })
        })
        .and_then(|item| item.get("genus"))
        .and_then(|v| v.as_str())
        .map(|v| v.to_string());

    let evolution_chain = raw
        .get("evolution_chain")
        .and_then(|v| v.get("url"))
        .and_then(|v| v.as_str())
        .map(|v| v.to_string());

    let varieties = raw
        .get("varieties")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let pokemon = item.get("pokemon")?;
                    Some(Variety {
                        name: pokemon.get("name").and_then(|v| v.as_str())?.to_string(),
                        url: pokemon
                            .get("url")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        is_default: item
                            .get("is_default")
                            .and_then(|v| v.as_bool())
                            .unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let egg_groups = raw
        .get("egg_groups")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
                .map(|name| name.to_string())
                .collect()
        })
        .unwrap_or_default();

    SpeciesRecord {
        genus,
        evolution_chain,
        varieties,
        gender_rate: raw
            .get("gender_rate")
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok()),
        egg_groups,
        hatch_counter: raw
            .get("hatch_counter")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok()),
    }
}

pub fn damage_relations(raw: &Value) -> Result<DamageRelations, DexError> {
    let relations = raw
        .get("damage_relations")
        .ok_or_else(|| DexError::Malformed("type without damage_relations".to_string()))?;
    let names = |field: &str| {
        relations
            .get(field)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default()
    };
    Ok(DamageRelations {
        double_damage_from: names("double_damage_from"),
        double_damage_to: names("double_damage_to"),
        half_damage_from: names("half_damage_from"),
        no_damage_from: names("no_damage_from"),
    })
}

/// Species names of a generation, in upstream order.
pub fn generation_members(raw: &Value) -> Result<Vec<String>, DexError> {
    let members = raw
        .get("pokemon_species")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DexError::Malformed("generation without pokemon_species".to_string()))?;
    Ok(members
        .iter()
        .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
        .map(|name| name.to_string())
        .collect())
}

pub fn species_index(raw: &Value) -> Result<Vec<SearchIndexEntry>, DexError> {
    let results = raw
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DexError::Malformed("species index without results".to_string()))?;
    Ok(results
        .iter()
        .filter_map(|item| {
            let name = item.get("name").and_then(|v| v.as_str())?;
            let id = item
                .get("url")
                .and_then(|v| v.as_str())
                .and_then(id_from_link)?;
            Some(SearchIndexEntry {
                name: name.to_string(),
                id,
            })
        })
        .collect())
}

/// `[{"<field>": {"name": ..}}, ..]` -> names in order.
fn named_list(value: Option<&Value>, field: &str) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get(field)
                        .and_then(|v| v.get("name"))
                        .and_then(|v| v.as_str())
                })
                .map(|name| name.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn small_uint(value: Option<&Value>) -> u32 {
    value
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default()
}
