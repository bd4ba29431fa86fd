#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use dexproxy::cache::DexCache;
use dexproxy::config::ResolvedConfig;
use dexproxy::domain::{ResourceKind, ResourceRef};
use dexproxy::engine::Engine;
use dexproxy::error::DexError;
use dexproxy::upstream::UpstreamClient;

pub const API: &str = "https://pokeapi.co/api/v2";

/// In-memory upstream keyed by kind and the rendered target (id, name or
/// link). Unknown resources answer 404.
#[derive(Default)]
pub struct MockUpstream {
    resources: Mutex<HashMap<(ResourceKind, String), Value>>,
    fail_once: Mutex<HashSet<(ResourceKind, String)>>,
    calls: Mutex<Vec<(ResourceKind, String)>>,
}

impl MockUpstream {
    pub fn insert(&self, kind: ResourceKind, target: impl ToString, value: Value) {
        self.resources
            .lock()
            .unwrap()
            .insert((kind, target.to_string()), value);
    }

    pub fn fail_next(&self, kind: ResourceKind, target: impl ToString) {
        self.fail_once
            .lock()
            .unwrap()
            .insert((kind, target.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, kind: ResourceKind) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, target)| target.clone())
            .collect()
    }

    /// Registers an entity under both its id and its name.
    pub fn add_entity(&self, id: u32, name: &str, types: &[&str]) {
        let value = entity_json(id, name, types);
        self.insert(ResourceKind::Entity, id, value.clone());
        self.insert(ResourceKind::Entity, name, value);
    }

    pub fn add_species(&self, id: u32, name: &str, value: Value) {
        self.insert(ResourceKind::Species, id, value.clone());
        self.insert(ResourceKind::Species, name, value);
    }

    pub fn add_type(&self, name: &str, double_from: &[&str], half_from: &[&str]) {
        self.insert(
            ResourceKind::Type,
            name,
            json!({
                "name": name,
                "damage_relations": {
                    "double_damage_from": named(double_from),
                    "double_damage_to": [],
                    "half_damage_from": named(half_from),
                    "no_damage_from": [],
                }
            }),
        );
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn fetch(&self, kind: ResourceKind, target: &ResourceRef) -> Result<Value, DexError> {
        let key = (kind, target.to_string());
        self.calls.lock().unwrap().push(key.clone());
        if self.fail_once.lock().unwrap().remove(&key) {
            return Err(DexError::UpstreamStatus {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.resources
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| DexError::UpstreamStatus {
                status: 404,
                message: "Not Found".to_string(),
            })
    }
}

pub fn engine(upstream: Arc<MockUpstream>) -> Engine<Arc<MockUpstream>> {
    Engine::new(upstream, Arc::new(DexCache::new()), ResolvedConfig::default())
}

pub fn named(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|name| json!({"name": name})).collect())
}

pub fn artwork(id: u32) -> String {
    format!("https://img.test/artwork/{id}.png")
}

pub fn entity_json(id: u32, name: &str, types: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "height": 7,
        "weight": 69,
        "sprites": {
            "front_default": format!("https://img.test/front/{id}.png"),
            "other": {"official-artwork": {"front_default": artwork(id)}}
        },
        "types": types
            .iter()
            .enumerate()
            .map(|(slot, ty)| json!({"slot": slot + 1, "type": {"name": ty}}))
            .collect::<Vec<_>>(),
        "stats": [
            {"base_stat": 45, "stat": {"name": "hp"}},
            {"base_stat": 49, "stat": {"name": "attack"}}
        ],
        "abilities": [{"ability": {"name": "overgrow"}}, {"ability": {"name": "chlorophyll"}}],
        "moves": [{"move": {"name": "vine-whip"}}, {"move": {"name": "tackle"}}],
    })
}

pub fn species_json(id: u32, genus: &str, varieties: Value) -> Value {
    json!({
        "id": id,
        "genera": [{"genus": genus, "language": {"name": "en"}}],
        "evolution_chain": {"url": format!("{API}/evolution-chain/{id}/")},
        "varieties": varieties,
        "gender_rate": 1,
        "hatch_counter": 20,
        "egg_groups": named(&["monster", "plant"]),
    })
}

pub fn variety(name: &str, id: u32, is_default: bool) -> Value {
    json!({
        "is_default": is_default,
        "pokemon": {"name": name, "url": format!("{API}/pokemon/{id}/")}
    })
}

pub fn chain_link(name: &str, id: u32, details: Value, evolves_to: Vec<Value>) -> Value {
    json!({
        "species": {"name": name, "url": format!("{API}/pokemon-species/{id}/")},
        "evolution_details": details,
        "evolves_to": evolves_to,
    })
}

pub fn level_up(level: u32) -> Value {
    json!([{"trigger": {"name": "level-up"}, "min_level": level}])
}
