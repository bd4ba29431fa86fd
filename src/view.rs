use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Denormalized output of one entity aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub id: u32,
    pub name: String,
    pub image_url: Option<String>,
    pub types: Vec<String>,
    /// Decimetres, as upstream reports it.
    pub height: u32,
    /// Hectograms, as upstream reports it.
    pub weight: u32,
    pub stats: Vec<Stat>,
    pub abilities: Vec<String>,
    pub moves: Vec<String>,
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    pub matchups: Matchups,
    pub mega_evolutions: Vec<FormView>,
    pub regional_forms: Vec<FormView>,
    pub gender_rate: Option<i32>,
    pub egg_groups: Option<Vec<String>>,
    pub hatch_counter: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchups {
    pub weaknesses: BTreeSet<String>,
    pub strengths: BTreeSet<String>,
    pub resistances: BTreeSet<String>,
    pub immunities: BTreeSet<String>,
}

impl Matchups {
    pub fn merge(&mut self, relations: &DamageRelations) {
        self.weaknesses.extend(relations.double_damage_from.iter().cloned());
        self.strengths.extend(relations.double_damage_to.iter().cloned());
        self.resistances.extend(relations.half_damage_from.iter().cloned());
        self.immunities.extend(relations.no_damage_from.iter().cloned());
    }
}

impl<'a> FromIterator<&'a DamageRelations> for Matchups {
    fn from_iter<I: IntoIterator<Item = &'a DamageRelations>>(iter: I) -> Self {
        let mut matchups = Matchups::default();
        for relations in iter {
            matchups.merge(relations);
        }
        matchups
    }
}

/// Damage relations of a single type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRelations {
    pub double_damage_from: BTreeSet<String>,
    pub double_damage_to: BTreeSet<String>,
    pub half_damage_from: BTreeSet<String>,
    pub no_damage_from: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub name: String,
    pub raw_name: String,
    pub image_url: Option<String>,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionNode {
    pub id: u32,
    pub name: String,
    pub trigger: String,
    pub image_url: Option<String>,
    #[serde(rename = "evolves_to")]
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Number of nodes in the subtree rooted here.
    pub fn node_count(&self) -> usize {
        1 + self.evolves_to.iter().map(EvolutionNode::node_count).sum::<usize>()
    }

    pub fn evolves(&self) -> bool {
        !self.evolves_to.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexEntry {
    pub name: String,
    pub id: u32,
}

impl SearchIndexEntry {
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.id.to_string().contains(needle)
    }
}
