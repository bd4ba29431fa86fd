use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Entity,
    Species,
    Type,
    EvolutionChain,
    Generation,
    Form,
    SpeciesIndex,
}

impl ResourceKind {
    /// Collection segment of the upstream URL for this kind.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Entity | ResourceKind::Form => "pokemon",
            ResourceKind::Species | ResourceKind::SpeciesIndex => "pokemon-species",
            ResourceKind::Type => "type",
            ResourceKind::EvolutionChain => "evolution-chain",
            ResourceKind::Generation => "generation",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Entity => write!(f, "entity"),
            ResourceKind::Species => write!(f, "species"),
            ResourceKind::Type => write!(f, "type"),
            ResourceKind::EvolutionChain => write!(f, "evolution-chain"),
            ResourceKind::Generation => write!(f, "generation"),
            ResourceKind::Form => write!(f, "form"),
            ResourceKind::SpeciesIndex => write!(f, "species-index"),
        }
    }
}

/// Where an upstream resource lives: by numeric id, by name, or by a link
/// embedded in a parent resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Id(u32),
    Name(String),
    Link(String),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Id(id) => write!(f, "{id}"),
            ResourceRef::Name(name) => write!(f, "{name}"),
            ResourceRef::Link(url) => write!(f, "{url}"),
        }
    }
}

/// Normalized entity identifier: trimmed and lowercased name, or a positive
/// decimal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn from_id(id: u32) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn numeric_id(&self) -> Option<u32> {
        if self.0.chars().all(|ch| ch.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// Heuristic: upstream names alternate varieties `<base>-<marker>`, so a
    /// separator in the identifier means it is not a base form. Numeric ids
    /// always count as base forms.
    pub fn is_variant(&self) -> bool {
        self.0.contains('-')
    }

    pub fn to_resource_ref(&self) -> ResourceRef {
        match self.numeric_id() {
            Some(id) => ResourceRef::Id(id),
            None => ResourceRef::Name(self.0.clone()),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityKey {
    type Err = DexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let is_valid = !normalized.is_empty()
            && !normalized.contains(['/', '?', '#'])
            && !normalized.chars().any(char::is_whitespace)
            && !normalized.chars().all(|ch| ch == '0');
        if !is_valid {
            return Err(DexError::InvalidIdentifier(value.to_string()));
        }
        if normalized.chars().all(|ch| ch.is_ascii_digit()) {
            let id: u32 = normalized
                .parse()
                .map_err(|_| DexError::InvalidIdentifier(value.to_string()))?;
            return Ok(Self::from_id(id));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenerationNumber(u32);

impl GenerationNumber {
    pub fn new(value: u32) -> Result<Self, DexError> {
        if value == 0 {
            return Err(DexError::InvalidGeneration(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for GenerationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenerationNumber {
    type Err = DexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let number: u32 = value
            .trim()
            .parse()
            .map_err(|_| DexError::InvalidGeneration(value.to_string()))?;
        Self::new(number)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_entity_key_lowercases() {
        let key: EntityKey = "  Bulbasaur ".parse().unwrap();
        assert_eq!(key.as_str(), "bulbasaur");
        assert_eq!(key.numeric_id(), None);
        assert!(!key.is_variant());
    }

    #[test]
    fn parse_entity_key_numeric() {
        let key: EntityKey = "025".parse().unwrap();
        assert_eq!(key.as_str(), "25");
        assert_eq!(key.numeric_id(), Some(25));
        assert_eq!(key.to_resource_ref(), ResourceRef::Id(25));
    }

    #[test]
    fn parse_entity_key_invalid() {
        assert_matches!(
            "".parse::<EntityKey>(),
            Err(DexError::InvalidIdentifier(_))
        );
        assert_matches!(
            "0".parse::<EntityKey>(),
            Err(DexError::InvalidIdentifier(_))
        );
        assert_matches!(
            "mr mime".parse::<EntityKey>(),
            Err(DexError::InvalidIdentifier(_))
        );
        assert_matches!(
            "../type".parse::<EntityKey>(),
            Err(DexError::InvalidIdentifier(_))
        );
    }
}
