// 🧬 Pokemon Entity - normalized record + the raw API shapes it is built from
//
// The API reports height in decimeters and weight in hectograms.
// The entity stores meters / kilograms: raw value / 10, nothing else.

use crate::error::{FetchError, ParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// IDENTIFIER
// ============================================================================

/// Identifier accepted by `GET /pokemon/{id}`: a dex number or a name slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PokemonId {
    Number(u32),
    Name(String),
}

impl From<u32> for PokemonId {
    fn from(n: u32) -> Self {
        PokemonId::Number(n)
    }
}

impl FromStr for PokemonId {
    type Err = FetchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidId(raw.to_string()));
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return match trimmed.parse::<u32>() {
                Ok(0) | Err(_) => Err(FetchError::InvalidId(raw.to_string())),
                Ok(n) => Ok(PokemonId::Number(n)),
            };
        }

        let slug = trimmed.to_lowercase();
        if slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            Ok(PokemonId::Name(slug))
        } else {
            Err(FetchError::InvalidId(raw.to_string()))
        }
    }
}

impl fmt::Display for PokemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PokemonId::Number(n) => write!(f, "{}", n),
            PokemonId::Name(name) => write!(f, "{}", name),
        }
    }
}

// ============================================================================
// RAW API SHAPES (GET /pokemon, GET /pokemon/{id})
// ============================================================================

/// `{ "name": .. }` reference used all over the API (its `url` is ignored)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NamedResource {
    pub name: String,
}

/// One row of `GET /pokemon?limit=N`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ListingEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawListing {
    pub results: Vec<ListingEntry>,
}

impl RawListing {
    pub fn from_json(body: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAbilitySlot {
    pub ability: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// Subset of the detail record that normalization reads.
/// Unknown fields are ignored; missing or mistyped known fields fail.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPokemon {
    pub id: u32,
    pub name: String,
    pub types: Vec<RawTypeSlot>,
    pub sprites: RawSprites,
    /// decimeters
    pub height: u32,
    /// hectograms
    pub weight: u32,
    pub abilities: Vec<RawAbilitySlot>,
}

// ============================================================================
// NORMALIZED ENTITY
// ============================================================================

/// Immutable snapshot of one Pokemon as displayed by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Category tags in source order
    pub types: Vec<String>,
    /// Front-default sprite URL
    pub image: Option<String>,
    /// Meters
    pub height: f64,
    /// Kilograms
    pub weight: f64,
    pub abilities: Vec<String>,
}

impl Pokemon {
    /// Normalize a raw detail record.
    pub fn from_raw(raw: RawPokemon) -> Result<Self, ParseError> {
        if raw.id == 0 {
            return Err(ParseError::InvalidField {
                field: "id",
                message: "must be positive".to_string(),
            });
        }
        if raw.name.trim().is_empty() {
            return Err(ParseError::InvalidField {
                field: "name",
                message: "must not be empty".to_string(),
            });
        }

        Ok(Pokemon {
            id: raw.id,
            name: raw.name,
            types: raw.types.into_iter().map(|slot| slot.kind.name).collect(),
            image: raw.sprites.front_default,
            height: f64::from(raw.height) / 10.0,
            weight: f64::from(raw.weight) / 10.0,
            abilities: raw
                .abilities
                .into_iter()
                .map(|slot| slot.ability.name)
                .collect(),
        })
    }

    /// Parse and normalize a `GET /pokemon/{id}` body
    pub fn from_json(body: &str) -> Result<Self, ParseError> {
        let raw: RawPokemon = serde_json::from_str(body)?;
        Self::from_raw(raw)
    }

    pub fn has_type(&self, tag: &str) -> bool {
        self.types.iter().any(|t| t == tag)
    }

    pub fn abilities_line(&self) -> String {
        self.abilities.join(", ")
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One fetched collection, in listing order
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub entries: Vec<Pokemon>,
    pub fetched_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(entries: Vec<Pokemon>) -> Self {
        CatalogSnapshot {
            entries,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
