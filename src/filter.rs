// 🔎 Filter Engine - name search + category tag over a fetched collection
//
// Pure: (collection, query, category) → ordered subsequence of the collection.

use crate::entity::Pokemon;
use crate::error::UnknownType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY VOCABULARY
// ============================================================================

/// The closed set of 18 category tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    /// Display order of the filter buttons
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Electric,
        PokemonType::Grass,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Electric => "electric",
            PokemonType::Grass => "grass",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        PokemonType::ALL
            .iter()
            .position(|t| t == self)
            .unwrap_or(0)
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PokemonType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PokemonType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

// ============================================================================
// FILTER STATE
// ============================================================================

/// Current search inputs. `Default` is the reset state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub category: Option<PokemonType>,
}

impl FilterState {
    pub fn new(query: impl Into<String>, category: Option<PokemonType>) -> Self {
        FilterState {
            query: query.into(),
            category,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.category.is_some()
    }

    /// Clicking the active tag clears it, any other tag replaces it
    pub fn toggle_category(&mut self, tag: PokemonType) {
        self.category = if self.category == Some(tag) {
            None
        } else {
            Some(tag)
        };
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.category = None;
    }

    pub fn matches(&self, pokemon: &Pokemon) -> bool {
        let name_ok = self.query.is_empty()
            || pokemon
                .name
                .to_lowercase()
                .contains(&self.query.to_lowercase());
        let type_ok = self
            .category
            .map_or(true, |tag| pokemon.has_type(tag.as_str()));

        name_ok && type_ok
    }

    pub fn apply<'a>(&self, collection: &'a [Pokemon]) -> Vec<&'a Pokemon> {
        collection.iter().filter(|p| self.matches(p)).collect()
    }

    /// Like `apply`, but yields positions into `collection`
    pub fn apply_indices(&self, collection: &[Pokemon]) -> Vec<usize> {
        collection
            .iter()
            .enumerate()
            .filter(|(_, p)| self.matches(p))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Shorthand for a one-off filter
pub fn filter<'a>(
    collection: &'a [Pokemon],
    query: &str,
    category: Option<PokemonType>,
) -> Vec<&'a Pokemon> {
    FilterState::new(query, category).apply(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mon(id: u32, name: &str, types: &[&str]) -> Pokemon {
        Pokemon {
            id,
            name: name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            image: None,
            height: 1.0,
            weight: 1.0,
            abilities: vec![],
        }
    }

    fn collection() -> Vec<Pokemon> {
        vec![
            mon(1, "bulbasaur", &["grass", "poison"]),
            mon(4, "charmander", &["fire"]),
            mon(6, "charizard", &["fire", "flying"]),
            mon(7, "squirtle", &["water"]),
            mon(25, "pikachu", &["electric"]),
            mon(43, "oddish", &["grass", "poison"]),
            mon(129, "magikarp", &["water"]),
        ]
    }

    fn ids(result: &[&Pokemon]) -> Vec<u32> {
        result.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let all = collection();
        let result = filter(&all, "", None);

        assert_eq!(result.len(), all.len());
        assert!(result.iter().zip(all.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_query_is_case_insensitive_substring() {
        let all = collection();

        assert_eq!(ids(&filter(&all, "CHAR", None)), vec![4, 6]);
        assert_eq!(ids(&filter(&all, "kar", None)), vec![129]);
        assert!(filter(&all, "mewtwo", None).is_empty());
    }

    #[test]
    fn test_narrowing_query_is_monotonic() {
        let all = collection();
        let queries = ["", "a", "ar", "char", "chari", "charizard"];

        for pair in queries.windows(2) {
            let wide = filter(&all, pair[0], None);
            let narrow = filter(&all, pair[1], None);

            // narrow ⊆ wide, in the same relative order
            let mut wide_iter = wide.iter();
            for p in &narrow {
                assert!(wide_iter.any(|w| w.id == p.id), "{:?} not in {:?}", pair[1], pair[0]);
            }
        }
    }

    #[test]
    fn test_category_results_all_carry_tag() {
        let all = collection();

        for tag in PokemonType::ALL {
            for p in filter(&all, "", Some(tag)) {
                assert!(p.has_type(tag.as_str()));
            }
        }
        assert_eq!(ids(&filter(&all, "", Some(PokemonType::Poison))), vec![1, 43]);
        assert!(filter(&all, "", Some(PokemonType::Dragon)).is_empty());
    }

    #[test]
    fn test_predicates_are_anded() {
        let all = collection();

        assert_eq!(ids(&filter(&all, "char", Some(PokemonType::Flying))), vec![6]);
        assert!(filter(&all, "pika", Some(PokemonType::Water)).is_empty());
    }

    #[test]
    fn test_reset_restores_original_order() {
        let all = collection();
        let mut state = FilterState::new("sh", Some(PokemonType::Grass));
        assert_eq!(ids(&state.apply(&all)), vec![43]);
        assert!(state.is_active());

        state.reset();

        assert_eq!(state, FilterState::default());
        assert_eq!(ids(&state.apply(&all)), vec![1, 4, 6, 7, 25, 43, 129]);
    }

    #[test]
    fn test_toggle_category() {
        let mut state = FilterState::default();

        state.toggle_category(PokemonType::Fire);
        assert_eq!(state.category, Some(PokemonType::Fire));

        state.toggle_category(PokemonType::Water);
        assert_eq!(state.category, Some(PokemonType::Water));

        state.toggle_category(PokemonType::Water);
        assert_eq!(state.category, None);
    }

    #[test]
    fn test_apply_indices_matches_apply() {
        let all = collection();
        let state = FilterState::new("", Some(PokemonType::Water));

        assert_eq!(state.apply_indices(&all), vec![3, 6]);
    }

    #[test]
    fn test_type_vocabulary() {
        assert_eq!(PokemonType::ALL.len(), 18);
        assert_eq!("Fire".parse::<PokemonType>().unwrap(), PokemonType::Fire);
        assert!("stellar".parse::<PokemonType>().is_err());
        assert_eq!(PokemonType::Fairy.index(), 17);
        for tag in PokemonType::ALL {
            assert_eq!(tag.as_str().parse::<PokemonType>().unwrap(), tag);
        }
    }
}
