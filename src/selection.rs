// 👆 Selection Coordinator - which entity (if any) the detail overlay shows

use crate::entity::PokemonId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Closed,
    Open(PokemonId),
}

impl Selection {
    /// `Closed → Open(id)` or `Open(x) → Open(id)`
    pub fn select(&mut self, id: PokemonId) {
        *self = Selection::Open(id);
    }

    pub fn close(&mut self) {
        *self = Selection::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Selection::Open(_))
    }

    pub fn selected(&self) -> Option<&PokemonId> {
        match self {
            Selection::Open(id) => Some(id),
            Selection::Closed => None,
        }
    }
}
