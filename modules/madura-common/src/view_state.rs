use chrono::{DateTime, Utc};

use crate::display::lote_position;
use crate::types::{Lote, Madurador};

/// The last successfully loaded collections of one backend. Each successful load
/// overwrites the matching list wholesale; nothing is merged.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub maduradores: Vec<Madurador>,
    pub lotes: Vec<Lote>,
    pub lotes_loaded_at: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn replace_maduradores(&mut self, maduradores: Vec<Madurador>) {
        self.maduradores = maduradores;
    }

    pub fn replace_lotes(&mut self, lotes: Vec<Lote>) {
        self.lotes = lotes;
        self.lotes_loaded_at = Some(Utc::now());
    }

    pub fn lote_position(&self, id: &str) -> Option<usize> {
        lote_position(&self.lotes, id)
    }

    /// Batches for label lookup; `None` until a batch load has succeeded.
    pub fn cached_lotes(&self) -> Option<&[Lote]> {
        self.lotes_loaded_at.map(|_| self.lotes.as_slice())
    }

    /// 1-based position of the fermenter with `id` in the last loaded list.
    pub fn madurador_position(&self, id: &str) -> Option<usize> {
        self.maduradores.iter().position(|m| m.id == id).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lote(id: &str) -> Lote {
        Lote {
            id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn cache_is_absent_until_first_load() {
        let mut state = ViewState::default();
        assert!(state.cached_lotes().is_none());
        state.replace_lotes(vec![]);
        assert_eq!(state.cached_lotes().map(|l| l.len()), Some(0));
    }

    #[test]
    fn replace_overwrites_previous_load() {
        let mut state = ViewState::default();
        state.replace_lotes(vec![lote("a"), lote("b")]);
        state.replace_lotes(vec![lote("c")]);
        assert_eq!(state.lotes.len(), 1);
        assert_eq!(state.lote_position("c"), Some(1));
        assert_eq!(state.lote_position("a"), None);
    }

    #[test]
    fn fermenter_positions_follow_last_load() {
        let mut state = ViewState::default();
        state.replace_maduradores(vec![
            Madurador {
                id: "m1".into(),
                ..Default::default()
            },
            Madurador {
                id: "m2".into(),
                ..Default::default()
            },
        ]);
        assert_eq!(state.madurador_position("m2"), Some(2));
        assert_eq!(state.madurador_position("m9"), None);
    }
}
