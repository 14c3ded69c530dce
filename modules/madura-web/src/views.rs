use madura_common::{
    extract_lote_number, format_batch_display, Indexed, Lote, Madurador,
};

use crate::forms::{LoteForm, MaduradorForm};

// --- View Models ---

/// Shared page chrome.
pub struct PageContext {
    pub status_label: String,
    pub api_base: String,
}

pub struct MaduradorCard {
    pub position: Option<usize>,
    pub id: String,
    pub litros: String,
    pub estado: String,
    pub notas: String,
    pub lote_label: String,
    pub lote_number: String,
}

pub struct LoteCard {
    pub position: Option<usize>,
    pub id: String,
    pub cerveza: String,
    pub estado: String,
    pub cantidad_litros: String,
    pub fecha_carga: String,
    pub fecha_vencimiento: String,
    pub notas: String,
}

/// One list section: either the (possibly filtered) cards or the load error.
pub enum Listing<T> {
    Loaded { cards: Vec<T>, total: usize },
    Failed(String),
}

pub struct LoteOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

pub struct MaduradorFormView {
    pub form: MaduradorForm,
    pub options: Vec<LoteOption>,
    pub error: Option<String>,
}

pub struct LoteFormView {
    pub form: LoteForm,
    pub error: Option<String>,
}

// --- Conversions ---

pub fn madurador_card(
    m: &Madurador,
    position: Option<usize>,
    cached_lotes: Option<&[Lote]>,
) -> MaduradorCard {
    MaduradorCard {
        position,
        id: m.id.clone(),
        litros: if m.litros.is_empty() {
            "--".to_string()
        } else {
            m.litros.clone()
        },
        estado: m.estado.clone(),
        notas: m.notas.clone(),
        lote_label: format_batch_display(&m.lote, cached_lotes),
        lote_number: extract_lote_number(&m.lote),
    }
}

pub fn lote_card(l: &Lote, position: Option<usize>) -> LoteCard {
    LoteCard {
        position,
        id: l.id.clone(),
        cerveza: l.cerveza.clone(),
        estado: l.estado.clone(),
        cantidad_litros: l.cantidad_litros.clone(),
        fecha_carga: l.fecha_carga.clone(),
        fecha_vencimiento: l.fecha_vencimiento.clone(),
        notas: l.notas.clone(),
    }
}

pub fn madurador_listing(
    hits: &[Indexed<&Madurador>],
    total: usize,
    cached_lotes: Option<&[Lote]>,
) -> Listing<MaduradorCard> {
    Listing::Loaded {
        cards: hits
            .iter()
            .map(|hit| madurador_card(hit.item, Some(hit.position), cached_lotes))
            .collect(),
        total,
    }
}

pub fn lote_listing(hits: &[Indexed<&Lote>], total: usize) -> Listing<LoteCard> {
    Listing::Loaded {
        cards: hits
            .iter()
            .map(|hit| lote_card(hit.item, Some(hit.position)))
            .collect(),
        total,
    }
}

/// Options for the batch picker. A selected id that is no longer in the list is
/// kept as its own option so editing does not silently change the batch.
pub fn lote_options(lotes: &[Lote], selected: &str) -> Vec<LoteOption> {
    let mut options: Vec<LoteOption> = lotes
        .iter()
        .enumerate()
        .map(|(i, l)| LoteOption {
            id: l.id.clone(),
            label: format!(
                "Batch #{} - {}",
                i + 1,
                if l.cerveza.is_empty() { "Batch" } else { l.cerveza.as_str() }
            ),
            selected: l.id == selected,
        })
        .collect();

    if !selected.is_empty() && !options.iter().any(|o| o.selected) {
        options.push(LoteOption {
            id: selected.to_string(),
            label: format!("Current batch ({selected})"),
            selected: true,
        });
    }
    options
}
