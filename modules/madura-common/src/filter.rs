use std::sync::LazyLock;

use regex::Regex;

use crate::display::{extract_lote_number, format_batch_display};
use crate::types::{Lote, Madurador};

/// A list item together with its 1-based position in the unfiltered list, so a
/// filtered card still shows the number it has in the full list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indexed<T> {
    pub position: usize,
    pub item: T,
}

// `#3`, `mad 3`, `madurador #3`
static MADURADOR_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:#|mad(?:urador)?\s*#?)\s*(\d+)$").unwrap());

// `#3`, `lote 3`, `batch #3`
static LOTE_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:#|(?:lote|batch)\s*#?)\s*(\d+)$").unwrap());

/// Case-insensitive search over fermenters. A position query selects exactly that
/// card whatever its contents; anything else is a substring match over every
/// displayed field, including the derived batch label.
pub fn filter_maduradores<'a>(
    query: &str,
    maduradores: &'a [Madurador],
    lotes: &[Lote],
) -> Vec<Indexed<&'a Madurador>> {
    filter_indexed(query, maduradores, &MADURADOR_POSITION, |m| {
        [
            m.id.clone(),
            m.litros.clone(),
            m.estado.clone(),
            m.notas.clone(),
            format_batch_display(&m.lote, Some(lotes)),
            extract_lote_number(&m.lote),
        ]
        .join("\n")
    })
}

/// Case-insensitive search over batches, with the same position shortcut.
pub fn filter_lotes<'a>(query: &str, lotes: &'a [Lote]) -> Vec<Indexed<&'a Lote>> {
    filter_indexed(query, lotes, &LOTE_POSITION, |l| {
        [
            l.id.as_str(),
            l.cerveza.as_str(),
            l.estado.as_str(),
            l.cantidad_litros.as_str(),
            l.fecha_carga.as_str(),
            l.fecha_vencimiento.as_str(),
            l.notas.as_str(),
        ]
        .join("\n")
    })
}

fn filter_indexed<'a, T, F>(
    query: &str,
    items: &'a [T],
    position_pattern: &Regex,
    haystack: F,
) -> Vec<Indexed<&'a T>>
where
    F: Fn(&T) -> String,
{
    let needle = query.trim().to_lowercase();
    let indexed = items.iter().enumerate().map(|(i, item)| Indexed {
        position: i + 1,
        item,
    });

    if needle.is_empty() {
        return indexed.collect();
    }

    if let Some(position) = position_query(position_pattern, &needle) {
        return indexed.filter(|entry| entry.position == position).collect();
    }

    indexed
        .filter(|entry| haystack(entry.item).to_lowercase().contains(&needle))
        .collect()
}

fn position_query(pattern: &Regex, needle: &str) -> Option<usize> {
    pattern
        .captures(needle)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
