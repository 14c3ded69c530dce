//! Display and search contract tests.
//!
//! These pin down the behavior the front-end relies on when the backend's
//! payloads drift between shapes:
//! - Envelopes unwrap to a list or stay empty, never fail
//! - Batch labels and lot numbers degrade to raw text instead of erroring
//! - Position searches pick exactly one card regardless of its contents
//! - Python-literal bodies read the same as their JSON equivalent

use madura_common::*;
use serde_json::json;

fn madurador(id: &str, notas: &str) -> Madurador {
    Madurador {
        id: id.into(),
        litros: "100".into(),
        estado: "activo".into(),
        notas: notas.into(),
        lote: LoteRef::Missing,
    }
}

// =========================================================================
// Envelopes
// =========================================================================

#[test]
fn bare_list_passes_through() {
    let list = json!([{"_id": "a"}, {"_id": "b"}]);
    assert_eq!(extract_data_array(&list), list.as_array().unwrap().clone());
}

#[test]
fn data_field_is_unwrapped() {
    assert_eq!(
        extract_data_array(&json!({"data": [1, 2]})),
        vec![json!(1), json!(2)]
    );
}

#[test]
fn unrelated_object_yields_empty_list() {
    assert!(extract_data_array(&json!({"status": "ok", "count": 2})).is_empty());
}

// =========================================================================
// Labels
// =========================================================================

#[test]
fn lot_numbers_follow_field_priority() {
    let lot = |v| extract_lote_number(&LoteRef::from_value(&v));
    assert_eq!(lot(json!({"valor": 5})), "5");
    assert_eq!(lot(json!({"nombre": "lote_12"})), "12");
    assert_eq!(lot(json!("abc7")), "7");
    assert_eq!(lot(json!(null)), "");
}

#[test]
fn cached_batch_position_wins_for_label() {
    let cache = vec![Lote {
        id: "x".into(),
        ..Default::default()
    }];
    let reference = LoteRef::from_value(&json!({"_id": "x", "cerveza": "IPA"}));
    assert_eq!(
        format_batch_display(&reference, Some(cache.as_slice())),
        "Batch #1 - IPA"
    );
}

#[test]
fn stale_cache_falls_back_to_stored_value() {
    let reference = LoteRef::from_value(&json!({"_id": "gone", "cerveza": "Stout", "valor": 4}));
    assert_eq!(
        format_batch_display(&reference, Some(&[][..])),
        "Batch #4 - Stout"
    );
}

// =========================================================================
// Search
// =========================================================================

#[test]
fn position_query_selects_exactly_that_card() {
    let list = vec![
        madurador("m1", "mad 2"),
        madurador("m2", ""),
        madurador("m3", "mad 2 again"),
    ];
    let hits = filter_maduradores("mad 2", &list, &[]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].position, 2);
    assert_eq!(hits[0].item.id, "m2");
}

#[test]
fn substring_search_keeps_list_positions() {
    let list = vec![madurador("m1", "dry hop"), madurador("m2", "cold crash")];
    let hits = filter_maduradores("CRASH", &list, &[]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].position, 2);
}

// =========================================================================
// Python literals and placeholder ids
// =========================================================================

#[test]
fn python_literal_reads_like_json() {
    let value = parse_literal("{'a': None, 'b': True}").unwrap();
    assert_eq!(value, json!({"a": null, "b": true}));
}

#[test]
fn placeholder_ids_look_like_object_ids() {
    let id = placeholder_object_id();
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(is_object_id(&id));
}
