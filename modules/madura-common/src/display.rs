use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::literal::parse_literal;
use crate::types::{Lote, LoteRef, LoteRefFields};

/// Shown when a fermenter has no batch at all.
pub const MISSING_LOTE_LABEL: &str = "--";

/// Used when a batch reference carries neither `cerveza` nor `nombre`.
pub const DEFAULT_LOTE_NAME: &str = "Batch";

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Render any scalar the way a page would print it. Integral floats drop their
/// fraction (`5.0` prints as `5`), `null` is empty, containers become JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// 1-based position of the batch with `id` in `lotes`.
pub fn lote_position(lotes: &[Lote], id: &str) -> Option<usize> {
    lotes.iter().position(|l| l.id == id).map(|i| i + 1)
}

/// Human label for a fermenter's batch, e.g. `Batch #2 - IPA`.
///
/// The cached batch list wins over an embedded `valor` because positions in the
/// list are what the batch cards display.
pub fn format_batch_display(lote: &LoteRef, cached: Option<&[Lote]>) -> String {
    match lote {
        LoteRef::Missing => MISSING_LOTE_LABEL.to_string(),
        LoteRef::Text(text) => match parse_literal(text) {
            Ok(Value::Object(map)) => format_batch_display(&LoteRef::from_map(map), cached),
            _ => text.clone(),
        },
        LoteRef::ByValue(fields)
        | LoteRef::ByName(fields)
        | LoteRef::ById(fields)
        | LoteRef::Embedded(fields) => format_fields(fields, cached),
    }
}

fn format_fields(fields: &LoteRefFields, cached: Option<&[Lote]>) -> String {
    let name = fields.name().unwrap_or(DEFAULT_LOTE_NAME);

    let position = cached
        .zip(fields.id.as_deref())
        .and_then(|(lotes, id)| lote_position(lotes, id));
    if let Some(position) = position {
        return format!("Batch #{position} - {name}");
    }

    match &fields.valor {
        Some(valor) => format!("Batch #{valor} - {name}"),
        None => name.to_string(),
    }
}

/// Best-effort lot number for a batch reference. Never fails; unknown shapes
/// degrade to raw text.
pub fn extract_lote_number(lote: &LoteRef) -> String {
    match lote {
        LoteRef::Missing => String::new(),
        LoteRef::Text(text) => digits_or_whole(text),
        LoteRef::ByValue(fields) => fields.valor.clone().unwrap_or_default(),
        LoteRef::ByName(fields) => digits_or_whole(fields.nombre.as_deref().unwrap_or_default()),
        LoteRef::ById(fields) => digits_or_whole(fields.id.as_deref().unwrap_or_default()),
        LoteRef::Embedded(fields) => Value::Object(fields.raw.clone()).to_string(),
    }
}

fn digits_or_whole(text: &str) -> String {
    DIGITS
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lote(id: &str, cerveza: &str) -> Lote {
        Lote {
            id: id.into(),
            cerveza: cerveza.into(),
            ..Default::default()
        }
    }

    #[test]
    fn lote_number_by_shape() {
        assert_eq!(extract_lote_number(&LoteRef::from_value(&json!({"valor": 5}))), "5");
        assert_eq!(
            extract_lote_number(&LoteRef::from_value(&json!({"nombre": "lote_12"}))),
            "12"
        );
        assert_eq!(extract_lote_number(&LoteRef::from_value(&json!("abc7"))), "7");
        assert_eq!(extract_lote_number(&LoteRef::Missing), "");
    }

    #[test]
    fn lote_number_falls_back_to_whole_text() {
        assert_eq!(
            extract_lote_number(&LoteRef::from_value(&json!({"nombre": "sin numero"}))),
            "sin numero"
        );
        assert_eq!(extract_lote_number(&LoteRef::from_value(&json!("pale"))), "pale");
        assert_eq!(
            extract_lote_number(&LoteRef::from_value(&json!({"_id": "abcdef"}))),
            "abcdef"
        );
        assert_eq!(
            extract_lote_number(&LoteRef::from_value(&json!({"cerveza": "IPA"}))),
            r#"{"cerveza":"IPA"}"#
        );
    }

    #[test]
    fn float_valor_prints_like_an_integer() {
        assert_eq!(extract_lote_number(&LoteRef::from_value(&json!({"valor": 5.0}))), "5");
        assert_eq!(extract_lote_number(&LoteRef::from_value(&json!({"valor": 2.5}))), "2.5");
    }

    #[test]
    fn batch_display_uses_cached_position() {
        let cache = vec![lote("x", "Whatever")];
        let reference = LoteRef::from_value(&json!({"_id": "x", "cerveza": "IPA"}));
        assert_eq!(format_batch_display(&reference, Some(cache.as_slice())), "Batch #1 - IPA");
    }

    #[test]
    fn batch_display_prefers_cache_over_valor() {
        let cache = vec![lote("a", "Stout"), lote("b", "Lager")];
        let reference = LoteRef::from_value(&json!({"_id": "b", "valor": 9, "nombre": "Lager"}));
        assert_eq!(format_batch_display(&reference, Some(cache.as_slice())), "Batch #2 - Lager");
        assert_eq!(format_batch_display(&reference, None), "Batch #9 - Lager");
    }

    #[test]
    fn batch_display_without_position_is_the_name() {
        let reference = LoteRef::from_value(&json!({"_id": "zz", "cerveza": "Porter"}));
        assert_eq!(format_batch_display(&reference, Some(&[][..])), "Porter");
        let anonymous = LoteRef::from_value(&json!({"_id": "zz"}));
        assert_eq!(format_batch_display(&anonymous, None), DEFAULT_LOTE_NAME);
    }

    #[test]
    fn batch_display_parses_serialized_dicts() {
        let cache = vec![lote("p", "Pils")];
        let reference = LoteRef::Text("{'_id': 'p', 'cerveza': 'Pils'}".into());
        assert_eq!(format_batch_display(&reference, Some(cache.as_slice())), "Batch #1 - Pils");
    }

    #[test]
    fn batch_display_keeps_unparseable_text() {
        let reference = LoteRef::Text("lote {roto".into());
        assert_eq!(format_batch_display(&reference, None), "lote {roto");
        assert_eq!(format_batch_display(&LoteRef::Missing, None), MISSING_LOTE_LABEL);
    }

    #[test]
    fn display_value_scalars() {
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!(12)), "12");
        assert_eq!(display_value(&json!(-3.0)), "-3");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
    }
}
