use chrono::NaiveDate;
use serde::Deserialize;

use madura_common::{
    display::lote_position, is_object_id, placeholder_object_id, Lote, LoteAttachment, LoteInput,
    Madurador, MaduraError, MaduradorInput, Result,
};

/// Submitted fermenter form. A non-empty `id` means edit, otherwise create.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaduradorForm {
    pub id: String,
    pub litros: String,
    pub estado: String,
    pub notas: String,
    /// Selected batch id; empty for "no batch".
    pub lote: String,
    /// Batch id the record referenced when the edit form was opened.
    pub lote_actual: String,
}

/// Submitted batch form, field names as the backend spells them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoteForm {
    pub id: String,
    pub cerveza: String,
    pub estado: String,
    #[serde(rename = "cantidadLitros")]
    pub cantidad_litros: String,
    #[serde(rename = "fechaCarga")]
    pub fecha_carga: String,
    #[serde(rename = "fechaVencimiento")]
    pub fecha_vencimiento: String,
    pub notas: String,
}

impl MaduradorForm {
    /// A blank add form with the first batch pre-selected.
    pub fn blank(lotes: &[Lote]) -> Self {
        Self {
            lote: lotes.first().map(|l| l.id.clone()).unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn from_record(m: &Madurador) -> Self {
        Self {
            id: m.id.clone(),
            litros: m.litros.clone(),
            estado: m.estado.clone(),
            notas: m.notas.clone(),
            lote: m.lote.id().unwrap_or_default().to_string(),
            lote_actual: m.lote.id().unwrap_or_default().to_string(),
        }
    }

    pub fn edit_id(&self) -> Option<&str> {
        Some(self.id.trim()).filter(|id| !id.is_empty())
    }

    pub fn current_lote(&self) -> Option<&str> {
        Some(self.lote_actual.trim()).filter(|id| !id.is_empty())
    }

    /// Input for a create call. Without a selected batch the reference still gets
    /// an ObjectId-shaped placeholder, since the backend converts `_id` blindly.
    pub fn to_create_input(&self, lotes: &[Lote]) -> Result<MaduradorInput> {
        let lote = self.attachment(lotes)?.unwrap_or_else(|| LoteAttachment {
            id: placeholder_object_id(),
            cerveza: None,
            valor: None,
        });
        Ok(MaduradorInput {
            lote: Some(lote),
            ..self.base_input()?
        })
    }

    /// Input for an update call. No selected batch leaves the stored one alone, and
    /// so does keeping a batch that is missing from the list: only the stored
    /// reference still knows its name and number.
    pub fn to_update_input(&self, lotes: &[Lote]) -> Result<MaduradorInput> {
        let selected = self.lote.trim();
        let kept_unlisted = self.current_lote() == Some(selected)
            && lote_position(lotes, selected).is_none();
        let lote = if kept_unlisted {
            None
        } else {
            self.attachment(lotes)?
        };
        Ok(MaduradorInput {
            lote,
            ..self.base_input()?
        })
    }

    fn base_input(&self) -> Result<MaduradorInput> {
        Ok(MaduradorInput {
            litros: parse_whole_number("Litres", &self.litros)?,
            estado: self.estado.trim().to_string(),
            notas: self.notas.trim().to_string(),
            lote: None,
        })
    }

    fn attachment(&self, lotes: &[Lote]) -> Result<Option<LoteAttachment>> {
        let selected = self.lote.trim();
        if selected.is_empty() {
            return Ok(None);
        }
        if let Some(position) = lote_position(lotes, selected) {
            let cerveza = &lotes[position - 1].cerveza;
            return Ok(Some(LoteAttachment {
                id: selected.to_string(),
                cerveza: Some(cerveza.clone()).filter(|c| !c.is_empty()),
                valor: Some(position),
            }));
        }
        if is_object_id(selected) {
            return Ok(Some(LoteAttachment {
                id: selected.to_string(),
                cerveza: None,
                valor: None,
            }));
        }
        Err(MaduraError::Validation(format!("Unknown batch {selected:?}")))
    }
}

impl LoteForm {
    pub fn from_record(l: &Lote) -> Self {
        Self {
            id: l.id.clone(),
            cerveza: l.cerveza.clone(),
            estado: l.estado.clone(),
            cantidad_litros: l.cantidad_litros.clone(),
            fecha_carga: l.fecha_carga.clone(),
            fecha_vencimiento: l.fecha_vencimiento.clone(),
            notas: l.notas.clone(),
        }
    }

    pub fn edit_id(&self) -> Option<&str> {
        Some(self.id.trim()).filter(|id| !id.is_empty())
    }

    pub fn to_input(&self) -> Result<LoteInput> {
        Ok(LoteInput {
            cerveza: self.cerveza.trim().to_string(),
            estado: self.estado.trim().to_string(),
            cantidad_litros: parse_whole_number("Quantity", &self.cantidad_litros)?,
            fecha_carga: parse_date("Load date", &self.fecha_carga)?,
            fecha_vencimiento: parse_date("Expiry date", &self.fecha_vencimiento)?,
            notas: self.notas.trim().to_string(),
        })
    }
}

fn parse_whole_number(label: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| MaduraError::Validation(format!("{label} must be a whole number")))
}

/// Dates are optional but must be `YYYY-MM-DD` when given.
fn parse_date(label: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| MaduraError::Validation(format!("{label} must be a date (YYYY-MM-DD)")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use madura_common::LoteRef;
    use serde_json::json;

    fn lotes() -> Vec<Lote> {
        vec![
            Lote {
                id: "aaaaaaaaaaaaaaaaaaaaaaaa".into(),
                cerveza: "Stout".into(),
                ..Default::default()
            },
            Lote {
                id: "bbbbbbbbbbbbbbbbbbbbbbbb".into(),
                cerveza: "IPA".into(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn blank_form_preselects_first_batch() {
        assert_eq!(MaduradorForm::blank(&lotes()).lote, "aaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(MaduradorForm::blank(&[]).lote, "");
    }

    #[test]
    fn create_without_batch_gets_placeholder_reference() {
        let form = MaduradorForm {
            litros: "300".into(),
            estado: "activo".into(),
            ..Default::default()
        };
        let input = form.to_create_input(&lotes()).unwrap();
        let lote = input.lote.unwrap();
        assert!(is_object_id(&lote.id));
        assert_eq!(lote.valor, None);
    }

    #[test]
    fn selected_batch_carries_name_and_position() {
        let form = MaduradorForm {
            litros: "300".into(),
            lote: "bbbbbbbbbbbbbbbbbbbbbbbb".into(),
            ..Default::default()
        };
        let lote = form.to_create_input(&lotes()).unwrap().lote.unwrap();
        assert_eq!(lote.cerveza.as_deref(), Some("IPA"));
        assert_eq!(lote.valor, Some(2));
    }

    #[test]
    fn update_without_batch_leaves_reference_alone() {
        let form = MaduradorForm {
            id: "m1".into(),
            litros: "10".into(),
            ..Default::default()
        };
        assert_eq!(form.edit_id(), Some("m1"));
        assert_eq!(form.to_update_input(&lotes()).unwrap().lote, None);
    }

    #[test]
    fn keeping_an_unlisted_batch_leaves_reference_alone() {
        let form = MaduradorForm {
            id: "m1".into(),
            litros: "10".into(),
            lote: "cccccccccccccccccccccccc".into(),
            lote_actual: "cccccccccccccccccccccccc".into(),
            ..Default::default()
        };
        assert_eq!(form.to_update_input(&lotes()).unwrap().lote, None);
    }

    #[test]
    fn keeping_a_listed_batch_refreshes_its_position() {
        let form = MaduradorForm {
            id: "m1".into(),
            litros: "10".into(),
            lote: "bbbbbbbbbbbbbbbbbbbbbbbb".into(),
            lote_actual: "bbbbbbbbbbbbbbbbbbbbbbbb".into(),
            ..Default::default()
        };
        let lote = form.to_update_input(&lotes()).unwrap().lote.unwrap();
        assert_eq!(lote.valor, Some(2));
    }

    #[test]
    fn unknown_non_object_id_batch_is_rejected() {
        let form = MaduradorForm {
            litros: "10".into(),
            lote: "lote-7".into(),
            ..Default::default()
        };
        assert!(matches!(
            form.to_create_input(&lotes()),
            Err(MaduraError::Validation(_))
        ));
    }

    #[test]
    fn litres_must_be_whole() {
        let form = MaduradorForm {
            litros: "12.5".into(),
            ..Default::default()
        };
        let err = form.to_create_input(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Litres must be a whole number");
    }

    #[test]
    fn edit_form_prefills_from_record() {
        let record = Madurador {
            id: "m1".into(),
            litros: "500".into(),
            estado: "activo".into(),
            notas: "n".into(),
            lote: LoteRef::from_value(&json!({"_id": "bbbbbbbbbbbbbbbbbbbbbbbb"})),
        };
        let form = MaduradorForm::from_record(&record);
        assert_eq!(form.lote, "bbbbbbbbbbbbbbbbbbbbbbbb");
        assert_eq!(form.current_lote(), Some("bbbbbbbbbbbbbbbbbbbbbbbb"));
        assert_eq!(form.edit_id(), Some("m1"));
    }

    #[test]
    fn lote_form_validates_quantity_and_dates() {
        let mut form = LoteForm {
            cerveza: " Porter ".into(),
            cantidad_litros: "120".into(),
            fecha_carga: "2024-02-01".into(),
            ..Default::default()
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.cerveza, "Porter");
        assert_eq!(input.cantidad_litros, 120);
        assert_eq!(input.fecha_vencimiento, "");

        form.fecha_vencimiento = "01/03/2024".into();
        assert!(form.to_input().is_err());
        assert_eq!(form.edit_id(), None);
    }
}
