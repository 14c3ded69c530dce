use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::display::display_value;
use crate::literal::to_literal;

// --- Records ---

/// A fermentation vessel as returned by `find_all_madurador/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Madurador {
    #[serde(rename = "_id", default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub litros: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub estado: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notas: String,
    #[serde(default)]
    pub lote: LoteRef,
}

/// A brewing batch as returned by `find_all_lote/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lote {
    #[serde(rename = "_id", default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cerveza: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub estado: String,
    #[serde(rename = "cantidadLitros", default, deserialize_with = "lenient_text")]
    pub cantidad_litros: String,
    #[serde(rename = "fechaCarga", default, deserialize_with = "lenient_text")]
    pub fecha_carga: String,
    #[serde(rename = "fechaVencimiento", default, deserialize_with = "lenient_text")]
    pub fecha_vencimiento: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notas: String,
}

impl Madurador {
    /// Decode one record, tolerating any shape. Non-object values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        serde_json::from_value(value.clone()).ok()
    }
}

impl Lote {
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// Scalars of any JSON type rendered as display text; `null` becomes empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(display_value(&value))
}

// --- Batch reference ---

/// Fields probed on an object-shaped batch reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoteRefFields {
    pub id: Option<String>,
    pub valor: Option<String>,
    pub nombre: Option<String>,
    pub cerveza: Option<String>,
    pub raw: Map<String, Value>,
}

impl LoteRefFields {
    fn from_map(raw: Map<String, Value>) -> Self {
        let text = |key: &str| {
            raw.get(key)
                .filter(|v| !v.is_null())
                .map(display_value)
        };
        let (id, valor, nombre, cerveza) =
            (text("_id"), text("valor"), text("nombre"), text("cerveza"));
        Self {
            id,
            valor,
            nombre,
            cerveza,
            raw,
        }
    }

    /// Beverage label: `cerveza`, else `nombre`, skipping empty strings.
    pub fn name(&self) -> Option<&str> {
        self.cerveza
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.nombre.as_deref().filter(|s| !s.is_empty()))
    }
}

/// The batch a fermenter points at. Backend versions disagree on the shape, so
/// each known shape is its own variant; object variants are picked by the first
/// key present in priority `valor` > `nombre` > `_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoteRef {
    #[default]
    Missing,
    /// A bare string; may itself be a serialized dict.
    Text(String),
    ByValue(LoteRefFields),
    ByName(LoteRefFields),
    ById(LoteRefFields),
    /// An object carrying none of the probed keys.
    Embedded(LoteRefFields),
}

impl LoteRef {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => LoteRef::Missing,
            Value::String(s) => LoteRef::Text(s.clone()),
            Value::Object(map) => Self::from_map(map.clone()),
            other => LoteRef::Text(display_value(other)),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        let fields = LoteRefFields::from_map(map);
        if fields.valor.is_some() {
            LoteRef::ByValue(fields)
        } else if fields.nombre.is_some() {
            LoteRef::ByName(fields)
        } else if fields.id.is_some() {
            LoteRef::ById(fields)
        } else {
            LoteRef::Embedded(fields)
        }
    }

    pub fn fields(&self) -> Option<&LoteRefFields> {
        match self {
            LoteRef::ByValue(f) | LoteRef::ByName(f) | LoteRef::ById(f) | LoteRef::Embedded(f) => {
                Some(f)
            }
            LoteRef::Missing | LoteRef::Text(_) => None,
        }
    }

    /// Backend id of the referenced batch, when the reference carries one.
    pub fn id(&self) -> Option<&str> {
        self.fields().and_then(|f| f.id.as_deref())
    }

    pub fn to_value(&self) -> Value {
        match self {
            LoteRef::Missing => Value::Null,
            LoteRef::Text(s) => Value::String(s.clone()),
            _ => self
                .fields()
                .map(|f| Value::Object(f.raw.clone()))
                .unwrap_or(Value::Null),
        }
    }
}

impl Serialize for LoteRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LoteRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(LoteRef::from_value(&value))
    }
}

// --- Mutation inputs ---

/// The batch sub-object sent with a fermenter create/update.
#[derive(Debug, Clone, PartialEq)]
pub struct LoteAttachment {
    pub id: String,
    pub cerveza: Option<String>,
    /// 1-based position of the batch in the list it was picked from.
    pub valor: Option<usize>,
}

impl LoteAttachment {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("_id".to_string(), json!(self.id));
        if let Some(cerveza) = &self.cerveza {
            map.insert("cerveza".to_string(), json!(cerveza));
        }
        if let Some(valor) = self.valor {
            map.insert("valor".to_string(), json!(valor));
        }
        Value::Object(map)
    }
}

/// Fields for `create_madurador/` and `update_madurador_by_id/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaduradorInput {
    pub litros: i64,
    pub estado: String,
    pub notas: String,
    /// `None` leaves the stored reference untouched on update.
    pub lote: Option<LoteAttachment>,
}

impl MaduradorInput {
    /// Query parameters in backend naming. The batch travels as a Python literal
    /// because the backend `literal_eval`s it.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("litros", self.litros.to_string()),
            ("estado", self.estado.clone()),
            ("notas", self.notas.clone()),
        ];
        if let Some(lote) = &self.lote {
            params.push(("lote", to_literal(&lote.to_value())));
        }
        params
    }
}

/// Fields for `create_lote/` and `update_lote_by_id/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoteInput {
    pub cerveza: String,
    pub estado: String,
    pub cantidad_litros: i64,
    pub fecha_carga: String,
    pub fecha_vencimiento: String,
    pub notas: String,
}

impl LoteInput {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cerveza", self.cerveza.clone()),
            ("estado", self.estado.clone()),
            ("cantidadLitros", self.cantidad_litros.to_string()),
            ("fechaCarga", self.fecha_carga.clone()),
            ("fechaVencimiento", self.fecha_vencimiento.clone()),
            ("notas", self.notas.clone()),
        ]
    }
}
