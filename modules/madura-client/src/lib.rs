pub mod decode;
pub mod error;

pub use decode::{decode_body, Decoded};
pub use error::{ClientError, Result};

use std::time::Duration;

use madura_common::{
    config::normalize_base, display_value, extract_data_array, extract_data_object, Lote,
    LoteInput, Madurador, MaduradorInput,
};
use serde_json::Value;

type Query = Vec<(&'static str, String)>;

/// Client for the fermentation backend's CRUD endpoints.
#[derive(Debug, Clone)]
pub struct MaduraClient {
    client: reqwest::Client,
    base_url: String,
}

impl MaduraClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(client, base_url))
    }

    /// Reuse an existing connection pool against a (possibly different) base URL.
    pub fn with_http(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`, returning the backend's reported status.
    pub async fn health(&self) -> Result<String> {
        let value = self.get_structured("/health", Vec::new()).await?;
        match value.get("status") {
            Some(status) => Ok(display_value(status)),
            None => Err(ClientError::Parse("health response has no status".to_string())),
        }
    }

    // --- Fermenters ---

    pub async fn find_all_maduradores(&self) -> Result<Vec<Madurador>> {
        let items = self.get_list("/find_all_madurador/").await?;
        Ok(decode_records(&items, Madurador::from_value, "madurador"))
    }

    pub async fn find_madurador(&self, id: &str) -> Result<Madurador> {
        let record = self.get_record("/find_madurador_by_id/", id).await?;
        Madurador::from_value(&record)
            .ok_or_else(|| ClientError::Parse(format!("madurador {id} is not an object")))
    }

    pub async fn create_madurador(&self, input: &MaduradorInput) -> Result<()> {
        tracing::info!(estado = %input.estado, "Creating madurador");
        self.post("/create_madurador/", input.to_query()).await
    }

    pub async fn update_madurador(&self, id: &str, input: &MaduradorInput) -> Result<()> {
        tracing::info!(id, "Updating madurador");
        self.post("/update_madurador_by_id/", with_id(input.to_query(), id))
            .await
    }

    pub async fn delete_madurador(&self, id: &str) -> Result<()> {
        tracing::info!(id, "Deleting madurador");
        self.post("/delete_madurador_by_id/", with_id(Vec::new(), id))
            .await
    }

    // --- Batches ---

    pub async fn find_all_lotes(&self) -> Result<Vec<Lote>> {
        let items = self.get_list("/find_all_lote/").await?;
        Ok(decode_records(&items, Lote::from_value, "lote"))
    }

    pub async fn find_lote(&self, id: &str) -> Result<Lote> {
        let record = self.get_record("/find_lote_by_id/", id).await?;
        Lote::from_value(&record)
            .ok_or_else(|| ClientError::Parse(format!("lote {id} is not an object")))
    }

    pub async fn create_lote(&self, input: &LoteInput) -> Result<()> {
        tracing::info!(cerveza = %input.cerveza, "Creating lote");
        self.post("/create_lote/", input.to_query()).await
    }

    pub async fn update_lote(&self, id: &str, input: &LoteInput) -> Result<()> {
        tracing::info!(id, "Updating lote");
        self.post("/update_lote_by_id/", with_id(input.to_query(), id))
            .await
    }

    pub async fn delete_lote(&self, id: &str) -> Result<()> {
        tracing::info!(id, "Deleting lote");
        self.post("/delete_lote_by_id/", with_id(Vec::new(), id))
            .await
    }

    // --- Transport ---

    async fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        let value = self.get_structured(path, Vec::new()).await?;
        Ok(extract_data_array(&value))
    }

    async fn get_record(&self, path: &str, id: &str) -> Result<Value> {
        let value = self
            .get_structured(path, with_id(Vec::new(), id))
            .await?;
        match extract_data_object(&value) {
            Value::Null => Err(ClientError::NotFound(id.to_string())),
            record => Ok(record),
        }
    }

    async fn get_structured(&self, path: &str, query: Query) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(&query).send().await?;
        match read_body(resp).await? {
            Decoded::Structured(value) => Ok(value),
            Decoded::Text(text) => Err(ClientError::Unparseable(text)),
        }
    }

    async fn post(&self, path: &str, query: Query) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).query(&query).send().await?;
        read_body(resp).await?;
        Ok(())
    }
}

async fn read_body(resp: reqwest::Response) -> Result<Decoded> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = resp.bytes().await?;
    Ok(decode_body(&bytes))
}

fn with_id(mut query: Query, id: &str) -> Query {
    query.push(("id", id.to_string()));
    query
}

fn decode_records<T>(items: &[Value], decode: fn(&Value) -> Option<T>, kind: &str) -> Vec<T> {
    let records: Vec<T> = items.iter().filter_map(decode).collect();
    if records.len() != items.len() {
        tracing::debug!(
            kind,
            skipped = items.len() - records.len(),
            "Skipped list entries that are not records"
        );
    }
    records
}
