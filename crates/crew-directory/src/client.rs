//! Supabase PostgREST client.
//!
//! A thin typed wrapper over the `/rest/v1/` endpoints. Filters use the
//! PostgREST query syntax (`column=eq.value`); mutations ask for the
//! affected rows back via the `Prefer: return=representation` header.

use crate::error::{DataError, DataResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::RwLock;

/// Supabase REST API client.
pub struct SupabaseRest {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
    /// Access token of the signed-in user, installed by the composition
    /// root after authentication. Falls back to the anon key.
    bearer: RwLock<Option<String>>,
}

impl SupabaseRest {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `anon_key` - The Supabase anon API key
    pub fn new(api_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into(),
            anon_key: anon_key.into(),
            bearer: RwLock::new(None),
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    /// Install or clear the bearer token used for subsequent requests.
    pub fn set_bearer(&self, token: Option<String>) {
        *self.bearer.write().unwrap() = token;
    }

    fn bearer(&self) -> String {
        self.bearer
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.anon_key.clone())
    }

    /// Run a select query. `query` is the raw PostgREST query string,
    /// e.g. `select=*&order=created_at.desc`.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> DataResult<Vec<T>> {
        let url = format!("{}?{}", self.rest_url(table), query);

        tracing::debug!(url = %url, "Selecting rows");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = check_status(response, table).await?;
        Ok(response.json().await?)
    }

    /// Insert a row and return it.
    pub async fn insert<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        body: &B,
    ) -> DataResult<T> {
        let url = self.rest_url(table);

        tracing::debug!(table = %table, "Inserting row");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let response = check_status(response, table).await?;
        let mut rows: Vec<T> = response.json().await?;
        rows.pop()
            .ok_or_else(|| DataError::NotFound(format!("insert into {} returned no row", table)))
    }

    /// Update rows matching `filter` (e.g. `id=eq.<uuid>`) and return the
    /// first affected row.
    pub async fn update<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        filter: &str,
        body: &B,
    ) -> DataResult<T> {
        let url = format!("{}?{}", self.rest_url(table), filter);

        tracing::debug!(table = %table, filter = %filter, "Updating rows");

        let response = self
            .http_client
            .patch(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let response = check_status(response, table).await?;
        let mut rows: Vec<T> = response.json().await?;
        rows.pop()
            .ok_or_else(|| DataError::NotFound(format!("no row in {} matched {}", table, filter)))
    }

    /// Delete rows matching `filter`.
    pub async fn delete(&self, table: &str, filter: &str) -> DataResult<()> {
        let url = format!("{}?{}", self.rest_url(table), filter);

        tracing::debug!(table = %table, filter = %filter, "Deleting rows");

        let response = self
            .http_client
            .delete(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .send()
            .await?;

        check_status(response, table).await?;
        Ok(())
    }
}

/// Map a non-success response to `DataError::Api`.
async fn check_status(response: reqwest::Response, table: &str) -> DataResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(table = %table, status = %status, body = %body, "REST request failed");

    Err(DataError::Api {
        status: status.as_u16(),
        message: body,
    })
}

/// Percent-encode a PostgREST filter value (display names contain spaces).
pub(crate) fn encode_component(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            _ => {
                for byte in c.to_string().as_bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    result
}
