use crate::config::Config;
use crate::errors::{AppError, PersistError};
use crate::gateways::{PersistenceGateway, ResearchGateway};
use crate::models::{Collection, ResearchRequest, ResearchResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// PostgreSQL error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the Supabase project backing the intake forms.
///
/// Talks to two surfaces of the same project:
/// - the REST API (`/rest/v1/{table}`) for inserts
/// - Edge Functions (`/functions/v1/{name}`) for company research
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    research_function: String,
}

impl SupabaseClient {
    /// Creates a new `SupabaseClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`.
    /// * `api_key` - Anon (or service) key sent as `apikey` and bearer token.
    /// * `research_function` - Name of the Edge Function doing company research.
    /// * `timeout` - Transport timeout for every request.
    pub fn new(
        base_url: String,
        api_key: String,
        research_function: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Supabase client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            research_function,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
            config.research_function.clone(),
            Duration::from_secs(config.research_timeout_secs),
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Invokes an Edge Function with a JSON body.
    ///
    /// # Returns
    ///
    /// * `Result<Value, AppError>` - The decoded JSON response.
    pub async fn invoke_function<B: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<Value, AppError> {
        let url = format!("{}/functions/v1/{}", self.base_url, name);
        tracing::info!("Invoking Supabase function {}", name);

        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Function {} request failed: {}", name, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Function {} returned {}: {}",
                name, status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse {} response: {}", name, e))
        })
    }

    /// Inserts rows through the REST API.
    async fn insert_rows(&self, table: &str, rows: &[Value]) -> Result<(), PersistError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        tracing::debug!("Inserting {} row(s) into {}", rows.len(), table);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await
            .map_err(|e| PersistError::Other(format!("Insert into {} failed: {}", table, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(classify_insert_error(status, &error_text))
    }
}

/// Maps a failed PostgREST insert to a `PersistError`.
fn classify_insert_error(status: StatusCode, body: &str) -> PersistError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.to_string());

    if status == StatusCode::CONFLICT
        || parsed.code.as_deref() == Some(UNIQUE_VIOLATION)
        || message.contains("duplicate")
    {
        return PersistError::Uniqueness;
    }

    PersistError::Other(format!("Supabase returned {}: {}", status, message))
}

#[async_trait]
impl PersistenceGateway for SupabaseClient {
    async fn insert(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> Result<(), PersistError> {
        self.insert_rows(collection.as_str(), &records).await
    }
}

#[async_trait]
impl ResearchGateway for SupabaseClient {
    async fn research_company(
        &self,
        request: &ResearchRequest,
    ) -> Result<ResearchResponse, AppError> {
        let raw = self.invoke_function(&self.research_function, request).await?;
        serde_json::from_value(raw).map_err(|e| {
            AppError::ExternalApiError(format!("Unexpected research response shape: {}", e))
        })
    }
}
