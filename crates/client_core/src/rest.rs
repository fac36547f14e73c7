//! PostgREST-flavoured [`Backend`] over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use shared::error::{ApiError, ApiException};
use tracing::debug;
use url::Url;

use crate::{
    backend::{Backend, InsertQuery, SelectQuery, UpdateQuery},
    error::BackendError,
};

const REST_PREFIX: &str = "rest/v1/";
const AUTH_HEALTH_PATH: &str = "auth/v1/health";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RestBackend {
    http: Client,
    base_url: Url,
    anon_key: String,
}

/// Raw outcome of a diagnostic probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl RestBackend {
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, base_url, anon_key)
    }

    pub fn with_client(http: Client, base_url: &str, anon_key: impl Into<String>) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid backend url '{base_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            anon_key: anon_key.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(&format!("{REST_PREFIX}{table}"))
            .map_err(|err| BackendError::Decode(format!("invalid table url for '{table}': {err}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Hits the auth health endpoint without credentials.
    pub async fn probe_auth_health(&self) -> Result<ProbeResponse> {
        let url = self.base_url.join(AUTH_HEALTH_PATH)?;
        let res = self.http.get(url).send().await?;
        probe_response(res).await
    }

    /// Reads a single id from `table` with credentials, bypassing [`Backend`].
    pub async fn probe_table(&self, table: &str) -> Result<ProbeResponse> {
        let url = self.table_url(table)?;
        let res = self
            .authorized(self.http.get(url))
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        probe_response(res).await
    }
}

async fn probe_response(res: Response) -> Result<ProbeResponse> {
    let status = res.status().as_u16();
    let body = res.text().await.context("failed to read probe body")?;
    Ok(ProbeResponse { status, body })
}

fn filter_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

async fn check_status(res: Response) -> Result<Response, BackendError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(api_exception(status, &body).into())
}

fn api_exception(status: StatusCode, body: &str) -> ApiException {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => err.into_exception(status.as_u16()),
        Err(_) => {
            let reason = status.canonical_reason().unwrap_or("request failed");
            ApiException::new(status.as_u16(), format!("{} {reason}", status.as_u16()))
        }
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, BackendError> {
        let url = self.table_url(&query.table)?;
        let mut params = vec![("select".to_string(), query.projection.render())];
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        debug!(table = %query.table, "select");

        let res = self
            .authorized(self.http.get(url))
            .query(&params)
            .send()
            .await?;
        let rows: Vec<Value> = check_status(res).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, query: &InsertQuery) -> Result<Option<Value>, BackendError> {
        let url = self.table_url(&query.table)?;
        let prefer = if query.returning {
            "return=representation"
        } else {
            "return=minimal"
        };
        debug!(table = %query.table, returning = query.returning, "insert");

        let res = self
            .authorized(self.http.post(url))
            .header("Prefer", prefer)
            .json(&query.row)
            .send()
            .await?;
        let res = check_status(res).await?;
        if !query.returning {
            return Ok(None);
        }

        let rows: Vec<Value> = res.json().await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row)),
            None => Err(BackendError::Decode(format!(
                "insert into '{}' returned no row",
                query.table
            ))),
        }
    }

    async fn update(&self, query: &UpdateQuery) -> Result<(), BackendError> {
        let url = self.table_url(&query.table)?;
        let filter = format!("eq.{}", filter_value(&query.filter.value));
        debug!(table = %query.table, column = %query.filter.column, "update");

        let res = self
            .authorized(self.http.patch(url))
            .query(&[(query.filter.column.as_str(), filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&query.values)
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
