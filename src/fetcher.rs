use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Endpoint, EndpointCatalog, StudentRecord};

pub const DEFAULT_API_URL: &str = "https://reconnect-msrit.vercel.app";
pub const DEFAULT_ENDPOINT: &str = "newparentseven";

/// Credentials the records API answers with canned data.
pub const DEMO_USN: &str = "1MS21AB001";
pub const DEMO_DOB: &str = "2003-01-01";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Server error: This endpoint is currently inactive. Try switching to a different semester endpoint.")]
    EndpointInactive,
    #[error("{0}")]
    Rejected(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait RecordsFetcher: Send + Sync {
    async fn fetch(&self, usn: &str, dob: &str, endpoint: &str) -> Result<StudentRecord, FetchError>;

    async fn endpoints(&self) -> Result<EndpointCatalog, FetchError>;
}

pub fn fallback_catalog(stored: Option<String>) -> EndpointCatalog {
    EndpointCatalog {
        active_endpoints: vec![
            Endpoint {
                name: "newparentseven".to_string(),
                title: "FOR EVEN TERM 2024-2025".to_string(),
            },
            Endpoint {
                name: "newparents".to_string(),
                title: "FOR ODD TERM 2025-2026".to_string(),
            },
        ],
        current: Some(stored.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())),
    }
}

pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        // Url::join replaces the last path segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("noterep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base })
    }

    fn route(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|err| FetchError::InvalidUrl(err.to_string()))
    }

    pub fn records_url(&self, usn: &str, dob: &str, endpoint: &str) -> Result<Url, FetchError> {
        if usn == DEMO_USN && dob == DEMO_DOB {
            return self.route("test");
        }
        let mut url = self.route("sis")?;
        url.query_pairs_mut()
            .append_pair("endpoint", endpoint)
            .append_pair("usn", usn)
            .append_pair("dob", dob);
        Ok(url)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub fn rejection(status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return FetchError::EndpointInactive;
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| "Failed to fetch data.".to_string());
    FetchError::Rejected(message)
}

#[async_trait]
impl RecordsFetcher for HttpFetcher {
    async fn fetch(&self, usn: &str, dob: &str, endpoint: &str) -> Result<StudentRecord, FetchError> {
        let url = self.records_url(usn, dob, endpoint)?;
        if url.path().ends_with("/test") {
            info!("logging in with test data");
        }
        debug!(%endpoint, %usn, "fetching student record");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %endpoint, "records API rejected the request");
            return Err(rejection(status, &body));
        }

        let mut record: StudentRecord = response.json().await?;
        if record.usn.is_empty() {
            record.usn = usn.to_string();
        }
        Ok(record)
    }

    async fn endpoints(&self) -> Result<EndpointCatalog, FetchError> {
        let url = self.route("endpoints")?;
        let catalog = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<EndpointCatalog>()
            .await?;
        Ok(catalog)
    }
}
