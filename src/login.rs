use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics;
use crate::fetcher::{fallback_catalog, FetchError, RecordsFetcher, DEFAULT_ENDPOINT};
use crate::models::{EndpointCatalog, LoginHistoryEntry, StudentRecord};
use crate::session::Session;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Please enter both USN and DOB")]
    MissingCredentials,
    #[error("Invalid USN format. Expected format: 1MS00XX000")]
    InvalidUsn,
    #[error("{0} is not in the login history")]
    UnknownAccount(String),
    #[error("Please login first")]
    NotLoggedIn,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn usn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^1MS\d{2}[A-Z]{2}\d{3}$").expect("USN pattern compiles"))
}

/// Validated, upper-cased USN.
pub fn normalize_usn(usn: &str) -> Result<String, LoginError> {
    let usn = usn.trim();
    if !usn_pattern().is_match(usn) {
        return Err(LoginError::InvalidUsn);
    }
    Ok(usn.to_ascii_uppercase())
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub record: StudentRecord,
    pub endpoint: String,
    pub history: Vec<LoginHistoryEntry>,
}

/// Endpoint catalog from the API, or the built-in one when it is unreachable.
pub async fn endpoint_catalog(
    fetcher: &dyn RecordsFetcher,
    session: &Session<'_>,
) -> Result<EndpointCatalog, StoreError> {
    let stored = session.current_endpoint().await?;
    match fetcher.endpoints().await {
        Ok(mut catalog) => {
            if stored.is_some() {
                catalog.current = stored;
            }
            Ok(catalog)
        }
        Err(err) => {
            warn!(error = %err, "failed to fetch endpoints, using fallback list");
            Ok(fallback_catalog(stored))
        }
    }
}

pub async fn login(
    fetcher: &dyn RecordsFetcher,
    session: &Session<'_>,
    usn: &str,
    dob: &str,
    endpoint: Option<&str>,
) -> Result<LoginOutcome, LoginError> {
    if usn.trim().is_empty() || dob.trim().is_empty() {
        return Err(LoginError::MissingCredentials);
    }
    let usn = normalize_usn(usn)?;
    let dob = dob.trim();

    // An explicit endpoint needs no listing; its title comes from the built-in catalog.
    let (endpoint, catalog) = match endpoint {
        Some(endpoint) => (endpoint.to_string(), fallback_catalog(None)),
        None => {
            let catalog = endpoint_catalog(fetcher, session).await?;
            let endpoint = catalog
                .current
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
            (endpoint, catalog)
        }
    };

    info!(%usn, %endpoint, "logging in");
    let record = fetcher.fetch(&usn, dob, &endpoint).await?;

    session.save(&usn, dob, &record).await?;
    session.set_current_endpoint(&endpoint).await?;

    let endpoint_title = catalog
        .title_of(&endpoint)
        .unwrap_or(endpoint.as_str())
        .to_string();
    let now = Utc::now();
    let history = session
        .add_to_history(LoginHistoryEntry {
            usn: usn.clone(),
            dob: dob.to_string(),
            name: record.name.clone(),
            last_used: now,
            endpoint: Some(endpoint.clone()),
            endpoint_title: Some(endpoint_title),
        })
        .await?;

    match analytics::record_login(session, &usn, dob, &record, now).await {
        Ok(stats) => debug!(%usn, logins = stats.login_count, "login recorded"),
        Err(err) => warn!(%usn, error = %err, "failed to record login analytics"),
    }

    Ok(LoginOutcome {
        record,
        endpoint,
        history,
    })
}

/// Logs in again with an account remembered in the login history.
pub async fn quick_login(
    fetcher: &dyn RecordsFetcher,
    session: &Session<'_>,
    usn: &str,
) -> Result<LoginOutcome, LoginError> {
    let history = session.login_history().await?;
    let entry = history
        .into_iter()
        .find(|entry| entry.usn.eq_ignore_ascii_case(usn.trim()))
        .ok_or_else(|| LoginError::UnknownAccount(usn.trim().to_string()))?;

    login(fetcher, session, &entry.usn, &entry.dob, entry.endpoint.as_deref()).await
}

/// Refetches the logged-in student, optionally from another endpoint.
pub async fn reload(
    fetcher: &dyn RecordsFetcher,
    session: &Session<'_>,
    endpoint: Option<&str>,
) -> Result<LoginOutcome, LoginError> {
    let saved = session.load().await?.ok_or(LoginError::NotLoggedIn)?;
    login(fetcher, session, &saved.usn, &saved.dob, endpoint).await
}
