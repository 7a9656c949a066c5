use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Numeric, Scenario, StudentRecord};
use crate::session::Session;
use crate::store::{KeyValueStore, StoreError};

pub fn student_key(usn: &str) -> String {
    format!("studentAnalytics/{usn}")
}

pub fn device_key(device_id: &str) -> String {
    format!("deviceAnalytics/{device_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedSgpa {
    pub key: String,
    #[serde(default)]
    pub value: Option<Numeric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnalytics {
    pub usn: String,
    pub dob: String,
    pub name: String,
    #[serde(default)]
    pub cgpa: Option<Numeric>,
    #[serde(default)]
    pub predicted: Vec<PredictedSgpa>,
    pub first_login: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub login_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub usn: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundAccount {
    pub usn: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAnalytics {
    pub login_count: u64,
    #[serde(default)]
    pub login_events: Vec<LoginEvent>,
    #[serde(default)]
    pub login_found: Vec<FoundAccount>,
}

async fn read_doc<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(doc) => Ok(Some(doc)),
        Err(err) => {
            warn!(%key, error = %err, "analytics document is unreadable, starting fresh");
            Ok(None)
        }
    }
}

async fn write_doc<T: Serialize>(store: &dyn KeyValueStore, key: &str, doc: &T) -> Result<(), StoreError> {
    store.set(key, &serde_json::to_string(doc)?).await
}

/// Counts a successful login against the student and against this device.
pub async fn record_login(
    session: &Session<'_>,
    usn: &str,
    dob: &str,
    record: &StudentRecord,
    at: DateTime<Utc>,
) -> Result<StudentAnalytics, StoreError> {
    let store = session.store();

    let key = student_key(usn);
    let mut student = read_doc::<StudentAnalytics>(store, &key)
        .await?
        .unwrap_or_else(|| StudentAnalytics {
            usn: usn.to_string(),
            dob: dob.to_string(),
            name: record.name.clone(),
            cgpa: None,
            predicted: Vec::new(),
            first_login: at,
            last_login: at,
            login_count: 0,
        });
    student.dob = dob.to_string();
    student.name = record.name.clone();
    student.cgpa = record.cgpa.clone();
    student.predicted = Scenario::ALL
        .iter()
        .map(|&scenario| PredictedSgpa {
            key: scenario.key().to_string(),
            value: record.prediction(scenario).cloned(),
        })
        .collect();
    student.last_login = at;
    student.login_count += 1;
    write_doc(store, &key, &student).await?;

    let device_id = session.device_id().await?;
    let key = device_key(&device_id);
    let mut device = read_doc::<DeviceAnalytics>(store, &key).await?.unwrap_or_default();
    device.login_count += 1;
    device.login_events.push(LoginEvent {
        usn: usn.to_string(),
        timestamp: at,
    });
    let found = FoundAccount {
        usn: usn.to_string(),
        name: record.name.clone(),
    };
    if !device.login_found.contains(&found) {
        device.login_found.push(found);
    }
    write_doc(store, &key, &device).await?;

    debug!(%usn, %device_id, logins = student.login_count, "login analytics updated");
    Ok(student)
}
