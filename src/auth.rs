use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::session::Session;
use crate::store::StoreError;

const KEY_AUTH_USER: &str = "authUser";
const KEY_TRACKING_USERNAME: &str = "randomUsername";

const ADJECTIVES: [&str; 8] = ["swift", "quiet", "bright", "curious", "steady", "brave", "lucky", "clever"];
const NOUNS: [&str; 8] = ["falcon", "otter", "comet", "maple", "tiger", "panda", "heron", "lynx"];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a display name is required to sign in")]
    MissingName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub tracking_username: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, display_name: &str, email: Option<&str>) -> Result<AuthUser, AuthError>;
    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Identity kept on this device only; the user id is the device id.
pub struct LocalAuth<'a> {
    session: Session<'a>,
}

impl<'a> LocalAuth<'a> {
    pub fn new(session: Session<'a>) -> Self {
        Self { session }
    }

    async fn tracking_username(&self) -> Result<String, StoreError> {
        let store = self.session.store();
        if let Some(name) = store.get(KEY_TRACKING_USERNAME).await? {
            return Ok(name);
        }
        let name = random_username(&mut rand::thread_rng());
        store.set(KEY_TRACKING_USERNAME, &name).await?;
        Ok(name)
    }
}

pub fn random_username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("quiet");
    let noun = NOUNS.choose(rng).copied().unwrap_or("otter");
    format!("{adjective}-{noun}-{:03}", rng.gen_range(0..1000))
}

#[async_trait]
impl AuthProvider for LocalAuth<'_> {
    async fn sign_in(&self, display_name: &str, email: Option<&str>) -> Result<AuthUser, AuthError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::MissingName);
        }

        let user = AuthUser {
            id: self.session.device_id().await?,
            display_name: display_name.to_string(),
            email: email.unwrap_or_default().trim().to_string(),
            tracking_username: self.tracking_username().await?,
            created_at: Utc::now(),
        };
        let encoded = serde_json::to_string(&user).map_err(StoreError::from)?;
        self.session.store().set(KEY_AUTH_USER, &encoded).await?;
        info!(user = %user.display_name, "signed in");
        Ok(user)
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        let Some(raw) = self.session.store().get(KEY_AUTH_USER).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(error = %err, "stored user profile is unreadable");
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.store().remove(KEY_AUTH_USER).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn usernames_follow_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = random_username(&mut rng);
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(NOUNS.contains(&parts[1]));
        assert_eq!(parts[2].len(), 3);
    }

    #[tokio::test]
    async fn sign_in_and_out() {
        let store = MemoryStore::new();
        let auth = LocalAuth::new(Session::new(&store));
        assert!(auth.current_user().await.unwrap().is_none());

        let user = auth.sign_in("Avery Lee", Some("avery@example.com")).await.unwrap();
        assert_eq!(auth.current_user().await.unwrap(), Some(user.clone()));

        // The device id and tracking name survive a sign-out.
        auth.sign_out().await.unwrap();
        assert!(auth.current_user().await.unwrap().is_none());
        let again = auth.sign_in("Avery Lee", None).await.unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.tracking_username, user.tracking_username);
        assert_eq!(again.email, "");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = MemoryStore::new();
        let auth = LocalAuth::new(Session::new(&store));
        assert!(matches!(auth.sign_in("  ", None).await, Err(AuthError::MissingName)));
    }
}
