// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Duration, Utc};
use log::warn;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::{
    model,
    storage::{self, IsPersistent as _, Storage as _},
};

/// The raw bearer token issued by the service on login or registration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub(crate) struct Token(String);

impl secrecy::CloneableSecret for Token {}

impl secrecy::SerializableSecret for Token {}

impl secrecy::Zeroize for Token {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub(crate) struct Secret(secrecy::Secret<Token>);

impl Secret {
    pub(crate) fn new<T: Into<String>>(raw: T) -> Self {
        Self(secrecy::Secret::new(Token(raw.into())))
    }

    /// The token as sent in the `Authorization` header. Call at the transport
    /// boundary only.
    pub(crate) fn reveal(&self) -> &str {
        &self.0.expose_secret().0
    }
}

/// When a freshly issued token stops being usable, measured from now.
pub(crate) fn expiry(persist_long: bool) -> DateTime<Utc> {
    Utc::now()
        + if persist_long {
            Duration::days(30)
        } else {
            Duration::hours(1)
        }
}

/// The signed-in session as persisted between runs: token, expiry, the cached
/// role hint, and the last known profile. Invalidated as a unit.
#[derive(Clone, Deserialize, Serialize)]
pub(crate) struct Data {
    token: Secret,
    expires_at: DateTime<Utc>,
    role: Option<model::Role>,
    user: Option<model::User>,
}

impl Data {
    pub(crate) fn new(token: Secret, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at,
            role: None,
            user: None,
        }
    }

    pub(crate) fn with_role(mut self, role: model::Role) -> Self {
        self.role = Some(role);
        self
    }

    pub(crate) fn with_user(mut self, user: model::User) -> Self {
        self.role = Some(user.role);
        self.user = Some(user);
        self
    }

    pub(crate) const fn token(&self) -> &Secret {
        &self.token
    }

    pub(crate) const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub(crate) const fn role(&self) -> Option<model::Role> {
        self.role
    }

    pub(crate) const fn user(&self) -> &Option<model::User> {
        &self.user
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The session manager's persistence delegate.
///
/// Absence is always a normal return value here: a stored session past its
/// expiry is cleared and reported as absent, and a storage fault is logged
/// and reported as absent rather than surfaced. Nothing above this layer
/// ever sees a storage error.
pub(crate) struct Store<S> {
    storage: S,
}

impl<S: storage::Storage<Data>> Store<S> {
    pub(crate) fn new(storage: S) -> Self {
        Self { storage }
    }

    pub(crate) fn is_persistent(&self) -> bool {
        self.storage.is_persistent()
    }

    pub(crate) async fn get(&mut self) -> Option<Data> {
        match self.storage.get().await {
            Ok(Some(data)) if data.is_expired_at(Utc::now()) => {
                self.clear().await;
                None
            }
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to read the saved session, continuing without one: {e}");
                None
            }
        }
    }

    pub(crate) async fn put(&mut self, data: &Data) {
        if let Err(e) = self.storage.update(data).await {
            warn!("Failed to save the session; you may have to sign in again next time: {e}");
        }
    }

    pub(crate) async fn clear(&mut self) {
        if let Err(e) = self.storage.clear().await {
            warn!("Failed to remove the saved session: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::Result, storage::Memory};

    use super::*;

    fn expired_data() -> Data {
        Data::new(Secret::new("stale-token"), Utc::now() - Duration::hours(2))
    }

    fn live_data() -> Data {
        Data::new(Secret::new("live-token"), Utc::now() + Duration::hours(1))
    }

    #[tokio::test]
    async fn expired_sessions_read_as_absent_and_are_cleared() -> Result<()> {
        let mut backing = Memory::new();
        {
            use crate::storage::Storage as _;

            backing.update(&expired_data()).await?;
        }

        let mut store = Store::new(backing);
        assert!(store.get().await.is_none());
        // The expired record must be gone, not merely filtered on read.
        assert!(store.get().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn get_is_idempotent_for_live_sessions() -> Result<()> {
        let mut store = Store::new(Memory::new());
        store.put(&live_data()).await;

        let first = store.get().await.map(|d| d.token().reveal().to_owned());
        let second = store.get().await.map(|d| d.token().reveal().to_owned());
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("live-token"));
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_everything_at_once() -> Result<()> {
        let user: crate::model::User = serde_json::from_str(
            r#"{"id": "u1", "fullname": "Ada Obi", "email": "ada@example.com", "role": "user"}"#,
        )?;
        let mut store = Store::new(Memory::new());
        store.put(&live_data().with_user(user)).await;
        store.clear().await;

        assert!(store.get().await.is_none());
        Ok(())
    }

    #[test]
    fn persisted_form_round_trips() -> Result<()> {
        let data = live_data().with_role(crate::model::Role::Admin);
        let encoded = serde_json::to_string(&data)?;
        let decoded: Data = serde_json::from_str(&encoded)?;

        assert_eq!(decoded.token().reveal(), "live-token");
        assert_eq!(decoded.role(), Some(crate::model::Role::Admin));
        assert_eq!(decoded.expires_at(), data.expires_at());
        Ok(())
    }
}
