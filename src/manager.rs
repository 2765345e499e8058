// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use log::{debug, warn};
use secrecy::SecretString;

use crate::{
    api::Api,
    error::{self, Result},
    model, session, storage,
};

/// The authentication lifecycle as observed by everything outside the
/// manager.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum State {
    Anonymous,
    Authenticating,
    Authenticated,
    ProfileLoading,
    Error,
}

/// Where a role assertion came from. The cached hint from a previous run is
/// provisional; once a profile fetch has completed for this token, only the
/// verified role counts and anything else fails closed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RoleClaim {
    Unknown,
    Provisional(model::Role),
    Verified(model::Role),
}

/// A point-in-time read of the session. Only the manager mutates session
/// state; everything else consumes one of these.
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    pub(crate) state: State,
    pub(crate) role: RoleClaim,
    pub(crate) user_fetched: bool,
    pub(crate) last_error: Option<(error::Class, String)>,
}

/// Owns the in-memory session and the token store, and is the only writer of
/// either.
pub(crate) struct Manager<A, S> {
    api: A,
    store: session::Store<S>,
    token: Option<session::Secret>,
    expires_at: Option<DateTime<Utc>>,
    user: Option<model::User>,
    cached_role: Option<model::Role>,
    /// True only when the role came from a live service response this run;
    /// anything rehydrated from disk stays provisional until then.
    role_verified: bool,
    user_fetched: bool,
    loading: bool,
    last_error: Option<(error::Class, String)>,
}

impl<A: Api, S: storage::Storage<session::Data>> Manager<A, S> {
    /// Rehydrate from whatever the token store holds. An expired record reads
    /// as absent, so a stale session starts over as anonymous.
    pub(crate) async fn restore(api: A, storage: S) -> Self {
        let mut store = session::Store::new(storage);
        let persisted = store.get().await;

        let mut manager = Self {
            api,
            store,
            token: None,
            expires_at: None,
            user: None,
            cached_role: None,
            role_verified: false,
            user_fetched: false,
            loading: false,
            last_error: None,
        };
        if let Some(data) = persisted {
            manager.token = Some(data.token().clone());
            manager.expires_at = Some(data.expires_at());
            manager.cached_role = data.role();
            manager.user.clone_from(data.user());
        }
        manager
    }

    pub(crate) fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    /// The bearer token, or absent if none was issued or the issued one is
    /// past its expiry. Expiry is checked on every read; nothing in the
    /// client ever sees an expired token.
    pub(crate) fn token(&self) -> Option<&session::Secret> {
        match (self.token.as_ref(), self.expires_at) {
            (Some(token), Some(expires_at)) if expires_at > Utc::now() => Some(token),
            _ => None,
        }
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub(crate) fn user(&self) -> Option<&model::User> {
        self.user.as_ref()
    }

    /// True when an automatic profile fetch is still owed for this token:
    /// there is a token but no profile, and no fetch has completed yet. A
    /// manual retry may call [`Self::fetch_profile`] regardless.
    pub(crate) fn needs_profile(&self) -> bool {
        self.token().is_some() && self.user.is_none() && !self.user_fetched
    }

    pub(crate) fn state(&self) -> State {
        if self.token().is_none() {
            return if self.loading {
                State::Authenticating
            } else {
                State::Anonymous
            };
        }
        if self.user.is_some() {
            return State::Authenticated;
        }
        match self.last_error {
            Some((error::Class::Network, _)) | None => State::ProfileLoading,
            Some(_) if !self.user_fetched => State::ProfileLoading,
            Some(_) => State::Error,
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let known_role = self.user.as_ref().map(|user| user.role).or(self.cached_role);
        let role = match known_role {
            Some(role) if self.role_verified => RoleClaim::Verified(role),
            Some(role) if !self.user_fetched => RoleClaim::Provisional(role),
            _ => RoleClaim::Unknown,
        };

        Snapshot {
            state: self.state(),
            role,
            user_fetched: self.user_fetched,
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) async fn login(
        &mut self,
        email: &str,
        password: &SecretString,
        persist_long: bool,
    ) -> Result<&model::User> {
        self.loading = true;
        self.last_error = None;
        let result = self.api.login(email, password).await;
        self.loading = false;

        match result {
            Ok(payload) => Ok(self.accept(payload, persist_long).await),
            Err(e) => Err(self.reject(e)),
        }
    }

    pub(crate) async fn register(
        &mut self,
        full_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<&model::User> {
        self.loading = true;
        self.last_error = None;
        let result = self.api.register(full_name, email, password).await;
        self.loading = false;

        match result {
            Ok(payload) => Ok(self.accept(payload, false).await),
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Fetch the authoritative profile for the current token.
    ///
    /// Failure handling is the heart of the session contract: an
    /// authorization failure resets the whole session (the token is dead), a
    /// network failure leaves the token in place so a later retry can
    /// succeed without signing in again.
    pub(crate) async fn fetch_profile(&mut self) -> Result<&model::User> {
        let token = match self.token() {
            Some(token) => token.clone(),
            None => return Err(error::Api::Unauthorized.into()),
        };

        self.loading = true;
        let result = self.api.me(&token).await;
        self.loading = false;
        self.user_fetched = true;

        match result {
            Ok(user) => {
                if self.cached_role.is_some() && self.cached_role != Some(user.role) {
                    warn!("Cached role disagrees with the profile; the profile wins");
                }
                self.cached_role = Some(user.role);
                self.role_verified = true;
                self.last_error = None;

                if let Some(expires_at) = self.expires_at {
                    let data =
                        session::Data::new(token, expires_at).with_user(user.clone());
                    self.store.put(&data).await;
                }
                Ok(&*self.user.insert(user))
            }
            Err(e) if e.class() == error::Class::Authorization => {
                // Expected consequence of expiry, handled silently.
                debug!("Profile fetch rejected; discarding the session");
                self.reset().await;
                Err(e)
            }
            Err(e) => {
                self.last_error = Some((e.class(), e.to_string()));
                Err(e)
            }
        }
    }

    /// Sign out. The server call is best-effort; local state is cleared no
    /// matter what it does.
    pub(crate) async fn logout(&mut self) {
        if let Some(token) = self.token().cloned() {
            if let Err(e) = self.api.logout(&token).await {
                warn!("Server-side sign-out failed, clearing the local session anyway: {e}");
            }
        }
        self.reset().await;
    }

    async fn accept(&mut self, payload: model::AuthPayload, persist_long: bool) -> &model::User {
        let token = session::Secret::new(payload.token);
        let expires_at = session::expiry(persist_long);

        let data = session::Data::new(token.clone(), expires_at).with_user(payload.user.clone());
        self.store.put(&data).await;

        self.token = Some(token);
        self.expires_at = Some(expires_at);
        self.cached_role = Some(payload.user.role);
        self.role_verified = true;
        self.user_fetched = false;
        self.last_error = None;
        &*self.user.insert(payload.user)
    }

    fn reject(&mut self, e: error::Error) -> error::Error {
        self.last_error = Some((e.class(), e.to_string()));
        e
    }

    async fn reset(&mut self) {
        self.store.clear().await;
        self.token = None;
        self.expires_at = None;
        self.user = None;
        self.cached_role = None;
        self.role_verified = false;
        self.user_fetched = false;
        self.loading = false;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use chrono::Duration;

    use crate::{api::fake::Fake, error::Result, storage::Memory, storage::Storage as _};

    use super::*;

    fn user(role: model::Role) -> model::User {
        model::User {
            id: "64aa01".to_owned(),
            full_name: "Ada Obi".to_owned(),
            email: "a@b.com".to_owned(),
            role,
        }
    }

    fn network_timeout() -> error::Error {
        io::Error::from(io::ErrorKind::TimedOut).into()
    }

    async fn storage_with_token() -> Memory<session::Data> {
        let mut storage = Memory::new();
        let data = session::Data::new(
            session::Secret::new("persisted-token"),
            Utc::now() + Duration::hours(1),
        )
        .with_role(model::Role::User);
        storage.update(&data).await.unwrap();
        storage
    }

    #[tokio::test]
    async fn login_transitions_anonymous_to_authenticated() -> Result<()> {
        let api = Fake::new();
        api.expect_login(Ok(model::AuthPayload {
            token: "fresh-token".to_owned(),
            user: user(model::Role::User),
        }));

        let mut manager = Manager::restore(api, Memory::new()).await;
        assert_eq!(manager.state(), State::Anonymous);

        let signed_in = manager
            .login("a@b.com", &SecretString::new("secret123".to_owned()), false)
            .await?;
        assert_eq!(signed_in.email, "a@b.com");
        assert_eq!(manager.state(), State::Authenticated);
        assert!(manager.is_authenticated());
        // The profile came with the login response; no fetch has completed.
        assert!(!manager.snapshot().user_fetched);

        // Token and user were persisted as a unit.
        let persisted = manager.store.get().await.expect("nothing persisted");
        assert_eq!(persisted.token().reveal(), "fresh-token");
        assert!(persisted.user().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credentials_leave_the_session_anonymous() {
        let api = Fake::new();
        api.expect_login(Err(error::Api::Business {
            message: "Invalid email or password".to_owned(),
        }
        .into()));

        let mut manager = Manager::restore(api, Memory::new()).await;
        let err = manager
            .login("a@b.com", &SecretString::new("wrong".to_owned()), false)
            .await
            .expect_err("login accepted");

        assert_eq!(err.class(), error::Class::Business);
        assert_eq!(manager.state(), State::Anonymous);
        assert!(manager.token().is_none());
        assert!(manager.store.get().await.is_none());
        assert_eq!(
            manager.snapshot().last_error.map(|(class, _)| class),
            Some(error::Class::Business)
        );
    }

    #[tokio::test]
    async fn expired_token_reads_as_absent_everywhere() {
        let mut storage = Memory::new();
        let data = session::Data::new(
            session::Secret::new("stale"),
            Utc::now() - Duration::minutes(5),
        );
        storage.update(&data).await.unwrap();

        let manager = Manager::restore(Fake::new(), storage).await;
        assert!(manager.token().is_none());
        assert!(!manager.is_authenticated());
        assert_eq!(manager.state(), State::Anonymous);
    }

    #[tokio::test]
    async fn restore_with_token_but_no_profile_wants_a_fetch() {
        let manager = Manager::restore(Fake::new(), storage_with_token().await).await;

        assert_eq!(manager.state(), State::ProfileLoading);
        assert!(manager.needs_profile());
        assert_eq!(
            manager.snapshot().role,
            RoleClaim::Provisional(model::Role::User)
        );
    }

    #[tokio::test]
    async fn network_failure_keeps_the_token_and_a_retry_recovers() -> Result<()> {
        let api = Fake::new();
        api.expect_me(Err(network_timeout()));
        api.expect_me(Ok(user(model::Role::User)));

        let mut manager = Manager::restore(api, storage_with_token().await).await;

        let err = manager.fetch_profile().await.expect_err("fetch succeeded");
        assert_eq!(err.class(), error::Class::Network);
        assert!(manager.token().is_some(), "token destroyed by network error");
        assert!(manager.user().is_none());
        assert_eq!(manager.state(), State::ProfileLoading);
        assert!(!manager.needs_profile(), "automatic re-fetch must be gated");

        // The manual retry succeeds without a fresh sign-in.
        let fetched = manager.fetch_profile().await?;
        assert_eq!(fetched.email, "a@b.com");
        assert_eq!(manager.state(), State::Authenticated);
        Ok(())
    }

    #[tokio::test]
    async fn authorization_failure_resets_to_anonymous() {
        let api = Fake::new();
        api.expect_me(Err(error::Api::Unauthorized.into()));

        let mut manager = Manager::restore(api, storage_with_token().await).await;
        let err = manager.fetch_profile().await.expect_err("fetch succeeded");

        assert_eq!(err.class(), error::Class::Authorization);
        assert_eq!(manager.state(), State::Anonymous);
        assert!(manager.token().is_none());
        assert!(manager.user().is_none());
        assert!(manager.store.get().await.is_none());
    }

    #[tokio::test]
    async fn profile_fetch_reconciles_the_cached_role() -> Result<()> {
        let mut storage = Memory::new();
        let data = session::Data::new(
            session::Secret::new("persisted-token"),
            Utc::now() + Duration::hours(1),
        )
        .with_role(model::Role::Admin);
        storage.update(&data).await?;

        let api = Fake::new();
        api.expect_me(Ok(user(model::Role::User)));

        let mut manager = Manager::restore(api, storage).await;
        assert_eq!(
            manager.snapshot().role,
            RoleClaim::Provisional(model::Role::Admin)
        );

        let _user = manager.fetch_profile().await?;
        assert_eq!(
            manager.snapshot().role,
            RoleClaim::Verified(model::Role::User)
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_fetch_downgrades_the_role_claim_to_unknown() {
        let api = Fake::new();
        api.expect_me(Err(error::Api::Business {
            message: "profile backend down".to_owned(),
        }
        .into()));

        let mut manager = Manager::restore(api, storage_with_token().await).await;
        let _err = manager.fetch_profile().await.expect_err("fetch succeeded");

        assert_eq!(manager.snapshot().role, RoleClaim::Unknown);
        assert_eq!(manager.state(), State::Error);
    }

    #[tokio::test]
    async fn logout_clears_locally_even_when_the_server_call_fails() {
        let api = Fake::new();
        api.expect_logout(Err(network_timeout()));

        let mut manager = Manager::restore(api, storage_with_token().await).await;
        manager.logout().await;

        assert_eq!(manager.state(), State::Anonymous);
        assert!(manager.token().is_none());
        assert!(manager.store.get().await.is_none());
    }
}
