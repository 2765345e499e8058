// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error,
    manager::{RoleClaim, Snapshot, State},
    model,
};

/// How a destination is classified before it may run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Route {
    Public,
    Protected,
    Admin,
}

/// The outcome of evaluating one navigation. Later evaluations supersede
/// earlier ones; nothing here is sticky.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Decision {
    /// Run the destination.
    Allow,
    /// Run the destination, but flag the disconnected state and offer a
    /// manual retry. Being offline never forces a sign-out.
    AllowDegraded,
    /// No valid token; the destination must not run.
    RedirectToLogin,
    /// The admin check failed against the authoritative role.
    RedirectHome,
    /// A profile fetch is owed before anything can be decided.
    Loading,
    /// A non-network failure is blocking the session; offer a retry.
    Retry { message: String },
}

/// Decide whether a destination may run, given only a session snapshot, the
/// reachability flag, and the route class. Pure: evaluated fresh on every
/// navigation.
pub(crate) fn evaluate(session: &Snapshot, online: bool, route: Route) -> Decision {
    if route == Route::Public {
        return Decision::Allow;
    }

    let base = match session.state {
        State::Anonymous | State::Authenticating => return Decision::RedirectToLogin,
        State::ProfileLoading | State::Error | State::Authenticated if !online => {
            Decision::AllowDegraded
        }
        State::ProfileLoading => Decision::Loading,
        State::Error => {
            let message = session
                .last_error
                .as_ref()
                .filter(|(class, _)| *class != error::Class::Network)
                .map(|(_, message)| message.clone());
            match message {
                Some(message) => Decision::Retry { message },
                None => Decision::Allow,
            }
        }
        State::Authenticated => Decision::Allow,
    };

    if route == Route::Admin && matches!(base, Decision::Allow | Decision::AllowDegraded) {
        return match session.role {
            RoleClaim::Verified(model::Role::Admin) => base,
            // Fast path: honor the cached hint only while the authoritative
            // profile has not yet been loaded for this token.
            RoleClaim::Provisional(model::Role::Admin) if !session.user_fetched => base,
            RoleClaim::Verified(_) | RoleClaim::Provisional(_) | RoleClaim::Unknown => {
                Decision::RedirectHome
            }
        };
    }

    base
}
