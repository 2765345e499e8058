// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use log::{info, warn};
use tokio::sync::{watch, Notify};

use crate::error::{self, Result};

/// Tracks whether the service looks reachable, derived from observed request
/// outcomes: a network-class failure flips to offline, any completed request
/// flips back online. Also carries the manual retry trigger offered whenever
/// the client is running degraded.
pub(crate) struct Monitor {
    online: watch::Sender<bool>,
    retry: Notify,
}

impl Monitor {
    pub(crate) fn new() -> Self {
        let (online, _) = watch::channel(true);
        Self {
            online,
            retry: Notify::new(),
        }
    }

    pub(crate) fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Feed one observed request outcome into the tracker.
    pub(crate) fn observe<T>(&self, result: &Result<T>) {
        let online = match *result {
            Ok(_) => true,
            Err(ref e) => e.class() != error::Class::Network,
        };

        let changed = self.online.send_if_modified(|state| {
            let flipped = *state != online;
            *state = online;
            flipped
        });
        if changed {
            if online {
                info!("Connection to the service restored");
            } else {
                warn!("The service is unreachable; continuing offline");
            }
        }
    }

    /// Watch online/offline transitions.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    /// Ask whatever is currently waiting (the balance poller, a degraded
    /// view) to try again now instead of on its own schedule.
    pub(crate) fn request_retry(&self) {
        self.retry.notify_waiters();
    }

    pub(crate) async fn retry_requested(&self) {
        self.retry.notified().await;
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
