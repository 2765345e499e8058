// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use log::warn;
use tokio::{sync::watch, task::JoinHandle, time};

use crate::{api::Api, model, reachability, session};

/// Periodic wallet-balance refresh for a live view.
///
/// The task is tied to this handle: dropping it aborts the timer, so a view
/// being torn down cannot leak its poller. A retry request on the monitor
/// refreshes immediately instead of waiting out the interval.
pub(crate) struct Poller {
    updates: watch::Receiver<Option<model::Balance>>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub(crate) fn spawn<A: Api + ?Sized + 'static>(
        api: Arc<A>,
        token: session::Secret,
        period: Duration,
        monitor: Arc<reachability::Monitor>,
    ) -> Self {
        let (tx, updates) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = monitor.retry_requested() => {}
                }

                let result = api.balance(&token).await;
                monitor.observe(&result);
                match result {
                    Ok(balance) => {
                        if tx.send(Some(balance)).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!("Balance refresh failed, keeping the last value: {e}"),
                }
            }
        });

        Self { updates, handle }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<model::Balance>> {
        self.updates.clone()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
