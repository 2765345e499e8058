// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    io::{self, BufRead},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use clap::Parser;
use futures_util::StreamExt;
use tokio::{signal, task};
use tokio_stream::wrappers::WatchStream;

use crate::{
    api::Api as _,
    error::{self, Result},
    poller::Poller,
};

/// Show your wallet balance.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Keep watching the balance until interrupted.
    #[arg(long, short)]
    watch: bool,

    /// Seconds between refreshes while watching.
    #[arg(long, short, default_value_t = 30)]
    interval: u64,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        let token = ctx
            .manager
            .token()
            .cloned()
            .ok_or(error::Api::Unauthorized)?;

        if !self.watch {
            let result = ctx.api.balance(&token).await;
            ctx.monitor.observe(&result);
            println!("{}", result?.balance);
            return Ok(());
        }

        let poller = Poller::spawn(
            Arc::clone(&ctx.api),
            token,
            Duration::from_secs(self.interval.max(1)),
            Arc::clone(&ctx.monitor),
        );
        let mut updates = WatchStream::new(poller.subscribe());

        // Pressing enter asks the monitor for an immediate refresh, the
        // manual retry affordance while offline.
        let trigger = {
            let monitor = Arc::clone(&ctx.monitor);
            task::spawn_blocking(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    if line.is_err() {
                        break;
                    }
                    monitor.request_retry();
                }
            })
        };

        println!("Watching your balance; press enter to refresh, ctrl-c to stop.");
        let outcome = loop {
            tokio::select! {
                update = updates.next() => match update {
                    Some(Some(balance)) => println!("{}", balance.balance),
                    Some(None) => {}
                    None => break Ok(()),
                },
                interrupted = signal::ctrl_c() => {
                    break interrupted.map_err(Into::into);
                }
            }
        };

        trigger.abort();
        outcome
    }
}
