// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::error::Result;

/// Show the signed-in account, refreshing the profile from the service.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        let result = ctx.manager.fetch_profile().await;
        ctx.monitor.observe(&result);

        let user = result?;
        println!("{} <{}>", user.full_name, user.email);
        println!("Role: {}", user.role);
        Ok(())
    }
}
