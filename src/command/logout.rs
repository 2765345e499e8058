// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::error::Result;

/// Sign out and forget the saved session.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        ctx.manager.logout().await;
        println!("Signed out.");
        Ok(())
    }
}
