// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;
use secrecy::ExposeSecret;

use crate::{
    error::{self, Result},
    prompt::Interact as _,
};

/// Create a new account and sign in.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Your full name.
    #[clap()]
    full_name: String,

    /// The email address to register with.
    #[clap()]
    email: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        let password = ctx
            .prompt
            .secret("Password")
            .await?
            .ok_or(error::Error::Cancelled)?;
        let confirmation = ctx
            .prompt
            .secret("Confirm password")
            .await?
            .ok_or(error::Error::Cancelled)?;
        if password.expose_secret() != confirmation.expose_secret() {
            error!("The passwords do not match");
            return Err(error::Error::Command);
        }

        let result = ctx
            .manager
            .register(&self.full_name, &self.email, &password)
            .await;
        ctx.monitor.observe(&result);

        let user = result?;
        println!("Welcome, {}! Your account is ready.", user.full_name);
        Ok(())
    }
}
