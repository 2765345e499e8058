// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    error::{self, Result},
    prompt::Interact as _,
};

/// Sign in to your account.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The email address of your account.
    #[clap()]
    email: String,

    /// Stay signed in for 30 days instead of one hour.
    #[arg(long, short)]
    remember: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        let mut rejection: Option<String> = None;

        loop {
            if let Some(ref message) = rejection {
                eprintln!("Error: {message}");
            }

            let password = ctx
                .prompt
                .secret("Password")
                .await?
                .ok_or(error::Error::Cancelled)?;

            let result = ctx
                .manager
                .login(&self.email, &password, self.remember)
                .await;
            ctx.monitor.observe(&result);

            match result {
                Ok(user) => {
                    println!("Signed in as {} ({})", user.full_name, user.role);
                    return Ok(());
                }
                // The service rejected the credentials; ask again with its
                // message, the same way a login form would.
                Err(e) if e.class() == error::Class::Business => {
                    rejection = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }
    }
}
