// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use crate::error::Result;

/// The interactive seam: everything that blocks on the person at the
/// terminal goes through here, so flows stay testable. `None` means they
/// declined to answer (end of input), which callers treat as cancellation.
#[async_trait]
pub(crate) trait Interact: Send + Sync {
    async fn secret(&self, label: &str) -> Result<Option<SecretString>>;
    async fn confirm(&self, question: &str) -> Result<Option<bool>>;
}

#[async_trait]
impl<T: Interact + ?Sized> Interact for Box<T> {
    async fn secret(&self, label: &str) -> Result<Option<SecretString>> {
        (**self).secret(label).await
    }

    async fn confirm(&self, question: &str) -> Result<Option<bool>> {
        (**self).confirm(question).await
    }
}

pub(crate) struct Terminal;

#[async_trait]
impl Interact for Terminal {
    async fn secret(&self, label: &str) -> Result<Option<SecretString>> {
        let prompt = format!("{label}: ");
        Ok(Some(
            task::spawn_blocking(move || {
                rpassword::prompt_password(&prompt).map(SecretString::new)
            })
            .await??,
        ))
    }

    async fn confirm(&self, question: &str) -> Result<Option<bool>> {
        let prompt = format!("{question} [y/N]: ");
        task::spawn_blocking(move || {
            let mut stdout = io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;

            let mut answer = String::new();
            if io::stdin().lock().read_line(&mut answer)? == 0 {
                return Ok(None);
            }
            let answer = answer.trim().to_ascii_lowercase();
            Ok(Some(answer == "y" || answer == "yes"))
        })
        .await?
    }
}
