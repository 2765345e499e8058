// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;

use crate::{api, error::Result, manager, prompt, reachability, session, storage, widget};

pub(crate) mod balance;
pub(crate) mod buy;
pub(crate) mod history;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod register;
pub(crate) mod whoami;

pub(crate) type AppManager =
    manager::Manager<Arc<dyn api::Api>, Box<dyn storage::Storage<session::Data>>>;

/// Everything a command may touch. The manager stays the single owner of
/// session state; commands reach the service through the same `Api` handle
/// the manager uses.
pub(crate) struct Context<'app> {
    pub(crate) api: Arc<dyn api::Api>,
    pub(crate) manager: &'app mut AppManager,
    pub(crate) monitor: Arc<reachability::Monitor>,
    pub(crate) widget: Box<dyn widget::Widget>,
    pub(crate) prompt: Arc<dyn prompt::Interact>,
    pub(crate) public_key: Option<String>,
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: &mut Context<'_>) -> Result<()>;
}
