// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table};

use crate::{
    api::Api as _,
    error::{self, Result},
    service,
};

/// List your past transactions, newest first.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The page to fetch.
    #[arg(long, short, default_value_t = 1)]
    page: u32,

    /// Transactions per page.
    #[arg(long, short = 'n', default_value_t = 20)]
    limit: u32,

    /// Only show one service type.
    #[arg(long = "type", short, value_enum)]
    kind: Option<service::Kind>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        let token = ctx
            .manager
            .token()
            .cloned()
            .ok_or(error::Api::Unauthorized)?;

        let result = ctx
            .api
            .history(&token, self.page, self.limit, self.kind)
            .await;
        ctx.monitor.observe(&result);
        let page = result?;

        if page.transactions.is_empty() {
            println!("No transactions on page {}.", self.page);
        } else {
            println!("{}", Table::new(&page.transactions).with(Style::rounded()));
            println!("Page {} ({} transactions in total)", self.page, page.total);
        }
        Ok(())
    }
}
