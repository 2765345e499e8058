// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod command;
mod error;
mod guard;
mod manager;
mod metadata;
mod model;
mod money;
mod payment;
mod poller;
mod prompt;
mod reachability;
mod service;
mod session;
mod storage;
mod widget;

use std::{process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use command::Command as _;
use error::Result;
use log::{debug, error, warn};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Register(command::register::Command),
    Logout(command::logout::Command),
    Whoami(command::whoami::Command),
    Balance(command::balance::Command),
    History(command::history::Command),
    Buy(command::buy::Command),
}

impl Command {
    /// How this destination is classified before it may run. Signing in and
    /// out work without a session; everything else needs one.
    const fn route(&self) -> guard::Route {
        match *self {
            Self::Login(_) | Self::Register(_) | Self::Logout(_) => guard::Route::Public,
            Self::Whoami(_) | Self::Balance(_) | Self::History(_) | Self::Buy(_) => {
                guard::Route::Protected
            }
        }
    }
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, ctx: &mut command::Context<'_>) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(ctx).await,
            Self::Register(cmd) => cmd.execute(ctx).await,
            Self::Logout(cmd) => cmd.execute(ctx).await,
            Self::Whoami(cmd) => cmd.execute(ctx).await,
            Self::Balance(cmd) => cmd.execute(ctx).await,
            Self::History(cmd) => cmd.execute(ctx).await,
            Self::Buy(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the bill-payment service API.
    #[arg(long, env = "TOPUP_API_URL", default_value = "https://api.topup.example.com", value_parser = Url::parse)]
    api_url: Url,

    /// Base URL of the provider's hosted card-checkout page.
    #[arg(long, env = "TOPUP_CHECKOUT_URL", default_value = "https://checkout.topup.example.com/pay", value_parser = Url::parse)]
    checkout_url: Url,

    /// The public key identifying this client to the checkout provider.
    /// Required for card payments only.
    #[arg(long, env = "TOPUP_PUBLIC_KEY")]
    public_key: Option<String>,

    /// Turn off saving the signed-in session between runs.
    #[arg(long)]
    no_cache_session: bool,

    #[clap(subcommand)]
    command: Command,
}

async fn get_session_storage(args: &Args) -> Box<dyn storage::Storage<session::Data>> {
    if !args.no_cache_session {
        #[cfg(feature = "secret-service")]
        match storage::SecretService::new(&args.api_url).await {
            Ok(secret_service_storage) => return Box::new(secret_service_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to the secret service: {}", e);
            }
        }

        #[cfg(feature = "keychain")]
        match storage::Keychain::new(&args.api_url) {
            Ok(keychain_storage) => return Box::new(keychain_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to Keychain: {}", e);
            }
        }

        if let Some(file_storage) = storage::File::new("session.json") {
            return Box::new(file_storage);
        }
    }

    Box::new(storage::Memory::<session::Data>::new())
}

/// Resolve the route guard for the chosen command, fetching the profile when
/// the session is rehydrated but the profile has not loaded yet. Every
/// evaluation is fresh; the last one wins.
async fn authorize(
    manager: &mut command::AppManager,
    monitor: &reachability::Monitor,
    route: guard::Route,
) -> Result<()> {
    for _attempt in 0_u8..3 {
        match guard::evaluate(&manager.snapshot(), monitor.is_online(), route) {
            guard::Decision::Allow => return Ok(()),
            guard::Decision::AllowDegraded => {
                warn!("You appear to be offline; showing saved information where possible");
                return Ok(());
            }
            guard::Decision::Loading => {
                let result = manager.fetch_profile().await;
                monitor.observe(&result);
                if let Err(ref e) = result {
                    debug!("Profile load during navigation failed: {}", e);
                }
            }
            guard::Decision::RedirectToLogin => {
                error!(
                    "You are not signed in. Run `{} login <email>` first.",
                    *metadata::CLIENT_TYPE_ID
                );
                return Err(error::Error::Command);
            }
            guard::Decision::RedirectHome => {
                error!("This command needs an administrator account.");
                return Err(error::Error::Command);
            }
            guard::Decision::Retry { message } => {
                error!(
                    "We could not load your profile: {}. Run `{} whoami` to try again.",
                    message,
                    *metadata::CLIENT_TYPE_ID
                );
                return Err(error::Error::Command);
            }
        }
    }

    Err(error::Error::Command)
}

async fn run(args: Args) -> Result<()> {
    let storage = get_session_storage(&args).await;
    let api: Arc<dyn api::Api> = Arc::new(api::Http::new(args.api_url.clone())?);
    let monitor = Arc::new(reachability::Monitor::new());
    let prompt: Arc<dyn prompt::Interact> = Arc::new(prompt::Terminal);

    let mut manager = manager::Manager::restore(Arc::clone(&api), storage).await;
    if !manager.is_persistent() {
        warn!("No session storage is available, so you will have to sign in again next time");
    }

    authorize(&mut manager, &monitor, args.command.route()).await?;

    let widget = Box::new(widget::HostedCheckout::new(
        args.checkout_url.clone(),
        Arc::clone(&prompt),
    ));
    let mut ctx = command::Context {
        api,
        manager: &mut manager,
        monitor,
        widget,
        prompt,
        public_key: args.public_key.clone(),
    };

    command::Command::execute(args.command, &mut ctx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("TOPUP_LOG", "warn")
        .write_style("TOPUP_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
