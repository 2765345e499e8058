// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use log::error;

use crate::{
    error::{self, Result},
    money::Amount,
    payment, service,
};

/// Buy airtime, a data bundle, a TV package or electricity units.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// How to pay: debit your wallet, or pay by card through the checkout
    /// page.
    #[arg(long, short, value_enum, default_value_t = Method::Wallet)]
    method: Method,

    #[clap(subcommand)]
    service: Service,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum Method {
    Wallet,
    Card,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.to_possible_value().ok_or(std::fmt::Error)?;
        write!(f, "{}", value.get_name())
    }
}

#[derive(Debug, Subcommand)]
enum Service {
    /// Airtime for a phone number.
    Airtime {
        /// The mobile network of the number.
        #[arg(value_enum)]
        network: service::Network,

        /// The phone number to top up.
        phone_number: service::PhoneNumber,

        /// Amount in naira.
        amount: Amount,
    },

    /// A data bundle for a phone number.
    Data {
        /// The mobile network of the number.
        #[arg(value_enum)]
        network: service::Network,

        /// The phone number to top up.
        phone_number: service::PhoneNumber,

        /// The bundle identifier, as listed by the provider.
        plan: String,

        /// Price of the bundle in naira.
        amount: Amount,
    },

    /// A TV subscription package for a smartcard.
    Tv {
        /// The TV provider.
        #[arg(value_enum)]
        provider: service::TvProvider,

        /// The 10-digit smartcard (IUC) number on the decoder.
        smart_card_number: service::SmartcardNumber,

        /// The package identifier, as listed by the provider.
        package: String,

        /// Price of the package in naira.
        amount: Amount,
    },

    /// Electricity units for a meter.
    Electricity {
        /// The distribution company the meter belongs to.
        #[arg(value_enum)]
        disco: service::Disco,

        /// The meter number.
        meter_number: service::MeterNumber,

        /// Whether the meter is prepaid or postpaid.
        #[arg(value_enum)]
        meter_type: service::MeterType,

        /// Amount in naira.
        amount: Amount,
    },
}

impl Service {
    fn into_order(self) -> service::Order {
        match self {
            Self::Airtime {
                network,
                phone_number,
                amount,
            } => service::Order {
                amount,
                details: service::Details::Airtime {
                    network,
                    phone_number,
                },
            },
            Self::Data {
                network,
                phone_number,
                plan,
                amount,
            } => service::Order {
                amount,
                details: service::Details::Data {
                    network,
                    phone_number,
                    plan,
                },
            },
            Self::Tv {
                provider,
                smart_card_number,
                package,
                amount,
            } => service::Order {
                amount,
                details: service::Details::Tv {
                    provider,
                    smart_card_number,
                    package,
                },
            },
            Self::Electricity {
                disco,
                meter_number,
                meter_type,
                amount,
            } => service::Order {
                amount,
                details: service::Details::Electricity {
                    disco,
                    meter_number,
                    meter_type,
                },
            },
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context<'_>) -> Result<()> {
        let order = self.service.into_order();
        let token = ctx
            .manager
            .token()
            .cloned()
            .ok_or(error::Api::Unauthorized)?;

        let outcome = match self.method {
            Method::Wallet => {
                let result = payment::pay_from_wallet(ctx.api.as_ref(), &token, &order).await;
                ctx.monitor.observe(&result);
                result?
            }
            Method::Card => {
                let public_key = ctx.public_key.as_deref().ok_or_else(|| {
                    error!(
                        "Card payments need the checkout public key (--public-key or \
                         TOPUP_PUBLIC_KEY)"
                    );
                    error::Error::Command
                })?;
                let payer = match ctx.manager.user() {
                    Some(user) => user.email.clone(),
                    None => {
                        error!("Your profile has not loaded yet; retry once you are back online");
                        return Err(error::Error::Command);
                    }
                };

                let result = payment::pay_with_card(
                    ctx.api.as_ref(),
                    ctx.widget.as_ref(),
                    &token,
                    &payer,
                    public_key,
                    &order,
                )
                .await;
                ctx.monitor.observe(&result);
                result?
            }
        };

        match outcome {
            payment::Outcome::Succeeded { message } => {
                println!("{message}");
                Ok(())
            }
            payment::Outcome::Cancelled => {
                println!("Payment cancelled");
                Ok(())
            }
            payment::Outcome::Failed { message } => {
                error!("{message}");
                Err(error::Error::Command)
            }
        }
    }
}
