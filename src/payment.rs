// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use log::info;

use crate::{
    api::Api,
    error::{self, Result},
    model,
    money::Amount,
    service, session,
    widget::{Capture, Checkout, Widget},
};

/// Lifecycle of one in-flight card payment. Transitions only move forward;
/// cancellation is terminal from any non-terminal state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Status {
    Initialized,
    WidgetOpen,
    Verifying,
    Succeeded,
    Failed,
    Cancelled,
}

impl Status {
    pub(crate) const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub(crate) const fn can_advance(self, next: Self) -> bool {
        // LINT: Everything not listed is an illegal transition, including any
        // future states.
        #[allow(clippy::wildcard_enum_match_arm, clippy::match_like_matches_macro)]
        match (self, next) {
            (Self::Initialized, Self::WidgetOpen)
            | (Self::WidgetOpen, Self::Verifying)
            | (Self::Verifying, Self::Succeeded | Self::Failed)
            | (Self::Initialized | Self::WidgetOpen | Self::Verifying, Self::Cancelled) => true,
            _ => false,
        }
    }
}

/// One in-flight card payment: the reference minted by the service plus the
/// order it was minted for. Never persisted; an interrupted payment starts
/// over from scratch.
#[derive(Clone, Debug)]
pub(crate) struct Pending {
    reference: String,
    kind: service::Kind,
    amount: Amount,
    status: Status,
}

impl Pending {
    fn new(reference: String, order: &service::Order) -> Self {
        Self {
            reference,
            kind: order.details.kind(),
            amount: order.amount,
            status: Status::Initialized,
        }
    }

    pub(crate) fn reference(&self) -> &str {
        &self.reference
    }

    pub(crate) const fn kind(&self) -> service::Kind {
        self.kind
    }

    pub(crate) const fn amount(&self) -> Amount {
        self.amount
    }

    pub(crate) const fn status(&self) -> Status {
        self.status
    }

    fn advance(&mut self, next: Status) {
        debug_assert!(
            self.status.can_advance(next),
            "illegal payment transition {:?} -> {next:?}",
            self.status
        );
        self.status = next;
    }
}

/// How a payment attempt ended, from the payer's point of view. Cancellation
/// is deliberately not a failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    Succeeded { message: String },
    Failed { message: String },
    Cancelled,
}

/// Card payment: initialize with the service, capture through the external
/// widget, then verify by reference. The steps are strictly sequential, and
/// verification is only ever reached off a successful capture.
pub(crate) async fn pay_with_card<A: Api + ?Sized, W: Widget + ?Sized>(
    api: &A,
    widget: &W,
    token: &session::Secret,
    payer_email: &str,
    public_key: &str,
    order: &service::Order,
) -> Result<Outcome> {
    order.validate()?;
    confirm_customer(api, token, &order.details).await?;

    // Step 1: a failure here is surfaced verbatim and ends the attempt; no
    // automatic retry.
    let reference = api
        .initialize_direct_payment(token, payer_email, order)
        .await?;
    let mut pending = Pending::new(reference, order);

    // Step 2: hand off to the provider.
    pending.advance(Status::WidgetOpen);
    let capture = widget
        .collect(&Checkout {
            public_key,
            email: payer_email,
            amount: pending.amount(),
            reference: pending.reference(),
        })
        .await?;

    match capture {
        Capture::Cancelled => {
            // The service keeps its pending transaction; reconciling it is
            // the service's job, not ours.
            pending.advance(Status::Cancelled);
            Ok(Outcome::Cancelled)
        }
        Capture::Completed => {
            // Step 3: finalize by reference, exactly once.
            pending.advance(Status::Verifying);
            let kind = pending.kind();
            match api.verify_payment(token, pending.reference(), kind).await {
                Ok(receipt) if receipt.status == model::VerifyStatus::Success => {
                    pending.advance(Status::Succeeded);
                    Ok(Outcome::Succeeded {
                        message: receipt
                            .message
                            .unwrap_or_else(|| format!("{kind} payment verified")),
                    })
                }
                Ok(receipt) => {
                    pending.advance(Status::Failed);
                    Ok(Outcome::Failed {
                        message: receipt
                            .message
                            .unwrap_or_else(|| "The payment could not be verified".to_owned()),
                    })
                }
                Err(e) if e.class() == error::Class::Business => {
                    pending.advance(Status::Failed);
                    Ok(Outcome::Failed {
                        message: e.to_string(),
                    })
                }
                Err(e) => Err(e),
            }
        }
    }
}

/// Wallet payment: one call debits the wallet and finalizes. Steps 1 and 2
/// of the card flow do not exist here.
pub(crate) async fn pay_from_wallet<A: Api + ?Sized>(
    api: &A,
    token: &session::Secret,
    order: &service::Order,
) -> Result<Outcome> {
    order.validate()?;
    confirm_customer(api, token, &order.details).await?;

    let receipt = api.purchase(token, order).await?;
    Ok(Outcome::Succeeded {
        message: receipt
            .message
            .unwrap_or_else(|| format!("{} purchase {}", order.details.kind(), receipt.status)),
    })
}

/// Identity check gating TV and electricity purchases: the service's
/// `invalid` flag blocks submission outright, with no bypass. Airtime and
/// data have no identity to confirm.
async fn confirm_customer<A: Api + ?Sized>(
    api: &A,
    token: &session::Secret,
    details: &service::Details,
) -> Result<()> {
    let customer = match *details {
        service::Details::Electricity {
            disco,
            ref meter_number,
            meter_type,
        } => {
            api.verify_electricity(token, disco, meter_number, meter_type)
                .await?
        }
        service::Details::Tv {
            provider,
            ref smart_card_number,
            ..
        } => api.verify_tv_card(token, provider, smart_card_number).await?,
        service::Details::Airtime { .. } | service::Details::Data { .. } => return Ok(()),
    };

    if customer.invalid {
        return Err(error::Validation::CustomerRejected.into());
    }
    if let Some(name) = customer.name {
        info!("Provider confirmed the customer as {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::api::fake::Fake;

    use super::*;

    struct ScriptedWidget {
        capture: Capture,
        collected: AtomicUsize,
    }

    impl ScriptedWidget {
        fn new(capture: Capture) -> Self {
            Self {
                capture,
                collected: AtomicUsize::new(0),
            }
        }

        fn collected(&self) -> usize {
            self.collected.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Widget for ScriptedWidget {
        async fn collect(&self, checkout: &Checkout<'_>) -> Result<Capture> {
            assert_eq!(
                checkout.amount_minor_units(),
                checkout.amount.minor_units(),
                "minor-unit conversion drifted"
            );
            let _count = self.collected.fetch_add(1, Ordering::SeqCst);
            Ok(self.capture)
        }
    }

    fn token() -> session::Secret {
        session::Secret::new("token")
    }

    fn airtime_order(naira: u64) -> service::Order {
        service::Order {
            amount: Amount::from_naira(naira),
            details: service::Details::Airtime {
                network: service::Network::Mtn,
                phone_number: "08031234567".parse().expect("valid phone number"),
            },
        }
    }

    fn verified(status: model::VerifyStatus) -> model::VerifyReceipt {
        model::VerifyReceipt {
            status,
            message: None,
        }
    }

    #[test]
    fn transitions_only_move_forward() {
        assert!(Status::Initialized.can_advance(Status::WidgetOpen));
        assert!(Status::WidgetOpen.can_advance(Status::Verifying));
        assert!(Status::Verifying.can_advance(Status::Succeeded));
        assert!(Status::Verifying.can_advance(Status::Failed));

        assert!(!Status::WidgetOpen.can_advance(Status::Initialized));
        assert!(!Status::Verifying.can_advance(Status::WidgetOpen));
        assert!(!Status::Succeeded.can_advance(Status::Verifying));
    }

    #[test]
    fn cancellation_is_terminal_from_any_live_state() {
        for live in [Status::Initialized, Status::WidgetOpen, Status::Verifying] {
            assert!(live.can_advance(Status::Cancelled), "{live:?}");
        }
        for terminal in [Status::Succeeded, Status::Failed, Status::Cancelled] {
            assert!(!terminal.can_advance(Status::Cancelled), "{terminal:?}");
            assert!(terminal.is_terminal());
        }
    }

    #[tokio::test]
    async fn below_minimum_amounts_never_reach_the_service() {
        let api = Fake::new();
        let widget = ScriptedWidget::new(Capture::Completed);

        let err = pay_with_card(
            &api,
            &widget,
            &token(),
            "a@b.com",
            "pk_test",
            &airtime_order(50),
        )
        .await
        .expect_err("undersized amount accepted");

        assert_eq!(err.to_string(), "Minimum amount is \u{20a6}100");
        assert_eq!(err.class(), error::Class::Validation);
        assert!(api.calls().is_empty(), "backend was contacted");
        assert_eq!(widget.collected(), 0);
    }

    #[tokio::test]
    async fn cancelled_captures_issue_no_verify_call() -> Result<()> {
        let api = Fake::new();
        api.expect_initialize(Ok("ref-123".to_owned()));
        let widget = ScriptedWidget::new(Capture::Cancelled);

        let outcome = pay_with_card(
            &api,
            &widget,
            &token(),
            "a@b.com",
            "pk_test",
            &airtime_order(500),
        )
        .await?;

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(api.call_count("initialize"), 1);
        assert_eq!(api.call_count("verify"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn verify_runs_at_most_once_per_successful_capture() -> Result<()> {
        let api = Fake::new();
        api.expect_initialize(Ok("ref-123".to_owned()));
        api.expect_verify(Ok(verified(model::VerifyStatus::Success)));
        let widget = ScriptedWidget::new(Capture::Completed);

        let outcome = pay_with_card(
            &api,
            &widget,
            &token(),
            "a@b.com",
            "pk_test",
            &airtime_order(500),
        )
        .await?;

        assert!(matches!(outcome, Outcome::Succeeded { .. }));
        assert!(api.call_count("verify") <= widget.collected());
        assert_eq!(api.call_count("verify"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_verification_carries_the_service_message() -> Result<()> {
        let api = Fake::new();
        api.expect_initialize(Ok("ref-123".to_owned()));
        api.expect_verify(Err(error::Api::Business {
            message: "Transaction was declined".to_owned(),
        }
        .into()));
        let widget = ScriptedWidget::new(Capture::Completed);

        let outcome = pay_with_card(
            &api,
            &widget,
            &token(),
            "a@b.com",
            "pk_test",
            &airtime_order(500),
        )
        .await?;

        assert_eq!(
            outcome,
            Outcome::Failed {
                message: "Transaction was declined".to_owned()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn initialization_failures_stop_the_flow_verbatim() {
        let api = Fake::new();
        api.expect_initialize(Err(error::Api::Business {
            message: "Duplicate transaction".to_owned(),
        }
        .into()));
        let widget = ScriptedWidget::new(Capture::Completed);

        let err = pay_with_card(
            &api,
            &widget,
            &token(),
            "a@b.com",
            "pk_test",
            &airtime_order(500),
        )
        .await
        .expect_err("initialization failure swallowed");

        assert_eq!(err.to_string(), "Duplicate transaction");
        assert_eq!(widget.collected(), 0, "widget opened after a failed init");
    }

    #[tokio::test]
    async fn wallet_payments_skip_initialize_and_capture() -> Result<()> {
        let api = Fake::new();
        api.expect_purchase(Ok(model::PurchaseReceipt {
            status: "successful".to_owned(),
            message: Some("Airtime delivered".to_owned()),
        }));

        let outcome = pay_from_wallet(&api, &token(), &airtime_order(500)).await?;

        assert_eq!(
            outcome,
            Outcome::Succeeded {
                message: "Airtime delivered".to_owned()
            }
        );
        assert_eq!(api.calls(), vec!["purchase"]);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_customers_block_electricity_purchases() {
        let api = Fake::new();
        api.expect_customer(Ok(model::Customer {
            invalid: true,
            name: None,
        }));

        let order = service::Order {
            amount: Amount::from_naira(2_000),
            details: service::Details::Electricity {
                disco: service::Disco::Ikeja,
                meter_number: "04123456789".parse().expect("valid meter number"),
                meter_type: service::MeterType::Prepaid,
            },
        };

        let err = pay_from_wallet(&api, &token(), &order)
            .await
            .expect_err("invalid customer accepted");

        assert_eq!(err.class(), error::Class::Validation);
        assert_eq!(api.calls(), vec!["verify-electricity"]);
    }

    #[tokio::test]
    async fn tv_purchases_confirm_the_smartcard_first() -> Result<()> {
        let api = Fake::new();
        api.expect_customer(Ok(model::Customer {
            invalid: false,
            name: Some("Ada Obi".to_owned()),
        }));
        api.expect_purchase(Ok(model::PurchaseReceipt {
            status: "successful".to_owned(),
            message: None,
        }));

        let order = service::Order {
            amount: Amount::from_naira(5_000),
            details: service::Details::Tv {
                provider: service::TvProvider::Dstv,
                smart_card_number: "7024567890".parse()?,
                package: "compact".to_owned(),
            },
        };

        let outcome = pay_from_wallet(&api, &token(), &order).await?;
        assert!(matches!(outcome, Outcome::Succeeded { .. }));
        assert_eq!(api.calls(), vec!["verify-tv-card", "purchase"]);
        Ok(())
    }
}
