// SPDX-FileCopyrightText: 2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::{
    error::Result,
    metadata,
    money::Amount,
    prompt::{self, Interact as _},
};

/// One card capture handed to the external checkout provider.
#[derive(Clone, Debug)]
pub(crate) struct Checkout<'payment> {
    pub(crate) public_key: &'payment str,
    pub(crate) email: &'payment str,
    pub(crate) amount: Amount,
    pub(crate) reference: &'payment str,
}

impl Checkout<'_> {
    /// The provider takes minor units. This is the only place the conversion
    /// is applied on the way out.
    pub(crate) fn amount_minor_units(&self) -> u64 {
        self.amount.minor_units()
    }
}

/// What the provider's checkout resolved to. Closing the page without paying
/// is not a failure; it is its own outcome.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Capture {
    Completed,
    Cancelled,
}

/// The external payment widget seam. The flow in [`crate::payment`] only
/// ever sees [`Capture`]; how the card is actually collected lives behind
/// this trait.
#[async_trait]
pub(crate) trait Widget: Send + Sync {
    async fn collect(&self, checkout: &Checkout<'_>) -> Result<Capture>;
}

#[async_trait]
impl<T: Widget + ?Sized> Widget for Box<T> {
    async fn collect(&self, checkout: &Checkout<'_>) -> Result<Capture> {
        (**self).collect(checkout).await
    }
}

/// Hands the capture off to the provider's hosted checkout page and asks the
/// operator whether they completed it there.
pub(crate) struct HostedCheckout {
    base: Url,
    prompt: Arc<dyn prompt::Interact>,
}

impl HostedCheckout {
    pub(crate) fn new(base: Url, prompt: Arc<dyn prompt::Interact>) -> Self {
        Self { base, prompt }
    }

    fn checkout_url(&self, checkout: &Checkout<'_>) -> Url {
        let mut url = self.base.clone();
        let _ = url
            .query_pairs_mut()
            .append_pair("key", checkout.public_key)
            .append_pair("email", checkout.email)
            .append_pair("amount", &checkout.amount_minor_units().to_string())
            .append_pair("reference", checkout.reference);
        url
    }
}

#[async_trait]
impl Widget for HostedCheckout {
    async fn collect(&self, checkout: &Checkout<'_>) -> Result<Capture> {
        println!(
            "Complete your {} card payment in a browser:\n\n  {}\n",
            *metadata::CLIENT_DISPLAY_NAME,
            self.checkout_url(checkout)
        );

        match self.prompt.confirm("Did you complete the payment?").await? {
            Some(true) => Ok(Capture::Completed),
            Some(false) | None => Ok(Capture::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use crate::error::Result;

    use super::*;

    struct Always(bool);

    #[async_trait]
    impl prompt::Interact for Always {
        async fn secret(&self, _label: &str) -> Result<Option<SecretString>> {
            Ok(None)
        }

        async fn confirm(&self, _question: &str) -> Result<Option<bool>> {
            Ok(Some(self.0))
        }
    }

    fn checkout(amount: Amount) -> Checkout<'static> {
        Checkout {
            public_key: "pk_test_abc",
            email: "a@b.com",
            amount,
            reference: "ref-001",
        }
    }

    #[test]
    fn checkout_url_carries_minor_units() {
        let hosted = HostedCheckout::new(
            "https://checkout.example.com/pay".parse().expect("url"),
            Arc::new(Always(true)),
        );

        let url = hosted.checkout_url(&checkout(Amount::from_naira(1_500)));
        let query = url.query().expect("no query").to_owned();
        assert!(query.contains("amount=150000"), "query was {query}");
        assert!(query.contains("reference=ref-001"));
    }

    #[tokio::test]
    async fn declining_the_confirmation_is_a_cancellation() -> Result<()> {
        let hosted = HostedCheckout::new(
            "https://checkout.example.com/pay".parse().expect("url"),
            Arc::new(Always(false)),
        );

        let capture = hosted.collect(&checkout(Amount::from_naira(500))).await?;
        assert_eq!(capture, Capture::Cancelled);
        Ok(())
    }
}
