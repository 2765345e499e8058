// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::{
    error::{self, Result},
    model,
    money::Amount,
    service, session,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the client asks of the service. One method per endpoint;
/// classification of failures (authorization vs business vs network) happens
/// below this seam so callers only ever deal in [`error::Class`].
#[async_trait]
pub(crate) trait Api: Send + Sync {
    async fn login(&self, email: &str, password: &SecretString) -> Result<model::AuthPayload>;

    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<model::AuthPayload>;

    async fn me(&self, token: &session::Secret) -> Result<model::User>;

    async fn logout(&self, token: &session::Secret) -> Result<()>;

    async fn balance(&self, token: &session::Secret) -> Result<model::Balance>;

    async fn history(
        &self,
        token: &session::Secret,
        page: u32,
        limit: u32,
        kind: Option<service::Kind>,
    ) -> Result<model::HistoryPage>;

    /// Step one of a card payment: ask the service to create a pending
    /// transaction and mint the reference the rest of the flow is keyed by.
    async fn initialize_direct_payment(
        &self,
        token: &session::Secret,
        email: &str,
        order: &service::Order,
    ) -> Result<String>;

    /// Step three of a card payment: finalize by reference.
    async fn verify_payment(
        &self,
        token: &session::Secret,
        reference: &str,
        kind: service::Kind,
    ) -> Result<model::VerifyReceipt>;

    /// A wallet purchase: debits the wallet and finalizes in one call.
    async fn purchase(
        &self,
        token: &session::Secret,
        order: &service::Order,
    ) -> Result<model::PurchaseReceipt>;

    async fn verify_electricity(
        &self,
        token: &session::Secret,
        disco: service::Disco,
        meter: &service::MeterNumber,
        meter_type: service::MeterType,
    ) -> Result<model::Customer>;

    async fn verify_tv_card(
        &self,
        token: &session::Secret,
        provider: service::TvProvider,
        smartcard: &service::SmartcardNumber,
    ) -> Result<model::Customer>;
}

#[async_trait]
impl<T: Api + ?Sized> Api for Arc<T> {
    async fn login(&self, email: &str, password: &SecretString) -> Result<model::AuthPayload> {
        (**self).login(email, password).await
    }

    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<model::AuthPayload> {
        (**self).register(full_name, email, password).await
    }

    async fn me(&self, token: &session::Secret) -> Result<model::User> {
        (**self).me(token).await
    }

    async fn logout(&self, token: &session::Secret) -> Result<()> {
        (**self).logout(token).await
    }

    async fn balance(&self, token: &session::Secret) -> Result<model::Balance> {
        (**self).balance(token).await
    }

    async fn history(
        &self,
        token: &session::Secret,
        page: u32,
        limit: u32,
        kind: Option<service::Kind>,
    ) -> Result<model::HistoryPage> {
        (**self).history(token, page, limit, kind).await
    }

    async fn initialize_direct_payment(
        &self,
        token: &session::Secret,
        email: &str,
        order: &service::Order,
    ) -> Result<String> {
        (**self).initialize_direct_payment(token, email, order).await
    }

    async fn verify_payment(
        &self,
        token: &session::Secret,
        reference: &str,
        kind: service::Kind,
    ) -> Result<model::VerifyReceipt> {
        (**self).verify_payment(token, reference, kind).await
    }

    async fn purchase(
        &self,
        token: &session::Secret,
        order: &service::Order,
    ) -> Result<model::PurchaseReceipt> {
        (**self).purchase(token, order).await
    }

    async fn verify_electricity(
        &self,
        token: &session::Secret,
        disco: service::Disco,
        meter: &service::MeterNumber,
        meter_type: service::MeterType,
    ) -> Result<model::Customer> {
        (**self)
            .verify_electricity(token, disco, meter, meter_type)
            .await
    }

    async fn verify_tv_card(
        &self,
        token: &session::Secret,
        provider: service::TvProvider,
        smartcard: &service::SmartcardNumber,
    ) -> Result<model::Customer> {
        (**self).verify_tv_card(token, provider, smartcard).await
    }
}

#[derive(Serialize)]
struct LoginBody<'body> {
    email: &'body str,
    password: &'body str,
}

#[derive(Serialize)]
struct RegisterBody<'body> {
    fullname: &'body str,
    email: &'body str,
    password: &'body str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeBody<'body> {
    amount: Amount,
    #[serde(rename = "type")]
    kind: service::Kind,
    email: &'body str,
    service_details: &'body service::Details,
}

#[derive(Serialize)]
struct PurchaseBody<'body> {
    amount: Amount,
    #[serde(flatten)]
    details: &'body service::Details,
}

#[derive(Deserialize)]
struct InitializeEnvelope {
    data: InitializeData,
}

#[derive(Deserialize)]
struct InitializeData {
    reference: String,
}

/// The service reports rejections as `{"message": ...}` (older endpoints use
/// `error`). Anything else is an unexpected response.
#[derive(Deserialize)]
struct FailureBody {
    #[serde(alias = "error")]
    message: String,
}

pub(crate) struct Http {
    base: Url,
    client: reqwest::Client,
}

impl Http {
    pub(crate) fn new(mut base: Url) -> Result<Self> {
        // A base path without a trailing slash would lose its last segment on
        // join.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .connect_timeout(CONNECT_TIMEOUT)
                .build()?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn accepted(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(error::Api::Unauthorized.into());
        }

        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<FailureBody>(&body) {
            Ok(failure) => error::Api::Business {
                message: failure.message,
            },
            Err(_) => error::Api::UnexpectedResponse {
                status: status.as_u16(),
                body,
            },
        }
        .into())
    }

    async fn receive<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        Ok(Self::accepted(response).await?.json().await?)
    }
}

#[async_trait]
impl Api for Http {
    async fn login(&self, email: &str, password: &SecretString) -> Result<model::AuthPayload> {
        let response = self
            .client
            .post(self.endpoint("auth/login")?)
            .json(&LoginBody {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<model::AuthPayload> {
        let response = self
            .client
            .post(self.endpoint("auth/register")?)
            .json(&RegisterBody {
                fullname: full_name,
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn me(&self, token: &session::Secret) -> Result<model::User> {
        let response = self
            .client
            .get(self.endpoint("auth/me")?)
            .bearer_auth(token.reveal())
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn logout(&self, token: &session::Secret) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("auth/logout")?)
            .bearer_auth(token.reveal())
            .send()
            .await?;
        let _response = Self::accepted(response).await?;
        Ok(())
    }

    async fn balance(&self, token: &session::Secret) -> Result<model::Balance> {
        let response = self
            .client
            .get(self.endpoint("transactions/balance")?)
            .bearer_auth(token.reveal())
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn history(
        &self,
        token: &session::Secret,
        page: u32,
        limit: u32,
        kind: Option<service::Kind>,
    ) -> Result<model::HistoryPage> {
        let mut request = self
            .client
            .get(self.endpoint("transactions/history")?)
            .bearer_auth(token.reveal())
            .query(&[("page", page), ("limit", limit)]);
        if let Some(kind) = kind {
            request = request.query(&[("type", kind)]);
        }

        Self::receive(request.send().await?).await
    }

    async fn initialize_direct_payment(
        &self,
        token: &session::Secret,
        email: &str,
        order: &service::Order,
    ) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("transactions/initialize-direct-payment")?)
            .bearer_auth(token.reveal())
            .json(&InitializeBody {
                amount: order.amount,
                kind: order.details.kind(),
                email,
                service_details: &order.details,
            })
            .send()
            .await?;
        let envelope: InitializeEnvelope = Self::receive(response).await?;
        Ok(envelope.data.reference)
    }

    async fn verify_payment(
        &self,
        token: &session::Secret,
        reference: &str,
        kind: service::Kind,
    ) -> Result<model::VerifyReceipt> {
        let response = self
            .client
            .get(self.endpoint(&format!("transactions/verify-payment/{reference}"))?)
            .bearer_auth(token.reveal())
            .query(&[("type", kind)])
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn purchase(
        &self,
        token: &session::Secret,
        order: &service::Order,
    ) -> Result<model::PurchaseReceipt> {
        let path = format!("transactions/{}", order.details.kind().slug());
        let response = self
            .client
            .post(self.endpoint(&path)?)
            .bearer_auth(token.reveal())
            .json(&PurchaseBody {
                amount: order.amount,
                details: &order.details,
            })
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn verify_electricity(
        &self,
        token: &session::Secret,
        disco: service::Disco,
        meter: &service::MeterNumber,
        meter_type: service::MeterType,
    ) -> Result<model::Customer> {
        let response = self
            .client
            .get(self.endpoint("transactions/verify-electricity")?)
            .bearer_auth(token.reveal())
            .query(&[("disco", disco)])
            .query(&[("meterNumber", meter.to_string())])
            .query(&[("meterType", meter_type)])
            .send()
            .await?;
        Self::receive(response).await
    }

    async fn verify_tv_card(
        &self,
        token: &session::Secret,
        provider: service::TvProvider,
        smartcard: &service::SmartcardNumber,
    ) -> Result<model::Customer> {
        let response = self
            .client
            .get(self.endpoint("transactions/verify-tv-card")?)
            .bearer_auth(token.reveal())
            .query(&[("provider", provider)])
            .query(&[("smartCardNumber", smartcard.to_string())])
            .send()
            .await?;
        Self::receive(response).await
    }
}
