// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result};

use thiserror::Error;

use crate::money::Amount;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

/// How an error must be handled, per the failure-handling contract: only
/// authorization failures may destroy session state; network failures leave
/// everything in place behind a retry affordance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Class {
    Validation,
    Authorization,
    Network,
    Business,
    Internal,
}

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("could not reach the service: {0}")]
    Network(reqwest::Error),
    #[error("HTTP transport error: {0}")]
    Http(reqwest::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("URL construction error: {0}")]
    Url(#[from] url::ParseError),
    #[error("{0}")]
    Validation(#[from] Validation),
    #[error("{0}")]
    Api(#[from] Api),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn class(&self) -> Class {
        match *self {
            Self::Validation(_) => Class::Validation,
            Self::Api(Api::Unauthorized) => Class::Authorization,
            Self::Api(Api::Business { .. } | Api::UnexpectedResponse { .. }) => Class::Business,
            Self::Network(_) => Class::Network,
            // LINT: Deliberate fall-through that should catch future kinds
            // added to the enum.
            #[allow(clippy::wildcard_enum_match_arm)]
            Self::Io(ref e) => match e.kind() {
                io::ErrorKind::ConnectionAborted
                | io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::NotConnected
                | io::ErrorKind::TimedOut => Class::Network,
                _ => Class::Internal,
            },
            Self::Http(_)
            | Self::Json(_)
            | Self::Url(_)
            | Self::Storage(_)
            | Self::Command
            | Self::Cancelled => Class::Internal,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_connect() || value.is_timeout() {
            Self::Network(value)
        } else {
            Self::Http(value)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

#[derive(Error, Debug)]
pub(crate) enum Validation {
    #[error("Minimum amount is {0}")]
    AmountBelowMinimum(Amount),
    #[error("Maximum amount is {0}")]
    AmountAboveMaximum(Amount),
    #[error("amount must be a positive number with at most two decimal places (got {0:?})")]
    Amount(String),
    #[error("phone number must be 11 digits starting with a valid network prefix (got {0:?})")]
    PhoneNumber(String),
    #[error("meter number must be 11 to 13 digits (got {0:?})")]
    MeterNumber(String),
    #[error("smartcard number must be 10 digits (got {0:?})")]
    SmartcardNumber(String),
    #[error("the provider could not confirm the customer for these details")]
    CustomerRejected,
}

#[derive(Error, Debug)]
pub(crate) enum Api {
    #[error("your session has expired; sign in again")]
    Unauthorized,
    #[error("{message}")]
    Business { message: String },
    #[error("the service sent an unexpected response (status {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[cfg(feature = "keychain")]
    #[error("no suitable project directory is available on this platform")]
    NoProjectDirs,
    #[cfg(feature = "secret-service")]
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[cfg(feature = "keychain")]
    #[error("keychain error: {0}")]
    Keychain(#[from] security_framework::base::Error),
}
