// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::money::Amount;

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match *self {
            Self::User => "user",
            Self::Admin => "admin",
        })
    }
}

/// The profile payload returned by `auth/me` and embedded in the login and
/// registration responses.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct User {
    pub(crate) id: String,
    #[serde(rename = "fullname")]
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) role: Role,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AuthPayload {
    pub(crate) token: String,
    pub(crate) user: User,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Balance {
    pub(crate) balance: Amount,
}

/// Result of asking the service to finalize a card payment by reference.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct VerifyReceipt {
    pub(crate) status: VerifyStatus,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum VerifyStatus {
    Success,
    Failed,
    Abandoned,
    #[serde(other)]
    Unknown,
}

/// Result of a wallet purchase. Some service endpoints capitalize the status
/// key; accept both spellings.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PurchaseReceipt {
    #[serde(alias = "Status")]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// Customer identity returned by the meter and smartcard lookups. The
/// `invalid` flag is authoritative: a purchase must not be submitted when it
/// is set, whatever else the payload contains.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Customer {
    #[serde(default)]
    pub(crate) invalid: bool,
    #[serde(default, alias = "Customer_Name")]
    pub(crate) name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Tabled)]
pub(crate) struct Transaction {
    #[serde(rename = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[serde(rename = "type")]
    #[tabled(rename = "Type")]
    pub(crate) kind: String,
    #[tabled(rename = "Amount")]
    pub(crate) amount: Amount,
    #[tabled(rename = "Status")]
    pub(crate) status: String,
    #[serde(default)]
    #[tabled(rename = "Reference", display_with = "Self::format_reference")]
    pub(crate) reference: Option<String>,
    #[serde(rename = "createdAt")]
    #[tabled(rename = "Date", display_with = "Self::format_created_at")]
    pub(crate) created_at: DateTime<Utc>,
}

impl Transaction {
    fn format_reference(reference: &Option<String>) -> String {
        reference.clone().unwrap_or_default()
    }

    fn format_created_at(created_at: &DateTime<Utc>) -> String {
        created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct HistoryPage {
    pub(crate) transactions: Vec<Transaction>,
    #[serde(default)]
    pub(crate) total: u64,
    #[serde(default)]
    pub(crate) page: u32,
}

#[cfg(test)]
mod tests {
    use crate::error::Result;

    use super::*;

    #[test]
    fn purchase_receipt_accepts_either_status_key() -> Result<()> {
        let lower: PurchaseReceipt = serde_json::from_str(r#"{"status": "successful"}"#)?;
        let upper: PurchaseReceipt =
            serde_json::from_str(r#"{"Status": "successful", "message": "Airtime delivered"}"#)?;

        assert_eq!(lower.status, "successful");
        assert_eq!(upper.status, "successful");
        assert_eq!(upper.message.as_deref(), Some("Airtime delivered"));
        Ok(())
    }

    #[test]
    fn verify_status_tolerates_unknown_values() -> Result<()> {
        let receipt: VerifyReceipt = serde_json::from_str(r#"{"status": "reversed"}"#)?;
        assert_eq!(receipt.status, VerifyStatus::Unknown);
        Ok(())
    }

    #[test]
    fn user_round_trips_the_wire_field_names() -> Result<()> {
        let user: User = serde_json::from_str(
            r#"{"id": "64aa01", "fullname": "Ada Obi", "email": "ada@example.com", "role": "admin"}"#,
        )?;
        assert_eq!(user.full_name, "Ada Obi");
        assert_eq!(user.role, Role::Admin);

        let encoded = serde_json::to_string(&user)?;
        assert!(encoded.contains(r#""fullname":"Ada Obi""#));
        Ok(())
    }
}
