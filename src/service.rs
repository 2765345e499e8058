// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use inflector::Inflector;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{error, money::Amount};

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Kind {
    Airtime,
    Data,
    Tv,
    Electricity,
}

impl Kind {
    /// The path (and query) segment the service uses for this service type.
    pub(crate) const fn slug(self) -> &'static str {
        match self {
            Self::Airtime => "airtime",
            Self::Data => "data",
            Self::Tv => "tv",
            Self::Electricity => "electricity",
        }
    }

    pub(crate) const fn min_amount(self) -> Option<Amount> {
        Some(match self {
            Self::Airtime => Amount::from_naira(100),
            Self::Data => Amount::from_naira(50),
            Self::Tv | Self::Electricity => Amount::from_naira(500),
        })
    }

    pub(crate) const fn max_amount(self) -> Option<Amount> {
        match self {
            Self::Airtime => Some(Amount::from_naira(50_000)),
            Self::Data => Some(Amount::from_naira(100_000)),
            Self::Tv | Self::Electricity => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug().to_title_case())
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Network {
    Mtn,
    Glo,
    Airtel,
    #[serde(rename = "9mobile")]
    #[value(name = "9mobile")]
    NineMobile,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TvProvider {
    Dstv,
    Gotv,
    Startimes,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Disco {
    Abuja,
    Eko,
    Enugu,
    Ibadan,
    Ikeja,
    Jos,
    Kano,
    PortHarcourt,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MeterType {
    Prepaid,
    Postpaid,
}

/// An 11-digit Nigerian mobile number, validated at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PhoneNumber(String);

impl FromStr for PhoneNumber {
    type Err = error::Validation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let mut chars = digits.chars();
        let valid = digits.len() == 11
            && digits.chars().all(|c| c.is_ascii_digit())
            && chars.next() == Some('0')
            && chars.next().is_some_and(|c| matches!(c, '7' | '8' | '9'))
            && chars.next().is_some_and(|c| matches!(c, '0' | '1'));
        if valid {
            Ok(Self(digits.to_owned()))
        } else {
            Err(error::Validation::PhoneNumber(s.to_owned()))
        }
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An electricity meter number: 11 to 13 digits.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MeterNumber(String);

impl FromStr for MeterNumber {
    type Err = error::Validation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if (11..=13).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(digits.to_owned()))
        } else {
            Err(error::Validation::MeterNumber(s.to_owned()))
        }
    }
}

impl fmt::Display for MeterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 10-digit TV smartcard (IUC) number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SmartcardNumber(String);

impl FromStr for SmartcardNumber {
    type Err = error::Validation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(digits.to_owned()))
        } else {
            Err(error::Validation::SmartcardNumber(s.to_owned()))
        }
    }
}

impl fmt::Display for SmartcardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The service-specific fields of a purchase, keyed by service type. Each
/// variant carries exactly the fields its service requires, so a purchase can
/// never be submitted with another service's fields.
#[serde_as]
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Details {
    #[serde(rename_all = "camelCase")]
    Airtime {
        network: Network,
        #[serde_as(as = "DisplayFromStr")]
        phone_number: PhoneNumber,
    },
    #[serde(rename_all = "camelCase")]
    Data {
        network: Network,
        #[serde_as(as = "DisplayFromStr")]
        phone_number: PhoneNumber,
        plan: String,
    },
    #[serde(rename_all = "camelCase")]
    Tv {
        provider: TvProvider,
        #[serde_as(as = "DisplayFromStr")]
        smart_card_number: SmartcardNumber,
        package: String,
    },
    #[serde(rename_all = "camelCase")]
    Electricity {
        disco: Disco,
        #[serde_as(as = "DisplayFromStr")]
        meter_number: MeterNumber,
        meter_type: MeterType,
    },
}

impl Details {
    pub(crate) const fn kind(&self) -> Kind {
        match *self {
            Self::Airtime { .. } => Kind::Airtime,
            Self::Data { .. } => Kind::Data,
            Self::Tv { .. } => Kind::Tv,
            Self::Electricity { .. } => Kind::Electricity,
        }
    }
}

/// One validated purchase: an amount plus the service-specific fields.
#[derive(Clone, Debug)]
pub(crate) struct Order {
    pub(crate) amount: Amount,
    pub(crate) details: Details,
}

impl Order {
    /// Check the per-service amount thresholds. Field formats are enforced by
    /// the typed constructors, so this is the only check left before a
    /// network call may be made.
    pub(crate) fn validate(&self) -> Result<(), error::Validation> {
        let kind = self.details.kind();
        if let Some(min) = kind.min_amount() {
            if self.amount < min {
                return Err(error::Validation::AmountBelowMinimum(min));
            }
        }
        if let Some(max) = kind.max_amount() {
            if self.amount > max {
                return Err(error::Validation::AmountAboveMaximum(max));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result;

    use super::*;

    fn airtime_order(amount: Amount) -> Result<Order> {
        Ok(Order {
            amount,
            details: Details::Airtime {
                network: Network::Mtn,
                phone_number: "08031234567".parse()?,
            },
        })
    }

    #[test]
    fn airtime_below_the_floor_is_rejected_with_the_exact_message() -> Result<()> {
        let order = airtime_order(Amount::from_naira(50))?;
        let err = order.validate().expect_err("amount below floor accepted");

        assert_eq!(err.to_string(), "Minimum amount is \u{20a6}100");
        Ok(())
    }

    #[test]
    fn airtime_above_the_ceiling_is_rejected() -> Result<()> {
        let order = airtime_order(Amount::from_naira(60_000))?;
        assert!(order.validate().is_err());
        Ok(())
    }

    #[test]
    fn electricity_has_a_floor_but_no_ceiling() -> Result<()> {
        let details = Details::Electricity {
            disco: Disco::Ikeja,
            meter_number: "04123456789".parse()?,
            meter_type: MeterType::Prepaid,
        };

        let low = Order {
            amount: Amount::from_naira(100),
            details: details.clone(),
        };
        assert!(low.validate().is_err());

        let high = Order {
            amount: Amount::from_naira(1_000_000),
            details,
        };
        assert!(high.validate().is_ok());
        Ok(())
    }

    #[test]
    fn phone_numbers_must_look_nigerian() {
        assert!("08031234567".parse::<PhoneNumber>().is_ok());
        assert!("09121234567".parse::<PhoneNumber>().is_ok());
        for input in ["0803123456", "080312345678", "18031234567", "0203123456a"] {
            assert!(input.parse::<PhoneNumber>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn smartcard_and_meter_numbers_are_length_checked() {
        assert!("1234567890".parse::<SmartcardNumber>().is_ok());
        assert!("123456789".parse::<SmartcardNumber>().is_err());
        assert!("04123456789".parse::<MeterNumber>().is_ok());
        assert!("0412345678901234".parse::<MeterNumber>().is_err());
    }

    #[test]
    fn details_serialize_their_own_required_fields() -> Result<()> {
        let details = Details::Tv {
            provider: TvProvider::Gotv,
            smart_card_number: "7024567890".parse()?,
            package: "gotv-max".to_owned(),
        };

        let encoded = serde_json::to_value(&details)?;
        assert_eq!(
            encoded,
            serde_json::json!({
                "provider": "gotv",
                "smartCardNumber": "7024567890",
                "package": "gotv-max",
            })
        );
        Ok(())
    }

    #[test]
    fn nine_mobile_serializes_with_its_brand_name() -> Result<()> {
        let encoded = serde_json::to_string(&Network::NineMobile)?;
        assert_eq!(encoded, r#""9mobile""#);
        Ok(())
    }
}
