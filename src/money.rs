// SPDX-FileCopyrightText: 2025-2026 Topup Contributors
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Serialize};

use crate::error;

const KOBO_PER_NAIRA: u64 = 100;

/// An amount of naira, held internally as whole kobo.
///
/// The hosted checkout contract takes minor units (a factor of exactly 100
/// from the major unit); that conversion lives in [`Amount::minor_units`] and
/// nowhere else. The service itself speaks major units on the wire.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct Amount {
    kobo: u64,
}

impl Amount {
    pub(crate) const fn from_naira(naira: u64) -> Self {
        Self {
            kobo: naira * KOBO_PER_NAIRA,
        }
    }

    pub(crate) const fn from_minor_units(kobo: u64) -> Self {
        Self { kobo }
    }

    /// The amount in kobo, as handed to the payment widget.
    pub(crate) const fn minor_units(self) -> u64 {
        self.kobo
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let naira = self.kobo / KOBO_PER_NAIRA;
        let kobo = self.kobo % KOBO_PER_NAIRA;

        let digits = naira.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, digit) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        if kobo == 0 {
            write!(f, "\u{20a6}{grouped}")
        } else {
            write!(f, "\u{20a6}{grouped}.{kobo:02}")
        }
    }
}

impl FromStr for Amount {
    type Err = error::Validation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || error::Validation::Amount(s.to_owned());
        let trimmed = s.trim().trim_start_matches('\u{20a6}');

        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(reject());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || frac.len() > 2 {
            return Err(reject());
        }

        let naira: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| reject())?
        };
        let kobo: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<2}");
            if !padded.chars().all(|c| c.is_ascii_digit()) {
                return Err(reject());
            }
            padded.parse().map_err(|_| reject())?
        };

        naira
            .checked_mul(KOBO_PER_NAIRA)
            .and_then(|minor| minor.checked_add(kobo))
            .map(|kobo| Self { kobo })
            .ok_or_else(reject)
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.kobo % KOBO_PER_NAIRA == 0 {
            serializer.serialize_u64(self.kobo / KOBO_PER_NAIRA)
        } else {
            #[allow(clippy::cast_precision_loss)]
            let major = self.kobo as f64 / KOBO_PER_NAIRA as f64;
            serializer.serialize_f64(major)
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative amount of naira")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                value
                    .checked_mul(KOBO_PER_NAIRA)
                    .map(Amount::from_minor_units)
                    .ok_or_else(|| E::custom("amount out of range"))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value)
                    .map_err(|_| E::custom("amount must not be negative"))
                    .and_then(|value| self.visit_u64(value))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                #[allow(clippy::cast_precision_loss)]
                let minor = (value * KOBO_PER_NAIRA as f64).round();
                if !(0.0..=u64::MAX as f64).contains(&minor) {
                    return Err(E::custom("amount out of range"));
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let kobo = minor as u64;
                Ok(Amount::from_minor_units(kobo))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_test::{assert_de_tokens, assert_ser_tokens, Token};

    use crate::error::Result;

    use super::*;

    #[test]
    fn parses_decimal_strings() -> Result<()> {
        assert_eq!(Amount::from_str("100")?, Amount::from_naira(100));
        assert_eq!(Amount::from_str("1500.5")?, Amount::from_minor_units(150_050));
        assert_eq!(Amount::from_str("0.25")?, Amount::from_minor_units(25));
        assert_eq!(Amount::from_str("\u{20a6}2000")?, Amount::from_naira(2000));
        Ok(())
    }

    #[test]
    fn rejects_malformed_strings() {
        for input in ["", "-100", "12.345", "1,000", "abc", "."] {
            assert!(Amount::from_str(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn displays_with_currency_sign_and_grouping() {
        assert_eq!(Amount::from_naira(100).to_string(), "\u{20a6}100");
        assert_eq!(Amount::from_naira(50_000).to_string(), "\u{20a6}50,000");
        assert_eq!(
            Amount::from_minor_units(1_234_567).to_string(),
            "\u{20a6}12,345.67"
        );
    }

    #[test]
    fn minor_units_are_a_factor_of_one_hundred() {
        assert_eq!(Amount::from_naira(100).minor_units(), 10_000);
    }

    #[test]
    fn serializes_major_units() {
        assert_ser_tokens(&Amount::from_naira(2500), &[Token::U64(2500)]);
        assert_ser_tokens(&Amount::from_minor_units(150_050), &[Token::F64(1500.5)]);
    }

    #[test]
    fn deserializes_from_numbers() {
        assert_de_tokens(&Amount::from_naira(300), &[Token::U64(300)]);
        assert_de_tokens(&Amount::from_minor_units(99_999), &[Token::F64(999.99)]);
    }
}
