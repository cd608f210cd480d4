// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Core identifier types for foods and ledger days.

use crate::OrderError;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a catalog food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FoodId(pub u32);

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar day keying a [`DailyLedger`](crate::DailyLedger).
///
/// The canonical text form is `YYYY-MM-DD`. Parsing is strict: unpadded
/// months or days, trailing time components and surrounding whitespace are
/// all rejected, so two spellings can never address two different ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerDate(NaiveDate);

impl LedgerDate {
    const FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from its components, `None` if it does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Normalizes an instant to the UTC calendar day it falls on.
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self(instant.date_naive())
    }

    /// Returns the date `days` calendar days earlier.
    ///
    /// Saturates at the earliest representable date.
    pub fn days_before(self, days: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN))
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for LedgerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for LedgerDate {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OrderError::InvalidDate(s.to_string());
        if s.len() != 10 {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(s, Self::FORMAT).map_err(|_| invalid())?;
        // chrono accepts unpadded fields; only the canonical spelling is a key.
        if date.format(Self::FORMAT).to_string() != s {
            return Err(invalid());
        }
        Ok(Self(date))
    }
}

impl Serialize for LedgerDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LedgerDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> LedgerDate {
        s.parse().unwrap()
    }

    #[test]
    fn parses_canonical_form() {
        let d = date("2024-03-09");
        assert_eq!(d, LedgerDate::from_ymd(2024, 3, 9).unwrap());
        assert_eq!(d.to_string(), "2024-03-09");
    }

    #[test]
    fn rejects_non_canonical_spellings() {
        for raw in ["2024-3-9", "2024-03-9", " 2024-03-09", "2024-03-09T00:00:00Z", "", "09-03-2024"] {
            assert_eq!(
                raw.parse::<LedgerDate>(),
                Err(OrderError::InvalidDate(raw.to_string())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!("2023-02-29".parse::<LedgerDate>().is_err());
        assert!("2024-13-01".parse::<LedgerDate>().is_err());
        assert!("2024-02-29".parse::<LedgerDate>().is_ok());
    }

    #[test]
    fn days_before_crosses_month_and_year() {
        assert_eq!(date("2024-03-01").days_before(1), date("2024-02-29"));
        assert_eq!(date("2024-01-03").days_before(6), date("2023-12-28"));
        assert_eq!(date("2024-01-03").days_before(0), date("2024-01-03"));
    }

    #[test]
    fn from_utc_uses_utc_day() {
        let instant = DateTime::parse_from_rfc3339("2024-05-01T23:30:00-02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(LedgerDate::from_utc(instant), date("2024-05-02"));
    }

    #[test]
    fn serde_uses_canonical_string() {
        let d = date("2024-12-31");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2024-12-31\"");
        let back: LedgerDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<LedgerDate>("\"2024-1-1\"").is_err());
    }

    #[test]
    fn food_id_is_transparent() {
        assert_eq!(serde_json::to_string(&FoodId(7)).unwrap(), "7");
        assert_eq!(FoodId(7).to_string(), "7");
    }
}
