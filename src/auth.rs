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

//! Access layer.
//!
//! Credentials, password hashing and token issuance live outside this crate.
//! What lives here is the gating contract: a bearer token resolves to a
//! [`Principal`], and a principal's [`Role`] decides which [`Feature`]s it
//! may use.
//!
//! # Example
//!
//! ```
//! use order_ledger_rs::{AuthGate, Feature, FeatureSet, Principal, Role, TokenRoster};
//!
//! let mut roster = TokenRoster::new();
//! roster.insert(
//!     "t-1",
//!     Principal::new("sam", Role::Middleman(FeatureSet::from([Feature::GetWeeklySales]))),
//! );
//!
//! let sam = roster.authorize(Some("t-1")).unwrap();
//! assert!(sam.require(Feature::GetWeeklySales).is_ok());
//! assert!(sam.require(Feature::GetDailyOrders).is_err());
//! ```

use crate::AuthError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;

/// A capability that can be granted to a middleman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    ManageFoods,
    GetDailyOrders,
    GetWeeklySales,
    /// Recognized in rosters and granted to admins; no route requires it.
    AddMiddleman,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ManageFoods => "manageFoods",
            Self::GetDailyOrders => "getDailyOrders",
            Self::GetWeeklySales => "getWeeklySales",
            Self::AddMiddleman => "addMiddleman",
        };
        f.write_str(name)
    }
}

/// Features granted to a middleman.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl<const N: usize> From<[Feature; N]> for FeatureSet {
    fn from(features: [Feature; N]) -> Self {
        Self(features.into_iter().collect())
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Role tier of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Admin,
    Middleman(FeatureSet),
    Customer,
}

impl Role {
    pub fn permits(&self, feature: Feature) -> bool {
        match self {
            Role::Admin => true,
            Role::Middleman(features) => features.contains(feature),
            Role::Customer => false,
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Fails with [`AuthError::FeatureDenied`] unless the role permits `feature`.
    pub fn require(&self, feature: Feature) -> Result<(), AuthError> {
        if self.role.permits(feature) {
            Ok(())
        } else {
            Err(AuthError::FeatureDenied(feature))
        }
    }
}

/// Resolves request credentials to a principal.
pub trait AuthGate: Send + Sync {
    fn authorize(&self, bearer_token: Option<&str>) -> Result<Principal, AuthError>;
}

/// One roster line as stored on disk.
#[derive(Debug, Deserialize)]
struct RosterEntry {
    token: String,
    username: String,
    role: Role,
}

/// Static bearer-token table.
#[derive(Debug, Default)]
pub struct TokenRoster {
    principals: HashMap<String, Principal>,
}

impl TokenRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON array of `{token, username, role}` entries.
    ///
    /// ```json
    /// [
    ///   {"token": "a1", "username": "root", "role": "admin"},
    ///   {"token": "m1", "username": "sam", "role": {"middleman": ["getWeeklySales"]}},
    ///   {"token": "c1", "username": "cy", "role": "customer"}
    /// ]
    /// ```
    pub fn from_json<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        let entries: Vec<RosterEntry> = serde_json::from_reader(reader)?;
        let mut roster = Self::new();
        for entry in entries {
            roster.insert(entry.token, Principal::new(entry.username, entry.role));
        }
        Ok(roster)
    }

    /// Adds or replaces the principal for `token`.
    pub fn insert(&mut self, token: impl Into<String>, principal: Principal) {
        self.principals.insert(token.into(), principal);
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl AuthGate for TokenRoster {
    fn authorize(&self, bearer_token: Option<&str>) -> Result<Principal, AuthError> {
        let token = bearer_token.ok_or(AuthError::MissingCredentials)?;
        self.principals
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }
}
