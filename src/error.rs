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

//! Error types for checkout, aggregation and access control.

use crate::auth::Feature;
use crate::base::FoodId;
use thiserror::Error;

/// Broad class of an [`OrderError`], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller sent something malformed. Never retried.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// Storage or catalog backend failed.
    Infrastructure,
}

/// Checkout, catalog and ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Cart has no entries
    #[error("cart is empty")]
    EmptyCart,

    /// Quantity is zero, negative or too large
    #[error("invalid quantity {quantity} for food {food_id} (must be a positive integer)")]
    InvalidQuantity { food_id: FoodId, quantity: i64 },

    /// Food ID does not resolve in the catalog
    #[error("unknown food id {0}")]
    UnknownFood(FoodId),

    /// Date is not in canonical `YYYY-MM-DD` form
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Required request field is absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Food name or price is unusable
    #[error("invalid food item: {0}")]
    InvalidFood(String),

    /// A line or running total exceeds the range of `Decimal`
    #[error("amount out of range: {0}")]
    AmountOverflow(String),

    /// Catalog backend could not answer a lookup
    #[error("catalog lookup failed: {0}")]
    CatalogUnavailable(String),

    /// Ledger backend could not read or persist a day
    #[error("ledger storage failed: {0}")]
    StorageUnavailable(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCart
            | Self::InvalidQuantity { .. }
            | Self::InvalidDate(_)
            | Self::MissingField(_)
            | Self::InvalidFood(_)
            | Self::AmountOverflow(_) => ErrorKind::Validation,
            Self::UnknownFood(_) => ErrorKind::NotFound,
            Self::CatalogUnavailable(_) | Self::StorageUnavailable(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::UnknownFood(_) => "UNKNOWN_FOOD",
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidFood(_) => "INVALID_FOOD",
            Self::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            Self::CatalogUnavailable(_) => "CATALOG_UNAVAILABLE",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }
}

/// Access layer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token on a gated request
    #[error("missing credentials")]
    MissingCredentials,

    /// Token is not known to the gate
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Principal lacks the feature the request needs
    #[error("feature {0} not permitted")]
    FeatureDenied(Feature),
}
