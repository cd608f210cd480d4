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

//! REST API.
//!
//! ## Endpoints
//!
//! | Method | Path | Gate | Body / query |
//! |--------|------|------|--------------|
//! | `POST` | `/orders/checkout` | public | `{"orders": [{"foodId": 1, "quantity": 2}]}` |
//! | `GET` | `/orders?date=YYYY-MM-DD` | `getDailyOrders` | |
//! | `GET` | `/orders/summary?date=YYYY-MM-DD` | `getDailyOrders` | |
//! | `GET` | `/orders/last7days[?date=YYYY-MM-DD]` | `getWeeklySales` | |
//! | `GET` | `/foods` | public | |
//! | `POST` | `/foods` | `manageFoods` | `{"name": "Burger", "price": "5.00"}` |
//! | `PUT` | `/foods/{id}` | `manageFoods` | `{"name": "Burger", "price": "5.50"}` |
//! | `DELETE` | `/foods/{id}` | `manageFoods` | |
//! | `GET` | `/me` | any token | |
//! | `GET` | `/health` | public | |
//!
//! Gated endpoints expect `Authorization: Bearer <token>`. Amounts travel as
//! decimal strings.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST http://localhost:3000/orders/checkout \
//!   -H "Content-Type: application/json" \
//!   -d '{"orders": [{"foodId": 1, "quantity": 2}, {"foodId": 2, "quantity": 3}]}'
//!
//! curl -H "Authorization: Bearer $TOKEN" \
//!   "http://localhost:3000/orders/summary?date=2024-05-01"
//! ```

use crate::auth::{AuthGate, Feature, Principal};
use crate::catalog::{Catalog, FoodItem};
use crate::checkout::CartEntry;
use crate::engine::Engine;
use crate::error::ErrorKind;
use crate::ledger::LineItem;
use crate::summary::DaySales;
use crate::{AuthError, FoodId, LedgerDate, OrderError};
use axum::{
    Json, Router,
    extract::{
        FromRequestParts, Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// === Request/Response DTOs ===

/// Request body of `POST /orders/checkout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub orders: Vec<CartEntry>,
}

/// Request body of food create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub message: String,
    pub date: LedgerDate,
    pub orders: Vec<LineItem>,
    pub grand_total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub food_name: String,
    pub quantity: u32,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    #[serde(rename = "_id")]
    pub food_name: String,
    pub total_quantity: u64,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub orders: Vec<SummaryRow>,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySalesResponse {
    pub sales_data: Vec<DaySales>,
    pub sum_total: Decimal,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    fn required(&self) -> Result<LedgerDate, OrderError> {
        self.date
            .as_deref()
            .ok_or(OrderError::MissingField("date"))?
            .parse()
    }
}

// === Application State ===

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub catalog: Arc<Catalog>,
    pub auth: Arc<dyn AuthGate>,
}

// === Error Handling ===

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum AppError {
    Order(OrderError),
    Auth(AuthError),
    /// Body or query could not be decoded.
    Malformed(String),
    Internal(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError::Order(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Order(e) => {
                let status = match e.kind() {
                    ErrorKind::Validation => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Infrastructure => {
                        error!(error = %e, "request failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.code(), e.to_string())
            }
            AppError::Auth(e) => match e {
                AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "MISSING_CREDENTIALS", e.to_string()),
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", e.to_string()),
                AuthError::FeatureDenied(_) => (StatusCode::FORBIDDEN, "FEATURE_DENIED", e.to_string()),
            },
            AppError::Malformed(message) => (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", message.clone()),
            AppError::Internal(message) => {
                error!(error = %message, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message.clone())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);
        Ok(state.auth.authorize(token)?)
    }
}

// === Handlers ===

/// Runs `task` on the blocking pool. Engine calls take per-day locks and may
/// touch the disk, so they stay off the async workers.
async fn blocking<T, F>(task: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, OrderError> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??)
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

/// GET /me - The caller's principal.
async fn me(principal: Principal) -> Json<Principal> {
    Json(principal)
}

/// POST /orders/checkout - Append a cart to today's ledger.
async fn checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let Json(request) = payload?;
    let engine = Arc::clone(&state.engine);
    let receipt = blocking(move || engine.checkout(&request.orders)).await?;

    Ok(Json(CheckoutResponse {
        message: "Checkout successful!".to_string(),
        date: receipt.date,
        orders: receipt.appended,
        grand_total: receipt.grand_total,
    }))
}

/// GET /orders?date= - Line items of one day.
async fn list_orders(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<OrderLineResponse>>, AppError> {
    principal.require(Feature::GetDailyOrders)?;
    let date = query.required()?;
    let engine = Arc::clone(&state.engine);
    let lines = blocking(move || engine.order_lines(date))
        .await?
        .into_iter()
        .map(|line| OrderLineResponse {
            food_name: line.food_name,
            quantity: line.quantity,
            total: line.line_total,
        })
        .collect();
    Ok(Json(lines))
}

/// GET /orders/summary?date= - Per-food totals of one day.
async fn order_summary(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<DateQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    principal.require(Feature::GetDailyOrders)?;
    let date = query.required()?;
    let engine = Arc::clone(&state.engine);
    let summary = blocking(move || engine.daily_summary(date)).await?;
    Ok(Json(SummaryResponse {
        orders: summary
            .items
            .into_iter()
            .map(|item| SummaryRow {
                food_name: item.food_name,
                total_quantity: item.total_quantity,
                total: item.total_revenue,
            })
            .collect(),
        total_revenue: summary.total_revenue,
    }))
}

/// GET /orders/last7days - Sales of the trailing week.
async fn last_seven_days(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<DateQuery>,
) -> Result<Json<WeeklySalesResponse>, AppError> {
    principal.require(Feature::GetWeeklySales)?;
    let reference = match query.date.as_deref() {
        Some(raw) => raw.parse::<LedgerDate>()?,
        None => state.engine.today(),
    };
    let engine = Arc::clone(&state.engine);
    let week = blocking(move || engine.trailing_week(reference)).await?;
    Ok(Json(WeeklySalesResponse {
        sales_data: week.series,
        sum_total: week.sum_total,
    }))
}

/// GET /foods
async fn list_foods(State(state): State<AppState>) -> Json<Vec<FoodItem>> {
    Json(state.catalog.list())
}

fn food_fields(request: FoodRequest) -> Result<(String, Decimal), OrderError> {
    let name = request.name.ok_or(OrderError::MissingField("name"))?;
    let price = request.price.ok_or(OrderError::MissingField("price"))?;
    Ok((name, price))
}

/// POST /foods
async fn create_food(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<FoodRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FoodItem>), AppError> {
    principal.require(Feature::ManageFoods)?;
    let Json(request) = payload?;
    let (name, price) = food_fields(request)?;
    let food = state.catalog.add(&name, price)?;
    Ok((StatusCode::CREATED, Json(food)))
}

/// PUT /foods/{id}
async fn update_food(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<u32>, PathRejection>,
    payload: Result<Json<FoodRequest>, JsonRejection>,
) -> Result<Json<FoodItem>, AppError> {
    principal.require(Feature::ManageFoods)?;
    let Path(id) = path?;
    let Json(request) = payload?;
    let (name, price) = food_fields(request)?;
    Ok(Json(state.catalog.update(FoodId(id), &name, price)?))
}

/// DELETE /foods/{id}
async fn delete_food(
    State(state): State<AppState>,
    principal: Principal,
    path: Result<Path<u32>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.require(Feature::ManageFoods)?;
    let Path(id) = path?;
    state.catalog.remove(FoodId(id))?;
    Ok(Json(json!({ "message": "Food item deleted" })))
}

// === Router ===

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/{id}", put(update_food).delete(delete_food))
        .route("/orders", get(list_orders))
        .route("/orders/checkout", post(checkout))
        .route("/orders/summary", get(order_summary))
        .route("/orders/last7days", get(last_seven_days))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API on `listener` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
