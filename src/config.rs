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

//! Server configuration.
//!
//! Every option can come from a flag or from an `ORDER_LEDGER_*` environment
//! variable; flags win.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Order Ledger - restaurant ordering backend
///
/// Serves checkout, daily order summaries and trailing-week sales over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "order-ledger")]
#[command(about = "Restaurant ordering backend with daily sales ledgers", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "ORDER_LEDGER_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory of per-day ledger documents
    ///
    /// Ledgers are kept in memory only when unset.
    #[arg(long, env = "ORDER_LEDGER_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// CSV file seeding the food catalog
    ///
    /// Expected format: name,price
    #[arg(long, env = "ORDER_LEDGER_CATALOG", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// JSON file mapping bearer tokens to users and roles
    #[arg(long, env = "ORDER_LEDGER_ROSTER", value_name = "FILE")]
    pub roster: Option<PathBuf>,

    /// Extra bearer token granted the admin role
    #[arg(long, env = "ORDER_LEDGER_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "ORDER_LEDGER_LOG", default_value = "info")]
    pub log_filter: String,
}
