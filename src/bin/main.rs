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

use clap::Parser;
use order_ledger_rs::server::{self, AppState};
use order_ledger_rs::{
    AuthGate, Catalog, Config, Engine, FileLedgerStore, LedgerStore, MemoryLedgerStore, Principal,
    Role, TokenRoster,
};
use std::fs::File;
use std::io::BufReader;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    fmt().with_env_filter(filter).init();

    let state = match build_state(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let listener = match TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind = %config.bind, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!("Order ledger API running on http://{}", config.bind);

    if let Err(e) = server::serve(listener, state).await {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

/// Opens the catalog, ledger store and roster named by `config`.
fn build_state(config: &Config) -> Result<AppState, String> {
    let catalog = Arc::new(Catalog::new());
    if let Some(path) = &config.catalog {
        let file = File::open(path)
            .map_err(|e| format!("Error opening catalog '{}': {}", path.display(), e))?;
        let added = catalog
            .load_csv(BufReader::new(file))
            .map_err(|e| format!("Error reading catalog '{}': {}", path.display(), e))?;
        info!(foods = added, path = %path.display(), "catalog seeded");
    }

    let ledgers: Arc<dyn LedgerStore> = match &config.data_dir {
        Some(dir) => Arc::new(FileLedgerStore::open(dir).map_err(|e| e.to_string())?),
        None => {
            warn!("no data directory configured, ledgers are kept in memory only");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let mut roster = match &config.roster {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("Error opening roster '{}': {}", path.display(), e))?;
            TokenRoster::from_json(BufReader::new(file))
                .map_err(|e| format!("Error reading roster '{}': {}", path.display(), e))?
        }
        None => TokenRoster::new(),
    };
    if let Some(token) = &config.admin_token {
        roster.insert(token.clone(), Principal::new("admin", Role::Admin));
    }
    if roster.is_empty() {
        warn!("no access tokens configured, sales queries and catalog edits are unavailable");
    }
    let auth: Arc<dyn AuthGate> = Arc::new(roster);

    let engine = Engine::new(catalog.clone(), ledgers);
    Ok(AppState {
        engine: Arc::new(engine),
        catalog,
        auth,
    })
}
