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

//! Ledger persistence.
//!
//! # Atomic appends
//!
//! Each day lives behind its own [`Mutex`] inside a [`DashMap`]. The map entry
//! is created under the shard lock, then the shard lock is downgraded and the
//! day's mutex is held for the whole append: pushing every line, bumping the
//! grand total and (for [`FileLedgerStore`]) writing the day document. Two
//! checkouts on the same day therefore apply in some serial order and neither
//! increment is lost. Checkouts on different days only share a shard read
//! lock.

use crate::OrderError;
use crate::base::LedgerDate;
use crate::ledger::{DailyLedger, LineItem};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub date: LedgerDate,
    /// The lines this append added, in order.
    pub appended: Vec<LineItem>,
    /// The day's grand total after the append.
    pub grand_total: Decimal,
}

/// Storage for daily ledgers.
pub trait LedgerStore: Send + Sync {
    /// Appends `lines` to the ledger of `date`, creating it if needed.
    ///
    /// Either every line is appended and the total incremented, or nothing
    /// changes and an error is returned.
    fn append(&self, date: LedgerDate, lines: Vec<LineItem>) -> Result<AppendOutcome, OrderError>;

    /// Consistent snapshot of the ledger of `date`, `None` if no checkout
    /// ever happened that day.
    fn load(&self, date: LedgerDate) -> Result<Option<DailyLedger>, OrderError>;
}

/// Ledgers held in process memory only.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    days: DashMap<LedgerDate, Mutex<DailyLedger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dates with a ledger, ascending.
    pub fn dates(&self) -> Vec<LedgerDate> {
        let mut dates: Vec<LedgerDate> = self.days.iter().map(|d| *d.key()).collect();
        dates.sort();
        dates
    }

    fn insert(&self, ledger: DailyLedger) {
        self.days.insert(ledger.date(), Mutex::new(ledger));
    }

    /// Appends and runs `persist` on the updated ledger while still holding
    /// the day's lock. A failing `persist` rolls the ledger back; a batch
    /// whose total does not fit never touches it.
    fn append_with<F>(
        &self,
        date: LedgerDate,
        lines: Vec<LineItem>,
        persist: F,
    ) -> Result<AppendOutcome, OrderError>
    where
        F: FnOnce(&DailyLedger) -> Result<(), OrderError>,
    {
        let result = {
            let day = self
                .days
                .entry(date)
                .or_insert_with(|| Mutex::new(DailyLedger::new(date)))
                .downgrade();
            let mut ledger = day.lock();

            let (len, previous_total) = (ledger.len(), ledger.grand_total());
            match ledger.append(lines) {
                Err(e) => Err(e),
                Ok(_) => match persist(&ledger) {
                    Ok(()) => Ok(AppendOutcome {
                        date,
                        appended: ledger.line_items()[len..].to_vec(),
                        grand_total: ledger.grand_total(),
                    }),
                    Err(e) => {
                        ledger.truncate(len, previous_total);
                        Err(e)
                    }
                },
            }
        };

        if result.is_err() {
            // A ledger only exists once a checkout on that day succeeded.
            self.days.remove_if(&date, |_, ledger| ledger.lock().is_empty());
        }
        result
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append(&self, date: LedgerDate, lines: Vec<LineItem>) -> Result<AppendOutcome, OrderError> {
        self.append_with(date, lines, |_| Ok(()))
    }

    fn load(&self, date: LedgerDate) -> Result<Option<DailyLedger>, OrderError> {
        Ok(self.days.get(&date).map(|day| day.lock().clone()))
    }
}

/// Ledgers mirrored to one JSON document per day.
///
/// Documents are named `<YYYY-MM-DD>.json` and replaced atomically through a
/// temporary file and a rename. Reads are served from memory.
#[derive(Debug)]
pub struct FileLedgerStore {
    memory: MemoryLedgerStore,
    dir: PathBuf,
}

fn storage_error(context: &str, path: &Path, err: impl std::fmt::Display) -> OrderError {
    OrderError::StorageUnavailable(format!("{context} {}: {err}", path.display()))
}

impl FileLedgerStore {
    /// Opens `dir`, creating it if missing, and loads every day document.
    ///
    /// # Errors
    ///
    /// [`OrderError::StorageUnavailable`] if the directory cannot be read, a
    /// document cannot be parsed, names a different day than its file, or
    /// has a grand total that does not match its lines.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, OrderError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error("creating", &dir, e))?;

        let memory = MemoryLedgerStore::new();
        let entries = fs::read_dir(&dir).map_err(|e| storage_error("reading", &dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| storage_error("reading", &dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(date) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<LedgerDate>().ok())
            else {
                warn!(path = %path.display(), "ignoring file that is not a day document");
                continue;
            };

            let bytes = fs::read(&path).map_err(|e| storage_error("reading", &path, e))?;
            let ledger: DailyLedger =
                serde_json::from_slice(&bytes).map_err(|e| storage_error("parsing", &path, e))?;
            if ledger.date() != date {
                return Err(storage_error("loading", &path, format!("document is for {}", ledger.date())));
            }
            if !ledger.is_balanced() {
                return Err(storage_error("loading", &path, "grand total does not match line items"));
            }
            debug!(%date, lines = ledger.len(), "loaded day document");
            memory.insert(ledger);
        }

        info!(dir = %dir.display(), days = memory.days.len(), "opened ledger directory");
        Ok(Self { memory, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dates(&self) -> Vec<LedgerDate> {
        self.memory.dates()
    }

    fn write_document(dir: &Path, ledger: &DailyLedger) -> Result<(), OrderError> {
        let path = dir.join(format!("{}.json", ledger.date()));
        let tmp = dir.join(format!("{}.json.tmp", ledger.date()));
        let bytes = serde_json::to_vec_pretty(ledger).map_err(|e| storage_error("encoding", &path, e))?;
        fs::write(&tmp, bytes).map_err(|e| storage_error("writing", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| storage_error("replacing", &path, e))
    }
}

impl LedgerStore for FileLedgerStore {
    fn append(&self, date: LedgerDate, lines: Vec<LineItem>) -> Result<AppendOutcome, OrderError> {
        let dir = self.dir.as_path();
        self.memory.append_with(date, lines, |ledger| {
            Self::write_document(dir, ledger)
                .inspect_err(|e| error!(%date, error = %e, "failed to persist day document"))
        })
    }

    fn load(&self, date: LedgerDate) -> Result<Option<DailyLedger>, OrderError> {
        self.memory.load(date)
    }
}
