//! Daily screenshot records.
//!
//! One [`DailyRecord`] per local calendar date, stored as JSON under
//! `<state_dir>/daily/<YYYYMMDD>.json`. The ledger keeps the current day's
//! record in memory, rewrites the file after every append, and reloads it
//! when the process restarts mid-day.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `YYYYMMDD`, used for file names, metadata and chain anchors.
pub const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// One summarized screenshot inside a daily record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Unix seconds.
    pub timestamp: i64,
    pub file_name: String,
    pub summary: String,
    /// First 16 hex chars of the image's SHA-256.
    pub image_hash: String,
}

/// All screenshots summarized on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(with = "date_key")]
    pub date: NaiveDate,
    /// Wallet address (or other identity) of the record's owner.
    pub creator: String,
    #[serde(default)]
    pub theme: String,
    /// Unix seconds.
    pub created_at: i64,
    #[serde(default)]
    pub screenshots: Vec<RecordEntry>,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, creator: impl Into<String>, created_at: i64) -> Self {
        Self {
            date,
            creator: creator.into(),
            theme: String::new(),
            created_at,
            screenshots: Vec::new(),
        }
    }

    pub fn date_key(&self) -> String {
        self.date.format(DATE_KEY_FORMAT).to_string()
    }

    /// NFT-style metadata document for this day.
    pub fn metadata(&self, image_base_url: &str) -> serde_json::Value {
        let date = self.date_key();
        let theme = if self.theme.is_empty() {
            "Unthemed"
        } else {
            self.theme.as_str()
        };
        json!({
            "name": format!("Daily Screenshots {date}"),
            "description": format!("A collection of screenshot moments from {date}"),
            "image": format!("{}/{date}.png", image_base_url.trim_end_matches('/')),
            "attributes": [
                { "trait_type": "Date", "value": date },
                { "trait_type": "Screenshot Count", "value": self.screenshots.len() },
                { "trait_type": "Theme", "value": theme },
                { "trait_type": "Creator", "value": self.creator },
            ],
            "properties": {
                "screenshots": self.screenshots,
                "created_at": self.created_at,
            }
        })
    }
}

/// Parse a `YYYYMMDD` key.
pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)
        .map_err(|e| Error::Other(format!("invalid date {key:?}, expected YYYYMMDD: {e}")))
}

mod date_key {
    use super::DATE_KEY_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(DATE_KEY_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, DATE_KEY_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Owns the current day's record and its file.
pub struct DailyLedger {
    dir: PathBuf,
    creator: String,
    current: Option<DailyRecord>,
}

impl DailyLedger {
    /// Open (creating if needed) the ledger directory under `state_dir`.
    pub fn open(state_dir: &Path, creator: impl Into<String>) -> Result<Self> {
        let dir = state_dir.join("daily");
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Config(format!("cannot create state dir {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            creator: creator.into(),
            current: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The record currently being appended to, if any.
    pub fn current(&self) -> Option<&DailyRecord> {
        self.current.as_ref()
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.json", date.format(DATE_KEY_FORMAT)))
    }

    /// Read the stored record for `date`, if one exists.
    pub fn load(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        let path = self.path_for(date);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append an entry to the record for `now`'s local date and persist it.
    ///
    /// When the date differs from the current record's, the current record
    /// is left as stored and the new date's record is loaded or started.
    pub fn append(&mut self, entry: RecordEntry, now: DateTime<Local>) -> Result<&DailyRecord> {
        let today = now.date_naive();

        let current = self.current.as_ref().filter(|record| record.date == today);
        let mut record = match current {
            Some(record) => record.clone(),
            None => {
                if let Some(previous) = &self.current {
                    info!(
                        date = %previous.date_key(),
                        screenshots = previous.screenshots.len(),
                        "daily record closed"
                    );
                }
                match self.load(today)? {
                    Some(existing) => {
                        info!(date = %existing.date_key(), screenshots = existing.screenshots.len(), "resuming daily record");
                        existing
                    }
                    None => {
                        info!(date = %today.format(DATE_KEY_FORMAT), "starting daily record");
                        DailyRecord::new(today, self.creator.clone(), now.timestamp())
                    }
                }
            }
        };

        // Memory only moves forward once the file has.
        record.screenshots.push(entry);
        persist(&self.dir, &record)?;
        debug!(date = %record.date_key(), screenshots = record.screenshots.len(), "daily record saved");
        Ok(self.current.insert(record))
    }
}

/// Write via a temp file and rename so a crash never leaves half a record.
fn persist(dir: &Path, record: &DailyRecord) -> Result<()> {
    let key = record.date_key();
    let tmp = dir.join(format!(".{key}.json.tmp"));
    let path = dir.join(format!("{key}.json"));
    std::fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}
