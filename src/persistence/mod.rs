//! Run log persistence
//!
//! One record per finished run, appended as a JSON line holding a flat
//! string-to-string map. Fields:
//! - `seed`, `area_index_reached`, `distance_reached`
//! - `elapsed_ticks`, `elapsed_secs`, `end_reason`
//! - `count.<AreaType>` for every area type generated

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::sim::area::AreaType;

/// Prefix of the per-area-type count keys
const COUNT_PREFIX: &str = "count.";

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Death,
    Quit,
    Error,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Death => "death",
            EndReason::Quit => "quit",
            EndReason::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "death" => Some(EndReason::Death),
            "quit" => Some(EndReason::Quit),
            "error" => Some(EndReason::Error),
            _ => None,
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub seed: u64,
    pub area_index_reached: usize,
    pub distance_reached: f32,
    pub elapsed_ticks: u64,
    /// Wall-equivalent duration at the configured tick rate
    pub elapsed_secs: f64,
    pub end_reason: EndReason,
    pub area_counts: BTreeMap<AreaType, usize>,
}

impl RunRecord {
    /// Flatten into the string map written to the log
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert("seed".to_string(), self.seed.to_string());
        fields.insert("area_index_reached".to_string(), self.area_index_reached.to_string());
        fields.insert("distance_reached".to_string(), self.distance_reached.to_string());
        fields.insert("elapsed_ticks".to_string(), self.elapsed_ticks.to_string());
        fields.insert("elapsed_secs".to_string(), format!("{:.3}", self.elapsed_secs));
        fields.insert("end_reason".to_string(), self.end_reason.as_str().to_string());
        for (kind, count) in &self.area_counts {
            fields.insert(format!("{COUNT_PREFIX}{}", kind.name()), count.to_string());
        }
        fields
    }

    /// Rebuild from a string map; unknown keys are ignored
    pub fn from_fields(fields: &BTreeMap<String, String>) -> SimResult<Self> {
        fn field<T: std::str::FromStr>(fields: &BTreeMap<String, String>, key: &str) -> SimResult<T> {
            fields
                .get(key)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| SimError::Record(format!("field `{key}` missing or invalid")))
        }

        let reason: String = field(fields, "end_reason")?;
        let end_reason = EndReason::parse(&reason)
            .ok_or_else(|| SimError::Record(format!("unknown end reason `{reason}`")))?;
        let mut area_counts = BTreeMap::new();
        for key in fields.keys() {
            if let Some(name) = key.strip_prefix(COUNT_PREFIX)
                && let Some(kind) = AreaType::from_name(name)
            {
                area_counts.insert(kind, field(fields, key)?);
            }
        }
        Ok(Self {
            seed: field(fields, "seed")?,
            area_index_reached: field(fields, "area_index_reached")?,
            distance_reached: field(fields, "distance_reached")?,
            elapsed_ticks: field(fields, "elapsed_ticks")?,
            elapsed_secs: field(fields, "elapsed_secs")?,
            end_reason,
            area_counts,
        })
    }
}

/// Append-only log of runs
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &RunRecord) -> SimResult<()> {
        let line = serde_json::to_string(&record.to_fields())?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SimError::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| SimError::io(&self.path, e))?;
        log::info!("Run recorded to {}", self.path.display());
        Ok(())
    }

    /// Every readable record; malformed lines are skipped with a warning
    pub fn read_all(&self) -> SimResult<Vec<RunRecord>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SimError::io(&self.path, e)),
        };
        let mut records = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SimError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str::<BTreeMap<String, String>>(&line)
                .map_err(SimError::from)
                .and_then(|fields| RunRecord::from_fields(&fields));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping run log line {}: {e}", n + 1),
            }
        }
        Ok(records)
    }
}
