//! Run configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CdIndexError, Result};
use crate::temporal::{Horizon, TimeWindow};

/// Prefix selecting a generated population instead of a store path.
pub const SYNTHETIC_PREFIX: &str = "synthetic:";

/// Where vertices and edges come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSpec {
    /// SQLite store with `works` and `work_references` tables.
    Store(PathBuf),
    /// Deterministic pseudo-random population of `size` works.
    Synthetic { size: usize },
}

impl FromStr for SourceSpec {
    type Err = CdIndexError;

    /// `synthetic:<N>` selects a generated population; anything else is a path.
    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix(SYNTHETIC_PREFIX) {
            Some(n) => n
                .parse()
                .map(|size| SourceSpec::Synthetic { size })
                .map_err(|_| CdIndexError::InvalidConfig(format!("bad synthetic size '{n}'"))),
            None => Ok(SourceSpec::Store(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Store(path) => write!(f, "{}", path.display()),
            SourceSpec::Synthetic { size } => write!(f, "{SYNTHETIC_PREFIX}{size}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub source: SourceSpec,
    pub destination: PathBuf,
    /// Publication years ingested, inclusive.
    pub first_year: i32,
    pub last_year: i32,
    /// Last year with observable citations.
    pub cutoff_year: i32,
    /// Forward citation window, in 365-day years.
    pub window_years: u32,
    /// Registry entries per work unit.
    pub batch_size: usize,
    /// Scoring threads; `None` picks one per detected CPU.
    pub threads: Option<usize>,
    /// Keys between coarse progress lines.
    pub progress_interval: u64,
    /// Destination relation name.
    pub table: String,
    pub create_source_indexes: bool,
    /// Seed for synthetic populations.
    pub seed: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: SourceSpec::Store(PathBuf::from("crossref.db")),
            destination: PathBuf::from("cdindex.db"),
            first_year: 1945,
            last_year: 2023,
            cutoff_year: 2023,
            window_years: 5,
            batch_size: 10_000,
            threads: None,
            progress_interval: 1_000_000,
            table: "cdindex".to_string(),
            create_source_indexes: true,
            seed: "xyzzy".to_string(),
        }
    }
}

impl RunConfig {
    pub fn new(source: SourceSpec, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(CdIndexError::InvalidConfig(msg)) };
        if self.batch_size == 0 {
            return invalid("batch size must be > 0".into());
        }
        if self.first_year > self.last_year {
            return invalid(format!(
                "empty year range {}..={}",
                self.first_year, self.last_year
            ));
        }
        if self.window_years == 0 {
            return invalid("window must be at least one year".into());
        }
        match i32::try_from(self.window_years) {
            Ok(window) if self.cutoff_year > window => {}
            _ => {
                return invalid(format!(
                    "cutoff year {} must exceed the window of {} years",
                    self.cutoff_year, self.window_years
                ))
            }
        }
        self.horizon()?;
        if self.threads == Some(0) {
            return invalid("thread count must be > 0".into());
        }
        if !is_identifier(&self.table) {
            return invalid(format!("table name '{}' is not a plain identifier", self.table));
        }
        Ok(())
    }

    pub fn horizon(&self) -> Result<Horizon> {
        Horizon::new(self.cutoff_year, self.window_years)
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_years(self.window_years)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.horizon().unwrap().year, 2018);
        assert_eq!(config.window(), TimeWindow::from_years(5));
    }

    #[test]
    fn test_source_spec_parsing() {
        assert_eq!(
            "works.db".parse::<SourceSpec>().unwrap(),
            SourceSpec::Store(PathBuf::from("works.db"))
        );
        assert_eq!(
            "synthetic:1000".parse::<SourceSpec>().unwrap(),
            SourceSpec::Synthetic { size: 1000 }
        );
        assert_eq!(
            "synthetic:lots".parse::<SourceSpec>().unwrap_err().code(),
            "INVALID_CONFIG"
        );
        assert_eq!(SourceSpec::Synthetic { size: 7 }.to_string(), "synthetic:7");
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases: [fn(&mut RunConfig); 8] = [
            |c| c.batch_size = 0,
            |c| c.first_year = 2030,
            |c| c.window_years = 0,
            |c| c.cutoff_year = 3,
            |c| c.window_years = u32::MAX,
            |c| c.window_years = i32::MAX as u32 + 1,
            |c| c.threads = Some(0),
            |c| c.table = "cd index; DROP".into(),
        ];
        for mutate in cases {
            let mut config = RunConfig::default();
            mutate(&mut config);
            assert_eq!(config.validate().unwrap_err().code(), "INVALID_CONFIG");
        }
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_identifier("cdindex"));
        assert!(is_identifier("_cd5"));
        assert!(!is_identifier("5cd"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("cd\"x"));
    }

    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_value(RunConfig::default()).unwrap();
        assert_eq!(json["batch_size"], 10_000);
        assert_eq!(json["source"]["store"], "crossref.db");
    }
}
