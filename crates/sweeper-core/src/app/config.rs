//! SweepConfig - 実行パラメータ
//!
//! 設定は TOML から読み込み、Sweeper の構築時に明示的に渡します。
//! グローバルな可変状態からは読みません。
//!
//! ```toml
//! scan_budget = 5000
//! page_size = 100
//! max_batch_size = 100
//! worker_count = 10
//! lookback_days = 30
//! event_name = "WA_EXPIRED_FOLLOW_UP"
//! global_gate = "expired-follow-up-sweep"
//!
//! [[partitions]]
//! case_type = "ET_EnglandWales"
//! feature_gate = "expired-follow-up-sweep-ew"
//!
//! [feature_flags]
//! expired-follow-up-sweep = true
//! expired-follow-up-sweep-ew = true
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CaseType, DEFAULT_LOOKBACK_DAYS};

pub const DEFAULT_SCAN_BUDGET: usize = 5000;
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_WORKER_COUNT: usize = 10;
pub const DEFAULT_EVENT_NAME: &str = "WA_EXPIRED_FOLLOW_UP";
pub const DEFAULT_GLOBAL_GATE: &str = "expired-follow-up-sweep";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 1 パーティション（ケース種別）の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub case_type: CaseType,

    /// パーティション固有のフラグ名。None ならグローバルフラグだけで判定する
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_gate: Option<String>,
}

impl PartitionConfig {
    pub fn new(case_type: impl Into<String>) -> Self {
        Self {
            case_type: CaseType::new(case_type),
            feature_gate: None,
        }
    }

    pub fn gated_by(mut self, gate: impl Into<String>) -> Self {
        self.feature_gate = Some(gate.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// 1 パーティションで集める候補ケース数の上限
    pub scan_budget: usize,

    /// 検索 1 回あたりの件数
    pub page_size: usize,

    /// 1 パーティションで実際にイベントを送るケース数の上限
    pub max_batch_size: usize,

    /// dispatch のワーカー数
    pub worker_count: usize,

    pub event_name: String,
    pub global_gate: String,
    pub partitions: Vec<PartitionConfig>,
    pub feature_flags: HashMap<String, bool>,

    /// 検索範囲の下限を cutoff から何日遡るか。失敗したケースはこの日数の間、再処理の対象に残る
    pub lookback_days: u64,

    /// ケース 1 件の start→submit にかける時間の上限（秒）
    pub case_timeout_secs: Option<u64>,

    /// true なら scan と filter だけを行い、イベントは送らない
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            scan_budget: DEFAULT_SCAN_BUDGET,
            page_size: DEFAULT_PAGE_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            event_name: DEFAULT_EVENT_NAME.to_string(),
            global_gate: DEFAULT_GLOBAL_GATE.to_string(),
            partitions: Vec::new(),
            feature_flags: HashMap::new(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            case_timeout_secs: None,
            dry_run: false,
        }
    }
}

impl SweepConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SweepConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// 起動時検証（Fail-fast）
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        if self.scan_budget == 0 {
            problems.push("scan_budget must be at least 1");
        }
        if self.page_size == 0 {
            problems.push("page_size must be at least 1");
        }
        if self.max_batch_size == 0 {
            problems.push("max_batch_size must be at least 1");
        }
        if self.worker_count == 0 {
            problems.push("worker_count must be at least 1");
        }
        if self.event_name.trim().is_empty() {
            problems.push("event_name must not be blank");
        }
        if self.partitions.is_empty() {
            problems.push("at least one partition is required");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    pub fn case_timeout(&self) -> Option<Duration> {
        self.case_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        scan_budget = 200
        page_size = 25
        worker_count = 4
        event_name = "WA_EXPIRED_FOLLOW_UP"
        case_timeout_secs = 30

        [[partitions]]
        case_type = "ET_EnglandWales"
        feature_gate = "sweep-ew"

        [[partitions]]
        case_type = "ET_Scotland"

        [feature_flags]
        expired-follow-up-sweep = true
        sweep-ew = false
    "#;

    #[test]
    fn parses_sample_and_fills_defaults() {
        let config = SweepConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.scan_budget, 200);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.global_gate, DEFAULT_GLOBAL_GATE);
        assert_eq!(config.case_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert!(!config.dry_run);

        assert_eq!(
            config.partitions,
            vec![
                PartitionConfig::new("ET_EnglandWales").gated_by("sweep-ew"),
                PartitionConfig::new("ET_Scotland"),
            ]
        );
        assert_eq!(config.feature_flags.get("sweep-ew"), Some(&false));
    }

    #[test]
    fn default_worker_count_matches_fixed_pool() {
        assert_eq!(SweepConfig::default().worker_count, 10);
    }

    #[test]
    fn rejects_zero_limits_and_missing_partitions() {
        let err = SweepConfig::from_toml_str("page_size = 0\nworker_count = 0").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("page_size"));
        assert!(msg.contains("worker_count"));
        assert!(msg.contains("partition"));
    }

    #[test]
    fn reports_parse_errors() {
        let err = SweepConfig::from_toml_str("scan_budget = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SweepConfig::from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
