//! SweeperBuilder - Sweeper の構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - build() 時に SweepConfig::validate() を実行
//! - CaseStore が未設定なら BuildError を返す
//! - FeatureGates 未設定なら設定の `[feature_flags]` から作る
//! - Clock 未設定なら SystemClock

use std::sync::Arc;

use super::config::{ConfigError, SweepConfig};
use super::sweeper::Sweeper;
use crate::impls::StaticFeatureGates;
use crate::ports::{CaseStore, Clock, FeatureGates, SystemClock};

/// # 使用例
/// ```ignore
/// let sweeper = SweeperBuilder::new(config)
///     .store(Arc::new(client))
///     .build()?;
/// let summary = sweeper.run().await;
/// ```
pub struct SweeperBuilder {
    config: SweepConfig,
    store: Option<Arc<dyn CaseStore>>,
    gates: Option<Arc<dyn FeatureGates>>,
    clock: Option<Arc<dyn Clock>>,
}

/// BuildError は Sweeper 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no case store configured")]
    MissingStore,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl SweeperBuilder {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            store: None,
            gates: None,
            clock: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn CaseStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn gates(mut self, gates: Arc<dyn FeatureGates>) -> Self {
        self.gates = Some(gates);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Sweeper, BuildError> {
        self.config.validate()?;
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let gates = self.gates.unwrap_or_else(|| {
            Arc::new(StaticFeatureGates::new(self.config.feature_flags.clone()))
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(Sweeper::new(self.config, store, gates, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::PartitionConfig;
    use crate::impls::InMemoryCaseStore;

    fn config() -> SweepConfig {
        SweepConfig {
            partitions: vec![PartitionConfig::new("ET_EnglandWales")],
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_build_success() {
        let sweeper = SweeperBuilder::new(config())
            .store(Arc::new(InMemoryCaseStore::new()))
            .build();
        assert!(sweeper.is_ok());
    }

    #[test]
    fn test_build_missing_store() {
        let sweeper = SweeperBuilder::new(config()).build();
        assert!(matches!(sweeper, Err(BuildError::MissingStore)));
    }

    #[test]
    fn test_build_invalid_config() {
        let mut bad = config();
        bad.worker_count = 0;
        let sweeper = SweeperBuilder::new(bad)
            .store(Arc::new(InMemoryCaseStore::new()))
            .build();
        assert!(matches!(sweeper, Err(BuildError::InvalidConfig(_))));
    }
}
