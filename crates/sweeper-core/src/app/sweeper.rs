//! Sweeper - 期限切れ follow-up action の定期スイープ
//!
//! # フロー（パーティションごと、逐次）
//! 1. 機能フラグを確認（グローバル → パーティション固有）。無効ならスキップ
//! 2. 今日の日付から ExpiryWindow（cutoff と検索範囲の下限）を計算
//! 3. CaseScanner で候補を集める（検索失敗ならこのパーティションは中止）
//! 4. actionable なケースを選び、max_batch_size 件までに絞る
//! 5. TaskDispatcher で work item 作成イベントを送る
//!
//! どのパーティションが失敗しても、ループは最後まで回ります。

use std::sync::Arc;

use tracing::{error, info};

use super::builder::SweeperBuilder;
use super::config::{PartitionConfig, SweepConfig};
use super::dispatcher::TaskDispatcher;
use super::filter::select_candidates;
use super::scanner::CaseScanner;
use super::summary::{PartitionOutcome, PartitionReport, RunSummary};
use crate::domain::ExpiryWindow;
use crate::ports::{CaseStore, Clock, FeatureGates};

pub struct Sweeper {
    config: SweepConfig,
    store: Arc<dyn CaseStore>,
    gates: Arc<dyn FeatureGates>,
    clock: Arc<dyn Clock>,
}

impl Sweeper {
    pub fn builder(config: SweepConfig) -> SweeperBuilder {
        SweeperBuilder::new(config)
    }

    pub(crate) fn new(
        config: SweepConfig,
        store: Arc<dyn CaseStore>,
        gates: Arc<dyn FeatureGates>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            gates,
            clock,
        }
    }

    /// 1 回分のスイープを実行する
    ///
    /// 失敗はパーティション単位・ケース単位で回収され、ここからは伝播しない。
    pub async fn run(&self) -> RunSummary {
        let window = ExpiryWindow::with_lookback(self.clock.today(), self.config.lookback_days);
        info!(
            today = %window.today,
            cutoff = %window.cutoff,
            earliest = %window.earliest,
            partitions = self.config.partitions.len(),
            dry_run = self.config.dry_run,
            "expired follow-up sweep started"
        );

        let mut partitions = Vec::with_capacity(self.config.partitions.len());
        for partition in &self.config.partitions {
            let outcome = self.run_partition(partition, &window).await;
            partitions.push(PartitionReport {
                case_type: partition.case_type.clone(),
                outcome,
            });
        }

        let summary = RunSummary {
            reference_date: window.today,
            cutoff: window.cutoff,
            dry_run: self.config.dry_run,
            partitions,
        };
        summary.log();
        summary
    }

    /// 無効になっている最初のフラグ名を返す
    fn disabled_gate(&self, partition: &PartitionConfig) -> Option<String> {
        if !self.gates.is_enabled(&self.config.global_gate) {
            return Some(self.config.global_gate.clone());
        }
        partition
            .feature_gate
            .as_ref()
            .filter(|gate| !self.gates.is_enabled(gate))
            .cloned()
    }

    async fn run_partition(
        &self,
        partition: &PartitionConfig,
        window: &ExpiryWindow,
    ) -> PartitionOutcome {
        let case_type = &partition.case_type;

        if let Some(gate) = self.disabled_gate(partition) {
            info!(case_type = %case_type, gate = %gate, "feature gate disabled; skipping partition");
            return PartitionOutcome::Skipped { gate };
        }

        let scanner = CaseScanner::new(
            Arc::clone(&self.store),
            case_type.clone(),
            self.config.page_size,
        );
        let scanned = match scanner.scan(window, self.config.scan_budget).await {
            Ok(scanned) => scanned,
            Err(e) => {
                error!(case_type = %case_type, error = %e, "scan failed; partition abandoned for this run");
                return PartitionOutcome::ScanFailed {
                    error: e.to_string(),
                };
            }
        };
        let scanned_count = scanned.len();

        let candidates = select_candidates(scanned, window.cutoff, self.config.max_batch_size);
        let selected = candidates.iter().map(|case| case.id).collect::<Vec<_>>();
        info!(
            case_type = %case_type,
            scanned = scanned_count,
            selected = selected.len(),
            "candidates selected"
        );

        if self.config.dry_run {
            info!(case_type = %case_type, cases = ?selected, "dry run; no events sent");
            return PartitionOutcome::Completed {
                scanned: scanned_count,
                selected,
                dispatch: None,
            };
        }

        let dispatcher = TaskDispatcher::new(
            Arc::clone(&self.store),
            self.config.event_name.clone(),
            window.cutoff,
            self.config.case_timeout(),
        );
        let report = dispatcher
            .dispatch(candidates, self.config.worker_count)
            .await;

        PartitionOutcome::Completed {
            scanned: scanned_count,
            selected,
            dispatch: Some(report),
        }
    }
}
