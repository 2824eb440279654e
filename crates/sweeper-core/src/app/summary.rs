//! Summary - 1 回の実行結果
//!
//! CLI の JSON 出力と、実行終了時のサマリーログに使います。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::dispatcher::DispatchReport;
use crate::domain::{CaseId, CaseType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartitionOutcome {
    /// 機能フラグが無効（または未定義）
    Skipped { gate: String },

    /// 検索が失敗したため、このパーティションは何もしていない
    ScanFailed { error: String },

    Completed {
        scanned: usize,
        selected: Vec<CaseId>,
        /// dry run の場合は None
        dispatch: Option<DispatchReport>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub case_type: CaseType,
    #[serde(flatten)]
    pub outcome: PartitionOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub partitions: usize,
    pub skipped: usize,
    pub scan_failed: usize,
    pub scanned: usize,
    pub selected: usize,
    pub dispatched: usize,
    pub failed: usize,
    pub actions_marked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub reference_date: NaiveDate,
    pub cutoff: NaiveDate,
    pub dry_run: bool,
    pub partitions: Vec<PartitionReport>,
}

impl RunSummary {
    pub fn totals(&self) -> RunTotals {
        let mut totals = RunTotals {
            partitions: self.partitions.len(),
            ..RunTotals::default()
        };
        for report in &self.partitions {
            match &report.outcome {
                PartitionOutcome::Skipped { .. } => totals.skipped += 1,
                PartitionOutcome::ScanFailed { .. } => totals.scan_failed += 1,
                PartitionOutcome::Completed {
                    scanned,
                    selected,
                    dispatch,
                } => {
                    totals.scanned += scanned;
                    totals.selected += selected.len();
                    if let Some(dispatch) = dispatch {
                        totals.dispatched += dispatch.dispatched;
                        totals.failed += dispatch.failed();
                        totals.actions_marked += dispatch.actions_marked;
                    }
                }
            }
        }
        totals
    }

    pub fn partition(&self, case_type: &str) -> Option<&PartitionReport> {
        self.partitions
            .iter()
            .find(|report| report.case_type.as_str() == case_type)
    }

    pub fn log(&self) {
        let totals = self.totals();
        info!(
            reference_date = %self.reference_date,
            cutoff = %self.cutoff,
            dry_run = self.dry_run,
            partitions = totals.partitions,
            skipped = totals.skipped,
            scan_failed = totals.scan_failed,
            scanned = totals.scanned,
            selected = totals.selected,
            dispatched = totals.dispatched,
            failed = totals.failed,
            actions_marked = totals.actions_marked,
            "expired follow-up sweep finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_add_up_across_partitions() {
        let summary = RunSummary {
            reference_date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            cutoff: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            dry_run: false,
            partitions: vec![
                PartitionReport {
                    case_type: CaseType::new("A"),
                    outcome: PartitionOutcome::Skipped {
                        gate: "a".to_string(),
                    },
                },
                PartitionReport {
                    case_type: CaseType::new("B"),
                    outcome: PartitionOutcome::Completed {
                        scanned: 5,
                        selected: vec![CaseId::new(1), CaseId::new(2)],
                        dispatch: Some(DispatchReport {
                            attempted: 2,
                            dispatched: 2,
                            stale: 0,
                            actions_marked: 3,
                            failures: Vec::new(),
                        }),
                    },
                },
                PartitionReport {
                    case_type: CaseType::new("C"),
                    outcome: PartitionOutcome::ScanFailed {
                        error: "down".to_string(),
                    },
                },
            ],
        };

        let totals = summary.totals();
        assert_eq!(totals.partitions, 3);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.scan_failed, 1);
        assert_eq!(totals.scanned, 5);
        assert_eq!(totals.selected, 2);
        assert_eq!(totals.dispatched, 2);
        assert_eq!(totals.actions_marked, 3);
        assert!(summary.partition("B").is_some());
    }

    #[test]
    fn partition_report_serializes_flat() {
        let report = PartitionReport {
            case_type: CaseType::new("ET_Scotland"),
            outcome: PartitionOutcome::Skipped {
                gate: "sweep-scot".to_string(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "case_type": "ET_Scotland",
                "status": "skipped",
                "gate": "sweep-scot"
            })
        );
    }
}
