//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **SweeperBuilder**: Sweeper の構築とワイヤリング
//! - **Sweeper**: パーティションごとの scan → filter → dispatch
//! - **CaseScanner**: カーソル方式のページング
//! - **filter**: actionable なケースの選択
//! - **TaskDispatcher**: 有界ワーカープールでのイベント送信
//! - **SweepConfig**: 実行パラメータ
//! - **RunSummary**: 実行結果

pub mod builder;
pub mod config;
pub mod scanner;
pub mod filter;
pub mod dispatcher;
pub mod sweeper;
pub mod summary;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, SweeperBuilder};
pub use self::config::{ConfigError, PartitionConfig, SweepConfig};
pub use self::scanner::CaseScanner;
pub use self::filter::{is_actionable, select_candidates};
pub use self::dispatcher::{CaseFailure, CaseOutcome, DispatchReport, TaskDispatcher};
pub use self::sweeper::Sweeper;
pub use self::summary::{PartitionOutcome, PartitionReport, RunSummary, RunTotals};
