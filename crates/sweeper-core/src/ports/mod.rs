//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ケースストア、機能フラグ、時刻）への
//! インターフェースを提供し、実装の詳細を隠蔽します。

pub mod case_store;
pub mod feature_gates;
pub mod clock;

// 主要な trait を再エクスポート
pub use self::case_store::{CaseStore, StartedEvent};
pub use self::feature_gates::FeatureGates;
pub use self::clock::{Clock, FixedClock, SystemClock};
