//! sweeper-core
//!
//! 期限切れの follow-up action（BF action）を持つケースを定期的に探し、
//! action ごとに 1 回だけ work item 作成イベントを送るバッチの中核部分。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, case, cutoff, query, candidate, errors）
//! - **ports**: 抽象化レイヤー（CaseStore, FeatureGates, Clock）
//! - **app**: アプリケーションロジック（builder, scanner, filter, dispatcher, sweeper）
//! - **impls**: 実装（InMemoryCaseStore など開発用）

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
