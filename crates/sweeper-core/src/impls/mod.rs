//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryCaseStore**: 開発用のケースストア（CLI のフィクスチャ実行にも使う）
//! - **StaticFeatureGates**: 設定ファイルの値をそのまま返す機能フラグ
//!
//! 本番用のケースストアのクライアントは別クレートに配置します。

pub mod inmem_store;
pub mod static_gates;

// 主要な型を再エクスポート
pub use self::inmem_store::InMemoryCaseStore;
pub use self::static_gates::StaticFeatureGates;
