//! FeatureGates port - 機能フラグの参照
//!
//! 未定義のフラグは「無効」として扱います（エラーにはしない）。
//!
//! # 実装
//! - **StaticFeatureGates**: 設定ファイルの `[feature_flags]` から作る固定値

pub trait FeatureGates: Send + Sync {
    fn is_enabled(&self, name: &str) -> bool;
}
