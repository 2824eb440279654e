//! Domain identifiers (strongly-typed IDs).
//!
//! # ID の種類
//! - **CaseId**: ケースストアが採番する数値 ID。ページングのソートキーを兼ねる
//! - **CaseType**: パーティション（ケース種別）のタグ
//! - **EventToken**: `start_event` が返すトランザクショントークン
//!
//! CaseId は全順序を持つことが前提です。
//! スキャナはこの順序を `search_after` カーソルとして使うため、
//! `Ord` の実装を変えるとページングの正しさが崩れます。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of a case in the external case store.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(u64);

impl CaseId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CaseId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ケース種別（パーティション）
///
/// 例: `ET_EnglandWales`, `ET_Scotland`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseType(String);

impl CaseType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// EventToken は `start_event` から `submit_event` までの 1 トランザクションを識別
///
/// ストア側の実装によって中身が変わるため、文字列として不透明に扱います。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventToken(String);

impl EventToken {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// ULID からトークンを作成（InMemoryCaseStore 用）
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("evt-{ulid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_ids_sort_numerically() {
        let mut ids = vec![CaseId::new(1_700_000_010), CaseId::new(9), CaseId::new(1_700_000_002)];
        ids.sort();
        assert_eq!(
            ids,
            vec![CaseId::new(9), CaseId::new(1_700_000_002), CaseId::new(1_700_000_010)]
        );
    }

    #[test]
    fn case_id_serializes_as_plain_number() {
        let id = CaseId::new(1_650_000_000_000_001);
        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "1650000000000001");

        let deserialized: CaseId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn event_tokens_from_ulid_are_prefixed_and_unique() {
        let t1 = EventToken::from_ulid(Ulid::new());
        let t2 = EventToken::from_ulid(Ulid::new());

        assert!(t1.as_str().starts_with("evt-"));
        assert_ne!(t1, t2);
    }
}
