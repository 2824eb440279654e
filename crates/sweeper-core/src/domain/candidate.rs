//! ScanCursor と CandidateSet - 1 回のスキャンで使う一時的な状態
//!
//! どちらも実行ごとに新しく作り、実行の終わりに捨てます。

use std::collections::BTreeMap;

use super::case::CaseRecord;
use super::ids::CaseId;

/// 直前のページで最後に見た case id
///
/// 次のページはこの値より大きい id だけを要求する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    last_seen: Option<CaseId>,
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<CaseId> {
        self.last_seen
    }

    /// カーソルを進める。単調増加しない場合は false を返し、位置を変えない。
    pub fn advance(&mut self, next: CaseId) -> bool {
        match self.last_seen {
            Some(current) if next <= current => false,
            _ => {
                self.last_seen = Some(next);
                true
            }
        }
    }
}

/// case id をキーにした重複なしの候補集合
///
/// ページ境界で同じケースが 2 回返ってきても 1 件として扱う。
/// 先に入ったレコードを残す。
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    cases: BTreeMap<CaseId, CaseRecord>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加できたら true、既に同じ id があれば false
    pub fn insert(&mut self, case: CaseRecord) -> bool {
        match self.cases.entry(case.id) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(case);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CaseId> + '_ {
        self.cases.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseRecord> {
        self.cases.values()
    }
}

impl IntoIterator for CandidateSet {
    type Item = CaseRecord;
    type IntoIter = std::collections::btree_map::IntoValues<CaseId, CaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.into_values()
    }
}
