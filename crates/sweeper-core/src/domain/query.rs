//! CaseQuery - 期限切れ候補ケースの検索クエリ
//!
//! クエリはデータとして組み立てるだけで、I/O は行いません。
//! 実行は `CaseStore::search` の責務です。
//!
//! # 条件
//! - follow-up action を 1 件以上持つ
//! - action の due date が `[earliest, today)` に入る（`earliest` は cutoff から lookback 日遡った日）
//! - ケースの状態が `CaseState::LIVE` のいずれか
//! - case id 昇順、`size` 件まで
//! - `search_after` があれば、それより大きい case id のみ

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::case::CaseRecord;
use super::cutoff::ExpiryWindow;
use super::ids::CaseId;
use super::state::CaseState;

/// due date の半開区間 `[from, until)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDateRange {
    pub from: NaiveDate,
    pub until: NaiveDate,
}

impl DueDateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date < self.until
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    CaseIdAscending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseQuery {
    pub require_actions: bool,
    pub due_range: DueDateRange,
    pub states: Vec<CaseState>,
    pub sort: SortOrder,
    pub size: usize,
    pub search_after: Option<CaseId>,
}

impl CaseQuery {
    /// 1 ページ分のクエリを組み立てる
    ///
    /// `page_size` が 0 の場合は 1 に切り上げる（空ページが「枯渇」と区別できなくなるため）。
    pub fn build(window: &ExpiryWindow, page_size: usize, cursor: Option<CaseId>) -> Self {
        Self {
            require_actions: true,
            due_range: DueDateRange {
                from: window.earliest,
                until: window.today,
            },
            states: CaseState::LIVE.to_vec(),
            sort: SortOrder::CaseIdAscending,
            size: page_size.max(1),
            search_after: cursor,
        }
    }

    /// クエリの述語をプロセス内で評価する（InMemoryCaseStore 用）
    ///
    /// ソートと `size` はストア側で適用する。
    pub fn matches(&self, case: &CaseRecord) -> bool {
        if let Some(after) = self.search_after
            && case.id <= after
        {
            return false;
        }
        if !self.states.contains(&case.state) {
            return false;
        }
        if self.require_actions && case.actions.is_empty() {
            return false;
        }
        case.actions
            .iter()
            .any(|a| self.due_range.contains(a.due_date))
    }

    /// Elasticsearch 風の検索ボディを生成する
    pub fn to_search_json(&self) -> serde_json::Value {
        let states: Vec<&str> = self.states.iter().map(|s| s.as_str()).collect();
        let mut filters = vec![json!({ "terms": { "state.keyword": states } })];
        if self.require_actions {
            filters.push(json!({ "exists": { "field": "data.bfActions" } }));
        }
        filters.push(json!({
            "range": {
                "data.bfActions.value.bfDate": {
                    "gte": self.due_range.from.to_string(),
                    "lt": self.due_range.until.to_string(),
                }
            }
        }));

        let mut body = json!({
            "size": self.size,
            "query": { "bool": { "filter": filters } },
            "sort": [{ "reference.keyword": { "order": "asc" } }],
        });
        if let Some(after) = self.search_after {
            body["search_after"] = json!([after.to_string()]);
        }
        body
    }
}
