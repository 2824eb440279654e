//! InMemoryCaseStore - 開発用・テスト用のケースストア
//!
//! # 実装詳細
//! - BTreeMap<CaseId, StoredCase> で case id 昇順を保つ
//! - `search` は `CaseQuery::matches` で評価し、先頭から `size` 件を返す
//! - `start_event` はケースのバージョンを記録したトークンを払い出す
//! - `submit_event` はバージョンが変わっていれば Conflict を返す（楽観ロック）
//!
//! テスト用に、失敗の注入・遅延・外部からの更新のフックを持ちます。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use ulid::Ulid;

use crate::domain::{CaseId, CaseQuery, CaseRecord, CaseType, EventToken, StoreError};
use crate::ports::{CaseStore, StartedEvent};

#[derive(Debug, Clone)]
struct StoredCase {
    case: CaseRecord,
    version: u64,
}

#[derive(Debug, Clone)]
struct PendingEvent {
    case_id: CaseId,
    version: u64,
}

/// 検索失敗の注入: `ok_pages` 回成功した後に `error` を返す
#[derive(Debug, Clone)]
struct SearchFailure {
    case_type: Option<CaseType>,
    ok_pages: usize,
    error: StoreError,
}

#[derive(Default)]
struct InMemoryStoreState {
    cases: BTreeMap<CaseId, StoredCase>,
    pending: HashMap<EventToken, PendingEvent>,

    search_calls: Vec<(CaseType, CaseQuery)>,
    started: Vec<CaseId>,
    submitted: Vec<CaseId>,

    search_failure: Option<SearchFailure>,
    failing_starts: HashSet<CaseId>,
    failing_submits: HashMap<CaseId, StoreError>,
    start_delays: HashMap<CaseId, Duration>,
}

pub struct InMemoryCaseStore {
    state: Arc<Mutex<InMemoryStoreState>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::with_cases(std::iter::empty())
    }

    pub fn with_cases(cases: impl IntoIterator<Item = CaseRecord>) -> Self {
        let mut state = InMemoryStoreState::default();
        for case in cases {
            state.cases.insert(case.id, StoredCase { case, version: 1 });
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn get(&self, case_id: CaseId) -> Option<CaseRecord> {
        let state = self.state.lock().await;
        state.cases.get(&case_id).map(|stored| stored.case.clone())
    }

    /// 外部（別のユーザー）による更新を模倣: action を cleared にする
    pub async fn clear_action(&self, case_id: CaseId, action_id: &str, marker: &str) {
        let mut state = self.state.lock().await;
        if let Some(stored) = state.cases.get_mut(&case_id) {
            for action in stored.case.actions.iter_mut().filter(|a| a.id == action_id) {
                action.cleared = Some(marker.to_string());
            }
            stored.version += 1;
        }
    }

    // ---- 失敗の注入 ----

    /// `ok_pages` 回の検索が成功した後、全ての検索を失敗させる
    pub async fn fail_search_after(&self, ok_pages: usize, error: StoreError) {
        self.state.lock().await.search_failure = Some(SearchFailure {
            case_type: None,
            ok_pages,
            error,
        });
    }

    /// 指定したケース種別の検索だけを失敗させる
    pub async fn fail_search_for(&self, case_type: CaseType, error: StoreError) {
        self.state.lock().await.search_failure = Some(SearchFailure {
            case_type: Some(case_type),
            ok_pages: 0,
            error,
        });
    }

    pub async fn fail_start_for(&self, case_id: CaseId) {
        self.state.lock().await.failing_starts.insert(case_id);
    }

    /// fail_start_for で注入した障害を取り除く
    pub async fn recover_start_for(&self, case_id: CaseId) {
        self.state.lock().await.failing_starts.remove(&case_id);
    }

    pub async fn fail_submit_for(&self, case_id: CaseId, error: StoreError) {
        self.state.lock().await.failing_submits.insert(case_id, error);
    }

    pub async fn delay_start_for(&self, case_id: CaseId, delay: Duration) {
        self.state.lock().await.start_delays.insert(case_id, delay);
    }

    // ---- 観測用 ----

    pub async fn search_calls(&self) -> Vec<(CaseType, CaseQuery)> {
        self.state.lock().await.search_calls.clone()
    }

    /// start_event が呼ばれたケース id（呼ばれた順）
    pub async fn started_events(&self) -> Vec<CaseId> {
        self.state.lock().await.started.clone()
    }

    pub async fn submitted_count(&self) -> usize {
        self.state.lock().await.submitted.len()
    }

    /// `work_item_created` が立っている action の総数
    pub async fn flagged_action_count(&self) -> usize {
        let state = self.state.lock().await;
        state
            .cases
            .values()
            .flat_map(|stored| stored.case.actions.iter())
            .filter(|a| a.work_item_created)
            .count()
    }
}

impl Default for InMemoryCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn search(
        &self,
        case_type: &CaseType,
        query: &CaseQuery,
    ) -> Result<Vec<CaseRecord>, StoreError> {
        let mut state = self.state.lock().await;
        state.search_calls.push((case_type.clone(), query.clone()));

        if let Some(failure) = state.search_failure.as_mut()
            && failure.case_type.as_ref().is_none_or(|t| t == case_type)
        {
            if failure.ok_pages == 0 {
                return Err(failure.error.clone());
            }
            failure.ok_pages -= 1;
        }

        // BTreeMap は id 昇順なので、そのまま先頭から size 件
        let page: Vec<CaseRecord> = state
            .cases
            .values()
            .map(|stored| &stored.case)
            .filter(|case| &case.case_type == case_type && query.matches(case))
            .take(query.size)
            .cloned()
            .collect();
        debug!(case_type = %case_type, size = page.len(), "in-memory search");
        Ok(page)
    }

    async fn start_event(
        &self,
        case_id: CaseId,
        event_name: &str,
    ) -> Result<StartedEvent, StoreError> {
        let delay = {
            let mut state = self.state.lock().await;
            state.started.push(case_id);
            if state.failing_starts.contains(&case_id) {
                return Err(StoreError::Unavailable(format!(
                    "injected start failure for case {case_id}"
                )));
            }
            state.start_delays.get(&case_id).copied()
        };

        // ロックを持ったまま待たない
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        let stored = state
            .cases
            .get(&case_id)
            .cloned()
            .ok_or(StoreError::NotFound(case_id))?;

        let token = EventToken::from_ulid(Ulid::new());
        state.pending.insert(
            token.clone(),
            PendingEvent {
                case_id,
                version: stored.version,
            },
        );
        debug!(case_id = %case_id, event_name, token = %token, "event started");

        Ok(StartedEvent {
            case: stored.case,
            token,
        })
    }

    async fn submit_event(&self, token: EventToken, case: CaseRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let pending = state
            .pending
            .remove(&token)
            .ok_or_else(|| StoreError::InvalidToken(token.clone()))?;

        if pending.case_id != case.id {
            return Err(StoreError::Rejected(format!(
                "token {token} belongs to case {}, not {}",
                pending.case_id, case.id
            )));
        }
        if let Some(error) = state.failing_submits.get(&case.id) {
            return Err(error.clone());
        }

        let stored = state
            .cases
            .get_mut(&case.id)
            .ok_or(StoreError::NotFound(case.id))?;
        if stored.version != pending.version {
            return Err(StoreError::Conflict(case.id));
        }

        stored.case = case;
        stored.version += 1;
        let case_id = stored.case.id;
        state.submitted.push(case_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseState, ExpiryWindow, FollowUpAction};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> ExpiryWindow {
        ExpiryWindow::for_reference(date(2024, 3, 12))
    }

    fn case(id: u64, case_type: &str) -> CaseRecord {
        CaseRecord::new(CaseId::new(id), CaseType::new(case_type), CaseState::Submitted)
            .with_action(FollowUpAction::new("bf-1", date(2024, 3, 11)))
    }

    #[tokio::test]
    async fn search_pages_in_id_order_within_case_type() {
        let store = InMemoryCaseStore::with_cases(vec![
            case(30, "ET_EnglandWales"),
            case(10, "ET_EnglandWales"),
            case(20, "ET_Scotland"),
            case(40, "ET_EnglandWales"),
        ]);
        let ew = CaseType::new("ET_EnglandWales");

        let first = store.search(&ew, &CaseQuery::build(&window(), 2, None)).await.unwrap();
        assert_eq!(first.iter().map(|c| c.id.as_u64()).collect::<Vec<_>>(), vec![10, 30]);

        let next = store
            .search(&ew, &CaseQuery::build(&window(), 2, Some(CaseId::new(30))))
            .await
            .unwrap();
        assert_eq!(next.iter().map(|c| c.id.as_u64()).collect::<Vec<_>>(), vec![40]);
    }

    #[tokio::test]
    async fn submit_after_external_change_conflicts() {
        let store = InMemoryCaseStore::with_cases(vec![case(1, "ET_Scotland")]);
        let started = store.start_event(CaseId::new(1), "EVT").await.unwrap();

        store.clear_action(CaseId::new(1), "bf-1", "done").await;

        let err = store.submit_event(started.token, started.case).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict(CaseId::new(1)));
    }

    #[tokio::test]
    async fn tokens_are_single_use() {
        let store = InMemoryCaseStore::with_cases(vec![case(1, "ET_Scotland")]);
        let started = store.start_event(CaseId::new(1), "EVT").await.unwrap();

        store
            .submit_event(started.token.clone(), started.case.clone())
            .await
            .unwrap();
        let err = store.submit_event(started.token, started.case).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidToken(_)));
        assert_eq!(store.submitted_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_case_is_not_found() {
        let store = InMemoryCaseStore::new();
        let err = store.start_event(CaseId::new(99), "EVT").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(CaseId::new(99)));
    }

    #[tokio::test]
    async fn injected_search_failure_after_pages() {
        let store = InMemoryCaseStore::with_cases(vec![case(1, "ET_Scotland")]);
        store
            .fail_search_after(1, StoreError::Unavailable("down".to_string()))
            .await;
        let scot = CaseType::new("ET_Scotland");
        let query = CaseQuery::build(&window(), 10, None);

        assert!(store.search(&scot, &query).await.is_ok());
        assert!(store.search(&scot, &query).await.is_err());
        assert_eq!(store.search_calls().await.len(), 2);
    }
}
