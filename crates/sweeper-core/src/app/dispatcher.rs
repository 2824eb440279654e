//! TaskDispatcher - 選ばれたケースごとに work item 作成イベントを送る
//!
//! # フロー（ケースごと）
//! 1. CaseStore::start_event() でトランザクション開始 + 最新のレコード取得
//! 2. 最新のレコード上で actionable な action に `work_item_created` を立てる
//! 3. CaseStore::submit_event() でコミット
//!
//! # 並行性
//! - `worker_count` 本のワーカーが共有キューからケースを取り出す
//! - ケース間の処理順序は保証しない
//! - ワーカー間で共有する可変状態はキューと結果の受け皿だけ
//!
//! # 失敗の扱い
//! - 1 ケースの失敗はログに残して次へ進む（プール全体は止めない）
//! - 実行内でのリトライはしない。マーカーが立っていないので次回の実行で再処理される
//! - マーカーを立てた後に submit が失敗した場合、次回に再送される可能性がある（at-least-once）
//! - ワーカー自体が落ちた場合、結果の無いケースは Aborted として失敗に数える
//!   （`attempted == dispatched + stale + failed` を常に保つ）

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::{CaseId, CaseRecord, DispatchError, ErrorKind};
use crate::ports::CaseStore;

/// 1 ケースの処理結果（成功側）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    /// submit まで完了
    Dispatched { actions_marked: usize },
    /// start 時点のレコードに actionable な action が無かった（submit しない）
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFailure {
    pub case_id: CaseId,
    pub kind: ErrorKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub attempted: usize,
    pub dispatched: usize,
    pub stale: usize,
    pub actions_marked: usize,
    pub failures: Vec<CaseFailure>,
}

impl DispatchReport {
    fn record(&mut self, case_id: CaseId, result: Result<CaseOutcome, DispatchError>) {
        match result {
            Ok(CaseOutcome::Dispatched { actions_marked }) => {
                self.dispatched += 1;
                self.actions_marked += actions_marked;
            }
            Ok(CaseOutcome::Stale) => self.stale += 1,
            Err(err) => self.failures.push(CaseFailure {
                case_id,
                kind: err.kind(),
                reason: err.to_string(),
            }),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// ワーカー間で共有する読み取り専用のコンテキスト
struct DispatchContext {
    store: Arc<dyn CaseStore>,
    event_name: String,
    cutoff: NaiveDate,
    case_timeout: Option<Duration>,
}

pub struct TaskDispatcher {
    ctx: Arc<DispatchContext>,
}

impl TaskDispatcher {
    pub fn new(
        store: Arc<dyn CaseStore>,
        event_name: impl Into<String>,
        cutoff: NaiveDate,
        case_timeout: Option<Duration>,
    ) -> Self {
        Self {
            ctx: Arc::new(DispatchContext {
                store,
                event_name: event_name.into(),
                cutoff,
                case_timeout,
            }),
        }
    }

    /// 全ての候補を `worker_count` 本のワーカーで処理する
    ///
    /// 個々のケースの失敗は `DispatchReport::failures` に入り、この関数自体は失敗しない。
    pub async fn dispatch(&self, candidates: Vec<CaseRecord>, worker_count: usize) -> DispatchReport {
        let mut report = DispatchReport {
            attempted: candidates.len(),
            ..DispatchReport::default()
        };
        if candidates.is_empty() {
            return report;
        }

        // スキャン時のスナップショットは使わず、id だけをキューに入れる
        let ids: Vec<CaseId> = candidates.into_iter().map(|case| case.id).collect();
        let workers = worker_count.max(1).min(ids.len());
        let queue = Arc::new(Mutex::new(ids.iter().copied().collect::<VecDeque<_>>()));
        let results: ResultSink = Arc::new(Mutex::new(Vec::with_capacity(ids.len())));

        let mut joins = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let results = Arc::clone(&results);
            let ctx = Arc::clone(&self.ctx);
            joins.push(tokio::spawn(worker_loop(worker_id, queue, results, ctx)));
        }

        for join in joins {
            // worker_loop 自体はケースの panic を拾うので、ここに来るのは想定外
            if let Err(e) = join.await {
                error!(error = %e, "dispatch worker terminated unexpectedly");
            }
        }

        let finished = std::mem::take(&mut *results.lock().await);
        settle(&mut report, ids, finished);

        info!(
            attempted = report.attempted,
            dispatched = report.dispatched,
            stale = report.stale,
            failed = report.failed(),
            actions_marked = report.actions_marked,
            "dispatch finished"
        );
        report
    }
}

type CaseResult = (CaseId, Result<CaseOutcome, DispatchError>);
type ResultSink = Arc<Mutex<Vec<CaseResult>>>;

/// 結果をレポートに集計する。結果の無いケースは Aborted として失敗に数える
fn settle(report: &mut DispatchReport, ids: Vec<CaseId>, results: Vec<CaseResult>) {
    let mut finished = HashSet::with_capacity(results.len());
    for (case_id, result) in results {
        finished.insert(case_id);
        report.record(case_id, result);
    }

    let lost: Vec<CaseId> = ids.into_iter().filter(|id| !finished.contains(id)).collect();
    if lost.is_empty() {
        return;
    }
    error!(lost = lost.len(), cases = ?lost, "cases left without a result after worker failure");
    for case_id in lost {
        report.record(
            case_id,
            Err(DispatchError::Aborted {
                case_id,
                reason: "dispatch worker terminated before reporting".to_string(),
            }),
        );
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<CaseId>>>,
    results: ResultSink,
    ctx: Arc<DispatchContext>,
) {
    loop {
        // ロックはキューから 1 件取り出す間だけ保持する
        let Some(case_id) = queue.lock().await.pop_front() else {
            break;
        };

        // panic もケース単位に閉じ込めるため、1 ケースごとに spawn する
        let result = match tokio::spawn(dispatch_one(Arc::clone(&ctx), case_id)).await {
            Ok(result) => result,
            Err(join_err) => Err(DispatchError::Aborted {
                case_id,
                reason: join_err.to_string(),
            }),
        };

        match &result {
            Ok(CaseOutcome::Dispatched { actions_marked }) => {
                debug!(worker_id, case_id = %case_id, actions_marked, "work item event submitted");
            }
            Ok(CaseOutcome::Stale) => {
                warn!(worker_id, case_id = %case_id, "no actionable follow-up left at event start; skipped");
            }
            Err(err) => {
                error!(
                    worker_id,
                    case_id = %case_id,
                    kind = ?err.kind(),
                    error = %err,
                    "follow-up dispatch failed; case stays eligible for the next run"
                );
            }
        }
        results.lock().await.push((case_id, result));
    }
}

async fn dispatch_one(ctx: Arc<DispatchContext>, case_id: CaseId) -> Result<CaseOutcome, DispatchError> {
    match ctx.case_timeout {
        Some(limit) => tokio::time::timeout(limit, start_mark_submit(&ctx, case_id))
            .await
            .unwrap_or(Err(DispatchError::TimedOut {
                case_id,
                millis: limit.as_millis(),
            })),
        None => start_mark_submit(&ctx, case_id).await,
    }
}

async fn start_mark_submit(ctx: &DispatchContext, case_id: CaseId) -> Result<CaseOutcome, DispatchError> {
    let started = ctx
        .store
        .start_event(case_id, &ctx.event_name)
        .await
        .map_err(|source| DispatchError::Start { case_id, source })?;

    let mut case = started.case;
    if case.id != case_id {
        return Err(DispatchError::CaseMismatch {
            requested: case_id,
            returned: case.id,
        });
    }

    let actions_marked = case.mark_actionable(ctx.cutoff);
    if actions_marked == 0 {
        return Ok(CaseOutcome::Stale);
    }

    ctx.store
        .submit_event(started.token, case)
        .await
        .map_err(|source| DispatchError::Submit { case_id, source })?;

    Ok(CaseOutcome::Dispatched { actions_marked })
}
