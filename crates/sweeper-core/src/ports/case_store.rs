//! CaseStore port - 外部のケース管理システム
//!
//! CaseStore はケースの正本（source of truth）です。
//! このクレートは検索と、2 段階のイベント（start → submit）による更新だけを使います。
//!
//! # 設計原則
//! - 検索はケース種別（パーティション）ごと、ページ単位（`CaseQuery::size` 件まで、case id 昇順）
//! - 更新は必ず `start_event` で取り直したレコードに対して行う
//! - 同一ケースへの同時更新の制御（楽観ロックなど）はストアの責務
//! - 呼び出しのタイムアウトはストアのクライアントが持つ

use async_trait::async_trait;

use crate::domain::{CaseId, CaseQuery, CaseRecord, CaseType, EventToken, StoreError};

/// `start_event` の結果
///
/// `case` はイベント開始時点の最新のレコード。
#[derive(Debug, Clone)]
pub struct StartedEvent {
    pub case: CaseRecord,
    pub token: EventToken,
}

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// ケース種別を指定してクエリを実行し、1 ページ分のケースを返す
    async fn search(
        &self,
        case_type: &CaseType,
        query: &CaseQuery,
    ) -> Result<Vec<CaseRecord>, StoreError>;

    /// 1 ケースに対する更新トランザクションを開始する
    async fn start_event(&self, case_id: CaseId, event_name: &str)
    -> Result<StartedEvent, StoreError>;

    /// 更新をコミットする
    async fn submit_event(&self, token: EventToken, case: CaseRecord) -> Result<(), StoreError>;
}
