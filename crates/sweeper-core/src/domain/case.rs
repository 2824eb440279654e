//! CaseRecord / FollowUpAction - ケースと follow-up action
//!
//! CaseRecord はケースストアが所有するデータで、このクレートは読み取りと
//! `work_item_created` マーカーの書き戻しだけを行います。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{CaseId, CaseType};
use super::state::CaseState;

/// ケースに付いた期日付きのリマインダー（BF action）
///
/// # actionable の条件
/// - `due_date <= cutoff`
/// - `cleared` が空（空白のみの文字列も空とみなす）
/// - `work_item_created` が false
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpAction {
    pub id: String,
    pub due_date: NaiveDate,

    /// 解消済みマーカー（日付や担当者名などが入る）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared: Option<String>,

    /// このジョブが work item 作成イベントを送った後に立てるフラグ
    #[serde(default)]
    pub work_item_created: bool,
}

impl FollowUpAction {
    pub fn new(id: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            due_date,
            cleared: None,
            work_item_created: false,
        }
    }

    pub fn cleared_with(mut self, marker: impl Into<String>) -> Self {
        self.cleared = Some(marker.into());
        self
    }

    pub fn with_work_item_created(mut self) -> Self {
        self.work_item_created = true;
        self
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
            .as_deref()
            .is_some_and(|marker| !marker.trim().is_empty())
    }

    pub fn is_actionable(&self, cutoff: NaiveDate) -> bool {
        self.due_date <= cutoff && !self.is_cleared() && !self.work_item_created
    }
}

/// ケースストアから返されるケース
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: CaseId,
    pub case_type: CaseType,
    pub state: CaseState,

    #[serde(default)]
    pub actions: Vec<FollowUpAction>,
}

impl CaseRecord {
    pub fn new(id: CaseId, case_type: CaseType, state: CaseState) -> Self {
        Self {
            id,
            case_type,
            state,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: FollowUpAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn has_actionable(&self, cutoff: NaiveDate) -> bool {
        self.actions.iter().any(|a| a.is_actionable(cutoff))
    }

    /// actionable な action 全てに `work_item_created` を立て、立てた件数を返す
    pub fn mark_actionable(&mut self, cutoff: NaiveDate) -> usize {
        let mut marked = 0;
        for action in self.actions.iter_mut().filter(|a| a.is_actionable(cutoff)) {
            action.work_item_created = true;
            marked += 1;
        }
        marked
    }
}
