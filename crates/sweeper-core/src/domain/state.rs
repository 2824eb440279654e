//! State - ケースの状態
//!
//! スキャン対象になるのは「生きている」状態のケースだけです。
//! アーカイブ済み・移管済み・クローズ済みのケースは検索クエリで除外します。

use serde::{Deserialize, Serialize};
use std::fmt;

/// CaseState はケースのライフサイクル状態を表現
///
/// # 状態
/// - Submitted: 受付済み
/// - Vetted: 審査済み
/// - Accepted: 受理
/// - Rejected: 却下（ただし follow-up は継続する）
/// - Closed: クローズ
/// - Transferred: 他の管轄へ移管
/// - Archived: アーカイブ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseState {
    Submitted,
    Vetted,
    Accepted,
    Rejected,
    Closed,
    Transferred,
    Archived,
}

impl CaseState {
    /// 検索対象となる状態の一覧
    pub const LIVE: [CaseState; 4] = [
        CaseState::Submitted,
        CaseState::Vetted,
        CaseState::Accepted,
        CaseState::Rejected,
    ];

    pub fn is_live(self) -> bool {
        Self::LIVE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseState::Submitted => "Submitted",
            CaseState::Vetted => "Vetted",
            CaseState::Accepted => "Accepted",
            CaseState::Rejected => "Rejected",
            CaseState::Closed => "Closed",
            CaseState::Transferred => "Transferred",
            CaseState::Archived => "Archived",
        }
    }
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
