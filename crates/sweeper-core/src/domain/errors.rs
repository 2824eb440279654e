//! Errors - エラー型と分類
//!
//! # 回復の範囲
//! - StoreError: ケースストア呼び出しの失敗
//! - ScanError: パーティション単位で回復（そのパーティションの候補は捨てる）
//! - DispatchError: ケース単位で回復（次回の実行で再処理される）

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{CaseId, EventToken};

/// ErrorKind は実行エラーの運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 一時的なエラー（次回実行で回復が見込める）
    Transient,
    /// 恒久的なエラー（データの修正が必要）
    Permanent,
    /// インフラエラー（ストアの障害など）
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("case store unavailable: {0}")]
    Unavailable(String),

    #[error("case {0} not found")]
    NotFound(CaseId),

    #[error("concurrent modification of case {0}")]
    Conflict(CaseId),

    #[error("unknown or expired event token {0}")]
    InvalidToken(EventToken),

    #[error("{0}")]
    Rejected(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) => ErrorKind::Infrastructure,
            StoreError::Conflict(_) | StoreError::InvalidToken(_) => ErrorKind::Transient,
            StoreError::NotFound(_) | StoreError::Rejected(_) => ErrorKind::Permanent,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("search failed after {pages} page(s): {source}")]
    Query {
        pages: usize,
        #[source]
        source: StoreError,
    },

    #[error("cursor did not advance past case {cursor} (page ended at {last})")]
    CursorStalled { cursor: CaseId, last: CaseId },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to start event for case {case_id}: {source}")]
    Start {
        case_id: CaseId,
        #[source]
        source: StoreError,
    },

    #[error("failed to submit event for case {case_id}: {source}")]
    Submit {
        case_id: CaseId,
        #[source]
        source: StoreError,
    },

    #[error("start_event returned case {returned} for case {requested}")]
    CaseMismatch { requested: CaseId, returned: CaseId },

    #[error("dispatch for case {case_id} timed out after {millis}ms")]
    TimedOut { case_id: CaseId, millis: u128 },

    #[error("dispatch task for case {case_id} aborted: {reason}")]
    Aborted { case_id: CaseId, reason: String },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Start { source, .. } | DispatchError::Submit { source, .. } => {
                source.kind()
            }
            DispatchError::CaseMismatch { .. } => ErrorKind::Permanent,
            DispatchError::TimedOut { .. } | DispatchError::Aborted { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_transient() {
        let err = DispatchError::Submit {
            case_id: CaseId::new(7),
            source: StoreError::Conflict(CaseId::new(7)),
        };
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.to_string().contains("case 7"));
    }

    #[test]
    fn scan_error_keeps_store_error_as_source() {
        let err = ScanError::Query {
            pages: 2,
            source: StoreError::Unavailable("connection reset".to_string()),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "case store unavailable: connection reset");
    }
}
