//! Domain model (ids, case records, cutoff, query, candidates, errors).
//!
//! このモジュールは純粋な型とルールだけを持ち、I/O を行いません。

pub mod ids;
pub mod state;
pub mod case;
pub mod cutoff;
pub mod query;
pub mod candidate;
pub mod errors;

pub use self::ids::{CaseId, CaseType, EventToken};
pub use self::state::CaseState;
pub use self::case::{CaseRecord, FollowUpAction};
pub use self::cutoff::{DEFAULT_LOOKBACK_DAYS, ExpiryWindow, effective_cutoff};
pub use self::query::{CaseQuery, DueDateRange, SortOrder};
pub use self::candidate::{CandidateSet, ScanCursor};
pub use self::errors::{DispatchError, ErrorKind, ScanError, StoreError};
