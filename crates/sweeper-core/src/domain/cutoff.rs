//! Cutoff - 期限切れ判定に使う「実質的な昨日」
//!
//! # ルール（暫定）
//! - 基準日の前日を取る
//! - 前日が土曜・日曜なら、直前の金曜まで戻す
//! - 祝日は考慮しない
//!
//! 月曜の基準日は金曜、日曜の基準日も金曜、火曜〜土曜は前日になります。
//!
//! # 検索範囲
//! 検索クエリの due date 範囲は `[cutoff - lookback_days, today)`。
//! 下限を cutoff より前に広げることで、前回の実行で失敗したケースや
//! 週末が期日の action も、後の実行で拾われます。

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 検索範囲を cutoff から遡る日数の既定値
pub const DEFAULT_LOOKBACK_DAYS: u64 = 30;

/// 基準日から cutoff を計算する（純粋関数）
pub fn effective_cutoff(reference: NaiveDate) -> NaiveDate {
    let mut day = previous_day(reference);
    while is_weekend(day) {
        day = previous_day(day);
    }
    day
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    // NaiveDate::MIN より前は表現できないのでそのまま返す
    date.checked_sub_days(Days::new(1)).unwrap_or(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// ExpiryWindow は 1 回の実行で使う日付の組
///
/// - `earliest`: 検索クエリの due date 範囲の下限（この日を含む）
/// - `cutoff`: action が期限切れとみなされる上限（この日を含む）
/// - `today`: 検索クエリの due date 範囲の上限（この日を含まない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryWindow {
    pub earliest: NaiveDate,
    pub cutoff: NaiveDate,
    pub today: NaiveDate,
}

impl ExpiryWindow {
    pub fn for_reference(today: NaiveDate) -> Self {
        Self::with_lookback(today, DEFAULT_LOOKBACK_DAYS)
    }

    /// `lookback_days = 0` なら検索範囲は `[cutoff, today)` になる
    pub fn with_lookback(today: NaiveDate, lookback_days: u64) -> Self {
        let cutoff = effective_cutoff(today);
        let earliest = cutoff
            .checked_sub_days(Days::new(lookback_days))
            .unwrap_or(NaiveDate::MIN);
        Self {
            earliest,
            cutoff,
            today,
        }
    }
}
