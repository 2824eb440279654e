//! Clock port - 時刻の抽象化
//!
//! cutoff の計算は「今日」に依存するため、テストでは FixedClock に差し替えます。

use chrono::{DateTime, NaiveDate, Utc};

/// Clock は現在時刻を提供
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// 業務日付（UTC の日付）
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// 本番用
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// テスト用: 常に同じ時刻を返す
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// 指定日の 00:00 UTC に固定する
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::default()).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_reports_its_date() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 11, 23, 59, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn fixed_clock_on_date_starts_at_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let clock = FixedClock::on(date);
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
    }
}
