//! 时钟抽象
//!
//! 日期边界按服务器本地日历计算。核心组件显式接收 `today`，
//! 只有动作服务通过 `Clock` 取当前时间。

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;

/// 时钟接口
pub trait Clock: Send + Sync {
    /// 当前 UTC 时间
    fn now(&self) -> DateTime<Utc>;

    /// 当前本地时间（无时区）
    fn local_now(&self) -> NaiveDateTime;

    /// 本地日历日期
    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 可设置的固定时钟，用于测试与模拟
///
/// 本地时间即 UTC 时间，保证测试结果与运行环境时区无关
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    /// 固定在某日的指定时刻
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self::new(date.and_hms_opt(hour, minute, 0).unwrap_or_default())
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.current.lock() = at;
    }

    /// 保持时刻不变，前进若干天
    pub fn advance_days(&self, days: i64) {
        *self.current.lock() += Duration::days(days);
    }

    /// 保持日期不变，切换到指定时刻
    pub fn set_time(&self, hour: u32, minute: u32) {
        let mut current = self.current.lock();
        if let Some(at) = current.date().and_hms_opt(hour, minute, 0) {
            *current = at;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.current.lock())
    }

    fn local_now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_fixed_clock_advance() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let clock = FixedClock::at(date, 8, 0);
        assert_eq!(clock.today(), date);

        clock.advance_days(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(clock.local_now().hour(), 8);
    }

    #[test]
    fn test_fixed_clock_set_time_keeps_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let clock = FixedClock::at(date, 8, 0);
        clock.set_time(5, 15);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.local_now().hour(), 5);
        assert_eq!(clock.now().hour(), 5);
    }
}
