//! 定时调度
//!
//! 调用方持有的定时表：每天在指定时间触发一次运行。
//! 与编排器解耦，只负责"什么时候调用 run"。

use crate::control::RunControl;
use crate::error::ConfigError;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// 定时表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scheduler {
    entries: Vec<NaiveTime>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 "HH:MM" 列表创建
    pub fn from_times<I, S>(times: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scheduler = Self::new();
        for time in times {
            scheduler.add(time.as_ref())?;
        }
        Ok(scheduler)
    }

    /// 添加一个每日触发时间（HH:MM），重复的时间只保留一个
    pub fn add(&mut self, time: &str) -> Result<(), ConfigError> {
        let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| {
            ConfigError::InvalidScheduleTime {
                value: time.to_string(),
            }
        })?;
        if !self.entries.contains(&parsed) {
            self.entries.push(parsed);
            self.entries.sort();
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 下一个触发时刻：今天还没到的最早时间，否则明天的第一个
    pub fn next_trigger(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = now.date();
        if let Some(time) = self.entries.iter().find(|t| **t > now.time()) {
            return Some(today.and_time(*time));
        }
        let tomorrow = today + ChronoDuration::days(1);
        self.entries.first().map(|time| tomorrow.and_time(*time))
    }

    /// 按定时反复触发 `launch`，直到收到停止信号
    ///
    /// 每次触发前由调用方负责重置暂停标志；这里只在停止时退出。
    pub async fn run<F, Fut>(&self, control: &RunControl, poll: Duration, mut launch: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        if self.is_empty() {
            warn!("⚠️ 定时表为空，不会触发任何运行");
            return;
        }

        loop {
            let now = Local::now().naive_local();
            let Some(next) = self.next_trigger(now) else {
                return;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            info!("⏰ 下一次运行: {}（{} 秒后）", next.format("%Y-%m-%d %H:%M"), wait.as_secs());

            if !control.sleep(wait, poll).await {
                info!("定时调度已停止");
                return;
            }

            info!("⏰ 定时触发: {}", next.format("%H:%M"));
            launch().await;

            if control.is_cancelled() {
                info!("定时调度已停止");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_malformed_time_is_config_error() {
        let mut scheduler = Scheduler::new();
        assert_eq!(
            scheduler.add("25:61"),
            Err(ConfigError::InvalidScheduleTime {
                value: "25:61".to_string()
            })
        );
        assert!(scheduler.add("eight").is_err());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_entries_sorted_and_deduped() {
        let scheduler = Scheduler::from_times(["20:00", "08:30", "20:00"]).unwrap();
        assert_eq!(scheduler.entries.len(), 2);
        assert_eq!(scheduler.entries[0], NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    }

    #[test]
    fn test_next_trigger_later_today() {
        let scheduler = Scheduler::from_times(["08:30", "20:00"]).unwrap();
        assert_eq!(scheduler.next_trigger(at(9, 0)), Some(at(20, 0)));
    }

    #[test]
    fn test_next_trigger_wraps_to_tomorrow() {
        let scheduler = Scheduler::from_times(["08:30"]).unwrap();
        let next = scheduler.next_trigger(at(8, 30)).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        assert_eq!(next.time(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    }

    #[test]
    fn test_empty_schedule_has_no_trigger() {
        assert_eq!(Scheduler::new().next_trigger(at(12, 0)), None);
    }

    #[tokio::test]
    async fn test_run_exits_when_already_cancelled() {
        let scheduler = Scheduler::from_times(["08:30"]).unwrap();
        let control = RunControl::new();
        control.cancel();

        let mut launched = 0;
        scheduler
            .run(&control, Duration::from_millis(10), || {
                launched += 1;
                async {}
            })
            .await;
        assert_eq!(launched, 0);
    }
}
