//! 单次运行的参数
//!
//! 一次运行期间不可变

use crate::error::ConfigError;
use crate::models::stage::Stage;
use std::time::Duration;

/// 单个时长参数的上限（7 天）
pub const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// 各阶段的等待时间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageDelays {
    /// 顺序启动时，两台模拟器之间的间隔
    pub inter_start: Duration,
    /// 启动后等待系统就绪
    pub after_start: Duration,
    /// 打开应用后等待加载
    pub after_activate: Duration,
    /// 滑动结束后、关闭前的等待
    pub after_sustain: Duration,
}

/// 滑动节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SustainPolicy {
    /// 两次滑动之间的基础间隔
    pub gesture_interval: Duration,
    /// 随机抖动的最大幅度（基础间隔 ± jitter）
    pub gesture_jitter: Duration,
}

impl Default for SustainPolicy {
    fn default() -> Self {
        Self {
            gesture_interval: Duration::from_millis(2000),
            gesture_jitter: Duration::from_millis(500),
        }
    }
}

/// 一次运行的完整参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// 每批同时处理的模拟器数量
    pub batch_size: usize,
    /// 启动阶段是否同时启动整批
    pub start_simultaneously: bool,
    pub delays: StageDelays,
    /// 滑动阶段总时长
    pub sustain_duration: Duration,
    pub sustain: SustainPolicy,
    /// 暂停 / 停止检查间隔
    pub poll_interval: Duration,
    /// 等待一个阶段的额外宽限时间
    pub stage_timeout: Duration,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            batch_size: 2,
            start_simultaneously: false,
            delays: StageDelays::default(),
            sustain_duration: Duration::ZERO,
            sustain: SustainPolicy::default(),
            poll_interval: Duration::from_millis(500),
            stage_timeout: Duration::from_secs(600),
        }
    }
}

impl RunPlan {
    /// 校验参数，在任何批次开始之前调用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval);
        }

        let durations = [
            ("inter_start", self.delays.inter_start),
            ("after_start", self.delays.after_start),
            ("after_activate", self.delays.after_activate),
            ("after_sustain", self.delays.after_sustain),
            ("sustain_duration", self.sustain_duration),
            ("gesture_interval", self.sustain.gesture_interval),
            ("gesture_jitter", self.sustain.gesture_jitter),
            ("poll_interval", self.poll_interval),
            ("stage_timeout", self.stage_timeout),
        ];
        // 超过上限的时长在计算截止时间时会溢出
        for (field, value) in durations {
            if value > MAX_DURATION {
                return Err(ConfigError::DurationTooLong {
                    field: field.to_string(),
                    secs: value.as_secs(),
                    max_secs: MAX_DURATION.as_secs(),
                });
            }
        }
        Ok(())
    }

    /// 单个成员在某阶段的正常耗时
    pub fn nominal_member_duration(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Start => self.delays.after_start,
            Stage::Activate => self.delays.after_activate,
            Stage::Sustain => {
                self.sustain_duration + self.sustain.gesture_interval + self.sustain.gesture_jitter
            }
            Stage::Teardown => self.delays.after_sustain,
        }
    }

    /// 等待一个阶段全部成员的时间上限（暂停时间不计入）
    pub fn stage_budget(&self, stage: Stage) -> Duration {
        self.stage_timeout + self.nominal_member_duration(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_batch_size_rejected() {
        let plan = RunPlan {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(plan.validate(), Err(ConfigError::InvalidBatchSize(0)));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let plan = RunPlan {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(plan.validate(), Err(ConfigError::InvalidPollInterval));
    }

    #[test]
    fn test_oversized_duration_rejected() {
        let plan = RunPlan {
            sustain_duration: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            plan.validate(),
            Err(ConfigError::DurationTooLong { ref field, .. }) if field == "sustain_duration"
        ));

        let at_limit = RunPlan {
            stage_timeout: MAX_DURATION,
            ..Default::default()
        };
        assert_eq!(at_limit.validate(), Ok(()));
    }

    #[test]
    fn test_sustain_budget_covers_duration() {
        let plan = RunPlan {
            sustain_duration: Duration::from_secs(900),
            stage_timeout: Duration::from_secs(60),
            ..Default::default()
        };
        assert!(plan.stage_budget(Stage::Sustain) > Duration::from_secs(960));
        assert_eq!(plan.stage_budget(Stage::Start), Duration::from_secs(60));
    }
}
