use crate::error::ConfigError;
use crate::models::plan::SustainPolicy;
use std::str::FromStr;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 运行参数文件（JSON）
    pub settings_path: String,
    /// 任务文件（TOML）：模拟器列表、命令模板、定时
    pub job_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 暂停 / 停止检查间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 阶段等待宽限时间（秒）
    pub stage_timeout_secs: u64,
    /// 滑动基础间隔（毫秒）
    pub gesture_interval_ms: u64,
    /// 滑动随机抖动（毫秒）
    pub gesture_jitter_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: "config/settings.json".to_string(),
            job_file: "ld_job.toml".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            poll_interval_ms: 500,
            stage_timeout_secs: 600,
            gesture_interval_ms: 2000,
            gesture_jitter_ms: 500,
        }
    }
}

impl Config {
    /// 从环境变量加载，未设置的项使用默认值
    ///
    /// 设置了但无法解析的值返回错误，而不是悄悄回退到默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            settings_path: std::env::var("SETTINGS_PATH").unwrap_or(default.settings_path),
            job_file: std::env::var("JOB_FILE").unwrap_or(default.job_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging)?,
            poll_interval_ms: env_or("POLL_INTERVAL_MS", default.poll_interval_ms)?,
            stage_timeout_secs: env_or("STAGE_TIMEOUT_SECS", default.stage_timeout_secs)?,
            gesture_interval_ms: env_or("GESTURE_INTERVAL_MS", default.gesture_interval_ms)?,
            gesture_jitter_ms: env_or("GESTURE_JITTER_MS", default.gesture_jitter_ms)?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn sustain_policy(&self) -> SustainPolicy {
        SustainPolicy {
            gesture_interval: Duration::from_millis(self.gesture_interval_ms),
            gesture_jitter: Duration::from_millis(self.gesture_jitter_ms),
        }
    }
}

fn env_or<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(var_name, value, std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_numbers_and_bools() {
        assert_eq!(parse_value::<u64>("POLL_INTERVAL_MS", " 250 ").unwrap(), 250);
        assert!(parse_value::<bool>("VERBOSE_LOGGING", "true").unwrap());
    }

    #[test]
    fn test_parse_value_reports_variable() {
        let err = parse_value::<u64>("STAGE_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "STAGE_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_default_sustain_policy() {
        let policy = Config::default().sustain_policy();
        assert_eq!(policy.gesture_interval, Duration::from_millis(2000));
        assert_eq!(policy.gesture_jitter, Duration::from_millis(500));
    }
}
