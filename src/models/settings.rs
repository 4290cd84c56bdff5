//! 运行参数的持久化
//!
//! JSON 格式，键名与旧版设置文件保持一致

use crate::config::Config;
use crate::error::FileError;
use crate::models::plan::{RunPlan, StageDelays};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

/// 用户可调的运行参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// 同时运行的模拟器数量
    pub parallel_ld: usize,
    /// 启动后等待（秒）
    pub boot_delay: u64,
    /// 打开应用后等待（秒）
    pub task_delay: u64,
    /// 关闭前等待（秒）
    pub close_delay: u64,
    /// 滑动时长（分钟）
    pub scroll_duration: u64,
    /// 顺序启动间隔（秒）
    pub start_delay: u64,
    /// 是否同时启动整批
    pub start_simultaneously: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            parallel_ld: 2,
            boot_delay: 5,
            task_delay: 5,
            close_delay: 5,
            scroll_duration: 5,
            start_delay: 0,
            start_simultaneously: false,
        }
    }
}

impl RunSettings {
    /// 读取设置文件
    ///
    /// 文件不存在或内容损坏时使用默认值
    pub async fn load_or_default(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(settings) => {
                info!("已加载运行参数: {}", path.display());
                settings
            }
            Err(e) => {
                warn!("⚠️ 设置文件不存在或已损坏，使用默认设置: {}", e);
                Self::default()
            }
        }
    }

    pub async fn load(path: &Path) -> Result<Self, FileError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| FileError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 保存设置文件（自动创建目录）
    pub async fn save(&self, path: &Path) -> Result<(), FileError> {
        let write_failed = |source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(write_failed)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| {
            FileError::JsonParseFailed {
                path: path.display().to_string(),
                source,
            }
        })?;
        fs::write(path, json).await.map_err(write_failed)?;
        Ok(())
    }

    /// 转换为一次运行的参数
    pub fn to_plan(&self, config: &Config) -> RunPlan {
        RunPlan {
            batch_size: self.parallel_ld,
            start_simultaneously: self.start_simultaneously,
            delays: StageDelays {
                inter_start: Duration::from_secs(self.start_delay),
                after_start: Duration::from_secs(self.boot_delay),
                after_activate: Duration::from_secs(self.task_delay),
                after_sustain: Duration::from_secs(self.close_delay),
            },
            sustain_duration: Duration::from_secs(self.scroll_duration.saturating_mul(60)),
            sustain: config.sustain_policy(),
            poll_interval: config.poll_interval(),
            stage_timeout: config.stage_timeout(),
        }
    }
}
