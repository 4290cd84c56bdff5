use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 设备控制错误
    #[error("设备错误: {0}")]
    Device(#[from] DeviceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 设备控制错误
///
/// 只在单个成员任务内部出现，被捕获并记录，不会向上传播
#[derive(Debug, Error)]
pub enum DeviceError {
    /// 找不到模拟器
    #[error("找不到模拟器: {id}")]
    NotFound { id: String },
    /// 外部命令返回失败
    #[error("命令执行失败 ({id}): {command} -> {detail}")]
    CommandFailed {
        id: String,
        command: String,
        detail: String,
    },
    /// 无法启动外部命令
    #[error("无法执行命令 ({id}): {command}: {source}")]
    Io {
        id: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
///
/// 在任何批次开始之前暴露给调用方
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 批次大小必须 >= 1
    #[error("批次大小无效: {0}（必须 >= 1）")]
    InvalidBatchSize(usize),
    /// 轮询间隔不能为 0
    #[error("轮询间隔不能为 0")]
    InvalidPollInterval,
    /// 定时时间格式错误
    #[error("定时时间格式错误: '{value}'（应为 HH:MM）")]
    InvalidScheduleTime { value: String },
    /// 时长超过上限
    #[error("{field} 过长: {secs} 秒（上限 {max_secs} 秒）")]
    DurationTooLong {
        field: String,
        secs: u64,
        max_secs: u64,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ========== 便捷构造函数 ==========

impl DeviceError {
    /// 创建命令失败错误
    pub fn command_failed(
        id: impl Into<String>,
        command: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        DeviceError::CommandFailed {
            id: id.into(),
            command: command.into(),
            detail: detail.into(),
        }
    }

    /// 创建找不到模拟器错误
    pub fn not_found(id: impl Into<String>) -> Self {
        DeviceError::NotFound { id: id.into() }
    }
}

impl ConfigError {
    /// 创建环境变量解析错误
    pub fn env_parse(
        var_name: impl Into<String>,
        value: impl Into<String>,
        expected_type: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.into(),
            value: value.into(),
            expected_type: expected_type.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_converts_into_app_error() {
        let err: AppError = DeviceError::not_found("LD-9").into();
        assert!(matches!(err, AppError::Device(DeviceError::NotFound { .. })));
        assert!(err.to_string().contains("LD-9"));
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::InvalidScheduleTime {
            value: "25:99".to_string(),
        };
        assert!(err.to_string().contains("25:99"));
    }
}
