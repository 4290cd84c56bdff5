use serde::{Deserialize, Serialize};

/// 任务文件
///
/// ```toml
/// targets = ["LD-1", "LD-2"]
/// schedule = ["08:30", "20:00"]
/// package = "com.facebook.katana"
///
/// [[devices]]
/// name = "LD-1"
/// index = 0
///
/// [commands]
/// start = ["ldconsole", "launch", "--name", "{name}"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFile {
    /// 本次要处理的模拟器名称
    #[serde(default)]
    pub targets: Vec<String>,
    /// 已安装的模拟器清单
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    /// 每日触发时间（HH:MM），为空表示立即运行一次
    #[serde(default)]
    pub schedule: Vec<String>,
    /// 要打开的应用包名
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default)]
    pub commands: CommandTemplates,
}

/// 模拟器清单中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub index: u32,
    /// 不填时根据 index 推算
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

/// 外部命令模板（argv 形式）
///
/// 可用占位符：`{name}` `{serial}` `{index}` `{package}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTemplates {
    pub start: Vec<String>,
    pub stop: Vec<String>,
    /// 连接 adb（打开应用前、开始滑动前），为空则跳过
    pub connect: Vec<String>,
    /// 打开应用前解锁屏幕，为空则跳过
    pub unlock: Vec<String>,
    pub launch_app: Vec<String>,
    pub swipe: Vec<String>,
    /// 启动后整理窗口，为空则跳过
    pub arrange_windows: Vec<String>,
}

impl Default for CommandTemplates {
    fn default() -> Self {
        Self {
            start: argv(&["ldconsole", "launch", "--name", "{name}"]),
            stop: argv(&["ldconsole", "quit", "--name", "{name}"]),
            connect: argv(&["adb", "connect", "{serial}"]),
            unlock: argv(&["adb", "-s", "{serial}", "shell", "input", "keyevent", "82"]),
            launch_app: argv(&[
                "adb",
                "-s",
                "{serial}",
                "shell",
                "monkey",
                "-p",
                "{package}",
                "-c",
                "android.intent.category.LAUNCHER",
                "1",
            ]),
            swipe: argv(&[
                "adb", "-s", "{serial}", "shell", "input", "swipe", "300", "1000", "300", "500",
                "500",
            ]),
            arrange_windows: argv(&["ldconsole", "sortWnd"]),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn default_package() -> String {
    "com.facebook.katana".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_job_uses_defaults() {
        let job: JobFile = toml::from_str(r#"targets = ["LD-1"]"#).unwrap();
        assert_eq!(job.targets, vec!["LD-1".to_string()]);
        assert_eq!(job.package, "com.facebook.katana");
        assert_eq!(job.commands, CommandTemplates::default());
        assert!(job.schedule.is_empty());
    }

    #[test]
    fn test_partial_commands_override() {
        let job: JobFile = toml::from_str(
            r#"
            [commands]
            stop = ["dnconsole", "quit", "--index", "{index}"]
            "#,
        )
        .unwrap();
        assert_eq!(job.commands.stop[0], "dnconsole");
        assert_eq!(job.commands.start, CommandTemplates::default().start);
    }
}
