//! 命令行设备控制 - 基础设施层
//!
//! 通过外部命令（模拟器控制台 / adb）实现 `DeviceControl`，
//! 具体命令来自任务文件中的模板。

use crate::control::RunControl;
use crate::error::DeviceError;
use crate::infrastructure::device::DeviceControl;
use crate::models::job::{CommandTemplates, DeviceEntry, JobFile};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::process::Command;
use tracing::{debug, warn};

/// 单台模拟器的控制句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub name: String,
    pub index: u32,
    pub serial: String,
}

impl DeviceHandle {
    pub fn from_entry(entry: &DeviceEntry) -> Self {
        Self {
            name: entry.name.clone(),
            index: entry.index,
            serial: entry
                .serial
                .clone()
                .unwrap_or_else(|| serial_for_index(entry.index)),
        }
    }
}

/// 根据模拟器序号推算 adb 序列号
pub fn serial_for_index(index: u32) -> String {
    format!("emulator-{}", 5554 + index * 2)
}

/// 命令行设备控制
pub struct CommandDevice {
    devices: HashMap<String, DeviceHandle>,
    commands: CommandTemplates,
    package: String,
}

impl CommandDevice {
    pub fn new(
        devices: impl IntoIterator<Item = DeviceHandle>,
        commands: CommandTemplates,
        package: impl Into<String>,
    ) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|handle| (handle.name.clone(), handle))
                .collect(),
            commands,
            package: package.into(),
        }
    }

    /// 根据任务文件创建
    pub fn from_job(job: &JobFile) -> Self {
        let mut seen = HashSet::new();
        for entry in &job.devices {
            if !seen.insert(entry.name.as_str()) {
                warn!("⚠️ 模拟器名称重复，使用后一项: {}", entry.name);
            }
        }
        Self::new(
            job.devices.iter().map(DeviceHandle::from_entry),
            job.commands.clone(),
            job.package.clone(),
        )
    }

    fn handle(&self, id: &str) -> Result<&DeviceHandle, DeviceError> {
        self.devices.get(id).ok_or_else(|| DeviceError::not_found(id))
    }

    /// 用句柄填充命令模板
    fn render(&self, template: &[String], handle: &DeviceHandle) -> Vec<String> {
        template
            .iter()
            .map(|part| {
                part.replace("{name}", &handle.name)
                    .replace("{serial}", &handle.serial)
                    .replace("{index}", &handle.index.to_string())
                    .replace("{package}", &self.package)
            })
            .collect()
    }

    /// 执行命令，非零退出码视为失败
    async fn exec(&self, id: &str, argv: &[String]) -> Result<(), DeviceError> {
        let Some((program, args)) = argv.split_first() else {
            return Ok(());
        };
        let command_line = argv.join(" ");
        debug!("[{}] 执行: {}", id, command_line);

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DeviceError::Io {
                id: id.to_string(),
                command: command_line.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                format!("{} {}", output.status, stdout.trim())
            } else {
                format!("{} {}", output.status, stderr.trim())
            };
            Err(DeviceError::command_failed(id, command_line, detail))
        }
    }

    async fn run_template(&self, id: &str, template: &[String]) -> Result<(), DeviceError> {
        let handle = self.handle(id)?;
        let argv = self.render(template, handle);
        self.exec(id, &argv).await
    }
}

#[async_trait]
impl DeviceControl for CommandDevice {
    async fn start(&self, id: &str) -> Result<(), DeviceError> {
        self.run_template(id, &self.commands.start).await
    }

    async fn stop(&self, id: &str) -> Result<(), DeviceError> {
        self.run_template(id, &self.commands.stop).await
    }

    async fn connect(&self, id: &str) -> Result<(), DeviceError> {
        self.run_template(id, &self.commands.connect).await
    }

    async fn launch_app(&self, id: &str) -> Result<(), DeviceError> {
        // 连接和解锁失败都不影响打开应用
        if let Err(e) = self.connect(id).await {
            warn!("[{}] ⚠️ adb 连接失败: {}", id, e);
        }
        if let Err(e) = self.run_template(id, &self.commands.unlock).await {
            warn!("[{}] ⚠️ 解锁屏幕失败: {}", id, e);
        }
        self.run_template(id, &self.commands.launch_app).await
    }

    async fn perform_scroll_gesture(
        &self,
        id: &str,
        _control: &RunControl,
    ) -> Result<(), DeviceError> {
        self.run_template(id, &self.commands.swipe).await
    }

    async fn arrange_windows(&self) -> Result<(), DeviceError> {
        self.exec("*", &self.commands.arrange_windows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> CommandDevice {
        CommandDevice::new(
            vec![DeviceHandle::from_entry(&DeviceEntry {
                name: "LD-3".to_string(),
                index: 3,
                serial: None,
            })],
            CommandTemplates::default(),
            "com.example.app",
        )
    }

    #[test]
    fn test_serial_for_index() {
        assert_eq!(serial_for_index(0), "emulator-5554");
        assert_eq!(serial_for_index(3), "emulator-5560");
    }

    #[test]
    fn test_render_fills_placeholders() {
        let device = device();
        let handle = device.handle("LD-3").unwrap();
        let argv = device.render(&device.commands.launch_app, handle);
        assert_eq!(argv[2], "emulator-5560");
        assert_eq!(argv[6], "com.example.app");

        let argv = device.render(&device.commands.start, handle);
        assert_eq!(argv.last().map(String::as_str), Some("LD-3"));
    }

    #[test]
    fn test_render_connect_uses_serial() {
        let device = device();
        let handle = device.handle("LD-3").unwrap();
        assert_eq!(
            device.render(&device.commands.connect, handle),
            vec!["adb", "connect", "emulator-5560"]
        );
    }

    #[tokio::test]
    async fn test_failed_connect_does_not_block_launch() {
        let mut device = device();
        device.commands.connect = vec!["ld-batch-runner-no-such-program".to_string()];
        device.commands.unlock.clear();
        device.commands.launch_app.clear();
        assert!(device.launch_app("LD-3").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let err = device().start("LD-404").await.unwrap_err();
        assert!(matches!(err, DeviceError::NotFound { ref id } if id == "LD-404"));
    }

    #[tokio::test]
    async fn test_empty_template_is_skipped() {
        let mut device = device();
        device.commands.arrange_windows.clear();
        assert!(device.arrange_windows().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let mut device = device();
        device.commands.stop = vec!["ld-batch-runner-no-such-program".to_string()];
        let err = device.stop("LD-3").await.unwrap_err();
        assert!(matches!(err, DeviceError::Io { .. }));
    }
}
