//! 运行日志写入服务
//!
//! 只负责"把运行事件追加到日志文件"，不关心流程

use crate::orchestrator::{EventSink, RunEvent};
use crate::utils::logging::timestamped;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 日志写入服务
///
/// 职责：
/// - 提供一个立即返回的事件回调
/// - 后台任务按顺序追加写入文件
pub struct LogWriter {
    sender: mpsc::UnboundedSender<String>,
    worker: JoinHandle<()>,
}

impl LogWriter {
    /// 启动后台写入任务
    pub fn spawn(log_file_path: impl Into<String>) -> Self {
        let log_file_path = log_file_path.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

        let worker = tokio::spawn(async move {
            let mut file = match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file_path)
                .await
            {
                Ok(file) => file,
                Err(e) => {
                    warn!("⚠️ 无法打开日志文件 {}: {}", log_file_path, e);
                    return;
                }
            };

            while let Some(line) = receiver.recv().await {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    warn!("⚠️ 写入日志文件失败: {}", e);
                }
            }
            let _ = file.flush().await;
            debug!("日志写入任务结束: {}", log_file_path);
        });

        Self { sender, worker }
    }

    /// 直接写一行
    pub fn write(&self, message: &str) {
        let _ = self.sender.send(timestamped(message));
    }

    /// 交给编排器的事件回调
    pub fn sink(&self) -> EventSink {
        let sender = self.sender.clone();
        Arc::new(move |event: &RunEvent| {
            let _ = sender.send(timestamped(&event.to_string()));
        })
    }

    /// 关闭通道并等待剩余内容写完
    ///
    /// 编排器持有的回调需要先被释放，否则通道不会关闭
    pub async fn finish(self) {
        drop(self.sender);
        let _ = self.worker.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stage::Stage;

    #[tokio::test]
    async fn test_events_are_appended() {
        let path = std::env::temp_dir().join(format!("ld_events_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let writer = LogWriter::spawn(path.to_string_lossy().to_string());
        writer.write("开始");
        {
            let sink = writer.sink();
            sink(&RunEvent::MemberStarted {
                id: "LD-7".to_string(),
                stage: Stage::Activate,
            });
        }
        writer.finish().await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("LD-7"));
        let _ = std::fs::remove_file(&path);
    }
}
