//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use crate::orchestrator::RunSummary;
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing
///
/// 设置了 `RUST_LOG` 时以它为准，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n模拟器批量任务日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `batch_size`: 每批数量
/// - `targets`: 目标总数
pub fn log_startup(batch_size: usize, targets: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟器批量任务");
    info!("📊 目标数量: {}，每批: {}", targets, batch_size);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 运行统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ 完成批次: {}/{}",
        summary.batches_completed, summary.batches_total
    );
    info!("❌ 阶段失败: {}", summary.stage_failures);
    info!("⏱️ 阶段超时: {}", summary.stage_timeouts);
    if summary.cancelled {
        info!("🛑 已被手动停止");
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 带时间戳的一行日志
pub fn timestamped(message: &str) -> String {
    format!(
        "[{}] {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_line() {
        let line = timestamped("已停止");
        assert!(line.starts_with('['));
        assert!(line.ends_with("已停止\n"));
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let path = std::env::temp_dir().join(format!("ld_log_{}.txt", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        init_log_file(&path_str).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("模拟器批量任务日志"));
        let _ = fs::remove_file(&path);
    }
}
