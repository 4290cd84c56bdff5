use crate::models::job::JobFile;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载任务
pub async fn load_job_file(job_file_path: &Path) -> Result<JobFile> {
    let content = fs::read_to_string(job_file_path)
        .await
        .with_context(|| format!("无法读取任务文件: {}", job_file_path.display()))?;

    let job: JobFile = toml::from_str(&content)
        .with_context(|| format!("无法解析任务文件: {}", job_file_path.display()))?;

    tracing::info!(
        "任务文件已加载: {} 个目标, {} 台模拟器, {} 个定时",
        job.targets.len(),
        job.devices.len(),
        job.schedule.len()
    );

    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_job_file() {
        let path = std::env::temp_dir().join(format!("ld_job_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            targets = ["LD-1", "LD-2"]
            schedule = ["08:30"]

            [[devices]]
            name = "LD-1"
            index = 0

            [[devices]]
            name = "LD-2"
            index = 1
            serial = "127.0.0.1:5557"
            "#,
        )
        .unwrap();

        let job = load_job_file(&path).await.unwrap();
        assert_eq!(job.targets.len(), 2);
        assert_eq!(job.devices[1].serial.as_deref(), Some("127.0.0.1:5557"));
        assert_eq!(job.schedule, vec!["08:30".to_string()]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_missing_job_file_is_error() {
        let path = std::env::temp_dir().join("ld_job_does_not_exist.toml");
        assert!(load_job_file(&path).await.is_err());
    }
}
