use crate::config::Config;
use crate::control::RunControl;
use crate::infrastructure::{CommandDevice, DeviceControl};
use crate::models::{load_job_file, JobFile, RunPlan, RunSettings};
use crate::orchestrator::{BatchOrchestrator, RunSummary, Scheduler};
use crate::services::LogWriter;
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    settings: RunSettings,
    plan: RunPlan,
    targets: Vec<String>,
    scheduler: Scheduler,
    device: Arc<dyn DeviceControl>,
}

impl App {
    /// 初始化应用
    ///
    /// 配置错误（批次大小、定时格式）在这里直接返回，不会启动任何模拟器
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        let settings = RunSettings::load_or_default(Path::new(&config.settings_path)).await;
        let plan = settings.to_plan(&config);
        plan.validate().context("运行参数无效")?;

        let job = load_job_file(Path::new(&config.job_file)).await?;
        let scheduler = Scheduler::from_times(&job.schedule).context("定时配置无效")?;
        let targets = select_targets(&job);

        log_startup(plan.batch_size, targets.len());

        let device: Arc<dyn DeviceControl> = Arc::new(CommandDevice::from_job(&job));

        Ok(Self {
            config,
            settings,
            plan,
            targets,
            scheduler,
            device,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        let control = Arc::new(RunControl::new());
        spawn_ctrl_c(control.clone());
        spawn_console_commands(control.clone());

        let writer = LogWriter::spawn(self.config.output_log_file.clone());
        writer.write(&format!("开始自动化: {}", self.targets.join(", ")));
        writer.write(&format!(
            "滑动时长: {} 分钟",
            self.settings.scroll_duration
        ));

        if self.scheduler.is_empty() {
            let summary = self.run_once(control.clone(), &writer).await;
            print_final_stats(&summary, &self.config.output_log_file);
        } else {
            let this = &self;
            let writer_ref = &writer;
            let run_control = control.clone();
            self.scheduler
                .run(&control, self.plan.poll_interval, move || {
                    let run_control = run_control.clone();
                    async move {
                        let summary = this.run_once(run_control.clone(), writer_ref).await;
                        print_final_stats(&summary, &this.config.output_log_file);
                        // 下一次触发前恢复暂停标志；停止标志保留，用来结束调度
                        run_control.resume();
                    }
                })
                .await;
        }

        if let Err(e) = self
            .settings
            .save(Path::new(&self.config.settings_path))
            .await
        {
            warn!("⚠️ 保存运行参数失败: {}", e);
        }

        writer.write("自动化结束");
        writer.finish().await;
        control.reset();
        Ok(())
    }

    /// 运行一次完整的批量任务
    async fn run_once(&self, control: Arc<RunControl>, writer: &LogWriter) -> RunSummary {
        let orchestrator = match BatchOrchestrator::new(
            self.targets.clone(),
            self.plan.clone(),
            self.device.clone(),
            control,
            writer.sink(),
        ) {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                error!("❌ 运行参数无效: {}", e);
                writer.write(&format!("错误: {}", e));
                return RunSummary::default();
            }
        };

        // 在单独的任务中运行，内部异常不会越过这里
        match tokio::spawn(orchestrator.run()).await {
            Ok(summary) => summary,
            Err(e) => {
                error!("❌ 运行异常结束: {}", e);
                writer.write(&format!("错误: {}", e));
                RunSummary::default()
            }
        }
    }
}

/// 只保留清单中存在的模拟器
fn select_targets(job: &JobFile) -> Vec<String> {
    let known: HashSet<&str> = job.devices.iter().map(|d| d.name.as_str()).collect();
    let mut targets = Vec::new();
    for name in &job.targets {
        if known.contains(name.as_str()) {
            targets.push(name.clone());
        } else {
            warn!("⚠️ 模拟器 {} 不在清单中，已跳过", name);
        }
    }
    if targets.is_empty() {
        warn!("⚠️ 没有选择任何可用的模拟器");
    }
    targets
}

/// Ctrl-C 请求停止
fn spawn_ctrl_c(control: Arc<RunControl>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到 Ctrl-C，正在停止...");
            control.cancel();
        }
    });
}

/// 控制台命令：pause / resume / stop
///
/// 使用独立线程读取标准输入，不占用运行时
fn spawn_console_commands(control: Arc<RunControl>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "p" | "pause" => {
                    control.pause();
                    info!("⏸️ 已暂停");
                }
                "r" | "resume" => {
                    control.resume();
                    info!("▶️ 已恢复");
                }
                "s" | "stop" | "q" | "quit" => {
                    control.cancel();
                    warn!("正在停止...");
                    break;
                }
                "" => {}
                other => warn!("未知命令: {}（可用: pause / resume / stop）", other),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceEntry;

    #[test]
    fn test_select_targets_skips_unknown() {
        let job = JobFile {
            targets: vec!["LD-1".to_string(), "LD-9".to_string()],
            devices: vec![DeviceEntry {
                name: "LD-1".to_string(),
                index: 0,
                serial: None,
            }],
            ..Default::default()
        };
        assert_eq!(select_targets(&job), vec!["LD-1".to_string()]);
    }
}
