//! 批量模拟器处理器 - 编排层
//!
//! ## 职责
//!
//! 把一组模拟器分批，每批按固定顺序走完四个阶段，再开始下一批。
//!
//! ## 核心功能
//!
//! 1. **去重分批**：目标先去重，再按批次大小切成连续的块
//! 2. **阶段调度**：启动阶段可顺序或同时，其余阶段每个成员一个并发任务
//! 3. **有界等待**：每个阶段最多等待 `stage_budget`，超时成员被放弃（暂停时间不计入）
//! 4. **失败隔离**：单个成员失败只影响它自己，批次和运行继续
//! 5. **协作停止**：每批、每个阶段、每次顺序启动前检查停止信号
//!
//! ## 设计特点
//!
//! - **一次性**：`run` 消耗自身，不跨运行复用
//! - **向下委托**：单个成员的动作委托给 `MemberFlow`

use crate::control::RunControl;
use crate::error::ConfigError;
use crate::infrastructure::DeviceControl;
use crate::models::plan::RunPlan;
use crate::models::stage::Stage;
use crate::orchestrator::reporter::{EventSink, Reporter, RunEvent};
use crate::workflow::{MemberCtx, MemberFlow, StageOutcome};
use futures::FutureExt;
use std::collections::{BTreeSet, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};
use tracing::{debug, error};

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 去重后的目标数量
    pub targets: usize,
    pub batches_total: usize,
    pub batches_completed: usize,
    /// 成员阶段失败次数
    pub stage_failures: usize,
    /// 成员阶段超时次数
    pub stage_timeouts: usize,
    /// 是否因停止信号提前结束
    pub cancelled: bool,
}

/// 批次内的阶段结果
#[derive(Debug, Default, Clone, Copy)]
struct StageResult {
    failures: usize,
    timeouts: usize,
}

impl StageResult {
    fn merge(&mut self, other: StageResult) {
        self.failures += other.failures;
        self.timeouts += other.timeouts;
    }
}

/// 去重并分批
///
/// 去重后按名称排序，再切成每批 `batch_size` 个（最后一批可以更少）
pub fn partition<I, S>(targets: I, batch_size: usize) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let unique: Vec<String> = targets
        .into_iter()
        .map(Into::into)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    unique
        .chunks(batch_size.max(1))
        .map(<[String]>::to_vec)
        .collect()
}

/// 批量编排器
pub struct BatchOrchestrator {
    batches: Vec<Vec<String>>,
    plan: RunPlan,
    control: Arc<RunControl>,
    flow: Arc<MemberFlow>,
    reporter: Reporter,
}

impl BatchOrchestrator {
    /// 创建编排器
    ///
    /// 参数在这里校验，任何批次开始之前就返回配置错误
    pub fn new<I, S>(
        targets: I,
        plan: RunPlan,
        device: Arc<dyn DeviceControl>,
        control: Arc<RunControl>,
        sink: EventSink,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        plan.validate()?;

        let reporter = Reporter::new(sink);
        let batches = partition(targets, plan.batch_size);
        let flow = Arc::new(MemberFlow::new(
            device,
            control.clone(),
            plan.clone(),
            reporter.clone(),
        ));

        Ok(Self {
            batches,
            plan,
            control,
            flow,
            reporter,
        })
    }

    /// 分批结果
    pub fn batches(&self) -> &[Vec<String>] {
        &self.batches
    }

    /// 运行所有批次
    pub async fn run(self) -> RunSummary {
        let mut summary = RunSummary {
            targets: self.batches.iter().map(Vec::len).sum(),
            batches_total: self.batches.len(),
            ..Default::default()
        };

        if self.batches.is_empty() {
            self.reporter.emit(RunEvent::NothingToDo);
            return summary;
        }

        self.reporter.emit(RunEvent::RunStarted {
            targets: summary.targets,
            batches: summary.batches_total,
        });

        'batches: for (idx, members) in self.batches.iter().enumerate() {
            let batch = idx + 1;

            if self.control.is_cancelled() {
                self.reporter.emit(RunEvent::Cancelled { batch, stage: None });
                summary.cancelled = true;
                break;
            }

            self.reporter.emit(RunEvent::BatchStarted {
                batch,
                total: summary.batches_total,
                members: members.clone(),
            });

            let mut batch_result = StageResult::default();
            for stage in Stage::ALL {
                if self.control.is_cancelled() {
                    self.reporter.emit(RunEvent::Cancelled {
                        batch,
                        stage: Some(stage),
                    });
                    summary.stage_failures += batch_result.failures;
                    summary.stage_timeouts += batch_result.timeouts;
                    summary.cancelled = true;
                    break 'batches;
                }

                self.reporter.emit(RunEvent::StageEntered { batch, stage });

                let stage_result = if stage == Stage::Start && !self.plan.start_simultaneously {
                    self.start_sequentially(batch, members).await
                } else {
                    self.run_members(stage, batch, members).await
                };
                batch_result.merge(stage_result);
            }

            summary.stage_failures += batch_result.failures;
            summary.stage_timeouts += batch_result.timeouts;
            summary.batches_completed += 1;

            self.reporter.emit(RunEvent::BatchCompleted {
                batch,
                failures: batch_result.failures,
                timeouts: batch_result.timeouts,
            });
        }

        self.reporter.emit(RunEvent::RunFinished {
            batches_completed: summary.batches_completed,
            batches_total: summary.batches_total,
        });
        summary
    }

    /// 顺序启动：一次一台，两台之间等待 `inter_start`
    async fn start_sequentially(&self, batch: usize, members: &[String]) -> StageResult {
        let mut result = StageResult::default();

        for (i, id) in members.iter().enumerate() {
            if self.control.is_cancelled() {
                break;
            }
            if i > 0
                && !self
                    .control
                    .sleep(self.plan.delays.inter_start, self.plan.poll_interval)
                    .await
            {
                break;
            }
            result.merge(
                self.run_members(Stage::Start, batch, std::slice::from_ref(id))
                    .await,
            );
        }

        result
    }

    /// 每个成员一个并发任务，等待全部完成或超过阶段上限
    async fn run_members(&self, stage: Stage, batch: usize, members: &[String]) -> StageResult {
        let mut result = StageResult::default();
        let mut pending: HashSet<String> = members.iter().cloned().collect();
        let mut tasks = JoinSet::new();

        for id in members {
            let flow = self.flow.clone();
            let ctx = MemberCtx::new(batch, id.clone());
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(flow.run_stage(stage, &ctx))
                    .catch_unwind()
                    .await;
                (ctx.id, outcome)
            });
        }

        let budget = self.plan.stage_budget(stage);
        let poll = self.plan.poll_interval;
        let mut charged = Duration::ZERO;

        while !tasks.is_empty() {
            let slice_start = Instant::now();

            match timeout(poll, tasks.join_next()).await {
                Ok(Some(Ok((id, outcome)))) => {
                    pending.remove(&id);
                    match outcome {
                        Ok(StageOutcome::Completed) | Ok(StageOutcome::Cancelled) => {}
                        Ok(StageOutcome::Failed(_)) => result.failures += 1,
                        Err(_) => {
                            error!("[{}] ❌ {}任务异常退出", id, stage);
                            self.reporter.emit(RunEvent::MemberFailed {
                                id,
                                stage,
                                error: "任务异常退出".to_string(),
                            });
                            result.failures += 1;
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    // 任务只会在放弃时被中止，这里不应出现
                    error!("{}任务执行失败: {}", stage, e);
                    result.failures += 1;
                }
                Ok(None) => break,
                Err(_) => {}
            }

            if !self.control.is_paused() {
                charged += slice_start.elapsed();
            }

            if charged >= budget && !tasks.is_empty() {
                let mut abandoned: Vec<_> = pending.drain().collect();
                abandoned.sort();
                for id in abandoned {
                    self.reporter.emit(RunEvent::MemberTimedOut { id, stage });
                    result.timeouts += 1;
                }
                tasks.abort_all();
                break;
            }
        }

        debug!(
            "第 {} 批{}阶段结束: 失败 {}, 超时 {}",
            batch, stage, result.failures, result.timeouts
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_dedups_before_batching() {
        let batches = partition(vec!["A", "A", "B"], 2);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_partition_batch_count_is_ceiling() {
        let targets: Vec<String> = (0..7).map(|i| format!("LD-{}", i)).collect();
        let batches = partition(targets, 3);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 3);
        assert_eq!(batches[2].len(), 1);
    }

    #[test]
    fn test_partition_large_batch_size_gives_single_batch() {
        let batches = partition(vec!["C", "B", "A"], 10);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(Vec::<String>::new(), 3).is_empty());
    }
}
