//! 成员处理流程 - 流程层
//!
//! 核心职责：定义"一台模拟器"在某个阶段里做什么
//!
//! 每个阶段都先经过暂停闸门：
//! 1. 启动 → 整理窗口 → 等待开机
//! 2. 打开应用 → 等待加载
//! 3. 在截止时间前反复滑动（每次滑动前再次检查暂停 / 停止）
//! 4. 等待 → 关闭

use crate::control::{Gate, RunControl};
use crate::error::DeviceError;
use crate::infrastructure::DeviceControl;
use crate::models::plan::RunPlan;
use crate::models::stage::Stage;
use crate::orchestrator::reporter::{Reporter, RunEvent};
use crate::utils::jitter::jittered;
use crate::workflow::member_ctx::MemberCtx;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 单个成员在一个阶段的结果
#[derive(Debug)]
pub enum StageOutcome {
    /// 正常完成
    Completed,
    /// 设备操作失败
    Failed(DeviceError),
    /// 收到停止信号，未执行（或未执行完）本阶段
    Cancelled,
}

/// 成员处理流程
///
/// - 只处理单台模拟器的单个阶段
/// - 捕获设备错误，不向上传播
/// - 不关心批次和阶段顺序
pub struct MemberFlow {
    device: Arc<dyn DeviceControl>,
    control: Arc<RunControl>,
    plan: RunPlan,
    reporter: Reporter,
}

impl MemberFlow {
    pub fn new(
        device: Arc<dyn DeviceControl>,
        control: Arc<RunControl>,
        plan: RunPlan,
        reporter: Reporter,
    ) -> Self {
        Self {
            device,
            control,
            plan,
            reporter,
        }
    }

    /// 执行一个阶段
    pub async fn run_stage(&self, stage: Stage, ctx: &MemberCtx) -> StageOutcome {
        if self.gate(stage, ctx).await == Gate::Cancelled {
            self.reporter.emit(RunEvent::MemberCancelled {
                id: ctx.id.clone(),
                stage,
            });
            return StageOutcome::Cancelled;
        }

        self.reporter.emit(RunEvent::MemberStarted {
            id: ctx.id.clone(),
            stage,
        });

        let result = match stage {
            Stage::Start => self.start(ctx).await,
            Stage::Activate => self.activate(ctx).await,
            Stage::Sustain => self.sustain(ctx).await,
            Stage::Teardown => self.teardown(ctx).await,
        };

        match result {
            Ok(StageOutcome::Completed) => {
                self.reporter.emit(RunEvent::MemberFinished {
                    id: ctx.id.clone(),
                    stage,
                });
                StageOutcome::Completed
            }
            Ok(StageOutcome::Cancelled) => {
                self.reporter.emit(RunEvent::MemberCancelled {
                    id: ctx.id.clone(),
                    stage,
                });
                StageOutcome::Cancelled
            }
            Ok(StageOutcome::Failed(e)) | Err(e) => {
                self.reporter.emit(RunEvent::MemberFailed {
                    id: ctx.id.clone(),
                    stage,
                    error: e.to_string(),
                });
                StageOutcome::Failed(e)
            }
        }
    }

    /// 暂停闸门，暂停 / 恢复各报告一次
    async fn gate(&self, stage: Stage, ctx: &MemberCtx) -> Gate {
        if self.control.is_cancelled() {
            return Gate::Cancelled;
        }
        if self.control.may_proceed() {
            return Gate::Proceed;
        }

        self.reporter.emit(RunEvent::MemberPaused {
            id: ctx.id.clone(),
            stage,
        });
        let gate = self
            .control
            .wait_while_paused(self.plan.poll_interval)
            .await;
        if gate == Gate::Proceed {
            self.reporter.emit(RunEvent::MemberResumed {
                id: ctx.id.clone(),
                stage,
            });
        }
        gate
    }

    async fn start(&self, ctx: &MemberCtx) -> Result<StageOutcome, DeviceError> {
        self.device.start(&ctx.id).await?;

        if let Err(e) = self.device.arrange_windows().await {
            warn!("{} ⚠️ 整理窗口失败: {}", ctx, e);
        }

        // 等待开机（被停止信号打断也算已完成启动）
        self.control
            .sleep(self.plan.delays.after_start, self.plan.poll_interval)
            .await;
        Ok(StageOutcome::Completed)
    }

    async fn activate(&self, ctx: &MemberCtx) -> Result<StageOutcome, DeviceError> {
        self.device.launch_app(&ctx.id).await?;
        self.control
            .sleep(self.plan.delays.after_activate, self.plan.poll_interval)
            .await;
        Ok(StageOutcome::Completed)
    }

    /// 在截止时间前反复滑动
    ///
    /// 截止时间在进入时确定，暂停不会延长它
    async fn sustain(&self, ctx: &MemberCtx) -> Result<StageOutcome, DeviceError> {
        let deadline = Instant::now() + self.plan.sustain_duration;
        let policy = self.plan.sustain;
        let mut count = 0u32;

        while Instant::now() < deadline {
            if self.gate(Stage::Sustain, ctx).await == Gate::Cancelled {
                return Ok(StageOutcome::Cancelled);
            }
            // 暂停可能已经用完了剩余时间
            if Instant::now() >= deadline {
                break;
            }
            if count == 0 {
                if let Err(e) = self.device.connect(&ctx.id).await {
                    warn!("{} ⚠️ adb 连接失败: {}", ctx, e);
                }
            }

            self.device
                .perform_scroll_gesture(&ctx.id, &self.control)
                .await?;
            count += 1;
            self.reporter.emit(RunEvent::GesturePerformed {
                id: ctx.id.clone(),
                count,
            });

            let remaining = deadline.saturating_duration_since(Instant::now());
            let pause = jittered(policy.gesture_interval, policy.gesture_jitter).min(remaining);
            if !self.control.sleep(pause, self.plan.poll_interval).await {
                return Ok(StageOutcome::Cancelled);
            }
        }

        debug!("{} 滑动结束，共 {} 次", ctx, count);
        Ok(StageOutcome::Completed)
    }

    async fn teardown(&self, ctx: &MemberCtx) -> Result<StageOutcome, DeviceError> {
        // 等待被停止信号打断时仍然关闭模拟器
        if !self
            .control
            .sleep(self.plan.delays.after_sustain, self.plan.poll_interval)
            .await
        {
            debug!("{} 关闭前等待被打断，立即关闭", ctx);
        }
        self.device.stop(&ctx.id).await?;
        Ok(StageOutcome::Completed)
    }
}
