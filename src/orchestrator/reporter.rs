//! 运行事件与日志回调
//!
//! 每个状态变化都生成一个 `RunEvent`，同时写入 tracing 并交给调用方的回调。
//! 回调必须立即返回（只投递，不等待）。

use crate::models::stage::Stage;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 调用方提供的日志回调
pub type EventSink = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// 运行过程中的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// 运行开始
    RunStarted { targets: usize, batches: usize },
    /// 没有任何目标
    NothingToDo,
    /// 批次开始
    BatchStarted {
        batch: usize,
        total: usize,
        members: Vec<String>,
    },
    /// 进入阶段
    StageEntered { batch: usize, stage: Stage },
    /// 成员开始执行阶段
    MemberStarted { id: String, stage: Stage },
    /// 成员完成阶段
    MemberFinished { id: String, stage: Stage },
    /// 成员在阶段中失败
    MemberFailed {
        id: String,
        stage: Stage,
        error: String,
    },
    /// 成员超过等待上限，被放弃
    MemberTimedOut { id: String, stage: Stage },
    /// 成员因停止信号放弃本阶段
    MemberCancelled { id: String, stage: Stage },
    /// 成员进入暂停等待
    MemberPaused { id: String, stage: Stage },
    /// 成员从暂停中恢复
    MemberResumed { id: String, stage: Stage },
    /// 一次滑动完成
    GesturePerformed { id: String, count: u32 },
    /// 批次完成
    BatchCompleted {
        batch: usize,
        failures: usize,
        timeouts: usize,
    },
    /// 收到停止信号，运行提前结束
    Cancelled { batch: usize, stage: Option<Stage> },
    /// 运行结束
    RunFinished { batches_completed: usize, batches_total: usize },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::RunStarted { targets, batches } => {
                write!(f, "共 {} 台模拟器，分 {} 批处理", targets, batches)
            }
            RunEvent::NothingToDo => write!(f, "没有需要处理的模拟器"),
            RunEvent::BatchStarted {
                batch,
                total,
                members,
            } => write!(f, "开始第 {}/{} 批: {:?}", batch, total, members),
            RunEvent::StageEntered { batch, stage } => {
                write!(f, "第 {} 批进入阶段: {}", batch, stage)
            }
            RunEvent::MemberStarted { id, stage } => write!(f, "[{}] 开始{}", id, stage),
            RunEvent::MemberFinished { id, stage } => write!(f, "[{}] {}完成", id, stage),
            RunEvent::MemberFailed { id, stage, error } => {
                write!(f, "[{}] {}失败: {}", id, stage, error)
            }
            RunEvent::MemberTimedOut { id, stage } => {
                write!(f, "[{}] {}超时，已放弃", id, stage)
            }
            RunEvent::MemberCancelled { id, stage } => {
                write!(f, "[{}] 收到停止信号，放弃{}", id, stage)
            }
            RunEvent::MemberPaused { id, stage } => write!(f, "[{}] {}已暂停", id, stage),
            RunEvent::MemberResumed { id, stage } => write!(f, "[{}] {}已恢复", id, stage),
            RunEvent::GesturePerformed { id, count } => {
                write!(f, "[{}] 第 {} 次滑动", id, count)
            }
            RunEvent::BatchCompleted {
                batch,
                failures,
                timeouts,
            } => write!(
                f,
                "第 {} 批完成: 失败 {} 次, 超时 {} 次",
                batch, failures, timeouts
            ),
            RunEvent::Cancelled { batch, stage } => match stage {
                Some(stage) => write!(f, "已停止（第 {} 批，{}阶段之前）", batch, stage),
                None => write!(f, "已停止（第 {} 批之前）", batch),
            },
            RunEvent::RunFinished {
                batches_completed,
                batches_total,
            } => write!(f, "运行结束: 完成 {}/{} 批", batches_completed, batches_total),
        }
    }
}

/// 事件分发器
#[derive(Clone)]
pub struct Reporter {
    sink: EventSink,
}

impl Reporter {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    pub fn emit(&self, event: RunEvent) {
        match &event {
            RunEvent::MemberFailed { .. } | RunEvent::MemberTimedOut { .. } => {
                error!("❌ {}", event)
            }
            RunEvent::Cancelled { .. }
            | RunEvent::MemberCancelled { .. }
            | RunEvent::MemberPaused { .. }
            | RunEvent::NothingToDo => warn!("⚠️ {}", event),
            RunEvent::GesturePerformed { .. } => debug!("{}", event),
            _ => info!("{}", event),
        }
        (self.sink)(&event);
    }
}
