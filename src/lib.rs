//! # LD Batch Runner
//!
//! 批量驱动安卓模拟器：启动 → 打开应用 → 滑动 → 关闭，支持暂停 / 停止和每日定时
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露设备控制能力
//! - `DeviceControl` - 启动 / 关闭 / 打开应用 / 滑动
//! - `CommandDevice` - 基于外部命令模板的实现
//!
//! ### ② 运行控制（Control）
//! - `control` - 调用方持有的停止 / 暂停标志（`RunControl`）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一台模拟器"在一个阶段里的完整动作
//! - `MemberCtx` - 上下文封装（批次编号 + 模拟器名称）
//! - `MemberFlow` - 暂停闸门 → 设备动作 → 等待
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批、阶段调度、并发与超时
//! - `orchestrator/reporter` - 运行事件与日志回调
//! - `orchestrator/scheduler` - 每日定时
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use control::{Gate, RunControl};
pub use error::{AppError, AppResult, ConfigError, DeviceError};
pub use infrastructure::{CommandDevice, DeviceControl};
pub use models::{RunPlan, RunSettings, Stage, StageDelays, SustainPolicy};
pub use orchestrator::{BatchOrchestrator, EventSink, RunEvent, RunSummary, Scheduler};
pub use workflow::{MemberCtx, MemberFlow, StageOutcome};
