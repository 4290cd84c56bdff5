//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分批和阶段调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量编排器
//! - 去重分批（Vec<Vec<String>>）
//! - 按固定顺序驱动四个阶段
//! - 控制并发与阶段等待上限（JoinSet）
//! - 输出运行统计
//!
//! ### `reporter` - 运行事件
//! - 所有状态变化的事件类型
//! - 同时写 tracing 和调用方回调
//!
//! ### `scheduler` - 定时调度
//! - 调用方持有的每日定时表
//!
//! ## 层次关系
//!
//! ```text
//! scheduler (什么时候运行)
//!     ↓
//! batch_processor (处理 Vec<批次>)
//!     ↓
//! workflow::MemberFlow (处理单台模拟器的单个阶段)
//!     ↓
//! infrastructure (设备控制能力：DeviceControl)
//! ```

pub mod batch_processor;
pub mod reporter;
pub mod scheduler;

// 重新导出主要类型
pub use batch_processor::{partition, BatchOrchestrator, RunSummary};
pub use reporter::{EventSink, Reporter, RunEvent};
pub use scheduler::Scheduler;
