//! 设备控制能力 - 基础设施层
//!
//! 编排器只通过这个 trait 接触模拟器

use crate::control::RunControl;
use crate::error::DeviceError;
use async_trait::async_trait;

/// 设备控制能力
///
/// 职责：
/// - 启动 / 关闭指定名称的模拟器
/// - 打开应用、执行一次滑动
/// - 不认识批次 / 阶段，不处理流程
///
/// 不同的 id 可以被并发调用；同一个 id 在一次运行内不会被并发调用。
/// 每个方法都可能阻塞数秒。
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// 启动模拟器
    async fn start(&self, id: &str) -> Result<(), DeviceError>;

    /// 关闭模拟器
    async fn stop(&self, id: &str) -> Result<(), DeviceError>;

    /// 确保调试连接可用（可选能力）
    async fn connect(&self, _id: &str) -> Result<(), DeviceError> {
        Ok(())
    }

    /// 打开目标应用
    async fn launch_app(&self, id: &str) -> Result<(), DeviceError>;

    /// 执行一次滑动手势
    ///
    /// `control` 供耗时较长的实现在内部检查停止 / 暂停
    async fn perform_scroll_gesture(
        &self,
        id: &str,
        control: &RunControl,
    ) -> Result<(), DeviceError>;

    /// 整理模拟器窗口（可选能力）
    async fn arrange_windows(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}
