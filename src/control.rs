//! 运行控制 - 停止 / 暂停信号
//!
//! 调用方在启动前创建 `RunControl`，以 `Arc` 共享给所有任务，
//! 可以在任意线程随时修改。编排器只读取这两个标志，从不强制中断正在执行的操作。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// 暂停闸门的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// 可以继续执行
    Proceed,
    /// 已收到停止信号
    Cancelled,
}

/// 协作式的停止 / 暂停标志
#[derive(Debug, Default)]
pub struct RunControl {
    cancelled: AtomicBool,
    paused: AtomicBool,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止（协作式）
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// 是否允许继续执行（未暂停）
    pub fn may_proceed(&self) -> bool {
        !self.is_paused()
    }

    /// 把两个标志恢复到初始状态
    ///
    /// 由调用方在一次运行结束后调用，编排器自己不会调用
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    /// 暂停闸门
    ///
    /// 暂停期间每隔 `poll` 检查一次，直到恢复或收到停止信号。
    pub async fn wait_while_paused(&self, poll: Duration) -> Gate {
        loop {
            if self.is_cancelled() {
                return Gate::Cancelled;
            }
            if self.may_proceed() {
                return Gate::Proceed;
            }
            sleep(poll).await;
        }
    }

    /// 可被停止信号打断的等待
    ///
    /// # 返回
    /// 完整等待返回 `true`，被停止信号打断返回 `false`
    pub async fn sleep(&self, duration: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            sleep((deadline - now).min(poll)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const POLL: Duration = Duration::from_millis(500);

    #[test]
    fn test_flags_default_to_running() {
        let control = RunControl::new();
        assert!(!control.is_cancelled());
        assert!(control.may_proceed());
    }

    #[test]
    fn test_reset_clears_both_flags() {
        let control = RunControl::new();
        control.cancel();
        control.pause();
        control.reset();
        assert!(!control.is_cancelled());
        assert!(!control.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_waits_until_resumed() {
        let control = Arc::new(RunControl::new());
        control.pause();

        let resumer = control.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(3)).await;
            resumer.resume();
        });

        let started = Instant::now();
        assert_eq!(control.wait_while_paused(POLL).await, Gate::Proceed);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_returns_cancelled_while_paused() {
        let control = Arc::new(RunControl::new());
        control.pause();

        let stopper = control.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(2)).await;
            stopper.cancel();
        });

        assert_eq!(control.wait_while_paused(POLL).await, Gate::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_cancel() {
        let control = RunControl::new();
        let started = Instant::now();
        assert!(control.sleep(Duration::from_secs(5), POLL).await);
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_cut_short_by_cancel() {
        let control = Arc::new(RunControl::new());
        let stopper = control.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            stopper.cancel();
        });

        let started = Instant::now();
        assert!(!control.sleep(Duration::from_secs(60), POLL).await);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
