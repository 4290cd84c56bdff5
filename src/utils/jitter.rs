//! 随机抖动
//!
//! 让滑动间隔不那么规律

use std::time::Duration;

/// 在 `base ± jitter` 范围内取一个随机时长
pub fn jittered(base: Duration, jitter: Duration) -> Duration {
    let jitter_ms = jitter.as_millis().min(u32::MAX as u128 / 2) as u32;
    if jitter_ms == 0 {
        return base;
    }
    let offset = random_u32() % (jitter_ms * 2 + 1);
    (base + Duration::from_millis(offset as u64)).saturating_sub(jitter)
}

/// 简单的 xorshift 伪随机数，只用于抖动，不具备密码学强度
fn random_u32() -> u32 {
    use std::cell::Cell;
    use std::time::SystemTime;

    thread_local! {
        static STATE: Cell<u32> = Cell::new(
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u32 | 1)
                .unwrap_or(12345)
        );
    }

    STATE.with(|state| {
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state.set(x);
        x
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_stays_in_range() {
        let base = Duration::from_millis(2000);
        let jitter = Duration::from_millis(500);
        for _ in 0..200 {
            let d = jittered(base, jitter);
            assert!(d >= Duration::from_millis(1500), "{:?}", d);
            assert!(d <= Duration::from_millis(2500), "{:?}", d);
        }
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let base = Duration::from_millis(750);
        assert_eq!(jittered(base, Duration::ZERO), base);
    }

    #[test]
    fn test_jitter_larger_than_base_saturates() {
        let d = jittered(Duration::from_millis(100), Duration::from_millis(400));
        assert!(d <= Duration::from_millis(500));
    }
}
