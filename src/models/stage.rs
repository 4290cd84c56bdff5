use std::fmt;

/// 流水线阶段
///
/// 每个批次按固定顺序依次执行这四个阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// 启动模拟器
    Start,
    /// 打开应用
    Activate,
    /// 持续滑动
    Sustain,
    /// 关闭模拟器
    Teardown,
}

impl Stage {
    /// 固定的执行顺序
    pub const ALL: [Stage; 4] = [Stage::Start, Stage::Activate, Stage::Sustain, Stage::Teardown];

    /// 获取中文名称
    pub fn name(self) -> &'static str {
        match self {
            Stage::Start => "启动",
            Stage::Activate => "打开应用",
            Stage::Sustain => "滑动",
            Stage::Teardown => "关闭",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_execution_order() {
        assert!(Stage::ALL.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(Stage::ALL[0], Stage::Start);
        assert_eq!(Stage::ALL[3].to_string(), "关闭");
    }
}
