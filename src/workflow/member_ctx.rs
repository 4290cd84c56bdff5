//! 成员处理上下文
//!
//! 封装"我正在处理第几批的哪台模拟器"这一信息

use std::fmt::Display;

/// 成员处理上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCtx {
    /// 批次编号（从1开始，仅用于日志显示）
    pub batch_index: usize,

    /// 模拟器名称
    pub id: String,
}

impl MemberCtx {
    /// 创建新的成员上下文
    pub fn new(batch_index: usize, id: impl Into<String>) -> Self {
        Self {
            batch_index,
            id: id.into(),
        }
    }
}

impl Display for MemberCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 #{} 模拟器 {}]", self.batch_index, self.id)
    }
}
