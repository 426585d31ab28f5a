// ==========================================
// 试卷组卷系统 - 分数值对象
// ==========================================
// 红线: 分数只通过 Marks 表达,父节点分数 = 子节点汇总
// ==========================================

use crate::domain::part::Part;
use crate::domain::types::MarkSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// 分数（值 + 来源）,不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    pub value: u32,
    pub source: MarkSource,
}

impl Marks {
    pub fn new(value: u32, source: MarkSource) -> Self {
        Self { value, source }
    }

    /// 分数框中直接识别的分数
    pub fn explicit(value: u32) -> Self {
        Self::new(value, MarkSource::Explicit)
    }

    /// 推断得到的分数
    pub fn inferred(value: u32) -> Self {
        Self::new(value, MarkSource::Inferred)
    }

    pub fn zero() -> Self {
        Self::new(0, MarkSource::Inferred)
    }

    /// 子节点分数汇总（空列表为 0）
    pub fn aggregate(children: &[Part]) -> Self {
        let total = children.iter().map(|c| c.marks().value).sum();
        Self::new(total, MarkSource::Aggregate)
    }
}

impl Add for Marks {
    type Output = Marks;

    fn add(self, other: Marks) -> Marks {
        Marks::new(self.value + other.value, MarkSource::Aggregate)
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.source)
    }
}
