// ==========================================
// 试卷组卷系统 - 领域类型定义
// ==========================================
// 闭合枚举,所有分支在引擎中穷举匹配
// 序列化格式: SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分数来源 (Mark Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkSource {
    Explicit,  // 直接读取自分数框 "[N]"
    Inferred,  // 根据上下文推断
    Aggregate, // 子节点汇总
}

impl fmt::Display for MarkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkSource::Explicit => write!(f, "EXPLICIT"),
            MarkSource::Inferred => write!(f, "INFERRED"),
            MarkSource::Aggregate => write!(f, "AGGREGATE"),
        }
    }
}

// ==========================================
// 小题层级 (Part Kind)
// ==========================================
// 层级: Question("1") > Letter("1(a)") > Roman("1(a)(ii)")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartKind {
    Question,
    Letter,
    Roman,
}

impl PartKind {
    /// 树深度（题目=0, 字母=1, 罗马数字=2）
    pub fn depth(self) -> usize {
        match self {
            PartKind::Question => 0,
            PartKind::Letter => 1,
            PartKind::Roman => 2,
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Question => write!(f, "QUESTION"),
            PartKind::Letter => write!(f, "LETTER"),
            PartKind::Roman => write!(f, "ROMAN"),
        }
    }
}

// ==========================================
// 小题取舍模式 (Part Mode)
// ==========================================
// 宽松程度: ALL ⊂ PRUNE ⊂ SKIP
// - ALL:   整题入选,不拆分
// - PRUNE: 只能从末尾截断（保持前缀连续）
// - SKIP:  任意子集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartMode {
    All,
    Prune,
    #[default]
    Skip,
}

impl fmt::Display for PartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartMode::All => write!(f, "ALL"),
            PartMode::Prune => write!(f, "PRUNE"),
            PartMode::Skip => write!(f, "SKIP"),
        }
    }
}
