// ==========================================
// 试卷组卷系统 - 领域模型层
// ==========================================
// 职责: 定义题目树、选题结果、排版结果等实体
// 红线: 不含引擎逻辑,实体构造后不可变
// ==========================================

pub mod bounds;
pub mod layout;
pub mod marks;
pub mod part;
pub mod question;
pub mod selection;
pub mod types;

// 重导出核心类型
pub use bounds::SliceBounds;
pub use layout::{LayoutResult, LayoutWarning, PagePlan, SliceAsset, SlicePlacement};
pub use marks::Marks;
pub use part::Part;
pub use question::Question;
pub use selection::{
    PlanSummary, SelectionPlan, SelectionResult, SelectionStats, SelectionSummary,
    SelectionWarning,
};
pub use types::{MarkSource, PartKind, PartMode};
