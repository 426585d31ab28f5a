// ==========================================
// 试卷组卷系统 - 引擎层
// ==========================================
// 职责: 选项生成、选题、剪枝、切片编排、分页
// 红线: 引擎只读借用题目,不修改输入;软性条件只告警不报错
// ==========================================

pub mod composer;
pub mod eligibility;
pub mod options;
pub mod orchestrator;
pub mod paginator;
pub mod pruner;
pub mod selector;

// 重导出核心引擎
pub use composer::{compose_slices, SliceComposer};
pub use eligibility::LeafFilter;
pub use options::{generate_options, OptionGenerator, QuestionOption, QuestionOptions};
pub use orchestrator::{AssemblyOrchestrator, AssemblyOutcome, AssemblyReport};
pub use paginator::{paginate, Paginator};
pub use pruner::{prune_selection, prune_to_target, SelectionPruner};
pub use selector::{select_questions, QuestionSelector};
