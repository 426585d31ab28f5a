// ==========================================
// 试卷组卷系统 - 核心库
// ==========================================
// 职责: 从已抽取题库中选题并排版成固定尺寸页面
// 技术栈: Rust + serde + tracing
// 系统定位: 选题与排版引擎（文档解析、图片裁剪、PDF 输出由外部组件完成）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 题目树与结果实体
pub mod domain;

// 引擎层 - 选项生成、选题、剪枝、编排、分页
pub mod engine;

// 配置层 - 选题与排版配置
pub mod config;

// 关键词层 - 文本检索
pub mod keyword;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MarkSource, PartKind, PartMode};

// 领域实体
pub use domain::{
    LayoutResult, LayoutWarning, Marks, PagePlan, Part, Question, SelectionPlan, SelectionResult,
    SelectionStats, SelectionSummary, SelectionWarning, SliceAsset, SliceBounds, SlicePlacement,
};

// 配置
pub use config::{AssemblyProfile, LayoutConfig, SelectionConfig};

// 引擎
pub use engine::{
    compose_slices, generate_options, paginate, prune_selection, prune_to_target,
    select_questions, AssemblyOrchestrator, AssemblyOutcome, AssemblyReport, OptionGenerator,
    Paginator, QuestionOptions, QuestionSelector, SelectionPruner, SliceComposer,
};

// 关键词
pub use keyword::{KeywordIndex, KeywordSearchResult};

// 错误
pub use error::{AssemblyError, AssemblyResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "试卷组卷系统";
