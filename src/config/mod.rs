// ==========================================
// 试卷组卷系统 - 配置层
// ==========================================
// 职责: 选题配置、排版配置、组卷方案文件
// 红线: 配置对象构造后不可变,校验失败立即报错
// ==========================================

pub mod layout_config;
pub mod profile;
pub mod selection_config;

// 重导出核心配置
pub use layout_config::{LayoutConfig, LayoutConfigBuilder};
pub use profile::AssemblyProfile;
pub use selection_config::{SelectionConfig, SelectionConfigBuilder};
