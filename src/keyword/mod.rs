// ==========================================
// 试卷组卷系统 - 关键词层
// ==========================================
// 职责: 从题目文本产出关键词命中标签,供关键词模式选题使用
// ==========================================

pub mod index;

pub use index::{normalize, KeywordIndex, KeywordSearchResult, KeywordTerm};
