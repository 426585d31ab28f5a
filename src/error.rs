// ==========================================
// 试卷组卷系统 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 配置错误 / 结构错误 / 基础设施错误
// 红线: 软性条件（未达容差、置顶超分）不是错误,以警告形式附在结果上
// ==========================================

use thiserror::Error;

/// 组卷系统错误类型
#[derive(Error, Debug)]
pub enum AssemblyError {
    // ===== 配置错误 =====
    #[error("目标分数必须为正数: target_marks={0}")]
    InvalidTargetMarks(i64),

    #[error("容差不能为负数: tolerance={0}")]
    NegativeTolerance(i64),

    #[error("数值超出范围: {field}={value}")]
    ValueOutOfRange { field: &'static str, value: i64 },

    #[error("题目数量范围无效: min_questions={min} > max_questions={max}")]
    InvalidQuestionRange { min: usize, max: usize },

    #[error("最少保留小题数必须 >= 1: min_parts={0}")]
    InvalidMinParts(usize),

    #[error("页面尺寸无效: width={width}, height={height}")]
    InvalidPageSize { width: u32, height: u32 },

    #[error("页边距超出页面{axis}")]
    MarginsExceedPage { axis: &'static str },

    // ===== 结构错误 =====
    #[error("小题标签不是题目的叶子节点: question_id={question_id}, label={label}")]
    UnknownLeafLabel { question_id: String, label: String },

    #[error("分数与子节点汇总不一致: label={label}, declared={declared}, aggregate={aggregate}")]
    MarksMismatch {
        label: String,
        declared: u32,
        aggregate: u32,
    },

    #[error("区域边界无效: {0}")]
    InvalidBounds(String),

    #[error("子节点未按位置排序或存在重叠: parent={parent}")]
    ChildrenOutOfOrder { parent: String },

    #[error("题目字段无效 (field={field}): {message}")]
    InvalidQuestion { field: String, message: String },

    #[error("选题结果包含重复题目: question_id={0}")]
    DuplicateQuestion(String),

    #[error("关键词无效: {0}")]
    InvalidKeyword(String),

    // ===== 基础设施错误 =====
    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type AssemblyResult<T> = Result<T, AssemblyError>;
