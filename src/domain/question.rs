// ==========================================
// 试卷组卷系统 - 题目领域模型
// ==========================================
// 红线: total_marks / leaf_parts 始终由树遍历得到,不存储
// 红线: 核心引擎只读借用 Question,从不修改
// ==========================================

use crate::domain::part::Part;
use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 已抽取的完整题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    id: String,
    exam_code: String,
    year: u16,
    paper: u8,
    variant: u8,
    topic: String,
    question_node: Part,
    composite_path: PathBuf,
    regions_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    mark_scheme_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "String::is_empty")]
    root_text: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    child_text: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct QuestionRecord {
    id: String,
    exam_code: String,
    year: u16,
    paper: u8,
    variant: u8,
    topic: String,
    question_node: Part,
    #[serde(default)]
    composite_path: PathBuf,
    #[serde(default)]
    regions_path: PathBuf,
    #[serde(default)]
    mark_scheme_path: Option<PathBuf>,
    #[serde(default)]
    root_text: String,
    #[serde(default)]
    child_text: BTreeMap<String, String>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = AssemblyError;

    fn try_from(r: QuestionRecord) -> AssemblyResult<Self> {
        let mut q = Question::new(r.id, r.exam_code, r.year, r.paper, r.variant, r.topic, r.question_node)?
            .with_assets(r.composite_path, r.regions_path)
            .with_text(r.root_text, r.child_text);
        q.mark_scheme_path = r.mark_scheme_path;
        Ok(q)
    }
}

fn invalid(field: &str, message: String) -> AssemblyError {
    AssemblyError::InvalidQuestion {
        field: field.to_string(),
        message,
    }
}

impl Question {
    /// 创建题目
    ///
    /// # 校验
    /// - exam_code: 4 位数字
    /// - year: 2000..=2100
    /// - paper / variant: 1..=9
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        exam_code: impl Into<String>,
        year: u16,
        paper: u8,
        variant: u8,
        topic: impl Into<String>,
        question_node: Part,
    ) -> AssemblyResult<Self> {
        let id = id.into();
        let exam_code = exam_code.into();

        if id.trim().is_empty() {
            return Err(invalid("id", "题目 ID 不能为空".to_string()));
        }
        if exam_code.len() != 4 || !exam_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("exam_code", format!("必须为 4 位数字: {:?}", exam_code)));
        }
        if !(2000..=2100).contains(&year) {
            return Err(invalid("year", format!("必须在 2000-2100 之间: {}", year)));
        }
        if !(1..=9).contains(&paper) {
            return Err(invalid("paper", format!("必须在 1-9 之间: {}", paper)));
        }
        if !(1..=9).contains(&variant) {
            return Err(invalid("variant", format!("必须在 1-9 之间: {}", variant)));
        }

        Ok(Self {
            id,
            exam_code,
            year,
            paper,
            variant,
            topic: topic.into(),
            question_node,
            composite_path: PathBuf::new(),
            regions_path: PathBuf::new(),
            mark_scheme_path: None,
            root_text: String::new(),
            child_text: BTreeMap::new(),
        })
    }

    /// 外部资源引用（合成图 / 区域描述）
    pub fn with_assets(mut self, composite_path: impl Into<PathBuf>, regions_path: impl Into<PathBuf>) -> Self {
        self.composite_path = composite_path.into();
        self.regions_path = regions_path.into();
        self
    }

    pub fn with_mark_scheme(mut self, path: impl Into<PathBuf>) -> Self {
        self.mark_scheme_path = Some(path.into());
        self
    }

    /// 关键词检索用文本（题干 + 各小题）
    pub fn with_text(mut self, root_text: impl Into<String>, child_text: BTreeMap<String, String>) -> Self {
        self.root_text = root_text.into();
        self.child_text = child_text;
        self
    }

    // ==========================================
    // 属性
    // ==========================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exam_code(&self) -> &str {
        &self.exam_code
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn paper(&self) -> u8 {
        self.paper
    }

    pub fn variant(&self) -> u8 {
        self.variant
    }

    /// 题目默认知识点
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn question_node(&self) -> &Part {
        &self.question_node
    }

    pub fn composite_path(&self) -> &Path {
        &self.composite_path
    }

    pub fn regions_path(&self) -> &Path {
        &self.regions_path
    }

    pub fn mark_scheme_path(&self) -> Option<&Path> {
        self.mark_scheme_path.as_deref()
    }

    pub fn root_text(&self) -> &str {
        &self.root_text
    }

    pub fn child_text(&self) -> &BTreeMap<String, String> {
        &self.child_text
    }

    // ==========================================
    // 派生属性（每次计算）
    // ==========================================

    pub fn total_marks(&self) -> u32 {
        self.question_node.total_marks()
    }

    /// 叶子小题（文档顺序）
    pub fn leaf_parts(&self) -> Vec<&Part> {
        self.question_node.leaves()
    }

    pub fn leaf_labels(&self) -> Vec<&str> {
        self.leaf_parts().into_iter().map(Part::label).collect()
    }

    pub fn all_parts(&self) -> Vec<&Part> {
        self.question_node.descendants()
    }

    pub fn find_part(&self, label: &str) -> Option<&Part> {
        self.question_node.find(label)
    }

    pub fn is_leaf_label(&self, label: &str) -> bool {
        self.find_part(label).map(Part::is_leaf).unwrap_or(false)
    }

    /// 某节点下全部叶子标签（节点本身为叶子时返回自身）
    pub fn leaves_under(&self, label: &str) -> Vec<&str> {
        self.find_part(label)
            .map(|p| p.leaves().into_iter().map(Part::label).collect())
            .unwrap_or_default()
    }

    /// 解析节点的有效知识点
    ///
    /// 自节点向上查找最近声明了 topic 的祖先,都没有时使用题目默认知识点。
    /// 标签不存在时返回 None。
    pub fn resolve_topic(&self, label: &str) -> Option<&str> {
        let path = self.question_node.path_to(label)?;
        let declared = path.iter().rev().find_map(|p| p.topic());
        Some(declared.unwrap_or(self.topic.as_str()))
    }

    /// 渲染叶子所需的上下文节点（带 context_bounds 的祖先,从根到父）
    pub fn context_parts_for(&self, leaf_label: &str) -> Vec<&Part> {
        match self.question_node.path_to(leaf_label) {
            Some(mut path) => {
                path.pop();
                path.into_iter()
                    .filter(|p| p.context_bounds().is_some())
                    .collect()
            }
            None => Vec::new(),
        }
    }
}
