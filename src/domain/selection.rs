// ==========================================
// 试卷组卷系统 - 选题结果领域模型
// ==========================================
// 红线: SelectionPlan 只能引用题目的叶子标签
// 红线: 选题结果中同一题目最多出现一次
// 红线: 分数类属性全部现算,不存储
// ==========================================

use crate::domain::part::Part;
use crate::domain::question::Question;
use crate::error::{AssemblyError, AssemblyResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// SelectionPlan - 单题选取方案
// ==========================================

/// 某道题目选入的叶子小题集合（只读借用题目）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan<'q> {
    question: &'q Question,
    included_parts: BTreeSet<String>,
}

impl<'q> SelectionPlan<'q> {
    /// 创建选取方案
    ///
    /// # 错误
    /// 任一标签不是该题的叶子标签时返回 `UnknownLeafLabel`
    pub fn new<I, S>(question: &'q Question, labels: I) -> AssemblyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let leaf_labels: BTreeSet<&str> = question.leaf_labels().into_iter().collect();
        let mut included_parts = BTreeSet::new();
        for label in labels {
            let label = label.into();
            if !leaf_labels.contains(label.as_str()) {
                return Err(AssemblyError::UnknownLeafLabel {
                    question_id: question.id().to_string(),
                    label,
                });
            }
            included_parts.insert(label);
        }
        Ok(Self {
            question,
            included_parts,
        })
    }

    /// 整题方案（全部叶子）
    pub fn full_question(question: &'q Question) -> Self {
        Self {
            question,
            included_parts: question.leaf_labels().into_iter().map(str::to_string).collect(),
        }
    }

    /// 内部构造：调用方保证标签均为叶子
    pub(crate) fn from_leaves(question: &'q Question, leaves: &[&Part]) -> Self {
        Self {
            question,
            included_parts: leaves.iter().map(|p| p.label().to_string()).collect(),
        }
    }

    pub fn question(&self) -> &'q Question {
        self.question
    }

    pub fn question_id(&self) -> &'q str {
        self.question.id()
    }

    pub fn included_parts(&self) -> &BTreeSet<String> {
        &self.included_parts
    }

    pub fn contains(&self, label: &str) -> bool {
        self.included_parts.contains(label)
    }

    /// 选入的叶子（文档顺序）
    pub fn included_leaves(&self) -> Vec<&'q Part> {
        self.question
            .leaf_parts()
            .into_iter()
            .filter(|p| self.included_parts.contains(p.label()))
            .collect()
    }

    /// 未选入的叶子（文档顺序）
    pub fn excluded_leaves(&self) -> Vec<&'q Part> {
        self.question
            .leaf_parts()
            .into_iter()
            .filter(|p| !self.included_parts.contains(p.label()))
            .collect()
    }

    /// 选入叶子的分数之和
    pub fn marks(&self) -> u32 {
        self.included_leaves().iter().map(|p| p.marks().value).sum()
    }

    pub fn part_count(&self) -> usize {
        self.included_parts.len()
    }

    pub fn is_full_question(&self) -> bool {
        self.included_parts.len() == self.question.leaf_parts().len()
    }

    pub fn is_partial(&self) -> bool {
        !self.is_full_question()
    }

    /// 去掉一个叶子后的新方案（原方案不变）
    pub fn without(&self, label: &str) -> Self {
        let mut included_parts = self.included_parts.clone();
        included_parts.remove(label);
        Self {
            question: self.question,
            included_parts,
        }
    }

    /// 选入叶子的有效知识点
    pub fn topics(&self) -> BTreeSet<&'q str> {
        self.included_leaves()
            .iter()
            .filter_map(|leaf| self.question.resolve_topic(leaf.label()))
            .collect()
    }
}

impl fmt::Display for SelectionPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} marks={} parts={}/{}",
            self.question.id(),
            self.marks(),
            self.included_parts.len(),
            self.question.leaf_parts().len()
        )
    }
}

// ==========================================
// SelectionWarning - 软性条件
// ==========================================

/// 不中断流程的告警,附在结果上交由调用方决策
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionWarning {
    /// 置顶题目总分超过目标
    PinOvershoot {
        pinned_marks: u32,
        target_marks: u32,
        overshoot: u32,
    },
    /// 置顶题目不在题库中或没有可选方案
    PinnedQuestionMissing { question_id: String },
    /// 可用题目不足 min_questions
    MinQuestionsUnmet { selected: usize, min_questions: usize },
    /// 最终总分不在容差内
    OutOfTolerance {
        total_marks: u32,
        target_marks: u32,
        tolerance: u32,
    },
    /// 选入了未请求的知识点
    TopicMismatch { topics: Vec<String> },
    /// 强制覆盖知识点失败
    MissingTopics { topics: Vec<String> },
}

impl fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionWarning::PinOvershoot {
                pinned_marks,
                target_marks,
                overshoot,
            } => write!(
                f,
                "置顶题目共 {} 分,超出目标 {} 分 {} 分",
                pinned_marks, target_marks, overshoot
            ),
            SelectionWarning::PinnedQuestionMissing { question_id } => {
                write!(f, "置顶题目不可用: {}", question_id)
            }
            SelectionWarning::MinQuestionsUnmet {
                selected,
                min_questions,
            } => write!(f, "仅选出 {} 道题,少于最少题数 {}", selected, min_questions),
            SelectionWarning::OutOfTolerance {
                total_marks,
                target_marks,
                tolerance,
            } => write!(
                f,
                "总分 {} 不在目标 {}±{} 范围内",
                total_marks, target_marks, tolerance
            ),
            SelectionWarning::TopicMismatch { topics } => {
                write!(f, "选入了未请求的知识点: {}", topics.join(", "))
            }
            SelectionWarning::MissingTopics { topics } => {
                write!(f, "未能覆盖的知识点: {}", topics.join(", "))
            }
        }
    }
}

// ==========================================
// SelectionStats - 分数来源统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    pub pinned_marks: u32,  // 置顶题目分数
    pub keyword_marks: u32, // 关键词命中补入分数
    pub keyword_parts: usize,
    pub fill_marks: u32,    // 贪心填充分数（剪枝前）
    pub attempts: u32,      // 选题轮次（强制覆盖知识点时可能 > 1）
}

// ==========================================
// SelectionResult - 选题结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult<'q> {
    plans: Vec<SelectionPlan<'q>>,
    target_marks: u32,
    tolerance: u32,
    warnings: Vec<SelectionWarning>,
    stats: SelectionStats,
}

impl<'q> SelectionResult<'q> {
    /// 创建选题结果（校验无重复题目）
    pub fn new(plans: Vec<SelectionPlan<'q>>, target_marks: u32, tolerance: u32) -> AssemblyResult<Self> {
        let mut seen = BTreeSet::new();
        for plan in &plans {
            if !seen.insert(plan.question_id()) {
                return Err(AssemblyError::DuplicateQuestion(plan.question_id().to_string()));
            }
        }
        Ok(Self {
            plans,
            target_marks,
            tolerance,
            warnings: Vec::new(),
            stats: SelectionStats::default(),
        })
    }

    /// 空结果（题库为空或全部不合格）
    pub fn empty(target_marks: u32, tolerance: u32) -> Self {
        Self {
            plans: Vec::new(),
            target_marks,
            tolerance,
            warnings: Vec::new(),
            stats: SelectionStats::default(),
        }
    }

    /// 选题引擎内部组装（引擎保证题目不重复）
    pub(crate) fn assembled(
        plans: Vec<SelectionPlan<'q>>,
        target_marks: u32,
        tolerance: u32,
        warnings: Vec<SelectionWarning>,
        stats: SelectionStats,
    ) -> Self {
        Self {
            plans,
            target_marks,
            tolerance,
            warnings,
            stats,
        }
    }

    pub(crate) fn push_warning(&mut self, warning: SelectionWarning) {
        self.warnings.push(warning);
    }

    pub fn plans(&self) -> &[SelectionPlan<'q>] {
        &self.plans
    }

    pub fn target_marks(&self) -> u32 {
        self.target_marks
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn warnings(&self) -> &[SelectionWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> &SelectionStats {
        &self.stats
    }

    pub fn total_marks(&self) -> u32 {
        self.plans.iter().map(SelectionPlan::marks).sum()
    }

    pub fn question_count(&self) -> usize {
        self.plans.len()
    }

    /// |total - target|
    pub fn deviation(&self) -> u32 {
        self.total_marks().abs_diff(self.target_marks)
    }

    /// 带符号偏差（超出为正）
    pub fn mark_difference(&self) -> i64 {
        i64::from(self.total_marks()) - i64::from(self.target_marks)
    }

    pub fn within_tolerance(&self) -> bool {
        self.deviation() <= self.tolerance
    }

    /// 选入叶子覆盖的知识点并集
    pub fn covered_topics(&self) -> BTreeSet<&'q str> {
        self.plans.iter().flat_map(|p| p.topics()).collect()
    }

    pub fn get_plan(&self, question_id: &str) -> Option<&SelectionPlan<'q>> {
        self.plans.iter().find(|p| p.question_id() == question_id)
    }

    /// 可序列化摘要（供外部写出 ZIP/PDF 与报表）
    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary {
            plans: self
                .plans
                .iter()
                .map(|p| PlanSummary {
                    question_id: p.question_id().to_string(),
                    included_parts: p.included_leaves().iter().map(|l| l.label().to_string()).collect(),
                    marks: p.marks(),
                    is_full_question: p.is_full_question(),
                })
                .collect(),
            total_marks: self.total_marks(),
            target_marks: self.target_marks,
            tolerance: self.tolerance,
            deviation: self.deviation(),
            within_tolerance: self.within_tolerance(),
            covered_topics: self.covered_topics().into_iter().map(str::to_string).collect(),
            warnings: self.warnings.clone(),
            stats: self.stats,
        }
    }
}

impl fmt::Display for SelectionResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "questions={} marks={}/{}±{}",
            self.plans.len(),
            self.total_marks(),
            self.target_marks,
            self.tolerance
        )
    }
}

/// 单题摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub question_id: String,
    pub included_parts: Vec<String>,
    pub marks: u32,
    pub is_full_question: bool,
}

/// 选题结果摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub plans: Vec<PlanSummary>,
    pub total_marks: u32,
    pub target_marks: u32,
    pub tolerance: u32,
    pub deviation: u32,
    pub within_tolerance: bool,
    pub covered_topics: Vec<String>,
    pub warnings: Vec<SelectionWarning>,
    pub stats: SelectionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bounds::SliceBounds;
    use crate::domain::marks::Marks;
    use crate::domain::types::PartKind;

    fn question(id: &str, marks: &[u32]) -> Question {
        let children = marks
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let top = (i as u32) * 100 + 10;
                Part::leaf(
                    format!("1({})", (b'a' + i as u8) as char),
                    PartKind::Letter,
                    Marks::explicit(*m),
                    SliceBounds::rows(top, top + 80).unwrap(),
                )
            })
            .collect();
        let root = Part::branch("1", PartKind::Question, SliceBounds::rows(0, 1000).unwrap(), children).unwrap();
        Question::new(id, "0478", 2021, 1, 1, "Topic", root).unwrap()
    }

    #[test]
    fn test_plan_rejects_non_leaf_label() {
        let q = question("q1", &[3, 4]);
        let err = SelectionPlan::new(&q, ["1"]).unwrap_err();
        assert!(matches!(err, AssemblyError::UnknownLeafLabel { .. }));
        let err = SelectionPlan::new(&q, ["1(z)"]).unwrap_err();
        assert!(matches!(err, AssemblyError::UnknownLeafLabel { .. }));
    }

    #[test]
    fn test_plan_marks_and_fullness() {
        let q = question("q1", &[3, 4, 5]);
        let plan = SelectionPlan::new(&q, ["1(a)", "1(c)"]).unwrap();
        assert_eq!(plan.marks(), 8);
        assert!(plan.is_partial());
        assert_eq!(plan.excluded_leaves().len(), 1);
        let full = SelectionPlan::full_question(&q);
        assert!(full.is_full_question());
        assert_eq!(full.marks(), 12);
    }

    #[test]
    fn test_result_rejects_duplicates() {
        let q = question("q1", &[3]);
        let plans = vec![SelectionPlan::full_question(&q), SelectionPlan::full_question(&q)];
        assert!(matches!(
            SelectionResult::new(plans, 10, 0),
            Err(AssemblyError::DuplicateQuestion(_))
        ));
    }

    #[test]
    fn test_result_deviation() {
        let a = question("a", &[4]);
        let b = question("b", &[3]);
        let result = SelectionResult::new(
            vec![SelectionPlan::full_question(&a), SelectionPlan::full_question(&b)],
            10,
            2,
        )
        .unwrap();
        assert_eq!(result.total_marks(), 7);
        assert_eq!(result.deviation(), 3);
        assert_eq!(result.mark_difference(), -3);
        assert!(!result.within_tolerance());
        assert_eq!(result.covered_topics().into_iter().collect::<Vec<_>>(), vec!["Topic"]);
    }
}
