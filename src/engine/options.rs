// ==========================================
// 试卷组卷系统 - 选项生成器
// ==========================================
// 职责: 枚举单题在结构模式下的合法叶子子集（选项）
// 输入: Question + PartMode + LeafFilter
// 输出: QuestionOptions（按分数降序,同分保持生成顺序）
// ==========================================
// 选项数量（n = 准入叶子数）:
//   ALL   - 1（n = 0 时为 0）
//   PRUNE - n（全部前缀）
//   SKIP  - 2^n - 1（非空子集）
// ==========================================

use crate::domain::part::Part;
use crate::domain::question::Question;
use crate::domain::selection::SelectionPlan;
use crate::domain::types::PartMode;
use crate::engine::eligibility::{eligible_leaves, LeafFilter};
use tracing::warn;

// ==========================================
// QuestionOption - 单个选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption<'q> {
    question: &'q Question,
    leaves: Vec<&'q Part>,
    marks: u32,
}

impl<'q> QuestionOption<'q> {
    fn new(question: &'q Question, leaves: Vec<&'q Part>) -> Self {
        let marks = leaves.iter().map(|p| p.marks().value).sum();
        Self {
            question,
            leaves,
            marks,
        }
    }

    pub fn question(&self) -> &'q Question {
        self.question
    }

    /// 选项包含的叶子（文档顺序）
    pub fn leaves(&self) -> &[&'q Part] {
        &self.leaves
    }

    pub fn labels(&self) -> Vec<&'q str> {
        self.leaves.iter().map(|p| p.label()).collect()
    }

    pub fn marks(&self) -> u32 {
        self.marks
    }

    pub fn part_count(&self) -> usize {
        self.leaves.len()
    }

    /// 转为选取方案
    pub fn to_plan(&self) -> SelectionPlan<'q> {
        SelectionPlan::from_leaves(self.question, &self.leaves)
    }
}

// ==========================================
// QuestionOptions - 单题全部选项
// ==========================================
#[derive(Debug, Clone)]
pub struct QuestionOptions<'q> {
    question: &'q Question,
    part_mode: PartMode,
    options: Vec<QuestionOption<'q>>,
}

impl<'q> QuestionOptions<'q> {
    pub fn question(&self) -> &'q Question {
        self.question
    }

    pub fn part_mode(&self) -> PartMode {
        self.part_mode
    }

    /// 全部选项（分数降序）
    pub fn options(&self) -> &[QuestionOption<'q>] {
        &self.options
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn max_marks(&self) -> Option<u32> {
        self.options.first().map(QuestionOption::marks)
    }

    pub fn min_marks(&self) -> Option<u32> {
        self.options.last().map(QuestionOption::marks)
    }

    /// 分数落在 [low, high] 内的选项（惰性过滤）
    pub fn options_in_range(&self, low: u32, high: u32) -> impl Iterator<Item = &QuestionOption<'q>> + '_ {
        self.options
            .iter()
            .filter(move |o| (low..=high).contains(&o.marks))
    }

    /// 不超过预算的最大选项;都超预算时返回最小选项
    ///
    /// 预算可以为负（置顶题目已超分）。仅在没有选项时返回 None。
    pub fn best_option_for_marks(&self, budget: i64) -> Option<&QuestionOption<'q>> {
        let fitting = self
            .options
            .iter()
            .find(|o| i64::from(o.marks) <= budget);
        if fitting.is_some() {
            return fitting;
        }
        let smallest = self.min_marks()?;
        self.options.iter().find(|o| o.marks == smallest)
    }
}

// ==========================================
// OptionGenerator - 选项生成器
// ==========================================
pub struct OptionGenerator {
    /// SKIP 全量枚举的叶子数上限（None 为不设限）
    max_skip_leaves: Option<usize>,
}

impl Default for OptionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionGenerator {
    pub fn new() -> Self {
        Self { max_skip_leaves: None }
    }

    /// 设置 SKIP 枚举上限,叶子数超过上限时退化为前缀选项
    pub fn with_max_skip_leaves(mut self, max_skip_leaves: usize) -> Self {
        self.max_skip_leaves = Some(max_skip_leaves);
        self
    }

    pub fn max_skip_leaves(&self) -> Option<usize> {
        self.max_skip_leaves
    }

    /// 生成单题选项
    pub fn generate<'q>(
        &self,
        question: &'q Question,
        part_mode: PartMode,
        filter: &LeafFilter<'_>,
    ) -> QuestionOptions<'q> {
        let eligible = eligible_leaves(question, part_mode, filter);

        let mut options = if eligible.is_empty() {
            Vec::new()
        } else {
            match part_mode {
                PartMode::All => vec![QuestionOption::new(question, eligible)],
                PartMode::Prune => Self::prefix_options(question, &eligible),
                PartMode::Skip => match self.max_skip_leaves {
                    Some(max) if eligible.len() > max => {
                        warn!(
                            question_id = %question.id(),
                            leaf_count = eligible.len(),
                            max,
                            "叶子数超过 SKIP 枚举上限,退化为前缀选项"
                        );
                        Self::prefix_options(question, &eligible)
                    }
                    _ => Self::subset_options(question, &eligible),
                },
            }
        };

        // 稳定排序: 同分保持生成顺序
        options.sort_by(|a, b| b.marks.cmp(&a.marks));

        QuestionOptions {
            question,
            part_mode,
            options,
        }
    }

    /// 全部连续前缀 [0..1], [0..2], ..., [0..n]
    fn prefix_options<'q>(question: &'q Question, eligible: &[&'q Part]) -> Vec<QuestionOption<'q>> {
        (1..=eligible.len())
            .map(|len| QuestionOption::new(question, eligible[..len].to_vec()))
            .collect()
    }

    /// 全部非空子集（顺序同按位掩码递增,子集内保持文档顺序）
    ///
    /// 逐叶子倍增: 已有子集各复制一份并追加当前叶子,不受整数位宽限制。
    fn subset_options<'q>(question: &'q Question, eligible: &[&'q Part]) -> Vec<QuestionOption<'q>> {
        let mut subsets: Vec<Vec<&'q Part>> = vec![Vec::new()];
        for leaf in eligible {
            let extended: Vec<Vec<&'q Part>> = subsets
                .iter()
                .map(|subset| {
                    let mut next = Vec::with_capacity(subset.len() + 1);
                    next.extend_from_slice(subset);
                    next.push(*leaf);
                    next
                })
                .collect();
            subsets.extend(extended);
        }
        subsets
            .into_iter()
            .skip(1)
            .map(|leaves| QuestionOption::new(question, leaves))
            .collect()
    }
}

/// 便捷函数: 生成单题选项
pub fn generate_options<'q>(
    question: &'q Question,
    part_mode: PartMode,
    filter: &LeafFilter<'_>,
) -> QuestionOptions<'q> {
    OptionGenerator::new().generate(question, part_mode, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bounds::SliceBounds;
    use crate::domain::marks::Marks;
    use crate::domain::types::PartKind;

    fn question(marks: &[u32]) -> Question {
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
        let root = Part::branch("1", PartKind::Question, SliceBounds::rows(0, 2000).unwrap(), children).unwrap();
        Question::new("q1", "0478", 2021, 1, 1, "T", root).unwrap()
    }

    #[test]
    fn test_best_option_prefers_largest_fitting() {
        let q = question(&[2, 3, 5]);
        let opts = generate_options(&q, PartMode::Skip, &LeafFilter::Any);
        assert_eq!(opts.best_option_for_marks(7).unwrap().marks(), 7);
        assert_eq!(opts.best_option_for_marks(6).unwrap().marks(), 5);
        assert_eq!(opts.best_option_for_marks(1).unwrap().marks(), 2);
        assert_eq!(opts.best_option_for_marks(-4).unwrap().marks(), 2);
    }

    #[test]
    fn test_options_in_range() {
        let q = question(&[2, 3, 5]);
        let opts = generate_options(&q, PartMode::Prune, &LeafFilter::Any);
        let marks: Vec<u32> = opts.options_in_range(3, 6).map(|o| o.marks()).collect();
        assert_eq!(marks, vec![5]);
    }

    #[test]
    fn test_subset_leaves_keep_document_order() {
        let q = question(&[1, 1, 1]);
        let opts = generate_options(&q, PartMode::Skip, &LeafFilter::Any);
        for option in opts.options() {
            let labels = option.labels();
            let mut sorted = labels.clone();
            sorted.sort();
            assert_eq!(labels, sorted);
        }
    }

    #[test]
    fn test_subset_order_follows_mask_order() {
        let q = question(&[1, 2, 4]);
        let eligible = eligible_leaves(&q, PartMode::Skip, &LeafFilter::Any);
        let opts = OptionGenerator::subset_options(&q, &eligible);
        let marks: Vec<u32> = opts.iter().map(QuestionOption::marks).collect();
        assert_eq!(marks, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_configured_skip_cap_falls_back_to_prefixes() {
        let q = question(&[1, 1, 1, 1]);
        let generator = OptionGenerator::new().with_max_skip_leaves(3);
        assert_eq!(generator.max_skip_leaves(), Some(3));
        let opts = generator.generate(&q, PartMode::Skip, &LeafFilter::Any);
        assert_eq!(opts.option_count(), 4);

        let opts = OptionGenerator::new().with_max_skip_leaves(4).generate(&q, PartMode::Skip, &LeafFilter::Any);
        assert_eq!(opts.option_count(), 15);
    }

    #[test]
    fn test_to_plan_matches_option() {
        let q = question(&[4, 6]);
        let opts = generate_options(&q, PartMode::All, &LeafFilter::Any);
        let plan = opts.options()[0].to_plan();
        assert!(plan.is_full_question());
        assert_eq!(plan.marks(), 10);
    }
}
