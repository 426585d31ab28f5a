// ==========================================
// 试卷组卷系统 - 选题配置
// ==========================================
// 红线: 构造后不可变,非法参数在构造时报错,绝不静默修正
// 构造入口: SelectionConfig::builder(target) / serde 反序列化（同一校验）
// ==========================================

use crate::domain::types::PartMode;
use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_TOLERANCE: i64 = 2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MIN_QUESTIONS: usize = 1;
pub const DEFAULT_MIN_PARTS: usize = 1;

/// 选题配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SelectionConfigRecord")]
pub struct SelectionConfig {
    target_marks: u32,
    tolerance: u32,
    min_questions: usize,
    max_questions: Option<usize>,
    topics: Option<BTreeSet<String>>,
    part_mode: PartMode,
    keyword_mode: bool,
    keyword_matched_labels: BTreeMap<String, BTreeSet<String>>,
    pinned_question_ids: BTreeSet<String>,
    allow_keyword_backfill: bool,
    force_topic_coverage: bool,
    min_parts: usize,
    seed: u64,
}

/// 反序列化中间结构（带默认值,数值用有符号类型以便报告负数）
#[derive(Deserialize)]
struct SelectionConfigRecord {
    target_marks: i64,
    #[serde(default = "default_tolerance")]
    tolerance: i64,
    #[serde(default = "default_min_questions")]
    min_questions: usize,
    #[serde(default)]
    max_questions: Option<usize>,
    #[serde(default)]
    topics: Option<BTreeSet<String>>,
    #[serde(default)]
    part_mode: PartMode,
    #[serde(default)]
    keyword_mode: bool,
    #[serde(default)]
    keyword_matched_labels: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pinned_question_ids: BTreeSet<String>,
    #[serde(default = "default_true")]
    allow_keyword_backfill: bool,
    #[serde(default)]
    force_topic_coverage: bool,
    #[serde(default = "default_min_parts")]
    min_parts: usize,
    #[serde(default = "default_seed")]
    seed: u64,
}

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE
}

fn default_min_questions() -> usize {
    DEFAULT_MIN_QUESTIONS
}

fn default_min_parts() -> usize {
    DEFAULT_MIN_PARTS
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_true() -> bool {
    true
}

impl TryFrom<SelectionConfigRecord> for SelectionConfig {
    type Error = AssemblyError;

    fn try_from(r: SelectionConfigRecord) -> AssemblyResult<Self> {
        SelectionConfigBuilder {
            target_marks: r.target_marks,
            tolerance: r.tolerance,
            min_questions: r.min_questions,
            max_questions: r.max_questions,
            topics: r.topics,
            part_mode: r.part_mode,
            keyword_mode: r.keyword_mode,
            keyword_matched_labels: r.keyword_matched_labels,
            pinned_question_ids: r.pinned_question_ids,
            allow_keyword_backfill: r.allow_keyword_backfill,
            force_topic_coverage: r.force_topic_coverage,
            min_parts: r.min_parts,
            seed: r.seed,
        }
        .build()
    }
}

impl SelectionConfig {
    /// 以目标分数开始构建（其余参数取默认值）
    pub fn builder(target_marks: i64) -> SelectionConfigBuilder {
        SelectionConfigBuilder::new(target_marks)
    }

    pub fn target_marks(&self) -> u32 {
        self.target_marks
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn min_questions(&self) -> usize {
        self.min_questions
    }

    /// None 表示不限
    pub fn max_questions(&self) -> Option<usize> {
        self.max_questions
    }

    /// None 表示不按知识点过滤
    pub fn topics(&self) -> Option<&BTreeSet<String>> {
        self.topics.as_ref()
    }

    pub fn part_mode(&self) -> PartMode {
        self.part_mode
    }

    pub fn keyword_mode(&self) -> bool {
        self.keyword_mode
    }

    pub fn keyword_matched_labels(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.keyword_matched_labels
    }

    /// 某题命中的标签（未命中返回 None）
    pub fn matched_labels_for(&self, question_id: &str) -> Option<&BTreeSet<String>> {
        self.keyword_matched_labels
            .get(question_id)
            .filter(|labels| !labels.is_empty())
    }

    pub fn pinned_question_ids(&self) -> &BTreeSet<String> {
        &self.pinned_question_ids
    }

    pub fn is_pinned(&self, question_id: &str) -> bool {
        self.pinned_question_ids.contains(question_id)
    }

    pub fn allow_keyword_backfill(&self) -> bool {
        self.allow_keyword_backfill
    }

    pub fn force_topic_coverage(&self) -> bool {
        self.force_topic_coverage
    }

    pub fn min_parts(&self) -> usize {
        self.min_parts
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 可接受分数区间 [target - tolerance, target + tolerance]（下界截断为 0）
    pub fn mark_range(&self) -> (u32, u32) {
        (
            self.target_marks.saturating_sub(self.tolerance),
            self.target_marks.saturating_add(self.tolerance),
        )
    }

    pub fn is_within_tolerance(&self, marks: u32) -> bool {
        let (low, high) = self.mark_range();
        (low..=high).contains(&marks)
    }

    /// 复制一份并替换随机种子（用于知识点覆盖重试）
    pub(crate) fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}

// ==========================================
// SelectionConfigBuilder
// ==========================================

#[derive(Debug, Clone)]
pub struct SelectionConfigBuilder {
    target_marks: i64,
    tolerance: i64,
    min_questions: usize,
    max_questions: Option<usize>,
    topics: Option<BTreeSet<String>>,
    part_mode: PartMode,
    keyword_mode: bool,
    keyword_matched_labels: BTreeMap<String, BTreeSet<String>>,
    pinned_question_ids: BTreeSet<String>,
    allow_keyword_backfill: bool,
    force_topic_coverage: bool,
    min_parts: usize,
    seed: u64,
}

impl SelectionConfigBuilder {
    pub fn new(target_marks: i64) -> Self {
        Self {
            target_marks,
            tolerance: DEFAULT_TOLERANCE,
            min_questions: DEFAULT_MIN_QUESTIONS,
            max_questions: None,
            topics: None,
            part_mode: PartMode::default(),
            keyword_mode: false,
            keyword_matched_labels: BTreeMap::new(),
            pinned_question_ids: BTreeSet::new(),
            allow_keyword_backfill: true,
            force_topic_coverage: false,
            min_parts: DEFAULT_MIN_PARTS,
            seed: DEFAULT_SEED,
        }
    }

    pub fn tolerance(mut self, tolerance: i64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn min_questions(mut self, min_questions: usize) -> Self {
        self.min_questions = min_questions;
        self
    }

    pub fn max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = Some(max_questions);
        self
    }

    /// 空集合视为不过滤
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = topics.into_iter().map(Into::into).collect();
        self.topics = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn part_mode(mut self, part_mode: PartMode) -> Self {
        self.part_mode = part_mode;
        self
    }

    pub fn keyword_mode(mut self, keyword_mode: bool) -> Self {
        self.keyword_mode = keyword_mode;
        self
    }

    pub fn keyword_matched_labels(mut self, labels: BTreeMap<String, BTreeSet<String>>) -> Self {
        self.keyword_matched_labels = labels;
        self
    }

    pub fn pin<S: Into<String>>(mut self, question_id: S) -> Self {
        self.pinned_question_ids.insert(question_id.into());
        self
    }

    pub fn pinned_question_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pinned_question_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn allow_keyword_backfill(mut self, allow: bool) -> Self {
        self.allow_keyword_backfill = allow;
        self
    }

    pub fn force_topic_coverage(mut self, force: bool) -> Self {
        self.force_topic_coverage = force;
        self
    }

    pub fn min_parts(mut self, min_parts: usize) -> Self {
        self.min_parts = min_parts;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 校验并生成配置
    ///
    /// # 错误
    /// - target_marks <= 0: `InvalidTargetMarks`
    /// - tolerance < 0: `NegativeTolerance`
    /// - target_marks / tolerance 超出 u32: `ValueOutOfRange`
    /// - max_questions < min_questions: `InvalidQuestionRange`
    /// - min_parts == 0: `InvalidMinParts`
    pub fn build(self) -> AssemblyResult<SelectionConfig> {
        if self.target_marks <= 0 {
            return Err(AssemblyError::InvalidTargetMarks(self.target_marks));
        }
        let target_marks = u32::try_from(self.target_marks)
            .map_err(|_| AssemblyError::ValueOutOfRange {
                field: "target_marks",
                value: self.target_marks,
            })?;

        if self.tolerance < 0 {
            return Err(AssemblyError::NegativeTolerance(self.tolerance));
        }
        let tolerance = u32::try_from(self.tolerance)
            .map_err(|_| AssemblyError::ValueOutOfRange {
                field: "tolerance",
                value: self.tolerance,
            })?;

        if let Some(max) = self.max_questions {
            if max < self.min_questions {
                return Err(AssemblyError::InvalidQuestionRange {
                    min: self.min_questions,
                    max,
                });
            }
        }

        if self.min_parts == 0 {
            return Err(AssemblyError::InvalidMinParts(self.min_parts));
        }

        Ok(SelectionConfig {
            target_marks,
            tolerance,
            min_questions: self.min_questions,
            max_questions: self.max_questions,
            topics: self.topics,
            part_mode: self.part_mode,
            keyword_mode: self.keyword_mode,
            keyword_matched_labels: self.keyword_matched_labels,
            pinned_question_ids: self.pinned_question_ids,
            allow_keyword_backfill: self.allow_keyword_backfill,
            force_topic_coverage: self.force_topic_coverage,
            min_parts: self.min_parts,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SelectionConfig::builder(50).build().unwrap();
        assert_eq!(config.tolerance(), 2);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.part_mode(), PartMode::Skip);
        assert!(config.allow_keyword_backfill());
        assert_eq!(config.mark_range(), (48, 52));
        assert!(config.is_within_tolerance(52));
        assert!(!config.is_within_tolerance(53));
    }

    #[test]
    fn test_empty_topics_means_no_filter() {
        let config = SelectionConfig::builder(10)
            .topics(Vec::<String>::new())
            .build()
            .unwrap();
        assert!(config.topics().is_none());
    }

    #[test]
    fn test_mark_range_saturates_at_zero() {
        let config = SelectionConfig::builder(3).tolerance(5).build().unwrap();
        assert_eq!(config.mark_range(), (0, 8));
    }
}
