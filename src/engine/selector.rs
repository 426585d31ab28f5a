// ==========================================
// 试卷组卷系统 - 选题引擎
// ==========================================
// 职责: 置顶 -> 关键词候选 -> 贪心填充 -> 剪枝
// 输入: 题库（只读借用）+ SelectionConfig
// 输出: SelectionResult（附告警与统计）
// ==========================================
// 红线: 置顶题目无条件加入,超分只告警
// 红线: 贪心填充只接受严格减小误差的候选,平局拒绝
// 红线: 随机性只来自按 seed 创建的 ChaCha8Rng,每轮独立
// ==========================================
// 贪心填充分两遍:
//   第一遍 - 只接受不超出剩余预算的选项,超预算者延后
//   第二遍 - 按同一顺序重试延后候选,允许越过目标
// ==========================================

use crate::config::SelectionConfig;
use crate::domain::part::Part;
use crate::domain::question::Question;
use crate::domain::selection::{SelectionPlan, SelectionResult, SelectionStats, SelectionWarning};
use crate::domain::types::PartMode;
use crate::engine::eligibility::{expand_to_leaf_labels, is_question_eligible, LeafFilter};
use crate::engine::options::{OptionGenerator, QuestionOptions};
use crate::engine::pruner::SelectionPruner;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// 强制覆盖知识点时的最大轮次
pub const MAX_COVERAGE_ATTEMPTS: u32 = 5;

/// 候选来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    Keyword,
    Fill,
}

struct Candidate<'q> {
    options: QuestionOptions<'q>,
    source: CandidateSource,
}

/// 单个候选的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acceptance {
    Accepted,
    Rejected,
    Deferred,
}

// ==========================================
// FillState - 单轮累积状态
// ==========================================
struct FillState<'q> {
    plans: Vec<SelectionPlan<'q>>,
    total: i64,
    target: i64,
}

impl<'q> FillState<'q> {
    fn new(target_marks: u32) -> Self {
        Self {
            plans: Vec::new(),
            total: 0,
            target: i64::from(target_marks),
        }
    }

    fn error(&self) -> u64 {
        self.total.abs_diff(self.target)
    }

    /// 剩余预算（置顶超分时为负）
    fn remaining(&self) -> i64 {
        self.target - self.total
    }

    fn push(&mut self, plan: SelectionPlan<'q>) {
        self.total += i64::from(plan.marks());
        self.plans.push(plan);
    }
}

// ==========================================
// QuestionSelector - 选题引擎
// ==========================================
pub struct QuestionSelector {
    generator: OptionGenerator,
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionSelector {
    pub fn new() -> Self {
        Self {
            generator: OptionGenerator::new(),
        }
    }

    /// 使用自定义选项生成器（如设置 SKIP 枚举上限）
    pub fn with_generator(mut self, generator: OptionGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// 选题主入口
    ///
    /// 开启 force_topic_coverage 且指定了知识点时,以 seed, seed+1, ... 重试,
    /// 取第一轮覆盖全部知识点的结果;都未覆盖则返回最后一轮并附 MissingTopics。
    #[instrument(skip(self, questions, config), fields(
        pool_size = questions.len(),
        target_marks = config.target_marks(),
        tolerance = config.tolerance(),
        part_mode = %config.part_mode(),
        seed = config.seed()
    ))]
    pub fn select<'q>(&self, questions: &'q [Question], config: &SelectionConfig) -> SelectionResult<'q> {
        let requested = match config.topics() {
            Some(topics) if config.force_topic_coverage() => topics,
            _ => {
                let result = self.run_pass(questions, config, 1);
                Self::log_summary(&result);
                return result;
            }
        };

        let mut last: Option<(SelectionResult<'q>, Vec<String>)> = None;
        for attempt in 0..MAX_COVERAGE_ATTEMPTS {
            let pass_config = config.with_seed(config.seed().wrapping_add(u64::from(attempt)));
            let result = self.run_pass(questions, &pass_config, attempt + 1);
            let missing = Self::missing_topics(&result, requested);
            if missing.is_empty() {
                Self::log_summary(&result);
                return result;
            }
            debug!(attempt = attempt + 1, missing = ?missing, "知识点未全部覆盖,换种子重试");
            last = Some((result, missing));
        }

        match last {
            Some((mut result, missing)) => {
                warn!(missing = ?missing, attempts = MAX_COVERAGE_ATTEMPTS, "强制覆盖知识点失败");
                result.push_warning(SelectionWarning::MissingTopics { topics: missing });
                Self::log_summary(&result);
                result
            }
            None => SelectionResult::empty(config.target_marks(), config.tolerance()),
        }
    }

    // ==========================================
    // 单轮选题
    // ==========================================

    fn run_pass<'q>(&self, questions: &'q [Question], config: &SelectionConfig, attempt: u32) -> SelectionResult<'q> {
        let target = config.target_marks();
        let tolerance = config.tolerance();
        let mut warnings = Vec::new();
        let mut stats = SelectionStats {
            attempts: attempt,
            ..SelectionStats::default()
        };

        let pool = Self::dedupe_pool(questions);
        if pool.is_empty() {
            debug!("题库为空");
            let mut result = SelectionResult::empty(target, tolerance);
            if config.min_questions() > 0 {
                result.push_warning(SelectionWarning::MinQuestionsUnmet {
                    selected: 0,
                    min_questions: config.min_questions(),
                });
            }
            result.push_warning(SelectionWarning::OutOfTolerance {
                total_marks: 0,
                target_marks: target,
                tolerance,
            });
            return result;
        }

        let mut state = FillState::new(target);

        // === 步骤 1: 置顶题目 ===
        for question in pool.iter().copied().filter(|q| config.is_pinned(q.id())) {
            let plan = Self::pinned_plan(question, config);
            debug!(question_id = %question.id(), marks = plan.marks(), "加入置顶题目");
            stats.pinned_marks += plan.marks();
            state.push(plan);
        }
        for id in config.pinned_question_ids() {
            if !pool.iter().any(|q| q.id() == id.as_str()) {
                warn!(question_id = %id, "置顶题目不在题库中");
                warnings.push(SelectionWarning::PinnedQuestionMissing {
                    question_id: id.clone(),
                });
            }
        }
        if stats.pinned_marks > target {
            let overshoot = stats.pinned_marks - target;
            warn!(pinned_marks = stats.pinned_marks, target, overshoot, "置顶题目超出目标分数");
            warnings.push(SelectionWarning::PinOvershoot {
                pinned_marks: stats.pinned_marks,
                target_marks: target,
                overshoot,
            });
        }

        // === 步骤 2: 候选池 + 种子洗牌 ===
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed());
        let (mut keyword_pool, mut fill_pool) = self.build_candidates(&pool, config);
        keyword_pool.shuffle(&mut rng);
        fill_pool.shuffle(&mut rng);
        debug!(
            keyword_candidates = keyword_pool.len(),
            fill_candidates = fill_pool.len(),
            "候选池已生成"
        );

        let candidates: Vec<Candidate<'q>> = keyword_pool
            .into_iter()
            .map(|options| Candidate {
                options,
                source: CandidateSource::Keyword,
            })
            .chain(fill_pool.into_iter().map(|options| Candidate {
                options,
                source: CandidateSource::Fill,
            }))
            .collect();

        // === 步骤 3: 贪心填充（两遍）===
        let mut deferred = Vec::new();
        for candidate in &candidates {
            if Self::should_stop(&state, config) {
                break;
            }
            match Self::try_accept(&mut state, candidate, false, &mut stats) {
                Acceptance::Deferred => deferred.push(candidate),
                Acceptance::Accepted | Acceptance::Rejected => {}
            }
        }
        for candidate in deferred {
            if Self::should_stop(&state, config) {
                break;
            }
            Self::try_accept(&mut state, candidate, true, &mut stats);
        }

        // === 步骤 4: 剪枝 ===
        let pruner = SelectionPruner::new(config.part_mode())
            .with_min_parts(config.min_parts())
            .protect(config.pinned_question_ids().iter().cloned());
        let plans = pruner.prune_selection(state.plans, target, tolerance);

        // === 步骤 5: 软性条件 ===
        let total: u32 = plans.iter().map(SelectionPlan::marks).sum();
        if plans.len() < config.min_questions() {
            warn!(selected = plans.len(), min_questions = config.min_questions(), "题目数量不足");
            warnings.push(SelectionWarning::MinQuestionsUnmet {
                selected: plans.len(),
                min_questions: config.min_questions(),
            });
        }
        if !config.is_within_tolerance(total) {
            warn!(total_marks = total, target, tolerance, "总分不在容差范围内");
            warnings.push(SelectionWarning::OutOfTolerance {
                total_marks: total,
                target_marks: target,
                tolerance,
            });
        }
        if let Some(requested) = config.topics() {
            let mismatched = Self::mismatched_topics(&plans, requested);
            if !mismatched.is_empty() {
                warn!(topics = ?mismatched, "选入了未请求的知识点");
                warnings.push(SelectionWarning::TopicMismatch { topics: mismatched });
            }
        }

        SelectionResult::assembled(plans, target, tolerance, warnings, stats)
    }

    /// 构建候选池: (关键词命中候选, 普通填充候选)
    fn build_candidates<'q>(
        &self,
        pool: &[&'q Question],
        config: &SelectionConfig,
    ) -> (Vec<QuestionOptions<'q>>, Vec<QuestionOptions<'q>>) {
        let part_mode = config.part_mode();
        let topic_filter = LeafFilter::from_topics(config.topics());
        let backfill = !config.keyword_mode() || config.allow_keyword_backfill();

        let mut keyword_pool = Vec::new();
        let mut fill_pool = Vec::new();

        if !backfill {
            debug!("关键词模式已关闭补充,只保留置顶题目");
            return (keyword_pool, fill_pool);
        }

        for question in pool.iter().copied() {
            if config.is_pinned(question.id()) {
                continue;
            }

            // 关键词候选一律按 SKIP 枚举命中叶子的子集
            if config.keyword_mode() {
                if let Some(labels) = config.matched_labels_for(question.id()) {
                    let leaf_labels = expand_to_leaf_labels(question, labels);
                    let options = self
                        .generator
                        .generate(question, PartMode::Skip, &LeafFilter::Labels(&leaf_labels));
                    if !options.is_empty() {
                        keyword_pool.push(options);
                    }
                    continue;
                }
            }

            if !is_question_eligible(question, &topic_filter) {
                continue;
            }
            let options = self.generator.generate(question, part_mode, &topic_filter);
            if !options.is_empty() {
                fill_pool.push(options);
            }
        }

        (keyword_pool, fill_pool)
    }

    /// 评估一个候选,误差严格减小才接受
    fn try_accept<'q>(
        state: &mut FillState<'q>,
        candidate: &Candidate<'q>,
        allow_overshoot: bool,
        stats: &mut SelectionStats,
    ) -> Acceptance {
        let question_id = candidate.options.question().id();
        let remaining = state.remaining();
        let Some(option) = candidate.options.best_option_for_marks(remaining) else {
            return Acceptance::Rejected;
        };

        let marks = option.marks();
        if !allow_overshoot && i64::from(marks) > remaining {
            debug!(question_id = %question_id, marks, remaining, "超出剩余预算,延后");
            return Acceptance::Deferred;
        }

        let current_error = state.error();
        let new_error = (state.total + i64::from(marks)).abs_diff(state.target);
        if new_error >= current_error {
            debug!(question_id = %question_id, marks, current_error, new_error, "误差未减小,跳过");
            return Acceptance::Rejected;
        }

        match candidate.source {
            CandidateSource::Keyword => {
                stats.keyword_marks += marks;
                stats.keyword_parts += option.part_count();
            }
            CandidateSource::Fill => stats.fill_marks += marks,
        }
        debug!(question_id = %question_id, marks, new_error, "接受候选");
        state.push(option.to_plan());
        Acceptance::Accepted
    }

    fn should_stop(state: &FillState<'_>, config: &SelectionConfig) -> bool {
        if state.error() <= u64::from(config.tolerance()) {
            return true;
        }
        matches!(config.max_questions(), Some(max) if state.plans.len() >= max)
    }

    // ==========================================
    // 辅助
    // ==========================================

    /// 题库去重（同 ID 保留首次出现）
    fn dedupe_pool(questions: &[Question]) -> Vec<&Question> {
        let mut seen = BTreeSet::new();
        questions
            .iter()
            .filter(|q| {
                let fresh = seen.insert(q.id());
                if !fresh {
                    warn!(question_id = %q.id(), "题库中存在重复题目 ID,忽略后者");
                }
                fresh
            })
            .collect()
    }

    /// 置顶题目的方案: 关键词模式下取命中子集,否则整题
    fn pinned_plan<'q>(question: &'q Question, config: &SelectionConfig) -> SelectionPlan<'q> {
        if config.keyword_mode() {
            if let Some(labels) = config.matched_labels_for(question.id()) {
                let leaf_labels = expand_to_leaf_labels(question, labels);
                let leaves: Vec<&Part> = question
                    .leaf_parts()
                    .into_iter()
                    .filter(|leaf| leaf_labels.contains(leaf.label()))
                    .collect();
                if !leaves.is_empty() {
                    return SelectionPlan::from_leaves(question, &leaves);
                }
            }
        }
        SelectionPlan::full_question(question)
    }

    fn missing_topics(result: &SelectionResult<'_>, requested: &BTreeSet<String>) -> Vec<String> {
        let covered = result.covered_topics();
        requested
            .iter()
            .filter(|t| !covered.contains(t.as_str()))
            .cloned()
            .collect()
    }

    fn mismatched_topics(plans: &[SelectionPlan<'_>], requested: &BTreeSet<String>) -> Vec<String> {
        plans
            .iter()
            .flat_map(|p| p.topics())
            .filter(|t| !requested.contains(*t))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn log_summary(result: &SelectionResult<'_>) {
        info!(
            questions = result.question_count(),
            total_marks = result.total_marks(),
            target_marks = result.target_marks(),
            deviation = result.deviation(),
            within_tolerance = result.within_tolerance(),
            warnings = result.warnings().len(),
            "选题完成"
        );
    }
}

/// 便捷函数: 选题
pub fn select_questions<'q>(questions: &'q [Question], config: &SelectionConfig) -> SelectionResult<'q> {
    QuestionSelector::new().select(questions, config)
}
