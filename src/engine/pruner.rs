// ==========================================
// 试卷组卷系统 - 剪枝引擎
// ==========================================
// 职责: 对已选方案逐个移除叶子,使总分更接近目标
// 红线: 只在误差严格减小时移除;保留至少 min_parts 个叶子
// 红线: 置顶题目不参与剪枝
// ==========================================
// 结构模式约束:
//   ALL   - 题目视为整体,不剪枝
//   PRUNE - 只能移除最后一个已选叶子（保持前缀）
//   SKIP  - 任意已选叶子
// ==========================================
// 单步局部搜索,到达局部最优即停止;对自身输出再次运行不会产生变化
// ==========================================

use crate::domain::part::Part;
use crate::domain::selection::SelectionPlan;
use crate::domain::types::PartMode;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// 一次候选移除（比较键: 新误差 -> 移除分数 -> 方案序号 -> 叶子序号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Removal {
    new_error: u64,
    marks: u32,
    plan_index: usize,
    leaf_index: usize,
}

// ==========================================
// SelectionPruner - 剪枝引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct SelectionPruner {
    part_mode: PartMode,
    min_parts: usize,
    protected: BTreeSet<String>,
}

impl SelectionPruner {
    pub fn new(part_mode: PartMode) -> Self {
        Self {
            part_mode,
            min_parts: 1,
            protected: BTreeSet::new(),
        }
    }

    /// 每个方案至少保留的叶子数（小于 1 按 1 处理）
    pub fn with_min_parts(mut self, min_parts: usize) -> Self {
        self.min_parts = min_parts.max(1);
        self
    }

    /// 不参与剪枝的题目
    pub fn protect<I, S>(mut self, question_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(question_ids.into_iter().map(Into::into));
        self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对整组方案剪枝
    ///
    /// 每轮在全部方案的候选叶子中选出误差最小的一次移除并提交,
    /// 直到进入容差或没有任何移除能严格减小误差。
    #[instrument(skip(self, plans), fields(
        plan_count = plans.len(),
        part_mode = %self.part_mode
    ))]
    pub fn prune_selection<'q>(
        &self,
        plans: Vec<SelectionPlan<'q>>,
        target_marks: u32,
        tolerance: u32,
    ) -> Vec<SelectionPlan<'q>> {
        let mut plans = plans;
        let mut total: i64 = plans.iter().map(|p| i64::from(p.marks())).sum();
        let target = i64::from(target_marks);
        let mut removed = 0usize;

        loop {
            let error = total.abs_diff(target);
            if error <= u64::from(tolerance) {
                break;
            }

            let mut best: Option<Removal> = None;
            for (plan_index, plan) in plans.iter().enumerate() {
                if self.protected.contains(plan.question_id()) {
                    continue;
                }
                for (leaf_index, leaf) in self.removal_candidates(plan) {
                    let marks = leaf.marks().value;
                    let new_error = (total - i64::from(marks)).abs_diff(target);
                    if new_error >= error {
                        continue;
                    }
                    let candidate = Removal {
                        new_error,
                        marks,
                        plan_index,
                        leaf_index,
                    };
                    if best.map_or(true, |b| candidate < b) {
                        best = Some(candidate);
                    }
                }
            }

            let Some(removal) = best else {
                break;
            };
            let plan = &plans[removal.plan_index];
            let leaves = plan.included_leaves();
            let label = leaves[removal.leaf_index].label();
            debug!(
                question_id = %plan.question_id(),
                label = %label,
                marks = removal.marks,
                new_error = removal.new_error,
                "剪除叶子"
            );
            let updated = plan.without(label);
            plans[removal.plan_index] = updated;
            total -= i64::from(removal.marks);
            removed += 1;
        }

        debug!(removed, total_marks = total, "剪枝完成");
        plans
    }

    /// 单方案剪枝（不看容差,直到局部最优）
    pub fn prune_to_target<'q>(&self, plan: SelectionPlan<'q>, target_marks: u32) -> SelectionPlan<'q> {
        let mut plan = plan;
        let target = i64::from(target_marks);

        loop {
            let total = i64::from(plan.marks());
            let error = total.abs_diff(target);

            let best = self
                .removal_candidates(&plan)
                .into_iter()
                .map(|(leaf_index, leaf)| Removal {
                    new_error: (total - i64::from(leaf.marks().value)).abs_diff(target),
                    marks: leaf.marks().value,
                    plan_index: 0,
                    leaf_index,
                })
                .filter(|r| r.new_error < error)
                .min();

            match best {
                Some(removal) => {
                    let leaves = plan.included_leaves();
                    plan = plan.without(leaves[removal.leaf_index].label());
                }
                None => return plan,
            }
        }
    }

    /// 当前结构模式下可移除的叶子（序号为已选叶子中的位置）
    fn removal_candidates<'q>(&self, plan: &SelectionPlan<'q>) -> Vec<(usize, &'q Part)> {
        if plan.part_count() <= self.min_parts {
            return Vec::new();
        }
        let leaves = plan.included_leaves();
        match self.part_mode {
            PartMode::All => Vec::new(),
            PartMode::Prune => leaves
                .last()
                .map(|leaf| vec![(leaves.len() - 1, *leaf)])
                .unwrap_or_default(),
            PartMode::Skip => leaves.into_iter().enumerate().collect(),
        }
    }
}

/// 便捷函数: 整组剪枝
pub fn prune_selection<'q>(
    plans: Vec<SelectionPlan<'q>>,
    target_marks: u32,
    tolerance: u32,
    part_mode: PartMode,
) -> Vec<SelectionPlan<'q>> {
    SelectionPruner::new(part_mode).prune_selection(plans, target_marks, tolerance)
}

/// 便捷函数: 单方案剪枝
pub fn prune_to_target<'q>(
    plan: SelectionPlan<'q>,
    target_marks: u32,
    min_parts: usize,
    part_mode: PartMode,
) -> SelectionPlan<'q> {
    SelectionPruner::new(part_mode)
        .with_min_parts(min_parts)
        .prune_to_target(plan, target_marks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bounds::SliceBounds;
    use crate::domain::marks::Marks;
    use crate::domain::question::Question;
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
        let root = Part::branch("1", PartKind::Question, SliceBounds::rows(0, 2000).unwrap(), children).unwrap();
        Question::new(id, "0478", 2021, 1, 1, "T", root).unwrap()
    }

    #[test]
    fn test_prune_mode_only_removes_tail() {
        // 1 + 9 + 1 = 11, target 2: SKIP 可移除 9,PRUNE 只能从尾部移除
        let q = question("q1", &[1, 9, 1]);
        let plans = vec![SelectionPlan::full_question(&q)];
        let pruned = prune_selection(plans, 2, 0, PartMode::Prune);
        assert_eq!(pruned[0].labels_for_test(), vec!["1(a)"]);

        let plans = vec![SelectionPlan::full_question(&q)];
        let pruned = prune_selection(plans, 2, 0, PartMode::Skip);
        assert_eq!(pruned[0].labels_for_test(), vec!["1(a)", "1(c)"]);
    }

    #[test]
    fn test_all_mode_never_prunes() {
        let q = question("q1", &[10, 1]);
        let pruned = prune_selection(vec![SelectionPlan::full_question(&q)], 10, 0, PartMode::All);
        assert_eq!(pruned[0].marks(), 11);
    }

    #[test]
    fn test_protected_plan_untouched() {
        let q = question("pinned", &[10, 1]);
        let pruned = SelectionPruner::new(PartMode::Skip)
            .protect(["pinned"])
            .prune_selection(vec![SelectionPlan::full_question(&q)], 10, 0);
        assert_eq!(pruned[0].marks(), 11);
    }

    #[test]
    fn test_min_parts_respected() {
        let q = question("q1", &[5, 5, 5]);
        let plan = SelectionPlan::full_question(&q);
        let pruned = prune_to_target(plan, 4, 2, PartMode::Skip);
        assert_eq!(pruned.part_count(), 2);
        assert_eq!(pruned.marks(), 10);
    }

    impl SelectionPlan<'_> {
        fn labels_for_test(&self) -> Vec<&str> {
            self.included_leaves().iter().map(|p| p.label()).collect()
        }
    }
}
