// ==========================================
// 试卷组卷系统 - 小题准入判定
// ==========================================
// 职责: 按知识点 / 关键词标签计算题目的可选叶子序列
// 红线: 纯函数,无状态、无副作用
// ==========================================
// 结构模式对准入序列的影响:
//   ALL   - 准入只决定题目是否入选,选项始终为全部叶子
//   PRUNE - 准入序列截至最后一个命中叶子（保持前缀连续）
//   SKIP  - 准入序列即命中叶子本身
// ==========================================

use crate::domain::part::Part;
use crate::domain::question::Question;
use crate::domain::types::PartMode;
use std::collections::BTreeSet;

// ==========================================
// LeafFilter - 叶子过滤条件
// ==========================================
#[derive(Debug, Clone, Copy)]
pub enum LeafFilter<'a> {
    /// 不过滤
    Any,
    /// 叶子的有效知识点在集合内
    Topics(&'a BTreeSet<String>),
    /// 叶子标签在集合内（集合已展开为叶子标签）
    Labels(&'a BTreeSet<String>),
}

impl<'a> LeafFilter<'a> {
    /// 由可选知识点集合构造（None 即不过滤）
    pub fn from_topics(topics: Option<&'a BTreeSet<String>>) -> Self {
        match topics {
            Some(set) => LeafFilter::Topics(set),
            None => LeafFilter::Any,
        }
    }

    pub fn accepts(&self, question: &Question, leaf: &Part) -> bool {
        match self {
            LeafFilter::Any => true,
            LeafFilter::Topics(topics) => question
                .resolve_topic(leaf.label())
                .map(|t| topics.contains(t))
                .unwrap_or(false),
            LeafFilter::Labels(labels) => labels.contains(leaf.label()),
        }
    }
}

/// 命中过滤条件的叶子（文档顺序）
pub fn matching_leaves<'q>(question: &'q Question, filter: &LeafFilter<'_>) -> Vec<&'q Part> {
    question
        .leaf_parts()
        .into_iter()
        .filter(|leaf| filter.accepts(question, leaf))
        .collect()
}

/// 题目是否进入候选
///
/// 知识点过滤在题目级别判断: 题目知识点或任一小题（含非叶子）声明的知识点命中即可。
/// 其余过滤条件要求至少一个叶子命中。
pub fn is_question_eligible(question: &Question, filter: &LeafFilter<'_>) -> bool {
    match filter {
        LeafFilter::Topics(topics) => {
            topics.contains(question.topic())
                || question
                    .all_parts()
                    .iter()
                    .filter_map(|part| part.topic())
                    .any(|topic| topics.contains(topic))
        }
        LeafFilter::Any | LeafFilter::Labels(_) => question
            .leaf_parts()
            .iter()
            .any(|leaf| filter.accepts(question, leaf)),
    }
}

/// 结构模式下的准入叶子序列
///
/// # 规则
/// - ALL + 知识点过滤: 全部叶子（知识点只在题目级别生效）
/// - ALL + 标签过滤: 命中叶子
/// - PRUNE: 从第一个叶子到最后一个命中叶子
/// - SKIP: 命中叶子
pub fn eligible_leaves<'q>(
    question: &'q Question,
    part_mode: PartMode,
    filter: &LeafFilter<'_>,
) -> Vec<&'q Part> {
    let leaves = question.leaf_parts();
    match part_mode {
        PartMode::All => match filter {
            LeafFilter::Labels(_) => matching_leaves(question, filter),
            LeafFilter::Any | LeafFilter::Topics(_) => leaves,
        },
        PartMode::Prune => {
            let last_hit = leaves
                .iter()
                .rposition(|leaf| filter.accepts(question, leaf));
            match last_hit {
                Some(idx) => leaves[..=idx].to_vec(),
                None => Vec::new(),
            }
        }
        PartMode::Skip => matching_leaves(question, filter),
    }
}

/// 把任意层级的标签展开为叶子标签（未知标签忽略）
pub fn expand_to_leaf_labels<S: AsRef<str>>(
    question: &Question,
    labels: impl IntoIterator<Item = S>,
) -> BTreeSet<String> {
    labels
        .into_iter()
        .flat_map(|label| question.leaves_under(label.as_ref()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bounds::SliceBounds;
    use crate::domain::marks::Marks;
    use crate::domain::types::PartKind;

    /// 1(a) Algebra, 1(b) Geometry, 1(c) Algebra, 1(d) 默认 Number
    fn question() -> Question {
        let topics = [Some("Algebra"), Some("Geometry"), Some("Algebra"), None];
        let children = topics
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                let top = (i as u32) * 100 + 10;
                let leaf = Part::leaf(
                    format!("1({})", (b'a' + i as u8) as char),
                    PartKind::Letter,
                    Marks::explicit(2),
                    SliceBounds::rows(top, top + 80).unwrap(),
                );
                match topic {
                    Some(t) => leaf.with_topic(*t),
                    None => leaf,
                }
            })
            .collect();
        let root = Part::branch("1", PartKind::Question, SliceBounds::rows(0, 500).unwrap(), children).unwrap();
        Question::new("q1", "0580", 2022, 2, 1, "Number", root).unwrap()
    }

    fn labels(leaves: &[&Part]) -> Vec<String> {
        leaves.iter().map(|p| p.label().to_string()).collect()
    }

    #[test]
    fn test_skip_keeps_only_matching_leaves() {
        let q = question();
        let topics: BTreeSet<String> = ["Algebra".to_string()].into();
        let leaves = eligible_leaves(&q, PartMode::Skip, &LeafFilter::Topics(&topics));
        assert_eq!(labels(&leaves), vec!["1(a)", "1(c)"]);
    }

    #[test]
    fn test_prune_keeps_prefix_to_last_match() {
        let q = question();
        let topics: BTreeSet<String> = ["Algebra".to_string()].into();
        let leaves = eligible_leaves(&q, PartMode::Prune, &LeafFilter::Topics(&topics));
        assert_eq!(labels(&leaves), vec!["1(a)", "1(b)", "1(c)"]);
    }

    #[test]
    fn test_all_ignores_leaf_topics() {
        let q = question();
        let topics: BTreeSet<String> = ["Geometry".to_string()].into();
        let leaves = eligible_leaves(&q, PartMode::All, &LeafFilter::Topics(&topics));
        assert_eq!(leaves.len(), 4);
        assert!(is_question_eligible(&q, &LeafFilter::Topics(&topics)));

        let other: BTreeSet<String> = ["Statistics".to_string()].into();
        assert!(!is_question_eligible(&q, &LeafFilter::Topics(&other)));
    }

    #[test]
    fn test_question_level_topics_admit_question() {
        let leaf = Part::leaf("2(a)(i)", PartKind::Roman, Marks::explicit(3), SliceBounds::rows(10, 90).unwrap())
            .with_topic("Algebra");
        let branch = Part::branch("2(a)", PartKind::Letter, SliceBounds::rows(0, 100).unwrap(), vec![leaf])
            .unwrap()
            .with_topic("Vectors");
        let root = Part::branch("2", PartKind::Question, SliceBounds::rows(0, 200).unwrap(), vec![branch]).unwrap();
        let q = Question::new("q2", "0580", 2022, 2, 2, "Number", root).unwrap();

        let by_question: BTreeSet<String> = ["Number".to_string()].into();
        let by_branch: BTreeSet<String> = ["Vectors".to_string()].into();
        let unrelated: BTreeSet<String> = ["Statistics".to_string()].into();
        assert!(is_question_eligible(&q, &LeafFilter::Topics(&by_question)));
        assert!(is_question_eligible(&q, &LeafFilter::Topics(&by_branch)));
        assert!(!is_question_eligible(&q, &LeafFilter::Topics(&unrelated)));
        assert!(eligible_leaves(&q, PartMode::Skip, &LeafFilter::Topics(&by_question)).is_empty());
    }

    #[test]
    fn test_inherited_topic_matches() {
        let q = question();
        let topics: BTreeSet<String> = ["Number".to_string()].into();
        let leaves = eligible_leaves(&q, PartMode::Skip, &LeafFilter::Topics(&topics));
        assert_eq!(labels(&leaves), vec!["1(d)"]);
    }

    #[test]
    fn test_expand_parent_label() {
        let q = question();
        let expanded = expand_to_leaf_labels(&q, ["1", "9(z)"]);
        assert_eq!(expanded.len(), 4);
    }
}
