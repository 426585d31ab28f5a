// ==========================================
// 试卷组卷系统 - 切片编排
// ==========================================
// 职责: 把选题结果展开为有序的切片描述（只含元数据,不裁剪像素）
// 顺序: [题号标题] -> 每个叶子前尚未输出的上下文 -> 叶子
// ==========================================

use crate::config::LayoutConfig;
use crate::domain::layout::{SliceAsset, CONTEXT_SUFFIX, HEADER_LABEL};
use crate::domain::part::Part;
use crate::domain::selection::{SelectionPlan, SelectionResult};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

pub struct SliceComposer {
    // 无状态引擎
}

impl Default for SliceComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl SliceComposer {
    pub fn new() -> Self {
        Self {}
    }

    /// 编排整份试卷的切片
    #[instrument(skip(self, result, config), fields(plans = result.question_count()))]
    pub fn compose_slices(
        &self,
        result: &SelectionResult<'_>,
        config: &LayoutConfig,
        show_headers: bool,
    ) -> Vec<SliceAsset> {
        let mut assets = Vec::new();
        for plan in result.plans() {
            if show_headers {
                assets.push(Self::header_asset(plan, config));
            }
            assets.extend(self.compose_question(plan, config));
        }
        debug!(assets = assets.len(), "切片编排完成");
        assets
    }

    /// 编排单题切片（不含题号标题）
    pub fn compose_question(&self, plan: &SelectionPlan<'_>, config: &LayoutConfig) -> Vec<SliceAsset> {
        let question = plan.question();
        let mut assets = Vec::new();
        let mut emitted: BTreeSet<&str> = BTreeSet::new();
        let mut emitted_tops: BTreeSet<u32> = BTreeSet::new();

        for leaf in plan.included_leaves() {
            let contexts = question.context_parts_for(leaf.label());

            for ctx in contexts.iter().copied() {
                let Some(bounds) = ctx.context_bounds() else {
                    continue;
                };
                if emitted.contains(ctx.label()) {
                    continue;
                }
                emitted.insert(ctx.label());
                if !emitted_tops.insert(bounds.top()) {
                    debug!(label = %ctx.label(), top = bounds.top(), "上下文与已输出上下文同起点,跳过");
                    continue;
                }
                let label = format!("{}{}", ctx.label(), CONTEXT_SUFFIX);
                assets.push(SliceAsset {
                    question_id: question.id().to_string(),
                    image: Some(Self::image_ref(plan, &label)),
                    part_label: label,
                    width: Self::capped_width(bounds.width(), config),
                    height: bounds.height(),
                    marks: 0,
                    is_text_header: false,
                    header_text: None,
                });
            }

            if Self::covered_by_context(leaf, &contexts) {
                debug!(label = %leaf.label(), "叶子与上级上下文同起点,由上下文覆盖");
                continue;
            }

            assets.push(SliceAsset {
                question_id: question.id().to_string(),
                part_label: leaf.label().to_string(),
                image: Some(Self::image_ref(plan, leaf.label())),
                width: Self::capped_width(leaf.bounds().width(), config),
                height: leaf.bounds().height(),
                marks: leaf.marks().value,
                is_text_header: false,
                header_text: None,
            });
        }

        assets
    }

    fn header_asset(plan: &SelectionPlan<'_>, config: &LayoutConfig) -> SliceAsset {
        SliceAsset {
            question_id: plan.question_id().to_string(),
            part_label: HEADER_LABEL.to_string(),
            image: None,
            width: config.available_width(),
            height: config.header_height(),
            marks: plan.marks(),
            is_text_header: true,
            header_text: Some(plan.question_id().to_string()),
        }
    }

    /// 叶子起点与最近的上下文起点相同
    fn covered_by_context(leaf: &Part, contexts: &[&Part]) -> bool {
        contexts
            .last()
            .and_then(|parent| parent.context_bounds())
            .map(|cb| cb.top() == leaf.bounds().top())
            .unwrap_or(false)
    }

    fn capped_width(width: Option<u32>, config: &LayoutConfig) -> u32 {
        let available = config.available_width();
        width.map(|w| w.min(available)).unwrap_or(available)
    }

    fn image_ref(plan: &SelectionPlan<'_>, label: &str) -> String {
        format!("{}#{}", plan.question().composite_path().display(), label)
    }
}

/// 便捷函数: 编排切片
pub fn compose_slices(
    result: &SelectionResult<'_>,
    config: &LayoutConfig,
    show_headers: bool,
) -> Vec<SliceAsset> {
    SliceComposer::new().compose_slices(result, config, show_headers)
}
