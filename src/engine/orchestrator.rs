// ==========================================
// 试卷组卷系统 - 引擎编排器
// ==========================================
// 主流程: 选题 -> 切片编排 -> 分页
// 用途: 协调各引擎的执行顺序,汇总结果与报告
// ==========================================

use crate::config::AssemblyProfile;
use crate::domain::layout::{LayoutResult, LayoutWarning, SliceAsset};
use crate::domain::question::Question;
use crate::domain::selection::{SelectionResult, SelectionSummary};
use crate::engine::{Paginator, QuestionSelector, SliceComposer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};

// ==========================================
// AssemblyOutcome - 组卷结果
// ==========================================

#[derive(Debug, Clone)]
pub struct AssemblyOutcome<'q> {
    // Selector 输出
    pub selection: SelectionResult<'q>,

    // Composer 输出
    pub assets: Vec<SliceAsset>,

    // Paginator 输出
    pub layout: LayoutResult,
}

impl AssemblyOutcome<'_> {
    /// 生成可序列化报告
    pub fn report(&self) -> AssemblyReport {
        AssemblyReport {
            generated_at: Utc::now(),
            selection: self.selection.summary(),
            asset_count: self.assets.len(),
            page_count: self.layout.page_count(),
            total_placements: self.layout.total_placements(),
            layout_warnings: self.layout.warnings.clone(),
            question_page_map: self.layout.question_page_map.clone(),
        }
    }
}

/// 组卷报告
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    pub generated_at: DateTime<Utc>,
    pub selection: SelectionSummary,
    pub asset_count: usize,
    pub page_count: usize,
    pub total_placements: usize,
    pub layout_warnings: Vec<LayoutWarning>,
    pub question_page_map: BTreeMap<String, Vec<usize>>,
}

// ==========================================
// AssemblyOrchestrator - 引擎编排器
// ==========================================

pub struct AssemblyOrchestrator {
    selector: QuestionSelector,
    composer: SliceComposer,
    paginator: Paginator,
}

impl Default for AssemblyOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyOrchestrator {
    pub fn new() -> Self {
        Self {
            selector: QuestionSelector::new(),
            composer: SliceComposer::new(),
            paginator: Paginator::new(),
        }
    }

    /// 执行完整组卷流程
    #[instrument(skip(self, questions, profile), fields(pool_size = questions.len()))]
    pub fn run<'q>(&self, questions: &'q [Question], profile: &AssemblyProfile) -> AssemblyOutcome<'q> {
        // === 步骤 1: 选题 ===
        let selection = self.selector.select(questions, &profile.selection);
        info!(
            questions = selection.question_count(),
            total_marks = selection.total_marks(),
            "步骤 1/3 选题完成"
        );

        // === 步骤 2: 切片编排 ===
        let assets = self
            .composer
            .compose_slices(&selection, &profile.layout, profile.show_question_headers);
        info!(assets = assets.len(), "步骤 2/3 切片编排完成");

        // === 步骤 3: 分页 ===
        let layout = self.paginator.paginate(&assets, &profile.layout);
        info!(pages = layout.page_count(), "步骤 3/3 分页完成");

        AssemblyOutcome {
            selection,
            assets,
            layout,
        }
    }
}
