// ==========================================
// 试卷组卷系统 - 分页引擎
// ==========================================
// 职责: 按给定顺序把切片放到固定尺寸的页面上
// 输入: SliceAsset 序列 + LayoutConfig
// 输出: LayoutResult（页面、告警、题目页码映射）
// ==========================================
// 原子组: 题号标题 / 上下文切片总是带上紧随其后的同题切片,
//         直到遇到第一个普通子题切片为止,整组不跨页
// 页面状态: { cursor_y, has_content }
//   place(group)       -> (cursor_y + 间距 + 组高, true)
//   start_next_page()  -> (margin_top, false)
// 红线: 切片定位后不再回溯;不输出空页
// ==========================================

use crate::config::LayoutConfig;
use crate::domain::layout::{LayoutResult, LayoutWarning, PagePlan, SliceAsset, SlicePlacement};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

// ==========================================
// PageState - 逐页排版状态
// ==========================================
struct PageState<'c> {
    config: &'c LayoutConfig,
    pages: Vec<PagePlan>,
    page: PagePlan,
    cursor_y: u32,
    warnings: Vec<LayoutWarning>,
    question_page_map: BTreeMap<String, Vec<usize>>,
}

impl<'c> PageState<'c> {
    fn new(config: &'c LayoutConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            page: PagePlan::new(0),
            cursor_y: config.margin_top(),
            warnings: Vec::new(),
            question_page_map: BTreeMap::new(),
        }
    }

    fn has_content(&self) -> bool {
        !self.page.is_empty()
    }

    /// 当前页剩余高度（已越界时为 0）
    fn space_left(&self) -> u32 {
        self.config.page_bottom().saturating_sub(self.cursor_y)
    }

    fn start_next_page(&mut self) {
        let next_index = self.page.index + 1;
        debug!(page_index = self.page.index, used_height = self.cursor_y - self.config.margin_top(), "换页");
        self.flush_page();
        self.page = PagePlan::new(next_index);
        self.cursor_y = self.config.margin_top();
    }

    fn flush_page(&mut self) {
        if self.page.is_empty() {
            return;
        }
        let index = self.page.index;
        let mut page = std::mem::replace(&mut self.page, PagePlan::new(index));
        page.used_height = self.cursor_y - self.config.margin_top();
        self.pages.push(page);
    }

    /// 放置一个原子组（单个切片视为长度 1 的组）
    fn place_group(&mut self, group: &[SliceAsset]) {
        let group_height = group_height(group, self.config);
        let leading = if self.has_content() {
            self.config.inter_part_spacing()
        } else {
            0
        };

        if leading + group_height > self.space_left() && self.has_content() {
            self.start_next_page();
        }

        let leading = if self.has_content() {
            self.config.inter_part_spacing()
        } else {
            0
        };
        let available = self.config.available_height();
        if !self.has_content() && group_height > available {
            self.record_overflow(group, group_height, available);
        }

        let mut y = self.cursor_y + leading;
        for (i, asset) in group.iter().enumerate() {
            if i > 0 {
                y += member_spacing(&group[i - 1], self.config);
            }
            self.page.placements.push(SlicePlacement {
                asset: asset.clone(),
                top: y,
            });
            y += asset.height;
            self.track_question(&asset.question_id);
        }
        self.cursor_y = y;
    }

    fn record_overflow(&mut self, group: &[SliceAsset], group_height: u32, available_height: u32) {
        let page_index = self.page.index;
        let warning = match group {
            [single] => LayoutWarning::AssetOverflow {
                page_index,
                question_id: single.question_id.clone(),
                part_label: single.part_label.clone(),
                height: single.height,
                available_height,
            },
            _ => LayoutWarning::GroupBleed {
                page_index,
                question_id: group
                    .first()
                    .map(|a| a.question_id.clone())
                    .unwrap_or_default(),
                group_height,
                available_height,
            },
        };
        warn!(%warning, "切片越过下边距");
        self.warnings.push(warning);
    }

    fn track_question(&mut self, question_id: &str) {
        let index = self.page.index;
        let pages = self
            .question_page_map
            .entry(question_id.to_string())
            .or_default();
        if pages.last() != Some(&index) {
            pages.push(index);
        }
    }

    fn into_result(mut self) -> LayoutResult {
        self.flush_page();
        LayoutResult {
            pages: self.pages,
            warnings: self.warnings,
            question_page_map: self.question_page_map,
        }
    }
}

/// 组内相邻切片间距（由前一个切片决定）
fn member_spacing(previous: &SliceAsset, config: &LayoutConfig) -> u32 {
    if previous.is_text_header {
        config.header_spacing()
    } else if previous.is_context() {
        config.context_child_spacing()
    } else {
        0
    }
}

/// 组高 = 切片高度之和 + 组内间距
pub fn group_height(group: &[SliceAsset], config: &LayoutConfig) -> u32 {
    let heights: u32 = group.iter().map(|a| a.height).sum();
    let spacing: u32 = group
        .windows(2)
        .map(|pair| member_spacing(&pair[0], config))
        .sum();
    heights + spacing
}

/// 从 start 开始的原子组长度
///
/// 题号标题或上下文切片会吞并下一个同题切片,链条在普通切片处结束。
pub fn atomic_group_len(assets: &[SliceAsset], start: usize) -> usize {
    let mut end = start;
    while end + 1 < assets.len() {
        let current = &assets[end];
        let next = &assets[end + 1];
        if current.question_id != next.question_id {
            break;
        }
        if !(current.is_text_header || current.is_context()) {
            break;
        }
        end += 1;
    }
    end + 1 - start
}

// ==========================================
// Paginator - 分页引擎
// ==========================================
pub struct Paginator {
    // 无状态引擎
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self {}
    }

    /// 分页
    ///
    /// 空输入返回零页结果;组在当前页放不下且当前页已有内容时换页,
    /// 在新页仍放不下时从 margin_top 开始越界放置并记录告警。
    #[instrument(skip(self, assets, config), fields(
        asset_count = assets.len(),
        page_height = config.page_height(),
        available_height = config.available_height()
    ))]
    pub fn paginate(&self, assets: &[SliceAsset], config: &LayoutConfig) -> LayoutResult {
        let mut state = PageState::new(config);

        let mut i = 0;
        while i < assets.len() {
            let len = atomic_group_len(assets, i);
            state.place_group(&assets[i..i + len]);
            i += len;
        }

        let result = state.into_result();
        info!(
            assets = assets.len(),
            pages = result.page_count(),
            warnings = result.warnings.len(),
            "分页完成"
        );
        result
    }
}

/// 便捷函数: 分页
pub fn paginate(assets: &[SliceAsset], config: &LayoutConfig) -> LayoutResult {
    Paginator::new().paginate(assets, config)
}
