// ==========================================
// 试卷组卷系统 - 排版配置
// ==========================================
// 默认: A4 @ 200 DPI = 1654 x 2339 像素
// 红线: 页边距不得超出页面尺寸,构造时校验
// ==========================================

use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_WIDTH_PX: u32 = 1654;
pub const DEFAULT_PAGE_HEIGHT_PX: u32 = 2339;
pub const DEFAULT_DPI: u32 = 200;

/// 排版配置（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutConfigRecord")]
pub struct LayoutConfig {
    page_width: u32,
    page_height: u32,
    dpi: u32,
    margin_top: u32,
    margin_bottom: u32,
    margin_left: u32,
    margin_right: u32,
    inter_question_spacing: u32,
    inter_part_spacing: u32,
    context_child_spacing: u32,
    header_spacing: u32,
    header_height: u32,
}

#[derive(Deserialize)]
#[serde(default)]
struct LayoutConfigRecord {
    page_width: u32,
    page_height: u32,
    dpi: u32,
    margin_top: u32,
    margin_bottom: u32,
    margin_left: u32,
    margin_right: u32,
    inter_question_spacing: u32,
    inter_part_spacing: u32,
    context_child_spacing: u32,
    header_spacing: u32,
    header_height: u32,
}

impl Default for LayoutConfigRecord {
    fn default() -> Self {
        let b = LayoutConfigBuilder::new();
        Self {
            page_width: b.page_width,
            page_height: b.page_height,
            dpi: b.dpi,
            margin_top: b.margin_top,
            margin_bottom: b.margin_bottom,
            margin_left: b.margin_left,
            margin_right: b.margin_right,
            inter_question_spacing: b.inter_question_spacing,
            inter_part_spacing: b.inter_part_spacing,
            context_child_spacing: b.context_child_spacing,
            header_spacing: b.header_spacing,
            header_height: b.header_height,
        }
    }
}

impl TryFrom<LayoutConfigRecord> for LayoutConfig {
    type Error = AssemblyError;

    fn try_from(r: LayoutConfigRecord) -> AssemblyResult<Self> {
        LayoutConfigBuilder {
            page_width: r.page_width,
            page_height: r.page_height,
            dpi: r.dpi,
            margin_top: r.margin_top,
            margin_bottom: r.margin_bottom,
            margin_left: r.margin_left,
            margin_right: r.margin_right,
            inter_question_spacing: r.inter_question_spacing,
            inter_part_spacing: r.inter_part_spacing,
            context_child_spacing: r.context_child_spacing,
            header_spacing: r.header_spacing,
            header_height: r.header_height,
        }
        .build()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        // 默认值恒满足校验
        Self {
            page_width: DEFAULT_PAGE_WIDTH_PX,
            page_height: DEFAULT_PAGE_HEIGHT_PX,
            dpi: DEFAULT_DPI,
            margin_top: 40,
            margin_bottom: 40,
            margin_left: 50,
            margin_right: 50,
            inter_question_spacing: 40,
            inter_part_spacing: 20,
            context_child_spacing: 20,
            header_spacing: 10,
            header_height: 60,
        }
    }
}

impl LayoutConfig {
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }

    pub fn page_width(&self) -> u32 {
        self.page_width
    }

    pub fn page_height(&self) -> u32 {
        self.page_height
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn margin_top(&self) -> u32 {
        self.margin_top
    }

    pub fn margin_bottom(&self) -> u32 {
        self.margin_bottom
    }

    pub fn margin_left(&self) -> u32 {
        self.margin_left
    }

    pub fn margin_right(&self) -> u32 {
        self.margin_right
    }

    pub fn inter_question_spacing(&self) -> u32 {
        self.inter_question_spacing
    }

    /// 同页相邻排版单元之间的间距
    pub fn inter_part_spacing(&self) -> u32 {
        self.inter_part_spacing
    }

    /// 原子组内 上下文 -> 子题 的间距
    pub fn context_child_spacing(&self) -> u32 {
        self.context_child_spacing
    }

    /// 原子组内 题号标题 -> 后续切片 的间距
    pub fn header_spacing(&self) -> u32 {
        self.header_spacing
    }

    /// 文本题号标题的高度
    pub fn header_height(&self) -> u32 {
        self.header_height
    }

    pub fn available_width(&self) -> u32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn available_height(&self) -> u32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    /// 内容区底边（page_height - margin_bottom）
    pub fn page_bottom(&self) -> u32 {
        self.page_height - self.margin_bottom
    }
}

// ==========================================
// LayoutConfigBuilder
// ==========================================

#[derive(Debug, Clone)]
pub struct LayoutConfigBuilder {
    page_width: u32,
    page_height: u32,
    dpi: u32,
    margin_top: u32,
    margin_bottom: u32,
    margin_left: u32,
    margin_right: u32,
    inter_question_spacing: u32,
    inter_part_spacing: u32,
    context_child_spacing: u32,
    header_spacing: u32,
    header_height: u32,
}

impl Default for LayoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        let d = LayoutConfig::default();
        Self {
            page_width: d.page_width,
            page_height: d.page_height,
            dpi: d.dpi,
            margin_top: d.margin_top,
            margin_bottom: d.margin_bottom,
            margin_left: d.margin_left,
            margin_right: d.margin_right,
            inter_question_spacing: d.inter_question_spacing,
            inter_part_spacing: d.inter_part_spacing,
            context_child_spacing: d.context_child_spacing,
            header_spacing: d.header_spacing,
            header_height: d.header_height,
        }
    }

    pub fn page_size(mut self, width: u32, height: u32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// 上 / 下 / 左 / 右 页边距
    pub fn margins(mut self, top: u32, bottom: u32, left: u32, right: u32) -> Self {
        self.margin_top = top;
        self.margin_bottom = bottom;
        self.margin_left = left;
        self.margin_right = right;
        self
    }

    pub fn inter_question_spacing(mut self, px: u32) -> Self {
        self.inter_question_spacing = px;
        self
    }

    pub fn inter_part_spacing(mut self, px: u32) -> Self {
        self.inter_part_spacing = px;
        self
    }

    pub fn context_child_spacing(mut self, px: u32) -> Self {
        self.context_child_spacing = px;
        self
    }

    pub fn header_spacing(mut self, px: u32) -> Self {
        self.header_spacing = px;
        self
    }

    pub fn header_height(mut self, px: u32) -> Self {
        self.header_height = px;
        self
    }

    /// 校验并生成配置
    pub fn build(self) -> AssemblyResult<LayoutConfig> {
        if self.page_width == 0 || self.page_height == 0 {
            return Err(AssemblyError::InvalidPageSize {
                width: self.page_width,
                height: self.page_height,
            });
        }
        if u64::from(self.margin_left) + u64::from(self.margin_right) >= u64::from(self.page_width) {
            return Err(AssemblyError::MarginsExceedPage { axis: "宽度" });
        }
        if u64::from(self.margin_top) + u64::from(self.margin_bottom) >= u64::from(self.page_height) {
            return Err(AssemblyError::MarginsExceedPage { axis: "高度" });
        }

        Ok(LayoutConfig {
            page_width: self.page_width,
            page_height: self.page_height,
            dpi: self.dpi,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
            margin_right: self.margin_right,
            inter_question_spacing: self.inter_question_spacing,
            inter_part_spacing: self.inter_part_spacing,
            context_child_spacing: self.context_child_spacing,
            header_spacing: self.header_spacing,
            header_height: self.header_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a4_at_200_dpi() {
        let config = LayoutConfig::default();
        assert_eq!(config.available_width(), 1554);
        assert_eq!(config.available_height(), 2259);
        assert_eq!(config.page_bottom(), 2299);
    }

    #[test]
    fn test_margins_exceeding_page_rejected() {
        let err = LayoutConfig::builder()
            .page_size(100, 1000)
            .margins(40, 40, 50, 50)
            .build()
            .unwrap_err();
        assert!(matches!(err, AssemblyError::MarginsExceedPage { axis: "宽度" }));

        let err = LayoutConfig::builder()
            .page_size(1000, 80)
            .margins(40, 40, 0, 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AssemblyError::MarginsExceedPage { axis: "高度" }));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"page_height": 1000}"#).unwrap();
        assert_eq!(config.page_height(), 1000);
        assert_eq!(config.margin_top(), 40);
        assert_eq!(config.available_height(), 920);
    }
}
