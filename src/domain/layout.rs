// ==========================================
// 试卷组卷系统 - 排版领域模型
// ==========================================
// 排版引擎只读取宽高与顺序元数据,从不接触像素
// 坐标单位: 像素,原点为页面左上角
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 上下文切片标签后缀
pub const CONTEXT_SUFFIX: &str = "_context";

/// 题号标题切片标签
pub const HEADER_LABEL: &str = "__header__";

// ==========================================
// SliceAsset - 待排版切片
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceAsset {
    pub question_id: String,
    pub part_label: String,
    /// 外部图片引用（不透明）
    #[serde(default)]
    pub image: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub marks: u32,
    #[serde(default)]
    pub is_text_header: bool,
    /// 题号标题文本（仅 is_text_header 时有值）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
}

impl SliceAsset {
    /// 是否为上下文切片（题干/父题说明）
    pub fn is_context(&self) -> bool {
        self.part_label.ends_with(CONTEXT_SUFFIX)
    }
}

// ==========================================
// SlicePlacement - 已定位切片
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlicePlacement {
    pub asset: SliceAsset,
    pub top: u32,
}

impl SlicePlacement {
    pub fn bottom(&self) -> u32 {
        self.top + self.asset.height
    }
}

// ==========================================
// PagePlan - 单页
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagePlan {
    pub index: usize,
    pub placements: Vec<SlicePlacement>,
    /// 内容占用高度（不含上边距,含切片间距）
    pub used_height: u32,
}

impl PagePlan {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            placements: Vec::new(),
            used_height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// 最下方切片的底边
    pub fn content_bottom(&self) -> Option<u32> {
        self.placements.iter().map(SlicePlacement::bottom).max()
    }
}

// ==========================================
// LayoutWarning - 排版告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutWarning {
    /// 原子组高于可用高度,整组放在新页顶部并越过下边距
    GroupBleed {
        page_index: usize,
        question_id: String,
        group_height: u32,
        available_height: u32,
    },
    /// 单个切片高于可用高度
    AssetOverflow {
        page_index: usize,
        question_id: String,
        part_label: String,
        height: u32,
        available_height: u32,
    },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::GroupBleed {
                page_index,
                question_id,
                group_height,
                available_height,
            } => write!(
                f,
                "第 {} 页: 题目 {} 的原子组高 {}px,超出可用高度 {}px",
                page_index + 1,
                question_id,
                group_height,
                available_height
            ),
            LayoutWarning::AssetOverflow {
                page_index,
                question_id,
                part_label,
                height,
                available_height,
            } => write!(
                f,
                "第 {} 页: 切片 {}/{} 高 {}px,超出可用高度 {}px",
                page_index + 1,
                question_id,
                part_label,
                height,
                available_height
            ),
        }
    }
}

// ==========================================
// LayoutResult - 排版结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutResult {
    pub pages: Vec<PagePlan>,
    pub warnings: Vec<LayoutWarning>,
    /// 题目 ID -> 出现的页码（升序、去重）
    pub question_page_map: BTreeMap<String, Vec<usize>>,
}

impl LayoutResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn total_placements(&self) -> usize {
        self.pages.iter().map(|p| p.placements.len()).sum()
    }

    pub fn pages_for(&self, question_id: &str) -> &[usize] {
        self.question_page_map
            .get(question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
