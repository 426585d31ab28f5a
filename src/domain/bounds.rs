// ==========================================
// 试卷组卷系统 - 区域边界
// ==========================================
// 约定: [top, bottom) x [left, right),right 为空表示整宽
// ==========================================

use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};

/// 合成图中的矩形区域（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BoundsRecord")]
pub struct SliceBounds {
    top: u32,
    bottom: u32,
    left: u32,
    right: Option<u32>,
}

#[derive(Deserialize)]
struct BoundsRecord {
    top: u32,
    bottom: u32,
    #[serde(default)]
    left: u32,
    #[serde(default)]
    right: Option<u32>,
}

impl TryFrom<BoundsRecord> for SliceBounds {
    type Error = AssemblyError;

    fn try_from(r: BoundsRecord) -> AssemblyResult<Self> {
        SliceBounds::new(r.top, r.bottom, r.left, r.right)
    }
}

impl SliceBounds {
    /// 创建区域
    ///
    /// # 校验
    /// - bottom > top
    /// - right 为空或 right > left
    pub fn new(top: u32, bottom: u32, left: u32, right: Option<u32>) -> AssemblyResult<Self> {
        if bottom <= top {
            return Err(AssemblyError::InvalidBounds(format!(
                "bottom 必须大于 top: {} <= {}",
                bottom, top
            )));
        }
        if let Some(r) = right {
            if r <= left {
                return Err(AssemblyError::InvalidBounds(format!(
                    "right 必须大于 left: {} <= {}",
                    r, left
                )));
            }
        }
        Ok(Self {
            top,
            bottom,
            left,
            right,
        })
    }

    /// 整宽区域
    pub fn rows(top: u32, bottom: u32) -> AssemblyResult<Self> {
        Self::new(top, bottom, 0, None)
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn right(&self) -> Option<u32> {
        self.right
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// 宽度（整宽区域返回 None）
    pub fn width(&self) -> Option<u32> {
        self.right.map(|r| r - self.left)
    }

    /// 是否至少共享一行像素（相邻不算重叠）
    pub fn overlaps(&self, other: &SliceBounds) -> bool {
        !(self.bottom <= other.top || other.bottom <= self.top)
    }
}
