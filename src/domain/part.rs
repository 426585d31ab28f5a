// ==========================================
// 试卷组卷系统 - 小题树节点
// ==========================================
// 红线: 构造后不可变,整体替换而非原地修改
// 红线: 非叶子节点 marks == aggregate(children),只在构造时校验一次
// ==========================================
// 结构:
//   Question ("1")
//   ├── Letter ("1(a)")
//   │   ├── Roman ("1(a)(i)")  [叶子]
//   │   └── Roman ("1(a)(ii)") [叶子]
//   └── Letter ("1(b)")        [叶子]
// ==========================================

use crate::domain::bounds::SliceBounds;
use crate::domain::marks::Marks;
use crate::domain::types::PartKind;
use crate::error::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};

/// 小题节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PartRecord")]
pub struct Part {
    label: String,
    kind: PartKind,
    marks: Marks,
    bounds: SliceBounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_bounds: Option<SliceBounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Part>,
}

/// 反序列化中间结构（走统一校验）
#[derive(Deserialize)]
struct PartRecord {
    label: String,
    kind: PartKind,
    marks: Marks,
    bounds: SliceBounds,
    #[serde(default)]
    context_bounds: Option<SliceBounds>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    children: Vec<Part>,
}

impl TryFrom<PartRecord> for Part {
    type Error = AssemblyError;

    fn try_from(r: PartRecord) -> AssemblyResult<Self> {
        let part = Part::with_marks(r.label, r.kind, r.marks, r.bounds, r.children)?;
        let part = match r.context_bounds {
            Some(cb) => part.with_context_bounds(cb)?,
            None => part,
        };
        Ok(match r.topic {
            Some(t) => part.with_topic(t),
            None => part,
        })
    }
}

impl Part {
    // ==========================================
    // 构造
    // ==========================================

    /// 叶子节点,分数即权威分数
    pub fn leaf(
        label: impl Into<String>,
        kind: PartKind,
        marks: Marks,
        bounds: SliceBounds,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            marks,
            bounds,
            context_bounds: None,
            topic: None,
            children: Vec::new(),
        }
    }

    /// 父节点,分数由子节点汇总得到
    pub fn branch(
        label: impl Into<String>,
        kind: PartKind,
        bounds: SliceBounds,
        children: Vec<Part>,
    ) -> AssemblyResult<Self> {
        let marks = Marks::aggregate(&children);
        Self::with_marks(label, kind, marks, bounds, children)
    }

    /// 通用构造（声明分数 + 子节点）
    ///
    /// # 校验
    /// 1. 有子节点时 marks.value 必须等于子节点汇总
    /// 2. 子节点按 bounds.top 排序且互不重叠
    pub fn with_marks(
        label: impl Into<String>,
        kind: PartKind,
        marks: Marks,
        bounds: SliceBounds,
        children: Vec<Part>,
    ) -> AssemblyResult<Self> {
        let label = label.into();

        if !children.is_empty() {
            let aggregate = Marks::aggregate(&children);
            if aggregate.value != marks.value {
                return Err(AssemblyError::MarksMismatch {
                    label,
                    declared: marks.value,
                    aggregate: aggregate.value,
                });
            }
        }

        let mut last_bottom: Option<u32> = None;
        for child in &children {
            if let Some(bottom) = last_bottom {
                if child.bounds.top() < bottom {
                    return Err(AssemblyError::ChildrenOutOfOrder { parent: label });
                }
            }
            last_bottom = Some(child.bounds.bottom());
        }

        Ok(Self {
            label,
            kind,
            marks,
            bounds,
            context_bounds: None,
            topic: None,
            children,
        })
    }

    /// 设置题干/上下文区域（罗马数字小题不允许）
    pub fn with_context_bounds(mut self, context_bounds: SliceBounds) -> AssemblyResult<Self> {
        if self.kind == PartKind::Roman {
            return Err(AssemblyError::InvalidBounds(format!(
                "罗马数字小题不应有 context_bounds: {}",
                self.label
            )));
        }
        self.context_bounds = Some(context_bounds);
        Ok(self)
    }

    /// 设置知识点（覆盖继承值）
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    // ==========================================
    // 属性
    // ==========================================

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn marks(&self) -> Marks {
        self.marks
    }

    pub fn bounds(&self) -> &SliceBounds {
        &self.bounds
    }

    pub fn context_bounds(&self) -> Option<&SliceBounds> {
        self.context_bounds.as_ref()
    }

    /// 本节点声明的知识点（不做继承解析）
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn children(&self) -> &[Part] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 子树叶子分数之和（始终计算,不缓存）
    pub fn total_marks(&self) -> u32 {
        if self.is_leaf() {
            return self.marks.value;
        }
        self.children.iter().map(Part::total_marks).sum()
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(Part::leaf_count).sum()
    }

    // ==========================================
    // 遍历
    // ==========================================

    /// 叶子节点（文档顺序）
    pub fn leaves(&self) -> Vec<&Part> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Part>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }

    /// 本节点及全部后代（先序）
    pub fn descendants(&self) -> Vec<&Part> {
        let mut out = Vec::new();
        self.collect_all(&mut out);
        out
    }

    fn collect_all<'a>(&'a self, out: &mut Vec<&'a Part>) {
        out.push(self);
        for child in &self.children {
            child.collect_all(out);
        }
    }

    /// 按标签查找子树节点
    pub fn find(&self, label: &str) -> Option<&Part> {
        if self.label == label {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(label))
    }

    /// 从本节点到目标节点的路径（含两端）
    pub fn path_to(&self, label: &str) -> Option<Vec<&Part>> {
        if self.label == label {
            return Some(vec![self]);
        }
        for child in &self.children {
            if let Some(mut path) = child.path_to(label) {
                path.insert(0, self);
                return Some(path);
            }
        }
        None
    }
}
