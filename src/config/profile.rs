// ==========================================
// 试卷组卷系统 - 组卷方案（文件持久化）
// ==========================================
// 格式: JSON（选题配置 + 排版配置 + 展示选项）
// 读取时走与构建器相同的校验
// ==========================================

use crate::config::layout_config::LayoutConfig;
use crate::config::selection_config::SelectionConfig;
use crate::error::AssemblyResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// 组卷方案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyProfile {
    pub selection: SelectionConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    /// 是否为每道题生成文本题号标题
    #[serde(default = "default_show_headers")]
    pub show_question_headers: bool,
}

fn default_show_headers() -> bool {
    true
}

impl AssemblyProfile {
    /// 默认排版 + 显示题号
    pub fn new(selection: SelectionConfig) -> Self {
        Self {
            selection,
            layout: LayoutConfig::default(),
            show_question_headers: true,
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_question_headers(mut self, show: bool) -> Self {
        self.show_question_headers = show;
        self
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> AssemblyResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let profile: AssemblyProfile = serde_json::from_str(&text)?;
        info!(
            path = %path.display(),
            target_marks = profile.selection.target_marks(),
            part_mode = %profile.selection.part_mode(),
            "组卷方案已加载"
        );
        Ok(profile)
    }

    /// 保存为 JSON 文件（格式化输出）
    pub fn save(&self, path: impl AsRef<Path>) -> AssemblyResult<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        debug!(path = %path.display(), "组卷方案已保存");
        Ok(())
    }
}
