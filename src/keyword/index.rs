// ==========================================
// 试卷组卷系统 - 关键词索引
// ==========================================
// 职责: 在题干/小题文本中检索关键词,产出 question_id -> 叶子标签
// 匹配:
//   模糊 - 小写化并去掉空白后做子串匹配（binary 命中 binary123）
//   精确 - 带引号的词（"stack"）,按单词边界、忽略大小写
// 红线: 题干命中 = 全部叶子命中;小题命中 = 该小题下的叶子命中
// ==========================================

use crate::domain::question::Question;
use crate::error::{AssemblyError, AssemblyResult};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// 模糊匹配的文本归一化: 小写 + 去空白
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ==========================================
// KeywordTerm - 解析后的检索词
// ==========================================
#[derive(Debug, Clone)]
pub enum KeywordTerm {
    Fuzzy(String),
    Exact(Regex),
}

impl KeywordTerm {
    /// 解析检索词,空白词返回 None
    pub fn parse(raw: &str) -> AssemblyResult<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            let inner = raw[1..raw.len() - 1].trim();
            if inner.is_empty() {
                return Ok(None);
            }
            let pattern = format!(r"(?i)\b{}\b", regex::escape(inner));
            let regex = Regex::new(&pattern)
                .map_err(|e| AssemblyError::InvalidKeyword(format!("{}: {}", raw, e)))?;
            return Ok(Some(KeywordTerm::Exact(regex)));
        }

        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Ok(None);
        }
        Ok(Some(KeywordTerm::Fuzzy(normalized)))
    }

    fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self {
            KeywordTerm::Fuzzy(term) => normalize(text).contains(term.as_str()),
            KeywordTerm::Exact(regex) => regex.is_match(text),
        }
    }
}

// ==========================================
// KeywordEntry - 单题索引项
// ==========================================
#[derive(Debug, Clone)]
struct KeywordEntry {
    root_text: String,
    /// 小题标签 -> 文本
    part_texts: BTreeMap<String, String>,
    /// 小题标签 -> 其下叶子标签
    leaves_under: BTreeMap<String, BTreeSet<String>>,
    all_leaves: BTreeSet<String>,
}

impl KeywordEntry {
    fn build(question: &Question) -> Self {
        let part_texts: BTreeMap<String, String> = question
            .child_text()
            .iter()
            .filter(|(label, text)| !text.trim().is_empty() && question.find_part(label).is_some())
            .map(|(label, text)| (label.clone(), text.clone()))
            .collect();
        let leaves_under = part_texts
            .keys()
            .map(|label| {
                let leaves = question
                    .leaves_under(label)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (label.clone(), leaves)
            })
            .collect();
        Self {
            root_text: question.root_text().to_string(),
            part_texts,
            leaves_under,
            all_leaves: question.leaf_labels().into_iter().map(str::to_string).collect(),
        }
    }

    /// 命中的叶子标签
    fn matched_leaves(&self, term: &KeywordTerm) -> BTreeSet<String> {
        if term.matches(&self.root_text) {
            return self.all_leaves.clone();
        }
        self.part_texts
            .iter()
            .filter(|(_, text)| term.matches(text))
            .filter_map(|(label, _)| self.leaves_under.get(label))
            .flatten()
            .cloned()
            .collect()
    }
}

// ==========================================
// KeywordSearchResult - 检索结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordSearchResult {
    /// 检索词 -> 命中题目
    pub keyword_hits: BTreeMap<String, BTreeSet<String>>,
    /// 检索词 -> (题目 -> 命中叶子)
    pub keyword_label_hits: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    /// 题目 -> 全部检索词命中叶子的并集（直接用作 keyword_matched_labels）
    pub aggregate_labels: BTreeMap<String, BTreeSet<String>>,
}

impl KeywordSearchResult {
    pub fn question_ids(&self) -> BTreeSet<&str> {
        self.aggregate_labels.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregate_labels.is_empty()
    }
}

// ==========================================
// KeywordIndex - 关键词索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: BTreeMap<String, KeywordEntry>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以题库重建索引（清空旧索引）
    pub fn prime(&mut self, questions: &[Question]) {
        self.entries = questions
            .iter()
            .map(|q| (q.id().to_string(), KeywordEntry::build(q)))
            .collect();
        info!(questions = self.entries.len(), "关键词索引已建立");
    }

    pub fn question_count(&self) -> usize {
        self.entries.len()
    }

    /// 检索
    ///
    /// # 错误
    /// 精确词无法编译为正则时返回 `InvalidKeyword`
    pub fn search<S: AsRef<str>>(&self, keywords: &[S]) -> AssemblyResult<KeywordSearchResult> {
        let mut result = KeywordSearchResult::default();

        for keyword in keywords {
            let raw_keyword = keyword.as_ref().trim();
            let Some(term) = KeywordTerm::parse(raw_keyword)? else {
                continue;
            };

            let per_keyword: BTreeMap<String, BTreeSet<String>> = self
                .entries
                .iter()
                .filter_map(|(id, entry)| {
                    let leaves = entry.matched_leaves(&term);
                    (!leaves.is_empty()).then(|| (id.clone(), leaves))
                })
                .collect();
            debug!(keyword = %raw_keyword, hits = per_keyword.len(), "关键词检索");

            for (id, labels) in &per_keyword {
                result
                    .aggregate_labels
                    .entry(id.clone())
                    .or_default()
                    .extend(labels.iter().cloned());
            }
            result
                .keyword_hits
                .insert(raw_keyword.to_string(), per_keyword.keys().cloned().collect());
            result
                .keyword_label_hits
                .insert(raw_keyword.to_string(), per_keyword);
        }

        Ok(result)
    }
}
