// ==========================================
// 试卷组卷系统 - 命令行入口
// ==========================================
// 用法:
//   exam-assembly <questions.json> [profile.json]
//
// 未提供组卷方案时,使用默认排版与默认目标分数
// 输出: 组卷报告（JSON）写到标准输出
// ==========================================

use anyhow::{bail, Context, Result};
use exam_assembly::logging;
use exam_assembly::{AssemblyOrchestrator, AssemblyProfile, Question, SelectionConfig};
use std::fs;
use tracing::info;

const DEFAULT_TARGET_MARKS: i64 = 50;

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(questions_path) = args.next() else {
        bail!("用法: exam-assembly <questions.json> [profile.json]");
    };

    let text = fs::read_to_string(&questions_path)
        .with_context(|| format!("读取题库失败: {}", questions_path))?;
    let questions: Vec<Question> =
        serde_json::from_str(&text).with_context(|| format!("解析题库失败: {}", questions_path))?;
    info!(path = %questions_path, questions = questions.len(), "题库已加载");

    let profile = match args.next() {
        Some(path) => AssemblyProfile::load(&path).with_context(|| format!("加载组卷方案失败: {}", path))?,
        None => AssemblyProfile::new(SelectionConfig::builder(DEFAULT_TARGET_MARKS).build()?),
    };

    let orchestrator = AssemblyOrchestrator::new();
    let outcome = orchestrator.run(&questions, &profile);

    let report = serde_json::to_string_pretty(&outcome.report()).context("序列化组卷报告失败")?;
    println!("{}", report);

    Ok(())
}
