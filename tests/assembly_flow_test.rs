// ==========================================
// 组卷全流程集成测试
// ==========================================
// 测试目标: 选题 -> 切片编排 -> 分页 串联
// 覆盖范围: 切片顺序、上下文去重、题号标题、报告
// ==========================================


use exam_assembly::config::{AssemblyProfile, LayoutConfig, SelectionConfig};
use exam_assembly::domain::{Marks, Part, PartKind, Question, SelectionPlan, SelectionResult, SliceBounds};
use exam_assembly::engine::{compose_slices, AssemblyOrchestrator, SliceComposer};
use test_helpers::flat_question;

fn labels_of(assets: &[exam_assembly::domain::SliceAsset]) -> Vec<&str> {
    assets.iter().map(|a| a.part_label.as_str()).collect()
}

#[test]
fn test_compose_orders_header_context_and_leaves() {
    println!("\n=== 测试：切片顺序 ===");

    let q = flat_question("q1", &[2, 3, 4]);
    let plan = SelectionPlan::new(&q, ["1(a)", "1(c)"]).unwrap();
    let result = SelectionResult::new(vec![plan], 6, 0).unwrap();
    let config = LayoutConfig::default();

    let assets = compose_slices(&result, &config, true);
    assert_eq!(labels_of(&assets), vec!["__header__", "1_context", "1(a)", "1(c)"]);

    let header = &assets[0];
    assert!(header.is_text_header);
    assert_eq!(header.header_text.as_deref(), Some("q1"));
    assert_eq!(header.height, config.header_height());
    assert_eq!(header.width, config.available_width());
    assert_eq!(header.marks, 6);

    assert!(assets[1].is_context(), "上下文切片只输出一次");
    assert_eq!(assets[1].height, 40);
    assert_eq!(assets[2].image.as_deref(), Some("q1/composite.png#1(a)"));
    assert_eq!(assets[3].marks, 4);
}

#[test]
fn test_compose_without_headers() {
    println!("\n=== 测试：关闭题号标题 ===");

    let q = flat_question("q1", &[2]);
    let result = SelectionResult::new(vec![SelectionPlan::full_question(&q)], 2, 0).unwrap();
    let assets = SliceComposer::new().compose_slices(&result, &LayoutConfig::default(), false);
    assert_eq!(labels_of(&assets), vec!["1_context", "1(a)"]);
}

#[test]
fn test_leaf_sharing_context_top_is_covered() {
    println!("\n=== 测试：与上下文同起点的叶子由上下文覆盖 ===");

    let a = Part::leaf("1(a)", PartKind::Letter, Marks::explicit(2), SliceBounds::rows(0, 90).unwrap());
    let b = Part::leaf("1(b)", PartKind::Letter, Marks::explicit(3), SliceBounds::rows(100, 190).unwrap());
    let root = Part::branch("1", PartKind::Question, SliceBounds::rows(0, 200).unwrap(), vec![a, b])
        .unwrap()
        .with_context_bounds(SliceBounds::new(0, 30, 10, Some(5000)).unwrap())
        .unwrap();
    let q = Question::new("q1", "0478", 2021, 1, 2, "Data", root).unwrap();

    let result = SelectionResult::new(vec![SelectionPlan::full_question(&q)], 5, 0).unwrap();
    let config = LayoutConfig::default();
    let assets = compose_slices(&result, &config, false);

    assert_eq!(labels_of(&assets), vec!["1_context", "1(b)"]);
    assert_eq!(assets[0].width, config.available_width(), "宽度不超过可用宽度");
}

#[test]
fn test_orchestrator_runs_full_pipeline() {
    println!("\n=== 测试：组卷全流程 ===");

    let pool: Vec<Question> = (0..6)
        .map(|i| flat_question(&format!("q{}", i), &[2, 3, 5]))
        .collect();
    let selection = SelectionConfig::builder(20).tolerance(0).seed(3).build().unwrap();
    let profile = AssemblyProfile::new(selection);

    let outcome = AssemblyOrchestrator::new().run(&pool, &profile);
    println!(
        "选题 {} 道,切片 {} 个,共 {} 页",
        outcome.selection.question_count(),
        outcome.assets.len(),
        outcome.layout.page_count()
    );

    assert_eq!(outcome.selection.total_marks(), 20);
    assert_eq!(outcome.layout.total_placements(), outcome.assets.len(), "每个切片都应被放置");
    assert!(outcome.layout.page_count() >= 1);
    for plan in outcome.selection.plans() {
        assert!(
            !outcome.layout.pages_for(plan.question_id()).is_empty(),
            "选中的题目都应出现在页码映射中"
        );
    }

    let report = outcome.report();
    assert_eq!(report.asset_count, outcome.assets.len());
    assert_eq!(report.selection.total_marks, 20);
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("question_page_map").is_some());
    assert!(json.get("generated_at").is_some());
}

#[test]
fn test_orchestrator_with_empty_pool() {
    println!("\n=== 测试：空题库全流程 ===");

    let profile = AssemblyProfile::new(SelectionConfig::builder(10).build().unwrap());
    let outcome = AssemblyOrchestrator::new().run(&[], &profile);

    assert_eq!(outcome.selection.question_count(), 0);
    assert!(outcome.assets.is_empty());
    assert_eq!(outcome.layout.page_count(), 0);
    assert!(!outcome.selection.warnings().is_empty());
}
