// ==========================================
// 配置层集成测试
// ==========================================
// 测试目标: 验证选题/排版配置的构造校验与组卷方案文件读写
// ==========================================

use exam_assembly::config::{AssemblyProfile, LayoutConfig, SelectionConfig};
use exam_assembly::domain::PartMode;
use exam_assembly::error::AssemblyError;
use tempfile::NamedTempFile;

#[test]
fn test_selection_config_rejects_invalid_values() {
    println!("\n=== 测试：选题配置非法参数 ===");

    assert!(matches!(
        SelectionConfig::builder(0).build(),
        Err(AssemblyError::InvalidTargetMarks(0))
    ));
    assert!(matches!(
        SelectionConfig::builder(-5).build(),
        Err(AssemblyError::InvalidTargetMarks(-5))
    ));
    assert!(matches!(
        SelectionConfig::builder(10).tolerance(-1).build(),
        Err(AssemblyError::NegativeTolerance(-1))
    ));
    assert!(matches!(
        SelectionConfig::builder(10).min_questions(4).max_questions(2).build(),
        Err(AssemblyError::InvalidQuestionRange { min: 4, max: 2 })
    ));
    assert!(matches!(
        SelectionConfig::builder(10).min_parts(0).build(),
        Err(AssemblyError::InvalidMinParts(0))
    ));
}

#[test]
fn test_selection_config_rejects_values_beyond_u32() {
    println!("\n=== 测试：选题配置数值超出范围 ===");

    let too_large = i64::from(u32::MAX) + 1;
    assert!(matches!(
        SelectionConfig::builder(too_large).build(),
        Err(AssemblyError::ValueOutOfRange { field: "target_marks", value }) if value == too_large
    ));
    assert!(matches!(
        SelectionConfig::builder(10).tolerance(too_large).build(),
        Err(AssemblyError::ValueOutOfRange { field: "tolerance", value }) if value == too_large
    ));

    let ok = SelectionConfig::builder(i64::from(u32::MAX)).tolerance(i64::from(u32::MAX)).build();
    assert!(ok.is_ok(), "u32 上界本身合法");
}

#[test]
fn test_selection_config_json_uses_same_validation() {
    println!("\n=== 测试：选题配置 JSON 反序列化校验 ===");

    let ok: SelectionConfig =
        serde_json::from_str(r#"{"target_marks": 30, "part_mode": "PRUNE", "topics": ["Networks"]}"#).unwrap();
    assert_eq!(ok.target_marks(), 30);
    assert_eq!(ok.tolerance(), 2, "缺省容差为 2");
    assert_eq!(ok.part_mode(), PartMode::Prune);
    assert!(ok.allow_keyword_backfill(), "缺省允许关键词补充");
    assert!(ok.topics().unwrap().contains("Networks"));

    let bad: Result<SelectionConfig, _> = serde_json::from_str(r#"{"target_marks": 30, "tolerance": -3}"#);
    assert!(bad.is_err(), "负容差应在反序列化时报错");

    let bad: Result<SelectionConfig, _> = serde_json::from_str(r#"{"target_marks": 0}"#);
    assert!(bad.is_err(), "目标分数为 0 应在反序列化时报错");
}

#[test]
fn test_layout_config_rejects_margins_exceeding_page() {
    println!("\n=== 测试：页边距超出页面 ===");

    let result = LayoutConfig::builder().page_size(200, 1000).margins(40, 40, 100, 100).build();
    assert!(matches!(result, Err(AssemblyError::MarginsExceedPage { axis: "宽度" })));

    let result = LayoutConfig::builder().page_size(1000, 80).margins(40, 40, 10, 10).build();
    assert!(matches!(result, Err(AssemblyError::MarginsExceedPage { axis: "高度" })));

    let result = LayoutConfig::builder().page_size(0, 1000).build();
    assert!(matches!(result, Err(AssemblyError::InvalidPageSize { .. })));
}

#[test]
fn test_layout_config_defaults_and_partial_json() {
    println!("\n=== 测试：排版配置默认值 ===");

    let config = LayoutConfig::default();
    assert_eq!(config.page_width(), 1654);
    assert_eq!(config.page_height(), 2339);
    assert_eq!(config.available_width(), 1554);
    assert_eq!(config.available_height(), 2259);
    assert_eq!(config.page_bottom(), 2299);

    let partial: LayoutConfig = serde_json::from_str(r#"{"page_height": 1000}"#).unwrap();
    assert_eq!(partial.page_height(), 1000);
    assert_eq!(partial.margin_top(), 40, "未给出的字段取默认值");
}

#[test]
fn test_profile_save_and_load_round_trip() {
    println!("\n=== 测试：组卷方案文件读写 ===");

    let selection = SelectionConfig::builder(40)
        .tolerance(1)
        .part_mode(PartMode::All)
        .pin("s21_qp_12_q3")
        .seed(7)
        .build()
        .unwrap();
    let layout = LayoutConfig::builder().page_size(1240, 1754).dpi(150).build().unwrap();
    let profile = AssemblyProfile::new(selection)
        .with_layout(layout)
        .with_question_headers(false);

    let file = NamedTempFile::new().unwrap();
    profile.save(file.path()).unwrap();
    let loaded = AssemblyProfile::load(file.path()).unwrap();

    assert_eq!(loaded, profile, "读回的方案应与保存前一致");
    assert!(loaded.selection.is_pinned("s21_qp_12_q3"));
    assert!(!loaded.show_question_headers);
}

#[test]
fn test_profile_defaults_layout_when_missing() {
    println!("\n=== 测试：方案文件缺省排版配置 ===");

    let profile: AssemblyProfile = serde_json::from_str(r#"{"selection": {"target_marks": 20}}"#).unwrap();
    assert_eq!(profile.layout, LayoutConfig::default());
    assert!(profile.show_question_headers);
}

#[test]
fn test_profile_load_missing_file_is_io_error() {
    println!("\n=== 测试：方案文件不存在 ===");

    let result = AssemblyProfile::load("/nonexistent/exam_profile.json");
    assert!(matches!(result, Err(AssemblyError::Io(_))));
}
