// ==========================================
// Paginator 引擎集成测试
// ==========================================
// 测试目标: 验证原子组不跨页、越界放置与页码映射
// 覆盖范围: 整组换页、超高组越界、单切片溢出、无空页
// ==========================================


use exam_assembly::config::LayoutConfig;
use exam_assembly::domain::LayoutWarning;
use exam_assembly::engine::paginate;
use test_helpers::{context_asset, header_asset, part_asset};

/// 页面高度可调,上下边距 40
fn config_with_height(page_height: u32) -> LayoutConfig {
    LayoutConfig::builder()
        .page_size(1654, page_height)
        .margins(40, 40, 50, 50)
        .header_spacing(10)
        .context_child_spacing(20)
        .inter_part_spacing(20)
        .build()
        .unwrap()
}

#[test]
fn test_group_moves_to_next_page_when_space_short() {
    println!("\n=== 测试：剩余 200px 放不下 220px 的原子组 ===");

    let config = config_with_height(1000);
    // 前一题占到 760,剩余 960 - 760 = 200
    // 标题 60 + 10 + 上下文 50 + 20 + 子题 80 = 220
    let assets = vec![
        part_asset("q0", "1", 720),
        header_asset("q1", 60),
        context_asset("q1", "1", 50),
        part_asset("q1", "1(a)", 80),
    ];

    let layout = paginate(&assets, &config);
    assert_eq!(layout.page_count(), 2);
    assert_eq!(layout.pages[0].placements.len(), 1, "第一页只有前一题");

    let second = &layout.pages[1];
    let tops: Vec<u32> = second.placements.iter().map(|p| p.top).collect();
    println!("第二页切片位置: {:?}", tops);
    assert_eq!(tops, vec![40, 110, 180], "整组移到第二页,标题位于 top=40");
    assert!(second.placements[0].asset.is_text_header);
    assert!(layout.warnings.is_empty(), "放得下的组不应产生告警");
    assert_eq!(layout.pages_for("q1"), &[1]);
}

#[test]
fn test_group_fits_on_current_page() {
    println!("\n=== 测试：空间足够时原子组留在当前页 ===");

    let config = config_with_height(1000);
    let assets = vec![
        part_asset("q0", "1", 500),
        header_asset("q1", 60),
        context_asset("q1", "1", 50),
        part_asset("q1", "1(a)", 80),
    ];

    let layout = paginate(&assets, &config);
    assert_eq!(layout.page_count(), 1);
    let tops: Vec<u32> = layout.pages[0].placements.iter().map(|p| p.top).collect();
    // 540 + inter_part_spacing 20 = 560
    assert_eq!(tops, vec![40, 560, 630, 700]);
}

#[test]
fn test_oversized_group_bleeds_on_fresh_page() {
    println!("\n=== 测试：530px 原子组在 420px 可用高度的页面越界 ===");

    let config = config_with_height(500);
    assert_eq!(config.available_height(), 420);

    // 标题 60 + 10 + 上下文 100 + 20 + 子题 340 = 530
    let assets = vec![
        part_asset("q0", "1", 100),
        header_asset("q1", 60),
        context_asset("q1", "1", 100),
        part_asset("q1", "1(a)", 340),
    ];

    let layout = paginate(&assets, &config);
    assert_eq!(layout.page_count(), 2);

    let page = &layout.pages[1];
    assert_eq!(page.placements.len(), 3, "整组不拆分");
    assert_eq!(page.placements[0].top, 40, "超高组从新页 top=40 开始");
    let bottom = page.placements.last().unwrap().bottom();
    assert_eq!(bottom, 570);
    assert!(bottom > config.page_bottom(), "允许越过下边距");

    assert_eq!(
        layout.warnings,
        vec![LayoutWarning::GroupBleed {
            page_index: 1,
            question_id: "q1".to_string(),
            group_height: 530,
            available_height: 420,
        }]
    );
}

#[test]
fn test_single_oversized_asset_reports_overflow() {
    println!("\n=== 测试：单个超高切片 ===");

    let config = config_with_height(500);
    let assets = vec![part_asset("q0", "1(a)", 600), part_asset("q0", "1(b)", 50)];

    let layout = paginate(&assets, &config);
    assert_eq!(layout.page_count(), 2, "溢出切片之后的切片另起一页");
    assert!(matches!(
        &layout.warnings[..],
        [LayoutWarning::AssetOverflow { page_index: 0, height: 600, .. }]
    ));
}

#[test]
fn test_no_empty_pages_and_page_map() {
    println!("\n=== 测试：不输出空页,页码映射按升序去重 ===");

    let config = config_with_height(1000);
    let assets = vec![
        part_asset("q1", "1(a)", 400),
        part_asset("q1", "1(b)", 400),
        part_asset("q1", "1(c)", 400),
        part_asset("q2", "2(a)", 300),
    ];

    let layout = paginate(&assets, &config);
    assert!(layout.pages.iter().all(|p| !p.placements.is_empty()), "不应有空页");
    for (i, page) in layout.pages.iter().enumerate() {
        assert_eq!(page.index, i, "页码应连续");
    }

    assert_eq!(layout.pages_for("q1"), &[0, 1]);
    assert_eq!(layout.pages_for("q2"), &[1]);
    assert_eq!(layout.pages[0].used_height, 820);
    assert_eq!(layout.total_placements(), 4);
}

#[test]
fn test_empty_input_yields_zero_pages() {
    println!("\n=== 测试：空输入 ===");

    let layout = paginate(&[], &LayoutConfig::default());
    assert_eq!(layout.page_count(), 0);
    assert!(layout.warnings.is_empty());
    assert!(layout.question_page_map.is_empty());
}
