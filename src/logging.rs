// ==========================================
// 试卷组卷系统 - 日志初始化
// ==========================================
// 日志统一写到 stderr,stdout 只输出组卷报告 JSON
// 过滤: RUST_LOG,缺省只打开本库 info 级别
// 格式: EXAM_ASSEMBLY_LOG_FORMAT=pretty|json（缺省 pretty）
// ==========================================

use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// 缺省过滤规则: 本库 info,依赖库只报 warn
pub const DEFAULT_DIRECTIVE: &str = "warn,exam_assembly=info";

/// 选择日志格式的环境变量
pub const LOG_FORMAT_ENV: &str = "EXAM_ASSEMBLY_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 人类可读,带 target 和行号
    #[default]
    Pretty,
    /// JSON 行,带当前 span 字段（选题轮次、目标分数等）
    Json,
}

impl LogFormat {
    /// 解析格式名（忽略大小写）,无法识别时返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }

    /// 从 EXAM_ASSEMBLY_LOG_FORMAT 读取,未设置或无法识别时取 Pretty
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// 按环境变量初始化日志
///
/// # 示例
/// ```no_run
/// // RUST_LOG=exam_assembly::engine::selector=debug 查看每个候选的取舍
/// exam_assembly::logging::init();
/// ```
pub fn init() {
    init_with(LogFormat::from_env());
}

/// 以指定格式初始化日志（进程内只能调用一次）
pub fn init_with(format: LogFormat) {
    match format {
        LogFormat::Pretty => fmt()
            .with_env_filter(env_filter())
            .with_writer(io::stderr)
            .with_target(true)
            .with_line_number(true)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(io::stderr)
            .with_current_span(true)
            .init(),
    }
}

/// 测试用日志: debug 级别写入测试输出,重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("exam_assembly=debug"))
        .with_test_writer()
        .try_init();
}
