// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 级别: RUST_LOG 优先, 其次命令行默认值
// 格式: 文本 (终端) / JSON (批量运行留档)
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 初始化日志系统 (info, 文本)
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器
///   例如: RUST_LOG=multi_plant_aps::engine=debug,perf=info
///
/// # 示例
/// ```no_run
/// use multi_plant_aps::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with("info", LogFormat::Text);
}

/// RUST_LOG 未设置时使用 `default_level`
///
/// 重复初始化静默忽略, 便于多个入口共用
pub fn init_with(default_level: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// 测试环境: debug 级别, 输出交给测试框架捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
