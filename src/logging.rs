// ==========================================
// 灯具项目ERP - 日志系统初始化
// ==========================================
// tracing + tracing-subscriber, 级别由环境变量控制
// API 层在每次变更操作上打 info, 参数回退等打 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统 (进程入口调用一次)
///
/// # 环境变量
/// - RUST_LOG: 级别过滤器, 缺省 info
///   例如: RUST_LOG=debug 或 RUST_LOG=lighting_erp=trace
///
/// # 示例
/// ```no_run
/// use lighting_erp::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 测试环境初始化
///
/// 缺省 debug 级别, 输出接入测试捕获器;
/// try_init 幂等, 测试用例可重复调用
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
