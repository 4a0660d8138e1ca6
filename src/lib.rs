// ==========================================
// 灯具项目ERP - BOQ引擎核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 配置版本管理 + BOQ生成/定价引擎
// 红线: 版本只追加不删除, FINAL后不可修改
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BoqItemType, BoqStatus, DiffStatus, DriverIntegration, InquiryType, ProjectStatus,
};

// 领域实体
pub use domain::{
    Accessory, Area, Boq, BoqItem, BoqItemRef, ConfigurationAccessory, ConfigurationDriver,
    ConfigurationVersion, Driver, Product, Project, SubArea,
};

// 引擎
pub use engine::{BoqCompareEngine, BoqGeneratorEngine, BoqLifecycleEngine};

// API
pub use api::{BoqApi, ConfigurationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "灯具项目ERP - BOQ引擎";

// GST 税率（百分比）。仅供下游 PDF 渲染展示使用，核心定价不含税。
pub const GST_RATE_PCT: u32 = 18;
