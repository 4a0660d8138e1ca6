// ==========================================
// 灯具项目ERP - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod boq_repo;
pub mod catalog_repo;
pub mod configuration_repo;
pub mod error;
pub mod project_repo;

// 重导出核心仓储
pub use boq_repo::{BoqItemPricingUpdate, BoqRepository, TypeSummaryRow};
pub use catalog_repo::{AccessoryRepository, DriverRepository, ProductRepository};
pub use configuration_repo::{
    ConfigurationRepository, CreatedConfigurationVersion, NewAccessoryLink, NewConfigurationEntry,
    NewDriverLink,
};
pub use error::{RepositoryError, RepositoryResult};
pub use project_repo::{AreaRepository, ProjectRepository, SubAreaRepository};

use rust_decimal::Decimal;
use std::str::FromStr;

/// 时间戳统一存储格式
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 金额列解析 (TEXT -> Decimal)
pub(crate) fn parse_decimal_column(idx: usize, raw: String) -> rusqlite::Result<Decimal> {
    Decimal::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 时间戳列解析 (TEXT -> NaiveDateTime)
pub(crate) fn parse_datetime_column(
    idx: usize,
    raw: String,
) -> rusqlite::Result<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(&raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
