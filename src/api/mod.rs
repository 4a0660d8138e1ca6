// ==========================================
// 灯具项目ERP - API层
// ==========================================
// 职责: 面向 HTTP/CLI 调用方的操作入口, 编排校验/引擎/仓储
// 红线: API 层不写 SQL, 不做金额计算
// ==========================================

pub mod boq_api;
pub mod configuration_api;
pub mod error;

pub use boq_api::{BoqApi, BoqSummary, GeneratedBoq, PriceOverrideResult};
pub use configuration_api::{
    ConfigurationAccessoryInput, ConfigurationApi, ConfigurationProductInput,
    CreateVersionResponse,
};
pub use error::{ApiError, ApiResult};
