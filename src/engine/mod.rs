// ==========================================
// 灯具项目ERP - 业务引擎层
// ==========================================
// 职责: 纯业务计算 (生成/生命周期/对比/定价), 不触碰数据库
// 数据装配与持久化由 api 层编排
// ==========================================

pub mod compare;
pub mod generator;
pub mod lifecycle;
pub mod pricing;

pub use compare::{
    BoqCompareEngine, BoqCompareResult, DiffValue, HeaderDiff, LineSnapshot, ProductDiff,
};
pub use generator::{BoqGeneratorEngine, ConfigurationExpansion};
pub use lifecycle::{BoqLifecycleEngine, LifecycleError, LifecycleResult};
