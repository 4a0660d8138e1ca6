// ==========================================
// 灯具项目ERP - 领域层
// ==========================================
// 职责: 实体与类型定义, 不含数据访问
// ==========================================

pub mod boq;
pub mod catalog;
pub mod configuration;
pub mod project;
pub mod types;

// 重导出领域实体
pub use boq::{Boq, BoqItem, BoqItemRef};
pub use catalog::{Accessory, Driver, Product};
pub use configuration::{ConfigurationAccessory, ConfigurationDriver, ConfigurationVersion};
pub use project::{Area, Project, SubArea};
