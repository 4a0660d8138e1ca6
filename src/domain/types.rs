// ==========================================
// 灯具项目ERP - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 询价模式 (Inquiry Type)
// ==========================================
// 约束: AREA_WISE 配置必须挂区域, PROJECT_LEVEL 配置不能挂区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryType {
    AreaWise,     // 按区域询价
    ProjectLevel, // 项目级询价
}

impl fmt::Display for InquiryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InquiryType::AreaWise => write!(f, "AREA_WISE"),
            InquiryType::ProjectLevel => write!(f, "PROJECT_LEVEL"),
        }
    }
}

impl InquiryType {
    /// 从字符串解析
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PROJECT_LEVEL" => InquiryType::ProjectLevel,
            _ => InquiryType::AreaWise, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            InquiryType::AreaWise => "AREA_WISE",
            InquiryType::ProjectLevel => "PROJECT_LEVEL",
        }
    }
}

// ==========================================
// 项目状态 (Project Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,    // 进行中
    Completed, // 已完结
    OnHold,    // 暂停
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "ACTIVE"),
            ProjectStatus::Completed => write!(f, "COMPLETED"),
            ProjectStatus::OnHold => write!(f, "ON_HOLD"),
        }
    }
}

impl ProjectStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "COMPLETED" => ProjectStatus::Completed,
            "ON_HOLD" => ProjectStatus::OnHold,
            _ => ProjectStatus::Active,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::OnHold => "ON_HOLD",
        }
    }
}

// ==========================================
// 驱动集成方式 (Driver Integration)
// ==========================================
// EXTERNAL + 线性灯具时, 驱动数量按安装长度推导而非照抄配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverIntegration {
    Integrated, // 内置驱动
    External,   // 外置驱动
}

impl fmt::Display for DriverIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverIntegration::Integrated => write!(f, "INTEGRATED"),
            DriverIntegration::External => write!(f, "EXTERNAL"),
        }
    }
}

impl DriverIntegration {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "INTEGRATED" => DriverIntegration::Integrated,
            _ => DriverIntegration::External, // 默认值
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DriverIntegration::Integrated => "INTEGRATED",
            DriverIntegration::External => "EXTERNAL",
        }
    }
}

// ==========================================
// BOQ 状态 (BOQ Status)
// ==========================================
// 状态机: DRAFT --approve--> FINAL (终态, 不可逆)
// COMMERCIAL_APPROVED 为预留值, 当前没有任何转换进入/离开该状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoqStatus {
    Draft,              // 草稿 (可编辑)
    CommercialApproved, // 商务审批 (预留)
    Final,              // 已锁定
}

impl fmt::Display for BoqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoqStatus::Draft => write!(f, "DRAFT"),
            BoqStatus::CommercialApproved => write!(f, "COMMERCIAL_APPROVED"),
            BoqStatus::Final => write!(f, "FINAL"),
        }
    }
}

impl BoqStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "FINAL" => BoqStatus::Final,
            "COMMERCIAL_APPROVED" => BoqStatus::CommercialApproved,
            _ => BoqStatus::Draft,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BoqStatus::Draft => "DRAFT",
            BoqStatus::CommercialApproved => "COMMERCIAL_APPROVED",
            BoqStatus::Final => "FINAL",
        }
    }
}

// ==========================================
// BOQ 明细类型 (BOQ Item Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoqItemType {
    Product,   // 灯具
    Driver,    // 驱动
    Accessory, // 配件
}

impl fmt::Display for BoqItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoqItemType::Product => write!(f, "PRODUCT"),
            BoqItemType::Driver => write!(f, "DRIVER"),
            BoqItemType::Accessory => write!(f, "ACCESSORY"),
        }
    }
}

impl BoqItemType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PRODUCT" => Some(BoqItemType::Product),
            "DRIVER" => Some(BoqItemType::Driver),
            "ACCESSORY" => Some(BoqItemType::Accessory),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            BoqItemType::Product => "PRODUCT",
            BoqItemType::Driver => "DRIVER",
            BoqItemType::Accessory => "ACCESSORY",
        }
    }
}

// ==========================================
// 版本对比结果 (Diff Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffStatus {
    Added,     // v2 新增
    Removed,   // v2 移除
    Modified,  // 数量/单价/总价有变化
    Unchanged, // 无变化
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffStatus::Added => write!(f, "ADDED"),
            DiffStatus::Removed => write!(f, "REMOVED"),
            DiffStatus::Modified => write!(f, "MODIFIED"),
            DiffStatus::Unchanged => write!(f, "UNCHANGED"),
        }
    }
}
