// ==========================================
// 灯具项目ERP - BOQ领域模型
// ==========================================
// 红线:
// - (project, version) 唯一, 版本只追加, 永不删除
// - final_price == unit_price * quantity * (1 + markup_pct/100) 恒成立
// - 仅 DRAFT 状态可修改明细, FINAL 后冻结
// ==========================================

use crate::domain::types::{BoqItemType, BoqStatus};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Boq - BOQ 头
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boq {
    pub boq_id: String,                        // BOQ ID
    pub project_id: String,                    // 所属项目
    pub version: i64,                          // 版本号 (项目内递增, 从1开始)
    pub status: BoqStatus,                     // 状态
    pub source_configuration_version: i64,     // 生成来源的配置版本 (可复现性)
    pub created_by: String,                    // 创建人
    pub created_at: NaiveDateTime,             // 创建时间
    pub locked_at: Option<NaiveDateTime>,      // 锁定时间 (仅 FINAL 时有值)
}

impl Boq {
    /// 判断是否为草稿状态
    pub fn is_draft(&self) -> bool {
        self.status == BoqStatus::Draft
    }

    /// 判断是否已锁定
    pub fn is_final(&self) -> bool {
        self.status == BoqStatus::Final
    }
}

// ==========================================
// BoqItemRef - 明细引用 (和类型)
// ==========================================
// 三个互斥的可空外键在领域层收敛为带标签的和类型,
// 非法组合在构造期即不可表达, 不依赖数据库 CHECK 兜底
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoqItemRef {
    Product { product_id: String },
    Driver { driver_id: String },
    Accessory { accessory_id: String },
}

impl BoqItemRef {
    /// 对应的明细类型
    pub fn item_type(&self) -> BoqItemType {
        match self {
            BoqItemRef::Product { .. } => BoqItemType::Product,
            BoqItemRef::Driver { .. } => BoqItemType::Driver,
            BoqItemRef::Accessory { .. } => BoqItemType::Accessory,
        }
    }

    /// 被引用的主数据ID
    pub fn ref_id(&self) -> &str {
        match self {
            BoqItemRef::Product { product_id } => product_id,
            BoqItemRef::Driver { driver_id } => driver_id,
            BoqItemRef::Accessory { accessory_id } => accessory_id,
        }
    }

    /// 产品引用ID (非 PRODUCT 明细返回 None)
    pub fn product_id(&self) -> Option<&str> {
        match self {
            BoqItemRef::Product { product_id } => Some(product_id),
            _ => None,
        }
    }
}

// ==========================================
// BoqItem - BOQ 明细行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqItem {
    pub item_id: String,         // 明细ID
    pub boq_id: String,          // 所属BOQ
    pub area_id: Option<String>, // 区域 (项目级BOQ为空)
    #[serde(flatten)]
    pub item_ref: BoqItemRef,    // 引用 (产品/驱动/配件)
    pub quantity: i64,           // 数量
    pub unit_price: Decimal,     // 单价 (生成时的主数据快照)
    pub markup_pct: Decimal,     // 加价百分比 (默认0)
    pub final_price: Decimal,    // 成交总价 (派生字段)
}

impl BoqItem {
    /// 明细类型
    pub fn item_type(&self) -> BoqItemType {
        self.item_ref.item_type()
    }

    /// 不含加价的行小计 (unit_price * quantity)
    pub fn line_subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
