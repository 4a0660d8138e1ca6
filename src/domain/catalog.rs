// ==========================================
// 灯具项目ERP - 主数据领域模型
// ==========================================
// 红线: 主数据只读, 核心逻辑只做按ID查询, 永不修改
// ==========================================

use crate::domain::types::DriverIntegration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 灯具
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub prod_id: String,                      // 产品ID
    pub make: String,                         // 品牌
    pub order_code: String,                   // 订货号 (唯一)
    pub base_price: Decimal,                  // 基础单价
    pub driver_integration: DriverIntegration, // 驱动集成方式
    pub linear: bool,                         // 是否线性灯具 (按长度销售)
    pub length_mm: Option<i64>,               // 单件长度 (毫米, 线性灯具必填)
    pub wattage_w: Option<f64>,               // 功率 (瓦)
}

impl Product {
    /// 是否需要按安装长度推导驱动数量
    ///
    /// 条件: 外置驱动 + 线性灯具 + 有单件长度
    pub fn requires_derived_driver_qty(&self) -> bool {
        self.driver_integration == DriverIntegration::External
            && self.linear
            && self.length_mm.is_some()
    }
}

// ==========================================
// Driver - 驱动电源
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: String,   // 驱动ID
    pub driver_code: String, // 驱动编码 (唯一)
    pub driver_make: String, // 品牌
    pub driver_type: String, // 类型
    pub base_price: Decimal, // 基础单价
}

// ==========================================
// Accessory - 配件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accessory {
    pub accessory_id: String,   // 配件ID
    pub accessory_name: String, // 名称
    pub accessory_type: String, // 类型
    pub base_price: Decimal,    // 基础单价
}
