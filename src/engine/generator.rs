// ==========================================
// 灯具项目ERP - BOQ 生成引擎
// ==========================================
// 纯计算: 输入配置展开数据, 输出明细行, 不触碰数据库。
// 红线:
// - 同一 (区域, 产品) 出现多条配置时只取第一条 (先到先得)
// - 单价取生成时刻的主数据快照, 写入后与主数据脱钩
// - EXTERNAL + 线性 + 有长度的灯具, 驱动数量按安装长度推导
// ==========================================

use crate::config::EngineSettings;
use crate::domain::boq::{BoqItem, BoqItemRef};
use crate::domain::catalog::{Accessory, Driver, Product};
use crate::domain::configuration::ConfigurationVersion;
use crate::engine::pricing;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

/// 单条配置行的展开输入 (API 层负责从仓储装配)
#[derive(Debug, Clone)]
pub struct ConfigurationExpansion {
    pub row: ConfigurationVersion,
    pub product: Product,
    /// (驱动主数据, 链接数量)
    pub drivers: Vec<(Driver, i64)>,
    /// (配件主数据, 每件产品的配件数)
    pub accessories: Vec<(Accessory, i64)>,
}

// ==========================================
// BoqGeneratorEngine - 生成引擎
// ==========================================
pub struct BoqGeneratorEngine;

impl BoqGeneratorEngine {
    /// 把生效配置展开为 BOQ 明细行
    ///
    /// 输入顺序即配置行顺序; (区域, 产品) 去重保留第一条。
    /// 所有明细 markup_pct = 0, final_price = unit_price * quantity。
    pub fn build_items(
        boq_id: &str,
        expansions: &[ConfigurationExpansion],
        settings: &EngineSettings,
    ) -> Vec<BoqItem> {
        let mut items = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for expansion in expansions {
            let row = &expansion.row;
            let scope_key = (
                row.area_id.clone().unwrap_or_default(),
                row.product_id.clone(),
            );
            if !seen.insert(scope_key) {
                debug!(
                    product_id = %row.product_id,
                    area_id = ?row.area_id,
                    "重复 (区域, 产品) 配置行, 跳过"
                );
                continue;
            }

            // 灯具明细
            items.push(Self::new_item(
                boq_id,
                row.area_id.clone(),
                BoqItemRef::Product {
                    product_id: expansion.product.prod_id.clone(),
                },
                row.quantity,
                expansion.product.base_price,
            ));

            // 驱动明细
            for (driver, link_quantity) in &expansion.drivers {
                let quantity = if expansion.product.requires_derived_driver_qty() {
                    let length_mm = expansion.product.length_mm.unwrap_or(0);
                    pricing::derive_driver_quantity(row.quantity, length_mm, settings)
                } else {
                    *link_quantity
                };

                items.push(Self::new_item(
                    boq_id,
                    row.area_id.clone(),
                    BoqItemRef::Driver {
                        driver_id: driver.driver_id.clone(),
                    },
                    quantity,
                    driver.base_price,
                ));
            }

            // 配件明细 (链接数量是每件产品的用量)
            for (accessory, per_unit_quantity) in &expansion.accessories {
                items.push(Self::new_item(
                    boq_id,
                    row.area_id.clone(),
                    BoqItemRef::Accessory {
                        accessory_id: accessory.accessory_id.clone(),
                    },
                    per_unit_quantity * row.quantity,
                    accessory.base_price,
                ));
            }
        }

        items
    }

    fn new_item(
        boq_id: &str,
        area_id: Option<String>,
        item_ref: BoqItemRef,
        quantity: i64,
        unit_price: Decimal,
    ) -> BoqItem {
        let markup_pct = Decimal::ZERO;
        let final_price = pricing::final_price(unit_price, quantity, markup_pct);
        BoqItem {
            item_id: uuid::Uuid::new_v4().to_string(),
            boq_id: boq_id.to_string(),
            area_id,
            item_ref,
            quantity,
            unit_price,
            markup_pct,
            final_price,
        }
    }
}
