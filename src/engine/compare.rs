// ==========================================
// 灯具项目ERP - BOQ 版本对比引擎
// ==========================================
// 纯计算: 输入两个版本的头 + 明细, 输出结构化差异。
// 行级对比只看 PRODUCT 明细; 汇总对比覆盖全部明细。
// ==========================================

use crate::domain::boq::{Boq, BoqItem};
use crate::domain::types::{BoqItemType, DiffStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// 汇总指标差异 {旧值, 新值, 差值}
#[derive(Debug, Clone, Serialize)]
pub struct DiffValue {
    pub old: Decimal,
    pub new: Decimal,
    pub difference: Decimal,
}

impl DiffValue {
    fn new(old: Decimal, new: Decimal) -> Self {
        Self {
            old,
            new,
            difference: new - old,
        }
    }
}

/// 头部汇总差异
#[derive(Debug, Clone, Serialize)]
pub struct HeaderDiff {
    /// 不含加价的小计 (Σ unit_price * quantity)
    pub subtotal: DiffValue,
    /// 成交总计 (Σ final_price)
    pub grand_total: DiffValue,
}

/// 明细行快照 (对比展示用)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSnapshot {
    pub quantity: i64,
    pub unit_price: Decimal,
    pub final_price: Decimal,
}

impl LineSnapshot {
    fn from_item(item: &BoqItem) -> Self {
        Self {
            quantity: item.quantity,
            unit_price: item.unit_price,
            final_price: item.final_price,
        }
    }
}

/// 单产品差异行
#[derive(Debug, Clone, Serialize)]
pub struct ProductDiff {
    pub product_id: String,
    pub area_id: Option<String>,
    pub status: DiffStatus,
    pub old: Option<LineSnapshot>,
    pub new: Option<LineSnapshot>,
}

/// 版本对比结果
#[derive(Debug, Clone, Serialize)]
pub struct BoqCompareResult {
    pub project_id: String,
    pub version_old: i64,
    pub version_new: i64,
    pub header: HeaderDiff,
    pub products: Vec<ProductDiff>,
}

// ==========================================
// BoqCompareEngine - 对比引擎
// ==========================================
pub struct BoqCompareEngine;

impl BoqCompareEngine {
    /// 对比两个 BOQ 版本
    ///
    /// 产品行按 (product_id, area) 配对, 输出按 product_id 升序
    pub fn compare(
        old_boq: &Boq,
        old_items: &[BoqItem],
        new_boq: &Boq,
        new_items: &[BoqItem],
    ) -> BoqCompareResult {
        let header = HeaderDiff {
            subtotal: DiffValue::new(Self::subtotal(old_items), Self::subtotal(new_items)),
            grand_total: DiffValue::new(
                Self::grand_total(old_items),
                Self::grand_total(new_items),
            ),
        };

        let old_lines = Self::product_lines(old_items);
        let new_lines = Self::product_lines(new_items);

        // BTreeMap 键序保证输出按 (product_id, area) 稳定排序
        let mut keys: BTreeMap<(String, String), ()> = BTreeMap::new();
        for key in old_lines.keys().chain(new_lines.keys()) {
            keys.insert(key.clone(), ());
        }

        let products = keys
            .into_keys()
            .map(|key| {
                let old = old_lines.get(&key);
                let new = new_lines.get(&key);
                let status = match (old, new) {
                    (None, Some(_)) => DiffStatus::Added,
                    (Some(_), None) => DiffStatus::Removed,
                    (Some(o), Some(n)) if o.1 == n.1 => DiffStatus::Unchanged,
                    _ => DiffStatus::Modified,
                };
                let area_id = old
                    .or(new)
                    .and_then(|(area_id, _)| area_id.clone());
                ProductDiff {
                    product_id: key.0,
                    area_id,
                    status,
                    old: old.map(|(_, snap)| snap.clone()),
                    new: new.map(|(_, snap)| snap.clone()),
                }
            })
            .collect();

        BoqCompareResult {
            project_id: new_boq.project_id.clone(),
            version_old: old_boq.version,
            version_new: new_boq.version,
            header,
            products,
        }
    }

    fn subtotal(items: &[BoqItem]) -> Decimal {
        items.iter().map(BoqItem::line_subtotal).sum()
    }

    fn grand_total(items: &[BoqItem]) -> Decimal {
        items.iter().map(|item| item.final_price).sum()
    }

    #[allow(clippy::type_complexity)]
    fn product_lines(
        items: &[BoqItem],
    ) -> BTreeMap<(String, String), (Option<String>, LineSnapshot)> {
        items
            .iter()
            .filter(|item| item.item_type() == BoqItemType::Product)
            .filter_map(|item| {
                item.item_ref.product_id().map(|product_id| {
                    (
                        (
                            product_id.to_string(),
                            item.area_id.clone().unwrap_or_default(),
                        ),
                        (item.area_id.clone(), LineSnapshot::from_item(item)),
                    )
                })
            })
            .collect()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boq::BoqItemRef;
    use crate::domain::types::BoqStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn make_boq(version: i64) -> Boq {
        Boq {
            boq_id: format!("B{version}"),
            project_id: "P1".to_string(),
            version,
            status: BoqStatus::Draft,
            source_configuration_version: version,
            created_by: "tester".to_string(),
            created_at: NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            locked_at: None,
        }
    }

    fn product_item(boq_id: &str, product_id: &str, quantity: i64, unit: Decimal) -> BoqItem {
        BoqItem {
            item_id: uuid::Uuid::new_v4().to_string(),
            boq_id: boq_id.to_string(),
            area_id: Some("A1".to_string()),
            item_ref: BoqItemRef::Product {
                product_id: product_id.to_string(),
            },
            quantity,
            unit_price: unit,
            markup_pct: Decimal::ZERO,
            final_price: unit * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_compare_classifies_all_statuses() {
        let old_boq = make_boq(1);
        let new_boq = make_boq(2);

        let old_items = vec![
            product_item("B1", "PR1", 10, dec!(100)), // 数量变化 -> MODIFIED
            product_item("B1", "PR2", 5, dec!(50)),   // v2 消失 -> REMOVED
            product_item("B1", "PR4", 2, dec!(30)),   // 不变 -> UNCHANGED
        ];
        let new_items = vec![
            product_item("B2", "PR1", 12, dec!(100)),
            product_item("B2", "PR3", 3, dec!(80)), // v2 新增 -> ADDED
            product_item("B2", "PR4", 2, dec!(30)),
        ];

        let result = BoqCompareEngine::compare(&old_boq, &old_items, &new_boq, &new_items);

        assert_eq!(result.version_old, 1);
        assert_eq!(result.version_new, 2);
        assert_eq!(result.products.len(), 4);

        // 按 product_id 升序
        let statuses: Vec<(&str, DiffStatus)> = result
            .products
            .iter()
            .map(|p| (p.product_id.as_str(), p.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("PR1", DiffStatus::Modified),
                ("PR2", DiffStatus::Removed),
                ("PR3", DiffStatus::Added),
                ("PR4", DiffStatus::Unchanged),
            ]
        );
    }

    #[test]
    fn test_header_diff_totals() {
        let old_boq = make_boq(1);
        let new_boq = make_boq(2);

        let old_items = vec![product_item("B1", "PR1", 10, dec!(100))]; // 1000
        let new_items = vec![product_item("B2", "PR1", 12, dec!(100))]; // 1200

        let result = BoqCompareEngine::compare(&old_boq, &old_items, &new_boq, &new_items);

        assert_eq!(result.header.subtotal.old, dec!(1000));
        assert_eq!(result.header.subtotal.new, dec!(1200));
        assert_eq!(result.header.subtotal.difference, dec!(200));
        assert_eq!(result.header.grand_total.difference, dec!(200));
    }

    fn product_item_in_area(
        boq_id: &str,
        product_id: &str,
        area_id: &str,
        quantity: i64,
        unit: Decimal,
    ) -> BoqItem {
        let mut item = product_item(boq_id, product_id, quantity, unit);
        item.area_id = Some(area_id.to_string());
        item
    }

    #[test]
    fn test_same_product_in_multiple_areas_diffed_per_area() {
        let old_boq = make_boq(1);
        let new_boq = make_boq(2);

        // 同一产品出现在两个区域, 各自独立对比, 互不覆盖
        let old_items = vec![
            product_item_in_area("B1", "PR1", "A1", 5, dec!(100)),
            product_item_in_area("B1", "PR1", "A2", 3, dec!(100)),
        ];
        let new_items = vec![
            product_item_in_area("B2", "PR1", "A1", 5, dec!(100)),
            product_item_in_area("B2", "PR1", "A2", 9, dec!(100)),
        ];

        let result = BoqCompareEngine::compare(&old_boq, &old_items, &new_boq, &new_items);
        assert_eq!(result.products.len(), 2);

        let a1 = result
            .products
            .iter()
            .find(|p| p.area_id.as_deref() == Some("A1"))
            .unwrap();
        assert_eq!(a1.status, DiffStatus::Unchanged);

        let a2 = result
            .products
            .iter()
            .find(|p| p.area_id.as_deref() == Some("A2"))
            .unwrap();
        assert_eq!(a2.status, DiffStatus::Modified);
        assert_eq!(a2.new.as_ref().unwrap().quantity, 9);
    }

    #[test]
    fn test_removed_line_keeps_old_snapshot() {
        let old_boq = make_boq(1);
        let new_boq = make_boq(2);

        let old_items = vec![product_item("B1", "PR1", 5, dec!(40))];
        let new_items: Vec<BoqItem> = vec![];

        let result = BoqCompareEngine::compare(&old_boq, &old_items, &new_boq, &new_items);
        assert_eq!(result.products.len(), 1);
        let diff = &result.products[0];
        assert_eq!(diff.status, DiffStatus::Removed);
        assert_eq!(diff.old.as_ref().unwrap().quantity, 5);
        assert!(diff.new.is_none());
    }
}
