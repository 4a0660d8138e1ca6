// ==========================================
// 灯具项目ERP - BOQ 生命周期引擎
// ==========================================
// 状态机: DRAFT --approve--> FINAL (终态)
// 红线:
// - 仅 DRAFT 可修改明细 (加价 / 改价)
// - approve 非幂等: 对 FINAL 再次 approve 是错误, 不是空操作
// - Excel 导出仅 FINAL; DRAFT 的 PDF 必须带水印
// ==========================================

use crate::domain::boq::{Boq, BoqItem};
use crate::domain::types::BoqStatus;
use crate::engine::pricing;
use crate::repository::boq_repo::BoqItemPricingUpdate;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

/// 生命周期校验错误 (API 层转译为 ValidationError)
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidValue(String),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

// ==========================================
// BoqLifecycleEngine - 生命周期引擎
// ==========================================
pub struct BoqLifecycleEngine;

impl BoqLifecycleEngine {
    /// 校验 BOQ 处于可编辑状态
    pub fn ensure_editable(boq: &Boq) -> LifecycleResult<()> {
        if !boq.is_draft() {
            return Err(LifecycleError::InvalidState(format!(
                "Only DRAFT BOQs can be modified (current status: {})",
                boq.status
            )));
        }
        Ok(())
    }

    /// 审批迁移 DRAFT -> FINAL
    ///
    /// 返回目标状态与锁定时间; 非 DRAFT 一律拒绝 (包括已经 FINAL 的)
    pub fn approve(boq: &Boq, now: NaiveDateTime) -> LifecycleResult<(BoqStatus, NaiveDateTime)> {
        if !boq.is_draft() {
            return Err(LifecycleError::InvalidState(format!(
                "Only DRAFT BOQs can be approved (current status: {})",
                boq.status
            )));
        }
        Ok((BoqStatus::Final, now))
    }

    /// 统一加价: 对全部明细重算 markup_pct 与 final_price
    pub fn apply_margin(
        items: &[BoqItem],
        markup_pct: Decimal,
    ) -> LifecycleResult<Vec<BoqItemPricingUpdate>> {
        if markup_pct < Decimal::ZERO {
            return Err(LifecycleError::InvalidValue(format!(
                "Markup percentage cannot be negative: {markup_pct}"
            )));
        }

        Ok(items
            .iter()
            .map(|item| BoqItemPricingUpdate {
                item_id: item.item_id.clone(),
                markup_pct,
                final_price: pricing::final_price(item.unit_price, item.quantity, markup_pct),
            })
            .collect())
    }

    /// 单行价格覆盖: 改单价, 保留原加价比例, 重算总价
    pub fn override_unit_price(
        item: &BoqItem,
        new_unit_price: Decimal,
    ) -> LifecycleResult<Decimal> {
        if new_unit_price < Decimal::ZERO {
            return Err(LifecycleError::InvalidValue(format!(
                "Unit price cannot be negative: {new_unit_price}"
            )));
        }

        Ok(pricing::final_price(
            new_unit_price,
            item.quantity,
            item.markup_pct,
        ))
    }

    /// Excel 导出门禁: 仅 FINAL 可导出
    pub fn ensure_excel_exportable(boq: &Boq) -> LifecycleResult<()> {
        if !boq.is_final() {
            return Err(LifecycleError::InvalidState(format!(
                "Only FINAL BOQs can be exported to Excel (current status: {})",
                boq.status
            )));
        }
        Ok(())
    }

    /// PDF 水印门禁: DRAFT 状态的 PDF 必须带草稿水印
    pub fn pdf_requires_draft_watermark(boq: &Boq) -> bool {
        boq.is_draft()
    }
}
