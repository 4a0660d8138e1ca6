// ==========================================
// 灯具项目ERP - BOQ API
// ==========================================
// 职责: 编排 BOQ 的生成 / 审批 / 加价 / 改价 / 对比 / 汇总。
// 数据装配走仓储, 业务计算走引擎, 本层不写 SQL。
// 红线:
// - 同一配置版本只允许生成一次 BOQ (预检 + 唯一约束双保险)
// - 汇总口径是累计: 聚合项目内版本号 <= 目标版本的全部 BOQ 明细
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::boq::{Boq, BoqItem};
use crate::domain::types::BoqStatus;
use crate::engine::compare::BoqCompareResult;
use crate::engine::generator::ConfigurationExpansion;
use crate::engine::{BoqCompareEngine, BoqGeneratorEngine, BoqLifecycleEngine};
use crate::repository::{
    AccessoryRepository, BoqRepository, ConfigurationRepository, DriverRepository,
    ProductRepository, ProjectRepository, TypeSummaryRow,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

// ==========================================
// 响应结构
// ==========================================

/// 生成结果 (头 + 明细)
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedBoq {
    pub boq: Boq,
    pub items: Vec<BoqItem>,
}

/// 单行改价结果 (前后快照供调用方记审计流水)
#[derive(Debug, Clone, Serialize)]
pub struct PriceOverrideResult {
    pub item: BoqItem,
    pub old_unit_price: Decimal,
    pub old_final_price: Decimal,
}

/// BOQ 汇总 (累计口径)
#[derive(Debug, Clone, Serialize)]
pub struct BoqSummary {
    pub boq_id: String,
    pub version: i64,
    pub status: BoqStatus,
    pub source_configuration_version: i64,
    pub created_at: NaiveDateTime,
    /// 按明细类型的累计 {数量, 金额}
    pub by_type: Vec<TypeSummaryRow>,
    pub grand_total: Decimal,
}

// ==========================================
// BoqApi - BOQ 服务
// ==========================================
pub struct BoqApi {
    project_repo: Arc<ProjectRepository>,
    product_repo: Arc<ProductRepository>,
    driver_repo: Arc<DriverRepository>,
    accessory_repo: Arc<AccessoryRepository>,
    configuration_repo: Arc<ConfigurationRepository>,
    boq_repo: Arc<BoqRepository>,
    config: Arc<ConfigManager>,
}

impl BoqApi {
    pub fn new(
        project_repo: Arc<ProjectRepository>,
        product_repo: Arc<ProductRepository>,
        driver_repo: Arc<DriverRepository>,
        accessory_repo: Arc<AccessoryRepository>,
        configuration_repo: Arc<ConfigurationRepository>,
        boq_repo: Arc<BoqRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            project_repo,
            product_repo,
            driver_repo,
            accessory_repo,
            configuration_repo,
            boq_repo,
            config,
        }
    }

    /// 从当前生效配置生成 BOQ
    ///
    /// 流程: 取生效配置 -> 重复生成预检 -> 展开主数据 ->
    /// 引擎构造明细 -> 单事务落库。
    /// 并发撞车由 (project, version) 唯一约束兜底, 表现为 ConflictError。
    pub fn generate_boq(&self, project_id: &str, actor: &str) -> ApiResult<GeneratedBoq> {
        self.project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| ApiError::NotFoundError(format!("Project (id={project_id})")))?;

        let active_rows = self.configuration_repo.find_active_by_project(project_id)?;
        if active_rows.is_empty() {
            return Err(ApiError::ValidationError(
                "No active configurations found".to_string(),
            ));
        }

        // 项目内全部生效行共享同一配置版本号, 取首行即可
        let source_version = active_rows[0].configuration_version;

        if let Some(latest) = self.boq_repo.find_latest_by_project(project_id)? {
            if latest.source_configuration_version == source_version {
                return Err(ApiError::ValidationError(
                    "BOQ already generated for the current configuration version".to_string(),
                ));
            }
        }

        let next_version = self.boq_repo.max_version(project_id)?.unwrap_or(0) + 1;
        let settings = self.config.load_settings()?;

        let mut expansions = Vec::with_capacity(active_rows.len());
        for row in active_rows {
            let product = self
                .product_repo
                .find_by_id(&row.product_id)?
                .ok_or_else(|| {
                    ApiError::NotFoundError(format!("Product (id={})", row.product_id))
                })?;

            let mut drivers = Vec::new();
            for link in self.configuration_repo.find_drivers(&row.config_id)? {
                let driver = self
                    .driver_repo
                    .find_by_id(&link.driver_id)?
                    .ok_or_else(|| {
                        ApiError::NotFoundError(format!("Driver (id={})", link.driver_id))
                    })?;
                drivers.push((driver, link.quantity));
            }

            let mut accessories = Vec::new();
            for link in self.configuration_repo.find_accessories(&row.config_id)? {
                let accessory = self
                    .accessory_repo
                    .find_by_id(&link.accessory_id)?
                    .ok_or_else(|| {
                        ApiError::NotFoundError(format!("Accessory (id={})", link.accessory_id))
                    })?;
                accessories.push((accessory, link.quantity));
            }

            expansions.push(ConfigurationExpansion {
                row,
                product,
                drivers,
                accessories,
            });
        }

        let boq = Boq {
            boq_id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            version: next_version,
            status: BoqStatus::Draft,
            source_configuration_version: source_version,
            created_by: actor.to_string(),
            created_at: chrono::Local::now().naive_local(),
            locked_at: None,
        };

        let items = BoqGeneratorEngine::build_items(&boq.boq_id, &expansions, &settings);
        self.boq_repo.create_with_items(&boq, &items)?;

        info!(
            project_id,
            boq_version = boq.version,
            source_configuration_version = source_version,
            item_count = items.len(),
            actor,
            "BOQ 已生成"
        );

        Ok(GeneratedBoq { boq, items })
    }

    /// 审批 BOQ: DRAFT -> FINAL, 非 DRAFT 拒绝
    pub fn approve_boq(&self, boq_id: &str, actor: &str) -> ApiResult<Boq> {
        let mut boq = self.find_boq(boq_id)?;

        let now = chrono::Local::now().naive_local();
        let (status, locked_at) = BoqLifecycleEngine::approve(&boq, now)?;
        // 引擎预检之外, 仓储层用状态守卫兜底并发的重复审批
        self.boq_repo
            .update_status(boq_id, BoqStatus::Draft, status, Some(locked_at))?;

        boq.status = status;
        boq.locked_at = Some(locked_at);

        info!(boq_id, version = boq.version, actor, "BOQ 已审批锁定");
        Ok(boq)
    }

    /// 统一加价: 对 DRAFT BOQ 全部明细应用 markup_pct 并重算总价
    pub fn apply_margin_to_boq(
        &self,
        boq_id: &str,
        markup_pct: Decimal,
        actor: &str,
    ) -> ApiResult<Boq> {
        let boq = self.find_boq(boq_id)?;
        BoqLifecycleEngine::ensure_editable(&boq)?;

        let items = self.boq_repo.find_items(boq_id)?;
        let updates = BoqLifecycleEngine::apply_margin(&items, markup_pct)?;
        self.boq_repo.update_items_pricing(&updates)?;

        info!(
            boq_id,
            markup_pct = %markup_pct,
            item_count = updates.len(),
            actor,
            "BOQ 统一加价已应用"
        );
        Ok(boq)
    }

    /// 单行价格覆盖: 改单价, 保留加价比例, 重算总价
    pub fn update_item_price(
        &self,
        item_id: &str,
        new_unit_price: Decimal,
        actor: &str,
    ) -> ApiResult<PriceOverrideResult> {
        let mut item = self
            .boq_repo
            .find_item_by_id(item_id)?
            .ok_or_else(|| ApiError::NotFoundError(format!("BoqItem (id={item_id})")))?;

        let boq = self.find_boq(&item.boq_id)?;
        BoqLifecycleEngine::ensure_editable(&boq)?;

        let new_final_price = BoqLifecycleEngine::override_unit_price(&item, new_unit_price)?;
        self.boq_repo
            .update_item_price(item_id, new_unit_price, new_final_price)?;

        let old_unit_price = item.unit_price;
        let old_final_price = item.final_price;
        item.unit_price = new_unit_price;
        item.final_price = new_final_price;

        info!(
            item_id,
            boq_id = %item.boq_id,
            old_unit_price = %old_unit_price,
            new_unit_price = %new_unit_price,
            actor,
            "明细价格已覆盖"
        );

        Ok(PriceOverrideResult {
            item,
            old_unit_price,
            old_final_price,
        })
    }

    /// 对比项目内两个 BOQ 版本
    pub fn compare_boq_versions(
        &self,
        project_id: &str,
        version_old: i64,
        version_new: i64,
    ) -> ApiResult<BoqCompareResult> {
        let old_boq = self
            .boq_repo
            .find_by_project_version(project_id, version_old)?
            .ok_or_else(|| {
                ApiError::NotFoundError(format!(
                    "Boq (project={project_id}, version={version_old})"
                ))
            })?;
        let new_boq = self
            .boq_repo
            .find_by_project_version(project_id, version_new)?
            .ok_or_else(|| {
                ApiError::NotFoundError(format!(
                    "Boq (project={project_id}, version={version_new})"
                ))
            })?;

        let old_items = self.boq_repo.find_items(&old_boq.boq_id)?;
        let new_items = self.boq_repo.find_items(&new_boq.boq_id)?;

        Ok(BoqCompareEngine::compare(
            &old_boq, &old_items, &new_boq, &new_items,
        ))
    }

    /// BOQ 累计汇总
    ///
    /// 口径: 项目内版本号 <= 目标版本的全部 BOQ 明细按类型求和。
    /// 后续 BOQ 版本是增量追加, 与历史版本合并阅读, 不是整单替换。
    pub fn get_boq_summary(&self, boq_id: &str) -> ApiResult<BoqSummary> {
        let boq = self.find_boq(boq_id)?;

        let items = self
            .boq_repo
            .find_items_up_to_version(&boq.project_id, boq.version)?;
        let by_type = BoqRepository::summarize_by_type(&items);
        let grand_total = by_type.iter().map(|row| row.total_amount).sum();

        Ok(BoqSummary {
            boq_id: boq.boq_id,
            version: boq.version,
            status: boq.status,
            source_configuration_version: boq.source_configuration_version,
            created_at: boq.created_at,
            by_type,
            grand_total,
        })
    }

    /// 项目最新 BOQ 的累计汇总 (无 BOQ 时为 None)
    pub fn get_project_boq_summary(&self, project_id: &str) -> ApiResult<Option<BoqSummary>> {
        match self.boq_repo.find_latest_by_project(project_id)? {
            Some(boq) => Ok(Some(self.get_boq_summary(&boq.boq_id)?)),
            None => Ok(None),
        }
    }

    /// 项目全部 BOQ 头 (版本号降序)
    pub fn list_boqs(&self, project_id: &str) -> ApiResult<Vec<Boq>> {
        let mut boqs = self.boq_repo.list_by_project(project_id)?;
        boqs.reverse();
        Ok(boqs)
    }

    /// BOQ 全部明细
    pub fn get_boq_items(&self, boq_id: &str) -> ApiResult<Vec<BoqItem>> {
        self.find_boq(boq_id)?;
        Ok(self.boq_repo.find_items(boq_id)?)
    }

    fn find_boq(&self, boq_id: &str) -> ApiResult<Boq> {
        self.boq_repo
            .find_by_id(boq_id)?
            .ok_or_else(|| ApiError::NotFoundError(format!("Boq (id={boq_id})")))
    }
}
