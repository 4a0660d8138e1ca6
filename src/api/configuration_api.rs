// ==========================================
// 灯具项目ERP - 配置版本API
// ==========================================
// 版本化规则:
// - 保存配置 = 创建新版本, 旧版本停用但永久保留
// - 版本号按 (project, area) 作用域从1递增, 无空洞
// - AREA_WISE 项目必须挂区域, PROJECT_LEVEL 项目不能挂区域
// - 所有校验先于任何写入; 写入在单事务内完成
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::configuration::ConfigurationVersion;
use crate::domain::types::InquiryType;
use crate::repository::{
    AccessoryRepository, AreaRepository, ConfigurationRepository, DriverRepository,
    NewAccessoryLink, NewConfigurationEntry, NewDriverLink, ProductRepository, ProjectRepository,
    SubAreaRepository,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

// ==========================================
// 请求/响应结构
// ==========================================

/// 配置中的单个产品条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationProductInput {
    pub product_id: String,
    pub quantity: i64,
    /// 外置驱动 (可选)
    pub driver_id: Option<String>,
    /// 驱动链接数量, 缺省取产品数量
    pub driver_quantity: Option<i64>,
    /// 配件清单 (数量为每件产品的用量)
    #[serde(default)]
    pub accessories: Vec<ConfigurationAccessoryInput>,
}

/// 配置中的配件条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationAccessoryInput {
    pub accessory_id: String,
    pub quantity: i64,
}

/// 版本创建响应
#[derive(Debug, Clone, Serialize)]
pub struct CreateVersionResponse {
    pub version: i64,
    pub configuration_count: usize,
    pub driver_count: usize,
    pub accessory_count: usize,
}

// ==========================================
// ConfigurationApi - 配置版本服务
// ==========================================
pub struct ConfigurationApi {
    project_repo: Arc<ProjectRepository>,
    area_repo: Arc<AreaRepository>,
    sub_area_repo: Arc<SubAreaRepository>,
    product_repo: Arc<ProductRepository>,
    driver_repo: Arc<DriverRepository>,
    accessory_repo: Arc<AccessoryRepository>,
    configuration_repo: Arc<ConfigurationRepository>,
}

impl ConfigurationApi {
    pub fn new(
        project_repo: Arc<ProjectRepository>,
        area_repo: Arc<AreaRepository>,
        sub_area_repo: Arc<SubAreaRepository>,
        product_repo: Arc<ProductRepository>,
        driver_repo: Arc<DriverRepository>,
        accessory_repo: Arc<AccessoryRepository>,
        configuration_repo: Arc<ConfigurationRepository>,
    ) -> Self {
        Self {
            project_repo,
            area_repo,
            sub_area_repo,
            product_repo,
            driver_repo,
            accessory_repo,
            configuration_repo,
        }
    }

    /// 创建配置新版本
    ///
    /// 校验全部通过后才进入写事务; 事务内停用旧版本、
    /// 写入新快照并推进作用域版本指针
    pub fn create_configuration_version(
        &self,
        project_id: &str,
        area_id: Option<&str>,
        sub_area_id: Option<&str>,
        products: &[ConfigurationProductInput],
        actor: &str,
    ) -> ApiResult<CreateVersionResponse> {
        let project = self
            .project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| ApiError::NotFoundError(format!("Project (id={project_id})")))?;

        // 询价模式与区域归属一致性
        match project.inquiry_type {
            InquiryType::AreaWise if area_id.is_none() => {
                return Err(ApiError::ValidationError(
                    "Area is required for AREA_WISE projects".to_string(),
                ));
            }
            InquiryType::ProjectLevel if area_id.is_some() => {
                return Err(ApiError::ValidationError(
                    "Area must not be provided for PROJECT_LEVEL projects".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(area_id) = area_id {
            let area = self
                .area_repo
                .find_by_id(area_id)?
                .ok_or_else(|| ApiError::NotFoundError(format!("Area (id={area_id})")))?;
            if area.project_id != project_id {
                return Err(ApiError::ValidationError(format!(
                    "Area {area_id} does not belong to project {project_id}"
                )));
            }
        }

        if let Some(sub_area_id) = sub_area_id {
            let area_id = area_id.ok_or_else(|| {
                ApiError::ValidationError(
                    "Sub-area requires an area to be specified".to_string(),
                )
            })?;
            let sub_area = self
                .sub_area_repo
                .find_by_id(sub_area_id)?
                .ok_or_else(|| ApiError::NotFoundError(format!("SubArea (id={sub_area_id})")))?;
            if sub_area.area_id != area_id {
                return Err(ApiError::ValidationError(format!(
                    "Sub-area {sub_area_id} does not belong to area {area_id}"
                )));
            }
        }

        if products.is_empty() {
            return Err(ApiError::ValidationError(
                "At least one product is required".to_string(),
            ));
        }

        self.validate_quantities(products)?;
        self.validate_references(products)?;

        let entries = products
            .iter()
            .map(|p| NewConfigurationEntry {
                product_id: p.product_id.clone(),
                quantity: p.quantity,
                driver: p.driver_id.as_ref().map(|driver_id| NewDriverLink {
                    driver_id: driver_id.clone(),
                    quantity: p.driver_quantity.unwrap_or(p.quantity),
                }),
                accessories: p
                    .accessories
                    .iter()
                    .map(|a| NewAccessoryLink {
                        accessory_id: a.accessory_id.clone(),
                        quantity: a.quantity,
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        let created =
            self.configuration_repo
                .create_version(project_id, area_id, sub_area_id, &entries)?;

        info!(
            project_id,
            area_id = ?area_id,
            version = created.version,
            configurations = created.configuration_count,
            actor,
            "配置新版本已创建"
        );

        Ok(CreateVersionResponse {
            version: created.version,
            configuration_count: created.configuration_count,
            driver_count: created.driver_count,
            accessory_count: created.accessory_count,
        })
    }

    /// 下一个将被分配的版本号 (max+1, 缺省1)
    pub fn get_latest_configuration_version(
        &self,
        project_id: &str,
        area_id: Option<&str>,
    ) -> ApiResult<i64> {
        Ok(self.configuration_repo.next_version_no(project_id, area_id)?)
    }

    /// 当前生效的版本号 (无生效配置时为 None)
    pub fn get_active_configuration_version(
        &self,
        project_id: &str,
        area_id: Option<&str>,
    ) -> ApiResult<Option<i64>> {
        Ok(self.configuration_repo.active_version_no(project_id, area_id)?)
    }

    /// 作用域生效配置行 (配置器回显)
    pub fn list_configurations(
        &self,
        project_id: &str,
        area_id: Option<&str>,
    ) -> ApiResult<Vec<ConfigurationVersion>> {
        Ok(self
            .configuration_repo
            .find_active_by_scope(project_id, area_id)?)
    }

    /// 删除配置版本 —— 永久禁止, 总是返回保护错误
    pub fn delete_configuration_version(
        &self,
        project_id: &str,
        area_id: Option<&str>,
        version: i64,
    ) -> ApiResult<()> {
        self.configuration_repo
            .delete_version(project_id, area_id, version)?;
        Ok(())
    }

    /// 数量合法性校验
    fn validate_quantities(&self, products: &[ConfigurationProductInput]) -> ApiResult<()> {
        for p in products {
            if p.quantity <= 0 {
                return Err(ApiError::ValidationError(format!(
                    "Quantity must be positive for product {}: {}",
                    p.product_id, p.quantity
                )));
            }
            if let Some(dq) = p.driver_quantity {
                if dq <= 0 {
                    return Err(ApiError::ValidationError(format!(
                        "Driver quantity must be positive for product {}: {dq}",
                        p.product_id
                    )));
                }
            }
            for a in &p.accessories {
                if a.quantity <= 0 {
                    return Err(ApiError::ValidationError(format!(
                        "Accessory quantity must be positive for accessory {}: {}",
                        a.accessory_id, a.quantity
                    )));
                }
            }
        }
        Ok(())
    }

    /// 主数据引用存在性校验 (错误信息点名缺失的ID)
    fn validate_references(&self, products: &[ConfigurationProductInput]) -> ApiResult<()> {
        let product_ids: Vec<String> =
            products.iter().map(|p| p.product_id.clone()).collect();
        let driver_ids: Vec<String> = products
            .iter()
            .filter_map(|p| p.driver_id.clone())
            .collect();
        let accessory_ids: Vec<String> = products
            .iter()
            .flat_map(|p| p.accessories.iter().map(|a| a.accessory_id.clone()))
            .collect();

        Self::check_missing(
            "Products",
            &product_ids,
            &self.product_repo.find_existing_ids(&product_ids)?,
        )?;
        Self::check_missing(
            "Drivers",
            &driver_ids,
            &self.driver_repo.find_existing_ids(&driver_ids)?,
        )?;
        Self::check_missing(
            "Accessories",
            &accessory_ids,
            &self.accessory_repo.find_existing_ids(&accessory_ids)?,
        )?;

        Ok(())
    }

    fn check_missing(label: &str, requested: &[String], found: &HashSet<String>) -> ApiResult<()> {
        let mut missing: Vec<&str> = requested
            .iter()
            .filter(|id| !found.contains(*id))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        missing.dedup();
        Err(ApiError::ValidationError(format!(
            "{label} not found: {}",
            missing.join(", ")
        )))
    }
}
