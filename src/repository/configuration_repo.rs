// ==========================================
// 灯具项目ERP - 配置版本仓储
// ==========================================
// 红线:
// - 版本创建必须在单事务内完成 "停用旧版本 + 写入新快照 + 更新指针"
// - 历史版本行永不更新业务字段, 永不删除
// - configuration_scope 是作用域当前版本指针, 与版本创建同事务维护,
//   读侧不做 ORDER BY ... LIMIT 1 扫描
// ==========================================

use crate::domain::configuration::{
    ConfigurationAccessory, ConfigurationDriver, ConfigurationVersion,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_datetime_column, TS_FORMAT};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

/// 区域键归一化: 项目级配置的 area_key 为空串
fn area_key(area_id: Option<&str>) -> &str {
    area_id.unwrap_or("")
}

// ==========================================
// 版本创建输入
// ==========================================

/// 配置驱动链接输入
#[derive(Debug, Clone)]
pub struct NewDriverLink {
    pub driver_id: String,
    pub quantity: i64,
}

/// 配置配件链接输入 (quantity 为每件产品的配件数)
#[derive(Debug, Clone)]
pub struct NewAccessoryLink {
    pub accessory_id: String,
    pub quantity: i64,
}

/// 单个产品的配置条目
#[derive(Debug, Clone)]
pub struct NewConfigurationEntry {
    pub product_id: String,
    pub quantity: i64,
    pub driver: Option<NewDriverLink>,
    pub accessories: Vec<NewAccessoryLink>,
}

/// 版本创建结果
#[derive(Debug, Clone)]
pub struct CreatedConfigurationVersion {
    pub version: i64,
    pub configuration_count: usize,
    pub driver_count: usize,
    pub accessory_count: usize,
}

// ==========================================
// ConfigurationRepository - 配置版本仓储
// ==========================================
pub struct ConfigurationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigurationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建新配置版本 (原子操作)
    ///
    /// 同一事务内:
    /// 1. 读取作用域当前版本指针 (缺失时回退 MAX 扫描, 兼容旧库)
    /// 2. 停用该作用域全部旧版本 (is_active=0)
    /// 3. 按产品写入新版本快照行 + 驱动/配件链接
    /// 4. 更新 configuration_scope 指针
    ///
    /// 任一行写入失败则整体回滚, 不产生半个版本
    pub fn create_version(
        &self,
        project_id: &str,
        area_id: Option<&str>,
        sub_area_id: Option<&str>,
        entries: &[NewConfigurationEntry],
    ) -> RepositoryResult<CreatedConfigurationVersion> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let next_version = Self::read_next_version(&tx, project_id, area_id)?;

        // 停用旧版本
        tx.execute(
            r#"UPDATE lighting_configuration
               SET is_active = 0
               WHERE project_id = ? AND IFNULL(area_id, '') = ? AND is_active = 1"#,
            params![project_id, area_key(area_id)],
        )?;

        let created_at = chrono::Local::now().naive_local().format(TS_FORMAT).to_string();
        let mut driver_count = 0usize;
        let mut accessory_count = 0usize;

        for entry in entries {
            let config_id = uuid::Uuid::new_v4().to_string();

            tx.execute(
                r#"INSERT INTO lighting_configuration (
                    config_id, project_id, area_id, sub_area_id,
                    configuration_version, is_active, product_id, quantity, created_at
                ) VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)"#,
                params![
                    &config_id,
                    project_id,
                    &area_id,
                    &sub_area_id,
                    next_version,
                    &entry.product_id,
                    entry.quantity,
                    &created_at,
                ],
            )?;

            if let Some(driver) = &entry.driver {
                tx.execute(
                    r#"INSERT INTO configuration_driver (link_id, config_id, driver_id, quantity)
                       VALUES (?, ?, ?, ?)"#,
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        &config_id,
                        &driver.driver_id,
                        driver.quantity,
                    ],
                )?;
                driver_count += 1;
            }

            for acc in &entry.accessories {
                tx.execute(
                    r#"INSERT INTO configuration_accessory (link_id, config_id, accessory_id, quantity)
                       VALUES (?, ?, ?, ?)"#,
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        &config_id,
                        &acc.accessory_id,
                        acc.quantity,
                    ],
                )?;
                accessory_count += 1;
            }
        }

        // 更新作用域指针 (同事务, 保证版本号分配的原子性)
        tx.execute(
            r#"INSERT INTO configuration_scope (project_id, area_key, current_version)
               VALUES (?, ?, ?)
               ON CONFLICT(project_id, area_key)
               DO UPDATE SET current_version = excluded.current_version"#,
            params![project_id, area_key(area_id), next_version],
        )?;

        tx.commit()?;

        Ok(CreatedConfigurationVersion {
            version: next_version,
            configuration_count: entries.len(),
            driver_count,
            accessory_count,
        })
    }

    /// 事务内读取下一版本号
    fn read_next_version(
        tx: &Transaction,
        project_id: &str,
        area_id: Option<&str>,
    ) -> RepositoryResult<i64> {
        let pointer: Option<i64> = tx
            .query_row(
                "SELECT current_version FROM configuration_scope WHERE project_id = ? AND area_key = ?",
                params![project_id, area_key(area_id)],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let current = match pointer {
            Some(v) => Some(v),
            // 指针缺失时回退 MAX 扫描 (兼容指针表之前建立的数据)
            None => tx.query_row(
                r#"SELECT MAX(configuration_version) FROM lighting_configuration
                   WHERE project_id = ? AND IFNULL(area_id, '') = ?"#,
                params![project_id, area_key(area_id)],
                |row| row.get::<_, Option<i64>>(0),
            )?,
        };

        Ok(current.unwrap_or(0) + 1)
    }

    /// 查询下一个将被分配的版本号 (只读, 无副作用)
    pub fn next_version_no(&self, project_id: &str, area_id: Option<&str>) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let next = Self::read_next_version(&tx, project_id, area_id)?;
        tx.commit()?;
        Ok(next)
    }

    /// 查询作用域当前生效的版本号
    pub fn active_version_no(
        &self,
        project_id: &str,
        area_id: Option<&str>,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT configuration_version FROM lighting_configuration
               WHERE project_id = ? AND IFNULL(area_id, '') = ? AND is_active = 1
               LIMIT 1"#,
            params![project_id, area_key(area_id)],
            |row| row.get(0),
        ) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询项目全部生效配置行 (跨区域, BOQ生成入口)
    pub fn find_active_by_project(
        &self,
        project_id: &str,
    ) -> RepositoryResult<Vec<ConfigurationVersion>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT config_id, project_id, area_id, sub_area_id,
                      configuration_version, is_active, product_id, quantity, created_at
               FROM lighting_configuration
               WHERE project_id = ? AND is_active = 1
               ORDER BY IFNULL(area_id, ''), created_at, config_id"#,
        )?;

        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<Result<Vec<ConfigurationVersion>, _>>()?;

        Ok(rows)
    }

    /// 查询作用域生效配置行 (配置回显)
    pub fn find_active_by_scope(
        &self,
        project_id: &str,
        area_id: Option<&str>,
    ) -> RepositoryResult<Vec<ConfigurationVersion>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT config_id, project_id, area_id, sub_area_id,
                      configuration_version, is_active, product_id, quantity, created_at
               FROM lighting_configuration
               WHERE project_id = ? AND IFNULL(area_id, '') = ? AND is_active = 1
               ORDER BY created_at, config_id"#,
        )?;

        let rows = stmt
            .query_map(params![project_id, area_key(area_id)], Self::map_row)?
            .collect::<Result<Vec<ConfigurationVersion>, _>>()?;

        Ok(rows)
    }

    /// 查询指定版本的历史快照
    pub fn find_by_scope_version(
        &self,
        project_id: &str,
        area_id: Option<&str>,
        version: i64,
    ) -> RepositoryResult<Vec<ConfigurationVersion>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT config_id, project_id, area_id, sub_area_id,
                      configuration_version, is_active, product_id, quantity, created_at
               FROM lighting_configuration
               WHERE project_id = ? AND IFNULL(area_id, '') = ? AND configuration_version = ?
               ORDER BY created_at, config_id"#,
        )?;

        let rows = stmt
            .query_map(params![project_id, area_key(area_id), version], Self::map_row)?
            .collect::<Result<Vec<ConfigurationVersion>, _>>()?;

        Ok(rows)
    }

    /// 查询配置行的驱动链接
    pub fn find_drivers(&self, config_id: &str) -> RepositoryResult<Vec<ConfigurationDriver>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT link_id, config_id, driver_id, quantity
               FROM configuration_driver WHERE config_id = ?"#,
        )?;

        let rows = stmt
            .query_map(params![config_id], |row| {
                Ok(ConfigurationDriver {
                    link_id: row.get(0)?,
                    config_id: row.get(1)?,
                    driver_id: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<ConfigurationDriver>, _>>()?;

        Ok(rows)
    }

    /// 查询配置行的配件链接
    pub fn find_accessories(
        &self,
        config_id: &str,
    ) -> RepositoryResult<Vec<ConfigurationAccessory>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT link_id, config_id, accessory_id, quantity
               FROM configuration_accessory WHERE config_id = ?"#,
        )?;

        let rows = stmt
            .query_map(params![config_id], |row| {
                Ok(ConfigurationAccessory {
                    link_id: row.get(0)?,
                    config_id: row.get(1)?,
                    accessory_id: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<ConfigurationAccessory>, _>>()?;

        Ok(rows)
    }

    /// 删除配置版本 —— 永久禁止
    ///
    /// 配置版本是审计快照, 任何删除请求都视为调用方缺陷。
    /// 仓储层直接拒绝; 绕过仓储的裸 SQL 删除会被数据库触发器拦截。
    pub fn delete_version(
        &self,
        _project_id: &str,
        _area_id: Option<&str>,
        _version: i64,
    ) -> RepositoryResult<()> {
        Err(RepositoryError::DeletionProtected {
            entity: "lighting_configuration".to_string(),
        })
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ConfigurationVersion> {
        Ok(ConfigurationVersion {
            config_id: row.get(0)?,
            project_id: row.get(1)?,
            area_id: row.get(2)?,
            sub_area_id: row.get(3)?,
            configuration_version: row.get(4)?,
            is_active: row.get::<_, i64>(5)? != 0,
            product_id: row.get(6)?,
            quantity: row.get(7)?,
            created_at: parse_datetime_column(8, row.get::<_, String>(8)?)?,
        })
    }
}
