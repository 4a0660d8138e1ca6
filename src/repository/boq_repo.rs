// ==========================================
// 灯具项目ERP - BOQ 仓储
// ==========================================
// 红线:
// - (project_id, version) 唯一, 由数据库唯一约束兜底并发竞争
// - BOQ 头 + 明细写入在单事务内完成
// - 删除被永久禁止 (触发器 + 仓储层双重拦截)
// ==========================================

use crate::domain::boq::{Boq, BoqItem, BoqItemRef};
use crate::domain::types::{BoqItemType, BoqStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_datetime_column, parse_decimal_column, TS_FORMAT};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

/// 明细定价批量更新 (加价应用)
#[derive(Debug, Clone)]
pub struct BoqItemPricingUpdate {
    pub item_id: String,
    pub markup_pct: Decimal,
    pub final_price: Decimal,
}

/// 按明细类型的汇总行
#[derive(Debug, Clone, serde::Serialize)]
pub struct TypeSummaryRow {
    pub item_type: BoqItemType,
    pub total_quantity: i64,
    pub total_amount: Decimal,
}

const ITEM_COLUMNS: &str = r#"item_id, boq_id, area_id, item_type,
       product_id, driver_id, accessory_id,
       quantity, unit_price, markup_pct, final_price"#;

// ==========================================
// BoqRepository - BOQ 仓储
// ==========================================
pub struct BoqRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BoqRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入 BOQ 头 + 全部明细 (单事务)
    ///
    /// (project_id, version) 撞车时返回 UniqueConstraintViolation,
    /// 由调用方转译为并发冲突错误
    pub fn create_with_items(&self, boq: &Boq, items: &[BoqItem]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO boq (
                boq_id, project_id, version, status,
                source_configuration_version, created_by, created_at, locked_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &boq.boq_id,
                &boq.project_id,
                boq.version,
                boq.status.to_db_str(),
                boq.source_configuration_version,
                &boq.created_by,
                &boq.created_at.format(TS_FORMAT).to_string(),
                &boq.locked_at.map(|ts| ts.format(TS_FORMAT).to_string()),
            ],
        )?;

        for item in items {
            tx.execute(
                r#"INSERT INTO boq_item (
                    item_id, boq_id, area_id, item_type,
                    product_id, driver_id, accessory_id,
                    quantity, unit_price, markup_pct, final_price
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &item.item_id,
                    &item.boq_id,
                    &item.area_id,
                    item.item_type().to_db_str(),
                    item.item_ref.product_id(),
                    match &item.item_ref {
                        BoqItemRef::Driver { driver_id } => Some(driver_id.as_str()),
                        _ => None,
                    },
                    match &item.item_ref {
                        BoqItemRef::Accessory { accessory_id } => Some(accessory_id.as_str()),
                        _ => None,
                    },
                    item.quantity,
                    &item.unit_price.to_string(),
                    &item.markup_pct.to_string(),
                    &item.final_price.to_string(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 按ID查询 BOQ 头
    pub fn find_by_id(&self, boq_id: &str) -> RepositoryResult<Option<Boq>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT boq_id, project_id, version, status,
                      source_configuration_version, created_by, created_at, locked_at
               FROM boq WHERE boq_id = ?"#,
            params![boq_id],
            Self::map_boq_row,
        ) {
            Ok(boq) => Ok(Some(boq)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 (项目, 版本号) 查询 BOQ 头
    pub fn find_by_project_version(
        &self,
        project_id: &str,
        version: i64,
    ) -> RepositoryResult<Option<Boq>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT boq_id, project_id, version, status,
                      source_configuration_version, created_by, created_at, locked_at
               FROM boq WHERE project_id = ? AND version = ?"#,
            params![project_id, version],
            Self::map_boq_row,
        ) {
            Ok(boq) => Ok(Some(boq)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询项目最新 BOQ
    pub fn find_latest_by_project(&self, project_id: &str) -> RepositoryResult<Option<Boq>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT boq_id, project_id, version, status,
                      source_configuration_version, created_by, created_at, locked_at
               FROM boq WHERE project_id = ?
               ORDER BY version DESC LIMIT 1"#,
            params![project_id],
            Self::map_boq_row,
        ) {
            Ok(boq) => Ok(Some(boq)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询项目当前最大 BOQ 版本号
    pub fn max_version(&self, project_id: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;

        let max: Option<i64> = conn.query_row(
            "SELECT MAX(version) FROM boq WHERE project_id = ?",
            params![project_id],
            |row| row.get(0),
        )?;

        Ok(max)
    }

    /// 查询项目全部 BOQ (版本号升序)
    pub fn list_by_project(&self, project_id: &str) -> RepositoryResult<Vec<Boq>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT boq_id, project_id, version, status,
                      source_configuration_version, created_by, created_at, locked_at
               FROM boq WHERE project_id = ?
               ORDER BY version"#,
        )?;

        let rows = stmt
            .query_map(params![project_id], Self::map_boq_row)?
            .collect::<Result<Vec<Boq>, _>>()?;

        Ok(rows)
    }

    /// 查询 BOQ 全部明细
    pub fn find_items(&self, boq_id: &str) -> RepositoryResult<Vec<BoqItem>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {ITEM_COLUMNS}
               FROM boq_item WHERE boq_id = ?
               ORDER BY IFNULL(area_id, ''), item_type, item_id"#
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![boq_id], Self::map_item_row)?
            .collect::<Result<Vec<BoqItem>, _>>()?;

        Ok(rows)
    }

    /// 按ID查询明细行
    pub fn find_item_by_id(&self, item_id: &str) -> RepositoryResult<Option<BoqItem>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM boq_item WHERE item_id = ?");
        match conn.query_row(&sql, params![item_id], Self::map_item_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 状态迁移 (带前置状态守卫)
    ///
    /// UPDATE 的 WHERE 条件同时匹配 boq_id 与 expected 状态,
    /// 并发的两次迁移只有一次能命中, 另一次按当前实际状态报错。
    /// API 层的引擎预检与此守卫是双保险, 守卫是权威判定。
    pub fn update_status(
        &self,
        boq_id: &str,
        expected: BoqStatus,
        status: BoqStatus,
        locked_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE boq SET status = ?, locked_at = ? WHERE boq_id = ? AND status = ?",
            params![
                status.to_db_str(),
                locked_at.map(|ts| ts.format(TS_FORMAT).to_string()),
                boq_id,
                expected.to_db_str(),
            ],
        )?;

        if affected == 0 {
            // 区分目标不存在与状态竞争
            let current: Option<String> = match conn.query_row(
                "SELECT status FROM boq WHERE boq_id = ?",
                params![boq_id],
                |row| row.get(0),
            ) {
                Ok(s) => Some(s),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };
            return match current {
                None => Err(RepositoryError::NotFound {
                    entity: "Boq".to_string(),
                    id: boq_id.to_string(),
                }),
                Some(current) => Err(RepositoryError::ValidationError(format!(
                    "BOQ status is {current}, expected {} (id={boq_id})",
                    expected.to_db_str()
                ))),
            };
        }
        Ok(())
    }

    /// 批量更新明细定价 (加价应用, 单事务)
    pub fn update_items_pricing(
        &self,
        updates: &[BoqItemPricingUpdate],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for update in updates {
            let affected = tx.execute(
                "UPDATE boq_item SET markup_pct = ?, final_price = ? WHERE item_id = ?",
                params![
                    &update.markup_pct.to_string(),
                    &update.final_price.to_string(),
                    &update.item_id,
                ],
            )?;
            if affected == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "BoqItem".to_string(),
                    id: update.item_id.clone(),
                });
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 单行价格覆盖 (保留原 markup_pct, final_price 由调用方重算)
    pub fn update_item_price(
        &self,
        item_id: &str,
        unit_price: Decimal,
        final_price: Decimal,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE boq_item SET unit_price = ?, final_price = ? WHERE item_id = ?",
            params![&unit_price.to_string(), &final_price.to_string(), item_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BoqItem".to_string(),
                id: item_id.to_string(),
            });
        }
        Ok(())
    }

    /// 查询项目中版本号 <= max_version 的全部明细 (累计汇总用)
    pub fn find_items_up_to_version(
        &self,
        project_id: &str,
        max_version: i64,
    ) -> RepositoryResult<Vec<BoqItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT i.item_id, i.boq_id, i.area_id, i.item_type,
                      i.product_id, i.driver_id, i.accessory_id,
                      i.quantity, i.unit_price, i.markup_pct, i.final_price
               FROM boq_item i
               JOIN boq b ON b.boq_id = i.boq_id
               WHERE b.project_id = ? AND b.version <= ?
               ORDER BY b.version, IFNULL(i.area_id, ''), i.item_type, i.item_id"#,
        )?;

        let rows = stmt
            .query_map(params![project_id, max_version], Self::map_item_row)?
            .collect::<Result<Vec<BoqItem>, _>>()?;

        Ok(rows)
    }

    /// 按明细类型聚合 (金额用 Decimal 在内存中累加, 不走 SQL SUM,
    /// 避免 TEXT 金额列被按浮点求和丢失精度)
    pub fn summarize_by_type(items: &[BoqItem]) -> Vec<TypeSummaryRow> {
        let mut rows: Vec<TypeSummaryRow> = vec![
            TypeSummaryRow {
                item_type: BoqItemType::Product,
                total_quantity: 0,
                total_amount: Decimal::ZERO,
            },
            TypeSummaryRow {
                item_type: BoqItemType::Driver,
                total_quantity: 0,
                total_amount: Decimal::ZERO,
            },
            TypeSummaryRow {
                item_type: BoqItemType::Accessory,
                total_quantity: 0,
                total_amount: Decimal::ZERO,
            },
        ];

        for item in items {
            let row = match item.item_type() {
                BoqItemType::Product => &mut rows[0],
                BoqItemType::Driver => &mut rows[1],
                BoqItemType::Accessory => &mut rows[2],
            };
            row.total_quantity += item.quantity;
            row.total_amount += item.final_price;
        }

        rows
    }

    /// 删除 BOQ —— 永久禁止
    ///
    /// BOQ 版本是商务审计快照; 绕过仓储的裸 SQL 删除由触发器拦截。
    pub fn delete(&self, _boq_id: &str) -> RepositoryResult<()> {
        Err(RepositoryError::DeletionProtected {
            entity: "boq".to_string(),
        })
    }

    fn map_boq_row(row: &rusqlite::Row) -> rusqlite::Result<Boq> {
        let status: String = row.get(3)?;
        let locked_at: Option<String> = row.get(7)?;
        Ok(Boq {
            boq_id: row.get(0)?,
            project_id: row.get(1)?,
            version: row.get(2)?,
            status: BoqStatus::from_str(&status),
            source_configuration_version: row.get(4)?,
            created_by: row.get(5)?,
            created_at: parse_datetime_column(6, row.get::<_, String>(6)?)?,
            locked_at: locked_at
                .map(|raw| parse_datetime_column(7, raw))
                .transpose()?,
        })
    }

    fn map_item_row(row: &rusqlite::Row) -> rusqlite::Result<BoqItem> {
        let item_type: String = row.get(3)?;
        let product_id: Option<String> = row.get(4)?;
        let driver_id: Option<String> = row.get(5)?;
        let accessory_id: Option<String> = row.get(6)?;

        let item_ref = match (BoqItemType::from_str(&item_type), product_id, driver_id, accessory_id)
        {
            (Some(BoqItemType::Product), Some(product_id), None, None) => {
                BoqItemRef::Product { product_id }
            }
            (Some(BoqItemType::Driver), None, Some(driver_id), None) => {
                BoqItemRef::Driver { driver_id }
            }
            (Some(BoqItemType::Accessory), None, None, Some(accessory_id)) => {
                BoqItemRef::Accessory { accessory_id }
            }
            _ => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("boq_item 引用列与 item_type={item_type} 不匹配").into(),
                ))
            }
        };

        Ok(BoqItem {
            item_id: row.get(0)?,
            boq_id: row.get(1)?,
            area_id: row.get(2)?,
            item_ref,
            quantity: row.get(7)?,
            unit_price: parse_decimal_column(8, row.get::<_, String>(8)?)?,
            markup_pct: parse_decimal_column(9, row.get::<_, String>(9)?)?,
            final_price: parse_decimal_column(10, row.get::<_, String>(10)?)?,
        })
    }
}
