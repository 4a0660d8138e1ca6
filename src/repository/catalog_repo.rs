// ==========================================
// 灯具项目ERP - 主数据仓储
// ==========================================
// Product / Driver / Accessory 三类主数据
// 核心逻辑只读; insert 仅供种子数据与测试使用
// ==========================================

use crate::domain::catalog::{Accessory, Driver, Product};
use crate::domain::types::DriverIntegration;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_decimal_column;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 构造 IN (?,?,...) 占位符
fn in_placeholders(count: usize) -> String {
    std::iter::repeat("?").take(count).collect::<Vec<_>>().join(",")
}

// ==========================================
// ProductRepository - 灯具主数据仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入灯具 (种子数据/测试用)
    pub fn insert(&self, product: &Product) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO product (
                prod_id, make, order_code, base_price,
                driver_integration, linear, length_mm, wattage_w
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &product.prod_id,
                &product.make,
                &product.order_code,
                &product.base_price.to_string(),
                product.driver_integration.to_db_str(),
                product.linear as i64,
                &product.length_mm,
                &product.wattage_w,
            ],
        )?;

        Ok(())
    }

    /// 按ID查询灯具
    pub fn find_by_id(&self, prod_id: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT prod_id, make, order_code, base_price,
                      driver_integration, linear, length_mm, wattage_w
               FROM product WHERE prod_id = ?"#,
            params![prod_id],
            Self::map_row,
        ) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 批量查询存在的灯具ID (配置校验用)
    pub fn find_existing_ids(&self, ids: &[String]) -> RepositoryResult<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT prod_id FROM product WHERE prod_id IN ({})",
            in_placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(found)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        let integration: String = row.get(4)?;
        Ok(Product {
            prod_id: row.get(0)?,
            make: row.get(1)?,
            order_code: row.get(2)?,
            base_price: parse_decimal_column(3, row.get::<_, String>(3)?)?,
            driver_integration: DriverIntegration::from_str(&integration),
            linear: row.get::<_, i64>(5)? != 0,
            length_mm: row.get(6)?,
            wattage_w: row.get(7)?,
        })
    }
}

// ==========================================
// DriverRepository - 驱动主数据仓储
// ==========================================
pub struct DriverRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DriverRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入驱动 (种子数据/测试用)
    pub fn insert(&self, driver: &Driver) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO driver (driver_id, driver_code, driver_make, driver_type, base_price)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &driver.driver_id,
                &driver.driver_code,
                &driver.driver_make,
                &driver.driver_type,
                &driver.base_price.to_string(),
            ],
        )?;

        Ok(())
    }

    /// 按ID查询驱动
    pub fn find_by_id(&self, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT driver_id, driver_code, driver_make, driver_type, base_price
               FROM driver WHERE driver_id = ?"#,
            params![driver_id],
            Self::map_row,
        ) {
            Ok(driver) => Ok(Some(driver)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 批量查询存在的驱动ID
    pub fn find_existing_ids(&self, ids: &[String]) -> RepositoryResult<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT driver_id FROM driver WHERE driver_id IN ({})",
            in_placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(found)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Driver> {
        Ok(Driver {
            driver_id: row.get(0)?,
            driver_code: row.get(1)?,
            driver_make: row.get(2)?,
            driver_type: row.get(3)?,
            base_price: parse_decimal_column(4, row.get::<_, String>(4)?)?,
        })
    }
}

// ==========================================
// AccessoryRepository - 配件主数据仓储
// ==========================================
pub struct AccessoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AccessoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入配件 (种子数据/测试用)
    pub fn insert(&self, accessory: &Accessory) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO accessory (accessory_id, accessory_name, accessory_type, base_price)
               VALUES (?, ?, ?, ?)"#,
            params![
                &accessory.accessory_id,
                &accessory.accessory_name,
                &accessory.accessory_type,
                &accessory.base_price.to_string(),
            ],
        )?;

        Ok(())
    }

    /// 按ID查询配件
    pub fn find_by_id(&self, accessory_id: &str) -> RepositoryResult<Option<Accessory>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT accessory_id, accessory_name, accessory_type, base_price
               FROM accessory WHERE accessory_id = ?"#,
            params![accessory_id],
            Self::map_row,
        ) {
            Ok(accessory) => Ok(Some(accessory)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 批量查询存在的配件ID
    pub fn find_existing_ids(&self, ids: &[String]) -> RepositoryResult<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT accessory_id FROM accessory WHERE accessory_id IN ({})",
            in_placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(found)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Accessory> {
        Ok(Accessory {
            accessory_id: row.get(0)?,
            accessory_name: row.get(1)?,
            accessory_type: row.get(2)?,
            base_price: parse_decimal_column(3, row.get::<_, String>(3)?)?,
        })
    }
}
