// ==========================================
// 灯具项目ERP - 引擎参数配置
// ==========================================
// config_kv 表承载可调引擎参数, 缺省值内置:
// - boq.driver_run_length_m   线性灯驱动供电段长度 (米, 默认5)
// - boq.min_driver_quantity   派生驱动数量下限 (默认1)
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 驱动供电段长度键
pub const KEY_DRIVER_RUN_LENGTH_M: &str = "boq.driver_run_length_m";
/// 派生驱动数量下限键
pub const KEY_MIN_DRIVER_QUANTITY: &str = "boq.min_driver_quantity";

/// 引擎参数快照
///
/// BOQ 生成开始时加载一次, 整个生成过程内保持不变,
/// 避免生成中途参数变化导致明细口径不一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub driver_run_length_m: i64,
    pub min_driver_quantity: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            driver_run_length_m: 5,
            min_driver_quantity: 1,
        }
    }
}

// ==========================================
// ConfigManager - 参数读写
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取参数值
    pub fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?",
            params![key],
            |row| row.get(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入参数值 (upsert)
    pub fn set(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO config_kv (key, value, updated_at)
               VALUES (?, ?, datetime('now'))
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 加载引擎参数快照
    ///
    /// 缺失或非法的值回退缺省, 并记录告警 (参数错误不应让生成流程失败)
    pub fn load_settings(&self) -> RepositoryResult<EngineSettings> {
        let defaults = EngineSettings::default();

        let driver_run_length_m =
            self.load_positive_int(KEY_DRIVER_RUN_LENGTH_M, defaults.driver_run_length_m)?;
        let min_driver_quantity =
            self.load_positive_int(KEY_MIN_DRIVER_QUANTITY, defaults.min_driver_quantity)?;

        Ok(EngineSettings {
            driver_run_length_m,
            min_driver_quantity,
        })
    }

    fn load_positive_int(&self, key: &str, default: i64) -> RepositoryResult<i64> {
        match self.get(key)? {
            None => Ok(default),
            Some(raw) => match raw.parse::<i64>() {
                Ok(v) if v > 0 => Ok(v),
                _ => {
                    warn!(key, raw = %raw, default, "引擎参数非法, 回退缺省值");
                    Ok(default)
                }
            },
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        db::configure_sqlite_connection(&conn).unwrap();
        db::init_schema(&conn).unwrap();
        ConfigManager::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_defaults_when_table_empty() {
        let mgr = manager();
        let settings = mgr.load_settings().unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.driver_run_length_m, 5);
        assert_eq!(settings.min_driver_quantity, 1);
    }

    #[test]
    fn test_set_overrides_and_upserts() {
        let mgr = manager();
        mgr.set(KEY_DRIVER_RUN_LENGTH_M, "3").unwrap();
        mgr.set(KEY_DRIVER_RUN_LENGTH_M, "2").unwrap();
        let settings = mgr.load_settings().unwrap();
        assert_eq!(settings.driver_run_length_m, 2);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let mgr = manager();
        mgr.set(KEY_DRIVER_RUN_LENGTH_M, "not-a-number").unwrap();
        mgr.set(KEY_MIN_DRIVER_QUANTITY, "-4").unwrap();
        let settings = mgr.load_settings().unwrap();
        assert_eq!(settings, EngineSettings::default());
    }
}
