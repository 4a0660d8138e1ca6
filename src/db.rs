// ==========================================
// 灯具项目ERP - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键/busy_timeout）
// - 统一建表语句，保证库表/索引/保护触发器一致
// - 版本表（lighting_configuration / boq）只追加：删除由触发器硬性拦截
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 保护触发器的错误标记
///
/// RAISE(ABORT, ...) 的消息以该前缀开头，仓储层据此识别为 DeletionProtected。
pub const PROTECTED_DELETE_MARKER: &str = "PROTECTED_DELETE";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开共享连接（仓储层统一持有 Arc<Mutex<Connection>>）
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 初始化数据库 schema（幂等）
///
/// 表分三组：
/// - 主数据（product / driver / accessory / project / area / sub_area）：
///   核心只读，不在本库内维护 CRUD 流程
/// - 配置版本（lighting_configuration 及子表）：只追加快照
/// - BOQ（boq / boq_item）：版本只追加，FINAL 后明细不可变
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- ===== 主数据 =====
        CREATE TABLE IF NOT EXISTS project (
            project_id   TEXT PRIMARY KEY,
            project_name TEXT NOT NULL,
            project_code TEXT NOT NULL UNIQUE,
            client_name  TEXT NOT NULL,
            inquiry_type TEXT NOT NULL DEFAULT 'AREA_WISE',
            status       TEXT NOT NULL DEFAULT 'ACTIVE',
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS area (
            area_id    TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES project(project_id),
            area_name  TEXT NOT NULL,
            area_code  TEXT NOT NULL,
            UNIQUE(project_id, area_code)
        );

        CREATE TABLE IF NOT EXISTS sub_area (
            sub_area_id   TEXT PRIMARY KEY,
            area_id       TEXT NOT NULL REFERENCES area(area_id),
            sub_area_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product (
            prod_id            TEXT PRIMARY KEY,
            make               TEXT NOT NULL,
            order_code         TEXT NOT NULL UNIQUE,
            base_price         TEXT NOT NULL,
            driver_integration TEXT NOT NULL DEFAULT 'EXTERNAL',
            linear             INTEGER NOT NULL DEFAULT 0,
            length_mm          INTEGER,
            wattage_w          REAL
        );

        CREATE TABLE IF NOT EXISTS driver (
            driver_id   TEXT PRIMARY KEY,
            driver_code TEXT NOT NULL UNIQUE,
            driver_make TEXT NOT NULL,
            driver_type TEXT NOT NULL,
            base_price  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accessory (
            accessory_id   TEXT PRIMARY KEY,
            accessory_name TEXT NOT NULL,
            accessory_type TEXT NOT NULL,
            base_price     TEXT NOT NULL
        );

        -- ===== 配置版本（只追加快照）=====
        CREATE TABLE IF NOT EXISTS lighting_configuration (
            config_id             TEXT PRIMARY KEY,
            project_id            TEXT NOT NULL REFERENCES project(project_id),
            area_id               TEXT REFERENCES area(area_id),
            sub_area_id           TEXT REFERENCES sub_area(sub_area_id),
            configuration_version INTEGER NOT NULL,
            is_active             INTEGER NOT NULL DEFAULT 1,
            product_id            TEXT NOT NULL REFERENCES product(prod_id),
            quantity              INTEGER NOT NULL CHECK (quantity > 0),
            created_at            TEXT NOT NULL
        );

        -- (project, area, version, product) 唯一。area 可空，用 IFNULL 归一化，
        -- 避免 SQLite 对 NULL 判定互不相等导致项目级配置失去约束。
        CREATE UNIQUE INDEX IF NOT EXISTS uq_lighting_configuration_scope
            ON lighting_configuration(project_id, IFNULL(area_id, ''), configuration_version, product_id);

        CREATE INDEX IF NOT EXISTS idx_lighting_configuration_active
            ON lighting_configuration(project_id, is_active);

        CREATE TABLE IF NOT EXISTS configuration_driver (
            link_id   TEXT PRIMARY KEY,
            config_id TEXT NOT NULL REFERENCES lighting_configuration(config_id),
            driver_id TEXT NOT NULL REFERENCES driver(driver_id),
            quantity  INTEGER NOT NULL CHECK (quantity > 0)
        );

        CREATE TABLE IF NOT EXISTS configuration_accessory (
            link_id      TEXT PRIMARY KEY,
            config_id    TEXT NOT NULL REFERENCES lighting_configuration(config_id),
            accessory_id TEXT NOT NULL REFERENCES accessory(accessory_id),
            quantity     INTEGER NOT NULL CHECK (quantity > 0)
        );

        -- 每个 (project, area) 作用域的当前版本指针，
        -- 与版本创建同事务更新，读侧不再做 MAX() 扫描
        CREATE TABLE IF NOT EXISTS configuration_scope (
            project_id      TEXT NOT NULL,
            area_key        TEXT NOT NULL,
            current_version INTEGER NOT NULL,
            PRIMARY KEY (project_id, area_key)
        );

        -- ===== BOQ =====
        CREATE TABLE IF NOT EXISTS boq (
            boq_id                       TEXT PRIMARY KEY,
            project_id                   TEXT NOT NULL REFERENCES project(project_id),
            version                      INTEGER NOT NULL CHECK (version > 0),
            status                       TEXT NOT NULL DEFAULT 'DRAFT',
            source_configuration_version INTEGER NOT NULL,
            created_by                   TEXT NOT NULL,
            created_at                   TEXT NOT NULL,
            locked_at                    TEXT,
            UNIQUE(project_id, version)
        );

        CREATE TABLE IF NOT EXISTS boq_item (
            item_id      TEXT PRIMARY KEY,
            boq_id       TEXT NOT NULL REFERENCES boq(boq_id),
            area_id      TEXT REFERENCES area(area_id),
            item_type    TEXT NOT NULL,
            product_id   TEXT REFERENCES product(prod_id),
            driver_id    TEXT REFERENCES driver(driver_id),
            accessory_id TEXT REFERENCES accessory(accessory_id),
            quantity     INTEGER NOT NULL CHECK (quantity > 0),
            unit_price   TEXT NOT NULL,
            markup_pct   TEXT NOT NULL DEFAULT '0',
            final_price  TEXT NOT NULL,
            CHECK (
                (item_type = 'PRODUCT'   AND product_id   IS NOT NULL AND driver_id IS NULL AND accessory_id IS NULL) OR
                (item_type = 'DRIVER'    AND driver_id    IS NOT NULL AND product_id IS NULL AND accessory_id IS NULL) OR
                (item_type = 'ACCESSORY' AND accessory_id IS NOT NULL AND product_id IS NULL AND driver_id IS NULL)
            )
        );

        -- 同一 (BOQ, 区域, 产品) 只允许一条 PRODUCT 明细
        CREATE UNIQUE INDEX IF NOT EXISTS uq_boq_item_product
            ON boq_item(boq_id, IFNULL(area_id, ''), product_id)
            WHERE item_type = 'PRODUCT';

        CREATE INDEX IF NOT EXISTS idx_boq_item_boq ON boq_item(boq_id);

        -- ===== 引擎参数 =====
        CREATE TABLE IF NOT EXISTS config_kv (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ===== 只追加保护触发器 =====
        -- 任何路径（含直连 SQL）删除版本化行都会被拦截
        CREATE TRIGGER IF NOT EXISTS trg_lighting_configuration_no_delete
        BEFORE DELETE ON lighting_configuration
        BEGIN
            SELECT RAISE(ABORT, 'PROTECTED_DELETE: lighting_configuration is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_configuration_driver_no_delete
        BEFORE DELETE ON configuration_driver
        BEGIN
            SELECT RAISE(ABORT, 'PROTECTED_DELETE: configuration_driver is immutable');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_configuration_accessory_no_delete
        BEFORE DELETE ON configuration_accessory
        BEGIN
            SELECT RAISE(ABORT, 'PROTECTED_DELETE: configuration_accessory is immutable');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_boq_no_delete
        BEFORE DELETE ON boq
        BEGIN
            SELECT RAISE(ABORT, 'PROTECTED_DELETE: boq versions are append-only');
        END;
        "#,
    )?;

    Ok(())
}
