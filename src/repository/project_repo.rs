// ==========================================
// 灯具项目ERP - 项目/区域仓储
// ==========================================
// 核心只消费作用域信息 (inquiry_type / 区域归属),
// 项目全生命周期管理由外部系统负责
// ==========================================

use crate::domain::project::{Area, Project, SubArea};
use crate::domain::types::{InquiryType, ProjectStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_datetime_column, TS_FORMAT};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ProjectRepository - 项目仓储
// ==========================================
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入项目 (种子数据/测试用)
    pub fn insert(&self, project: &Project) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO project (
                project_id, project_name, project_code, client_name,
                inquiry_type, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &project.project_id,
                &project.project_name,
                &project.project_code,
                &project.client_name,
                project.inquiry_type.to_db_str(),
                project.status.to_db_str(),
                &project.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(())
    }

    /// 按ID查询项目
    pub fn find_by_id(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT project_id, project_name, project_code, client_name,
                      inquiry_type, status, created_at
               FROM project WHERE project_id = ?"#,
            params![project_id],
            Self::map_row,
        ) {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Project> {
        let inquiry_type: String = row.get(4)?;
        let status: String = row.get(5)?;
        Ok(Project {
            project_id: row.get(0)?,
            project_name: row.get(1)?,
            project_code: row.get(2)?,
            client_name: row.get(3)?,
            inquiry_type: InquiryType::from_str(&inquiry_type),
            status: ProjectStatus::from_str(&status),
            created_at: parse_datetime_column(6, row.get::<_, String>(6)?)?,
        })
    }
}

// ==========================================
// AreaRepository - 区域仓储
// ==========================================
pub struct AreaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AreaRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入区域 (种子数据/测试用)
    pub fn insert(&self, area: &Area) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO area (area_id, project_id, area_name, area_code)
               VALUES (?, ?, ?, ?)"#,
            params![&area.area_id, &area.project_id, &area.area_name, &area.area_code],
        )?;

        Ok(())
    }

    /// 按ID查询区域
    pub fn find_by_id(&self, area_id: &str) -> RepositoryResult<Option<Area>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT area_id, project_id, area_name, area_code FROM area WHERE area_id = ?",
            params![area_id],
            Self::map_row,
        ) {
            Ok(area) => Ok(Some(area)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Area> {
        Ok(Area {
            area_id: row.get(0)?,
            project_id: row.get(1)?,
            area_name: row.get(2)?,
            area_code: row.get(3)?,
        })
    }
}

// ==========================================
// SubAreaRepository - 子区域仓储
// ==========================================
pub struct SubAreaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubAreaRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入子区域 (种子数据/测试用)
    pub fn insert(&self, sub_area: &SubArea) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO sub_area (sub_area_id, area_id, sub_area_name)
               VALUES (?, ?, ?)"#,
            params![&sub_area.sub_area_id, &sub_area.area_id, &sub_area.sub_area_name],
        )?;

        Ok(())
    }

    /// 按ID查询子区域
    pub fn find_by_id(&self, sub_area_id: &str) -> RepositoryResult<Option<SubArea>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT sub_area_id, area_id, sub_area_name FROM sub_area WHERE sub_area_id = ?",
            params![sub_area_id],
            |row| {
                Ok(SubArea {
                    sub_area_id: row.get(0)?,
                    area_id: row.get(1)?,
                    sub_area_name: row.get(2)?,
                })
            },
        ) {
            Ok(sub_area) => Ok(Some(sub_area)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
