// ==========================================
// 灯具项目ERP - 项目/区域领域模型
// ==========================================
// 核心只消费 {inquiry_type, area} 作用域信息, 不做项目CRUD
// ==========================================

use crate::domain::types::{InquiryType, ProjectStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Project - 项目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,        // 项目ID
    pub project_name: String,      // 项目名称
    pub project_code: String,      // 项目编码 (唯一)
    pub client_name: String,       // 客户名称
    pub inquiry_type: InquiryType, // 询价模式
    pub status: ProjectStatus,     // 项目状态
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// Area - 区域
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub area_id: String,    // 区域ID
    pub project_id: String, // 所属项目
    pub area_name: String,  // 区域名称
    pub area_code: String,  // 区域编码 (项目内唯一)
}

// ==========================================
// SubArea - 子区域
// ==========================================
// 约束: 必须属于其声明的 Area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubArea {
    pub sub_area_id: String,   // 子区域ID
    pub area_id: String,       // 所属区域
    pub sub_area_name: String, // 子区域名称
}
