// ==========================================
// 灯具项目ERP - 配置版本领域模型
// ==========================================
// 红线: 配置版本是只追加快照
// - 创建后不更新业务字段 (is_active 指针除外)
// - 删除被永久禁止 (仓储层 + 数据库触发器双重拦截)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ConfigurationVersion - 配置版本行
// ==========================================
// 粒度: 一行 = (项目, 区域或空, 版本号, 产品)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationVersion {
    pub config_id: String,             // 配置行ID
    pub project_id: String,            // 所属项目
    pub area_id: Option<String>,       // 区域 (项目级配置为空)
    pub sub_area_id: Option<String>,   // 子区域 (可空)
    pub configuration_version: i64,    // 版本号 (同作用域内递增)
    pub is_active: bool,               // 是否当前生效版本
    pub product_id: String,            // 产品
    pub quantity: i64,                 // 数量
    pub created_at: NaiveDateTime,     // 创建时间
}

// ==========================================
// ConfigurationDriver - 配置驱动链接
// ==========================================
// 创建后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationDriver {
    pub link_id: String,   // 链接ID
    pub config_id: String, // 所属配置行
    pub driver_id: String, // 驱动
    pub quantity: i64,     // 数量快照
}

// ==========================================
// ConfigurationAccessory - 配置配件链接
// ==========================================
// 创建后不可变; quantity 语义是"每件产品的配件数"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationAccessory {
    pub link_id: String,      // 链接ID
    pub config_id: String,    // 所属配置行
    pub accessory_id: String, // 配件
    pub quantity: i64,        // 每件产品配件数量
}
