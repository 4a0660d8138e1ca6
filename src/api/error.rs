// ==========================================
// 灯具项目ERP - API层错误类型
// ==========================================
// 错误分类 (调用方据此决定提示与重试策略):
// - Validation 业务校验失败 (可修正后重试)
// - NotFound   目标不存在
// - Protection 只追加保护拒绝 (永不可重试)
// - Conflict   并发冲突 (可重试)
// ==========================================

use crate::engine::LifecycleError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("记录未找到: {0}")]
    NotFoundError(String),

    #[error("操作被保护规则拒绝: {0}")]
    ProtectionError(String),

    #[error("并发冲突: {0}")]
    ConflictError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFoundError(format!("{entity} (id={id})"))
            }
            RepositoryError::DeletionProtected { entity } => ApiError::ProtectionError(format!(
                "{entity} 为只追加数据, 删除被永久禁止"
            )),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::ConflictError(msg),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("{field}: {message}"))
            }
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

// 引擎层校验错误统一归入 Validation
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
