//! 事件子系统统一错误定义
//!
//! 聚焦元数据提取、总线投递、存储与并发更新等最小必要集合，
//! 便于在各实现层统一转换为 `EventError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventError {
    // --- 捕获/元数据 ---
    #[error("metadata extraction error: {reason}")]
    Metadata { reason: String },
    #[error("parse error: {reason}")]
    Parse { reason: String },

    // --- 总线 ---
    #[error("event bus error: {reason}")]
    Bus { reason: String },
    #[error("no bus address for service: {service}")]
    UnknownService { service: String },

    // --- 存储/并发 ---
    #[error("event store error: {reason}")]
    Store { reason: String },
    #[error("concurrent status update: id={id}, reason={reason}")]
    Concurrency { id: String, reason: String },
    #[error("event not found: {id}")]
    NotFound { id: String },

    // --- 通用 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl EventError {
    pub fn metadata(reason: impl Into<String>) -> Self {
        EventError::Metadata {
            reason: reason.into(),
        }
    }

    pub fn bus(reason: impl Into<String>) -> Self {
        EventError::Bus {
            reason: reason.into(),
        }
    }

    pub fn store(reason: impl Into<String>) -> Self {
        EventError::Store {
            reason: reason.into(),
        }
    }

    pub fn concurrency(id: impl Into<String>, reason: impl Into<String>) -> Self {
        EventError::Concurrency {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        EventError::NotFound { id: id.into() }
    }

    pub fn unknown_service(service: impl Into<String>) -> Self {
        EventError::UnknownService {
            service: service.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type EventResult<T> = Result<T, EventError>;
