//! 领域模型错误定义
//!
//! 定义了状态核心中所有可能的领域错误，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 唯一键重复（例如登录名已被注册）
    #[error("资源已存在: {resource} {key}")]
    AlreadyExists { resource: &'static str, key: String },

    /// 引用了不存在的用户或聊天
    #[error("资源不存在: {resource} {key}")]
    NotFound { resource: &'static str, key: String },

    /// 调用者不是聊天成员
    #[error("你不是该聊天的成员")]
    MembershipRequired,

    /// 频道或群组成员不足
    #[error("频道或群组至少需要 3 名成员，当前 {actual}")]
    GroupChatSize { actual: usize },

    /// 私聊成员数不是 2
    #[error("私聊必须恰好有 2 名成员，当前 {actual}")]
    PrivateChatSize { actual: usize },

    /// 编码载荷校验失败
    #[error("编码无效: {field}: {reason}")]
    InvalidEncoding { field: String, reason: String },

    /// 参数校验失败
    #[error("参数无效: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
}

impl DomainError {
    /// 创建资源已存在错误
    pub fn already_exists(resource: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource,
            key: key.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// 创建编码错误
    pub fn invalid_encoding(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 创建参数错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
