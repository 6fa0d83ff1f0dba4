use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    /// 未登录或不是资源所有者
    #[error("not authorized")]
    Unauthorized,
}

/// 传输层可见的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    Unauthorized,
    MembershipRequired,
    GroupChatSize,
    PrivateChatSize,
    InvalidEncoding,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::MembershipRequired => "MEMBERSHIP_REQUIRED",
            ErrorKind::GroupChatSize => "GROUP_CHAT_SIZE",
            ErrorKind::PrivateChatSize => "PRIVATE_CHAT_SIZE",
            ErrorKind::InvalidEncoding => "INVALID_ENCODING",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
        }
    }
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Unauthorized => ErrorKind::Unauthorized,
            ApplicationError::Domain(error) => match error {
                DomainError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
                DomainError::NotFound { .. } => ErrorKind::NotFound,
                DomainError::MembershipRequired => ErrorKind::MembershipRequired,
                DomainError::GroupChatSize { .. } => ErrorKind::GroupChatSize,
                DomainError::PrivateChatSize { .. } => ErrorKind::PrivateChatSize,
                DomainError::InvalidEncoding { .. } => ErrorKind::InvalidEncoding,
                DomainError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            },
        }
    }
}
