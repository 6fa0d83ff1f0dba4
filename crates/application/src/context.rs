//! 请求上下文：已解析的调用者身份与取消信号

use std::sync::Arc;

use domain::{Login, UserRecord};
use tokio_util::sync::CancellationToken;

use crate::error::ApplicationError;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user: Option<Arc<UserRecord>>,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: Arc<UserRecord>) -> Self {
        Self {
            user: Some(user),
            cancel: CancellationToken::new(),
        }
    }

    /// 替换取消信号，例如绑定到客户端连接的生命周期
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn current_user(&self) -> Option<&Arc<UserRecord>> {
        self.user.as_ref()
    }

    pub fn login(&self) -> Option<&Login> {
        self.user.as_deref().map(UserRecord::login)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn require_user(&self) -> Result<&Arc<UserRecord>, ApplicationError> {
        self.user.as_ref().ok_or(ApplicationError::Unauthorized)
    }
}
