use std::sync::Arc;

use domain::{Login, ProfileChange, User, UserRecord};
use tracing::{debug, info};

use crate::{
    context::RequestContext, directory::Directory, encoding::EncodingValidator,
    error::ApplicationError,
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub login: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub image: Option<String>,
    pub name: Option<String>,
}

pub struct UserServiceDependencies {
    pub directory: Arc<Directory>,
    pub validator: Arc<dyn EncodingValidator>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    /// 登录名重复时返回 `AlreadyExists`；空白登录名返回 `InvalidArgument`。
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, ApplicationError> {
        let login = Login::parse(request.login)?;
        let record = UserRecord::new(login, request.password, request.name);

        let stored = self.deps.directory.insert_user(record)?;
        info!(login = %stored.login(), "用户注册成功");
        Ok(stored.snapshot())
    }

    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        request: UpdateProfileRequest,
    ) -> Result<User, ApplicationError> {
        let user = ctx.require_user()?;

        // 先校验再写入，失败时不留下部分修改
        if let Some(image) = request.image.as_deref() {
            self.deps.validator.validate("image", image)?;
        }

        let change = ProfileChange {
            name: request.name,
            image: request.image,
        };
        if change.is_empty() {
            return Ok(user.snapshot());
        }

        let updated = user.apply(change);
        debug!(login = %updated.login, "用户资料已更新");
        Ok(updated)
    }

    pub async fn upsert_user_meta(
        &self,
        ctx: &RequestContext,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<User, ApplicationError> {
        let user = ctx.require_user()?;
        Ok(user.append_meta(key, value))
    }

    pub async fn find_user(&self, login: &str) -> Option<User> {
        self.deps
            .directory
            .find_user(login)
            .map(|record| record.snapshot())
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.deps
            .directory
            .users()
            .iter()
            .map(|record| record.snapshot())
            .collect()
    }

    /// 将传输层给出的登录名解析为请求上下文；未知或缺失的登录名视为匿名
    pub fn context_for(&self, login: Option<&str>) -> RequestContext {
        login
            .and_then(|login| self.deps.directory.find_user(login))
            .map(RequestContext::authenticated)
            .unwrap_or_else(RequestContext::anonymous)
    }
}
