use std::sync::Arc;

use domain::{Chat, ChatRecord, ChatType, DomainError, Login, Members, ProfileChange};
use tracing::{debug, info};

use crate::{
    clock::Clock, context::RequestContext, directory::Directory, encoding::EncodingValidator,
    error::ApplicationError,
};

#[derive(Debug, Clone)]
pub struct CreateChatRequest {
    pub kind: ChatType,
    pub name: String,
    /// 除创建者外的成员登录名，未知的登录名会被忽略
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateChatRequest {
    pub chat_id: String,
    pub image: Option<String>,
    pub name: Option<String>,
}

pub struct ChatServiceDependencies {
    pub directory: Arc<Directory>,
    pub clock: Arc<dyn Clock>,
    pub validator: Arc<dyn EncodingValidator>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    // 所有者权限检查
    fn owned_chat(
        &self,
        ctx: &RequestContext,
        chat_id: &str,
    ) -> Result<Arc<ChatRecord>, ApplicationError> {
        let user = ctx.require_user()?;
        let chat = self
            .deps
            .directory
            .find_chat(chat_id)
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;

        if !chat.is_owner(user.login()) {
            return Err(ApplicationError::Unauthorized);
        }
        Ok(chat)
    }

    pub async fn create_chat(
        &self,
        ctx: &RequestContext,
        request: CreateChatRequest,
    ) -> Result<Chat, ApplicationError> {
        let owner = ctx.require_user()?;

        let mut members = Members::with_owner(owner.login().clone());
        for user in self
            .deps
            .directory
            .resolve_users(request.members.iter().map(String::as_str))
        {
            members.insert(user.login().clone());
        }

        // 成员数不满足约束时在插入前失败
        request.kind.validate_member_count(members.len())?;

        let now = self.deps.clock.now();
        let chat = self.deps.directory.insert_chat_with(|id| {
            ChatRecord::new(id, request.kind, request.name, members, now)
        });

        info!(
            chat_id = %chat.id(),
            chat_type = %chat.kind(),
            owner = %chat.owner(),
            members = chat.members().len(),
            "聊天创建成功"
        );
        Ok(chat.snapshot())
    }

    pub async fn update_chat(
        &self,
        ctx: &RequestContext,
        request: UpdateChatRequest,
    ) -> Result<Chat, ApplicationError> {
        let chat = self.owned_chat(ctx, &request.chat_id)?;

        if let Some(image) = request.image.as_deref() {
            self.deps.validator.validate("image", image)?;
        }

        let change = ProfileChange {
            name: request.name,
            image: request.image,
        };
        if change.is_empty() {
            return Ok(chat.snapshot());
        }

        let updated = chat.apply(change);
        debug!(chat_id = %updated.id, "聊天资料已更新");
        Ok(updated)
    }

    pub async fn upsert_chat_meta(
        &self,
        ctx: &RequestContext,
        chat_id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Chat, ApplicationError> {
        let chat = self.owned_chat(ctx, chat_id)?;
        Ok(chat.append_meta(key, value))
    }

    pub async fn find_chat(&self, chat_id: &str) -> Option<Chat> {
        self.deps
            .directory
            .find_chat(chat_id)
            .map(|chat| chat.snapshot())
    }

    pub async fn list_chats(&self) -> Vec<Chat> {
        self.deps
            .directory
            .chats()
            .iter()
            .map(|chat| chat.snapshot())
            .collect()
    }

    /// 指定用户参与的全部聊天
    pub async fn chats_of(&self, login: &Login) -> Vec<Chat> {
        self.deps
            .directory
            .chats()
            .iter()
            .filter(|chat| chat.is_member(login))
            .map(|chat| chat.snapshot())
            .collect()
    }
}
