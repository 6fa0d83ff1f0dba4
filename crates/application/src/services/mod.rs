use std::sync::Arc;

use config::{ConfigError, StateConfig};

use crate::{
    broadcaster::ObserverBroadcaster,
    clock::{Clock, SystemClock},
    directory::Directory,
    encoding::{Base64Validator, EncodingValidator},
};

mod chat_service;
mod message_service;
mod user_service;

#[cfg(test)]
mod user_service_tests;

pub use chat_service::{
    ChatService, ChatServiceDependencies, CreateChatRequest, UpdateChatRequest,
};
pub use message_service::{MessageService, MessageServiceDependencies, SendMessageRequest};
pub use user_service::{
    RegisterUserRequest, UpdateProfileRequest, UserService, UserServiceDependencies,
};

/// 共享同一个目录存储的三个应用服务
pub struct Services {
    pub directory: Arc<Directory>,
    pub users: UserService,
    pub chats: ChatService,
    pub messages: MessageService,
}

impl Services {
    pub fn new(settings: StateConfig) -> Result<Self, ConfigError> {
        Self::with_collaborators(settings, Arc::new(SystemClock), Arc::new(Base64Validator))
    }

    /// 配置无效（例如邮箱容量为 0）时拒绝构建
    pub fn with_collaborators(
        settings: StateConfig,
        clock: Arc<dyn Clock>,
        validator: Arc<dyn EncodingValidator>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let directory = Arc::new(Directory::new());
        let broadcaster = Arc::new(ObserverBroadcaster::from_config(&settings));

        let users = UserService::new(UserServiceDependencies {
            directory: directory.clone(),
            validator: validator.clone(),
        });
        let chats = ChatService::new(ChatServiceDependencies {
            directory: directory.clone(),
            clock: clock.clone(),
            validator,
        });
        let messages = MessageService::new(MessageServiceDependencies {
            directory: directory.clone(),
            clock,
            broadcaster,
            settings,
        });

        Ok(Self {
            directory,
            users,
            chats,
            messages,
        })
    }
}
