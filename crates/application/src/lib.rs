//! 应用层实现。
//!
//! 围绕领域记录提供用例服务：目录存储、调用者上下文、权限与编码校验，
//! 以及新消息向订阅者的扇出。

pub mod broadcaster;
pub mod clock;
pub mod context;
pub mod directory;
pub mod encoding;
pub mod error;
pub mod services;
pub mod subscription;

pub use broadcaster::{DeliveryReport, ObserverBroadcaster};
pub use clock::{Clock, SystemClock};
pub use context::RequestContext;
pub use directory::Directory;
pub use encoding::{Base64Validator, EncodingValidator};
pub use error::{ApplicationError, ErrorKind};
pub use services::{
    ChatService, ChatServiceDependencies, CreateChatRequest, MessageService,
    MessageServiceDependencies, RegisterUserRequest, SendMessageRequest, Services,
    UpdateChatRequest, UpdateProfileRequest, UserService, UserServiceDependencies,
};
pub use subscription::Subscription;
