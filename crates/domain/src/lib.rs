//! 聊天状态核心领域模型
//!
//! 包含用户、聊天、消息等实体记录，观察者注册表，以及相关的业务规则。

pub mod chat;
pub mod errors;
pub mod message;
pub mod observer;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use chat::{Chat, ChatRecord, ChatType, Members, PostedMessage};
pub use errors::{DomainError, DomainResult};
pub use message::Message;
pub use observer::{ObserverId, ObserverRegistry, Recipient};
pub use user::{User, UserRecord};
pub use value_objects::{ChatId, Login, Meta, MetaEntry, MessageId, ProfileChange, Timestamp};
