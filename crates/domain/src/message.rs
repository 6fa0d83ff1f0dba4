use serde::{Deserialize, Serialize};

use crate::value_objects::{ChatId, Login, MessageId, Timestamp};

/// 聊天消息，创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    /// 匿名或系统消息没有作者
    pub author: Option<Login>,
    pub created_at: Timestamp,
    pub text: String,
}
