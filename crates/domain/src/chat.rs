//! 聊天实体定义
//!
//! 聊天的类型、所有者和成员在创建后不可变；名称、头像、元数据、消息列表
//! 以及观察者注册表都由同一把实体锁保护。

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::DomainError;
use crate::message::Message;
use crate::observer::{ObserverId, ObserverRegistry, Recipient};
use crate::value_objects::{ChatId, Login, Meta, MessageId, ProfileChange, Timestamp};

/// 聊天类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatType {
    /// 频道：只有所有者可以发言，其他成员只读
    Channel,
    /// 任意人数的群聊
    Group,
    /// 两人私聊
    Private,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Channel => "CHANNEL",
            ChatType::Group => "GROUP",
            ChatType::Private => "PRIVATE",
        }
    }

    /// 校验成员数量约束
    pub fn validate_member_count(&self, actual: usize) -> Result<(), DomainError> {
        match self {
            ChatType::Channel | ChatType::Group if actual < 3 => {
                Err(DomainError::GroupChatSize { actual })
            }
            ChatType::Private if actual != 2 => Err(DomainError::PrivateChatSize { actual }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHANNEL" => Ok(ChatType::Channel),
            "GROUP" => Ok(ChatType::Group),
            "PRIVATE" => Ok(ChatType::Private),
            other => Err(DomainError::invalid_argument(
                "chat_type",
                format!("{} is not a valid ChatType", other),
            )),
        }
    }
}

/// 去重的成员集合，保持插入顺序，创建者总在第一位。
#[derive(Debug, Clone)]
pub struct Members {
    ordered: Vec<Login>,
    index: HashSet<Login>,
}

impl Members {
    pub fn with_owner(owner: Login) -> Self {
        let mut members = Self {
            ordered: Vec::new(),
            index: HashSet::new(),
        };
        members.insert(owner);
        members
    }

    pub fn insert(&mut self, login: Login) -> bool {
        if !self.index.insert(login.clone()) {
            return false;
        }
        self.ordered.push(login);
        true
    }

    pub fn contains(&self, login: &Login) -> bool {
        self.index.contains(login)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn logins(&self) -> &[Login] {
        &self.ordered
    }
}

/// 聊天快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: ChatType,
    pub name: String,
    pub image: Option<String>,
    pub meta: Meta,
    pub owner: Login,
    pub members: Vec<Login>,
    pub message_count: usize,
    pub created_at: Timestamp,
}

#[derive(Debug)]
struct ChatState {
    name: String,
    image: Option<String>,
    meta: Meta,
    messages: Vec<Message>,
    // 消息标识 -> messages 中的下标
    messages_by_id: HashMap<MessageId, usize>,
    observers: ObserverRegistry,
}

/// 追加消息的结果：新消息以及追加时刻的投递目标
#[derive(Debug)]
pub struct PostedMessage {
    pub message: Message,
    pub recipients: Vec<Recipient>,
}

/// 聊天记录
#[derive(Debug)]
pub struct ChatRecord {
    id: ChatId,
    kind: ChatType,
    owner: Login,
    members: Members,
    created_at: Timestamp,
    state: Mutex<ChatState>,
    // 扇出闸门：保证同一聊天的消息按标识顺序投递给每个观察者
    delivery_gate: tokio::sync::Mutex<()>,
}

impl ChatRecord {
    /// 成员数必须已经通过 `ChatType::validate_member_count` 校验。
    pub fn new(
        id: ChatId,
        kind: ChatType,
        name: impl Into<String>,
        members: Members,
        created_at: Timestamp,
    ) -> Self {
        let owner = members.logins()[0].clone();
        Self {
            id,
            kind,
            owner,
            members,
            created_at,
            state: Mutex::new(ChatState {
                name: name.into(),
                image: None,
                meta: Meta::new(),
                messages: Vec::new(),
                messages_by_id: HashMap::new(),
                observers: ObserverRegistry::new(),
            }),
            delivery_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn id(&self) -> &ChatId {
        &self.id
    }

    pub fn kind(&self) -> ChatType {
        self.kind
    }

    pub fn owner(&self) -> &Login {
        &self.owner
    }

    pub fn is_owner(&self, login: &Login) -> bool {
        &self.owner == login
    }

    pub fn is_member(&self, login: &Login) -> bool {
        self.members.contains(login)
    }

    pub fn members(&self) -> &[Login] {
        self.members.logins()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn delivery_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.delivery_gate
    }

    pub fn snapshot(&self) -> Chat {
        let state = self.state.lock();
        self.snapshot_of(&state)
    }

    /// 在一次加锁内写入所有提供的字段。
    pub fn apply(&self, change: ProfileChange) -> Chat {
        let mut state = self.state.lock();
        if let Some(image) = change.image {
            state.image = Some(image);
        }
        if let Some(name) = change.name {
            state.name = name;
        }
        self.snapshot_of(&state)
    }

    pub fn append_meta(&self, key: impl Into<String>, value: impl Into<String>) -> Chat {
        let mut state = self.state.lock();
        state.meta.append(key, value);
        self.snapshot_of(&state)
    }

    /// 分配标识、追加到列表、写入索引是同一个临界区；
    /// 投递目标在同一临界区内取出，作者本人的订阅被排除。
    pub fn append_message(
        &self,
        author: Option<Login>,
        text: impl Into<String>,
        now: Timestamp,
    ) -> PostedMessage {
        let mut state = self.state.lock();
        let position = state.messages.len();
        let message = Message {
            id: MessageId::from_sequence(position),
            chat_id: self.id.clone(),
            author,
            created_at: now,
            text: text.into(),
        };
        state.messages.push(message.clone());
        state.messages_by_id.insert(message.id.clone(), position);
        let recipients = state.observers.recipients_for(message.author.as_ref());
        PostedMessage {
            message,
            recipients,
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    pub fn message(&self, id: &str) -> Option<Message> {
        let state = self.state.lock();
        state
            .messages_by_id
            .get(id)
            .and_then(|position| state.messages.get(*position))
            .cloned()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn register_observer(
        &self,
        login: Option<Login>,
        sender: mpsc::Sender<Message>,
        cancel: CancellationToken,
    ) -> ObserverId {
        self.state.lock().observers.register(login, sender, cancel)
    }

    pub fn remove_observer(&self, id: &ObserverId) -> bool {
        self.state.lock().observers.remove(id)
    }

    pub fn has_observer(&self, id: &ObserverId) -> bool {
        self.state.lock().observers.contains(id)
    }

    /// 当前应收到该作者消息的观察者
    pub fn recipients_for(&self, author: Option<&Login>) -> Vec<Recipient> {
        self.state.lock().observers.recipients_for(author)
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }

    fn snapshot_of(&self, state: &ChatState) -> Chat {
        Chat {
            id: self.id.clone(),
            kind: self.kind,
            name: state.name.clone(),
            image: state.image.clone(),
            meta: state.meta.clone(),
            owner: self.owner.clone(),
            members: self.members.logins().to_vec(),
            message_count: state.messages.len(),
            created_at: self.created_at,
        }
    }
}
