//! 聊天观察者注册表
//!
//! 每个聊天持有一个注册表，记录当前活跃的订阅及其有界投递通道。
//! 注册表本身不加锁，由所属聊天的实体锁保护。

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::message::Message;
use crate::value_objects::Login;

/// 订阅者标识（UUID v4）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(Uuid);

impl ObserverId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ObserverId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Observer {
    login: Option<Login>,
    sender: mpsc::Sender<Message>,
    cancel: CancellationToken,
}

/// 一次扇出的投递目标，在释放实体锁之前从注册表中复制出来。
#[derive(Debug, Clone)]
pub struct Recipient {
    pub observer_id: ObserverId,
    pub sender: mpsc::Sender<Message>,
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observers: HashMap<ObserverId, Observer>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        login: Option<Login>,
        sender: mpsc::Sender<Message>,
        cancel: CancellationToken,
    ) -> ObserverId {
        self.register_with(ObserverId::generate, login, sender, cancel)
    }

    /// 使用给定的标识生成器注册；与现存观察者冲突时重新生成。
    pub fn register_with(
        &mut self,
        mut next_id: impl FnMut() -> ObserverId,
        login: Option<Login>,
        sender: mpsc::Sender<Message>,
        cancel: CancellationToken,
    ) -> ObserverId {
        loop {
            let id = next_id();
            if let Entry::Vacant(slot) = self.observers.entry(id) {
                slot.insert(Observer {
                    login,
                    sender,
                    cancel,
                });
                return id;
            }
        }
    }

    pub fn remove(&mut self, id: &ObserverId) -> bool {
        self.observers.remove(id).is_some()
    }

    pub fn contains(&self, id: &ObserverId) -> bool {
        self.observers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// 除作者本人的订阅外的全部投递目标。匿名作者不会匹配任何订阅。
    pub fn recipients_for(&self, author: Option<&Login>) -> Vec<Recipient> {
        self.observers
            .iter()
            .filter(|(_, observer)| match (author, observer.login.as_ref()) {
                (Some(author), Some(login)) => author != login,
                _ => true,
            })
            .map(|(id, observer)| Recipient {
                observer_id: *id,
                sender: observer.sender.clone(),
                cancel: observer.cancel.clone(),
            })
            .collect()
    }
}
