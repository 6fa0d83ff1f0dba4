//! 目录存储
//!
//! 保存全部用户和聊天。每张表由有序列表和按键索引组成，二者总在同一个
//! 临界区内一起修改。表锁只覆盖索引操作本身，之后的实体级操作在表锁外进行，
//! 锁顺序固定为 目录锁 -> 实体锁。

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use domain::{ChatId, ChatRecord, DomainError, Login, UserRecord};
use parking_lot::RwLock;

struct Table<K, V> {
    items: Vec<Arc<V>>,
    index: HashMap<K, Arc<V>>,
}

impl<K: Eq + Hash, V> Table<K, V> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(key).cloned()
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// 调用方必须先确认键不存在
    fn push(&mut self, key: K, value: Arc<V>) {
        self.items.push(value.clone());
        self.index.insert(key, value);
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn items(&self) -> Vec<Arc<V>> {
        self.items.clone()
    }
}

pub struct Directory {
    users: RwLock<Table<Login, UserRecord>>,
    chats: RwLock<Table<ChatId, ChatRecord>>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Table::new()),
            chats: RwLock::new(Table::new()),
        }
    }

    pub fn find_user(&self, login: &str) -> Option<Arc<UserRecord>> {
        self.users.read().get(login)
    }

    /// 检查与插入在同一把写锁内完成
    pub fn insert_user(&self, user: UserRecord) -> Result<Arc<UserRecord>, DomainError> {
        let mut users = self.users.write();
        if users.contains(user.login()) {
            return Err(DomainError::already_exists("user", user.login().as_str()));
        }
        let login = user.login().clone();
        let user = Arc::new(user);
        users.push(login, user.clone());
        Ok(user)
    }

    /// 一次读锁内解析一批登录名，未知的登录名被丢弃
    pub fn resolve_users<'a, I>(&self, logins: I) -> Vec<Arc<UserRecord>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let users = self.users.read();
        logins
            .into_iter()
            .filter_map(|login| users.get(login))
            .collect()
    }

    pub fn users(&self) -> Vec<Arc<UserRecord>> {
        self.users.read().items()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    pub fn find_chat(&self, id: &str) -> Option<Arc<ChatRecord>> {
        self.chats.read().get(id)
    }

    /// 以当前聊天数量作为新标识构建并插入聊天。
    ///
    /// 标识分配与插入在同一把写锁内完成，并发创建不会得到重复标识。
    pub fn insert_chat_with<F>(&self, build: F) -> Arc<ChatRecord>
    where
        F: FnOnce(ChatId) -> ChatRecord,
    {
        let mut chats = self.chats.write();
        let id = ChatId::from_sequence(chats.len());
        debug_assert!(!chats.contains(&id));
        let chat = Arc::new(build(id.clone()));
        chats.push(id, chat.clone());
        chat
    }

    pub fn chats(&self) -> Vec<Arc<ChatRecord>> {
        self.chats.read().items()
    }

    pub fn chat_count(&self) -> usize {
        self.chats.read().len()
    }
}
