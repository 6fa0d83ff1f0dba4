//! 用户实体定义
//!
//! `UserRecord` 是目录中保存的记录，可变字段由记录自己的锁保护；
//! `User` 是对外返回的只读快照。

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::value_objects::{Login, Meta, ProfileChange};

/// 用户快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: Login,
    pub name: String,
    pub image: Option<String>,
    pub meta: Meta,
}

/// 受实体锁保护的用户可变字段
#[derive(Debug, Clone)]
struct UserProfile {
    name: String,
    image: Option<String>,
    meta: Meta,
}

/// 用户记录
pub struct UserRecord {
    login: Login,
    // 不透明密码，由外部身份组件解释
    password: String,
    profile: Mutex<UserProfile>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl UserRecord {
    pub fn new(login: Login, password: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            login,
            password: password.into(),
            profile: Mutex::new(UserProfile {
                name: name.into(),
                image: None,
                meta: Meta::new(),
            }),
        }
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    pub fn snapshot(&self) -> User {
        let profile = self.profile.lock();
        self.snapshot_of(&profile)
    }

    /// 在一次加锁内写入所有提供的字段，并返回写入后的快照。
    pub fn apply(&self, change: ProfileChange) -> User {
        let mut profile = self.profile.lock();
        if let Some(image) = change.image {
            profile.image = Some(image);
        }
        if let Some(name) = change.name {
            profile.name = name;
        }
        self.snapshot_of(&profile)
    }

    /// 追加一条元数据（从不原地覆盖）。
    pub fn append_meta(&self, key: impl Into<String>, value: impl Into<String>) -> User {
        let mut profile = self.profile.lock();
        profile.meta.append(key, value);
        self.snapshot_of(&profile)
    }

    fn snapshot_of(&self, profile: &UserProfile) -> User {
        User {
            login: self.login.clone(),
            name: profile.name.clone(),
            image: profile.image.clone(),
            meta: profile.meta.clone(),
        }
    }
}
