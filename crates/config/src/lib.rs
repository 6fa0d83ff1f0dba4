//! 统一配置中心
//!
//! 提供状态核心的全局配置管理，包括：
//! - 订阅投递（邮箱容量、投递超时）
//! - 垃圾聊天标识
//! - 日志过滤
//!
//! 加载顺序：内置默认值 -> `kilogram.yaml`（可选）-> `KILOGRAM_` 前缀的环境变量，
//! 例如 `KILOGRAM_STATE__OBSERVER_CAPACITY=4`。

use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "kilogram.yaml";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "KILOGRAM_";

/// 全局应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 状态核心配置
    #[serde(default)]
    pub state: StateConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 状态核心配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// 每个订阅的投递通道容量
    pub observer_capacity: usize,
    /// 单个观察者的投递超时（毫秒）
    pub delivery_timeout_ms: u64,
    /// 免成员校验的系统聊天标识
    pub spam_chat_id: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            observer_capacity: 1,
            delivery_timeout_ms: 5_000,
            spam_chat_id: "0".to_string(),
        }
    }
}

impl StateConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `RUST_LOG` 未设置时使用的过滤表达式
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从默认配置文件和环境变量加载
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// 从指定配置文件和环境变量加载，文件不存在时忽略
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(path).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.state.validate()
    }
}

impl StateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.observer_capacity == 0 {
            return Err(ConfigError::InvalidStateConfig(
                "observer capacity must be greater than 0".to_string(),
            ));
        }

        if self.delivery_timeout_ms == 0 {
            return Err(ConfigError::InvalidStateConfig(
                "delivery timeout must be greater than 0".to_string(),
            ));
        }

        if self.spam_chat_id.trim().is_empty() {
            return Err(ConfigError::InvalidStateConfig(
                "spam chat id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid state configuration: {0}")]
    InvalidStateConfig(String),
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}
