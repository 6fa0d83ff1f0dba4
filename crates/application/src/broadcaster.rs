//! 新消息扇出
//!
//! 每个观察者各自进行一次有超时的投递尝试，所有尝试并行进行。
//! 邮箱已满时只阻塞该观察者自己的尝试，超时后放弃这条消息；
//! 订阅被取消时尝试立即结束。

use std::time::Duration;

use config::StateConfig;
use domain::{Message, Recipient};
use futures::future::join_all;
use tracing::{debug, warn};

/// 一次扇出的投递结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub timed_out: usize,
    pub closed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.timed_out + self.closed
    }
}

enum DeliveryOutcome {
    Delivered,
    TimedOut,
    Closed,
}

#[derive(Debug, Clone)]
pub struct ObserverBroadcaster {
    timeout: Duration,
}

impl ObserverBroadcaster {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &StateConfig) -> Self {
        Self::new(config.delivery_timeout())
    }

    pub async fn deliver(&self, message: &Message, recipients: Vec<Recipient>) -> DeliveryReport {
        let attempts = recipients
            .into_iter()
            .map(|recipient| self.deliver_one(recipient, message.clone()));

        let mut report = DeliveryReport::default();
        for outcome in join_all(attempts).await {
            match outcome {
                DeliveryOutcome::Delivered => report.delivered += 1,
                DeliveryOutcome::TimedOut => report.timed_out += 1,
                DeliveryOutcome::Closed => report.closed += 1,
            }
        }
        report
    }

    async fn deliver_one(&self, recipient: Recipient, message: Message) -> DeliveryOutcome {
        let Recipient {
            observer_id,
            sender,
            cancel,
        } = recipient;
        let message_id = message.id.clone();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("观察者 {} 已取消订阅，丢弃消息 {}", observer_id, message_id);
                DeliveryOutcome::Closed
            }
            result = tokio::time::timeout(self.timeout, sender.send(message)) => match result {
                Ok(Ok(())) => DeliveryOutcome::Delivered,
                Ok(Err(_)) => DeliveryOutcome::Closed,
                Err(_) => {
                    warn!(
                        observer_id = %observer_id,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "观察者邮箱已满，投递超时"
                    );
                    DeliveryOutcome::TimedOut
                }
            },
        }
    }
}
