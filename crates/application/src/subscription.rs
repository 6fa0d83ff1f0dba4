//! 聊天新消息订阅
//!
//! 订阅持有观察者的接收端和一个子取消令牌。令牌触发后，后台清理任务
//! 在聊天锁内注销观察者；丢弃订阅也会触发令牌，因此注销一定发生。

use std::sync::Arc;

use domain::{ChatId, ChatRecord, Login, Message, ObserverId};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
pub struct Subscription {
    observer_id: ObserverId,
    chat_id: ChatId,
    receiver: mpsc::Receiver<Message>,
    cancel: CancellationToken,
}

impl Subscription {
    /// 注册观察者并启动清理任务，必须在 tokio 运行时内调用
    pub(crate) fn open(
        chat: Arc<ChatRecord>,
        login: Option<Login>,
        capacity: usize,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let (sender, receiver) = mpsc::channel(capacity);
        let observer_id = chat.register_observer(login, sender, cancel.clone());
        let chat_id = chat.id().clone();

        let token = cancel.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            if chat.remove_observer(&observer_id) {
                debug!("观察者 {} 已从聊天 {} 注销", observer_id, chat.id());
            }
        });

        Self {
            observer_id,
            chat_id,
            receiver,
            cancel,
        }
    }

    pub fn observer_id(&self) -> ObserverId {
        self.observer_id
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// 下一条消息；取消后返回 `None`
    pub async fn recv(&mut self) -> Option<Message> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            message = self.receiver.recv() => message,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 转换为惰性、不可重启的消息流
    pub fn into_stream(mut self) -> impl Stream<Item = Message> + Send {
        async_stream::stream! {
            while let Some(message) = self.recv().await {
                yield message;
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
