use std::sync::Arc;

use config::StateConfig;
use domain::{ChatRecord, ChatType, DomainError, Login, Message};
use tracing::{debug, info};

use crate::{
    broadcaster::ObserverBroadcaster, clock::Clock, context::RequestContext,
    directory::Directory, error::ApplicationError, subscription::Subscription,
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub text: String,
}

pub struct MessageServiceDependencies {
    pub directory: Arc<Directory>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<ObserverBroadcaster>,
    pub settings: StateConfig,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    fn chat(&self, chat_id: &str) -> Result<Arc<ChatRecord>, ApplicationError> {
        self.deps
            .directory
            .find_chat(chat_id)
            .ok_or_else(|| DomainError::not_found("chat", chat_id).into())
    }

    // 发言权限：已登录的作者在垃圾聊天以外必须是成员，匿名作者不校验成员；
    // 频道只有所有者能发言
    fn ensure_can_post(
        &self,
        chat: &ChatRecord,
        author: Option<&Login>,
    ) -> Result<(), ApplicationError> {
        if let Some(login) = author {
            if chat.id().as_str() != self.deps.settings.spam_chat_id && !chat.is_member(login) {
                return Err(DomainError::MembershipRequired.into());
            }
        }

        if chat.kind() == ChatType::Channel && !author.is_some_and(|login| chat.is_owner(login)) {
            return Err(ApplicationError::Unauthorized);
        }

        Ok(())
    }

    /// 追加消息并扇出给聊天的全部观察者（作者本人的订阅除外）。
    ///
    /// 扇出在聊天的投递闸门内进行，实体锁在扇出开始前已经释放。
    /// 闸门一直持有到所有投递尝试结束，以保证每个观察者按标识顺序收到消息；
    /// 因此只要有一个观察者的邮箱停滞，这个聊天的每次发言都最多延迟
    /// `delivery_timeout`，并发的发言者在闸门前排队。其他聊天不受影响。
    pub async fn send_message(
        &self,
        ctx: &RequestContext,
        request: SendMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let chat = self.chat(&request.chat_id)?;
        let author = ctx.login().cloned();
        self.ensure_can_post(&chat, author.as_ref())?;

        let _gate = chat.delivery_gate().lock().await;
        let posted = chat.append_message(author, request.text, self.deps.clock.now());
        let message = posted.message;

        let report = self
            .deps
            .broadcaster
            .deliver(&message, posted.recipients)
            .await;
        debug!(
            chat_id = %message.chat_id,
            message_id = %message.id,
            delivered = report.delivered,
            timed_out = report.timed_out,
            closed = report.closed,
            "消息已发送"
        );
        Ok(message)
    }

    /// 订阅聊天的新消息。上下文的取消信号触发或订阅被丢弃时自动注销。
    pub async fn subscribe(
        &self,
        ctx: &RequestContext,
        chat_id: &str,
    ) -> Result<Subscription, ApplicationError> {
        let chat = self.chat(chat_id)?;
        let subscription = Subscription::open(
            chat,
            ctx.login().cloned(),
            self.deps.settings.observer_capacity,
            ctx.cancellation(),
        );
        info!(
            chat_id = %chat_id,
            observer_id = %subscription.observer_id(),
            "新的消息订阅"
        );
        Ok(subscription)
    }

    /// 聊天的完整消息历史，按标识顺序
    pub async fn messages(&self, chat_id: &str) -> Result<Vec<Message>, ApplicationError> {
        Ok(self.chat(chat_id)?.messages())
    }

    pub async fn find_message(
        &self,
        chat_id: &str,
        message_id: &str,
    ) -> Result<Option<Message>, ApplicationError> {
        Ok(self.chat(chat_id)?.message(message_id))
    }
}
