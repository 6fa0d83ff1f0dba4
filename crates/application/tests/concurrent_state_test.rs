//! 并发状态一致性测试
//!
//! 验证多任务同时注册、建群、发言、订阅时目录和聊天记录保持一致

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use application::{
    ApplicationError, CreateChatRequest, ErrorKind, RegisterUserRequest, SendMessageRequest,
    Services,
};
use config::StateConfig;
use domain::ChatType;

fn settings() -> StateConfig {
    StateConfig {
        observer_capacity: 64,
        spam_chat_id: "spam".to_string(),
        ..StateConfig::default()
    }
}

async fn register(services: &Services, login: &str) {
    services
        .users
        .register(RegisterUserRequest {
            login: login.to_string(),
            password: "pw".to_string(),
            name: login.to_string(),
        })
        .await
        .unwrap();
}

/// 注册 user0..user{n} 并创建 user0 所有的群聊
async fn group_of(services: &Services, size: usize) -> String {
    for i in 0..size {
        register(services, &format!("user{}", i)).await;
    }
    services
        .chats
        .create_chat(
            &services.users.context_for(Some("user0")),
            CreateChatRequest {
                kind: ChatType::Group,
                name: "load".to_string(),
                members: (1..size).map(|i| format!("user{}", i)).collect(),
            },
        )
        .await
        .unwrap()
        .id
        .as_str()
        .to_string()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_same_login() {
    let services = Arc::new(Services::new(settings()).unwrap());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let services = services.clone();
            tokio::spawn(async move {
                services
                    .users
                    .register(RegisterUserRequest {
                        login: "alice".to_string(),
                        password: format!("pw{}", i),
                        name: format!("Alice {}", i),
                    })
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for result in futures::future::join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::AlreadyExists),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(services.users.list_users().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_chat_unique_ids() {
    let services = Arc::new(Services::new(settings()).unwrap());
    for login in ["alice", "bob", "carol"] {
        register(&services, login).await;
    }

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let services = services.clone();
            tokio::spawn(async move {
                let ctx = services.users.context_for(Some("alice"));
                services
                    .chats
                    .create_chat(
                        &ctx,
                        CreateChatRequest {
                            kind: ChatType::Group,
                            name: "g".to_string(),
                            members: vec!["bob".to_string(), "carol".to_string()],
                        },
                    )
                    .await
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap().as_str().to_string()));
    }

    let expected: HashSet<_> = (0..32).map(|i| i.to_string()).collect();
    assert_eq!(ids, expected);
    let listed: Vec<_> = services
        .chats
        .list_chats()
        .await
        .into_iter()
        .map(|chat| chat.id.as_str().to_string())
        .collect();
    let in_order: Vec<_> = (0..32).map(|i| i.to_string()).collect();
    assert_eq!(listed, in_order);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_send_message_consistency() {
    let services = Arc::new(Services::new(settings()).unwrap());
    let chat_id = group_of(&services, 8).await;

    let tasks: Vec<_> = (0..8)
        .flat_map(|author| (0..25).map(move |n| (author, n)))
        .map(|(author, n)| {
            let services = services.clone();
            let chat_id = chat_id.clone();
            tokio::spawn(async move {
                let ctx = services.users.context_for(Some(&format!("user{}", author)));
                services
                    .messages
                    .send_message(
                        &ctx,
                        SendMessageRequest {
                            chat_id,
                            text: format!("{}-{}", author, n),
                        },
                    )
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap().id.as_str().to_string()));
    }
    assert_eq!(ids.len(), 200);

    let history = services.messages.messages(&chat_id).await.unwrap();
    assert_eq!(history.len(), 200);
    for (position, message) in history.iter().enumerate() {
        assert_eq!(message.id.as_str(), position.to_string());
        let indexed = services
            .messages
            .find_message(&chat_id, message.id.as_str())
            .await
            .unwrap();
        assert_eq!(indexed.as_ref(), Some(message));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_subscriber_observes_increasing_ids() {
    let services = Arc::new(Services::new(settings()).unwrap());
    let chat_id = group_of(&services, 4).await;

    let observer_ctx = services.users.context_for(Some("user0"));
    let mut subscription = services
        .messages
        .subscribe(&observer_ctx, &chat_id)
        .await
        .unwrap();

    let senders: Vec<_> = (1..4)
        .map(|author| {
            let services = services.clone();
            let chat_id = chat_id.clone();
            tokio::spawn(async move {
                let ctx = services.users.context_for(Some(&format!("user{}", author)));
                for n in 0..20 {
                    services
                        .messages
                        .send_message(
                            &ctx,
                            SendMessageRequest {
                                chat_id: chat_id.clone(),
                                text: n.to_string(),
                            },
                        )
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    let mut received = Vec::new();
    while received.len() < 60 {
        let message = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
            .await
            .expect("subscriber should keep receiving")
            .expect("subscription should stay open");
        received.push(message.id.as_str().parse::<usize>().unwrap());
    }
    for sender in senders {
        sender.await.unwrap();
    }

    let expected: Vec<_> = (0..60).collect();
    assert_eq!(received, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribe_and_drop_leaves_no_observers() {
    let services = Arc::new(Services::new(settings()).unwrap());
    let chat_id = group_of(&services, 4).await;
    let chat = services.directory.find_chat(&chat_id).unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let services = services.clone();
            let chat_id = chat_id.clone();
            tokio::spawn(async move {
                let ctx = services.users.context_for(Some(&format!("user{}", i % 4)));
                let subscription = services.messages.subscribe(&ctx, &chat_id).await?;
                tokio::task::yield_now().await;
                drop(subscription);
                Ok::<_, ApplicationError>(())
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for _ in 0..200 {
        if chat.observer_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(chat.observer_count(), 0);

    // 注销后的发言不会阻塞
    let ctx = services.users.context_for(Some("user1"));
    services
        .messages
        .send_message(
            &ctx,
            SendMessageRequest {
                chat_id: chat_id.clone(),
                text: "after".to_string(),
            },
        )
        .await
        .unwrap();
}
