//! 内存版事件总线（InMemoryEventBus）
//!
//! 基于 `tokio::sync::broadcast` 的轻量实现，满足 `EventBusPublisher` 协议：
//! - `publish`：克隆并按 `(address, event)` 广播；
//! - `subscribe`：返回 `'static` 生命周期事件流，便于在 `tokio::spawn` 中消费；
//! - `set_available`：模拟总线不可用，供测试与示例演练补偿路径；
//! - 典型用途：测试环境、示例与本地开发。
//!
//! 注意：若无订阅者时发送将被忽略。

use crate::error::{EventError, EventResult as Result};
use crate::event::ServiceEvent;
use crate::eventing::EventBusPublisher;
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// 简单的内存事件总线实现
#[derive(Clone)]
pub struct InMemoryEventBus {
    tx: broadcast::Sender<(String, ServiceEvent)>,
    available: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// 创建一个内存总线，`capacity` 为广播缓冲区容量
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// 切换总线可用性；不可用时 `publish` 返回 `EventError::Bus`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// 返回一个 `'static` 生命周期的 `(address, event)` 流
    pub fn subscribe(&self) -> BoxStream<'static, Result<(String, ServiceEvent)>> {
        let rx = self.tx.subscribe();
        let stream =
            BroadcastStream::new(rx).map(|r| r.map_err(|e| EventError::bus(e.to_string())));
        Box::pin(stream)
    }
}

#[async_trait]
impl EventBusPublisher for InMemoryEventBus {
    async fn publish(&self, address: &str, event: &ServiceEvent) -> Result<()> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(EventError::bus("bus unavailable"));
        }
        // 若当前无订阅者，broadcast 的 send 会返回错误，这里视为非致命并忽略
        let _ = self.tx.send((address.to_string(), event.clone()));
        Ok(())
    }
}
