//! 内存版事件存储（InMemoryEventStore）
//!
//! `HashMap` + 互斥锁的轻量实现，满足 `EventStore` 协议；
//! 没有事务能力：业务操作失败后插入的记录会以 `Created` 状态残留，
//! 由 `list_pending` 暴露给补偿任务（消费方按幂等处理）。
//! 典型用途：测试环境、示例与本地开发。
//!
use crate::error::{EventError, EventResult as Result};
use crate::event::{EventStatus, ServiceEvent};
use crate::store::EventStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 简单的内存事件存储实现
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    records: Arc<Mutex<HashMap<String, ServiceEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        InMemoryEventStore::default()
    }

    /// 当前保存的记录条数
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, ServiceEvent>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: &ServiceEvent) -> Result<()> {
        let mut records = self.guard();
        if records.contains_key(event.id()) {
            return Err(EventError::store(format!(
                "duplicate event id: {}",
                event.id()
            )));
        }
        records.insert(event.id().to_string(), event.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<ServiceEvent>> {
        Ok(self.guard().get(id).cloned())
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<EventStatus> {
        let mut records = self.guard();
        let record = records
            .get_mut(id)
            .ok_or_else(|| EventError::not_found(id))?;
        let merged = EventStatus::merge(record.status(), status);
        record.set_status(merged);
        Ok(merged)
    }

    async fn list_pending(&self, older_than: DateTime<Utc>) -> Result<Vec<ServiceEvent>> {
        let mut pending: Vec<ServiceEvent> = self
            .guard()
            .values()
            .filter(|ev| !ev.status().is_terminal() && ev.timestamp() <= older_than)
            .cloned()
            .collect();
        pending.sort_by_key(ServiceEvent::timestamp);
        Ok(pending)
    }
}
