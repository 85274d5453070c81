//! 事件存储协议（EventStore）
//!
use crate::{
    error::EventResult as Result,
    event::{EventStatus, ServiceEvent},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 事件存储：以 `id` 寻址的持久化事件日志
///
/// 拦截器路径与 Housekeeper 并发读写同一存储，状态写入必须经由
/// [`EventStatus::merge`] 的条件更新语义：`SENT` 为终态，
/// 迟到的 `SEND_ERROR` 写入不得将其覆盖（last-writer-wins 不安全）。
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 以 `Created` 状态持久化一条新记录。
    ///
    /// 支持事务的后端须让插入加入调用方的业务事务：
    /// 业务回滚时，事件意图随之回滚，实体写入与事件意图原子提交。
    async fn insert(&self, event: &ServiceEvent) -> Result<()>;

    /// 返回当前持久化的记录；不存在时为 `None`
    async fn find(&self, id: &str) -> Result<Option<ServiceEvent>>;

    /// 条件状态更新（read-modify-write），返回最终落盘的状态。
    ///
    /// 合并结果可能与请求值不同（例如记录已是 `SENT`）；
    /// 目标记录不存在时返回 `EventError::NotFound`。
    async fn update_status(&self, id: &str, status: EventStatus) -> Result<EventStatus>;

    /// 列出 `timestamp <= older_than` 且状态非 `SENT` 的记录，最旧在前
    async fn list_pending(&self, older_than: DateTime<Utc>) -> Result<Vec<ServiceEvent>>;
}
