//! 补偿任务（Housekeeper）
//!
//! 周期扫描事件存储中卡在非终态的记录并重试发布：
//! - 每条记录的状态机：`CREATED`/`SEND_ERROR` →（重试发布）→ `SENT`（终态）
//!   或保持 `SEND_ERROR` 待下轮重试；
//! - 与正在执行的拦截器路径相互独立，靠“合并规则偏向 SENT”的条件更新收敛；
//! - 提供关闭与等待的 `HousekeeperHandle`。
//!
use crate::event::EventStatus;
use crate::eventing::{EventBusPublisher, ServiceRoutes, publish_and_mark};
use crate::store::EventStore;
use bon::Builder;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Housekeeper：
/// - 周期性从 `EventStore` 拉取超过年龄阈值的待投递记录
/// - 重新解析地址并重试发布，按与拦截器相同的状态更新契约落盘
#[derive(Builder)]
pub struct Housekeeper {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn EventBusPublisher>,
    routes: Arc<ServiceRoutes>,
    #[builder(default)]
    config: HousekeeperConfig,
}

impl Housekeeper {
    /// 启动周期补偿任务，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> HousekeeperHandle {
        let token = CancellationToken::new();
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(1);

        let this = self.clone();
        let task_token = token.clone();
        let interval = self.config.sweep_interval;
        tasks.push(tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => this.sweep().await,
                }
            }
        }));

        HousekeeperHandle { token, tasks }
    }

    /// 执行一轮补偿扫描。
    ///
    /// 对扫描与重试之间被拦截器并发终结为 `SENT` 的记录直接短路跳过；
    /// 残余竞争由存储层的合并规则兜底。
    pub async fn sweep(&self) {
        let age = chrono::Duration::from_std(self.config.age_threshold)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let cutoff = Utc::now() - age;

        let pending = match self.store.list_pending(cutoff).await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "housekeeper failed to list pending events");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "housekeeper retrying pending events");

        for event in pending {
            match self.store.find(event.id()).await {
                Ok(Some(current)) if current.status() == EventStatus::Sent => continue,
                Ok(Some(current)) => {
                    publish_and_mark(
                        self.store.as_ref(),
                        self.bus.as_ref(),
                        &self.routes,
                        &current,
                    )
                    .await;
                }
                // 保留策略属外部关注点，记录消失视为已被处理
                Ok(None) => continue,
                Err(err) => {
                    warn!(event_id = event.id(), error = %err, "housekeeper failed to reload event");
                }
            }
        }
    }
}

/// 补偿任务配置
#[derive(Clone, Copy, Debug)]
pub struct HousekeeperConfig {
    /// 两轮扫描之间的间隔
    pub sweep_interval: Duration,
    /// 只补偿早于该年龄阈值的记录，避免与进行中的拦截器调用抢跑
    pub age_threshold: Duration,
}

impl Default for HousekeeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(30),
            age_threshold: Duration::from_secs(30),
        }
    }
}

/// 运行句柄：用于优雅关闭与等待任务结束
pub struct HousekeeperHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl HousekeeperHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            let _ = t.await;
        }
    }
}

impl Drop for HousekeeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
