//! 调用栈作用域（EventScope）
//!
//! 将一条 `ServiceEvent` 贯穿嵌套/重入的操作调用树，保证一次业务事务
//! 只产生一条逻辑事件而不是每个内部子调用各产生一条：
//! - `enter`：最外层进入时打开作用域，借助 `task_local` 在任意退出路径
//!   （正常返回、错误、取消）上自动清理；
//! - `nested`：嵌套进入复用既有记录，仅递增深度计数；
//! - 作用域严格 per-task，从不跨任务共享，也不持久化。
//!
use crate::event::record::ServiceEvent;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

tokio::task_local! {
    static CURRENT: ScopeState;
}

#[derive(Clone)]
struct ScopeState {
    record: Arc<Mutex<ServiceEvent>>,
    depth: Arc<AtomicUsize>,
}

fn lock_record(cell: &Mutex<ServiceEvent>) -> MutexGuard<'_, ServiceEvent> {
    // 持锁区间都是同步短操作，中毒时直接恢复内部值
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 调用栈作用域：线程/任务局部的“当前事件记录”
pub struct EventScope;

impl EventScope {
    /// 当前调用栈上是否已有打开的作用域
    pub fn active() -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// 当前嵌套深度；无作用域时为 0
    pub fn depth() -> usize {
        CURRENT
            .try_with(|s| s.depth.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// 当前作用域的上下文 ID
    pub fn context_id() -> Option<String> {
        Self::with_current(|ev| ev.context_id().to_string())
    }

    /// 读取/修改当前作用域内的事件记录；无作用域时返回 `None`
    pub fn with_current<R>(f: impl FnOnce(&mut ServiceEvent) -> R) -> Option<R> {
        CURRENT.try_with(|s| f(&mut lock_record(&s.record))).ok()
    }

    /// 以 `record` 为当前记录打开最外层作用域并执行 `fut`。
    ///
    /// 作用域随 `fut` 结束而关闭，无论正常返回、错误还是取消；
    /// 调用方须先以 [`EventScope::active`] 确认当前没有打开的作用域。
    pub async fn enter<F>(record: Arc<Mutex<ServiceEvent>>, fut: F) -> F::Output
    where
        F: Future,
    {
        let state = ScopeState {
            record,
            depth: Arc::new(AtomicUsize::new(1)),
        };
        CURRENT.scope(state, fut).await
    }

    /// 在既有作用域内执行嵌套的事件触发型调用：复用记录，只调整深度计数。
    ///
    /// 若当前没有作用域则直接执行 `fut`（等价于普通调用）。
    pub async fn nested<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        let Ok(depth) = CURRENT.try_with(|s| s.depth.clone()) else {
            return fut.await;
        };
        depth.fetch_add(1, Ordering::Relaxed);
        let _guard = DepthGuard(depth);
        fut.await
    }
}

struct DepthGuard(Arc<AtomicUsize>);

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
