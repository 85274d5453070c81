//! 安全上下文（Session）边界
//!
//! 事件捕获需要知道“由谁、在哪个租户作用域下”触发了操作；
//! 该信息由外部安全框架提供，这里只定义只读的协作接口。
//!
use bon::Builder;

/// 当前调用方的会话信息
#[derive(Builder, Debug, Clone)]
pub struct Session {
    /// 调用方用户 ID
    user_id: String,
    /// 调用方所属租户作用域 ID
    scope_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, scope_id: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
            scope_id: scope_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }
}

/// 会话提供者：由安全框架实现，拦截器只读取
pub trait SessionProvider: Send + Sync {
    fn session(&self) -> Session;
}

/// 固定会话提供者（测试与示例用）
#[derive(Debug, Clone)]
pub struct StaticSessionProvider {
    session: Session,
}

impl StaticSessionProvider {
    pub fn new(session: Session) -> Self {
        StaticSessionProvider { session }
    }
}

impl SessionProvider for StaticSessionProvider {
    fn session(&self) -> Session {
        self.session.clone()
    }
}
