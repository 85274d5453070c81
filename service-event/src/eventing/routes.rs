//! 服务地址路由（ServiceRoutes）
//!
//! `服务名 -> 总线地址` 的静态映射表：启动时装载一次，之后只读。
//!
use crate::error::{EventError, EventResult as Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 逻辑服务名到总线目标地址的映射
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRoutes {
    routes: HashMap<String, String>,
}

impl ServiceRoutes {
    pub fn new() -> Self {
        ServiceRoutes::default()
    }

    /// 注册一条路由；同名服务后写覆盖前写
    pub fn register(&mut self, service: impl Into<String>, address: impl Into<String>) {
        self.routes.insert(service.into(), address.into());
    }

    /// 解析服务的总线地址；未配置时返回 `EventError::UnknownService`
    pub fn address_of(&self, service: &str) -> Result<&str> {
        self.routes
            .get(service)
            .map(String::as_str)
            .ok_or_else(|| EventError::unknown_service(service))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S, A> FromIterator<(S, A)> for ServiceRoutes
where
    S: Into<String>,
    A: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, A)>>(iter: T) -> Self {
        let mut routes = ServiceRoutes::new();
        for (service, address) in iter {
            routes.register(service, address);
        }
        routes
    }
}
