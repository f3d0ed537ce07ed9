use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::transfer::WidgetId;

/// 全局滚动通知的订阅表，按部件 ID 登记。
///
/// 所有部件都运行在 UI 任务上，克隆共享同一张表。宿主收到滚动后调用
/// [`ScrollBroadcast::subscribers`]，再逐个调用部件的 `on_scroll`。
#[derive(Debug, Clone, Default)]
pub struct ScrollBroadcast {
    subscribers: Rc<RefCell<BTreeSet<WidgetId>>>,
}

impl ScrollBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回是否为新订阅
    pub fn subscribe(&self, id: WidgetId) -> bool {
        self.subscribers.borrow_mut().insert(id)
    }

    /// 返回之前是否处于订阅状态
    pub fn unsubscribe(&self, id: WidgetId) -> bool {
        self.subscribers.borrow_mut().remove(&id)
    }

    pub fn is_subscribed(&self, id: WidgetId) -> bool {
        self.subscribers.borrow().contains(&id)
    }

    /// 当前订阅者快照（按 ID 升序）。
    /// 返回副本，遍历期间部件可以安全地退订自己。
    pub fn subscribers(&self) -> Vec<WidgetId> {
        self.subscribers.borrow().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }
}
