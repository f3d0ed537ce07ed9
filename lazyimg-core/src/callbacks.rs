use crate::error::LoadError;
use crate::transfer::Progress;
use crate::viewport::{ElementHandle, Rect};

/// 中止原因，随 `on_abort` 一起上报
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// 离开视口时进度不足
    LeftViewport,
    /// 部件被卸载
    Unmounted,
}

/// 生命周期回调，默认全部为空操作。构造时绑定到部件，之后只由部件调用。
pub struct LifecycleCallbacks {
    pub(crate) on_layout: Box<dyn FnMut(ElementHandle, Rect)>,
    pub(crate) on_error: Box<dyn FnMut(ElementHandle, &LoadError)>,
    pub(crate) on_load: Box<dyn FnMut(ElementHandle)>,
    pub(crate) on_load_end: Box<dyn FnMut(ElementHandle)>,
    pub(crate) on_load_start: Box<dyn FnMut(ElementHandle)>,
    pub(crate) on_abort: Box<dyn FnMut(ElementHandle, AbortReason)>,
    pub(crate) on_progress: Box<dyn FnMut(ElementHandle, Progress)>,
}

impl Default for LifecycleCallbacks {
    fn default() -> Self {
        Self {
            on_layout: Box::new(|_, _| {}),
            on_error: Box::new(|_, _| {}),
            on_load: Box::new(|_| {}),
            on_load_end: Box::new(|_| {}),
            on_load_start: Box::new(|_| {}),
            on_abort: Box::new(|_, _| {}),
            on_progress: Box::new(|_, _| {}),
        }
    }
}

impl LifecycleCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_layout(mut self, f: impl FnMut(ElementHandle, Rect) + 'static) -> Self {
        self.on_layout = Box::new(f);
        self
    }

    pub fn on_error(mut self, f: impl FnMut(ElementHandle, &LoadError) + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    /// 每个请求结束时触发一次，不论成功、失败或中止
    pub fn on_load(mut self, f: impl FnMut(ElementHandle) + 'static) -> Self {
        self.on_load = Box::new(f);
        self
    }

    /// 仅在下载并转换成功、显示图已替换后触发
    pub fn on_load_end(mut self, f: impl FnMut(ElementHandle) + 'static) -> Self {
        self.on_load_end = Box::new(f);
        self
    }

    pub fn on_load_start(mut self, f: impl FnMut(ElementHandle) + 'static) -> Self {
        self.on_load_start = Box::new(f);
        self
    }

    /// 通常先于该请求的 `on_load` 触发。唯一例外是转换进行中被卸载：
    /// 此时响应早已结束、`on_load` 已触发，只会再补一次 `on_abort(Unmounted)`。
    pub fn on_abort(mut self, f: impl FnMut(ElementHandle, AbortReason) + 'static) -> Self {
        self.on_abort = Box::new(f);
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(ElementHandle, Progress) + 'static) -> Self {
        self.on_progress = Box::new(f);
        self
    }
}

impl std::fmt::Debug for LifecycleCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleCallbacks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::TransportError;

    #[test]
    fn defaults_are_noops() {
        let mut cbs = LifecycleCallbacks::default();
        let el = ElementHandle(1);
        (cbs.on_load)(el);
        (cbs.on_error)(el, &LoadError::Transport(TransportError::Status(500)));
        (cbs.on_abort)(el, AbortReason::Unmounted);
    }

    #[test]
    fn builder_replaces_individual_handlers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut cbs = LifecycleCallbacks::new().on_error(move |el, err| {
            s.borrow_mut().push(format!("{}:{err}", el.0));
        });
        (cbs.on_error)(ElementHandle(3), &LoadError::Transport(TransportError::Status(404)));
        (cbs.on_load)(ElementHandle(3));
        assert_eq!(
            *seen.borrow(),
            vec!["3:transport error: unexpected status 404".to_string()]
        );
    }
}
