//! 懒加载图片部件：可见性监视 + 传输状态机

use std::sync::Arc;

use crate::broadcast::ScrollBroadcast;
use crate::callbacks::{AbortReason, LifecycleCallbacks};
use crate::config::{ConfigError, LazyImageConfig};
use crate::convert::Converter;
use crate::error::{ConversionError, LoadError, TransportError};
use crate::transfer::{
    LoaderMessage, LoaderSink, Progress, RequestId, TransferState, Transport, TransportEvent,
    TransportEventKind, WidgetId,
};
use crate::viewport::{self, Decision, ElementHandle, GeometryProvider, Rect};

/// 部件工厂：分配 ID，并让所有部件共享传输层、转换器、消息通道和滚动订阅表
pub struct Loader<T: Transport + Clone> {
    transport: T,
    converter: Arc<dyn Converter>,
    sink: LoaderSink,
    broadcast: ScrollBroadcast,
    next_id: u64,
}

impl<T: Transport + Clone> Loader<T> {
    pub fn new(transport: T, converter: Arc<dyn Converter>, sink: LoaderSink) -> Self {
        Self {
            transport,
            converter,
            sink,
            broadcast: ScrollBroadcast::new(),
            next_id: 0,
        }
    }

    pub fn broadcast(&self) -> &ScrollBroadcast {
        &self.broadcast
    }

    /// 创建部件（尚未挂载，不会发起请求）
    pub fn create(
        &mut self,
        element: ElementHandle,
        config: LazyImageConfig,
        callbacks: LifecycleCallbacks,
    ) -> Result<LazyImage<T>, ConfigError> {
        let config = config.validate()?;
        let id = WidgetId(self.next_id);
        self.next_id += 1;

        Ok(LazyImage {
            id,
            element,
            displayed_image: config.default_image.clone(),
            config,
            callbacks,
            transport: self.transport.clone(),
            converter: self.converter.clone(),
            sink: self.sink.clone(),
            broadcast: self.broadcast.clone(),
            state: TransferState::Idle,
            progress: Progress::default(),
            request: None,
            generation: 0,
        })
    }
}

/// 部件当前持有的请求
struct TransferRequest<H> {
    id: RequestId,
    url: String,
    handle: H,
    status: Option<u16>,
    /// 已收到 LoadEnd，`on_load` 已触发
    load_finished: bool,
}

pub struct LazyImage<T: Transport> {
    id: WidgetId,
    element: ElementHandle,
    config: LazyImageConfig,
    callbacks: LifecycleCallbacks,
    transport: T,
    converter: Arc<dyn Converter>,
    sink: LoaderSink,
    broadcast: ScrollBroadcast,
    displayed_image: String,
    state: TransferState,
    progress: Progress,
    request: Option<TransferRequest<T::Handle>>,
    generation: u64,
}

impl<T: Transport> LazyImage<T> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn element(&self) -> ElementHandle {
        self.element
    }

    pub fn config(&self) -> &LazyImageConfig {
        &self.config
    }

    pub fn displayed_image(&self) -> &str {
        &self.displayed_image
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn is_requesting(&self) -> bool {
        self.state.is_active()
    }

    /// 当前请求最后一次响应的状态码
    pub fn status(&self) -> Option<u16> {
        self.request.as_ref().and_then(|r| r.status)
    }

    pub fn is_subscribed(&self) -> bool {
        self.broadcast.is_subscribed(self.id)
    }

    // 可见性

    /// 挂载：订阅滚动通知并立即评估一次
    pub fn mount(&mut self, geometry: &dyn GeometryProvider) -> Decision {
        self.broadcast.subscribe(self.id);
        self.evaluate(geometry)
    }

    /// 卸载：退订，并中止仍在进行的请求
    pub fn unmount(&mut self) {
        self.broadcast.unsubscribe(self.id);
        if self.is_requesting() {
            self.abort(AbortReason::Unmounted);
        }
    }

    /// 滚动通知；未订阅（已卸载或已加载成功）时忽略
    pub fn on_scroll(&mut self, geometry: &dyn GeometryProvider) -> Decision {
        if !self.is_subscribed() {
            return Decision::Nothing;
        }
        self.evaluate(geometry)
    }

    /// 宿主布局变化时调用
    pub fn layout(&mut self, rect: Rect) {
        (self.callbacks.on_layout)(self.element, rect);
    }

    pub fn is_in_viewport(&self, geometry: &dyn GeometryProvider) -> bool {
        geometry.bounding_rect(self.element).is_some_and(|rect| {
            viewport::is_in_viewport(&rect, geometry.viewport_size(), self.config.offset_pixels)
        })
    }

    fn evaluate(&mut self, geometry: &dyn GeometryProvider) -> Decision {
        let decision = viewport::decide(
            self.is_in_viewport(geometry),
            self.is_requesting(),
            self.progress.percent(),
            self.config.min_loaded_percent,
        );
        match decision {
            Decision::Start => self.start(),
            Decision::Abort => self.abort(AbortReason::LeftViewport),
            Decision::Continue => {
                log::trace!("{:?}: out of viewport, letting transfer finish", self.id);
            }
            Decision::Nothing => {}
        }
        decision
    }

    // 传输状态机

    /// 发起新请求；已有活动请求时不做任何事
    pub fn start(&mut self) {
        if self.is_requesting() {
            log::debug!("{:?}: start ignored, request already active", self.id);
            return;
        }
        self.retire_request();

        self.generation += 1;
        let id = RequestId {
            widget: self.id,
            generation: self.generation,
        };
        let url = self.config.source_url.clone();
        let handle = self.transport.open_request(id, &url);

        self.state = TransferState::Starting;
        self.progress = Progress { loaded: 0, total: None };
        log::debug!("{:?}: start {url} (generation {})", self.id, self.generation);
        (self.callbacks.on_load_start)(self.element);

        let request = self.request.insert(TransferRequest {
            id,
            url,
            handle,
            status: None,
            load_finished: false,
        });
        self.transport.send(&mut request.handle);
    }

    /// 中止当前请求。与 XHR 一致，`on_abort` / `on_load` 在此同步触发，
    /// 之后该请求的所有迟到消息都会因代数不匹配被丢弃。
    pub fn abort(&mut self, reason: AbortReason) {
        if !self.is_requesting() {
            return;
        }
        let Some(mut request) = self.request.take() else {
            return;
        };
        if !request.load_finished {
            self.transport.abort(&mut request.handle);
        }
        log::debug!("{:?}: aborted {} ({reason:?})", self.id, request.url);

        self.state = TransferState::Aborted;
        (self.callbacks.on_abort)(self.element, reason);
        if !request.load_finished {
            (self.callbacks.on_load)(self.element);
        }
    }

    /// 处理后台消息（宿主已按部件 ID 路由）。
    ///
    /// # Panics
    ///
    /// 2xx 的 `Load` 会用 `tokio::spawn` 启动转换任务，因此必须在 tokio 运行时内调用。
    pub fn handle(&mut self, msg: LoaderMessage) {
        if !self.is_current(msg.request()) {
            log::trace!("{:?}: dropping stale message for {:?}", self.id, msg.request());
            return;
        }
        match msg {
            LoaderMessage::Transport(TransportEvent { kind, .. }) => self.on_transport_event(kind),
            LoaderMessage::Converted { result, .. } => self.on_converted(result),
        }
    }

    fn is_current(&self, id: RequestId) -> bool {
        self.request.as_ref().is_some_and(|r| r.id == id)
    }

    fn on_transport_event(&mut self, kind: TransportEventKind) {
        match kind {
            TransportEventKind::LoadStart => {
                if self.state == TransferState::Starting {
                    self.state = TransferState::InProgress;
                }
            }
            TransportEventKind::Progress {
                loaded,
                total,
                length_computable,
            } => {
                if !self.is_requesting() {
                    return;
                }
                self.state = TransferState::InProgress;
                self.progress.loaded = loaded;
                if length_computable {
                    self.progress.total = Some(total);
                }
                (self.callbacks.on_progress)(self.element, self.progress);
            }
            TransportEventKind::Load { status, body } => {
                if !self.is_requesting() {
                    return;
                }
                if let Some(request) = self.request.as_mut() {
                    request.status = Some(status);
                }
                if (200..300).contains(&status) {
                    self.on_transport_success(body);
                } else {
                    self.fail(TransportError::Status(status).into());
                }
            }
            TransportEventKind::Error(msg) => {
                if self.is_requesting() {
                    self.fail(TransportError::Network(msg).into());
                }
            }
            TransportEventKind::LoadEnd => self.on_load_finished(),
        }
    }

    fn on_transport_success(&mut self, body: Vec<u8>) {
        // 响应体已完整到达，按 100% 计：转换期间离开视口只会放任其完成
        let len = body.len() as u64;
        self.state = TransferState::InProgress;
        self.progress = Progress { loaded: len, total: Some(len) };

        let Some(request) = self.request.as_ref() else {
            return;
        };
        let id = request.id;
        let future = self.converter.convert(body, &self.config.mime_type);
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let result = future.await;
            let _ = sink.send(LoaderMessage::Converted { request: id, result });
        });
    }

    fn on_converted(&mut self, result: Result<String, ConversionError>) {
        if !self.is_requesting() {
            return;
        }
        match result {
            Ok(image) => {
                self.displayed_image = image;
                self.state = TransferState::Succeeded;
                // 加载完成后不再关心滚动
                self.broadcast.unsubscribe(self.id);
                log::debug!("{:?}: loaded {}", self.id, self.config.source_url);
                (self.callbacks.on_load_end)(self.element);
            }
            Err(e) => self.fail(e.into()),
        }
        self.release_if_settled();
    }

    fn fail(&mut self, err: LoadError) {
        log::debug!("{:?}: {} failed: {err}", self.id, self.config.source_url);
        self.state = TransferState::Failed;
        (self.callbacks.on_error)(self.element, &err);
    }

    fn on_load_finished(&mut self) {
        let Some(request) = self.request.as_mut() else {
            return;
        };
        if request.load_finished {
            return;
        }
        request.load_finished = true;
        (self.callbacks.on_load)(self.element);
        self.release_if_settled();
    }

    /// 请求已结束且 LoadEnd 已到：释放句柄，之后同代消息全部视为过期
    fn release_if_settled(&mut self) {
        let settled = self
            .request
            .as_ref()
            .is_some_and(|r| r.load_finished && !self.state.is_active());
        if settled {
            self.request = None;
        }
    }

    /// 新请求取代旧请求前，补发旧请求缺失的 `on_load`
    fn retire_request(&mut self) {
        if let Some(old) = self.request.take() {
            if !old.load_finished {
                (self.callbacks.on_load)(self.element);
            }
        }
    }
}

impl<T: Transport> Drop for LazyImage<T> {
    fn drop(&mut self) {
        self.broadcast.unsubscribe(self.id);
        if let Some(mut request) = self.request.take() {
            if !request.load_finished {
                self.transport.abort(&mut request.handle);
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for LazyImage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyImage")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("source_url", &self.config.source_url)
            .field("state", &self.state)
            .field("progress", &self.progress)
            .field("generation", &self.generation)
            .finish()
    }
}
