use lazyimg_core::{
    Decision, ElementHandle, GeometryProvider, LazyImage, LoaderMessage, Rect, ScrollBroadcast,
    Transport, TransferState, ViewportSize, WidgetId,
};

/// 纵向图库布局：第 i 行占据 `[i * row_height, (i + 1) * row_height)`，减去滚动量即视口坐标
#[derive(Debug, Clone, Copy)]
pub struct GalleryLayout {
    pub row_height: u16,
    pub scroll: u16,
    pub viewport: ViewportSize,
    pub rows: usize,
}

impl GeometryProvider for GalleryLayout {
    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect> {
        let index = usize::try_from(element.0).ok()?;
        if index >= self.rows {
            return None;
        }
        let top = index as f64 * self.row_height as f64 - self.scroll as f64;
        Some(Rect::new(0.0, top, self.viewport.width, self.row_height as f64))
    }

    fn viewport_size(&self) -> ViewportSize {
        self.viewport
    }
}

impl GalleryLayout {
    pub fn content_height(&self) -> u16 {
        (self.rows as u64 * self.row_height as u64).min(u16::MAX as u64) as u16
    }

    pub fn max_scroll(&self) -> u16 {
        self.content_height().saturating_sub(self.viewport.height as u16)
    }
}

/// 每行一个懒加载部件；元素句柄就是行号
pub struct Gallery<T: Transport> {
    pub items: Vec<LazyImage<T>>,
    broadcast: ScrollBroadcast,
    layout: GalleryLayout,
}

impl<T: Transport> Gallery<T> {
    pub fn new(items: Vec<LazyImage<T>>, broadcast: ScrollBroadcast, row_height: u16) -> Self {
        let rows = items.len();
        Self {
            items,
            broadcast,
            layout: GalleryLayout {
                row_height,
                scroll: 0,
                viewport: ViewportSize::default(),
                rows,
            },
        }
    }

    pub fn layout(&self) -> GalleryLayout {
        self.layout
    }

    pub fn scroll(&self) -> u16 {
        self.layout.scroll
    }

    /// 挂载全部部件，返回立即开始加载的数量
    pub fn mount_all(&mut self) -> usize {
        let layout = self.layout;
        self.items
            .iter_mut()
            .map(|item| item.mount(&layout))
            .filter(|d| *d == Decision::Start)
            .count()
    }

    pub fn unmount_all(&mut self) {
        for item in &mut self.items {
            item.unmount();
        }
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.layout.viewport = ViewportSize::new(width as f64, height as f64);
        self.layout.scroll = self.layout.scroll.min(self.layout.max_scroll());
    }

    /// 视口尺寸变化：通知各部件新的布局，再按滚动处理
    pub fn resize(&mut self, width: u16, height: u16) {
        self.set_viewport(width, height);
        let layout = self.layout;
        for item in &mut self.items {
            if let Some(rect) = layout.bounding_rect(item.element()) {
                item.layout(rect);
            }
        }
        self.notify_scroll();
    }

    /// 滚动 `delta` 行，位置变化时广播
    pub fn scroll_by(&mut self, delta: i32) -> bool {
        let target = (self.layout.scroll as i32 + delta).clamp(0, self.layout.max_scroll() as i32);
        self.scroll_to(target as u16)
    }

    pub fn scroll_to(&mut self, scroll: u16) -> bool {
        let scroll = scroll.min(self.layout.max_scroll());
        if scroll == self.layout.scroll {
            return false;
        }
        self.layout.scroll = scroll;
        self.notify_scroll();
        true
    }

    pub fn scroll_to_end(&mut self) -> bool {
        self.scroll_to(self.layout.max_scroll())
    }

    /// 向所有订阅者广播一次滚动
    pub fn notify_scroll(&mut self) {
        let layout = self.layout;
        for id in self.broadcast.subscribers() {
            if let Some(item) = self.item_mut(id) {
                item.on_scroll(&layout);
            }
        }
    }

    /// 后台消息路由到对应部件
    pub fn dispatch(&mut self, msg: LoaderMessage) {
        match self.item_mut(msg.widget()) {
            Some(item) => item.handle(msg),
            None => tracing::warn!("message for unknown widget {:?}", msg.widget()),
        }
    }

    fn item_mut(&mut self, id: WidgetId) -> Option<&mut LazyImage<T>> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn item_at(&self, element: ElementHandle) -> Option<&LazyImage<T>> {
        self.items.iter().find(|item| item.element() == element)
    }

    pub fn count_in(&self, state: TransferState) -> usize {
        self.items.iter().filter(|item| item.state() == state).count()
    }

    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_requesting()).count()
    }

    /// 视口内（含部分可见）的行号区间
    pub fn visible_rows(&self) -> std::ops::Range<usize> {
        let row_height = self.layout.row_height.max(1) as usize;
        let scroll = self.layout.scroll as usize;
        let height = self.layout.viewport.height as usize;
        let first = scroll / row_height;
        let last = (scroll + height).div_ceil(row_height).min(self.items.len());
        first.min(last)..last
    }
}
