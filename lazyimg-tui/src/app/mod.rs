mod event;
mod gallery;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::Event;
use tokio::sync::mpsc;

use lazyimg_core::{
    AbortReason, DataUriConverter, ElementHandle, HttpTransport, LifecycleCallbacks, Loader,
    LoaderMessage,
};

use crate::config::settings::Settings;
use crate::ui::constants::{FOOTER_HEIGHT, HEADER_HEIGHT};
use crate::ui::log_view::{LogLevel, LogStore};

use gallery::Gallery;

/// 异步消息，从后台任务发送到主循环
pub enum AppMessage {
    /// 终端事件（由持久后台线程读取）
    TermEvent(Event),
    /// 传输层 / 转换任务的消息
    Loader(LoaderMessage),
    /// 部件生命周期回调，转成日志
    Lifecycle(ElementHandle, Notice),
}

#[derive(Debug, Clone)]
pub enum Notice {
    LoadStart,
    Load,
    LoadEnd,
    Abort(AbortReason),
    Error(String),
}

pub struct App {
    pub running: bool,
    pub settings: Settings,
    pub gallery: Gallery<HttpTransport>,
    pub show_logs: bool,
    pub logs: LogStore,
    pub msg_tx: mpsc::UnboundedSender<AppMessage>,
    msg_rx: mpsc::UnboundedReceiver<AppMessage>,
    /// 主循环启动时转交给转发任务
    loader_rx: Option<mpsc::UnboundedReceiver<LoaderMessage>>,
}

impl App {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let settings = Settings::load(config_path.as_deref())?;
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (loader_tx, loader_rx) = mpsc::unbounded_channel();
        let mut logs = LogStore::new();

        let timeout = Duration::from_secs(settings.loader.timeout_secs);
        let transport =
            HttpTransport::new(loader_tx.clone(), Some(timeout)).context("HTTP 客户端初始化失败")?;
        let mut loader = Loader::new(transport, Arc::new(DataUriConverter), loader_tx);

        let mut items = Vec::with_capacity(settings.images.len());
        for entry in &settings.images {
            let config = match settings.loader.image_config(entry) {
                Ok(config) => config,
                Err(e) => {
                    logs.push(LogLevel::Error, format!("跳过图片：{e:#}"));
                    continue;
                }
            };
            // 元素句柄即行号，跳过的条目不占行
            let element = ElementHandle(items.len() as u64);
            let item = loader.create(element, config, lifecycle_callbacks(&msg_tx))?;
            items.push(item);
        }
        tracing::info!("gallery ready: {} images", items.len());

        let gallery = Gallery::new(items, loader.broadcast().clone(), settings.row_height());

        Ok(Self {
            running: true,
            settings,
            gallery,
            show_logs: false,
            logs,
            msg_tx,
            msg_rx,
            loader_rx: Some(loader_rx),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();

        let result = self.main_loop(&mut terminal).await;

        // 退出前中止所有进行中的下载
        self.gallery.unmount_all();

        ratatui::restore();

        result
    }

    async fn main_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> Result<()> {
        // 启动持久的事件读取线程，避免 select! + spawn_blocking 丢事件
        let event_tx = self.msg_tx.clone();
        std::thread::spawn(move || {
            while let Ok(ev) = crossterm::event::read() {
                if event_tx.send(AppMessage::TermEvent(ev)).is_err() {
                    break;
                }
            }
        });

        // 加载消息转发为 AppMessage，与终端事件排在同一队列里
        if let Some(mut loader_rx) = self.loader_rx.take() {
            let loader_tx = self.msg_tx.clone();
            tokio::spawn(async move {
                while let Some(msg) = loader_rx.recv().await {
                    if loader_tx.send(AppMessage::Loader(msg)).is_err() {
                        break;
                    }
                }
            });
        }

        let size = terminal.size()?;
        self.gallery.set_viewport(size.width, list_height(size.height));
        let started = self.gallery.mount_all();
        tracing::info!("mounted, {started} images in viewport");

        while self.running {
            terminal.draw(|f| self.render(f))?;

            // 等待至少一条消息
            if let Some(msg) = self.msg_rx.recv().await {
                self.handle_message(msg);
            }
            // 批量处理所有已积压的消息，避免每条消息都触发一次 draw
            while let Ok(msg) = self.msg_rx.try_recv() {
                self.handle_message(msg);
            }
        }
        Ok(())
    }
}

/// 列表区高度 = 终端高度 - 标题栏 - 底栏
pub(crate) fn list_height(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT)
}

/// 回调只把通知投递回主循环，不直接碰 UI 状态
fn lifecycle_callbacks(tx: &mpsc::UnboundedSender<AppMessage>) -> LifecycleCallbacks {
    let notify = |notice: fn() -> Notice| {
        let tx = tx.clone();
        move |element: ElementHandle| {
            let _ = tx.send(AppMessage::Lifecycle(element, notice()));
        }
    };
    let abort_tx = tx.clone();
    let error_tx = tx.clone();

    LifecycleCallbacks::new()
        .on_layout(|element, rect| {
            tracing::trace!("{element:?} laid out at top={} bottom={}", rect.top, rect.bottom);
        })
        .on_load_start(notify(|| Notice::LoadStart))
        .on_load(notify(|| Notice::Load))
        .on_load_end(notify(|| Notice::LoadEnd))
        .on_abort(move |element, reason| {
            let _ = abort_tx.send(AppMessage::Lifecycle(element, Notice::Abort(reason)));
        })
        .on_error(move |element, err| {
            let _ = error_tx.send(AppMessage::Lifecycle(element, Notice::Error(err.to_string())));
        })
}
