use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use lazyimg_core::{AbortReason, ElementHandle};

use crate::ui::log_view::LogLevel;

use super::{App, AppMessage, Notice, list_height};

impl App {
    pub(crate) fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::TermEvent(event) => self.handle_event(event),
            AppMessage::Loader(msg) => self.gallery.dispatch(msg),
            AppMessage::Lifecycle(element, notice) => self.on_notice(element, notice),
        }
    }

    pub(crate) fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                // 日志浮层打开时，只响应滚动和关闭
                if self.show_logs {
                    self.handle_logs_key(key);
                } else {
                    self.handle_normal_key(key);
                }
            }
            Event::Resize(width, height) => {
                self.gallery.resize(width, list_height(height));
            }
            _ => {}
        }
    }

    fn handle_logs_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('!') | KeyCode::Esc => {
                self.show_logs = false;
            }
            KeyCode::Char('j') | KeyCode::Down => self.logs.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.logs.scroll_up(),
            KeyCode::Char('h') | KeyCode::Left => self.logs.scroll_left(),
            KeyCode::Char('l') | KeyCode::Right => self.logs.scroll_right(),
            KeyCode::Char('G') => self.logs.scroll_to_end(),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let page = self.gallery.layout().viewport.height as i32;
        match (key.modifiers, key.code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                self.running = false;
            }
            (_, KeyCode::Char('!')) => {
                self.show_logs = true;
                self.logs.mark_read();
            }

            // 滚动即一次滚动事件，广播给仍在监听的部件
            (_, KeyCode::Char('j') | KeyCode::Down) => {
                self.gallery.scroll_by(1);
            }
            (_, KeyCode::Char('k') | KeyCode::Up) => {
                self.gallery.scroll_by(-1);
            }
            (_, KeyCode::Char('J') | KeyCode::PageDown) => {
                self.gallery.scroll_by(page);
            }
            (_, KeyCode::Char('K') | KeyCode::PageUp) => {
                self.gallery.scroll_by(-page);
            }
            (_, KeyCode::Char('g') | KeyCode::Home) => {
                self.gallery.scroll_to(0);
            }
            (_, KeyCode::Char('G') | KeyCode::End) => {
                self.gallery.scroll_to_end();
            }
            // 不滚动也重新评估一次（如加载失败后原地重试）
            (_, KeyCode::Char('r')) => {
                self.gallery.notify_scroll();
            }
            _ => {}
        }
    }

    fn on_notice(&mut self, element: ElementHandle, notice: Notice) {
        let name = self.item_title(element);
        match notice {
            Notice::LoadStart => tracing::debug!("开始加载 {name}"),
            Notice::Load => tracing::debug!("请求结束 {name}"),
            Notice::LoadEnd => self.logs.push(LogLevel::Info, format!("已加载 {name}")),
            Notice::Abort(AbortReason::LeftViewport) => {
                self.logs.push(LogLevel::Warn, format!("已中止 {name}：离开视口"));
            }
            // 退出时批量卸载，不必逐条记录
            Notice::Abort(AbortReason::Unmounted) => tracing::debug!("卸载中止 {name}"),
            Notice::Error(e) => self.logs.push(LogLevel::Error, format!("加载失败 {name}：{e}")),
        }
    }

    /// 透传属性里的 title 优先，否则用 URL
    pub(crate) fn item_title(&self, element: ElementHandle) -> String {
        match self.gallery.item_at(element) {
            Some(item) => item
                .config()
                .attribute("title")
                .unwrap_or(item.config().source_url.as_str())
                .to_string(),
            None => format!("#{}", element.0),
        }
    }
}
