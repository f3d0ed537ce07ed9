use std::collections::VecDeque;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
}

pub struct LogEntry {
    pub time: chrono::DateTime<chrono::Local>,
    pub level: LogLevel,
    pub message: String,
}

const MAX_MEMORY_ENTRIES: usize = 200;

/// 日志面板的内存缓冲；每条同时转发给 tracing，由文件日志落盘
pub struct LogStore {
    pub entries: VecDeque<LogEntry>,
    pub unread_count: usize,
    pub scroll: usize,
    pub h_scroll: u16,
}

impl LogStore {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            unread_count: 0,
            scroll: 0,
            h_scroll: 0,
        }
    }

    pub fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Error => tracing::error!(target: "lazyimg::ui", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "lazyimg::ui", "{message}"),
            LogLevel::Info => tracing::info!(target: "lazyimg::ui", "{message}"),
        }

        self.entries.push_back(LogEntry {
            time: chrono::Local::now(),
            level,
            message,
        });
        if self.entries.len() > MAX_MEMORY_ENTRIES {
            self.entries.pop_front();
        }
        self.unread_count += 1;
    }

    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.entries.len().saturating_sub(1);
        if self.scroll < max {
            self.scroll += 1;
        }
    }

    /// 跳到最新一条
    pub fn scroll_to_end(&mut self) {
        self.scroll = self.entries.len().saturating_sub(1);
    }

    pub fn scroll_left(&mut self) {
        self.h_scroll = self.h_scroll.saturating_sub(4);
    }

    pub fn scroll_right(&mut self) {
        self.h_scroll = self.h_scroll.saturating_add(4);
    }
}

pub fn render(frame: &mut Frame, area: Rect, store: &LogStore) {
    let (content_area, hint_area) = super::util::overlay_panel(
        frame,
        area,
        "日志",
        super::constants::LOG_PANEL_WIDTH,
        super::constants::LOG_PANEL_HEIGHT,
    );

    let visible_lines = content_area.height as usize;

    let mut lines: Vec<Line> = Vec::new();

    if store.entries.is_empty() {
        lines.push(Line::from(Span::styled("  暂无日志", Theme::secondary())));
    } else {
        let total = store.entries.len();
        let start = store.scroll.min(total.saturating_sub(visible_lines));
        let end = (start + visible_lines).min(total);

        for entry in store.entries.range(start..end) {
            let time_str = entry.time.format("%H:%M:%S").to_string();
            let (level_str, level_style) = match &entry.level {
                LogLevel::Error => ("ERROR", Style::default().fg(Color::Red)),
                LogLevel::Warn => (" WARN", Style::default().fg(Color::Yellow)),
                LogLevel::Info => (" INFO", Style::default()),
            };

            lines.push(Line::from(vec![
                Span::styled(format!(" {time_str} "), Theme::secondary()),
                Span::styled(format!("{level_str} "), level_style),
                Span::raw(&entry.message),
            ]));
        }
    }

    let para = Paragraph::new(lines).scroll((0, store.h_scroll));
    frame.render_widget(para, content_area);

    // 固定提示（不受滚动影响）
    let hint = Paragraph::new(Span::styled(
        "    j/k 滚动  h/l 横移  G 最新  q/Esc 关闭",
        Theme::secondary(),
    ));
    frame.render_widget(hint, hint_area);
}
