use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use lazyimg_core::{HttpTransport, LazyImage, TransferState};

use crate::ui::constants::{FOOTER_HEIGHT, HEADER_HEIGHT, PROGRESS_BAR_WIDTH, ROW_INDENT};
use crate::ui::format::{build_progress_bar, format_bytes, summarize_image, truncate_str};
use crate::ui::theme::Theme;

use super::App;

impl App {
    pub(crate) fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_gallery(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);

        if self.show_logs {
            crate::ui::log_view::render(frame, frame.area(), &self.logs);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let total = self.gallery.items.len();
        let loaded = self.gallery.count_in(TransferState::Succeeded);
        let failed = self.gallery.count_in(TransferState::Failed);

        let title_span = Span::styled("  LAZYIMG", Theme::title());
        let status = Span::styled(
            format!(
                "  {loaded}/{total} 已加载  预加载 ±{} 行",
                self.settings.loader.offset_rows
            ),
            Theme::secondary(),
        );

        let block_bg = Style::default().fg(Color::Black).bg(Color::DarkGray);
        let block_accent = Style::default().fg(Color::Black).bg(Color::Cyan);

        let mut right_spans: Vec<Span> = Vec::new();
        if self.logs.unread_count > 0 {
            right_spans.push(Span::styled(
                format!(" ! {} ", self.logs.unread_count),
                Style::default().fg(Color::White).bg(Color::Red),
            ));
        }
        if failed > 0 {
            right_spans.push(Span::styled(
                format!(" x {failed} "),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ));
        }
        right_spans.push(Span::styled(
            format!(" ↓ {} ", self.gallery.active_count()),
            block_accent,
        ));
        right_spans.push(Span::styled(
            chrono::Local::now().format(" %H:%M ").to_string(),
            block_bg,
        ));

        let right_width: u16 = right_spans.iter().map(|s| s.content.width() as u16).sum();

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(right_width)])
            .split(area);

        frame.render_widget(Paragraph::new(Line::from(vec![title_span, status])), cols[0]);
        frame.render_widget(
            Paragraph::new(Line::from(right_spans)).alignment(Alignment::Right),
            cols[1],
        );
    }

    fn render_gallery(&self, frame: &mut Frame, area: Rect) {
        if self.gallery.items.is_empty() {
            let hint = Paragraph::new(Span::styled("  配置中没有图片", Theme::secondary()));
            frame.render_widget(hint, area);
            return;
        }

        let layout = self.gallery.layout();
        let row_height = layout.row_height as usize;
        let rows = self.gallery.visible_rows();
        let text_width = (area.width as usize).saturating_sub(ROW_INDENT + 1);

        let mut lines: Vec<Line> = Vec::with_capacity(rows.len() * row_height);
        for (index, item) in self.gallery.items[rows.clone()].iter().enumerate() {
            let row = item_lines(rows.start + index, item, &self.item_title(item.element()), text_width);
            let used = row.len();
            lines.extend(row.into_iter().take(row_height));
            lines.extend((used..row_height).map(|_| Line::default()));
        }

        // 只构建了可见行，首行可能被部分滚出
        let skip = self.gallery.scroll() as usize - rows.start * row_height;
        let para = Paragraph::new(lines).scroll((skip as u16, 0));
        frame.render_widget(para, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hint = Paragraph::new(Span::styled(
            "  j/k 滚动  J/K 翻页  g/G 首尾  r 重新检测  ! 日志  q 退出",
            Theme::secondary(),
        ));
        frame.render_widget(hint, area);
    }
}

/// 一张图片三行：标题、传输状态、当前显示的图片
fn item_lines<'a>(
    index: usize,
    item: &LazyImage<HttpTransport>,
    title: &str,
    width: usize,
) -> Vec<Line<'a>> {
    let state = item.state();
    let progress = item.progress();
    let indent = " ".repeat(ROW_INDENT);

    let title_line = Line::from(vec![
        Span::styled(format!(" {:>4}  ", index + 1), Theme::secondary()),
        Span::styled(truncate_str(title, width), Theme::title()),
    ]);

    let mut status = vec![
        Span::raw(indent.clone()),
        Span::styled(format!("{:<8}", state.label()), Theme::transfer(state)),
    ];
    if state != TransferState::Idle {
        let percent = progress.percent();
        status.push(Span::styled(
            build_progress_bar(percent, PROGRESS_BAR_WIDTH),
            Theme::transfer(state),
        ));
        let amount = match (percent, progress.total) {
            (Some(p), Some(total)) => format!(
                " {p:>3.0}%  {}/{}",
                format_bytes(progress.loaded),
                format_bytes(total)
            ),
            _ => format!("   ?%  {}", format_bytes(progress.loaded)),
        };
        status.push(Span::styled(amount, Theme::secondary()));
    }
    if let Some(code) = item.status().filter(|c| !(200..300).contains(c)) {
        status.push(Span::styled(format!("  HTTP {code}"), Theme::error()));
    }

    let image = item.displayed_image();
    let image_line = if image.is_empty() {
        Line::from(vec![Span::raw(indent), Span::styled("(无占位图)", Theme::secondary())])
    } else {
        Line::from(vec![
            Span::raw(indent),
            Span::raw(truncate_str(&summarize_image(image), width)),
        ])
    };

    vec![title_line, Line::from(status), image_line]
}
