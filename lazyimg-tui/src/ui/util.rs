use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Clear};
use ratatui::Frame;

/// 渲染居中浮层面板骨架（清除背景 + 边框 + 标题），
/// 返回 `(content_area, hint_area)`：content 可滚动，hint 钉在底部不受滚动影响。
pub fn overlay_panel(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    max_w: u16,
    max_h: u16,
) -> (Rect, Rect) {
    let panel_w = max_w.min(area.width.saturating_sub(4));
    let panel_h = max_h.min(area.height.saturating_sub(4));

    let x = area.x + (area.width.saturating_sub(panel_w)) / 2;
    let y = area.y + (area.height.saturating_sub(panel_h)) / 2;
    let panel_area = Rect::new(x, y, panel_w, panel_h);

    frame.render_widget(Clear, panel_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(panel_area);
    frame.render_widget(block, panel_area);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

    (chunks[0], chunks[1])
}
