pub const LOG_PANEL_WIDTH: u16 = 90;
pub const LOG_PANEL_HEIGHT: u16 = 20;

pub const HEADER_HEIGHT: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;

/// 行首缩进（序号列宽度）
pub const ROW_INDENT: usize = 7;
pub const PROGRESS_BAR_WIDTH: usize = 20;
