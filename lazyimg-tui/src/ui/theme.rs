use lazyimg_core::TransferState;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    pub fn secondary() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn active() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn success() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn warning() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn title() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    /// 按传输状态着色
    pub fn transfer(state: TransferState) -> Style {
        match state {
            TransferState::Idle => Self::secondary(),
            TransferState::Starting | TransferState::InProgress => Self::active(),
            TransferState::Succeeded => Self::success(),
            TransferState::Failed => Self::error(),
            TransferState::Aborted => Self::warning(),
        }
    }
}
