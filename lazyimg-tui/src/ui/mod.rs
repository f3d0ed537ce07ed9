pub mod constants;
pub mod format;
pub mod log_view;
pub mod theme;
pub mod util;
