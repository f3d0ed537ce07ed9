use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// 日志过滤环境变量，如 `LAZYIMG_LOG=debug` 或 `LAZYIMG_LOG=lazyimg_core=trace`
const FILTER_ENV: &str = "LAZYIMG_LOG";
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log_file() -> Option<File> {
    let path = crate::config::paths::log_file().ok()?;
    OpenOptions::new().create(true).append(true).open(path).ok()
}

fn build_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish()
}

/// 终端被 TUI 占用，日志只追加写入缓存目录下的文件。
/// 核心库走 `log` 门面，`try_init` 同时装上 tracing-log 桥接。
/// 打开日志文件失败时静默放弃（日志面板仍可用）。
pub fn init() {
    let Some(file) = open_log_file() else {
        return;
    };
    let _ = build_subscriber(env_filter(), Mutex::new(file)).try_init();
}
