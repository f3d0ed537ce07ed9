mod app;
mod config;
mod logging;
mod ui;

use std::path::PathBuf;

use anyhow::Result;

// 所有部件状态都在 UI 任务上，单线程运行时即可
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init();

    // 可选参数：图库配置文件路径，缺省使用 ~/.config/lazyimg/config.toml
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut app = app::App::new(config_path)?;
    app.run().await
}
