use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

use gridedit::app::App;

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .try_init();

    #[cfg(feature = "desktop")]
    {
        match default_webview_data_dir() {
            Ok(webview_data_dir) => {
                dioxus::LaunchBuilder::desktop()
                    .with_cfg(
                        dioxus::desktop::Config::new()
                            .with_window(
                                dioxus::desktop::WindowBuilder::new().with_title("Grid Editor"),
                            )
                            .with_data_directory(webview_data_dir),
                    )
                    .launch(App);
            }
            Err(err) => {
                tracing::error!(target: "app", error = %err, "failed to prepare webview data dir");
            }
        }
    }

    #[cfg(not(feature = "desktop"))]
    dioxus::launch(App);
}

#[cfg_attr(not(feature = "desktop"), allow(dead_code))]
fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

#[cfg_attr(not(feature = "desktop"), allow(dead_code))]
fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "gridedit", "gridedit")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}
