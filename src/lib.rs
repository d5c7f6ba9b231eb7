pub mod config;
pub mod dashboard;
pub mod editor;
pub mod identity;
pub mod selection;
pub mod service;
pub mod session;
pub mod timestamps;

#[cfg(test)]
mod test_support;

#[cfg(feature = "desktop")]
mod app;

#[cfg(feature = "desktop")]
pub use app::run;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clearframe_lib=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
