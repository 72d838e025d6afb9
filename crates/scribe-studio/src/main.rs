//! Interactive scene editor over the scribe batch renderer.
//!
//! Keys: `1` select, `2` polyline, `3` brush, `Enter`/`Escape` finish the
//! current polyline. In select mode a click logs the entity under the cursor.
//! `W`/`S` zoom, `A`/`D` and `Space`/`Z` pan. The title shows the last
//! frame's primitive and batch counts.

mod app;
mod camera;
mod config;
mod demo;

use scribe_engine::logging::{LoggingConfig, init_logging};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    app::run(config::StudioConfig::from_env())
}
