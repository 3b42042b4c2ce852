//! Tic-tac-toe in the terminal.
//!
//! Click a square to play, click a history entry to go back. `q`, Esc or
//! Ctrl+C quits.
//!
//! Environment:
//! - `SPARK_VDOM_MODE` - `fullscreen` (default) or `inline`
//! - `SPARK_VDOM_LOG` - write logs to this file, filtered by `RUST_LOG`
//!
//! Run with: cargo run --example tictactoe

mod game;

use std::fs::File;
use std::sync::Mutex;

use spark_vdom::pipeline::{mount_terminal, render_mode_from_env};
use spark_vdom::ComponentRef;
use tracing_subscriber::EnvFilter;

use game::Game;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    render_mode_from_env()?;

    let game = ComponentRef::new(Game);
    let mut app = mount_terminal(&game)?;
    app.run()?;
    let frames = app.frame_count();
    app.unmount()?;

    println!("Bye after {frames} frames.");
    Ok(())
}

/// Logs go to a file; stdout belongs to the renderer.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(path) = std::env::var("SPARK_VDOM_LOG") else {
        return Ok(());
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spark_vdom=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(File::create(path)?))
        .with_ansi(false)
        .init();
    Ok(())
}
