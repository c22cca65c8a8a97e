//! Hello triangle
//!
//! Opens an 800x600 window and draws a single triangle until the window is
//! closed or Escape is pressed.

use triangle_engine::foundation::logging;
use triangle_engine::prelude::*;

fn main() -> Result<(), AppError> {
    logging::init(log::LevelFilter::Info);
    log::info!("Starting hello triangle");

    match run(&ApplicationConfig::default()) {
        Ok(frames) => {
            log::info!("Exited cleanly after {frames} frame(s)");
            Ok(())
        }
        Err(e) => {
            log::error!("Fatal: {e}");
            Err(e)
        }
    }
}
