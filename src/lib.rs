//! decal-stage
//!
//! An interactive wgpu scene: orbit a camera around two characters standing
//! on a floor, paint a decal on the floor under the cursor and swap the
//! characters by clicking.
//!
//! The interaction core ([`interaction`]) is independent of the window and
//! the GPU: it maps pointer positions to picks, picks to decal parameters and
//! clicks to character swaps. [`app`] wires it to winit, the renderer, the
//! asset loader and the debug panel.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod gfx;
pub mod interaction;
pub mod performance;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::StageApp;
pub use config::StageConfig;
pub use error::StageError;

/// Opens the window and runs the stage until it is closed
pub fn run(config: StageConfig) -> Result<(), StageError> {
    StageApp::new(config)?.run()
}
