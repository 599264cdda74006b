//! Error types shared across the stage
//!
//! Renderer setup errors and interaction precondition violations are fatal;
//! asset errors are recoverable and live in [`crate::assets::AssetError`].

use thiserror::Error;

use crate::interaction::PickError;

#[derive(Debug, Error)]
pub enum StageError {
    /// Usually a platform/windowing issue or an invalid window handle.
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// No compatible GPU adapter was found.
    #[error("failed to request adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The swapchain is unusable (out of memory or similar).
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// A pick query ran without its collaborators in place.
    #[error("pick precondition violated: {0}")]
    Pick(#[from] PickError),
}
