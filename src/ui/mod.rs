//! # User Interface Module
//!
//! Dear ImGui overlay: the [`UiManager`] wires imgui into winit and wgpu, and
//! [`panel`] holds the stage's debug panel.
//!
//! The UI sees input before the scene. While it wants the mouse, camera
//! motion, hover picking and clicks are not forwarded.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::{InputCapture, UiManager};
pub use panel::{stage_panel, PanelChanges, PanelState};
