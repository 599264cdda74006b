//! ImGui overlay: context, winit platform glue and the wgpu renderer

use imgui::{ConfigFlags, Context, FontConfig, FontSource};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE: f32 = 18.0;

/// What the overlay wants to keep from the stage this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCapture {
    pub mouse: bool,
    pub keyboard: bool,
}

impl InputCapture {
    pub fn any(&self) -> bool {
        self.mouse || self.keyboard
    }
}

pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
}

impl UiManager {
    /// Locked DPI, default font, no ini file.
    ///
    /// The stage owns the cursor shape (pointer over the floor), so imgui
    /// must not change it.
    pub fn new(device: &Device, queue: &Queue, format: TextureFormat, window: &Window) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);
        context.io_mut().config_flags |= ConfigFlags::NO_MOUSE_CURSOR_CHANGE;

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer = Renderer::new(
            &mut context,
            device,
            queue,
            RendererConfig {
                texture_format: format,
                ..Default::default()
            },
        );

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
        }
    }

    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Forwards pointer, keyboard and focus events.
    ///
    /// Returns `true` when the overlay swallows the event; the stage must
    /// then ignore it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        window_id: WindowId,
        event: &WindowEvent,
    ) -> bool {
        let relevant = matches!(
            event,
            WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::ModifiersChanged(_)
                | WindowEvent::Focused(_)
        );
        if !relevant {
            return false;
        }

        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform
            .handle_event(self.context.io_mut(), window, &wrapped);
        self.capture().any()
    }

    pub fn capture(&self) -> InputCapture {
        let io = self.context.io();
        InputCapture {
            mouse: io.want_capture_mouse,
            keyboard: io.want_capture_keyboard,
        }
    }

    pub fn wants_mouse(&self) -> bool {
        self.capture().mouse
    }

    /// Builds the overlay with `build` and renders it over `target`
    pub fn draw<F>(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        window: &Window,
        target: &TextureView,
        build: F,
    ) where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("imgui frame preparation failed: {}", e);
        }
        build(self.context.frame());

        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self.renderer.render(draw_data, queue, device, &mut pass) {
            log::error!("imgui render failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_any() {
        assert!(!InputCapture::default().any());
        assert!(InputCapture {
            mouse: true,
            keyboard: false
        }
        .any());
    }
}
