//! Debug panel: light editing, the light helper and the toggle-armed flag

use crate::{config::LightSettings, gfx::scene::SceneStatistics};

pub const INTENSITY_RANGE: (f32, f32) = (0.0, 20.0);
pub const POSITION_RANGE: (f32, f32) = (-10.0, 10.0);

/// Values the panel edits, mirrored from the renderer and the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub light_intensity: f32,
    pub light_position: [f32; 3],
    pub show_light_helper: bool,
    pub toggle_armed: bool,
}

/// Which groups of values the user touched this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelChanges {
    pub light: bool,
    pub light_helper: bool,
    pub toggle_armed: bool,
}

impl PanelChanges {
    pub fn any(&self) -> bool {
        self.light || self.light_helper || self.toggle_armed
    }
}

impl PanelState {
    pub fn new(light: &LightSettings, toggle_armed: bool) -> Self {
        Self {
            light_intensity: light.intensity,
            light_position: light.position,
            show_light_helper: false,
            toggle_armed,
        }
    }

    /// Keeps typed-in values inside the slider ranges
    pub fn clamp(&mut self) {
        self.light_intensity = self
            .light_intensity
            .clamp(INTENSITY_RANGE.0, INTENSITY_RANGE.1);
        for axis in self.light_position.iter_mut() {
            *axis = axis.clamp(POSITION_RANGE.0, POSITION_RANGE.1);
        }
    }

    /// `light` with the panel's intensity and position
    pub fn apply_to(&self, light: LightSettings) -> LightSettings {
        LightSettings {
            intensity: self.light_intensity,
            position: self.light_position,
            ..light
        }
    }
}

/// Draws the panel and reports what changed
pub fn stage_panel(
    ui: &imgui::Ui,
    state: &mut PanelState,
    statistics: &SceneStatistics,
) -> PanelChanges {
    let mut changes = PanelChanges::default();

    ui.window("Stage")
        .size([300.0, 260.0], imgui::Condition::FirstUseEver)
        .position([10.0, 10.0], imgui::Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            if ui.collapsing_header("Light", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                changes.light |= ui.slider(
                    "intensity",
                    INTENSITY_RANGE.0,
                    INTENSITY_RANGE.1,
                    &mut state.light_intensity,
                );
                for (label, axis) in ["x", "y", "z"].iter().zip(state.light_position.iter_mut()) {
                    changes.light |= ui.slider(label, POSITION_RANGE.0, POSITION_RANGE.1, axis);
                }
                changes.light_helper |= ui.checkbox("shadow camera", &mut state.show_light_helper);
            }

            ui.separator();
            changes.toggle_armed |= ui.checkbox("swap on hit only", &mut state.toggle_armed);
            if ui.is_item_hovered() {
                ui.tooltip_text("Unchecked: the next click swaps even on a miss");
            }

            ui.separator();
            ui.text(format!(
                "objects: {} ({} visible)",
                statistics.object_count, statistics.visible_count
            ));
            ui.text(format!("triangles: {}", statistics.total_triangles));
        });

    if changes.light {
        state.clamp();
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_the_configured_light() {
        let light = LightSettings::default();
        let state = PanelState::new(&light, true);
        assert_eq!(state.light_intensity, 10.0);
        assert_eq!(state.light_position, [-5.0, 5.0, 4.0]);
        assert!(!state.show_light_helper);
        assert!(state.toggle_armed);
    }

    #[test]
    fn clamp_keeps_values_in_slider_range() {
        let mut state = PanelState::new(&LightSettings::default(), true);
        state.light_intensity = 50.0;
        state.light_position = [-20.0, 3.0, 11.0];
        state.clamp();
        assert_eq!(state.light_intensity, 20.0);
        assert_eq!(state.light_position, [-10.0, 3.0, 10.0]);
    }

    #[test]
    fn apply_keeps_shadow_camera_settings() {
        let light = LightSettings::default();
        let mut state = PanelState::new(&light, true);
        state.light_intensity = 3.0;
        state.light_position = [1.0, 2.0, 3.0];
        let applied = state.apply_to(light);
        assert_eq!(applied.intensity, 3.0);
        assert_eq!(applied.position, [1.0, 2.0, 3.0]);
        assert_eq!(applied.shadow_map_size, light.shadow_map_size);
        assert_eq!(applied.shadow_far, light.shadow_far);
    }

    #[test]
    fn no_changes_by_default() {
        assert!(!PanelChanges::default().any());
    }
}
