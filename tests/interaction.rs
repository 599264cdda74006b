//! Drives the interaction core end to end on a CPU-only scene: the stage
//! floor, two stand-in characters and the orbit camera.

use cgmath::{InnerSpace, SquareMatrix, Vector2};
use decal_stage::config::FloorSettings;
use decal_stage::gfx::picking::Ray;
use decal_stage::prelude::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

struct Stage {
    config: StageConfig,
    scene: Scene,
    session: InteractionSession,
    floor: ObjectId,
    sarah: ObjectId,
    spiderman: ObjectId,
}

fn floor_object(settings: &FloorSettings) -> Object {
    let sphere = generate_sphere(settings.longitude_segments, settings.latitude_segments);
    let mesh = Mesh::new(sphere.to_vertices(), sphere.indices.clone());
    let mut floor = Object::new("floor", SceneNode::mesh("floor", mesh)).with_shading(Shading::Decal);
    floor.set_transform_trs(
        Vector3::new(0.0, settings.offset_y, 0.0),
        Deg(settings.rotation_x_degrees),
        settings.scale,
    );
    floor
}

/// A 2x2 card standing at z = 1, in front of the camera's view axis
fn character_card(name: &str) -> Object {
    let plane = generate_plane(2.0, 2.0, 1, 1);
    let mesh = Mesh::new(plane.to_vertices(), plane.indices.clone());
    let mut card = Object::new(name, SceneNode::mesh(name, mesh));
    card.set_transform_trs(
        Vector3::new(0.15, 0.1, 1.0),
        Deg(0.0),
        Vector3::new(1.0, 1.0, 1.0),
    );
    card
}

/// Scene with every object added but no roles attached yet
fn bare_stage() -> Stage {
    let config = StageConfig::default();
    let camera = OrbitCamera::from_settings(&config.camera, WIDTH as f32 / HEIGHT as f32);
    let mut scene = Scene::new(CameraManager::new(
        camera,
        CameraController::from_settings(&config.camera),
    ));
    let floor = scene.add_object(floor_object(&config.floor));
    let sarah = scene.add_object(character_card("sarah"));
    let spiderman = scene.add_object(character_card("spiderman"));

    let session = InteractionSession::new(&config, &camera, Viewport::new(WIDTH, HEIGHT));
    Stage {
        config,
        scene,
        session,
        floor,
        sarah,
        spiderman,
    }
}

fn stage() -> Stage {
    let mut stage = bare_stage();
    stage.session.attach_floor(stage.floor);
    stage
        .session
        .attach_character(Character::Sarah, stage.sarah, &mut stage.scene);
    stage
        .session
        .attach_character(Character::Spiderman, stage.spiderman, &mut stage.scene);
    stage
}

impl Stage {
    fn hover(&mut self, x: f64, y: f64) -> CursorHint {
        self.session
            .on_pointer_move(x, y, &self.scene)
            .expect("picking is configured")
    }

    fn click_at(&mut self, x: f64, y: f64) -> Option<CharacterState> {
        self.hover(x, y);
        self.session
            .on_click(&mut self.scene)
            .expect("picking is configured")
    }

    fn visible(&self) -> (bool, bool) {
        (
            self.scene.is_visible(self.sarah),
            self.scene.is_visible(self.spiderman),
        )
    }
}

// Pixel positions in the 800x600 window
const FLOOR_PIXEL: (f64, f64) = (400.0, 540.0);
const SKY_PIXEL: (f64, f64) = (400.0, 0.0);
const CENTRE_PIXEL: (f64, f64) = (400.0, 300.0);

#[test]
fn hovering_the_floor_shows_the_decal_at_its_uv() {
    let mut stage = stage();

    let cursor = stage.hover(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    assert_eq!(cursor, CursorHint::Pointer);

    let decal = *stage.session.decal();
    assert_eq!(decal.active, 1);
    assert!((decal.radius - 0.05).abs() < 1e-6);
    for component in decal.center {
        assert!((0.0..=1.0).contains(&component), "uv {:?}", decal.center);
    }
}

#[test]
fn leaving_the_floor_hides_the_decal() {
    let mut stage = stage();
    stage.hover(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    assert_eq!(stage.session.decal().active, 1);

    let cursor = stage.hover(SKY_PIXEL.0, SKY_PIXEL.1);
    assert_eq!(cursor, CursorHint::Default);
    assert_eq!(stage.session.decal().active, 0);
}

#[test]
fn characters_never_occlude_the_hover_query() {
    let mut stage = stage();

    // The centre ray passes through Sarah's card and above the floor
    let cursor = stage.hover(CENTRE_PIXEL.0, CENTRE_PIXEL.1);
    assert_eq!(cursor, CursorHint::Default);
    assert_eq!(stage.session.decal().active, 0);
}

#[test]
fn repeated_pointer_moves_are_idempotent() {
    let mut stage = stage();
    stage.session.take_decal_change();

    stage.hover(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    let first = stage.session.take_decal_change().expect("decal moved onto the floor");

    stage.hover(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    assert_eq!(stage.session.take_decal_change(), None);
    assert_eq!(*stage.session.decal(), first);
}

/// u of the floor meridian facing up; the underside's is 0.75
const TOP_MERIDIAN_U: f32 = 0.25;

#[test]
fn centre_column_lands_on_the_top_of_the_floor() {
    let mut stage = stage();

    // x = 400 is NDC 0: the ray runs along the mesh edges of the meridian
    for row in [420.0, 480.0, 540.0, 585.0] {
        let cursor = stage.hover(400.0, row);
        assert_eq!(cursor, CursorHint::Pointer, "row {} missed the floor", row);

        let decal = *stage.session.decal();
        assert_eq!(decal.active, 1);
        assert!(
            (decal.center[0] - TOP_MERIDIAN_U).abs() < 1e-3,
            "row {} painted u = {}",
            row,
            decal.center[0]
        );
    }
}

#[test]
fn floor_filling_the_view_is_hit_everywhere() {
    let mut stage = stage();
    {
        let camera = &mut stage.scene.camera_manager.camera;
        camera.target = Vector3::new(0.0, -2.0, 0.0);
        camera.set_distance(2.5);
        camera.set_pitch(1.5);
    }
    let camera = stage.scene.camera_manager.camera;
    stage.session.camera_moved(&camera);

    // Straight through the target, the vertex on top of the floor
    assert_eq!(stage.hover(CENTRE_PIXEL.0, CENTRE_PIXEL.1), CursorHint::Pointer);
    let decal = *stage.session.decal();
    assert_eq!(decal.active, 1);
    assert!((decal.center[0] - 0.25).abs() < 1e-3, "uv {:?}", decal.center);
    assert!((decal.center[1] - 0.5).abs() < 1e-3, "uv {:?}", decal.center);

    let last_x = f64::from(WIDTH - 1);
    let last_y = f64::from(HEIGHT - 1);
    for (x, y) in [(0.0, 0.0), (last_x, 0.0), (0.0, last_y), (last_x, last_y)] {
        assert_eq!(stage.hover(x, y), CursorHint::Pointer, "({}, {}) missed", x, y);
        for component in stage.session.decal().center {
            assert!((0.0..=1.0).contains(&component));
        }
    }
}

#[test]
fn no_floor_means_no_decal() {
    let mut stage = bare_stage();

    let cursor = stage.hover(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    assert_eq!(cursor, CursorHint::Default);
    assert_eq!(stage.session.decal().active, 0);
}

#[test]
fn hidden_floor_is_not_a_candidate() {
    let mut stage = stage();
    stage.scene.set_visible(stage.floor, false);

    stage.hover(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    assert_eq!(stage.session.decal().active, 0);
}

#[test]
fn clicking_a_character_swaps_them() {
    let mut stage = stage();
    assert_eq!(stage.visible(), (true, false));

    let swapped = stage.click_at(CENTRE_PIXEL.0, CENTRE_PIXEL.1);
    assert_eq!(swapped, Some(CharacterState::SpidermanVisible));
    assert_eq!(stage.visible(), (false, true));

    // Spiderman's card now takes the hit
    let swapped = stage.click_at(CENTRE_PIXEL.0, CENTRE_PIXEL.1);
    assert_eq!(swapped, Some(CharacterState::SarahVisible));
    assert_eq!(stage.visible(), (true, false));
}

#[test]
fn clicking_the_floor_also_swaps() {
    let mut stage = stage();

    let swapped = stage.click_at(FLOOR_PIXEL.0, FLOOR_PIXEL.1);
    assert_eq!(swapped, Some(CharacterState::SpidermanVisible));
}

#[test]
fn a_miss_while_armed_changes_nothing() {
    let mut stage = stage();
    assert!(stage.session.is_armed());

    assert_eq!(stage.click_at(SKY_PIXEL.0, SKY_PIXEL.1), None);
    assert_eq!(stage.visible(), (true, false));
    assert!(stage.session.is_armed());
}

#[test]
fn a_miss_while_disarmed_swaps_and_rearms() {
    let mut stage = stage();
    stage.session.set_armed(false);

    let swapped = stage.click_at(SKY_PIXEL.0, SKY_PIXEL.1);
    assert_eq!(swapped, Some(CharacterState::SpidermanVisible));
    assert_eq!(stage.visible(), (false, true));
    assert!(stage.session.is_armed());

    // Re-armed: the next miss is ignored
    assert_eq!(stage.click_at(SKY_PIXEL.0, SKY_PIXEL.1), None);
    assert_eq!(stage.visible(), (false, true));
}

#[test]
fn clicks_before_both_characters_load_do_nothing() {
    let mut stage = bare_stage();
    stage.session.attach_floor(stage.floor);
    stage
        .session
        .attach_character(Character::Sarah, stage.sarah, &mut stage.scene);

    assert_eq!(stage.session.toggle().state(), None);
    assert_eq!(stage.click_at(CENTRE_PIXEL.0, CENTRE_PIXEL.1), None);
    assert!(stage.scene.is_visible(stage.sarah));

    stage
        .session
        .attach_character(Character::Spiderman, stage.spiderman, &mut stage.scene);
    assert_eq!(
        stage.session.toggle().state(),
        Some(CharacterState::SarahVisible)
    );
    assert_eq!(stage.visible(), (true, false));
}

#[test]
fn attachment_order_does_not_matter() {
    let mut stage = bare_stage();
    stage
        .session
        .attach_character(Character::Spiderman, stage.spiderman, &mut stage.scene);
    assert!(!stage.scene.is_visible(stage.spiderman));

    stage
        .session
        .attach_character(Character::Sarah, stage.sarah, &mut stage.scene);
    assert_eq!(stage.visible(), (true, false));
}

#[test]
fn resize_updates_aspect_and_pointer_mapping() {
    let mut stage = stage();

    let viewport = Viewport::new(1600, 900);
    stage
        .session
        .on_resize(viewport, &mut stage.scene.camera_manager.camera);

    let camera = &stage.scene.camera_manager.camera;
    assert!((camera.aspect - 1600.0 / 900.0).abs() < 1e-6);
    assert_eq!(stage.session.viewport(), viewport);

    stage.hover(400.0, 300.0);
    let pointer = stage.session.pointer();
    assert!((pointer.x + 0.5).abs() < 1e-6);
    assert!((pointer.y - 1.0 / 3.0).abs() < 1e-6);

    // The new centre still lands on Sarah
    let swapped = stage.click_at(800.0, 450.0);
    assert_eq!(swapped, Some(CharacterState::SpidermanVisible));
}

#[test]
fn minimised_window_pointer_is_off_screen() {
    let mut stage = stage();
    stage
        .session
        .on_resize(Viewport::new(0, 0), &mut stage.scene.camera_manager.camera);

    stage.hover(10.0, 10.0);
    assert!(stage.session.pointer().is_off_screen());
    assert_eq!(stage.session.decal().active, 0);
}

#[test]
fn unset_camera_fails_fast() {
    let stage = stage();
    let mut session = InteractionSession::with_picking(
        &stage.config,
        PickingService::new(),
        Viewport::new(WIDTH, HEIGHT),
    );
    session.attach_floor(stage.floor);

    let error = session
        .on_pointer_move(FLOOR_PIXEL.0, FLOOR_PIXEL.1, &stage.scene)
        .unwrap_err();
    assert_eq!(error, PickError::CameraUnset);
}

#[test]
fn unset_raycaster_fails_fast() {
    let stage = stage();
    let mut picking = PickingService::new();
    picking.set_camera(&stage.scene.camera_manager.camera);
    let mut session =
        InteractionSession::with_picking(&stage.config, picking, Viewport::new(WIDTH, HEIGHT));

    let error = session
        .on_pointer_move(FLOOR_PIXEL.0, FLOOR_PIXEL.1, &stage.scene)
        .unwrap_err();
    assert_eq!(error, PickError::RaycasterUnset);
}

#[test]
fn centre_ray_points_at_the_orbit_target() {
    let camera = OrbitCamera::from_settings(&StageConfig::default().camera, 4.0 / 3.0);
    let inverse = (camera.projection_matrix() * camera.view_matrix())
        .invert()
        .expect("invertible");

    let ray = Ray::from_eye(camera.eye, &inverse, Vector2::new(0.0, 0.0)).expect("ray");
    let to_target = (camera.target - camera.eye).normalize();
    assert!(ray.direction.dot(to_target) > 0.9999);
}
