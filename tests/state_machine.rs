//! End-to-end exercises of the technique state machine, the camera and
//! the uniform block writer through the public crate API.

use std::f32::consts::PI;

use glam::{Mat4, Vec3, Vec4};
use once_cell::sync::Lazy;

use umbra::mesh::{icosphere, teapot};
use umbra::render::{BlockLayout, BlockValue, MemberKind};
use umbra::{ArcballCamera, CubemapKind, FramePlan, KeyCode, RenderState, ShadowTechnique};

static SPHERE: Lazy<umbra::MeshData> = Lazy::new(|| icosphere::build(3));

fn keys(state: &mut RenderState, sequence: &[KeyCode]) {
    for key in sequence {
        state.apply_key(*key);
    }
}

#[test]
fn technique_tour_through_every_selector_key() {
    let mut state = RenderState::new();
    assert_eq!(state.technique, ShadowTechnique::None);

    keys(&mut state, &[KeyCode::Digit(4)]);
    assert_eq!(state.technique, ShadowTechnique::Textures);

    keys(&mut state, &[KeyCode::Digit(6)]);
    assert_eq!(state.technique, ShadowTechnique::Maps);

    // The planar keys couple technique selection with an option flip.
    keys(&mut state, &[KeyCode::Digit(1)]);
    assert_eq!(state.technique, ShadowTechnique::Planar);
    assert!(!state.options.planar_depth_test);

    keys(&mut state, &[KeyCode::Digit(1)]);
    assert_eq!(state.technique, ShadowTechnique::Planar);
    assert!(state.options.planar_depth_test);

    keys(&mut state, &[KeyCode::Digit(0)]);
    assert_eq!(state.technique, ShadowTechnique::None);
}

#[test]
fn frame_plan_contains_no_shadow_work_without_a_technique() {
    let mut state = RenderState::new();
    keys(&mut state, &[KeyCode::Digit(6), KeyCode::Digit(0)]);

    let plan = FramePlan::for_state(&state);
    assert_eq!(plan.cubemap_pass, None);
    assert!(!plan.planar_overlay);
}

#[test]
fn frame_plan_tracks_the_active_technique() {
    let mut state = RenderState::new();

    keys(&mut state, &[KeyCode::Digit(4)]);
    assert_eq!(
        FramePlan::for_state(&state).cubemap_pass,
        Some(CubemapKind::Color)
    );

    keys(&mut state, &[KeyCode::Digit(6)]);
    assert_eq!(
        FramePlan::for_state(&state).cubemap_pass,
        Some(CubemapKind::Depth)
    );

    keys(&mut state, &[KeyCode::Digit(2)]);
    let plan = FramePlan::for_state(&state);
    assert_eq!(plan.cubemap_pass, None);
    assert!(plan.planar_overlay);
}

#[test]
fn resolution_walk_respects_both_clamps() {
    let mut state = RenderState::new();
    assert_eq!(state.shadow_resolution, 512);

    keys(&mut state, &[KeyCode::Character('X'); 4]);
    assert_eq!(state.shadow_resolution, 8192);
    keys(&mut state, &[KeyCode::Character('X')]);
    assert_eq!(state.shadow_resolution, 8192);

    keys(&mut state, &[KeyCode::Character('Z'); 13]);
    assert_eq!(state.shadow_resolution, 4);
    keys(&mut state, &[KeyCode::Character('Z')]);
    assert_eq!(state.shadow_resolution, 4);
}

#[test]
fn option_toggles_are_involutions() {
    let mut state = RenderState::new();
    let initial = state.options;

    for key in [
        KeyCode::Digit(1),
        KeyCode::Digit(2),
        KeyCode::Digit(3),
        KeyCode::Digit(5),
        KeyCode::Character('F'),
    ] {
        keys(&mut state, &[key, key]);
    }
    assert_eq!(state.options, initial);
}

#[test]
fn camera_survives_an_arbitrary_drag_session() {
    let mut camera = ArcballCamera::default();
    // A long scripted drag with wild swings.
    for i in 0..500 {
        let d_theta = ((i * 7) % 13) as f32 * 0.05 - 0.3;
        let d_phi = ((i * 3) % 11) as f32 * 0.1 - 0.5;
        camera.rotate(d_theta, d_phi);
        camera.zoom(if i % 2 == 0 { 1.7 } else { -2.3 });

        assert!(camera.phi() > 0.0 && camera.phi() < PI);
        assert!(camera.radius() >= ArcballCamera::MIN_ZOOM);
        assert!(camera.radius() <= ArcballCamera::MAX_ZOOM);
        assert!(camera.position().is_finite());
    }
}

#[test]
fn camera_matches_the_reference_orientation() {
    let camera = ArcballCamera::new(0.0, PI / 2.0, 5.0, Vec3::ZERO);
    let expected = Vec3::new(0.0, 0.0, -5.0);
    assert!((camera.position() - expected).length() < 1e-5);

    // The view matrix maps the look-at point onto the view axis.
    let origin = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!(origin.x.abs() < 1e-5);
    assert!(origin.y.abs() < 1e-5);
    assert!((origin.z + 5.0).abs() < 1e-5);
}

#[test]
fn block_writer_round_trips_distinct_members() {
    let layout = BlockLayout::std140(
        "Probe",
        &[
            ("first", MemberKind::Mat4),
            ("second", MemberKind::Mat4),
            ("third", MemberKind::Vec4),
        ],
    );
    assert_eq!(layout.byte_size(), 144);

    let first = Mat4::from_cols_array(&std::array::from_fn(|i| i as f32));
    let second = Mat4::from_cols_array(&std::array::from_fn(|i| 100.0 + i as f32));
    let third = Vec4::new(-1.0, -2.0, -3.0, -4.0);
    let bytes = layout
        .pack(&[
            BlockValue::Mat4(first),
            BlockValue::Mat4(second),
            BlockValue::Vec4(third),
        ])
        .unwrap();

    let floats: &[f32] = bytemuck::cast_slice(&bytes);
    assert_eq!(&floats[0..16], &first.to_cols_array());
    assert_eq!(&floats[16..32], &second.to_cols_array());
    assert_eq!(&floats[32..36], &third.to_array());
}

#[test]
fn light_bounce_is_periodic_within_bounds() {
    let mut state = RenderState::new();
    let start = state.light.position.y;

    // Run several full bounce periods and watch the bounds.
    for _ in 0..3000 {
        state.advance();
        assert!(state.light.position.y >= 1.0 - 0.011);
        assert!(state.light.position.y <= 9.0 + 0.011);
    }
    // The light keeps moving; it has not settled anywhere.
    let mut positions = Vec::new();
    for _ in 0..10 {
        state.advance();
        positions.push(state.light.position.y);
    }
    assert!(positions.windows(2).all(|w| w[0] != w[1]));
    // It revisits the neighborhood of the start height eventually.
    let mut revisited = false;
    for _ in 0..2000 {
        state.advance();
        if (state.light.position.y - start).abs() < 0.02 {
            revisited = true;
            break;
        }
    }
    assert!(revisited);
}

#[test]
fn meshes_feed_consistent_index_ranges() {
    let sphere = &*SPHERE;
    assert!(!sphere.vertices.is_empty());
    assert!(sphere
        .indices
        .iter()
        .all(|i| (*i as usize) < sphere.vertices.len()));

    let pot = teapot::tessellate(8.0);
    assert!(pot
        .indices
        .iter()
        .all(|i| (*i as usize) < pot.vertices.len()));
}
