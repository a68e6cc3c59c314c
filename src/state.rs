use std::f32::consts::PI;

use glam::Vec3;

use crate::input::{KeyCode, NamedKey};

/// Which shadow algorithm renders this frame. Techniques are mutually
/// exclusive; the active one decides which passes execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowTechnique {
    #[default]
    None,
    Planar,
    Textures,
    Maps,
    /// Reserved, not yet implemented.
    Volumes,
    /// Reserved, not yet implemented.
    Pcss,
}

impl ShadowTechnique {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Planar => "planar",
            Self::Textures => "shadow textures",
            Self::Maps => "shadow maps",
            Self::Volumes => "shadow volumes",
            Self::Pcss => "pcss",
        }
    }
}

/// Independent rendering toggles combined with the active technique.
///
/// The planar flags only matter while the planar technique is active;
/// `linear_filter` applies to both cubemap techniques and `cull_front`
/// to the depth-map pass only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowOptions {
    pub planar_depth_test: bool,
    pub planar_blend: bool,
    pub planar_stencil: bool,
    pub linear_filter: bool,
    pub cull_front: bool,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            planar_depth_test: true,
            planar_blend: false,
            planar_stencil: false,
            linear_filter: false,
            cull_front: false,
        }
    }
}

/// Light animation: the position bounces between two heights, flipping
/// the sign of the per-frame offset at each bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub position: Vec3,
    pub offset: f32,
}

impl LightRig {
    pub const LOWER_BOUND: f32 = 1.0;
    pub const UPPER_BOUND: f32 = 9.0;

    fn step(&mut self) {
        self.position.y += self.offset;
        if self.position.y <= Self::LOWER_BOUND || self.position.y >= Self::UPPER_BOUND {
            self.offset = -self.offset;
        }
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 0.0),
            offset: -0.01,
        }
    }
}

/// Mutable engine state threaded through the frame loop: the active
/// shadow technique with its options, the shadow quality settings, and
/// the frame-local animation state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub technique: ShadowTechnique,
    pub options: ShadowOptions,

    pub shadow_resolution: u32,
    pub shadow_bias: f32,
    pub shadow_map_samples: f32,
    pub multisampling: bool,

    pub wireframe: bool,
    pub control_points: bool,
    pub tess_level: f32,

    pub spin_objects: bool,
    pub move_light: bool,
    pub outer_ring: bool,
    pub angle_offset: f32,
    pub light: LightRig,
}

impl RenderState {
    pub const MIN_SHADOW_RESOLUTION: u32 = 4;
    pub const MAX_SHADOW_RESOLUTION: u32 = 8192;
    pub const MIN_SHADOW_SAMPLES: f32 = 2.0;

    const BIAS_STEP: f32 = 0.01;
    const ANGLE_STEP: f32 = 0.1;
    const SPIN_STEP: f32 = 0.01;
    const LIGHT_NUDGE: f32 = 0.2;

    pub fn new() -> Self {
        Self::default()
    }

    /// The single transition function of the technique state machine.
    /// One key per transition; every arm documents its effect.
    ///
    /// Keys 1-3 both switch to the planar technique and flip one of its
    /// sub-options. The coupling comes straight from the interaction
    /// design this renderer reproduces; callers should not expect to
    /// select planar shadows without also toggling a flag.
    pub fn apply_key(&mut self, key: KeyCode) {
        match key {
            // Technique selection.
            KeyCode::Digit(0) => self.technique = ShadowTechnique::None,
            KeyCode::Digit(1) => {
                self.technique = ShadowTechnique::Planar;
                self.options.planar_depth_test = !self.options.planar_depth_test;
            }
            KeyCode::Digit(2) => {
                self.technique = ShadowTechnique::Planar;
                self.options.planar_blend = !self.options.planar_blend;
            }
            KeyCode::Digit(3) => {
                self.technique = ShadowTechnique::Planar;
                self.options.planar_stencil = !self.options.planar_stencil;
            }
            KeyCode::Digit(4) => self.technique = ShadowTechnique::Textures,
            KeyCode::Digit(5) => self.options.linear_filter = !self.options.linear_filter,
            KeyCode::Digit(6) => self.technique = ShadowTechnique::Maps,
            KeyCode::Digit(7) => self.multisampling = !self.multisampling,

            // Shadow quality settings.
            KeyCode::Character('Z') => {
                self.shadow_resolution =
                    (self.shadow_resolution / 2).max(Self::MIN_SHADOW_RESOLUTION);
            }
            KeyCode::Character('X') => {
                self.shadow_resolution = self
                    .shadow_resolution
                    .saturating_mul(2)
                    .min(Self::MAX_SHADOW_RESOLUTION);
            }
            KeyCode::Character('C') => {
                self.shadow_bias = (self.shadow_bias - Self::BIAS_STEP).max(0.0);
            }
            KeyCode::Character('V') => self.shadow_bias += Self::BIAS_STEP,
            KeyCode::Character('G') => {
                self.shadow_map_samples =
                    (self.shadow_map_samples / 2.0).max(Self::MIN_SHADOW_SAMPLES);
            }
            KeyCode::Character('H') => self.shadow_map_samples *= 2.0,
            KeyCode::Character('F') => self.options.cull_front = !self.options.cull_front,

            // Scene toggles.
            KeyCode::Character('W') => self.wireframe = !self.wireframe,
            KeyCode::Character('O') => self.outer_ring = !self.outer_ring,
            KeyCode::Character('S') => self.spin_objects = !self.spin_objects,
            KeyCode::Character('L') => self.move_light = !self.move_light,

            // Tessellation level.
            KeyCode::Named(NamedKey::Up) => self.tess_level += 1.0,
            KeyCode::Named(NamedKey::Down) => {
                if self.tess_level > 0.0 {
                    self.tess_level -= 1.0;
                }
            }

            // Manual nudges while the matching animation is paused.
            KeyCode::Named(NamedKey::Left) => {
                if !self.spin_objects {
                    self.angle_offset += Self::ANGLE_STEP;
                    if self.angle_offset >= 2.0 * PI {
                        self.angle_offset = 0.0;
                    }
                }
            }
            KeyCode::Named(NamedKey::Right) => {
                if !self.spin_objects {
                    self.angle_offset -= Self::ANGLE_STEP;
                    if self.angle_offset <= 0.0 {
                        self.angle_offset = 2.0 * PI;
                    }
                }
            }
            KeyCode::Character('B') => {
                if !self.move_light && self.light.position.y > LightRig::LOWER_BOUND + 0.25 {
                    self.light.position.y -= Self::LIGHT_NUDGE;
                }
            }
            KeyCode::Character('N') => {
                if !self.move_light && self.light.position.y < LightRig::UPPER_BOUND - 0.25 {
                    self.light.position.y += Self::LIGHT_NUDGE;
                }
            }

            _ => {}
        }
    }

    /// Advances the frame-local animation state: the orbit angle of the
    /// spinning objects and the bouncing light.
    pub fn advance(&mut self) {
        if self.spin_objects {
            self.angle_offset += Self::SPIN_STEP;
            if self.angle_offset >= 2.0 * PI {
                self.angle_offset = 0.0;
            }
        }
        if self.move_light {
            self.light.step();
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            technique: ShadowTechnique::None,
            options: ShadowOptions::default(),
            shadow_resolution: 512,
            shadow_bias: 0.0,
            shadow_map_samples: 2.0,
            multisampling: false,
            wireframe: false,
            control_points: false,
            tess_level: 64.0,
            spin_objects: true,
            move_light: true,
            outer_ring: false,
            angle_offset: 0.0,
            light: LightRig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(state: &mut RenderState, key: KeyCode) {
        state.apply_key(key);
    }

    #[test]
    fn initial_state_matches_defaults() {
        let state = RenderState::new();
        assert_eq!(state.technique, ShadowTechnique::None);
        assert!(state.options.planar_depth_test);
        assert!(!state.options.planar_blend);
        assert!(!state.options.planar_stencil);
        assert!(!state.options.linear_filter);
        assert!(!state.options.cull_front);
        assert_eq!(state.shadow_resolution, 512);
    }

    #[test]
    fn planar_keys_select_technique_and_flip_option() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Digit(2));
        assert_eq!(state.technique, ShadowTechnique::Planar);
        assert!(state.options.planar_blend);
    }

    #[test]
    fn double_toggle_restores_options_and_keeps_planar() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Digit(3));
        let after_first = state.options;
        press(&mut state, KeyCode::Digit(3));
        assert_eq!(state.technique, ShadowTechnique::Planar);
        assert_ne!(after_first, state.options);
        assert_eq!(state.options, ShadowOptions::default());
    }

    #[test]
    fn linear_filter_is_independent_of_technique() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Digit(6));
        press(&mut state, KeyCode::Digit(5));
        assert_eq!(state.technique, ShadowTechnique::Maps);
        assert!(state.options.linear_filter);
        press(&mut state, KeyCode::Digit(5));
        assert_eq!(state.technique, ShadowTechnique::Maps);
        assert!(!state.options.linear_filter);
    }

    #[test]
    fn resolution_doubles_to_the_cap_and_stays() {
        let mut state = RenderState::new();
        for _ in 0..4 {
            press(&mut state, KeyCode::Character('X'));
        }
        assert_eq!(state.shadow_resolution, 8192);
        press(&mut state, KeyCode::Character('X'));
        assert_eq!(state.shadow_resolution, 8192);
    }

    #[test]
    fn resolution_halving_bottoms_out_at_the_floor() {
        let mut state = RenderState::new();
        state.shadow_resolution = 8192;
        for _ in 0..13 {
            press(&mut state, KeyCode::Character('Z'));
        }
        assert_eq!(state.shadow_resolution, RenderState::MIN_SHADOW_RESOLUTION);
    }

    #[test]
    fn bias_never_goes_negative() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Character('V'));
        press(&mut state, KeyCode::Character('C'));
        press(&mut state, KeyCode::Character('C'));
        assert_eq!(state.shadow_bias, 0.0);
    }

    #[test]
    fn samples_floor_at_two() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Character('H'));
        press(&mut state, KeyCode::Character('H'));
        assert_eq!(state.shadow_map_samples, 8.0);
        for _ in 0..5 {
            press(&mut state, KeyCode::Character('G'));
        }
        assert_eq!(state.shadow_map_samples, RenderState::MIN_SHADOW_SAMPLES);
    }

    #[test]
    fn tess_level_floors_at_zero() {
        let mut state = RenderState::new();
        state.tess_level = 1.0;
        press(&mut state, KeyCode::Named(NamedKey::Down));
        press(&mut state, KeyCode::Named(NamedKey::Down));
        assert_eq!(state.tess_level, 0.0);
    }

    #[test]
    fn manual_angle_nudges_only_apply_while_paused() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Named(NamedKey::Left));
        assert_eq!(state.angle_offset, 0.0);
        press(&mut state, KeyCode::Character('S'));
        press(&mut state, KeyCode::Named(NamedKey::Left));
        assert!((state.angle_offset - 0.1).abs() < 1e-6);
    }

    #[test]
    fn light_bounces_between_bounds() {
        let mut state = RenderState::new();
        let mut previous = state.light.position.y;
        // Descend to the lower bound: strictly decreasing on the way.
        while state.light.offset < 0.0 {
            state.advance();
            assert!(state.light.position.y < previous);
            previous = state.light.position.y;
        }
        assert!(state.light.position.y <= LightRig::LOWER_BOUND + 0.011);
        // Ascend again: strictly increasing until the upper bound.
        while state.light.offset > 0.0 {
            state.advance();
            assert!(state.light.position.y > previous);
            previous = state.light.position.y;
        }
        assert!(state.light.position.y >= LightRig::UPPER_BOUND - 0.011);
        assert!(state.light.position.y <= LightRig::UPPER_BOUND + 0.011);
    }

    #[test]
    fn light_nudges_respect_pause_and_margins() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Character('B'));
        assert_eq!(state.light.position.y, 5.0);
        press(&mut state, KeyCode::Character('L'));
        press(&mut state, KeyCode::Character('B'));
        assert!((state.light.position.y - 4.8).abs() < 1e-6);
        state.light.position.y = LightRig::LOWER_BOUND + 0.2;
        press(&mut state, KeyCode::Character('B'));
        assert!((state.light.position.y - (LightRig::LOWER_BOUND + 0.2)).abs() < 1e-6);
    }

    #[test]
    fn scene_toggles_flip_their_flags() {
        let mut state = RenderState::new();
        press(&mut state, KeyCode::Character('W'));
        assert!(state.wireframe);
        press(&mut state, KeyCode::Character('O'));
        assert!(state.outer_ring);
        press(&mut state, KeyCode::Digit(7));
        assert!(state.multisampling);
        press(&mut state, KeyCode::Character('F'));
        assert!(state.options.cull_front);
        // None of these touch the active technique.
        assert_eq!(state.technique, ShadowTechnique::None);
    }

    #[test]
    fn spin_wraps_at_full_turn() {
        let mut state = RenderState::new();
        state.angle_offset = 2.0 * PI - 0.005;
        state.advance();
        assert_eq!(state.angle_offset, 0.0);
    }
}
