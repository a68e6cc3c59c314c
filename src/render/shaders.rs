//! WGSL sources for every program the renderer links.
//!
//! Each program is composed from a shared prelude (uniform block
//! declarations, the common vertex stage, the lighting helpers) plus a
//! body that adds the program-specific entry points. The block structs
//! here must stay in lockstep with the layouts in [`super::block`]; the
//! layout tests pin the byte offsets on the CPU side.

/// Composes a full module source from the shared prelude and a body.
pub fn source(body: &str) -> String {
    format!("{PRELUDE}\n{body}")
}

const PRELUDE: &str = r#"
const NEAR_PLANE: f32 = 0.001;
const FAR_PLANE: f32 = 1000.0;

struct SceneBlock {
    model: mat4x4<f32>,
    view_projection: mat4x4<f32>,
    model_view_projection: mat4x4<f32>,
    viewport: mat4x4<f32>,
    shadow_view_projection: mat4x4<f32>,
    tess_level: f32,
    eye_pos: vec3<f32>,
    wireframe: i32,
    control_points: i32,
}

struct LightBlock {
    position: vec4<f32>,
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    atten_constant: f32,
    atten_linear: f32,
    atten_quadratic: f32,
    shadow_bias: f32,
    multisampling: i32,
    shadow_map_samples: f32,
}

struct MaterialBlock {
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    shininess: f32,
}

@group(0) @binding(0) var<uniform> scene: SceneBlock;
@group(1) @binding(0) var<uniform> light: LightBlock;
@group(2) @binding(0) var<uniform> material: MaterialBlock;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = scene.model * vec4<f32>(input.position, 1.0);
    out.position = scene.model_view_projection * vec4<f32>(input.position, 1.0);
    out.world_pos = world.xyz;
    out.normal = (scene.model * vec4<f32>(input.normal, 0.0)).xyz;
    return out;
}

fn safe_normalize(v: vec3<f32>) -> vec3<f32> {
    let length_sq = dot(v, v);
    if (length_sq < 1e-12) {
        return vec3<f32>(0.0, 1.0, 0.0);
    }
    return v / sqrt(length_sq);
}

fn shade(world_pos: vec3<f32>, raw_normal: vec3<f32>, shadow: f32) -> vec3<f32> {
    let to_light = light.position.xyz - world_pos;
    let distance = length(to_light);
    let light_dir = to_light / max(distance, 1e-5);
    let normal = safe_normalize(raw_normal);

    let attenuation = 1.0 / (light.atten_constant
        + light.atten_linear * distance
        + light.atten_quadratic * distance * distance);

    let lambert = max(dot(normal, light_dir), 0.0);
    let diffuse = lambert * material.diffuse * light.diffuse;

    let view_dir = safe_normalize(scene.eye_pos - world_pos);
    let half_dir = safe_normalize(light_dir + view_dir);
    let highlight = pow(max(dot(normal, half_dir), 0.0), material.shininess);
    let specular = highlight * material.specular * light.specular;

    let ambient = 0.15 * material.ambient * light.ambient;
    return ambient + shadow * attenuation * (diffuse + specular);
}
"#;

/// Plain lit rendering, no shadow lookup.
pub const SCENE_LIT: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(shade(input.world_pos, input.normal, 1.0), 1.0);
}
"#;

/// Samples the distance-encoding color cubemap rendered from the light.
pub const SCENE_SHADOW_TEXTURE: &str = r#"
@group(3) @binding(0) var shadow_cube: texture_cube<f32>;
@group(3) @binding(1) var shadow_cube_sampler: sampler;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let to_frag = input.world_pos - light.position.xyz;
    let stored = textureSampleLevel(shadow_cube, shadow_cube_sampler, to_frag, 0.0).r;
    let current = length(to_frag) / FAR_PLANE;
    let shadow = select(1.0, 0.0, current - light.shadow_bias > stored);
    return vec4<f32>(shade(input.world_pos, input.normal, shadow), 1.0);
}
"#;

/// Samples the hardware depth cubemap, optionally blurring over a ring
/// of jittered lookups.
pub const SCENE_SHADOW_MAP: &str = r#"
@group(3) @binding(0) var depth_cube: texture_depth_cube;
@group(3) @binding(1) var depth_cube_sampler: sampler;

// Depth the face pass wrote for this direction: the distance along the
// dominant axis pushed through the 90-degree face projection.
fn face_depth(to_frag: vec3<f32>) -> f32 {
    let axis = max(max(abs(to_frag.x), abs(to_frag.y)), abs(to_frag.z));
    return FAR_PLANE * (axis - NEAR_PLANE) / (max(axis, NEAR_PLANE) * (FAR_PLANE - NEAR_PLANE));
}

fn sample_shadow(to_frag: vec3<f32>) -> f32 {
    let reference = face_depth(to_frag) - light.shadow_bias;
    if (light.multisampling == 0) {
        let stored = textureSampleLevel(depth_cube, depth_cube_sampler, to_frag, 0u);
        return select(1.0, 0.0, reference > stored);
    }

    var up = vec3<f32>(0.0, 1.0, 0.0);
    if (abs(to_frag.y) > abs(to_frag.x) && abs(to_frag.y) > abs(to_frag.z)) {
        up = vec3<f32>(1.0, 0.0, 0.0);
    }
    let tangent = safe_normalize(cross(up, to_frag));
    let bitangent = safe_normalize(cross(to_frag, tangent));
    let radius = length(to_frag) * 0.01;

    let count = max(i32(light.shadow_map_samples), 1);
    var lit = 0.0;
    for (var i = 0; i < count; i = i + 1) {
        let angle = 6.2831853 * f32(i) / f32(count);
        let offset = (tangent * cos(angle) + bitangent * sin(angle)) * radius;
        let stored = textureSampleLevel(depth_cube, depth_cube_sampler, to_frag + offset, 0u);
        lit = lit + select(1.0, 0.0, reference > stored);
    }
    return lit / f32(count);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let shadow = sample_shadow(input.world_pos - light.position.xyz);
    return vec4<f32>(shade(input.world_pos, input.normal, shadow), 1.0);
}
"#;

/// Flattened planar silhouette; alpha rides in the shininess channel.
pub const PLANAR_OVERLAY: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(vec3<f32>(0.05), material.shininess);
}
"#;

/// Emissive marker drawn at the light position.
pub const FLAT_LIGHT: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(material.diffuse, 1.0);
}
"#;

/// Face pass for the color cubemap: encodes normalized light distance.
pub const SHADOW_CAST_COLOR: &str = r#"
struct CastOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
}

@vertex
fn vs_cast(input: VertexInput) -> CastOutput {
    var out: CastOutput;
    let world = scene.model * vec4<f32>(input.position, 1.0);
    out.position = scene.shadow_view_projection * world;
    out.world_pos = world.xyz;
    return out;
}

@fragment
fn fs_cast(input: CastOutput) -> @location(0) vec4<f32> {
    let distance = length(input.world_pos - light.position.xyz) / FAR_PLANE;
    return vec4<f32>(vec3<f32>(distance), 1.0);
}
"#;

/// Face pass for the depth cubemap: position only, depth writes do the
/// rest.
pub const SHADOW_CAST_DEPTH: &str = r#"
@vertex
fn vs_cast(input: VertexInput) -> @builtin(position) vec4<f32> {
    return scene.shadow_view_projection * scene.model * vec4<f32>(input.position, 1.0);
}
"#;
