pub mod block;
pub mod pipelines;
pub mod program;
pub mod renderer;
pub mod shaders;
pub mod shadow;

pub use block::{BlockError, BlockLayout, BlockValue, MemberKind};
pub use program::{ProgramError, ShaderProgram};
pub use renderer::{FramePlan, Renderer};
pub use shadow::{CubemapKind, ShadowCubemap};
