//! Shader program handle: module creation and pipeline construction
//! with driver diagnostics captured instead of panicking.
//!
//! Both steps run inside a validation error scope so a broken shader
//! surfaces as a typed error carrying the driver log. Setup treats
//! these as fatal; there is no degraded rendering without a program.

use pollster::block_on;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("shader '{label}' failed to compile: {log}")]
    Compile { label: String, log: String },
    #[error("pipeline '{label}' failed to build: {log}")]
    Link { label: String, log: String },
}

/// A validated shader module plus the label it was compiled under.
pub struct ShaderProgram {
    label: String,
    module: wgpu::ShaderModule,
}

impl ShaderProgram {
    /// Compiles WGSL source into a module, returning the driver
    /// diagnostic on failure.
    pub fn compile(
        device: &wgpu::Device,
        label: &str,
        source: &str,
    ) -> Result<Self, ProgramError> {
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = block_on(scope.pop()) {
            return Err(ProgramError::Compile {
                label: label.to_string(),
                log: error.to_string(),
            });
        }
        Ok(Self {
            label: label.to_string(),
            module,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}

/// Builds a render pipeline under an error scope, so layout/interface
/// mismatches report a diagnostic instead of an uncaptured error.
pub fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    descriptor: &wgpu::RenderPipelineDescriptor<'_>,
) -> Result<wgpu::RenderPipeline, ProgramError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(descriptor);
    if let Some(error) = block_on(scope.pop()) {
        return Err(ProgramError::Link {
            label: label.to_string(),
            log: error.to_string(),
        });
    }
    Ok(pipeline)
}
