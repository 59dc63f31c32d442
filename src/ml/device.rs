// ============================================================
// Layer 5 — Device Selection
// ============================================================
// The compute device is a capability resolved ONCE at startup
// and then threaded into model construction as a backend type:
//
//   --device cpu   → Autodiff<NdArray>
//   --device gpu   → Autodiff<Wgpu>     (needs the `wgpu` feature)
//   --device auto  → GPU when compiled in, otherwise CPU

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

/// Training backend on the CPU.
pub type CpuBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Training backend on the GPU.
#[cfg(feature = "wgpu")]
pub type GpuBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Inference-only backends (no gradient tracking).
pub type CpuInference = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type GpuInference = burn::backend::Wgpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

/// A device this binary can actually run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    Cpu,
    #[cfg(feature = "wgpu")]
    Gpu,
}

impl DevicePreference {
    /// # Errors
    /// `InvalidConfig` if a GPU is requested but the binary was built
    /// without GPU support.
    pub fn resolve(self) -> Result<Accelerator, PipelineError> {
        let accel = match self {
            Self::Cpu  => Accelerator::Cpu,
            Self::Auto => default_accelerator(),
            Self::Gpu  => gpu_accelerator()?,
        };
        tracing::info!("Using device: {:?}", accel);
        Ok(accel)
    }
}

#[cfg(feature = "wgpu")]
fn default_accelerator() -> Accelerator {
    Accelerator::Gpu
}

#[cfg(not(feature = "wgpu"))]
fn default_accelerator() -> Accelerator {
    Accelerator::Cpu
}

#[cfg(feature = "wgpu")]
fn gpu_accelerator() -> Result<Accelerator, PipelineError> {
    Ok(Accelerator::Gpu)
}

#[cfg(not(feature = "wgpu"))]
fn gpu_accelerator() -> Result<Accelerator, PipelineError> {
    Err(PipelineError::InvalidConfig(
        "GPU requested but this build has no GPU backend (rebuild with --features wgpu)".to_string(),
    ))
}
