//! Error types for Constellation.
//!
//! This module provides error types for engine construction, per-frame
//! stepping, GPU initialization and the windowed viewer.

use std::fmt;

/// Errors raised while building or stepping the morph engine.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphError {
    /// Particle count must be at least one.
    InvalidCount,
    /// A size, scale or speed parameter was negative, zero or non-finite.
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// The curve kept producing non-finite points after resampling.
    CurveDiverged {
        /// Number of parameter values tried for a single particle.
        attempts: u32,
    },
    /// The live buffer and the two formations disagree on particle count.
    LengthMismatch {
        live: usize,
        scatter: usize,
        curve: usize,
    },
}

impl fmt::Display for MorphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphError::InvalidCount => write!(f, "Particle count must be greater than zero."),
            MorphError::InvalidParameter { name, value } => {
                write!(f, "Invalid value for `{}`: {} (must be finite and positive)", name, value)
            }
            MorphError::CurveDiverged { attempts } => write!(
                f,
                "Curve produced no finite point after {} samples. Check the curve function.",
                attempts
            ),
            MorphError::LengthMismatch { live, scatter, curve } => write!(
                f,
                "Buffer length mismatch: live={}, scatter={}, curve={}",
                live, scatter, curve
            ),
        }
    }
}

impl std::error::Error for MorphError {}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter(wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter(e) => write!(
                f,
                "No compatible GPU adapter found ({}). Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.",
                e
            ),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::NoAdapter(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        GpuError::NoAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running the windowed viewer.
#[derive(Debug)]
pub enum ViewerError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The engine configuration was rejected.
    Morph(MorphError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            ViewerError::Window(e) => write!(f, "Failed to create window: {}", e),
            ViewerError::Gpu(e) => write!(f, "GPU error: {}", e),
            ViewerError::Morph(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::EventLoop(e) => Some(e),
            ViewerError::Window(e) => Some(e),
            ViewerError::Gpu(e) => Some(e),
            ViewerError::Morph(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ViewerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(e: winit::error::OsError) -> Self {
        ViewerError::Window(e)
    }
}

impl From<GpuError> for ViewerError {
    fn from(e: GpuError) -> Self {
        ViewerError::Gpu(e)
    }
}

impl From<MorphError> for ViewerError {
    fn from(e: MorphError) -> Self {
        ViewerError::Morph(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morph_error_display() {
        let err = MorphError::LengthMismatch { live: 3, scatter: 4, curve: 4 };
        assert_eq!(err.to_string(), "Buffer length mismatch: live=3, scatter=4, curve=4");

        let err = MorphError::InvalidParameter { name: "scale", value: -1.0 };
        assert!(err.to_string().contains("`scale`"));
    }

    #[test]
    fn test_viewer_error_wraps_morph_error() {
        let err: ViewerError = MorphError::InvalidCount.into();
        assert!(matches!(err, ViewerError::Morph(MorphError::InvalidCount)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
