//! # raop-sender-windows
//!
//! Windows WASAPI loopback backend for the RAOP sender.
//!
//! Provides:
//! - `WasapiLoopbackCapture`: system audio capture via WASAPI loopback on the default render endpoint
//! - `UnsupportedPlatformCapture`: reports `DeviceUnavailable` on other hosts
//! - `LoopbackCapture`: whichever of the two applies to the build target
//!
//! ## Usage
//! ```ignore
//! use raop_sender_core::CapturePipeline;
//! use raop_sender_windows::LoopbackCapture;
//!
//! let mut pipeline = CapturePipeline::new(LoopbackCapture::default_device());
//! let format = pipeline.open()?;
//! ```

#[cfg(target_os = "windows")]
mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod wasapi_loopback;

#[cfg(not(target_os = "windows"))]
pub mod unsupported;

#[cfg(target_os = "windows")]
pub use wasapi_loopback::WasapiLoopbackCapture;

#[cfg(not(target_os = "windows"))]
pub use unsupported::UnsupportedPlatformCapture;

/// Loopback provider for the build target.
#[cfg(target_os = "windows")]
pub type LoopbackCapture = WasapiLoopbackCapture;

/// Loopback provider for the build target.
#[cfg(not(target_os = "windows"))]
pub type LoopbackCapture = UnsupportedPlatformCapture;
