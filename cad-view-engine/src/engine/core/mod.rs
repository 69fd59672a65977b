//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration and the
//! loading-to-running transition for both native and WASM targets.

/// App construction: plugins, the orthographic camera, lighting, the demo
/// scene and the native overlay.
pub mod app_setup;

/// Application state machine and overlay markers.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
