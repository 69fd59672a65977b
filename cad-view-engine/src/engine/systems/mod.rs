//! Runtime systems for edge display control and diagnostics.

/// Edge flag shortcuts (native) and the partial-update form used by RPC.
pub mod edge_display;

/// FPS tracking and notification systems for performance monitoring.
///
/// Sends frame rate updates to frontend via RPC and updates native UI overlays.
pub mod fps_tracking;
