//! View configuration loading.
//!
//! `assets/config/cad_view.json` is read through `bevy_common_assets` as a
//! [`config_loader::CadViewConfig`] asset. Once it resolves (or fails), the
//! edge flags, camera frustum and profile dimensions are applied and the app
//! enters `AppState::Running`.

/// JSON view configuration asset and the loading state transition.
pub mod config_loader;
