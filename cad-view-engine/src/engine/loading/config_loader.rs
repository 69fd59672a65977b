use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use constants::camera::{FAR, FRUSTUM_HEIGHT, INITIAL_POSITION, NEAR};
use serde::{Deserialize, Serialize};

use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::engine::core::app_state::AppState;
use crate::engine::render::cad_pass::CadPassSettings;
use crate::tools::profile::{ProfileController, ProfileDimensions};

pub const CONFIG_PATH: &str = "config/cad_view.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub frustum_height: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frustum_height: FRUSTUM_HEIGHT,
            near: NEAR,
            far: FAR,
            position: INITIAL_POSITION,
        }
    }
}

impl CameraConfig {
    pub fn projection(&self) -> Projection {
        Projection::from(OrthographicProjection {
            near: self.near,
            far: self.far,
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: self.frustum_height,
            },
            ..OrthographicProjection::default_3d()
        })
    }

    pub fn orbit(&self) -> ViewportCamera {
        ViewportCamera::from_position(Vec3::from_array(self.position), Vec3::ZERO)
    }
}

/// View configuration loaded from `assets/config/cad_view.json`.
#[derive(Asset, TypePath, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CadViewConfig {
    pub edges: CadPassSettings,
    pub profile: ProfileDimensions,
    pub camera: CameraConfig,
}

#[derive(Resource, Default)]
pub struct ConfigLoader {
    handle: Option<Handle<CadViewConfig>>,
}

pub fn start_loading(mut loader: ResMut<ConfigLoader>, asset_server: Res<AssetServer>) {
    info!("Loading view configuration from {}", CONFIG_PATH);
    loader.handle = Some(asset_server.load(CONFIG_PATH));
}

/// Applies the loaded configuration, or the defaults if loading failed,
/// then enters `AppState::Running`.
pub fn apply_loaded_config(
    loader: Res<ConfigLoader>,
    asset_server: Res<AssetServer>,
    configs: Res<Assets<CadViewConfig>>,
    mut cameras: Query<(&mut CadPassSettings, &mut Projection), With<Camera3d>>,
    mut viewport_camera: ResMut<ViewportCamera>,
    mut controller: ResMut<ProfileController>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };

    let config = if let Some(config) = configs.get(handle) {
        info!("View configuration loaded");
        *config
    } else if let LoadState::Failed(err) = asset_server.load_state(handle) {
        warn!("Failed to load {}: {}; using defaults", CONFIG_PATH, err);
        CadViewConfig::default()
    } else {
        return;
    };

    for (mut settings, mut projection) in &mut cameras {
        *settings = config.edges;
        *projection = config.camera.projection();
    }
    *viewport_camera = config.camera.orbit();
    controller.dimensions = config.profile;

    info!("→ Transitioning to Running state");
    next_state.set(AppState::Running);
}
