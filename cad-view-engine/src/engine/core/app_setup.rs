use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::render::view::NoIndirectDrawing;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::render_settings::BACKGROUND_COLOUR;

use crate::engine::camera::viewport_camera::{
    ViewportCamera, camera_controller, light_follows_camera,
};
use crate::engine::core::app_state::{AppState, FpsText, StatusText};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::config_loader::{
    CadViewConfig, CameraConfig, ConfigLoader, apply_loaded_config, start_loading,
};
use crate::engine::render::cad_pass::{CadPassPlugin, CadPassSettings};
use crate::engine::render::section_material::SectionMaterial;
use crate::engine::scene::demo_model::spawn_demo_model;
use crate::engine::scene::node_kind::classify_scene_nodes;
use crate::engine::systems::edge_display::edge_display_shortcuts;
use crate::engine::systems::fps_tracking::fps_notification_system;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::profile::ProfilePlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::fps_tracking::{fps_text_update_system, status_text_update_system};

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers CadViewConfig as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<CadViewConfig>::new(&["json"]))
        .add_plugins(MaterialPlugin::<SectionMaterial>::default())
        .add_plugins(CadPassPlugin)
        .add_plugins(ProfilePlugin)
        .add_plugins(WebRpcPlugin)
        .insert_resource(ClearColor(BACKGROUND_COLOUR))
        .init_resource::<ConfigLoader>();

    let camera = CameraConfig::default();
    app.insert_resource(camera.orbit());

    app.add_systems(Startup, (setup, start_loading).chain())
        .add_systems(
            Update,
            apply_loaded_config.run_if(in_state(AppState::Loading)),
        )
        .add_systems(Update, classify_scene_nodes);

    let runtime_systems = (
        camera_controller,
        light_follows_camera,
        edge_display_shortcuts,
        fps_notification_system,
    )
        .chain();
    app.add_systems(Update, runtime_systems.run_if(in_state(AppState::Running)));

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(
            Update,
            (fps_text_update_system, status_text_update_system),
        );
    }

    app
}

fn spawn_lighting(commands: &mut Commands, viewport_camera: &ViewportCamera) {
    commands.insert_resource(AmbientLight {
        brightness: 400.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(viewport_camera.rotation()),
    ));
}

fn spawn_camera(commands: &mut Commands, viewport_camera: &ViewportCamera) {
    commands.spawn((
        Camera3d::default(),
        CameraConfig::default().projection(),
        viewport_camera.transform(),
        Msaa::Off,
        NoIndirectDrawing,
        CadPassSettings::default(),
        Name::new("Viewport Camera"),
    ));
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<SectionMaterial>>,
    viewport_camera: Res<ViewportCamera>,
) {
    info!("=== CAD VIEW ENGINE ===");

    spawn_lighting(&mut commands, &viewport_camera);
    spawn_camera(&mut commands, &viewport_camera);
    spawn_demo_model(&mut commands, &mut meshes, &mut materials);

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.1, 0.1, 0.1)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                StatusText,
            ));
        });
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
