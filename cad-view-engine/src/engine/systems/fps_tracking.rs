use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

use crate::engine::core::app_state::{FpsText, StatusText};
use crate::engine::render::cad_pass::CadPassSettings;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::profile::ProfileController;

const FPS_NOTIFICATION_INTERVAL: f32 = 0.5;

pub fn fps_notification_system(
    mut rpc_interface: ResMut<WebRpcInterface>,
    diagnostics: Res<DiagnosticsStore>,
    mut last_send_time: Local<f32>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    if current_time - *last_send_time >= FPS_NOTIFICATION_INTERVAL {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                rpc_interface.send_notification(
                    "fps_update",
                    serde_json::json!({
                        "fps": value as f32
                    }),
                );
                *last_send_time = current_time;
            }
        }
    }
}

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}

pub fn status_line(settings: &CadPassSettings, controller: &ProfileController) -> String {
    let flag = |on: bool| if on { "on" } else { "off" };
    let axis = controller
        .detected_axis()
        .map_or("-", |detection| detection.axis.as_str());
    format!(
        "[V]isible {} | [H]idden {} | [T]ransparent {} | [O]utline {} | profile: {} ({})",
        flag(settings.visible_edge),
        flag(settings.hidden_edge),
        flag(settings.transparent),
        flag(settings.silhouette),
        controller.phase.as_str(),
        axis,
    )
}

pub fn status_text_update_system(
    cameras: Query<Ref<CadPassSettings>>,
    controller: Res<ProfileController>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    let Ok(settings) = cameras.single() else {
        return;
    };
    if !settings.is_changed() && !controller.is_changed() {
        return;
    }
    let line = status_line(&settings, &controller);
    for mut text in &mut query {
        text.0 = line.clone();
    }
}
