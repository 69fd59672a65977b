use bevy::prelude::*;
use serde::Deserialize;

use crate::engine::render::cad_pass::CadPassSettings;

/// Partial update of the edge flags; absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EdgeDisplayUpdate {
    pub transparent: Option<bool>,
    pub colored: Option<bool>,
    pub visible_edge: Option<bool>,
    pub hidden_edge: Option<bool>,
    pub silhouette: Option<bool>,
}

impl EdgeDisplayUpdate {
    pub fn apply(&self, settings: &mut CadPassSettings) {
        let fields = [
            (self.transparent, &mut settings.transparent),
            (self.colored, &mut settings.colored),
            (self.visible_edge, &mut settings.visible_edge),
            (self.hidden_edge, &mut settings.hidden_edge),
            (self.silhouette, &mut settings.silhouette),
        ];
        for (value, flag) in fields {
            if let Some(value) = value {
                *flag = value;
            }
        }
    }
}

pub fn edge_display_json(settings: &CadPassSettings) -> serde_json::Value {
    serde_json::json!({
        "transparent": settings.transparent,
        "colored": settings.colored,
        "visible_edge": settings.visible_edge,
        "hidden_edge": settings.hidden_edge,
        "silhouette": settings.silhouette,
    })
}

/// Flips the flag bound to `key`. Returns the flag's name if one changed.
pub fn toggle_for_key(settings: &mut CadPassSettings, key: KeyCode) -> Option<&'static str> {
    let (name, flag) = match key {
        KeyCode::KeyV => ("visible_edge", &mut settings.visible_edge),
        KeyCode::KeyH => ("hidden_edge", &mut settings.hidden_edge),
        KeyCode::KeyT => ("transparent", &mut settings.transparent),
        KeyCode::KeyO => ("silhouette", &mut settings.silhouette),
        _ => return None,
    };
    *flag = !*flag;
    Some(name)
}

/// V, H, T and O toggle visible edges, hidden edges, transparency and the
/// silhouette. The web build drives the same flags over RPC.
pub fn edge_display_shortcuts(
    mut cameras: Query<&mut CadPassSettings>,
    #[cfg(not(target_arch = "wasm32"))] keyboard: Res<ButtonInput<KeyCode>>,
) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        for key in keyboard.get_just_pressed() {
            for mut settings in &mut cameras {
                if let Some(name) = toggle_for_key(&mut settings, *key) {
                    info!("Edge display: {} = {}", name, edge_display_json(&settings)[name]);
                }
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        for settings in &mut cameras {
            if settings.is_changed() && !settings.is_added() {
                info!("Edge display changed: {}", edge_display_json(&settings));
            }
        }
    }
}
