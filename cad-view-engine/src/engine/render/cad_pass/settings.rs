use bevy::ecs::query::QueryItem;
use bevy::prelude::*;
use bevy::render::extract_component::ExtractComponent;
use constants::camera::{FAR, NEAR};
use serde::{Deserialize, Serialize};

/// Edge display flags for a camera rendered through the compositor.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadPassSettings {
    /// Classify every line as visible and skip the silhouette.
    pub transparent: bool,
    /// Reserved; carried to the shaders but does not change the output.
    pub colored: bool,
    pub visible_edge: bool,
    pub hidden_edge: bool,
    /// Back-face silhouette drawn into the origin buffer.
    pub silhouette: bool,
}

impl Default for CadPassSettings {
    fn default() -> Self {
        Self {
            transparent: false,
            colored: true,
            visible_edge: true,
            hidden_edge: false,
            silhouette: false,
        }
    }
}

impl CadPassSettings {
    pub fn draws_silhouette(&self) -> bool {
        self.silhouette && self.visible_edge && !self.transparent
    }

    /// Flag vector in shader order `(transparent, colored, visible, hidden)`.
    pub fn params(&self) -> Vec4 {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        Vec4::new(
            flag(self.transparent),
            flag(self.colored),
            flag(self.visible_edge),
            flag(self.hidden_edge),
        )
    }
}

/// Immutable per-view parameter record handed to every compositor pass.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ExtractedCadPass {
    pub settings: CadPassSettings,
    pub near: f32,
    pub far: f32,
    pub logical_size: Vec2,
    pub scale_factor: f32,
}

impl ExtractComponent for CadPassSettings {
    type QueryData = (
        &'static CadPassSettings,
        &'static Camera,
        Option<&'static Projection>,
    );
    type QueryFilter = With<Camera3d>;
    type Out = ExtractedCadPass;

    fn extract_component(
        (settings, camera, projection): QueryItem<'_, Self::QueryData>,
    ) -> Option<Self::Out> {
        // Cameras without a resolved render target have nothing to composite.
        let logical_size = camera.logical_viewport_size()?;
        let scale_factor = camera.target_scaling_factor().unwrap_or(1.0);
        let (near, far) = match projection {
            Some(Projection::Orthographic(ortho)) => (ortho.near, ortho.far),
            Some(Projection::Perspective(perspective)) => (perspective.near, perspective.far),
            _ => (NEAR, FAR),
        };
        Some(ExtractedCadPass {
            settings: *settings,
            near,
            far,
            logical_size,
            scale_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_shader_order() {
        let settings = CadPassSettings {
            transparent: true,
            colored: false,
            visible_edge: true,
            hidden_edge: false,
            silhouette: false,
        };
        assert_eq!(settings.params(), Vec4::new(1.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn transparent_skips_silhouette() {
        let mut settings = CadPassSettings {
            silhouette: true,
            ..default()
        };
        assert!(settings.draws_silhouette());

        settings.transparent = true;
        assert!(!settings.draws_silhouette());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings: CadPassSettings = serde_json::from_str(r#"{ "hidden_edge": true }"#).unwrap();
        assert!(settings.hidden_edge);
        assert!(settings.visible_edge);
        assert!(settings.colored);
    }
}
