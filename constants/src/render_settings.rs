use bevy::color::Color;

/// View-space distance a line fragment may sit behind the stored surface
/// before it is classified as hidden.
pub const EDGE_DEPTH_EPSILON: f32 = 0.1;

/// Weight applied to the four axis neighbours in the bold pass.
pub const BOLD_NEIGHBOUR_WEIGHT: f32 = 0.2;

/// Centre samples above this are already saturated and skip the bold fold.
pub const BOLD_SATURATION: f32 = 0.99;

/// Multiplicative darkening applied by full visible-edge coverage.
pub const VISIBLE_EDGE_DARKEN: f32 = 0.85;

/// Grey tone hidden edges blend towards (0xDF / 0xFF).
pub const HIDDEN_EDGE_TONE: f32 = 0.87451;

/// Clip-space thickness of the back-face silhouette.
pub const SILHOUETTE_THICKNESS: f32 = 0.003;

/// Silhouette tone written into the origin buffer.
pub const SILHOUETTE_TONE: f32 = 0.12;

pub const BACKGROUND_COLOUR: Color = Color::hsl(195.0, 0.2, 0.9);
pub const MODEL_COLOUR: Color = Color::srgb(0.035, 0.78, 0.969);
pub const EDGE_LINE_COLOUR: Color = Color::BLACK;

/// Crease angle (degrees) above which a shared edge becomes a feature line.
pub const FEATURE_EDGE_THRESHOLD_DEGREES: f32 = 1.0;
