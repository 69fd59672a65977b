//! Profile tool: a clip plane created by picking a face and moved with
//! on-screen handles.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──pick face──> Armed ──press handle──> Dragging
//!                       ^  └──pick face (replace)  │
//!                       └────────release───────────┘
//! ```
//!
//! The pure state machine lives in [`controller`]; [`interactions`] turns
//! pointer input into controller events and mirrors the result into the
//! scene (plane mesh, [`SectionClip`]), while [`helpers`] draws the handles.
//!
//! Translation handles whose axis does not match the plane's current
//! orientation first re-base the plane onto that axis (see [`axis`]), so
//! dragging the X arrow of a Z-facing plane turns it into an X-facing one
//! before moving it.

use bevy::prelude::*;

use crate::engine::core::app_state::AppState;
use crate::engine::render::section_material::{SectionClip, sync_section_materials};

pub mod axis;
pub mod controller;
pub mod handles;
pub mod helpers;
pub mod interactions;
pub mod pick;
pub mod state;

pub use controller::ProfileController;
pub use state::{ProfileDimensions, ProfileEvent, SectionTarget};

use helpers::draw_profile_helpers;
use interactions::{
    ActiveGrip, PointerRay, profile_pointer_system, publish_section_clip,
    sync_profile_plane_mesh, update_pointer_ray,
};

pub struct ProfilePlugin;

impl Plugin for ProfilePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProfileController>()
            .init_resource::<ActiveGrip>()
            .init_resource::<PointerRay>()
            .init_resource::<SectionClip>()
            .add_event::<ProfileEvent>()
            .add_systems(
                Update,
                (
                    update_pointer_ray,
                    profile_pointer_system,
                    sync_profile_plane_mesh,
                    publish_section_clip,
                    sync_section_materials,
                )
                    .chain()
                    .run_if(in_state(AppState::Running)),
            )
            .add_systems(
                Update,
                draw_profile_helpers.run_if(in_state(AppState::Running)),
            );
    }
}
