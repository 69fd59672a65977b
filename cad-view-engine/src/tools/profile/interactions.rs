use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::profile::PLANE_COLOUR;

use super::controller::{HandleMotion, ProfileController, ProfilePhase};
use super::handles::{HandleGrip, pick_handle};
use super::pick::pick_face;
use super::state::{ProfileEvent, ProfilePlaneMesh, SectionTarget};
use crate::engine::camera::viewport_camera::cursor_ray;
use crate::engine::render::section_material::SectionClip;
use crate::engine::scene::node_kind::NodeKind;

/// Grip captured on the press that started the current drag.
#[derive(Resource, Default)]
pub struct ActiveGrip(pub Option<HandleGrip>);

/// World ray under the cursor and the camera's view direction, refreshed
/// every frame. `None` while the cursor is outside the window.
#[derive(Resource, Default, Clone, Copy)]
pub struct PointerRay(pub Option<(Ray3d, Vec3)>);

pub fn update_pointer_ray(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut pointer: ResMut<PointerRay>,
) {
    let ray = match (windows.single(), cameras.single()) {
        (Ok(window), Ok((camera, camera_transform))) => {
            cursor_ray(window, camera, camera_transform)
        }
        _ => None,
    };
    pointer.0 = ray;
}

/// Left press picks a handle (when armed) or a face, drag moves the handle,
/// release ends the drag. A press and release landing in the same frame
/// count as a full click.
pub fn profile_pointer_system(
    mouse: Res<ButtonInput<MouseButton>>,
    pointer: Res<PointerRay>,
    targets: Query<(Entity, &Mesh3d, &GlobalTransform), With<SectionTarget>>,
    meshes: Res<Assets<Mesh>>,
    mut controller: ResMut<ProfileController>,
    mut grip: ResMut<ActiveGrip>,
    mut events: EventWriter<ProfileEvent>,
) {
    if let Some((ray, view_direction)) = pointer.0 {
        if mouse.just_pressed(MouseButton::Left) {
            press(ray, view_direction, &targets, &meshes, &mut controller, &mut grip, &mut events);
        } else if mouse.pressed(MouseButton::Left)
            && matches!(controller.phase, ProfilePhase::Dragging(_))
        {
            drag(ray, &mut controller, &mut grip);
        }
    }

    if mouse.just_released(MouseButton::Left) {
        grip.0 = None;
        if controller.on_drag_stop() {
            if let Some(plane) = controller.plane {
                events.write(ProfileEvent::DragStopped {
                    normal: plane.normal,
                    constant: plane.constant,
                });
            }
        }
    }
}

fn press(
    ray: Ray3d,
    view_direction: Vec3,
    targets: &Query<(Entity, &Mesh3d, &GlobalTransform), With<SectionTarget>>,
    meshes: &Assets<Mesh>,
    controller: &mut ProfileController,
    grip: &mut ActiveGrip,
    events: &mut EventWriter<ProfileEvent>,
) {
    if controller.is_armed() {
        let handle = pick_handle(ray, &controller.frame, view_direction, &controller.dimensions);
        if let Some(handle) = handle {
            if controller.on_drag_start(handle) {
                grip.0 = HandleGrip::begin(handle, &controller.frame, ray, view_direction);
                events.write(ProfileEvent::DragStarted { handle });
            }
            return;
        }
    }

    let clip = controller.plane;
    let candidates = targets
        .iter()
        .filter_map(|(entity, mesh, transform)| Some((entity, meshes.get(&mesh.0)?, transform)));
    let hit = pick_face(ray, candidates, clip.as_ref());
    if controller.on_pick(hit.as_ref()) {
        if let Some(plane) = controller.plane {
            events.write(ProfileEvent::PlanePicked {
                normal: plane.normal,
                constant: plane.constant,
            });
        }
    }
}

fn drag(ray: Ray3d, controller: &mut ProfileController, grip: &mut ActiveGrip) {
    let Some(active) = grip.0.as_mut() else {
        return;
    };
    if let Some(motion) = active.advance(ray) {
        let moved = match motion {
            HandleMotion::Translate(delta) => delta != Vec3::ZERO,
            HandleMotion::Rotate(rotation) => rotation != Quat::IDENTITY,
        };
        if moved {
            controller.on_drag(motion);
        }
    }
}

/// Spawns the plane mesh on the first pick and keeps it on the controller's
/// mesh transform.
pub fn sync_profile_plane_mesh(
    mut commands: Commands,
    mut controller: ResMut<ProfileController>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut planes: Query<&mut Transform, With<ProfilePlaneMesh>>,
) {
    if !controller.is_changed() || controller.plane.is_none() {
        return;
    }

    if let Some(mut transform) = controller.plane_mesh.and_then(|entity| planes.get_mut(entity).ok()) {
        *transform = controller.mesh;
        return;
    }

    let dimensions = controller.dimensions;
    let entity = commands
        .spawn((
            Mesh3d(meshes.add(Rectangle::new(dimensions.plane_width, dimensions.plane_height))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: PLANE_COLOUR,
                alpha_mode: AlphaMode::Blend,
                double_sided: true,
                cull_mode: None,
                unlit: true,
                ..default()
            })),
            controller.mesh,
            NodeKind::Helper,
            ProfilePlaneMesh,
            Name::new("Profile Plane"),
        ))
        .id();
    debug!("Spawned profile plane mesh {:?}", entity);
    controller.bypass_change_detection().plane_mesh = Some(entity);
}

/// Mirrors the controller's plane into the shared clip resource.
pub fn publish_section_clip(controller: Res<ProfileController>, mut section: ResMut<SectionClip>) {
    if !controller.is_changed() {
        return;
    }
    let clip = SectionClip::from_plane(controller.plane);
    if *section != clip {
        *section = clip;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::profile::handles::HandleName;
    use crate::tools::profile::pick::FaceHit;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<ProfileController>()
            .init_resource::<SectionClip>()
            .add_systems(Update, (sync_profile_plane_mesh, publish_section_clip));
        app
    }

    fn pick(app: &mut App) {
        let hit = FaceHit {
            entity: Entity::PLACEHOLDER,
            point: Vec3::new(0.0, 0.0, 5.0),
            triangle: [
                Vec3::new(-5.0, 5.0, 5.0),
                Vec3::new(-5.0, -5.0, 5.0),
                Vec3::new(5.0, 5.0, 5.0),
            ],
            normal: Vec3::Z,
            distance: 1.0,
        };
        let mut controller = app.world_mut().resource_mut::<ProfileController>();
        assert!(controller.on_pick(Some(&hit)));
    }

    fn pointer_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<ProfileController>()
            .init_resource::<ActiveGrip>()
            .init_resource::<PointerRay>()
            .add_event::<ProfileEvent>()
            .add_systems(Update, profile_pointer_system);

        let wall = app
            .world_mut()
            .resource_mut::<Assets<Mesh>>()
            .add(Rectangle::new(10.0, 10.0));
        app.world_mut().spawn((
            Mesh3d(wall),
            GlobalTransform::from_translation(Vec3::new(0.0, 0.0, 5.0)),
            SectionTarget,
        ));
        app
    }

    /// Press and release before the next update, as a quick tap does.
    fn click_at(app: &mut App, point: Vec3) {
        let ray = Ray3d::new(point + Vec3::Z * 50.0, Dir3::NEG_Z);
        app.world_mut().resource_mut::<PointerRay>().0 = Some((ray, Vec3::NEG_Z));
        let mut mouse = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
        mouse.press(MouseButton::Left);
        mouse.release(MouseButton::Left);
        app.world_mut().resource_mut::<Events<ProfileEvent>>().update();
        app.update();
        app.world_mut().resource_mut::<ButtonInput<MouseButton>>().clear();
    }

    fn event_count(app: &App) -> usize {
        app.world()
            .resource::<Events<ProfileEvent>>()
            .iter_current_update_events()
            .count()
    }

    #[test]
    fn click_within_one_frame_picks_the_face() {
        let mut app = pointer_app();
        click_at(&mut app, Vec3::new(0.3, 0.2, 5.0));

        let controller = app.world().resource::<ProfileController>();
        assert_eq!(controller.phase, ProfilePhase::Armed);
        assert!(controller.plane.is_some());
        assert_eq!(event_count(&app), 1);
    }

    #[test]
    fn click_on_handle_starts_and_stops_a_drag() {
        let mut app = pointer_app();
        click_at(&mut app, Vec3::new(0.3, 0.2, 5.0));

        let frame = app.world().resource::<ProfileController>().frame;
        let direction = HandleName::XPositive.arrow_direction(&frame).unwrap();
        click_at(&mut app, frame.position + direction * 5.0);

        let controller = app.world().resource::<ProfileController>();
        assert_eq!(controller.phase, ProfilePhase::Armed);
        assert!(app.world().resource::<ActiveGrip>().0.is_none());
        let events: Vec<_> = app
            .world()
            .resource::<Events<ProfileEvent>>()
            .iter_current_update_events()
            .cloned()
            .collect();
        assert!(matches!(
            events.as_slice(),
            [
                ProfileEvent::DragStarted { handle: HandleName::XPositive },
                ProfileEvent::DragStopped { .. },
            ]
        ));
    }

    #[test]
    fn first_pick_spawns_one_helper_plane() {
        let mut app = app();
        pick(&mut app);
        app.update();
        pick(&mut app);
        app.update();

        let world = app.world_mut();
        let mut planes = world.query_filtered::<&NodeKind, With<ProfilePlaneMesh>>();
        let kinds: Vec<_> = planes.iter(world).copied().collect();
        assert_eq!(kinds, vec![NodeKind::Helper]);
        assert!(world.resource::<ProfileController>().plane_mesh.is_some());
    }

    #[test]
    fn plane_mesh_follows_drag() {
        let mut app = app();
        pick(&mut app);
        app.update();

        {
            let mut controller = app.world_mut().resource_mut::<ProfileController>();
            assert!(controller.on_drag_start(HandleName::ZPositive));
            assert!(controller.on_drag(HandleMotion::Translate(Vec3::Z * 3.0)));
        }
        app.update();

        let world = app.world();
        let entity = world.resource::<ProfileController>().plane_mesh.unwrap();
        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::new(0.0, 0.0, 8.0));
    }

    #[test]
    fn section_clip_tracks_plane() {
        let mut app = app();
        app.update();
        assert!(!app.world().resource::<SectionClip>().is_active());

        pick(&mut app);
        app.update();
        let clip = *app.world().resource::<SectionClip>();
        assert!(clip.is_active());
        assert_eq!(clip.plane, Vec4::new(0.0, 0.0, 1.0, -5.0));
    }
}
