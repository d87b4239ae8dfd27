//! Example flex spline application.
//!
//! Run with: `cargo run`

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_flex_spline::prelude::*;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(PhysicsPlugins::default())
        .add_plugins(FlexSplinePlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, (edit_spline, show_help))
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut settings: ResMut<FlexSplineSettings>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 8.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: 500.0,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    settings.default_material = materials.add(Color::srgb(0.6, 0.6, 0.6));

    let rail = meshes.add(Cuboid::new(0.3, 0.1, 1.0));
    let post = meshes.add(Cylinder::new(0.08, 1.0));
    let rail_material = materials.add(Color::srgb(0.55, 0.35, 0.2));

    let mut rails = LayerConfig::new(MeshKind::Deformable, rail)
        .with_material(rail_material)
        .with_collision(CollisionMode::QueryAndPhysics);
    rails.up_vector.show_up_direction = true;

    let mut posts = LayerConfig::new(MeshKind::Rigid, post).with_spawn_chance(0.75, true);
    posts.location.location = Vec3::new(0.0, -0.5, 0.0);
    posts.rotation.random_offset = Rotator::new(15.0, 0.0, 0.0);
    posts.scale.uniform_random_offset = 0.2;

    let mut layout = match FlexLayout::new()
        .with_layer("Rails", rails)
        .and_then(|layout| layout.with_layer("Posts", posts))
    {
        Ok(layout) => layout,
        Err(err) => {
            error!("Failed to build demo layout: {err}");
            return;
        }
    };
    layout.debug.show_point_numbers = true;

    commands.spawn((
        Name::new("Fence"),
        Spline::new([
            Vec3::new(-6.0, 0.0, 0.0),
            Vec3::new(-3.0, 0.5, 2.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, -2.0),
            Vec3::new(6.0, 0.0, 0.0),
        ]),
        FlexSpline::new(layout),
    ));
}

fn edit_spline(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<FlexSplineSettings>,
    mut splines: Query<(&mut Spline, &mut FlexSpline)>,
) {
    if keyboard.just_pressed(KeyCode::KeyG) {
        settings.toggle_debug();
    }

    for (mut spline, mut flex) in &mut splines {
        if keyboard.just_pressed(KeyCode::KeyA) {
            let next = spline
                .points
                .last()
                .map_or(Vec3::ZERO, |p| p.position + Vec3::new(3.0, 0.0, 1.0));
            spline.add_point(next);
        }
        if keyboard.just_pressed(KeyCode::KeyX) && spline.points.len() > 2 {
            spline.remove_point(1);
        }
        if keyboard.just_pressed(KeyCode::KeyC) {
            spline.toggle_closed();
        }
        if keyboard.just_pressed(KeyCode::KeyR) {
            let count = flex.layout.points().len();
            let indices: Vec<usize> = (0..count).collect();
            if let Err(err) = flex.layout.edit_points(&indices, |point| {
                point.start_roll += 15.0;
                point.end_roll += 15.0;
            }) {
                warn!("Failed to roll points: {err}");
            }
        }
        if keyboard.just_pressed(KeyCode::KeyL) {
            flex.layout.add_layer();
        }
    }
}

fn show_help(keyboard: Res<ButtonInput<KeyCode>>, mut shown: Local<bool>) {
    if !keyboard.just_pressed(KeyCode::KeyH) {
        return;
    }
    *shown = !*shown;

    if *shown {
        println!("\n=== Flex Spline Demo ===");
        println!("  H - Toggle this help");
        println!("  G - Toggle debug gizmos");
        println!("  A - Append a control point");
        println!("  X - Delete the second control point");
        println!("  C - Toggle closed/open");
        println!("  R - Roll every segment by 15 degrees");
        println!("  L - Add a layer from the template");
        println!("========================\n");
    }
}
