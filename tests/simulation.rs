//! Scenario tests exercising the full pipeline.

use approx::assert_relative_eq;
use impulse3d::prelude::*;

/// Everything a simulation needs, bundled for tests.
struct World {
    gravity: Vector,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    joints: JointSet,
    ccd_solver: CcdSolver,
}

impl World {
    fn new(gravity: Vector) -> Self {
        Self {
            gravity,
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            joints: JointSet::new(),
            ccd_solver: CcdSolver::new(),
        }
    }

    fn step(&mut self, events: &dyn EventHandler) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.ccd_solver,
            &(),
            events,
        );
    }

    fn step_n(&mut self, steps: usize, events: &dyn EventHandler) {
        for _ in 0..steps {
            self.step(events);
        }
    }

    fn add_body(&mut self, builder: RigidBodyBuilder, collider: ColliderBuilder) -> (RigidBodyHandle, ColliderHandle) {
        let body = self.bodies.insert(builder.build().unwrap());
        let collider = self
            .colliders
            .insert_with_parent(collider.build().unwrap(), body, &mut self.bodies)
            .unwrap();
        (body, collider)
    }

    fn floor(&mut self) -> (RigidBodyHandle, ColliderHandle) {
        self.add_body(
            RigidBodyBuilder::fixed(),
            ColliderBuilder::cuboid(20.0, 0.5, 20.0),
        )
    }
}

fn gravity() -> Vector {
    Vector::new(0.0, -9.81, 0.0)
}

#[test]
fn ball_rests_on_floor_and_falls_asleep() {
    let mut world = World::new(gravity());
    world.floor();
    let (ball, _) = world.add_body(
        RigidBodyBuilder::dynamic().translation(Vector::new(0.0, 2.0, 0.0)),
        ColliderBuilder::ball(0.5),
    );

    world.step_n(300, &());

    let body = world.bodies.get(ball).unwrap();
    // Resting on the floor surface (y = 0.5) with bounded penetration.
    let height = body.translation().y;
    assert!(height > 0.9 && height < 1.05, "resting height {height}");
    assert!(body.linvel().norm() < 0.05, "resting velocity {}", body.linvel().norm());
    // Left undisturbed past the inactivity threshold, the island sleeps.
    assert!(body.is_sleeping());

    // And stays exactly where it was while asleep.
    let before = body.translation();
    world.step_n(60, &());
    let after = world.bodies.get(ball).unwrap();
    assert!(after.is_sleeping());
    assert_relative_eq!(after.translation().y, before.y, epsilon = 1.0e-6);
}

#[test]
fn contact_events_fire_exactly_on_touch_transitions() {
    let queue = CollisionEventQueue::new(QueuePolicy::Accumulate);
    let mut world = World::new(gravity());
    let (_, floor_collider) = world.floor();
    let (ball, ball_collider) = world.add_body(
        RigidBodyBuilder::dynamic().translation(Vector::new(0.0, 2.0, 0.0)),
        ColliderBuilder::ball(0.5),
    );

    world.step_n(300, &queue);

    // One started event for the ball/floor pair, no stopped events, no
    // repeats while the resting contact persists across hundreds of steps.
    let events: Vec<ContactEvent> = queue
        .drain_contact_events()
        .into_iter()
        .filter(|event| {
            let pair = [event.collider1, event.collider2];
            pair.contains(&floor_collider) && pair.contains(&ball_collider)
        })
        .collect();
    assert_eq!(events.len(), 1);
    assert!(events[0].started);

    // Yank the ball far away: exactly one stopped event.
    world
        .bodies
        .get_mut(ball)
        .unwrap()
        .set_position(Isometry::translation(50.0, 50.0, 0.0));
    world.step_n(5, &queue);

    let events = queue.drain_contact_events();
    assert_eq!(events.len(), 1);
    assert!(!events[0].started);
}

#[test]
fn point_count_fluctuations_emit_no_events() {
    let queue = CollisionEventQueue::new(QueuePolicy::Accumulate);
    let mut world = World::new(gravity());
    let (_, floor_collider) = world.floor();
    // A box settling face-down: its manifold point count varies between one
    // and four while it rocks into place, which must not produce events.
    let (_, box_collider) = world.add_body(
        RigidBodyBuilder::dynamic()
            .translation(Vector::new(0.0, 1.0, 0.0))
            .angvel(Vector::new(0.1, 0.0, 0.1)),
        ColliderBuilder::cuboid(0.3, 0.3, 0.3),
    );

    world.step_n(300, &queue);

    let events: Vec<ContactEvent> = queue
        .drain_contact_events()
        .into_iter()
        .filter(|event| {
            let pair = [event.collider1, event.collider2];
            pair.contains(&floor_collider) && pair.contains(&box_collider)
        })
        .collect();
    assert_eq!(events.len(), 1, "events: {events:?}");
    assert!(events[0].started);
}

#[test]
fn non_dynamic_pairs_emit_no_contact_events() {
    let queue = CollisionEventQueue::new(QueuePolicy::Accumulate);
    let mut world = World::new(gravity());

    // Overlapping static + static, static + kinematic, kinematic + kinematic.
    world.add_body(RigidBodyBuilder::fixed(), ColliderBuilder::ball(1.0));
    world.add_body(
        RigidBodyBuilder::fixed().translation(Vector::new(0.5, 0.0, 0.0)),
        ColliderBuilder::ball(1.0),
    );
    world.add_body(
        RigidBodyBuilder::kinematic().translation(Vector::new(0.0, 0.5, 0.0)),
        ColliderBuilder::ball(1.0),
    );
    world.add_body(
        RigidBodyBuilder::kinematic().translation(Vector::new(0.5, 0.5, 0.0)),
        ColliderBuilder::ball(1.0),
    );

    world.step_n(10, &queue);

    assert!(queue.drain_contact_events().is_empty());
    assert!(queue.drain_intersection_events().is_empty());
    // The narrow phase never even tracked a pair.
    assert!(world.narrow_phase.contact_graph().is_empty());
}

#[test]
fn sensors_emit_intersection_events_only() {
    let queue = CollisionEventQueue::new(QueuePolicy::Accumulate);
    let mut world = World::new(Vector::zeros());

    // A static sensor region and a dynamic ball flying through it.
    let (_, sensor_collider) = world.add_body(
        RigidBodyBuilder::fixed(),
        ColliderBuilder::cuboid(1.0, 1.0, 1.0).sensor(true),
    );
    let (ball, ball_collider) = world.add_body(
        RigidBodyBuilder::dynamic()
            .translation(Vector::new(-5.0, 0.0, 0.0))
            .linvel(Vector::new(10.0, 0.0, 0.0)),
        ColliderBuilder::ball(0.25),
    );

    world.step_n(60, &queue);

    // The sensor pair never appears in the contact stream, and produced a
    // paired enter/exit in the intersection stream.
    assert!(queue.drain_contact_events().is_empty());
    let intersections: Vec<IntersectionEvent> = queue
        .drain_intersection_events()
        .into_iter()
        .filter(|event| {
            let pair = [event.collider1, event.collider2];
            pair.contains(&sensor_collider) && pair.contains(&ball_collider)
        })
        .collect();
    assert_eq!(intersections.len(), 2);
    assert!(intersections[0].intersecting);
    assert!(!intersections[1].intersecting);

    // The sensor never constrained the ball's motion.
    assert!(world.bodies.get(ball).unwrap().translation().x > 4.0);
}

#[test]
fn ccd_stops_tunneling_through_thin_wall() {
    let projectile = |ccd: bool| {
        let mut world = World::new(Vector::zeros());
        // A thin static wall at x = 5, much thinner than the projectile's
        // per-step travel (90 m/s / 60 Hz = 1.5 m).
        world.add_body(
            RigidBodyBuilder::fixed().translation(Vector::new(5.0, 0.0, 0.0)),
            ColliderBuilder::cuboid(0.05, 3.0, 3.0),
        );
        let (ball, _) = world.add_body(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(0.0, 0.0, 0.0))
                .linvel(Vector::new(90.0, 0.0, 0.0))
                .ccd_enabled(ccd),
            ColliderBuilder::ball(0.2),
        );
        world.step_n(30, &());
        world.bodies.get(ball).unwrap().translation().x
    };

    // With CCD the projectile is stopped at the wall; without it, the wall
    // is never even seen.
    assert!(projectile(true) < 5.0);
    assert!(projectile(false) > 10.0);
}

#[test]
fn removing_a_body_cascades() {
    let queue = CollisionEventQueue::new(QueuePolicy::Accumulate);
    let mut world = World::new(gravity());
    let (_, floor_collider) = world.floor();
    let (ball, ball_collider) = world.add_body(
        RigidBodyBuilder::dynamic().translation(Vector::new(0.0, 1.0, 0.0)),
        ColliderBuilder::ball(0.5),
    );
    let (anchor, _) = world.add_body(
        RigidBodyBuilder::dynamic().translation(Vector::new(2.0, 1.0, 0.0)),
        ColliderBuilder::ball(0.5),
    );
    // The joint is satisfied at rest: the two centers sit two meters apart.
    let joint = world
        .joints
        .insert(ball, anchor, DistanceJoint::new(2.0), &mut world.bodies)
        .unwrap();

    // Settle into resting contact.
    world.step_n(120, &queue);
    assert!(
        world
            .narrow_phase
            .contact_pair(floor_collider, ball_collider)
            .is_some_and(|pair| pair.is_touching())
    );
    let _ = queue.drain_contact_events();

    // Remove the body: its collider and joint go with it.
    world
        .bodies
        .remove(ball, &mut world.colliders, &mut world.joints);
    assert!(!world.colliders.contains(ball_collider));
    assert!(!world.joints.contains(joint));

    world.step_n(2, &queue);

    // The old pair is gone from the narrow phase, a stopped event was
    // emitted for it, and no further contacts mention the dead handles.
    assert!(
        world
            .narrow_phase
            .contact_pair(floor_collider, ball_collider)
            .is_none()
    );
    let stopped: Vec<ContactEvent> = queue
        .drain_contact_events()
        .into_iter()
        .filter(|event| !event.started)
        .collect();
    assert_eq!(stopped.len(), 1);
    let pair = [stopped[0].collider1, stopped[0].collider2];
    assert!(pair.contains(&ball_collider));
}

#[test]
fn sequential_stepping_is_deterministic() {
    let run = || {
        let mut world = World::new(gravity());
        world.floor();
        for i in 0..10 {
            world.add_body(
                RigidBodyBuilder::dynamic().translation(Vector::new(
                    (i as Scalar) * 0.1,
                    1.0 + (i as Scalar) * 1.1,
                    (i as Scalar) * -0.05,
                )),
                ColliderBuilder::ball(0.5),
            );
        }
        world.step_n(120, &());
        world
            .bodies
            .iter()
            .map(|(_, body)| *body.position())
            .collect::<Vec<_>>()
    };

    let first = run();
    let second = run();
    // Bit-identical trajectories for identical inputs.
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.translation.vector, b.translation.vector);
        assert_eq!(a.rotation, b.rotation);
    }
}

#[test]
fn kinematic_platform_carries_resting_box() {
    let mut world = World::new(gravity());
    let (platform, _) = world.add_body(
        RigidBodyBuilder::kinematic(),
        ColliderBuilder::cuboid(2.0, 0.25, 2.0).friction(1.0),
    );
    let (cargo, _) = world.add_body(
        RigidBodyBuilder::dynamic().translation(Vector::new(0.0, 0.8, 0.0)),
        ColliderBuilder::cuboid(0.25, 0.25, 0.25).friction(1.0),
    );

    // Let the cargo settle on the platform.
    world.step_n(60, &());

    // Drive the platform sideways through kinematic targets.
    let dt = world.params.dt;
    let speed = 1.0;
    let mut x = 0.0;
    for _ in 0..120 {
        x += speed * dt;
        world
            .bodies
            .get_mut(platform)
            .unwrap()
            .set_next_kinematic_position(Isometry::translation(x, 0.0, 0.0));
        world.step(&());
    }

    // The platform was never moved by the solver and reached its target
    // exactly; friction dragged the cargo along.
    let platform_body = world.bodies.get(platform).unwrap();
    assert_relative_eq!(platform_body.translation().x, x, epsilon = 1.0e-4);
    let cargo_body = world.bodies.get(cargo).unwrap();
    assert!(
        cargo_body.translation().x > 0.5 * x,
        "cargo was left behind at x = {}",
        cargo_body.translation().x
    );
}

#[test]
fn filter_hook_suppresses_opted_in_pairs() {
    // A hook that rejects every pair it is asked about.
    struct RejectAll;
    impl PhysicsHooks for RejectAll {
        fn filter_pairs(&self, _context: &PairFilterContext) -> bool {
            false
        }
    }

    let run = |active_hooks: ActiveHooks| {
        let mut world = World::new(gravity());
        world.floor();
        let ball = world.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(0.0, 2.0, 0.0))
                .build()
                .unwrap(),
        );
        world
            .colliders
            .insert_with_parent(
                ColliderBuilder::ball(0.5)
                    .active_hooks(active_hooks)
                    .build()
                    .unwrap(),
                ball,
                &mut world.bodies,
            )
            .unwrap();

        for _ in 0..120 {
            world.pipeline.step(
                &world.gravity,
                &world.params,
                &mut world.islands,
                &mut world.broad_phase,
                &mut world.narrow_phase,
                &mut world.bodies,
                &mut world.colliders,
                &mut world.joints,
                &mut world.ccd_solver,
                &RejectAll,
                &(),
            );
        }
        world.bodies.get(ball).unwrap().translation().y
    };

    // Without the opt-in flag the hook is never consulted and the ball
    // lands on the floor; with it, the pair is suppressed and the ball
    // falls straight through.
    assert!(run(ActiveHooks::empty()) > 0.5);
    assert!(run(ActiveHooks::FILTER_PAIRS) < -2.0);
}

#[test]
fn joint_keeps_bodies_linked() {
    let mut world = World::new(gravity());
    let anchor = world
        .bodies
        .insert(RigidBodyBuilder::fixed().build().unwrap());
    let (bob, _) = world.add_body(
        RigidBodyBuilder::dynamic().translation(Vector::new(1.0, 0.0, 0.0)),
        ColliderBuilder::ball(0.1),
    );
    world
        .joints
        .insert(
            anchor,
            bob,
            SphericalJoint::new().with_local_anchor_2(Point::new(-1.0, 0.0, 0.0)),
            &mut world.bodies,
        )
        .unwrap();

    world.step_n(240, &());

    // The pendulum bob stays a fixed distance from the anchor point while
    // swinging under gravity.
    let bob_body = world.bodies.get(bob).unwrap();
    let world_anchor = bob_body.position() * Point::new(-1.0, 0.0, 0.0);
    let distance = world_anchor.coords.norm();
    assert!(distance < 0.1, "anchor drifted {distance}");
}
