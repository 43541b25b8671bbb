//! Computes exact contact manifolds and intersection states for the
//! candidate pairs produced by the broad phase.
//!
//! The narrow phase owns the persistent [`ContactGraph`] and
//! [`IntersectionGraph`]. Broad-phase pair deltas create and retire graph
//! edges; each step the surviving edges are updated with freshly computed
//! manifolds (through parry's persistent-manifold dispatcher) or boolean
//! intersection tests for sensor pairs. Transitions across the touching and
//! intersecting boundaries are detected here and emitted through the
//! [`EventHandler`].

use parry3d::query::{self, DefaultQueryDispatcher, PersistentQueryDispatcher};

use crate::collision::broad_phase::BroadPhasePairs;
use crate::collision::collider::{Collider, combine_friction, combine_restitution};
use crate::collision::collider_set::ColliderSet;
use crate::collision::contact_graph::{ContactGraph, IntersectionGraph};
use crate::collision::contact_types::{
    ContactManifold, ContactPair, ContactPairFlags, ContactPoint, IntersectionPair,
};
use crate::collision::events::{ContactEvent, EventHandler, IntersectionEvent};
use crate::collision::hooks::{ActiveHooks, PairFilterContext, PhysicsHooks};
use crate::collision::ColliderHandle;
use crate::data_structures::EdgeIndex;
use crate::dynamics::{RigidBody, RigidBodyHandle, RigidBodySet};
use crate::parameters::IntegrationParameters;

/// The narrow phase: exact contact and intersection computation over the
/// persistent interaction graphs.
pub struct NarrowPhase {
    contact_graph: ContactGraph,
    intersection_graph: IntersectionGraph,
    dispatcher: DefaultQueryDispatcher,
    // Workspaces reused across steps.
    old_points: Vec<ContactPoint>,
    edge_scratch: Vec<EdgeIndex>,
    wake_scratch: Vec<RigidBodyHandle>,
    warned_unsupported: bool,
}

impl Default for NarrowPhase {
    fn default() -> Self {
        Self {
            contact_graph: ContactGraph::new(),
            intersection_graph: IntersectionGraph::new(),
            dispatcher: DefaultQueryDispatcher,
            old_points: Vec::new(),
            edge_scratch: Vec::new(),
            wake_scratch: Vec::new(),
            warned_unsupported: false,
        }
    }
}

impl NarrowPhase {
    /// Creates an empty narrow phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// The persistent graph of contact pairs between non-sensor colliders.
    #[inline]
    pub fn contact_graph(&self) -> &ContactGraph {
        &self.contact_graph
    }

    /// The persistent graph of intersection pairs involving sensors.
    #[inline]
    pub fn intersection_graph(&self) -> &IntersectionGraph {
        &self.intersection_graph
    }

    /// Mutable access to the contact graph, for solver impulse write-back.
    #[inline]
    pub(crate) fn contact_graph_mut(&mut self) -> &mut ContactGraph {
        &mut self.contact_graph
    }

    /// Returns the contact pair between two colliders, if their AABBs
    /// currently overlap.
    pub fn contact_pair(
        &self,
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    ) -> Option<&ContactPair> {
        self.contact_graph.get(collider1, collider2)
    }

    /// Returns the intersection pair between two colliders, if their AABBs
    /// currently overlap and at least one is a sensor.
    pub fn intersection_pair(
        &self,
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    ) -> Option<&IntersectionPair> {
        self.intersection_graph.get(collider1, collider2)
    }

    /// Iterates over all contact pairs involving the given collider.
    pub fn contacts_with(
        &self,
        collider: ColliderHandle,
    ) -> impl Iterator<Item = &ContactPair> {
        self.contact_graph.interactions_with(collider)
    }

    /// Iterates over all intersection pairs involving the given collider.
    pub fn intersections_with(
        &self,
        collider: ColliderHandle,
    ) -> impl Iterator<Item = &IntersectionPair> {
        self.intersection_graph.interactions_with(collider)
    }

    /// Iterates over the colliders currently touching the given collider.
    pub fn colliders_touching(
        &self,
        collider: ColliderHandle,
    ) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.contact_graph
            .interactions_with(collider)
            .filter(|pair| pair.is_touching())
            .map(move |pair| {
                if pair.collider1 == collider {
                    pair.collider2
                } else {
                    pair.collider1
                }
            })
    }

    /// Applies the broad phase's pair deltas: retires edges for removed
    /// pairs (emitting stopped/exited events for pairs that were active and
    /// waking their bodies) and creates edges for added pairs, routed to the
    /// contact or intersection graph by the colliders' sensor flags.
    pub fn register_pairs(
        &mut self,
        bodies: &mut RigidBodySet,
        colliders: &ColliderSet,
        pairs: &BroadPhasePairs,
        events: &dyn EventHandler,
    ) {
        // Removals first: a reused collider slot appears as a removal plus
        // an addition under the same pair key.
        for &(collider1, collider2) in &pairs.removed {
            if let Some(pair) = self.contact_graph.remove_pair(collider1, collider2) {
                if pair.is_touching() {
                    if pair.flags.contains(ContactPairFlags::CONTACT_EVENTS) {
                        events.handle_contact_event(ContactEvent {
                            collider1: pair.collider1,
                            collider2: pair.collider2,
                            started: false,
                        });
                    }
                    bodies.wake_up(pair.body1);
                    bodies.wake_up(pair.body2);
                }
            } else if let Some(pair) = self.intersection_graph.remove_pair(collider1, collider2)
            {
                if pair.intersecting && pair.events_enabled {
                    events.handle_intersection_event(IntersectionEvent {
                        collider1: pair.collider1,
                        collider2: pair.collider2,
                        intersecting: false,
                    });
                }
            }
        }

        for &(handle1, handle2) in &pairs.added {
            let (Some(collider1), Some(collider2)) =
                (colliders.get(handle1), colliders.get(handle2))
            else {
                continue;
            };

            let events_enabled = collider1.events_enabled || collider2.events_enabled;
            let hooks = collider1.active_hooks | collider2.active_hooks;
            let custom_filter = hooks.contains(ActiveHooks::FILTER_PAIRS);

            if collider1.is_sensor() || collider2.is_sensor() {
                self.intersection_graph.insert_pair(
                    handle1,
                    handle2,
                    IntersectionPair {
                        collider1: handle1,
                        collider2: handle2,
                        intersecting: false,
                        events_enabled,
                        custom_filter,
                    },
                );
            } else {
                let mut flags = ContactPairFlags::empty();
                flags.set(ContactPairFlags::CONTACT_EVENTS, events_enabled);
                flags.set(ContactPairFlags::CUSTOM_FILTER, custom_filter);
                flags.set(
                    ContactPairFlags::MODIFY_CONTACTS,
                    hooks.contains(ActiveHooks::MODIFY_CONTACTS),
                );
                self.contact_graph.insert_pair(
                    handle1,
                    handle2,
                    ContactPair::new(
                        handle1,
                        handle2,
                        collider1.parent(),
                        collider2.parent(),
                        flags,
                    ),
                );
            }
        }
    }

    /// Updates every tracked pair: computes fresh contact manifolds for
    /// solid pairs and intersection states for sensor pairs, detects
    /// touching/intersecting transitions, and emits the corresponding
    /// events.
    ///
    /// Pairs whose bodies are all static or sleeping are skipped without
    /// touching their state, so sleeping islands cost nothing here.
    pub fn update(
        &mut self,
        params: &IntegrationParameters,
        bodies: &mut RigidBodySet,
        colliders: &ColliderSet,
        hooks: &dyn PhysicsHooks,
        events: &dyn EventHandler,
    ) {
        let Self {
            contact_graph,
            intersection_graph,
            dispatcher,
            old_points,
            edge_scratch,
            wake_scratch,
            warned_unsupported,
        } = self;

        wake_scratch.clear();

        // Contact pairs.
        edge_scratch.clear();
        edge_scratch.extend(contact_graph.edge_indices());
        for &edge in edge_scratch.iter() {
            let Some(pair) = contact_graph.edge_weight_mut(edge) else {
                continue;
            };
            let (Some(collider1), Some(collider2)) =
                (colliders.get(pair.collider1), colliders.get(pair.collider2))
            else {
                continue;
            };
            let (Some(body1), Some(body2)) = (bodies.get(pair.body1), bodies.get(pair.body2))
            else {
                continue;
            };

            // A fully inactive pair keeps last step's state untouched.
            if is_inactive(body1) && is_inactive(body2) {
                continue;
            }

            let allowed = !pair.flags.contains(ContactPairFlags::CUSTOM_FILTER)
                || hooks.filter_pairs(&PairFilterContext {
                    collider1: pair.collider1,
                    collider2: pair.collider2,
                    collider_data1: collider1,
                    collider_data2: collider2,
                });

            if allowed {
                compute_manifolds(
                    pair,
                    collider1,
                    collider2,
                    params.prediction_distance,
                    dispatcher,
                    old_points,
                    warned_unsupported,
                );
                if pair.flags.contains(ContactPairFlags::MODIFY_CONTACTS) {
                    hooks.modify_contacts(pair);
                }
            } else {
                pair.manifolds.clear();
                pair.dispatcher_manifolds.clear();
            }

            // The pair is in contact as soon as a manifold has points, which
            // includes speculative points within the prediction distance.
            // The prediction band doubles as transition hysteresis: a resting
            // contact drifting a fraction of a millimeter off the surface
            // does not flicker between started and stopped.
            let touching = pair
                .manifolds
                .iter()
                .any(|manifold| !manifold.points.is_empty());
            let was_touching = pair.flags.contains(ContactPairFlags::TOUCHING);

            pair.flags
                .remove(ContactPairFlags::STARTED_TOUCHING | ContactPairFlags::STOPPED_TOUCHING);
            pair.flags.set(ContactPairFlags::TOUCHING, touching);

            if touching != was_touching {
                pair.flags.set(ContactPairFlags::STARTED_TOUCHING, touching);
                pair.flags.set(ContactPairFlags::STOPPED_TOUCHING, !touching);
                if pair.flags.contains(ContactPairFlags::CONTACT_EVENTS) {
                    events.handle_contact_event(ContactEvent {
                        collider1: pair.collider1,
                        collider2: pair.collider2,
                        started: touching,
                    });
                }
                wake_scratch.push(pair.body1);
                wake_scratch.push(pair.body2);
            }
        }

        // Intersection pairs.
        edge_scratch.clear();
        edge_scratch.extend(intersection_graph.edge_indices());
        for &edge in edge_scratch.iter() {
            let Some(pair) = intersection_graph.edge_weight_mut(edge) else {
                continue;
            };
            let (Some(collider1), Some(collider2)) =
                (colliders.get(pair.collider1), colliders.get(pair.collider2))
            else {
                continue;
            };
            let (Some(body1), Some(body2)) = (
                bodies.get(collider1.parent()),
                bodies.get(collider2.parent()),
            ) else {
                continue;
            };

            if is_inactive(body1) && is_inactive(body2) {
                continue;
            }

            let allowed = !pair.custom_filter
                || hooks.filter_pairs(&PairFilterContext {
                    collider1: pair.collider1,
                    collider2: pair.collider2,
                    collider_data1: collider1,
                    collider_data2: collider2,
                });

            let intersecting = allowed
                && query::intersection_test(
                    collider1.position(),
                    &**collider1.shape(),
                    collider2.position(),
                    &**collider2.shape(),
                )
                .unwrap_or(false);

            if intersecting != pair.intersecting {
                pair.intersecting = intersecting;
                if pair.events_enabled {
                    events.handle_intersection_event(IntersectionEvent {
                        collider1: pair.collider1,
                        collider2: pair.collider2,
                        intersecting,
                    });
                }
            }
        }

        for handle in wake_scratch.drain(..) {
            bodies.wake_up(handle);
        }
    }
}

/// Returns `true` if the body takes no part in narrow-phase updates.
fn is_inactive(body: &RigidBody) -> bool {
    body.is_static() || body.is_sleeping()
}

/// Computes fresh world-space manifolds for a contact pair, warm-starting
/// the accumulated impulses from last step's matching contact points.
fn compute_manifolds(
    pair: &mut ContactPair,
    collider1: &Collider,
    collider2: &Collider,
    prediction: crate::math::Scalar,
    dispatcher: &DefaultQueryDispatcher,
    old_points: &mut Vec<ContactPoint>,
    warned_unsupported: &mut bool,
) {
    old_points.clear();
    old_points.extend(
        pair.manifolds
            .iter()
            .flat_map(|manifold| manifold.points.iter().copied()),
    );
    pair.manifolds.clear();

    let pos1 = collider1.position();
    let pos2 = collider2.position();
    let pos12 = pos1.inv_mul(pos2);
    let friction = combine_friction(collider1, collider2);
    let restitution = combine_restitution(collider1, collider2);

    let result = dispatcher.contact_manifolds(
        &pos12,
        &**collider1.shape(),
        &**collider2.shape(),
        prediction,
        &mut pair.dispatcher_manifolds,
        &mut pair.workspace,
    );

    match result {
        Ok(()) => {
            for manifold in &pair.dispatcher_manifolds {
                if manifold.points.is_empty() {
                    continue;
                }
                let local_n1 = manifold
                    .subshape_pos1
                    .map_or(manifold.local_n1, |pos| pos * manifold.local_n1);
                let mut out = ContactManifold {
                    points: Vec::with_capacity(manifold.points.len()),
                    normal: pos1 * local_n1,
                    friction,
                    restitution,
                };
                for point in &manifold.points {
                    let local_p1 = manifold
                        .subshape_pos1
                        .map_or(point.local_p1, |pos| pos * point.local_p1);
                    let local_p2 = manifold
                        .subshape_pos2
                        .map_or(point.local_p2, |pos| pos * point.local_p2);
                    out.points.push(ContactPoint {
                        point1: pos1 * local_p1,
                        point2: pos2 * local_p2,
                        dist: point.dist,
                        feature_id1: point.fid1,
                        feature_id2: point.fid2,
                        normal_impulse: 0.0,
                        tangent_impulse: [0.0; 2],
                    });
                }
                out.match_contacts(old_points);
                pair.manifolds.push(out);
            }
        }
        Err(_) => {
            pair.dispatcher_manifolds.clear();
            if !*warned_unsupported {
                log::warn!(
                    "persistent manifold computation is unsupported for a shape pair; \
                     falling back to single-point contacts"
                );
                *warned_unsupported = true;
            }
            if let Ok(Some(contact)) = query::contact(
                pos1,
                &**collider1.shape(),
                pos2,
                &**collider2.shape(),
                prediction,
            ) {
                let mut out = ContactManifold {
                    points: vec![ContactPoint {
                        point1: contact.point1,
                        point2: contact.point2,
                        dist: contact.dist,
                        feature_id1: parry3d::shape::PackedFeatureId::UNKNOWN,
                        feature_id2: parry3d::shape::PackedFeatureId::UNKNOWN,
                        normal_impulse: 0.0,
                        tangent_impulse: [0.0; 2],
                    }],
                    normal: *contact.normal1,
                    friction,
                    restitution,
                };
                out.match_contacts(old_points);
                pair.manifolds.push(out);
            }
        }
    }
}
