//! Collects pairs of potentially colliding colliders using AABB
//! intersection checks.
//!
//! The broad phase maintains one margin-inflated AABB interval per collider
//! and uses [sweep and prune](https://en.wikipedia.org/wiki/Sweep_and_prune)
//! along the `x` axis to produce a conservative superset of the actually
//! colliding pairs. Pairs that appear or disappear between steps are reported
//! as explicit deltas so the narrow phase can create and retire its
//! persistent graph edges.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use parry3d::bounding_volume::{Aabb, BoundingVolume};

use crate::collision::collider::ColliderHandle;
use crate::collision::collider_set::ColliderSet;
use crate::data_structures::PairKey;
use crate::dynamics::{RigidBodySet, RigidBodyType};
use crate::parameters::IntegrationParameters;

bitflags::bitflags! {
    /// Flags for AABB intervals in the broad phase.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AabbIntervalFlags: u8 {
        /// Set if the parent body is not dynamic. Pairs where both colliders
        /// have this flag never produce contacts or intersections.
        const NON_DYNAMIC = 1 << 0;
        /// Set if the parent body is static or sleeping. Pairs where both
        /// colliders are inactive are skipped by the sweep, but existing
        /// pairs are kept alive while their AABBs still overlap so that
        /// sleeping contacts are not retired.
        const INACTIVE = 1 << 1;
    }
}

/// A collider's entry in the sweep list.
#[derive(Clone)]
struct AabbInterval {
    collider: ColliderHandle,
    body: crate::dynamics::RigidBodyHandle,
    aabb: Aabb,
    layers: crate::collision::CollisionLayers,
    flags: AabbIntervalFlags,
}

/// Candidate-pair deltas produced by one broad-phase update.
#[derive(Clone, Debug, Default)]
pub struct BroadPhasePairs {
    /// Pairs whose inflated AABBs started overlapping this step.
    pub added: Vec<(ColliderHandle, ColliderHandle)>,
    /// Pairs whose inflated AABBs stopped overlapping this step
    /// (or whose colliders were removed).
    pub removed: Vec<(ColliderHandle, ColliderHandle)>,
}

impl BroadPhasePairs {
    fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
    }
}

/// The sweep-and-prune broad phase.
///
/// Intervals are kept sorted along the `x` axis with insertion sort, which is
/// nearly linear here because bodies rarely move far between two steps.
#[derive(Default)]
pub struct BroadPhase {
    intervals: Vec<AabbInterval>,
    tracked: HashSet<ColliderHandle>,
    /// The candidate pairs from the previous update, in insertion order.
    pairs: IndexMap<PairKey, (ColliderHandle, ColliderHandle)>,
    // Workspaces reused across updates.
    new_pairs: IndexMap<PairKey, (ColliderHandle, ColliderHandle)>,
    interval_of: HashMap<ColliderHandle, usize>,
}

impl BroadPhase {
    /// Creates an empty broad phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refreshes all proxies from the current collider poses and sweeps for
    /// candidate pairs, reporting added and removed pairs in `pairs_out`.
    pub fn update(
        &mut self,
        params: &IntegrationParameters,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        pairs_out: &mut BroadPhasePairs,
        parallel: bool,
    ) {
        pairs_out.clear();

        self.refresh_intervals(params, bodies, colliders, parallel);

        // Sort by minimum x extent. Insertion sort is used because the list
        // stays nearly sorted between steps.
        insertion_sort(&mut self.intervals, |a, b| a.aabb.mins.x > b.aabb.mins.x);

        self.sweep();
        self.carry_inactive_pairs();
        self.collect_deltas(pairs_out);

        core::mem::swap(&mut self.pairs, &mut self.new_pairs);
        self.new_pairs.clear();
    }

    /// The number of colliders currently tracked.
    pub fn proxy_count(&self) -> usize {
        self.intervals.len()
    }

    /// Drops intervals of removed colliders, refreshes the rest, and appends
    /// intervals for new colliders.
    fn refresh_intervals(
        &mut self,
        params: &IntegrationParameters,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        parallel: bool,
    ) {
        let tracked = &mut self.tracked;
        self.intervals.retain(|interval| {
            let live = colliders.contains(interval.collider);
            if !live {
                tracked.remove(&interval.collider);
            }
            live
        });

        for (handle, _) in colliders.iter() {
            if tracked.insert(handle) {
                self.intervals.push(AabbInterval {
                    collider: handle,
                    body: crate::dynamics::RigidBodyHandle::INVALID,
                    aabb: Aabb::new_invalid(),
                    layers: crate::collision::CollisionLayers::default(),
                    flags: AabbIntervalFlags::empty(),
                });
            }
        }

        let refresh = |interval: &mut AabbInterval| {
            // The collider is known to be live here.
            let Some(collider) = colliders.get(interval.collider) else {
                return;
            };
            let Some(body) = bodies.get(collider.parent()) else {
                return;
            };

            let speed = body.linvel().norm();
            let margin = 0.5 * params.prediction_distance + speed * params.dt;
            let aabb = collider.shape().compute_aabb(collider.position()).loosened(margin);

            if !aabb.mins.coords.iter().all(|x| x.is_finite())
                || !aabb.maxs.coords.iter().all(|x| x.is_finite())
            {
                log::warn!(
                    "collider {:?} has a non-finite AABB; excluding it from the broad phase",
                    interval.collider
                );
                interval.aabb = Aabb::new_invalid();
                return;
            }

            interval.body = collider.parent();
            interval.aabb = aabb;
            interval.layers = collider.collision_layers;
            interval.flags.set(
                AabbIntervalFlags::NON_DYNAMIC,
                body.body_type() != RigidBodyType::Dynamic,
            );
            interval.flags.set(
                AabbIntervalFlags::INACTIVE,
                body.body_type() == RigidBodyType::Static || body.is_sleeping(),
            );
        };

        #[cfg(feature = "parallel")]
        if parallel {
            use rayon::prelude::*;
            self.intervals.par_iter_mut().for_each(refresh);
            return;
        }
        let _ = parallel;
        self.intervals.iter_mut().for_each(refresh);
    }

    /// Finds candidate pairs by scanning overlapping x intervals.
    fn sweep(&mut self) {
        self.new_pairs.clear();
        self.interval_of.clear();
        for (index, interval) in self.intervals.iter().enumerate() {
            self.interval_of.insert(interval.collider, index);
        }

        for (i, interval1) in self.intervals.iter().enumerate() {
            for interval2 in self.intervals.iter().skip(i + 1) {
                // x doesn't intersect; every following interval starts even
                // further right, so stop scanning.
                if interval2.aabb.mins.x > interval1.aabb.maxs.x {
                    break;
                }

                // No pairs between two non-dynamic bodies, two inactive
                // bodies, colliders with incompatible layers, or colliders
                // on the same body.
                let both = interval1.flags.intersection(interval2.flags);
                if both.contains(AabbIntervalFlags::NON_DYNAMIC)
                    || both.contains(AabbIntervalFlags::INACTIVE)
                    || !interval1.layers.interacts_with(interval2.layers)
                    || interval1.body == interval2.body
                {
                    continue;
                }

                // y doesn't intersect.
                if interval1.aabb.mins.y > interval2.aabb.maxs.y
                    || interval1.aabb.maxs.y < interval2.aabb.mins.y
                {
                    continue;
                }

                // z doesn't intersect.
                if interval1.aabb.mins.z > interval2.aabb.maxs.z
                    || interval1.aabb.maxs.z < interval2.aabb.mins.z
                {
                    continue;
                }

                let key = PairKey::new(interval1.collider.index(), interval2.collider.index());
                self.new_pairs
                    .insert(key, (interval1.collider, interval2.collider));
            }
        }
    }

    /// Keeps previously reported pairs alive while both colliders are
    /// inactive but still overlapping, so that a sleeping island's resting
    /// contacts are not retired and spuriously re-reported on wake-up.
    fn carry_inactive_pairs(&mut self) {
        for (key, &(collider1, collider2)) in &self.pairs {
            if self.new_pairs.contains_key(key) {
                continue;
            }
            let (Some(&i1), Some(&i2)) = (
                self.interval_of.get(&collider1),
                self.interval_of.get(&collider2),
            ) else {
                continue;
            };
            let (interval1, interval2) = (&self.intervals[i1], &self.intervals[i2]);
            let both = interval1.flags.intersection(interval2.flags);
            if both.contains(AabbIntervalFlags::INACTIVE)
                && !both.contains(AabbIntervalFlags::NON_DYNAMIC)
                && interval1.aabb.intersects(&interval2.aabb)
            {
                self.new_pairs.insert(*key, (collider1, collider2));
            }
        }
    }

    /// Diffs the new pair set against the previous one.
    ///
    /// Pairs are compared by full handles, not just by pair key: if a
    /// collider slot was reused between steps, the old pair is retired and a
    /// new one reported even though the key is unchanged.
    fn collect_deltas(&self, pairs_out: &mut BroadPhasePairs) {
        for (key, &pair) in &self.new_pairs {
            match self.pairs.get(key) {
                Some(&old) if old == pair => {}
                Some(&old) => {
                    pairs_out.removed.push(old);
                    pairs_out.added.push(pair);
                }
                None => pairs_out.added.push(pair),
            }
        }
        for (key, &pair) in &self.pairs {
            if !self.new_pairs.contains_key(key) {
                pairs_out.removed.push(pair);
            }
        }
    }
}

/// Sorts a list iteratively using comparisons. When a smaller value is
/// encountered, it is moved lower in the list until it is larger than the
/// item before it.
///
/// This is relatively slow for large lists, but very efficient in cases where
/// the list is already mostly sorted.
fn insertion_sort<T>(items: &mut [T], comparison: fn(&T, &T) -> bool) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && comparison(&items[j - 1], &items[j]) {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::insertion_sort;

    #[test]
    fn insertion_sort_sorts() {
        let mut items = [5, 1, 4, 2, 3];
        insertion_sort(&mut items, |a, b| a > b);
        assert_eq!(items, [1, 2, 3, 4, 5]);
    }
}
