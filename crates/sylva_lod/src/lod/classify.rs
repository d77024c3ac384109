//! # Distance Classifier
//!
//! Splits one object type's instances into near, far and transitioning sets
//! and advances their phases.
//!
//! ```text
//!   positions + phases ──► count pass (parallel) ──► masks + totals
//!                                                        │
//!   near / far / transitioning buffers ◄── compact pass ◄┘
//! ```
//!
//! The count pass sizes every output buffer up front, so the compact pass
//! writes into exactly-sized storage and never grows a buffer.
//!
//! | condition | membership | phase after |
//! |---|---|---|
//! | `d² < t`, phase 0/1 | near | 1 |
//! | `d² < t`, phase 2 | transitioning | 4 |
//! | `d² ≥ t`, phase 0 | far | 2 |
//! | `d² ≥ t`, phase 1 | far + transitioning | 3 |
//! | `d² ≥ t`, other | far | 2 |

use glam::{Quat, Vec3};
use rayon::prelude::*;
use rayon::ThreadPool;
use sylva_core::{InstanceStore, OwnedBuffer, Phase};
use tracing::{debug, warn};

/// Distance band of an instance, independent of its phase.
///
/// Exactly one zone holds for every instance after a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Zone {
    /// Closer than the LOD distance.
    #[default]
    Near = 0,
    /// At or beyond the LOD distance.
    Far = 1,
}

/// Set membership of one instance for the current pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Membership {
    /// Drawn as the detailed mesh.
    pub near: bool,
    /// Goes into the next batch generation.
    pub far: bool,
    /// Crossing the boundary this pass.
    pub transitioning: bool,
}

impl Membership {
    /// Classifies one instance.
    ///
    /// # Arguments
    ///
    /// * `distance_sq` - Squared distance to the viewer
    /// * `threshold_sq` - Squared LOD distance
    /// * `phase` - Phase before this pass
    #[inline]
    #[must_use]
    pub fn classify(distance_sq: f32, threshold_sq: f32, phase: Phase) -> Self {
        if distance_sq < threshold_sq {
            Self {
                near: phase.accepts_near(),
                far: false,
                transitioning: phase == Phase::Proxy,
            }
        } else {
            Self {
                near: false,
                far: true,
                transitioning: phase == Phase::Detailed,
            }
        }
    }
}

/// Totals produced by the count pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts {
    /// Instances classified.
    pub total: usize,
    /// Near set size.
    pub near: usize,
    /// Far set size.
    pub far: usize,
    /// Transitioning set size.
    pub transitioning: usize,
    /// Instances inside the LOD distance, whatever their phase.
    pub near_zone: usize,
}

impl ClassCounts {
    #[inline]
    fn single(membership: Membership, zone: Zone) -> Self {
        Self {
            total: 1,
            near: usize::from(membership.near),
            far: usize::from(membership.far),
            transitioning: usize::from(membership.transitioning),
            near_zone: usize::from(zone == Zone::Near),
        }
    }

    #[inline]
    fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            near: self.near + other.near,
            far: self.far + other.far,
            transitioning: self.transitioning + other.transitioning,
            near_zone: self.near_zone + other.near_zone,
        }
    }
}

/// The far set shared with in-flight batch builds.
///
/// Positions already carry the ground offset. `rotations` is filled by the
/// orientation pass after classification.
#[derive(Debug, Default)]
pub struct FarSet {
    positions: OwnedBuffer<Vec3>,
    rotations: OwnedBuffer<Quat>,
    indices: OwnedBuffer<u32>,
}

impl FarSet {
    /// Creates an empty, unallocated far set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: OwnedBuffer::new(),
            rotations: OwnedBuffer::new(),
            indices: OwnedBuffer::new(),
        }
    }

    /// Number of far instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing is far.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Far positions, ground offset applied.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        self.positions.as_slice()
    }

    /// Facing rotation per far position.
    #[inline]
    #[must_use]
    pub fn rotations(&self) -> &[Quat] {
        self.rotations.as_slice()
    }

    /// Instance index per far position.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        self.indices.as_slice()
    }

    /// Positions read-only, rotations mutable.
    #[inline]
    pub fn orientation_view(&mut self) -> (&[Vec3], &mut [Quat]) {
        (self.positions.as_slice(), self.rotations.as_mut_slice())
    }

    fn ensure_capacity(&mut self, len: usize) {
        self.positions.ensure_capacity(len);
        self.rotations.ensure_capacity(len);
        self.indices.ensure_capacity(len);
    }

    /// Releases every buffer. Idempotent.
    pub fn dispose(&mut self) {
        self.positions.dispose();
        self.rotations.dispose();
        self.indices.dispose();
    }
}

/// Two-pass near/far classifier owning the derived per-pass buffers.
#[derive(Debug, Default)]
pub struct Classifier {
    masks: OwnedBuffer<Membership>,
    zones: OwnedBuffer<Zone>,
    near_positions: OwnedBuffer<Vec3>,
    near_indices: OwnedBuffer<u32>,
    transitioning_positions: OwnedBuffer<Vec3>,
    transitioning_indices: OwnedBuffer<u32>,
    counts: ClassCounts,
}

impl Classifier {
    /// Creates a classifier with nothing allocated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs both passes and updates the store's phases.
    ///
    /// # Arguments
    ///
    /// * `pool` - Worker pool for the count pass
    /// * `store` - Instances to classify; phases are advanced in place
    /// * `far` - Receives the far positions and indices
    /// * `viewer` - Viewer position
    /// * `threshold_sq` - Squared LOD distance
    /// * `far_offset` - Added to every far position (ground anchoring)
    pub fn classify(
        &mut self,
        pool: &ThreadPool,
        store: &mut InstanceStore,
        far: &mut FarSet,
        viewer: Vec3,
        threshold_sq: f32,
        far_offset: Vec3,
    ) -> ClassCounts {
        let counts = self.count(pool, store, viewer, threshold_sq);
        self.compact(store, far, far_offset);

        debug!(
            total = counts.total,
            near = counts.near,
            far = counts.far,
            transitioning = counts.transitioning,
            "classified instances"
        );
        counts
    }

    /// Count pass: fills the membership masks and zones, returns totals.
    pub fn count(
        &mut self,
        pool: &ThreadPool,
        store: &InstanceStore,
        viewer: Vec3,
        threshold_sq: f32,
    ) -> ClassCounts {
        let n = store.len();
        self.masks.ensure_capacity(n);
        self.zones.ensure_capacity(n);

        let masks = self.masks.as_mut_slice();
        let zones = self.zones.as_mut_slice();
        let positions = store.positions();
        let phases = store.phases();

        let counts = pool.install(|| {
            masks
                .par_iter_mut()
                .zip(zones.par_iter_mut())
                .zip(positions.par_iter().zip(phases.par_iter()))
                .map(|((mask, zone), (position, phase))| {
                    let distance_sq = position.distance_squared(viewer);
                    *mask = Membership::classify(distance_sq, threshold_sq, *phase);
                    *zone = if distance_sq < threshold_sq {
                        Zone::Near
                    } else {
                        Zone::Far
                    };
                    ClassCounts::single(*mask, *zone)
                })
                .reduce(ClassCounts::default, ClassCounts::merge)
        });

        self.counts = counts;
        counts
    }

    /// Compact pass: writes the three sets and advances phases.
    fn compact(&mut self, store: &mut InstanceStore, far: &mut FarSet, far_offset: Vec3) {
        let counts = self.counts;
        self.near_positions.ensure_capacity(counts.near);
        self.near_indices.ensure_capacity(counts.near);
        self.transitioning_positions.ensure_capacity(counts.transitioning);
        self.transitioning_indices.ensure_capacity(counts.transitioning);
        far.ensure_capacity(counts.far);

        let near_positions = self.near_positions.as_mut_slice();
        let near_indices = self.near_indices.as_mut_slice();
        let transitioning_positions = self.transitioning_positions.as_mut_slice();
        let transitioning_indices = self.transitioning_indices.as_mut_slice();
        let far_positions = far.positions.as_mut_slice();
        let far_indices = far.indices.as_mut_slice();

        let (positions, phases) = store.split_mut();
        let (mut i_near, mut i_far, mut i_transitioning) = (0, 0, 0);
        let mut stray = 0usize;

        for (i, mask) in self.masks.as_slice().iter().enumerate() {
            let index = i as u32;
            let position = positions[i];
            let previous = phases[i];

            if mask.near {
                near_positions[i_near] = position;
                near_indices[i_near] = index;
                i_near += 1;
                phases[i] = Phase::Detailed;
            } else if mask.far {
                far_positions[i_far] = position + far_offset;
                far_indices[i_far] = index;
                i_far += 1;
                phases[i] = match previous {
                    Phase::Detailed => Phase::DetailedToProxy,
                    Phase::Uninitialized | Phase::Proxy => Phase::Proxy,
                    Phase::DetailedToProxy | Phase::ProxyToDetailed => {
                        stray += 1;
                        Phase::Proxy
                    }
                };
            } else if !mask.transitioning {
                // Near zone but neither 0/1 nor 2: left as is
                stray += 1;
            }

            if mask.transitioning {
                transitioning_positions[i_transitioning] = position;
                transitioning_indices[i_transitioning] = index;
                i_transitioning += 1;
                if previous == Phase::Proxy {
                    phases[i] = Phase::ProxyToDetailed;
                }
            }
        }

        if stray > 0 {
            warn!(stray, "instances classified while still mid-transition");
        }
    }

    /// Totals of the last pass.
    #[inline]
    #[must_use]
    pub const fn counts(&self) -> ClassCounts {
        self.counts
    }

    /// Zone of every instance after the last pass.
    #[inline]
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        self.zones.as_slice()
    }

    /// Near positions.
    #[inline]
    #[must_use]
    pub fn near_positions(&self) -> &[Vec3] {
        self.near_positions.as_slice()
    }

    /// Near instance indices.
    #[inline]
    #[must_use]
    pub fn near_indices(&self) -> &[u32] {
        self.near_indices.as_slice()
    }

    /// Transitioning positions (no ground offset).
    #[inline]
    #[must_use]
    pub fn transitioning_positions(&self) -> &[Vec3] {
        self.transitioning_positions.as_slice()
    }

    /// Transitioning instance indices.
    #[inline]
    #[must_use]
    pub fn transitioning_indices(&self) -> &[u32] {
        self.transitioning_indices.as_slice()
    }

    /// Releases every derived buffer. Idempotent.
    pub fn dispose(&mut self) {
        self.masks.dispose();
        self.zones.dispose();
        self.near_positions.dispose();
        self.near_indices.dispose();
        self.transitioning_positions.dispose();
        self.transitioning_indices.dispose();
        self.counts = ClassCounts::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn store_with(positions: &[Vec3], phases: &[Phase]) -> InstanceStore {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.replace(positions);
        store.phases_mut().copy_from_slice(phases);
        store
    }

    #[test]
    fn test_membership_table() {
        let t = 100.0;
        let near = Membership::classify(1.0, t, Phase::Uninitialized);
        assert!(near.near && !near.far && !near.transitioning);

        let leaving = Membership::classify(1.0, t, Phase::Proxy);
        assert!(!leaving.near && !leaving.far && leaving.transitioning);

        let entering = Membership::classify(100.0, t, Phase::Detailed);
        assert!(!entering.near && entering.far && entering.transitioning);

        let far = Membership::classify(400.0, t, Phase::Proxy);
        assert!(far.far && !far.transitioning);
    }

    #[test]
    fn test_phase_updates() {
        let positions = [
            Vec3::new(1.0, 0.0, 0.0),  // near, 0 -> 1
            Vec3::new(50.0, 0.0, 0.0), // far, 0 -> 2
            Vec3::new(50.0, 0.0, 0.0), // far, 1 -> 3
            Vec3::new(2.0, 0.0, 0.0),  // near, 2 -> 4
            Vec3::new(50.0, 0.0, 0.0), // far, 2 -> 2
        ];
        let phases = [
            Phase::Uninitialized,
            Phase::Uninitialized,
            Phase::Detailed,
            Phase::Proxy,
            Phase::Proxy,
        ];
        let mut store = store_with(&positions, &phases);
        let mut far = FarSet::new();
        let mut classifier = Classifier::new();

        let counts =
            classifier.classify(&pool(), &mut store, &mut far, Vec3::ZERO, 100.0, Vec3::ZERO);

        assert_eq!(
            store.phases(),
            &[
                Phase::Detailed,
                Phase::Proxy,
                Phase::DetailedToProxy,
                Phase::ProxyToDetailed,
                Phase::Proxy,
            ]
        );
        assert_eq!(counts.near, 1);
        assert_eq!(counts.far, 3);
        assert_eq!(counts.transitioning, 2);
        assert_eq!(far.indices(), &[1, 2, 4]);
        assert_eq!(classifier.near_indices(), &[0]);
        assert_eq!(classifier.transitioning_indices(), &[2, 3]);
    }

    #[test]
    fn test_far_offset_only_on_far_set() {
        let positions = [Vec3::new(0.0, 0.0, 30.0)];
        let mut store = store_with(&positions, &[Phase::Detailed]);
        let mut far = FarSet::new();
        let mut classifier = Classifier::new();
        let offset = Vec3::new(0.0, -2.0, 0.0);

        classifier.classify(&pool(), &mut store, &mut far, Vec3::ZERO, 25.0, offset);

        assert_eq!(far.positions()[0], Vec3::new(0.0, -2.0, 30.0));
        assert_eq!(classifier.transitioning_positions()[0], Vec3::new(0.0, 0.0, 30.0));
    }

    #[test]
    fn test_zones_partition_instances() {
        let positions: Vec<Vec3> = (0..200).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mut store = store_with(&positions, &vec![Phase::Proxy; 200]);
        let mut far = FarSet::new();
        let mut classifier = Classifier::new();

        let counts =
            classifier.classify(&pool(), &mut store, &mut far, Vec3::ZERO, 50.0 * 50.0, Vec3::ZERO);

        assert_eq!(counts.near_zone + counts.far, counts.total);
        assert_eq!(counts.near_zone, 50);
        assert_eq!(counts.near, 0);
        assert_eq!(counts.transitioning, 50);
        assert!(classifier.zones()[..50].iter().all(|z| *z == Zone::Near));
        assert!(classifier.zones()[50..].iter().all(|z| *z == Zone::Far));
    }

    #[test]
    fn test_empty_store() {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.replace(&[]);
        let mut far = FarSet::new();
        let mut classifier = Classifier::new();

        let counts =
            classifier.classify(&pool(), &mut store, &mut far, Vec3::ZERO, 1.0, Vec3::ZERO);

        assert_eq!(counts, ClassCounts::default());
        assert!(far.is_empty());
        assert!(classifier.near_positions().is_empty());
    }
}
