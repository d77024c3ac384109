//! Group planning and the two build stages.
//!
//! ```text
//!   far set ──► ranges of ≤ C ──► stage (par, per group) ─┐
//!                                                          │ barrier
//!   Vec<BatchGroup> ◄── expand (par, per group) ◄──────────┘
//! ```

use std::ops::Range;

use glam::{Quat, Vec3};
use rayon::prelude::*;

use crate::lod::FarSet;
use crate::mesh::{ProxyQuad, ProxyVertex};

/// Number of groups needed for `far_count` instances, `ceil(F / C)`.
///
/// Zero far instances need zero groups.
#[inline]
#[must_use]
pub fn group_count(far_count: usize, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    far_count.div_ceil(capacity)
}

/// Far-set ranges of each group. All but the last hold exactly `capacity`.
#[must_use]
pub fn group_ranges(far_count: usize, capacity: usize) -> Vec<Range<usize>> {
    (0..group_count(far_count, capacity))
        .map(|g| {
            let start = g * capacity;
            start..(start + capacity).min(far_count)
        })
        .collect()
}

/// Stage 1 output: one group's transforms copied out of the far set.
#[derive(Debug, Clone, Default)]
pub struct StagedGroup {
    /// Far positions of the group.
    pub positions: Vec<Vec3>,
    /// Facing rotations of the group.
    pub rotations: Vec<Quat>,
    /// Instance indices of the group.
    pub members: Vec<u32>,
}

impl StagedGroup {
    /// Copies one range of the far set.
    #[must_use]
    pub fn stage(far: &FarSet, range: Range<usize>) -> Self {
        Self {
            positions: far.positions()[range.clone()].to_vec(),
            rotations: far.rotations()[range.clone()].to_vec(),
            members: far.indices()[range].to_vec(),
        }
    }

    /// Stage 2: writes one quad copy per instance into combined buffers.
    #[must_use]
    pub fn expand(self, quad: &ProxyQuad) -> BatchGroup {
        let n = self.members.len();
        let mut vertices = vec![ProxyVertex::default(); n * ProxyQuad::VERTEX_COUNT];
        let mut indices = vec![0u32; n * ProxyQuad::INDEX_COUNT];

        vertices
            .par_chunks_mut(ProxyQuad::VERTEX_COUNT)
            .zip(indices.par_chunks_mut(ProxyQuad::INDEX_COUNT))
            .zip(self.positions.par_iter().zip(self.rotations.par_iter()))
            .enumerate()
            .for_each(|(slot, ((v, i), (position, rotation)))| {
                quad.write_instance(slot as u32, *position, *rotation, v, i);
            });

        BatchGroup {
            vertices,
            indices,
            members: self.members,
        }
    }
}

/// One finished group: combined buffers plus the instances they hold.
#[derive(Debug, Clone, Default)]
pub struct BatchGroup {
    /// Combined vertices, four per member.
    pub vertices: Vec<ProxyVertex>,
    /// Combined indices, six per member.
    pub indices: Vec<u32>,
    /// Instance index of each member, in slot order.
    pub members: Vec<u32>,
}

impl BatchGroup {
    /// Number of instances in the group.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true for an empty group.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Builds a whole generation on the current rayon pool.
///
/// Stage 1 runs for every group, then stage 2 for every group.
#[must_use]
pub fn build_generation(far: &FarSet, quad: &ProxyQuad, capacity: usize) -> Vec<BatchGroup> {
    let staged: Vec<StagedGroup> = group_ranges(far.len(), capacity)
        .into_par_iter()
        .map(|range| StagedGroup::stage(far, range))
        .collect();

    staged
        .into_par_iter()
        .map(|group| group.expand(quad))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_count() {
        assert_eq!(group_count(0, 15_000), 0);
        assert_eq!(group_count(1, 15_000), 1);
        assert_eq!(group_count(15_000, 15_000), 1);
        assert_eq!(group_count(15_001, 15_000), 2);
        assert_eq!(group_count(20_000, 15_000), 2);
    }

    #[test]
    fn test_group_ranges() {
        let ranges = group_ranges(20_000, 15_000);
        assert_eq!(ranges, vec![0..15_000, 15_000..20_000]);
        assert!(group_ranges(0, 10).is_empty());
    }
}
