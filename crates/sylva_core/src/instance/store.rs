//! # Instance Store
//!
//! Positions and phases for every instance of one object type.
//!
//! Instances are identified by their index `0..n`. The set is only ever
//! replaced wholesale: [`InstanceStore::replace`] releases the old buffers,
//! installs the new positions shifted by the per-type mesh offset, and
//! resets every phase to [`Phase::Uninitialized`].

use glam::Vec3;
use tracing::debug;

use super::phase::Phase;
use crate::memory::OwnedBuffer;

/// Exclusive owner of one object type's position and phase buffers.
#[derive(Debug, Default)]
pub struct InstanceStore {
    /// World positions, mesh offset already applied.
    positions: OwnedBuffer<Vec3>,
    /// One phase tag per position.
    phases: OwnedBuffer<Phase>,
    /// Offset added to every supplied position (recentred mesh pivot).
    mesh_offset: Vec3,
}

impl InstanceStore {
    /// Creates an empty store with no buffers allocated.
    #[must_use]
    pub fn new(mesh_offset: Vec3) -> Self {
        Self {
            positions: OwnedBuffer::new(),
            phases: OwnedBuffer::new(),
            mesh_offset,
        }
    }

    /// Offset applied to positions on install.
    #[inline]
    #[must_use]
    pub const fn mesh_offset(&self) -> Vec3 {
        self.mesh_offset
    }

    /// Replaces the whole instance set.
    ///
    /// # Arguments
    ///
    /// * `positions` - Raw instance positions (offset not yet applied)
    pub fn replace(&mut self, positions: &[Vec3]) {
        self.dispose();

        let offset = self.mesh_offset;
        let shifted: Vec<Vec3> = positions.iter().map(|p| *p + offset).collect();
        self.positions = OwnedBuffer::from_vec(shifted);
        self.phases.ensure_capacity(positions.len());

        debug!(count = positions.len(), "instance set replaced");
    }

    /// Number of instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if there are no instances.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns true once positions have been installed.
    #[inline]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.positions.is_allocated()
    }

    /// Installed positions.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        self.positions.as_slice()
    }

    /// Per-instance phases.
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        self.phases.as_slice()
    }

    /// Mutable per-instance phases.
    #[inline]
    pub fn phases_mut(&mut self) -> &mut [Phase] {
        self.phases.as_mut_slice()
    }

    /// Split borrow: positions read-only, phases mutable.
    #[inline]
    pub fn split_mut(&mut self) -> (&[Vec3], &mut [Phase]) {
        (self.positions.as_slice(), self.phases.as_mut_slice())
    }

    /// Sets every phase back to [`Phase::Uninitialized`].
    pub fn reset_phases(&mut self) {
        self.phases.reset();
    }

    /// Releases both buffers. Idempotent.
    pub fn dispose(&mut self) {
        self.positions.dispose();
        self.phases.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_applies_offset_and_resets_phases() {
        let mut store = InstanceStore::new(Vec3::new(0.0, 2.0, 0.0));
        store.replace(&[Vec3::ZERO, Vec3::X]);
        store.phases_mut()[1] = Phase::Proxy;

        assert_eq!(store.positions()[0], Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(store.positions()[1], Vec3::new(1.0, 2.0, 0.0));

        store.replace(&[Vec3::Y, Vec3::Z, Vec3::X]);
        assert_eq!(store.len(), 3);
        assert!(store.phases().iter().all(|p| *p == Phase::Uninitialized));
    }

    #[test]
    fn test_empty_set_is_valid() {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.replace(&[]);

        assert!(store.is_allocated());
        assert!(store.is_empty());
        assert!(store.phases().is_empty());
    }

    #[test]
    fn test_dispose_twice() {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.dispose();

        store.replace(&[Vec3::ONE]);
        store.dispose();
        store.dispose();

        assert!(!store.is_allocated());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_reset_phases() {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.replace(&[Vec3::ONE, Vec3::ONE]);
        store.phases_mut().fill(Phase::Detailed);

        store.reset_phases();
        assert!(store.phases().iter().all(|p| *p == Phase::Uninitialized));
    }
}
