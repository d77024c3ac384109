//! # Representation Phase
//!
//! Per-instance tag recording which representation is currently valid.
//!
//! ```text
//!                 near                      far
//!   Uninitialized ────► Detailed   Uninitialized ────► Proxy
//!
//!        far                      batch committed
//!   Detailed ────► DetailedToProxy ──────────────────► Proxy
//!
//!        near                     slot reclaimed
//!   Proxy ────► ProxyToDetailed ───────────────────► Detailed
//! ```

/// Representation phase of one instance.
///
/// Stored as one byte per instance. The numeric values are stable and match
/// the order of the table below.
///
/// | value | phase |
/// |---|---|
/// | 0 | [`Phase::Uninitialized`] |
/// | 1 | [`Phase::Detailed`] |
/// | 2 | [`Phase::Proxy`] |
/// | 3 | [`Phase::DetailedToProxy`] |
/// | 4 | [`Phase::ProxyToDetailed`] |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    /// No prior representation.
    #[default]
    Uninitialized = 0,
    /// Drawn as the full detailed mesh.
    Detailed = 1,
    /// Drawn as a flat proxy inside a committed batch.
    Proxy = 2,
    /// Was detailed, now far. Still drawn detailed until its batch commits.
    DetailedToProxy = 3,
    /// Was a committed proxy, now near. Still drawn by its old batch.
    ProxyToDetailed = 4,
}

impl Phase {
    /// Raw tag value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Phases that may be classified as plain near (`0` or `1`).
    #[inline]
    #[must_use]
    pub const fn accepts_near(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Detailed)
    }

    /// True if an instance in this phase is drawn as the detailed mesh while
    /// it sits in the transitioning set.
    #[inline]
    #[must_use]
    pub const fn draws_detailed_while_transitioning(self) -> bool {
        matches!(self, Self::Detailed | Self::DetailedToProxy)
    }

    /// Checks whether `self -> next` is a legal single-step transition.
    ///
    /// Staying in the same phase is always legal. The two forbidden jumps are
    /// `Detailed -> Proxy` and `Proxy -> Detailed`; both must pass through a
    /// transition phase. Any phase may be reset to `Uninitialized` when the
    /// instance set is replaced.
    #[must_use]
    pub const fn is_legal_transition(self, next: Self) -> bool {
        use Phase::{Detailed, DetailedToProxy, Proxy, ProxyToDetailed, Uninitialized};

        match (self, next) {
            (Detailed, Proxy) | (Proxy, Detailed) => false,
            (_, Uninitialized) => true,
            (a, b) if a as u8 == b as u8 => true,
            (Uninitialized, Detailed | Proxy)
            | (Detailed, DetailedToProxy)
            | (DetailedToProxy, Proxy)
            | (Proxy, ProxyToDetailed)
            | (ProxyToDetailed, Detailed) => true,
            _ => false,
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase.as_u8()
    }
}
