//! # Batch Scheduler
//!
//! Drives generation builds across frames and hands finished groups to the
//! host one per frame.
//!
//! ```text
//!          start()             build done
//!   Idle ──────────► Building ───────────► Publishing ──┐ one group
//!    ▲                                        │  ▲       │ per step
//!    │               last group committed     │  └───────┘
//!    └────────────────────────────────────────┘
//! ```
//!
//! When a build completes the scheduler decides between two modes:
//!
//! - **recreate**: the group count changed. Every committed host batch is
//!   released at once and new batches are uploaded one per step. Instances
//!   still waiting in phase 4 fall back to the detailed mesh immediately.
//! - **reuse**: the group count is unchanged. Each step rewrites one
//!   existing batch in place, first returning the phase-4 members of that
//!   batch's previous contents to the detailed mesh.
//!
//! Either way, committing a group marks all of its members phase 2.

use std::collections::VecDeque;

use sylva_core::Phase;
use tracing::{debug, trace, warn};

use super::build::BuildHandle;
use super::group::BatchGroup;
use crate::error::{LodError, LodResult};
use crate::host::{BatchId, RenderHost};

/// Outcome of one [`BatchScheduler::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// The in-flight build finished during this step.
    pub build_completed: bool,
    /// Index of the group committed during this step.
    pub published_group: Option<usize>,
    /// The generation finished publishing during this step.
    pub generation_finished: bool,
}

#[derive(Debug)]
struct Publishing {
    groups: VecDeque<BatchGroup>,
    next: usize,
    recreate: bool,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Building(BuildHandle),
    Publishing(Publishing),
}

/// Incremental build/publish state machine for one renderer.
#[derive(Debug, Default)]
pub struct BatchScheduler {
    state: State,
    /// Host batches of the committed generation, in group order.
    committed: Vec<BatchId>,
    /// Member lists of the last fully published generation.
    committed_members: Vec<Vec<u32>>,
    /// Member lists of groups committed from the generation being published.
    pending_members: Vec<Vec<u32>>,
    /// Completed generations.
    generation: u64,
}

impl BatchScheduler {
    /// Creates an idle scheduler with nothing committed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no build is running or publishing.
    #[inline]
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// Returns true while a build job is in flight.
    #[inline]
    #[must_use]
    pub const fn is_building(&self) -> bool {
        matches!(self.state, State::Building(_))
    }

    /// Returns true while finished groups are being committed.
    #[inline]
    #[must_use]
    pub const fn is_publishing(&self) -> bool {
        matches!(self.state, State::Publishing(_))
    }

    /// Host batches that are drawn this frame.
    #[inline]
    #[must_use]
    pub fn committed(&self) -> &[BatchId] {
        &self.committed
    }

    /// Member lists of the last fully published generation.
    #[inline]
    #[must_use]
    pub fn committed_members(&self) -> &[Vec<u32>] {
        &self.committed_members
    }

    /// Number of generations fully published so far.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Takes ownership of a freshly spawned build.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildInFlight`] unless the scheduler is idle. The handle
    /// is dropped; its job still runs to completion on the pool.
    pub fn start(&mut self, handle: BuildHandle) -> LodResult<()> {
        if !self.is_idle() {
            return Err(LodError::BuildInFlight);
        }
        self.state = State::Building(handle);
        Ok(())
    }

    /// Advances by one step without blocking.
    ///
    /// While building, polls the job. When it has finished, publishing
    /// starts in the same step. While publishing, commits one group.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if the job died. The scheduler returns to
    /// idle and the committed generation stays as it was.
    pub fn step<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        phases: &mut [Phase],
    ) -> LodResult<StepOutcome> {
        let mut outcome = StepOutcome::default();

        let polled = match &self.state {
            State::Building(handle) => Some((handle.poll(), handle.group_count())),
            _ => None,
        };
        match polled {
            Some((Ok(Some(groups)), planned)) => {
                debug_assert_eq!(groups.len(), planned);
                outcome.build_completed = true;
                self.begin_publishing(groups, host, phases);
            }
            Some((Ok(None), _)) => return Ok(outcome),
            Some((Err(err), _)) => {
                self.state = State::Idle;
                return Err(err);
            }
            None => {}
        }

        if self.is_publishing() {
            outcome.published_group = self.publish_next(host, phases);
            outcome.generation_finished = self.is_idle();
        }
        Ok(outcome)
    }

    /// Finishes the in-flight build and commits every remaining group now.
    ///
    /// Returns the number of groups committed.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if the job died.
    pub fn force_complete<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        phases: &mut [Phase],
    ) -> LodResult<usize> {
        if self.is_building() {
            if let State::Building(handle) = std::mem::take(&mut self.state) {
                let groups = handle.wait()?;
                self.begin_publishing(groups, host, phases);
            }
        }

        let mut published = 0;
        while self.is_publishing() {
            if self.publish_next(host, phases).is_some() {
                published += 1;
            }
        }
        Ok(published)
    }

    /// Releases every committed host batch and forgets all member lists.
    ///
    /// Any in-flight build is dropped; its job finishes on its own. Call
    /// [`force_complete`](Self::force_complete) first to keep its result.
    /// Idempotent.
    pub fn release<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        if !self.is_idle() {
            warn!("releasing batches with a build still pending");
        }
        self.state = State::Idle;
        for batch in self.committed.drain(..) {
            host.release_proxy_batch(batch);
        }
        self.committed_members.clear();
        self.pending_members.clear();
    }

    fn begin_publishing<H: RenderHost + ?Sized>(
        &mut self,
        groups: Vec<BatchGroup>,
        host: &mut H,
        phases: &mut [Phase],
    ) {
        let recreate = groups.len() != self.committed.len();
        if recreate {
            for batch in self.committed.drain(..) {
                host.release_proxy_batch(batch);
            }
            for members in &self.committed_members {
                settle_stale(phases, members);
            }
        }

        debug!(groups = groups.len(), recreate, "batch build complete");
        self.pending_members.clear();
        self.state = State::Publishing(Publishing {
            groups: groups.into(),
            next: 0,
            recreate,
        });
    }

    /// Commits the next group, or finishes if none is left.
    fn publish_next<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        phases: &mut [Phase],
    ) -> Option<usize> {
        let State::Publishing(publishing) = &mut self.state else {
            return None;
        };

        let Some(group) = publishing.groups.pop_front() else {
            self.finish(phases);
            return None;
        };
        let index = publishing.next;
        publishing.next += 1;
        let recreate = publishing.recreate;
        let remaining = publishing.groups.len();

        let BatchGroup {
            vertices,
            indices,
            members,
        } = group;

        match self.committed.get(index).copied() {
            Some(batch) if !recreate => {
                if let Some(stale) = self.committed_members.get(index) {
                    settle_stale(phases, stale);
                }
                host.rewrite_proxy_batch(batch, &vertices, &indices);
            }
            _ => {
                let batch = host.upload_proxy_batch(&vertices, &indices);
                self.committed.push(batch);
            }
        }

        for &member in &members {
            if let Some(phase) = phases.get_mut(member as usize) {
                *phase = Phase::Proxy;
            }
        }
        trace!(group = index, members = members.len(), recreate, "group committed");
        self.pending_members.push(members);

        if remaining == 0 {
            self.finish(phases);
        }
        Some(index)
    }

    fn finish(&mut self, phases: &mut [Phase]) {
        for members in &self.committed_members {
            settle_stale(phases, members);
        }
        self.committed_members = std::mem::take(&mut self.pending_members);
        self.generation += 1;
        self.state = State::Idle;
        debug!(
            generation = self.generation,
            groups = self.committed.len(),
            "generation published"
        );
    }
}

/// Returns members still parked in phase 4 to the detailed mesh.
fn settle_stale(phases: &mut [Phase], members: &[u32]) {
    for &member in members {
        if let Some(phase) = phases.get_mut(member as usize) {
            if *phase == Phase::ProxyToDetailed {
                *phase = Phase::Detailed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostCall, RecordingHost};
    use crate::mesh::ProxyVertex;

    fn group(members: &[u32]) -> BatchGroup {
        BatchGroup {
            vertices: vec![ProxyVertex::default(); members.len() * 4],
            indices: vec![0; members.len() * 6],
            members: members.to_vec(),
        }
    }

    #[test]
    fn test_one_group_per_step() {
        let mut scheduler = BatchScheduler::new();
        let mut host = RecordingHost::new();
        let mut phases = vec![Phase::Uninitialized; 4];

        scheduler.begin_publishing(vec![group(&[0, 1]), group(&[2, 3])], &mut host, &mut phases);

        let first = scheduler.step(&mut host, &mut phases).unwrap();
        assert_eq!(first.published_group, Some(0));
        assert!(!first.generation_finished);
        assert_eq!(&phases[..2], &[Phase::Proxy, Phase::Proxy]);
        assert_eq!(phases[2], Phase::Uninitialized);

        let second = scheduler.step(&mut host, &mut phases).unwrap();
        assert_eq!(second.published_group, Some(1));
        assert!(second.generation_finished);
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.committed().len(), 2);
        assert_eq!(scheduler.generation(), 1);
    }

    #[test]
    fn test_reuse_rewrites_and_settles_stale() {
        let mut scheduler = BatchScheduler::new();
        let mut host = RecordingHost::new();
        let mut phases = vec![Phase::Uninitialized; 3];

        scheduler.begin_publishing(vec![group(&[0, 1])], &mut host, &mut phases);
        scheduler.step(&mut host, &mut phases).unwrap();
        let batch = scheduler.committed()[0];

        // Instance 0 walked into range and is waiting on its old batch
        phases[0] = Phase::ProxyToDetailed;
        host.clear_calls();

        scheduler.begin_publishing(vec![group(&[1, 2])], &mut host, &mut phases);
        scheduler.step(&mut host, &mut phases).unwrap();

        assert_eq!(phases, vec![Phase::Detailed, Phase::Proxy, Phase::Proxy]);
        assert_eq!(scheduler.committed(), &[batch]);
        assert!(matches!(host.calls()[0], HostCall::Rewrite { .. }));
    }

    #[test]
    fn test_recreate_releases_old_batches() {
        let mut scheduler = BatchScheduler::new();
        let mut host = RecordingHost::new();
        let mut phases = vec![Phase::Uninitialized; 3];

        scheduler.begin_publishing(vec![group(&[0]), group(&[1, 2])], &mut host, &mut phases);
        scheduler.force_complete(&mut host, &mut phases).unwrap();
        assert_eq!(host.live_batches(), 2);

        phases[1] = Phase::ProxyToDetailed;
        scheduler.begin_publishing(vec![group(&[0, 2])], &mut host, &mut phases);

        // Old batches gone and stale member settled before any upload
        assert_eq!(host.live_batches(), 0);
        assert_eq!(phases[1], Phase::Detailed);
        assert!(scheduler.committed().is_empty());

        scheduler.step(&mut host, &mut phases).unwrap();
        assert_eq!(host.live_batches(), 1);
        assert_eq!(scheduler.committed_members(), &[vec![0, 2]]);
    }

    #[test]
    fn test_empty_generation_finishes_immediately() {
        let mut scheduler = BatchScheduler::new();
        let mut host = RecordingHost::new();
        let mut phases: Vec<Phase> = Vec::new();

        scheduler.begin_publishing(Vec::new(), &mut host, &mut phases);
        let outcome = scheduler.step(&mut host, &mut phases).unwrap();

        assert_eq!(outcome.published_group, None);
        assert!(outcome.generation_finished);
        assert!(scheduler.is_idle());
        assert_eq!(host.batch_writes(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut scheduler = BatchScheduler::new();
        let mut host = RecordingHost::new();
        let mut phases = vec![Phase::Uninitialized; 1];

        scheduler.release(&mut host);
        scheduler.begin_publishing(vec![group(&[0])], &mut host, &mut phases);
        scheduler.force_complete(&mut host, &mut phases).unwrap();

        scheduler.release(&mut host);
        scheduler.release(&mut host);
        assert_eq!(host.live_batches(), 0);
        assert!(scheduler.committed().is_empty());
    }
}
