//! Background batch builds.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use rayon::ThreadPool;
use tracing::debug;

use super::group::{build_generation, group_count, BatchGroup};
use crate::error::{LodError, LodResult};
use crate::lod::FarSet;
use crate::mesh::ProxyQuad;

/// Handle to one in-flight generation build.
///
/// The job runs on the worker pool and delivers its groups over a
/// single-slot channel. [`poll`](Self::poll) never blocks;
/// [`wait`](Self::wait) blocks until the job finishes.
#[derive(Debug)]
pub struct BuildHandle {
    receiver: Receiver<Vec<BatchGroup>>,
    group_count: usize,
}

impl BuildHandle {
    /// Spawns a build of `far` on `pool`.
    ///
    /// The job releases its reference to `far` before delivering, so once
    /// the result is received the caller again holds the only reference.
    #[must_use]
    pub fn spawn(pool: &ThreadPool, far: Arc<FarSet>, quad: ProxyQuad, capacity: usize) -> Self {
        let (sender, receiver) = bounded(1);
        let far_count = far.len();
        let group_count = group_count(far_count, capacity);

        pool.spawn(move || {
            let groups = build_generation(&far, &quad, capacity);
            drop(far);
            // Receiver gone means the owner was torn down; nothing to do.
            let _ = sender.send(groups);
        });

        debug!(far_count, group_count, "batch build spawned");
        Self {
            receiver,
            group_count,
        }
    }

    /// Groups this build will produce.
    #[inline]
    #[must_use]
    pub const fn group_count(&self) -> usize {
        self.group_count
    }

    /// Returns the generation if the job has finished.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if the job died without a result.
    pub fn poll(&self) -> LodResult<Option<Vec<BatchGroup>>> {
        match self.receiver.try_recv() {
            Ok(groups) => Ok(Some(groups)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(LodError::BuildAborted),
        }
    }

    /// Blocks until the job finishes.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if the job died without a result.
    pub fn wait(self) -> LodResult<Vec<BatchGroup>> {
        self.receiver.recv().map_err(|_| LodError::BuildAborted)
    }
}
