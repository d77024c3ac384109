//! # Position Inbox
//!
//! Other threads (terrain streaming, spawners) hand replacement position
//! sets to the render thread through this channel. The registry drains it
//! once per frame; only the newest set per type is applied.
//!
//! ```text
//! ┌─────────────┐   submit()   ┌─────────────┐  drain_latest()  ┌──────────┐
//! │  Spawner N  │─────────────>│   Inbox     │─────────────────>│ Registry │
//! └─────────────┘              └─────────────┘                  └──────────┘
//! ```

use std::collections::BTreeMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec3;

use crate::registry::ProxyTypeId;

/// A full replacement position set for one type.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    /// Target type.
    pub type_id: ProxyTypeId,
    /// New world positions, mesh offset not applied.
    pub positions: Vec<Vec3>,
}

/// Cloneable sending half of a [`PositionInbox`].
#[derive(Debug, Clone)]
pub struct PositionSender {
    sender: Sender<PositionUpdate>,
}

impl PositionSender {
    /// Queues a replacement set.
    ///
    /// Returns false if the inbox has been dropped.
    pub fn submit(&self, type_id: ProxyTypeId, positions: Vec<Vec3>) -> bool {
        self.sender
            .send(PositionUpdate {
                type_id,
                positions,
            })
            .is_ok()
    }
}

/// Receiving end, owned by the registry.
#[derive(Debug)]
pub struct PositionInbox {
    sender: Sender<PositionUpdate>,
    receiver: Receiver<PositionUpdate>,
}

impl PositionInbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Returns a new sender for this inbox.
    #[must_use]
    pub fn sender(&self) -> PositionSender {
        PositionSender {
            sender: self.sender.clone(),
        }
    }

    /// Number of queued updates.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Takes every queued update, keeping the newest per type.
    pub fn drain_latest(&self) -> BTreeMap<ProxyTypeId, Vec<Vec3>> {
        self.receiver
            .try_iter()
            .map(|update| (update.type_id, update.positions))
            .collect()
    }
}

impl Default for PositionInbox {
    fn default() -> Self {
        Self::new()
    }
}
