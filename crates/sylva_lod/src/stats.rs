//! Per-frame statistics.

/// What one [`tick`](crate::ProxyRenderer::tick) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Detailed meshes drawn.
    pub detailed_draws: u32,
    /// Proxy batches drawn.
    pub proxy_draws: u32,
    /// Groups committed to the host this frame.
    pub published_groups: u32,
    /// A background build finished this frame.
    pub build_completed: bool,
    /// Viewer movement started a new build this frame.
    pub rebuild_started: bool,
    /// Proxy texture snapshots requested this frame.
    pub captures: u32,
    /// Near set size.
    pub near: usize,
    /// Far set size.
    pub far: usize,
    /// Transitioning set size.
    pub transitioning: usize,
}

impl FrameStats {
    /// Total draw requests issued.
    #[must_use]
    pub const fn draw_calls(&self) -> u32 {
        self.detailed_draws + self.proxy_draws
    }

    /// Accumulates another frame into this one.
    pub fn accumulate(&mut self, other: &Self) {
        self.detailed_draws += other.detailed_draws;
        self.proxy_draws += other.proxy_draws;
        self.published_groups += other.published_groups;
        self.build_completed |= other.build_completed;
        self.rebuild_started |= other.rebuild_started;
        self.captures += other.captures;
        self.near += other.near;
        self.far += other.far;
        self.transitioning += other.transitioning;
    }
}
