//! # Proxy Renderer
//!
//! One object type's complete LOD engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ProxyRenderer                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  InstanceStore ─► Classifier ─► orient_far ─► BuildHandle    │
//! │       ▲              │ near/transitioning        │ (pool)    │
//! │       │ phases       ▼                           ▼           │
//! │       └──────── BatchScheduler ◄──────── Vec<BatchGroup>     │
//! │                      │ one group per tick                    │
//! │                      ▼                                       │
//! │                  RenderHost                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frame Order
//!
//! 1. Scheduler step (poll the build or commit one group)
//! 2. Viewer movement check, possibly starting a rebuild (skipped on the
//!    frame a generation finishes publishing)
//! 3. Camera/light rotation check, possibly capturing a texture
//! 4. Draws: committed batches, near instances, transitioning instances
//!    still shown detailed

use std::sync::Arc;

use glam::Vec3;
use rayon::ThreadPool;
use sylva_core::{InstanceStore, Phase};
use tracing::{debug, info, warn};

use crate::batch::{BatchScheduler, BuildHandle};
use crate::capture::{capture_request, CaptureTrigger};
use crate::config::ProxyTypeConfig;
use crate::error::{LodError, LodResult};
use crate::host::{RenderHost, ShadowFlags, TextureId};
use crate::lod::{orient_far, ClassCounts, Classifier, FarSet};
use crate::mesh::{DetailMesh, MaterialId, ModelBounds, ProxyQuad};
use crate::stats::FrameStats;
use crate::viewer::SceneView;

/// LOD engine for every instance of one object type.
///
/// The renderer exclusively owns its instance, phase and derived buffers.
/// The host is borrowed per call, so one host can serve many renderers.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use glam::Vec3;
/// use sylva_lod::{
///     DetailMesh, MaterialId, ProxyRenderer, ProxyTypeConfig, RecordingHost, SceneView, Viewer,
/// };
///
/// let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap());
/// let mesh = DetailMesh::new(vec![Vec3::NEG_ONE, Vec3::ONE], vec![0, 1, 0]);
/// let mut renderer =
///     ProxyRenderer::new(ProxyTypeConfig::default(), mesh, vec![MaterialId(0)], pool).unwrap();
///
/// let mut host = RecordingHost::new();
/// let view = SceneView::new(Viewer::default());
/// renderer.initialize(&[Vec3::new(0.0, 0.0, 50.0)], &view, &mut host).unwrap();
///
/// let stats = renderer.tick(&view, &mut host).unwrap();
/// assert_eq!(stats.proxy_draws, 1);
///
/// renderer.dispose(&mut host);
/// ```
#[derive(Debug)]
pub struct ProxyRenderer {
    config: ProxyTypeConfig,
    /// Recentred detailed mesh.
    mesh: DetailMesh,
    materials: Vec<MaterialId>,
    bounds: ModelBounds,
    quad: ProxyQuad,
    pool: Arc<ThreadPool>,
    store: InstanceStore,
    classifier: Classifier,
    /// Shared with the in-flight build, if any.
    far: Arc<FarSet>,
    scheduler: BatchScheduler,
    capture: CaptureTrigger,
    texture: Option<TextureId>,
    /// Viewer position of the last rebuild.
    last_rebuild_position: Vec3,
    initialized: bool,
}

impl ProxyRenderer {
    /// Creates a renderer for one object type.
    ///
    /// The mesh is recentred on its bounding box; the removed offset is added
    /// to every instance position on install.
    ///
    /// # Errors
    ///
    /// - [`LodError::InvalidConfig`] if `config` fails validation
    /// - [`LodError::MissingMesh`] if `mesh` has no vertices
    /// - [`LodError::MissingMaterials`] if `materials` is empty
    /// - [`LodError::DegenerateMesh`] if the mesh has no extent
    pub fn new(
        config: ProxyTypeConfig,
        mesh: DetailMesh,
        materials: Vec<MaterialId>,
        pool: Arc<ThreadPool>,
    ) -> LodResult<Self> {
        config.validate()?;
        if mesh.is_empty() {
            return Err(LodError::MissingMesh);
        }
        if materials.is_empty() {
            return Err(LodError::MissingMaterials);
        }

        let (mesh, mesh_offset) = mesh.recentred();
        let bounds = ModelBounds::from_vertices(&mesh.vertices)?;
        let quad = ProxyQuad::new(&bounds, config.ground_anchored);
        let capture = CaptureTrigger::from_config(&config);

        debug!(
            max_size = bounds.max_size,
            offset_y = mesh_offset.y,
            "proxy model prepared"
        );

        Ok(Self {
            config,
            mesh,
            materials,
            bounds,
            quad,
            pool,
            store: InstanceStore::new(mesh_offset),
            classifier: Classifier::new(),
            far: Arc::new(FarSet::new()),
            scheduler: BatchScheduler::new(),
            capture,
            texture: None,
            last_rebuild_position: Vec3::ZERO,
            initialized: false,
        })
    }

    /// Installs the first instance set and brings every buffer up to date.
    ///
    /// The first build is forced to completion so the first frame draws a
    /// consistent state, and two snapshots are captured back to back.
    /// Calling it again starts over with the new positions.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if a build worker died.
    pub fn initialize<H: RenderHost + ?Sized>(
        &mut self,
        positions: &[Vec3],
        view: &SceneView,
        host: &mut H,
    ) -> LodResult<()> {
        self.install(positions, host)?;
        self.rebuild(view.viewer.position)?;
        self.scheduler.force_complete(host, self.store.phases_mut())?;

        self.capture.reset(view);
        self.capture_texture(view, host);
        self.capture_texture(view, host);
        self.initialized = true;

        info!(
            instances = self.store.len(),
            groups = self.scheduler.committed().len(),
            "proxy renderer initialized"
        );
        Ok(())
    }

    /// Replaces the whole instance set.
    ///
    /// Any in-flight build is finished first and every batch of the old
    /// generation is released. Phases restart at uninitialized and a new
    /// build starts immediately; it is published over the following ticks.
    /// Before [`initialize`](Self::initialize) this behaves like it.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if a build worker died.
    pub fn replace_positions<H: RenderHost + ?Sized>(
        &mut self,
        positions: &[Vec3],
        view: &SceneView,
        host: &mut H,
    ) -> LodResult<()> {
        if !self.initialized {
            return self.initialize(positions, view, host);
        }

        self.install(positions, host)?;
        self.rebuild(view.viewer.position)?;
        self.capture_texture(view, host);

        info!(instances = self.store.len(), "instance set replaced");
        Ok(())
    }

    /// Advances one frame and issues this frame's draws.
    ///
    /// Does nothing before [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if a build worker died. The previously
    /// committed batches stay valid.
    pub fn tick<H: RenderHost + ?Sized>(
        &mut self,
        view: &SceneView,
        host: &mut H,
    ) -> LodResult<FrameStats> {
        let mut stats = FrameStats::default();
        if !self.initialized {
            return Ok(stats);
        }

        let outcome = self.scheduler.step(host, self.store.phases_mut())?;
        stats.build_completed = outcome.build_completed;
        stats.published_groups = u32::from(outcome.published_group.is_some());

        // Phases moved by a finished generation settle for one frame first.
        let position = view.viewer.position;
        if position.distance_squared(self.last_rebuild_position) > self.config.camera_move_epsilon
            && self.scheduler.is_idle()
            && !outcome.generation_finished
        {
            self.rebuild(position)?;
            stats.rebuild_started = true;
        }

        if self.capture.check(view) {
            self.capture_texture(view, host);
            stats.captures = 1;
        }

        self.draw(host, &mut stats);

        let counts = self.classifier.counts();
        stats.near = counts.near;
        stats.far = counts.far;
        stats.transitioning = counts.transitioning;
        Ok(stats)
    }

    /// Finishes any in-flight build and commits every remaining group now.
    ///
    /// Returns the number of groups committed.
    ///
    /// # Errors
    ///
    /// [`LodError::BuildAborted`] if a build worker died.
    pub fn force_complete<H: RenderHost + ?Sized>(&mut self, host: &mut H) -> LodResult<usize> {
        self.scheduler.force_complete(host, self.store.phases_mut())
    }

    /// Releases every buffer, host batch and texture.
    ///
    /// Safe to call repeatedly and on a renderer that was never initialized.
    pub fn dispose<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        if let Err(err) = self.scheduler.force_complete(host, self.store.phases_mut()) {
            warn!(%err, "pending build lost during dispose");
        }
        self.scheduler.release(host);
        if let Some(texture) = self.texture.take() {
            host.release_texture(texture);
        }

        self.classifier.dispose();
        match Arc::get_mut(&mut self.far) {
            Some(far) => far.dispose(),
            None => self.far = Arc::new(FarSet::new()),
        }
        self.store.dispose();

        if self.initialized {
            info!("proxy renderer disposed");
        }
        self.initialized = false;
    }

    /// Finishes pending work, releases the old generation and installs
    /// `positions` with fresh phases.
    fn install<H: RenderHost + ?Sized>(
        &mut self,
        positions: &[Vec3],
        host: &mut H,
    ) -> LodResult<()> {
        self.scheduler.force_complete(host, self.store.phases_mut())?;
        self.scheduler.release(host);
        self.store.replace(positions);
        Ok(())
    }

    /// Classifies, orients and starts a background build.
    fn rebuild(&mut self, viewer: Vec3) -> LodResult<ClassCounts> {
        if !self.scheduler.is_idle() {
            return Err(LodError::BuildInFlight);
        }
        let far = Arc::get_mut(&mut self.far).ok_or(LodError::BuildInFlight)?;

        let far_offset = if self.config.ground_anchored {
            self.bounds.ground_offset()
        } else {
            Vec3::ZERO
        };
        let counts = self.classifier.classify(
            &self.pool,
            &mut self.store,
            far,
            viewer,
            self.config.lod_distance_sq(),
            far_offset,
        );
        let (positions, rotations) = far.orientation_view();
        orient_far(&self.pool, positions, rotations, viewer);

        let handle = BuildHandle::spawn(
            &self.pool,
            Arc::clone(&self.far),
            self.quad,
            self.config.group_capacity,
        );
        self.scheduler.start(handle)?;
        self.last_rebuild_position = viewer;
        Ok(counts)
    }

    fn capture_texture<H: RenderHost + ?Sized>(&mut self, view: &SceneView, host: &mut H) {
        let request = capture_request(
            &self.mesh,
            &self.materials,
            &self.bounds,
            view,
            self.config.texture_resolution,
        );
        let texture = host.capture_snapshot(&request);
        if let Some(previous) = self.texture.replace(texture) {
            host.release_texture(previous);
        }
    }

    fn draw<H: RenderHost + ?Sized>(&self, host: &mut H, stats: &mut FrameStats) {
        let proxy_shadows = ShadowFlags {
            cast: self.config.cast_shadows,
            receive: false,
        };
        for &batch in self.scheduler.committed() {
            host.draw_proxy_batch(batch, self.texture, proxy_shadows);
            stats.proxy_draws += 1;
        }

        let detailed_shadows = ShadowFlags {
            cast: self.config.cast_shadows,
            receive: self.config.receive_shadows,
        };
        for position in self.classifier.near_positions() {
            host.draw_detailed(&self.mesh, &self.materials, *position, detailed_shadows);
            stats.detailed_draws += 1;
        }

        let phases = self.store.phases();
        let transitioning = self
            .classifier
            .transitioning_positions()
            .iter()
            .zip(self.classifier.transitioning_indices());
        for (position, &index) in transitioning {
            let shown_detailed = phases
                .get(index as usize)
                .is_some_and(|phase| phase.draws_detailed_while_transitioning());
            if shown_detailed {
                host.draw_detailed(&self.mesh, &self.materials, *position, detailed_shadows);
                stats.detailed_draws += 1;
            }
        }
    }

    /// Per-type configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ProxyTypeConfig {
        &self.config
    }

    /// Recentred detailed mesh.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> &DetailMesh {
        &self.mesh
    }

    /// Materials the detailed mesh is drawn with.
    #[inline]
    #[must_use]
    pub fn materials(&self) -> &[MaterialId] {
        &self.materials
    }

    /// Bounds of the recentred mesh.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &ModelBounds {
        &self.bounds
    }

    /// Offset added to every installed position.
    #[inline]
    #[must_use]
    pub const fn mesh_offset(&self) -> Vec3 {
        self.store.mesh_offset()
    }

    /// The proxy quad every far instance is drawn as.
    #[inline]
    #[must_use]
    pub const fn quad(&self) -> &ProxyQuad {
        &self.quad
    }

    /// Number of installed instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if no instances are installed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Installed positions, mesh offset applied.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        self.store.positions()
    }

    /// Current phase of every instance.
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        self.store.phases()
    }

    /// Near/transitioning sets of the last classification.
    #[inline]
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Far set of the last classification.
    #[inline]
    #[must_use]
    pub fn far_set(&self) -> &FarSet {
        &self.far
    }

    /// Build/publish state machine.
    #[inline]
    #[must_use]
    pub const fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    /// Current proxy texture.
    #[inline]
    #[must_use]
    pub const fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Returns true between [`initialize`](Self::initialize) and
    /// [`dispose`](Self::dispose).
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns true when no build is pending or publishing.
    #[inline]
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.scheduler.is_idle()
    }
}
