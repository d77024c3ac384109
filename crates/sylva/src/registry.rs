//! # Proxy Renderer Registry
//!
//! Owns one [`ProxyRenderer`] per object type, keyed by [`ProxyTypeId`],
//! together with the worker pool every renderer's builds run on.
//!
//! ## Frame Order
//!
//! 1. [`drain_inbox`](ProxyRegistry::drain_inbox) applies queued position sets
//! 2. [`tick_all`](ProxyRegistry::tick_all) ticks every renderer in id order

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use sylva_lod::{
    DetailMesh, FrameStats, MaterialId, ProxyRenderer, ProxyTypeConfig, RenderHost, SceneView,
};
use tracing::{error, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::inbox::{PositionInbox, PositionSender};

/// Object type key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyTypeId(pub u32);

impl fmt::Display for ProxyTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mesh and materials a type is drawn with up close.
#[derive(Debug, Clone, Default)]
pub struct TypeAssets {
    /// Detailed mesh, any origin.
    pub mesh: DetailMesh,
    /// Materials for the detailed mesh.
    pub materials: Vec<MaterialId>,
}

#[derive(Debug)]
struct RegisteredType {
    name: String,
    renderer: ProxyRenderer,
}

/// Every proxy renderer of a scene.
#[derive(Debug)]
pub struct ProxyRegistry {
    pool: Arc<ThreadPool>,
    types: BTreeMap<ProxyTypeId, RegisteredType>,
    inbox: PositionInbox,
}

impl ProxyRegistry {
    /// Creates an empty registry with its own worker pool.
    ///
    /// `worker_threads == 0` lets rayon choose.
    ///
    /// # Errors
    ///
    /// [`RegistryError::WorkerPool`] if the pool cannot be started.
    pub fn new(worker_threads: usize) -> RegistryResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("sylva-worker-{i}"))
            // A panicking build drops its channel; the owner sees BuildAborted.
            .panic_handler(|_| error!("batch build worker panicked"))
            .build()?;

        info!(threads = pool.current_num_threads(), "proxy registry created");
        Ok(Self {
            pool: Arc::new(pool),
            types: BTreeMap::new(),
            inbox: PositionInbox::new(),
        })
    }

    /// Creates a registry with every type in `config`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingAssets`] if a configured type has no entry
    ///   in `assets`
    /// - anything [`new`](Self::new) or [`register`](Self::register) returns
    pub fn from_config(
        config: &RegistryConfig,
        mut assets: BTreeMap<ProxyTypeId, TypeAssets>,
    ) -> RegistryResult<Self> {
        config.validate()?;
        let mut registry = Self::new(config.worker_threads)?;

        for entry in &config.types {
            let type_assets = assets
                .remove(&entry.id)
                .ok_or(RegistryError::MissingAssets(entry.id))?;
            registry.register(entry.id, entry.name.clone(), entry.lod.clone(), type_assets)?;
        }
        for id in assets.keys() {
            warn!(%id, "assets supplied for an unconfigured type");
        }
        Ok(registry)
    }

    /// Adds a renderer for a new type. It draws nothing until initialized.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateType`] if `id` is taken
    /// - [`RegistryError::Lod`] if the renderer rejects its inputs
    pub fn register(
        &mut self,
        id: ProxyTypeId,
        name: impl Into<String>,
        config: ProxyTypeConfig,
        assets: TypeAssets,
    ) -> RegistryResult<()> {
        if self.types.contains_key(&id) {
            return Err(RegistryError::DuplicateType(id));
        }

        let renderer = ProxyRenderer::new(
            config,
            assets.mesh,
            assets.materials,
            Arc::clone(&self.pool),
        )?;
        let name = name.into();
        info!(%id, name = %name, "proxy type registered");
        self.types.insert(id, RegisteredType { name, renderer });
        Ok(())
    }

    /// Disposes a type's renderer and removes it.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownType`] if `id` is not registered.
    pub fn unregister<H: RenderHost + ?Sized>(
        &mut self,
        id: ProxyTypeId,
        host: &mut H,
    ) -> RegistryResult<()> {
        let mut entry = self.types.remove(&id).ok_or(RegistryError::UnknownType(id))?;
        entry.renderer.dispose(host);
        info!(%id, name = %entry.name, "proxy type removed");
        Ok(())
    }

    /// Initializes one type with its first position set.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownType`] or the renderer's error.
    pub fn initialize<H: RenderHost + ?Sized>(
        &mut self,
        id: ProxyTypeId,
        positions: &[Vec3],
        view: &SceneView,
        host: &mut H,
    ) -> RegistryResult<()> {
        self.renderer_mut(id)?.initialize(positions, view, host)?;
        Ok(())
    }

    /// Initializes every type. Types missing from `positions` start empty.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownType`] if `positions` names an unregistered
    /// type, otherwise the first renderer error.
    pub fn initialize_all<H: RenderHost + ?Sized>(
        &mut self,
        positions: &BTreeMap<ProxyTypeId, Vec<Vec3>>,
        view: &SceneView,
        host: &mut H,
    ) -> RegistryResult<()> {
        if let Some(id) = positions.keys().find(|id| !self.types.contains_key(id)) {
            return Err(RegistryError::UnknownType(*id));
        }

        for (id, entry) in &mut self.types {
            let set = positions.get(id).map_or(&[][..], Vec::as_slice);
            entry.renderer.initialize(set, view, host)?;
        }
        Ok(())
    }

    /// Replaces one type's position set.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownType`] or the renderer's error.
    pub fn update_positions<H: RenderHost + ?Sized>(
        &mut self,
        id: ProxyTypeId,
        positions: &[Vec3],
        view: &SceneView,
        host: &mut H,
    ) -> RegistryResult<()> {
        self.renderer_mut(id)?.replace_positions(positions, view, host)?;
        Ok(())
    }

    /// Returns a sender other threads can submit position sets through.
    #[must_use]
    pub fn sender(&self) -> PositionSender {
        self.inbox.sender()
    }

    /// Applies every queued position set, newest per type.
    ///
    /// Sets for unknown types are logged and dropped. Returns the number of
    /// types updated.
    ///
    /// # Errors
    ///
    /// The first renderer error.
    pub fn drain_inbox<H: RenderHost + ?Sized>(
        &mut self,
        view: &SceneView,
        host: &mut H,
    ) -> RegistryResult<usize> {
        let mut applied = 0;
        for (id, positions) in self.inbox.drain_latest() {
            let Some(entry) = self.types.get_mut(&id) else {
                warn!(%id, "position update for unknown type dropped");
                continue;
            };
            entry.renderer.replace_positions(&positions, view, host)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Ticks every renderer and sums their stats.
    ///
    /// # Errors
    ///
    /// The first renderer error. Renderers after it are not ticked.
    pub fn tick_all<H: RenderHost + ?Sized>(
        &mut self,
        view: &SceneView,
        host: &mut H,
    ) -> RegistryResult<FrameStats> {
        let mut total = FrameStats::default();
        for entry in self.types.values_mut() {
            let stats = entry.renderer.tick(view, host)?;
            total.accumulate(&stats);
        }
        Ok(total)
    }

    /// Disposes every renderer. Registrations are kept. Idempotent.
    pub fn dispose_all<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        for entry in self.types.values_mut() {
            entry.renderer.dispose(host);
        }
    }

    /// A type's renderer.
    #[must_use]
    pub fn get(&self, id: ProxyTypeId) -> Option<&ProxyRenderer> {
        self.types.get(&id).map(|entry| &entry.renderer)
    }

    /// A type's renderer, mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: ProxyTypeId) -> Option<&mut ProxyRenderer> {
        self.types.get_mut(&id).map(|entry| &mut entry.renderer)
    }

    /// A type's configured name.
    #[must_use]
    pub fn name(&self, id: ProxyTypeId) -> Option<&str> {
        self.types.get(&id).map(|entry| entry.name.as_str())
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ProxyTypeId> + '_ {
        self.types.keys().copied()
    }

    /// The shared worker pool.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    fn renderer_mut(&mut self, id: ProxyTypeId) -> RegistryResult<&mut ProxyRenderer> {
        self.get_mut(id).ok_or(RegistryError::UnknownType(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_lod::{RecordingHost, Viewer};

    fn assets() -> TypeAssets {
        TypeAssets {
            mesh: DetailMesh::new(
                vec![Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 5.0, 1.0)],
                vec![0, 1, 0],
            ),
            materials: vec![MaterialId(7)],
        }
    }

    fn view() -> SceneView {
        SceneView::new(Viewer::default())
    }

    fn registry() -> ProxyRegistry {
        let mut registry = ProxyRegistry::new(2).unwrap();
        registry.register(ProxyTypeId(1), "pine", ProxyTypeConfig::default(), assets()).unwrap();
        registry.register(ProxyTypeId(2), "rock", ProxyTypeConfig::default(), assets()).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let result =
            registry.register(ProxyTypeId(1), "again", ProxyTypeConfig::default(), assets());
        assert!(matches!(result, Err(RegistryError::DuplicateType(ProxyTypeId(1)))));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_type_update() {
        let mut registry = registry();
        let mut host = RecordingHost::new();
        let result = registry.update_positions(ProxyTypeId(9), &[Vec3::ZERO], &view(), &mut host);
        assert!(matches!(result, Err(RegistryError::UnknownType(ProxyTypeId(9)))));
    }

    #[test]
    fn test_initialize_all_and_tick() {
        let mut registry = registry();
        let mut host = RecordingHost::new();
        let positions = BTreeMap::from([
            (ProxyTypeId(1), vec![Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 100.0)]),
        ]);

        registry.initialize_all(&positions, &view(), &mut host).unwrap();
        assert!(registry.get(ProxyTypeId(2)).unwrap().is_initialized());
        assert!(registry.get(ProxyTypeId(2)).unwrap().is_empty());

        let stats = registry.tick_all(&view(), &mut host).unwrap();
        assert_eq!(stats.detailed_draws, 1);
        assert_eq!(stats.proxy_draws, 1);
    }

    #[test]
    fn test_inbox_applies_latest_set() {
        let mut registry = registry();
        let mut host = RecordingHost::new();
        registry.initialize_all(&BTreeMap::new(), &view(), &mut host).unwrap();

        let sender = registry.sender();
        sender.submit(ProxyTypeId(1), vec![Vec3::ZERO]);
        sender.submit(ProxyTypeId(1), vec![Vec3::ZERO; 3]);
        sender.submit(ProxyTypeId(42), vec![Vec3::ZERO]);

        let applied = registry.drain_inbox(&view(), &mut host).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(registry.get(ProxyTypeId(1)).unwrap().len(), 3);
    }

    #[test]
    fn test_dispose_all_twice() {
        let mut registry = registry();
        let mut host = RecordingHost::new();
        let positions = BTreeMap::from([(ProxyTypeId(2), vec![Vec3::new(0.0, 0.0, 80.0); 10])]);
        registry.initialize_all(&positions, &view(), &mut host).unwrap();

        registry.dispose_all(&mut host);
        registry.dispose_all(&mut host);

        assert_eq!(host.live_batches(), 0);
        assert_eq!(host.live_textures(), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_from_config_requires_assets() {
        let config = RegistryConfig::from_toml_str(
            "[[types]]\nid = 5\nname = \"fern\"\n",
        )
        .unwrap();

        let missing = ProxyRegistry::from_config(&config, BTreeMap::new());
        assert!(matches!(missing, Err(RegistryError::MissingAssets(ProxyTypeId(5)))));

        let provided = BTreeMap::from([(ProxyTypeId(5), assets())]);
        let registry = ProxyRegistry::from_config(&config, provided).unwrap();
        assert_eq!(registry.name(ProxyTypeId(5)), Some("fern"));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![ProxyTypeId(5)]);
    }
}
