//! Window registry.
//!
//! Single owner of every `AppWindow`. An entry never exists without its
//! backing local window: creation makes the backend window first and
//! discards the entity if that fails, deletion destroys the backend window
//! before the entry is dropped.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::RailError;
use crate::rail::backend::WindowBackend;
use crate::rail::window::AppWindow;
use crate::shared::Geometry;

#[derive(Default)]
pub struct WindowRegistry {
    windows: HashMap<u64, AppWindow>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new remote window and create its local backing window.
    ///
    /// Routing a new-window order for an already-known id to an update is
    /// the synchronizer's job; the registry only refuses the duplicate.
    pub fn create(
        &mut self,
        backend: &mut dyn WindowBackend,
        id: u64,
        geometry: Geometry,
        surface_id: u32,
    ) -> Result<&mut AppWindow, RailError> {
        if self.windows.contains_key(&id) {
            return Err(RailError::WindowExists(id));
        }

        backend.create_window(id, geometry, surface_id)?;
        debug!("Registered window 0x{:08x} at {:?}", id, geometry);
        Ok(self
            .windows
            .entry(id)
            .or_insert_with(|| AppWindow::new(id, geometry, surface_id)))
    }

    pub fn get(&self, id: u64) -> Option<&AppWindow> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut AppWindow> {
        self.windows.get_mut(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.windows.contains_key(&id)
    }

    /// Remove a window, tearing the local window down first. Removing an
    /// unknown id is a benign no-op.
    pub fn remove(&mut self, backend: &mut dyn WindowBackend, id: u64) -> bool {
        if !self.windows.contains_key(&id) {
            return false;
        }

        if let Err(err) = backend.destroy_window(id) {
            warn!("Failed to destroy local window 0x{:08x}: {}", id, err);
        }
        self.windows.remove(&id);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &AppWindow)> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rail::mock::RecordingBackend;
    use crate::rail::window::SURFACE_ID_NONE;

    #[test]
    fn test_create_rejects_duplicate_id() {
        let mut backend = RecordingBackend::default();
        let mut registry = WindowRegistry::new();

        registry
            .create(&mut backend, 7, Geometry::new(0, 0, 100, 50), SURFACE_ID_NONE)
            .unwrap();
        assert!(matches!(
            registry.create(&mut backend, 7, Geometry::default(), SURFACE_ID_NONE),
            Err(RailError::WindowExists(7))
        ));
    }

    #[test]
    fn test_failed_backend_create_discards_entity() {
        let mut backend = RecordingBackend::default();
        backend.fail_create.set(true);
        let mut registry = WindowRegistry::new();

        assert!(registry
            .create(&mut backend, 7, Geometry::default(), SURFACE_ID_NONE)
            .is_err());
        assert!(!registry.contains(7));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut backend = RecordingBackend::default();
        let mut registry = WindowRegistry::new();

        registry
            .create(&mut backend, 9, Geometry::default(), SURFACE_ID_NONE)
            .unwrap();
        assert!(registry.remove(&mut backend, 9));
        assert!(!registry.remove(&mut backend, 9));
        assert!(!registry.remove(&mut backend, 12345));
    }
}
