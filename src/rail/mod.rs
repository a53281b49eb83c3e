//! RemoteApp (RAIL) window-state synchronization core.
//!
//! Reconciles window state pushed incrementally by the remote session host
//! with the windows the local windowing system renders. Everything runs on
//! one logical thread per session: protocol orders and local gesture events
//! are dispatched to completion, never concurrently for the same window.

pub mod backend;
pub mod icon_cache;
pub mod moveresize;
pub mod orders;
pub mod registry;
pub mod session;
pub mod sync;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

use tracing::{debug, warn};

use crate::error::RailError;
use crate::settings::RailSettings;
use crate::shared::Rect;
use self::backend::{RailTransport, WindowBackend};
use self::icon_cache::IconCache;
use self::orders::RailOrder;
use self::registry::WindowRegistry;

/// Per-session synchronizer state. One instance per connection; handlers
/// receive it explicitly instead of reaching for globals.
pub struct RailContext {
    settings: RailSettings,
    pub(crate) backend: Box<dyn WindowBackend>,
    pub(crate) transport: Box<dyn RailTransport>,
    pub(crate) windows: WindowRegistry,
    pub(crate) icon_cache: IconCache,
    seamless: bool,
}

impl RailContext {
    pub fn new(
        settings: RailSettings,
        backend: Box<dyn WindowBackend>,
        transport: Box<dyn RailTransport>,
    ) -> Self {
        let icon_cache = IconCache::new(&settings);
        Self {
            settings,
            backend,
            transport,
            windows: WindowRegistry::new(),
            icon_cache,
            seamless: false,
        }
    }

    pub fn settings(&self) -> &RailSettings {
        &self.settings
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn icon_cache(&self) -> &IconCache {
        &self.icon_cache
    }

    pub fn is_seamless(&self) -> bool {
        self.seamless
    }

    /// Switch to seamless per-window rendering.
    pub fn enable_seamless(&mut self) -> Result<(), RailError> {
        if self.seamless {
            return Ok(());
        }
        debug!("Entering seamless mode");
        self.backend.enter_seamless_mode()?;
        self.seamless = true;
        Ok(())
    }

    /// Fall back to whole-desktop rendering.
    pub fn disable_seamless(&mut self) -> Result<(), RailError> {
        if !self.seamless {
            return Ok(());
        }
        debug!("Leaving seamless mode");
        self.backend.leave_seamless_mode()?;
        self.seamless = false;
        Ok(())
    }

    /// Route one inbound order to its handler.
    ///
    /// Per-update failures (bad icon slot, malformed icon, duplicate or
    /// out-of-range window id) are surfaced as warnings and do not fail the
    /// session; everything else propagates.
    pub fn dispatch(&mut self, order: &RailOrder) -> Result<(), RailError> {
        let result = match order {
            RailOrder::WindowState { info, update } => self.on_window_order(info, update),
            RailOrder::WindowDelete { info } => self.on_window_delete(info),
            RailOrder::WindowIcon { info, icon } => self.on_window_icon(info, icon),
            RailOrder::WindowCachedIcon { info, icon } => self.on_window_cached_icon(info, icon),
            RailOrder::NotifyIconCreate { info, state } => self.on_notify_icon_create(info, state),
            RailOrder::NotifyIconUpdate { info, state } => self.on_notify_icon_update(info, state),
            RailOrder::NotifyIconDelete { info } => self.on_notify_icon_delete(info),
            RailOrder::MonitoredDesktop { info, desktop } => {
                self.on_monitored_desktop(info, desktop)
            }
            RailOrder::NonMonitoredDesktop { .. } => self.on_non_monitored_desktop(),
            RailOrder::Handshake(handshake) => self.on_handshake(handshake),
            RailOrder::HandshakeEx(handshake) => self.on_handshake_ex(handshake),
            RailOrder::ExecResult(result) => self.on_execute_result(result),
            RailOrder::SystemParam(param) => self.on_system_param(param),
            RailOrder::LocalMoveSize(order) => self.on_local_move_size(order),
            RailOrder::MinMaxInfo(info) => self.on_min_max_info(info),
            RailOrder::LanguageBarInfo { status } => self.on_language_bar_info(*status),
            RailOrder::GetAppIdResponse { window_id, application_id } => {
                self.on_get_app_id_response(*window_id, application_id)
            }
        };

        match result {
            Err(
                err @ (RailError::IconCacheBounds { .. }
                | RailError::IconDecode(_)
                | RailError::WindowExists(_)
                | RailError::WindowIdRange(_)),
            ) => {
                warn!("Order failed: {}", err);
                Ok(())
            }
            other => other,
        }
    }

    /// Repaint pass over every registered window: intersect the damaged
    /// screen area with each window and push window-relative area updates.
    pub fn paint(&mut self, damage: &Rect) -> Result<(), RailError> {
        for (id, window) in self.windows.iter() {
            let bounds = Rect::from_geometry(&window.local);
            let Some(overlap) = bounds.intersect(damage) else {
                continue;
            };
            self.backend.update_window_area(
                *id,
                i32::from(overlap.left) - window.local.x,
                i32::from(overlap.top) - window.local.y,
                u32::from(overlap.width()),
                u32::from(overlap.height()),
            )?;
        }
        Ok(())
    }
}
