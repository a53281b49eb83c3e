//! Window state synchronizer.
//!
//! Consumes window orders and merges them into registry entities. Only the
//! fields a message carries are authoritative; everything else keeps its
//! previous value. Geometry-affecting fields feed one consolidated refresh
//! of the local window instead of one refresh per field.
//!
//! A backend call failing mid-refresh leaves the fields merged so far in
//! place; the merge is not transactional.

use tracing::{debug, warn};

use crate::error::RailError;
use crate::rail::RailContext;
use crate::rail::icon_cache::IconSlot;
use crate::rail::orders::{CachedIcon, IconInfo, MonitoredDesktop, NotifyIconState, OrderInfo, WindowUpdate};
use crate::rail::window::{DEFAULT_WINDOW_TITLE, SURFACE_ID_NONE, ShowState, WindowStyle, WindowStyleEx};
use crate::shared::Geometry;

impl RailContext {
    /// Apply one window-state order, creating the window when the order
    /// carries the "new window" bit for an unknown id.
    pub fn on_window_order(
        &mut self,
        info: &OrderInfo,
        update: &WindowUpdate,
    ) -> Result<(), RailError> {
        let mut created = false;
        if info.new_window && !self.windows.contains(info.window_id) {
            let (x, y) = update.window_offset.unwrap_or((0, 0));
            let (width, height) = update.window_size.unwrap_or((0, 0));
            self.windows.create(
                self.backend.as_mut(),
                info.window_id,
                Geometry::new(x, y, width, height),
                SURFACE_ID_NONE,
            )?;
            created = true;
        }

        let Some(window) = self.windows.get_mut(info.window_id) else {
            // Orders race with local deletion; an unknown id is not an error.
            debug!("Ignoring order for unknown window 0x{:08x}", info.window_id);
            return Ok(());
        };

        let refresh_geometry = update.touches_geometry();

        // Merge carried fields into the entity.
        if let Some(owner) = update.owner_window_id {
            window.owner_window_id = Some(owner);
        }

        if let Some(style) = update.style {
            window.style = WindowStyle::from_bits_retain(style.style);
            window.ex_style = WindowStyleEx::from_bits_retain(style.extended);
            debug!(
                "Window 0x{:08x} style={{{:?}, {:?}}}",
                info.window_id, window.style, window.ex_style
            );
        }

        if let Some(state) = update.show_state {
            window.show_state = state;
        }

        // A window must never be left without a title: a carried title wins
        // (empty stays empty), a fresh window without one gets the placeholder.
        match (&update.title, created) {
            (Some(title), _) => window.title = title.clone(),
            (None, true) => window.title = DEFAULT_WINDOW_TITLE.to_string(),
            (None, false) => {}
        }

        if let Some((x, y)) = update.window_offset {
            window.window_offset_x = x;
            window.window_offset_y = y;
        }

        if let Some((width, height)) = update.window_size {
            window.window_width = width;
            window.window_height = height;
        }

        if let Some((left, right)) = update.resize_margin_x {
            window.resize_margin_left = left;
            window.resize_margin_right = right;
        }

        if let Some((top, bottom)) = update.resize_margin_y {
            window.resize_margin_top = top;
            window.resize_margin_bottom = bottom;
        }

        if let Some((x, y)) = update.client_offset {
            window.client_offset_x = x;
            window.client_offset_y = y;
        }

        if let Some((width, height)) = update.client_area_size {
            window.client_area_width = width;
            window.client_area_height = height;
        }

        if let Some((dx, dy)) = update.window_client_delta {
            window.window_client_delta_x = dx;
            window.window_client_delta_y = dy;
        }

        if let Some(rects) = &update.window_rects {
            window.window_rects = rects.clone();
        }

        if let Some((x, y)) = update.visible_offset {
            window.visible_offset_x = x;
            window.visible_offset_y = y;
        }

        if let Some(rects) = &update.visibility_rects {
            window.visibility_rects = rects.clone();
        }

        // Push visible changes. Show is applied before the consolidated
        // geometry refresh so the minimized gate below sees the new state.
        let id = info.window_id;

        if update.show_state.is_some() {
            self.backend.show_window(id, window.show_state)?;
        }

        if update.title.is_some() || created {
            self.backend.set_title(id, &window.title)?;
        }

        if refresh_geometry {
            // The shaping call expects the visibility rects relative to the
            // window origin, not to the raw visible offset.
            let offset_x =
                window.visible_offset_x - (window.client_offset_x - window.window_client_delta_x);
            let offset_y =
                window.visible_offset_y - (window.client_offset_y - window.window_client_delta_y);

            // Minimized windows are reported with a collapsed size; applying
            // it to the visible window would corrupt the size restored
            // later. Keep the data model current and skip the visual calls.
            if window.show_state != ShowState::Minimized {
                if window.matches_remote_geometry() {
                    self.backend.update_window_area(
                        id,
                        0,
                        0,
                        window.window_width,
                        window.window_height,
                    )?;
                } else {
                    self.backend.move_window(id, window.remote_geometry())?;
                }

                self.backend
                    .set_visibility_rects(id, offset_x, offset_y, &window.visibility_rects)?;
            }

            if window.show_state == ShowState::Maximized {
                self.backend.send_maximize(id)?;
            }
        }

        if created || update.style.is_some() {
            self.backend.set_style(id, window.style, window.ex_style)?;
        }

        // Window-shape rects stay in the model only; the visibility rects
        // are what shapes the local window.
        Ok(())
    }

    /// Delete a window. Unknown ids are tolerated: a delete can race a
    /// previous local teardown.
    pub fn on_window_delete(&mut self, info: &OrderInfo) -> Result<(), RailError> {
        if !self.windows.remove(self.backend.as_mut(), info.window_id) {
            debug!("Delete for unknown window 0x{:08x}", info.window_id);
        }
        Ok(())
    }

    /// Decode an icon into its cache slot and apply it to the window.
    pub fn on_window_icon(&mut self, info: &OrderInfo, icon: &IconInfo) -> Result<(), RailError> {
        if !self.windows.contains(info.window_id) {
            debug!("Icon for unknown window 0x{:08x}", info.window_id);
            return Ok(());
        }

        let slot = IconSlot::from_wire(icon.cache_id, icon.cache_entry);
        let stored = match self.icon_cache.store(slot, icon) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    "Failed to store icon {:02X}:{:04X} for window 0x{:08x}: {}",
                    icon.cache_id, icon.cache_entry, info.window_id, err
                );
                return Err(err);
            }
        };

        self.backend.set_icon(info.window_id, stored, info.new_window)?;
        Ok(())
    }

    /// Apply a previously cached icon to the window.
    pub fn on_window_cached_icon(
        &mut self,
        info: &OrderInfo,
        icon: &CachedIcon,
    ) -> Result<(), RailError> {
        if !self.windows.contains(info.window_id) {
            debug!("Cached icon for unknown window 0x{:08x}", info.window_id);
            return Ok(());
        }

        let slot = IconSlot::from_wire(icon.cache_id, icon.cache_entry);
        let stored = match self.icon_cache.lookup(slot) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    "Failed to resolve icon {:02X}:{:04X} for window 0x{:08x}: {}",
                    icon.cache_id, icon.cache_entry, info.window_id, err
                );
                return Err(err);
            }
        };

        self.backend.set_icon(info.window_id, stored, info.new_window)?;
        Ok(())
    }

    // The notify-icon (tray) subsystem is a placeholder; its design is an
    // open item. Orders are acknowledged and dropped.

    pub fn on_notify_icon_create(
        &mut self,
        info: &OrderInfo,
        _state: &NotifyIconState,
    ) -> Result<(), RailError> {
        warn!("Notify icon create for window 0x{:08x} not implemented", info.window_id);
        Ok(())
    }

    pub fn on_notify_icon_update(
        &mut self,
        info: &OrderInfo,
        _state: &NotifyIconState,
    ) -> Result<(), RailError> {
        warn!("Notify icon update for window 0x{:08x} not implemented", info.window_id);
        Ok(())
    }

    pub fn on_notify_icon_delete(&mut self, info: &OrderInfo) -> Result<(), RailError> {
        warn!("Notify icon delete for window 0x{:08x} not implemented", info.window_id);
        Ok(())
    }

    pub fn on_monitored_desktop(
        &mut self,
        _info: &OrderInfo,
        _desktop: &MonitoredDesktop,
    ) -> Result<(), RailError> {
        warn!("Monitored desktop order not implemented");
        Ok(())
    }

    /// The server stopped monitoring the desktop; fall back out of
    /// seamless mode.
    pub fn on_non_monitored_desktop(&mut self) -> Result<(), RailError> {
        self.disable_seamless()
    }
}
