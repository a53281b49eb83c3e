//! Collaborator seams.
//!
//! The synchronizer core drives two collaborators: the local windowing
//! system and the outbound protocol channel. Both are behind traits so the
//! core stays testable and backend-agnostic. Every call is a synchronous,
//! non-blocking request; the core fires and continues.

use anyhow::Result;

use crate::rail::icon_cache::RailIcon;
use crate::rail::orders::{Activate, ExecStatus, MinMaxInfo, SystemCommand, WindowMove};
use crate::rail::window::{MoveSizeKind, ShowState, WindowStyle, WindowStyleEx};
use crate::shared::{Geometry, Rect};

/// Local windowing system operations, keyed by remote window id. The
/// backend owns the mapping from window id to its native window handle.
pub trait WindowBackend {
    /// Create the backing local window for a new remote window.
    fn create_window(&mut self, id: u64, geometry: Geometry, surface_id: u32) -> Result<()>;

    /// Destroy the backing local window and all its resources.
    fn destroy_window(&mut self, id: u64) -> Result<()>;

    /// Move and resize the window; implies a repaint of the new extent.
    fn move_window(&mut self, id: u64, geometry: Geometry) -> Result<()>;

    /// Repaint an area of the window, window-relative coordinates.
    fn update_window_area(&mut self, id: u64, x: i32, y: i32, width: u32, height: u32)
    -> Result<()>;

    fn show_window(&mut self, id: u64, state: ShowState) -> Result<()>;

    fn set_title(&mut self, id: u64, title: &str) -> Result<()>;

    fn set_style(&mut self, id: u64, style: WindowStyle, ex_style: WindowStyleEx) -> Result<()>;

    /// Set the window icon property: a bulk integer array, leading width and
    /// height, then pixels. `replace` swaps the whole property; otherwise
    /// the icon is appended as an additional size.
    fn set_icon(&mut self, id: u64, icon: &RailIcon, replace: bool) -> Result<()>;

    /// Shape the window to the given rectangles, offset applied to each.
    /// An empty slice removes the shaping.
    fn set_visibility_rects(
        &mut self,
        id: u64,
        offset_x: i32,
        offset_y: i32,
        rects: &[Rect],
    ) -> Result<()>;

    /// Forward min/max tracking sizes to the window manager.
    fn set_minmax_info(&mut self, id: u64, info: &MinMaxInfo) -> Result<()>;

    /// Ask the windowing system to run its native interactive move/resize
    /// at the given screen position.
    fn start_interactive_move_size(
        &mut self,
        id: u64,
        kind: MoveSizeKind,
        x: i32,
        y: i32,
    ) -> Result<()>;

    /// Send the client window-manager event that maximizes the window.
    fn send_maximize(&mut self, id: u64) -> Result<()>;

    /// Current pointer position in screen coordinates.
    fn query_pointer(&mut self, id: u64) -> Result<(i32, i32)>;

    /// Synthesize a pointer button release at the given screen position,
    /// terminating any interactive grab.
    fn send_button_release(&mut self, x: i32, y: i32) -> Result<()>;

    /// Translate window-relative coordinates to screen coordinates.
    fn root_position(&mut self, id: u64, x: i32, y: i32) -> Result<(i32, i32)>;

    /// Switch the session into seamless per-window rendering.
    fn enter_seamless_mode(&mut self) -> Result<()>;

    /// Switch the session back to whole-desktop rendering.
    fn leave_seamless_mode(&mut self) -> Result<()>;
}

/// Outbound protocol channel back to the remote host.
pub trait RailTransport {
    fn window_move(&mut self, order: &WindowMove) -> Result<()>;

    fn activate(&mut self, order: &Activate) -> Result<()>;

    fn system_command(&mut self, order: &SystemCommand) -> Result<()>;

    /// Send the queued application-start command; called once the server
    /// handshake confirms readiness.
    fn send_startup_command(&mut self) -> Result<()>;

    /// Tear the connection down after a fatal remote failure.
    fn abort_connection(&mut self, status: ExecStatus) -> Result<()>;
}
