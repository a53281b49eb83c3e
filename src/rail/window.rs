//! RemoteApp window entity.
//!
//! One `AppWindow` per remote window. It carries two geometry sets that are
//! deliberately kept apart: the authoritative geometry pushed by the remote
//! host, and the geometry the local windowing system last reported for the
//! backing window. The synchronizer reconciles the two; nothing else may
//! write across the boundary.

use serde::{Deserialize, Serialize};

use crate::shared::{Geometry, Rect};

/// Surface binding used before a window order assigns a real surface.
pub const SURFACE_ID_NONE: u32 = 0xFFFF_FFFF;

/// Title assigned when a new-window order carries no title field.
pub const DEFAULT_WINDOW_TITLE: &str = "RdpRailWindow";

bitflags::bitflags! {
    /// Window style bits carried by window orders.
    ///
    /// Unknown bits are preserved; the named ones are what the backend
    /// mapping and the style logging care about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowStyle: u32 {
        const POPUP        = 0x8000_0000;
        const CHILD        = 0x4000_0000;
        const MINIMIZE     = 0x2000_0000;
        const VISIBLE      = 0x1000_0000;
        const DISABLED     = 0x0800_0000;
        const CLIPSIBLINGS = 0x0400_0000;
        const CLIPCHILDREN = 0x0200_0000;
        const MAXIMIZE     = 0x0100_0000;
        const BORDER       = 0x0080_0000;
        const DLGFRAME     = 0x0040_0000;
        const CAPTION      = 0x00C0_0000;
        const VSCROLL      = 0x0020_0000;
        const HSCROLL      = 0x0010_0000;
        const SYSMENU      = 0x0008_0000;
        const THICKFRAME   = 0x0004_0000;
        const GROUP        = 0x0002_0000;
        const TABSTOP      = 0x0001_0000;
    }
}

bitflags::bitflags! {
    /// Extended window style bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowStyleEx: u32 {
        const DLGMODALFRAME = 0x0000_0001;
        const TOPMOST       = 0x0000_0008;
        const MDICHILD      = 0x0000_0040;
        const TOOLWINDOW    = 0x0000_0080;
        const APPWINDOW     = 0x0004_0000;
        const LAYERED       = 0x0008_0000;
        const NOACTIVATE    = 0x0800_0000;
    }
}

/// Show state as ordered by the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShowState {
    Hide,
    Minimized,
    Maximized,
    #[default]
    Show,
}

/// Resize direction for an interactive resize gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeDirection {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

/// Kind of local move/size gesture requested by the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveSizeKind {
    /// Full-window move
    Move,
    /// Resize along one edge or corner
    Resize(ResizeDirection),
    /// Keyboard-driven move
    KeyboardMove,
    /// Keyboard-driven resize
    KeyboardResize,
}

impl MoveSizeKind {
    pub fn is_keyboard(&self) -> bool {
        matches!(self, MoveSizeKind::KeyboardMove | MoveSizeKind::KeyboardResize)
    }
}

/// State of the local interactive move/resize handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalMoveState {
    #[default]
    NotActive,
    InProgress(MoveSizeKind),
    Terminating,
}

/// One remote window and its local reflection.
#[derive(Debug, Clone)]
pub struct AppWindow {
    /// Remote-assigned 32-bit id, carried in a 64-bit field for uniform
    /// hashing with the other order tables.
    pub window_id: u64,

    /// Handle into the pixel-surface subsystem; opaque here.
    pub surface_id: u32,

    // Authoritative remote geometry.
    pub window_offset_x: i32,
    pub window_offset_y: i32,
    pub window_width: u32,
    pub window_height: u32,
    pub resize_margin_left: i32,
    pub resize_margin_right: i32,
    pub resize_margin_top: i32,
    pub resize_margin_bottom: i32,
    pub client_offset_x: i32,
    pub client_offset_y: i32,
    pub client_area_width: u32,
    pub client_area_height: u32,
    pub window_client_delta_x: i32,
    pub window_client_delta_y: i32,
    pub visible_offset_x: i32,
    pub visible_offset_y: i32,

    /// Local observed geometry, as last reported by the windowing system.
    pub local: Geometry,

    /// Is the backing local window currently mapped?
    pub mapped: bool,

    pub style: WindowStyle,
    pub ex_style: WindowStyleEx,
    pub show_state: ShowState,

    /// Window title; always present, replaced wholesale on update.
    pub title: String,

    /// Window-shape rectangles. Stored for completeness; only the
    /// visibility rectangles are used for shaping.
    pub window_rects: Vec<Rect>,

    /// Visibility rectangles, in client-area coordinates.
    pub visibility_rects: Vec<Rect>,

    /// Owning window, as a weak identifier. May dangle if the owner was
    /// deleted out of order; resolve through the registry at use time.
    pub owner_window_id: Option<u64>,

    /// Local move/resize handshake state.
    pub local_move: LocalMoveState,
}

impl AppWindow {
    pub fn new(window_id: u64, geometry: Geometry, surface_id: u32) -> Self {
        Self {
            window_id,
            surface_id,
            window_offset_x: 0,
            window_offset_y: 0,
            window_width: 0,
            window_height: 0,
            resize_margin_left: 0,
            resize_margin_right: 0,
            resize_margin_top: 0,
            resize_margin_bottom: 0,
            client_offset_x: 0,
            client_offset_y: 0,
            client_area_width: 0,
            client_area_height: 0,
            window_client_delta_x: 0,
            window_client_delta_y: 0,
            visible_offset_x: 0,
            visible_offset_y: 0,
            local: geometry,
            mapped: false,
            style: WindowStyle::default(),
            ex_style: WindowStyleEx::default(),
            show_state: ShowState::default(),
            title: String::new(),
            window_rects: Vec::new(),
            visibility_rects: Vec::new(),
            owner_window_id: None,
            local_move: LocalMoveState::default(),
        }
    }

    /// Authoritative remote geometry as one value.
    pub fn remote_geometry(&self) -> Geometry {
        Geometry::new(
            self.window_offset_x,
            self.window_offset_y,
            self.window_width,
            self.window_height,
        )
    }

    /// Does the local window sit exactly where the remote host thinks it is?
    pub fn matches_remote_geometry(&self) -> bool {
        self.local == self.remote_geometry()
    }
}
