//! Decoded protocol order records.
//!
//! Everything here arrives already parsed by the wire layer; these records
//! are consumed synchronously and never stored. Field presence on window
//! orders is expressed as one `Option` per field group instead of a side
//! bitmask, so a merge cannot read a field the message did not carry.

use serde::{Deserialize, Serialize};

use crate::rail::window::{MoveSizeKind, ShowState};
use crate::shared::Rect;

/// Per-order routing info shared by all window-targeted orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub window_id: u64,

    /// The "new window" bit. On window-state orders it requests creation of
    /// an unknown id; on icon orders it selects replace-vs-append semantics.
    pub new_window: bool,
}

impl OrderInfo {
    pub fn new(window_id: u64) -> Self {
        Self { window_id, new_window: false }
    }

    pub fn new_window(window_id: u64) -> Self {
        Self { window_id, new_window: true }
    }
}

/// Style pair carried by a window order. Raw bits; the entity stores them
/// through the typed bitflags with unknown bits preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StylePair {
    pub style: u32,
    pub extended: u32,
}

/// Partial window-state update. A `Some` field is authoritative for this
/// message; a `None` field leaves the entity's previous value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowUpdate {
    pub owner_window_id: Option<u64>,
    pub style: Option<StylePair>,
    pub show_state: Option<ShowState>,
    /// `Some("")` is a real, empty title; `None` means "not carried".
    pub title: Option<String>,
    pub window_offset: Option<(i32, i32)>,
    pub window_size: Option<(u32, u32)>,
    /// Left/right resize margins.
    pub resize_margin_x: Option<(i32, i32)>,
    /// Top/bottom resize margins.
    pub resize_margin_y: Option<(i32, i32)>,
    pub client_offset: Option<(i32, i32)>,
    pub client_area_size: Option<(u32, u32)>,
    pub window_client_delta: Option<(i32, i32)>,
    pub window_rects: Option<Vec<Rect>>,
    pub visible_offset: Option<(i32, i32)>,
    pub visibility_rects: Option<Vec<Rect>>,
}

impl WindowUpdate {
    /// Did this message touch anything that moves or reshapes the window?
    /// Drives the single consolidated refresh instead of one per field.
    pub fn touches_geometry(&self) -> bool {
        self.window_offset.is_some()
            || self.window_size.is_some()
            || self.client_offset.is_some()
            || self.client_area_size.is_some()
            || self.window_client_delta.is_some()
            || self.visible_offset.is_some()
            || self.visibility_rects.is_some()
    }
}

/// Device-independent bitmap icon description from a window-icon order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconInfo {
    pub cache_id: u8,
    pub cache_entry: u16,
    pub width: u16,
    pub height: u16,
    pub bpp: u16,
    /// Color bitmap, bottom-up rows, 4-byte-aligned stride.
    pub bits_color: Vec<u8>,
    /// Optional 1bpp AND mask, bottom-up, 4-byte-aligned stride.
    pub bits_mask: Vec<u8>,
    /// Optional palette for bpp <= 8, 4 bytes per entry (B, G, R, reserved).
    pub color_table: Vec<u8>,
}

/// Reference to an already-populated icon cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedIcon {
    pub cache_id: u8,
    pub cache_entry: u16,
}

/// Tray-icon state order. The notify-icon subsystem is a placeholder; the
/// record is decoded but not acted on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyIconState {
    pub version: Option<u32>,
    pub tool_tip: Option<String>,
    pub icon: Option<IconInfo>,
    pub cached_icon: Option<CachedIcon>,
}

/// Monitored-desktop order (desktop mode bookkeeping; placeholder).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoredDesktop {
    pub active_window_id: u64,
    pub window_ids: Vec<u64>,
}

/// Server handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Handshake {
    pub build_number: u32,
}

/// Extended server handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandshakeEx {
    pub build_number: u32,
    pub handshake_flags: u32,
}

/// Result codes for a remote application start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecStatus {
    Ok,
    HookNotLoaded,
    DecodeFailed,
    NotInAllowlist,
    FileNotFound,
    Fail,
    SessionLocked,
}

/// Outcome of the queued application-start command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecResult {
    pub flags: u16,
    pub exec_result: ExecStatus,
    /// Raw NT status reported alongside the result code.
    pub raw_result: u32,
}

/// Server request to run a local interactive move/size gesture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocalMoveSize {
    pub window_id: u64,
    pub kind: MoveSizeKind,
    pub is_start: bool,
    pub pos_x: i16,
    pub pos_y: i16,
}

/// Min/max size constraints for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMaxInfo {
    pub window_id: u64,
    pub max_width: i16,
    pub max_height: i16,
    pub max_pos_x: i16,
    pub max_pos_y: i16,
    pub min_track_width: i16,
    pub min_track_height: i16,
    pub max_track_width: i16,
    pub max_track_height: i16,
}

/// Server-pushed system parameter (placeholder).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SystemParam {
    pub param: u32,
}

// ============================================================================
// Outbound orders (client -> server)
// ============================================================================

/// Window geometry update sent after a local move. Edges are screen
/// coordinates, right/bottom one past the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMove {
    pub window_id: u32,
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

/// Window activation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activate {
    pub window_id: u32,
    pub enabled: bool,
}

/// System command for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemCommand {
    pub window_id: u32,
    pub command: u16,
}

/// Numeric system-command values.
pub mod syscommand {
    pub const SIZE: u16 = 0xF000;
    pub const MOVE: u16 = 0xF010;
    pub const MINIMIZE: u16 = 0xF020;
    pub const MAXIMIZE: u16 = 0xF030;
    pub const CLOSE: u16 = 0xF060;
    pub const KEYMENU: u16 = 0xF100;
    pub const RESTORE: u16 = 0xF120;
    pub const DEFAULT: u16 = 0xF160;
}

/// One inbound order, ready for dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RailOrder {
    WindowState { info: OrderInfo, update: WindowUpdate },
    WindowDelete { info: OrderInfo },
    WindowIcon { info: OrderInfo, icon: IconInfo },
    WindowCachedIcon { info: OrderInfo, icon: CachedIcon },
    NotifyIconCreate { info: OrderInfo, state: NotifyIconState },
    NotifyIconUpdate { info: OrderInfo, state: NotifyIconState },
    NotifyIconDelete { info: OrderInfo },
    MonitoredDesktop { info: OrderInfo, desktop: MonitoredDesktop },
    NonMonitoredDesktop { info: OrderInfo },
    Handshake(Handshake),
    HandshakeEx(HandshakeEx),
    ExecResult(ExecResult),
    SystemParam(SystemParam),
    LocalMoveSize(LocalMoveSize),
    MinMaxInfo(MinMaxInfo),
    LanguageBarInfo { status: u32 },
    GetAppIdResponse { window_id: u64, application_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_window_state_order() {
        let order = RailOrder::WindowState {
            info: OrderInfo::new_window(0x2001),
            update: WindowUpdate {
                title: Some("Calculator".into()),
                window_offset: Some((120, 80)),
                window_size: Some((640, 480)),
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"type\":\"WindowState\""));

        match serde_json::from_str::<RailOrder>(&json).unwrap() {
            RailOrder::WindowState { info, update } => {
                assert_eq!(info.window_id, 0x2001);
                assert!(info.new_window);
                assert_eq!(update.title.as_deref(), Some("Calculator"));
                assert_eq!(update.window_size, Some((640, 480)));
                assert_eq!(update.show_state, None);
            }
            _ => panic!("Wrong order type"),
        }
    }
}
