//! X11 window backend.
//!
//! Implements [`WindowBackend`] over x11rb. Remote windows become plain
//! top-level X windows; icons, shaping, maximize state, and interactive
//! move/resize all go through the usual EWMH/ICCCM surfaces.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::protocol::xtest::ConnectionExt as _;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::rail::backend::WindowBackend;
use crate::rail::icon_cache::RailIcon;
use crate::rail::orders::MinMaxInfo;
use crate::rail::window::{MoveSizeKind, ResizeDirection, ShowState, WindowStyle, WindowStyleEx};
use crate::shared::{Geometry, Rect};

// _NET_WM_MOVERESIZE directions.
const MOVERESIZE_SIZE_TOPLEFT: u32 = 0;
const MOVERESIZE_SIZE_TOP: u32 = 1;
const MOVERESIZE_SIZE_TOPRIGHT: u32 = 2;
const MOVERESIZE_SIZE_RIGHT: u32 = 3;
const MOVERESIZE_SIZE_BOTTOMRIGHT: u32 = 4;
const MOVERESIZE_SIZE_BOTTOM: u32 = 5;
const MOVERESIZE_SIZE_BOTTOMLEFT: u32 = 6;
const MOVERESIZE_SIZE_LEFT: u32 = 7;
const MOVERESIZE_MOVE: u32 = 8;
const MOVERESIZE_SIZE_KEYBOARD: u32 = 9;
const MOVERESIZE_MOVE_KEYBOARD: u32 = 10;

// _NET_WM_STATE actions.
const NET_WM_STATE_ADD: u32 = 1;

// WM_CHANGE_STATE argument.
const ICONIC_STATE: u32 = 3;

/// Interned atoms the backend needs.
#[derive(Debug)]
struct Atoms {
    net_wm_icon: Atom,
    net_wm_name: Atom,
    net_wm_state: Atom,
    net_wm_state_maximized_vert: Atom,
    net_wm_state_maximized_horz: Atom,
    net_wm_moveresize: Atom,
    motif_wm_hints: Atom,
    utf8_string: Atom,
    wm_change_state: Atom,
}

impl Atoms {
    fn intern(conn: &RustConnection) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn
                .intern_atom(false, name.as_bytes())?
                .reply()
                .with_context(|| format!("Failed to intern atom {name}"))?
                .atom)
        };

        Ok(Self {
            net_wm_icon: intern("_NET_WM_ICON")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_moveresize: intern("_NET_WM_MOVERESIZE")?,
            motif_wm_hints: intern("_MOTIF_WM_HINTS")?,
            utf8_string: intern("UTF8_STRING")?,
            wm_change_state: intern("WM_CHANGE_STATE")?,
        })
    }
}

/// X11 implementation of the windowing-system collaborator.
pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    /// Remote window id -> X window.
    windows: HashMap<u64, Window>,
    /// 1x1 placeholder drawable kept alive while in seamless mode, where no
    /// whole-desktop window exists.
    dummy: Option<Window>,
}

impl X11Backend {
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display).context("Failed to connect to X11")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::intern(&conn)?;
        debug!("X11 backend connected, root 0x{:x}", root);

        Ok(Self { conn, root, atoms, windows: HashMap::new(), dummy: None })
    }

    fn window(&self, id: u64) -> Result<Window> {
        self.windows
            .get(&id)
            .copied()
            .with_context(|| format!("No X window for remote window 0x{id:08x}"))
    }

    fn send_root_message(&self, window: Window, type_: Atom, data: [u32; 5]) -> Result<()> {
        let event = ClientMessageEvent::new(32, window, type_, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }
}

fn moveresize_direction(kind: MoveSizeKind) -> u32 {
    match kind {
        MoveSizeKind::Move => MOVERESIZE_MOVE,
        MoveSizeKind::KeyboardMove => MOVERESIZE_MOVE_KEYBOARD,
        MoveSizeKind::KeyboardResize => MOVERESIZE_SIZE_KEYBOARD,
        MoveSizeKind::Resize(direction) => match direction {
            ResizeDirection::TopLeft => MOVERESIZE_SIZE_TOPLEFT,
            ResizeDirection::Top => MOVERESIZE_SIZE_TOP,
            ResizeDirection::TopRight => MOVERESIZE_SIZE_TOPRIGHT,
            ResizeDirection::Right => MOVERESIZE_SIZE_RIGHT,
            ResizeDirection::BottomRight => MOVERESIZE_SIZE_BOTTOMRIGHT,
            ResizeDirection::Bottom => MOVERESIZE_SIZE_BOTTOM,
            ResizeDirection::BottomLeft => MOVERESIZE_SIZE_BOTTOMLEFT,
            ResizeDirection::Left => MOVERESIZE_SIZE_LEFT,
        },
    }
}

impl WindowBackend for X11Backend {
    fn create_window(&mut self, id: u64, geometry: Geometry, surface_id: u32) -> Result<()> {
        let xid = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            xid,
            self.root,
            geometry.x as i16,
            geometry.y as i16,
            geometry.width.max(1) as u16,
            geometry.height.max(1) as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE),
        )?;
        self.windows.insert(id, xid);
        self.conn.flush()?;
        debug!(
            "Created X window 0x{:x} for remote window 0x{:08x} (surface {:#x})",
            xid, id, surface_id
        );
        Ok(())
    }

    fn destroy_window(&mut self, id: u64) -> Result<()> {
        let xid = self.window(id)?;
        self.windows.remove(&id);
        self.conn.destroy_window(xid)?;
        self.conn.flush()?;
        Ok(())
    }

    fn move_window(&mut self, id: u64, geometry: Geometry) -> Result<()> {
        let xid = self.window(id)?;
        self.conn.configure_window(
            xid,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width.max(1))
                .height(geometry.height.max(1)),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn update_window_area(&mut self, id: u64, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        let xid = self.window(id)?;
        // Exposure drives the surface-compositing path to repaint the area.
        self.conn
            .clear_area(true, xid, x as i16, y as i16, width as u16, height as u16)?;
        self.conn.flush()?;
        Ok(())
    }

    fn show_window(&mut self, id: u64, state: ShowState) -> Result<()> {
        let xid = self.window(id)?;
        match state {
            ShowState::Hide => {
                self.conn.unmap_window(xid)?;
            }
            ShowState::Minimized => {
                self.send_root_message(xid, self.atoms.wm_change_state, [ICONIC_STATE, 0, 0, 0, 0])?;
            }
            ShowState::Show => {
                self.conn.map_window(xid)?;
            }
            ShowState::Maximized => {
                self.conn.map_window(xid)?;
                self.send_maximize(id)?;
            }
        }
        self.conn.flush()?;
        Ok(())
    }

    fn set_title(&mut self, id: u64, title: &str) -> Result<()> {
        let xid = self.window(id)?;
        self.conn.change_property8(
            PropMode::REPLACE,
            xid,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            xid,
            self.atoms.net_wm_name,
            self.atoms.utf8_string,
            title.as_bytes(),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn set_style(&mut self, id: u64, style: WindowStyle, _ex_style: WindowStyleEx) -> Result<()> {
        let xid = self.window(id)?;

        // Undecorated remote windows (popups, tool frames without a caption)
        // get their local decorations removed through Motif hints.
        let decorations = u32::from(style.contains(WindowStyle::CAPTION));
        let hints = [2u32 /* MWM_HINTS_DECORATIONS */, 0, decorations, 0, 0];
        self.conn.change_property32(
            PropMode::REPLACE,
            xid,
            self.atoms.motif_wm_hints,
            self.atoms.motif_wm_hints,
            &hints,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn set_icon(&mut self, id: u64, icon: &RailIcon, replace: bool) -> Result<()> {
        let xid = self.window(id)?;
        let mode = if replace { PropMode::REPLACE } else { PropMode::APPEND };
        self.conn.change_property32(
            mode,
            xid,
            self.atoms.net_wm_icon,
            AtomEnum::CARDINAL,
            icon.data(),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn set_visibility_rects(
        &mut self,
        id: u64,
        offset_x: i32,
        offset_y: i32,
        rects: &[Rect],
    ) -> Result<()> {
        let xid = self.window(id)?;

        if rects.is_empty() {
            // No rects: drop the shaping back to the full window.
            self.conn
                .shape_mask(shape::SO::SET, shape::SK::BOUNDING, xid, 0, 0, 0u32)?;
        } else {
            let rectangles: Vec<Rectangle> = rects
                .iter()
                .map(|r| Rectangle {
                    x: r.left as i16,
                    y: r.top as i16,
                    width: r.width(),
                    height: r.height(),
                })
                .collect();
            self.conn.shape_rectangles(
                shape::SO::SET,
                shape::SK::BOUNDING,
                ClipOrdering::UNSORTED,
                xid,
                offset_x as i16,
                offset_y as i16,
                &rectangles,
            )?;
        }
        self.conn.flush()?;
        Ok(())
    }

    fn set_minmax_info(&mut self, id: u64, info: &MinMaxInfo) -> Result<()> {
        let xid = self.window(id)?;
        let dim = |v: i16| v.max(0) as u32;

        // WM_NORMAL_HINTS with PMinSize | PMaxSize.
        let mut hints = [0u32; 18];
        hints[0] = (1 << 4) | (1 << 5);
        hints[5] = dim(info.min_track_width);
        hints[6] = dim(info.min_track_height);
        hints[7] = dim(info.max_track_width);
        hints[8] = dim(info.max_track_height);

        self.conn.change_property32(
            PropMode::REPLACE,
            xid,
            AtomEnum::WM_NORMAL_HINTS,
            AtomEnum::WM_SIZE_HINTS,
            &hints,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn start_interactive_move_size(
        &mut self,
        id: u64,
        kind: MoveSizeKind,
        x: i32,
        y: i32,
    ) -> Result<()> {
        let xid = self.window(id)?;
        let button = if kind.is_keyboard() { 0 } else { 1 };
        self.send_root_message(
            xid,
            self.atoms.net_wm_moveresize,
            [x as u32, y as u32, moveresize_direction(kind), button, 1],
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn send_maximize(&mut self, id: u64) -> Result<()> {
        let xid = self.window(id)?;
        self.send_root_message(
            xid,
            self.atoms.net_wm_state,
            [
                NET_WM_STATE_ADD,
                self.atoms.net_wm_state_maximized_vert,
                self.atoms.net_wm_state_maximized_horz,
                0,
                0,
            ],
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn query_pointer(&mut self, id: u64) -> Result<(i32, i32)> {
        let xid = self.window(id)?;
        let reply = self.conn.query_pointer(xid)?.reply()?;
        Ok((i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn send_button_release(&mut self, x: i32, y: i32) -> Result<()> {
        self.conn
            .xtest_fake_input(BUTTON_RELEASE_EVENT, 1, x11rb::CURRENT_TIME, self.root, x as i16, y as i16, 0)?;
        self.conn.flush()?;
        Ok(())
    }

    fn root_position(&mut self, id: u64, x: i32, y: i32) -> Result<(i32, i32)> {
        let xid = self.window(id)?;
        let reply = self
            .conn
            .translate_coordinates(xid, self.root, x as i16, y as i16)?
            .reply()?;
        Ok((i32::from(reply.dst_x), i32::from(reply.dst_y)))
    }

    fn enter_seamless_mode(&mut self) -> Result<()> {
        if self.dummy.is_some() {
            return Ok(());
        }
        // The desktop window goes away in seamless mode; keep a 1x1
        // off-screen drawable so the render path always has a target.
        let xid = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            xid,
            self.root,
            -100,
            -100,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        self.conn.flush()?;
        self.dummy = Some(xid);
        debug!("Seamless mode on, placeholder drawable 0x{:x}", xid);
        Ok(())
    }

    fn leave_seamless_mode(&mut self) -> Result<()> {
        // Window teardown stays registry-driven; only the placeholder
        // drawable belongs to the mode switch.
        if let Some(xid) = self.dummy.take() {
            self.conn.destroy_window(xid)?;
            self.conn.flush()?;
        }
        if !self.windows.is_empty() {
            warn!("Leaving seamless mode with {} windows still mapped", self.windows.len());
        }
        debug!("Seamless mode off");
        Ok(())
    }
}
