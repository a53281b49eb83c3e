//! Recording collaborators for the synchronizer tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;

use crate::rail::backend::{RailTransport, WindowBackend};
use crate::rail::icon_cache::{IconDatum, RailIcon};
use crate::rail::orders::{Activate, ExecStatus, MinMaxInfo, SystemCommand, WindowMove};
use crate::rail::window::{MoveSizeKind, ShowState, WindowStyle, WindowStyleEx};
use crate::shared::{Geometry, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateWindow { id: u64, geometry: Geometry, surface_id: u32 },
    DestroyWindow { id: u64 },
    MoveWindow { id: u64, geometry: Geometry },
    UpdateArea { id: u64, x: i32, y: i32, width: u32, height: u32 },
    ShowWindow { id: u64, state: ShowState },
    SetTitle { id: u64, title: String },
    SetStyle { id: u64, style: WindowStyle, ex_style: WindowStyleEx },
    SetIcon { id: u64, data: Vec<IconDatum>, replace: bool },
    SetVisibilityRects { id: u64, offset_x: i32, offset_y: i32, rects: Vec<Rect> },
    SetMinMaxInfo { id: u64, info: MinMaxInfo },
    StartMoveSize { id: u64, kind: MoveSizeKind, x: i32, y: i32 },
    Maximize { id: u64 },
    QueryPointer { id: u64 },
    ButtonRelease { x: i32, y: i32 },
    EnterSeamless,
    LeaveSeamless,
}

/// Backend double that records every call. Clones share the log, so tests
/// can keep one handle while the context owns the other.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    pub calls: Rc<RefCell<Vec<BackendCall>>>,
    pub pointer: Rc<Cell<(i32, i32)>>,
    pub fail_create: Rc<Cell<bool>>,
}

impl RecordingBackend {
    pub fn take(&self) -> Vec<BackendCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    fn push(&self, call: BackendCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl WindowBackend for RecordingBackend {
    fn create_window(&mut self, id: u64, geometry: Geometry, surface_id: u32) -> Result<()> {
        if self.fail_create.get() {
            anyhow::bail!("window creation refused");
        }
        self.push(BackendCall::CreateWindow { id, geometry, surface_id });
        Ok(())
    }

    fn destroy_window(&mut self, id: u64) -> Result<()> {
        self.push(BackendCall::DestroyWindow { id });
        Ok(())
    }

    fn move_window(&mut self, id: u64, geometry: Geometry) -> Result<()> {
        self.push(BackendCall::MoveWindow { id, geometry });
        Ok(())
    }

    fn update_window_area(&mut self, id: u64, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        self.push(BackendCall::UpdateArea { id, x, y, width, height });
        Ok(())
    }

    fn show_window(&mut self, id: u64, state: ShowState) -> Result<()> {
        self.push(BackendCall::ShowWindow { id, state });
        Ok(())
    }

    fn set_title(&mut self, id: u64, title: &str) -> Result<()> {
        self.push(BackendCall::SetTitle { id, title: title.to_string() });
        Ok(())
    }

    fn set_style(&mut self, id: u64, style: WindowStyle, ex_style: WindowStyleEx) -> Result<()> {
        self.push(BackendCall::SetStyle { id, style, ex_style });
        Ok(())
    }

    fn set_icon(&mut self, id: u64, icon: &RailIcon, replace: bool) -> Result<()> {
        self.push(BackendCall::SetIcon { id, data: icon.data().to_vec(), replace });
        Ok(())
    }

    fn set_visibility_rects(
        &mut self,
        id: u64,
        offset_x: i32,
        offset_y: i32,
        rects: &[Rect],
    ) -> Result<()> {
        self.push(BackendCall::SetVisibilityRects { id, offset_x, offset_y, rects: rects.to_vec() });
        Ok(())
    }

    fn set_minmax_info(&mut self, id: u64, info: &MinMaxInfo) -> Result<()> {
        self.push(BackendCall::SetMinMaxInfo { id, info: *info });
        Ok(())
    }

    fn start_interactive_move_size(
        &mut self,
        id: u64,
        kind: MoveSizeKind,
        x: i32,
        y: i32,
    ) -> Result<()> {
        self.push(BackendCall::StartMoveSize { id, kind, x, y });
        Ok(())
    }

    fn send_maximize(&mut self, id: u64) -> Result<()> {
        self.push(BackendCall::Maximize { id });
        Ok(())
    }

    fn query_pointer(&mut self, id: u64) -> Result<(i32, i32)> {
        self.push(BackendCall::QueryPointer { id });
        Ok(self.pointer.get())
    }

    fn send_button_release(&mut self, x: i32, y: i32) -> Result<()> {
        self.push(BackendCall::ButtonRelease { x, y });
        Ok(())
    }

    fn root_position(&mut self, _id: u64, x: i32, y: i32) -> Result<(i32, i32)> {
        // Pretend the window sits at (100, 200) on the root.
        Ok((x + 100, y + 200))
    }

    fn enter_seamless_mode(&mut self) -> Result<()> {
        self.push(BackendCall::EnterSeamless);
        Ok(())
    }

    fn leave_seamless_mode(&mut self) -> Result<()> {
        self.push(BackendCall::LeaveSeamless);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    WindowMove(WindowMove),
    Activate(Activate),
    SystemCommand(SystemCommand),
    StartupCommand,
    Abort(ExecStatus),
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub calls: Rc<RefCell<Vec<TransportCall>>>,
}

impl RecordingTransport {
    pub fn take(&self) -> Vec<TransportCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    fn push(&self, call: TransportCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RailTransport for RecordingTransport {
    fn window_move(&mut self, order: &WindowMove) -> Result<()> {
        self.push(TransportCall::WindowMove(*order));
        Ok(())
    }

    fn activate(&mut self, order: &Activate) -> Result<()> {
        self.push(TransportCall::Activate(*order));
        Ok(())
    }

    fn system_command(&mut self, order: &SystemCommand) -> Result<()> {
        self.push(TransportCall::SystemCommand(*order));
        Ok(())
    }

    fn send_startup_command(&mut self) -> Result<()> {
        self.push(TransportCall::StartupCommand);
        Ok(())
    }

    fn abort_connection(&mut self, status: ExecStatus) -> Result<()> {
        self.push(TransportCall::Abort(status));
        Ok(())
    }
}
