//! Local move/resize coordination.
//!
//! A locally initiated drag or resize runs through a three-state handshake
//! with the remote host: the server starts the gesture, the windowing
//! system drives it, and the end transition re-synchronizes both sides
//! before the confirming window order arrives.

use tracing::{debug, warn};

use crate::error::RailError;
use crate::rail::RailContext;
use crate::rail::backend::{RailTransport, WindowBackend};
use crate::rail::orders::{LocalMoveSize, WindowMove};
use crate::rail::window::{AppWindow, LocalMoveState, MoveSizeKind};
use crate::shared::Geometry;

impl RailContext {
    /// Server request to begin or end a local interactive move/size.
    pub fn on_local_move_size(&mut self, order: &LocalMoveSize) -> Result<(), RailError> {
        let Some(window) = self.windows.get_mut(order.window_id) else {
            debug!("Local move/size for unknown window 0x{:08x}", order.window_id);
            return Ok(());
        };

        if order.is_start {
            start_local_move_size(window, self.backend.as_mut(), order)
        } else {
            end_local_move_size(window, self.backend.as_mut(), self.transport.as_mut())
        }
    }

    /// Observed-geometry report from the windowing glue (configure events).
    ///
    /// Completes a terminating gesture, and outside any gesture runs the
    /// drift check — window-manager moves never pass through the move/size
    /// handshake, so this is how they reach the remote host.
    pub fn notify_local_geometry(&mut self, id: u64, geometry: Geometry) -> Result<(), RailError> {
        let Some(window) = self.windows.get_mut(id) else {
            return Ok(());
        };
        window.local = geometry;

        match window.local_move {
            LocalMoveState::Terminating => {
                window.local_move = LocalMoveState::NotActive;
                Ok(())
            }
            LocalMoveState::NotActive => adjust_position(window, self.transport.as_mut()),
            LocalMoveState::InProgress(_) => Ok(()),
        }
    }

    /// Map-state report from the windowing glue.
    pub fn notify_window_mapped(&mut self, id: u64, mapped: bool) {
        if let Some(window) = self.windows.get_mut(id) {
            window.mapped = mapped;
        }
    }

    /// Drift reconciliation for one window, safe to call periodically.
    pub fn adjust_position(&mut self, id: u64) -> Result<(), RailError> {
        let Some(window) = self.windows.get(id) else {
            return Ok(());
        };
        adjust_position(window, self.transport.as_mut())
    }
}

fn start_local_move_size(
    window: &mut AppWindow,
    backend: &mut dyn WindowBackend,
    order: &LocalMoveSize,
) -> Result<(), RailError> {
    // A plain move carries a window-relative start position; everything
    // else is already in screen coordinates.
    let (x, y) = match order.kind {
        MoveSizeKind::Move => {
            backend.root_position(window.window_id, i32::from(order.pos_x), i32::from(order.pos_y))?
        }
        _ => (i32::from(order.pos_x), i32::from(order.pos_y)),
    };

    if order.kind.is_keyboard() {
        // Tracked, but the interactive grab handling for keyboard gestures
        // is incomplete.
        warn!(
            "Keyboard move/size for window 0x{:08x} is only partially supported",
            window.window_id
        );
    }

    debug!(
        "Starting local {:?} for window 0x{:08x} at ({}, {})",
        order.kind, window.window_id, x, y
    );
    window.local_move = LocalMoveState::InProgress(order.kind);
    backend.start_interactive_move_size(window.window_id, order.kind, x, y)?;
    Ok(())
}

fn end_local_move_size(
    window: &mut AppWindow,
    backend: &mut dyn WindowBackend,
    transport: &mut dyn RailTransport,
) -> Result<(), RailError> {
    let LocalMoveState::InProgress(kind) = window.local_move else {
        debug!(
            "End of local move/size for window 0x{:08x} with no gesture in progress",
            window.window_id
        );
        return Ok(());
    };

    // Keyboard gestures have no continuous geometry sync; send one explicit
    // update computed from the local geometry and the resize margins.
    if kind.is_keyboard() {
        if let Some(order) = window_move_order(window) {
            transport.window_move(&order)?;
        }
    }

    // Simulate a button release at the current pointer position to end the
    // windowing system's interactive grab. Keyboard gestures never get
    // synthesized pointer input.
    let (x, y) = backend.query_pointer(window.window_id)?;
    if !kind.is_keyboard() {
        backend.send_button_release(x, y)?;
    }

    // Proactively adopt the local geometry as the authoritative one.
    // Surface updates for the new size can arrive before the confirming
    // window order; without this they would land against stale geometry.
    window.window_offset_x = window.local.x;
    window.window_offset_y = window.local.y;
    window.window_width = window.local.width;
    window.window_height = window.local.height;
    window.local_move = LocalMoveState::Terminating;

    debug!(
        "Local move/size for window 0x{:08x} terminating at {:?}",
        window.window_id, window.local
    );
    Ok(())
}

/// Drift check: report the local geometry upstream when it disagrees with
/// the remote one and no gesture is active.
fn adjust_position(window: &AppWindow, transport: &mut dyn RailTransport) -> Result<(), RailError> {
    if !window.mapped || window.local_move != LocalMoveState::NotActive {
        return Ok(());
    }
    if window.matches_remote_geometry() {
        return Ok(());
    }
    if let Some(order) = window_move_order(window) {
        transport.window_move(&order)?;
    }
    Ok(())
}

/// Outbound geometry for the window: local geometry widened by the resize
/// margins, right/bottom one past the window edge.
fn window_move_order(window: &AppWindow) -> Option<WindowMove> {
    let Ok(window_id) = u32::try_from(window.window_id) else {
        warn!("Window id 0x{:x} does not fit a move order", window.window_id);
        return None;
    };

    let edge = |v: i32| i16::try_from(v).ok();
    let left = edge(window.local.x - window.resize_margin_left);
    let top = edge(window.local.y - window.resize_margin_top);
    let right = edge(window.local.x + window.local.width as i32 + window.resize_margin_right);
    let bottom = edge(window.local.y + window.local.height as i32 + window.resize_margin_bottom);

    let (Some(left), Some(top), Some(right), Some(bottom)) = (left, top, right, bottom) else {
        warn!(
            "Window 0x{:08x} geometry does not fit the move order range",
            window.window_id
        );
        return None;
    };

    Some(WindowMove { window_id, left, top, right, bottom })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rail::mock::{BackendCall, RecordingBackend, RecordingTransport, TransportCall};
    use crate::rail::orders::{OrderInfo, WindowUpdate};
    use crate::rail::window::ResizeDirection;
    use crate::settings::RailSettings;

    fn new_context() -> (RailContext, RecordingBackend, RecordingTransport) {
        let backend = RecordingBackend::default();
        let transport = RecordingTransport::default();
        let context = RailContext::new(
            RailSettings::default(),
            Box::new(backend.clone()),
            Box::new(transport.clone()),
        );
        (context, backend, transport)
    }

    fn add_window(context: &mut RailContext, id: u64, x: i32, y: i32, width: u32, height: u32) {
        let update = WindowUpdate {
            window_offset: Some((x, y)),
            window_size: Some((width, height)),
            ..Default::default()
        };
        context.on_window_order(&OrderInfo::new_window(id), &update).unwrap();
    }

    fn move_size(window_id: u64, kind: MoveSizeKind, is_start: bool, x: i16, y: i16) -> LocalMoveSize {
        LocalMoveSize { window_id, kind, is_start, pos_x: x, pos_y: y }
    }

    #[test]
    fn test_move_start_translates_to_root_coordinates() {
        let (mut context, backend, _transport) = new_context();
        add_window(&mut context, 9, 10, 10, 20, 20);
        backend.take();

        context
            .on_local_move_size(&move_size(9, MoveSizeKind::Move, true, 5, 6))
            .unwrap();

        // The mock backend places the window at (100, 200) on the root.
        assert_eq!(
            backend.take(),
            vec![BackendCall::StartMoveSize { id: 9, kind: MoveSizeKind::Move, x: 105, y: 206 }]
        );
        assert!(matches!(
            context.windows().get(9).unwrap().local_move,
            LocalMoveState::InProgress(MoveSizeKind::Move)
        ));
    }

    #[test]
    fn test_resize_start_keeps_screen_coordinates() {
        let (mut context, backend, _transport) = new_context();
        add_window(&mut context, 9, 10, 10, 20, 20);
        backend.take();

        let kind = MoveSizeKind::Resize(ResizeDirection::BottomRight);
        context.on_local_move_size(&move_size(9, kind, true, 30, 30)).unwrap();

        assert_eq!(
            backend.take(),
            vec![BackendCall::StartMoveSize { id: 9, kind, x: 30, y: 30 }]
        );
    }

    #[test]
    fn test_end_adopts_local_geometry_and_releases_button() {
        let (mut context, backend, _transport) = new_context();
        add_window(&mut context, 9, 10, 10, 20, 20);

        context
            .on_local_move_size(&move_size(9, MoveSizeKind::Move, true, 10, 10))
            .unwrap();

        // The user dragged the window to (50, 60)-(150, 110).
        context.notify_local_geometry(9, Geometry::new(50, 60, 100, 50)).unwrap();
        backend.pointer.set((55, 66));
        backend.take();

        context
            .on_local_move_size(&move_size(9, MoveSizeKind::Move, false, 0, 0))
            .unwrap();

        let window = context.windows().get(9).unwrap();
        assert_eq!(window.remote_geometry(), Geometry::new(50, 60, 100, 50));
        assert_eq!(window.local_move, LocalMoveState::Terminating);

        let calls = backend.take();
        assert!(calls.contains(&BackendCall::QueryPointer { id: 9 }));
        assert!(calls.contains(&BackendCall::ButtonRelease { x: 55, y: 66 }));

        // The settle report completes the handshake.
        context.notify_local_geometry(9, Geometry::new(50, 60, 100, 50)).unwrap();
        assert_eq!(
            context.windows().get(9).unwrap().local_move,
            LocalMoveState::NotActive
        );
    }

    #[test]
    fn test_keyboard_end_sends_explicit_move_and_no_pointer_input() {
        let (mut context, backend, transport) = new_context();
        add_window(&mut context, 9, 10, 10, 20, 20);

        context
            .on_local_move_size(&move_size(9, MoveSizeKind::KeyboardMove, true, 10, 10))
            .unwrap();
        context.notify_local_geometry(9, Geometry::new(50, 60, 100, 50)).unwrap();
        backend.take();
        transport.take();

        context
            .on_local_move_size(&move_size(9, MoveSizeKind::KeyboardMove, false, 0, 0))
            .unwrap();

        assert_eq!(
            transport.take(),
            vec![TransportCall::WindowMove(WindowMove {
                window_id: 9,
                left: 50,
                top: 60,
                right: 150,
                bottom: 110,
            })]
        );

        let calls = backend.take();
        assert!(calls.contains(&BackendCall::QueryPointer { id: 9 }));
        assert!(!calls.iter().any(|c| matches!(c, BackendCall::ButtonRelease { .. })));
    }

    #[test]
    fn test_drift_is_reported_with_resize_margins() {
        let (mut context, backend, transport) = new_context();
        add_window(&mut context, 7, 0, 0, 100, 50);

        let update = WindowUpdate {
            resize_margin_x: Some((4, 6)),
            resize_margin_y: Some((2, 8)),
            ..Default::default()
        };
        context.on_window_order(&OrderInfo::new(7), &update).unwrap();
        context.notify_window_mapped(7, true);
        backend.take();

        // The window manager moved the window; no gesture was involved.
        context.notify_local_geometry(7, Geometry::new(10, 20, 100, 50)).unwrap();

        assert_eq!(
            transport.take(),
            vec![TransportCall::WindowMove(WindowMove {
                window_id: 7,
                left: 6,
                top: 18,
                right: 116,
                bottom: 78,
            })]
        );
    }

    #[test]
    fn test_drift_check_is_silent_while_gesture_active() {
        let (mut context, _backend, transport) = new_context();
        add_window(&mut context, 7, 0, 0, 100, 50);
        context.notify_window_mapped(7, true);

        context
            .on_local_move_size(&move_size(7, MoveSizeKind::Move, true, 0, 0))
            .unwrap();
        context.notify_local_geometry(7, Geometry::new(40, 40, 100, 50)).unwrap();

        assert!(transport.take().is_empty());
    }

    #[test]
    fn test_drift_check_is_silent_when_geometry_matches() {
        let (mut context, _backend, transport) = new_context();
        add_window(&mut context, 7, 0, 0, 100, 50);
        context.notify_window_mapped(7, true);

        context.notify_local_geometry(7, Geometry::new(0, 0, 100, 50)).unwrap();
        assert!(transport.take().is_empty());
    }

    #[test]
    fn test_drift_check_is_silent_while_unmapped() {
        let (mut context, _backend, transport) = new_context();
        add_window(&mut context, 7, 0, 0, 100, 50);

        context.notify_local_geometry(7, Geometry::new(30, 30, 100, 50)).unwrap();
        assert!(transport.take().is_empty());
    }

    #[test]
    fn test_end_without_start_is_benign() {
        let (mut context, backend, _transport) = new_context();
        add_window(&mut context, 7, 0, 0, 100, 50);
        backend.take();

        context
            .on_local_move_size(&move_size(7, MoveSizeKind::Move, false, 0, 0))
            .unwrap();
        assert!(backend.take().is_empty());
    }

    #[test]
    fn test_unknown_window_is_benign() {
        let (mut context, backend, _transport) = new_context();

        context
            .on_local_move_size(&move_size(404, MoveSizeKind::Move, true, 0, 0))
            .unwrap();
        assert!(backend.take().is_empty());
    }
}
