//! Session-scope channel handlers.
//!
//! Events here affect the whole session mode rather than a single window:
//! handshake, the application-start outcome, size constraints, and the
//! outbound activation/system-command helpers.

use tracing::{debug, error, warn};

use crate::error::RailError;
use crate::rail::RailContext;
use crate::rail::orders::{
    Activate, ExecResult, ExecStatus, Handshake, HandshakeEx, MinMaxInfo, SystemCommand,
    SystemParam,
};

impl RailContext {
    /// Server handshake: the channel is ready, send the queued
    /// application-start command.
    pub fn on_handshake(&mut self, handshake: &Handshake) -> Result<(), RailError> {
        debug!("Server handshake, build {}", handshake.build_number);
        self.transport.send_startup_command()?;
        Ok(())
    }

    pub fn on_handshake_ex(&mut self, handshake: &HandshakeEx) -> Result<(), RailError> {
        debug!(
            "Server handshake (ex), build {} flags {:#x}",
            handshake.build_number, handshake.handshake_flags
        );
        self.transport.send_startup_command()?;
        Ok(())
    }

    /// Outcome of the application start. Success switches the session into
    /// seamless mode; any other result is fatal and aborts the connection
    /// with the specific code.
    pub fn on_execute_result(&mut self, result: &ExecResult) -> Result<(), RailError> {
        if result.exec_result == ExecStatus::Ok {
            return self.enable_seamless();
        }

        error!(
            "Remote execute failed: {:?} (status {:#010x})",
            result.exec_result, result.raw_result
        );
        self.transport.abort_connection(result.exec_result)?;
        Err(RailError::ExecFailed(result.exec_result))
    }

    /// Size constraints for one window, forwarded to the windowing system.
    pub fn on_min_max_info(&mut self, info: &MinMaxInfo) -> Result<(), RailError> {
        if self.windows.contains(info.window_id) {
            self.backend.set_minmax_info(info.window_id, info)?;
        }
        Ok(())
    }

    pub fn on_system_param(&mut self, param: &SystemParam) -> Result<(), RailError> {
        // TODO: apply server-pushed system parameters to the local desktop.
        warn!("System param {:#x} not applied", param.param);
        Ok(())
    }

    pub fn on_language_bar_info(&mut self, status: u32) -> Result<(), RailError> {
        warn!("Language bar status {:#x} not implemented", status);
        Ok(())
    }

    pub fn on_get_app_id_response(
        &mut self,
        window_id: u64,
        application_id: &str,
    ) -> Result<(), RailError> {
        warn!(
            "App id response for window 0x{:08x} ({}) not implemented",
            window_id, application_id
        );
        Ok(())
    }

    /// Report a local activation change upstream. Activation re-applies the
    /// window styles first; local focus changes can clobber them.
    pub fn send_activate(&mut self, id: u64, enabled: bool) -> Result<(), RailError> {
        let Some(window) = self.windows.get(id) else {
            return Ok(());
        };
        let window_id =
            u32::try_from(window.window_id).map_err(|_| RailError::WindowIdRange(window.window_id))?;

        if enabled {
            self.backend.set_style(id, window.style, window.ex_style)?;
        }
        self.transport.activate(&Activate { window_id, enabled })?;
        Ok(())
    }

    /// Forward a system command (minimize, restore, close, ...) for one
    /// window. The id must fit the 32-bit order range.
    pub fn send_system_command(&mut self, id: u64, command: u16) -> Result<(), RailError> {
        let window_id = u32::try_from(id).map_err(|_| RailError::WindowIdRange(id))?;
        self.transport.system_command(&SystemCommand { window_id, command })?;
        Ok(())
    }
}
