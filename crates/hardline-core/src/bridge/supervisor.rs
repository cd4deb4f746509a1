//! Pipeline supervision
//!
//! Launches both directional pipelines as threads and restarts them together
//! whenever either one fails. A signal-originated shutdown is classified
//! apart from failures and ends the process instead of restarting.

use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use super::{command, control::Control, telemetry, BridgeConfig, RESTART_DELAY};
use crate::protocol::BridgeError;

type PipelineExit = (&'static str, Result<(), BridgeError>);

/// Runs the bridge: both pipelines, restart-on-failure, clean shutdown
pub struct Supervisor {
    config: BridgeConfig,
    control: Arc<Control>,
}

impl Supervisor {
    /// Create a supervisor for the given configuration
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            control: Arc::new(Control::new()),
        }
    }

    /// Shared control handle for signal-handling glue.
    ///
    /// Calling [`Control::shutdown`] on it stops the bridge: listeners are
    /// closed, blocked reads unblock, and [`Supervisor::run`] returns `Ok`.
    pub fn control(&self) -> Arc<Control> {
        Arc::clone(&self.control)
    }

    /// Run until shutdown is requested.
    ///
    /// Any pipeline failure tears the other pipeline down too and relaunches
    /// both from scratch. There is no partial restart, at the accepted cost
    /// of dropping the healthy side's client connection.
    pub fn run(&self) -> Result<(), BridgeError> {
        info!(
            "bridge starting: {} <-> tlm:{} cmd:{}",
            self.config.serial_port, self.config.telemetry_port, self.config.command_port
        );

        loop {
            let result = self.run_once(telemetry::run, command::run);
            self.control.reset_run();

            if self.control.shutting_down() {
                info!("bridge shut down");
                return Ok(());
            }

            match result {
                Ok(()) => warn!("pipelines exited without error; restarting both"),
                Err(err) => error!("pipeline failed: {err}; restarting both pipelines"),
            }

            if !self.control.sleep(RESTART_DELAY) {
                info!("bridge shut down");
                return Ok(());
            }
        }
    }

    /// Launch one pair of pipelines and wait for the run to end.
    ///
    /// Returns the first pipeline's exit result; by the time this returns,
    /// both threads have been joined and every registered socket torn down.
    fn run_once<F1, F2>(&self, tlm: F1, cmd: F2) -> Result<(), BridgeError>
    where
        F1: FnOnce(&BridgeConfig, &Control) -> Result<(), BridgeError> + Send + 'static,
        F2: FnOnce(&BridgeConfig, &Control) -> Result<(), BridgeError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PipelineExit>();

        let tlm_handle = self.spawn_pipeline("telemetry", tlm, tx.clone())?;
        let cmd_handle = match self.spawn_pipeline("commands", cmd, tx) {
            Ok(handle) => handle,
            Err(err) => {
                self.control.halt_run();
                let _ = tlm_handle.join();
                return Err(err);
            }
        };

        let (name, first) = match rx.recv() {
            Ok(exit) => exit,
            Err(_) => (
                "supervisor",
                Err(BridgeError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "pipeline exited without reporting",
                ))),
            ),
        };
        debug!("{name} pipeline exited first");

        // Tear the other side down so the run ends as a unit
        self.control.halt_run();

        if tlm_handle.join().is_err() {
            error!("telemetry pipeline panicked");
        }
        if cmd_handle.join().is_err() {
            error!("command pipeline panicked");
        }

        first
    }

    fn spawn_pipeline<F>(
        &self,
        name: &'static str,
        pipeline: F,
        tx: mpsc::Sender<PipelineExit>,
    ) -> Result<JoinHandle<()>, BridgeError>
    where
        F: FnOnce(&BridgeConfig, &Control) -> Result<(), BridgeError> + Send + 'static,
    {
        let config = self.config.clone();
        let control = Arc::clone(&self.control);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let result = pipeline(&config, &control);
                if let Err(err) = &result {
                    debug!("{name} pipeline stopped: {err}");
                }
                let _ = tx.send((name, result));
            })
            .map_err(BridgeError::Io)?;
        Ok(handle)
    }
}
