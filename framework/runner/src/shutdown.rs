use tokio::signal;

pub(crate) use loadcheck_core::prelude::{ShutdownHandle, ShutdownSignalError};

/// Trigger a shutdown of the run when the user presses Ctrl-C.
pub(crate) fn start_shutdown_listener(runtime: &tokio::runtime::Runtime) -> ShutdownHandle {
    let handle = ShutdownHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("Received shutdown signal, shutting down...");
                listener_handle.shutdown();
            }
            Err(e) => {
                log::error!("Failed to listen for Ctrl-C, the run can only end by duration: {e:?}");
            }
        }
    });

    handle
}
