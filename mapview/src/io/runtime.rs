//! Managed thread for an IO runtime.

use std::thread::JoinHandle;

use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

/// Tokio runtime living in its own thread, running a single future until dropped.
pub(crate) struct Runtime {
    join_handle: Option<JoinHandle<()>>,
    quit_tx: UnboundedSender<()>,
}

impl Runtime {
    pub fn new<F>(f: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (quit_tx, mut quit_rx) = unbounded_channel();

        let spawned = std::thread::Builder::new()
            .name("mapview-io".to_owned())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        log::error!("Could not create the Tokio runtime, nothing will load: {e}.");
                        return;
                    }
                };

                runtime.spawn(f);
                runtime.block_on(quit_rx.recv());
            });

        let join_handle = spawned
            .inspect_err(|e| log::error!("Could not spawn the IO thread: {e}."))
            .ok();

        Self {
            join_handle,
            quit_tx,
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // Thread might be dead, nothing to do in this case.
        let _ = self.quit_tx.send(());

        if let Some(join_handle) = self.join_handle.take() {
            log::debug!("Waiting for the IO thread to exit.");
            let _ = join_handle.join();
        }

        log::debug!("IO thread is down.");
    }
}
