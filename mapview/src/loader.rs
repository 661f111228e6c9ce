//! Background loading of marker documents and icons.

use std::{str::Utf8Error, sync::Arc};

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};

use crate::{
    geojson::{DocumentParser, ParseError},
    icons::IconError,
    io::{Command, Fetch, FetchError, Job, fetch_continuously, runtime::Runtime},
    tiles::Redraw,
};

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("could not fetch the document: {0}")]
    Fetch(#[from] FetchError),

    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),

    #[error("JSON parsed was invalid: {0}")]
    Parse(#[from] ParseError),
}

#[derive(thiserror::Error, Debug)]
pub enum RemoteIconError {
    #[error("could not fetch the icon: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Icon(#[from] IconError),
}

struct Worker {
    // Dropped first, which ends the fetch loop.
    job_tx: UnboundedSender<Job>,
    command_rx: UnboundedReceiver<Command>,
    _runtime: Runtime,
}

/// Hands jobs to a background worker, started on the first job, and collects their results.
pub(crate) struct Loader {
    fetch: Arc<dyn Fetch>,
    parser: Arc<dyn DocumentParser>,
    redraw: Arc<dyn Redraw>,
    worker: Option<Worker>,
}

impl Loader {
    pub fn new(
        fetch: Arc<dyn Fetch>,
        parser: Arc<dyn DocumentParser>,
        redraw: Arc<dyn Redraw>,
    ) -> Self {
        Self {
            fetch,
            parser,
            redraw,
            worker: None,
        }
    }

    /// Replace the fetcher. A running worker is stopped, along with the jobs it had.
    pub fn set_fetch(&mut self, fetch: Arc<dyn Fetch>) {
        self.fetch = fetch;
        self.worker = None;
    }

    /// Replace the parser. A running worker is stopped, along with the jobs it had.
    pub fn set_parser(&mut self, parser: Arc<dyn DocumentParser>) {
        self.parser = parser;
        self.worker = None;
    }

    pub fn parser(&self) -> &dyn DocumentParser {
        self.parser.as_ref()
    }

    pub fn submit(&mut self, job: Job) {
        let worker = self.worker.get_or_insert_with(|| {
            log::debug!("Starting the IO worker.");
            let (job_tx, job_rx) = unbounded();
            let (command_tx, command_rx) = unbounded();

            let runtime = Runtime::new(fetch_continuously(
                self.fetch.clone(),
                self.parser.clone(),
                job_rx,
                command_tx,
                self.redraw.clone(),
            ));

            Worker {
                job_tx,
                command_rx,
                _runtime: runtime,
            }
        });

        if let Err(error) = worker.job_tx.unbounded_send(job) {
            log::error!("IO worker is gone, dropping {:?}.", error.into_inner());
        }
    }

    /// Results which arrived since last call.
    pub fn drain(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();

        if let Some(worker) = &mut self.worker {
            while let Ok(Some(command)) = worker.command_rx.try_next() {
                commands.push(command);
            }
        }

        commands
    }
}
