//! Asynchronous fetching loop, feeding results back to the owning thread.

use std::sync::Arc;

use bytes::Bytes;
use egui::ColorImage;
use futures::{
    StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender},
    future::{BoxFuture, Either, select, select_all},
};

use crate::{
    geojson::{DocumentParser, PointFeature},
    icons::{LoadTicket, decode_remote},
    loader::{DocumentError, RemoteIconError},
    marker::MarkerId,
    tiles::Redraw,
};

/// Source of remote bytes.
pub trait Fetch: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>>;

    /// How many fetches may be in flight at once.
    fn max_concurrency(&self) -> usize {
        1
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Work for the background worker.
#[derive(Debug)]
pub(crate) enum Job {
    Document {
        url: String,
    },
    Icon {
        marker: MarkerId,
        ticket: LoadTicket,
        url: String,
    },
}

/// Result of a [`Job`], to be applied on the owning thread.
#[derive(Debug)]
pub(crate) enum Command {
    Document {
        url: String,
        result: Result<Vec<PointFeature>, DocumentError>,
    },
    Icon {
        marker: MarkerId,
        ticket: LoadTicket,
        url: String,
        result: Result<Arc<ColorImage>, RemoteIconError>,
    },
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Job channel from the main thread was broken.")]
    JobChannelBroken,

    #[error("Command channel to the main thread was closed.")]
    CommandChannelClosed,
}

async fn fetch_document(
    fetch: &dyn Fetch,
    parser: &dyn DocumentParser,
    url: &str,
) -> Result<Vec<PointFeature>, DocumentError> {
    let bytes = fetch.fetch(url).await?;
    Ok(parser.parse(std::str::from_utf8(&bytes)?)?)
}

async fn fetch_icon(fetch: &dyn Fetch, url: &str) -> Result<Arc<ColorImage>, RemoteIconError> {
    let bytes = fetch.fetch(url).await?;
    Ok(Arc::new(decode_remote(url, &bytes)?))
}

async fn run(fetch: &dyn Fetch, parser: &dyn DocumentParser, job: Job) -> Command {
    match job {
        Job::Document { url } => {
            let result = fetch_document(fetch, parser, &url).await;
            Command::Document { url, result }
        }
        Job::Icon {
            marker,
            ticket,
            url,
        } => {
            let result = fetch_icon(fetch, &url).await;
            Command::Icon {
                marker,
                ticket,
                url,
                result,
            }
        }
    }
}

fn deliver(
    command_tx: &UnboundedSender<Command>,
    redraw: &dyn Redraw,
    command: Command,
) -> Result<(), Error> {
    command_tx
        .unbounded_send(command)
        .map_err(|_| Error::CommandChannelClosed)?;

    // Wake up the owning thread, so it picks the command up.
    redraw.request_redraw();
    Ok(())
}

async fn fetch_continuously_impl(
    fetch: Arc<dyn Fetch>,
    parser: Arc<dyn DocumentParser>,
    mut job_rx: UnboundedReceiver<Job>,
    command_tx: UnboundedSender<Command>,
    redraw: Arc<dyn Redraw>,
) -> Result<(), Error> {
    let mut outstanding = Vec::new();

    loop {
        if outstanding.is_empty() {
            // Only new jobs might arrive.
            let job = job_rx.next().await.ok_or(Error::JobChannelBroken)?;
            outstanding.push(Box::pin(run(fetch.as_ref(), parser.as_ref(), job)));
        } else if outstanding.len() < fetch.max_concurrency() {
            // New jobs might arrive or ongoing ones might be completed.
            match select(job_rx.next(), select_all(outstanding.drain(..))).await {
                Either::Left((job, remaining)) => {
                    let job = job.ok_or(Error::JobChannelBroken)?;
                    outstanding = remaining.into_inner();
                    outstanding.push(Box::pin(run(fetch.as_ref(), parser.as_ref(), job)));
                }
                Either::Right(((command, _, remaining), _)) => {
                    deliver(&command_tx, redraw.as_ref(), command)?;
                    outstanding = remaining;
                }
            }
        } else {
            // Only ongoing jobs might be completed.
            let (command, _, remaining) = select_all(outstanding.drain(..)).await;
            deliver(&command_tx, redraw.as_ref(), command)?;
            outstanding = remaining;
        }
    }
}

/// Continuously run jobs received via the job channel.
pub(crate) async fn fetch_continuously(
    fetch: Arc<dyn Fetch>,
    parser: Arc<dyn DocumentParser>,
    job_rx: UnboundedReceiver<Job>,
    command_tx: UnboundedSender<Command>,
    redraw: Arc<dyn Redraw>,
) {
    // Both channels break only when the view goes away.
    if let Err(error) = fetch_continuously_impl(fetch, parser, job_rx, command_tx, redraw).await {
        log::debug!("Fetch loop finished: {error}");
    }
}
