//! Test doubles shared by unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    sources::TileSourceDescriptor,
    tiles::{Redraw, TileLayer, TileProvider},
};

#[derive(Default)]
pub struct RedrawCounter(AtomicUsize);

impl RedrawCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Redraw for RedrawCounter {
    fn request_redraw(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

type Sources = Arc<Mutex<Vec<Arc<TileSourceDescriptor>>>>;

/// Tile layer remembering every source it was given. Clones share the history.
#[derive(Clone, Default)]
pub struct RecordingTileLayer {
    pub adopted: Sources,
    pub provider: RecordingProvider,
}

impl TileLayer for RecordingTileLayer {
    fn set_tile_source(&mut self, source: Arc<TileSourceDescriptor>) {
        self.adopted.lock().unwrap().push(source);
    }

    fn tile_provider(&mut self) -> &mut dyn TileProvider {
        &mut self.provider
    }
}

#[derive(Clone, Default)]
pub struct RecordingProvider {
    pub pushed: Sources,
}

impl TileProvider for RecordingProvider {
    fn set_tile_source(&mut self, source: Arc<TileSourceDescriptor>) {
        self.pushed.lock().unwrap().push(source);
    }
}

/// Serves canned responses, keyed by URL.
#[derive(Default)]
pub struct StaticFetch {
    responses: std::collections::HashMap<String, Result<bytes::Bytes, String>>,
}

impl StaticFetch {
    pub fn with(mut self, url: &str, response: Result<&'static [u8], &str>) -> Self {
        self.responses.insert(
            url.to_owned(),
            response
                .map(bytes::Bytes::from_static)
                .map_err(ToOwned::to_owned),
        );
        self
    }
}

impl crate::io::Fetch for StaticFetch {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> futures::future::BoxFuture<'a, Result<bytes::Bytes, crate::io::FetchError>> {
        let response = match self.responses.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(error)) => Err(crate::io::FetchError::Other(error.clone())),
            None => Err(crate::io::FetchError::Other(format!("no response for {url}"))),
        };
        Box::pin(futures::future::ready(response))
    }
}
