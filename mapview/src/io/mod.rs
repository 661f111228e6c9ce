mod fetch;
pub mod http;
pub(crate) mod runtime;

pub(crate) use fetch::{Command, Job, fetch_continuously};
pub use fetch::{Fetch, FetchError};
pub use http::{HeaderValue, HttpFetch, HttpOptions, MaxParallelDownloads};
