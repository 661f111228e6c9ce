//! HTTP server for tests. Requests need to be anticipated, and are answered only when the test
//! says so.

use http_body_util::Full;
use hyper::{Request, Response, body::Incoming, server::conn::http1, service::Service};
use hyper_util::rt::TokioIo;
use std::{
    collections::HashMap,
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot};

pub use hyper::{StatusCode, body::Bytes};

type Reply = Response<Full<Bytes>>;

struct Anticipation {
    request_tx: oneshot::Sender<Request<()>>,
    reply_rx: oneshot::Receiver<Reply>,
}

#[derive(Default)]
struct State {
    anticipations: HashMap<String, Anticipation>,
    unexpected: Vec<String>,
}

/// Mock HTTP server, bound to a random local port.
pub struct Server {
    port: u16,
    state: Arc<Mutex<State>>,
}

impl Server {
    pub async fn bind() -> Server {
        let state = Arc::new(Mutex::new(State::default()));

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        log::info!("Listening on {port}.");

        let state_clone = state.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);

                let state = state_clone.clone();
                tokio::task::spawn(async move {
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(io, Connection { state })
                        .await
                    {
                        log::warn!("Connection failed: {e}.");
                    }
                });
            }
        });

        Server { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Anticipate a request for `path`. Anything else gets `418 I'm a teapot`, and makes the
    /// server panic when dropped.
    pub async fn anticipate(&self, path: impl Into<String>) -> Anticipated {
        let path = path.into();
        log::info!("Anticipating '{path}'.");

        let (request_tx, request_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.state.lock().unwrap().anticipations.insert(
            path.clone(),
            Anticipation {
                request_tx,
                reply_rx,
            },
        );

        Anticipated {
            path,
            request_rx: Some(request_rx),
            reply_tx,
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let state = self.state.lock().unwrap();
        if !state.unexpected.is_empty() && !std::thread::panicking() {
            panic!("there are unexpected requests: {:?}", state.unexpected);
        }
    }
}

/// Request which is anticipated, or already arrived.
pub struct Anticipated {
    path: String,
    request_rx: Option<oneshot::Receiver<Request<()>>>,
    reply_tx: oneshot::Sender<Reply>,
}

impl Anticipated {
    /// Wait for the request to arrive.
    pub async fn expect(&mut self) -> Request<()> {
        let request_rx = self
            .request_rx
            .take()
            .expect("request can be expected only once");
        request_rx.await.unwrap()
    }

    /// Respond with `200 OK` and given body. The request does not need to be there yet.
    pub async fn respond(self, body: impl Into<Bytes>) {
        self.reply(Response::new(Full::new(body.into())));
    }

    pub async fn respond_with_status(self, status: StatusCode) {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        self.reply(response);
    }

    fn reply(self, response: Reply) {
        log::info!("Responding to '{}' with {}.", self.path, response.status());
        if self.reply_tx.send(response).is_err() {
            log::warn!("Client gave up on '{}'.", self.path);
        }
    }
}

struct Connection {
    state: Arc<Mutex<State>>,
}

impl Service<Request<Incoming>> for Connection {
    type Response = Reply;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<Incoming>) -> Self::Future {
        log::info!("Incoming request '{}'.", request.uri());
        let state = self.state.clone();

        Box::pin(async move {
            let path = request.uri().path().to_owned();
            let anticipation = state.lock().unwrap().anticipations.remove(&path);

            let Some(anticipation) = anticipation else {
                log::warn!("Unexpected '{}'.", request.uri());
                state.lock().unwrap().unexpected.push(request.uri().to_string());
                let mut response = Response::new(Full::new(Bytes::from_static(b"unexpected")));
                *response.status_mut() = StatusCode::IM_A_TEAPOT;
                return Ok(response);
            };

            let (parts, _) = request.into_parts();
            // Test might not care about the request itself.
            let _ = anticipation.request_tx.send(Request::from_parts(parts, ()));

            match anticipation.reply_rx.await {
                Ok(response) => Ok(response),
                Err(_) => {
                    let mut response = Response::new(Full::new(Bytes::new()));
                    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
                    Ok(response)
                }
            }
        })
    }
}
