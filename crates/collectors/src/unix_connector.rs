// SPDX-License-Identifier: MIT

//! A `tower::Service` that dials a fixed local Unix socket path regardless
//! of the URI it is asked to connect, analogous to rewiring a transport's
//! dial function.

use hyper_util::rt::TokioIo;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::net::UnixStream;
use tower::Service;

#[derive(Clone)]
pub(crate) struct UnixConnector {
    socket_path: PathBuf,
}

impl UnixConnector {
    pub(crate) fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }
}

impl Service<hyper::Uri> for UnixConnector {
    type Response = TokioIo<UnixStream>;
    type Error = std::io::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _uri: hyper::Uri) -> Self::Future {
        let socket_path = self.socket_path.clone();
        Box::pin(async move { Ok(TokioIo::new(UnixStream::connect(socket_path).await?)) })
    }
}
