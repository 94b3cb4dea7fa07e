//! Transport seam between the lifecycle controller and the socket.
//!
//! The controller only sees [`Frame`]s moving through a boxed sink and
//! stream, so the state machine runs unchanged over a real WebSocket
//! ([`WsTransport`]) or an in-memory pair in tests.

mod ws;

pub use ws::WsTransport;

use crate::error::transport::TransportError;

use std::pin::Pin;

use futures_util::future::BoxFuture;
use futures_util::{Sink, Stream};
use url::Url;

/// One transport-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = TransportError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, TransportError>> + Send>>;

/// Opens persistent connections to an endpoint.
pub trait Transport: Send + Sync + 'static {
    /// Open one connection, returning its outbound and inbound halves.
    ///
    /// Dropping both halves must release the connection.
    fn open(
        &self,
        endpoint: &Url,
    ) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>>;
}
