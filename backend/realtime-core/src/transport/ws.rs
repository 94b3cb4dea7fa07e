//! WebSocket transport over `tokio-tungstenite`.

use crate::error::transport::TransportError;
use crate::transport::{Frame, FrameSink, FrameStream, Transport};

use futures_util::future::{BoxFuture, ready};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

/// Default transport: one `connect_async` handshake per open.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WsTransport {
    fn open(
        &self,
        endpoint: &Url,
    ) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>> {
        let endpoint = endpoint.to_string();

        Box::pin(async move {
            debug!("Opening WebSocket to {endpoint}");

            let (ws_stream, response) = connect_async(endpoint.as_str())
                .await
                .map_err(|e| {
                    TransportError::connect(format!("WebSocket handshake with {endpoint} failed: {e}"))
                })?;

            info!(
                "WebSocket handshake with {endpoint} completed (HTTP {})",
                response.status()
            );

            let (write, read) = ws_stream.split();

            let sink: FrameSink = Box::pin(
                write
                    .sink_map_err(|e: WsError| TransportError::send(e.to_string()))
                    .with(|frame: Frame| ready(Ok::<Message, TransportError>(into_message(frame)))),
            );

            let stream: FrameStream = Box::pin(read.filter_map(|message| {
                ready(match message {
                    Ok(message) => from_message(message).map(Ok),
                    Err(e) => Some(Err(TransportError::receive(e.to_string()))),
                })
            }));

            Ok((sink, stream))
        })
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Ping(data) => Message::Ping(data.into()),
        Frame::Pong(data) => Message::Pong(data.into()),
        Frame::Close => Message::Close(None),
    }
}

/// Binary frames holding UTF-8 are treated as text; everything else binary is skipped.
fn from_message(message: Message) -> Option<Frame> {
    match message {
        Message::Text(text) => Some(Frame::Text(text.as_str().to_owned())),
        Message::Binary(data) => match String::from_utf8(data.to_vec()) {
            Ok(text) => Some(Frame::Text(text)),
            Err(_) => {
                debug!("Skipping non-UTF-8 binary frame ({} bytes)", data.len());
                None
            }
        },
        Message::Ping(data) => Some(Frame::Ping(data.to_vec())),
        Message::Pong(data) => Some(Frame::Pong(data.to_vec())),
        Message::Close(_) => Some(Frame::Close),
        Message::Frame(_) => None,
    }
}
