// Status WebSocket transport
//
// One call opens one session on `/ws/status` and hands back a stream of
// text frames. Reconnection, backoff and decoding live in
// `dmxnode-core`; this module only knows how to shake hands and read.

use std::pin::Pin;
use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tracing::{debug, info, trace};
use url::Url;

use crate::error::Error;

/// Text frames from one open session.
///
/// Ends (`None`) on a close frame or when the peer goes away; a read
/// error is yielded once and then the stream ends. Dropping the stream
/// closes the socket.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Open a status session.
///
/// The handshake is bounded by `timeout`. When `bearer` is given it is
/// sent as `Authorization: Bearer` on the upgrade request.
pub async fn connect(
    url: &Url,
    timeout: Duration,
    bearer: Option<&str>,
) -> Result<FrameStream, Error> {
    info!(url = %url, "connecting to status socket");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = bearer {
        request = request.with_header("Authorization", format!("Bearer {token}"));
    }

    let (mut ws, _response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request))
        .await
        .map_err(|_| Error::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })?
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    info!("status socket open");

    let frames = async_stream::stream! {
        while let Some(frame) = ws.next().await {
            match frame {
                Ok(tungstenite::Message::Text(text)) => {
                    trace!(len = text.len(), "status frame");
                    yield Ok(text.as_str().to_owned());
                }
                Ok(tungstenite::Message::Ping(_)) => {
                    // tungstenite answers pings itself
                    trace!("status socket ping");
                }
                Ok(tungstenite::Message::Close(frame)) => {
                    match frame {
                        Some(cf) => info!(code = %cf.code, reason = %cf.reason, "status socket closed by device"),
                        None => info!("status socket closed by device"),
                    }
                    break;
                }
                Ok(_) => {
                    debug!("ignoring non-text status frame");
                }
                Err(e) => {
                    yield Err(Error::WebSocketConnect(e.to_string()));
                    break;
                }
            }
        }
    };

    Ok(Box::pin(frames))
}
