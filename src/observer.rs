use std::net::SocketAddr;

use bytes::BytesMut;

/// The seam between the protocol engine and the application layer.
///
/// The server hands every decoded message over as opaque bytes and
/// makes no assumption about the payload content; interpretation
/// (structured-data parsing and so on) happens here. A returned
/// payload is framed and written back on the same connection.
pub trait Observer: Send + Sync {
    fn on_message(&self, address: SocketAddr, payload: &[u8]) -> Option<BytesMut>;
}

/// Default observer: log the message text and echo the payload back
/// to the sender.
#[derive(Default, Clone)]
pub struct EchoObserver;

impl Observer for EchoObserver {
    fn on_message(&self, address: SocketAddr, payload: &[u8]) -> Option<BytesMut> {
        log::info!(
            "message: addr={:?}, payload={:?}",
            address,
            String::from_utf8_lossy(payload)
        );

        Some(BytesMut::from(payload))
    }
}
