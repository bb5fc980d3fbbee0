use crate::{config::Config, observer::Observer};

use std::{net::SocketAddr, sync::Arc};

use bytes::BytesMut;
use codec::{
    Error,
    frame::{self, Frame, Opcode},
    handshake,
};
use tokio::{
    io::AsyncReadExt,
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};

/// The largest frame a client can produce: the 4 byte header, the mask
/// key and a full 16-bit payload.
pub const MAX_FRAME_SIZE: usize = 4 + frame::MASK_KEY_SIZE + frame::MAX_PAYLOAD_SIZE;

/// Upgrade request heads larger than this are rejected outright.
const MAX_REQUEST_SIZE: usize = 8192;

/// websocket server
///
/// Binds one TCP listener per configured interface and handles every
/// connection on its own task, so a failing connection never takes
/// down the others.
pub async fn run<T>(config: Arc<Config>, observer: T) -> Result<(), anyhow::Error>
where
    T: Observer + Clone + 'static,
{
    for bind in config.server.interfaces.iter().copied() {
        let listener = TcpListener::bind(bind).await?;
        let local_addr = listener.local_addr()?;
        let observer = observer.clone();

        tokio::spawn(async move {
            // Accept all connections on the current listener, but exit the
            // entire loop when an error occurs.
            while let Ok((socket, address)) = listener.accept().await {
                log::info!("websocket socket accept: addr={address:?}, interface={local_addr:?}");

                let observer = observer.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket, address, observer).await {
                        log::error!("websocket socket error: addr={address:?}, err={e}");
                    }

                    log::info!(
                        "websocket socket disconnect: addr={address:?}, interface={local_addr:?}"
                    );
                });
            }

            log::error!("websocket server close: interface={local_addr:?}");
        });

        log::info!("websocket server listening: listen={bind}");
    }

    Ok(())
}

/// One logical read, decode, observe, encode, write sequence per
/// connection. The connection task owns all per-connection buffers;
/// any codec-reported error closes the socket and drops them.
async fn handle_connection<T>(
    mut socket: TcpStream,
    address: SocketAddr,
    observer: T,
) -> Result<(), anyhow::Error>
where
    T: Observer,
{
    // Disable the Nagle algorithm.
    // because to maintain real-time, any received data should be processed
    // as soon as possible.
    if let Err(e) = socket.set_nodelay(true) {
        log::error!("tcp socket set nodelay failed!: addr={address}, err={e}");
    }

    let mut buffer = BytesMut::with_capacity(MAX_FRAME_SIZE);
    upgrade(&mut socket, &mut buffer).await?;

    let mut outgoing = BytesMut::with_capacity(MAX_FRAME_SIZE);
    loop {
        // Drain every complete frame already buffered before reading
        // more data.
        while buffer.len() >= 2 {
            let size = match Frame::message_size(&buffer) {
                Ok(size) if size > buffer.len() => break,
                Ok(size) => size,
                // Not enough header bytes to size the frame yet.
                Err(Error::InvalidInput) => break,
                Err(e) => return Err(e.into()),
            };

            let mut chunk = buffer.split_to(size);
            let frame = Frame::decode(chunk.as_mut())?;

            log::trace!(
                "frame: addr={address:?}, opcode={:?}, len={}",
                frame.opcode,
                frame.payload.len()
            );

            if let Some(reply) = observer.on_message(address, frame.payload) {
                Frame {
                    opcode: Opcode::Text,
                    payload: &reply,
                }
                .encode(&mut outgoing)?;

                // The buffer is one contiguous complete frame, written
                // in a single operation.
                socket.write_all(&outgoing).await?;
            }
        }

        // When the received size is 0, the socket has been closed.
        if socket.read_buf(&mut buffer).await? == 0 {
            return Ok(());
        }
    }
}

/// Complete the opening handshake.
///
/// Reads until the HTTP request head is complete, writes the 101
/// response, and leaves any bytes received past the request head in
/// `buffer` as the start of the frame stream.
async fn upgrade(socket: &mut TcpStream, buffer: &mut BytesMut) -> Result<(), anyhow::Error> {
    loop {
        if socket.read_buf(buffer).await? == 0 {
            anyhow::bail!("connection closed during handshake");
        }

        if let Some((size, response)) = parse_upgrade(buffer)? {
            let _ = buffer.split_to(size);
            socket.write_all(response.as_bytes()).await?;
            return Ok(());
        }

        if buffer.len() > MAX_REQUEST_SIZE {
            anyhow::bail!("upgrade request too large");
        }
    }
}

/// Parse the upgrade request head, returning the head size and the
/// handshake response, or `None` when the head is still incomplete.
fn parse_upgrade(bytes: &[u8]) -> Result<Option<(usize, String)>, anyhow::Error> {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut request = httparse::Request::new(&mut headers);

    let size = match request.parse(bytes)? {
        httparse::Status::Partial => return Ok(None),
        httparse::Status::Complete(size) => size,
    };

    // Header names are case-insensitive, and so is the upgrade token.
    let upgrade = request
        .headers
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case("upgrade"))
        .map(|item| item.value)
        .unwrap_or_default();

    if !std::str::from_utf8(upgrade)?
        .trim()
        .eq_ignore_ascii_case("websocket")
    {
        anyhow::bail!("not a websocket upgrade request");
    }

    let key = request
        .headers
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case("sec-websocket-key"))
        .ok_or_else(|| anyhow::anyhow!("missing sec-websocket-key header"))?;

    let response = handshake::handshake_response(std::str::from_utf8(key.value)?);
    Ok(Some((size, response)))
}
