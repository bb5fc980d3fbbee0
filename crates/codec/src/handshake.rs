use aws_lc_rs::digest;
use base64::{Engine, prelude::BASE64_STANDARD};

/// The fixed GUID the server concatenates with the client key, see
/// [Section 4.2.2](https://tools.ietf.org/html/rfc6455#section-4.2.2).
pub const MAGIC_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Derive the `Sec-WebSocket-Accept` token from the client key.
///
/// The server takes the value of the `Sec-WebSocket-Key` header, trims
/// it, concatenates the magic GUID, computes a SHA-1 digest over the
/// UTF-8 bytes of that concatenation and base64-encodes the digest.
/// This proves to the client that the server understood the upgrade
/// request.
///
/// # Test
///
/// ```
/// use ws_server_codec::handshake::derive_accept_key;
///
/// assert_eq!(
///     derive_accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
///     "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
/// );
/// ```
pub fn derive_accept_key(key: &str) -> String {
    let input = [key.trim(), MAGIC_GUID].concat();
    let digest = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, input.as_bytes());
    BASE64_STANDARD.encode(digest.as_ref())
}

/// Build the complete `101 Switching Protocols` header block.
///
/// Every line is CRLF-terminated and the block ends with an empty
/// CRLF-terminated line; clients fail to parse the response otherwise.
/// Writing the bytes and switching the connection to frame-reading
/// mode are the caller's responsibility.
///
/// # Test
///
/// ```
/// use ws_server_codec::handshake::handshake_response;
///
/// let response = handshake_response("dGhlIHNhbXBsZSBub25jZQ==");
///
/// assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
/// assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
/// assert!(response.ends_with("\r\n\r\n"));
/// ```
pub fn handshake_response(key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        derive_accept_key(key)
    )
}
