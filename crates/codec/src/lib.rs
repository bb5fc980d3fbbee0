//! ## The WebSocket Protocol
//!
//! [RFC6455]: https://tools.ietf.org/html/rfc6455
//! [Section 1.3]: https://tools.ietf.org/html/rfc6455#section-1.3
//! [Section 5.2]: https://tools.ietf.org/html/rfc6455#section-5.2
//!
//! The WebSocket Protocol enables two-way communication between a
//! client running untrusted code in a controlled environment to a
//! remote host that has opted-in to communications from that code.
//! The protocol consists of an opening handshake ([Section 1.3])
//! followed by basic message framing ([Section 5.2]), layered over
//! TCP.  The handshake is a one-time HTTP/1.1 upgrade exchange that
//! promotes a plain request/response connection into a persistent
//! framed-message channel.
//!
//! This crate is the pure protocol engine: the handshake key
//! derivation and the binary frame codec.  It performs no I/O and
//! holds no state across frames; the transport and the connection
//! lifecycle belong to the caller.

pub mod frame;
pub mod handshake;

use self::frame::Opcode;

use std::array::TryFromSliceError;

use num_enum::TryFromPrimitiveError;

#[derive(Debug)]
pub enum Error {
    /// The input is structurally too short to contain what the header
    /// announces.  During streaming this means "wait for more bytes".
    InvalidInput,
    /// The opcode nibble does not name any known frame type.
    UnknownOpcode(u8),
    /// A known frame type this engine does not handle (control frames,
    /// binary frames).
    UnsupportedFrame(Opcode),
    /// A continuation frame or a frame with the FIN bit clear; message
    /// fragmentation is not supported.
    FragmentedFrame,
    /// A client frame without the mask flag is a protocol violation.
    UnmaskedClientFrame,
    /// The payload requires the 64-bit length encoding on input, or
    /// exceeds the 16-bit encodable range on output.
    PayloadTooLarge,
    TryFromSliceError(TryFromSliceError),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<TryFromSliceError> for Error {
    fn from(value: TryFromSliceError) -> Self {
        Self::TryFromSliceError(value)
    }
}

impl From<TryFromPrimitiveError<Opcode>> for Error {
    fn from(value: TryFromPrimitiveError<Opcode>) -> Self {
        Self::UnknownOpcode(value.number)
    }
}
