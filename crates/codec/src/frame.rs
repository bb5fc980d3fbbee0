//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |            (16/64)            |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |    Extended payload length continued, if payload len == 127   |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               | Masking-key, if MASK set to 1 |
//! +-------------------------------+-------------------------------+
//! |    Masking-key (continued)    |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                   Payload Data continued ...                  :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                   Payload Data continued ...                  |
//! +---------------------------------------------------------------+

use bytes::{BufMut, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::Error;

/// Client frames carry a 4 byte masking key right after the header.
pub const MASK_KEY_SIZE: usize = 4;

/// The largest payload the 16-bit extended length field can carry.
/// The 64-bit length encoding is not supported.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const U16_SIZE_MARKER: u8 = 126;
const U64_SIZE_MARKER: u8 = 127;

/// Frame type registry, see
/// [Section 5.2](https://tools.ietf.org/html/rfc6455#section-5.2).
///
/// The opcode nibble of the first header byte.  This engine only
/// exchanges `Text` frames; the remaining variants exist so that
/// unsupported frame types are rejected by name instead of being
/// silently discarded.
#[derive(TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Hash, Debug, Clone, Copy)]
#[repr(u8)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

/// XOR every payload byte at index `i` with `key[i % 4]`.
///
/// XOR is its own inverse, so the same pass masks and unmasks; the
/// operation is position-independent beyond the modulo-4 index.
///
/// # Test
///
/// ```
/// use ws_server_codec::frame::apply_mask;
///
/// let key = [0x37, 0xfa, 0x21, 0x3d];
/// let mut payload = *b"Hello";
///
/// apply_mask(&key, &mut payload);
/// assert_eq!(&payload, &[0x7f, 0x9f, 0x4d, 0x51, 0x58]);
///
/// apply_mask(&key, &mut payload);
/// assert_eq!(&payload, b"Hello");
/// ```
pub fn apply_mask(key: &[u8; MASK_KEY_SIZE], payload: &mut [u8]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i % MASK_KEY_SIZE];
    }
}

/// One self-contained unit of the wire encoding.
///
/// Ephemeral: exists only during the decode or encode of a single
/// frame and borrows the payload it carries.
pub struct Frame<'a> {
    pub opcode: Opcode,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Compute the total wire size of the client frame starting at
    /// `bytes`, from the first 2 to 4 header bytes alone.
    ///
    /// Returns [`Error::InvalidInput`] when too few bytes have arrived
    /// to decide; the caller should wait for more data and try again.
    /// A clear mask flag and the 64-bit length marker are protocol
    /// violations and fatal to the connection.
    ///
    /// # Test
    ///
    /// ```
    /// use ws_server_codec::frame::Frame;
    ///
    /// // Masked text frame with a 5 byte payload.
    /// let bytes = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
    ///
    /// assert_eq!(Frame::message_size(&bytes).unwrap(), 11);
    /// ```
    pub fn message_size(bytes: &[u8]) -> Result<usize, Error> {
        if bytes.len() < 2 {
            return Err(Error::InvalidInput);
        }

        let mask_and_size = bytes[1];
        if mask_and_size & MASK_BIT == 0 {
            return Err(Error::UnmaskedClientFrame);
        }

        Ok(match mask_and_size & !MASK_BIT {
            U64_SIZE_MARKER => return Err(Error::PayloadTooLarge),
            U16_SIZE_MARKER => {
                if bytes.len() < 4 {
                    return Err(Error::InvalidInput);
                }

                4 + MASK_KEY_SIZE + u16::from_be_bytes(bytes[2..4].try_into()?) as usize
            }
            size => 2 + MASK_KEY_SIZE + size as usize,
        })
    }

    /// Decode one complete client frame, unmasking the payload in
    /// place.
    ///
    /// The first header byte is validated, not discarded: the FIN bit
    /// must be set and the opcode must be `Text`.  Continuation frames
    /// and clear FIN bits are rejected as fragmentation, control and
    /// binary frames as unsupported, unknown opcode nibbles by value.
    /// The mask flag must be set on every client frame.
    ///
    /// # Test
    ///
    /// ```
    /// use ws_server_codec::frame::{Frame, Opcode};
    ///
    /// let mut bytes = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
    ///
    /// let frame = Frame::decode(&mut bytes).unwrap();
    ///
    /// assert_eq!(frame.opcode, Opcode::Text);
    /// assert_eq!(frame.payload, b"Hello");
    /// ```
    pub fn decode(bytes: &'a mut [u8]) -> Result<Self, Error> {
        if bytes.len() < 2 {
            return Err(Error::InvalidInput);
        }

        let fin_and_opcode = bytes[0];
        let opcode = Opcode::try_from(fin_and_opcode & OPCODE_MASK)?;
        if opcode == Opcode::Continuation || fin_and_opcode & FIN_BIT == 0 {
            return Err(Error::FragmentedFrame);
        }

        if opcode != Opcode::Text {
            return Err(Error::UnsupportedFrame(opcode));
        }

        let mask_and_size = bytes[1];
        if mask_and_size & MASK_BIT == 0 {
            return Err(Error::UnmaskedClientFrame);
        }

        let (offset, size) = match mask_and_size & !MASK_BIT {
            U64_SIZE_MARKER => return Err(Error::PayloadTooLarge),
            U16_SIZE_MARKER => {
                if bytes.len() < 4 {
                    return Err(Error::InvalidInput);
                }

                (4, u16::from_be_bytes(bytes[2..4].try_into()?) as usize)
            }
            size => (2, size as usize),
        };

        if bytes.len() < offset + MASK_KEY_SIZE + size {
            return Err(Error::InvalidInput);
        }

        let (header, body) = bytes.split_at_mut(offset + MASK_KEY_SIZE);
        let mask_key: [u8; MASK_KEY_SIZE] = header[offset..].try_into()?;

        let payload = &mut body[..size];
        apply_mask(&mask_key, payload);

        Ok(Self {
            opcode,
            payload,
        })
    }

    /// Encode one complete server frame into `bytes`.
    ///
    /// The first byte is FIN OR-ed with the opcode: every outgoing
    /// frame is final, no fragmentation is ever produced.  Payloads up
    /// to 125 bytes use the 2 byte header, up to [`MAX_PAYLOAD_SIZE`]
    /// the 4 byte header with a big-endian 16-bit length.  Anything
    /// larger fails instead of being truncated.  Server frames are
    /// never masked; masking output would be a protocol violation.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use ws_server_codec::frame::{Frame, Opcode};
    ///
    /// let mut bytes = BytesMut::with_capacity(1500);
    ///
    /// Frame {
    ///     opcode: Opcode::Text,
    ///     payload: b"Hello",
    /// }
    /// .encode(&mut bytes)
    /// .unwrap();
    ///
    /// assert_eq!(&bytes[..], &[0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f]);
    /// ```
    pub fn encode(self, bytes: &mut BytesMut) -> Result<(), Error> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge);
        }

        bytes.clear();
        bytes.put_u8(FIN_BIT | u8::from(self.opcode));

        if self.payload.len() < U16_SIZE_MARKER as usize {
            bytes.put_u8(self.payload.len() as u8);
        } else {
            bytes.put_u8(U16_SIZE_MARKER);
            bytes.put_u16(self.payload.len() as u16);
        }

        bytes.extend_from_slice(self.payload);
        Ok(())
    }
}
