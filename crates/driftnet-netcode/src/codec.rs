//! Packet framing
//!
//! ```text
//! byte 0     : packet kind   (1=Input, 2=Snapshot, 3=Ack, 4=ServerTime)
//! byte 1     : compression   (0=none, 1=compressed)
//! bytes 2..N : message payload, optionally compressed
//! ```
//!
//! The kind tag is always derived from the `Message` variant, and decoding
//! dispatches on the same `PacketKind`, so the two directions cannot
//! disagree on which type a tag means.

use crate::message::{Ack, Input, ServerTime, Snapshot, WireMessage};
use crate::{Error, Result};
use tracing::trace;

/// Size of the kind + compression-flag header
pub const HEADER_LEN: usize = 2;

const FLAG_RAW: u8 = 0;
const FLAG_COMPRESSED: u8 = 1;

/// Packet kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    Input = 1,
    Snapshot = 2,
    Ack = 3,
    ServerTime = 4,
}

impl TryFrom<u8> for PacketKind {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(PacketKind::Input),
            2 => Ok(PacketKind::Snapshot),
            3 => Ok(PacketKind::Ack),
            4 => Ok(PacketKind::ServerTime),
            other => Err(Error::UnknownPacketKind(other)),
        }
    }
}

/// Any message that can travel in a packet
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Input(Input),
    Snapshot(Snapshot),
    Ack(Ack),
    ServerTime(ServerTime),
}

impl Message {
    /// Tag written in byte 0 for this message
    pub fn kind(&self) -> PacketKind {
        match self {
            Message::Input(_) => PacketKind::Input,
            Message::Snapshot(_) => PacketKind::Snapshot,
            Message::Ack(_) => PacketKind::Ack,
            Message::ServerTime(_) => PacketKind::ServerTime,
        }
    }

    fn payload(&self) -> Result<Vec<u8>> {
        match self {
            Message::Input(m) => m.to_bytes(),
            Message::Snapshot(m) => m.to_bytes(),
            Message::Ack(m) => m.to_bytes(),
            Message::ServerTime(m) => m.to_bytes(),
        }
    }

    fn from_payload(kind: PacketKind, payload: &[u8]) -> Result<Self> {
        match kind {
            PacketKind::Input => Input::from_bytes(payload).map(Message::Input),
            PacketKind::Snapshot => Snapshot::from_bytes(payload).map(Message::Snapshot),
            PacketKind::Ack => Ack::from_bytes(payload).map(Message::Ack),
            PacketKind::ServerTime => ServerTime::from_bytes(payload).map(Message::ServerTime),
        }
    }
}

impl From<Input> for Message {
    fn from(m: Input) -> Self {
        Message::Input(m)
    }
}

impl From<Snapshot> for Message {
    fn from(m: Snapshot) -> Self {
        Message::Snapshot(m)
    }
}

impl From<Ack> for Message {
    fn from(m: Ack) -> Self {
        Message::Ack(m)
    }
}

impl From<ServerTime> for Message {
    fn from(m: ServerTime) -> Self {
        Message::ServerTime(m)
    }
}

/// Payload compressor supplied by the caller
pub trait Compressor {
    /// Compress an encoded payload
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>>;
    /// Reverse `compress`
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>>;
}

/// LZ4 block compression with a size prefix
#[cfg(feature = "lz4")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

#[cfg(feature = "lz4")]
impl Compressor for Lz4Compressor {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(bytes))
    }

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(bytes).map_err(|e| Error::Compression(e.to_string()))
    }
}

/// Frame a message into packet bytes
///
/// The payload is compressed iff a compressor is supplied.
pub fn encode(message: &Message, compressor: Option<&dyn Compressor>) -> Result<Vec<u8>> {
    let payload = message.payload()?;
    let (flag, body) = match compressor {
        Some(c) => (FLAG_COMPRESSED, c.compress(&payload)?),
        None => (FLAG_RAW, payload),
    };

    let mut packet = Vec::with_capacity(HEADER_LEN + body.len());
    packet.push(message.kind() as u8);
    packet.push(flag);
    packet.extend_from_slice(&body);

    trace!(kind = ?message.kind(), compressed = flag == FLAG_COMPRESSED, len = packet.len(), "encoded packet");
    Ok(packet)
}

/// Parse packet bytes back into a message
///
/// Fails without side effects on a short buffer, an unknown kind or flag, a
/// compressed payload with no decompressor, or a malformed payload.
pub fn decode(bytes: &[u8], compressor: Option<&dyn Compressor>) -> Result<Message> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::PacketTooShort { len: bytes.len() });
    }

    let kind = PacketKind::try_from(bytes[0])?;
    let body = &bytes[HEADER_LEN..];

    let message = match bytes[1] {
        FLAG_RAW => Message::from_payload(kind, body)?,
        FLAG_COMPRESSED => {
            let c = compressor.ok_or(Error::MissingDecompressor)?;
            Message::from_payload(kind, &c.decompress(body)?)?
        }
        other => return Err(Error::InvalidCompressionFlag(other)),
    };

    trace!(?kind, len = bytes.len(), "decoded packet");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reverses the payload; enough to prove the flag path is taken
    struct Reverse;

    impl Compressor for Reverse {
        fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
            Ok(bytes.iter().rev().copied().collect())
        }

        fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
            self.compress(bytes)
        }
    }

    fn every_kind() -> Vec<Message> {
        vec![
            Input::new(7, -1.0, 0.5).into(),
            Snapshot::new(12, vec![1.0, 2.5, -3.25]).into(),
            Ack {
                version: 3,
                input_tick: 41,
            }
            .into(),
            ServerTime {
                version: 9,
                unix_milliseconds: 1_700_000_000_123,
            }
            .into(),
        ]
    }

    #[test]
    fn test_round_trip_uncompressed() {
        for message in every_kind() {
            let bytes = encode(&message, None).unwrap();
            assert_eq!(bytes[0], message.kind() as u8);
            assert_eq!(bytes[1], 0);
            assert_eq!(decode(&bytes, None).unwrap(), message);
        }
    }

    #[test]
    fn test_round_trip_compressed() {
        for message in every_kind() {
            let bytes = encode(&message, Some(&Reverse)).unwrap();
            assert_eq!(bytes[1], 1);
            assert_eq!(decode(&bytes, Some(&Reverse)).unwrap(), message);
        }
    }

    #[test]
    fn test_compressed_without_decompressor_fails() {
        let bytes = encode(&Input::new(1, 0.0, 0.0).into(), Some(&Reverse)).unwrap();
        assert!(matches!(decode(&bytes, None), Err(Error::MissingDecompressor)));
    }

    #[test]
    fn test_raw_packet_ignores_supplied_decompressor() {
        let message: Message = Input::new(1, 1.0, 1.0).into();
        let bytes = encode(&message, None).unwrap();
        assert_eq!(decode(&bytes, Some(&Reverse)).unwrap(), message);
    }

    #[test]
    fn test_short_packet_rejected() {
        assert!(matches!(decode(&[], None), Err(Error::PacketTooShort { len: 0 })));
        assert!(matches!(decode(&[1], None), Err(Error::PacketTooShort { len: 1 })));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(matches!(decode(&[0, 0], None), Err(Error::UnknownPacketKind(0))));
        assert!(matches!(decode(&[5, 0, 1, 2], None), Err(Error::UnknownPacketKind(5))));
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let mut bytes = encode(&Input::new(1, 0.0, 0.0).into(), None).unwrap();
        bytes[1] = 2;
        assert!(matches!(decode(&bytes, None), Err(Error::InvalidCompressionFlag(2))));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let bytes = encode(&Snapshot::new(1, vec![0.0; 4]).into(), None).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1], None),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let mut bytes = encode(&Input::new(1, 1.0, 2.0).into(), None).unwrap();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5]);
        assert!(matches!(decode(&bytes, None), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_packet_kind_tags() {
        for tag in 1..=4u8 {
            assert_eq!(PacketKind::try_from(tag).unwrap() as u8, tag);
        }
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_round_trip() {
        let lz4 = Lz4Compressor;
        let message: Message = Snapshot::new(5, vec![0.0; 256]).into();
        let raw = encode(&message, None).unwrap();
        let packed = encode(&message, Some(&lz4)).unwrap();

        assert!(packed.len() < raw.len());
        assert_eq!(decode(&packed, Some(&lz4)).unwrap(), message);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_corrupt_payload_rejected() {
        let bytes = [PacketKind::Ack as u8, 1, 16, 0, 0, 0, 0xFF];
        assert!(matches!(
            decode(&bytes, Some(&Lz4Compressor)),
            Err(Error::Compression(_))
        ));
    }
}
