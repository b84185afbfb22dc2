//! IEC 61937 burst framing as it appears on a 16-bit stereo S/PDIF link.
//!
//! A burst starts with four 16-bit little-endian words: the sync pair
//! Pa/Pb, the burst info Pc (data type in the low 7 bits) and the payload
//! length Pd. The payload follows as 16-bit words whose bytes are swapped
//! relative to the codec's own byte order.

use super::codec::CodecId;

pub const SYNC_PA: u16 = 0xF872;
pub const SYNC_PB: u16 = 0x4E1F;

/// Pa/Pb exactly as they arrive on the wire.
pub const PREAMBLE: [u8; 4] = [0x72, 0xF8, 0x1F, 0x4E];

/// Pa, Pb, Pc, Pd.
pub const HEADER_LEN: usize = 8;

/// Bytes per captured PCM frame (16-bit, 2 channels).
pub const CARRIER_FRAME_BYTES: usize = 4;

/// Burst payload type from Pc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Ac3,
    Mpeg1Layer1,
    Mpeg1Layer23,
    Mpeg2Ext,
    Mpeg2Aac,
    DtsI,
    DtsII,
    DtsIII,
    DtsIV,
    Eac3,
    TrueHd,
}

impl DataType {
    pub fn from_pc(pc: u16) -> Option<Self> {
        match pc & 0x7F {
            0x01 => Some(DataType::Ac3),
            0x04 => Some(DataType::Mpeg1Layer1),
            0x05 => Some(DataType::Mpeg1Layer23),
            0x06 => Some(DataType::Mpeg2Ext),
            0x07 => Some(DataType::Mpeg2Aac),
            0x0B => Some(DataType::DtsI),
            0x0C => Some(DataType::DtsII),
            0x0D => Some(DataType::DtsIII),
            0x11 => Some(DataType::DtsIV),
            0x15 => Some(DataType::Eac3),
            0x16 => Some(DataType::TrueHd),
            _ => None,
        }
    }

    /// Number of carrier PCM frames one burst of this type spans.
    pub fn repetition_period(self) -> usize {
        match self {
            DataType::Ac3 => 1536,
            DataType::Mpeg1Layer1 => 384,
            DataType::Mpeg1Layer23 | DataType::Mpeg2Ext => 1152,
            DataType::Mpeg2Aac => 1024,
            DataType::DtsI => 512,
            DataType::DtsII => 1024,
            DataType::DtsIII | DataType::DtsIV => 2048,
            DataType::Eac3 => 6144,
            DataType::TrueHd => 15360,
        }
    }

    /// Whether Pd counts bytes rather than bits.
    fn length_in_bytes(self) -> bool {
        matches!(self, DataType::Eac3 | DataType::TrueHd | DataType::DtsIV)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstHeader {
    pub data_type: DataType,
    /// Payload length in bytes, rounded up to whole 16-bit words.
    pub payload_len: usize,
}

impl BurstHeader {
    pub fn burst_len(&self) -> usize {
        HEADER_LEN + self.payload_len
    }
}

/// Outcome of reading Pc/Pd after a preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan {
    Burst(BurstHeader),
    /// Null/pause bursts and data types this bridge does not route.
    Unknown { pc: u16 },
}

/// One complete burst lifted off the link.
#[derive(Debug, Clone)]
pub struct Burst {
    pub header: BurstHeader,
    pub codec: CodecId,
    /// Header and payload exactly as captured.
    pub raw: Vec<u8>,
    /// Payload in codec byte order.
    pub payload: Vec<u8>,
}

impl Burst {
    /// Splits `bytes` (starting at the preamble, at least `header.burst_len()`
    /// long) into a burst.
    pub fn new(header: BurstHeader, bytes: &[u8]) -> Self {
        let raw = bytes[..header.burst_len()].to_vec();
        let mut payload = Vec::with_capacity(header.payload_len);
        swap_words(&raw[HEADER_LEN..], &mut payload);
        let codec = codec_for(header.data_type, &payload);
        Burst { header, codec, raw, payload }
    }

    /// Size of the burst's full repetition period on the carrier, in bytes.
    pub fn period_bytes(&self) -> usize {
        self.header.data_type.repetition_period() * CARRIER_FRAME_BYTES
    }
}

/// Offset of the first Pa/Pb preamble in `buf`.
pub fn find_preamble(buf: &[u8]) -> Option<usize> {
    buf.windows(PREAMBLE.len()).position(|w| w == PREAMBLE)
}

/// Reads Pc/Pd from `buf`, which must start at a preamble. Returns `None`
/// when fewer than `HEADER_LEN` bytes are available.
pub fn parse_header(buf: &[u8]) -> Option<HeaderScan> {
    if buf.len() < HEADER_LEN {
        return None;
    }
    let pc = u16::from_le_bytes([buf[4], buf[5]]);
    let pd = u16::from_le_bytes([buf[6], buf[7]]) as usize;
    let scan = match DataType::from_pc(pc) {
        Some(data_type) => {
            let bytes = if data_type.length_in_bytes() { pd } else { pd.div_ceil(8) };
            HeaderScan::Burst(BurstHeader {
                data_type,
                payload_len: bytes + (bytes & 1),
            })
        }
        None => HeaderScan::Unknown { pc },
    };
    Some(scan)
}

/// Appends `src` to `dst` with the bytes of every 16-bit word swapped. A
/// trailing odd byte is copied unchanged.
pub fn swap_words(src: &[u8], dst: &mut Vec<u8>) {
    let mut words = src.chunks_exact(2);
    for word in &mut words {
        dst.push(word[1]);
        dst.push(word[0]);
    }
    dst.extend_from_slice(words.remainder());
}

fn codec_for(data_type: DataType, payload: &[u8]) -> CodecId {
    match data_type {
        DataType::Ac3 => CodecId::Ac3,
        DataType::Eac3 => CodecId::Eac3,
        DataType::DtsI | DataType::DtsII | DataType::DtsIII | DataType::DtsIV => CodecId::Dts,
        DataType::Mpeg2Aac => CodecId::Aac,
        DataType::TrueHd => CodecId::TrueHd,
        DataType::Mpeg1Layer1 => CodecId::Mp1,
        DataType::Mpeg1Layer23 | DataType::Mpeg2Ext => mpeg_layer(payload),
    }
}

/// Picks the MPEG audio layer from the frame header at the start of the payload.
fn mpeg_layer(payload: &[u8]) -> CodecId {
    match payload {
        [0xFF, b1, ..] if b1 & 0xE0 == 0xE0 => match (b1 >> 1) & 0x03 {
            0x03 => CodecId::Mp1,
            0x02 => CodecId::Mp2,
            _ => CodecId::Mp3,
        },
        _ => CodecId::Mp2,
    }
}
