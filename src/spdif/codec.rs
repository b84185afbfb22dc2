use std::fmt;

/// Identity of the stream carried on the S/PDIF link.
///
/// `None` is the sentinel for uncompressed PCM; every other variant names the
/// compressed codec announced by an IEC 61937 burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    None,
    Ac3,
    Eac3,
    Dts,
    Mp1,
    Mp2,
    Mp3,
    Aac,
    TrueHd,
}

impl CodecId {
    /// Human-readable codec name used in log lines and error messages.
    pub fn name(self) -> &'static str {
        match self {
            CodecId::None => "none",
            CodecId::Ac3 => "ac3",
            CodecId::Eac3 => "eac3",
            CodecId::Dts => "dts",
            CodecId::Mp1 => "mp1",
            CodecId::Mp2 => "mp2",
            CodecId::Mp3 => "mp3",
            CodecId::Aac => "aac",
            CodecId::TrueHd => "truehd",
        }
    }

    pub fn is_none(self) -> bool {
        self == CodecId::None
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
