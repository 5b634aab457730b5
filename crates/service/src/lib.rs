//! Stream stages attaching and removing the ONVIF replay header extension.
//!
//! [`apply::ApplyStage`] sits on the sending side.  It stamps every packet
//! with its capture time in NTP format and holds one packet back, because
//! whether a packet ends a contiguous run is only known once the next
//! packet (or the end of the stream) is seen.
//!
//! [`parse::ParseStage`] sits on the receiving side.  It maps the extension
//! flags back onto the packet metadata and strips the extension.
//!
//! Both stages are driven by a single caller at a time and keep all of
//! their state per instance.

pub mod apply;
pub mod packet;
pub mod parse;

pub use self::{
    apply::{ApplyOptions, ApplyStage},
    packet::{Packet, PacketFlags, Segment},
    parse::ParseStage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The packet has no presentation timestamp, an absolute capture time
    /// cannot be derived for it.
    MissingTimestamp,
    /// The presentation timestamp lies before the start of the segment.
    OutOfSegment(i64),
    /// The packet already carries a header extension.
    ExtensionPresent,
    Codec(codec::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<codec::Error> for Error {
    fn from(value: codec::Error) -> Self {
        match value {
            codec::Error::MissingTimestamp => Self::MissingTimestamp,
            value => Self::Codec(value),
        }
    }
}
