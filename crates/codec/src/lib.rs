//! ## ONVIF RTP header extension
//!
//! [ONVIF Streaming Specification]: https://www.onvif.org/specs/stream/ONVIF-Streaming-Spec.pdf
//! [RFC3550]: https://tools.ietf.org/html/rfc3550#section-5.3.1
//!
//! The [ONVIF Streaming Specification] defines an RTP header extension
//! used by replay and recording services.  It carries the absolute
//! capture time of the first byte of the packet as a 64-bit NTP
//! timestamp, together with flags describing whether the packet starts a
//! clean point, ends a contiguous run of packets or follows a
//! discontinuity, and an 8-bit sequence counter tying the packet to the
//! RTSP request that produced it.
//!
//! The extension uses the generic header extension mechanism of [RFC3550]
//! with the profile-defined identifier `0xABAC` and a fixed length of
//! three 32-bit words.
//!
//! This crate holds the wire level pieces: a view over the RTP fixed
//! header and its extension region ([`rtp`]), the 12 byte extension
//! payload ([`onvif`]) and the conversion from presentation time to NTP
//! fixed point ([`ntp`]).

pub mod ntp;
pub mod onvif;
pub mod rtp;

pub use self::{
    ntp::{NtpTimestamp, convert},
    onvif::{ONVIF_EXTENSION_SIZE, ONVIF_EXTENSION_WORDS, ONVIF_PROFILE, OnvifExtension},
    rtp::{Extension, Rtp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The buffer is not a well formed RTP packet.
    InvalidInput,
    /// The packet has no presentation timestamp.
    MissingTimestamp,
    /// The presentation timestamp plus the offset falls before the NTP epoch.
    NegativeTimestamp,
    /// The header extension carries another profile identifier.
    UnknownProfile(u16),
    /// The header extension does not have the expected size in bytes.
    InvalidLength(usize),
    /// The extension data does not fit in the 16-bit length field.
    ExtensionTooLong,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
