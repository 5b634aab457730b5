//! ONVIF replay timestamps for RTP streams.
//!
//! The crate exposes two elements driven by a host pipeline:
//!
//! * [`timestamp::TimestampElement`] attaches the ONVIF header extension,
//!   carrying the absolute capture time of each packet, before the packets
//!   leave the sender.
//! * [`parse::ParseElement`] reads the extension back on the receiving
//!   side, restores the packet flags and strips the extension.
//!
//! Both forward their output to a [`Downstream`] sink.

pub mod config;
pub mod parse;
pub mod timestamp;

pub mod prelude {
    pub use codec::{NtpTimestamp, ONVIF_PROFILE, OnvifExtension};
    pub use service::{ApplyOptions, Packet, PacketFlags, Segment};

    pub use super::{
        Downstream, Element, Event, config::Config, parse::ParseElement,
        timestamp::TimestampElement,
    };
}

use anyhow::Result;
use service::{Packet, Segment};

/// Out of band stream events, serialized with the packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new stream begins, carries the stream id.
    StreamStart(String),
    /// Timing of the packets that follow.
    Segment(Segment),
    /// No packet follows this event.
    Eos,
    FlushStart,
    FlushStop,
    /// Moves the NTP time of the following packets.
    ///
    /// `ntp_offset` is in seconds, with `discont` the next packet is marked
    /// as the start of a new contiguous run.
    NtpOffset { ntp_offset: u64, discont: bool },
}

/// The next element of the pipeline.
pub trait Downstream: Send {
    fn push(&mut self, packet: Packet) -> Result<()>;
    fn push_event(&mut self, event: Event) -> Result<()>;
}

/// Entry points of an element, called by the host in stream order.
///
/// Packets and events are refused until [`Element::start`] is called and
/// after [`Element::stop`].
pub trait Element {
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn handle_packet(&self, packet: Packet) -> Result<()>;
    fn handle_event(&self, event: Event) -> Result<()>;

    /// Handles a buffer list, one packet after the other.
    ///
    /// The first error stops the list, the remaining packets are dropped.
    fn handle_list(&self, packets: Vec<Packet>) -> Result<()> {
        for packet in packets {
            self.handle_packet(packet)?;
        }

        Ok(())
    }
}
