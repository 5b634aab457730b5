use bytes::BytesMut;
use codec::{Error, Extension, Rtp};

/// Stream metadata carried next to the packet bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketFlags {
    /// The packet cannot be decoded independently, it is not a clean point.
    pub delta_unit: bool,
    /// A gap in the logical stream precedes the packet.
    pub discont: bool,
}

/// An RTP packet travelling through a stage.
///
/// Stages take packets by value and hand them back by value, so a packet
/// is only ever owned by one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The whole RTP packet, header included.
    pub data: BytesMut,
    /// Presentation timestamp in nanoseconds, `None` when unknown.
    pub pts: Option<i64>,
    pub flags: PacketFlags,
}

impl Packet {
    pub fn new(data: BytesMut, pts: Option<i64>) -> Self {
        Self {
            data,
            pts,
            flags: PacketFlags::default(),
        }
    }

    pub fn with_flags(self, flags: PacketFlags) -> Self {
        Self { flags, ..self }
    }

    pub fn rtp(&self) -> Result<Rtp<'_>, Error> {
        Rtp::decode(&self.data)
    }

    /// Replaces the header extension region of the packet, `None` removes
    /// it.  The rest of the packet is copied unchanged.
    pub fn set_extension(&mut self, extension: Option<Extension<'_>>) -> Result<(), Error> {
        let data = self.rtp()?.with_extension(extension).to_bytes()?;
        self.data = data;
        Ok(())
    }
}

/// Maps presentation timestamps onto running time.
///
/// The default segment starts at zero with no base, running time is then
/// the presentation timestamp itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segment {
    /// First presentation timestamp that belongs to the segment.
    pub start: i64,
    /// Running time accumulated by previous segments.
    pub base: i64,
}

impl Segment {
    /// Returns `None` for timestamps before the segment start.
    pub fn to_running_time(&self, pts: i64) -> Option<i64> {
        if pts < self.start {
            return None;
        }

        pts.checked_sub(self.start)?.checked_add(self.base)
    }
}
