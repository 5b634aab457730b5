use codec::{Extension, ONVIF_PROFILE, OnvifExtension};

use crate::{Error, Packet, Segment};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ApplyOptions {
    ///
    /// Seconds added to the running time of every packet before it is
    /// converted to NTP, maps the stream clock onto the NTP epoch.
    ///
    #[cfg_attr(feature = "serde", serde(deserialize_with = "integer::deserialize"))]
    pub ntp_offset: u64,
    ///
    /// CSeq written into the first emitted packet.
    ///
    #[cfg_attr(feature = "serde", serde(deserialize_with = "integer::deserialize"))]
    pub initial_cseq: u8,
    ///
    /// Mark every packet as the end of a contiguous run and emit it right
    /// away instead of waiting for the next packet.
    ///
    pub force_e_bit_on_every_packet: bool,
}

/// A packet held back until its successor is known.
#[derive(Debug)]
struct Pending {
    packet: Packet,
    ntp_time: u64,
    clean_point: bool,
    discont: bool,
}

/// Attaches the ONVIF extension to a stream of packets.
///
/// The `E` bit of a packet depends on the packet that follows it: it is
/// set when the next packet is discontinuous, or when the stream ends.  The
/// stage therefore keeps the last packet it received in a pending slot and
/// emits it when the next packet (or the end of stream) arrives, so
/// [`ApplyStage::process`] returns nothing for the first packet of a
/// stream and exactly one packet afterwards.
#[derive(Debug)]
pub struct ApplyStage {
    options: ApplyOptions,
    ntp_offset: u64,
    next_cseq: u8,
    segment: Segment,
    force_discont: bool,
    pending: Option<Pending>,
}

impl ApplyStage {
    pub fn new(options: ApplyOptions) -> Self {
        Self {
            ntp_offset: options.ntp_offset,
            next_cseq: options.initial_cseq,
            segment: Segment::default(),
            force_discont: false,
            pending: None,
            options,
        }
    }

    pub fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// CSeq the next emitted packet will carry.
    pub fn next_cseq(&self) -> u8 {
        self.next_cseq
    }

    pub fn ntp_offset(&self) -> u64 {
        self.ntp_offset
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_segment(&mut self, segment: Segment) {
        self.segment = segment;
    }

    /// Changes the NTP offset for the packets that follow.
    ///
    /// The offset of an already pending packet is not touched.  With
    /// `discont` the next packet is flagged as discontinuous, which also
    /// closes the contiguous run of the pending packet.
    pub fn set_ntp_offset(&mut self, ntp_offset: u64, discont: bool) {
        log::debug!(
            "ntp offset changed: {} -> {}, discont={}",
            self.ntp_offset,
            ntp_offset,
            discont
        );

        self.ntp_offset = ntp_offset;
        self.force_discont |= discont;
    }

    /// Drops the pending packet without emitting it.
    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            log::debug!(
                "discarding pending packet: pts={:?}, cseq={}",
                pending.packet.pts,
                self.next_cseq
            );
        }
    }

    /// Feeds a packet into the stage.
    ///
    /// Returns the previously pending packet, finalized now that its
    /// successor is known, or `None` when nothing was pending.  Packets
    /// without a timestamp, or already carrying a header extension, fail
    /// the stream.
    pub fn process(&mut self, packet: Packet) -> Result<Option<Packet>, Error> {
        let current = self.prepare(packet)?;

        if self.options.force_e_bit_on_every_packet {
            return self.finalize(current, true).map(Some);
        }

        let emitted = match self.pending.take() {
            Some(previous) => Some(self.finalize(previous, current.discont)?),
            None => None,
        };

        self.pending = Some(current);
        Ok(emitted)
    }

    /// Emits the pending packet, if any, as the last packet of its run.
    ///
    /// Calling it again, or with nothing pending, returns `None`.
    pub fn flush_eos(&mut self) -> Result<Option<Packet>, Error> {
        match self.pending.take() {
            Some(pending) => self.finalize(pending, true).map(Some),
            None => Ok(None),
        }
    }

    fn prepare(&mut self, packet: Packet) -> Result<Pending, Error> {
        let Some(pts) = packet.pts else {
            log::error!("packet without presentation timestamp");
            return Err(Error::MissingTimestamp);
        };

        let Some(running_time) = self.segment.to_running_time(pts) else {
            log::error!("packet outside of segment: pts={}, segment={:?}", pts, self.segment);
            return Err(Error::OutOfSegment(pts));
        };

        if packet.rtp()?.extension.is_some() {
            log::error!("packet already has a header extension: pts={}", pts);
            return Err(Error::ExtensionPresent);
        }

        let ntp_time = codec::convert(Some(running_time), self.ntp_offset)?;
        let discont = packet.flags.discont || std::mem::take(&mut self.force_discont);

        Ok(Pending {
            clean_point: !packet.flags.delta_unit,
            ntp_time,
            discont,
            packet,
        })
    }

    fn finalize(&mut self, pending: Pending, end_contiguous: bool) -> Result<Packet, Error> {
        let Pending {
            mut packet,
            ntp_time,
            clean_point,
            discont,
        } = pending;

        let extension = OnvifExtension {
            ntp_time,
            clean_point,
            end_contiguous,
            discont,
            cseq: self.next_cseq,
        };

        let data = extension.encode();
        packet.set_extension(Some(Extension {
            profile: ONVIF_PROFILE,
            data: &data,
        }))?;

        log::trace!("apply extension: pts={:?}, extension={:?}", packet.pts, extension);

        self.next_cseq = self.next_cseq.wrapping_add(1);
        Ok(packet)
    }
}

/// Integer fields read as written and narrowed with `TryFrom`, a value
/// outside the range of the field is an error, never saturated.
#[cfg(feature = "serde")]
mod integer {
    use std::{fmt, marker::PhantomData};

    use serde::de::{Deserializer, Error, Unexpected, Visitor};

    struct Integer<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for Integer<T>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "an integer in range of {}", std::any::type_name::<T>())
        }

        fn visit_i64<E: Error>(self, value: i64) -> Result<T, E> {
            <T as TryFrom<i64>>::try_from(value)
                .map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<T, E> {
            <T as TryFrom<u64>>::try_from(value)
                .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64> + TryFrom<u64>,
    {
        deserializer.deserialize_any(Integer(PhantomData))
    }
}
