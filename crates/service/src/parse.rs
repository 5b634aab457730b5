use codec::OnvifExtension;

use crate::Packet;

/// Reads the ONVIF extension back out of a stream of packets.
///
/// Every packet is forwarded as soon as it is processed.  When it carries
/// the extension, the `C` bit becomes the delta unit flag and the `D` bit
/// is merged into the discontinuity flag, then the extension region is
/// removed.  The `E` bit, CSeq and NTP time of the last packet are kept
/// for [`ParseStage::last_extension`].
///
/// Malformed input never fails the stream: the packet is forwarded with
/// the extension stripped when the RTP structure allows it, untouched
/// otherwise, and a warning is logged.
#[derive(Debug, Default)]
pub struct ParseStage {
    last_extension: Option<OnvifExtension>,
}

impl ParseStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extension decoded from the last processed packet, `None` when that
    /// packet had no valid extension.
    pub fn last_extension(&self) -> Option<OnvifExtension> {
        self.last_extension
    }

    pub fn process(&mut self, mut packet: Packet) -> Packet {
        self.last_extension = None;

        let parsed = match packet.rtp() {
            Ok(rtp) => match rtp.extension {
                Some(extension) => Some((
                    OnvifExtension::from_extension(&extension),
                    rtp.with_extension(None).to_bytes(),
                )),
                None => None,
            },
            Err(e) => {
                log::warn!(
                    "forwarding packet that is not valid rtp: err={}, size={}",
                    e,
                    packet.data.len()
                );
                None
            }
        };

        let Some((extension, stripped)) = parsed else {
            return packet;
        };

        match stripped {
            Ok(data) => packet.data = data,
            Err(e) => {
                log::warn!("failed to strip header extension: err={}", e);
                return packet;
            }
        }

        match extension {
            Ok(extension) => {
                log::trace!("parse extension: pts={:?}, extension={:?}", packet.pts, extension);

                packet.flags.delta_unit = !extension.clean_point;
                packet.flags.discont |= extension.discont;
                self.last_extension = Some(extension);
            }
            Err(e) => {
                log::warn!("stripped malformed header extension: err={}", e);
            }
        }

        packet
    }
}
