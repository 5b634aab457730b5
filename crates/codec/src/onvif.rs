use super::{Error, ntp::NtpTimestamp, rtp::Extension};

/// Header extension identifier ("defined by profile") of the ONVIF replay
/// extension.
pub const ONVIF_PROFILE: u16 = 0xABAC;

/// Length of the extension data in 32-bit words, as carried in the length
/// field of the extension header.
pub const ONVIF_EXTENSION_WORDS: u16 = 3;

/// Length of the extension data in bytes.
pub const ONVIF_EXTENSION_SIZE: usize = ONVIF_EXTENSION_WORDS as usize * 4;

const CLEAN_POINT_SHIFT: u8 = 7;
const END_CONTIGUOUS_SHIFT: u8 = 6;
const DISCONT_SHIFT: u8 = 5;

const CLEAN_POINT_MASK: u8 = 1 << CLEAN_POINT_SHIFT;
const END_CONTIGUOUS_MASK: u8 = 1 << END_CONTIGUOUS_SHIFT;
const DISCONT_MASK: u8 = 1 << DISCONT_SHIFT;

const NTP_OFFSET: usize = 0;
const FLAGS_OFFSET: usize = 8;
const CSEQ_OFFSET: usize = 9;

/// ### ONVIF RTP Header Extension
///
/// ```bash
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  |            0xABAC             |          length=3             |
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  |                          NTP timestamp...                     |
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  |                          NTP timestamp                        |
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  |C|E|D|   mbz   |     CSeq      |            padding            |
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// * `C` the packet starts a clean point (it is not a delta unit).
/// * `E` the packet is the last one of a contiguous run.
/// * `D` a discontinuity precedes the packet.
///
/// The `mbz` bits and the padding are written as zero and ignored when
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OnvifExtension {
    /// 64-bit NTP fixed point capture time.
    pub ntp_time: u64,
    pub clean_point: bool,
    pub end_contiguous: bool,
    pub discont: bool,
    /// Low byte of the RTSP CSeq, incremented for every packet.
    pub cseq: u8,
}

impl OnvifExtension {
    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::OnvifExtension;
    ///
    /// let extension = OnvifExtension {
    ///     clean_point: true,
    ///     discont: true,
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(extension.flags(), 0b1010_0000);
    /// ```
    pub fn flags(&self) -> u8 {
        ((self.clean_point as u8) << CLEAN_POINT_SHIFT)
            | ((self.end_contiguous as u8) << END_CONTIGUOUS_SHIFT)
            | ((self.discont as u8) << DISCONT_SHIFT)
    }

    pub fn ntp_timestamp(&self) -> NtpTimestamp {
        NtpTimestamp::from_u64(self.ntp_time)
    }

    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::OnvifExtension;
    ///
    /// let extension = OnvifExtension {
    ///     ntp_time: 0x0102030405060708,
    ///     clean_point: true,
    ///     end_contiguous: true,
    ///     discont: false,
    ///     cseq: 0x78,
    /// };
    ///
    /// assert_eq!(
    ///     extension.encode(),
    ///     [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xc0, 0x78, 0x00, 0x00]
    /// );
    /// ```
    pub fn encode(&self) -> [u8; ONVIF_EXTENSION_SIZE] {
        let mut bytes = [0u8; ONVIF_EXTENSION_SIZE];
        bytes[NTP_OFFSET..FLAGS_OFFSET].copy_from_slice(&self.ntp_time.to_be_bytes());
        bytes[FLAGS_OFFSET] = self.flags();
        bytes[CSEQ_OFFSET] = self.cseq;
        bytes
    }

    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::OnvifExtension;
    ///
    /// let bytes = [
    ///     0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x3f, 0x12, 0xff, 0xff,
    /// ];
    ///
    /// let extension = OnvifExtension::decode(&bytes);
    /// assert_eq!(extension.ntp_time, 0x0102030405060708);
    /// assert!(!extension.clean_point);
    /// assert!(!extension.end_contiguous);
    /// assert!(extension.discont);
    /// assert_eq!(extension.cseq, 0x12);
    /// ```
    pub fn decode(bytes: &[u8; ONVIF_EXTENSION_SIZE]) -> Self {
        let mut ntp_time = [0u8; 8];
        ntp_time.copy_from_slice(&bytes[NTP_OFFSET..FLAGS_OFFSET]);

        let flags = bytes[FLAGS_OFFSET];
        Self {
            ntp_time: u64::from_be_bytes(ntp_time),
            clean_point: flags & CLEAN_POINT_MASK != 0,
            end_contiguous: flags & END_CONTIGUOUS_MASK != 0,
            discont: flags & DISCONT_MASK != 0,
            cseq: bytes[CSEQ_OFFSET],
        }
    }

    /// Reads the extension out of an RTP header extension region, checking
    /// the profile identifier and the declared length.
    ///
    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::{Error, Extension, OnvifExtension};
    ///
    /// let data = [0u8; 12];
    /// let extension = Extension { profile: 0xBEDE, data: &data };
    ///
    /// assert_eq!(
    ///     OnvifExtension::from_extension(&extension),
    ///     Err(Error::UnknownProfile(0xBEDE))
    /// );
    /// ```
    pub fn from_extension(extension: &Extension<'_>) -> Result<Self, Error> {
        if extension.profile != ONVIF_PROFILE {
            return Err(Error::UnknownProfile(extension.profile));
        }

        let bytes: &[u8; ONVIF_EXTENSION_SIZE] = extension
            .data
            .try_into()
            .map_err(|_| Error::InvalidLength(extension.data.len()))?;

        Ok(Self::decode(bytes))
    }
}
