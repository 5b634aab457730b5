use bytes::{BufMut, BytesMut};

use super::Error;

const VERSION_MASK: u8 = 0b11000000;
const PADDING_MASK: u8 = 0b00100000;
const EXTENSION_MASK: u8 = 0b00010000;
const CSRC_COUNT_MASK: u8 = 0b00001111;
const MARKER_MASK: u8 = 0b10000000;
const PAYLOAD_KIND_MASK: u8 = 0b01111111;

/// lock rtp version in rfc 3550.
pub const RTP_VERSION: u8 = 2;

/// Size of the fixed part of the header, without csrc identifiers.
pub const FIXED_HEADER_SIZE: usize = 12;

/// Maximum number of contributing sources the CC field can count.
pub const MAX_CSRC_COUNT: usize = 15;

/// Rounds a byte count up to whole 32-bit words.
fn padded(size: usize) -> usize {
    (size + 3) & !3
}

/// ### RTP Header Extension
///
/// ```bash
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  |      defined by profile       |           length              |
///  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///  |                        header extension                       |
///  |                             ....                              |
/// ```
///
/// The length field counts the number of 32-bit words in the extension,
/// excluding the four-octet extension header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension<'a> {
    /// defined by profile.
    pub profile: u16,
    /// header extension data, without the four-octet extension header.
    pub data: &'a [u8],
}

impl<'a> Extension<'a> {
    /// Number of 32-bit words announced in the length field.
    pub fn words(&self) -> usize {
        padded(self.data.len()) / 4
    }

    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::rtp::Extension;
    ///
    /// let buffer = [
    ///     0xab, 0xac, 0x00, 0x01, 0x22, 0xaa, 0x36, 0x3f,
    /// ];
    ///
    /// let extension = Extension::decode(&buffer[..]).unwrap();
    /// assert_eq!(extension.size(), 8);
    /// ```
    /// Size of the extension region, header included.
    pub fn size(&self) -> usize {
        4 + padded(self.data.len())
    }

    /// Writes the extension header and data, zero padding the data to a
    /// word boundary.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use onvif_timestamp_codec::rtp::Extension;
    ///
    /// let buffer = [
    ///     0xbe, 0xde, 0x00, 0x01, 0x22, 0xaa, 0x36, 0x00,
    /// ];
    ///
    /// let mut writer = BytesMut::new();
    /// Extension {
    ///     profile: 0xBEDE,
    ///     data: &[0x22, 0xaa, 0x36],
    /// }
    /// .encode(&mut writer)
    /// .unwrap();
    ///
    /// assert_eq!(&writer[..], &buffer[..]);
    /// ```
    pub fn encode(&self, bytes: &mut BytesMut) -> Result<(), Error> {
        let words = u16::try_from(self.words()).map_err(|_| Error::ExtensionTooLong)?;

        bytes.put_u16(self.profile);
        bytes.put_u16(words);
        bytes.put(self.data);
        bytes.put_bytes(0, padded(self.data.len()) - self.data.len());
        Ok(())
    }

    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::rtp::Extension;
    ///
    /// let buffer = [
    ///     0xab, 0xac, 0x00, 0x01, 0x22, 0xaa, 0x36, 0x3f, 0x80,
    /// ];
    ///
    /// let extension = Extension::decode(&buffer[..]).unwrap();
    /// assert_eq!(extension.profile, 0xABAC);
    /// assert_eq!(extension.data, &[0x22, 0xaa, 0x36, 0x3f]);
    /// ```
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < 4 {
            return Err(Error::InvalidInput);
        }

        let profile = u16::from_be_bytes([bytes[0], bytes[1]]);
        let size = u16::from_be_bytes([bytes[2], bytes[3]]) as usize * 4;
        if size > bytes.len() - 4 {
            return Err(Error::InvalidInput);
        }

        Ok(Self {
            profile,
            data: &bytes[4..4 + size],
        })
    }
}

/// ### RTP Data Transfer Protocol
///
/// ```bash
///   0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           synchronization source (SSRC) identifier            |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |            contributing source (CSRC) identifiers             |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// A borrowed view over an RTP packet.  The payload is never
/// interpreted, only located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rtp<'a> {
    /// The interpretation of the marker is defined by a profile.  It is
    /// intended to allow significant events such as frame boundaries to
    /// be marked in the packet stream.
    pub marker: bool,
    /// This field identifies the format of the RTP payload and determines
    /// its interpretation by the application.
    pub kind: u8,
    /// The sequence number increments by one for each RTP data packet
    /// sent, and may be used by the receiver to detect packet loss and to
    /// restore packet sequence.
    pub sequence_number: u16,
    /// The timestamp reflects the sampling instant of the first octet in
    /// the RTP data packet.
    pub timestamp: u32,
    /// The SSRC field identifies the synchronization source.
    pub ssrc: u32,
    /// The CSRC list identifies the contributing sources for the payload
    /// contained in this packet.
    pub csrc_list: Vec<u32>,
    /// If the extension bit is set, the fixed header MUST be followed by
    /// exactly one header extension.
    pub extension: Option<Extension<'a>>,
    pub payload: &'a [u8],
    /// Padding octets, the last octet holds the padding count including
    /// itself.
    pub padding: Option<&'a [u8]>,
}

impl<'a> Rtp<'a> {
    /// Size of the fixed header, the csrc list and the extension region.
    pub fn header_size(&self) -> usize {
        FIXED_HEADER_SIZE
            + self.csrc_list.len() * 4
            + self.extension.as_ref().map(Extension::size).unwrap_or(0)
    }

    /// Size of the whole packet once encoded.
    pub fn size(&self) -> usize {
        self.header_size() + self.payload.len() + self.padding.map(<[u8]>::len).unwrap_or(0)
    }

    /// Replaces the header extension region, `None` removes it.
    pub fn with_extension(self, extension: Option<Extension<'a>>) -> Self {
        Self { extension, ..self }
    }

    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use onvif_timestamp_codec::rtp::*;
    ///
    /// let buffer = [
    ///     0x90, 0xe0, 0x04, 0xf1, 0xf8, 0x87, 0x3f, 0xad, 0x67, 0xfe,
    ///     0x9d, 0xfc, 0xbe, 0xde, 0x00, 0x01, 0x22, 0xaa, 0x36, 0x3f,
    ///     0x01, 0x02, 0x03, 0x04,
    /// ];
    ///
    /// let rtp = Rtp {
    ///     marker: true,
    ///     kind: 96,
    ///     sequence_number: 1265,
    ///     timestamp: 4169613229,
    ///     ssrc: 1744739836,
    ///     csrc_list: Vec::new(),
    ///     extension: Some(Extension {
    ///         profile: 0xBEDE,
    ///         data: &[0x22, 0xaa, 0x36, 0x3f],
    ///     }),
    ///     payload: &[0x01, 0x02, 0x03, 0x04],
    ///     padding: None,
    /// };
    ///
    /// let mut writer = BytesMut::new();
    /// rtp.encode(&mut writer).unwrap();
    /// assert_eq!(&writer[..], &buffer[..]);
    /// ```
    pub fn encode(&self, bytes: &mut BytesMut) -> Result<(), Error> {
        if self.csrc_list.len() > MAX_CSRC_COUNT {
            return Err(Error::InvalidInput);
        }

        let mut head = RTP_VERSION << 6;
        if self.padding.is_some() {
            head |= PADDING_MASK;
        }

        if self.extension.is_some() {
            head |= EXTENSION_MASK;
        }

        head |= self.csrc_list.len() as u8;

        let mut kind = self.kind & PAYLOAD_KIND_MASK;
        if self.marker {
            kind |= MARKER_MASK;
        }

        bytes.reserve(self.size());
        bytes.put_u8(head);
        bytes.put_u8(kind);
        bytes.put_u16(self.sequence_number);
        bytes.put_u32(self.timestamp);
        bytes.put_u32(self.ssrc);

        for item in &self.csrc_list {
            bytes.put_u32(*item);
        }

        if let Some(extension) = &self.extension {
            extension.encode(bytes)?;
        }

        bytes.put(self.payload);

        if let Some(padding) = self.padding {
            bytes.put(padding);
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> Result<BytesMut, Error> {
        let mut bytes = BytesMut::with_capacity(self.size());
        self.encode(&mut bytes)?;
        Ok(bytes)
    }

    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::rtp::Rtp;
    ///
    /// let buffer = [
    ///     0xB0, 0x72, 0x04, 0xf1, 0xf8, 0x87, 0x3f, 0xad, 0x67, 0xfe,
    ///     0x9d, 0xfc, 0xbe, 0xde, 0x00, 0x01, 0x22, 0xaa, 0x36, 0x3f,
    ///     0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x01, 0x05,
    /// ];
    ///
    /// let rtp = Rtp::decode(&buffer[..]).unwrap();
    /// assert_eq!(rtp.marker, false);
    /// assert_eq!(rtp.kind, 114);
    /// assert_eq!(rtp.sequence_number, 1265);
    /// assert_eq!(rtp.timestamp, 4169613229);
    /// assert_eq!(rtp.ssrc, 1744739836);
    /// assert!(rtp.csrc_list.is_empty());
    ///
    /// let extension = rtp.extension.unwrap();
    /// assert_eq!(extension.profile, 0xBEDE);
    /// assert_eq!(extension.data, &[0x22, 0xaa, 0x36, 0x3f]);
    ///
    /// assert_eq!(rtp.payload, &[0x00, 0x00, 0x00, 0x00, 0x00]);
    /// assert_eq!(rtp.padding, Some(&[0x01, 0x01, 0x01, 0x01, 0x05][..]));
    /// ```
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(Error::InvalidInput);
        }

        if (bytes[0] & VERSION_MASK) >> 6 != RTP_VERSION {
            return Err(Error::InvalidInput);
        }

        let has_padding = bytes[0] & PADDING_MASK != 0;
        let has_extension = bytes[0] & EXTENSION_MASK != 0;
        let csrc_count = (bytes[0] & CSRC_COUNT_MASK) as usize;
        let marker = bytes[1] & MARKER_MASK != 0;
        let kind = bytes[1] & PAYLOAD_KIND_MASK;
        let sequence_number = u16::from_be_bytes([bytes[2], bytes[3]]);
        let timestamp = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let ssrc = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

        let mut offset = FIXED_HEADER_SIZE + csrc_count * 4;
        if bytes.len() < offset {
            return Err(Error::InvalidInput);
        }

        let csrc_list = bytes[FIXED_HEADER_SIZE..offset]
            .chunks_exact(4)
            .map(|item| u32::from_be_bytes([item[0], item[1], item[2], item[3]]))
            .collect::<Vec<u32>>();

        let extension = if has_extension {
            let extension = Extension::decode(&bytes[offset..])?;
            offset += extension.size();
            Some(extension)
        } else {
            None
        };

        let mut end = bytes.len();
        let padding = if has_padding {
            if end == offset {
                return Err(Error::InvalidInput);
            }

            let size = bytes[end - 1] as usize;
            if size == 0 || size > end - offset {
                return Err(Error::InvalidInput);
            }

            end -= size;
            Some(&bytes[end..])
        } else {
            None
        };

        Ok(Self {
            marker,
            kind,
            sequence_number,
            timestamp,
            ssrc,
            csrc_list,
            extension,
            payload: &bytes[offset..end],
            padding,
        })
    }
}
