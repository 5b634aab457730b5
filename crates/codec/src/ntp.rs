use super::Error;

/// One second in presentation timestamp units (nanoseconds).
pub const SECOND: i64 = 1_000_000_000;

/// One second in NTP fraction units.
const NTP_SCALE: u128 = 1 << 32;

/// NTP timestamp representation (64 bits).
///
/// As defined in RFC 5905, the integer part counts seconds since
/// 1900-01-01 and the fraction part counts units of 2^-32 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct NtpTimestamp {
    /// Seconds since January 1, 1900.
    pub seconds: u32,
    /// Fraction of a second.
    pub fraction: u32,
}

impl NtpTimestamp {
    pub fn from_u64(value: u64) -> Self {
        Self {
            seconds: (value >> 32) as u32,
            fraction: value as u32,
        }
    }

    pub fn to_u64(&self) -> u64 {
        (self.seconds as u64) << 32 | self.fraction as u64
    }

    /// Nanoseconds since the NTP epoch, rounded to the nearest nanosecond.
    ///
    /// # Test
    ///
    /// ```
    /// use onvif_timestamp_codec::NtpTimestamp;
    ///
    /// let timestamp = NtpTimestamp {
    ///     seconds: 2,
    ///     fraction: 0x8000_0000,
    /// };
    ///
    /// assert_eq!(timestamp.to_nanos(), 2_500_000_000);
    /// ```
    pub fn to_nanos(&self) -> u64 {
        let value = self.to_u64() as u128 * SECOND as u128;
        ((value + NTP_SCALE / 2) / NTP_SCALE) as u64
    }
}

impl From<u64> for NtpTimestamp {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<NtpTimestamp> for u64 {
    fn from(value: NtpTimestamp) -> Self {
        value.to_u64()
    }
}

/// Converts a presentation timestamp to a 64-bit NTP fixed point value.
///
/// `offset_seconds` is added to the timestamp first, it maps the clock the
/// timestamps are expressed in onto the NTP epoch.  The rescale is done in
/// 128-bit arithmetic and rounds to the nearest fraction unit, so whole
/// seconds always produce a zero fraction.  Values past the 32-bit seconds
/// range wrap into the next NTP era.
///
/// # Test
///
/// ```
/// use onvif_timestamp_codec::{Error, NtpTimestamp, convert, ntp::SECOND};
///
/// let ntp = convert(Some(3 * SECOND + SECOND / 4), 1245).unwrap();
/// assert_eq!(
///     NtpTimestamp::from_u64(ntp),
///     NtpTimestamp {
///         seconds: 1248,
///         fraction: 0x4000_0000,
///     }
/// );
///
/// assert_eq!(convert(None, 0), Err(Error::MissingTimestamp));
/// ```
pub fn convert(timestamp: Option<i64>, offset_seconds: u64) -> Result<u64, Error> {
    let timestamp = timestamp.ok_or(Error::MissingTimestamp)?;
    let value = timestamp as i128 + offset_seconds as i128 * SECOND as i128;
    if value < 0 {
        return Err(Error::NegativeTimestamp);
    }

    let value = value as u128 * NTP_SCALE;
    Ok(((value + SECOND as u128 / 2) / SECOND as u128) as u64)
}
