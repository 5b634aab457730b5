use anyhow::{Result, anyhow};
use codec::{Extension, NtpTimestamp, ONVIF_PROFILE, OnvifExtension, Rtp, ntp::SECOND};
use onvif_timestamp_service::{
    ApplyOptions, ApplyStage, Error, Packet, PacketFlags, Segment,
};

const NTP_OFFSET: u64 = 1245;
const TIMESTAMP: i64 = 42;
const PAYLOAD: &[u8] = &[0x65, 0x88, 0x84, 0x00];

fn create_rtp_packet(pts: i64, clean_point: bool, discont: bool) -> Result<Packet> {
    let data = Rtp {
        marker: true,
        kind: 96,
        sequence_number: 1,
        timestamp: 90_000,
        ssrc: 0x1234_5678,
        csrc_list: Vec::new(),
        extension: None,
        payload: PAYLOAD,
        padding: None,
    }
    .to_bytes()?;

    Ok(Packet::new(data, Some(pts)).with_flags(PacketFlags {
        delta_unit: !clean_point,
        discont,
    }))
}

fn get_extension(packet: &Packet) -> Result<OnvifExtension> {
    let rtp = packet.rtp()?;
    let extension = rtp.extension.ok_or_else(|| anyhow!("Expected extension"))?;
    Ok(OnvifExtension::from_extension(&extension)?)
}

fn create_stage() -> ApplyStage {
    ApplyStage::new(ApplyOptions {
        ntp_offset: NTP_OFFSET,
        initial_cseq: 0x78,
        force_e_bit_on_every_packet: false,
    })
}

#[test]
fn test_single_packet_flushed_on_eos() -> Result<()> {
    let mut stage = create_stage();

    assert!(stage.process(create_rtp_packet(TIMESTAMP, true, false)?)?.is_none());
    assert!(stage.has_pending());

    let packet = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    let extension = get_extension(&packet)?;

    assert_eq!(extension.ntp_time, codec::convert(Some(TIMESTAMP), NTP_OFFSET)?);
    assert!(extension.clean_point);
    assert!(extension.end_contiguous);
    assert!(!extension.discont);
    assert_eq!(extension.cseq, 0x78);

    let rtp = packet.rtp()?;
    assert_eq!(rtp.payload, PAYLOAD);
    assert_eq!(rtp.sequence_number, 1);
    assert!(rtp.marker);

    assert!(stage.flush_eos()?.is_none());
    assert!(stage.flush_eos()?.is_none());
    Ok(())
}

#[test]
fn test_flush_without_packets_is_noop() -> Result<()> {
    let mut stage = create_stage();
    assert!(stage.flush_eos()?.is_none());
    assert_eq!(stage.next_cseq(), 0x78);
    Ok(())
}

#[test]
fn test_two_packets_without_discont() -> Result<()> {
    let mut stage = create_stage();

    assert!(stage.process(create_rtp_packet(TIMESTAMP, true, false)?)?.is_none());

    let first = stage
        .process(create_rtp_packet(TIMESTAMP + 1, false, false)?)?
        .ok_or_else(|| anyhow!("Expected packet"))?;

    let extension = get_extension(&first)?;
    assert_eq!(first.pts, Some(TIMESTAMP));
    assert!(extension.clean_point);
    assert!(!extension.end_contiguous);
    assert!(!extension.discont);
    assert_eq!(extension.cseq, 0x78);

    let second = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    let extension = get_extension(&second)?;
    assert_eq!(second.pts, Some(TIMESTAMP + 1));
    assert!(!extension.clean_point);
    assert!(extension.end_contiguous);
    assert!(!extension.discont);
    assert_eq!(extension.cseq, 0x79);
    Ok(())
}

#[test]
fn test_two_packets_with_discont() -> Result<()> {
    let mut stage = create_stage();

    assert!(stage.process(create_rtp_packet(TIMESTAMP, false, false)?)?.is_none());

    let first = stage
        .process(create_rtp_packet(TIMESTAMP + 1, false, true)?)?
        .ok_or_else(|| anyhow!("Expected packet"))?;

    let extension = get_extension(&first)?;
    assert!(!extension.clean_point);
    assert!(extension.end_contiguous);
    assert!(!extension.discont);

    let second = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    let extension = get_extension(&second)?;
    assert!(extension.end_contiguous);
    assert!(extension.discont);
    Ok(())
}

#[test]
fn test_cseq_wraps() -> Result<()> {
    let mut stage = ApplyStage::new(ApplyOptions {
        initial_cseq: 250,
        ..Default::default()
    });

    let mut cseqs = Vec::new();
    for i in 0..10 {
        if let Some(packet) = stage.process(create_rtp_packet(i * SECOND, true, false)?)? {
            cseqs.push(get_extension(&packet)?.cseq);
        }
    }

    if let Some(packet) = stage.flush_eos()? {
        cseqs.push(get_extension(&packet)?.cseq);
    }

    assert_eq!(cseqs, vec![250, 251, 252, 253, 254, 255, 0, 1, 2, 3]);
    assert_eq!(stage.next_cseq(), 4);
    Ok(())
}

#[test]
fn test_whole_seconds_convert_exactly() -> Result<()> {
    let mut stage = create_stage();

    stage.process(create_rtp_packet(7 * SECOND, true, false)?)?;
    let packet = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    let ntp = get_extension(&packet)?.ntp_timestamp();

    assert_eq!(
        ntp,
        NtpTimestamp {
            seconds: 7 + NTP_OFFSET as u32,
            fraction: 0,
        }
    );

    Ok(())
}

#[test]
fn test_missing_timestamp_fails() -> Result<()> {
    let mut stage = create_stage();

    let mut packet = create_rtp_packet(TIMESTAMP, true, false)?;
    packet.pts = None;

    assert_eq!(stage.process(packet), Err(Error::MissingTimestamp));
    assert!(!stage.has_pending());
    Ok(())
}

#[test]
fn test_existing_extension_fails() -> Result<()> {
    let mut stage = create_stage();

    let mut packet = create_rtp_packet(TIMESTAMP, true, false)?;
    packet.set_extension(Some(Extension {
        profile: ONVIF_PROFILE,
        data: &OnvifExtension::default().encode(),
    }))?;

    assert_eq!(stage.process(packet), Err(Error::ExtensionPresent));
    Ok(())
}

#[test]
fn test_invalid_rtp_fails() {
    let mut stage = create_stage();
    let packet = Packet::new(bytes::BytesMut::from(&[0x00, 0x01, 0x02][..]), Some(TIMESTAMP));

    assert_eq!(
        stage.process(packet),
        Err(Error::Codec(codec::Error::InvalidInput))
    );
}

#[test]
fn test_force_e_bit_emits_immediately() -> Result<()> {
    let mut stage = ApplyStage::new(ApplyOptions {
        ntp_offset: NTP_OFFSET,
        initial_cseq: 0,
        force_e_bit_on_every_packet: true,
    });

    for (i, discont) in [false, true, false].into_iter().enumerate() {
        let packet = stage
            .process(create_rtp_packet(TIMESTAMP + i as i64, true, discont)?)?
            .ok_or_else(|| anyhow!("Expected packet"))?;

        let extension = get_extension(&packet)?;
        assert!(extension.end_contiguous);
        assert_eq!(extension.discont, discont);
        assert_eq!(extension.cseq, i as u8);
        assert!(!stage.has_pending());
    }

    assert!(stage.flush_eos()?.is_none());
    Ok(())
}

#[test]
fn test_reset_discards_pending() -> Result<()> {
    let mut stage = create_stage();

    stage.process(create_rtp_packet(TIMESTAMP, true, false)?)?;
    stage.reset();

    assert!(!stage.has_pending());
    assert!(stage.flush_eos()?.is_none());
    assert_eq!(stage.next_cseq(), 0x78);

    // the stream starts over, nothing links the next packet to the
    // discarded one.
    assert!(stage.process(create_rtp_packet(TIMESTAMP + 1, true, false)?)?.is_none());
    Ok(())
}

#[test]
fn test_ntp_offset_update_marks_discont() -> Result<()> {
    let mut stage = create_stage();

    stage.process(create_rtp_packet(SECOND, true, false)?)?;
    stage.set_ntp_offset(3_913_056_000, true);
    assert_eq!(stage.ntp_offset(), 3_913_056_000);

    // the pending packet keeps the offset it was converted with.
    let first = stage
        .process(create_rtp_packet(2 * SECOND, true, false)?)?
        .ok_or_else(|| anyhow!("Expected packet"))?;

    let extension = get_extension(&first)?;
    assert!(extension.end_contiguous);
    assert!(!extension.discont);
    assert_eq!(extension.ntp_timestamp().seconds, 1 + NTP_OFFSET as u32);

    let second = stage
        .process(create_rtp_packet(3 * SECOND, true, false)?)?
        .ok_or_else(|| anyhow!("Expected packet"))?;

    let extension = get_extension(&second)?;
    assert!(!extension.end_contiguous);
    assert!(extension.discont);
    assert_eq!(extension.ntp_timestamp().seconds, 3_913_056_002);

    let third = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    assert!(!get_extension(&third)?.discont);
    Ok(())
}

#[test]
fn test_ntp_offset_update_applies_to_next_packet() -> Result<()> {
    let mut stage = create_stage();

    stage.set_ntp_offset(3_913_056_000, true);
    stage.process(create_rtp_packet(2 * SECOND, true, false)?)?;

    let packet = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    let extension = get_extension(&packet)?;
    assert!(extension.discont);
    assert_eq!(extension.ntp_timestamp().seconds, 3_913_056_002);
    Ok(())
}

#[test]
fn test_segment_maps_to_running_time() -> Result<()> {
    let mut stage = ApplyStage::new(ApplyOptions::default());
    stage.set_segment(Segment {
        start: 5 * SECOND,
        base: SECOND,
    });

    assert_eq!(
        stage.process(create_rtp_packet(SECOND, true, false)?),
        Err(Error::OutOfSegment(SECOND))
    );

    stage.process(create_rtp_packet(7 * SECOND, true, false)?)?;
    let packet = stage.flush_eos()?.ok_or_else(|| anyhow!("Expected packet"))?;
    assert_eq!(get_extension(&packet)?.ntp_timestamp().seconds, 3);
    Ok(())
}
