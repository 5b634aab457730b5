use anyhow::{Result, bail};
use parking_lot::Mutex;
use service::{ApplyOptions, ApplyStage, Packet, Segment};

use crate::{Downstream, Element, Event};

/// Sender side element, stamps every packet with the ONVIF extension.
///
/// Output lags input by one packet: the packet handed to
/// [`Element::handle_packet`] is held until the next packet, the end of
/// the stream or a flush decides whether it closes its contiguous run.
pub struct TimestampElement<D> {
    options: ApplyOptions,
    stage: Mutex<Option<ApplyStage>>,
    downstream: Mutex<D>,
}

impl<D: Downstream> TimestampElement<D> {
    pub fn new(options: ApplyOptions, downstream: D) -> Self {
        Self {
            stage: Mutex::new(None),
            downstream: Mutex::new(downstream),
            options,
        }
    }

    pub fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// NTP offset currently applied, `None` when stopped.
    pub fn ntp_offset(&self) -> Option<u64> {
        self.stage.lock().as_ref().map(|stage| stage.ntp_offset())
    }

    /// Gives the sink back, dropping the element.
    pub fn into_downstream(self) -> D {
        self.downstream.into_inner()
    }
}

impl<D: Downstream> Element for TimestampElement<D> {
    fn start(&self) -> Result<()> {
        log::info!("timestamp element start: options={:?}", self.options);

        *self.stage.lock() = Some(ApplyStage::new(self.options));
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if let Some(mut stage) = self.stage.lock().take() {
            stage.reset();
        }

        log::info!("timestamp element stop");
        Ok(())
    }

    fn handle_packet(&self, packet: Packet) -> Result<()> {
        let mut stage = self.stage.lock();
        let Some(stage) = stage.as_mut() else {
            bail!("timestamp element is not started");
        };

        if let Some(packet) = stage.process(packet)? {
            self.downstream.lock().push(packet)?;
        }

        Ok(())
    }

    fn handle_event(&self, event: Event) -> Result<()> {
        let mut stage = self.stage.lock();
        let Some(stage) = stage.as_mut() else {
            bail!("timestamp element is not started");
        };

        log::debug!("timestamp element event: {:?}", event);

        match &event {
            Event::Eos => {
                if let Some(packet) = stage.flush_eos()? {
                    self.downstream.lock().push(packet)?;
                }
            }
            Event::FlushStart => stage.reset(),
            Event::FlushStop => stage.set_segment(Segment::default()),
            Event::Segment(segment) => stage.set_segment(*segment),
            Event::NtpOffset {
                ntp_offset,
                discont,
            } => {
                stage.set_ntp_offset(*ntp_offset, *discont);
                return Ok(());
            }
            Event::StreamStart(_) => (),
        }

        self.downstream.lock().push_event(event)
    }
}
