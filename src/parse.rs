use anyhow::{Result, bail};
use codec::OnvifExtension;
use parking_lot::Mutex;
use service::{Packet, ParseStage};

use crate::{Downstream, Element, Event};

/// Receiver side element, turns the ONVIF extension back into packet
/// flags and strips it.  Events are forwarded untouched.
pub struct ParseElement<D> {
    stage: Mutex<Option<ParseStage>>,
    downstream: Mutex<D>,
}

impl<D: Downstream> ParseElement<D> {
    pub fn new(downstream: D) -> Self {
        Self {
            stage: Mutex::new(None),
            downstream: Mutex::new(downstream),
        }
    }

    /// Extension of the last packet handled, see
    /// [`ParseStage::last_extension`].
    pub fn last_extension(&self) -> Option<OnvifExtension> {
        self.stage.lock().as_ref()?.last_extension()
    }

    pub fn into_downstream(self) -> D {
        self.downstream.into_inner()
    }
}

impl<D: Downstream> Element for ParseElement<D> {
    fn start(&self) -> Result<()> {
        *self.stage.lock() = Some(ParseStage::new());
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        *self.stage.lock() = None;
        Ok(())
    }

    fn handle_packet(&self, packet: Packet) -> Result<()> {
        let mut stage = self.stage.lock();
        let Some(stage) = stage.as_mut() else {
            bail!("parse element is not started");
        };

        self.downstream.lock().push(stage.process(packet))
    }

    fn handle_event(&self, event: Event) -> Result<()> {
        if self.stage.lock().is_none() {
            bail!("parse element is not started");
        }

        self.downstream.lock().push_event(event)
    }
}
