use crate::traits::codec::AudioCodec;

/// Requested vs. accepted per-channel bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitrateState {
    pub requested: u32,
    /// Last value committed on a live codec; `None` until one exists.
    pub actual: Option<u32>,
}

/// Negotiates a bitrate the codec will accept.
///
/// Tries the requested value, then retreats by `step` after every rejection.
/// Once the next candidate would fall below `floor`, the floor is committed
/// whatever the codec says. Never fails outward.
#[derive(Debug, Clone)]
pub struct BitrateController {
    state: BitrateState,
    floor: u32,
    step: u32,
    pending: bool,
}

impl BitrateController {
    pub fn new(requested: u32, floor: u32, step: u32) -> Self {
        Self {
            state: BitrateState {
                requested,
                actual: None,
            },
            floor,
            step: step.max(1),
            pending: true,
        }
    }

    pub fn state(&self) -> BitrateState {
        self.state
    }

    pub fn requested(&self) -> u32 {
        self.state.requested
    }

    pub fn actual(&self) -> Option<u32> {
        self.state.actual
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// True when a request is waiting for a codec to exist.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record `requested` and, if a codec is live, negotiate it now.
    ///
    /// Without a codec the request is deferred until `reapply`.
    pub fn apply(
        &mut self,
        requested: u32,
        codec: Option<&mut dyn AudioCodec>,
        channels: u32,
    ) -> Option<u32> {
        self.state.requested = requested;
        match codec {
            Some(codec) => Some(self.negotiate(codec, channels)),
            None => {
                self.pending = true;
                log::debug!("bitrate {} deferred until a codec exists", requested);
                None
            }
        }
    }

    /// Negotiate the stored request against a freshly built codec.
    pub fn reapply(&mut self, codec: &mut dyn AudioCodec, channels: u32) -> u32 {
        self.negotiate(codec, channels)
    }

    /// Forget the accepted value; the next codec starts from the request again.
    pub fn reset(&mut self) {
        self.state.actual = None;
        self.pending = true;
    }

    fn negotiate(&mut self, codec: &mut dyn AudioCodec, channels: u32) -> u32 {
        let channels = channels.max(1);
        let mut candidate = self.state.requested;
        let mut floor_tried = false;

        let settled = loop {
            if candidate < self.floor {
                if !floor_tried {
                    if let Err(e) = codec.set_bitrate(self.floor.saturating_mul(channels)) {
                        log::debug!("floor bitrate {} rejected, committing anyway: {}", self.floor, e);
                    }
                }
                break self.floor;
            }

            match codec.set_bitrate(candidate.saturating_mul(channels)) {
                Ok(()) => break candidate,
                Err(e) => {
                    log::debug!("bitrate {} rejected: {}", candidate, e);
                    floor_tried |= candidate == self.floor;
                    candidate = candidate.saturating_sub(self.step);
                    if floor_tried {
                        candidate = 0;
                    }
                }
            }
        };

        self.state.actual = Some(settled);
        self.pending = false;
        log::info!(
            "bitrate settled at {} bps per channel (requested {})",
            settled,
            self.state.requested
        );
        settled
    }
}
