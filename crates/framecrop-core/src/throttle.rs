//! Rate limiting for scale notifications to the host.
//!
//! Gesture frames arrive at display rate; the host only needs the scale for
//! things like a zoom badge. The hot path records the latest value and the
//! host is told about it at most once per interval. `flush` hands over the
//! last pending value unconditionally so a gesture end is never lost.

/// Hot-to-cold scale forwarding with a minimum interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleThrottle {
    interval_ms: f64,
    pending: Option<f64>,
    last_emit_ms: Option<f64>,
    last_sent: Option<f64>,
}

impl ScaleThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            pending: None,
            last_emit_ms: None,
            last_sent: None,
        }
    }

    /// Record the latest scale. Values equal to the last one sent are dropped.
    #[inline]
    pub fn record(&mut self, scale: f64) {
        if self.last_sent == Some(scale) {
            self.pending = None;
        } else {
            self.pending = Some(scale);
        }
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Emit the pending scale if the interval has elapsed since the last
    /// emission.
    pub fn poll(&mut self, now_ms: f64) -> Option<f64> {
        let ready = match self.last_emit_ms {
            Some(last) => now_ms - last >= self.interval_ms || now_ms < last,
            None => true,
        };
        if !ready {
            return None;
        }
        let scale = self.pending.take()?;
        self.last_emit_ms = Some(now_ms);
        self.last_sent = Some(scale);
        Some(scale)
    }

    /// Emit the pending scale regardless of the interval.
    pub fn flush(&mut self, now_ms: f64) -> Option<f64> {
        let scale = self.pending.take()?;
        self.last_emit_ms = Some(now_ms);
        self.last_sent = Some(scale);
        Some(scale)
    }
}
