//! Diagnostic counters.
//!
//! All counters are monotonic and sampled without locking, so a snapshot
//! taken while traffic is flowing may be momentarily inconsistent between
//! fields. They answer "is this pipeline losing data, and where".

/// Decode-side counters for one input channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Messages decoded and handed to the dispatcher.
    pub decoded: u64,
    /// Byte sequences the decoder discarded as malformed.
    pub malformed: u64,
    /// Messages removed by the ignore filter.
    pub ignored: u64,
}

/// Delivery counters for one subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberStats {
    /// Events handed to the subscriber callback.
    pub delivered: u64,
    /// Events lost to the overflow policy because the queue was full.
    pub overflowed: u64,
    /// Events discarded because their source port closed before delivery.
    pub dropped_on_close: u64,
}

/// Engine-wide totals. Loss counters are cumulative and survive channel
/// close and unsubscribe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Input channels currently open.
    pub open_inputs: usize,
    /// Active subscribers.
    pub subscribers: usize,
    /// Malformed byte sequences discarded across all inputs.
    pub malformed: u64,
    /// Events lost to overflow across all subscribers.
    pub overflowed: u64,
    /// Events dropped at delivery time because their port had closed.
    pub dropped_on_close: u64,
}
