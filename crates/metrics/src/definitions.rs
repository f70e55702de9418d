//! Metric names and label keys.

/// Resolve-and-reply flow
pub mod responder {
    /// Inbound events handled, by event kind
    pub const EVENTS_RECEIVED_TOTAL: &str = "roster_responder_events_received_total";
    /// Replies delivered through a gateway
    pub const REPLIES_SENT_TOTAL: &str = "roster_responder_replies_sent_total";
    /// Message objects delivered across all replies
    pub const MESSAGES_SENT_TOTAL: &str = "roster_responder_messages_sent_total";
    /// Events answered with silence, by reason
    pub const SILENT_TOTAL: &str = "roster_responder_silent_total";
    /// Replies the gateway failed to deliver
    pub const DELIVERY_FAILURES_TOTAL: &str = "roster_responder_delivery_failures_total";
    /// Time from event to delivered reply, in seconds
    pub const PROCESSING_DURATION_SECONDS: &str = "roster_responder_processing_duration_seconds";
}

/// Reply table and slot assembly
pub mod content {
    /// Table parses, by result (`ok` / `error`)
    pub const TABLE_RELOADS_TOTAL: &str = "roster_content_table_reloads_total";
    /// Rows in the most recently loaded table
    pub const TABLE_ROWS: &str = "roster_content_table_rows";
    /// Populated slots that were not sent, by reason
    pub const SLOTS_DROPPED_TOTAL: &str = "roster_content_slots_dropped_total";
}

/// LINE reply endpoint
pub mod line {
    /// Reply requests, by HTTP status (`error` when no response arrived)
    pub const REPLY_REQUESTS_TOTAL: &str = "roster_line_reply_requests_total";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const REASON: &str = "reason";
    pub const RESULT: &str = "result";
    pub const GATEWAY: &str = "gateway";
    pub const STATUS: &str = "status";
}

/// Histogram buckets
pub mod buckets {
    /// Event handling, dominated by one reply round trip.
    pub const PROCESSING_DURATION: [f64; 10] =
        [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];
}
