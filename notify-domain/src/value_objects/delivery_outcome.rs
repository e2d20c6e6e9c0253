// Delivery outcome value object

/// Result of one delivery attempt to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The remote end is permanently unreachable; the record should be dropped.
    Gone,
    TransientError(String),
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Gone => "gone",
            DeliveryOutcome::TransientError(_) => "transient_error",
        }
    }
}
