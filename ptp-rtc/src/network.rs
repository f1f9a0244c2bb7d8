//! Definition of the abstract network type

/// Abstraction for the Ethernet MAC
///
/// Sending is fire-and-forget: the engine logs a failed send and carries on.
/// Received frames and transmit timestamps flow the other way, the MAC
/// driver reports them through
/// [`PtpInstance::handle_receive`](crate::PtpInstance::handle_receive) and
/// [`PtpInstance::handle_send_timestamp`](crate::PtpInstance::handle_send_timestamp).
pub trait Mac {
    type Error: core::fmt::Debug;

    /// Queue a complete Ethernet frame for transmission.
    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}
