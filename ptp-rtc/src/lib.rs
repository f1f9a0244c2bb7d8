//! A sans-IO IEEE-1588 (PTPv2) engine that disciplines a hardware real-time
//! clock using peer-to-peer delay measurement over raw Ethernet frames.
//!
//! The engine never touches sockets or timers itself. The embedding
//! application owns a [`PtpInstance`] and drives it by calling
//! [`PtpInstance::handle_tick`] on a fixed period,
//! [`PtpInstance::handle_receive`] for every received frame and
//! [`PtpInstance::handle_send_timestamp`] whenever the MAC reports the
//! transmit timestamp of a sent frame. Hardware is reached through the
//! [`Rtc`] and [`Mac`] traits.

pub mod bmc;
pub mod clock;
pub mod config;
pub mod datastructures;
pub mod network;
pub mod port;
pub mod ptp_instance;

pub use bmc::BmcData;
pub use clock::Rtc;
pub use config::{InstanceConfig, PortConfig};
pub use datastructures::{
    common::{
        compare_clock_identity, compare_port_identity, ClockIdentity, ClockQuality, MacAddress,
        PortIdentity, Timestamp,
    },
    messages::{Frame, FrameError, MessageType, MAX_FRAME_LEN},
    WireFormatError,
};
pub use network::Mac;
pub use port::{OffsetSnapshot, PortSnapshot, Role};
pub use ptp_instance::PtpInstance;
