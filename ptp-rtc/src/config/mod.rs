//! Configuration of a PTP instance and its port

mod instance;
mod port;

pub use instance::*;
pub use port::*;
