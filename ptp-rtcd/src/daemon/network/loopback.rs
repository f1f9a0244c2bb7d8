use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::broadcast;
use tracing::warn;

use super::NetworkError;

const SEGMENT_CAPACITY: usize = 256;

/// An in-memory Ethernet segment. Every frame sent by one of its ports is
/// delivered to all other ports.
#[derive(Debug, Clone)]
pub struct LoopbackSegment {
    sender: broadcast::Sender<(usize, Vec<u8>)>,
    next_id: Arc<AtomicUsize>,
}

impl LoopbackSegment {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SEGMENT_CAPACITY);
        LoopbackSegment {
            sender,
            next_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connect(&self) -> LoopbackPort {
        LoopbackPort {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            sender: self.sender.clone(),
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for LoopbackSegment {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct LoopbackPort {
    id: usize,
    sender: broadcast::Sender<(usize, Vec<u8>)>,
    receiver: broadcast::Receiver<(usize, Vec<u8>)>,
}

impl LoopbackPort {
    pub fn send(&self, frame: &[u8]) -> Result<(), NetworkError> {
        self.sender
            .send((self.id, frame.to_vec()))
            .map(|_| ())
            .map_err(|_| NetworkError::LinkClosed)
    }

    /// Waits for the next frame sent by another port. Frames longer than
    /// `buf` are truncated.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetworkError> {
        loop {
            match self.receiver.recv().await {
                Ok((sender, _)) if sender == self.id => continue,
                Ok((_, frame)) => {
                    let len = frame.len().min(buf.len());
                    buf[..len].copy_from_slice(&frame[..len]);
                    return Ok(len);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "loopback port fell behind, frames lost");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(NetworkError::LinkClosed),
            }
        }
    }
}
