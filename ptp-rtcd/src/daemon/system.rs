use std::time::Duration;

use ptp_rtc::{InstanceConfig, MessageType, PortConfig, PortSnapshot, PtpInstance, Timestamp};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use super::{
    clock::SharedRtc,
    network::{run_link, ChannelMac, Link},
};

const MESSAGE_BUFFER_SIZE: usize = 32;

/// Everything that happens to the protocol engine, apart from its ticks
#[derive(Debug)]
pub enum PtpEvent {
    /// A frame arrived at the given RTC time
    Receive { data: Vec<u8>, timestamp: Timestamp },
    /// A frame of this type left at the given RTC time
    SendTimestamp {
        message_type: MessageType,
        timestamp: Timestamp,
    },
    /// The link failed, all protocol state is to be discarded
    Fault,
}

pub struct DaemonChannels {
    pub snapshot_receiver: watch::Receiver<PortSnapshot>,
    pub event_sender: mpsc::Sender<PtpEvent>,
}

/// Starts the protocol driver and the link task feeding it.
pub fn spawn(
    instance_config: InstanceConfig,
    port_config: PortConfig,
    link: Link,
    rtc: SharedRtc,
) -> (JoinHandle<()>, DaemonChannels) {
    let (frame_sender, frame_receiver) = mpsc::channel(MESSAGE_BUFFER_SIZE);
    let (event_sender, event_receiver) = mpsc::channel(MESSAGE_BUFFER_SIZE);

    let instance = PtpInstance::new(
        instance_config,
        port_config,
        ChannelMac::new(frame_sender),
        rtc.clone(),
    );
    let (snapshot_sender, snapshot_receiver) = watch::channel(instance.snapshot());

    tokio::spawn(run_link(link, rtc, frame_receiver, event_sender.clone()));

    let mut task = PtpTask {
        instance,
        events: event_receiver,
        snapshot_sender,
        tick_interval: port_config.tick_interval(),
    };
    let handle = tokio::spawn(async move { task.run().await });

    (
        handle,
        DaemonChannels {
            snapshot_receiver,
            event_sender,
        },
    )
}

/// Sole owner of the protocol instance.
struct PtpTask {
    instance: PtpInstance<ChannelMac, SharedRtc>,
    events: mpsc::Receiver<PtpEvent>,
    snapshot_sender: watch::Sender<PortSnapshot>,
    tick_interval: Duration,
}

impl PtpTask {
    async fn run(&mut self) {
        info!(identity = %self.instance.port_identity(), "ptp driver running");

        let mut ticker = tokio::time::interval(self.tick_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.instance.handle_tick();
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        break;
                    };

                    match event {
                        PtpEvent::Receive { data, timestamp } => {
                            self.instance.handle_receive(&data, timestamp);
                        }
                        PtpEvent::SendTimestamp { message_type, timestamp } => {
                            self.instance.handle_send_timestamp(message_type, timestamp);
                        }
                        PtpEvent::Fault => {
                            warn!("link fault, restarting the protocol");
                            self.instance.reset();
                            ticker.reset();
                        }
                    }
                }
            }

            self.publish();
        }

        debug!("event channel closed, ptp driver stopped");
    }

    fn publish(&self) {
        let snapshot = self.instance.snapshot();
        self.snapshot_sender.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use ptp_rtc::{
        datastructures::messages::{FrameTemplate, TxFrames},
        ClockIdentity, ClockQuality, MacAddress, PortIdentity, Role,
    };

    use super::*;
    use crate::daemon::{clock::SoftwareRtc, network::LoopbackSegment};

    fn better_announce() -> Vec<u8> {
        let source_mac = MacAddress([0x00, 0x0a, 0x35, 0x0a, 0x0b, 0x0c]);
        let frames = TxFrames::new(&FrameTemplate {
            destination_mac: MacAddress::PTP_PEER_MULTICAST,
            source_mac,
            source_port_identity: PortIdentity {
                clock_identity: ClockIdentity::from_mac_address(source_mac),
                port_number: 1,
            },
            priority_1: 1,
            priority_2: 128,
            clock_quality: ClockQuality::default(),
            time_source: 0x90,
            log_announce_interval: 1,
            log_sync_interval: 0,
        });
        frames.announce.as_bytes().to_vec()
    }

    async fn wait_for_role(receiver: &mut watch::Receiver<PortSnapshot>, role: Role) {
        let result = tokio::time::timeout(Duration::from_secs(2), async {
            receiver
                .wait_for(|snapshot| snapshot.role == role)
                .await
                .map(|_| ())
        })
        .await;
        assert!(matches!(result, Ok(Ok(()))), "never became {role}");
    }

    #[tokio::test]
    async fn events_drive_the_instance() {
        let segment = LoopbackSegment::new();
        let rtc = SharedRtc::new(SoftwareRtc::new(9));
        let (_handle, mut channels) = spawn(
            InstanceConfig::default(),
            PortConfig::default(),
            Link::Loopback(segment.connect()),
            rtc,
        );

        assert_eq!(channels.snapshot_receiver.borrow().role, Role::Master);

        channels
            .event_sender
            .send(PtpEvent::Receive {
                data: better_announce(),
                timestamp: Timestamp::default(),
            })
            .await
            .unwrap();
        wait_for_role(&mut channels.snapshot_receiver, Role::Slave).await;

        channels.event_sender.send(PtpEvent::Fault).await.unwrap();
        wait_for_role(&mut channels.snapshot_receiver, Role::Master).await;
        assert!(channels.snapshot_receiver.borrow().running);
    }

    #[tokio::test]
    async fn ticks_send_peer_delay_requests() {
        let segment = LoopbackSegment::new();
        let mut observer = segment.connect();
        let rtc = SharedRtc::new(SoftwareRtc::new(9));
        let port_config = PortConfig {
            tick_interval_ms: 5,
            ..Default::default()
        };
        let (_handle, _channels) = spawn(
            InstanceConfig::default(),
            port_config,
            Link::Loopback(segment.connect()),
            rtc,
        );

        let mut buf = [0u8; 128];
        let len = tokio::time::timeout(Duration::from_secs(2), observer.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let frame = ptp_rtc::Frame::new(&buf[..len]).unwrap();
        assert_eq!(frame.message_type(), MessageType::PDelayReq);
    }
}
