use std::time::Duration;

use ptp_rtc::{InstanceConfig, MacAddress, PortConfig, Role, Rtc, Timestamp};
use ptp_rtcd::daemon::{
    clock::{SharedRtc, SoftwareRtc},
    network::{Link, LoopbackSegment},
    system,
};

fn nanos(timestamp: Timestamp) -> i128 {
    timestamp.seconds as i128 * 1_000_000_000 + timestamp.nanos as i128
}

fn node(priority_1: u8, mac: [u8; 6]) -> (InstanceConfig, PortConfig) {
    let instance = InstanceConfig {
        priority_1,
        ..Default::default()
    };
    let port = PortConfig {
        tick_interval_ms: 10,
        link_delay_threshold_ns: 50_000_000,
        source_mac: MacAddress(mac),
        ..Default::default()
    };
    (instance, port)
}

#[tokio::test]
async fn slave_follows_master_over_loopback() {
    let segment = LoopbackSegment::new();

    let (instance_a, port_a) = node(1, [0x02, 0, 0, 0, 0, 0x0a]);
    let rtc_a = SharedRtc::new(SoftwareRtc::new(port_a.nominal_increment()));
    let (_handle_a, channels_a) = system::spawn(
        instance_a,
        port_a,
        Link::Loopback(segment.connect()),
        rtc_a.clone(),
    );

    let (instance_b, port_b) = node(254, [0x02, 0, 0, 0, 0, 0x0b]);
    let rtc_b = SharedRtc::new(SoftwareRtc::with_offset(
        port_b.nominal_increment(),
        3_250_000_000,
    ));
    let (_handle_b, mut channels_b) = system::spawn(
        instance_b,
        port_b,
        Link::Loopback(segment.connect()),
        rtc_b.clone(),
    );

    let before = nanos(rtc_b.now()) - nanos(rtc_a.now());
    assert!(before > 3_000_000_000);

    let synced = tokio::time::timeout(Duration::from_secs(5), async {
        channels_b
            .snapshot_receiver
            .wait_for(|snapshot| snapshot.role == Role::Slave && snapshot.last_offset.is_some())
            .await
            .is_ok()
    })
    .await;
    assert_eq!(synced, Ok(true), "b never synchronized to a");

    // a few more corrections
    tokio::time::sleep(Duration::from_millis(500)).await;

    let after = nanos(rtc_b.now()) - nanos(rtc_a.now());
    assert!(after.abs() < 20_000_000, "clocks still {after}ns apart");

    let snapshot_a = *channels_a.snapshot_receiver.borrow();
    assert_eq!(snapshot_a.role, Role::Master);
    assert!(snapshot_a.peer_capable);

    let snapshot_b = *channels_b.snapshot_receiver.borrow();
    assert_eq!(
        snapshot_b.current_bmc.source_port_identity,
        snapshot_a.identity
    );
}
