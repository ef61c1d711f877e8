//! End-to-end cluster formation driven directly through the protocol API.
//!
//! One head and two members exchange the full announcement / ack /
//! schedule / data / relay sequence, with every command routed by hand so
//! each intermediate state can be checked.

use leachnet_protocol::{
    Address, BaseStation, Command, Duration, Message, NoEnergy, Node, ProtocolConfig, Role, Timer,
    Timestamp,
};

const STATION: Address = Address::new(0);
const A: Address = Address::new(1);
const B: Address = Address::new(2);
const C: Address = Address::new(3);

fn config(share: f64) -> ProtocolConfig {
    ProtocolConfig::default()
        .with_cluster_head_share(share)
        .with_max_start_variance(Duration::ZERO)
        .with_base_station(STATION)
}

fn member(addr: Address) -> Node {
    Node::new(addr, config(0.2), NoEnergy, u64::from(addr.raw())).unwrap()
}

/// A node promoted on its first tick (share 1.0 always elects).
fn head(addr: Address) -> Node {
    let mut node = Node::new(addr, config(1.0), NoEnergy, u64::from(addr.raw())).unwrap();
    node.on_timer(Timer::RoundTick, Timestamp::ZERO);
    assert!(node.role().is_head());
    node
}

fn sent_to(commands: &[Command]) -> (Address, Message) {
    match &commands[0] {
        Command::Send { to, message, .. } => (*to, message.clone()),
        other => panic!("expected a send, got {other:?}"),
    }
}

fn broadcast_schedule(commands: &[Command]) -> Vec<leachnet_protocol::ScheduleEntry> {
    match &commands[0] {
        Command::Broadcast(Message::Schedule { entries, .. }) => entries.clone(),
        other => panic!("expected a schedule broadcast, got {other:?}"),
    }
}

#[test]
fn three_node_cluster_cycle() {
    let mut a = head(A);
    let mut b = member(B);
    let mut c = member(C);
    let mut station = BaseStation::new(STATION);
    let t = Timestamp::from_millis(1);

    // B and C hear the announcement and ack the best head they know.
    let b_ack = b.on_message(Message::HeadAnnouncement { head: A }, 0.8, t);
    let c_ack = c.on_message(Message::HeadAnnouncement { head: A }, 0.6, t);
    let (b_target, b_ack_msg) = sent_to(&b_ack);
    let (c_target, c_ack_msg) = sent_to(&c_ack);
    assert_eq!(b_target, A);
    assert_eq!(c_target, A);

    // A grants slots in arrival order, rebroadcasting the whole table
    // each time.
    let sch1 = broadcast_schedule(&a.on_message(b_ack_msg, 0.8, t));
    let sch2 = broadcast_schedule(&a.on_message(c_ack_msg, 0.6, t));
    assert_eq!(sch1.len(), 1);
    assert_eq!(sch2.len(), 2);
    assert_eq!(sch2[0].member, B);
    assert_eq!(sch2[0].slot, 1);
    assert_eq!(sch2[1].member, C);
    assert_eq!(sch2[1].slot, 2);

    // Both schedule broadcasts reach both members. B re-arms its slot
    // timer on each; C only matches once its entry appears.
    let b_arm1 = b.on_message(
        Message::Schedule {
            head: A,
            entries: sch1.clone(),
        },
        0.8,
        t,
    );
    let b_arm2 = b.on_message(
        Message::Schedule {
            head: A,
            entries: sch2.clone(),
        },
        0.8,
        t,
    );
    let expected_arm = vec![Command::StartTimer {
        timer: Timer::DataSlot,
        delay: Duration::from_secs(1),
    }];
    assert_eq!(b_arm1, expected_arm);
    assert_eq!(b_arm2, expected_arm);
    // The cache appended all three entries, duplicates included.
    assert_eq!(b.schedule_cache().len(), 3);

    let c_arm1 = c.on_message(
        Message::Schedule {
            head: A,
            entries: sch1,
        },
        0.6,
        t,
    );
    let c_arm2 = c.on_message(
        Message::Schedule {
            head: A,
            entries: sch2,
        },
        0.6,
        t,
    );
    assert!(c_arm1.is_empty());
    assert_eq!(
        c_arm2,
        vec![Command::StartTimer {
            timer: Timer::DataSlot,
            delay: Duration::from_secs(2),
        }]
    );

    // Slots come due: B twice (one per received schedule), C once.
    let slot_b = Timestamp::from_millis(1_001);
    let slot_c = Timestamp::from_millis(2_001);
    let (_, b_data1) = sent_to(&b.on_timer(Timer::DataSlot, slot_b));
    let (_, b_data2) = sent_to(&b.on_timer(Timer::DataSlot, slot_b));
    let (_, c_data) = sent_to(&c.on_timer(Timer::DataSlot, slot_c));
    assert_eq!(b.counters().data_sent, 2);
    assert_eq!(c.counters().data_sent, 1);

    // The first relayed item ends A's head term.
    let relay1 = a.on_message(b_data1, 0.8, slot_b);
    assert_eq!(a.role(), Role::Nch);

    // Data still in flight takes the same relay path after demotion.
    let relay2 = a.on_message(b_data2, 0.8, slot_b);
    let relay3 = a.on_message(c_data, 0.6, slot_c);
    assert_eq!(a.counters().data_received, 3);
    assert_eq!(a.counters().relays_sent, 3);

    // A never generated these fingerprints, so none of them verified.
    assert_eq!(a.counters().data_received_verified, 0);

    // The station tallies every relay under A without deduplication,
    // even though B's two sends carried the same fingerprint.
    for relay in [relay1, relay2, relay3] {
        let (target, message) = sent_to(&relay);
        assert_eq!(target, STATION);
        station.on_message(&message, slot_c).unwrap();
    }
    assert_eq!(station.received(), 3);
    assert_eq!(station.count_for(A), 3);
    assert_eq!(station.running_counts(), &[1, 2, 3]);
    assert_eq!(station.reception_ledger()[0], station.reception_ledger()[1]);
}

#[test]
fn members_switch_to_a_stronger_head_mid_cycle() {
    let mut b = member(B);
    let t = Timestamp::from_millis(1);

    let first = b.on_message(Message::HeadAnnouncement { head: A }, 0.3, t);
    assert_eq!(sent_to(&first).0, A);

    // A stronger head appears; later acks and data follow it, while the
    // association memory keeps both entries.
    let second = b.on_message(Message::HeadAnnouncement { head: C }, 0.9, t);
    assert_eq!(sent_to(&second).0, C);
    assert_eq!(b.association().len(), 2);

    // A schedule from A still arms the slot, but the data goes to C.
    b.on_message(
        Message::Schedule {
            head: A,
            entries: vec![leachnet_protocol::ScheduleEntry { member: B, slot: 1 }],
        },
        0.3,
        t,
    );
    let (target, message) = sent_to(&b.on_timer(Timer::DataSlot, Timestamp::from_millis(1_001)));
    assert_eq!(target, C);
    assert!(matches!(message, Message::Data { sender, .. } if sender == B));
}

#[test]
fn cycle_boundary_restores_eligibility() {
    // Share 0.5 gives a two-round cycle whose second round saturates the
    // threshold, so each full cycle elects the node exactly once whatever
    // the draws were.
    let mut node = Node::new(A, config(0.5), NoEnergy, 9).unwrap();
    let mut at = Timestamp::ZERO;
    for cycle in 1..=4u32 {
        for _ in 0..2 {
            node.on_timer(Timer::RoundTick, at);
            at += Duration::from_secs(10);
        }
        assert_eq!(node.weight(), cycle);
        assert!(!node.was_head_this_cycle());
    }
}
