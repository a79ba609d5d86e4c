//! Property-based tests for turbine-sync.
//!
//! Channel capacity and ordering must hold for every interleaving of sends
//! and receives a single thread can produce.

use proptest::prelude::*;
use quickcheck_macros::quickcheck;
use std::collections::VecDeque;
use std::time::Duration;
use turbine_sync::{BoundedChannel, IsrSender, ReadinessGroup, ReadyBits};

#[derive(Debug, Clone, Copy)]
enum Op {
    Send(u16),
    IsrSend(u16),
    Receive,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u16>().prop_map(Op::Send),
        any::<u16>().prop_map(Op::IsrSend),
        Just(Op::Receive),
    ]
}

proptest! {
    #[test]
    fn test_channel_matches_bounded_fifo_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let channel = BoundedChannel::new("model", capacity)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let isr = channel.isr_handle();
        let mut model: VecDeque<u16> = VecDeque::new();

        for op in ops {
            match op {
                Op::Send(value) => {
                    let accepted = channel.try_send(value, Duration::ZERO).is_ok();
                    prop_assert_eq!(accepted, model.len() < capacity);
                    if accepted {
                        model.push_back(value);
                    }
                }
                Op::IsrSend(value) => {
                    let queued = isr.send_from_isr(value).is_queued();
                    prop_assert_eq!(queued, model.len() < capacity);
                    if queued {
                        model.push_back(value);
                    }
                }
                Op::Receive => {
                    let received = channel.try_receive(Duration::ZERO).ok();
                    prop_assert_eq!(received, model.pop_front());
                }
            }
            prop_assert!(channel.len() <= capacity);
            prop_assert_eq!(channel.len(), model.len());
        }

        let stats = channel.stats();
        prop_assert!(stats.high_water <= capacity);
    }
}

#[quickcheck]
fn prop_receive_order_equals_send_order(values: Vec<u32>) -> bool {
    let Ok(channel) = BoundedChannel::new("fifo", values.len().max(1)) else {
        return false;
    };
    let all_sent = values
        .iter()
        .all(|v| channel.try_send(*v, Duration::ZERO).is_ok());
    let received: Vec<u32> = channel.drain().collect();
    all_sent && received == values
}

#[quickcheck]
fn prop_drops_counted_exactly(capacity: u8, attempts: u8) -> bool {
    let capacity = usize::from(capacity % 16) + 1;
    let Ok(channel) = BoundedChannel::new("isr", capacity) else {
        return false;
    };
    let isr = channel.isr_handle();
    for i in 0..attempts {
        let _outcome = isr.send_from_isr(i);
    }
    let stats = channel.stats();
    let attempts = u64::from(attempts);
    let expected_queued = attempts.min(capacity as u64);
    stats.isr_queued == expected_queued && stats.isr_dropped == attempts - expected_queued
}

#[quickcheck]
fn prop_wait_all_succeeds_iff_all_bits_set(raw: u8) -> bool {
    let bits = ReadyBits::from_bits_truncate(u32::from(raw));
    let group = ReadinessGroup::new();
    group.set(bits);
    let unblocked = group
        .wait_all(ReadyBits::ALL, Some(Duration::ZERO))
        .is_ok();
    unblocked == bits.contains(ReadyBits::ALL)
}
