//! Integration tests for the complete transmit → wire → receive → router flow

use spacelink_core::{
    ewc::{self, EwcMessage, ReceiveStatus},
    ms200, ExecutionContext, LinkConfig, LinkStack, MemoryDriver, PacketMeta, PacketType, Route,
    SequenceWord, StackConfig, StatsSnapshot,
};
use std::sync::Arc;

fn stack(buffers: usize) -> LinkStack {
    LinkStack::new(&StackConfig {
        pool_buffers: buffers,
        buffer_size: 128,
        queue_depth: 8,
    })
}

fn meta(dst: u8) -> PacketMeta {
    PacketMeta {
        src: 3,
        dst,
        sport: 9,
        apid: 0x155,
        packet_type: PacketType::Command,
        sequence: 0,
    }
}

#[test]
fn test_ms200_loopback() {
    let stack = stack(8);
    let driver = Arc::new(MemoryDriver::new());
    let (iface, mut decoder) =
        ms200::add_interface(&stack, Arc::clone(&driver), &LinkConfig::default()).unwrap();
    let route = Route::direct(Arc::clone(&iface));

    for payload in [&b"first"[..], b"", b"third packet"] {
        let packet = stack.pool().packet_from(meta(4), payload).unwrap();
        route.transmit(packet).unwrap();
    }
    assert_eq!(stack.pool().stats().in_use, 0);

    // Step 2: feed the wire bytes back in
    decoder.feed(&driver.take(), ExecutionContext::Task);

    let received: Vec<_> = stack.queue().drain();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].packet.payload(), b"first");
    assert!(received[1].packet.is_empty());
    assert_eq!(received[2].packet.payload(), b"third packet");

    // Sequence counts increase per frame sent on the link
    let sequences: Vec<_> = received.iter().map(|i| i.packet.meta.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);

    for ingress in &received {
        assert_eq!(ingress.iface.name(), "MS200");
        assert_eq!(ingress.packet.meta.packet_type, PacketType::Command);
        assert_eq!(ingress.packet.meta.apid, 0x155);
        assert_eq!(ingress.packet.meta.src, 3);
        assert_eq!(ingress.packet.meta.sport, 9);
    }

    let stats = iface.stats().snapshot();
    assert_eq!(stats.tx, 3);
    assert_eq!(stats.rx, 3);
    assert_eq!(stats.rxbytes, 17);
    assert_eq!(stats.txbytes, 3 * 19 + 17);
}

#[test]
fn test_ewc_loopback() {
    let stack = stack(8);
    let driver = Arc::new(MemoryDriver::new());
    let (iface, mut decoder) =
        ewc::add_interface(&stack, Arc::clone(&driver), &LinkConfig::default()).unwrap();
    let route = Route::direct(Arc::clone(&iface));

    let message = EwcMessage::new(-7, &[0xCAFEBABE, 1, 2]).unwrap();
    let packet = stack.pool().packet_from(meta(4), &message.to_bytes()).unwrap();
    route.transmit(packet).unwrap();

    for b in driver.take() {
        decoder.feed_from_isr(&[b]);
    }

    let ingress = stack.queue().try_recv().unwrap();
    assert_eq!(EwcMessage::parse(ingress.packet.payload()).unwrap(), message);
    assert_eq!(ingress.packet.meta.sport, 9);
    assert_eq!(decoder.last_status(), Some(ReceiveStatus::Success));
    assert_eq!(decoder.last_message(), Some(&message));
}

#[test]
fn test_ewc_rejects_malformed_payload() {
    let stack = stack(4);
    let driver = Arc::new(MemoryDriver::new());
    let (iface, _) =
        ewc::add_interface(&stack, Arc::clone(&driver), &LinkConfig::default()).unwrap();

    let packet = stack.pool().packet_from(meta(4), b"not a message").unwrap();
    let err = Route::direct(Arc::clone(&iface)).transmit(packet).unwrap_err();

    assert_eq!(err.error.code(), -2);
    assert_eq!(err.into_packet().payload(), b"not a message");
    assert!(driver.written().is_empty());
    assert_eq!(iface.stats().snapshot().tx_error, 1);
}

#[test]
fn test_resync_after_garbage() {
    let stack = stack(8);
    let (_iface, mut decoder) =
        ms200::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();

    let frame = ms200::encode_frame(&meta(4), b"after noise", SequenceWord::complete(0)).unwrap();

    // Garbage ending in a partial sync marker directly before the real one
    let mut stream = vec![0x00, 0x1A, 0xCF, 0x55, 0x1A, 0x1A, 0xCF];
    stream.extend_from_slice(&frame);
    stream.extend_from_slice(&[0x1A, 0xCF, 0xFC]);
    stream.extend_from_slice(&frame);
    decoder.feed(&stream, ExecutionContext::Task);

    assert_eq!(stack.queue().len(), 2);
    for ingress in stack.queue().drain() {
        assert_eq!(ingress.packet.payload(), b"after noise");
    }
}

#[test]
fn test_clean_reception_moves_only_rx_counters() {
    let stack = stack(8);
    let (ms200_iface, mut ms200_decoder) =
        ms200::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();
    let (ewc_iface, mut ewc_decoder) =
        ewc::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();

    for payload in [&b"one"[..], b"", b"three"] {
        let frame = ms200::encode_frame(&meta(4), payload, SequenceWord::complete(0)).unwrap();
        ms200_decoder.feed(&frame, ExecutionContext::Task);
    }
    let message = EwcMessage::new(1, &[2, 3]).unwrap().to_bytes();
    for _ in 0..2 {
        let frame = ewc::encode_frame(&meta(4), &message, SequenceWord::complete(0)).unwrap();
        ewc_decoder.feed(&frame, ExecutionContext::Task);
    }

    assert_eq!(
        ms200_iface.stats().snapshot(),
        StatsSnapshot {
            rx: 3,
            rxbytes: 8,
            ..Default::default()
        }
    );
    assert_eq!(
        ewc_iface.stats().snapshot(),
        StatsSnapshot {
            rx: 2,
            rxbytes: 2 * message.len() as u32,
            ..Default::default()
        }
    );
}

#[test]
fn test_frame_after_false_marker_both_links() {
    let stack = stack(8);
    let (ms200_iface, mut ms200_decoder) =
        ms200::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();
    let (ewc_iface, mut ewc_decoder) =
        ewc::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();

    let mut stream = vec![0x1A, 0xCF, 0xFC, 0x1D];
    stream.extend(ms200::encode_frame(&meta(4), b"hello", SequenceWord::complete(0)).unwrap());
    ms200_decoder.feed(&stream, ExecutionContext::Task);

    let message = EwcMessage::new(0, &[7]).unwrap().to_bytes();
    let mut stream = vec![0x35, 0x2E, 0xF8, 0x53];
    stream.extend(ewc::encode_frame(&meta(4), &message, SequenceWord::complete(0)).unwrap());
    ewc_decoder.feed(&stream, ExecutionContext::Task);

    let received = stack.queue().drain();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].packet.payload(), b"hello");
    assert_eq!(received[1].packet.payload(), &message[..]);
    assert_eq!(ms200_iface.stats().snapshot().frame, 1);
    assert_eq!(ewc_iface.stats().snapshot().frame, 1);
}

#[test]
fn test_no_leak_under_mixed_traffic() {
    let stack = stack(4);
    let (iface, mut decoder) =
        ewc::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();
    decoder.set_config(0, 4).unwrap();

    let good = EwcMessage::new(0, &[1]).unwrap().to_bytes();
    let mut stream = Vec::new();
    for dst in [4, 5, 0xFF, 4] {
        stream.extend(ewc::encode_frame(&meta(dst), &good, SequenceWord::complete(0)).unwrap());
    }
    let mut corrupt = ewc::encode_frame(&meta(4), &good, SequenceWord::complete(0))
        .unwrap()
        .to_vec();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0x80;
    stream.extend(corrupt);
    stream.extend_from_slice(&[0x35, 0x2E, 0xF8]);

    decoder.feed(&stream, ExecutionContext::Task);
    let delivered = stack.queue().drain();
    drop(delivered);

    let stats = iface.stats().snapshot();
    assert_eq!(stats.rx, 3);
    assert_eq!(stats.drop, 1);
    assert_eq!(stats.frame, 1);

    let pool = stack.pool().stats();
    assert_eq!(pool.in_use, 0);
    assert_eq!(pool.acquired, pool.released);
    assert_eq!(pool.acquired, 5);
}

#[test]
fn test_queue_full_drops() {
    let stack = LinkStack::new(&StackConfig {
        pool_buffers: 8,
        buffer_size: 64,
        queue_depth: 2,
    });
    let (iface, mut decoder) =
        ms200::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();

    for _ in 0..4 {
        let frame = ms200::encode_frame(&meta(1), b"x", SequenceWord::complete(0)).unwrap();
        decoder.feed(&frame, ExecutionContext::Task);
    }

    let stats = iface.stats().snapshot();
    assert_eq!(stats.rx, 2);
    assert_eq!(stats.drop, 2);
    assert_eq!(stack.pool().stats().in_use, 2);
}

#[test]
fn test_pool_exhaustion_recovers() {
    let stack = stack(2);
    let (iface, mut decoder) =
        ms200::add_interface(&stack, MemoryDriver::new(), &LinkConfig::default()).unwrap();
    let frame = ms200::encode_frame(&meta(1), b"data", SequenceWord::complete(0)).unwrap();

    for _ in 0..3 {
        decoder.feed(&frame, ExecutionContext::Task);
    }
    // Two buffers now sit in the queue; the third frame found none
    assert_eq!(iface.stats().snapshot().drop, 1);

    stack.queue().drain();
    decoder.feed(&frame, ExecutionContext::Task);
    assert_eq!(stack.queue().len(), 1);
}

#[test]
fn test_host_filter_from_config() {
    let stack = stack(4);
    let config = LinkConfig {
        host_node: 3,
        node: 4,
        ..LinkConfig::default()
    };
    let (iface, mut decoder) = ms200::add_interface(&stack, MemoryDriver::new(), &config).unwrap();

    let from_host = ms200::encode_frame(&meta(4), b"ok", SequenceWord::complete(0)).unwrap();
    let stranger = PacketMeta { src: 8, ..meta(4) };
    let from_stranger = ms200::encode_frame(&stranger, b"no", SequenceWord::complete(0)).unwrap();

    decoder.feed(&from_stranger, ExecutionContext::Task);
    decoder.feed(&from_host, ExecutionContext::Task);

    assert_eq!(stack.queue().try_recv().unwrap().packet.payload(), b"ok");
    assert_eq!(iface.stats().snapshot().drop, 1);
}
