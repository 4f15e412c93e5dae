// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Port connection integration tests
//!
//! Connects typed OutPort/InPort pairs through every bundled dataflow and
//! transport and checks what arrives, what is reported and what is torn down.

use dataport::config::keys;
use dataport::listener::{DataListenerKind, ListenerKind, ListenerReturn, TypedDataListener};
use dataport::{
    connect, disconnect, BufferMode, ConnectorProfile, DataPortStatus, Error, InPort, OutPort,
    Runtime,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn ports(runtime: &Arc<Runtime>) -> (OutPort<i32>, InPort<i32>) {
    let out = OutPort::builder("out")
        .runtime(Arc::clone(runtime))
        .build()
        .expect("Failed to build OutPort");
    let inp = InPort::builder("in", 0)
        .runtime(Arc::clone(runtime))
        .build()
        .expect("Failed to build InPort");
    (out, inp)
}

/// Read until a value arrives or `timeout` elapses.
fn read_within(inp: &InPort<i32>, timeout: Duration) -> Option<i32> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if inp.read() {
            return Some(inp.value());
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    None
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    (count, move || seen.load(Ordering::SeqCst))
}

#[test]
fn test_push_flush_round_trip() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let id = connect(
        &out,
        &inp,
        ConnectorProfile::new("flush").property(keys::BUFFER_EMPTY_POLICY, "do_nothing"),
    )
    .expect("connect");
    assert!(out.is_connected(&id));
    assert!(inp.is_connected(&id));

    assert!(out.write(&7));
    assert_eq!(out.statuses(), vec![DataPortStatus::PortOk]);
    assert!(inp.is_new());
    assert!(inp.read());
    assert_eq!(inp.value(), 7);

    assert!(!inp.read());
    assert_eq!(inp.status(), DataPortStatus::BufferEmpty);
    assert!(inp.is_empty());
}

#[test]
fn test_inport_readback_by_default() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);
    connect(&out, &inp, ConnectorProfile::new("rb")).expect("connect");

    assert!(!inp.read(), "nothing written yet");
    out.write(&3);
    assert!(inp.read());
    assert!(inp.read(), "empty buffer reads the last sample back");
    assert_eq!(inp.value(), 3);
}

#[test]
fn test_push_periodic_fifo_delivers_in_order() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let profile = ConnectorProfile::new("periodic")
        .subscription_type("periodic")
        .push_policy("fifo")
        .push_rate(1000.0)
        .property(keys::BUFFER_LENGTH, "16")
        .property(keys::BUFFER_EMPTY_POLICY, "do_nothing");
    connect(&out, &inp, profile).expect("connect");

    for v in 1..=5 {
        assert!(out.write(&v));
    }
    let got: Vec<i32> = (0..5)
        .map(|_| read_within(&inp, Duration::from_secs(2)).expect("value"))
        .collect();
    assert_eq!(got, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_capacity_one_receiver_reports_full() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let profile = ConnectorProfile::new("tight")
        .property(keys::BUFFER_LENGTH, "1")
        .property(keys::BUFFER_FULL_POLICY, "do_nothing");
    let id = connect(&out, &inp, profile).expect("connect");

    let (written, written_count) = counter();
    inp.add_data_fn(DataListenerKind::OnBufferWrite, move |_, _| {
        written.fetch_add(1, Ordering::SeqCst);
        ListenerReturn::NoChange
    });
    let (full, full_count) = counter();
    inp.add_data_fn(DataListenerKind::OnBufferFull, move |_, _| {
        full.fetch_add(1, Ordering::SeqCst);
        ListenerReturn::NoChange
    });

    assert!(out.write(&1));
    assert_eq!(out.statuses(), vec![DataPortStatus::PortOk]);
    assert_eq!(written_count(), 1);

    assert!(!out.write(&2));
    assert_eq!(out.statuses(), vec![DataPortStatus::SendFull]);
    assert_eq!(full_count(), 1);
    assert_eq!(written_count(), 1);

    let sender = out.connector(&id).expect("outport connector");
    assert_eq!(
        sender
            .events()
            .listeners()
            .data_fired(DataListenerKind::OnReceiverFull),
        1
    );

    assert!(inp.read());
    assert_eq!(inp.value(), 1);
}

#[test]
fn test_pull_connection_reads_on_demand() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let profile = ConnectorProfile::new("pull")
        .dataflow_type("pull")
        .property(keys::BUFFER_EMPTY_POLICY, "do_nothing");
    let id = connect(&out, &inp, profile).expect("connect");

    assert!(!inp.read());
    assert_eq!(inp.status(), DataPortStatus::BufferEmpty);

    out.write(&11);
    out.write(&12);
    assert!(inp.read());
    assert_eq!(inp.value(), 11);
    assert!(inp.read());
    assert_eq!(inp.value(), 12);

    let reader = inp.connector(&id).expect("inport connector");
    assert_eq!(
        reader
            .events()
            .listeners()
            .data_fired(DataListenerKind::OnReceived),
        2
    );
}

#[test]
fn test_direct_connection_skips_the_wire() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let id = connect(
        &out,
        &inp,
        ConnectorProfile::new("direct").interface_type("direct"),
    )
    .expect("connect");
    assert!(inp.connectors().is_empty());
    assert!(inp.is_connected(&id));

    assert!(!inp.is_new());
    assert!(!inp.read());
    assert_eq!(inp.status(), DataPortStatus::BufferEmpty);

    out.write(&99);
    assert!(inp.is_new_from("direct"));
    assert!(inp.read_from("direct"));
    assert_eq!(inp.value(), 99);
    assert!(!inp.is_new());

    disconnect(&out, &inp, &id).expect("disconnect");
    assert!(!out.is_connected(&id));
    assert!(!inp.is_connected(&id));
}

#[test]
fn test_endian_mismatch_leaves_ports_untouched() {
    let runtime = Arc::new(Runtime::with_defaults());
    let out = OutPort::<i32>::builder("big-only")
        .runtime(Arc::clone(&runtime))
        .endian("big")
        .build()
        .expect("OutPort");
    let inp = InPort::builder("little-only", 0i32)
        .runtime(runtime)
        .endian("little")
        .build()
        .expect("InPort");

    let err = connect(&out, &inp, ConnectorProfile::new("x")).expect_err("mismatch");
    assert!(matches!(err, Error::EndianMismatch { .. }));
    assert!(out.connector_ids().is_empty());
    assert!(inp.connector_ids().is_empty());
}

#[test]
fn test_big_endian_connection() {
    let runtime = Arc::new(Runtime::with_defaults());
    let out = OutPort::<i32>::builder("out")
        .runtime(Arc::clone(&runtime))
        .endian("big,little")
        .build()
        .expect("OutPort");
    let inp = InPort::builder("in", 0i32)
        .runtime(runtime)
        .build()
        .expect("InPort");

    let id = connect(
        &out,
        &inp,
        ConnectorProfile::new("be").property(keys::SERIALIZER_ENDIAN, "big"),
    )
    .expect("connect");
    let connector = inp.connector(&id).expect("connector");
    assert_eq!(connector.endian(), dataport::Endian::Big);

    out.write(&-123_456);
    assert!(inp.read());
    assert_eq!(inp.value(), -123_456);
}

#[test]
fn test_failed_connect_rolls_back() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);
    runtime.inport_consumers.unregister("local");

    let err = connect(&out, &inp, ConnectorProfile::new("half")).expect_err("no consumer");
    assert!(matches!(err, Error::UnknownFactory { kind: "inport_consumer", .. }));
    assert!(inp.connector_ids().is_empty());
    assert_eq!(runtime.local.inport_count(), 0);
}

#[test]
fn test_duplicate_id_rejected() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    connect(&out, &inp, ConnectorProfile::new("a").with_id("same")).expect("first");
    let err = connect(&out, &inp, ConnectorProfile::new("b").with_id("same")).expect_err("dup");
    assert!(matches!(err, Error::DuplicateConnector(id) if id == "same"));
    assert_eq!(out.connector_ids(), vec!["same".to_string()]);
}

#[test]
fn test_unknown_dataflow_rejected() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);
    let err = connect(&out, &inp, ConnectorProfile::new("x").dataflow_type("duplex"))
        .expect_err("bad dataflow");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_lost_inport_is_removed_from_outport() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);
    connect(&out, &inp, ConnectorProfile::new("fragile")).expect("connect");

    let (gone, gone_count) = counter();
    out.add_fn(ListenerKind::OnDisconnect, move |_| {
        gone.fetch_add(1, Ordering::SeqCst);
        ListenerReturn::NoChange
    });

    drop(inp);
    assert!(!out.write(&1));
    assert_eq!(out.statuses(), vec![DataPortStatus::ConnectionLost]);
    assert!(out.connector_ids().is_empty());
    assert_eq!(gone_count(), 1);

    // Nothing left to fail.
    assert!(out.write(&2));
}

#[test]
fn test_disconnect_fires_and_forgets() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let (events, event_count) = counter();
    inp.add_fn(ListenerKind::OnConnect, {
        let events = Arc::clone(&events);
        move |_| {
            events.fetch_add(1, Ordering::SeqCst);
            ListenerReturn::NoChange
        }
    });
    inp.add_fn(ListenerKind::OnDisconnect, move |_| {
        events.fetch_add(1, Ordering::SeqCst);
        ListenerReturn::NoChange
    });

    let id = connect(&out, &inp, ConnectorProfile::new("short")).expect("connect");
    assert_eq!(event_count(), 1);
    assert_eq!(runtime.local.inport_count(), 1);

    disconnect(&out, &inp, &id).expect("disconnect");
    assert_eq!(event_count(), 2);
    assert_eq!(runtime.local.inport_count(), 0);
    assert!(matches!(
        disconnect(&out, &inp, &id),
        Err(Error::ConnectorNotFound(_))
    ));
}

#[test]
fn test_port_listener_removal_applies_to_connectors() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);
    connect(&out, &inp, ConnectorProfile::new("one")).expect("connect");

    let (reads, read_count) = counter();
    let handle = inp.add_data_fn(DataListenerKind::OnBufferRead, move |_, _| {
        reads.fetch_add(1, Ordering::SeqCst);
        ListenerReturn::NoChange
    });

    out.write(&1);
    inp.read();
    assert_eq!(read_count(), 1);

    assert!(inp.remove_listener(handle));
    assert!(!inp.remove_listener(handle));
    out.write(&2);
    inp.read();
    assert_eq!(read_count(), 1);
}

#[test]
fn test_typed_listener_rewrites_sample() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    out.add_data_listener(
        DataListenerKind::OnSend,
        Arc::new(TypedDataListener::new(|_info, value: &mut i32| {
            if *value > 100 {
                *value = 100;
                ListenerReturn::DataChanged
            } else {
                ListenerReturn::NoChange
            }
        })),
    );
    connect(&out, &inp, ConnectorProfile::new("clamped")).expect("connect");

    out.write(&500);
    assert!(inp.read());
    assert_eq!(inp.value(), 100);
}

#[test]
fn test_callbacks_convert_values() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);
    connect(&out, &inp, ConnectorProfile::new("conv")).expect("connect");

    let (written, written_count) = counter();
    out.set_on_write(move |_| {
        written.fetch_add(1, Ordering::SeqCst);
    });
    out.set_on_write_convert(|v| v * 2);
    inp.set_on_read_convert(|v| v + 1);

    out.write(&10);
    assert!(inp.read());
    assert_eq!(inp.value(), 21);
    assert_eq!(written_count(), 1);
}

#[test]
fn test_shared_buffer_collects_every_connection() {
    let runtime = Arc::new(Runtime::with_defaults());
    let out_a = OutPort::<i32>::builder("a")
        .runtime(Arc::clone(&runtime))
        .build()
        .expect("OutPort");
    let out_b = OutPort::<i32>::builder("b")
        .runtime(Arc::clone(&runtime))
        .build()
        .expect("OutPort");
    let inp = InPort::builder("merged", 0i32)
        .runtime(runtime)
        .property(keys::BUFFER_LENGTH, "4")
        .property(keys::BUFFER_EMPTY_POLICY, "do_nothing")
        .shared_buffer()
        .build()
        .expect("InPort");
    assert_eq!(inp.buffer_mode(), BufferMode::Shared);

    connect(&out_a, &inp, ConnectorProfile::new("a")).expect("connect a");
    connect(&out_b, &inp, ConnectorProfile::new("b")).expect("connect b");

    out_a.write(&1);
    out_b.write(&2);
    let mut got = Vec::new();
    while inp.read() {
        got.push(inp.value());
    }
    assert_eq!(got, vec![1, 2]);
}

#[test]
fn test_shared_buffer_keeps_pull_cache_apart() {
    let runtime = Arc::new(Runtime::with_defaults());
    let pusher = OutPort::<i32>::builder("pusher")
        .runtime(Arc::clone(&runtime))
        .build()
        .expect("OutPort");
    let puller = OutPort::<i32>::builder("puller")
        .runtime(Arc::clone(&runtime))
        .build()
        .expect("OutPort");
    let inp = InPort::builder("mixed", 0i32)
        .runtime(runtime)
        .property(keys::BUFFER_LENGTH, "4")
        .property(keys::BUFFER_EMPTY_POLICY, "do_nothing")
        .shared_buffer()
        .build()
        .expect("InPort");

    connect(&pusher, &inp, ConnectorProfile::new("push")).expect("connect push");
    connect(
        &puller,
        &inp,
        ConnectorProfile::new("pull")
            .dataflow_type("pull")
            .property(keys::BUFFER_EMPTY_POLICY, "do_nothing"),
    )
    .expect("connect pull");

    pusher.write(&5);
    puller.write(&9);

    assert!(inp.read_from("pull"));
    assert_eq!(inp.value(), 9);
    assert!(inp.read_from("push"));
    assert_eq!(inp.value(), 5);
    assert!(!inp.read_from("push"));
    assert_eq!(inp.status(), DataPortStatus::BufferEmpty);
}

#[test]
fn test_string_and_vec_payloads() {
    let runtime = Arc::new(Runtime::with_defaults());
    let out = OutPort::<Vec<String>>::builder("names")
        .runtime(Arc::clone(&runtime))
        .build()
        .expect("OutPort");
    let inp = InPort::builder("names-in", Vec::<String>::new())
        .runtime(runtime)
        .build()
        .expect("InPort");
    connect(&out, &inp, ConnectorProfile::new("strings")).expect("connect");

    let names = vec!["alpha".to_string(), String::new(), "γ".to_string()];
    assert!(out.write(&names));
    assert!(inp.read());
    assert_eq!(inp.value(), names);
}

#[cfg(feature = "udp")]
#[test]
fn test_udp_loopback_delivery() {
    let runtime = Arc::new(Runtime::with_defaults());
    let (out, inp) = ports(&runtime);

    let id = connect(
        &out,
        &inp,
        ConnectorProfile::new("udp")
            .interface_type("udp")
            .property(keys::BUFFER_EMPTY_POLICY, "do_nothing"),
    )
    .expect("connect");
    assert!(inp.is_connected(&id));

    assert!(out.write(&4242));
    assert_eq!(read_within(&inp, Duration::from_secs(2)), Some(4242));
}
