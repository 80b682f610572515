use crate::counters::{EventCounterSink, EventCounters};
use crate::engine::des::{IP_UDP_OVERHEAD, MAC_OVERHEAD};
use crate::engine::{ChannelConfig, DesEngine, DevicePattern, NetworkEngine, RateMode};
use crate::error::EngineError;
use crate::experiment::{ExperimentConfig, run_experiment};
use crate::net::{NodeId, Position, Subnet};
use crate::sim::SimTime;
use crate::stats::throughput_mbps;
use crate::traffic::{CBR_PORT, Direction, ECHO_PORT, FlowKind, FlowSpec, MAX_PACKET_SIZE};
use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;

fn engine_with(positions: &[Position], channel: &ChannelConfig) -> (DesEngine, Vec<NodeId>) {
    let mut engine = DesEngine::new();
    let nodes = engine.create_nodes(positions.len()).expect("nodes");
    for (&n, &p) in nodes.iter().zip(positions) {
        engine.install_mobility(n, p).expect("mobility");
    }
    engine.install_network_stack(&nodes).expect("stack");
    let devices = engine
        .install_link_layer(&nodes, channel, RateMode::DsssRate5_5Mbps)
        .expect("link layer");
    engine
        .assign_addresses(&devices, Subnet::default())
        .expect("addresses");
    (engine, nodes)
}

fn cbr(src: NodeId, dst: NodeId, start_s: u64, stop_ms: u64) -> FlowSpec {
    FlowSpec {
        src,
        dst,
        direction: Direction::Downlink,
        kind: FlowKind::Cbr,
        packet_size: 100,
        data_rate: 800,
        start: SimTime::from_secs(start_s),
        stop: SimTime::from_millis(stop_ms),
        client_index: 0,
        ap_index: 0,
    }
}

fn subscribe(engine: &mut DesEngine, pattern: DevicePattern) -> Rc<RefCell<EventCounterSink>> {
    let sink = Rc::new(RefCell::new(EventCounterSink::new()));
    engine.subscribe_device_events(pattern, sink.clone());
    sink
}

/// 1 个 AP、1 个客户端，每秒一个 100 字节的包
fn slow_config(rts_cts: bool) -> ExperimentConfig {
    ExperimentConfig {
        ap_count: 1,
        client_count: 1,
        packet_size: 100,
        data_rate: 800,
        rts_cts,
        ..ExperimentConfig::default()
    }
}

#[test]
fn slow_downlink_counts_every_data_frame() {
    for rts_cts in [false, true] {
        let mut engine = DesEngine::new();
        let result = run_experiment(&mut engine, &slow_config(rts_cts)).expect("run");

        // 49 个 CBR 包（1s..49s），1 个 echo 请求与 1 个 echo 应答
        assert_eq!(
            result.counters,
            EventCounters {
                tx_ok: 51,
                rx_ok: 51,
                rx_error: 0,
            },
            "rts_cts={rts_cts}"
        );
        assert_eq!(result.scheduled_flows, 2);
        assert_eq!(result.flows.len(), 3);
        assert!(result.flows.iter().all(|f| f.is_complete()));

        assert_eq!(engine.monitor().flow_count(), 3);
        assert!(engine.events_executed() > 0);
        let records = engine.flow_records();
        let probe = &records[0];
        let reply = &records[1];
        let cbr = &records[2];
        let probe_tuple = probe.tuple.expect("probe tuple");
        assert_eq!(probe_tuple.dst_port, ECHO_PORT);
        assert_eq!(reply.tuple, Some(probe_tuple.reversed()));
        assert_eq!(cbr.tuple.expect("cbr tuple").dst_port, CBR_PORT);

        let cbr_bytes = 49 * u64::from(100 + IP_UDP_OVERHEAD);
        assert_eq!(cbr.counters.rx_packets, 49);
        assert_eq!(cbr.rx_bytes(), cbr_bytes);
        assert_eq!(cbr.counters.lost_packets, 0);
        assert_eq!(cbr.duration, SimTime::from_secs(60));

        let echo_bytes = u64::from(10 + IP_UDP_OVERHEAD);
        let expected = throughput_mbps(cbr_bytes + 2 * echo_bytes, 60.0);
        assert!((result.aggregate_throughput_mbps - expected).abs() < 1e-12);
    }
}

#[test]
fn reference_scenario_end_to_end() {
    let cfg = ExperimentConfig::default();
    assert_eq!((cfg.ap_count, cfg.client_count, cfg.radius), (1, 2, 60.0));
    assert_eq!(cfg.direction, Direction::Downlink);
    assert_eq!(cfg.sim_time, SimTime::from_secs(60));

    let mut engine = DesEngine::new();
    let result = run_experiment(&mut engine, &cfg).expect("run");
    assert_eq!(result.scheduled_flows, 4);
    assert!(result.aggregate_throughput_mbps > 0.0);
    assert!(result.counters.tx_ok > 0);
    assert!(result.counters.rx_ok >= result.counters.tx_ok);
    assert_eq!(result.counters.rx_error, 0);
    assert_eq!(result.incomplete_flows().count(), 0);
    // 两条 CBR、两条探测、两条 echo 应答
    assert_eq!(result.flows.len(), 6);
    // 信道饱和时吞吐量受限于 5.5 Mbps 的物理速率
    assert!(result.aggregate_throughput_mbps < 5.5);
    assert_eq!(engine.now(), SimTime::from_secs(60));
}

#[test]
fn out_of_decode_range_frames_are_rx_errors() {
    let channel = ChannelConfig::default();
    let (mut engine, nodes) = engine_with(
        &[Position::new(0.0, 0.0, 1.0), Position::new(300.0, 0.0, 1.0)],
        &channel,
    );
    engine.schedule_flow(&cbr(nodes[0], nodes[1], 1, 3_500)).expect("flow");
    let sink = subscribe(&mut engine, DevicePattern::All);
    engine.run_until(SimTime::from_secs(5));

    assert_eq!(
        sink.borrow().snapshot(),
        EventCounters {
            tx_ok: 3,
            rx_ok: 0,
            rx_error: 3,
        }
    );
    let records = engine.flow_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].counters.tx_packets, 3);
    assert_eq!(records[0].counters.rx_packets, 0);
    assert_eq!(records[0].counters.lost_packets, 3);
}

#[test]
fn frames_beyond_detect_range_are_invisible() {
    let (mut engine, nodes) = engine_with(
        &[Position::new(0.0, 0.0, 1.0), Position::new(500.0, 0.0, 1.0)],
        &ChannelConfig::default(),
    );
    engine.schedule_flow(&cbr(nodes[0], nodes[1], 1, 3_500)).expect("flow");
    let sink = subscribe(&mut engine, DevicePattern::All);
    engine.run_until(SimTime::from_secs(5));

    let counters = sink.borrow().snapshot();
    assert_eq!(counters.tx_ok, 3);
    assert_eq!(counters.rx_ok + counters.rx_error, 0);
}

#[test]
fn third_node_overhears_data_frames() {
    let (mut engine, nodes) = engine_with(
        &[
            Position::new(0.0, 0.0, 1.0),
            Position::new(50.0, 0.0, 1.0),
            Position::new(0.0, 50.0, 1.0),
        ],
        &ChannelConfig::default(),
    );
    engine.schedule_flow(&cbr(nodes[0], nodes[1], 1, 2_500)).expect("flow");
    let all = subscribe(&mut engine, DevicePattern::All);
    let bystander = subscribe(&mut engine, DevicePattern::Node(nodes[2]));
    engine.run_until(SimTime::from_secs(5));

    assert_eq!(
        all.borrow().snapshot(),
        EventCounters {
            tx_ok: 2,
            rx_ok: 4,
            rx_error: 0,
        }
    );
    assert_eq!(
        bystander.borrow().snapshot(),
        EventCounters {
            tx_ok: 0,
            rx_ok: 2,
            rx_error: 0,
        }
    );
    let records = engine.flow_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].counters.rx_packets, 2);
}

#[test]
fn full_backlog_tail_drops() {
    let channel = ChannelConfig {
        max_queue_frames: 5,
        ..ChannelConfig::default()
    };
    let (mut engine, nodes) = engine_with(
        &[Position::new(0.0, 0.0, 1.0), Position::new(10.0, 0.0, 1.0)],
        &channel,
    );
    let flow = FlowSpec {
        packet_size: 1024,
        data_rate: 11_000_000,
        ..cbr(nodes[0], nodes[1], 0, 1_000)
    };
    engine.schedule_flow(&flow).expect("flow");
    engine.run_until(SimTime::from_secs(2));

    let rec = &engine.flow_records()[0];
    assert!(rec.counters.lost_packets > 0, "{:?}", rec.counters);
    assert!(rec.counters.rx_packets > 0);
    assert_eq!(
        rec.counters.tx_packets,
        rec.counters.rx_packets + rec.counters.lost_packets
    );
    assert_eq!(
        rec.rx_bytes(),
        rec.counters.rx_packets * u64::from(1024 + IP_UDP_OVERHEAD)
    );
}

#[test]
fn frame_airtime_includes_mac_overhead() {
    let rate = RateMode::DsssRate11Mbps;
    let bytes = 1024 + IP_UDP_OVERHEAD + MAC_OVERHEAD;
    let airtime = rate.tx_time(bytes);
    // 192 µs PLCP + 1088·8 / 11 Mbps ≈ 791.3 µs
    assert_eq!(airtime, SimTime(192_000 + 791_273));
}

#[test]
fn addresses_are_assigned_sequentially() {
    let (engine, _) = engine_with(
        &[Position::default(), Position::default(), Position::default()],
        &ChannelConfig::default(),
    );
    let addrs: Vec<_> = (0..3)
        .map(|d| engine.address_of(crate::net::DeviceId(d)))
        .collect();
    assert_eq!(
        addrs,
        vec![
            Some(Ipv4Addr::new(10, 0, 0, 1)),
            Some(Ipv4Addr::new(10, 0, 0, 2)),
            Some(Ipv4Addr::new(10, 0, 0, 3)),
        ]
    );
}

#[test]
fn installation_order_is_enforced() {
    let mut engine = DesEngine::new();
    let nodes = engine.create_nodes(2).expect("nodes");
    let err = engine
        .install_link_layer(&nodes, &ChannelConfig::default(), RateMode::default())
        .unwrap_err();
    assert_eq!(err, EngineError::NoMobility(nodes[0]));

    for &n in &nodes {
        engine.install_mobility(n, Position::default()).expect("mobility");
    }
    let devices = engine
        .install_link_layer(&nodes, &ChannelConfig::default(), RateMode::default())
        .expect("link layer");
    let err = engine
        .assign_addresses(&devices, Subnet::default())
        .unwrap_err();
    assert_eq!(err, EngineError::NoNetworkStack(nodes[0]));

    assert_eq!(
        engine.install_mobility(NodeId(9), Position::default()),
        Err(EngineError::UnknownNode(NodeId(9)))
    );
}

#[test]
fn small_subnet_runs_out_of_addresses() {
    let mut engine = DesEngine::new();
    let nodes = engine.create_nodes(3).expect("nodes");
    for &n in &nodes {
        engine.install_mobility(n, Position::default()).expect("mobility");
    }
    engine.install_network_stack(&nodes).expect("stack");
    let devices = engine
        .install_link_layer(&nodes, &ChannelConfig::default(), RateMode::default())
        .expect("link layer");
    let subnet = Subnet::new(Ipv4Addr::new(192, 168, 1, 0), 30);
    let err = engine.assign_addresses(&devices, subnet).unwrap_err();
    assert!(matches!(err, EngineError::SubnetExhausted { capacity: 2, .. }));
}

#[test]
fn flow_to_unaddressed_node_is_flow_level_error() {
    let mut engine = DesEngine::new();
    let nodes = engine.create_nodes(2).expect("nodes");
    for &n in &nodes {
        engine.install_mobility(n, Position::default()).expect("mobility");
    }
    engine.install_network_stack(&nodes).expect("stack");
    let devices = engine
        .install_link_layer(&nodes, &ChannelConfig::default(), RateMode::default())
        .expect("link layer");
    engine
        .assign_addresses(&devices[..1], Subnet::default())
        .expect("addresses");

    let err = engine.schedule_flow(&cbr(nodes[0], nodes[1], 1, 2_000)).unwrap_err();
    assert_eq!(err, EngineError::Unaddressed(nodes[1]));
    assert!(err.is_flow_level());
}

#[test]
fn misordered_ranges_fail_initialization() {
    let mut engine = DesEngine::new();
    let nodes = engine.create_nodes(1).expect("nodes");
    engine.install_mobility(nodes[0], Position::default()).expect("mobility");
    let channel = ChannelConfig {
        decode_range_m: 500.0,
        detect_range_m: 100.0,
        ..ChannelConfig::default()
    };
    let err = engine
        .install_link_layer(&nodes, &channel, RateMode::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Init(_)));
    assert!(!err.is_flow_level());
}

#[test]
fn zero_rate_cbr_flow_is_refused() {
    let (mut engine, nodes) = engine_with(
        &[Position::new(0.0, 0.0, 1.0), Position::new(10.0, 0.0, 1.0)],
        &ChannelConfig::default(),
    );
    let flow = FlowSpec {
        data_rate: 0,
        ..cbr(nodes[0], nodes[1], 1, 3_000)
    };
    let err = engine.schedule_flow(&flow).unwrap_err();
    assert_eq!(
        err,
        EngineError::ZeroRate {
            src: nodes[0],
            dst: nodes[1],
        }
    );
    assert!(err.is_flow_level());

    engine.run_until(SimTime::from_secs(5));
    assert_eq!(engine.events_executed(), 0);
    assert!(engine.flow_records().is_empty());
}

#[test]
fn oversized_packet_is_refused_without_overflow() {
    let (mut engine, nodes) = engine_with(
        &[Position::new(0.0, 0.0, 1.0), Position::new(10.0, 0.0, 1.0)],
        &ChannelConfig::default(),
    );
    let flow = FlowSpec {
        packet_size: u32::MAX,
        ..cbr(nodes[0], nodes[1], 1, 3_000)
    };
    let err = engine.schedule_flow(&flow).unwrap_err();
    assert_eq!(err, EngineError::OversizedPacket { size: u32::MAX });
    assert!(err.is_flow_level());
}

#[test]
fn largest_udp_payload_is_delivered() {
    let cfg = ExperimentConfig {
        ap_count: 1,
        client_count: 1,
        packet_size: MAX_PACKET_SIZE,
        data_rate: 800_000,
        sim_time: SimTime::from_secs(3),
        ..ExperimentConfig::default()
    };
    let mut engine = DesEngine::new();
    let result = run_experiment(&mut engine, &cfg).expect("run");
    assert_eq!(result.scheduled_flows, 2);
    assert_eq!(result.incomplete_flows().count(), 0);

    let cbr = engine
        .flow_records()
        .into_iter()
        .find(|r| r.tuple.is_some_and(|t| t.dst_port == CBR_PORT))
        .expect("cbr record");
    assert!(cbr.counters.rx_packets > 0);
    assert_eq!(
        cbr.rx_bytes(),
        cbr.counters.rx_packets * u64::from(MAX_PACKET_SIZE + IP_UDP_OVERHEAD)
    );
}
