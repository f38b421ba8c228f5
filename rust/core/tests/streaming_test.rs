// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::{placed, triangle, Event, EventLog, MockEngine, MockFetcher, RecordingPacer};
use ifc_stream_core::{
    CancellationToken, Color, Error, FlatMesh, StreamToggle, StreamingController, Toggle,
    ViewerConfig,
};
use std::time::Duration;

type Controller = StreamingController<MockEngine, MockFetcher, RecordingPacer>;

fn controller(engine: MockEngine, fetch_len: usize) -> (Controller, EventLog) {
    let log = EventLog::default();
    let fetcher = MockFetcher::new(fetch_len, log.clone());
    let pacer = RecordingPacer::new(log.clone());
    (
        StreamingController::new(engine, fetcher, pacer, ViewerConfig::default()),
        log,
    )
}

fn engine_with_one_wall() -> MockEngine {
    let mut engine = MockEngine::new();
    let (vertices, indices) = triangle();
    engine.add_geometry(77, &vertices, &indices);
    engine.tape_meshes = vec![FlatMesh {
        express_id: 563782,
        geometries: vec![placed(77, [0.0; 3], Color::default())],
    }];
    engine
}

#[tokio::test]
async fn test_stream_one_counts_bytes_and_closes_model() {
    let (controller, _) = controller(engine_with_one_wall(), 1234);

    let report = controller.stream_one(563782).await.unwrap();

    assert_eq!(report.bytes, 1234);
    assert_eq!(report.total_downloaded, 1234);
    assert_eq!(controller.total_downloaded(), 1234);
    assert_eq!(report.stats.placed_geometries, 1);
    assert_eq!(controller.node_count(), 1);
    controller.with_engine(|engine| {
        assert_eq!(engine.opens, 1);
        assert_eq!(engine.closes, 1);
        assert!(engine.open_models.is_empty());
    });
}

#[tokio::test]
async fn test_stream_one_closes_model_when_loading_fails() {
    let mut engine = engine_with_one_wall();
    engine.tape_meshes[0].geometries[0].geometry_express_id = 404;
    let (controller, _) = controller(engine, 16);

    let err = controller.stream_one(1).await.unwrap_err();

    assert!(matches!(err, Error::GeometryNotFound { geometry: 404, .. }));
    assert_eq!(controller.total_downloaded(), 16);
    controller.with_engine(|engine| {
        assert_eq!(engine.opens, 1);
        assert_eq!(engine.closes, 1);
    });
}

#[tokio::test]
async fn test_stream_one_rejects_empty_fragment() {
    let (controller, _) = controller(engine_with_one_wall(), 0);

    let err = controller.stream_one(5).await.unwrap_err();

    assert!(matches!(err, Error::EmptyFragment { express_id: 5 }));
    assert!(err.is_network());
    assert_eq!(controller.total_downloaded(), 0);
    controller.with_engine(|engine| assert_eq!(engine.opens, 0));
}

#[tokio::test]
async fn test_stream_all_is_sequential_and_paced() {
    let (controller, log) = controller(engine_with_one_wall(), 8);

    let summary = controller
        .stream_all(&[3, 1, 2], &CancellationToken::new())
        .await;

    assert_eq!(summary.completed.len(), 3);
    assert!(!summary.cancelled);
    let delay = Duration::from_millis(10);
    assert_eq!(
        *log.borrow(),
        vec![
            Event::FetchStart(3),
            Event::FetchEnd(3),
            Event::Pause(delay),
            Event::FetchStart(1),
            Event::FetchEnd(1),
            Event::Pause(delay),
            Event::FetchStart(2),
            Event::FetchEnd(2),
        ]
    );
    assert_eq!(controller.node_count(), 3);
}

#[tokio::test]
async fn test_stream_all_never_overlaps_fetches() {
    let log = EventLog::default();
    let fetcher = MockFetcher::new(4, log.clone());
    let max_in_flight = fetcher.max_in_flight.clone();
    let controller = StreamingController::new(
        engine_with_one_wall(),
        fetcher,
        RecordingPacer::new(log),
        ViewerConfig::default(),
    );

    controller
        .stream_all(&[1, 2, 3, 4, 5], &CancellationToken::new())
        .await;

    assert_eq!(max_in_flight.get(), 1);
}

#[tokio::test]
async fn test_batch_with_empty_fragments_only_counts_bytes() {
    let mut engine = MockEngine::new();
    let (vertices, indices) = triangle();
    engine.add_geometry(1, &vertices, &indices);
    engine.file_meshes = vec![FlatMesh {
        express_id: 9,
        geometries: vec![placed(1, [0.0; 3], Color::default())],
    }];
    // Fragments decode to no placed geometry
    engine.tape_meshes = vec![FlatMesh::default()];
    let (controller, _) = controller(engine, 10);

    controller.load_from_bytes("example.ifc", b"ISO-10303-21;").unwrap();
    let before = controller.node_count();

    let summary = controller
        .stream_all(&[100, 200], &CancellationToken::new())
        .await;

    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.bytes(), 20);
    assert_eq!(controller.total_downloaded(), 20);
    assert_eq!(controller.node_count(), before);
}

#[tokio::test]
async fn test_cancellation_observed_before_next_fragment() {
    let log = EventLog::default();
    let token = CancellationToken::new();
    let mut pacer = RecordingPacer::new(log.clone());
    pacer.cancel_on_pause = Some(token.clone());
    let controller = StreamingController::new(
        engine_with_one_wall(),
        MockFetcher::new(8, log.clone()),
        pacer,
        ViewerConfig::default(),
    );

    let summary = controller.stream_all(&[1, 2, 3], &token).await;

    assert!(summary.cancelled);
    assert_eq!(summary.completed.len(), 1);
    assert_eq!(controller.total_downloaded(), 8);
    let fetches = log
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::FetchStart(_)))
        .count();
    assert_eq!(fetches, 1);
}

#[tokio::test]
async fn test_failed_fragment_does_not_stop_batch() {
    let log = EventLog::default();
    let mut fetcher = MockFetcher::new(8, log.clone());
    fetcher.failing.insert(2);
    let controller = StreamingController::new(
        engine_with_one_wall(),
        fetcher,
        RecordingPacer::new(log),
        ViewerConfig::default(),
    );

    let summary = controller
        .stream_all(&[1, 2, 3], &CancellationToken::new())
        .await;

    let completed: Vec<u32> = summary.completed.iter().map(|r| r.express_id).collect();
    assert_eq!(completed, vec![1, 3]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, 2);
    assert!(summary.failed[0].1.is_network());
    assert_eq!(controller.total_downloaded(), 16);
}

#[tokio::test]
async fn test_toggle_drives_configured_batch() {
    let log = EventLog::default();
    let config = ViewerConfig {
        batch_ids: vec![100, 200],
        fragment_delay_ms: 25,
        ..Default::default()
    };
    let controller = StreamingController::new(
        engine_with_one_wall(),
        MockFetcher::new(10, log.clone()),
        RecordingPacer::new(log.clone()),
        config,
    );
    let toggle = StreamToggle::new();

    let Toggle::Started(token) = toggle.toggle() else {
        panic!("expected stream to start");
    };
    let summary = controller.stream_batch(&token).await;
    toggle.finish(&token);

    assert_eq!(summary.completed.len(), 2);
    assert!(!toggle.is_running());
    assert!(log
        .borrow()
        .contains(&Event::Pause(Duration::from_millis(25))));
}

#[tokio::test]
async fn test_file_load_keeps_model_open_and_can_be_evicted() {
    let mut engine = engine_with_one_wall();
    engine.file_meshes = engine.tape_meshes.clone();
    let (controller, _) = controller(engine, 10);

    let (model, stats) = controller
        .load_from_bytes("example.ifc", b"ISO-10303-21;")
        .unwrap();
    controller.stream_one(1).await.unwrap();

    assert_eq!(stats.placed_geometries, 1);
    assert_eq!(controller.node_count(), 2);
    controller.with_engine(|engine| {
        assert_eq!(engine.opens, 2);
        assert_eq!(engine.closes, 1);
        assert!(engine.open_models.contains(&model.0));
    });

    assert_eq!(controller.remove_model(model).len(), 1);
    assert_eq!(controller.node_count(), 1);
    assert_eq!(controller.clear_scene().len(), 1);
    assert_eq!(controller.node_count(), 0);
}

#[tokio::test]
async fn test_file_load_failure_is_reported() {
    let (controller, _) = controller(engine_with_one_wall(), 10);
    let err = controller.load_from_bytes("empty.ifc", &[]).unwrap_err();
    assert!(matches!(err, Error::ModelOpen(_)));
    assert_eq!(controller.node_count(), 0);
}

#[tokio::test]
async fn test_file_load_with_missing_geometry_closes_and_discards() {
    let mut engine = engine_with_one_wall();
    engine.file_meshes = vec![FlatMesh {
        express_id: 563782,
        geometries: vec![
            placed(77, [0.0; 3], Color::default()),
            placed(404, [1.0, 0.0, 0.0], Color::default()),
        ],
    }];
    let (controller, _) = controller(engine, 10);

    let err = controller
        .load_from_bytes("broken.ifc", b"ISO-10303-21;")
        .unwrap_err();

    assert!(matches!(err, Error::GeometryNotFound { geometry: 404, .. }));
    assert_eq!(controller.node_count(), 0);
    controller.with_engine(|engine| {
        assert_eq!(engine.opens, 1);
        assert_eq!(engine.closes, 1);
        assert!(engine.open_models.is_empty());
    });
}
