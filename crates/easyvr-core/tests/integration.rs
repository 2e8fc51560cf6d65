//! End-to-end scenarios against the scripted mock module.

use std::sync::Arc;
use std::time::Duration;

use easyvr_core::easyvr_types::{ErrorCode, Knob, Language, ModuleId, codec};
use easyvr_core::{
    EasyVr, EngineConfig, Error, MockTransport, Pending, RetryConfig, StatusFlags, with_retry,
};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine() -> (EasyVr<MockTransport>, MockTransport) {
    init_tracing();
    let mock = MockTransport::new();
    (EasyVr::new(mock.clone()), mock)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn test_add_command_frame_for_any_slot(group in 0u8..=16, index in 0u8..=31) {
        let written = block_on(async {
            let (mut easyvr, mock) = engine();
            mock.queue_reply(b"o").await;
            assert!(easyvr.add_command(group, index).await.unwrap());
            mock.written().await
        });
        prop_assert_eq!(written.len(), 3);
        prop_assert_eq!(written[0], b'g');
        prop_assert_eq!(codec::decode(written[1]), Ok(group as i8));
        prop_assert_eq!(codec::decode(written[2]), Ok(index as i8));
    }

    #[test]
    fn test_out_of_range_slot_never_writes(group in 17u8.., index in 0u8..=31) {
        let writes = block_on(async {
            let (mut easyvr, mock) = engine();
            assert!(easyvr.add_command(group, index).await.is_err());
            assert!(easyvr.remove_command(index, group.max(32)).await.is_err());
            mock.write_count()
        });
        prop_assert_eq!(writes, 0);
    }
}

#[tokio::test]
async fn test_add_command_round_trip() {
    let (mut easyvr, mock) = engine();
    mock.queue_reply(b"o").await;

    assert!(easyvr.add_command(3, 5).await.unwrap());
    assert_eq!(mock.written().await, b"gDF");
    assert_eq!(easyvr.session().flags, StatusFlags::default());
}

#[tokio::test]
async fn test_set_delay_round_trip() {
    let (mut easyvr, mock) = engine();
    mock.queue_reply(b"o").await;

    assert!(easyvr.set_delay(93).await.unwrap());
    assert_eq!(mock.written().await, b"yS");
}

#[tokio::test]
async fn test_bad_group_or_index_writes_nothing() {
    let (mut easyvr, mock) = engine();

    assert!(matches!(
        easyvr.add_command(17, 0).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        easyvr.add_command(0, 32).await,
        Err(Error::Validation(_))
    ));
    assert_eq!(mock.write_count(), 0);
    assert!(mock.written().await.is_empty());
}

#[tokio::test]
async fn test_unknown_status_resets_session() {
    let (mut easyvr, mock) = engine();

    // leave a recognised command behind
    easyvr.recognize_command(2).await.unwrap();
    mock.queue_reply(b"r").await;
    mock.queue_arguments(&[4]).await;
    assert!(easyvr.has_finished().await.unwrap());
    assert_eq!(easyvr.get_command(), Some(4));

    easyvr.recognize_command(2).await.unwrap();
    mock.queue_reply(b"Q").await;
    assert!(easyvr.has_finished().await.unwrap());

    assert_eq!(
        easyvr.session().flags,
        StatusFlags {
            error_pending: true,
            ..Default::default()
        }
    );
    assert_eq!(easyvr.session().last_value, 0);
    assert_eq!(easyvr.get_command(), None);
    assert_eq!(easyvr.get_error(), Some(ErrorCode(0)));
}

#[tokio::test]
async fn test_second_operation_while_pending_fails() {
    let (mut easyvr, mock) = engine();
    easyvr.recognize_word(1).await.unwrap();
    let before = mock.write_count();

    let err = easyvr.set_knob(Knob::Strict).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Busy {
            pending: Pending::Async {
                operation: "recognize_word"
            }
        }
    ));
    assert_eq!(mock.write_count(), before);

    // nothing arrived yet
    assert!(!easyvr.has_finished().await.unwrap());
    assert!(matches!(easyvr.pending(), Pending::Async { .. }));

    mock.queue_reply(b"t").await;
    assert!(easyvr.has_finished().await.unwrap());
    assert!(easyvr.is_timeout());
    assert_eq!(easyvr.get_word(), None);

    mock.queue_reply(b"o").await;
    assert!(easyvr.set_knob(Knob::Strict).await.unwrap());
}

#[tokio::test]
async fn test_session_setup_and_grammar_dump() {
    let (mut easyvr, mock) = engine();
    mock.queue_reply(b"o").await;
    assert!(easyvr.detect().await.unwrap());

    mock.queue_reply(b"x").await;
    mock.queue_arguments(&[16]).await;
    let id = easyvr.get_id().await.unwrap().unwrap();
    assert_eq!(id, ModuleId::EasyVR3Plus);
    assert!(id.is_easyvr3_family());

    mock.queue_reply(b"o").await;
    assert!(easyvr.set_language(Language::Italian).await.unwrap());

    mock.queue_reply(b"z").await;
    mock.queue_arguments(&[0, 3]).await;
    for word in ["LEFT", "RIGHT", "STOP"] {
        mock.queue_arguments(&[word.len() as i32]).await;
        mock.queue_reply(word.as_bytes()).await;
    }
    let (info, labels) = easyvr.dump_grammar_labels(4).await.unwrap().unwrap();
    assert_eq!(info.count, 3);
    assert!(!info.is_trigger());
    assert_eq!(labels, ["LEFT", "RIGHT", "STOP"]);
    assert_eq!(mock.pending_replies().await, 0);
    assert_eq!(easyvr.pending(), Pending::Idle);
}

#[tokio::test]
async fn test_retry_shared_engine_through_garbled_reply() {
    let mock = MockTransport::new();
    mock.queue_reply(b"#x").await;
    mock.queue_arguments(&[8]).await;
    let shared = EasyVr::new(mock.clone()).into_shared();

    let config = RetryConfig::new(2)
        .initial_delay(Duration::from_millis(1))
        .jitter(false);
    let id = with_retry(&config, "get_id", || {
        let shared = Arc::clone(&shared);
        async move { shared.lock().await.get_id().await }
    })
    .await
    .unwrap();

    assert_eq!(id, Some(ModuleId::EasyVR3));
    assert_eq!(mock.written().await, b"xx ");
    let summary = shared.lock().await.metrics().summary();
    assert_eq!(summary.protocol_faults, 1);
    assert_eq!(summary.transactions, 2);
}

#[tokio::test]
async fn test_retry_gives_up_on_silent_module() {
    let (easyvr, _mock) = engine();
    let shared = easyvr.into_shared();

    let config = RetryConfig::new(1)
        .initial_delay(Duration::from_millis(1))
        .jitter(false);
    let err = with_retry(&config, "get_id", || {
        let shared = Arc::clone(&shared);
        async move { shared.lock().await.get_id().await }
    })
    .await
    .unwrap_err();

    match err {
        Error::PersistentFault {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*source, Error::Timeout { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!shared.lock().await.is_link_degraded());
}

#[tokio::test]
async fn test_config_from_toml_drives_engine() {
    let config = EngineConfig::from_toml_str("detect_attempts = 2\n").unwrap();
    let mock = MockTransport::new();
    let mut easyvr = EasyVr::with_config(mock.clone(), config).unwrap();

    assert!(!easyvr.detect().await.unwrap());
    assert_eq!(mock.written().await, b"bb");
}
