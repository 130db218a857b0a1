//! Loop-level behavior: gate consultation, ban-on-forbidden, shutdown.

use cadence_automation::{AutomationLoop, SimulatedChat};
use cadence_controller::pacing::FixedSource;
use cadence_controller::Controller;
use cadence_core::clock::ManualClock;
use cadence_core::config::{AutomationConfig, PacingConfig};
use cadence_core::types::{ActorId, DestinationId};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::watch;

const BOT: ActorId = ActorId(1000);

fn test_controller() -> Arc<Controller> {
    // Hour 13: neither active nor night, so intervals are exactly as drawn.
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap(),
    ));
    Arc::new(Controller::new(
        &PacingConfig::default(),
        clock,
        Arc::new(FixedSource(300)),
    ))
}

fn fast_config() -> AutomationConfig {
    AutomationConfig {
        send_jitter_secs: (0, 0),
        pass_delay_active_secs: (1, 1),
        pass_delay_idle_secs: (1, 1),
        shuffle_destinations: true,
    }
}

fn messages() -> Vec<String> {
    vec!["hey there".to_string(), "anyone around?".to_string()]
}

#[tokio::test(start_paused = true)]
async fn first_pass_sends_then_gate_blocks_repeats() {
    let controller = test_controller();
    let transport = Arc::new(SimulatedChat::with_seed(3, 11));
    let looper = AutomationLoop::new(
        controller.clone(),
        transport.clone(),
        BOT,
        messages(),
        fast_config(),
    )
    .unwrap();
    let (_tx, rx) = watch::channel(false);

    let first = looper.run_pass(&rx).await;
    assert_eq!(first.total, 3);
    assert_eq!(first.sent, 3);
    assert_eq!(first.skipped, 0);
    assert_eq!(transport.sent_count(), 3);

    // Everything the loop sent is now the last message in its destination,
    // so the whole next pass is denied by the gate.
    let second = looper.run_pass(&rx).await;
    assert_eq!(second.sent, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(transport.sent_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn forbidden_destination_is_banned_once_and_skipped_after() {
    let controller = test_controller();
    let mut chat = SimulatedChat::with_seed(3, 23);
    chat.forbid(DestinationId(2));
    let transport = Arc::new(chat);
    let looper = AutomationLoop::new(
        controller.clone(),
        transport.clone(),
        BOT,
        messages(),
        fast_config(),
    )
    .unwrap();
    let (_tx, rx) = watch::channel(false);

    let first = looper.run_pass(&rx).await;
    assert_eq!(first.sent, 2);
    assert_eq!(first.banned, 1);
    assert!(controller.is_banned(DestinationId(2)));

    // The ban is now enforced by the gate, not re-triggered by transport.
    let second = looper.run_pass(&rx).await;
    assert_eq!(second.banned, 0);
    assert_eq!(second.skipped, 3);
}

#[tokio::test(start_paused = true)]
async fn run_exits_when_shutdown_is_set() {
    let controller = test_controller();
    let transport = Arc::new(SimulatedChat::with_seed(2, 31));
    let looper = Arc::new(
        AutomationLoop::new(controller, transport, BOT, messages(), fast_config()).unwrap(),
    );
    let (tx, rx) = watch::channel(false);

    let handle = {
        let looper = looper.clone();
        tokio::spawn(async move { looper.run(rx).await })
    };

    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn empty_message_pool_is_a_config_error() {
    let controller = test_controller();
    let transport = Arc::new(SimulatedChat::with_seed(1, 41));
    let result = AutomationLoop::new(controller, transport, BOT, Vec::new(), fast_config());
    assert!(result.is_err());
}
