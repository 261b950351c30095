//! Work-queue and consumer-window semantics of the bus adapter.

mod common;

use tokio::time::{Duration, Instant};

use felt_engine::player::{LastAction, Player};
use felt_server::bus::{action_subject, table_subject, EventBus, TournamentBus};

fn deadline_in(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

#[tokio::test]
async fn acked_message_is_delivered_exactly_once() {
    let bus = EventBus::tournament_stream();
    let subject = action_subject("t1", "p1");
    bus.publish(&subject, b"first".to_vec()).unwrap();

    let mut consumer = bus.pull_consumer(subject.clone(), "durable-t1-p1-1");
    let delivery = consumer.next(deadline_in(100)).await.expect("delivery");
    assert_eq!(delivery.payload(), b"first");
    delivery.ack();

    // The same submission must not be seen by a later consumer.
    let mut replay = bus.pull_consumer(subject, "durable-t1-p1-2");
    assert!(replay.next(deadline_in(50)).await.is_none());
}

#[tokio::test]
async fn unacked_delivery_returns_to_the_queue() {
    let bus = EventBus::tournament_stream();
    let subject = action_subject("t1", "p1");
    bus.publish(&subject, b"keep".to_vec()).unwrap();

    {
        let mut consumer = bus.pull_consumer(subject.clone(), "durable-t1-p1-1");
        let delivery = consumer.next(deadline_in(100)).await.expect("delivery");
        assert_eq!(delivery.payload(), b"keep");
        // Dropped without ack.
    }

    let mut retry = bus.pull_consumer(subject, "durable-t1-p1-2");
    let redelivered = retry.next(deadline_in(100)).await.expect("redelivery");
    assert_eq!(redelivered.payload(), b"keep");
}

#[tokio::test]
async fn purge_discards_everything_pending() {
    let bus = EventBus::tournament_stream();
    let subject = action_subject("t1", "p1");
    bus.publish(&subject, b"stale-1".to_vec()).unwrap();
    bus.publish(&subject, b"stale-2".to_vec()).unwrap();

    assert_eq!(bus.purge(&subject), 2);

    let mut consumer = bus.pull_consumer(subject.clone(), "durable-t1-p1-1");
    assert!(consumer.next(deadline_in(50)).await.is_none());

    bus.publish(&subject, b"fresh".to_vec()).unwrap();
    let delivery = consumer.next(deadline_in(100)).await.expect("fresh delivery");
    assert_eq!(delivery.payload(), b"fresh");
}

#[tokio::test]
async fn per_turn_consumer_never_sees_an_earlier_window() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let mut early = Player::new("p1", 0);
    early.last_action = LastAction::Fold;
    // Submitted outside any turn window.
    bus.submit_action("t1", &early).unwrap();

    let mut consumer = bus.action_consumer("t1", "p1", 1);
    assert!(consumer.next(deadline_in(50)).await.is_none());

    let mut fresh = Player::new("p1", 0);
    fresh.last_action = LastAction::Check;
    bus.submit_action("t1", &fresh).unwrap();
    let delivery = consumer.next(deadline_in(100)).await.expect("delivery");
    let decoded: Player = serde_json::from_slice(delivery.payload()).unwrap();
    assert_eq!(decoded.last_action, LastAction::Check);
}

#[tokio::test]
async fn consumer_wakes_on_a_late_publish() {
    let bus = EventBus::tournament_stream();
    let subject = action_subject("t1", "p1");
    let publisher = bus.clone();
    let late_subject = subject.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        publisher.publish(&late_subject, b"late".to_vec()).unwrap();
    });

    let mut consumer = bus.pull_consumer(subject, "durable-t1-p1-1");
    let delivery = consumer.next(deadline_in(500)).await.expect("late delivery");
    assert_eq!(delivery.payload(), b"late");
}

#[tokio::test]
async fn publishing_outside_the_stream_subjects_fails() {
    let bus = EventBus::tournament_stream();
    assert!(bus.publish("chat.lobby", b"hi".to_vec()).is_err());
    assert!(bus.publish(&table_subject("t1"), b"ok".to_vec()).is_ok());
}

#[tokio::test]
async fn table_subscribers_do_not_receive_private_views() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let mut table_sub = bus.bus().subscribe("pokerServer.tournament.*");

    let mut table = felt_engine::table::Table::new("t9", 100, 30);
    table.seat(Player::new("p1", 500));
    bus.publish_table(&table).unwrap();
    bus.publish_player("t9", &table.players[0]).unwrap();

    let first = table_sub.recv().await.expect("table snapshot");
    assert_eq!(first.subject, table_subject("t9"));
    // Only the snapshot should arrive; a private view would be a second
    // message on this subscription.
    let extra = tokio::time::timeout(Duration::from_millis(50), table_sub.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn public_snapshots_carry_no_hole_cards() {
    let bus = TournamentBus::new(EventBus::tournament_stream());
    let mut snapshot_sub = bus.subscribe_table("t2");
    let mut view_sub = bus.bus().subscribe("pokerServer.tournament.t2.p1");

    let mut table = common::test_table("t2", &[1_000, 1_000], 100, 30);
    let deal = felt_engine::deck::HandDeal::from_seed(3, 2).unwrap();
    table.deal_from(&deal).unwrap();
    bus.publish_table(&table).unwrap();
    bus.publish_player("t2", &table.players[0]).unwrap();

    let snapshot = snapshot_sub.recv().await.expect("snapshot");
    let decoded: felt_engine::table::Table = serde_json::from_slice(&snapshot.payload).unwrap();
    assert!(decoded.players.iter().all(|p| p.cards.is_empty()));

    let view = view_sub.recv().await.expect("private view");
    let decoded: Player = serde_json::from_slice(&view.payload).unwrap();
    assert_eq!(decoded.cards.len(), 2);
}
