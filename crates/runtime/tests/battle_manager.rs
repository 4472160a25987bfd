use std::sync::Arc;
use std::time::Duration;

use battle_core::{BattleOutcome, BattleStatus, BattleType, GameDataOracle, TurnAction};
use battle_runtime::{
    BattleManager, BattleMessage, BattleSetup, CombatantSpec, FailureKind,
    InMemorySessionRepository, InMemorySnapshotRepository, NoticeKind, ParticipantSpec,
    ReplyNotifier, RuntimeConfig, RuntimeError, SessionRepository, SessionStatus,
    SnapshotRepository, actor_id_for,
};

fn game_data() -> Arc<dyn GameDataOracle> {
    Arc::new(battle_content::embedded_game_data().expect("embedded content loads"))
}

struct Stores {
    sessions: Arc<InMemorySessionRepository>,
    snapshots: Arc<InMemorySnapshotRepository>,
}

impl Stores {
    fn new() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            snapshots: Arc::new(InMemorySnapshotRepository::new()),
        }
    }

    fn manager(&self, config: RuntimeConfig) -> Arc<BattleManager> {
        BattleManager::builder()
            .config(config)
            .game_data(game_data())
            .sessions(self.sessions.clone())
            .snapshots(self.snapshots.clone())
            .build()
            .unwrap()
    }
}

/// Player with a level 10 Tidepup against an NPC with a level 5 Emberfox.
fn pve_setup(battle_id: &str) -> BattleSetup {
    BattleSetup::new(battle_id, BattleType::Pve)
        .with_host("ash")
        .with_seed(7)
        .with_participant(
            ParticipantSpec::player("ash", 1).with_combatant(CombatantSpec::new("tidepup", 10)),
        )
        .with_participant(
            ParticipantSpec::npc("wild", 2).with_combatant(CombatantSpec::new("emberfox", 5)),
        )
}

fn water_gun() -> TurnAction {
    TurnAction::Move {
        move_name: "water_gun".into(),
        target_ids: vec![],
    }
}

#[tokio::test]
async fn stronger_player_wins_pve_and_earns_rewards() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let battle = manager.create_battle(pve_setup("pve-1")).await.unwrap();

    let started = battle.start(Some("ash".into())).await.unwrap();
    assert!(started.success, "{:?}", started.reason);
    assert_eq!(started.status, Some(BattleStatus::Active));
    assert_eq!(
        stores.sessions.get("pve-1").unwrap().unwrap().status,
        SessionStatus::Active
    );

    let mut ended = None;
    for _ in 0..30 {
        let response = battle.take_turn("ash", water_gun()).await.unwrap();
        assert!(response.success, "{:?}", response.reason);
        if let Some(report) = response.ended {
            ended = Some(report);
            break;
        }
    }

    let ended = ended.expect("battle finished");
    assert_eq!(ended.status, BattleStatus::Completed);
    assert_eq!(ended.winner_id.as_deref(), Some("ash"));
    assert_eq!(ended.outcome, Some(BattleOutcome::Victory));
    let rewards = ended.rewards.expect("victory pays out");
    assert!(rewards.xp > 0);
    assert!(rewards.tokens > 0);

    let row = stores.sessions.get("pve-1").unwrap().unwrap();
    assert_eq!(row.status, SessionStatus::Completed);
    assert_eq!(row.winner_id.as_deref(), Some("ash"));
    assert!(manager.active_battles().is_empty());
    assert!(manager.get_battle("pve-1").await.unwrap().is_none());
}

#[tokio::test]
async fn only_the_host_may_start() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let battle = manager.create_battle(pve_setup("pve-host")).await.unwrap();

    let response = battle.start(Some("wild".into())).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.failure, Some(FailureKind::Validation));
    assert_eq!(response.status, Some(BattleStatus::Waiting));
}

#[tokio::test]
async fn out_of_turn_moves_are_rejected_without_changes() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let setup = BattleSetup::new("pvp-1", BattleType::Pvp)
        .with_host("ash")
        .with_seed(3)
        .with_participant(
            ParticipantSpec::player("ash", 1).with_combatant(CombatantSpec::new("voltkit", 10)),
        )
        .with_participant(
            ParticipantSpec::player("gary", 2).with_combatant(CombatantSpec::new("pebblet", 10)),
        );
    let battle = manager.create_battle(setup).await.unwrap();
    let started = battle.start(None).await.unwrap();
    let first = started.started.expect("start report").current_turn;
    let second = if first == "ash" { "gary" } else { "ash" };

    let before = battle.state().await.unwrap().unwrap();
    let response = battle
        .send(BattleMessage::ExecuteMove {
            user_id: second.into(),
            move_name: "tackle".into(),
            target_ids: vec![],
        })
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(response.failure, Some(FailureKind::Validation));

    let after = battle.state().await.unwrap().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.current_turn.as_deref(), Some(first.as_str()));
}

#[tokio::test]
async fn json_messages_round_trip_through_the_handle() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let battle = manager.create_battle(pve_setup("pve-json")).await.unwrap();

    let reply = battle
        .send_json(r#"{"action":"start_battle","user_id":"ash"}"#)
        .await
        .unwrap();
    assert!(reply.contains(r#""success":true"#), "{reply}");

    let reply = battle
        .send_json(r#"{"action":"use_item","user_id":"ash","item_id":"elixir_of_nothing"}"#)
        .await
        .unwrap();
    assert!(reply.contains(r#""success":false"#), "{reply}");

    let err = battle.send_json(r#"{"action":"dance"}"#).await.unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidMessage(_)));
}

#[tokio::test]
async fn setup_with_unknown_species_is_rejected() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let setup = BattleSetup::new("broken", BattleType::Pve)
        .with_participant(
            ParticipantSpec::player("ash", 1).with_combatant(CombatantSpec::new("missingno", 5)),
        );

    let err = manager.create_battle(setup).await.unwrap_err();
    assert!(matches!(err, RuntimeError::SetupRejected { ref battle_id, .. } if battle_id == "broken"));
    assert_eq!(
        stores.sessions.get("broken").unwrap().unwrap().status,
        SessionStatus::Cancelled
    );
    assert!(manager.active_battles().is_empty());
}

#[tokio::test]
async fn creating_an_open_battle_twice_returns_the_same_actor() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let first = manager.create_battle(pve_setup("dup")).await.unwrap();
    let second = manager.create_battle(pve_setup("dup")).await.unwrap();

    assert_eq!(first.actor_id(), second.actor_id());
    assert_eq!(first.actor_id(), actor_id_for("dup"));
    assert_eq!(manager.active_battles(), vec!["dup".to_owned()]);
}

#[tokio::test]
async fn end_battle_finalizes_row_and_evicts() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let battle = manager.create_battle(pve_setup("pve-end")).await.unwrap();
    battle.start(None).await.unwrap();

    let response = manager
        .end_battle("pve-end", "host left", None)
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.status, Some(BattleStatus::Cancelled));

    let row = stores.sessions.get("pve-end").unwrap().unwrap();
    assert_eq!(row.status, SessionStatus::Cancelled);
    assert_eq!(row.end_reason.as_deref(), Some("host left"));
    assert!(manager.active_battles().is_empty());
    // The final state was persisted on the way out.
    assert!(stores.snapshots.load(&actor_id_for("pve-end")).unwrap().is_some());

    let err = manager.send("pve-end", BattleMessage::GetBattleState).await.unwrap_err();
    assert!(matches!(err, RuntimeError::BattleNotFound(_)));
}

#[tokio::test]
async fn restart_recovers_active_battles_with_their_turn_state() {
    let stores = Stores::new();

    let (turn, turn_number) = {
        let manager = stores.manager(RuntimeConfig::default());
        let battle = manager.create_battle(pve_setup("pve-restart")).await.unwrap();
        battle.start(Some("ash".into())).await.unwrap();
        let growl = TurnAction::Move {
            move_name: "growl".into(),
            target_ids: vec![],
        };
        let response = battle.take_turn("ash", growl).await.unwrap();
        assert!(response.success, "{:?}", response.reason);
        assert!(response.ended.is_none());

        let state = battle.state().await.unwrap().unwrap();
        manager.shutdown().await;
        (state.current_turn, state.turn_number)
    };

    let manager = stores.manager(RuntimeConfig::default());
    assert_eq!(manager.start().await.unwrap(), 1);
    assert_eq!(manager.active_battles(), vec!["pve-restart".to_owned()]);

    let battle = manager.get_battle("pve-restart").await.unwrap().expect("recovered");
    let state = battle.state().await.unwrap().unwrap();
    assert_eq!(state.status, BattleStatus::Active);
    assert_eq!(state.current_turn, turn);
    assert_eq!(state.turn_number, turn_number);

    manager.shutdown().await;
}

#[tokio::test]
async fn new_battles_are_snapshotted_before_create_returns() {
    let stores = Stores::new();
    {
        // No shutdown and no sweep: the process dies right after creating.
        let manager = stores.manager(RuntimeConfig::default());
        manager.create_battle(pve_setup("crash")).await.unwrap();
        assert!(stores.snapshots.load(&actor_id_for("crash")).unwrap().is_some());
    }

    let manager = stores.manager(RuntimeConfig::default());
    assert_eq!(manager.start().await.unwrap(), 1);

    let battle = manager.create_battle(pve_setup("crash")).await.unwrap();
    let state = battle.state().await.unwrap().unwrap();
    assert_eq!(state.participants.len(), 2);

    let started = battle.start(Some("ash".into())).await.unwrap();
    assert!(started.success, "{:?}", started.reason);
    assert_eq!(started.status, Some(BattleStatus::Active));

    manager.shutdown().await;
}

#[tokio::test]
async fn recreating_an_open_battle_without_a_snapshot_seats_the_setup() {
    let stores = Stores::new();
    {
        let manager = stores.manager(RuntimeConfig::default());
        manager.create_battle(pve_setup("lost")).await.unwrap();
    }
    // The session row landed but the snapshot did not.
    stores.snapshots.delete(&actor_id_for("lost")).unwrap();

    let manager = stores.manager(RuntimeConfig::default());
    assert_eq!(manager.start().await.unwrap(), 1);
    let revived = manager.get_battle("lost").await.unwrap().expect("row is open");
    assert!(revived.state().await.unwrap().unwrap().participants.is_empty());

    let battle = manager.create_battle(pve_setup("lost")).await.unwrap();
    assert_eq!(battle.actor_id(), revived.actor_id());
    let state = battle.state().await.unwrap().unwrap();
    assert_eq!(state.participants.len(), 2);
    assert!(stores.snapshots.load(&actor_id_for("lost")).unwrap().is_some());

    let started = battle.start(Some("ash".into())).await.unwrap();
    assert!(started.success, "{:?}", started.reason);
    assert_eq!(
        stores.sessions.get("lost").unwrap().unwrap().status,
        SessionStatus::Active
    );

    manager.shutdown().await;
}

#[tokio::test]
async fn sessions_outside_the_recovery_window_stay_down() {
    let stores = Stores::new();
    {
        let manager = stores.manager(RuntimeConfig::default());
        manager.create_battle(pve_setup("old")).await.unwrap();
        manager.shutdown().await;
    }

    let config = RuntimeConfig {
        recovery_window: Duration::ZERO,
        ..RuntimeConfig::default()
    };
    let manager = stores.manager(config);
    assert_eq!(manager.recover_battles().await.unwrap(), 0);
    assert!(manager.active_battles().is_empty());

    // Still reachable on demand while the row is open.
    assert!(manager.get_battle("old").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn idle_battles_are_expired_by_the_sweep() {
    let stores = Stores::new();
    let notifier = Arc::new(ReplyNotifier::new());
    let config = RuntimeConfig {
        idle_timeout: Duration::from_secs(60 * 60),
        cleanup_interval: Duration::from_secs(5 * 60),
        ..RuntimeConfig::default()
    };
    let manager = BattleManager::builder()
        .config(config)
        .game_data(game_data())
        .sessions(stores.sessions.clone())
        .snapshots(stores.snapshots.clone())
        .notifier(notifier.clone())
        .build()
        .unwrap();
    manager.start().await.unwrap();

    let battle = manager.create_battle(pve_setup("sleepy")).await.unwrap();
    battle.start(Some("ash".into())).await.unwrap();
    let expired = notifier.register("sleepy");

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(manager.active_battles(), vec!["sleepy".to_owned()]);

    tokio::time::sleep(Duration::from_secs(40 * 60)).await;
    assert!(manager.active_battles().is_empty());

    let row = stores.sessions.get("sleepy").unwrap().unwrap();
    assert_eq!(row.status, SessionStatus::Expired);
    let notice = expired.await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Expired);
    assert_eq!(notice.recipients, vec!["ash".to_owned()]);

    manager.shutdown().await;
}

#[tokio::test]
async fn metrics_count_operations() {
    let stores = Stores::new();
    let manager = stores.manager(RuntimeConfig::default());
    let battle = manager.create_battle(pve_setup("metered")).await.unwrap();
    battle.state().await.unwrap();
    battle.state().await.unwrap();

    let metrics = manager.metrics();
    assert_eq!(metrics.active_battles, 1);
    let state_calls = metrics
        .operations
        .iter()
        .find(|op| op.operation == "get_battle_state")
        .map(|op| op.calls);
    assert_eq!(state_calls, Some(2));
    // Two participants and two combatants were seated.
    assert_eq!(metrics.actors.asks, 6);
    assert_eq!(metrics.caches.len(), 4);
}
