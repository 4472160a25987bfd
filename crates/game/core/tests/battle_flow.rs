use std::sync::Arc;

use battle_core::env::{
    BaseStats, EffectTarget, LearnsetEntry, MoveCategory, StageChange, StatusInfliction,
};
use battle_core::{
    BattleConfig, BattleEngine, BattleError, BattleOutcome, BattleSession, BattleStatus,
    BattleType, Combatant, ElementType, ErrorKind, ItemDefinition, ItemEffect, MoveDefinition,
    ParticipantFlags, ParticipantStatus, SpeciesTemplate, StatBlock, StatKind, StaticGameData,
    StatusEffect, StatusKind, TurnAction, Weather,
};

fn mv(name: &str, element: ElementType, category: MoveCategory, power: u32) -> MoveDefinition {
    MoveDefinition {
        name: name.into(),
        element,
        category,
        power,
        accuracy: 100,
        inflicts: None,
        stage_change: None,
        sets_weather: None,
        field_condition: None,
    }
}

fn game_data() -> Arc<StaticGameData> {
    let growl = MoveDefinition {
        stage_change: Some(StageChange {
            stat: StatKind::Attack,
            stages: -1,
            target: EffectTarget::Target,
        }),
        ..mv("growl", ElementType::Normal, MoveCategory::Status, 0)
    };
    let sandstorm = MoveDefinition {
        sets_weather: Some(Weather::Sandstorm),
        ..mv("sandstorm", ElementType::Earth, MoveCategory::Status, 0)
    };
    let toxic = MoveDefinition {
        inflicts: Some(StatusInfliction {
            kind: StatusKind::Poison,
            chance: 100,
            turns: 3,
        }),
        ..mv("toxic", ElementType::Shadow, MoveCategory::Status, 0)
    };

    Arc::new(
        StaticGameData::new()
            .with_species(SpeciesTemplate {
                id: "pebblet".into(),
                name: "Pebblet".into(),
                types: vec![ElementType::Earth],
                base_stats: BaseStats {
                    hp: 40,
                    attack: 35,
                    defense: 40,
                    special: 20,
                    speed: 15,
                },
                base_xp: 60,
                learnset: vec![LearnsetEntry {
                    level: 1,
                    move_name: "tackle".into(),
                }],
                forms: vec![],
            })
            .with_move(mv("tackle", ElementType::Normal, MoveCategory::Physical, 40))
            .with_move(mv("water_gun", ElementType::Water, MoveCategory::Special, 40))
            .with_move(growl)
            .with_move(sandstorm)
            .with_move(toxic)
            .with_item(ItemDefinition {
                id: "potion".into(),
                name: "Potion".into(),
                effect: ItemEffect::Heal(20),
            })
            .with_item(ItemDefinition {
                id: "revive".into(),
                name: "Revive".into(),
                effect: ItemEffect::Revive(50),
            })
            .with_effectiveness(ElementType::Water, ElementType::Fire, 2.0),
    )
}

fn fighter(species: &str, element: ElementType, speed: u32, hp: u32, moves: &[&str]) -> Combatant {
    Combatant::new(
        species,
        10,
        hp,
        StatBlock {
            attack: 20,
            defense: 20,
            special: 20,
            speed,
        },
        vec![element],
        moves.iter().map(|m| m.to_string()),
    )
}

fn engine(battle_type: BattleType, seed: u64) -> BattleEngine {
    let session = BattleSession::new("battle-1", battle_type, seed, 1_700_000_000);
    BattleEngine::new(session, game_data())
}

/// Alice (speed 30) against Bob (speed 20), both joined and ready.
fn pvp(seed: u64) -> BattleEngine {
    let mut engine = engine(BattleType::Pvp, seed);
    engine
        .add_participant("alice", 1, ParticipantFlags::HOST, ParticipantStatus::Joined)
        .unwrap();
    engine
        .add_participant("bob", 2, ParticipantFlags::PLAYER, ParticipantStatus::Joined)
        .unwrap();
    let moves = ["tackle", "growl", "sandstorm", "toxic"];
    engine
        .add_combatant("alice", fighter("emberfox", ElementType::Fire, 30, 40, &moves), 0)
        .unwrap();
    engine
        .add_combatant("bob", fighter("tidepup", ElementType::Water, 20, 40, &moves), 0)
        .unwrap();
    engine
}

#[test]
fn start_requires_every_participant_joined() {
    let mut engine = pvp(1);
    engine
        .add_participant("carol", 3, ParticipantFlags::PLAYER, ParticipantStatus::Invited)
        .unwrap();
    engine
        .add_combatant("carol", fighter("pebblet", ElementType::Earth, 10, 30, &["tackle"]), 0)
        .unwrap();

    let before = engine.session().clone();
    let err = engine.start_battle().unwrap_err();
    assert!(matches!(err, BattleError::NotJoined { ref participant, .. } if participant == "carol"));
    assert_eq!(engine.session(), &before);

    engine
        .set_participant_status("carol", ParticipantStatus::Joined)
        .unwrap();
    let report = engine.start_battle().unwrap();
    assert_eq!(report.turn_order, vec!["alice", "bob", "carol"]);
    assert_eq!(engine.session().status, BattleStatus::Active);
    assert_eq!(engine.session().current_turn.as_deref(), Some("alice"));
    assert_eq!(engine.session().turn_number, 1);
}

#[test]
fn start_requires_a_living_combatant() {
    let mut engine = pvp(1);
    engine
        .add_participant("carol", 3, ParticipantFlags::PLAYER, ParticipantStatus::Joined)
        .unwrap();
    engine
        .add_combatant(
            "carol",
            fighter("pebblet", ElementType::Earth, 10, 30, &["tackle"]).with_hp(0),
            0,
        )
        .unwrap();

    assert_eq!(
        engine.start_battle().unwrap_err(),
        BattleError::NoLivingCombatant("carol".into())
    );
    assert_eq!(engine.session().status, BattleStatus::Waiting);
}

#[test]
fn speed_ties_fall_back_to_join_order() {
    let mut engine = engine(BattleType::Multi, 3);
    for (i, id) in ["zed", "amy", "kim"].into_iter().enumerate() {
        engine
            .add_participant(id, i as u32, ParticipantFlags::PLAYER, ParticipantStatus::Joined)
            .unwrap();
        engine
            .add_combatant(id, fighter("pebblet", ElementType::Earth, 25, 30, &["tackle"]), 0)
            .unwrap();
    }
    let report = engine.start_battle().unwrap();
    assert_eq!(report.turn_order, vec!["zed", "amy", "kim"]);
}

#[test]
fn setup_rejects_duplicates_and_bad_slots() {
    let mut engine = pvp(1);
    assert_eq!(
        engine
            .add_participant("alice", 3, ParticipantFlags::PLAYER, ParticipantStatus::Joined)
            .unwrap_err(),
        BattleError::DuplicateParticipant("alice".into())
    );
    let err = engine
        .add_combatant("alice", fighter("x", ElementType::Fire, 1, 1, &[]), 6)
        .unwrap_err();
    assert!(matches!(err, BattleError::SlotOutOfRange { slot: 6, .. }));
    let err = engine
        .add_combatant("nobody", fighter("x", ElementType::Fire, 1, 1, &[]), 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    engine.start_battle().unwrap();
    assert!(matches!(
        engine.add_participant("late", 3, ParticipantFlags::PLAYER, ParticipantStatus::Joined),
        Err(BattleError::NotWaiting(BattleStatus::Active))
    ));
}

#[test]
fn out_of_turn_move_leaves_state_unchanged() {
    let mut engine = pvp(7);
    engine.start_battle().unwrap();

    let before = engine.session().clone();
    let err = engine.execute_move("bob", "tackle", &[]).unwrap_err();
    assert_eq!(err, BattleError::not_your_turn("bob", Some("alice")));
    assert_eq!(engine.session(), &before);

    let err = engine.execute_move("alice", "hyper_beam", &[]).unwrap_err();
    assert!(matches!(err, BattleError::MoveNotKnown { .. }));
    let err = engine
        .execute_move("alice", "tackle", &["ghost".to_string()])
        .unwrap_err();
    assert_eq!(err, BattleError::UnknownTarget("ghost".into()));
    assert_eq!(engine.session(), &before);
}

#[test]
fn hp_stays_in_bounds_until_someone_wins() {
    let mut engine = pvp(11);
    engine.start_battle().unwrap();

    for _ in 0..200 {
        if !engine.session().is_active() {
            break;
        }
        let actor = engine.session().current_turn.clone().unwrap();
        assert!(engine.session().turn_order.contains(&actor));
        engine.execute_move(&actor, "tackle", &[]).unwrap();
        for id in ["alice", "bob"] {
            let c = engine.session().combatant(id, 0).unwrap();
            assert!(c.current_hp <= c.max_hp);
        }
    }

    let session = engine.session();
    assert_eq!(session.status, BattleStatus::Completed);
    assert_eq!(session.outcome, Some(BattleOutcome::Decided));
    let winner = session.winner_id.clone().unwrap();
    assert!(winner == "alice" || winner == "bob");
    assert!(session.current_turn.is_none());
}

#[test]
fn fainted_participants_are_skipped() {
    let mut engine = engine(BattleType::Multi, 5);
    let teams = [("alice", 30, 40), ("bob", 20, 1), ("carol", 10, 40)];
    for (team, (id, speed, hp)) in teams.into_iter().enumerate() {
        engine
            .add_participant(id, team as u32, ParticipantFlags::PLAYER, ParticipantStatus::Joined)
            .unwrap();
        engine
            .add_combatant(id, fighter("pebblet", ElementType::Earth, speed, hp, &["tackle"]), 0)
            .unwrap();
    }
    engine.start_battle().unwrap();

    let report = engine
        .execute_move("alice", "tackle", &["bob".to_string()])
        .unwrap();
    assert!(report.hits[0].fainted);
    assert!(report.end.is_none());
    assert_eq!(engine.session().current_turn.as_deref(), Some("carol"));
    assert_eq!(engine.session().turn_number, 2);
}

#[test]
fn fainted_active_is_replaced_automatically() {
    let mut engine = pvp(2);
    engine
        .add_combatant("bob", fighter("spare", ElementType::Water, 5, 40, &["tackle"]), 3)
        .unwrap();
    engine
        .add_combatant("bob", fighter("tidepup", ElementType::Water, 20, 1, &["tackle"]), 0)
        .unwrap();
    engine.start_battle().unwrap();

    let report = engine.execute_move("alice", "tackle", &[]).unwrap();
    assert!(report.hits[0].fainted);
    assert_eq!(report.replacements.len(), 1);
    assert_eq!(engine.session().active_slot("bob"), Some(3));
    assert!(engine.session().is_active());
}

#[test]
fn pve_victory_grants_rewards() {
    let data = game_data();
    let session = BattleSession::new("wild-1", BattleType::Pve, 99, 0);
    let mut engine = BattleEngine::new(session, data.clone());
    engine
        .add_participant("trainer", 1, ParticipantFlags::HOST, ParticipantStatus::Joined)
        .unwrap();
    engine
        .add_participant("wild", 2, ParticipantFlags::NPC, ParticipantStatus::Joined)
        .unwrap();

    let player = Combatant::new(
        "emberfox",
        10,
        200,
        StatBlock {
            attack: 60,
            defense: 40,
            special: 40,
            speed: 50,
        },
        vec![ElementType::Fire],
        vec!["tackle".to_string()],
    );
    let template = battle_core::SpeciesOracle::species(data.as_ref(), "pebblet").unwrap();
    engine.add_combatant("trainer", player, 0).unwrap();
    engine
        .add_combatant("wild", Combatant::from_template(&template, 5), 0)
        .unwrap();
    engine.start_battle().unwrap();

    for _ in 0..100 {
        let Some(actor) = engine.session().current_turn.clone() else {
            break;
        };
        let action = if actor == "wild" {
            engine.choose_npc_action(&actor).unwrap()
        } else {
            TurnAction::Move {
                move_name: "tackle".into(),
                target_ids: vec![],
            }
        };
        engine.process_action(&actor, &action).unwrap();
    }

    let session = engine.session();
    assert_eq!(session.status, BattleStatus::Completed);
    assert_eq!(session.winner_id.as_deref(), Some("trainer"));
    assert_eq!(session.outcome, Some(BattleOutcome::Victory));
    let rewards = session.rewards.clone().unwrap();
    assert_eq!(rewards.recipient, "trainer");
    assert!(rewards.xp > 0);
    assert!(rewards.tokens > 0);
}

#[test]
fn switching_validates_slot_and_resets_stages() {
    let mut engine = pvp(4);
    engine
        .add_combatant("alice", fighter("reserve", ElementType::Fire, 10, 30, &["tackle"]), 1)
        .unwrap();
    engine
        .add_combatant("alice", fighter("fainted", ElementType::Fire, 10, 30, &["tackle"]).with_hp(0), 2)
        .unwrap();
    engine.start_battle().unwrap();

    assert_eq!(
        engine.switch_combatant("alice", 0).unwrap_err(),
        BattleError::SlotAlreadyActive(0)
    );
    assert_eq!(
        engine.switch_combatant("alice", 4).unwrap_err(),
        BattleError::EmptySlot(4)
    );
    assert_eq!(
        engine.switch_combatant("alice", 2).unwrap_err(),
        BattleError::FaintedCombatant(2)
    );

    // Bob lowers Alice's attack, then Alice swaps out.
    engine.execute_move("alice", "growl", &[]).unwrap();
    engine.execute_move("bob", "growl", &[]).unwrap();
    assert_eq!(engine.session().combatant("alice", 0).unwrap().stages.attack, -1);

    let report = engine.switch_combatant("alice", 1).unwrap();
    assert_eq!(report.from_slot, Some(0));
    assert_eq!(engine.session().active_slot("alice"), Some(1));
    assert_eq!(engine.session().combatant("alice", 0).unwrap().stages.attack, 0);
    assert_eq!(engine.session().current_turn.as_deref(), Some("bob"));
    assert!(engine.memo().is_empty());
}

#[test]
fn items_apply_effects_and_reject_unknown_ids() {
    let mut engine = pvp(8);
    engine
        .add_combatant("alice", fighter("emberfox", ElementType::Fire, 30, 40, &["tackle"]).with_hp(10), 0)
        .unwrap();
    engine.start_battle().unwrap();

    let err = engine.use_item("alice", "elixir", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        engine.use_item("alice", "revive", None).unwrap_err(),
        BattleError::ItemHasNoEffect("revive".into())
    );
    assert_eq!(
        engine.use_item("alice", "potion", Some("bob")).unwrap_err(),
        BattleError::InvalidTarget("bob".into())
    );

    let report = engine.use_item("alice", "potion", None).unwrap();
    assert_eq!(report.hp_restored, 20);
    assert_eq!(engine.session().combatant("alice", 0).unwrap().current_hp, 30);
    assert_eq!(engine.session().current_turn.as_deref(), Some("bob"));
}

#[test]
fn flee_is_pve_only_and_honours_modifiers() {
    let mut engine = pvp(3);
    engine.start_battle().unwrap();
    assert_eq!(
        engine.attempt_flee("alice").unwrap_err(),
        BattleError::FleeNotAllowed
    );

    let mut trapped = engine_with_runner(StatusKind::Trapped, 0.5);
    let report = trapped.attempt_flee("runner").unwrap();
    assert!(!report.success);
    assert_eq!(report.chance, 0.0);
    assert_eq!(trapped.session().current_turn.as_deref(), Some("wild"));

    let mut hasty = engine_with_runner(StatusKind::Haste, 1.0);
    let report = hasty.attempt_flee("runner").unwrap();
    assert!(report.success);
    assert_eq!(hasty.session().status, BattleStatus::Cancelled);
    assert_eq!(hasty.session().outcome, Some(BattleOutcome::Fled));
}

fn engine_with_runner(status: StatusKind, base_chance: f64) -> BattleEngine {
    let config = BattleConfig {
        base_flee_chance: base_chance,
        ..BattleConfig::default()
    };
    let mut engine = engine(BattleType::Pve, 6).with_config(config);
    engine
        .add_participant("runner", 1, ParticipantFlags::HOST, ParticipantStatus::Joined)
        .unwrap();
    engine
        .add_participant("wild", 2, ParticipantFlags::NPC, ParticipantStatus::Joined)
        .unwrap();
    let mut runner = fighter("emberfox", ElementType::Fire, 30, 40, &["tackle"]);
    runner.add_status(StatusEffect::inflict(status, 5, None, runner.max_hp));
    engine.add_combatant("runner", runner, 0).unwrap();
    engine
        .add_combatant("wild", fighter("pebblet", ElementType::Earth, 10, 40, &["tackle"]), 0)
        .unwrap();
    engine.start_battle().unwrap();
    engine
}

#[test]
fn end_of_round_ticks_statuses_and_weather() {
    let mut engine = pvp(12);
    engine.start_battle().unwrap();

    engine.execute_move("alice", "toxic", &[]).unwrap();
    engine.execute_move("bob", "sandstorm", &[]).unwrap();
    // Round 1 closed: poison and sandstorm both landed on bob.
    let bob = engine.session().combatant("bob", 0).unwrap();
    assert_eq!(bob.current_hp, 40 - 40 / 8 - 40 / 16);
    assert_eq!(bob.status_effects[0].turns_remaining, 2);
    let alice = engine.session().combatant("alice", 0).unwrap();
    assert_eq!(alice.current_hp, 40 - 40 / 16);
    assert_eq!(engine.session().field.weather, Weather::Sandstorm);
    assert_eq!(engine.session().round, 2);
    assert_eq!(engine.session().current_turn.as_deref(), Some("alice"));
    assert_eq!(engine.session().turn_number, 3);
}

#[test]
fn end_battle_forces_terminal_state() {
    let mut waiting = pvp(1);
    let report = waiting.end_battle("host cancelled", None).unwrap();
    assert_eq!(report.status, BattleStatus::Cancelled);
    assert!(waiting.end_battle("again", None).is_err());

    let mut active = pvp(1);
    active.start_battle().unwrap();
    let report = active.end_battle("admin", Some("bob")).unwrap();
    assert_eq!(report.status, BattleStatus::Completed);
    assert_eq!(active.session().winner_id.as_deref(), Some("bob"));
    assert_eq!(active.session().end_reason.as_deref(), Some("admin"));
    assert!(matches!(
        active.end_battle("late", None),
        Err(BattleError::InvalidTransition { .. })
    ));
}

#[test]
fn identical_seeds_replay_identically() {
    let play = |seed| {
        let mut engine = pvp(seed);
        engine.set_time(42);
        engine.start_battle().unwrap();
        for _ in 0..6 {
            let Some(actor) = engine.session().current_turn.clone() else {
                break;
            };
            engine.execute_move(&actor, "tackle", &[]).unwrap();
        }
        engine.into_session()
    };
    assert_eq!(play(1234), play(1234));
}

#[test]
fn session_survives_binary_snapshot() {
    let mut engine = pvp(21);
    engine.start_battle().unwrap();
    engine.execute_move("alice", "toxic", &[]).unwrap();
    let session = engine.into_session();

    let bytes = bincode::serialize(&session).unwrap();
    let restored: BattleSession = bincode::deserialize(&bytes).unwrap();
    assert_eq!(restored, session);

    let view = BattleEngine::new(restored, game_data()).state_view();
    assert_eq!(view.current_turn.as_deref(), Some("bob"));
    assert_eq!(view.participants.len(), 2);
    serde_json::to_string(&view).unwrap();
}
