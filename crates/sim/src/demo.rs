//! Scripted PvE battle used by the simulator.
use std::sync::Arc;

use anyhow::{Result, bail};
use battle_core::{BattleStateView, BattleType, TurnAction};
use battle_runtime::{BattleManager, BattleSetup, CombatantSpec, ParticipantSpec};

const PLAYER: &str = "trainer";
const NPC: &str = "wild";
const MAX_TURNS: u32 = 50;

/// Plays a level 10 Tidepup against a level 5 Emberfox until one side faints.
pub async fn run_pve(manager: &Arc<BattleManager>, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    let setup = BattleSetup::new(format!("demo-{seed:016x}"), BattleType::Pve)
        .with_host(PLAYER)
        .with_seed(seed)
        .with_participant(
            ParticipantSpec::player(PLAYER, 1).with_combatant(CombatantSpec::new("tidepup", 10)),
        )
        .with_participant(
            ParticipantSpec::npc(NPC, 2).with_combatant(CombatantSpec::new("emberfox", 5)),
        );

    let battle = manager.create_battle(setup).await?;
    tracing::info!(
        battle = battle.battle_id(),
        actor = battle.actor_id(),
        seed,
        "Demo battle created"
    );

    let started = battle.start(Some(PLAYER.into())).await?;
    if !started.success {
        bail!("demo battle did not start: {:?}", started.reason);
    }

    for turn in 0..MAX_TURNS {
        let Some(state) = battle.state().await? else {
            bail!("demo battle lost its state");
        };
        let Some(action) = pick_action(&state, turn) else {
            bail!("{PLAYER} has no usable move");
        };

        let response = battle.take_turn(PLAYER, action).await?;
        if !response.success {
            bail!("turn rejected: {:?}", response.reason);
        }
        for outcome in &response.outcomes {
            tracing::info!("{}", serde_json::to_string(outcome)?);
        }
        if let Some(ended) = response.ended {
            tracing::info!(
                status = %ended.status,
                winner = ended.winner_id.as_deref().unwrap_or("none"),
                outcome = ?ended.outcome,
                rewards = ?ended.rewards,
                "Demo battle finished"
            );
            return Ok(());
        }
    }

    tracing::warn!("Demo battle hit the turn limit; ending it");
    battle.end("turn limit", None).await?;
    Ok(())
}

/// Cycles through the player's active combatant's moves.
fn pick_action(state: &BattleStateView, turn: u32) -> Option<TurnAction> {
    let player = state.participants.iter().find(|p| p.id == PLAYER)?;
    let active = player.combatants.iter().find(|c| c.active)?;
    if active.moves.is_empty() {
        return None;
    }
    let move_name = active.moves[turn as usize % active.moves.len()].clone();
    Some(TurnAction::Move {
        move_name,
        target_ids: vec![NPC.into()],
    })
}
