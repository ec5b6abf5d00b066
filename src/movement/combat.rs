//! Minimal combat resolution.
//!
//! Strength against strength, with defenders inside a standing city getting
//! a per-army bonus. The loser's stacks are destroyed outright; the winner
//! loses its weakest armies, half as many as the loser fielded, but never
//! its last one.

use crate::board::{PlayerId, Position, StackId, World};

/// Extra defence each army gets while inside a standing city.
pub const CITY_DEFENCE_BONUS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FightResult {
    AttackerWon,
    DefenderWon,
}

/// Decides a fight between two strength totals. Ties go to the defender.
pub fn resolve(attack: u32, defence: u32) -> FightResult {
    if attack > defence {
        FightResult::AttackerWon
    } else {
        FightResult::DefenderWon
    }
}

/// Stacks hostile to `owner` that would defend `target`.
///
/// Attacking any tile of a standing city engages every hostile stack inside
/// it.
pub fn defenders(world: &World, owner: PlayerId, target: Position) -> Vec<StackId> {
    let candidates = match world.city_at(target) {
        Some(city) if !city.burnt => world.stacks_in_city(city.id, None),
        _ => world.stacks_at(target),
    };
    candidates
        .into_iter()
        .filter(|id| {
            world
                .stack(*id)
                .map_or(false, |s| world.is_hostile(owner, s.owner))
        })
        .collect()
}

/// Attacks `target` with stack `attacker`.
///
/// Returns `None` when nobody defends the target. A losing attacker is
/// removed from the world; winning removes every defender.
pub fn fight(world: &mut World, attacker: StackId, target: Position) -> Option<FightResult> {
    let stack = world.stack(attacker)?;
    let owner = stack.owner;
    let attack_armies = stack.size();
    let attack: u32 = stack.armies.iter().map(|a| a.effective_strength()).sum();

    let defending = defenders(world, owner, target);
    if defending.is_empty() {
        return None;
    }
    let mut defence = 0u32;
    let mut defence_armies = 0usize;
    for id in &defending {
        if let Some(s) = world.stack(*id) {
            defence += s.armies.iter().map(|a| a.effective_strength()).sum::<u32>();
            defence_armies += s.size();
        }
    }
    if world.city_at(target).map_or(false, |c| !c.burnt) {
        defence += defence_armies as u32 * CITY_DEFENCE_BONUS;
    }

    let result = resolve(attack, defence);
    match result {
        FightResult::AttackerWon => {
            for id in defending {
                world.remove_stack(id);
            }
            take_losses(world, attacker, defence_armies / 2);
        }
        FightResult::DefenderWon => {
            world.remove_stack(attacker);
            let mut losses = attack_armies / 2;
            for id in defending {
                if losses == 0 {
                    break;
                }
                losses -= take_losses(world, id, losses);
            }
        }
    }
    Some(result)
}

/// Removes up to `count` of the weakest armies, always leaving one.
/// Returns how many were removed.
fn take_losses(world: &mut World, id: StackId, count: usize) -> usize {
    let Some(stack) = world.stack_mut(id) else {
        return 0;
    };
    let count = count.min(stack.size().saturating_sub(1));
    for _ in 0..count {
        let weakest = stack
            .armies
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| a.effective_strength())
            .map(|(i, _)| i);
        if let Some(i) = weakest {
            stack.armies.remove(i);
        }
    }
    count
}
