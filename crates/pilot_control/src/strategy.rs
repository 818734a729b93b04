//! Team posture scheduling.
//!
//! A breadth-first search over (ship count, depot count) states with three
//! actions. The first action on the shortest route to the goal becomes the
//! team's posture.

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Posture {
    BuildFleet,
    ExpandTerritory,
    FreeMine,
}

impl Posture {
    pub const ALL: [Posture; 3] = [
        Posture::BuildFleet,
        Posture::ExpandTerritory,
        Posture::FreeMine,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub goal_ships: u32,
    pub goal_depots: u32,
    pub min_ships: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            goal_ships: 10,
            goal_depots: 10,
            min_ships: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategyState {
    pub ships: u32,
    pub depots: u32,
    pub posture: Posture,
}

impl StrategyConfig {
    pub fn precondition(&self, action: Posture, ships: u32, depots: u32) -> bool {
        match action {
            Posture::BuildFleet => {
                ships < self.min_ships || (ships < self.goal_ships && ships <= depots)
            }
            Posture::ExpandTerritory => depots < self.goal_depots && depots < ships,
            Posture::FreeMine => ships >= self.min_ships,
        }
    }

    pub fn apply(&self, action: Posture, state: StrategyState) -> StrategyState {
        let (ships, depots) = match action {
            Posture::BuildFleet if state.ships < self.min_ships => (self.min_ships, state.depots),
            Posture::BuildFleet => (state.depots + 1, state.depots),
            Posture::ExpandTerritory => (state.ships, state.ships),
            Posture::FreeMine => (state.ships, state.depots),
        };
        StrategyState {
            ships,
            depots,
            posture: action,
        }
    }

    pub fn is_goal(&self, state: &StrategyState) -> bool {
        state.ships >= self.goal_ships && state.depots >= self.goal_depots
    }

    /// True when `posture` can no longer be carried out at these counts.
    pub fn needs_replan(&self, posture: Posture, ships: u32, depots: u32) -> bool {
        !self.precondition(posture, ships, depots)
    }
}

struct SearchNode {
    state: StrategyState,
    action: Option<Posture>,
    parent: Option<usize>,
}

/// Picks the next posture for a team with `ships` craft and `depots` depots.
///
/// Already at the goal, the team free-mines. With no route to the goal the
/// current posture is kept.
pub fn choose_strategy(config: &StrategyConfig, current: Posture, ships: u32, depots: u32) -> Posture {
    let root = StrategyState {
        ships,
        depots,
        posture: current,
    };
    if config.is_goal(&root) {
        return Posture::FreeMine;
    }

    let mut arena = vec![SearchNode {
        state: root,
        action: None,
        parent: None,
    }];
    let mut visited: AHashSet<(u32, u32)> = AHashSet::new();
    visited.insert((ships, depots));
    let mut frontier = VecDeque::from([0usize]);

    while let Some(index) = frontier.pop_front() {
        let state = arena[index].state;
        for action in Posture::ALL {
            if !config.precondition(action, state.ships, state.depots) {
                continue;
            }
            let next = config.apply(action, state);
            if !visited.insert((next.ships, next.depots)) {
                continue;
            }
            arena.push(SearchNode {
                state: next,
                action: Some(action),
                parent: Some(index),
            });
            let child = arena.len() - 1;
            if config.is_goal(&next) {
                return first_action(&arena, child).unwrap_or(current);
            }
            frontier.push_back(child);
        }
    }
    current
}

fn first_action(arena: &[SearchNode], mut index: usize) -> Option<Posture> {
    let mut action = None;
    while let Some(parent) = arena[index].parent {
        action = arena[index].action;
        index = parent;
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_team_builds_fleet() {
        let config = StrategyConfig::default();
        assert_eq!(
            choose_strategy(&config, Posture::FreeMine, 1, 1),
            Posture::BuildFleet
        );
    }

    #[test]
    fn minimum_fleet_with_one_depot_expands() {
        let config = StrategyConfig::default();
        assert_eq!(
            choose_strategy(&config, Posture::BuildFleet, 5, 1),
            Posture::ExpandTerritory
        );
    }

    #[test]
    fn goal_reached_free_mines() {
        let config = StrategyConfig::default();
        assert_eq!(
            choose_strategy(&config, Posture::BuildFleet, 10, 10),
            Posture::FreeMine
        );
    }

    #[test]
    fn unreachable_goal_keeps_current_posture() {
        let config = StrategyConfig {
            goal_ships: 10,
            goal_depots: 12,
            min_ships: 5,
        };
        assert_eq!(
            choose_strategy(&config, Posture::ExpandTerritory, 10, 10),
            Posture::ExpandTerritory
        );
    }

    #[test]
    fn build_effect_respects_floor_then_depots() {
        let config = StrategyConfig::default();
        let low = StrategyState {
            ships: 2,
            depots: 1,
            posture: Posture::FreeMine,
        };
        assert_eq!(config.apply(Posture::BuildFleet, low).ships, 5);
        let even = StrategyState {
            ships: 6,
            depots: 6,
            posture: Posture::FreeMine,
        };
        assert_eq!(config.apply(Posture::BuildFleet, even).ships, 7);
        assert_eq!(config.apply(Posture::ExpandTerritory, even).depots, 6);
    }

    #[test]
    fn needs_replan_when_precondition_fails() {
        let config = StrategyConfig::default();
        assert!(config.needs_replan(Posture::FreeMine, 2, 1));
        assert!(!config.needs_replan(Posture::BuildFleet, 2, 1));
        assert!(config.needs_replan(Posture::ExpandTerritory, 4, 4));
    }
}
