//! Kinematic world stepper and per-team economy.
//!
//! Good enough to exercise the planners end to end: bounded thrust, drift on
//! the torus, energy drain, mining on contact, delivery to friendly depots and
//! consumable energy waypoints that respawn elsewhere.

use std::collections::BTreeMap;

use pilot_control::{CraftCommand, Purchase, PurchaseKind, PurchaseLedger};
use pilot_core::{
    generate_object_id, Command, ObjectKind, TeamId, Torus, Vec2, WorldObject, WorldQuery,
    WorldSnapshot,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::generate::WorldGenConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Largest velocity change a craft can make in one tick.
    pub max_acceleration: f64,
    /// Simulated seconds per tick.
    pub dt: f64,
    /// Energy per unit of velocity change.
    pub thrust_cost: f64,
    pub idle_drain: f64,
    /// Resources moved per tick of contact with a deposit.
    pub mining_rate: f64,
    pub max_craft_energy: f64,
    pub depot_recharge: f64,
    pub max_depot_energy: f64,
    pub ship_cost: f64,
    pub depot_cost: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_acceleration: 20.0,
            dt: 0.1,
            thrust_cost: 1.0,
            idle_drain: 1.0,
            mining_rate: 20.0,
            max_craft_energy: 5000.0,
            depot_recharge: 5.0,
            max_depot_energy: 5000.0,
            ship_cost: 1500.0,
            depot_cost: 2500.0,
        }
    }
}

impl PhysicsConfig {
    pub fn cost(&self, kind: PurchaseKind) -> f64 {
        match kind {
            PurchaseKind::Ship => self.ship_cost,
            PurchaseKind::Depot => self.depot_cost,
        }
    }
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamAccount {
    /// Everything ever delivered. The fitness signal.
    pub score: f64,
    /// Delivered resources not yet spent.
    pub funds: f64,
    pub ships_bought: u32,
    pub depots_bought: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Economy {
    accounts: BTreeMap<TeamId, TeamAccount>,
}

impl Economy {
    pub fn new<'a>(teams: impl IntoIterator<Item = &'a TeamId>) -> Self {
        Self {
            accounts: teams
                .into_iter()
                .map(|team| (team.clone(), TeamAccount::default()))
                .collect(),
        }
    }

    pub fn accounts(&self) -> &BTreeMap<TeamId, TeamAccount> {
        &self.accounts
    }

    pub fn account(&self, team: &TeamId) -> Option<&TeamAccount> {
        self.accounts.get(team)
    }

    pub fn score(&self, team: &TeamId) -> f64 {
        self.account(team).map_or(0.0, |account| account.score)
    }

    pub fn credit(&mut self, team: &TeamId, amount: f64) {
        let account = self.accounts.entry(team.clone()).or_default();
        account.score += amount;
        account.funds += amount;
    }

    /// Affordability view handed to a team commander.
    pub fn ledger(&self, team: &TeamId, physics: &PhysicsConfig) -> TeamLedger {
        TeamLedger {
            funds: self.account(team).map_or(0.0, |account| account.funds),
            ship_cost: physics.ship_cost,
            depot_cost: physics.depot_cost,
        }
    }

    /// Deducts the price of `kind`; false (and no change) when funds fall short.
    fn charge(&mut self, team: &TeamId, kind: PurchaseKind, physics: &PhysicsConfig) -> bool {
        let Some(account) = self.accounts.get_mut(team) else {
            return false;
        };
        let cost = physics.cost(kind);
        if account.funds < cost {
            return false;
        }
        account.funds -= cost;
        match kind {
            PurchaseKind::Ship => account.ships_bought += 1,
            PurchaseKind::Depot => account.depots_bought += 1,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamLedger {
    pub funds: f64,
    pub ship_cost: f64,
    pub depot_cost: f64,
}

impl PurchaseLedger for TeamLedger {
    fn can_afford(&self, kind: PurchaseKind) -> bool {
        let cost = match kind {
            PurchaseKind::Ship => self.ship_cost,
            PurchaseKind::Depot => self.depot_cost,
        };
        self.funds >= cost
    }
}

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub mined: f64,
    pub delivered: f64,
    pub refuels: u32,
    /// Craft that ran out of energy this tick.
    pub stranded: u32,
    pub removed: usize,
}

/// Advances `world` by one tick under `commands`.
pub fn step(
    world: &mut WorldSnapshot,
    commands: &[CraftCommand],
    physics: &PhysicsConfig,
    bodies: &WorldGenConfig,
    economy: &mut Economy,
    rng: &mut impl Rng,
) -> StepReport {
    let mut report = StepReport::default();

    for order in commands {
        let Some(craft) = world
            .object_mut(order.craft)
            .filter(|craft| craft.alive && craft.kind == ObjectKind::MobileCraft)
        else {
            continue;
        };
        thrust(craft, order.command, physics);
    }

    let torus = world.torus;
    for object in world.objects.iter_mut().filter(|object| object.alive) {
        object.position = torus.wrap(object.position + object.velocity * physics.dt);
        if object.kind != ObjectKind::MobileCraft {
            continue;
        }
        let energy = spend(object, physics.idle_drain);
        if energy.is_some_and(|energy| energy <= 0.0) {
            object.alive = false;
            report.stranded += 1;
            tracing::debug!(craft = %object.id, "craft out of energy");
        }
    }

    let mut spent_waypoints = 0;
    let count = world.objects.len();
    for i in 0..count {
        if !(world.objects[i].alive && world.objects[i].kind == ObjectKind::MobileCraft) {
            continue;
        }
        for j in 0..count {
            if i == j {
                continue;
            }
            let (craft, other) = pair_mut(&mut world.objects, i, j);
            let reach = craft.radius + other.radius;
            if !other.alive || torus.distance(craft.position, other.position) > reach {
                continue;
            }
            if interact(torus, craft, other, physics, economy, &mut report) {
                spent_waypoints += 1;
            }
        }
    }

    for depot in world
        .objects
        .iter_mut()
        .filter(|object| object.alive && object.kind == ObjectKind::Depot)
    {
        let energy = depot.energy.unwrap_or(0.0) + physics.depot_recharge;
        depot.energy = Some(energy.min(physics.max_depot_energy));
    }

    report.removed = world.sweep_dead();
    for _ in 0..spent_waypoints {
        if let Some(position) = world.random_free_location(rng, bodies.waypoint_radius * 2.0) {
            let waypoint = bodies.waypoint(generate_object_id(rng), position);
            world.objects.push(waypoint);
        }
    }
    world.tick += 1;
    report
}

fn thrust(craft: &mut WorldObject, command: Command, physics: &PhysicsConfig) {
    let desired = match command {
        Command::Move { velocity, .. } => velocity,
        Command::Hold => Vec2::ZERO,
    };
    let mut change = desired - craft.velocity;
    let magnitude = change.length();
    if magnitude > physics.max_acceleration {
        change = change * (physics.max_acceleration / magnitude);
    }
    craft.velocity += change;
    spend(craft, change.length() * physics.thrust_cost);
}

/// Deducts energy from an object that carries it; returns what is left.
fn spend(object: &mut WorldObject, amount: f64) -> Option<f64> {
    let energy = object.energy.as_mut()?;
    *energy -= amount;
    Some(*energy)
}

fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Resolves one craft touching one body. Returns true when a waypoint was used
/// up.
fn interact(
    torus: Torus,
    craft: &mut WorldObject,
    other: &mut WorldObject,
    physics: &PhysicsConfig,
    economy: &mut Economy,
    report: &mut StepReport,
) -> bool {
    match other.kind {
        ObjectKind::ResourceDeposit if other.mineable => {
            let take = physics.mining_rate.min(other.cargo());
            if take > 0.0 {
                other.resources = Some(other.cargo() - take);
                craft.resources = Some(craft.cargo() + take);
                report.mined += take;
            }
            if other.cargo() <= 0.0 {
                other.alive = false;
            }
            false
        }
        ObjectKind::ResourceDeposit => {
            let away = torus
                .shortest_delta(other.position, craft.position)
                .normalized()
                .unwrap_or(Vec2::new(1.0, 0.0));
            craft.position = torus.wrap(other.position + away * (other.radius + craft.radius));
            craft.velocity = Vec2::ZERO;
            false
        }
        ObjectKind::Depot if other.is_owned_by(craft.team.as_ref()) => {
            let cargo = craft.cargo();
            if let Some(team) = craft.team.as_ref().filter(|_| cargo > 0.0) {
                economy.credit(team, cargo);
                craft.resources = Some(0.0);
                report.delivered += cargo;
            }
            if let (Some(tank), Some(store)) = (craft.energy.as_mut(), other.energy.as_mut()) {
                let transfer = (physics.max_craft_energy - *tank).max(0.0).min(*store);
                *tank += transfer;
                *store -= transfer;
            }
            false
        }
        ObjectKind::Waypoint => {
            if let Some(tank) = craft.energy.as_mut() {
                *tank = (*tank + other.energy.unwrap_or(0.0)).min(physics.max_craft_energy);
            }
            other.alive = false;
            report.refuels += 1;
            true
        }
        ObjectKind::MobileCraft | ObjectKind::Depot | ObjectKind::ObstacleGhost => false,
    }
}

/// Spawns what `team` bought this tick. Purchases from buyers the team does
/// not own, of the wrong kind, or beyond its funds are dropped. Returns how many
/// went through.
pub fn apply_purchases(
    world: &mut WorldSnapshot,
    team: &TeamId,
    purchases: &[Purchase],
    physics: &PhysicsConfig,
    bodies: &WorldGenConfig,
    economy: &mut Economy,
    rng: &mut impl Rng,
) -> usize {
    let mut applied = 0;
    for purchase in purchases {
        let Some(buyer) = world
            .object(purchase.buyer)
            .filter(|buyer| buyer.alive && buyer.is_owned_by(Some(team)))
        else {
            tracing::debug!(%team, buyer = %purchase.buyer, "purchase from unknown buyer dropped");
            continue;
        };
        let spawn_at = match (purchase.kind, buyer.kind) {
            (PurchaseKind::Ship, ObjectKind::Depot) => world.torus.wrap(
                buyer.position + Vec2::new(buyer.radius + bodies.craft_radius * 2.0, 0.0),
            ),
            (PurchaseKind::Depot, ObjectKind::MobileCraft) => buyer.position,
            _ => {
                tracing::debug!(%team, ?purchase, "purchase from wrong kind of buyer dropped");
                continue;
            }
        };
        if !economy.charge(team, purchase.kind, physics) {
            continue;
        }
        let id = generate_object_id(rng);
        let spawned = match purchase.kind {
            PurchaseKind::Ship => bodies.craft(id, team, spawn_at),
            PurchaseKind::Depot => bodies.depot(id, team, spawn_at),
        };
        tracing::debug!(%team, kind = ?purchase.kind, %id, "purchase delivered");
        world.objects.push(spawned);
        applied += 1;
    }
    applied
}
