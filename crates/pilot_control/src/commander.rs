//! Team-level control: posture, roles, purchases and fitness windows.

use std::collections::BTreeMap;

use pilot_core::{
    richest_prospect, Command, LineSegment, ObjectId, ObjectKind, PlannerConfig, TeamId, Vec2,
    WorldObject, WorldQuery,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::evolution::SharedEvolution;
use crate::frontier::densest_cluster;
use crate::genome::PolicyRanges;
use crate::pilot::{Directive, Pilot, Role};
use crate::strategy::{choose_strategy, Posture, StrategyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseKind {
    Ship,
    Depot,
}

/// Request to the economy: `buyer` (a depot for ships, a craft for depots)
/// spends on `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub buyer: ObjectId,
    pub kind: PurchaseKind,
}

/// Economy collaborator deciding affordability.
pub trait PurchaseLedger {
    fn can_afford(&self, kind: PurchaseKind) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CraftCommand {
    pub craft: ObjectId,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderConfig {
    /// The surveyor buys a depot once this close to the chosen site.
    pub site_purchase_radius: f64,
    pub frontier_clusters: usize,
    pub frontier_iterations: usize,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            site_purchase_radius: 100.0,
            frontier_clusters: 9,
            frontier_iterations: 100,
        }
    }
}

/// Everything a team needs besides the shared evolution engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    pub planner: PlannerConfig,
    pub strategy: StrategyConfig,
    pub ranges: PolicyRanges,
    pub commander: CommanderConfig,
}

pub struct TeamCommander {
    team: TeamId,
    config: TeamConfig,
    evolution: SharedEvolution,
    pilots: BTreeMap<ObjectId, Pilot>,
    posture: Posture,
    site: Option<Vec2>,
    rng: ChaCha8Rng,
}

impl TeamCommander {
    pub fn new(team: TeamId, config: TeamConfig, evolution: SharedEvolution, seed: u64) -> Self {
        Self {
            team,
            config,
            evolution,
            pilots: BTreeMap::new(),
            posture: Posture::BuildFleet,
            site: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn team(&self) -> &TeamId {
        &self.team
    }

    pub fn posture(&self) -> Posture {
        self.posture
    }

    pub fn site(&self) -> Option<Vec2> {
        self.site
    }

    pub fn pilots(&self) -> &BTreeMap<ObjectId, Pilot> {
        &self.pilots
    }

    fn own_objects<'w, W: WorldQuery + ?Sized>(
        &self,
        world: &'w W,
        kind: ObjectKind,
    ) -> Vec<&'w WorldObject> {
        let team = Some(&self.team);
        let mut owned: Vec<&WorldObject> = world
            .objects()
            .iter()
            .filter(|object| object.alive && object.kind == kind && object.is_owned_by(team))
            .collect();
        owned.sort_by_key(|object| object.id);
        owned
    }

    // -----------------------------------------------------------------------
    // Per-tick entry points
    // -----------------------------------------------------------------------

    /// Enrolls new craft, retires vanished ones, keeps the posture current and
    /// returns one command per live craft. `score` is the team score now.
    pub fn movement_start<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        score: f64,
    ) -> Vec<CraftCommand> {
        let craft = self.own_objects(world, ObjectKind::MobileCraft);
        self.retire_vanished(world, score);
        for vessel in &craft {
            if !self.pilots.contains_key(&vessel.id) {
                self.enroll(vessel.id, score);
            }
        }
        let depots = self.own_objects(world, ObjectKind::Depot).len();
        self.update_posture(craft.len() as u32, depots as u32);
        self.update_site(world);

        let mut goals: BTreeMap<ObjectId, ObjectId> = self
            .pilots
            .iter()
            .filter_map(|(id, pilot)| pilot.goal().map(|goal| (*id, goal)))
            .collect();
        let mut commands = Vec::with_capacity(craft.len());
        for vessel in craft {
            let Some(pilot) = self.pilots.get_mut(&vessel.id) else {
                continue;
            };
            let claimed: Vec<ObjectId> = goals
                .iter()
                .filter(|(owner, _)| **owner != vessel.id)
                .map(|(_, goal)| *goal)
                .collect();
            let directive = match pilot.role() {
                Role::Prospector => {
                    richest_prospect(world, &claimed).map_or(Directive::Errands, Directive::Pursue)
                }
                Role::Surveyor if self.posture == Posture::ExpandTerritory => self
                    .site
                    .filter(|_| !pilot.policy().needs_fuel(vessel))
                    .map_or(Directive::Errands, Directive::Site),
                Role::Surveyor | Role::Miner => Directive::Errands,
            };
            let command = pilot.execute(world, vessel, &self.config.planner, &claimed, directive);
            match pilot.goal() {
                Some(goal) => goals.insert(vessel.id, goal),
                None => goals.remove(&vessel.id),
            };
            commands.push(CraftCommand {
                craft: vessel.id,
                command,
            });
        }
        commands
    }

    /// Progress check after physics has advanced.
    pub fn movement_end<W: WorldQuery + ?Sized>(&mut self, world: &W) {
        for (id, pilot) in &mut self.pilots {
            if let Some(craft) = world.object(*id).filter(|craft| craft.alive) {
                pilot.assess(world, craft, &self.config.planner);
            }
        }
    }

    /// At most one purchase per tick, gated by posture.
    pub fn purchases<W, L>(&mut self, world: &W, ledger: &L) -> Vec<Purchase>
    where
        W: WorldQuery + ?Sized,
        L: PurchaseLedger + ?Sized,
    {
        let purchase = match self.posture {
            Posture::FreeMine => None,
            Posture::BuildFleet => self.fleet_purchase(world, ledger),
            Posture::ExpandTerritory => self.depot_purchase(world, ledger),
        };
        if let Some(purchase) = purchase {
            tracing::debug!(team = %self.team, ?purchase, "purchase");
        }
        purchase.into_iter().collect()
    }

    fn fleet_purchase<W, L>(&self, world: &W, ledger: &L) -> Option<Purchase>
    where
        W: WorldQuery + ?Sized,
        L: PurchaseLedger + ?Sized,
    {
        if !ledger.can_afford(PurchaseKind::Ship) {
            return None;
        }
        self.own_objects(world, ObjectKind::Depot)
            .first()
            .map(|depot| Purchase {
                buyer: depot.id,
                kind: PurchaseKind::Ship,
            })
    }

    fn depot_purchase<W, L>(&mut self, world: &W, ledger: &L) -> Option<Purchase>
    where
        W: WorldQuery + ?Sized,
        L: PurchaseLedger + ?Sized,
    {
        if !ledger.can_afford(PurchaseKind::Depot) {
            return None;
        }
        let live = |id: &ObjectId| world.object(*id).filter(|craft| craft.alive);

        if let Some(site) = self.site {
            let surveyor = self
                .pilots
                .iter()
                .filter(|(_, pilot)| pilot.role() == Role::Surveyor)
                .find_map(|(id, _)| live(id));
            if let Some(craft) = surveyor {
                if world.shortest_distance(craft.position, site)
                    <= self.config.commander.site_purchase_radius
                {
                    self.site = None;
                    return Some(Purchase {
                        buyer: craft.id,
                        kind: PurchaseKind::Depot,
                    });
                }
            }
        }

        self.pilots.iter().find_map(|(id, pilot)| {
            live(id)
                .filter(|craft| pilot.wants_depot(world, craft))
                .map(|craft| Purchase {
                    buyer: craft.id,
                    kind: PurchaseKind::Depot,
                })
        })
    }

    pub fn overlay<W: WorldQuery + ?Sized>(&self, world: &W) -> Vec<LineSegment> {
        self.pilots
            .iter()
            .filter_map(|(id, pilot)| {
                world
                    .object(*id)
                    .filter(|craft| craft.alive)
                    .map(|craft| pilot.overlay(world, craft))
            })
            .flatten()
            .collect()
    }

    /// Closes every open evaluation window at `score` and releases the pilots.
    pub fn finish_evaluation(&mut self, score: f64) {
        let mut engine = self.evolution.lock();
        for pilot in self.pilots.values() {
            engine.report_fitness(pilot.ticket(), score - pilot.enrolled_score());
        }
        self.pilots.clear();
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    fn enroll(&mut self, craft: ObjectId, score: f64) {
        let (ticket, genome) = self.evolution.lock().next_candidate();
        let role = if !self.has_role(Role::Prospector) {
            Role::Prospector
        } else if !self.has_role(Role::Surveyor) {
            Role::Surveyor
        } else {
            Role::Miner
        };
        let policy = self.config.ranges.decode(&genome);
        tracing::debug!(team = %self.team, %craft, ?role, ?ticket, "enrolled craft");
        self.pilots
            .insert(craft, Pilot::new(craft, ticket, policy, role, score));
    }

    fn has_role(&self, role: Role) -> bool {
        self.pilots.values().any(|pilot| pilot.role() == role)
    }

    fn retire_vanished<W: WorldQuery + ?Sized>(&mut self, world: &W, score: f64) {
        let gone: Vec<ObjectId> = self
            .pilots
            .keys()
            .filter(|id| world.object(**id).map_or(true, |craft| !craft.alive))
            .copied()
            .collect();
        if gone.is_empty() {
            return;
        }
        let mut engine = self.evolution.lock();
        for id in gone {
            if let Some(pilot) = self.pilots.remove(&id) {
                engine.report_fitness(pilot.ticket(), score - pilot.enrolled_score());
                tracing::debug!(team = %self.team, craft = %id, "retired pilot");
            }
        }
    }

    fn update_posture(&mut self, ships: u32, depots: u32) {
        let strategy = &self.config.strategy;
        if !strategy.needs_replan(self.posture, ships, depots) {
            return;
        }
        let next = choose_strategy(strategy, self.posture, ships, depots);
        if next != self.posture {
            tracing::info!(
                team = %self.team,
                from = ?self.posture,
                to = ?next,
                ships,
                depots,
                "posture changed"
            );
            self.posture = next;
        }
    }

    fn update_site<W: WorldQuery + ?Sized>(&mut self, world: &W) {
        if self.posture != Posture::ExpandTerritory {
            self.site = None;
            return;
        }
        if self.site.is_none() {
            self.site = densest_cluster(
                world,
                self.config.commander.frontier_clusters,
                self.config.commander.frontier_iterations,
                &mut self.rng,
            );
        }
    }
}
