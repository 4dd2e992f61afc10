use crate::bank::{SecondaryBank, Site};
use crate::error::{DataError, GeometryError, HistoryFailure};
use crate::geometry::{BoundaryCondition, BoundaryCrossing, Geometry, TINY_BIT};
use crate::nuclear_data::{NuclearDataStore, ReactionType, SampledReaction};
use crate::random::RandomSource;
use crate::tally::HistoryTally;
use crate::transport::physics::{
    elastic_scatter, fission_site_count, inelastic_level_scatter, multiplying_emission, russian_roulette,
    sample_fission_energy, thermal_elastic, thermal_inelastic, Outgoing,
};
use crate::transport::{Particle, ParticleState};
use crate::utils::{isotropic_direction, normalize};

pub const DEFAULT_WEIGHT_CUTOFF: f64 = 0.25;
pub const DEFAULT_WEIGHT_SURVIVAL: f64 = 1.0;
pub const DEFAULT_MAX_EVENTS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSettings {
    pub survival_biasing: bool,
    pub weight_cutoff: f64,
    pub weight_survival: f64,
    // Flights and collisions allowed per history, secondaries included
    pub max_events: usize,
    // Bank fission sites; when false, fission only ends the history
    pub bank_fission: bool,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            survival_biasing: false,
            weight_cutoff: DEFAULT_WEIGHT_CUTOFF,
            weight_survival: DEFAULT_WEIGHT_SURVIVAL,
            max_events: DEFAULT_MAX_EVENTS,
            bank_fission: true,
        }
    }
}

// Everything one history leaves behind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryResult {
    pub tally: HistoryTally,
    pub fission_sites: Vec<Site>,
}

// Mutable state of the history in progress
struct HistoryState {
    history: u64,
    result: HistoryResult,
    secondaries: SecondaryBank,
    events: usize,
}

impl HistoryState {
    fn lost(&self, source: GeometryError) -> HistoryFailure {
        HistoryFailure::Lost { history: self.history, source }
    }

    fn data(&self, source: DataError) -> HistoryFailure {
        HistoryFailure::Data { history: self.history, source }
    }
}

//=====================================================================
// Transports single histories through the geometry.
//
// Each step compares the distance to the next collision with the
// distance to the nearest boundary; the boundary wins ties. A history
// ends once its source particle and every secondary it produced have
// been absorbed, leaked or cut off. Nothing here is shared mutably, so
// any number of threads may run histories against the same Tracker.
//=====================================================================
#[derive(Debug, Clone, Copy)]
pub struct Tracker<'a> {
    geometry: &'a Geometry,
    data: &'a NuclearDataStore,
    settings: TrackingSettings,
}

impl<'a> Tracker<'a> {
    pub fn new(geometry: &'a Geometry, data: &'a NuclearDataStore, settings: TrackingSettings) -> Self {
        Self { geometry, data, settings }
    }

    pub fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    // Run one history from its source site. On failure the partial tally
    // and fission sites of the history are discarded.
    pub fn run_history<R: RandomSource + ?Sized>(
        &self,
        history: u64,
        site: &Site,
        rng: &mut R,
    ) -> Result<HistoryResult, HistoryFailure> {
        let mut state =
            HistoryState { history, result: HistoryResult::default(), secondaries: SecondaryBank::new(), events: 0 };
        state.result.tally.balance.source += site.weight;

        let mut next = Some(*site);
        while let Some(start) = next {
            self.transport(&start, rng, &mut state)?;
            next = state.secondaries.pop();
        }
        Ok(state.result)
    }

    fn transport<R: RandomSource + ?Sized>(
        &self,
        start: &Site,
        rng: &mut R,
        state: &mut HistoryState,
    ) -> Result<(), HistoryFailure> {
        let mut particle = Particle::from_site(state.history, start);
        particle.direction = normalize(particle.direction)
            .ok_or(HistoryFailure::DegenerateDirection { history: state.history, direction: start.direction })?;
        particle.path = self.geometry.find_cell(&particle.position, &particle.direction, None).map_err(|err| state.lost(err))?;

        if particle.weight < self.settings.weight_cutoff && !self.settings.survival_biasing {
            state.result.tally.cutoff(particle.weight);
            particle.kill(ParticleState::WeightCutoff);
        }

        while particle.is_alive() {
            particle.state = ParticleState::Tracking;
            state.events += 1;
            if state.events > self.settings.max_events {
                return Err(HistoryFailure::TooManyEvents { history: state.history, max_events: self.settings.max_events });
            }

            let cell = particle.cell();
            let material = self.geometry.cell(cell).material();
            let sigma_t = match material {
                Some(material) => {
                    self.data.total_macroscopic_cross_section(material, particle.energy).map_err(|err| state.data(err))?
                }
                None => 0.0,
            };
            let collision_distance =
                if sigma_t > 0.0 { -rng.next_unit().open_below().ln() / sigma_t } else { f64::INFINITY };
            let crossing =
                self.geometry.distance_to_boundary(&particle.path, &particle.position, &particle.direction, particle.surface);

            match (crossing, material) {
                (Some(crossing), _) if crossing.distance <= collision_distance => {
                    state.result.tally.track(cell, particle.weight, crossing.distance);
                    particle.advance(crossing.distance);
                    self.cross(&mut particle, crossing, state)?;
                }
                (_, Some(material)) if collision_distance.is_finite() => {
                    state.result.tally.track(cell, particle.weight, collision_distance);
                    particle.advance(collision_distance);
                    particle.surface = None;
                    self.collide(&mut particle, material, rng, state)?;
                }
                _ => {
                    // Void with no boundary ahead, the particle escapes to infinity
                    state.result.tally.leak(cell, particle.weight);
                    particle.kill(ParticleState::Leaked);
                }
            }
        }
        Ok(())
    }

    // Apply the boundary condition of the surface the particle just reached
    fn cross(&self, particle: &mut Particle, crossing: BoundaryCrossing, state: &mut HistoryState) -> Result<(), HistoryFailure> {
        match crossing.boundary {
            BoundaryCondition::Vacuum => {
                state.result.tally.leak(particle.cell(), particle.weight);
                particle.kill(ParticleState::Leaked);
            }
            BoundaryCondition::Reflect => {
                let surface = self.geometry.surface(crossing.surface);
                particle.direction = surface
                    .reflect(&particle.position, &particle.direction)
                    .ok_or(HistoryFailure::DegenerateDirection { history: state.history, direction: particle.direction })?;
                particle.surface = Some(crossing.surface);
            }
            BoundaryCondition::Transmit => {
                particle.advance(TINY_BIT);
                particle.path = self
                    .geometry
                    .find_cell_across(crossing.surface, &particle.position, &particle.direction)
                    .map_err(|err| state.lost(err))?;
                particle.surface = Some(crossing.surface);
            }
        }
        Ok(())
    }

    fn collide<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        material: usize,
        rng: &mut R,
        state: &mut HistoryState,
    ) -> Result<(), HistoryFailure> {
        state.result.tally.collision(particle.cell(), particle.weight);
        if self.settings.survival_biasing {
            self.implicit_capture(particle, material, rng, state)
        } else {
            self.analog_collision(particle, material, rng, state)
        }
    }

    fn analog_collision<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        material: usize,
        rng: &mut R,
        state: &mut HistoryState,
    ) -> Result<(), HistoryFailure> {
        let (isotope, reaction) =
            self.data.sample_reaction(material, particle.energy, rng.next_unit()).map_err(|err| state.data(err))?;

        if let SampledReaction::Channel(channel) = reaction {
            let kind = self.data.isotope(isotope).xs.channels()[channel].kind;
            if kind.is_fission() {
                let weight = particle.weight;
                let sites = if self.settings.bank_fission {
                    let nu = self.data.isotope(isotope).nu(particle.energy).map_err(|err| state.data(err))?;
                    let count = fission_site_count(nu, weight, rng.next_unit().value());
                    self.bank_sites(particle, isotope, count, rng, state)
                } else {
                    0
                };
                state.result.tally.fission(particle.cell(), weight, sites, sites as f64);
                particle.kill(ParticleState::Fission);
                return Ok(());
            }
            if kind.is_absorption() {
                state.result.tally.absorption(particle.cell(), particle.weight);
                particle.kill(ParticleState::Absorbed);
                return Ok(());
            }
        }

        self.scatter(particle, isotope, reaction, rng, state);
        if particle.weight < self.settings.weight_cutoff {
            state.result.tally.cutoff(particle.weight);
            particle.kill(ParticleState::WeightCutoff);
        }
        Ok(())
    }

    // Survival biasing: absorption only lowers the weight, the collision
    // always scatters, and low weights play Russian roulette.
    fn implicit_capture<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        material: usize,
        rng: &mut R,
        state: &mut HistoryState,
    ) -> Result<(), HistoryFailure> {
        let cell = particle.cell();
        let energy = particle.energy;
        let xs = self.data.macroscopic_cross_sections(material, energy).map_err(|err| state.data(err))?;
        let weight = particle.weight;

        let mut sites = 0;
        if self.settings.bank_fission && xs.nu_fission > 0.0 {
            let count = fission_site_count(xs.nu_fission / xs.total, weight, rng.next_unit().value());
            for _ in 0..count {
                let isotope = self
                    .data
                    .sample_fissioning_isotope(material, energy, rng.next_unit())
                    .map_err(|err| state.data(err))?;
                if let Some(isotope) = isotope {
                    sites += self.bank_sites(particle, isotope, 1, rng, state);
                }
            }
        }

        let fission_weight = weight * xs.fission / xs.total;
        let absorbed_weight = weight * xs.absorption / xs.total;
        state.result.tally.fission(cell, fission_weight, sites, sites as f64);
        state.result.tally.absorption(cell, (absorbed_weight - fission_weight).max(0.0));
        particle.weight = weight - absorbed_weight.max(fission_weight);

        if !(xs.scatter() > 0.0) || !(particle.weight > 0.0) {
            state.result.tally.absorption(cell, particle.weight.max(0.0));
            particle.weight = 0.0;
            particle.kill(ParticleState::Absorbed);
            return Ok(());
        }

        let (isotope, reaction) =
            self.data.sample_scatter(material, energy, rng.next_unit()).map_err(|err| state.data(err))?;
        self.scatter(particle, isotope, reaction, rng, state);

        if particle.is_alive() && particle.weight < self.settings.weight_cutoff {
            let before = particle.weight;
            match russian_roulette(before, self.settings.weight_survival, rng.next_unit().value()) {
                Some(survival) => {
                    particle.weight = survival;
                    state.result.tally.roulette(before, survival);
                }
                None => {
                    state.result.tally.roulette(before, 0.0);
                    particle.kill(ParticleState::WeightCutoff);
                }
            }
        }
        Ok(())
    }

    // Bank `count` fission neutrons of `isotope` at the collision point
    fn bank_sites<R: RandomSource + ?Sized>(
        &self,
        particle: &Particle,
        isotope: usize,
        count: usize,
        rng: &mut R,
        state: &mut HistoryState,
    ) -> usize {
        let isotope = self.data.isotope(isotope);
        let range = self.data.energy_range();
        for _ in 0..count {
            let energy = sample_fission_energy(&isotope.spectrum, range, rng);
            let direction = isotropic_direction(rng);
            state.result.fission_sites.push(Site::new(particle.position, direction, energy));
        }
        count
    }

    // Change energy and direction for a scattering reaction, queueing the
    // extra neutrons of multiplying reactions as secondaries.
    fn scatter<R: RandomSource + ?Sized>(
        &self,
        particle: &mut Particle,
        isotope: usize,
        reaction: SampledReaction,
        rng: &mut R,
        state: &mut HistoryState,
    ) {
        let target = self.data.isotope(isotope);
        let outgoing = match reaction {
            SampledReaction::ThermalElastic(_) => thermal_elastic(particle.energy, rng),
            SampledReaction::ThermalInelastic(table) => thermal_inelastic(target.thermal[table].kT(), rng),
            SampledReaction::Channel(channel) => {
                let channel = &target.xs.channels()[channel];
                match channel.kind {
                    ReactionType::Inelastic => {
                        inelastic_level_scatter(target.awr, channel.q_value, particle.energy, particle.direction, rng)
                            .unwrap_or_else(|| elastic_scatter(target.awr, particle.energy, particle.direction, rng))
                    }
                    ReactionType::N2N | ReactionType::N3N => {
                        self.multiply(particle, channel.kind, channel.q_value, rng, state)
                    }
                    _ => elastic_scatter(target.awr, particle.energy, particle.direction, rng),
                }
            }
        };

        particle.energy = self.data.energy_range().clamp(outgoing.energy);
        particle.direction = outgoing.direction;
        particle.state = ParticleState::Scattered;
    }

    fn multiply<R: RandomSource + ?Sized>(
        &self,
        particle: &Particle,
        kind: ReactionType,
        q_value: f64,
        rng: &mut R,
        state: &mut HistoryState,
    ) -> Outgoing {
        let multiplicity = kind.multiplicity();
        let range = self.data.energy_range();
        for _ in 1..multiplicity {
            let emitted = multiplying_emission(particle.energy, q_value, multiplicity, range.min, rng);
            let energy = range.clamp(emitted.energy);
            state.secondaries.push(Site { weight: particle.weight, ..Site::new(particle.position, emitted.direction, energy) });
            state.result.tally.secondary(particle.weight);
        }
        multiplying_emission(particle.energy, q_value, multiplicity, range.min, rng)
    }
}
