//! The aggregate facade: configuration, the growth driver, and the
//! producer/consumer streaming hand-off.
//!
//! One producer thread drives [`Aggregate::generate`]; at most one consumer
//! thread polls an [`AggregateHandle`] and drains the stream buffer with an
//! opaque cursor. The store sits behind a mutex acquired once per walk
//! iteration; size, span, and the failed-draw counter are published through
//! atomics for lock-free status polling.
use std::io;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::{IVec2, IVec3};
use tracing::{debug, info};

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::geometry::{AttractorKind, LatticeKind, SpawnSource};
use crate::rng::UniformSource;
use crate::store::{AggregateStore, Collision};

/// Two-dimensional aggregate on the integer lattice.
pub type Aggregate2d = Aggregate<IVec2>;
/// Three-dimensional aggregate on the integer lattice.
pub type Aggregate3d = Aggregate<IVec3>;

/// Default number of (size, bounding radius) samples recorded per run.
const DEFAULT_RADII_SAMPLES: usize = 50;

#[derive(Clone, Copy, Debug)]
struct GrowthConfig {
    lattice: LatticeKind,
    attractor: AttractorKind,
    attractor_size: u32,
    coeff_stick: f64,
    spawn: SpawnSource,
    continuous: bool,
    radii_samples: usize,
}

struct SharedState<C: Cell> {
    store: Mutex<AggregateStore<C>>,
    size: AtomicUsize,
    span: AtomicI64,
    failed_draws: AtomicU64,
    abort: AtomicBool,
}

impl<C: Cell> SharedState<C> {
    fn lock_store(&self) -> MutexGuard<'_, AggregateStore<C>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain_from(&self, cursor: usize) -> Vec<C> {
        let store = self.lock_store();
        store
            .buffer()
            .get(cursor..)
            .map(<[C]>::to_vec)
            .unwrap_or_default()
    }
}

/// Summary of one [`Aggregate::generate`] run.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct GrowthReport {
    /// Particles added during this run.
    pub added: usize,
    /// Aggregate size when the run returned.
    pub size: usize,
    /// Stick draws that failed during this run.
    pub failed_stick_draws: u64,
    /// Whether the run was cut short by [`AggregateHandle::raise_abort`].
    pub aborted: bool,
}

/// A diffusion-limited aggregate growing on an integer lattice.
///
/// Walkers are released on a spawn envelope sized to the current aggregate,
/// random-walk until they touch the structure, and stick with the configured
/// stickiness. The aggregate owns its random source, so a seeded instance
/// reproduces bit-for-bit.
pub struct Aggregate<C: Cell> {
    config: GrowthConfig,
    rng: UniformSource,
    radii_history: Vec<(usize, f64)>,
    shared: Arc<SharedState<C>>,
}

impl<C: Cell> Aggregate<C> {
    /// Empty aggregate with a square lattice, point attractor, and
    /// stickiness 1.0.
    pub fn new() -> Self {
        Self::build(
            LatticeKind::default(),
            AttractorKind::default(),
            0,
            1.0,
        )
    }

    /// Empty aggregate with the default geometry and the given stickiness.
    pub fn with_stickiness(coeff_stick: f64) -> Result<Self> {
        Self::try_new(
            LatticeKind::default(),
            AttractorKind::default(),
            0,
            coeff_stick,
        )
    }

    /// Empty aggregate with full control over geometry and stickiness.
    pub fn try_new(
        lattice: LatticeKind,
        attractor: AttractorKind,
        attractor_size: u32,
        coeff_stick: f64,
    ) -> Result<Self> {
        if !C::supports_attractor(attractor) {
            return Err(Error::PlaneRequiresThreeDimensions);
        }
        validate_stickiness(coeff_stick)?;
        Ok(Self::build(lattice, attractor, attractor_size, coeff_stick))
    }

    fn build(
        lattice: LatticeKind,
        attractor: AttractorKind,
        attractor_size: u32,
        coeff_stick: f64,
    ) -> Self {
        Self {
            config: GrowthConfig {
                lattice,
                attractor,
                attractor_size,
                coeff_stick,
                spawn: SpawnSource::default(),
                continuous: false,
                radii_samples: DEFAULT_RADII_SAMPLES,
            },
            rng: UniformSource::from_entropy(),
            radii_history: Vec::new(),
            shared: Arc::new(SharedState {
                store: Mutex::new(AggregateStore::new(attractor)),
                size: AtomicUsize::new(0),
                span: AtomicI64::new(0),
                failed_draws: AtomicU64::new(0),
                abort: AtomicBool::new(false),
            }),
        }
    }

    /// Replaces the random source with one seeded at `seed`, for
    /// reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = UniformSource::seeded(seed);
        self
    }

    pub fn stickiness(&self) -> f64 {
        self.config.coeff_stick
    }

    pub fn lattice(&self) -> LatticeKind {
        self.config.lattice
    }

    pub fn attractor(&self) -> AttractorKind {
        self.config.attractor
    }

    pub fn attractor_size(&self) -> u32 {
        self.config.attractor_size
    }

    pub fn spawn_source(&self) -> SpawnSource {
        self.config.spawn
    }

    pub fn is_continuous(&self) -> bool {
        self.config.continuous
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Number of particles that have stuck, including the seed particle.
    pub fn size(&self) -> usize {
        self.shared.size.load(Ordering::Acquire)
    }

    /// Distance metric of the farthest particle under the current attractor.
    pub fn span(&self) -> i64 {
        self.shared.span.load(Ordering::Acquire)
    }

    /// Stick draws that failed over the aggregate's lifetime.
    ///
    /// The coin is flipped on every walk iteration, not only on contact, so
    /// this counts the stochastic process of tails draws rather than true
    /// contact rejections.
    pub fn failed_stick_draws(&self) -> u64 {
        self.shared.failed_draws.load(Ordering::Acquire)
    }

    /// The most recently added particle.
    pub fn last_particle(&self) -> Option<C> {
        self.shared.lock_store().buffer().last().copied()
    }

    /// (size, bounding radius) samples recorded at growth intervals.
    pub fn radii_history(&self) -> &[(usize, f64)] {
        &self.radii_history
    }

    /// Sets the stickiness coefficient. Fails if outside (0, 1].
    pub fn set_stickiness(&mut self, coeff_stick: f64) -> Result<()> {
        validate_stickiness(coeff_stick)?;
        self.config.coeff_stick = coeff_stick;
        Ok(())
    }

    pub fn set_lattice(&mut self, lattice: LatticeKind) {
        self.config.lattice = lattice;
    }

    /// Replaces the attractor geometry, rebuilding the seed structure and
    /// re-establishing the extremum ordering under the new metric.
    pub fn set_attractor(&mut self, attractor: AttractorKind, size: u32) -> Result<()> {
        if !C::supports_attractor(attractor) {
            return Err(Error::PlaneRequiresThreeDimensions);
        }
        self.config.attractor = attractor;
        self.config.attractor_size = size;
        let mut store = self.shared.lock_store();
        store.rebuild_attractor(attractor, C::attractor_cells(attractor, size));
        self.shared.span.store(store.span_metric(), Ordering::Release);
        debug!(
            "Rebuilt attractor structure: {:?} of size {}.",
            attractor, size
        );
        Ok(())
    }

    /// Restricts spawning to the chosen half-spaces. Fails if both are
    /// disabled.
    pub fn set_spawn_source(&mut self, above: bool, below: bool) -> Result<()> {
        self.config.spawn = SpawnSource::new(above, below)?;
        Ok(())
    }

    /// In continuous mode `generate` ignores its target and runs until
    /// aborted.
    pub fn set_continuous(&mut self, continuous: bool) {
        self.config.continuous = continuous;
    }

    /// Number of (size, radius) samples recorded per run; 0 disables
    /// sampling.
    pub fn set_radii_samples(&mut self, samples: usize) {
        self.config.radii_samples = samples;
    }

    /// Requests that a running `generate` return at its next iteration. The
    /// flag clears when observed, so a later run starts fresh.
    pub fn raise_abort(&self) {
        self.shared.abort.store(true, Ordering::Release);
    }

    /// Replaces the random seed and rewinds the source.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    /// Thread-safe view for a consumer: status polling, buffer draining,
    /// and aborting.
    pub fn handle(&self) -> AggregateHandle<C> {
        AggregateHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Snapshot of the stream buffer from `cursor` onward, in insertion
    /// order.
    pub fn consume_buffer(&self, cursor: usize) -> Vec<C> {
        self.shared.drain_from(cursor)
    }

    /// Drops all particles and counters and rewinds the random source,
    /// preserving the configuration.
    pub fn clear(&mut self) {
        let mut store = self.shared.lock_store();
        store.clear();
        drop(store);
        self.shared.size.store(0, Ordering::Release);
        self.shared.span.store(0, Ordering::Release);
        self.shared.failed_draws.store(0, Ordering::Release);
        self.shared.abort.store(false, Ordering::Release);
        self.radii_history.clear();
        self.rng.reset();
    }

    /// Grows the aggregate until it holds `n` particles (or indefinitely in
    /// continuous mode), spawning walkers on the envelope and sticking them
    /// to the structure.
    ///
    /// The run resumes from the current size; [`Aggregate::clear`] is the
    /// explicit reset. Aborts are reported through the returned
    /// [`GrowthReport`], never as errors.
    pub fn generate(&mut self, n: usize) -> GrowthReport {
        let cfg = self.config;
        let failed_at_start = self.shared.failed_draws.load(Ordering::Acquire);
        let size_at_start = self.shared.size.load(Ordering::Acquire);

        {
            let mut store = self.shared.lock_store();
            if !store.has_attractor_cells() {
                store.rebuild_attractor(
                    cfg.attractor,
                    C::attractor_cells(cfg.attractor, cfg.attractor_size),
                );
            }
            let store_len = store.len();
            if n > store_len {
                store.reserve(n - store_len);
            }
            if store.is_empty() {
                store.push_particle(C::origin());
                self.shared.size.store(store.len(), Ordering::Release);
                self.shared.span.store(store.span_metric(), Ordering::Release);
            }
        }
        info!(
            "Growing aggregate from {} to {} particles ({:?} lattice, {:?} attractor).",
            size_at_start, n, cfg.lattice, cfg.attractor
        );

        let radii_interval = if cfg.radii_samples > 0 && n > cfg.radii_samples {
            n / cfg.radii_samples
        } else {
            n.max(1)
        };
        let mut last_sampled = size_at_start;

        let mut current = C::origin();
        let mut spawned = false;
        let mut diameter = 0;
        let mut aborted = false;

        loop {
            let size_now = self.shared.size.load(Ordering::Acquire);
            if size_now >= n && !cfg.continuous {
                break;
            }
            if self.shared.abort.swap(false, Ordering::AcqRel) {
                debug!("Abort observed at {} particles.", size_now);
                aborted = true;
                break;
            }

            if !spawned {
                let radius = cfg
                    .attractor
                    .radius_of_metric(self.shared.span.load(Ordering::Acquire));
                let (cell, diam) = C::spawn(
                    &mut self.rng,
                    cfg.attractor,
                    cfg.attractor_size,
                    cfg.spawn,
                    radius,
                );
                current = cell;
                diameter = diam;
                spawned = true;
            }

            let previous = current;
            current = current.step(cfg.lattice, self.rng.next_probability());
            let (position, _) =
                current.reflect(previous, cfg.attractor, cfg.attractor_size, diameter);
            current = position;

            let u_stick = self.rng.next_probability();
            let outcome = {
                let mut store = self.shared.lock_store();
                let outcome = store.collide(current, previous, u_stick, cfg.coeff_stick);
                if outcome == Collision::Stuck {
                    self.shared.size.store(store.len(), Ordering::Release);
                    self.shared.span.store(store.span_metric(), Ordering::Release);
                }
                outcome
            };

            match outcome {
                Collision::FailedDraw => {
                    self.shared.failed_draws.fetch_add(1, Ordering::Relaxed);
                }
                Collision::Stuck => {
                    spawned = false;
                    let size = self.shared.size.load(Ordering::Acquire);
                    if cfg.radii_samples > 0
                        && size % radii_interval == 0
                        && size != last_sampled
                    {
                        let radius = cfg
                            .attractor
                            .radius_of_metric(self.shared.span.load(Ordering::Acquire));
                        self.radii_history.push((size, radius));
                        last_sampled = size;
                    }
                }
                Collision::Clear => {}
            }
        }

        let size = self.shared.size.load(Ordering::Acquire);
        let failed = self.shared.failed_draws.load(Ordering::Acquire) - failed_at_start;
        info!(
            "Aggregate run finished at {} particles ({} failed stick draws).",
            size, failed
        );
        GrowthReport {
            added: size - size_at_start,
            size,
            failed_stick_draws: failed,
            aborted,
        }
    }

    /// Coarse fractal-dimension estimate, `ln(size) / ln(R)` with `R` the
    /// bounding radius under the current metric. Undefined for plane
    /// attractors, which return `f64::NAN`.
    pub fn estimate_fractal_dimension(&self) -> f64 {
        if matches!(self.config.attractor, AttractorKind::Plane) {
            return f64::NAN;
        }
        let size = self.size();
        let radius = self.config.attractor.radius_of_metric(self.span());
        if size == 0 || radius <= 1.0 {
            return 0.0;
        }
        (size as f64).ln() / radius.ln()
    }

    /// Writes the aggregate as text: by default one `<index>\t<coord>` line
    /// per member in storage order, or one `<coord>` line per particle in
    /// growth order when `sort_by_gen_order` is set.
    pub fn write<W: io::Write>(&self, writer: &mut W, sort_by_gen_order: bool) -> Result<()> {
        let store = self.shared.lock_store();
        if sort_by_gen_order {
            for cell in store.buffer() {
                cell.write_tsv(writer)?;
                writeln!(writer)?;
            }
        } else {
            for (cell, index) in store.members() {
                write!(writer, "{index}\t")?;
                cell.write_tsv(writer)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    /// Writes the recorded (size, bounding radius) samples as tab-separated
    /// lines.
    pub fn write_radii_history<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        for (size, radius) in &self.radii_history {
            writeln!(writer, "{size}\t{radius}")?;
        }
        Ok(())
    }
}

impl<C: Cell> Default for Aggregate<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cell> Clone for Aggregate<C> {
    /// Deep copy: the clone owns independent storage and a random source at
    /// the same engine state, so both sides evolve identically from here.
    fn clone(&self) -> Self {
        let store = self.shared.lock_store().clone();
        Self {
            config: self.config,
            rng: self.rng.clone(),
            radii_history: self.radii_history.clone(),
            shared: Arc::new(SharedState {
                store: Mutex::new(store),
                size: AtomicUsize::new(self.shared.size.load(Ordering::Acquire)),
                span: AtomicI64::new(self.shared.span.load(Ordering::Acquire)),
                failed_draws: AtomicU64::new(self.shared.failed_draws.load(Ordering::Acquire)),
                abort: AtomicBool::new(false),
            }),
        }
    }
}

/// Cloneable, thread-safe view of a growing aggregate for consumer threads.
pub struct AggregateHandle<C: Cell> {
    shared: Arc<SharedState<C>>,
}

impl<C: Cell> Clone for AggregateHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Cell> AggregateHandle<C> {
    pub fn size(&self) -> usize {
        self.shared.size.load(Ordering::Acquire)
    }

    pub fn span(&self) -> i64 {
        self.shared.span.load(Ordering::Acquire)
    }

    pub fn failed_stick_draws(&self) -> u64 {
        self.shared.failed_draws.load(Ordering::Acquire)
    }

    /// Requests that the producer's current run return at its next
    /// iteration.
    pub fn raise_abort(&self) {
        self.shared.abort.store(true, Ordering::Release);
    }

    /// Snapshot of the stream buffer from `cursor` onward, in insertion
    /// order. Advance the cursor by the returned length to drain
    /// incrementally.
    pub fn consume_buffer(&self, cursor: usize) -> Vec<C> {
        self.shared.drain_from(cursor)
    }
}

fn validate_stickiness(coeff_stick: f64) -> Result<()> {
    if coeff_stick <= 0.0 || coeff_stick > 1.0 || coeff_stick.is_nan() {
        return Err(Error::StickinessOutOfRange(coeff_stick));
    }
    Ok(())
}
