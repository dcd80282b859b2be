//! Walkthrough simulator
//!
//! Drives alternating entry/exit cycles against the in-memory backend with a
//! seeded RNG. Every cycle adds rooms and furniture, attaches photos (some of
//! which the encoder refuses), completes everything and confirms.
//!
//! Invariants checked:
//! - A completed room always has items, all of them completed
//! - A duplicate room name is always refused
//! - Confirmation is refused while any room is incomplete
//! - Each submitted report carries exactly the encodable photos of its cycle
//! - The next cycle's prior pictures are exactly those photos, when there are any
//! - One submission per successful confirmation

use anyhow::{Context, Result};
use inventory_core::{EngineConfig, InventoryApi, InventoryError, WalkthroughController};
use inventory_model::{
    Cleanliness, Condition, CycleType, EncodedImage, FieldEdit, FurnitureId, ImageRef, LeaseId,
    PropertyId, Room, RoomId, RoomType,
};
use inventory_test_utils::{ApiCall, FailingEncoder, InMemoryInventoryApi};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Photos whose location carries this marker fail to encode
const CORRUPT_MARKER: &str = "#corrupt";

/// Simulator configuration
#[derive(Debug, Clone)]
pub(crate) struct SimulatorConfig {
    /// Random seed for reproducibility
    pub(crate) seed: u64,
    /// Number of walkthrough cycles, starting with an entry
    pub(crate) cycles: u32,
    /// Rooms created in the first cycle
    pub(crate) rooms: usize,
    /// Probability that an attached photo cannot be encoded
    pub(crate) photo_failure_rate: f64,
    pub(crate) engine: EngineConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            cycles: 10,
            rooms: 3,
            photo_failure_rate: 0.0,
            engine: EngineConfig::default(),
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Violation {
    CompletionInvariant { cycle: u32, room: String },
    DuplicateAccepted { cycle: u32, name: String },
    IncompleteConfirmAccepted { cycle: u32 },
    ReportPictures {
        cycle: u32,
        entity: String,
        expected: Vec<EncodedImage>,
        actual: Vec<EncodedImage>,
    },
    Lineage {
        cycle: u32,
        entity: String,
        expected: Vec<EncodedImage>,
        actual: Vec<EncodedImage>,
    },
    SubmissionCount { submissions: usize, confirms: u64 },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::CompletionInvariant { cycle, room } => {
                write!(f, "cycle {cycle}: room {room:?} violates completion")
            }
            Violation::DuplicateAccepted { cycle, name } => {
                write!(f, "cycle {cycle}: duplicate room {name:?} accepted")
            }
            Violation::IncompleteConfirmAccepted { cycle } => {
                write!(f, "cycle {cycle}: incomplete walkthrough confirmed")
            }
            Violation::ReportPictures { cycle, entity, expected, actual } => write!(
                f,
                "cycle {cycle}: report pictures of {entity}: expected {expected:?}, got {actual:?}"
            ),
            Violation::Lineage { cycle, entity, expected, actual } => write!(
                f,
                "cycle {cycle}: prior pictures of {entity}: expected {expected:?}, got {actual:?}"
            ),
            Violation::SubmissionCount { submissions, confirms } => {
                write!(f, "{submissions} submission(s) for {confirms} confirmation(s)")
            }
        }
    }
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SimulatorStats {
    pub(crate) cycles: u32,
    pub(crate) rooms_added: u64,
    pub(crate) furniture_added: u64,
    pub(crate) photos_attached: u64,
    pub(crate) photos_dropped: u64,
    pub(crate) duplicates_refused: u64,
    pub(crate) confirms: u64,
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub(crate) struct SimulatorReport {
    pub(crate) config: SimulatorConfig,
    pub(crate) stats: SimulatorStats,
    pub(crate) violations: Vec<Violation>,
}

impl SimulatorReport {
    pub(crate) fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub(crate) fn generate_text(&self) -> String {
        let mut report = String::new();
        let stats = &self.stats;

        report.push_str("=== Inventory Walkthrough Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Photo Failure Rate: {}", self.config.photo_failure_rate);
        let _ = writeln!(report, "Reuse Carry-Forward: {}", self.config.engine.reuse_carry_forward);
        let _ = writeln!(report, "Cycles Run: {}", stats.cycles);
        let _ = writeln!(report, "Rooms Added: {}", stats.rooms_added);
        let _ = writeln!(report, "Furniture Added: {}", stats.furniture_added);
        let _ = writeln!(report, "Photos Attached: {}", stats.photos_attached);
        let _ = writeln!(report, "Photos Dropped: {}", stats.photos_dropped);
        let _ = writeln!(report, "Duplicates Refused: {}", stats.duplicates_refused);
        let _ = writeln!(report, "Confirmations: {}", stats.confirms);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v}", i + 1);
            }
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// Photos attached to one entity and what should survive encoding
struct PhotoBatch {
    attached: Vec<ImageRef>,
    encoded: Vec<EncodedImage>,
}

struct Simulation {
    config: SimulatorConfig,
    rng: StdRng,
    api: Arc<InMemoryInventoryApi>,
    controller: WalkthroughController,
    stats: SimulatorStats,
    violations: Vec<Violation>,
    /// Encoded photos of the last confirmed cycle, by room id or `room/item`
    expected: HashMap<String, Vec<EncodedImage>>,
    next_name: u64,
}

/// Run the walkthrough simulator
///
/// # Errors
/// An engine operation failed in a way no invariant accounts for.
pub(crate) async fn run_simulator(config: SimulatorConfig) -> Result<SimulatorReport> {
    let api = Arc::new(InMemoryInventoryApi::new());
    let controller = WalkthroughController::new(
        config.engine.clone(),
        PropertyId::new(format!("sim-{}", config.seed)),
        LeaseId::new("sim-lease"),
        Arc::clone(&api) as Arc<dyn InventoryApi>,
        Arc::new(FailingEncoder::matching(CORRUPT_MARKER)),
    )
    .context("creating walkthrough controller")?;

    let mut sim = Simulation {
        rng: StdRng::seed_from_u64(config.seed),
        config,
        api,
        controller,
        stats: SimulatorStats::default(),
        violations: Vec::new(),
        expected: HashMap::new(),
        next_name: 0,
    };

    for n in 0..sim.config.cycles {
        let cycle = if n % 2 == 0 { CycleType::Entry } else { CycleType::Exit };
        sim.run_cycle(n, cycle).await?;
        sim.stats.cycles += 1;
    }

    let submissions = sim.api.calls(ApiCall::SubmitReport);
    if u64::try_from(submissions).ok() != Some(sim.stats.confirms) {
        sim.violations.push(Violation::SubmissionCount {
            submissions,
            confirms: sim.stats.confirms,
        });
    }

    Ok(SimulatorReport {
        config: sim.config,
        stats: sim.stats,
        violations: sim.violations,
    })
}

impl Simulation {
    async fn run_cycle(&mut self, n: u32, cycle: CycleType) -> Result<()> {
        self.controller
            .start_walkthrough(cycle)
            .await
            .with_context(|| format!("starting {cycle} cycle {n}"))?;
        tracing::info!(cycle = n, %cycle, rooms = self.controller.get_rooms().len(), "cycle started");

        self.check_lineage(n);
        self.check_completion(n);

        if !self.controller.get_rooms().is_empty() {
            match self.controller.confirm().await {
                Err(InventoryError::NotAllCompleted { .. }) => {}
                Ok(_) => {
                    self.violations.push(Violation::IncompleteConfirmAccepted { cycle: n });
                    self.stats.confirms += 1;
                    return Ok(());
                }
                Err(e) => return Err(e).with_context(|| format!("early confirm in cycle {n}")),
            }
        }

        let new_rooms = if n == 0 {
            self.config.rooms
        } else {
            self.rng.gen_range(0..=1)
        };
        for _ in 0..new_rooms {
            self.add_room().await?;
        }
        self.try_duplicate_room(n).await?;

        let mut expected = HashMap::new();
        for room in self.controller.get_rooms() {
            self.walk_room(n, &room, &mut expected).await?;
        }
        self.check_completion(n);

        let report_id = self
            .controller
            .confirm()
            .await
            .with_context(|| format!("confirming {cycle} cycle {n}"))?;
        self.stats.confirms += 1;
        tracing::info!(cycle = n, %report_id, "cycle confirmed");

        self.check_report(n, &expected);
        self.expected = expected;
        Ok(())
    }

    async fn add_room(&mut self) -> Result<()> {
        self.next_name += 1;
        let name = format!("Room {}", self.next_name);
        let room_type = RoomType::ALL[self.rng.gen_range(0..RoomType::ALL.len())];

        self.controller
            .add_room(&name, room_type)
            .await
            .with_context(|| format!("adding room {name}"))?;
        self.stats.rooms_added += 1;
        Ok(())
    }

    async fn try_duplicate_room(&mut self, n: u32) -> Result<()> {
        let rooms = self.controller.get_rooms();
        if rooms.is_empty() {
            return Ok(());
        }
        let name = rooms[self.rng.gen_range(0..rooms.len())].name.clone();

        match self.controller.add_room(&name, RoomType::Other).await {
            Err(InventoryError::DuplicateName { .. }) => {
                self.stats.duplicates_refused += 1;
                Ok(())
            }
            Ok(_) => {
                self.violations.push(Violation::DuplicateAccepted { cycle: n, name });
                Ok(())
            }
            Err(e) => Err(e).context("adding duplicate room"),
        }
    }

    async fn walk_room(
        &mut self,
        n: u32,
        room: &Room,
        expected: &mut HashMap<String, Vec<EncodedImage>>,
    ) -> Result<()> {
        let mut session = self.controller.open_room(&room.id).await?;

        if session.room().items().is_empty() || self.rng.gen_bool(0.3) {
            self.next_name += 1;
            session
                .add_furniture(&format!("Item {}", self.next_name))
                .await
                .with_context(|| format!("adding furniture to {}", room.name))?;
            self.stats.furniture_added += 1;
        }

        let items: Vec<FurnitureId> = session.room().items().iter().map(|i| i.id.clone()).collect();
        for id in items {
            let key = item_key(&room.id, &id);
            let batch = self.photos(n, &key);
            for photo in batch.attached {
                session.edit_furniture(&id, FieldEdit::AddPicture(photo))?;
            }
            session.edit_furniture(&id, FieldEdit::Condition(self.condition()))?;
            session.edit_furniture(&id, FieldEdit::Completed(true))?;
            expected.insert(key, batch.encoded);
        }

        let batch = self.photos(n, room.id.as_str());
        for photo in batch.attached {
            session.edit_room(FieldEdit::AddPicture(photo))?;
        }
        session.edit_room(FieldEdit::Cleanliness(self.cleanliness()))?;
        expected.insert(room.id.to_string(), batch.encoded);

        if !session.mark_room_completed() {
            self.violations.push(Violation::CompletionInvariant {
                cycle: n,
                room: room.name.clone(),
            });
        }
        if !session.close().await? {
            anyhow::bail!("room {} vanished during its walk", room.name);
        }
        Ok(())
    }

    fn photos(&mut self, n: u32, key: &str) -> PhotoBatch {
        let count = self.rng.gen_range(0..=2);
        let mut batch = PhotoBatch {
            attached: Vec::with_capacity(count),
            encoded: Vec::with_capacity(count),
        };

        for k in 0..count {
            let corrupt = self.rng.gen_bool(self.config.photo_failure_rate);
            let mut location = format!("cycle-{n}/{key}/{k}.jpg");
            self.stats.photos_attached += 1;
            if corrupt {
                location.push_str(CORRUPT_MARKER);
                self.stats.photos_dropped += 1;
            } else {
                batch.encoded.push(EncodedImage::new(location.as_str()));
            }
            batch.attached.push(ImageRef::new(location));
        }
        batch
    }

    fn condition(&mut self) -> Condition {
        Condition::ALL[self.rng.gen_range(0..Condition::ALL.len())]
    }

    fn cleanliness(&mut self) -> Cleanliness {
        Cleanliness::ALL[self.rng.gen_range(0..Cleanliness::ALL.len())]
    }

    fn check_completion(&mut self, n: u32) {
        for room in self.controller.get_rooms() {
            let holds = !room.is_completed()
                || (!room.items().is_empty() && room.items().iter().all(|i| i.completed));
            if !holds {
                self.violations.push(Violation::CompletionInvariant {
                    cycle: n,
                    room: room.name,
                });
            }
        }
    }

    fn check_lineage(&mut self, n: u32) {
        for room in self.controller.get_rooms() {
            self.expect_lineage(n, room.id.to_string(), &room.prior_cycle_pictures);
            for item in room.items() {
                self.expect_lineage(n, item_key(&room.id, &item.id), &item.prior_cycle_pictures);
            }
        }
    }

    fn expect_lineage(&mut self, n: u32, entity: String, actual: &[EncodedImage]) {
        let Some(expected) = self.expected.get(&entity).filter(|e| !e.is_empty()) else {
            return;
        };
        if actual != expected.as_slice() {
            self.violations.push(Violation::Lineage {
                cycle: n,
                entity,
                expected: expected.clone(),
                actual: actual.to_vec(),
            });
        }
    }

    fn check_report(&mut self, n: u32, expected: &HashMap<String, Vec<EncodedImage>>) {
        let Some(report) = self.api.last_report() else {
            return;
        };

        for room in &report.rooms {
            let mut entities = vec![(room.id.to_string(), &room.pictures)];
            entities.extend(
                room.furnitures
                    .iter()
                    .map(|f| (item_key(&room.id, &f.id), &f.pictures)),
            );

            for (entity, actual) in entities {
                let wanted = expected.get(&entity).cloned().unwrap_or_default();
                if *actual != wanted {
                    self.violations.push(Violation::ReportPictures {
                        cycle: n,
                        entity,
                        expected: wanted,
                        actual: actual.clone(),
                    });
                }
            }
        }
    }
}

fn item_key(room: &RoomId, item: &FurnitureId) -> String {
    format!("{room}/{item}")
}
