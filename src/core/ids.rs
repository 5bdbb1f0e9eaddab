use crate::domain::ports::IdGenerator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Model and deck ids are drawn from here, well clear of small sequential ids.
pub const ID_RANGE: Range<i64> = (1 << 30)..(1 << 31);

#[derive(Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> i64 {
        rand::thread_rng().gen_range(ID_RANGE)
    }
}

/// Reproducible ids for tests and `--seed` runs.
#[derive(Debug)]
pub struct SeededIdGenerator {
    rng: StdRng,
}

impl SeededIdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl IdGenerator for SeededIdGenerator {
    fn next_id(&mut self) -> i64 {
        self.rng.gen_range(ID_RANGE)
    }
}

pub fn generator_for(seed: Option<u64>) -> Box<dyn IdGenerator> {
    match seed {
        Some(seed) => Box::new(SeededIdGenerator::new(seed)),
        None => Box::new(RandomIdGenerator),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckIds {
    pub deck_id: i64,
    pub model_id: i64,
}

impl DeckIds {
    pub fn draw(ids: &mut dyn IdGenerator) -> Self {
        let deck_id = ids.next_id();
        let mut model_id = ids.next_id();
        while model_id == deck_id {
            model_id = ids.next_id();
        }
        Self { deck_id, model_id }
    }
}
