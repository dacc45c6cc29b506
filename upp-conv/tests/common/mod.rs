#![allow(dead_code)]

use rand::{Rng, SeedableRng, rngs::StdRng};
use upp_core::curve::generators::{
    constant_jumps_staircase, many_constants_staircase, many_jumps_staircase,
};
use upp_core::{Curve, Rational};

pub const SEED: u64 = 4321;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn r(text: &str) -> Rational {
    text.parse().unwrap()
}

pub fn rs(values: &[&str]) -> Vec<Rational> {
    values.iter().map(|v| r(v)).collect()
}

/// The staircase families the random pairs are drawn from
#[derive(Clone, Copy, Debug)]
pub enum Family {
    /// Left-continuous steps with flat treads
    ConstantJumps,
    /// Left-continuous steps with rising treads
    ManyJumps,
    /// Continuous ramps and plateaus
    ManyConstants,
}

/// Small positive values with denominators up to 2
fn value(rng: &mut StdRng) -> Rational {
    Rational::new(rng.gen_range(1..=4i64), rng.gen_range(1..=2i64)).unwrap()
}

fn values(rng: &mut StdRng, count: usize) -> Vec<Rational> {
    (0..count).map(|_| value(rng)).collect()
}

pub fn random_curve(rng: &mut StdRng, family: Family) -> Curve {
    let steps = rng.gen_range(1..=2usize);
    let with_transient = rng.gen_bool(0.5);
    match family {
        Family::ConstantJumps => {
            let transient = if with_transient { values(rng, 3) } else { Vec::new() };
            constant_jumps_staircase(&transient, &values(rng, 2 * steps)).unwrap()
        }
        Family::ManyJumps => {
            let transient = if with_transient { values(rng, 2) } else { Vec::new() };
            many_jumps_staircase(&transient, &values(rng, 3 * steps)).unwrap()
        }
        Family::ManyConstants => {
            let transient = if with_transient { values(rng, 3) } else { Vec::new() };
            many_constants_staircase(&transient, &values(rng, 3 * steps)).unwrap()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    None,
    Larger,
    Smaller,
}

/// Which random pairs are worth convolving.
///
/// `variation` compares how much the common period and the common height
/// grow over the operands' own; `extension` bounds the larger of the two.
#[derive(Clone, Copy, Debug)]
pub struct PairFilter {
    pub variation: Filter,
    pub variation_multiplier: i64,
    pub extension: Filter,
    pub extension_threshold: i64,
}

impl Default for PairFilter {
    fn default() -> Self {
        Self {
            variation: Filter::None,
            variation_multiplier: 100,
            extension: Filter::Smaller,
            extension_threshold: 50,
        }
    }
}

// How many times the lcm of `a` and `b` exceeds the smaller of the two
fn growth(a: &Rational, b: &Rational) -> Rational {
    let lcm = a.least_common_multiple(b).unwrap();
    (&lcm / a).max(&lcm / b)
}

impl PairFilter {
    pub fn accepts(&self, f: &Curve, g: &Curve) -> bool {
        let d = growth(f.pseudo_period_length(), g.pseudo_period_length());
        let c = growth(f.pseudo_period_height(), g.pseudo_period_height());

        let multiplier = Rational::from(self.variation_multiplier);
        let lopsided = d >= &multiplier * &c || c >= &multiplier * &d;
        let variation = match self.variation {
            Filter::None => true,
            Filter::Larger => lopsided,
            Filter::Smaller => !lopsided,
        };

        let largest = d.max(c);
        let threshold = Rational::from(self.extension_threshold);
        let extension = match self.extension {
            Filter::None => true,
            Filter::Larger => largest >= threshold,
            Filter::Smaller => largest <= threshold,
        };

        variation && extension
    }
}

/// Seeded pairs from `family` that pass `filter`
pub fn random_pairs(family: Family, count: usize, filter: PairFilter) -> Vec<(Curve, Curve)> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut pairs = Vec::with_capacity(count);
    while pairs.len() < count {
        let f = random_curve(&mut rng, family);
        let g = random_curve(&mut rng, family);
        if filter.accepts(&f, &g) {
            pairs.push((f, g));
        }
    }
    pairs
}
