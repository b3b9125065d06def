//! Arrival models governing synthetic query timing

use crate::config::schema::WorkloadConfig;
use crate::error::{HitrateError, HitrateResult};
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use std::time::Duration;

/// How long to wait between consecutive queries
#[derive(Debug, Clone, Copy)]
pub enum ArrivalModel {
    /// Poisson process: exponential waits with mean `1 / rate`
    Steady(SteadyArrivals),
    /// Flash crowd: the same very short wait every time
    Burst { interval: Duration },
}

/// Exponential inter-arrival distribution for a given rate
#[derive(Debug, Clone, Copy)]
pub struct SteadyArrivals {
    rate: f64,
    waits: Exp<f64>,
}

impl ArrivalModel {
    /// Poisson arrivals at `rate` queries per second
    pub fn steady(rate: f64) -> HitrateResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(HitrateError::InvalidArrival(format!(
                "steady rate must be positive, got {}",
                rate
            )));
        }
        let waits = Exp::new(rate).map_err(|e| HitrateError::InvalidArrival(e.to_string()))?;
        Ok(Self::Steady(SteadyArrivals { rate, waits }))
    }

    /// Fixed-interval arrivals
    pub fn burst(interval: Duration) -> Self {
        Self::Burst { interval }
    }

    /// Draw the wait before the next query
    pub fn next_wait<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match self {
            Self::Steady(steady) => Duration::from_secs_f64(steady.waits.sample(rng)),
            Self::Burst { interval } => *interval,
        }
    }

    /// Expected number of queries over `duration`
    pub fn expected_queries(&self, duration: Duration) -> f64 {
        match self {
            Self::Steady(steady) => duration.as_secs_f64() * steady.rate,
            Self::Burst { interval } if interval.is_zero() => f64::INFINITY,
            Self::Burst { interval } => duration.as_secs_f64() / interval.as_secs_f64(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Steady(_) => "steady",
            Self::Burst { .. } => "burst",
        }
    }
}

/// Weighted choice between short steady and burst sub-bursts
#[derive(Debug, Clone)]
pub struct MixedPlan {
    steady: ArrivalModel,
    burst: ArrivalModel,
    steady_batch: u32,
    burst_batch: u32,
    weights: WeightedIndex<u32>,
}

impl MixedPlan {
    pub fn new(
        steady: ArrivalModel,
        burst: ArrivalModel,
        (steady_batch, burst_batch): (u32, u32),
        (steady_weight, burst_weight): (u32, u32),
    ) -> HitrateResult<Self> {
        if steady_batch == 0 || burst_batch == 0 {
            return Err(HitrateError::InvalidArrival(
                "sub-burst sizes must be at least 1".to_string(),
            ));
        }
        let weights = WeightedIndex::new([steady_weight, burst_weight])
            .map_err(|e| HitrateError::InvalidArrival(format!("sub-burst weights: {}", e)))?;

        Ok(Self {
            steady,
            burst,
            steady_batch,
            burst_batch,
            weights,
        })
    }

    /// Build the plan from workload configuration
    pub fn from_config(config: &WorkloadConfig) -> HitrateResult<Self> {
        Self::new(
            ArrivalModel::steady(config.steady_rate)?,
            ArrivalModel::burst(config.burst_interval()),
            (config.steady_batch, config.burst_batch),
            (config.steady_weight, config.burst_weight),
        )
    }

    /// Pick the next sub-burst: its arrival model and query count
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> (ArrivalModel, u32) {
        match self.weights.sample(rng) {
            0 => (self.steady, self.steady_batch),
            _ => (self.burst, self.burst_batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn steady_rejects_bad_rates() {
        assert!(ArrivalModel::steady(0.0).is_err());
        assert!(ArrivalModel::steady(-3.0).is_err());
        assert!(ArrivalModel::steady(f64::NAN).is_err());
        assert!(ArrivalModel::steady(f64::INFINITY).is_err());
    }

    #[test]
    fn steady_waits_average_inverse_rate() {
        let model = ArrivalModel::steady(10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let waits: Vec<f64> = (0..20_000)
            .map(|_| model.next_wait(&mut rng).as_secs_f64())
            .collect();
        let mean = waits.iter().sum::<f64>() / waits.len() as f64;
        let variance =
            waits.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / waits.len() as f64;

        assert!((mean - 0.1).abs() < 0.005, "mean wait {}", mean);
        // Exponential: variance = 1 / rate^2
        assert!(variance > 0.005, "variance {}", variance);
    }

    #[test]
    fn steady_is_reproducible_under_fixed_seed() {
        let model = ArrivalModel::steady(5.0).unwrap();
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..10).map(|_| model.next_wait(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(9);
            (0..10).map(|_| model.next_wait(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn burst_waits_are_constant() {
        let model = ArrivalModel::burst(Duration::from_millis(5));
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| model.next_wait(&mut rng) == Duration::from_millis(5)));
    }

    #[test]
    fn expected_queries() {
        let steady = ArrivalModel::steady(10.0).unwrap();
        assert_eq!(steady.expected_queries(Duration::from_secs(2)), 20.0);

        let burst = ArrivalModel::burst(Duration::from_millis(10));
        assert_eq!(burst.expected_queries(Duration::from_secs(1)), 100.0);
    }

    #[test]
    fn mixed_plan_favours_steady() {
        let plan = MixedPlan::from_config(&WorkloadConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let mut steady = 0;
        let mut burst = 0;
        for _ in 0..4000 {
            match plan.choose(&mut rng) {
                (ArrivalModel::Steady(_), n) => {
                    assert_eq!(n, 20);
                    steady += 1;
                }
                (ArrivalModel::Burst { .. }, n) => {
                    assert_eq!(n, 50);
                    burst += 1;
                }
            }
        }

        let ratio = steady as f64 / burst as f64;
        assert!((2.5..3.5).contains(&ratio), "steady:burst ratio {}", ratio);
    }

    #[test]
    fn mixed_plan_rejects_degenerate_settings() {
        let steady = ArrivalModel::steady(1.0).unwrap();
        let burst = ArrivalModel::burst(Duration::ZERO);
        assert!(MixedPlan::new(steady, burst, (0, 50), (3, 1)).is_err());
        assert!(MixedPlan::new(steady, burst, (20, 50), (0, 0)).is_err());
    }
}
