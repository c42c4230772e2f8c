use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const PARAMETER_COUNT: usize = 21;

/// Default FSRS-6 weight vector.
pub const DEFAULT_PARAMETERS: [f64; PARAMETER_COUNT] = [
    0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
    0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

pub const DEFAULT_DESIRED_RETENTION: f64 = 0.9;
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

/// Read-only scheduling parameters, fixed for the lifetime of a `Scheduler`.
/// Step durations cross the wire as whole seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub parameters: Vec<f64>,
    pub desired_retention: f64,
    #[serde(with = "steps_as_seconds")]
    pub learning_steps: Vec<Duration>,
    #[serde(with = "steps_as_seconds")]
    pub relearning_steps: Vec<Duration>,
    pub maximum_interval: u32,
    pub enable_fuzzing: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parameters: DEFAULT_PARAMETERS.to_vec(),
            desired_retention: DEFAULT_DESIRED_RETENTION,
            learning_steps: vec![Duration::minutes(1), Duration::minutes(10)],
            relearning_steps: vec![Duration::minutes(10)],
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            enable_fuzzing: true,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.parameters.len() != PARAMETER_COUNT {
            return Err(CoreError::InvalidConfiguration(format!(
                "expected {PARAMETER_COUNT} parameters, got {}",
                self.parameters.len()
            )));
        }
        if self.parameters.iter().any(|w| !w.is_finite()) {
            return Err(CoreError::InvalidConfiguration(
                "parameters must be finite".into(),
            ));
        }
        if self.parameters[PARAMETER_COUNT - 1] <= 0.0 {
            return Err(CoreError::InvalidConfiguration(
                "decay parameter must be positive".into(),
            ));
        }
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(CoreError::InvalidConfiguration(format!(
                "desired_retention must lie in (0, 1), got {}",
                self.desired_retention
            )));
        }
        if self.maximum_interval == 0 {
            return Err(CoreError::InvalidConfiguration(
                "maximum_interval must be at least one day".into(),
            ));
        }
        if self
            .learning_steps
            .iter()
            .chain(&self.relearning_steps)
            .any(|step| *step < Duration::zero())
        {
            return Err(CoreError::InvalidConfiguration(
                "step durations must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

mod steps_as_seconds {
    use chrono::Duration;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(steps: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(steps.len()))?;
        for step in steps {
            seq.serialize_element(&step.num_seconds())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = Vec::<i64>::deserialize(deserializer)?;
        Ok(seconds.into_iter().map(Duration::seconds).collect())
    }
}
