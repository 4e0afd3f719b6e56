use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{Result, TrainErr};

/// The dimensions of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: 3,
            hidden_size: 5,
            output_size: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerConfig {
    GradientDescent { learning_rate: f32 },
    GradientDescentWithMomentum { learning_rate: f32, momentum: f32 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::GradientDescent {
            learning_rate: 0.01,
        }
    }
}

/// The synthetic regression data to train on.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub num_points: usize,
    pub noise: f32,
    pub batch_size: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            num_points: 100,
            noise: 0.1,
            batch_size: 10,
        }
    }
}

/// Everything needed to run a training session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub optimizer: OptimizerConfig,
    pub data: DataConfig,
    pub epochs: usize,
    /// Milliseconds to wait before each batch.
    pub batch_delay_ms: u64,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            optimizer: OptimizerConfig::default(),
            data: DataConfig::default(),
            epochs: 10,
            batch_delay_ms: 500,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Loads and validates a `TrainingConfig` from a JSON file.
    ///
    /// # Errors
    /// `Io` if the file can't be read, `Json` if it can't be parsed and `InvalidConfig` if the
    /// values make no sense.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses and validates a `TrainingConfig`, missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ModelConfig {
            input_size,
            hidden_size,
            output_size,
        } = self.model;

        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return invalid("model sizes must be non-zero");
        }

        let learning_rate = match self.optimizer {
            OptimizerConfig::GradientDescent { learning_rate } => learning_rate,
            OptimizerConfig::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => {
                if !(0.0..1.0).contains(&momentum) {
                    return invalid("momentum must be in [0, 1)");
                }
                learning_rate
            }
        };

        if !learning_rate.is_finite() || learning_rate <= 0. {
            return invalid("learning rate must be a positive number");
        }

        if self.data.num_points == 0 || self.data.batch_size == 0 {
            return invalid("the amount of points and the batch size must be non-zero");
        }

        if !self.data.noise.is_finite() || self.data.noise < 0. {
            return invalid("noise must be a non-negative number");
        }

        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn invalid(msg: &str) -> Result<()> {
    Err(TrainErr::InvalidConfig(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        let config = TrainingConfig::from_json("{}").unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.batch_delay(), Duration::from_millis(500));
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = TrainingConfig::from_json(
            r#"{
                "model": { "hidden_size": 8 },
                "optimizer": { "gradient_descent_with_momentum": { "learning_rate": 0.1, "momentum": 0.9 } },
                "epochs": 3,
                "batch_delay_ms": 0,
                "seed": 42
            }"#,
        )
        .unwrap();

        assert_eq!(config.model.input_size, 3);
        assert_eq!(config.model.hidden_size, 8);
        assert_eq!(
            config.optimizer,
            OptimizerConfig::GradientDescentWithMomentum {
                learning_rate: 0.1,
                momentum: 0.9
            }
        );
        assert_eq!(config.epochs, 3);
        assert_eq!(config.seed, Some(42));
        assert!(config.batch_delay().is_zero());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            r#"{ "model": { "input_size": 0 } }"#,
            r#"{ "optimizer": { "gradient_descent": { "learning_rate": -1.0 } } }"#,
            r#"{ "optimizer": { "gradient_descent_with_momentum": { "learning_rate": 0.1, "momentum": 1.0 } } }"#,
            r#"{ "data": { "batch_size": 0 } }"#,
            r#"{ "data": { "num_points": 0 } }"#,
            r#"{ "data": { "noise": -0.5 } }"#,
        ];

        for json in bad {
            let res = TrainingConfig::from_json(json);
            assert!(matches!(res, Err(TrainErr::InvalidConfig(_))), "{json}");
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let res = TrainingConfig::from_json("{ \"epochs\": ");
        assert!(matches!(res, Err(TrainErr::Json(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let res = TrainingConfig::from_path("/definitely/not/here.json");
        assert!(matches!(res, Err(TrainErr::Io(_))));
    }
}
