//! Two-condition sample design derived from column order

use ndarray::Array2;

use crate::error::{Result, StatsError};

/// Condition label for a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Control,
    Treated,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Control => write!(f, "control"),
            Condition::Treated => write!(f, "treated"),
        }
    }
}

/// Assignment of samples to the two conditions.
///
/// Derived from column position alone: the first half of the columns are
/// control, the remainder treated. No metadata file is consulted.
#[derive(Debug, Clone)]
pub struct SampleDesign {
    conditions: Vec<Condition>,
    n_control: usize,
}

impl SampleDesign {
    /// Derive the design from the number of samples.
    ///
    /// Requires at least 4 samples so each group has 2 or more members;
    /// group variances are undefined below that.
    pub fn from_sample_count(n_samples: usize) -> Result<Self> {
        if n_samples < 4 {
            return Err(StatsError::InvalidInput {
                reason: format!(
                    "Two-condition design requires at least 4 samples (2 control + 2 treated), got {}",
                    n_samples
                ),
            });
        }
        let n_control = n_samples / 2;
        let conditions = (0..n_samples)
            .map(|j| {
                if j < n_control {
                    Condition::Control
                } else {
                    Condition::Treated
                }
            })
            .collect();
        Ok(Self {
            conditions,
            n_control,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.conditions.len()
    }

    pub fn n_control(&self) -> usize {
        self.n_control
    }

    pub fn n_treated(&self) -> usize {
        self.conditions.len() - self.n_control
    }

    /// Condition of the sample at the given column
    pub fn condition(&self, sample_idx: usize) -> Condition {
        self.conditions[sample_idx]
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Column indices of the samples in the given condition
    pub fn group_indices(&self, condition: Condition) -> Vec<usize> {
        self.conditions
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == condition)
            .map(|(j, _)| j)
            .collect()
    }

    /// Model matrix for log(mu) = intercept + beta * [treated].
    /// Column 0 is the intercept, column 1 the treated indicator.
    pub fn model_matrix(&self) -> Array2<f64> {
        let n = self.conditions.len();
        let mut design = Array2::zeros((n, 2));
        for (j, &cond) in self.conditions.iter().enumerate() {
            design[[j, 0]] = 1.0;
            if cond == Condition::Treated {
                design[[j, 1]] = 1.0;
            }
        }
        design
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let design = SampleDesign::from_sample_count(4).unwrap();
        assert_eq!(design.n_control(), 2);
        assert_eq!(design.n_treated(), 2);
        assert_eq!(design.condition(0), Condition::Control);
        assert_eq!(design.condition(3), Condition::Treated);
    }

    #[test]
    fn test_odd_split_favors_treated() {
        let design = SampleDesign::from_sample_count(5).unwrap();
        assert_eq!(design.n_control(), 2);
        assert_eq!(design.n_treated(), 3);
    }

    #[test]
    fn test_too_few_samples_rejected() {
        assert!(SampleDesign::from_sample_count(3).is_err());
        assert!(SampleDesign::from_sample_count(0).is_err());
    }

    #[test]
    fn test_model_matrix() {
        let design = SampleDesign::from_sample_count(4).unwrap();
        let x = design.model_matrix();
        assert_eq!(x.dim(), (4, 2));
        assert_eq!(x[[0, 0]], 1.0);
        assert_eq!(x[[0, 1]], 0.0);
        assert_eq!(x[[2, 1]], 1.0);
        assert_eq!(x[[3, 1]], 1.0);
    }

    #[test]
    fn test_group_indices() {
        let design = SampleDesign::from_sample_count(6).unwrap();
        assert_eq!(design.group_indices(Condition::Control), vec![0, 1, 2]);
        assert_eq!(design.group_indices(Condition::Treated), vec![3, 4, 5]);
    }
}
