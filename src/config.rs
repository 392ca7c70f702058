//! Placer configuration.
//!
//! `PlacerConfig` mirrors every key of the flat key-value option set in one
//! typed, documented struct. Validation happens once, at construction, not
//! on every access — see `PlacerConfig::validate`.

use crate::error::PlacerError;
use serde_json::Value;
use std::collections::HashMap;

/// Which net decomposition strategy the quadratic system builder uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetModel {
    /// Bound-to-bound: each pin connects only to its net's axis extremes.
    B2B,
    /// Every multi-pin net gets one extra movable "star" unknown.
    Star,
    /// Every net is a clique: all pin pairs connect directly.
    Hpwl,
    /// Clique below the crossover threshold, star at or above it.
    StarHpwl,
}

impl Default for NetModel {
    fn default() -> Self {
        NetModel::B2B
    }
}

/// Which top-level convergence test the outer placement loop applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceCriterion {
    /// SimPL-style gap-ratio-against-iteration-10 test.
    SimPL,
    /// POLAR-style `ub/lb - 1 < tol` test.
    Polar,
}

impl Default for ConvergenceCriterion {
    fn default() -> Self {
        ConvergenceCriterion::SimPL
    }
}

#[derive(Debug, Clone)]
pub struct PlacerConfig {
    pub stripe_width_factor: f64,
    pub cg_tolerance: f64,
    pub cg_iteration: usize,
    pub cg_iteration_max_num: usize,
    pub cg_stop_criterion: f64,
    pub net_model_update_stop_criterion: f64,
    pub epsilon_factor: f64,
    pub b2b_update_max_iteration: usize,
    pub max_iter: usize,
    pub number_of_cell_in_bin: usize,
    pub net_ignore_threshold: usize,
    pub convergence_criteria: ConvergenceCriterion,
    pub simpl_lal_converge_criterion: f64,
    pub polar_converge_criterion: f64,
    pub net_model: NetModel,
    /// Threshold (in moveable pin count) at which `StarHpwl` crosses over
    /// from the clique to the star model.
    pub star_crossover_threshold: usize,
    /// Region-centering weight applied to every movable cell so an
    /// under-constrained sub-system (e.g. a component with no path to any
    /// fixed cell) still has a well-posed quadratic minimum. Scales as
    /// `region_centering_factor / sqrt(n)`.
    pub region_centering_factor: f64,
    /// Target cell-area/white-space ratio a grid bin may reach before it is
    /// flagged over-filled during look-ahead legalization.
    pub target_filling_rate: f64,
    /// Lower/upper bound on a bisection box's aspect ratio (width/height)
    /// before a cluster's bounding box must expand further rather than be
    /// accepted as-is.
    pub box_aspect_ratio_bound: f64,
    /// Seed for the uniform-random initial placement, kept fixed by default
    /// so a placement run is reproducible.
    pub seed: u64,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        PlacerConfig {
            stripe_width_factor: 2.0,
            cg_tolerance: 1e-35,
            cg_iteration: 10,
            cg_iteration_max_num: 1000,
            cg_stop_criterion: 0.0025,
            net_model_update_stop_criterion: 0.01,
            epsilon_factor: 1.5,
            b2b_update_max_iteration: 50,
            max_iter: 100,
            number_of_cell_in_bin: 30,
            net_ignore_threshold: 100,
            convergence_criteria: ConvergenceCriterion::SimPL,
            simpl_lal_converge_criterion: 0.005,
            polar_converge_criterion: 0.08,
            net_model: NetModel::B2B,
            star_crossover_threshold: 4,
            region_centering_factor: 0.03,
            target_filling_rate: 1.0,
            box_aspect_ratio_bound: 1.5,
            seed: 0xC0FFEE,
        }
    }
}

impl PlacerConfig {
    /// Build a config from a flat key-value set (e.g. parsed from a config
    /// file by an external collaborator), applying defaults for any key not
    /// present. Unknown keys are ignored; this is the shape an external
    /// loader would hand the core.
    pub fn from_key_values(values: &HashMap<String, Value>) -> Self {
        let mut cfg = PlacerConfig::default();
        macro_rules! f64_opt {
            ($key:literal, $field:ident) => {
                if let Some(v) = values.get($key).and_then(Value::as_f64) {
                    cfg.$field = v;
                }
            };
        }
        macro_rules! usize_opt {
            ($key:literal, $field:ident) => {
                if let Some(v) = values.get($key).and_then(Value::as_u64) {
                    cfg.$field = v as usize;
                }
            };
        }

        f64_opt!("stripe_width_factor", stripe_width_factor);
        f64_opt!("cg_tolerance", cg_tolerance);
        usize_opt!("cg_iteration", cg_iteration);
        usize_opt!("cg_iteration_max_num", cg_iteration_max_num);
        f64_opt!("cg_stop_criterion", cg_stop_criterion);
        f64_opt!(
            "net_model_update_stop_criterion",
            net_model_update_stop_criterion
        );
        f64_opt!("epsilon_factor", epsilon_factor);
        usize_opt!("b2b_update_max_iteration", b2b_update_max_iteration);
        usize_opt!("max_iter", max_iter);
        usize_opt!("number_of_cell_in_bin", number_of_cell_in_bin);
        usize_opt!("net_ignore_threshold", net_ignore_threshold);
        if let Some(v) = values.get("seed").and_then(Value::as_u64) {
            cfg.seed = v;
        }
        f64_opt!("simpl_LAL_converge_criterion", simpl_lal_converge_criterion);
        f64_opt!("polar_converge_criterion", polar_converge_criterion);
        f64_opt!("target_filling_rate", target_filling_rate);
        f64_opt!("box_aspect_ratio_bound", box_aspect_ratio_bound);

        if let Some(v) = values.get("convergence_criteria").and_then(Value::as_u64) {
            cfg.convergence_criteria = match v {
                2 => ConvergenceCriterion::Polar,
                _ => ConvergenceCriterion::SimPL,
            };
        }
        if let Some(v) = values.get("net_model").and_then(Value::as_u64) {
            cfg.net_model = match v {
                1 => NetModel::Star,
                2 => NetModel::Hpwl,
                3 => NetModel::StarHpwl,
                _ => NetModel::B2B,
            };
        }

        cfg
    }

    /// Validate the configuration, turning out-of-range values into a
    /// `PlacerError::Precondition` before any placement work starts.
    pub fn validate(&self) -> Result<(), PlacerError> {
        if self.cg_iteration == 0 {
            return Err(PlacerError::Precondition(
                "cg_iteration must be positive".into(),
            ));
        }
        if self.cg_iteration_max_num == 0 {
            return Err(PlacerError::Precondition(
                "cg_iteration_max_num must be positive".into(),
            ));
        }
        if self.b2b_update_max_iteration == 0 {
            return Err(PlacerError::Precondition(
                "b2b_update_max_iteration must be positive".into(),
            ));
        }
        if self.max_iter == 0 {
            return Err(PlacerError::Precondition("max_iter must be positive".into()));
        }
        if self.number_of_cell_in_bin == 0 {
            return Err(PlacerError::Precondition(
                "number_of_cell_in_bin must be positive".into(),
            ));
        }
        if self.cg_tolerance <= 0.0 {
            return Err(PlacerError::Precondition(
                "cg_tolerance must be positive".into(),
            ));
        }
        if self.target_filling_rate <= 0.0 {
            return Err(PlacerError::Precondition(
                "target_filling_rate must be positive".into(),
            ));
        }
        if self.box_aspect_ratio_bound < 1.0 {
            return Err(PlacerError::Precondition(
                "box_aspect_ratio_bound must be at least 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config_validates() {
        assert!(PlacerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_iter_is_rejected() {
        let cfg = PlacerConfig { max_iter: 0, ..PlacerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn aspect_ratio_bound_below_one_is_rejected() {
        let cfg = PlacerConfig { box_aspect_ratio_bound: 0.5, ..PlacerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn from_key_values_overrides_only_present_keys() {
        let mut values = HashMap::new();
        values.insert("max_iter".to_string(), json!(7));
        values.insert("net_model".to_string(), json!(2));

        let cfg = PlacerConfig::from_key_values(&values);
        assert_eq!(cfg.max_iter, 7);
        assert_eq!(cfg.net_model, NetModel::Hpwl);
        assert_eq!(cfg.cg_iteration, PlacerConfig::default().cg_iteration);
    }

    #[test]
    fn from_key_values_falls_back_to_b2b_on_unknown_net_model() {
        let mut values = HashMap::new();
        values.insert("net_model".to_string(), json!(99));
        let cfg = PlacerConfig::from_key_values(&values);
        assert_eq!(cfg.net_model, NetModel::B2B);
    }
}
