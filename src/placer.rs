//! Top-level placement entry point (component J).
//!
//! Drives the whole flow: validate configuration, scatter movable cells
//! uniformly at random, run the unanchored quadratic solve once, legalize,
//! then alternate anchored quadratic solves with legalization passes until
//! one of the two outer convergence criteria fires or the iteration cap is
//! reached.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, info_span};

use crate::circuit::Circuit;
use crate::config::{ConvergenceCriterion, PlacerConfig};
use crate::error::PlacerError;
use crate::legalizer::{self, LegalizationResult};
use crate::netmodel::anchor;
use crate::quadratic;

/// Final report handed back to the caller of [`place`].
#[derive(Debug, Clone, Copy)]
pub struct PlacementReport {
    /// Weighted HPWL of the last (overlapping) quadratic solve — a lower
    /// bound on achievable wire length.
    pub lower_bound_hpwl: f64,
    /// Weighted HPWL of the last legalized (non-overlapping) placement.
    pub upper_bound_hpwl: f64,
    /// Whether the outer loop's convergence criterion fired before
    /// `max_iter` was reached.
    pub converged: bool,
}

fn check_preconditions(circuit: &Circuit) -> Result<(), PlacerError> {
    if circuit.cells.is_empty() {
        return Err(PlacerError::Precondition("circuit has no cells".into()));
    }
    if circuit.region.width() <= 0.0 || circuit.region.height() <= 0.0 {
        return Err(PlacerError::Precondition(
            "placement region has non-positive width or height".into(),
        ));
    }
    for net in &circuit.nets {
        for pin in &net.pins {
            if pin.cell >= circuit.cells.len() {
                return Err(PlacerError::Integrity(format!(
                    "net references out-of-range cell index {}",
                    pin.cell
                )));
            }
        }
    }
    Ok(())
}

/// Scatter every movable cell's lower-left corner uniformly at random
/// within the placement region, leaving fixed cells untouched.
fn uniform_random_init(circuit: &mut Circuit, config: &PlacerConfig) {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let region = circuit.region;
    for i in 0..circuit.cells.len() {
        if !circuit.cells[i].is_movable() {
            continue;
        }
        let w = circuit.cell_width(i);
        let h = circuit.cell_height(i);
        let max_x = (region.right - w).max(region.left);
        let max_y = (region.top - h).max(region.bottom);
        circuit.cells[i].x = rng.gen_range(region.left..=max_x);
        circuit.cells[i].y = rng.gen_range(region.bottom..=max_y);
    }
}

/// SimPL-style test: the gap between upper and lower bound HPWL, relative
/// to the gap recorded at the 10th outer iteration, has shrunk below
/// `simpl_lal_converge_criterion`.
fn simpl_converged(iter: usize, gap_at_10: Option<f64>, current_gap: f64, tol: f64) -> (bool, Option<f64>) {
    if iter < 10 {
        return (false, gap_at_10);
    }
    let reference = match gap_at_10 {
        Some(r) => r,
        None => return (false, Some(current_gap)),
    };
    if reference.abs() < 1e-300 {
        return (current_gap.abs() < 1e-300, Some(reference));
    }
    ((current_gap / reference).abs() < tol, Some(reference))
}

/// POLAR-style test: `upper_bound / lower_bound - 1 < tol`.
fn polar_converged(lower_bound: f64, upper_bound: f64, tol: f64) -> bool {
    if lower_bound.abs() < 1e-300 {
        return upper_bound.abs() < 1e-300;
    }
    (upper_bound / lower_bound - 1.0).abs() < tol
}

/// Run the full placement flow over `circuit`, mutating its cell positions
/// in place.
pub fn place(circuit: &mut Circuit, config: &PlacerConfig) -> Result<PlacementReport, PlacerError> {
    config.validate()?;
    check_preconditions(circuit)?;

    let span = info_span!("place");
    let _enter = span.enter();

    uniform_random_init(circuit, config);

    let (hx, hy) = quadratic::unanchored_placement(circuit, config);
    let mut lower_bound_hpwl = hx + hy;
    info!(lower_bound_hpwl, "initial unanchored placement complete");

    let mut legal: LegalizationResult = legalizer::look_ahead_legalize(circuit, config);
    let mut upper_bound_hpwl = legal.upper_bound_hpwl;

    let mut gap_at_10: Option<f64> = None;
    let mut converged = false;

    for iter in 0..config.max_iter {
        let alpha = anchor::alpha_for_iteration(iter);

        let (hx, hy) = quadratic::anchored_placement(circuit, config, &legal.anchor_x, &legal.anchor_y, alpha);
        lower_bound_hpwl = hx + hy;

        legal = legalizer::look_ahead_legalize(circuit, config);
        upper_bound_hpwl = legal.upper_bound_hpwl;

        let gap = upper_bound_hpwl - lower_bound_hpwl;

        info!(iter, lower_bound_hpwl, upper_bound_hpwl, gap, "outer iteration complete");

        converged = match config.convergence_criteria {
            ConvergenceCriterion::SimPL => {
                let (done, new_ref) = simpl_converged(iter, gap_at_10, gap, config.simpl_lal_converge_criterion);
                gap_at_10 = new_ref;
                done
            }
            ConvergenceCriterion::Polar => {
                polar_converged(lower_bound_hpwl, upper_bound_hpwl, config.polar_converge_criterion)
            }
        };

        if converged {
            break;
        }
    }

    Ok(PlacementReport {
        lower_bound_hpwl,
        upper_bound_hpwl,
        converged,
    })
}
