//! Multiple-testing correction across a panel of p-values.
//!
//! Family-wise methods (Bonferroni, Holm) bound the chance of any false
//! rejection; false-discovery-rate methods (Benjamini–Hochberg,
//! Benjamini–Yekutieli) bound the expected share of false rejections among
//! all rejections. Adjusted p-values are reported in input order.

use serde::{Deserialize, Serialize};
use symrand_core::{Error, Result, validate_alpha};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionMethod {
    Bonferroni,
    /// Holm step-down.
    #[default]
    Holm,
    BenjaminiHochberg,
    /// Benjamini–Hochberg scaled by `c(m) = Σ 1/i`; valid under any
    /// dependence between tests.
    BenjaminiYekutieli,
}

impl CorrectionMethod {
    pub const ALL: [CorrectionMethod; 4] = [
        CorrectionMethod::Bonferroni,
        CorrectionMethod::Holm,
        CorrectionMethod::BenjaminiHochberg,
        CorrectionMethod::BenjaminiYekutieli,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::BenjaminiHochberg => "benjamini-hochberg",
            CorrectionMethod::BenjaminiYekutieli => "benjamini-yekutieli",
        }
    }
}

impl std::fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CorrectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bonferroni" => Ok(CorrectionMethod::Bonferroni),
            "holm" => Ok(CorrectionMethod::Holm),
            "bh" | "fdr" | "benjamini-hochberg" => Ok(CorrectionMethod::BenjaminiHochberg),
            "by" | "benjamini-yekutieli" => Ok(CorrectionMethod::BenjaminiYekutieli),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown correction method {other:?}"
            ))),
        }
    }
}

/// Adjusted p-value and decision for one test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    pub adjusted_p_value: f64,
    /// `adjusted_p_value < alpha`.
    pub rejected: bool,
}

/// Adjust `p_values` for multiple testing and decide each at `alpha`.
///
/// An empty slice yields an empty result. Every p-value must lie in `[0, 1]`.
pub fn adjust_p_values(
    p_values: &[f64],
    alpha: f64,
    method: CorrectionMethod,
) -> Result<Vec<Adjustment>> {
    validate_alpha(alpha)?;
    if let Some(bad) = p_values.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(Error::InvalidConfiguration(format!(
            "p-value {bad} is outside [0, 1]"
        )));
    }

    let adjusted = match method {
        CorrectionMethod::Bonferroni => bonferroni(p_values),
        CorrectionMethod::Holm => holm(p_values),
        CorrectionMethod::BenjaminiHochberg => step_up(p_values, 1.0),
        CorrectionMethod::BenjaminiYekutieli => {
            let c: f64 = (1..=p_values.len()).map(|i| 1.0 / i as f64).sum();
            step_up(p_values, c)
        }
    };

    Ok(adjusted
        .into_iter()
        .map(|adjusted_p_value| Adjustment {
            adjusted_p_value,
            rejected: adjusted_p_value < alpha,
        })
        .collect())
}

fn bonferroni(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len() as f64;
    p_values.iter().map(|&p| (p * m).min(1.0)).collect()
}

/// Indices of `p_values` in ascending order, ties by position.
fn ascending(p_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]).then(a.cmp(&b)));
    order
}

/// `(m − i) p_(i)` with a running maximum from the smallest p-value up.
fn holm(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let mut adjusted = vec![0.0; m];
    let mut running = 0.0f64;
    for (rank, idx) in ascending(p_values).into_iter().enumerate() {
        let adj = ((m - rank) as f64 * p_values[idx]).min(1.0);
        running = running.max(adj);
        adjusted[idx] = running;
    }
    adjusted
}

/// `scale · m/i · p_(i)` with a running minimum from the largest p-value down.
fn step_up(p_values: &[f64], scale: f64) -> Vec<f64> {
    let m = p_values.len() as f64;
    let mut adjusted = vec![0.0; p_values.len()];
    let mut running = 1.0f64;
    for (rank, idx) in ascending(p_values).into_iter().enumerate().rev() {
        let adj = (scale * p_values[idx] * m / (rank + 1) as f64).min(1.0);
        running = running.min(adj);
        adjusted[idx] = running;
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PS: [f64; 4] = [0.01, 0.04, 0.03, 0.005];

    fn adjusted(method: CorrectionMethod) -> Vec<f64> {
        adjust_p_values(&PS, 0.05, method)
            .unwrap()
            .into_iter()
            .map(|a| a.adjusted_p_value)
            .collect()
    }

    fn assert_all_close(got: &[f64], want: &[f64]) {
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < 1e-10, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn test_bonferroni() {
        assert_all_close(&adjusted(CorrectionMethod::Bonferroni), &[0.04, 0.16, 0.12, 0.02]);
    }

    #[test]
    fn test_holm() {
        assert_all_close(&adjusted(CorrectionMethod::Holm), &[0.03, 0.06, 0.06, 0.02]);
    }

    #[test]
    fn test_benjamini_hochberg() {
        assert_all_close(
            &adjusted(CorrectionMethod::BenjaminiHochberg),
            &[0.02, 0.04, 0.04, 0.02],
        );
    }

    #[test]
    fn test_benjamini_yekutieli() {
        let c = 1.0 + 0.5 + 1.0 / 3.0 + 0.25;
        assert_all_close(
            &adjusted(CorrectionMethod::BenjaminiYekutieli),
            &[0.02 * c, 0.04 * c, 0.04 * c, 0.02 * c],
        );
    }

    #[test]
    fn test_rejections_at_alpha() {
        let holm = adjust_p_values(&PS, 0.05, CorrectionMethod::Holm).unwrap();
        let rejected: Vec<bool> = holm.iter().map(|a| a.rejected).collect();
        assert_eq!(rejected, vec![true, false, false, true]);
    }

    #[test]
    fn test_single_p_value_is_unchanged() {
        for method in CorrectionMethod::ALL {
            let out = adjust_p_values(&[0.03], 0.05, method).unwrap();
            assert_eq!(out[0].adjusted_p_value, 0.03);
            assert!(out[0].rejected);
        }
    }

    #[test]
    fn test_edge_cases() {
        assert!(
            adjust_p_values(&[], 0.05, CorrectionMethod::Holm)
                .unwrap()
                .is_empty()
        );
        assert!(adjust_p_values(&[f64::NAN], 0.05, CorrectionMethod::Holm).is_err());
        assert!(adjust_p_values(&[1.2], 0.05, CorrectionMethod::Bonferroni).is_err());
        assert!(adjust_p_values(&[0.2], 0.0, CorrectionMethod::Bonferroni).is_err());
    }

    #[test]
    fn test_parse_and_display() {
        for method in CorrectionMethod::ALL {
            assert_eq!(method.as_str().parse::<CorrectionMethod>().unwrap(), method);
        }
        assert_eq!(
            "BH".parse::<CorrectionMethod>().unwrap(),
            CorrectionMethod::BenjaminiHochberg
        );
        assert!("sidak".parse::<CorrectionMethod>().is_err());
        assert_eq!(CorrectionMethod::default().to_string(), "holm");
    }

    proptest! {
        #[test]
        fn adjusted_values_are_ordered_across_methods(
            ps in proptest::collection::vec(0.0f64..=1.0, 1..40)
        ) {
            let get = |method| -> Vec<f64> {
                adjust_p_values(&ps, 0.05, method)
                    .unwrap()
                    .into_iter()
                    .map(|a| a.adjusted_p_value)
                    .collect()
            };
            let bonf = get(CorrectionMethod::Bonferroni);
            let holm = get(CorrectionMethod::Holm);
            let bh = get(CorrectionMethod::BenjaminiHochberg);
            let by = get(CorrectionMethod::BenjaminiYekutieli);
            for i in 0..ps.len() {
                prop_assert!(holm[i] <= bonf[i] + 1e-12);
                prop_assert!(bh[i] <= holm[i] + 1e-12);
                prop_assert!(bh[i] <= by[i] + 1e-12);
                for adj in [bonf[i], holm[i], bh[i], by[i]] {
                    prop_assert!(adj >= ps[i] - 1e-12);
                    prop_assert!(adj <= 1.0);
                }
            }
        }

        #[test]
        fn rejection_counts_are_ordered(
            ps in proptest::collection::vec(0.0f64..=0.2, 1..40),
            alpha in 0.001f64..0.2,
        ) {
            let count = |method| {
                adjust_p_values(&ps, alpha, method)
                    .unwrap()
                    .iter()
                    .filter(|a| a.rejected)
                    .count()
            };
            let bonf = count(CorrectionMethod::Bonferroni);
            let holm = count(CorrectionMethod::Holm);
            let bh = count(CorrectionMethod::BenjaminiHochberg);
            let by = count(CorrectionMethod::BenjaminiYekutieli);
            prop_assert!(bonf <= holm);
            prop_assert!(holm <= bh);
            prop_assert!(by <= bh);
        }

        #[test]
        fn adjustment_preserves_p_value_order(
            ps in proptest::collection::vec(0.0f64..=1.0, 2..30)
        ) {
            for method in CorrectionMethod::ALL {
                let adj = adjust_p_values(&ps, 0.05, method).unwrap();
                for i in 0..ps.len() {
                    for j in 0..ps.len() {
                        if ps[i] < ps[j] {
                            prop_assert!(adj[i].adjusted_p_value <= adj[j].adjusted_p_value + 1e-12);
                        }
                    }
                }
            }
        }
    }
}
