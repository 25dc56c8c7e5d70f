//! Solvers on small coupled linear systems.

use ac_solver::{
    BlockSystem, LinearKind, NonlinearKind, SolverError, SolverSettings, solve,
};

/// Two blocks: `x = a * y + b` and `y = c * x + d`.
///
/// The Gauss-Seidel map contracts when `|a * c| < 1`.
struct LinearPair {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    x: f64,
    y: f64,
    evaluations: usize,
    fail_after: Option<usize>,
}

impl LinearPair {
    fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a,
            b,
            c,
            d,
            x: 1.0,
            y: 1.0,
            evaluations: 0,
            fail_after: None,
        }
    }

    fn passes(&self) -> usize {
        self.evaluations / 2
    }

    /// Exact fixed point.
    fn solution(&self) -> (f64, f64) {
        let x = (self.a * self.d + self.b) / (1.0 - self.a * self.c);
        (x, self.c * x + self.d)
    }
}

impl BlockSystem for LinearPair {
    type Error = SolverError;

    fn block_count(&self) -> usize {
        2
    }

    fn evaluate_block(&mut self, index: usize) -> Result<(), SolverError> {
        self.evaluations += 1;
        if let Some(limit) = self.fail_after
            && self.evaluations > limit
        {
            return Err(SolverError::Numeric {
                what: "block failure".into(),
            });
        }
        match index {
            0 => self.x = self.a * self.y + self.b,
            _ => self.y = self.c * self.x + self.d,
        }
        Ok(())
    }

    fn state(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }

    fn set_state(&mut self, x: &[f64]) -> Result<(), SolverError> {
        if x.len() != 2 {
            return Err(SolverError::StateLength {
                expected: 2,
                actual: x.len(),
            });
        }
        self.x = x[0];
        self.y = x[1];
        Ok(())
    }

    fn state_label(&self, index: usize) -> String {
        ["x", "y"][index].to_string()
    }
}

#[test]
fn contracting_loop_converges_within_cap() {
    let mut pair = LinearPair::new(0.5, 1.0, 0.5, 2.0);
    let report = solve(&mut pair, &SolverSettings::default()).unwrap();

    assert!(report.converged, "{report}");
    assert!(report.iterations <= 50);
    let (x, y) = pair.solution();
    assert!((pair.x - x).abs() < 1e-9);
    assert!((pair.y - y).abs() < 1e-9);
}

#[test]
fn diverging_loop_fails_at_exactly_the_cap() {
    for cap in [1, 7, 50] {
        let mut pair = LinearPair::new(2.0, 1.0, 1.5, 0.0);
        let settings = SolverSettings {
            max_iterations: cap,
            ..SolverSettings::default()
        };
        let report = solve(&mut pair, &settings).unwrap();

        assert!(!report.converged);
        assert_eq!(report.iterations, cap);
        assert_eq!(pair.passes(), cap);
        assert!(report.worst_variable.is_some());
    }
}

#[test]
fn worst_variable_is_reported() {
    // y moves three times as much as x every pass.
    let mut pair = LinearPair::new(0.0, 1.0, 3.0, 0.0);
    pair.x = 0.0;
    pair.y = 0.0;
    let settings = SolverSettings {
        max_iterations: 1,
        ..SolverSettings::default()
    };
    let report = solve(&mut pair, &settings).unwrap();
    assert_eq!(report.worst_variable.as_deref(), Some("y"));
    assert!((report.worst_residual - 3.0).abs() < 1e-12);
}

#[test]
fn relaxation_still_converges() {
    let mut pair = LinearPair::new(0.5, 1.0, 0.5, 2.0);
    let settings = SolverSettings {
        relaxation: 0.7,
        max_iterations: 200,
        ..SolverSettings::default()
    };
    let report = solve(&mut pair, &settings).unwrap();
    assert!(report.converged, "{report}");
    let (x, _) = pair.solution();
    assert!((pair.x - x).abs() < 1e-8);
}

#[test]
fn newton_converges_on_linear_coupling() {
    let mut pair = LinearPair::new(0.5, 1.0, 0.5, 2.0);
    let settings = SolverSettings {
        nonlinear: NonlinearKind::Newton,
        ..SolverSettings::default()
    };
    let report = solve(&mut pair, &settings).unwrap();
    assert!(report.converged, "{report}");
    assert!(report.iterations <= 5);
    let (x, y) = pair.solution();
    assert!((pair.x - x).abs() < 1e-6);
    assert!((pair.y - y).abs() < 1e-6);
}

#[test]
fn newton_handles_loops_gauss_seidel_cannot() {
    // |a * c| = 3: Gauss-Seidel diverges, Newton solves the linear residual.
    let mut pair = LinearPair::new(2.0, 1.0, 1.5, 0.0);
    let settings = SolverSettings {
        nonlinear: NonlinearKind::Newton,
        linear: LinearKind::Svd,
        atol: 1e-8,
        ..SolverSettings::default()
    };
    let report = solve(&mut pair, &settings).unwrap();
    assert!(report.converged, "{report}");
    let (x, _) = pair.solution();
    assert!((pair.x - x).abs() < 1e-5);
}

#[test]
fn block_errors_propagate() {
    let mut pair = LinearPair::new(0.5, 1.0, 0.5, 2.0);
    pair.fail_after = Some(3);
    let err = solve(&mut pair, &SolverSettings::default()).unwrap_err();
    assert!(matches!(err, SolverError::Numeric { .. }));
}

#[test]
fn run_once_evaluates_each_block_once() {
    let mut pair = LinearPair::new(0.5, 1.0, 0.5, 2.0);
    let report = solve(&mut pair, &SolverSettings::run_once()).unwrap();
    assert!(report.converged);
    assert_eq!(pair.evaluations, 2);
}

#[test]
fn invalid_settings_are_rejected() {
    let mut pair = LinearPair::new(0.5, 1.0, 0.5, 2.0);
    let settings = SolverSettings {
        relaxation: 0.0,
        ..SolverSettings::default()
    };
    assert!(matches!(
        solve(&mut pair, &settings),
        Err(SolverError::InvalidSettings { .. })
    ));
}
