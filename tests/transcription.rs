//! How problems reach the engine: these tests use the recording engine, which solves nothing
//! and keeps every call it receives.

use std::path::PathBuf;

use stdlp::solvers::recording::{Call, RecordedRow, RecordingEngine};
use stdlp::solvers::{Environment, ModelHandle, ModelSpec, SolverEngine};
use stdlp::{
    dense_solve, dense_solve_into, sparse_solve, Columns, CsrBuffer, CsrMatrix, DenseProblem,
    ErrorKind, ResolutionError, Sense, SolverConfig, SparseProblem, Status, VarType,
};

const MATRIX: [f64; 9] = [
    1., 0., 2., //
    0., 0., 0., //
    0., 3., 0.,
];
const RHS: [f64; 3] = [1., 2., 3.];
const C: [f64; 3] = [1., 1., 1.];
const LB: [f64; 3] = [0., 0., 0.];
const UB: [f64; 3] = [5., 5., 5.];

fn columns(n_eq: usize) -> Columns<'static> {
    Columns {
        objective: &C,
        rhs: &RHS,
        lower: &LB,
        upper: &UB,
        var_types: None,
        n_eq,
    }
}

fn dense(n_eq: usize) -> DenseProblem<'static> {
    DenseProblem {
        rows: 3,
        cols: 3,
        quadratic: None,
        matrix: &MATRIX,
        columns: columns(n_eq),
    }
}

fn rows_of(engine: &RecordingEngine) -> Vec<(Vec<usize>, Vec<f64>, Sense)> {
    engine
        .constraint_rows()
        .into_iter()
        .map(|RecordedRow { indices, values, sense, .. }| (indices, values, sense))
        .collect()
}

#[test]
fn dense_and_sparse_send_the_same_rows() {
    let config = SolverConfig::quiet();
    let dense_engine = RecordingEngine::new();
    let dense_solution = dense_solve(&dense_engine, &dense(1), &config);

    let csr = CsrBuffer::from_dense(&MATRIX, 3);
    let sparse_engine = RecordingEngine::new();
    let sparse_solution = sparse_solve(
        &sparse_engine,
        &SparseProblem {
            rows: 3,
            cols: 3,
            matrix: csr.as_matrix(),
            columns: columns(1),
        },
        &config,
    );

    assert_eq!(dense_solution, sparse_solution);
    assert_eq!(dense_engine.constraint_rows(), sparse_engine.constraint_rows());
    assert_eq!(
        rows_of(&dense_engine),
        vec![
            (vec![0, 2], vec![1., 2.], Sense::Equal),
            (vec![], vec![], Sense::LessEqual),
            (vec![1], vec![3.], Sense::LessEqual),
        ]
    );
}

#[test]
fn row_offsets_with_or_without_the_final_entry() {
    let values = [1., 2., 3.];
    let col_index = [0, 2, 1];
    let engine = RecordingEngine::new();
    for row_begin in [&[0, 2, 2][..], &[0, 2, 2, 3][..]] {
        engine.clear();
        let problem = SparseProblem {
            rows: 3,
            cols: 3,
            matrix: CsrMatrix {
                values: &values,
                row_begin,
                col_index: &col_index,
            },
            columns: columns(0),
        };
        sparse_solve(&engine, &problem, &SolverConfig::quiet()).unwrap();
        let added = engine
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::AddConstraints { .. }))
            .count();
        assert_eq!(added, 1, "the CSR arrays are passed in one call");
        assert_eq!(
            rows_of(&engine),
            vec![
                (vec![0, 2], vec![1., 2.], Sense::LessEqual),
                (vec![], vec![], Sense::LessEqual),
                (vec![1], vec![3.], Sense::LessEqual),
            ]
        );
    }
}

#[test]
fn equality_count_extremes() {
    let engine = RecordingEngine::new();
    dense_solve(&engine, &dense(0), &SolverConfig::quiet()).unwrap();
    assert!(engine
        .constraint_rows()
        .iter()
        .all(|row| row.sense == Sense::LessEqual));

    engine.clear();
    dense_solve(&engine, &dense(3), &SolverConfig::quiet()).unwrap();
    assert!(engine
        .constraint_rows()
        .iter()
        .all(|row| row.sense == Sense::Equal));
}

#[test]
fn quadratic_terms_come_in_symmetric_pairs() {
    let q = [
        2., 0.5, 0., //
        0.5, 0., 0., //
        0., 0., 1e-300,
    ];
    let engine = RecordingEngine::new();
    let problem = DenseProblem {
        quadratic: Some(&q),
        ..dense(0)
    };
    dense_solve(&engine, &problem, &SolverConfig::quiet()).unwrap();
    let terms = engine.quadratic_terms();
    assert_eq!(terms, vec![(0, 0, 2.), (0, 1, 0.5), (1, 0, 0.5), (2, 2, 1e-300)]);
    for &(i, j, value) in &terms {
        assert!(terms.contains(&(j, i, value)));
    }
    let batches = engine
        .calls()
        .iter()
        .filter(|call| matches!(call, Call::AddQuadraticTerms { .. }))
        .count();
    assert_eq!(batches, 1);
}

#[test]
fn all_zero_quadratic_is_still_sent() {
    let q = [0.; 9];
    let engine = RecordingEngine::new();
    let problem = DenseProblem {
        quadratic: Some(&q),
        ..dense(0)
    };
    dense_solve(&engine, &problem, &SolverConfig::quiet()).unwrap();
    assert!(engine.calls().contains(&Call::AddQuadraticTerms {
        rows: vec![],
        cols: vec![],
        values: vec![],
    }));
}

#[test]
fn type_codes_reach_the_engine() {
    let codes = [2, 9, -1];
    let engine = RecordingEngine::new();
    let problem = DenseProblem {
        columns: Columns {
            var_types: Some(&codes),
            ..columns(0)
        },
        ..dense(0)
    };
    dense_solve(&engine, &problem, &SolverConfig::quiet()).unwrap();
    let types = engine.calls().into_iter().find_map(|call| match call {
        Call::NewModel { var_types, .. } => Some(var_types),
        _ => None,
    });
    assert_eq!(
        types,
        Some(vec![
            VarType::Integer,
            VarType::Continuous,
            VarType::Continuous
        ])
    );
}

#[test]
fn default_config_logs_to_dense_log() {
    let engine = RecordingEngine::new();
    let config = SolverConfig::default().log_to_console(false);
    dense_solve(&engine, &dense(0), &config).unwrap();
    assert_eq!(
        engine.calls()[0],
        Call::OpenEnvironment {
            log_file: Some(PathBuf::from("dense.log"))
        }
    );
}

#[test]
fn out_of_range_parameter_fails_and_releases_handles() {
    let engine = RecordingEngine::new();
    let mut x = [-1.; 3];
    let mut objective = -1.;
    let err = dense_solve_into(
        &engine,
        &dense(0),
        &SolverConfig::quiet().method(9),
        &mut x,
        &mut objective,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Method"), "{}", err);
    assert_eq!((x, objective), ([-1.; 3], -1.));
    let calls = engine.calls();
    assert!(!calls.contains(&Call::Optimize));
    assert_eq!(calls[calls.len() - 2..], [Call::FreeModel, Call::FreeEnvironment]);
}

#[test]
fn unknown_parameter() {
    let engine = RecordingEngine::new();
    let env = engine.open_environment(None).unwrap();
    let mut model = env
        .new_model(ModelSpec {
            name: "params",
            objective: &[1.],
            lower: &[0.],
            upper: &[1.],
            var_types: &[VarType::Continuous],
        })
        .unwrap();
    assert_eq!(
        model.set_int_param("Presolve", 1).unwrap_err().kind,
        ErrorKind::UnknownParameter
    );
    assert!(model.set_int_param("crossover", 0).is_ok());
    assert_eq!(
        model.set_int_param("LogToConsole", 2).unwrap_err().kind,
        ErrorKind::ValueOutOfRange
    );
}

#[test]
fn non_optimal_statuses() {
    for (status, expected) in [
        (Status::Infeasible, ResolutionError::Infeasible),
        (Status::InfOrUnbd, ResolutionError::Infeasible),
        (Status::Unbounded, ResolutionError::Unbounded),
        (Status::TimeLimit, ResolutionError::NotOptimal(Status::TimeLimit)),
        (Status::Suboptimal, ResolutionError::NotOptimal(Status::Suboptimal)),
    ] {
        let engine = RecordingEngine::new().with_status(status);
        assert_eq!(
            dense_solve(&engine, &dense(0), &SolverConfig::quiet()),
            Err(expected)
        );
    }
}
