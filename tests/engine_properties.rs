use matchedfilter::{
    matched_filter, sum_square_templates, ComputeReport, CorrelationEngine, Dimensions,
    EngineConfig, MatchedFilterError, MatchedFilterInputs,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Case {
    templates: Vec<f32>,
    moveouts: Vec<i32>,
    data: Vec<f32>,
    weights: Vec<f32>,
    dims: Dimensions,
}

impl Case {
    fn run(&self, step: usize) -> (Vec<f32>, ComputeReport) {
        let sums = sum_square_templates(&self.templates, self.dims.n_samples_template).unwrap();
        let mut cc = vec![f32::NAN; self.dims.n_templates * self.dims.n_corr];
        let report = matched_filter(
            &self.templates,
            &sums,
            &self.moveouts,
            &self.data,
            &self.weights,
            step,
            self.dims.n_samples_template,
            self.dims.n_samples_data,
            self.dims.n_templates,
            self.dims.n_stations,
            self.dims.n_components,
            self.dims.n_corr,
            &mut cc,
        )
        .unwrap();
        (cc, report)
    }
}

fn dims(
    n_templates: usize,
    n_stations: usize,
    n_components: usize,
    n_samples_template: usize,
    n_samples_data: usize,
    n_corr: usize,
) -> Dimensions {
    Dimensions {
        n_templates,
        n_stations,
        n_components,
        n_samples_template,
        n_samples_data,
        n_corr,
    }
}

fn step_case() -> Case {
    Case {
        templates: vec![1.0, 1.0, 1.0, 1.0],
        moveouts: vec![0],
        data: vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        weights: vec![1.0],
        dims: dims(1, 1, 1, 4, 10, 7),
    }
}

fn random_case(seed: u64, n_templates: usize, n_stations: usize, n_components: usize) -> Case {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_samples_template = 24;
    let n_samples_data = 300;
    let n_channels = n_stations * n_components;
    let templates = (0..n_templates * n_channels * n_samples_template)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect();
    let moveouts: Vec<i32> = (0..n_templates * n_channels)
        .map(|_| rng.random_range(0..20))
        .collect();
    let data = (0..n_channels * n_samples_data)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect();
    let weights = (0..n_channels)
        .map(|_| rng.random_range(0.1f32..1.0))
        .collect();
    let mut d = dims(
        n_templates,
        n_stations,
        n_components,
        n_samples_template,
        n_samples_data,
        0,
    );
    d.n_corr = d.correlation_len_for(&moveouts, 1);
    Case {
        templates,
        moveouts,
        data,
        weights,
        dims: d,
    }
}

#[test]
fn step_scenario_peaks_at_alignment() {
    let (cc, report) = step_case().run(1);
    assert_eq!(report.n_valid, 7);

    let expected = [
        2.0 / 8.0f32.sqrt(),
        3.0 / 12.0f32.sqrt(),
        1.0,
        3.0 / 12.0f32.sqrt(),
        2.0 / 8.0f32.sqrt(),
        0.5,
        0.0,
    ];
    for (got, want) in cc.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
    }
    let best = cc
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap()
        .0;
    assert_eq!(best, 2);
}

#[test]
fn step_subsamples_offsets() {
    let mut case = step_case();
    case.dims.n_corr = 4;
    let (cc, report) = case.run(2);
    assert_eq!(report.n_valid, 4);
    assert!((cc[1] - 1.0).abs() < 1e-6);
    assert!((cc[0] - 2.0 / 8.0f32.sqrt()).abs() < 1e-6);
    assert_eq!(cc[3], 0.0);
}

#[test]
fn self_correlation_is_one_on_every_channel() {
    let case = random_case(7, 1, 3, 3);
    let n = case.dims.n_samples_template;
    let n_channels = 9;
    let target = 40usize;

    let mut data = case.data.clone();
    for ch in 0..n_channels {
        let m = case.moveouts[ch] as usize;
        let dst = ch * case.dims.n_samples_data + target + m;
        data[dst..dst + n].copy_from_slice(&case.templates[ch * n..(ch + 1) * n]);
    }
    let case = Case { data, ..case };
    let (cc, _) = case.run(1);
    assert!((cc[target] - 1.0).abs() < 1e-5, "score {}", cc[target]);
    assert!(cc.iter().all(|v| *v <= 1.0 + 1e-5));
}

#[test]
fn zero_weights_produce_zero_output() {
    let mut case = random_case(11, 2, 2, 3);
    case.weights = vec![0.0; 6];
    let (cc, report) = case.run(1);
    assert!(report.n_valid > 0);
    assert!(cc.iter().all(|v| *v == 0.0));
}

#[test]
fn weighted_average_of_channels() {
    let d = dims(1, 1, 2, 4, 10, 7);
    let templates = vec![1.0, -1.0, 2.0, 0.5, 0.0, 1.0, 1.0, -1.0];
    let data: Vec<f32> = (0..20).map(|i| ((i * 7 % 5) as f32) - 2.0).collect();
    let both = Case {
        templates: templates.clone(),
        moveouts: vec![0, 0],
        data: data.clone(),
        weights: vec![3.0, 1.0],
        dims: d,
    };
    let first_only = Case {
        weights: vec![1.0, 0.0],
        templates: templates.clone(),
        moveouts: vec![0, 0],
        data: data.clone(),
        dims: d,
    };
    let second_only = Case {
        weights: vec![0.0, 1.0],
        templates,
        moveouts: vec![0, 0],
        data,
        dims: d,
    };
    let (cc, _) = both.run(1);
    let (c0, _) = first_only.run(1);
    let (c1, _) = second_only.run(1);
    for i in 0..7 {
        let expected = (3.0 * c0[i] + c1[i]) / 4.0;
        assert!((cc[i] - expected).abs() < 1e-6);
    }
}

#[test]
fn huge_finite_weights_keep_the_score() {
    let templates = vec![1.0f32, -2.0, 3.0, 0.5, 0.25, 1.0, -1.0, 2.0];
    let case = Case {
        data: templates.clone(),
        templates,
        moveouts: vec![0, 0],
        weights: vec![3e38, 3e38],
        dims: dims(1, 1, 2, 4, 4, 1),
    };
    let (cc, report) = case.run(1);
    assert_eq!(report.n_valid, 1);
    assert!((cc[0] - 1.0).abs() < 1e-6, "score {}", cc[0]);

    let mixed = Case {
        weights: vec![f32::MAX, 1.0],
        ..case
    };
    let (cc, _) = mixed.run(1);
    assert!((cc[0] - 1.0).abs() < 1e-6, "score {}", cc[0]);
}

#[test]
fn moveout_beyond_data_skips_channel() {
    let mut case = step_case();
    case.dims = dims(1, 1, 2, 4, 10, 7);
    case.templates = vec![1.0; 8];
    case.moveouts = vec![0, 100];
    let mut data = step_case().data;
    data.extend((0..10).map(|i| i as f32));
    case.data = data;
    case.weights = vec![1.0, 1.0];

    let (cc, report) = case.run(1);
    let (reference, _) = step_case().run(1);
    assert_eq!(cc, reference);
    assert_eq!(report.invalid_moveouts, 1);
    assert_eq!(report.skipped_channels, 7);
    assert_eq!(report.max_moveout, 0);
}

#[test]
fn negative_moveout_skips_early_offsets() {
    let mut case = step_case();
    case.moveouts = vec![-2];
    let (cc, report) = case.run(1);
    assert_eq!(cc[0], 0.0);
    assert_eq!(cc[1], 0.0);
    assert!((cc[4] - 1.0).abs() < 1e-6);
    assert_eq!(report.skipped_channels, 2);
    assert_eq!(report.invalid_moveouts, 0);
}

#[test]
fn moveout_shrinks_valid_range() {
    let mut case = step_case();
    case.moveouts = vec![2];
    case.dims.n_corr = 5;
    let (cc, report) = case.run(1);
    assert_eq!(report.n_valid, 5);
    assert_eq!(report.max_moveout, 2);
    assert!((cc[0] - 1.0).abs() < 1e-6);
}

#[test]
fn extra_offsets_are_trailing_zeros() {
    let mut case = step_case();
    case.dims.n_corr = 10;
    let (cc, report) = case.run(1);
    assert_eq!(report.n_corr, 10);
    assert_eq!(report.n_valid, 7);
    assert_eq!(&cc[7..], &[0.0, 0.0, 0.0]);
    assert!((cc[2] - 1.0).abs() < 1e-6);
}

#[test]
fn per_template_weights_are_resolved() {
    let case = Case {
        templates: vec![1.0; 8],
        moveouts: vec![0, 0],
        data: step_case().data,
        weights: vec![1.0, 0.0],
        dims: dims(2, 1, 1, 4, 10, 7),
    };
    let (cc, _) = case.run(1);
    assert!((cc[2] - 1.0).abs() < 1e-6);
    assert!(cc[7..].iter().all(|v| *v == 0.0));
}

#[test]
fn degenerate_inputs_never_leak_nan() {
    let mut case = random_case(5, 1, 2, 1);
    let n = case.dims.n_samples_template;
    for v in case.templates[..n].iter_mut() {
        *v = 0.0;
    }
    case.data[17] = f32::NAN;
    case.data[case.dims.n_samples_data + 3] = f32::INFINITY;
    for v in case.data[100..150].iter_mut() {
        *v = 0.0;
    }
    let (cc, _) = case.run(1);
    assert!(cc.iter().all(|v| v.is_finite()));
}

#[test]
fn repeated_runs_are_bit_identical() {
    let case = random_case(99, 3, 2, 3);
    let (a, ra) = case.run(1);
    let (b, rb) = case.run(1);
    assert_eq!(a, b);
    assert_eq!(ra, rb);
}

#[test]
fn empty_grid_is_a_no_op() {
    let mut case = step_case();
    case.dims.n_corr = 0;
    let (cc, report) = case.run(1);
    assert!(cc.is_empty());
    assert_eq!(report.n_valid, 0);

    let case = Case {
        templates: Vec::new(),
        moveouts: Vec::new(),
        data: step_case().data,
        weights: vec![1.0],
        dims: dims(0, 1, 1, 4, 10, 7),
    };
    let (cc, _) = case.run(1);
    assert!(cc.is_empty());
}

fn inputs_for<'a>(case: &'a Case, sums: &'a [f32]) -> MatchedFilterInputs<'a> {
    MatchedFilterInputs {
        templates: &case.templates,
        sum_square_templates: sums,
        moveouts: &case.moveouts,
        data: &case.data,
        weights: &case.weights,
        dims: case.dims,
    }
}

#[test]
fn validation_failures_leave_output_untouched() {
    let engine = CorrelationEngine::new(EngineConfig::default());
    let case = step_case();
    let sums = vec![4.0f32];
    let mut cc = vec![7.0f32; 7];

    let err = engine
        .compute(&inputs_for(&case, &sums), 0, &mut cc)
        .err()
        .unwrap();
    assert_eq!(err, MatchedFilterError::InvalidStep { step: 0 });

    let mut short = vec![7.0f32; 6];
    let err = engine
        .compute(&inputs_for(&case, &sums), 1, &mut short)
        .err()
        .unwrap();
    assert_eq!(
        err,
        MatchedFilterError::DimensionMismatch {
            buffer: "cc_out",
            expected: 7,
            got: 6,
        }
    );

    let mut bad = step_case();
    bad.data.pop();
    let err = engine
        .compute(&inputs_for(&bad, &sums), 1, &mut cc)
        .err()
        .unwrap();
    assert_eq!(
        err,
        MatchedFilterError::DimensionMismatch {
            buffer: "data",
            expected: 10,
            got: 9,
        }
    );

    let mut bad = step_case();
    bad.weights = vec![-0.5];
    let err = engine
        .compute(&inputs_for(&bad, &sums), 1, &mut cc)
        .err()
        .unwrap();
    assert_eq!(
        err,
        MatchedFilterError::InvalidWeight {
            index: 0,
            value: -0.5,
        }
    );

    let mut bad = step_case();
    bad.dims.n_samples_data = 3;
    bad.data.truncate(3);
    let err = engine
        .compute(&inputs_for(&bad, &sums), 1, &mut cc)
        .err()
        .unwrap();
    assert_eq!(
        err,
        MatchedFilterError::TemplateLongerThanData {
            n_samples_template: 4,
            n_samples_data: 3,
        }
    );

    let err = engine
        .compute(&inputs_for(&case, &[]), 1, &mut cc)
        .err()
        .unwrap();
    assert_eq!(
        err,
        MatchedFilterError::DimensionMismatch {
            buffer: "sum_square_templates",
            expected: 1,
            got: 0,
        }
    );

    assert!(cc.iter().all(|v| *v == 7.0));
}

#[test]
fn zero_offset_chunk_is_rejected() {
    let engine = CorrelationEngine::new(EngineConfig {
        offset_chunk: 0,
        ..EngineConfig::default()
    });
    let case = step_case();
    let sums = vec![4.0f32];
    let mut cc = vec![0.0f32; 7];
    assert!(engine
        .compute(&inputs_for(&case, &sums), 1, &mut cc)
        .is_err());
}
