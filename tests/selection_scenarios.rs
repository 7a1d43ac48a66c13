use ndarray::{Array2, ArrayView2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Uniform};
use specselect::{
    ComponentSpec, DuplexOptions, GroupPartition, HonigsOptions, KennardStoneOptions,
    LabeledMatrix, Metric, NaesOptions, PuchweinOptions, SelectionResult, ShenkWestOptions,
    duplex, honigs, kennard_stone, naes, puchwein, shenk_west,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn normal_cloud(n: usize, p: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    Array2::from_shape_fn((n, p), |_| normal.sample(&mut rng))
}

fn assert_partition(result: &SelectionResult, n: usize) {
    let mut seen = vec![0u8; n];
    for &idx in result.model.iter().chain(&result.test) {
        seen[idx] += 1;
    }
    assert!(seen.iter().all(|&count| count == 1), "model and test must partition 0..{n}");
}

fn column_span(x: ArrayView2<f64>, rows: &[usize], col: usize) -> f64 {
    let values = x.select(Axis(0), rows);
    let column = values.column(col);
    let max = column.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let min = column.fold(f64::INFINITY, |a, &b| a.min(b));
    max - min
}

fn min_spacing(x: ArrayView2<f64>, rows: &[usize]) -> f64 {
    let mut smallest = f64::INFINITY;
    for (a, &i) in rows.iter().enumerate() {
        for &j in &rows[a + 1..] {
            let d = (&x.row(i) - &x.row(j)).mapv(|v| v * v).sum().sqrt();
            smallest = smallest.min(d);
        }
    }
    smallest
}

#[test]
fn kennard_stone_covers_a_normal_cloud() {
    init_logging();
    let x = normal_cloud(1000, 2, 42);
    let options = KennardStoneOptions::new(25).with_metric(Metric::Euclidean);
    let result = kennard_stone(x.view(), &options, None, None).unwrap();

    assert_eq!(result.model.len(), 25);
    let mut unique = result.model.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 25);
    assert_partition(&result, 1000);
    assert!(result.pc.is_none());

    let everyone: Vec<usize> = (0..1000).collect();
    for col in 0..2 {
        let covered = column_span(x.view(), &result.model, col);
        let full = column_span(x.view(), &everyone, col);
        assert!(
            covered > 0.75 * full,
            "column {col}: selection spans {covered:.3} of {full:.3}"
        );
    }
}

#[test]
fn kennard_stone_sequence_is_prefix_monotone() {
    init_logging();
    let x = normal_cloud(300, 3, 5);
    let mut previous: Option<Vec<usize>> = None;
    for k in 8..12 {
        let result = kennard_stone(x.view(), &KennardStoneOptions::new(k), None, None).unwrap();
        assert_eq!(result.model.len(), k);
        if let Some(shorter) = previous {
            assert_eq!(&result.model[..shorter.len()], shorter.as_slice());
        }
        previous = Some(result.model);
    }
}

#[test]
fn kennard_stone_keeps_groups_whole() {
    init_logging();
    let x = normal_cloud(200, 2, 9);
    let labels: Vec<String> = (0..200).map(|i| format!("batch-{}", i / 4)).collect();
    let groups = GroupPartition::from_labels(&labels);
    let options = KennardStoneOptions::new(10).with_metric(Metric::Euclidean);
    let result = kennard_stone(x.view(), &options, Some(&groups), None).unwrap();

    assert!(result.model.len() >= 10);
    assert!(result.model.len() < 10 + 4);
    assert_eq!(result.model.len() % 4, 0);
    for &idx in &result.model {
        for member in groups.expand(idx) {
            assert!(result.model.contains(member), "group of {idx} is split");
        }
    }
    assert_partition(&result, 200);
}

#[test]
fn kennard_stone_starts_from_the_supplied_seeds() {
    init_logging();
    let mut x = normal_cloud(100, 3, 17);
    let twins = [10, 20, 30, 40];
    for &row in &twins[1..] {
        let copy = x.row(twins[0]).to_owned();
        x.row_mut(row).assign(&copy);
    }
    let result = kennard_stone(x.view(), &KennardStoneOptions::new(12), None, Some(&twins)).unwrap();

    assert_eq!(&result.model[..4], &twins);
    assert_eq!(result.model.len(), 12);
    assert_partition(&result, 100);
}

#[test]
fn mahalanobis_selection_ignores_column_units() {
    init_logging();
    let x = normal_cloud(150, 3, 23);
    let mut rescaled = x.clone();
    rescaled.column_mut(1).mapv_inplace(|v| v * 25.0);
    rescaled.column_mut(2).mapv_inplace(|v| v * 0.1 + 7.0);

    let options = KennardStoneOptions::new(15);
    let original = kennard_stone(x.view(), &options, None, None).unwrap();
    let converted = kennard_stone(rescaled.view(), &options, None, None).unwrap();
    assert_eq!(original.model, converted.model);
    assert_eq!(original.pc.unwrap().n_components(), 3);
}

#[test]
fn duplex_builds_two_disjoint_sets() {
    init_logging();
    let x = normal_cloud(1000, 2, 42);
    let options = DuplexOptions::new(15).with_metric(Metric::Euclidean);
    let result = duplex(x.view(), &options, None).unwrap();

    assert_eq!(result.model.len(), 15);
    assert_eq!(result.test.len(), 15);
    assert_eq!(result.unassigned.len(), 970);
    assert!(result.model.iter().all(|idx| !result.test.contains(idx)));

    let mut all: Vec<usize> = result
        .model
        .iter()
        .chain(&result.test)
        .chain(&result.unassigned)
        .copied()
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..1000).collect::<Vec<_>>());

    // Both sets are built by the same max-min rule, so their internal
    // spacing should be of the same order.
    let model_spacing = min_spacing(x.view(), &result.model);
    let test_spacing = min_spacing(x.view(), &result.test);
    assert!(model_spacing > 0.0 && test_spacing > 0.0);
    assert!(
        model_spacing >= 0.5 * test_spacing,
        "model spacing {model_spacing:.4} vs test spacing {test_spacing:.4}"
    );
    assert!(
        test_spacing >= 0.5 * model_spacing,
        "test spacing {test_spacing:.4} vs model spacing {model_spacing:.4}"
    );
}

#[test]
fn every_selector_partitions_the_rows() {
    init_logging();
    let x = normal_cloud(120, 4, 31);

    let ks = kennard_stone(x.view(), &KennardStoneOptions::new(10), None, None).unwrap();
    assert_partition(&ks, 120);

    let trace = puchwein(x.view(), &PuchweinOptions::default()).unwrap();
    assert!(!trace.passes.is_empty());
    for index in 0..trace.passes.len() {
        assert_partition(&trace.selection(index).unwrap(), 120);
    }

    let sw = shenk_west(x.view(), &ShenkWestOptions::default()).unwrap();
    assert!(!sw.selection.model.is_empty());
    assert_partition(&sw.selection, 120);

    let mut rng = StdRng::seed_from_u64(3);
    let positive = Uniform::new(0.05, 1.0);
    let spectra = Array2::from_shape_fn((120, 16), |_| positive.sample(&mut rng));
    let hs = honigs(spectra.view(), &HonigsOptions::new(6)).unwrap();
    assert_eq!(hs.selection.model.len(), 6);
    assert_partition(&hs.selection, 120);

    let mut naes_options = NaesOptions::new(8);
    naes_options.components = Some(ComponentSpec::Fraction(0.9));
    let ns = naes(x.view(), &naes_options).unwrap();
    assert!(ns.selection.model.len() <= 8);
    assert_partition(&ns.selection, 120);
}

#[test]
fn labeled_matrix_feeds_the_selectors() {
    init_logging();
    let x = normal_cloud(40, 3, 13);
    let names: Vec<String> = (0..40).map(|i| format!("sample-{i:02}")).collect();
    let labeled = LabeledMatrix::new(x.clone()).with_row_names(names).unwrap();

    let from_labeled =
        kennard_stone(labeled.view(), &KennardStoneOptions::new(6), None, None).unwrap();
    let from_plain = kennard_stone(x.view(), &KennardStoneOptions::new(6), None, None).unwrap();
    assert_eq!(from_labeled.model, from_plain.model);

    let row_names = labeled.row_names().unwrap();
    let picked: Vec<&str> = from_labeled
        .model
        .iter()
        .map(|&idx| row_names[idx].as_str())
        .collect();
    assert!(picked.iter().all(|name| name.starts_with("sample-")));
}
