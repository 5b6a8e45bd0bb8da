use serde_json::json;
use stream_window::{
    FeatureSelector, IntoObservation, PacingConfig, StreamConfig, Window, WindowConfig,
    WindowError, WindowStream,
};

/// Drain a list stream into (inputs, present targets)
fn drain<T: IntoObservation>(data: Vec<T>, config: WindowConfig) -> (Vec<Window>, Vec<Window>) {
    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for pair in WindowStream::from_list(data, config.into()) {
        let pair = pair.expect("window pair");
        inputs.push(pair.input.expect("emitted pairs always carry an input"));
        if let Some(target) = pair.target {
            targets.push(target);
        }
    }
    (inputs, targets)
}

fn ramp() -> Vec<f64> {
    (1..=9).map(f64::from).collect()
}

/// `[[x, x + 1]]` for x in 1..=9
fn offset_pairs() -> Vec<Vec<f64>> {
    (1..=9).map(|x| vec![x as f64, x as f64 + 1.0]).collect()
}

fn flat(rows: &[&[i32]]) -> Vec<Window> {
    rows.iter()
        .map(|r| Window::Flat(r.iter().map(|&v| v as f64).collect()))
        .collect()
}

fn nested(rows: &[&[&[i32]]]) -> Vec<Window> {
    rows.iter()
        .map(|w| {
            Window::Nested(
                w.iter()
                    .map(|step| step.iter().map(|&v| v as f64).collect())
                    .collect(),
            )
        })
        .collect()
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_one_variable() {
    let (inputs, targets) = drain(ramp(), WindowConfig::new(4, 2));
    assert_eq!(
        inputs,
        flat(&[
            &[1, 2, 3, 4],
            &[2, 3, 4, 5],
            &[3, 4, 5, 6],
            &[4, 5, 6, 7],
            &[5, 6, 7, 8],
            &[6, 7, 8, 9],
        ])
    );
    assert_eq!(targets, flat(&[&[5, 6], &[6, 7], &[7, 8], &[8, 9]]));
}

#[test]
fn test_multivariable() {
    let data: Vec<Vec<f64>> = (1..=9).map(|x| vec![x as f64, x as f64]).collect();
    let (inputs, targets) = drain(data, WindowConfig::new(4, 2));
    assert_eq!(
        inputs,
        nested(&[
            &[&[1, 1], &[2, 2], &[3, 3], &[4, 4]],
            &[&[2, 2], &[3, 3], &[4, 4], &[5, 5]],
            &[&[3, 3], &[4, 4], &[5, 5], &[6, 6]],
            &[&[4, 4], &[5, 5], &[6, 6], &[7, 7]],
            &[&[5, 5], &[6, 6], &[7, 7], &[8, 8]],
            &[&[6, 6], &[7, 7], &[8, 8], &[9, 9]],
        ])
    );
    assert_eq!(
        targets,
        nested(&[
            &[&[5, 5], &[6, 6]],
            &[&[6, 6], &[7, 7]],
            &[&[7, 7], &[8, 8]],
            &[&[8, 8], &[9, 9]],
        ])
    );
}

#[test]
fn test_multivariable_one_input() {
    let config = WindowConfig::new(4, 2).with_input(FeatureSelector::Single(0));
    let (inputs, targets) = drain(offset_pairs(), config);
    assert_eq!(
        inputs,
        nested(&[
            &[&[1], &[2], &[3], &[4]],
            &[&[2], &[3], &[4], &[5]],
            &[&[3], &[4], &[5], &[6]],
            &[&[4], &[5], &[6], &[7]],
            &[&[5], &[6], &[7], &[8]],
            &[&[6], &[7], &[8], &[9]],
        ])
    );
    assert_eq!(
        targets,
        nested(&[
            &[&[5, 6], &[6, 7]],
            &[&[6, 7], &[7, 8]],
            &[&[7, 8], &[8, 9]],
            &[&[8, 9], &[9, 10]],
        ])
    );
}

#[test]
fn test_multivariable_one_output() {
    let config = WindowConfig::new(4, 2).with_target(FeatureSelector::Single(0));
    let (inputs, targets) = drain(offset_pairs(), config);
    assert_eq!(inputs.len(), 6);
    assert_eq!(
        inputs[0],
        nested(&[&[&[1, 2], &[2, 3], &[3, 4], &[4, 5]]])[0]
    );
    assert_eq!(
        targets,
        nested(&[&[&[5], &[6]], &[&[6], &[7]], &[&[7], &[8]], &[&[8], &[9]]])
    );
}

#[test]
fn test_shift_one_variable() {
    let (inputs, targets) = drain(ramp(), WindowConfig::new(4, 2).with_shift(3));
    assert_eq!(inputs.len(), 6);
    assert_eq!(inputs[5], Window::Flat(vec![6.0, 7.0, 8.0, 9.0]));
    assert_eq!(targets, flat(&[&[7, 8], &[8, 9]]));
}

#[test]
fn test_shift_multivariable() {
    let (inputs, targets) = drain(offset_pairs(), WindowConfig::new(4, 2).with_shift(3));
    assert_eq!(inputs.len(), 6);
    assert_eq!(
        inputs[5],
        nested(&[&[&[6, 7], &[7, 8], &[8, 9], &[9, 10]]])[0]
    );
    assert_eq!(
        targets,
        nested(&[&[&[7, 8], &[8, 9]], &[&[8, 9], &[9, 10]]])
    );
}

#[test]
fn test_shift_multivariable_one_output() {
    let config = WindowConfig::new(4, 2)
        .with_shift(3)
        .with_target(FeatureSelector::Single(0));
    let (inputs, targets) = drain(offset_pairs(), config);
    assert_eq!(inputs.len(), 6);
    assert_eq!(targets, nested(&[&[&[7], &[8]], &[&[8], &[9]]]));
}

#[test]
fn test_unreachable_shift_emits_inputs_only() {
    let (inputs, targets) = drain(ramp(), WindowConfig::new(4, 2).with_shift(usize::MAX));
    assert_eq!(inputs.len(), 6);
    assert_eq!(inputs[0], Window::Flat(vec![1.0, 2.0, 3.0, 4.0]));
    assert!(targets.is_empty());
}

#[test]
fn test_subset_input_reorders_columns() {
    let data: Vec<Vec<f64>> = (1..=3).map(|x| vec![x as f64, x as f64 * 10.0, 0.0]).collect();
    let config = WindowConfig::new(2, 1).with_input(FeatureSelector::Subset(vec![1, 0]));
    let (inputs, _) = drain(data, config);
    assert_eq!(inputs, nested(&[&[&[10, 1], &[20, 2]], &[&[20, 2], &[30, 3]]]));
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[test]
fn test_window_lengths() {
    for (p, h, s) in [(1, 1, 0), (3, 2, 1), (5, 1, 4), (2, 6, 2)] {
        let data: Vec<f64> = (0..40).map(f64::from).collect();
        let (inputs, targets) = drain(data, WindowConfig::new(p, h).with_shift(s));
        assert!(inputs.iter().all(|w| w.len() == p));
        assert!(targets.iter().all(|w| w.len() == h));
        assert_eq!(inputs.len(), 40 - p + 1);
    }
}

#[test]
fn test_consecutive_inputs_overlap() {
    let (inputs, _) = drain(offset_pairs(), WindowConfig::new(4, 1));
    for pair in inputs.windows(2) {
        let (prev, next) = (pair[0].steps(), pair[1].steps());
        assert_eq!(prev[1..], next[..3]);
    }
}

#[test]
fn test_flattening_follows_first_observation() {
    let (scalar_inputs, _) = drain(ramp(), WindowConfig::new(2, 1));
    assert!(scalar_inputs.iter().all(|w| matches!(w, Window::Flat(_))));

    let (vector_inputs, _) = drain(offset_pairs(), WindowConfig::new(2, 1));
    assert!(vector_inputs.iter().all(|w| matches!(w, Window::Nested(_))));
}

#[test]
fn test_all_equals_full_subset() {
    let all = drain(offset_pairs(), WindowConfig::new(3, 2));
    let subset = drain(
        offset_pairs(),
        WindowConfig::new(3, 2)
            .with_input(FeatureSelector::Subset(vec![0, 1]))
            .with_target(FeatureSelector::Subset(vec![0, 1])),
    );
    assert_eq!(all, subset);
}

#[test]
fn test_deterministic_and_never_resurrects() {
    let first = drain(ramp(), WindowConfig::new(3, 2));
    let second = drain(ramp(), WindowConfig::new(3, 2));
    assert_eq!(first, second);

    let mut stream = WindowStream::from_list(ramp(), WindowConfig::new(3, 2).into());
    assert_eq!(stream.by_ref().count(), 7);
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
}

#[test]
fn test_short_source_yields_nothing() {
    let (inputs, targets) = drain(vec![1.0_f64, 2.0], WindowConfig::new(4, 2));
    assert!(inputs.is_empty());
    assert!(targets.is_empty());
}

#[test]
fn test_json_values_normalize_like_native() {
    let values = vec![json!(1), json!(2.0), json!(3), json!(4)];
    let native = vec![1.0_f64, 2.0, 3.0, 4.0];
    assert_eq!(
        drain(values, WindowConfig::new(2, 1)),
        drain(native, WindowConfig::new(2, 1))
    );
}

// =============================================================================
// BOUNDED AND LIVE SOURCES
// =============================================================================

#[test]
fn test_from_pairs_caps_at_n_instances() {
    let pairs = (1..).map(|x| (x as f64, Some(x as f64 * 2.0)));
    let mut config = StreamConfig::from(WindowConfig::new(2, 1));
    config.n_instances = 5;

    let mut stream = WindowStream::from_pairs(pairs, config);
    let emitted: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(emitted.len(), 4);
    assert_eq!(stream.stats().observations, 5);
}

#[test]
fn test_from_pairs_with_label_target() {
    let pairs = vec![json!([[1.0, 0.0], 10.0]), json!({"x": [2.0, 0.0], "y": 20.0})];
    let config = WindowConfig::new(1, 1)
        .with_shift(0)
        .with_target_source(stream_window::TargetSource::Label);
    let emitted: Vec<_> = WindowStream::from_pairs(pairs, config.into())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(emitted[1].target, Some(Window::Nested(vec![vec![20.0]])));
}

#[test]
fn test_from_pairs_rejects_bare_values() {
    let mut stream = WindowStream::from_pairs(vec![json!(1.0)], WindowConfig::new(1, 1).into());
    assert!(matches!(stream.next(), Some(Err(WindowError::Shape(_)))));
    assert!(stream.next().is_none());
}

#[test]
fn test_from_channel_with_producer_thread() {
    let (tx, rx) = tokio::sync::mpsc::channel::<f64>(2);
    let producer = std::thread::spawn(move || {
        for v in ramp() {
            tx.blocking_send(v).unwrap();
        }
    });

    let (inputs, targets): (Vec<_>, Vec<_>) =
        WindowStream::from_channel(rx, WindowConfig::new(4, 2).into())
            .map(|pair| pair.unwrap())
            .map(|pair| (pair.input, pair.target))
            .unzip();
    producer.join().unwrap();

    assert_eq!(inputs.len(), 6);
    assert_eq!(targets.into_iter().flatten().count(), 4);
}

#[test]
fn test_stall_ends_live_stream() {
    let (tx, rx) = tokio::sync::mpsc::channel::<f64>(4);
    tx.try_send(1.0).unwrap();

    let config = StreamConfig {
        pacing: PacingConfig {
            stream_period_ms: 0,
            timeout_ms: 50,
            poll_interval_ms: 5,
        },
        ..StreamConfig::from(WindowConfig::new(1, 1))
    };
    let mut stream = WindowStream::from_channel(rx, config);

    assert!(stream.next().unwrap().is_ok());
    let err = stream.next().unwrap().unwrap_err();
    assert!(err.is_stall());
    assert!(stream.next().is_none());
    drop(tx);
}
