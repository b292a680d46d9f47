use std::collections::HashSet;
use std::fs;

use galaxy::{
    Color, GalaxyConfig, GalaxyPoint, MessageRecord, Mode, Pipeline, SemanticConfig, SpatialPoint,
};

fn record(id: &str, text: String) -> MessageRecord {
    MessageRecord {
        id: id.into(),
        conversation_id: None,
        conversation_title: format!("Conversation {id}"),
        text,
        created_at: Some(1_700_000_000.0),
    }
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

fn radius(p: &GalaxyPoint) -> f64 {
    SpatialPoint::new(p.x, p.y, p.z).radius()
}

const FRUIT: [&str; 6] = ["apple", "banana", "cherry", "grape", "melon", "peach"];
const ENGINE: [&str; 6] = ["piston", "turbine", "gearbox", "valve", "crankshaft", "exhaust"];

fn two_topic_records(per_group: usize) -> Vec<MessageRecord> {
    let mut records = Vec::new();
    for i in 0..per_group {
        let fruit = format!(
            "apple banana cherry grape melon peach {}",
            FRUIT[i % FRUIT.len()]
        );
        let engine = format!(
            "piston turbine gearbox valve crankshaft exhaust {}",
            ENGINE[i % ENGINE.len()]
        );
        records.push(record(&format!("fruit-{i}"), fruit));
        records.push(record(&format!("engine-{i}"), engine));
    }
    records
}

fn semantic_config() -> GalaxyConfig {
    let mut cfg = GalaxyConfig::default();
    cfg.semantic = SemanticConfig::stub(64);
    cfg.reduction.n_neighbors = 5;
    cfg.reduction.n_epochs = Some(200);
    cfg.clustering.num_clusters = 2;
    cfg
}

#[tokio::test]
async fn procedural_end_to_end_three_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("messages.json");
    let output = dir.path().join("public/galaxy_data.json");
    let records = vec![
        record("short", words(10)),
        record("medium", words(50)),
        record("long", words(200)),
    ];
    fs::write(&input, serde_json::to_vec(&records).unwrap()).unwrap();

    let mut cfg = GalaxyConfig::default()
        .with_mode(Mode::Procedural)
        .with_seed(42)
        .with_paths(&input, &output);
    cfg.shell.base_radius = 90.0;
    cfg.shell.shell_thickness = 60.0;

    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let outcome = pipeline.build(&input, &output).await.unwrap();
    assert_eq!(outcome.export.points, 3);

    let written: Vec<GalaxyPoint> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, outcome.build.points);

    let ids: Vec<_> = written.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["short", "medium", "long"]);
    let sizes: Vec<_> = written.iter().map(|p| p.size).collect();
    assert_eq!(sizes, [8.0, 12.0, 16.0]);

    let palette: HashSet<Color> = cfg.palette().unwrap().colors().iter().cloned().collect();
    for p in &written {
        let r = radius(p);
        assert!((90.0 - 1e-9..=150.0 + 1e-9).contains(&r), "radius {r}");
        assert!(palette.contains(&p.color));
        assert_eq!(p.timestamp, Some(1_700_000_000.0));
        assert_eq!(p.title, format!("Conversation {}", p.id));
    }
}

#[tokio::test]
async fn output_json_has_expected_keys() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("galaxy.json");
    let cfg = GalaxyConfig::default().with_mode(Mode::Procedural);
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let build = pipeline
        .run(&[record("only", "just one message".into())])
        .await
        .unwrap();
    pipeline.write(&build, &output).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let obj = value[0].as_object().unwrap();
    let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["color", "id", "size", "text", "timestamp", "title", "x", "y", "z"]
    );
}

#[tokio::test]
async fn semantic_stub_run_is_normalized_and_bounded() {
    let cfg = semantic_config();
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let records = two_topic_records(10);

    let build = pipeline.run(&records).await.unwrap();
    assert_eq!(build.points.len(), records.len());
    for (point, rec) in build.points.iter().zip(&records) {
        assert_eq!(point.id, rec.id);
        for v in [point.x, point.y, point.z] {
            assert!((-100.0..=100.0).contains(&v), "coordinate {v}");
        }
    }

    let report = build.normalization.expect("learned layout is normalized");
    assert!(report.degenerate_axes.is_empty());
    let axes: [fn(&GalaxyPoint) -> f64; 3] = [|p| p.x, |p| p.y, |p| p.z];
    for axis in axes {
        let values: Vec<f64> = build.points.iter().map(axis).collect();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!((min + 100.0).abs() < 1e-9, "min {min}");
        assert!((max - 100.0).abs() < 1e-9, "max {max}");
    }
}

#[tokio::test]
async fn semantic_stub_run_colors_topics_apart() {
    let cfg = semantic_config();
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let records = two_topic_records(10);
    let build = pipeline.run(&records).await.unwrap();

    let color_of = |prefix: &str| -> HashSet<Color> {
        build
            .points
            .iter()
            .filter(|p| p.id.starts_with(prefix))
            .map(|p| p.color.clone())
            .collect()
    };
    let fruit = color_of("fruit-");
    let engine = color_of("engine-");
    assert_eq!(fruit.len(), 1);
    assert_eq!(engine.len(), 1);
    assert_ne!(fruit, engine);

    let mut sizes: Vec<_> = build.clusters.iter().map(|c| c.size).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, [10, 10]);
}

#[tokio::test]
async fn semantic_layout_keeps_topics_apart() {
    let cfg = semantic_config();
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let records = two_topic_records(10);
    let build = pipeline.run(&records).await.unwrap();

    let centroid = |prefix: &str| -> [f64; 3] {
        let group: Vec<_> = build
            .points
            .iter()
            .filter(|p| p.id.starts_with(prefix))
            .collect();
        let n = group.len() as f64;
        [
            group.iter().map(|p| p.x).sum::<f64>() / n,
            group.iter().map(|p| p.y).sum::<f64>() / n,
            group.iter().map(|p| p.z).sum::<f64>() / n,
        ]
    };
    let spread = |prefix: &str, c: [f64; 3]| -> f64 {
        let group: Vec<_> = build
            .points
            .iter()
            .filter(|p| p.id.starts_with(prefix))
            .collect();
        group
            .iter()
            .map(|p| SpatialPoint::new(p.x - c[0], p.y - c[1], p.z - c[2]).radius())
            .sum::<f64>()
            / group.len() as f64
    };

    let a = centroid("fruit-");
    let b = centroid("engine-");
    let gap = SpatialPoint::new(a[0] - b[0], a[1] - b[1], a[2] - b[2]).radius();
    let within = spread("fruit-", a).max(spread("engine-", b));
    assert!(gap > within, "gap {gap} within {within}");
}

const VOCAB: [&str; 24] = [
    "orbit", "nebula", "comet", "quasar", "pulsar", "meteor", "galaxy", "photon", "plasma",
    "gravity", "eclipse", "zenith", "aurora", "crater", "lunar", "solar", "vector", "tensor",
    "kernel", "buffer", "socket", "thread", "parser", "lexer",
];

fn scattered_records(n: usize, seed: u64) -> Vec<MessageRecord> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n)
        .map(|i| {
            let text = (0..6)
                .map(|_| VOCAB[rng.usize(..VOCAB.len())])
                .collect::<Vec<_>>()
                .join(" ");
            record(&format!("m{i}"), text)
        })
        .collect()
}

/// Mean distance from the build centroid over the points whose id is in `ids`.
fn spread_of(points: &[GalaxyPoint], ids: &HashSet<String>) -> f64 {
    let n = points.len() as f64;
    let c = [
        points.iter().map(|p| p.x).sum::<f64>() / n,
        points.iter().map(|p| p.y).sum::<f64>() / n,
        points.iter().map(|p| p.z).sum::<f64>() / n,
    ];
    let picked: Vec<_> = points.iter().filter(|p| ids.contains(&p.id)).collect();
    picked
        .iter()
        .map(|p| SpatialPoint::new(p.x - c[0], p.y - c[1], p.z - c[2]).radius())
        .sum::<f64>()
        / picked.len() as f64
}

#[tokio::test]
async fn semantic_layout_does_not_depend_on_input_order() {
    let mut cfg = semantic_config();
    cfg.reduction.n_neighbors = 10;
    cfg.clustering.num_clusters = 4;
    let pipeline = Pipeline::from_config(&cfg).unwrap();

    let records = scattered_records(60, 11);
    let mut reversed = records.clone();
    reversed.reverse();

    let forward = pipeline.run(&records).await.unwrap();
    let backward = pipeline.run(&reversed).await.unwrap();

    let ids = |range: std::ops::Range<usize>| -> HashSet<String> {
        records[range].iter().map(|r| r.id.clone()).collect()
    };
    let early = ids(0..15);
    let late = ids(45..60);

    let balance = spread_of(&forward.points, &early) / spread_of(&forward.points, &late);
    assert!((0.5..2.0).contains(&balance), "early/late spread {balance}");

    let moved = spread_of(&forward.points, &late) / spread_of(&backward.points, &late);
    assert!((0.5..2.0).contains(&moved), "late spread forward/reversed {moved}");

    let all: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
    let last: HashSet<String> = ids(59..60);
    assert!(spread_of(&forward.points, &last) > 0.2 * spread_of(&forward.points, &all));
}

#[tokio::test]
async fn procedural_colors_do_not_follow_shell_radius() {
    let cfg = GalaxyConfig::default().with_mode(Mode::Procedural);
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    let records: Vec<_> = (0..300).map(|i| record(&format!("p{i}"), words(5))).collect();
    let build = pipeline.run(&records).await.unwrap();

    let palette = cfg.palette().unwrap();
    let colors = palette.colors();
    let (base, thickness) = (cfg.shell.base_radius, cfg.shell.shell_thickness);
    let bucket = |p: &GalaxyPoint| -> Color {
        let t = ((radius(p) - base) / thickness).clamp(0.0, 1.0 - 1e-12);
        colors[(t * colors.len() as f64) as usize].clone()
    };

    // Each placement draws three values, so a shared generator would line
    // color 3i up with radius i.
    let aligned = (0..100)
        .filter(|&i| build.points[3 * i].color == bucket(&build.points[i]))
        .count();
    assert!(aligned < 40, "{aligned}/100 colors follow the radius draw");

    let same_index = build
        .points
        .iter()
        .filter(|p| p.color == bucket(p))
        .count();
    assert!(same_index < 120, "{same_index}/300 colors follow their own radius");
}
