// tests/pipeline_test.rs

use amr_figures::charts::Orientation;
use amr_figures::figures::{DRUG_CLASS, MECHANISM, MOLECULE_TYPE};
use amr_figures::{FigureConfig, FigurePipeline, FIGURES};
use std::fs;
use std::path::Path;

fn write_inputs(base: &Path) {
    fs::create_dir_all(base).expect("create base dir");
    fs::write(
        base.join("amr_by_molecule_type.tsv"),
        "plasmid\t4\nchromosome\t17\nunknown\t1\n",
    )
    .expect("write molecule types");
    fs::write(
        base.join("amr_by_drug_class.tsv"),
        "foo\t3\nbar\t7\naminoglycoside\tunknown\n",
    )
    .expect("write drug classes");
    fs::write(
        base.join("amr_by_mechanism.tsv"),
        "antibiotic efflux\t6\nantibiotic inactivation\t2\nantibiotic target alteration\t6\n",
    )
    .expect("write mechanisms");
}

fn test_config(base: &Path) -> FigureConfig {
    let mut config = FigureConfig::with_base_dir(base);
    config.dpi = 72.0;
    config
}

#[test]
fn full_run_writes_six_named_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let base = dir.path().join("summary");
    write_inputs(&base);
    let config = test_config(&base);

    let saved = FigurePipeline::run(&config).expect("pipeline");
    assert_eq!(saved.len(), FIGURES.len());

    let mut names: Vec<String> = fs::read_dir(base.join("figures"))
        .expect("figures dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "barcode04_amr_by_drug_class.pdf",
            "barcode04_amr_by_drug_class.png",
            "barcode04_amr_by_mechanism.pdf",
            "barcode04_amr_by_mechanism.png",
            "barcode04_amr_by_molecule_type.pdf",
            "barcode04_amr_by_molecule_type.png",
        ]
    );

    for figure in &saved {
        for path in figure.paths() {
            assert!(fs::metadata(path).expect("metadata").len() > 0);
        }
    }
}

#[test]
fn missing_input_directory_aborts_before_writing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let base = dir.path().join("does_not_exist");
    let config = test_config(&base);

    let err = FigurePipeline::run(&config).unwrap_err();
    assert!(err.is_input());
    assert!(!config.output_dir.exists());
}

#[test]
fn repeated_runs_produce_identical_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let base = dir.path().join("summary");
    write_inputs(&base);
    let config = test_config(&base);

    let first = FigurePipeline::run(&config).expect("first run");
    let first_bytes: Vec<Vec<u8>> = first
        .iter()
        .flat_map(|f| f.paths())
        .map(|p| fs::read(p).expect("read output"))
        .collect();

    let second = FigurePipeline::run(&config).expect("second run");
    let second_bytes: Vec<Vec<u8>> = second
        .iter()
        .flat_map(|f| f.paths())
        .map(|p| fs::read(p).expect("read output"))
        .collect();

    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn charts_follow_display_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let base = dir.path().join("summary");
    write_inputs(&base);
    let config = test_config(&base);

    let molecules = FigurePipeline::load_chart(&MOLECULE_TYPE, &config).expect("molecule chart");
    assert_eq!(molecules.orientation, Orientation::Vertical);
    assert_eq!(molecules.labels(), vec!["chromosome", "plasmid", "unknown"]);

    let drugs = FigurePipeline::load_chart(&DRUG_CLASS, &config).expect("drug chart");
    assert_eq!(drugs.orientation, Orientation::Horizontal);
    assert_eq!(drugs.counts(), vec![0, 3, 7]);
    let bar = drugs.position_of("bar").expect("bar");
    let foo = drugs.position_of("foo").expect("foo");
    assert!(bar > foo);
    assert_eq!(drugs.bars[drugs.position_of("aminoglycoside").expect("aminoglycoside")].count, 0);

    let mechanisms = FigurePipeline::load_chart(&MECHANISM, &config).expect("mechanism chart");
    // equal counts keep file order
    assert_eq!(
        mechanisms.labels(),
        vec![
            "antibiotic inactivation",
            "antibiotic efflux",
            "antibiotic target alteration"
        ]
    );
}

#[test]
fn many_mechanisms_grow_the_canvas() {
    let dir = tempfile::tempdir().expect("temp dir");
    let base = dir.path().join("summary");
    fs::create_dir_all(&base).expect("base dir");
    let rows: String = (0..40).map(|i| format!("mechanism {i}\t{i}\n")).collect();
    fs::write(base.join("amr_by_mechanism.tsv"), rows).expect("write mechanisms");
    let config = test_config(&base);

    let chart = FigurePipeline::load_chart(&MECHANISM, &config).expect("chart");
    assert_eq!(chart.bars.len(), 40);
    assert!(chart.size.height_in >= 14.0 - 1e-9);
    assert!(chart.size.height_in >= 4.0);

    let saved = FigurePipeline::run_figure(&MECHANISM, &config).expect("save");
    let png = image::open(&saved.png).expect("decode png");
    assert!(png.height() > png.width());
}
