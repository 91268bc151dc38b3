//! Integration tests for the alignops CLI.

use alignops::cli::{Cli, run_cli};
use alignops::exit_codes::ExitCode;
use clap::Parser;
use std::path::Path;
use tempfile::TempDir;

fn write_wav(path: &Path, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(16000.0 * seconds) as usize {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Audio and transcript directories with two good pairs and one orphan.
fn dataset() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("wav");
    let transcripts = dir.path().join("transcripts");
    std::fs::create_dir_all(&wav).unwrap();
    std::fs::create_dir_all(&transcripts).unwrap();

    write_wav(&wav.join("Utt1.wav"), 0.5);
    write_wav(&wav.join("utt2.wav"), 0.5);
    write_wav(&wav.join("orphan.wav"), 0.5);
    std::fs::write(transcripts.join("utt1.TXT"), "Hello there\n").unwrap();
    std::fs::write(transcripts.join("utt2.txt"), "  first line\n\nsecond line \n").unwrap();

    dir
}

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("alignops").chain(args.iter().copied()))
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn validate_succeeds_with_excluded_stems() {
    let dir = dataset();
    let wav = dir.path().join("wav");
    let transcripts = dir.path().join("transcripts");

    let code = run_cli(cli(&[
        "validate",
        "--audio-dir",
        path(&wav),
        "--transcript-dir",
        path(&transcripts),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
}

#[test]
fn validate_fails_without_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("wav");
    let transcripts = dir.path().join("transcripts");
    std::fs::create_dir_all(&wav).unwrap();
    std::fs::create_dir_all(&transcripts).unwrap();
    write_wav(&wav.join("a.wav"), 0.1);

    let result = run_cli(cli(&[
        "validate",
        "--audio-dir",
        path(&wav),
        "--transcript-dir",
        path(&transcripts),
    ]));

    assert!(result.is_err());
}

#[test]
fn prepare_writes_label_files_and_refuses_overwrite() {
    let dir = dataset();
    let wav = dir.path().join("wav");
    let transcripts = dir.path().join("transcripts");
    let out = dir.path().join("mfa_data");

    let args = [
        "prepare",
        "--audio-dir",
        path(&wav),
        "--transcript-dir",
        path(&transcripts),
        "-o",
        path(&out),
    ];

    assert_eq!(run_cli(cli(&args)).unwrap(), ExitCode::Success);

    assert!(out.join("Utt1.wav").exists());
    assert!(!out.join("orphan.wav").exists());
    let label = std::fs::read_to_string(out.join("utt2.lab")).unwrap();
    assert_eq!(label, "first line second line");

    // Second run needs --force
    assert!(run_cli(cli(&args)).is_err());

    let mut forced = args.to_vec();
    forced.push("--force");
    assert_eq!(run_cli(cli(&forced)).unwrap(), ExitCode::Success);
}

const TEXTGRID: &str = r#"File type = "ooTextFile"
Object class = "TextGrid"

xmin = 0
xmax = 1.0
tiers? <exists>
size = 2
item []:
    item [1]:
        class = "IntervalTier"
        name = "words"
        xmin = 0
        xmax = 1.0
        intervals: size = 2
        intervals [1]:
            xmin = 0
            xmax = 0.4
            text = ""
        intervals [2]:
            xmin = 0.4
            xmax = 1.0
            text = "hello"
    item [2]:
        class = "IntervalTier"
        name = "phones"
        xmin = 0
        xmax = 1.0
        intervals: size = 3
        intervals [1]:
            xmin = 0
            xmax = 0.4
            text = "sil"
        intervals [2]:
            xmin = 0.4
            xmax = 0.55
            text = "HH"
        intervals [3]:
            xmin = 0.55
            xmax = 1.0
            text = "AH"
"#;

#[test]
fn analyze_writes_reports_and_skips_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let grids = dir.path().join("output_textgrids");
    std::fs::create_dir_all(grids.join("speaker1")).unwrap();
    std::fs::write(grids.join("a.TextGrid"), TEXTGRID).unwrap();
    std::fs::write(grids.join("speaker1").join("b.TextGrid"), TEXTGRID).unwrap();
    std::fs::write(grids.join("broken.TextGrid"), "not a textgrid").unwrap();
    let reports = dir.path().join("reports");

    let code = run_cli(cli(&[
        "analyze",
        path(&grids),
        "--report-dir",
        path(&reports),
        "--jobs",
        "2",
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);

    let csv = std::fs::read_to_string(reports.join("report.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("stem,tier,start,end,label,duration"));
    // 2 files × (2 word + 3 phone) intervals
    assert_eq!(lines.count(), 10);
    assert!(csv.contains("a,phones,0.4000,0.5500,HH,0.1500"));
    assert!(!csv.contains("broken"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(reports.join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["tally"]["parsed"], 2);
    assert_eq!(summary["tally"]["analyzed"], 2);
    assert_eq!(summary["tally"]["errors"], 1);
    assert_eq!(summary["tiers"]["phones"]["labels"]["AH"]["count"], 2);
}

#[test]
fn analyze_fails_on_empty_directory() {
    let dir = tempfile::tempdir().unwrap();

    assert!(run_cli(cli(&["analyze", path(dir.path())])).is_err());
}

#[test]
#[ignore = "requires mfa with english_us_arpa models installed"]
fn run_aligns_and_analyzes() {
    let dir = dataset();
    let wav = dir.path().join("wav");
    let transcripts = dir.path().join("transcripts");
    let out = dir.path().join("aligned");

    let code = run_cli(cli(&[
        "run",
        "--audio-dir",
        path(&wav),
        "--transcript-dir",
        path(&transcripts),
        "--dataset-dir",
        path(&dir.path().join("mfa_data")),
        "-o",
        path(&out),
    ]))
    .unwrap();

    assert_ne!(code, ExitCode::GeneralError);
    assert!(out.join("report.csv").exists());
    assert!(out.join("summary.json").exists());
}

/// Stand-in for `mfa align <dataset> <dict> <acoustic> <output>`: copies
/// `template` to `<output>/<stem>.TextGrid` for every label except `skip`,
/// then exits with `code`.
#[cfg(unix)]
fn fake_mfa(dir: &Path, template: Option<&Path>, skip: &str, code: i32) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let copy = match template {
        Some(template) => format!("cp {template:?} \"$5/$stem.TextGrid\""),
        None => ":".to_string(),
    };
    let script = dir.join("fake-mfa");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\nmkdir -p \"$5\"\nfor lab in \"$2\"/*.lab; do\n  stem=$(basename \"$lab\" .lab)\n  [ \"$stem\" = \"{skip}\" ] && continue\n  {copy}\ndone\nexit {code}\n"
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[test]
fn run_reports_partial_aligner_failure() {
    let dir = dataset();
    let template = dir.path().join("template.TextGrid");
    std::fs::write(&template, TEXTGRID).unwrap();
    let mfa = fake_mfa(dir.path(), Some(&template), "utt2", 1);
    let out = dir.path().join("aligned");

    let code = run_cli(cli(&[
        "run",
        "--audio-dir",
        path(&dir.path().join("wav")),
        "--transcript-dir",
        path(&dir.path().join("transcripts")),
        "--dataset-dir",
        path(&dir.path().join("mfa_data")),
        "-o",
        path(&out),
        "--mfa-bin",
        path(&mfa),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::AlignerFailed);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["tally"]["found"], 2);
    assert_eq!(summary["tally"]["submitted"], 2);
    assert_eq!(summary["tally"]["aligned"], 1);
    assert_eq!(summary["tally"]["analyzed"], 1);
    assert_eq!(summary["tally"]["errors"], 1);
    assert!(out.join("alignops-mfa.log").exists());
}

#[cfg(unix)]
#[test]
fn align_without_outputs_fails() {
    let dir = dataset();
    let mfa = fake_mfa(dir.path(), None, "", 1);
    let dataset_dir = dir.path().join("mfa_data");

    let code = run_cli(cli(&[
        "prepare",
        "--audio-dir",
        path(&dir.path().join("wav")),
        "--transcript-dir",
        path(&dir.path().join("transcripts")),
        "-o",
        path(&dataset_dir),
    ]))
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let result = run_cli(cli(&[
        "align",
        "--dataset-dir",
        path(&dataset_dir),
        "-o",
        path(&dir.path().join("aligned")),
        "--mfa-bin",
        path(&mfa),
    ]));

    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn align_rerun_does_not_count_stale_annotations() {
    let dir = dataset();
    let template = dir.path().join("template.TextGrid");
    std::fs::write(&template, TEXTGRID).unwrap();
    let dataset_dir = dir.path().join("mfa_data");
    let out = dir.path().join("aligned");

    run_cli(cli(&[
        "prepare",
        "--audio-dir",
        path(&dir.path().join("wav")),
        "--transcript-dir",
        path(&dir.path().join("transcripts")),
        "-o",
        path(&dataset_dir),
    ]))
    .unwrap();
    std::fs::create_dir_all(&out).unwrap();
    std::fs::copy(&template, out.join("utt2.TextGrid")).unwrap();

    let mfa = fake_mfa(dir.path(), Some(&template), "utt2", 1);
    let code = run_cli(cli(&[
        "align",
        "--dataset-dir",
        path(&dataset_dir),
        "-o",
        path(&out),
        "--mfa-bin",
        path(&mfa),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::AlignerFailed);
    assert!(!out.join("utt2.TextGrid").exists());
}
