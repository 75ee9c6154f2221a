//! Run every program in `demos/` and compare its output.
//!
//! Each `name.pseudo` is paired with `name.out` (expected output, one line per
//! emitted line) and optionally `name.in` (input lines fed to `get`).

use std::path::{Path, PathBuf};

use pseudo::host::ScriptedHost;
use pseudo::script::Interpreter;

fn demo_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("demos")
}

fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => s.lines().map(str::to_owned).collect(),
        Err(_) => Vec::new(),
    }
}

async fn run_demo(name: &str) -> Vec<String> {
    let dir = demo_dir();
    let src = std::fs::read_to_string(dir.join(format!("{name}.pseudo")))
        .unwrap_or_else(|e| panic!("cannot read demo {name}: {e}"));
    let mut host = ScriptedHost::with_inputs(read_lines(&dir.join(format!("{name}.in"))));
    if let Err(e) = Interpreter::new(&src).run(&mut host).await {
        panic!("{name}: {e}");
    }
    host.output
}

#[tokio::test]
async fn every_demo_matches_expected_output() {
    let mut names: Vec<String> = std::fs::read_dir(demo_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|x| x == "pseudo").unwrap_or(false))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    assert!(!names.is_empty(), "no demos found");

    let mut failures = Vec::new();
    for name in &names {
        let expected = read_lines(&demo_dir().join(format!("{name}.out")));
        let actual = run_demo(name).await;
        if actual != expected {
            failures.push(format!("{name}:\n    expected {expected:?}\n    got      {actual:?}"));
        }
    }
    if !failures.is_empty() {
        panic!("{} demos differ:\n  {}", failures.len(), failures.join("\n  "));
    }
}

#[tokio::test]
async fn grade_demo_prompts_once() {
    let src = std::fs::read_to_string(demo_dir().join("grade.pseudo")).unwrap();
    let mut host = ScriptedHost::with_inputs(["95"]);
    Interpreter::new(&src).run(&mut host).await.unwrap();
    assert_eq!(host.prompts, vec!["score"]);
    assert_eq!(host.output, vec!["A", "score was 95"]);
}

#[tokio::test]
async fn guess_demo_without_enough_input_fails() {
    let src = std::fs::read_to_string(demo_dir().join("guess.pseudo")).unwrap();
    let mut host = ScriptedHost::with_inputs(["1"]);
    let err = Interpreter::new(&src).run(&mut host).await.unwrap_err();
    assert!(!err.is_cancelled());
    assert_eq!(host.output, vec!["higher"]);
}
