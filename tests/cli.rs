use std::io::Write;
use std::process::{Command, Output};

fn vq() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vocab-query"));
    cmd.env_remove("NO_COLOR");
    cmd
}

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/words.json");

fn run(args: &[&str]) -> Output {
    vq().args(args).output().expect("failed to run vocab-query")
}

/// Runs a query against the fixture collection at time 5000 and returns stdout.
fn filter(args: &[&str]) -> String {
    let mut all = vec!["--words", FIXTURE, "--now", "5000"];
    all.extend_from_slice(args);
    let out = run(&all);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn ids(stdout: &str) -> Vec<u64> {
    stdout.lines().map(|line| line.split('\t').next().unwrap().parse().unwrap()).collect()
}

// --- Printing compiled queries ---

#[test]
fn query_without_words_prints_sexpr() {
    let out = run(&["disp -> 'x'"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "(contains disp 'x')");
}

#[test]
fn juxtaposition_prints_like_infix() {
    let out = run(&["contains disp 'x'"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "(contains disp 'x')");
}

#[test]
fn emit_expanded() {
    let out = run(&["--simple", "neko", "--emit", "expanded"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("(or\n  (contains text 'neko')\n"), "got: {stdout}");
}

#[test]
fn emit_json_includes_type_and_signatures() {
    let out = run(&["now() + hour(1) > createTime", "--emit", "json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(v["type"], "Boolean");
    assert_eq!(v["root"]["function"], ">");
    assert_eq!(v["root"]["signature"], "Date => Date => Boolean");
    assert_eq!(v["root"]["args"][0]["signature"], "Date => Number => Date");
}

#[test]
fn blank_query_prints_nothing() {
    let out = run(&["   "]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
}

// --- Filtering a collection ---

#[test]
fn testable_filters_by_next_test_time() {
    assert_eq!(ids(&filter(&["testable"])), vec![1, 3, 4]);
}

#[test]
fn filter_output_has_id_disp_sub() {
    let stdout = filter(&["disp == '犬'"]);
    assert_eq!(stdout, "2\t犬\tいぬ\n");
}

#[test]
fn simple_mode_matches_through_kana() {
    assert_eq!(ids(&filter(&["--simple", "neko"])), vec![1, 4]);
    assert_eq!(ids(&filter(&["--simple", "Neko"])), vec![1, 4]);
    assert_eq!(ids(&filter(&["--simple", "勉"])), vec![3]);
}

#[test]
fn documents_are_searchable() {
    assert_eq!(ids(&filter(&["meaning -> 'dog'"])), vec![2]);
    assert_eq!(ids(&filter(&["sentence -> '好き'"])), vec![1]);
    assert_eq!(ids(&filter(&["doc -> 'suru'"])), Vec::<u64>::new());
    assert_eq!(ids(&filter(&["doc ->^ 'st'"])), vec![3]);
}

#[test]
fn sentences_show_referenced_words() {
    assert_eq!(ids(&filter(&["sentence ->^ '犬とねこ'"])), vec![4]);
    assert_eq!(ids(&filter(&["doc -> 'ねこは'"])), vec![4]);
    assert_eq!(ids(&filter(&["sentence -> '#'"])), Vec::<u64>::new());
}

#[test]
fn test_membership() {
    assert_eq!(ids(&filter(&["inTest (tests # 1)"])), vec![1, 3]);
    assert_eq!(ids(&filter(&["inTest (tests # 1) correct"])), vec![1]);
    assert_eq!(ids(&filter(&["inTest (tests # 2) wrong"])), vec![2]);
    assert_eq!(ids(&filter(&["inTest (tests # 9)"])), Vec::<u64>::new());
}

#[test]
fn dates_and_durations() {
    assert_eq!(ids(&filter(&["nextTestTime <- (now - 4500) .. (now - 2000)"])), vec![1, 3]);
    assert_eq!(ids(&filter(&["now - createTime >= 4800"])), vec![1, 3, 4]);
    assert_eq!(ids(&filter(&["lengthOf testRec > 1 & easiness >= 2.5"])), vec![1]);
}

#[test]
fn blank_query_keeps_every_word() {
    assert_eq!(ids(&filter(&[""])), vec![1, 2, 3, 4]);
}

#[test]
fn any_type_prints_values() {
    let stdout = filter(&["--any-type", "easiness * 2"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["1\t猫\t5", "2\t犬\t3.6", "3\t勉強\t2.6", "4\t猫舌\t4.2"]);
}

#[test]
fn json_filter_output() {
    let stdout = filter(&["--json", "easiness < 2"]);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let ids: Vec<u64> = v.as_array().unwrap().iter().map(|w| w["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(v[0]["mem"]["testAfter"], 9000000000000u64);
}

#[test]
fn collection_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"words": [{{"id": 7, "disp": "ねこ"}}, {{"id": 8, "disp": "いぬ"}}]}}"#).unwrap();
    let path = file.path().to_str().unwrap();
    let out = run(&["--words", path, "--now", "0", "disp -> (kana 'inu')"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "8\tいぬ\t\n");
}

// --- Errors ---

#[test]
fn compile_error_exits_nonzero_with_code() {
    let out = run(&["--no-color", "disp -> 'x"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("error[VQ-L003]: String not ended."), "got: {stderr}");
    assert!(stderr.contains("1 | disp -> 'x"), "got: {stderr}");
    assert!(!stderr.contains("\x1b["), "unexpected colour: {stderr}");
}

#[test]
fn no_color_env_is_honoured() {
    let out = vq().env("NO_COLOR", "1").arg("disp ->").output().unwrap();
    assert!(!out.status.success());
    assert!(!String::from_utf8_lossy(&out.stderr).contains("\x1b["));
}

#[test]
fn unknown_function_gets_suggestion() {
    let out = run(&["--no-color", "contains dsp 'x'"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("help: did you mean 'disp'?"), "got: {stderr}");
}

#[test]
fn json_errors() {
    let out = run(&["--json", "contains 1 'x'"]);
    assert!(!out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stderr).expect("valid JSON");
    assert_eq!(v["code"], "VQ-T001");
    assert_eq!(v["labels"][0]["start"], 0);
    assert_eq!(v["labels"][0]["end"], 14);
    assert_eq!(v["query"], "contains 1 'x'");
}

#[test]
fn non_boolean_rejected_unless_any_type() {
    let out = run(&["easiness"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("VQ-T004"));
    assert!(run(&["--any-type", "easiness"]).status.success());
}

#[test]
fn missing_collection_file() {
    let out = run(&["--words", "/nonexistent/words.json", "testable"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("could not read"));
}

#[test]
fn no_query_fails() {
    assert!(!run(&[]).status.success());
}

// --- Reference ---

#[test]
fn explain_known_code() {
    let out = run(&["--explain", "VQ-P002"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("operator without right operand"));
}

#[test]
fn explain_unknown_code() {
    assert!(!run(&["--explain", "VQ-Z000"]).status.success());
}

#[test]
fn functions_lists_signatures() {
    let out = run(&["--functions"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("contains, -> (infix, precedence 5)"), "got: {stdout}");
    assert!(stdout.contains("  :: List<String> => String => Boolean"));
    assert!(stdout.contains("kana\n  :: String => String"));
}
