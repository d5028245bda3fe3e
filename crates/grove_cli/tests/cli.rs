use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const SOURCE: &str = "https://example.com/reference";

fn grove(vault: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grove"))
        .arg("--vault")
        .arg(vault)
        .args(args)
        .env_remove("GROVE_LOG")
        .output()
        .expect("run grove")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// A standard note. `related` entries become wikilinks under Related Topics.
fn note(category: &str, title: &str, status: &str, examples: usize, related: &[&str]) -> String {
    let mut body = format!(
        "---\ntitle: {title}\ncategory: {category}\nkind: standard\ndifficulty: beginner\nstatus: {status}\ndate-created: 2024-01-01\ndate-updated: 2024-02-01\nsources:\n  - {SOURCE}\n---\n# {title}\n\n## Summary\n{title} explained briefly.\n\n## Examples\n"
    );
    for i in 0..examples {
        body.push_str(&format!("```python\nprint({i})\n```\n\n"));
    }
    body.push_str("## Related Topics\n");
    for target in related {
        body.push_str(&format!("- [[{target}]]\n"));
    }
    body.push_str(&format!("\n## References\n- {SOURCE}\n"));
    body
}

fn index(category: &str, body: &str) -> String {
    format!(
        "---\ntitle: {category}\ncategory: {category}\nkind: index\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n# {category}\n\n{body}\n"
    )
}

fn findings(output: &Output) -> Vec<Value> {
    let report: Value = serde_json::from_str(&stdout(output)).expect("json report");
    report["findings"].as_array().cloned().unwrap_or_default()
}

fn has(findings: &[Value], rule: &str, path: &str) -> bool {
    findings
        .iter()
        .any(|f| f["rule_id"] == rule && f["path"] == path)
}

#[test]
fn too_few_examples_is_a_warning() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 2, &[]));

    let output = grove(vault.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(2), "{}", stdout(&output));
    let text = stdout(&output);
    assert!(text.contains("schema/too-few-examples"));
    assert!(text.contains("\nConcepts/a.md\n"));
}

#[test]
fn dangling_link_warns_and_fails_in_strict_mode() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 3, &["B"]));

    let output = grove(vault.path(), &["--json", "validate"]);
    assert_eq!(output.status.code(), Some(2));
    let found = findings(&output);
    let dangling = found
        .iter()
        .find(|f| f["rule_id"] == "link/dangling")
        .expect("dangling finding");
    assert_eq!(dangling["path"], "Concepts/a.md");
    assert_eq!(dangling["evidence"]["target"], "B");
    assert_eq!(dangling["severity"], "warning");

    let strict = grove(vault.path(), &["--strict", "validate"]);
    assert_eq!(strict.status.code(), Some(1));
}

#[test]
fn missing_backlink_is_attached_to_the_target() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 3, &["b"]));
    write(vault.path(), "Concepts/b.md", &note("Concepts", "B", "seed", 3, &[]));

    let output = grove(vault.path(), &["--json", "validate"]);
    assert_eq!(output.status.code(), Some(2));
    let found = findings(&output);
    let backlink = found
        .iter()
        .find(|f| f["rule_id"] == "link/missing-backlink")
        .expect("backlink finding");
    assert_eq!(backlink["path"], "Concepts/b.md");
    assert_eq!(backlink["evidence"]["from"], "Concepts/a");
    assert!(!has(&found, "link/missing-backlink", "Concepts/a.md"));
}

fn algorithms_vault() -> TempDir {
    let vault = TempDir::new().unwrap();
    let category = "Concepts/Algorithms";
    let mut rows = String::new();
    for n in 1..=6 {
        let id = format!("{category}/a{n}");
        write(
            vault.path(),
            &format!("{id}.md"),
            &note(category, &format!("A{n}"), "seed", 3, &[]),
        );
        if n < 6 {
            rows.push_str(&format!("| [[{id}\\|A{n}]] | Beginner | Seed |\n"));
        }
    }
    let listing = format!(
        "<!-- grove:listing:start -->\n| Topic | Difficulty | Status |\n|---|---|---|\n{rows}<!-- grove:listing:end -->"
    );
    write(vault.path(), &format!("{category}/index.md"), &index(category, &listing));
    vault
}

#[test]
fn stale_index_names_the_missing_member() {
    let vault = algorithms_vault();
    let output = grove(vault.path(), &["reindex", "Concepts/Algorithms"]);
    assert_eq!(output.status.code(), Some(3));
    let text = stdout(&output);
    assert!(text.contains("drift=missing Concepts/Algorithms/a6"), "{text}");
    assert!(text.contains("| [[Concepts/Algorithms/a6\\|A6]] | Beginner | Seed |"));

    let validate = grove(vault.path(), &["--json", "validate"]);
    assert!(has(&findings(&validate), "index/stale", "Concepts/Algorithms/index.md"));
}

#[test]
fn applied_listing_reindexes_clean() {
    let vault = algorithms_vault();
    let applied = grove(vault.path(), &["apply-reindex", "Concepts/Algorithms"]);
    assert_eq!(applied.status.code(), Some(0), "{}", stdout(&applied));
    assert!(stdout(&applied).contains("written=true"));

    let again = grove(vault.path(), &["reindex", "Concepts/Algorithms"]);
    assert_eq!(again.status.code(), Some(0));
    assert!(stdout(&again).contains("drift=none"));

    let text = fs::read_to_string(vault.path().join("Concepts/Algorithms/index.md")).unwrap();
    assert!(text.contains("[[Concepts/Algorithms/a6\\|A6]]"));
    assert!(!text.contains("date-updated: 2024-01-01"));

    let noop = grove(vault.path(), &["apply-reindex", "Concepts/Algorithms"]);
    assert_eq!(noop.status.code(), Some(0));
    assert!(stdout(&noop).contains("written=false"));
}

#[test]
fn reindex_rejects_unknown_categories() {
    let vault = algorithms_vault();
    let output = grove(vault.path(), &["reindex", "Nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown category `Nope`"));
}

fn long_note(status: &str) -> String {
    let words = "lorem ".repeat(3200);
    note("Concepts", "Long", status, 4, &["Concepts/other"])
        .replace("Long explained briefly.", &words)
        .replace("## References", "> [!tip] Start small.\n\n> [!warning] Mind the edges.\n\n## References")
}

#[test]
fn seed_with_evergreen_content_gets_an_upgrade_suggestion() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/long.md", &long_note("seed"));

    let status = grove(vault.path(), &["status", "Concepts/long.md"]);
    assert_eq!(status.status.code(), Some(0));
    let text = stdout(&status);
    assert!(text.contains("stored=seed\n"));
    assert!(text.contains("suggested=evergreen\n"));
    assert!(text.contains("example_count=4\n"));

    let validate = grove(vault.path(), &["--json", "validate"]);
    let found = findings(&validate);
    let upgrade = found
        .iter()
        .find(|f| f["rule_id"] == "status/upgrade-available")
        .expect("upgrade finding");
    assert!(upgrade["message"].as_str().unwrap().contains("Evergreen"));
    assert_eq!(upgrade["severity"], "info");
}

#[test]
fn validate_output_is_byte_identical_across_runs() {
    let vault = algorithms_vault();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "growing", 1, &["B", "Algorithms/a1"]));

    let first = grove(vault.path(), &["validate"]);
    let second = grove(vault.path(), &["validate"]);
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(first.status.code(), second.status.code());

    let json_first = grove(vault.path(), &["--json", "validate"]);
    let json_second = grove(vault.path(), &["--json", "validate"]);
    assert_eq!(json_first.stdout, json_second.stdout);
    let report: Value = serde_json::from_str(&stdout(&json_first)).unwrap();
    assert_eq!(report["snapshot_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn single_file_reports_only_its_own_findings() {
    let vault = TempDir::new().unwrap();
    fs::create_dir_all(vault.path().join(".grove")).unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 3, &["b"]));
    write(vault.path(), "Concepts/b.md", &note("Concepts", "B", "seed", 1, &[]));

    let output = Command::new(env!("CARGO_BIN_EXE_grove"))
        .arg("validate")
        .arg(vault.path().join("Concepts/b.md"))
        .output()
        .unwrap();
    let text = stdout(&output);
    assert!(text.contains("\nConcepts/b.md\n"), "{text}");
    assert!(!text.contains("\nConcepts/a.md\n"));
    assert!(text.contains("schema/too-few-examples"));
    assert!(text.contains("link/missing-backlink"));
}

#[test]
fn single_file_without_config_finds_the_vault_from_its_category() {
    let tmp = TempDir::new().unwrap();
    let vault = tmp.path().join("notes");
    write(&vault, "Concepts/a.md", &note("Concepts", "A", "seed", 3, &["b"]));
    write(&vault, "Concepts/b.md", &note("Concepts", "B", "seed", 3, &["a"]));
    write(&vault, "Concepts/index.md", &index("Concepts", "- [[a]]\n- [[b]]"));
    let elsewhere = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_grove"))
        .current_dir(elsewhere.path())
        .arg("validate")
        .arg(vault.join("Concepts/a.md"))
        .output()
        .unwrap();
    let text = stdout(&output);
    assert!(text.contains("documents=1 "), "{text}");
    assert!(!text.contains("schema/category-mismatch"), "{text}");
    assert!(!text.contains("\na.md\n"), "{text}");

    let from_root = Command::new(env!("CARGO_BIN_EXE_grove"))
        .current_dir(&vault)
        .args(["validate", "Concepts/b.md"])
        .output()
        .unwrap();
    assert!(!stdout(&from_root).contains("schema/category-mismatch"));
}

#[test]
fn unreadable_vault_aborts_with_one_error() {
    let vault = TempDir::new().unwrap();
    let output = grove(&vault.path().join("missing"), &["validate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("vault unavailable"));
}

#[test]
fn timeout_still_reports_partial_results() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 3, &[]));
    let output = grove(vault.path(), &["--timeout-secs", "0", "validate"]);
    assert_eq!(output.status.code(), Some(2));
    let text = stdout(&output);
    assert!(text.contains("timed_out=true skipped=1"));
    assert!(text.contains("run/timed-out"));
}

#[test]
fn set_status_rewrites_frontmatter_only() {
    let vault = TempDir::new().unwrap();
    let original = note("Concepts", "A", "seed", 3, &[]);
    write(vault.path(), "Concepts/a.md", &original);

    let output = grove(
        vault.path(),
        &["set-status", "Concepts/a.md", "growing", "--reason", "reviewed"],
    );
    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));
    assert!(stdout(&output).contains("status=seed -> growing"));

    let text = fs::read_to_string(vault.path().join("Concepts/a.md")).unwrap();
    assert!(text.contains("status: growing\n"));
    assert!(!text.contains("date-updated: 2024-02-01"));
    let body = |t: &str| t.split_once("# A\n").map(|(_, b)| b.to_string());
    assert_eq!(body(&text), body(&original));

    let rejected = grove(vault.path(), &["set-status", "Concepts/a.md", "mature"]);
    assert_eq!(rejected.status.code(), Some(1));
    assert_eq!(fs::read_to_string(vault.path().join("Concepts/a.md")).unwrap(), text);
}

#[test]
fn usage_errors_exit_1_and_help_exits_0() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 3, &[]));

    let typo = grove(vault.path(), &["validate", "--strct"]);
    assert_eq!(typo.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&typo.stderr).contains("--strct"));

    let help = grove(vault.path(), &["validate", "--help"]);
    assert_eq!(help.status.code(), Some(0));
    assert!(stdout(&help).contains("Usage"));
}

#[test]
fn remove_unlinks_references_and_refreshes_the_index() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "Concepts/a.md", &note("Concepts", "A", "seed", 3, &["b|Bee"]));
    write(vault.path(), "Concepts/b.md", &note("Concepts", "B", "seed", 3, &["a"]));
    write(vault.path(), "Concepts/index.md", &index("Concepts", "Overview."));
    let applied = grove(vault.path(), &["apply-reindex", "Concepts"]);
    assert_eq!(applied.status.code(), Some(0));

    let output = grove(vault.path(), &["remove", "Concepts/b.md"]);
    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));
    let text = stdout(&output);
    assert!(text.contains("removed=Concepts/b.md\n"));
    assert!(text.contains("unlinked=1 in 1 document(s)\n"));
    assert!(text.contains("reindexed=Concepts/index.md\n"));

    assert!(!vault.path().join("Concepts/b.md").exists());
    let a = fs::read_to_string(vault.path().join("Concepts/a.md")).unwrap();
    assert!(a.contains("- Bee\n"));
    assert!(!a.contains("[[b"));
    let idx = fs::read_to_string(vault.path().join("Concepts/index.md")).unwrap();
    assert!(!idx.contains("Concepts/b"));
    assert!(idx.contains("[[Concepts/a\\|A]]"));

    let after = grove(vault.path(), &["--json", "validate"]);
    let found = findings(&after);
    assert!(!found.iter().any(|f| f["rule_id"] == "link/dangling"));
    assert!(!found.iter().any(|f| f["rule_id"] == "index/stale"));
}
