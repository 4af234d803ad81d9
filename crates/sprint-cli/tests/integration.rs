#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn sprint(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sprint").unwrap();
    cmd.current_dir(dir.path())
        .env("SPRINT_ROOT", dir.path())
        .env_remove("LM_STUDIO_URL")
        .env_remove("MODEL_NAME");
    cmd
}

fn init_project(dir: &TempDir) {
    sprint(dir).arg("init").assert().success();
}

/// Run with `--json` and parse stdout.
fn json(dir: &TempDir, args: &[&str]) -> Value {
    let out = sprint(dir)
        .arg("--json")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).unwrap()
}

fn create_story(dir: &TempDir, title: &str, points: Option<&str>) -> String {
    let mut args = vec!["story", "create", title, "-d", "As a user I want it"];
    if let Some(p) = points {
        args.extend(["--points", p]);
    }
    json(dir, &args)["id"].as_str().unwrap().to_string()
}

fn create_sprint(dir: &TempDir, name: &str) -> String {
    json(
        dir,
        &["sprint", "create", name, "--start", "2024-01-01", "--capacity", "20"],
    )["id"]
        .as_str()
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// sprint init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_data_files() {
    let dir = TempDir::new().unwrap();
    sprint(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .sprint/config.yaml"));

    assert!(dir.path().join(".sprint/config.yaml").exists());
    for file in ["stories", "sprints", "activities", "standups", "retrospectives", "burndown"] {
        let path = dir.path().join(format!(".sprint/data/{file}.json"));
        let v: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(v["version"], 1);
        assert_eq!(v["records"], serde_json::json!([]));
    }
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    sprint(&dir).arg("init").assert().success();
    sprint(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .sprint/config.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    sprint(&dir)
        .args(["story", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// ---------------------------------------------------------------------------
// stories
// ---------------------------------------------------------------------------

#[test]
fn story_create_list_show() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let id = create_story(&dir, "Login flow", None);
    sprint(&dir)
        .args(["story", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Login flow"))
        .stdout(predicate::str::contains("Not estimated"));

    let story = json(&dir, &["story", "show", &id]);
    assert_eq!(story["status"], "Backlog");
    assert_eq!(story["priority"], "Medium");
}

#[test]
fn story_create_rejects_invalid_input() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    sprint(&dir)
        .args(["story", "create", "No description"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("description is required"));
    sprint(&dir)
        .args(["story", "create", "Huge", "-d", "x", "--points", "500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("story points"));
}

#[test]
fn story_status_filter_and_comment() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let a = create_story(&dir, "Alpha", Some("3"));
    create_story(&dir, "Beta", Some("2"));

    sprint(&dir).args(["story", "status", &a, "in-progress"]).assert().success();
    let in_progress = json(&dir, &["story", "list", "--status", "In Progress"]);
    assert_eq!(in_progress.as_array().unwrap().len(), 1);
    assert_eq!(in_progress[0]["title"], "Alpha");

    let c = json(&dir, &["story", "comment", &a, "needs", "review", "--author", "sam"]);
    assert_eq!(c["comment_id"], "C1");
    let story = json(&dir, &["story", "show", &a]);
    assert_eq!(story["comments"][0]["body"], "needs review");
}

#[test]
fn uncomment_removes_only_that_comment() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let a = create_story(&dir, "Alpha", None);
    json(&dir, &["story", "comment", &a, "first"]);
    json(&dir, &["story", "comment", &a, "second"]);

    let out = json(&dir, &["story", "uncomment", &a, "C1"]);
    assert_eq!(out["removed"], true);
    let story = json(&dir, &["story", "show", &a]);
    let comments = story["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], "C2");

    sprint(&dir)
        .args(["story", "uncomment", &a, "C1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("comment 'C1' not found"));
}

#[test]
fn unknown_story_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    sprint(&dir)
        .args(["story", "status", "nope1234", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("story not found: nope1234"));
}

// ---------------------------------------------------------------------------
// sprints
// ---------------------------------------------------------------------------

#[test]
fn login_flow_scenario() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let sprint_id = create_sprint(&dir, "Sprint-1");
    let shown = json(&dir, &["sprint", "show", &sprint_id]);
    assert_eq!(shown["sprint"]["end_date"], "2024-01-15");

    let story = create_story(&dir, "Login flow", None);
    json(&dir, &["sprint", "add-story", &sprint_id, &story]);
    sprint(&dir).args(["sprint", "activate", &sprint_id]).assert().success();
    sprint(&dir)
        .args(["story", "update", &story, "--points", "5"])
        .assert()
        .success();

    for status in ["todo", "in-progress", "done"] {
        sprint(&dir).args(["story", "status", &story, status]).assert().success();
    }
    let s = json(&dir, &["sprint", "show", &sprint_id]);
    assert_eq!(s["sprint"]["completed_points"], 5.0);

    sprint(&dir).args(["story", "status", &story, "in-review"]).assert().success();
    let s = json(&dir, &["sprint", "show", &sprint_id]);
    assert_eq!(s["sprint"]["completed_points"], 0.0);
    assert_eq!(s["sprint"]["total_points"], 0.0);
}

#[test]
fn reestimating_done_story_keeps_progress_non_negative() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let sprint_id = create_sprint(&dir, "Sprint-1");
    let story = create_story(&dir, "Checkout", Some("5"));
    json(&dir, &["sprint", "add-story", &sprint_id, &story]);
    sprint(&dir).args(["sprint", "activate", &sprint_id]).assert().success();
    sprint(&dir).args(["story", "status", &story, "done"]).assert().success();

    let updated = json(&dir, &["story", "update", &story, "--points", "8"]);
    assert_eq!(updated["story_points"], 8.0);
    let s = json(&dir, &["sprint", "show", &sprint_id]);
    assert_eq!(s["sprint"]["completed_points"], 8.0);

    sprint(&dir).args(["story", "status", &story, "todo"]).assert().success();
    let s = json(&dir, &["sprint", "show", &sprint_id]);
    assert_eq!(s["sprint"]["completed_points"], 0.0);
}

#[test]
fn add_story_twice_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let sprint_id = create_sprint(&dir, "S");
    let story = create_story(&dir, "A", Some("3"));

    assert_eq!(json(&dir, &["sprint", "add-story", &sprint_id, &story])["added"], true);
    assert_eq!(json(&dir, &["sprint", "add-story", &sprint_id, &story])["added"], false);
    let s = json(&dir, &["sprint", "show", &sprint_id]);
    assert_eq!(s["sprint"]["total_points"], 3.0);
    assert_eq!(s["sprint"]["stories"].as_array().unwrap().len(), 1);
}

#[test]
fn activating_second_sprint_completes_first() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let first = create_sprint(&dir, "First");
    let second = create_sprint(&dir, "Second");

    sprint(&dir).args(["sprint", "activate", &first]).assert().success();
    let out = json(&dir, &["sprint", "activate", &second]);
    assert_eq!(out["completed_previous"], first.as_str());

    let sprints = json(&dir, &["sprint", "list"]);
    let statuses: Vec<&str> = sprints
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["Completed", "Active"]);

    sprint(&dir)
        .args(["sprint", "activate", &first])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transition"));
}

#[test]
fn progress_of_empty_sprint_is_zero() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = create_sprint(&dir, "Empty");
    let p = json(&dir, &["sprint", "progress", &id]);
    assert_eq!(p["progress_percentage"], 0.0);
    assert_eq!(p["stories_count"], 0);
}

#[test]
fn velocity_without_completed_sprints() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create_sprint(&dir, "Planning only");
    let v = json(&dir, &["sprint", "velocity"]);
    assert_eq!(v["trend"], "No data");
    assert_eq!(v["average"], 0.0);
}

#[test]
fn burndown_lists_ideal_line() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = create_sprint(&dir, "S");
    let b = json(&dir, &["sprint", "burndown", &id]);
    assert_eq!(b["days_in_sprint"], 14);
    assert_eq!(b["ideal_line"].as_array().unwrap().len(), 15);
}

// ---------------------------------------------------------------------------
// standups, retros, activity
// ---------------------------------------------------------------------------

#[test]
fn standup_add_and_show() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    sprint(&dir)
        .args([
            "standup", "add", "--member", "alice", "--today", "API", "--blockers", "CI down",
            "--date", "2024-03-04",
        ])
        .assert()
        .success();
    sprint(&dir)
        .args(["standup", "show", "--date", "2024-03-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice: CI down"));
    sprint(&dir)
        .args(["standup", "show", "--date", "2024-03-05"])
        .assert()
        .failure();
}

#[test]
fn retro_items_votes_and_actions() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = create_sprint(&dir, "Sprint-9");

    sprint(&dir).args(["retro", "add", &id, "went-well", "pairing"]).assert().success();
    sprint(&dir).args(["retro", "vote", &id, "went-well", "1"]).assert().success();
    sprint(&dir)
        .args(["retro", "add", &id, "action", "fix", "CI", "--owner", "bob"])
        .assert()
        .success();
    sprint(&dir).args(["retro", "mood", &id, "9"]).assert().failure();

    let retro = json(&dir, &["retro", "show", &id]);
    assert_eq!(retro["went_well"][0]["votes"], 1);
    assert_eq!(retro["team_mood"], 3);

    let open = json(&dir, &["retro", "actions"]);
    assert_eq!(open[0]["action"]["owner"], "bob");
    sprint(&dir)
        .args(["retro", "action-status", &id, "1", "done"])
        .assert()
        .success();
    assert!(json(&dir, &["retro", "actions"]).as_array().unwrap().is_empty());
}

#[test]
fn activity_log_is_newest_first() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create_story(&dir, "First", None);
    create_sprint(&dir, "Second");

    let log = json(&dir, &["activity", "--limit", "5"]);
    assert_eq!(log[0]["description"], "Created sprint: Second");
    assert_eq!(log[1]["description"], "Created story: First");
    assert_eq!(log[0]["type"], "Sprint");
}

#[test]
fn stats_without_active_sprint() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create_story(&dir, "One", None);
    sprint(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Active stories:     1"))
        .stdout(predicate::str::contains("No active sprint."));
}

#[test]
fn assist_status_reports_unreachable_endpoint() {
    let dir = TempDir::new().unwrap();
    let out = sprint(&dir)
        .env("LM_STUDIO_URL", "http://127.0.0.1:9")
        .args(["--json", "assist", "status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["available"], false);
    assert_eq!(v["base_url"], "http://127.0.0.1:9");
}

#[test]
fn config_validate_flags_zero_capacity() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    sprint(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));

    let path = dir.path().join(".sprint/config.yaml");
    let yaml = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, yaml.replace("default_capacity: 40", "default_capacity: 0")).unwrap();
    sprint(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] sprint.default_capacity must be positive"));
}
