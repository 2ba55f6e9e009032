use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const APPLICATION_FORM: &str = r#"<html><head><title>Apply: Rust Engineer</title></head><body>
<form id="application_form">
  <div class="field"><label for="first_name">First Name *</label><input id="first_name" name="job_application[first_name]" required></div>
  <div class="field"><label for="email">Email *</label><input id="email" type="email" required></div>
  <div class="field"><label for="q1">What is your favorite color?</label><input id="q1"></div>
  <fieldset>
    <legend>Will you now or in the future require visa sponsorship?</legend>
    <label><input type="radio" name="visa" value="1"> Yes</label>
    <label><input type="radio" name="visa" value="0"> No</label>
  </fieldset>
  <input type="submit" value="Submit Application">
</form>
</body></html>"#;

struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let env = Self {
            tmp: TempDir::new().expect("create temp dir"),
        };
        env.cmd()
            .args(["profile", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote starter profile"));
        env
    }

    fn dir(&self) -> &Path {
        self.tmp.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("autoapply");
        cmd.current_dir(self.tmp.path())
            .env_remove("AUTOAPPLY_PROFILE")
            .env_remove("AUTOAPPLY_ENV")
            .env("RUST_LOG", "warn");
        cmd
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}

#[test]
fn answers_salary_from_starter_profile() {
    let env = TestEnv::new();
    env.cmd()
        .args(["answer", "What is your desired salary?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("desired_salary: 150000"));
}

#[test]
fn unknown_question_has_no_answer() {
    let env = TestEnv::new();
    env.cmd()
        .args(["answer", "What is your favorite color?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No answer"));
}

#[test]
fn dropdown_answer_picks_exact_option() {
    let env = TestEnv::new();
    let profile = env.write(
        "male.yaml",
        "personal_info:\n  first_name: John\n  last_name: Roe\n  email: john@example.com\nequal_opportunity:\n  gender: Male\n",
    );

    let answer = env.run_json(&[
        "--profile",
        profile.to_str().unwrap(),
        "answer",
        "Gender",
        "--kind",
        "dropdown",
        "--option",
        "Select...",
        "--option",
        "Female",
        "--option",
        "Male",
    ]);
    assert_eq!(answer["field"], "gender");
    assert_eq!(answer["value"], "Male");
    assert_eq!(answer["option_index"], 2);
}

#[test]
fn invalid_profile_fails() {
    let env = TestEnv::new();
    let profile = env.write(
        "broken.yaml",
        "personal_info:\n  first_name: John\n  last_name: Roe\n  email: not-an-email\n",
    );
    env.cmd()
        .args(["--profile", profile.to_str().unwrap(), "answer", "email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("email is not valid"));
}

#[test]
fn init_refuses_to_overwrite() {
    let env = TestEnv::new();
    env.cmd().args(["profile", "init"]).assert().failure();
    env.cmd()
        .args(["profile", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn scan_and_plan_a_saved_form() {
    let env = TestEnv::new();
    let form = env.write("form.html", APPLICATION_FORM);
    let form = form.to_str().unwrap();

    let scan = env.run_json(&["scan", form]);
    assert_eq!(scan["title"], "Apply: Rust Engineer");
    assert_eq!(scan["fields"].as_array().unwrap().len(), 4);
    assert_eq!(scan["buttons"][0]["text"], "Submit Application");

    let plan = env.run_json(&["plan", form]);
    let filled: Vec<&str> = plan["filled"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        filled,
        vec![
            "First Name",
            "Email",
            "Will you now or in the future require visa sponsorship?"
        ]
    );
    assert_eq!(plan["filled"][2]["action"]["label"], "No");
    assert_eq!(plan["skipped"][0], "What is your favorite color?");
}

#[test]
fn walk_records_dry_runs_without_blocking() {
    let env = TestEnv::new();
    let form = env.write("form.html", APPLICATION_FORM);
    let form = form.to_str().unwrap();

    env.cmd()
        .args(["walk", "--record", form])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry_run"));

    assert!(env.dir().join("logs/events.jsonl").exists());

    let history = env.run_json(&["history"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["outcome"], "dry_run");

    // A dry run is not an application, so the job is still open.
    env.cmd()
        .args(["walk", "--record", form])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dry_run "))
        .stdout(predicate::str::contains("1 dry runs, 0 failed, 0 duplicates"));

    let history = env.run_json(&["history"]);
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[test]
fn builds_search_url() {
    let env = TestEnv::new();
    env.cmd()
        .args([
            "search-url",
            "Creative Director",
            "--location",
            "New York",
            "--page",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "keywords=Creative+Director&location=New+York&f_AL=true&start=25",
        ));
}

#[test]
fn lists_jobs_from_saved_results() {
    let env = TestEnv::new();
    let results = env.write(
        "results.html",
        r#"<ul>
          <li data-occludable-job-id="111"><a class="job-card-list__title">Creative Director</a></li>
          <li data-occludable-job-id="222"><a class="job-card-list__title">Art Director</a></li>
        </ul>"#,
    );
    env.cmd()
        .args(["jobs", results.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://www.linkedin.com/jobs/view/111/"))
        .stdout(predicate::str::contains("https://www.linkedin.com/jobs/view/222/"));
}
