use solvetrack_core::{BadgeType, Database};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("solvetrack/data.db")
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("solvetrack");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    fn scratch_path(&self, name: &str) -> PathBuf {
        self.home.join(name)
    }
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../solvetrack-core/tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    let bin_path = match bin_name {
        "solvetrack" => PathBuf::from(assert_cmd::cargo::cargo_bin!("solvetrack")),
        "solvetrack-sync" => PathBuf::from(assert_cmd::cargo::cargo_bin!("solvetrack-sync")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_ok(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> String {
    let output = run_bin(env, bin_name, args);
    assert_success(bin_name, args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn init_db_creates_database_under_xdg_data() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, "solvetrack", &["init-db"]);
    assert!(stdout.contains("Database ready"));
    assert!(stdout.contains("solvetrack.log"), "unexpected output:\n{stdout}");
    assert!(stdout.contains("Students:       0"), "unexpected output:\n{stdout}");

    let db_path = env.db_path();
    assert!(
        db_path.exists(),
        "database file should exist at {}",
        db_path.display()
    );
}

#[test]
fn roster_and_weekly_imports_report_counts() {
    let env = CliTestEnv::new();
    let roster = fixture("roster.csv");
    let grid = fixture("weekly_grid.csv");

    let stdout = run_ok(&env, "solvetrack", &["import-roster", &roster]);
    assert!(stdout.contains("Imported: 4"), "unexpected output:\n{stdout}");
    assert!(stdout.contains("4 row(s) applied"), "unexpected output:\n{stdout}");

    let stdout = run_ok(&env, "solvetrack", &["--format", "json", "students", "--batch", "2027"]);
    let students: serde_json::Value = serde_json::from_str(&stdout).expect("students json");
    assert_eq!(students.as_array().map(Vec::len), Some(1));
    assert_eq!(students[0]["handle"], "chenli");

    let stdout = run_ok(&env, "solvetrack", &["--format", "json", "import-weekly", &grid]);
    let result: serde_json::Value = serde_json::from_str(&stdout).expect("import result json");
    assert_eq!(result["imported"], 4);
    assert_eq!(result["skipped"], 2);

    let stdout = run_ok(&env, "solvetrack", &["grid"]);
    assert!(stdout.contains("asha_r"));
    assert!(stdout.contains("308"));
}

#[test]
fn dashboard_json_reflects_seeded_progress() {
    let env = CliTestEnv::new();
    run_ok(&env, "solvetrack", &["init-db"]);

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let engine = solvetrack_core::ProgressEngine::default();
    let day = chrono::NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
    for (handle, total) in [("fast", 20), ("slow", 2)] {
        let s = db
            .add_student(&solvetrack_core::NewStudent::new(handle, handle))
            .expect("add student");
        engine
            .apply_snapshot(&db, &s.id, &solvetrack_core::SolveStats::new(total, total, 0, 0), day)
            .expect("apply snapshot");
    }
    drop(db);

    let stdout = run_ok(
        &env,
        "solvetrack",
        &["--format", "json", "--date", "2026-03-04", "dashboard"],
    );
    let dash: serde_json::Value = serde_json::from_str(&stdout).expect("dashboard json");
    assert_eq!(dash["totalStudents"], 2);
    assert_eq!(dash["activeStudents"], 2);
    assert_eq!(dash["underperforming"], 1);
    assert_eq!(dash["leaderboard"][0]["handle"], "fast");

    let stdout = run_ok(&env, "solvetrack", &["--date", "2026-03-04", "student", "fast"]);
    assert!(stdout.contains("Weekly rank: #1"), "unexpected output:\n{stdout}");
}

#[test]
fn export_writes_csv_rows() {
    let env = CliTestEnv::new();
    run_ok(
        &env,
        "solvetrack",
        &["add-student", "--name", "Asha Rao", "--handle", "asha_r", "--batch", "2026"],
    );

    let out = env.scratch_path("export.csv");
    let out_arg = out.to_string_lossy().into_owned();
    let stdout = run_ok(&env, "solvetrack", &["export", "--out", &out_arg]);
    assert!(stdout.contains("Exported 1 student(s)"));

    let contents = fs::read_to_string(&out).expect("export file");
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("name,handle,totalSolved,weeklyProgress,streak,status")
    );
    assert_eq!(lines.next(), Some("Asha Rao,asha_r,0,0,0,Underperforming"));
}

#[test]
fn duplicate_handle_is_rejected() {
    let env = CliTestEnv::new();
    run_ok(&env, "solvetrack", &["add-student", "--name", "A", "--handle", "dup"]);

    let output = run_bin(
        &env,
        "solvetrack",
        &["add-student", "--name", "B", "--handle", "https://leetcode.com/u/DUP/"],
    );
    assert!(!output.status.success());
}

#[test]
fn remove_student_requires_confirmation() {
    let env = CliTestEnv::new();
    run_ok(&env, "solvetrack", &["add-student", "--name", "A", "--handle", "gone"]);

    let output = run_bin(&env, "solvetrack", &["remove-student", "gone"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--yes"), "unexpected stderr:\n{stderr}");

    let stdout = run_ok(&env, "solvetrack", &["remove-student", "gone", "--yes"]);
    assert!(stdout.contains("Removed gone"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    assert!(db.get_student_by_handle("gone").unwrap().is_none());
}

#[test]
fn unknown_student_dashboard_fails() {
    let env = CliTestEnv::new();
    let output = run_bin(&env, "solvetrack", &["student", "nobody"]);
    assert!(!output.status.success());
}

#[test]
fn sync_with_empty_roster_completes() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, "solvetrack-sync", &[]);
    assert!(stdout.contains("Sync complete:"));
    assert!(stdout.contains("Students:       0"));
}

#[test]
fn sync_tallies_unreachable_source_without_failing() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[source]
endpoint = "http://127.0.0.1:9/graphql"
timeout_secs = 2
"#,
    );
    run_ok(&env, "solvetrack", &["add-student", "--name", "A", "--handle", "offline"]);

    let stdout = run_ok(&env, "solvetrack-sync", &["-v"]);
    assert!(stdout.contains("Failed:         1"), "unexpected output:\n{stdout}");
    assert!(stdout.contains("offline:"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let student = db.get_student_by_handle("offline").unwrap().unwrap();
    assert!(db.get_latest_daily_entry(&student.id).unwrap().is_none());
    assert_eq!(
        db.count_badges(&student.id, BadgeType::WeeklyTopper).unwrap(),
        0
    );
}

#[test]
fn invalid_config_is_reported() {
    let env = CliTestEnv::new();
    env.write_config("[sync]\nconcurrency = 0\n");

    let output = run_bin(&env, "solvetrack-sync", &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load configuration"));
}
