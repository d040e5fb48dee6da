//! End-to-end checks of the xcd-core binary against a throwaway HOME.

#![cfg(unix)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn home(&self) -> PathBuf {
        fs::canonicalize(self.home.path()).unwrap()
    }

    fn memory(&self) -> PathBuf {
        self.home.path().join(".xcd_memory")
    }

    fn mkdir(&self, rel: &str) -> PathBuf {
        let dir = self.home.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::canonicalize(dir).unwrap()
    }

    fn seed(&self, dirs: &[&PathBuf]) {
        let text: String = dirs
            .iter()
            .map(|d| format!("{}\n", d.display()))
            .collect();
        fs::write(self.memory(), text).unwrap();
    }

    fn command(&self, cwd: &Path) -> Command {
        let mut cmd = Command::cargo_bin("xcd-core").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("XCD_MEMORY_FILE")
            .env_remove("RUST_LOG")
            .current_dir(cwd);
        cmd
    }

    fn xcd(&self, cwd: &Path, args: &[&str]) -> std::process::Output {
        self.command(cwd).args(args).output().unwrap()
    }

    /// Run with the memory file moved to `memory`
    fn xcd_with_memory(&self, memory: &Path, cwd: &Path, args: &[&str]) -> std::process::Output {
        self.command(cwd)
            .env("XCD_MEMORY_FILE", memory)
            .args(args)
            .output()
            .unwrap()
    }
}

fn stdout(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn no_operand_goes_home_and_remembers_origin() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");

    let out = sb.xcd(&work, &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), format!("{}\n", sb.home().display()));

    let saved = fs::read_to_string(sb.memory()).unwrap();
    assert_eq!(saved, format!("{}\n{}\n", work.display(), sb.home().display()));
}

#[test]
fn segment_cycles_through_matches() {
    let sb = Sandbox::new();
    let a = sb.mkdir("A/foo");
    let b = sb.mkdir("B/foo");
    let c = sb.mkdir("C/foo");
    let elsewhere = sb.mkdir("elsewhere");
    sb.seed(&[&a, &b, &c]);

    let out = sb.xcd(&elsewhere, &["foo"]);
    assert_eq!(stdout(&out), format!("{}\n", a.display()));

    let out = sb.xcd(&b, &["foo"]);
    assert_eq!(stdout(&out), format!("{}\n", c.display()));

    let out = sb.xcd(&c, &["fo"]);
    assert_eq!(stdout(&out), format!("{}\n", a.display()));
}

#[test]
fn relative_directory_bypasses_matching() {
    let sb = Sandbox::new();
    let here = sb.mkdir("proj/here");
    let sibling = sb.mkdir("proj/sibling");

    let out = sb.xcd(&here, &["../sibling"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), format!("{}\n", sibling.display()));

    let listed = stdout(&sb.xcd(&here, &["-l", "sib"]));
    assert_eq!(listed, format!("{}\n", sibling.display()));
}

#[test]
fn unmatched_segment_fails() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");

    let out = sb.xcd(&work, &["zzz"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("no directory matches \"zzz\""));
}

#[test]
fn missing_path_with_separator_fails() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");

    let out = sb.xcd(&work, &["no/such"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("not a directory and not a simple segment"));
}

#[test]
fn list_filters_by_basename_without_remembering() {
    let sb = Sandbox::new();
    let api = sb.mkdir("src/api");
    let web = sb.mkdir("src/web");
    let rapid = sb.mkdir("rapid");
    let unseen = sb.mkdir("unseen");
    sb.seed(&[&api, &web, &rapid]);

    let out = sb.xcd(&unseen, &["-l"]);
    assert!(out.status.success());
    assert_eq!(
        stdout(&out),
        format!("{}\n{}\n{}\n", api.display(), web.display(), rapid.display())
    );

    let out = sb.xcd(&unseen, &["-l", "api"]);
    assert_eq!(stdout(&out), format!("{}\n{}\n", api.display(), rapid.display()));

    let saved = fs::read_to_string(sb.memory()).unwrap();
    assert!(!saved.contains(&*unseen.to_string_lossy()));
}

#[test]
fn preview_reports_next_target() {
    let sb = Sandbox::new();
    let a = sb.mkdir("A/foo");
    let b = sb.mkdir("B/foo");
    sb.seed(&[&a, &b]);

    let out = sb.xcd(&a, &["-p", "foo"]);
    assert!(out.status.success());
    let report = stdout(&out);
    assert!(report.starts_with("Matches for \"foo\":\n"));
    assert!(report.contains(&format!("  [0]* {}\n", a.display())));
    assert!(report.contains("Current directory is at index [0]."));
    assert!(report.ends_with(&format!(
        "Next target for segment \"foo\": [1] {}\n",
        b.display()
    )));

    // preview agrees with what navigation then does
    let went = stdout(&sb.xcd(&a, &["foo"]));
    assert_eq!(went, format!("{}\n", b.display()));
}

#[test]
fn preview_without_segment_fails() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");

    let out = sb.xcd(&work, &["-p"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("-p requires a segment"));
}

#[test]
fn clear_empties_memory() {
    let sb = Sandbox::new();
    let a = sb.mkdir("a");
    let b = sb.mkdir("b");
    sb.seed(&[&a, &b]);

    let out = sb.xcd(&a, &["-c"]);
    assert!(out.status.success());
    assert_eq!(fs::metadata(sb.memory()).unwrap().len(), 0);

    let out = sb.xcd(&a, &["-l"]);
    assert!(out.status.success());
    assert!(stdout(&out).is_empty());
}

#[test]
fn help_prints_usage_and_touches_nothing() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");

    let out = sb.xcd(&work, &["-h"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("xcd-core -p SEGMENT"));
    assert!(!sb.memory().exists());
}

#[test]
fn stale_entries_are_pruned_on_next_save() {
    let sb = Sandbox::new();
    let keep = sb.mkdir("keep");
    let gone = sb.mkdir("gone");
    sb.seed(&[&keep, &gone]);
    fs::remove_dir(&gone).unwrap();

    let work = sb.mkdir("work");
    let out = sb.xcd(&work, &["keep"]);
    assert_eq!(stdout(&out), format!("{}\n", keep.display()));

    let saved = fs::read_to_string(sb.memory()).unwrap();
    assert_eq!(saved, format!("{}\n{}\n", keep.display(), work.display()));
}

#[test]
fn conflicting_options_fail() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");

    let out = sb.xcd(&work, &["-c", "-l"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn hyphenated_operands_navigate() {
    let sb = Sandbox::new();
    let old = sb.mkdir("-old");
    let work = sb.mkdir("work");

    // an existing directory whose name starts with a dash
    let out = sb.xcd(&sb.home(), &["-old"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), format!("{}\n", old.display()));

    // a remembered basename segment that starts with a dash
    let out = sb.xcd(&work, &["-ol"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), format!("{}\n", old.display()));
}

#[test]
fn unwritable_memory_does_not_fail_navigation() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");
    let target = sb.mkdir("target");
    let memory = sb.home.path().join("missing-dir").join(".xcd_memory");

    let out = sb.xcd_with_memory(&memory, &work, &["../target"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), format!("{}\n", target.display()));
    assert!(stderr(&out).contains("cannot write"));
    assert!(!memory.exists());
}

#[test]
fn unreadable_memory_degrades_to_empty_store() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");
    // a directory cannot be read as the memory file
    let memory = sb.mkdir("memory-is-a-dir");

    let out = sb.xcd_with_memory(&memory, &work, &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), format!("{}\n", sb.home().display()));
    assert!(stderr(&out).contains("cannot read"));

    let out = sb.xcd_with_memory(&memory, &work, &["-l"]);
    assert!(out.status.success());
    assert!(stdout(&out).is_empty());
}

#[test]
fn memory_file_override_is_honoured() {
    let sb = Sandbox::new();
    let work = sb.mkdir("work");
    let memory = sb.home.path().join("custom_memory");

    let out = sb.xcd_with_memory(&memory, &work, &[]);
    assert!(out.status.success());

    let saved = fs::read_to_string(&memory).unwrap();
    assert_eq!(saved, format!("{}\n{}\n", work.display(), sb.home().display()));
    assert!(!sb.memory().exists());

    let listed = stdout(&sb.xcd_with_memory(&memory, &work, &["-l", "work"]));
    assert_eq!(listed, format!("{}\n", work.display()));
}
