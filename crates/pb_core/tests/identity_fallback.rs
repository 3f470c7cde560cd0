use pb_core::identity::{parse_combined, resolve_identity};
use pb_core::{CommandRunner, DirLocator, IdentityDefaults, IdentitySource, VcsIdentity, VcsKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Answers VCS queries from a table keyed by `program arg arg...`.
#[derive(Default)]
struct ScriptedRunner {
    answers: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    fn answer(mut self, command: &str, output: &str) -> Self {
        self.answers.insert(command.to_string(), output.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn output_of(&self, _dir: &Path, program: &str, args: &[&str]) -> Option<String> {
        let key = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(key.clone());
        self.answers.get(&key).cloned()
    }
}

fn defaults() -> IdentityDefaults {
    IdentityDefaults {
        name: "Fallback Person".to_string(),
        email: "fallback@example.com".to_string(),
    }
}

#[test]
fn git_identity_is_queried_field_by_field() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default()
        .answer("git config --get user.name", "Linus")
        .answer("git config --get user.email", "linus@example.com")
        .answer("git rev-parse HEAD", "abc123");

    let identity = VcsIdentity::new(VcsKind::Git, temp.path(), defaults(), &runner).identity();
    assert_eq!(identity.name, "Linus");
    assert_eq!(identity.email, "linus@example.com");
    assert_eq!(identity.revision.as_deref(), Some("abc123"));
}

#[test]
fn failed_queries_fall_back_to_defaults_without_revision() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default();

    for kind in VcsKind::DETECTION_ORDER {
        let identity = VcsIdentity::new(kind, temp.path(), defaults(), &runner).identity();
        assert_eq!(identity.name, "Fallback Person", "{kind:?}");
        assert_eq!(identity.email, "fallback@example.com", "{kind:?}");
        assert_eq!(identity.revision, None, "{kind:?}");
    }
}

#[test]
fn mercurial_combined_username_is_split() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default()
        .answer("hg showconfig ui.username", "Matt Mackall <mpm@example.com>")
        .answer("hg parents --template {node}", "deadbeef");

    let identity =
        VcsIdentity::new(VcsKind::Mercurial, temp.path(), defaults(), &runner).identity();
    assert_eq!(identity.name, "Matt Mackall");
    assert_eq!(identity.email, "mpm@example.com");
    assert_eq!(identity.revision.as_deref(), Some("deadbeef"));
}

#[test]
fn unparsable_combined_identity_uses_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default().answer("bzr whoami", "no brackets here");

    let source = VcsIdentity::new(VcsKind::Bazaar, temp.path(), defaults(), &runner);
    assert_eq!(source.name(), "Fallback Person");
    assert_eq!(source.email(), "fallback@example.com");
    assert_eq!(parse_combined("no brackets here"), None);
}

#[test]
fn subversion_reports_only_a_revision() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default().answer("svn info --show-item revision", "1042");

    let identity =
        VcsIdentity::new(VcsKind::Subversion, temp.path(), defaults(), &runner).identity();
    assert_eq!(identity.name, "Fallback Person");
    assert_eq!(identity.revision.as_deref(), Some("1042"));
    assert!(runner
        .calls()
        .iter()
        .all(|call| call == "svn info --show-item revision"));
}

#[test]
fn no_vcs_never_runs_a_subprocess() {
    let temp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::default();

    let identity = VcsIdentity::new(VcsKind::None, temp.path(), defaults(), &runner).identity();
    assert_eq!(identity.email, "fallback@example.com");
    assert!(runner.calls().is_empty());
}

#[test]
fn detection_prefers_git_and_walks_upward() {
    let temp = tempfile::tempdir().unwrap();
    let nested = temp.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir(temp.path().join(".hg")).unwrap();
    fs::create_dir(temp.path().join(".git")).unwrap();

    let mut locator = DirLocator::new(&nested);
    assert_eq!(VcsKind::detect(&mut locator), VcsKind::Git);
}

#[test]
fn subversion_is_detected_only_in_the_start_directory() {
    let temp = tempfile::tempdir().unwrap();
    let nested = temp.path().join("trunk");
    fs::create_dir(&nested).unwrap();
    fs::create_dir(temp.path().join(".svn")).unwrap();

    assert_eq!(
        VcsKind::detect(&mut DirLocator::new(&nested)),
        VcsKind::None
    );
    assert_eq!(
        VcsKind::detect(&mut DirLocator::new(temp.path())),
        VcsKind::Subversion
    );
}

#[test]
fn resolve_identity_combines_detection_and_queries() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir(temp.path().join(".bzr")).unwrap();
    let runner = ScriptedRunner::default()
        .answer("bzr whoami", "Jelmer <jelmer@example.com>")
        .answer("bzr version-info --custom --template={revision_id}", "rev-7");

    let mut locator = DirLocator::new(temp.path());
    let identity = resolve_identity(&mut locator, &defaults(), &runner);
    assert_eq!(identity.name, "Jelmer");
    assert_eq!(identity.email, "jelmer@example.com");
    assert_eq!(identity.revision.as_deref(), Some("rev-7"));
}
