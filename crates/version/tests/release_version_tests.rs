//! End-to-end tests for release version runs against real git repositories.

use pyrelease_version::current_version::{CurrentVersionRequest, resolve_current_version};
use pyrelease_version::{
    BumpKind, CurrentVersionResolver, Error, FallbackCurrentVersionResolver, GitRepository,
    Package, ProjectsRelationship, PromptRequest, ReleaseGroup, SpecifierPrompt,
    SpecifierSource, TagPattern, VersionOptions, VersionOrchestrator, VersionSpecifier,
};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Command;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

fn git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn init_repo(temp: &TempDir) -> PathBuf {
    let root = temp.path().to_path_buf();
    git(&root, &["init"]);
    git(&root, &["config", "user.name", "Test User"]);
    git(&root, &["config", "user.email", "test@example.com"]);
    fs::write(root.join("README.md"), "workspace\n").unwrap();
    commit_all(&root, "chore: initial commit");
    root
}

fn commit_all(root: &Path, message: &str) {
    git(root, &["add", "."]);
    git(root, &["commit", "--no-gpg-sign", "-m", message]);
}

fn write_manifest(root: &Path, dir: &str, name: &str, version: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("pyproject.toml"),
        format!(
            "# managed by hand\n[project]\nname = \"{name}\"\nversion = \"{version}\"  # bumped on release\ndependencies = []\n\n[tool.ruff]\nline-length = 100\n"
        ),
    )
    .unwrap();
}

fn touch(root: &Path, file: &str, contents: &str) {
    let path = root.join(file);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn manifest(root: &Path, dir: &str) -> String {
    fs::read_to_string(root.join(dir).join("pyproject.toml")).unwrap()
}

fn packages() -> Vec<Package> {
    vec![
        Package::new("api", "packages/api"),
        Package::new("web", "packages/web"),
    ]
}

#[derive(Clone, Default)]
struct ScriptedPrompt {
    answer: Option<VersionSpecifier>,
    asked: Arc<Mutex<Vec<PromptRequest>>>,
}

impl SpecifierPrompt for ScriptedPrompt {
    fn ask<'a>(
        &'a self,
        request: &'a PromptRequest,
    ) -> Pin<Box<dyn Future<Output = pyrelease_version::Result<VersionSpecifier>> + Send + 'a>>
    {
        self.asked.lock().unwrap().push(request.clone());
        let answer = self.answer.clone().unwrap();
        Box::pin(async move { Ok(answer) })
    }
}

// =============================================================================
// Independent groups
// =============================================================================

#[tokio::test]
async fn test_independent_tag_and_disk_fallback() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "0.9.0");
    write_manifest(&root, "packages/web", "web", "0.3.0");
    commit_all(&root, "feat: add packages");
    git(&root, &["tag", "api@1.0.0"]);

    touch(&root, "packages/api/app.py", "fixed\n");
    commit_all(&root, "fix(api): handle empty body");
    touch(&root, "packages/web/app.py", "new\n");
    commit_all(&root, "feat(web): add page");

    let options = VersionOptions {
        projects: packages(),
        release_group: ReleaseGroup {
            name: "python".to_string(),
            projects_relationship: ProjectsRelationship::Independent,
            release_tag_pattern: "{projectName}@{version}".to_string(),
        },
        specifier_source: SpecifierSource::ConventionalCommits,
        current_version_resolver: CurrentVersionResolver::GitTag,
        fallback_current_version_resolver: Some(FallbackCurrentVersionResolver::Disk),
        ..Default::default()
    };
    let result = VersionOrchestrator::new(&root, options).run().await.unwrap();

    assert_eq!(result.data["api"].current_version, "1.0.0");
    assert_eq!(result.data["api"].new_version.as_deref(), Some("1.0.1"));
    assert_eq!(result.data["web"].current_version, "0.3.0");
    assert_eq!(result.data["web"].new_version.as_deref(), Some("0.4.0"));
    assert!(result.data["api"].dependents.is_empty());

    let api = manifest(&root, "packages/api");
    assert!(api.contains("version = \"1.0.1\"  # bumped on release"));
    assert!(api.starts_with("# managed by hand\n"));
    assert!(api.contains("[tool.ruff]\nline-length = 100\n"));
    assert!(manifest(&root, "packages/web").contains("version = \"0.4.0\""));
}

#[tokio::test]
async fn test_only_the_tagged_package_avoids_fallback() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "0.9.0");
    write_manifest(&root, "packages/web", "web", "0.3.0");
    commit_all(&root, "feat: add packages");
    git(&root, &["tag", "api@1.0.0"]);

    let repo = GitRepository::new(&root);
    let pattern = TagPattern::new("{projectName}@{version}");
    let resolve = |package: &'static str, disk: &'static str| CurrentVersionRequest {
        package,
        manifest_path: Path::new("pyproject.toml"),
        disk_version: Some(disk),
        resolver: CurrentVersionResolver::GitTag,
        fallback: Some(FallbackCurrentVersionResolver::Disk),
        tag_pattern: &pattern,
    };

    let api = resolve_current_version(&resolve("api", "0.9.0"), &repo)
        .await
        .unwrap();
    let web = resolve_current_version(&resolve("web", "0.3.0"), &repo)
        .await
        .unwrap();

    assert_eq!(api.version.to_string(), "1.0.0");
    assert!(!api.used_fallback);
    assert_eq!(web.version.to_string(), "0.3.0");
    assert!(web.used_fallback);
}

#[tokio::test]
async fn test_untouched_package_is_skipped() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "1.0.0");
    write_manifest(&root, "packages/web", "web", "2.0.0");
    commit_all(&root, "chore: add packages");
    git(&root, &["tag", "api@1.0.0"]);
    git(&root, &["tag", "web@2.0.0"]);
    touch(&root, "packages/api/app.py", "x\n");
    commit_all(&root, "feat(api): new endpoint");

    let options = VersionOptions {
        projects: packages(),
        release_group: ReleaseGroup {
            projects_relationship: ProjectsRelationship::Independent,
            release_tag_pattern: "{projectName}@{version}".to_string(),
            ..Default::default()
        },
        specifier_source: SpecifierSource::ConventionalCommits,
        current_version_resolver: CurrentVersionResolver::GitTag,
        ..Default::default()
    };
    let before = manifest(&root, "packages/web");
    let result = VersionOrchestrator::new(&root, options).run().await.unwrap();

    assert_eq!(result.data["api"].new_version.as_deref(), Some("1.1.0"));
    assert_eq!(result.data["web"].current_version, "2.0.0");
    assert_eq!(result.data["web"].new_version, None);
    assert_eq!(manifest(&root, "packages/web"), before);
    assert_eq!(
        result.changed_files,
        vec![PathBuf::from("packages/api/pyproject.toml")]
    );
}

// =============================================================================
// Fixed groups
// =============================================================================

#[tokio::test]
async fn test_fixed_group_prompts_once() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "1.0.0");
    write_manifest(&root, "packages/web", "web", "2.5.0");

    let prompt = ScriptedPrompt {
        answer: Some(VersionSpecifier::Bump(BumpKind::Minor)),
        ..Default::default()
    };
    let options = VersionOptions {
        projects: packages(),
        release_group: ReleaseGroup {
            name: "python".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = VersionOrchestrator::new(&root, options)
        .with_prompt(Box::new(prompt.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(result.data["api"].new_version.as_deref(), Some("1.1.0"));
    assert_eq!(result.data["web"].new_version.as_deref(), Some("2.6.0"));

    let asked = prompt.asked.lock().unwrap();
    assert_eq!(asked.len(), 1);
    assert_eq!(
        asked[0].kind_question,
        "What kind of change is this for the 2 matched project(s) within release group \"python\"?"
    );
}

#[tokio::test]
async fn test_explicit_specifier_skips_prompt() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "1.0.0");
    write_manifest(&root, "packages/web", "web", "2.5.0");

    let prompt = ScriptedPrompt::default();
    let options = VersionOptions {
        projects: packages(),
        specifier: Some("v3.0.0".to_string()),
        ..Default::default()
    };
    let result = VersionOrchestrator::new(&root, options)
        .with_prompt(Box::new(prompt.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(result.data["api"].new_version.as_deref(), Some("3.0.0"));
    assert_eq!(result.data["web"].new_version.as_deref(), Some("3.0.0"));
    assert!(prompt.asked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_prerelease_baseline_continues_prerelease() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "2.0.0-beta.1");
    write_manifest(&root, "packages/web", "web", "2.0.0-beta.1");
    commit_all(&root, "chore: add packages");
    git(&root, &["tag", "v2.0.0-beta.1"]);
    touch(&root, "packages/web/app.py", "x\n");
    commit_all(&root, "feat(web): add page");

    let options = VersionOptions {
        projects: packages(),
        specifier_source: SpecifierSource::ConventionalCommits,
        current_version_resolver: CurrentVersionResolver::GitTag,
        ..Default::default()
    };
    let result = VersionOrchestrator::new(&root, options).run().await.unwrap();

    assert_eq!(result.data["api"].current_version, "2.0.0-beta.1");
    assert_eq!(result.data["api"].new_version.as_deref(), Some("2.0.0-beta.2"));
    assert_eq!(result.data["web"].new_version.as_deref(), Some("2.0.0-beta.2"));
}

// =============================================================================
// Failures and dry runs
// =============================================================================

#[tokio::test]
async fn test_no_matching_tag_without_fallback_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "1.0.0");
    write_manifest(&root, "packages/web", "web", "1.0.0");
    commit_all(&root, "chore: add packages");
    git(&root, &["tag", "api@1.0.0"]);

    let options = VersionOptions {
        projects: packages(),
        release_group: ReleaseGroup {
            projects_relationship: ProjectsRelationship::Independent,
            release_tag_pattern: "{projectName}@{version}".to_string(),
            ..Default::default()
        },
        specifier: Some("patch".to_string()),
        current_version_resolver: CurrentVersionResolver::GitTag,
        ..Default::default()
    };
    let before = manifest(&root, "packages/api");
    let err = VersionOrchestrator::new(&root, options)
        .run()
        .await
        .unwrap_err();

    match err {
        Error::NoMatchingTag { pattern, package } => {
            assert_eq!(pattern, "{projectName}@{version}");
            assert_eq!(package, "web");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manifest(&root, "packages/api"), before);
}

#[tokio::test]
async fn test_first_release_falls_back_to_disk() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "0.1.0");
    commit_all(&root, "feat(api): first version");

    let options = VersionOptions {
        projects: vec![Package::new("api", "packages/api")],
        specifier_source: SpecifierSource::ConventionalCommits,
        current_version_resolver: CurrentVersionResolver::GitTag,
        first_release: true,
        ..Default::default()
    };
    let result = VersionOrchestrator::new(&root, options).run().await.unwrap();

    assert_eq!(result.data["api"].current_version, "0.1.0");
    assert_eq!(result.data["api"].new_version.as_deref(), Some("0.2.0"));
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "packages/api", "api", "1.2.3");
    write_manifest(&root, "packages/web", "web", "0.0.9");

    let options = VersionOptions {
        projects: packages(),
        specifier: Some("major".to_string()),
        dry_run: true,
        ..Default::default()
    };
    let api_before = manifest(&root, "packages/api");
    let web_before = manifest(&root, "packages/web");
    let result = VersionOrchestrator::new(&root, options).run().await.unwrap();

    assert!(result.dry_run.is_dry_run());
    assert_eq!(result.data["api"].new_version.as_deref(), Some("2.0.0"));
    assert_eq!(result.data["web"].new_version.as_deref(), Some("1.0.0"));
    assert_eq!(result.changed_files.len(), 2);
    assert_eq!(manifest(&root, "packages/api"), api_before);
    assert_eq!(manifest(&root, "packages/web"), web_before);
}

#[tokio::test]
async fn test_package_root_template() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);
    write_manifest(&root, "dist/api", "api", "1.0.0");

    let options = VersionOptions {
        projects: vec![Package::new("api", "packages/api")],
        package_root: Some("{workspaceRoot}/dist/{projectName}".to_string()),
        specifier: Some("prepatch".to_string()),
        preid: Some("rc".to_string()),
        ..Default::default()
    };
    let result = VersionOrchestrator::new(&root, options).run().await.unwrap();

    assert_eq!(result.data["api"].new_version.as_deref(), Some("1.0.1-rc.0"));
    assert!(manifest(&root, "dist/api").contains("version = \"1.0.1-rc.0\""));
}

#[tokio::test]
async fn test_invalid_version_prefix_is_a_configuration_error() {
    let temp = TempDir::new().unwrap();
    let root = init_repo(&temp);

    let options = VersionOptions {
        projects: packages(),
        specifier: Some("patch".to_string()),
        version_prefix: Some(">=".to_string()),
        ..Default::default()
    };
    let err = VersionOrchestrator::new(&root, options)
        .run()
        .await
        .unwrap_err();
    assert_eq!(err.category(), pyrelease_version::ErrorCategory::Configuration);
}
