// tests/server_start.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use karma_driver::config::ServerSection;
use karma_driver::exec::server::render_script;
use karma_driver::exec::{CommandInvocation, DetachStrategy, SystemKiller};
use karma_driver::platform::FixedPlatform;

type TestResult = Result<(), Box<dyn Error>>;

fn strings(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}

#[test]
fn kill_command_per_platform_family() {
    let windows = SystemKiller::new(Arc::new(FixedPlatform::windows()));
    assert_eq!(
        windows.kill_tokens("node"),
        strings(&["cmd", "/C", "taskkill", "/f", "/im", "node.exe"])
    );
    assert_eq!(
        windows.kill_tokens("node.exe"),
        strings(&["cmd", "/C", "taskkill", "/f", "/im", "node.exe"])
    );

    let posix = SystemKiller::new(Arc::new(FixedPlatform::posix()));
    assert_eq!(posix.kill_tokens("node"), strings(&["killall", "-v", "node"]));
}

#[test]
fn detach_strategy_follows_platform() {
    let server = ServerSection::default();

    assert_eq!(
        DetachStrategy::select(&FixedPlatform::windows(), &server),
        DetachStrategy::MinimizedWindow
    );
    assert_eq!(
        DetachStrategy::select(&FixedPlatform::posix(), &server),
        DetachStrategy::ShellScript {
            script_path: PathBuf::from("start_karma.sh"),
            log_file: PathBuf::from("karma-server.log"),
        }
    );
}

#[test]
fn minimized_window_wraps_with_start() -> TestResult {
    let inv = CommandInvocation::new(
        strings(&["karma", "start", "karma.conf.js", "--no-single-run"]),
        None,
    );

    let wrapped = DetachStrategy::MinimizedWindow.prepare(&inv)?;

    assert_eq!(
        wrapped.tokens(),
        strings(&[
            "start",
            "",
            "/min",
            "karma",
            "start",
            "karma.conf.js",
            "--no-single-run"
        ])
    );
    Ok(())
}

#[test]
fn launch_script_backgrounds_quoted_invocation() {
    let inv = CommandInvocation::new(
        strings(&["karma", "start", "/my project/karma.conf.js", "--no-single-run"]),
        None,
    );

    let script = render_script(&inv, Path::new("/var/log/karma server.log"));

    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("karma start '/my project/karma.conf.js' --no-single-run >"));
    assert!(script.contains("'/var/log/karma server.log'"));
    assert!(script.trim_end().ends_with("2>&1 &"));
}

#[test]
fn shell_script_strategy_writes_script_in_working_dir() -> TestResult {
    let dir = tempfile::tempdir()?;
    let inv = CommandInvocation::new(
        strings(&["karma", "start", "karma.conf.js", "--no-single-run"]),
        Some(dir.path().to_path_buf()),
    );
    let strategy = DetachStrategy::ShellScript {
        script_path: PathBuf::from("start_karma.sh"),
        log_file: PathBuf::from("karma-server.log"),
    };

    let wrapped = strategy.prepare(&inv)?;

    let script_path = dir.path().join("start_karma.sh");
    let body = std::fs::read_to_string(&script_path)?;
    assert!(body.contains("karma start karma.conf.js --no-single-run"));
    assert!(body.contains("karma-server.log"));

    assert_eq!(&wrapped.tokens()[..3], strings(&["bash", "-l", "-c"]).as_slice());
    assert!(wrapped.tokens()[3].contains("start_karma.sh"));
    assert_eq!(wrapped.working_dir(), Some(dir.path()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&script_path)?.permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
    Ok(())
}

#[cfg(unix)]
mod detached {
    use super::*;

    use std::time::{Duration, Instant};

    use karma_driver::goal::{GoalRunner, GoalVerdict, RunPhase};
    use karma_driver::platform::host;
    use karma_driver::types::Goal;
    use karma_driver_test_utils::builders::{GoalRequestBuilder, RunnerConfigBuilder};
    use karma_driver_test_utils::fake_runner::{FakeRunner, RecordingKiller, recorded_args};
    use karma_driver_test_utils::{init_tracing, with_timeout};

    async fn wait_for_file(path: &Path, needle: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(4);
        while Instant::now() < deadline {
            if let Ok(body) = std::fs::read_to_string(path) {
                if body.contains(needle) {
                    return true;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test]
    async fn start_server_returns_while_runner_keeps_running() -> TestResult {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("karma.conf.js");
        std::fs::write(&config, "module.exports = function (config) {};\n")?;
        let script = FakeRunner::new()
            .prints("server listening")
            .sleeps(3)
            .write(dir.path(), "karma")?;

        let killer = RecordingKiller::new();
        let request = GoalRequestBuilder::new(Goal::StartServer, &config)
            .runner(
                RunnerConfigBuilder::new()
                    .browsers(&["ChromeHeadless"])
                    .single_run(true)
                    .working_directory(dir.path())
                    .build(),
            )
            .executable(&script)
            .build();

        let mut runner = GoalRunner::new(host(), Vec::new()).with_killer(Arc::new(killer.clone()));

        let started = Instant::now();
        let verdict = with_timeout(runner.execute(&request, std::future::pending())).await?;

        assert_eq!(verdict, GoalVerdict::ServerStarted);
        assert_eq!(runner.phase(), RunPhase::Completed);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(killer.calls(), vec!["node".to_string()]);
        assert!(runner.console().is_empty());

        let log = dir.path().join("karma-server.log");
        assert!(
            wait_for_file(&log, "server listening").await,
            "detached runner should write to its log"
        );
        assert_eq!(
            recorded_args(&script).unwrap_or_default(),
            vec![
                "start".to_string(),
                config.display().to_string(),
                "--no-single-run".to_string(),
                "--browsers".to_string(),
                "ChromeHeadless".to_string(),
            ]
        );
        Ok(())
    }
}
