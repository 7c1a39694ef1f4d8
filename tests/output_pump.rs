// tests/output_pump.rs

#![cfg(unix)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use karma_driver::errors::{DriverError, ErrorKind};
use karma_driver::exec::pump::ANSI_RESET;
use karma_driver::exec::{
    ColorMode, CommandInvocation, OutcomePolicy, OutputPump, ProcessLauncher, RunOutcome,
};
use karma_driver::platform::FixedPlatform;
use karma_driver_test_utils::fake_runner::FakeRunner;
use karma_driver_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

async fn drain_script(
    script: &Path,
    colors: ColorMode,
    policy: OutcomePolicy,
) -> Result<(RunOutcome, String), DriverError> {
    let launcher = ProcessLauncher::new(Arc::new(FixedPlatform::posix()));
    let inv = CommandInvocation::new(vec![script.display().to_string()], None);
    let process = launcher.launch(&inv)?;

    let mut pump = OutputPump::new(Vec::new(), colors, policy);
    let outcome = pump.drain(process, std::future::pending()).await?;
    let console = String::from_utf8_lossy(&pump.into_console()).into_owned();
    Ok((outcome, console))
}

#[tokio::test]
async fn silent_zero_exit_is_success() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new().write(dir.path(), "karma")?;

    let (outcome, _) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::ExitStatus,
    ))
    .await?;

    assert!(outcome.success);
    assert_eq!(outcome.exit_code, Some(0));
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_fails_even_with_passing_output() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("Executed 12 of 12 SUCCESS")
        .exits_with(1)
        .write(dir.path(), "karma")?;

    let (outcome, console) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::ExitStatus,
    ))
    .await?;

    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, Some(1));
    assert_eq!(console, "Executed 12 of 12 SUCCESS\n");
    Ok(())
}

#[tokio::test]
async fn stderr_is_merged_into_the_console() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("from stdout")
        .prints_stderr("from stderr")
        .write(dir.path(), "karma")?;

    let (_, console) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::ExitStatus,
    ))
    .await?;

    assert!(console.contains("from stdout\n"));
    assert!(console.contains("from stderr\n"));
    Ok(())
}

#[tokio::test]
async fn strip_mode_removes_escape_sequences() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("\x1b[32mExecuted 3 of 3 SUCCESS\x1b[39m")
        .write(dir.path(), "karma")?;

    let (_, console) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::ExitStatus,
    ))
    .await?;

    assert_eq!(console, "Executed 3 of 3 SUCCESS\n");
    Ok(())
}

#[tokio::test]
async fn passthrough_mode_keeps_colors_and_resets_at_end() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("\x1b[31mFAILED\x1b[39m")
        .exits_with(1)
        .write(dir.path(), "karma")?;

    let (outcome, console) = with_timeout(drain_script(
        &script,
        ColorMode::Passthrough,
        OutcomePolicy::ExitStatus,
    ))
    .await?;

    assert!(!outcome.success);
    assert!(console.starts_with("\x1b[31mFAILED\x1b[39m\n"));
    assert!(console.ends_with(ANSI_RESET));
    Ok(())
}

#[tokio::test]
async fn failure_marker_on_last_line_fails_a_zero_exit() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("Chrome: Executed 4 of 4 (1 FAILED)")
        .prints("")
        .write(dir.path(), "karma")?;

    let (outcome, _) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::FailureMarker("FAILED".to_string()),
    ))
    .await?;

    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, Some(0));
    Ok(())
}

#[tokio::test]
async fn failure_marker_misses_reworded_summary() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("Chrome: Executed 4 of 4 (1 FAILED)")
        .prints("TOTAL: 1 failing")
        .write(dir.path(), "karma")?;

    let (outcome, _) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::FailureMarker("FAILED".to_string()),
    ))
    .await?;

    // Only the last non-empty line is inspected.
    assert!(outcome.success);
    Ok(())
}

#[tokio::test]
async fn interleaved_streams_keep_their_write_order() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let mut runner = FakeRunner::new();
    for i in 0..200 {
        let line = format!("L{i}");
        runner = if i % 2 == 0 {
            runner.prints(&line)
        } else {
            runner.prints_stderr(&line)
        };
    }
    let script = runner
        .prints_stderr("Chrome: Executed 1 of 1 (1 FAILED)")
        .prints("done")
        .write(dir.path(), "karma")?;

    let (outcome, console) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::FailureMarker("FAILED".to_string()),
    ))
    .await?;

    let mut expected: Vec<String> = (0..200).map(|i| format!("L{i}")).collect();
    expected.push("Chrome: Executed 1 of 1 (1 FAILED)".to_string());
    expected.push("done".to_string());
    let seen: Vec<&str> = console.lines().collect();
    assert_eq!(seen, expected);

    // The marker line came before "done", so it is not the last line.
    assert!(outcome.success);
    Ok(())
}

#[tokio::test]
async fn megabytes_on_both_streams_drain_without_blocking() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .floods(8192)
        .prints("Executed 1 of 1 SUCCESS")
        .write(dir.path(), "karma")?;

    let (outcome, console) = with_timeout(drain_script(
        &script,
        ColorMode::Strip,
        OutcomePolicy::ExitStatus,
    ))
    .await?;

    assert!(outcome.success);
    assert_eq!(console.lines().count(), 2 * 8192 + 1);
    assert!(console.ends_with("Executed 1 of 1 SUCCESS\n"));
    Ok(())
}

#[tokio::test]
async fn interrupt_kills_the_runner_and_is_not_a_test_failure() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = FakeRunner::new()
        .prints("waiting for browsers")
        .sleeps(30)
        .write(dir.path(), "karma")?;

    let launcher = ProcessLauncher::new(Arc::new(FixedPlatform::posix()));
    let inv = CommandInvocation::new(vec![script.display().to_string()], None);
    let process = launcher.launch(&inv)?;

    let mut pump = OutputPump::new(Vec::new(), ColorMode::Passthrough, OutcomePolicy::ExitStatus);
    let interrupt = tokio::time::sleep(std::time::Duration::from_millis(200));
    let result = with_timeout(pump.drain(process, interrupt)).await;

    match result {
        Err(err @ DriverError::Interrupted) => {
            assert_eq!(err.kind(), ErrorKind::Environment);
        }
        other => panic!("expected Interrupted, got {other:?}"),
    }

    let console = String::from_utf8_lossy(&pump.into_console()).into_owned();
    assert!(console.ends_with(ANSI_RESET));
    Ok(())
}

#[test]
fn decide_combines_marker_with_exit_status() {
    let policy = OutcomePolicy::FailureMarker("FAILED".to_string());

    assert!(!policy.decide(false, Some(1), Some("all good")).success);
    assert!(!policy.decide(true, Some(0), Some("1 FAILED")).success);
    assert!(policy.decide(true, Some(0), None).success);
    assert!(OutcomePolicy::ExitStatus.decide(true, Some(0), Some("1 FAILED")).success);
}

#[test]
fn colors_flag_selects_color_mode() {
    assert_eq!(ColorMode::for_colors(Some(false)), ColorMode::Strip);
    assert_eq!(ColorMode::for_colors(Some(true)), ColorMode::Passthrough);
    assert_eq!(ColorMode::for_colors(None), ColorMode::Passthrough);
}

#[tokio::test]
async fn interrupt_also_kills_background_jobs_of_the_runner() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let late = dir.path().join("late");
    let script = FakeRunner::new()
        .touches_later(2, &late)
        .sleeps(30)
        .write(dir.path(), "karma")?;

    let launcher = ProcessLauncher::new(Arc::new(FixedPlatform::posix()));
    let inv = CommandInvocation::new(vec![script.display().to_string()], None);
    let process = launcher.launch(&inv)?;

    let mut pump = OutputPump::new(Vec::new(), ColorMode::Strip, OutcomePolicy::ExitStatus);
    let interrupt = tokio::time::sleep(std::time::Duration::from_millis(200));
    let result = with_timeout(pump.drain(process, interrupt)).await;
    assert!(matches!(result, Err(DriverError::Interrupted)));

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert!(!late.exists(), "background job outlived the interrupt");
    Ok(())
}
