// tests/flag_tokens.rs

use proptest::prelude::*;

use karma_driver::args::{FlagSet, build_flag_tokens};
use karma_driver::config::RunnerConfiguration;
use karma_driver::types::Goal;
use karma_driver_test_utils::builders::RunnerConfigBuilder;

fn strings(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}

#[test]
fn every_field_set_produces_fixed_order() {
    let cfg = RunnerConfigBuilder::new()
        .colors(true)
        .report_slower_than(250)
        .capture_timeout(60000)
        .auto_watch(false)
        .single_run(true)
        .reporters(&["progress", "junit"])
        .browsers(&["Chrome", "Firefox"])
        .build();

    let tokens = build_flag_tokens(&cfg, FlagSet::ALL);

    assert_eq!(
        tokens,
        strings(&[
            "--browsers",
            "Chrome,Firefox",
            "--reporters",
            "progress,junit",
            "--single-run",
            "--no-auto-watch",
            "--capture-timeout",
            "60000",
            "--report-slower-than",
            "250",
            "--colors",
            "true",
        ])
    );
}

#[test]
fn unset_configuration_produces_no_tokens() {
    let tokens = build_flag_tokens(&RunnerConfiguration::default(), FlagSet::ALL);
    assert!(tokens.is_empty());
}

#[test]
fn single_browser_has_no_trailing_comma() {
    let cfg = RunnerConfigBuilder::new().browsers(&["ChromeHeadless"]).build();
    assert_eq!(
        build_flag_tokens(&cfg, FlagSet::ALL),
        strings(&["--browsers", "ChromeHeadless"])
    );
}

#[test]
fn empty_list_counts_as_unset() {
    let cfg = RunnerConfiguration {
        browsers: Some(vec![]),
        reporters: Some(vec![]),
        ..RunnerConfiguration::default()
    };
    assert!(build_flag_tokens(&cfg, FlagSet::ALL).is_empty());
}

#[test]
fn false_switches_use_negated_flags() {
    let cfg = RunnerConfigBuilder::new()
        .single_run(false)
        .auto_watch(true)
        .colors(false)
        .build();

    assert_eq!(
        build_flag_tokens(&cfg, FlagSet::ALL),
        strings(&["--no-single-run", "--auto-watch", "--colors", "false"])
    );
}

#[test]
fn zero_timeout_is_passed_not_dropped() {
    let cfg = RunnerConfigBuilder::new().capture_timeout(0).build();
    assert_eq!(
        build_flag_tokens(&cfg, FlagSet::ALL),
        strings(&["--capture-timeout", "0"])
    );
}

#[test]
fn server_flag_set_drops_single_run_and_colors() {
    let cfg = RunnerConfigBuilder::new()
        .browsers(&["Chrome"])
        .single_run(true)
        .colors(true)
        .auto_watch(true)
        .build();

    assert_eq!(
        build_flag_tokens(&cfg, FlagSet::for_goal(Goal::StartServer)),
        strings(&["--browsers", "Chrome", "--auto-watch"])
    );
}

#[test]
fn run_goal_forwards_no_flags() {
    let cfg = RunnerConfigBuilder::new()
        .browsers(&["Chrome"])
        .single_run(true)
        .capture_timeout(10)
        .build();

    assert!(build_flag_tokens(&cfg, FlagSet::for_goal(Goal::Run)).is_empty());
    assert_eq!(FlagSet::for_goal(Goal::Start), FlagSet::ALL);
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,12}"
}

fn config_strategy() -> impl Strategy<Value = RunnerConfiguration> {
    (
        proptest::option::of(proptest::collection::vec(name_strategy(), 0..4)),
        proptest::option::of(proptest::collection::vec(name_strategy(), 0..4)),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<u64>()),
        proptest::option::of(any::<u64>()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(
            |(browsers, reporters, single_run, auto_watch, capture_timeout, slower, colors)| {
                RunnerConfiguration {
                    browsers,
                    reporters,
                    single_run,
                    auto_watch,
                    capture_timeout,
                    report_slower_than: slower,
                    colors,
                    ..RunnerConfiguration::default()
                }
            },
        )
}

proptest! {
    #[test]
    fn tokens_are_deterministic(cfg in config_strategy()) {
        let first = build_flag_tokens(&cfg, FlagSet::ALL);
        let second = build_flag_tokens(&cfg.clone(), FlagSet::ALL);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn tri_state_switches_emit_at_most_one_form(cfg in config_strategy()) {
        let tokens = build_flag_tokens(&cfg, FlagSet::ALL);
        let count = |flag: &str| tokens.iter().filter(|t| t.as_str() == flag).count();

        prop_assert!(count("--single-run") + count("--no-single-run") <= 1);
        prop_assert!(count("--auto-watch") + count("--no-auto-watch") <= 1);
        prop_assert_eq!(count("--single-run") + count("--no-single-run"), usize::from(cfg.single_run.is_some()));
        prop_assert_eq!(count("--colors"), usize::from(cfg.colors.is_some()));
    }

    #[test]
    fn flags_follow_fixed_order(cfg in config_strategy()) {
        let order = [
            "--browsers",
            "--reporters",
            "--single-run",
            "--no-single-run",
            "--auto-watch",
            "--no-auto-watch",
            "--capture-timeout",
            "--report-slower-than",
            "--colors",
        ];
        let rank = |t: &str| {
            let pos = order.iter().position(|o| *o == t).unwrap();
            // Both forms of a switch share a slot.
            match t {
                "--no-single-run" => pos - 1,
                "--no-auto-watch" => pos - 1,
                _ => pos,
            }
        };

        let ranks: Vec<usize> = build_flag_tokens(&cfg, FlagSet::ALL)
            .iter()
            .filter(|t| t.starts_with("--"))
            .map(|t| rank(t.as_str()))
            .collect();

        prop_assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }
}
