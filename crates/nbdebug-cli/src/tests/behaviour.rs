//! BDD step definitions for the console's behavioural tests.
//!
//! These steps map scenarios in `tests/features/nbdebug_cli.feature` to a
//! [`TestWorld`] that runs the full CLI in-process against a fake daemon.

use super::support::*;

use std::cell::RefCell;

use rstest_bdd_macros::{given, scenario, then, when};

#[given("a cooperative daemon")]
fn given_cooperative_daemon(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_daemon(cooperative())
        .expect("failed to start fake daemon");
}

#[given("a daemon rejecting {op} with {message}")]
fn given_rejecting_daemon(world: &RefCell<TestWorld>, op: String, message: String) {
    let responder = rejecting(op.trim_matches('"'), message.trim_matches('"'));
    world
        .borrow_mut()
        .start_daemon(responder)
        .expect("failed to start fake daemon");
}

#[given("an unreachable daemon")]
fn given_unreachable_daemon(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .use_unreachable_daemon()
        .expect("failed to reserve an unused port");
}

#[when("the operator runs {command}")]
fn when_operator_runs(world: &RefCell<TestWorld>, command: String) {
    world
        .borrow_mut()
        .run(&command)
        .expect("failed to run CLI command");
}

#[then("the CLI exits with code {status}")]
fn then_exit_code(world: &RefCell<TestWorld>, status: u8) {
    world
        .borrow()
        .assert_exit_code(status)
        .expect("exit code assertion failed");
}

#[then("stdout is {expected}")]
fn then_stdout_is(world: &RefCell<TestWorld>, expected: String) {
    let expected = format!("{}\n", expected.trim_matches('"'));
    assert_eq!(world.borrow().stdout_text(), expected);
}

#[then("stdout contains {snippet}")]
fn then_stdout_contains(world: &RefCell<TestWorld>, snippet: String) {
    let stdout = world.borrow().stdout_text();
    let snippet = snippet.trim_matches('"');
    assert!(
        stdout.contains(snippet),
        "stdout {stdout:?} did not contain {snippet:?}"
    );
}

#[then("stderr contains {snippet}")]
fn then_stderr_contains(world: &RefCell<TestWorld>, snippet: String) {
    let stderr = world.borrow().stderr_text();
    let snippet = snippet.trim_matches('"');
    assert!(
        stderr.contains(snippet),
        "stderr {stderr:?} did not contain {snippet:?}"
    );
}

#[then("the daemon received {names}")]
fn then_daemon_received(world: &RefCell<TestWorld>, names: String) {
    let expected: Vec<&str> = names.trim_matches('"').split(',').map(str::trim).collect();
    assert_eq!(world.borrow().request_names(), expected);
}

#[then("the daemon received nothing")]
fn then_daemon_received_nothing(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.requests.is_empty(),
        "unexpected requests: {:?}",
        world.requests
    );
}

#[then("the daemon saw the connection close")]
fn then_daemon_saw_close(world: &RefCell<TestWorld>) {
    assert!(world.borrow().daemon_saw_close());
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "Setting the daemon log level"
)]
fn sets_log_level(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "Unknown log levels are rejected before contacting the daemon"
)]
fn rejects_unknown_log_level(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "Enabling network map persistence"
)]
fn enables_persistence(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "Invalid persistence values are rejected"
)]
fn rejects_invalid_persistence(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "Creating a one-shot bundle"
)]
fn creates_bundle(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "Invalid durations fail before contacting the daemon"
)]
fn rejects_invalid_duration(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "A rejected persistence change aborts the session"
)]
fn aborts_on_rejected_persistence(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/nbdebug_cli.feature",
    name = "An unreachable daemon is reported"
)]
fn reports_unreachable_daemon(world: RefCell<TestWorld>) {
    let _ = world;
}
