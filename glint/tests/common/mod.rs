//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::Once;

use glint::backend::headless::{Headless, HeadlessConfig};
use glint::context::{Configuration, Context};
use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
  // tests run on their own threads, so every test sees only its own records
  static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

struct CapturingLogger;

impl Log for CapturingLogger {
  fn enabled(&self, _: &Metadata) -> bool {
    true
  }

  fn log(&self, record: &Record) {
    RECORDS.with(|records| {
      records
        .borrow_mut()
        .push((record.level(), record.args().to_string()))
    });
  }

  fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;
static INIT: Once = Once::new();

/// Install the capturing logger and forget what the current thread logged so far.
pub fn capture_logs() {
  INIT.call_once(|| {
    log::set_logger(&LOGGER).expect("another logger is installed");
    log::set_max_level(LevelFilter::Trace);
  });

  RECORDS.with(|records| records.borrow_mut().clear());
}

/// Drain the records of the current thread.
pub fn take_logs() -> Vec<(Level, String)> {
  RECORDS.with(|records| std::mem::take(&mut *records.borrow_mut()))
}

/// Drain the messages logged at a given level on the current thread.
pub fn take_messages(level: Level) -> Vec<String> {
  take_logs()
    .into_iter()
    .filter(|(l, _)| *l == level)
    .map(|(_, message)| message)
    .collect()
}

/// Desktop GL 4.6 context with every extension available.
pub fn context() -> Context<Headless> {
  context_with(HeadlessConfig::default(), Configuration::new())
}

pub fn context_with(config: HeadlessConfig, configuration: Configuration) -> Context<Headless> {
  capture_logs();

  let ctx = Context::with_configuration(Headless::new(config), configuration)
    .expect("headless context creation");
  ctx.backend_mut().reset_call_counts();
  take_logs();

  ctx
}

/// Number of calls to a backend method since the last reset.
pub fn calls(ctx: &Context<Headless>, method: &str) -> usize {
  ctx.backend().call_count(method)
}

/// Assert that the backend saw no invalid command.
pub fn assert_no_driver_errors(ctx: &Context<Headless>) {
  let errors = ctx.backend_mut().take_errors();
  assert!(errors.is_empty(), "driver errors: {:#?}", errors);
}
