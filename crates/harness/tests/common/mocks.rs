use std::time::Duration;

use mockall::mock;
use rtlcheck_core::regress::{DutPlugin, TestCase, TestOutcome, TestRecord};
use rtlcheck_core::HarnessResult;

mock! {
    pub Plugin {}
    impl DutPlugin for Plugin {
        fn name(&self) -> &'static str;
        fn initialize(&mut self) -> HarnessResult<()>;
        fn build(&mut self) -> HarnessResult<()>;
        fn run_test(&self, test: &TestCase) -> TestRecord;
        fn cleanup(&self, tests: &[TestCase]) -> HarnessResult<()>;
    }
}

impl MockPlugin {
    /// A plugin whose `name` may be called any number of times.
    pub fn named() -> Self {
        let mut mock = Self::new();
        mock.expect_name().return_const("mock");
        mock
    }
}

/// Record for a passing test.
pub fn passed(test: &TestCase) -> TestRecord {
    TestRecord {
        name: test.name().to_string(),
        outcome: TestOutcome::Passed { words: 1 },
        duration: Duration::ZERO,
        log: String::new(),
    }
}

/// Test cases with synthetic paths.
pub fn cases(names: &[&str]) -> Vec<TestCase> {
    names
        .iter()
        .map(|name| TestCase::new(*name, format!("{name}.bin").into(), format!("{name}.hex").into()))
        .collect()
}
