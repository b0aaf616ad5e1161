//! Contains the runner for an individual test case.

use crate::{
    fixture::TestCase,
    validate::{CaseReport, FixtureValidator},
};
use color_eyre::{eyre::ensure, Result};
use tokio::fs;

/// An individual test case runner.
#[derive(Clone)]
pub(crate) struct RunnableCase {
    /// The test case.
    pub(crate) case: &'static TestCase,
    /// The validator to run the test case with.
    pub(crate) validator: FixtureValidator,
}

impl RunnableCase {
    /// Create a new [RunnableCase].
    pub(crate) fn new(case: &'static TestCase, validator: FixtureValidator) -> Self {
        Self { case, validator }
    }

    /// Checks that the fixture directory of the test case exists.
    pub(crate) async fn check_fixture(&self) -> Result<()> {
        let dir = self.validator.root().join(self.case.path);
        ensure!(
            fs::try_exists(&dir).await?,
            "Fixture directory for {} not found: {}",
            self.case.name,
            dir.display()
        );
        Ok(())
    }

    /// Run the test case and return its report.
    pub(crate) async fn run(&self) -> CaseReport {
        self.validator.validate_case(self.case).await
    }
}
