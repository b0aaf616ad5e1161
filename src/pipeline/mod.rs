//! Contains the validation pipeline.

use crate::{
    cli::ValidateConfig,
    fixture::TestCase,
    registry::ChainRegistry,
    validate::{CaseReport, FixtureValidator},
};
use color_eyre::{
    eyre::{bail, ensure, eyre},
    owo_colors::OwoColorize,
    Result,
};
use indicatif::{HumanDuration, MultiProgress, ProgressBar, ProgressStyle};
use itertools::Itertools;
use runnable::RunnableCase;
use std::{
    sync::Arc,
    time::{self, Duration},
};
use tokio::{
    sync::{Mutex, Semaphore},
    task::JoinSet,
};
use tracing::{info, warn};

mod runnable;

/// The [ValidationPipeline] is a pipelined fixture validator, with [Self::setup] and [Self::run]
/// stages.
pub(crate) struct ValidationPipeline<'a> {
    /// The validation configuration.
    cfg: &'a ValidateConfig,
    /// The validator shared by every case.
    validator: FixtureValidator,
    /// The cases to run.
    cases: Option<Vec<RunnableCase>>,
}

impl<'a> ValidationPipeline<'a> {
    pub(crate) fn new(cfg: &'a ValidateConfig, validator: FixtureValidator) -> Self {
        Self {
            cfg,
            validator,
            cases: None,
        }
    }

    /// Sets up the validation pipeline.
    ///
    /// ## Tasks
    /// 1. Gather the test cases selected by the configuration.
    /// 2. Check that each selected case has a fixture directory.
    /// 3. Warn about registered chains that no case covers.
    pub(crate) async fn setup(
        mut self,
        all_cases: &'static [TestCase],
        registry: &dyn ChainRegistry,
    ) -> Result<Self> {
        ensure!(self.cfg.workers > 0, "At least one worker is required");

        let cases = select_cases(all_cases, self.cfg.case.as_deref())?
            .into_iter()
            .map(|case| RunnableCase::new(case, self.validator.clone()))
            .collect::<Vec<_>>();
        if cases.is_empty() {
            bail!("No test cases match {:?}", self.cfg.case);
        }

        for case in cases.iter() {
            case.check_fixture().await?;
        }

        registry
            .chains()
            .into_iter()
            .filter(|id| all_cases.iter().all(|case| case.chain_id != *id))
            .for_each(|id| warn!(target: "pipeline", "Registered chain {id} has no fixture"));

        info!(target: "pipeline", "Selected {} test cases", cases.len());
        self.cases = Some(cases);
        Ok(self)
    }

    /// Runs the selected cases.
    ///
    /// ## Tasks
    /// 1. Schedule the cases to run in parallel in a worker pool.
    /// 2. Summarize the results, failing if any case failed.
    pub(crate) async fn run(self) -> Result<()> {
        let cases = self.cases.clone().ok_or(eyre!("No test cases to run"))?;
        let num_cases = cases.len();

        println!(
            "\nValidating {} fixtures against the superchain registry...",
            num_cases.blue()
        );

        let multi_progress = Arc::new(Mutex::new(MultiProgress::new()));
        let semaphore = Arc::new(Semaphore::new(self.cfg.workers));
        let mut join_set = JoinSet::new();

        // Execute the cases in a parallel worker pool.
        for case in cases {
            let semaphore = semaphore.clone();
            let multi_progress = multi_progress.clone();

            join_set.spawn(async move {
                // Aquire a permit on the semaphore. Once the permit is aquired, we can begin
                // running the test case.
                let _permit = semaphore.acquire().await?;

                // Set up the progress bar.
                let pb = multi_progress.lock().await.add(ProgressBar::new_spinner());
                pb.set_style(
                    ProgressStyle::with_template("{prefix:.bold} {spinner} {wide_msg}")?
                        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
                );
                pb.set_prefix(format!(
                    "{}::{}",
                    case.case.chain_id.magenta(),
                    case.case.name.blue()
                ));
                pb.enable_steady_tick(Duration::from_millis(50));
                pb.set_message("Validating fixture...");

                let start_time = time::Instant::now();
                let report = case.run().await;

                // Notify the user that the case has completed.
                pb.finish_with_message(format!(
                    "{} {} Took {} {} Status: {}",
                    "Done".green().bold(),
                    "|".black(),
                    HumanDuration(start_time.elapsed()).magenta(),
                    "|".black(),
                    if report.passed() {
                        "PASS".green().bold().to_string()
                    } else {
                        "FAIL".red().bold().italic().to_string()
                    }
                ));

                Ok::<_, color_eyre::Report>(report)
            });
        }

        // Join all case tasks.
        let mut reports = Vec::with_capacity(num_cases);
        while let Some(result) = join_set.join_next().await {
            reports.push(result??);
        }
        summarize(reports)
    }
}

/// Selects the cases whose name matches the glob pattern, or every case if none is given.
pub(crate) fn select_cases(
    cases: &'static [TestCase],
    pattern: Option<&str>,
) -> Result<Vec<&'static TestCase>> {
    let glob = glob::Pattern::new(pattern.unwrap_or("*"))?;
    Ok(cases
        .iter()
        .filter(|case| glob.matches(case.name))
        .collect())
}

/// Prints the summary of the reports, and fails if any case failed.
fn summarize(reports: Vec<CaseReport>) -> Result<()> {
    let (passed, failed): (Vec<_>, Vec<_>) = reports
        .into_iter()
        .sorted_by_key(|r| r.case.name)
        .partition(CaseReport::passed);

    println!(
        "{} - {} cases {}, {} cases {}.\n",
        "Completed".bold(),
        passed.len().to_string().blue().bold(),
        "passed".green().bold(),
        failed.len().to_string().blue().bold(),
        "failed".red().bold()
    );

    for report in failed.iter() {
        println!("{}", report.case.name.red().bold());
        for (check, error) in report.failures() {
            println!("  {} {error}", format!("[{check}]").yellow());
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} cases failed: {}",
            failed.len(),
            failed.len() + passed.len(),
            failed.iter().map(|r| r.case.name).join(", ")
        );
    }
    Ok(())
}
