use std::sync::Arc;

use url::Url;

use crate::asserter::Assert;
use crate::asserter::Assertion;
use crate::asserter::TestReport;
use crate::asserter::TestResult;
use crate::harness::Harness;
use crate::harness::HarnessError;
use crate::outputter::OutPutter;
use crate::response::CapturedResponse;
use crate::validator::IR;

#[derive(Debug)]
pub struct RunnerResult {
    pub name: String,
    pub method: String,
    pub url: Url,
    pub response: Result<CapturedResponse, HarnessError>,
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    fn record(&mut self, report: &TestReport) {
        match report.status {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail => self.failed += 1,
            TestResult::Error => self.errored += 1,
        }
    }
}

/// Runs every test in `ir` one after the other.
///
/// Each test is sent, read and asserted before the next one starts. A test
/// that errors does not stop the ones after it.
pub async fn run_suite(harness: &Harness, ir: IR, outputter: &mut OutPutter) -> RunSummary {
    let mut summary = RunSummary::default();

    for test in ir.tests {
        let url = match harness.target(&test.request) {
            Ok(url) => url,
            Err(e) => {
                let report = TestReport {
                    name: test.name,
                    method: test.request.method.to_string(),
                    path: test.request.path,
                    status: TestResult::Error,
                    results: Arc::from([]),
                    error: Some(e.to_string()),
                };
                summary.record(&report);
                outputter.report(&report);
                continue;
            }
        };

        let response = harness.send(&test.request).await;

        let report = RunnerResult {
            name: test.name,
            method: test.request.method.to_string(),
            url,
            response,
            assertions: test.assertions,
        }
        .assert();

        summary.record(&report);
        outputter.report(&report);
    }

    outputter.finish(&summary);

    summary
}
