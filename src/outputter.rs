use console::Style;

use crate::asserter::TestReport;
use crate::asserter::TestResult;
use crate::runner::RunSummary;

pub struct OutPutter {
    n_tests: usize,
    i: usize,
    failed_tests: Vec<TestReport>,
}

impl OutPutter {
    pub fn start(test_path: &str, base_url: &str, n_tests: usize) -> Self {
        let style = Style::new().bold().cyan();
        let open_text = &format!(
            "Running test file: {test_path} against {base_url} Found {n_tests} tests: Running..."
        );
        println!("{}", style.apply_to(open_text));

        Self {
            n_tests,
            i: 1,
            failed_tests: vec![],
        }
    }

    pub fn report(&mut self, report: &TestReport) {
        let i = self.i;
        let n_tests = self.n_tests;
        let name = &report.name;
        let target = format!("{} {}", report.method, report.path);

        match report.status {
            TestResult::Pass => println!(
                "[{i}/{n_tests}] {}  {name}: {} {}",
                console::style("✔").green().bold(),
                console::style(target).dim(),
                console::style("PASS!").green().bold(),
            ),
            TestResult::Fail => println!(
                "[{i}/{n_tests}] {}  {name}: {} {}",
                console::style("╳").red().bold(),
                console::style(target).dim(),
                console::style("FAILED!").red().bold(),
            ),
            TestResult::Error => println!(
                "[{i}/{n_tests}] {}  {name}: {} {}",
                console::style("⚠").yellow().bold(),
                console::style(target).dim(),
                console::style("ERROR!").yellow().bold(),
            ),
        }

        if report.status != TestResult::Pass {
            self.failed_tests.push(report.clone());
        }
        self.i += 1;
    }

    pub fn finish(&self, summary: &RunSummary) {
        println!();

        if self.failed_tests.is_empty() {
            println!("{}", console::style("All tests passed! 🎉").bold().green());
        } else {
            println!(
                "{}",
                console::style("Summary of Failed Tests:").bold().red()
            );
            for (idx, report) in self.failed_tests.iter().enumerate() {
                println!("\n{} {}", idx + 1, console::style(&report.name).bold());

                if let Some(error) = &report.error {
                    println!(
                        "  {} {}",
                        console::style("Request failed with error:").yellow(),
                        console::style(error).yellow().bold()
                    );
                    continue;
                }

                for result in report
                    .results
                    .iter()
                    .filter(|r| r.status != TestResult::Pass)
                {
                    println!("{result}");
                }
            }
            println!();
        }

        println!(
            "{} passed, {} failed, {} errored ({} total)",
            console::style(summary.passed).green().bold(),
            console::style(summary.failed).red().bold(),
            console::style(summary.errored).yellow().bold(),
            summary.total()
        );
    }
}
