use crate::init_subscriber;
use crate::ir::ModuleOp;
use crate::parser::Parser;
use crate::Error;
use std::cmp::max;
use std::panic::Location;
use tracing::info;

pub struct Tester;

impl Tester {
    /// Initialize the subscriber for the tests.
    ///
    /// Cannot pass options, since the tests run concurrently.
    pub fn init_tracing() {
        let level = tracing::Level::INFO;
        match init_subscriber(level) {
            Ok(_) => (),
            Err(_e) => (),
        }
    }
    fn point_to_missing_line(expected: &str, index: usize) -> String {
        let mut result = String::new();
        result.push_str("A line is missing from the output:\n");
        result.push_str("```");
        for (i, line) in expected.lines().enumerate() {
            if i == index {
                let msg = format!("{line}   <== missing");
                result.push_str(&format!("\n{msg}"));
            } else {
                result.push_str(&format!("\n{line}"));
            }
        }
        result.push_str("\n```");
        result
    }
    pub fn check_lines_exact(actual: &str, expected: &str, caller: &Location<'_>) {
        let actual = actual.trim();
        let expected = expected.trim();
        let l = max(actual.lines().count(), expected.lines().count());
        for i in 0..l {
            let actual_line = match actual.lines().nth(i) {
                None => panic!("Line {i} not found in output: called from {caller}"),
                Some(actual_line) => actual_line,
            };
            let expected_line = match expected.lines().nth(i) {
                None => panic!("Unexpected line {i} in output: called from {caller}"),
                Some(expected_line) => expected_line,
            };
            assert_eq!(actual_line, expected_line, "called from {}", caller);
        }
    }
    /// Check whether the expected lines are present in the actual output.
    ///
    /// The actual output may contain additional lines that are not in the expected output.
    pub fn check_lines_contain(actual: &str, expected: &str, caller: &Location<'_>) {
        let actual = actual.trim();
        let expected = expected.trim();
        let mut actual_index = 0;
        'outer: for (i, expected_line) in expected.lines().enumerate() {
            let expected_line = expected_line.trim();
            // If not skipping these, an empty line will match any line (which
            // can then cause the next expected line to be reported as missing).
            if expected_line.is_empty() {
                continue;
            }
            for (j, actual_line) in actual.lines().enumerate().skip(actual_index) {
                if actual_line.contains(expected_line) {
                    actual_index = j + 1;
                    continue 'outer;
                }
            }
            let msg = Self::point_to_missing_line(expected, i);
            panic!("{msg}\nwhen called from {caller}");
        }
    }
    fn print_heading(msg: &str, src: &str) {
        info!("{msg}:\n```\n{src}\n```\n");
    }
    pub fn parse(src: &str) -> (ModuleOp, String) {
        let src = src.trim();
        Self::print_heading("Before parse", src);
        let module = match Parser::parse(src) {
            Ok(module) => module,
            Err(err) => panic!("{err}"),
        };
        let actual = format!("{module}");
        Self::print_heading("After parse", &actual);
        (module, actual)
    }
    /// Parse `src` and expect it to fail.
    pub fn parse_err(src: &str) -> Error {
        let src = src.trim();
        Self::print_heading("Before parse", src);
        match Parser::parse(src) {
            Ok(module) => panic!("Expected an error, but parsed:\n{module}"),
            Err(err) => {
                info!("Parse failed with: {err}");
                err
            }
        }
    }
    /// Parse `src`, print it, and parse the printed text again.
    ///
    /// Checks that the reparsed module is structurally equal to the first one
    /// and that printing is idempotent.
    pub fn round_trip(src: &str, caller: &Location<'_>) -> (ModuleOp, String) {
        let (module, first) = Self::parse(src);
        let reparsed = match Parser::parse(&first) {
            Ok(module) => module,
            Err(err) => panic!("{err}\nwhen reparsing:\n{first}\ncalled from {caller}"),
        };
        assert!(
            module.structurally_eq(&reparsed),
            "reparsed module differs from the original: called from {caller}"
        );
        let second = reparsed.to_string();
        Self::print_heading("After round trip", &second);
        Self::check_lines_exact(&second, &first, caller);
        (module, first)
    }
}
