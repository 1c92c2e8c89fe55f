//! Classifier for soar output
//!
//! soar writes its own log lines first, each prefixed with a millisecond
//! timestamp, followed by the advice report. The first line without that
//! prefix switches the classifier from the log to the advice for good.

use once_cell::sync::Lazy;
use regex::Regex;

// ASCII digits only, `\d` would also accept other Unicode digits
static LOG_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}/[0-9]{2}/[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}").unwrap()
});

// beego console writer colours the level tag, e.g. "\x1b[1;31m[E]\x1b[0m"
static ERROR_LEVEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\x1b\[[0-9;]*m)?\[[EF]\](?:\x1b\[[0-9;]*m)?$").unwrap());

/// Encoded tokens soar leaves in its JSON-ish report, with their literal form
const ESCAPES: &[(&str, &str)] = &[
    ("\\u003c", "<"),
    ("\\u003e", ">"),
    ("\\n", "\n"),
    ("\\t", "\t"),
];

const CASE_MARKER: &str = "\"Case\":";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Log,
    Advice,
}

/// Result of classifying one soar run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedResult {
    pub advice: String,
    pub diagnostic_log: String,
    /// Error-level log lines, one per line, if soar logged any
    pub tool_error: Option<String>,
}

/// Split raw soar output into advice and diagnostic log
///
/// Pure over its input so it can be fed literal fixtures. Error-level log
/// lines do not stop classification, they only populate `tool_error`.
pub fn classify(raw: &str) -> ClassifiedResult {
    let mut state = State::Log;
    let mut advice = String::new();
    let mut diagnostic_log = String::new();
    let mut error_lines: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = decode_escapes(line);

        if state == State::Log {
            if LOG_LINE_REGEX.is_match(&line) {
                if is_error_line(&line) {
                    error_lines.push(line.clone());
                }
                diagnostic_log.push_str(&line);
                diagnostic_log.push('\n');
                continue;
            }
            state = State::Advice;
        }

        if line.contains(CASE_MARKER) {
            advice.push_str(&line.replace(['\r', '\n'], ""));
        } else {
            advice.push_str(&line);
        }
        advice.push('\n');
    }

    let tool_error = if error_lines.is_empty() { None } else { Some(error_lines.join("\n")) };

    ClassifiedResult { advice, diagnostic_log, tool_error }
}

fn decode_escapes(line: &str) -> String {
    ESCAPES
        .iter()
        .fold(line.to_string(), |acc, (encoded, literal)| acc.replace(encoded, literal))
}

fn is_error_line(line: &str) -> bool {
    line.split(' ')
        .nth(2)
        .map(|token| ERROR_LEVEL_REGEX.is_match(token))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERR_TAG: &str = "\x1b[1;31m[E]\x1b[0m";

    #[test]
    fn test_log_then_advice() {
        let raw = "2022/01/01 00:00:00.000 some log line\nSELECT advice body\n";
        let result = classify(raw);

        assert_eq!(result.diagnostic_log, "2022/01/01 00:00:00.000 some log line\n");
        assert_eq!(result.advice, "SELECT advice body\n");
        assert!(result.tool_error.is_none());
    }

    #[test]
    fn test_all_log_lines_yield_empty_advice() {
        let raw = "2022/01/01 00:00:00.000 [I] start\n2022/01/01 00:00:00.001 [D] done\n";
        let result = classify(raw);

        assert!(result.advice.is_empty());
        assert_eq!(result.diagnostic_log.lines().count(), 2);
    }

    #[test]
    fn test_advice_state_is_terminal() {
        let raw = "2022/01/01 00:00:00.000 [I] start\n# Query: ABC\n2022/01/01 00:00:01.000 looks like a log\n";
        let result = classify(raw);

        assert_eq!(result.diagnostic_log.lines().count(), 1);
        assert_eq!(
            result.advice,
            "# Query: ABC\n2022/01/01 00:00:01.000 looks like a log\n"
        );
    }

    #[test]
    fn test_error_lines_are_extracted() {
        let raw = format!(
            "2022/01/01 00:00:00.000 {} [main.go:10] connect failed\n\
             2022/01/01 00:00:00.001 [I] [main.go:11] continue\n\
             advice line\n",
            ERR_TAG
        );
        let result = classify(&raw);

        let tool_error = result.tool_error.expect("error line should be reported");
        assert!(tool_error.contains("connect failed"));
        assert!(!tool_error.contains("continue"));
        assert_eq!(result.diagnostic_log.lines().count(), 2);
        assert_eq!(result.advice, "advice line\n");
    }

    #[test]
    fn test_fatal_tag_counts_as_error() {
        let raw = "2022/01/01 00:00:00.000 [F] boom\n";
        let result = classify(raw);
        assert_eq!(result.tool_error.as_deref(), Some("2022/01/01 00:00:00.000 [F] boom"));
    }

    #[test]
    fn test_multiple_error_lines_stay_separate() {
        let raw = format!(
            "2022/01/01 00:00:00.000 {ERR_TAG} first failed\n\
             2022/01/01 00:00:00.001 [F] second failed\n\
             # Query: ABC\n"
        );
        let result = classify(&raw);

        assert_eq!(
            result.tool_error.as_deref(),
            Some(
                "2022/01/01 00:00:00.000 \x1b[1;31m[E]\x1b[0m first failed\n\
                 2022/01/01 00:00:00.001 [F] second failed"
            )
        );
        assert_eq!(result.advice, "# Query: ABC\n");
    }

    #[test]
    fn test_full_width_digits_are_not_a_timestamp() {
        let raw = "２０２２/０１/０１ ００:００:００.０００ 建议\n";
        let result = classify(raw);

        assert_eq!(result.advice, raw);
        assert!(result.diagnostic_log.is_empty());
    }

    #[test]
    fn test_warning_tag_is_not_an_error() {
        let raw = "2022/01/01 00:00:00.000 \x1b[1;33m[W]\x1b[0m slow\n";
        assert!(classify(raw).tool_error.is_none());
    }

    #[test]
    fn test_short_log_line_is_not_an_error() {
        let raw = "2022/01/01 00:00:00.000\n";
        let result = classify(raw);
        assert!(result.tool_error.is_none());
        assert_eq!(result.diagnostic_log, raw);
    }

    #[test]
    fn test_escape_decoding() {
        let raw = r"select * from t_meta_db_info where create_time\u003c'2021-01-01'";
        let result = classify(raw);
        assert_eq!(result.advice, "select * from t_meta_db_info where create_time<'2021-01-01'\n");

        let raw = r"a\u003eb\tc";
        assert_eq!(classify(raw).advice, "a>b\tc\n");
    }

    #[test]
    fn test_newline_token_is_decoded_outside_case_lines() {
        let raw = r"first\nsecond";
        assert_eq!(classify(raw).advice, "first\nsecond\n");
    }

    #[test]
    fn test_case_line_stays_on_one_line() {
        let raw = r#"  "Case": "select id\nfrom t\nwhere c = 1","#;
        let result = classify(raw);
        assert_eq!(result.advice, "  \"Case\": \"select idfrom twhere c = 1\",\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(classify(""), ClassifiedResult::default());
    }
}
