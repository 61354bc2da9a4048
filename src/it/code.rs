use regex::Regex;
use std::sync::LazyLock;

static MEASURE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SA[. ](\d+)").expect("measure code pattern is valid"));

/// Normalise a free-text EU measure code to `SA.<digits>`.
///
/// The first `SA` followed by a space or a period and digits anywhere in the
/// text is used; `None` when there is no such code.
pub fn normalize_code(value: &str) -> Option<String> {
    MEASURE_CODE
        .captures(value)
        .map(|caps| format!("SA.{}", &caps[1]))
}
