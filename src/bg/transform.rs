use serde::Serialize;
use tracing::debug;

use super::projects::ProjectRow;
use super::stateaid::StateAidRegister;
use crate::output::serialize_optional_amount;

/// Share of a project's total financed by the EU funds
pub const EU_FUNDING_RATIO: f64 = 0.51;

/// Split `"<id> <name>"` at the first whitespace.
///
/// Without a separator the whole value is the name and there is no id. A
/// leading token that is not an integer gives no id, the rest is still the
/// name.
pub fn split_beneficiary(value: &str) -> (Option<i64>, String) {
    match value.split_once(char::is_whitespace) {
        Some((id, name)) => (id.parse().ok(), name.to_string()),
        None => (None, value.to_string()),
    }
}

/// `"07-001-002"` with start year 2014 gives `"201407"`; needs at least two
/// hyphen segments
pub fn program_id(proposal_number: &str, program_start_year: i32) -> Option<String> {
    let (program, _) = proposal_number.split_once('-')?;
    Some(format!("{program_start_year}{program}"))
}

/// All hyphen segments but the last; needs at least three segments
pub fn scheme_key(proposal_number: &str) -> Option<String> {
    let segments: Vec<&str> = proposal_number.split('-').collect();
    if segments.len() < 3 {
        return None;
    }
    Some(segments[..segments.len() - 1].join("-"))
}

/// EU share of a project total, rounded to cents (ties to even)
pub fn eu_amount(total: f64) -> f64 {
    (total * EU_FUNDING_RATIO * 100.0).round_ties_even() / 100.0
}

/// A project with every derived field, waiting for its scheme lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCandidate {
    pub beneficiary_name: String,
    pub beneficiary_id: i64,
    pub program_id: Option<String>,
    pub amount: Option<f64>,
    pub date: String,
    pub scheme_key: String,
}

/// Output row of `bg export`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAid {
    #[serde(rename = "Name of the beneficiary")]
    pub beneficiary_name: String,
    #[serde(rename = "ID of the beneficiary")]
    pub beneficiary_id: i64,
    #[serde(rename = "European operation program (ID)")]
    pub program_id: Option<String>,
    #[serde(rename = "Amounts (€)", serialize_with = "serialize_optional_amount")]
    pub amount: Option<f64>,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "State aid Scheme")]
    pub scheme: String,
}

/// Derive the output fields of each project, dropping rows without a
/// proposal number, a beneficiary id or a scheme key
pub fn derive_candidates(
    projects: &[ProjectRow],
    year: i32,
    program_start_year: i32,
) -> Vec<ProjectCandidate> {
    let candidates: Vec<ProjectCandidate> = projects
        .iter()
        .filter_map(|project| {
            let proposal_number = project.proposal_number.as_deref()?;
            let (beneficiary_id, beneficiary_name) =
                split_beneficiary(project.beneficiary.as_deref()?);

            Some(ProjectCandidate {
                beneficiary_name,
                beneficiary_id: beneficiary_id?,
                program_id: program_id(proposal_number, program_start_year),
                amount: project.total.map(eu_amount),
                date: year.to_string(),
                scheme_key: scheme_key(proposal_number)?,
            })
        })
        .collect();

    debug!(
        "{} of {} projects have a beneficiary id and a scheme key",
        candidates.len(),
        projects.len()
    );
    candidates
}

/// Attach the state aid scheme to each candidate; unmatched ones are dropped
pub fn join_schemes(candidates: Vec<ProjectCandidate>, register: &StateAidRegister) -> Vec<ProjectAid> {
    candidates
        .into_iter()
        .filter_map(|c| {
            let scheme = register.lookup(&c.scheme_key)?;
            Some(ProjectAid {
                beneficiary_name: c.beneficiary_name,
                beneficiary_id: c.beneficiary_id,
                program_id: c.program_id,
                amount: c.amount,
                date: c.date,
                scheme,
            })
        })
        .collect()
}
