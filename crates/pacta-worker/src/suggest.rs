//! Suggested-contract matching: rank candidate contracts against extracted
//! fields. The repository narrows candidates with an ILIKE query; scoring
//! happens here, in process.

use pacta_core::models::{Contract, ExtractedFields};
use uuid::Uuid;

/// Minimum score a candidate must reach to be suggested at all.
const SUGGESTION_THRESHOLD: f64 = 0.5;

/// Token-overlap similarity between two names in [0, 1].
fn name_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: Vec<String> = normalize_tokens(a);
    let tokens_b: Vec<String> = normalize_tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let shared = tokens_a.iter().filter(|t| tokens_b.contains(t)).count();
    (2.0 * shared as f64) / (tokens_a.len() + tokens_b.len()) as f64
}

fn normalize_tokens(value: &str) -> Vec<String> {
    value
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        // Corporate suffixes carry no signal and inflate mismatches
        .filter(|t| !matches!(*t, "inc" | "llc" | "ltd" | "corp" | "co" | "gmbh"))
        .map(|t| t.to_string())
        .collect()
}

/// Score one candidate contract against the extracted fields.
pub fn score_candidate(fields: &ExtractedFields, contract: &Contract) -> f64 {
    // An exact contract-number match is as strong as a signal gets
    if let (Some(extracted), Some(existing)) = (&fields.contract_number, &contract.contract_number)
    {
        if extracted.eq_ignore_ascii_case(existing) {
            return 1.0;
        }
    }

    fields
        .counterparty_name
        .as_deref()
        .map(|name| name_similarity(name, &contract.counterparty_name))
        .unwrap_or(0.0)
}

/// Pick the best candidate above the suggestion threshold, if any.
pub fn best_suggestion(fields: &ExtractedFields, candidates: &[Contract]) -> Option<Uuid> {
    candidates
        .iter()
        .map(|c| (c.id, score_candidate(fields, c)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pacta_core::models::ContractStatus;

    fn contract(counterparty: &str, number: Option<&str>) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            contract_type: "service_agreement".to_string(),
            contract_number: number.map(String::from),
            status: ContractStatus::Active,
            counterparty_name: counterparty.to_string(),
            counterparty_address: None,
            counterparty_email: None,
            effective_date: None,
            expiry_date: None,
            execution_date: None,
            renewal_date: None,
            value: None,
            currency: None,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fields(counterparty: Option<&str>, number: Option<&str>) -> ExtractedFields {
        ExtractedFields {
            counterparty_name: counterparty.map(String::from),
            contract_number: number.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_number_match_wins() {
        let candidate = contract("Totally Different Name", Some("SA-2024-001"));
        let score = score_candidate(&fields(Some("Acme Corp"), Some("sa-2024-001")), &candidate);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_name_similarity_ignores_corporate_suffixes() {
        let candidate = contract("Acme Corp", None);
        let score = score_candidate(&fields(Some("Acme Inc"), None), &candidate);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        let candidate = contract("Globex Industries", None);
        let score = score_candidate(&fields(Some("Acme Corp"), None), &candidate);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_best_suggestion_picks_highest_above_threshold() {
        let weak = contract("Acme Holdings International", None);
        let strong = contract("Acme Corp", None);
        let unrelated = contract("Globex", None);
        let candidates = vec![weak, strong.clone(), unrelated];

        let suggestion = best_suggestion(&fields(Some("Acme Corporation"), None), &candidates);
        // "Acme Corporation" normalizes to ["acme", "corporation"];
        // only "Acme Corp" -> ["acme"] reaches the threshold (2*1/3 ≈ 0.67)
        assert_eq!(suggestion, Some(strong.id));
    }

    #[test]
    fn test_no_suggestion_when_nothing_matches() {
        let candidates = vec![contract("Globex", None)];
        assert_eq!(
            best_suggestion(&fields(Some("Acme Corp"), None), &candidates),
            None
        );
    }

    #[test]
    fn test_no_suggestion_without_extracted_fields() {
        let candidates = vec![contract("Acme Corp", None)];
        assert_eq!(best_suggestion(&fields(None, None), &candidates), None);
    }
}
