//! Deduplication filter: drop numbers that are already contacts.

use crate::domain::PhoneRecord;
use crate::ports::ContactGateway;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Set difference keyed on E.164. Also collapses numbers repeated in the
/// input, keeping the first occurrence. Records without an E.164 form pass
/// through untouched.
pub fn filter(candidates: Vec<PhoneRecord>, existing: &HashSet<String>) -> Vec<PhoneRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|r| match r.e164() {
            Some(e164) => !existing.contains(e164) && seen.insert(e164.to_string()),
            None => true,
        })
        .collect()
}

/// Looks up existing contacts through the gateway.
pub struct DedupFilter {
    gateway: Arc<dyn ContactGateway>,
}

impl DedupFilter {
    pub fn new(gateway: Arc<dyn ContactGateway>) -> Self {
        Self { gateway }
    }

    /// Existing contacts as a set. A failed lookup yields an empty set: the
    /// import goes ahead without dedup instead of aborting.
    pub async fn existing_contacts(&self) -> HashSet<String> {
        match self.gateway.list_contacts().await {
            Ok(numbers) => {
                info!(count = numbers.len(), "loaded existing contacts");
                numbers.into_iter().collect()
            }
            Err(e) => {
                warn!(error = %e, "existing-contact lookup failed; importing without dedup");
                HashSet::new()
            }
        }
    }

    /// Lookup + filter in one step.
    pub async fn apply(&self, candidates: Vec<PhoneRecord>) -> Vec<PhoneRecord> {
        let existing = self.existing_contacts().await;
        filter(candidates, &existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockContactGateway;
    use crate::domain::{FormattingOptions, Normalizer};

    fn records(nums: &[&str]) -> Vec<PhoneRecord> {
        let n = Normalizer::new("HK", FormattingOptions::default());
        nums.iter().map(|s| n.normalize(s)).collect()
    }

    #[test]
    fn test_filter_removes_existing_and_repeats() {
        let input = records(&["91234567", "61234567", "9123 4567", "51234567"]);
        let existing: HashSet<String> = ["+85251234567".to_string()].into_iter().collect();
        let out = filter(input, &existing);
        let got: Vec<_> = out.iter().filter_map(|r| r.e164()).collect();
        assert_eq!(got, vec!["+85291234567", "+85261234567"]);
    }

    #[test]
    fn test_filter_passes_invalid_through() {
        let out = filter(records(&["abc"]), &HashSet::new());
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_empty() {
        let gw = Arc::new(MockContactGateway::new());
        gw.fail_lookup("timeout");
        let dedup = DedupFilter::new(gw);
        assert!(dedup.existing_contacts().await.is_empty());
        let out = dedup.apply(records(&["91234567"])).await;
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_uses_gateway_contacts() {
        let gw = Arc::new(MockContactGateway::new());
        gw.add_existing("+85291234567");
        let out = DedupFilter::new(gw)
            .apply(records(&["91234567", "61234567"]))
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].e164(), Some("+85261234567"));
    }
}
