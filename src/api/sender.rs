use crate::api::models::{Contact, DeliveryStatus, SendStatus};
use crate::utils::{Delay, RandomSource};
use log::{debug, info};
use std::time::Duration;

/// Pause before each simulated delivery. One message in flight at a time.
pub const SEND_STEP: Duration = Duration::from_millis(600);

/// Share of deliveries the simulated gateway rejects.
pub const FAILURE_RATE: f64 = 0.1;

pub fn outcome(draw: f64) -> DeliveryStatus {
    if draw > FAILURE_RATE {
        DeliveryStatus::Success
    } else {
        DeliveryStatus::Failed
    }
}

/// Delivers to each contact in stored order, waiting [`SEND_STEP`] before
/// each one. `publish` sees the growing result list after every contact.
pub async fn simulate_delivery<F>(
    contacts: &[Contact],
    delay: &dyn Delay,
    random: &dyn RandomSource,
    mut publish: F,
) -> Vec<SendStatus>
where
    F: FnMut(&[SendStatus]),
{
    let mut results = Vec::with_capacity(contacts.len());
    for contact in contacts {
        delay.wait(SEND_STEP).await;
        let status = outcome(random.next_unit());
        debug!("delivery to {} -> {:?}", contact.phone_number, status);
        results.push(SendStatus {
            contact_name: contact.name.clone(),
            phone_number: contact.phone_number.clone(),
            status,
            error: None,
        });
        publish(&results);
    }
    let failed = results
        .iter()
        .filter(|r| r.status == DeliveryStatus::Failed)
        .count();
    info!("send run finished: {} delivered, {} failed", results.len() - failed, failed);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ContactSource;
    use crate::testing::{FixedRandom, RecordingDelay};
    use crate::utils::SeededRandom;

    fn three_contacts() -> Vec<Contact> {
        vec![
            Contact::new("a", "Amal", "0501", ContactSource::Manual),
            Contact::new("b", "Badr", "0501", ContactSource::Cloud),
            Contact::new("c", "Dana", "0503", ContactSource::Phone),
        ]
    }

    #[test]
    fn outcome_threshold() {
        assert_eq!(outcome(0.0), DeliveryStatus::Failed);
        assert_eq!(outcome(0.1), DeliveryStatus::Failed);
        assert_eq!(outcome(0.1000001), DeliveryStatus::Success);
        assert_eq!(outcome(0.99), DeliveryStatus::Success);
    }

    #[tokio::test]
    async fn publishes_incrementally_in_stored_order() {
        let contacts = three_contacts();
        let delay = RecordingDelay::default();
        let mut published = Vec::new();
        let results = simulate_delivery(&contacts, &delay, &SeededRandom::new(3), |r| {
            published.push(r.to_vec())
        })
        .await;

        assert_eq!(results.len(), 3);
        for (k, snapshot) in published.iter().enumerate() {
            assert_eq!(snapshot.len(), k + 1);
        }
        let names: Vec<_> = results.iter().map(|r| r.contact_name.as_str()).collect();
        assert_eq!(names, ["Amal", "Badr", "Dana"]);
        assert!(results
            .iter()
            .all(|r| matches!(r.status, DeliveryStatus::Success | DeliveryStatus::Failed)));
        assert_eq!(delay.waits(), vec![SEND_STEP; 3]);
    }

    #[tokio::test]
    async fn duplicate_numbers_are_not_merged() {
        let contacts = three_contacts();
        let results = simulate_delivery(
            &contacts,
            &RecordingDelay::default(),
            &FixedRandom::new(vec![0.5, 0.05, 0.9]),
            |_| {},
        )
        .await;
        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            [DeliveryStatus::Success, DeliveryStatus::Failed, DeliveryStatus::Success]
        );
        assert_eq!(results[0].phone_number, results[1].phone_number);
    }

    #[tokio::test]
    async fn empty_group_publishes_nothing() {
        let mut calls = 0;
        let results = simulate_delivery(&[], &RecordingDelay::default(), &FixedRandom::new(vec![]), |_| {
            calls += 1
        })
        .await;
        assert!(results.is_empty());
        assert_eq!(calls, 0);
    }
}
