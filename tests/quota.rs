//! Entitlement Gate Integration Tests
//!
//! Quota persistence and gating across gate instances, simulating separate
//! invocations sharing the same data directory.

use std::sync::Arc;

use tempfile::TempDir;

use defter::core::EntitlementGate;
use defter::domain::{SubscriptionPlan, UpsellTrigger};
use defter::store::QuotaStore;

fn gate_for(temp: &TempDir) -> EntitlementGate {
    EntitlementGate::new(Arc::new(QuotaStore::new(temp.path())))
}

#[tokio::test]
async fn test_usage_survives_gate_restart() {
    let temp = TempDir::new().unwrap();

    {
        let gate = gate_for(&temp);
        gate.use_ai_question("u1").await.unwrap();
        gate.use_ai_question("u1").await.unwrap();
        gate.use_recording("u1").await.unwrap();
    }

    // A new gate over the same directory sees the consumed quota
    let gate = gate_for(&temp);
    assert_eq!(
        gate.remaining_ai_questions("u1", SubscriptionPlan::Free)
            .await
            .unwrap(),
        1
    );
    assert!(!gate.can_record("u1", SubscriptionPlan::Free).await.unwrap());
}

#[tokio::test]
async fn test_users_are_isolated() {
    let temp = TempDir::new().unwrap();
    let gate = gate_for(&temp);

    gate.use_recording("u1").await.unwrap();

    assert!(!gate.can_record("u1", SubscriptionPlan::Free).await.unwrap());
    assert!(gate.can_record("u2", SubscriptionPlan::Free).await.unwrap());
}

#[tokio::test]
async fn test_plan_upgrade_reopens_the_gate() {
    let temp = TempDir::new().unwrap();
    let gate = gate_for(&temp);

    gate.use_recording("u1").await.unwrap();

    // Same counters, different thresholds: the denial is a plan property
    assert!(!gate.can_record("u1", SubscriptionPlan::Free).await.unwrap());
    assert!(gate
        .can_record("u1", SubscriptionPlan::Starter)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_ai_gate_denies_at_plan_limit() {
    let temp = TempDir::new().unwrap();
    let gate = gate_for(&temp);

    for _ in 0..20 {
        gate.use_ai_question("u1").await.unwrap();
    }

    assert!(!gate.can_ask_ai("u1", SubscriptionPlan::Free).await.unwrap());
    assert!(!gate
        .can_ask_ai("u1", SubscriptionPlan::Starter)
        .await
        .unwrap());
    assert!(gate.can_ask_ai("u1", SubscriptionPlan::Pro).await.unwrap());
}

#[tokio::test]
async fn test_manual_upsell_always_fires() {
    let temp = TempDir::new().unwrap();
    let gate = gate_for(&temp);

    for plan in [
        SubscriptionPlan::Free,
        SubscriptionPlan::Starter,
        SubscriptionPlan::Pro,
    ] {
        let fired = gate
            .trigger_upsell_if_needed(UpsellTrigger::Manual, "u1", plan)
            .await
            .unwrap();
        assert_eq!(fired, Some(UpsellTrigger::Manual));
    }
}

#[tokio::test]
async fn test_notifications_upsell_only_for_free_plan() {
    let temp = TempDir::new().unwrap();
    let gate = gate_for(&temp);

    // Starter lacks prayer notifications, but the prompt still targets
    // free users only
    assert_eq!(
        gate.trigger_upsell_if_needed(UpsellTrigger::Notifications, "u1", SubscriptionPlan::Starter)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        gate.trigger_upsell_if_needed(UpsellTrigger::Notifications, "u1", SubscriptionPlan::Pro)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        gate.trigger_upsell_if_needed(UpsellTrigger::Notifications, "u1", SubscriptionPlan::Free)
            .await
            .unwrap(),
        Some(UpsellTrigger::Notifications)
    );
}

#[tokio::test]
async fn test_upsell_copy_is_user_facing() {
    assert_eq!(UpsellTrigger::Recording.title(), "Kayıt Limitine Ulaştın");
    assert!(UpsellTrigger::AiProcessing
        .message()
        .contains("Günlük soru limitine ulaştın"));
    assert_eq!(UpsellTrigger::Search.title(), "Pro Özelliği");
}
