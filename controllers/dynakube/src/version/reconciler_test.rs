//! Unit tests for the version reconciler

#[cfg(test)]
mod tests {
    use crate::version::{VersionError, VersionReconciler};
    use crate::test_utils::*;
    use crate::version::clock::FrozenClock;
    use crate::version::conditions::*;
    use chrono::{DateTime, TimeZone, Utc};
    use crds::{ConditionStatus, VersionSource, VersionStatus};
    use std::sync::Arc;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn reconciler_at(clock: &Arc<FrozenClock>) -> VersionReconciler {
        VersionReconciler::new(clock.clone())
    }

    fn recorded(version: &str, source: VersionSource, at: DateTime<Utc>) -> VersionStatus {
        VersionStatus {
            version: version.to_string(),
            image_id: format!("{}/linux/oneagent:{}", TEST_REGISTRY, version),
            source: Some(source),
            last_probe_timestamp: Some(at),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_tenant_registry() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new();

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 1);
        assert_eq!(updater.status.version, "1.2.3.4-5");
        assert_eq!(updater.status.source, Some(VersionSource::TenantRegistry));
        assert_eq!(updater.status.last_probe_timestamp, Some(t0()));
        let condition = updater.condition().unwrap();
        assert_eq!(condition.status, ConditionStatus::True);
        assert_eq!(condition.reason, REASON_VERIFIED);
    }

    #[tokio::test]
    async fn test_auto_update_disabled_skips_second_pass() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock);
        let mut updater = FakeUpdater::new().with_auto_update(false);

        reconciler.run(&mut updater).await.unwrap();
        let first = updater.status.clone();
        assert_eq!(updater.probe_count(), 1);

        clock.advance(chrono::Duration::hours(3));
        reconciler.run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 1, "second pass must not contact the tenant");
        assert_eq!(updater.status, first, "skipped pass must not touch the status");
    }

    #[tokio::test]
    async fn test_auto_update_probes_every_pass_without_threshold() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock);
        let mut updater = FakeUpdater::new();

        reconciler.run(&mut updater).await.unwrap();
        clock.advance(chrono::Duration::seconds(1));
        reconciler.run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 2);
        assert_eq!(
            updater.status.last_probe_timestamp,
            Some(t0() + chrono::Duration::seconds(1))
        );
    }

    #[tokio::test]
    async fn test_probe_threshold_throttles_auto_update() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock).with_probe_threshold(Some(Duration::from_secs(600)));
        let mut updater = FakeUpdater::new().with_status(recorded("1.2.3.4-5", VersionSource::TenantRegistry, t0()));

        clock.advance(chrono::Duration::minutes(5));
        reconciler.run(&mut updater).await.unwrap();
        assert_eq!(updater.probe_count(), 0);
        assert_eq!(updater.status.last_probe_timestamp, Some(t0()));

        clock.advance(chrono::Duration::minutes(5));
        reconciler.run(&mut updater).await.unwrap();
        assert_eq!(updater.probe_count(), 1);
        assert_eq!(
            updater.status.last_probe_timestamp,
            Some(t0() + chrono::Duration::minutes(10))
        );
    }

    #[tokio::test]
    async fn test_source_change_forces_probe() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new()
            .with_auto_update(false)
            .with_status(VersionStatus {
                version: VersionSource::CustomImage.as_str().to_string(),
                image_id: "my.registry/oneagent:pinned".to_string(),
                source: Some(VersionSource::CustomImage),
                last_probe_timestamp: Some(t0()),
            });

        clock.advance(chrono::Duration::minutes(1));
        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 1);
        assert_eq!(updater.status.source, Some(VersionSource::TenantRegistry));
        assert_eq!(updater.status.version, "1.2.3.4-5");
    }

    #[tokio::test]
    async fn test_empty_status_forces_probe() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new().with_auto_update(false);

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_version_always_probes() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock);
        let mut updater = FakeUpdater::new()
            .with_custom_version("1.200.0.20240101-000000")
            .with_auto_update(false);

        reconciler.run(&mut updater).await.unwrap();
        reconciler.run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 2);
        assert_eq!(updater.status.version, "1.200.0.20240101-000000");
        assert_eq!(updater.status.source, Some(VersionSource::CustomVersion));
        assert_eq!(updater.condition().unwrap().reason, REASON_VERIFICATION_SKIPPED);
    }

    #[tokio::test]
    async fn test_custom_image_skips_probe() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new().with_custom_image("my.registry.com/oneagent:1.0.0");

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 0);
        assert_eq!(updater.status.image_id, "my.registry.com/oneagent:1.0.0");
        assert_eq!(updater.status.version, "custom-image");
        assert_eq!(updater.status.source, Some(VersionSource::CustomImage));
        assert_eq!(updater.status.last_probe_timestamp, Some(t0()));
        assert_eq!(updater.condition().unwrap().reason, REASON_VERIFICATION_SKIPPED);
    }

    #[tokio::test]
    async fn test_custom_image_is_not_parsed() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new().with_custom_image("incorrect-uri");

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.status.image_id, "incorrect-uri");
        assert_eq!(updater.probe_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_component_is_cleared() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new().with_status(recorded("1.2.3.4-5", VersionSource::TenantRegistry, t0()));
        updater.conditions.push(crds::Condition::new(
            crds::VersionConditionType::OneAgent,
            ConditionStatus::True,
            REASON_VERIFIED,
            "",
            t0(),
        ));
        let mut updater = updater.disabled();

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.status, VersionStatus::default());
        assert!(updater.condition().is_none());
        assert_eq!(updater.probe_count(), 0);
    }

    #[tokio::test]
    async fn test_api_error_leaves_status_untouched() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let previous = recorded("1.2.3.4-5", VersionSource::TenantRegistry, t0());
        let mut updater = FakeUpdater::new()
            .with_status(previous.clone())
            .with_probe(FakeProbe::ApiError("tenant unavailable".to_string()));

        clock.advance(chrono::Duration::hours(1));
        let result = reconciler_at(&clock).run(&mut updater).await;

        assert!(matches!(result, Err(VersionError::Dynatrace(_))));
        assert_eq!(updater.status, previous);
        let condition = updater.condition().unwrap();
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.reason, REASON_DYNATRACE_API_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_image_sets_invalid_version() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new().with_probe(FakeProbe::InvalidImage("registry.com@1.2.3".to_string()));

        let result = reconciler_at(&clock).run(&mut updater).await;

        assert!(matches!(result, Err(VersionError::Image(_))));
        assert_eq!(updater.condition().unwrap().reason, REASON_INVALID_VERSION);
        assert!(updater.status.is_empty());
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock).with_probe_timeout(Duration::from_millis(10));
        let mut updater = FakeUpdater::new().with_probe(FakeProbe::Hang(Duration::from_secs(5)));

        let result = reconciler.run(&mut updater).await;

        assert!(matches!(result, Err(VersionError::ProbeTimeout { .. })));
        assert_eq!(updater.condition().unwrap().reason, REASON_DYNATRACE_API_ERROR);
        assert!(updater.status.last_probe_timestamp.is_none());
    }

    #[tokio::test]
    async fn test_downgrade_keeps_previous_version() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let previous = recorded("1.300.0.20240201-000000", VersionSource::TenantRegistry, t0());
        let mut updater = FakeUpdater::new()
            .with_status(previous.clone())
            .with_downgrade(FakeDowngrade::Yes);

        clock.advance(chrono::Duration::minutes(1));
        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.status.version, previous.version);
        assert_eq!(updater.status.image_id, previous.image_id);
        assert_eq!(updater.condition().unwrap().reason, REASON_DOWNGRADE_SKIPPED);
    }

    #[tokio::test]
    async fn test_downgrade_parse_error_is_reported() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let previous = recorded("1.300.0.20240201-000000", VersionSource::TenantRegistry, t0());
        let mut updater = FakeUpdater::new()
            .with_status(previous.clone())
            .with_downgrade(FakeDowngrade::Invalid);

        let result = reconciler_at(&clock).run(&mut updater).await;

        assert!(matches!(result, Err(VersionError::InvalidVersion { .. })));
        assert_eq!(updater.status, previous);
        assert_eq!(updater.condition().unwrap().reason, REASON_INVALID_VERSION);
    }

    #[tokio::test]
    async fn test_custom_version_bypasses_downgrade_guard() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new()
            .with_status(recorded("1.300.0.20240201-000000", VersionSource::TenantRegistry, t0()))
            .with_custom_version("1.200.0.20240101-000000")
            .with_downgrade(FakeDowngrade::Yes);

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.status.version, "1.200.0.20240101-000000");
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_stamp() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let mut updater = FakeUpdater::new().with_validation_error("build version is not set");

        let result = reconciler_at(&clock).run(&mut updater).await;

        assert!(matches!(result, Err(VersionError::Validation(_))));
        assert_eq!(updater.status.last_probe_timestamp, Some(t0()));
        assert_eq!(updater.status.source, Some(VersionSource::TenantRegistry));
        let condition = updater.condition().unwrap();
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.reason, REASON_VALIDATION_FAILED);
    }

    #[tokio::test]
    async fn test_timestamp_never_moves_backwards() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let future = t0() + chrono::Duration::days(1);
        let mut updater = FakeUpdater::new().with_status(recorded("1.2.3.4-5", VersionSource::TenantRegistry, future));

        reconciler_at(&clock).run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 1);
        assert_eq!(updater.status.last_probe_timestamp, Some(future));
    }

    #[tokio::test]
    async fn test_upgrade_refreshes_verified_message() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock);
        let mut updater = FakeUpdater::new();

        reconciler.run(&mut updater).await.unwrap();
        assert!(updater.condition().unwrap().message.contains("1.2.3.4-5"));

        updater.probe = FakeProbe::Resolve(VersionStatus {
            version: "1.3.0.0-0".to_string(),
            image_id: format!("{}/linux/oneagent:1.3.0.0-0", TEST_REGISTRY),
            ..Default::default()
        });
        clock.advance(chrono::Duration::minutes(10));
        reconciler.run(&mut updater).await.unwrap();

        assert_eq!(updater.status.version, "1.3.0.0-0");
        let condition = updater.condition().unwrap();
        assert_eq!(condition.reason, REASON_VERIFIED);
        assert!(condition.message.contains("1.3.0.0-0"), "message was {}", condition.message);
        assert_eq!(condition.last_transition_time, t0());
    }

    #[tokio::test]
    async fn test_threshold_pass_leaves_status_untouched() {
        let clock = Arc::new(FrozenClock::at(t0()));
        let reconciler = reconciler_at(&clock).with_probe_threshold(Some(Duration::from_secs(3600)));
        let mut updater = FakeUpdater::new();

        reconciler.run(&mut updater).await.unwrap();
        let first_status = updater.status.clone();
        let first_conditions = updater.conditions.clone();

        clock.advance(chrono::Duration::minutes(15));
        reconciler.run(&mut updater).await.unwrap();

        assert_eq!(updater.probe_count(), 1);
        assert_eq!(updater.status, first_status);
        assert_eq!(updater.conditions, first_conditions);
    }
}
