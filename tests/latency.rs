//! Integration tests: simulated latency
//!
//! Delay assertions run on the virtual clock. The lock test uses a gated
//! clock that parks the caller until the test releases it.

mod fixtures;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use apk_polkit_mock::mock::{Clock, MockPackageService, VirtualClock};
use apk_polkit_mock::{ApiVersion, ServiceSettings};
use fixtures::{call, strings, v1_service, v2_service, ALL_FIELDS};
use serde_json::json;

const SLOW: Duration = Duration::from_secs(10);
const REFRESH: Duration = Duration::from_secs(2);

// === Slow package sentinel ===

#[test]
fn test_slow_once_regardless_of_position() {
    let batches: [&[&str]; 4] = [
        &["slow"],
        &["first", "slow"],
        &["slow", "middle", "slow"],
        &["a", "b", "c", "slow", "d"],
    ];
    for batch in batches {
        let (svc, clock) = v2_service();
        call(&svc, "AddPackages", vec![strings(batch)]);
        assert_eq!(clock.sleeps(), vec![SLOW], "AddPackages {:?}", batch);

        clock.reset();
        call(&svc, "DeletePackages", vec![strings(batch)]);
        assert_eq!(clock.sleeps(), vec![SLOW], "DeletePackages {:?}", batch);
    }
}

#[test]
fn test_no_delay_without_sentinel() {
    let (svc, clock) = v2_service();
    call(&svc, "AddPackages", vec![strings(&["slowly", "SLOW", "apk-test-app"])]);
    call(&svc, "DeletePackage", vec![json!("not-slow")]);
    call(&svc, "GetPackagesDetails", vec![strings(&["slow"]), json!(ALL_FIELDS)]);
    call(&svc, "UpgradePackages", vec![strings(&["slow"])]);
    assert_eq!(clock.elapsed(), Duration::ZERO);
}

#[test]
fn test_single_package_methods_delay() {
    let (v1, clock) = v1_service();
    call(&v1, "AddPackage", vec![json!("slow")]);
    call(&v1, "DeletePackage", vec![json!("slow")]);
    assert_eq!(clock.sleeps(), vec![SLOW, SLOW]);

    let (v2, clock) = v2_service();
    call(&v2, "DeletePackage", vec![json!("slow")]);
    assert_eq!(clock.sleeps(), vec![SLOW]);
}

// === Repository refresh ===

#[test]
fn test_refresh_delay_v2_only() {
    let (v1, clock) = v1_service();
    call(&v1, "UpdateRepositories", vec![]);
    assert_eq!(clock.elapsed(), Duration::ZERO);

    let (v2, clock) = v2_service();
    call(&v2, "UpdateRepositories", vec![]);
    call(&v2, "UpdateRepositories", vec![]);
    assert_eq!(clock.sleeps(), vec![REFRESH, REFRESH]);
    assert_eq!(clock.elapsed(), Duration::from_secs(4));
}

#[test]
fn test_time_unit_scales_delays() {
    let clock = VirtualClock::new();
    let settings = ServiceSettings {
        time_unit: Duration::from_millis(5),
        ..ServiceSettings::default()
    };
    let svc = MockPackageService::with_settings(ApiVersion::V2, settings, Arc::new(clock.clone()));

    call(&svc, "UpdateRepositories", vec![]);
    call(&svc, "AddPackages", vec![strings(&["slow"])]);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(10), Duration::from_millis(50)]);
}

#[test]
fn test_custom_slow_sentinel() {
    let clock = VirtualClock::new();
    let settings = ServiceSettings {
        slow_package: "sluggish".to_string(),
        ..ServiceSettings::default()
    };
    let svc = MockPackageService::with_settings(ApiVersion::V2, settings, Arc::new(clock.clone()));

    call(&svc, "AddPackages", vec![strings(&["slow"])]);
    assert!(clock.sleeps().is_empty());
    call(&svc, "AddPackages", vec![strings(&["sluggish"])]);
    assert_eq!(clock.sleeps(), vec![SLOW]);
}

// === Delays do not hold the state lock ===

/// Parks the sleeping caller until the test sends a release.
#[derive(Debug)]
struct GatedClock {
    entered: Mutex<Sender<Duration>>,
    release: Mutex<Receiver<()>>,
}

impl Clock for GatedClock {
    fn sleep(&self, duration: Duration) {
        self.entered.lock().unwrap().send(duration).unwrap();
        self.release.lock().unwrap().recv().unwrap();
    }
}

#[test]
fn test_other_calls_proceed_during_delay() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let clock = GatedClock {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let svc = MockPackageService::with_clock(ApiVersion::V2, Arc::new(clock));

    let slow_svc = svc.clone();
    let slow = thread::spawn(move || call(&slow_svc, "AddPackages", vec![strings(&["slow"])]));

    let parked = entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(parked, SLOW);

    // The slow call is parked; reads and writes must not block on it.
    let repos = call(&svc, "ListRepositories", vec![]);
    assert_eq!(repos.as_array().unwrap().len(), 3);
    call(&svc, "ListUpgradablePackages", vec![json!(0)]);
    call(&svc, "UpgradePackages", vec![strings(&["apk-test-app"])]);
    assert_eq!(svc.package("apk-test-app").unwrap().installed_version, "0.2.0-r0");

    release_tx.send(()).unwrap();
    assert_eq!(slow.join().unwrap(), serde_json::Value::Null);
}
