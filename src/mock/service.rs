//! Mock Package Service
//!
//! The stateful stand-in for the apk-polkit helper. Typed operations live
//! here; [`MethodTable`](super::dispatch::MethodTable) maps wire method
//! names and argument lists onto them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use apk_protocol::{
    ApiVersion, ErrorCode, Package, PackageFields, PackageRecord, Repository, RpcError, RpcRequest,
    RpcResponse,
};
use serde_json::Value;
use tracing::{debug, info};

use super::calls::{CallLog, CallRecord};
use super::clock::{Clock, SystemClock};
use super::dispatch::MethodTable;
use super::fixtures;
use super::state::MockState;

/// Sentinels and latency knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Length of one simulated time unit.
    pub time_unit: Duration,
    /// Units `UpdateRepositories` blocks for in the batch API.
    pub refresh_delay_units: u32,
    /// Units add/delete calls block for when the slow package is named.
    pub slow_delay_units: u32,
    pub slow_package: String,
    pub owned_path: String,
    pub owned_path_package: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            refresh_delay_units: 2,
            slow_delay_units: 10,
            slow_package: fixtures::SLOW_PACKAGE.to_string(),
            owned_path: fixtures::OWNED_PATH.to_string(),
            owned_path_package: fixtures::OWNED_PATH_PACKAGE.to_string(),
        }
    }
}

impl ServiceSettings {
    pub fn refresh_delay(&self) -> Duration {
        self.units(self.refresh_delay_units)
    }

    pub fn slow_delay(&self) -> Duration {
        self.units(self.slow_delay_units)
    }

    /// `count` time units, saturating at `Duration::MAX`.
    fn units(&self, count: u32) -> Duration {
        self.time_unit.checked_mul(count).unwrap_or(Duration::MAX)
    }
}

/// Mock apk-polkit helper.
///
/// Clones share state, call log and clock, so one instance can be handed
/// to every connection thread.
#[derive(Debug, Clone)]
pub struct MockPackageService {
    api: ApiVersion,
    settings: Arc<ServiceSettings>,
    state: Arc<Mutex<MockState>>,
    calls: Arc<Mutex<CallLog>>,
    clock: Arc<dyn Clock>,
    methods: Arc<MethodTable>,
}

impl MockPackageService {
    /// Service with default settings and the real clock.
    pub fn new(api: ApiVersion) -> Self {
        Self::with_settings(api, ServiceSettings::default(), Arc::new(SystemClock))
    }

    pub fn with_settings(api: ApiVersion, settings: ServiceSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(MockState::seeded(api))),
            calls: Arc::new(Mutex::new(CallLog::new())),
            clock,
            methods: Arc::new(MethodTable::for_api(api)),
        }
    }

    /// Default settings with a caller-supplied clock.
    pub fn with_clock(api: ApiVersion, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(api, ServiceSettings::default(), clock)
    }

    pub fn api(&self) -> ApiVersion {
        self.api
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    // === Request handling ===

    /// Dispatch a wire method call.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, RpcError> {
        let spec = self
            .methods
            .get(method)
            .ok_or_else(|| RpcError::unknown_method(method))?;
        if spec.is_helper_method() {
            self.lock_calls().record(method, args);
        }
        debug!(method, args = args.len(), "dispatching call");
        spec.invoke(self, args)
    }

    /// Handle an RPC envelope (in-process library mode).
    pub fn handle_request(&self, request: &RpcRequest) -> RpcResponse {
        match self.call(&request.method, &request.args) {
            Ok(result) => RpcResponse::success(request.request_id.clone(), result),
            Err(err) => {
                if err.code != ErrorCode::UnknownMethod {
                    debug!(method = %request.method, error = %err, "call rejected");
                }
                RpcResponse::error(request.request_id.clone(), err)
            }
        }
    }

    /// Handle a JSON request string (convenience method).
    pub fn handle_json(&self, json_request: &str) -> Result<String, serde_json::Error> {
        let request: RpcRequest = serde_json::from_str(json_request)?;
        let response = self.handle_request(&request);
        serde_json::to_string(&response)
    }

    // === Repository operations ===

    pub fn list_repositories(&self) -> Vec<Repository> {
        self.lock_state().repositories().to_vec()
    }

    /// Accepted and ignored; the repository list is not persisted.
    pub fn add_repository(&self, name: &str) {
        debug!(repository = name, "add repository (not persisted)");
    }

    /// Accepted and ignored, whether or not `name` exists.
    pub fn remove_repository(&self, name: &str) {
        debug!(repository = name, "remove repository (not persisted)");
    }

    /// Refresh repository indexes. Runs a discovery pass, and in the batch
    /// API blocks for the configured refresh delay.
    pub fn update_repositories(&self) {
        let pending = self.lock_state().discover().len();
        debug!(pending, "repositories refreshed");
        if self.api == ApiVersion::V2 {
            self.simulate_delay(self.settings.refresh_delay(), "repository refresh");
        }
    }

    // === Package operations ===

    /// Run a discovery pass and return every package with a pending
    /// transition, projected to `fields`.
    pub fn list_upgradable_packages(&self, fields: PackageFields) -> Vec<PackageRecord> {
        self.lock_state()
            .discover()
            .into_iter()
            .map(|p| PackageRecord::found(p).project(fields))
            .collect()
    }

    /// One record per name, in order. Unknown names yield a not-found
    /// marker in their slot.
    pub fn get_packages_details(&self, names: &[String], fields: PackageFields) -> Vec<PackageRecord> {
        let state = self.lock_state();
        names
            .iter()
            .map(|name| match state.package(name) {
                Some(pkg) => PackageRecord::found(pkg.clone()).project(fields),
                None => PackageRecord::missing(name.as_str()),
            })
            .collect()
    }

    /// Apply the staged version of every known name. Unknown names are
    /// ignored.
    pub fn upgrade_packages(&self, names: &[String]) {
        let mut state = self.lock_state();
        for name in names {
            if state.apply_staged(name) {
                debug!(package = %name, "staged version applied");
            }
        }
    }

    /// Simulate an install. The table is not modified.
    pub fn add_packages(&self, names: &[String]) {
        debug!(packages = ?names, "simulated install");
        self.delay_if_slow(names);
    }

    /// Simulate a removal. The table is not modified.
    pub fn delete_packages(&self, names: &[String]) {
        debug!(packages = ?names, "simulated removal");
        self.delay_if_slow(names);
    }

    /// One record per path, in order: the owning package for the known
    /// path, an empty record otherwise.
    pub fn search_file_owners(&self, paths: &[String], fields: PackageFields) -> Vec<PackageRecord> {
        paths
            .iter()
            .map(|path| {
                if *path == self.settings.owned_path {
                    let owner = Package::named(self.settings.owned_path_package.as_str());
                    PackageRecord::found(owner).project(fields & PackageFields::NAME)
                } else {
                    PackageRecord::Empty
                }
            })
            .collect()
    }

    pub fn list_installed_packages(&self, fields: PackageFields) -> Vec<PackageRecord> {
        self.lock_state()
            .installed()
            .into_iter()
            .map(|p| PackageRecord::found(p).project(fields))
            .collect()
    }

    /// Packages whose name contains any of `terms`.
    pub fn search_packages(&self, terms: &[String], fields: PackageFields) -> Vec<PackageRecord> {
        self.lock_state()
            .search(terms)
            .into_iter()
            .map(|p| PackageRecord::found(p).project(fields))
            .collect()
    }

    // === Test harness surface ===

    /// Current record for `name` (for test assertions).
    pub fn package(&self, name: &str) -> Option<Package> {
        self.lock_state().package(name).cloned()
    }

    /// Change the newest version advertised for `name`.
    pub fn set_newest_version(&self, name: &str, version: &str) -> bool {
        self.lock_state().set_newest_version(name, version)
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock_calls().all().to_vec()
    }

    pub fn method_calls(&self, method: &str) -> Vec<CallRecord> {
        self.lock_calls().for_method(method)
    }

    pub fn clear_calls(&self) {
        self.lock_calls().clear();
    }

    /// Reseed both tables from fixtures.
    pub fn reset(&self) {
        *self.lock_state() = MockState::seeded(self.api);
        info!(api = %self.api, "state reseeded from fixtures");
    }

    // === Internal helpers ===

    fn delay_if_slow(&self, names: &[String]) {
        if names.iter().any(|n| *n == self.settings.slow_package) {
            self.simulate_delay(self.settings.slow_delay(), "slow package");
        }
    }

    /// Suspend the calling request. Never called with the state lock held.
    fn simulate_delay(&self, duration: Duration, reason: &str) {
        info!(?duration, reason, "simulating latency");
        self.clock.sleep(duration);
    }

    fn lock_state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_calls(&self) -> MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
