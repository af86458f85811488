//! Method dispatch table.
//!
//! Each API generation gets its own static table of [`MethodSpec`]s. The
//! table checks argument arity against the input signature and decodes
//! arguments before a handler runs, so handlers themselves never fail.

use std::collections::HashMap;

use apk_protocol::{methods, ApiVersion, PackageFields, PackageRecord, RpcError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::service::MockPackageService;

/// Handler signature shared by every table entry.
pub type Handler = fn(&MockPackageService, &Args<'_>) -> Result<Value, RpcError>;

/// Interface a method belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodInterface {
    /// The package helper itself. Calls are recorded in the call log.
    Helper,
    /// `org.freedesktop.DBus.Mock` control surface. Not recorded.
    Mock,
}

/// One dispatchable method.
#[derive(Clone, Copy)]
pub struct MethodSpec {
    pub name: &'static str,
    pub interface: MethodInterface,
    /// D-Bus input signature, e.g. `asu`.
    pub in_signature: &'static str,
    /// D-Bus output signature, empty for void methods.
    pub out_signature: &'static str,
    pub handler: Handler,
}

impl std::fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("interface", &self.interface)
            .field("in_signature", &self.in_signature)
            .field("out_signature", &self.out_signature)
            .finish()
    }
}

impl MethodSpec {
    pub fn is_helper_method(&self) -> bool {
        self.interface == MethodInterface::Helper
    }

    /// Interface name as seen on the bus.
    pub fn interface_name(&self, api: ApiVersion) -> &'static str {
        match self.interface {
            MethodInterface::Helper => api.interface(),
            MethodInterface::Mock => methods::mock::INTERFACE,
        }
    }

    /// Check arity, then run the handler.
    pub fn invoke(&self, service: &MockPackageService, values: &[Value]) -> Result<Value, RpcError> {
        let expected = signature_arity(self.in_signature);
        if values.len() != expected {
            return Err(RpcError::invalid_args(
                self.name,
                self.in_signature,
                format!("expected {} argument(s), got {}", expected, values.len()),
            ));
        }
        let args = Args {
            method: self.name,
            signature: self.in_signature,
            values,
        };
        (self.handler)(service, &args)
    }
}

/// Positional call arguments with typed access.
#[derive(Debug)]
pub struct Args<'a> {
    method: &'static str,
    signature: &'static str,
    values: &'a [Value],
}

impl Args<'_> {
    /// Decode argument `idx` as `T`.
    pub fn get<T: DeserializeOwned>(&self, idx: usize) -> Result<T, RpcError> {
        let value = self.values.get(idx).ok_or_else(|| {
            RpcError::invalid_args(self.method, self.signature, format!("missing argument {}", idx))
        })?;
        T::deserialize(value).map_err(|e| {
            RpcError::invalid_args(self.method, self.signature, format!("argument {}: {}", idx, e))
        })
    }

    /// Encode a handler result; a failure becomes an `INTERNAL_ERROR`.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Value, RpcError> {
        serde_json::to_value(value).map_err(|e| RpcError::internal(self.method, e))
    }

    fn fields(&self, idx: usize) -> Result<PackageFields, RpcError> {
        self.get::<u32>(idx).map(PackageFields::from_bits)
    }
}

/// Number of complete types in a D-Bus signature.
pub fn signature_arity(signature: &str) -> usize {
    let mut count = 0;
    let mut depth = 0usize;
    let mut chars = signature.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            // Array prefix: the element type that follows completes it.
            'a' => continue,
            '(' | '{' => depth += 1,
            ')' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    count += 1;
                }
            }
            _ if depth == 0 => count += 1,
            _ => {}
        }
    }
    count
}

/// Methods of one API generation, in declaration order.
#[derive(Debug)]
pub struct MethodTable {
    api: ApiVersion,
    specs: Vec<MethodSpec>,
    index: HashMap<&'static str, usize>,
}

impl MethodTable {
    pub fn for_api(api: ApiVersion) -> Self {
        let mut specs = match api {
            ApiVersion::V1 => v1_methods(),
            ApiVersion::V2 => v2_methods(),
        };
        specs.extend(mock_methods());
        let index = specs.iter().enumerate().map(|(i, s)| (s.name, i)).collect();
        Self { api, specs, index }
    }

    pub fn api(&self) -> ApiVersion {
        self.api
    }

    pub fn get(&self, name: &str) -> Option<&MethodSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

const fn helper(
    name: &'static str,
    in_signature: &'static str,
    out_signature: &'static str,
    handler: Handler,
) -> MethodSpec {
    MethodSpec {
        name,
        interface: MethodInterface::Helper,
        in_signature,
        out_signature,
        handler,
    }
}

const fn mock(
    name: &'static str,
    in_signature: &'static str,
    out_signature: &'static str,
    handler: Handler,
) -> MethodSpec {
    MethodSpec {
        name,
        interface: MethodInterface::Mock,
        in_signature,
        out_signature,
        handler,
    }
}

fn v1_methods() -> Vec<MethodSpec> {
    vec![
        helper(methods::LIST_REPOSITORIES, "", "a(bss)", list_repositories),
        helper(methods::ADD_REPOSITORY, "s", "", add_repository),
        helper(methods::REMOVE_REPOSITORY, "s", "", remove_repository),
        helper(methods::UPDATE_REPOSITORIES, "", "", update_repositories),
        helper(methods::LIST_UPGRADABLE_PACKAGES, "", "a(ssssssttu)", v1_list_upgradable),
        helper(methods::GET_PACKAGE_DETAILS, "s", "(ssssssttu)", v1_package_details),
        helper(methods::UPGRADE_PACKAGE, "s", "", v1_upgrade_package),
        helper(methods::ADD_PACKAGE, "s", "", v1_add_package),
        helper(methods::DELETE_PACKAGE, "s", "", delete_package),
        helper(methods::LIST_INSTALLED_PACKAGES, "", "a(ssssssttu)", v1_list_installed),
        helper(methods::SEARCH_FOR_PACKAGES, "as", "a(ssssssttu)", v1_search),
    ]
}

fn v2_methods() -> Vec<MethodSpec> {
    vec![
        helper(methods::LIST_REPOSITORIES, "", "a(bss)", list_repositories),
        helper(methods::ADD_REPOSITORY, "s", "", add_repository),
        helper(methods::REMOVE_REPOSITORY, "s", "", remove_repository),
        helper(methods::UPDATE_REPOSITORIES, "", "", update_repositories),
        helper(methods::LIST_UPGRADABLE_PACKAGES, "u", "aa{sv}", v2_list_upgradable),
        helper(methods::GET_PACKAGES_DETAILS, "asu", "aa{sv}", v2_packages_details),
        helper(methods::UPGRADE_PACKAGES, "as", "", v2_upgrade_packages),
        helper(methods::ADD_PACKAGES, "as", "", v2_add_packages),
        helper(methods::DELETE_PACKAGES, "as", "", v2_delete_packages),
        helper(methods::DELETE_PACKAGE, "s", "", delete_package),
        helper(methods::SEARCH_FILES_OWNERS, "asu", "aa{sv}", v2_search_files_owners),
        helper(methods::LIST_INSTALLED_PACKAGES, "u", "aa{sv}", v2_list_installed),
        helper(methods::SEARCH_PACKAGE_NAMES, "asu", "aa{sv}", v2_search),
    ]
}

fn mock_methods() -> Vec<MethodSpec> {
    vec![
        mock(methods::mock::GET_CALLS, "", "a(tsav)", get_calls),
        mock(methods::mock::GET_METHOD_CALLS, "s", "a(tav)", get_method_calls),
        mock(methods::mock::CLEAR_CALLS, "", "", clear_calls),
        mock(methods::mock::RESET, "", "", reset),
    ]
}

// === Encoding helpers ===

fn v1_list(args: &Args<'_>, records: Vec<PackageRecord>) -> Result<Value, RpcError> {
    records
        .iter()
        .map(|r| args.encode(&r.to_v1_tuple()))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn v2_list(records: Vec<PackageRecord>) -> Value {
    Value::Array(records.iter().map(|r| Value::Object(r.to_v2_map())).collect())
}

// === Shared handlers ===

fn list_repositories(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    args.encode(&service.list_repositories())
}

fn add_repository(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.add_repository(&args.get::<String>(0)?);
    Ok(Value::Null)
}

fn remove_repository(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.remove_repository(&args.get::<String>(0)?);
    Ok(Value::Null)
}

fn update_repositories(service: &MockPackageService, _args: &Args<'_>) -> Result<Value, RpcError> {
    service.update_repositories();
    Ok(Value::Null)
}

fn delete_package(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.delete_packages(&[args.get::<String>(0)?]);
    Ok(Value::Null)
}

// === v1 handlers ===

fn v1_list_upgradable(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    v1_list(args, service.list_upgradable_packages(PackageFields::ALL))
}

fn v1_package_details(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    let name: String = args.get(0)?;
    let records = service.get_packages_details(&[name], PackageFields::ALL);
    match records.first() {
        Some(record) => args.encode(&record.to_v1_tuple()),
        None => Ok(Value::Null),
    }
}

fn v1_upgrade_package(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.upgrade_packages(&[args.get::<String>(0)?]);
    Ok(Value::Null)
}

fn v1_add_package(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.add_packages(&[args.get::<String>(0)?]);
    Ok(Value::Null)
}

fn v1_list_installed(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    v1_list(args, service.list_installed_packages(PackageFields::ALL))
}

fn v1_search(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    let terms: Vec<String> = args.get(0)?;
    v1_list(args, service.search_packages(&terms, PackageFields::ALL))
}

// === v2 handlers ===

fn v2_list_upgradable(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    Ok(v2_list(service.list_upgradable_packages(args.fields(0)?)))
}

fn v2_packages_details(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    let names: Vec<String> = args.get(0)?;
    Ok(v2_list(service.get_packages_details(&names, args.fields(1)?)))
}

fn v2_upgrade_packages(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.upgrade_packages(&args.get::<Vec<String>>(0)?);
    Ok(Value::Null)
}

fn v2_add_packages(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.add_packages(&args.get::<Vec<String>>(0)?);
    Ok(Value::Null)
}

fn v2_delete_packages(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    service.delete_packages(&args.get::<Vec<String>>(0)?);
    Ok(Value::Null)
}

fn v2_search_files_owners(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    let paths: Vec<String> = args.get(0)?;
    Ok(v2_list(service.search_file_owners(&paths, args.fields(1)?)))
}

fn v2_list_installed(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    Ok(v2_list(service.list_installed_packages(args.fields(0)?)))
}

fn v2_search(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    let terms: Vec<String> = args.get(0)?;
    Ok(v2_list(service.search_packages(&terms, args.fields(1)?)))
}

// === Mock control handlers ===

fn get_calls(service: &MockPackageService, _args: &Args<'_>) -> Result<Value, RpcError> {
    Ok(Value::Array(service.calls().iter().map(|c| c.to_wire()).collect()))
}

fn get_method_calls(service: &MockPackageService, args: &Args<'_>) -> Result<Value, RpcError> {
    let method: String = args.get(0)?;
    Ok(Value::Array(
        service
            .method_calls(&method)
            .iter()
            .map(|c| c.to_wire_without_method())
            .collect(),
    ))
}

fn clear_calls(service: &MockPackageService, _args: &Args<'_>) -> Result<Value, RpcError> {
    service.clear_calls();
    Ok(Value::Null)
}

fn reset(service: &MockPackageService, _args: &Args<'_>) -> Result<Value, RpcError> {
    service.reset();
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apk_protocol::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_signature_arity() {
        assert_eq!(signature_arity(""), 0);
        assert_eq!(signature_arity("s"), 1);
        assert_eq!(signature_arity("as"), 1);
        assert_eq!(signature_arity("asu"), 2);
        assert_eq!(signature_arity("a(bss)"), 1);
        assert_eq!(signature_arity("aa{sv}"), 1);
        assert_eq!(signature_arity("(ssssssttu)"), 1);
        assert_eq!(signature_arity("sa(tav)u"), 3);
    }

    #[test]
    fn test_tables_differ_per_api() {
        let v1 = MethodTable::for_api(ApiVersion::V1);
        let v2 = MethodTable::for_api(ApiVersion::V2);
        assert!(v1.get("GetPackageDetails").is_some());
        assert!(v1.get("GetPackagesDetails").is_none());
        assert!(v1.get("SearchFilesOwners").is_none());
        assert!(v2.get("GetPackagesDetails").is_some());
        assert!(v2.get("DeletePackage").is_some());
        assert!(v2.get("DeletePackages").is_some());
        assert_eq!(v1.get("GetCalls").unwrap().interface, MethodInterface::Mock);
    }

    #[test]
    fn test_table_declaration_order() {
        let table = MethodTable::for_api(ApiVersion::V2);
        let names: Vec<_> = table.iter().map(|s| s.name).collect();
        assert_eq!(names.first(), Some(&"ListRepositories"));
        assert_eq!(names.last(), Some(&"Reset"));
        assert_eq!(table.len(), 17);
    }

    #[test]
    fn test_interface_name() {
        let table = MethodTable::for_api(ApiVersion::V1);
        let spec = table.get("ListRepositories").unwrap();
        assert_eq!(spec.interface_name(ApiVersion::V1), "dev.Cogitri.apkPolkit1");
        let spec = table.get("Reset").unwrap();
        assert_eq!(spec.interface_name(ApiVersion::V1), "org.freedesktop.DBus.Mock");
    }

    #[test]
    fn test_encode_failure_is_internal_error() {
        let args = Args {
            method: "ListRepositories",
            signature: "",
            values: &[],
        };
        let mut unencodable = HashMap::new();
        unencodable.insert((1u32, 2u32), "tuple keys are not JSON object keys");

        let err = args.encode(&unencodable).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(err.message.contains("ListRepositories"));
        assert_eq!(args.encode(&vec![1, 2]).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_arity_mismatch_is_invalid_args() {
        let service = MockPackageService::new(ApiVersion::V2);
        let err = service.call("GetPackagesDetails", &[json!(["a"])]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgs);
    }

    #[test]
    fn test_type_mismatch_is_invalid_args() {
        let service = MockPackageService::new(ApiVersion::V2);
        let err = service
            .call("GetPackagesDetails", &[json!("apk-test-app"), json!(511)])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgs);
        assert!(err.message.contains("GetPackagesDetails"));
    }
}
