//! Package records and their two wire encodings.
//!
//! [`Package`] is the single canonical representation. [`PackageRecord`]
//! wraps it with the set of fields the caller asked for, or stands in for a
//! lookup that found nothing. The v1 adapter flattens a record into a fixed
//! 9-tuple; the v2 adapter emits a property map containing only the
//! requested keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::PackageFields;
use crate::state::PackageState;

/// Error text carried by a per-item not-found marker.
pub const NOT_FOUND_MESSAGE: &str = "pkg not found!";

/// v1 wire form `(ssssssttu)`:
/// name, version, description, license, old version, url, installed size,
/// download size, state.
pub type PackageTuple = (String, String, String, String, String, String, u64, u64, PackageState);

/// Full descriptive state of one installable unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub installed_version: String,
    pub description: String,
    pub license: String,
    /// Version an upgrade or downgrade call would apply.
    pub staging_version: Option<String>,
    pub url: String,
    pub installed_size: u64,
    pub download_size: u64,
    pub state: PackageState,
}

impl Package {
    /// A record that carries nothing but a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The version the package is heading to: the staging version while a
    /// transition is pending, otherwise the installed one.
    pub fn target_version(&self) -> &str {
        match &self.staging_version {
            Some(staging) if self.state.has_pending_transition() => staging,
            _ => &self.installed_version,
        }
    }
}

/// One entry of a package query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRecord {
    /// A package, restricted to `fields`.
    Package { package: Package, fields: PackageFields },
    /// Lookup failed for this name only.
    Missing { name: String, error: String },
    /// Lookup matched nothing (file owner searches).
    Empty,
}

impl PackageRecord {
    /// A found package with every field selected.
    pub fn found(package: Package) -> Self {
        PackageRecord::Package {
            package,
            fields: PackageFields::ALL,
        }
    }

    /// Not-found marker for `name`.
    pub fn missing(name: impl Into<String>) -> Self {
        PackageRecord::Missing {
            name: name.into(),
            error: NOT_FOUND_MESSAGE.to_string(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PackageRecord::Package { package, .. } => Some(&package.name),
            PackageRecord::Missing { name, .. } => Some(name),
            PackageRecord::Empty => None,
        }
    }

    pub fn package(&self) -> Option<&Package> {
        match self {
            PackageRecord::Package { package, .. } => Some(package),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, PackageRecord::Missing { .. })
    }

    /// Narrow the selected fields to `mask`. The name is always kept.
    pub fn project(self, mask: PackageFields) -> Self {
        match self {
            PackageRecord::Package { package, fields } => PackageRecord::Package {
                package,
                fields: (fields & mask) | PackageFields::NAME,
            },
            other => other,
        }
    }

    /// Encode as a v1 tuple. The tuple has fixed arity, so the field mask
    /// does not apply. Not-found markers become an `Absent` tuple.
    pub fn to_v1_tuple(&self) -> PackageTuple {
        match self {
            PackageRecord::Package { package, .. } => (
                package.name.clone(),
                package.target_version().to_string(),
                package.description.clone(),
                package.license.clone(),
                package.installed_version.clone(),
                package.url.clone(),
                package.installed_size,
                package.download_size,
                package.state,
            ),
            PackageRecord::Missing { name, .. } => absent_tuple(name),
            PackageRecord::Empty => absent_tuple(""),
        }
    }

    /// Decode a v1 tuple. An `Absent` tuple is read back as a not-found
    /// marker.
    pub fn from_v1_tuple(tuple: PackageTuple) -> Self {
        let (name, version, description, license, old_version, url, installed_size, download_size, state) =
            tuple;
        if state == PackageState::Absent {
            return PackageRecord::missing(name);
        }
        let staging_version = state.has_pending_transition().then_some(version);
        PackageRecord::found(Package {
            name,
            installed_version: old_version,
            description,
            license,
            staging_version,
            url,
            installed_size,
            download_size,
            state,
        })
    }

    /// Encode as a v2 property map holding only the selected keys.
    pub fn to_v2_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            PackageRecord::Package { package, fields } => {
                let fields = *fields;
                map.insert("name".into(), Value::from(package.name.clone()));
                if fields.contains(PackageFields::VERSION) {
                    map.insert("version".into(), Value::from(package.installed_version.clone()));
                }
                if fields.contains(PackageFields::DESCRIPTION) {
                    map.insert("description".into(), Value::from(package.description.clone()));
                }
                if fields.contains(PackageFields::LICENSE) {
                    map.insert("license".into(), Value::from(package.license.clone()));
                }
                if fields.contains(PackageFields::STAGING_VERSION) {
                    if let Some(staging) = &package.staging_version {
                        map.insert("staging_version".into(), Value::from(staging.clone()));
                    }
                }
                if fields.contains(PackageFields::URL) {
                    map.insert("url".into(), Value::from(package.url.clone()));
                }
                if fields.contains(PackageFields::INSTALLED_SIZE) {
                    map.insert("installed_size".into(), Value::from(package.installed_size));
                }
                if fields.contains(PackageFields::SIZE) {
                    map.insert("size".into(), Value::from(package.download_size));
                }
                if fields.contains(PackageFields::PACKAGE_STATE) {
                    map.insert("package_state".into(), Value::from(package.state.code()));
                }
            }
            PackageRecord::Missing { name, error } => {
                map.insert("name".into(), Value::from(name.clone()));
                map.insert("error".into(), Value::from(error.clone()));
            }
            PackageRecord::Empty => {}
        }
        map
    }

    /// Decode a v2 property map. The selected fields are inferred from the
    /// keys present.
    pub fn from_v2_value(value: Value) -> Result<Self, serde_json::Error> {
        let props: PropertyMap = serde_json::from_value(value)?;

        let Some(name) = props.name else {
            return Ok(PackageRecord::Empty);
        };
        if let Some(error) = props.error {
            return Ok(PackageRecord::Missing { name, error });
        }

        let mut fields = PackageFields::NAME;
        let mut package = Package::named(name);
        if let Some(v) = props.version {
            fields |= PackageFields::VERSION;
            package.installed_version = v;
        }
        if let Some(v) = props.description {
            fields |= PackageFields::DESCRIPTION;
            package.description = v;
        }
        if let Some(v) = props.license {
            fields |= PackageFields::LICENSE;
            package.license = v;
        }
        if let Some(v) = props.staging_version {
            fields |= PackageFields::STAGING_VERSION;
            package.staging_version = Some(v);
        }
        if let Some(v) = props.url {
            fields |= PackageFields::URL;
            package.url = v;
        }
        if let Some(v) = props.installed_size {
            fields |= PackageFields::INSTALLED_SIZE;
            package.installed_size = v;
        }
        if let Some(v) = props.size {
            fields |= PackageFields::SIZE;
            package.download_size = v;
        }
        if let Some(v) = props.package_state {
            fields |= PackageFields::PACKAGE_STATE;
            package.state = v;
        }

        Ok(PackageRecord::Package { package, fields })
    }
}

fn absent_tuple(name: &str) -> PackageTuple {
    (
        name.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        0,
        0,
        PackageState::Absent,
    )
}

#[derive(Debug, Default, Deserialize)]
struct PropertyMap {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    license: Option<String>,
    staging_version: Option<String>,
    url: Option<String>,
    installed_size: Option<u64>,
    size: Option<u64>,
    package_state: Option<PackageState>,
    error: Option<String>,
}
