//! apk-polkit Protocol Types
//!
//! Wire-level types shared by the mock package helper and its clients:
//! package and repository records, the state code table, the field
//! selection mask, and the line-delimited JSON RPC envelope.
//!
//! Two API generations are described here. `apkPolkit1` passes packages as
//! fixed 9-tuples and works on one package per call; `apkPolkit2` passes
//! extensible property maps and works on batches.

pub mod api;
pub mod error;
pub mod fields;
pub mod package;
pub mod repository;
pub mod request;
pub mod response;
pub mod state;

pub use api::{methods, ApiVersion};
pub use error::{ErrorCode, RpcError};
pub use fields::PackageFields;
pub use package::{Package, PackageRecord, PackageTuple, NOT_FOUND_MESSAGE};
pub use repository::{Repository, RepositoryTuple};
pub use request::RpcRequest;
pub use response::RpcResponse;
pub use state::PackageState;
