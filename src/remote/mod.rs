//! Dashboard backend access: authenticated HTTP client, record listing and
//! write endpoints.

mod auth;
mod client;
mod mutations;
mod source;
mod types;

pub use auth::{EnvToken, TokenProvider};
pub use client::ApiClient;
pub use mutations::{Mutation, MutationRequest, MutationTransport};
pub use source::{HttpRecordSource, RecordSource};
pub use types::{api_path, payload_str, record_id, FtpBucket, Record};
