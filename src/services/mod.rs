pub mod credential_store;
pub mod invoker;
pub mod status;

pub use credential_store::CredentialStore;
pub use status::StatusMonitor;
