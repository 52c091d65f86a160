pub mod audit;
pub mod url;

pub use audit::{AuditAction, AuditEvent};
pub use url::{BatchEntry, ShortLink};
