//! # datastore-tracing
//!
//! APM-style tracing instrumentation for raw SQL datastore calls.
//!
//! This crate sits between hand-written database code and your `tracing`
//! subscriber: you hand it SQL text plus bound parameters, and it emits
//! spans labelled with the statement's operation and primary table name.
//! Every entry point is a safe no-op until a [`Tracer`] has been configured,
//! so instrumentation can stay in the code path unconditionally.
//!
//! ## Features
//!
//! - **Best-Effort SQL Classification**: operation verb and table name are
//!   extracted from free-form SQL with comments, quoting, and arbitrary casing
//! - **OpenTelemetry Compatible**: spans carry semantic-convention attributes
//!   for database operations
//! - **Proper Span Nesting**: datastore spans are children of the enclosing
//!   transaction span
//! - **Safe When Unconfigured**: a disabled [`Tracer`] turns every call into
//!   a passthrough with no tracing behavior
//! - **Parameter Capture**: bound values (including expanded `IN (...)` lists)
//!   are flattened to `?_N` keys, attached only when explicitly enabled
//!
//! ## Quick Start
//!
//! ```rust
//! use datastore_tracing::{BindValue, Tracer, TracingConfig};
//!
//! # fn main() -> Result<(), datastore_tracing::SetupError> {
//! let config = TracingConfig::default().with_db_target("localhost", 3306, "shop");
//! let tracer = Tracer::setup("my-app", "license-key", config)?;
//!
//! let tx = tracer.start_transaction("GET /users");
//! let segment = tracer.start_segment(
//!     &tx,
//!     "SELECT * FROM users WHERE id = ?",
//!     &[BindValue::from(42)],
//! );
//! // ... run the query ...
//! segment.end();
//! tx.end();
//! # Ok(())
//! # }
//! ```
//!
//! ## Span Attributes
//!
//! The following attributes are recorded on `db.query` spans:
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | `db.system` | Always "mysql" |
//! | `db.operation` | Lowercased SQL verb (select, insert, ...) |
//! | `db.sql.table` | Primary table name (when detectable) |
//! | `db.statement` | Full SQL text (when enabled) |
//! | `db.params` | Flattened `?_N` parameter map (when enabled) |
//! | `db.name` | Logical database name (when configured) |
//! | `server.address` / `server.port` | Datastore target identity |
//! | `duration_ms` | Wall-clock duration of the call |
//! | `otel.status_code` | "OK" or "ERROR" |
//! | `error.message` | Error details (on failure) |

mod config;
mod params;
mod parser;
mod tracer;

pub use config::TracingConfig;
pub use params::{flatten, BindValue, ParamValue};
pub use parser::{classify_statement, clean_table_name, Classification};
pub use tracer::{Segment, SetupError, Tracer, Transaction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BindValue, Classification, ParamValue, Tracer, TracingConfig};
}
