//! TNS Energo Core - typed client for the TNS Energo mobile API
//!
//! This crate turns the loosely typed JSON of the utility provider's mobile
//! API into validated records and exposes account, meter, payment and
//! reading-submission operations on top of it.
//!
//! # Main Components
//!
//! - **Converters** (`convert`): scalar normalization with explicit null policies
//! - **Mapping** (`mapping`): the `record!` macro, field tables and record views
//! - **Envelope** (`envelope`): `result` flag validation and error extraction
//! - **Session** (`session`, `transport`): regions, endpoint addressing, HTTP
//! - **Endpoints** (`endpoints`): one module per vendor action
//! - **Facade** (`account`): accounts, meters, payments and indications
//!
//! # Example
//!
//! ```no_run
//! use tns_energo_core::{DateRange, Readings, Result, Session};
//!
//! async fn example() -> Result<()> {
//!     let session = Session::new("760000000001", "password")?;
//!     let login = session.authenticate().await?;
//!
//!     for meter in login.account.meters(&session).await?.values() {
//!         println!("{} ({} zones)", meter.code, meter.zones.len());
//!         meter
//!             .send_indications(&session, &Readings::new().t1(1520).t2(730))
//!             .await?;
//!     }
//!
//!     let payments = login.account.payments(&session, DateRange::all()).await?;
//!     println!("{} payments", payments.len());
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod convert;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod mapping;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use account::{
    normalize_zone_code, process_start_end, Account, DateRange, Indication, Login, Meter,
    MeterZone, Payment, Readings,
};
pub use endpoints::send_readings::NewIndication;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use mapping::{Field, Record, RecordView, ToRaw};
pub use reqwest::Method;
pub use session::{Session, SessionBuilder, Target, Timeout};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError, TransportRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
