//! Attendance recording, filtered queries and the presence aggregate.

pub mod controller;
pub mod error;
pub mod http;
pub mod mysql;
pub mod service;
pub mod store;

pub use controller::{ControllerSnapshot, QueryController, QueryOutcome, QuerySelection, QueryState};
pub use error::{AttendanceError, Field, StorageFailure};
pub use http::HttpAttendanceStore;
pub use mysql::MySqlAttendanceStore;
pub use service::{AggregateResult, AttendanceService};
pub use store::{AttendanceStore, InMemoryAttendanceStore};
