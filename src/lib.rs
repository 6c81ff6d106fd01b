//! poolwatch: watches a reverse proxy's JSON access log and alerts on
//! blue/green pool failover, recovery and sustained upstream 5xx rates.

pub mod alert;
pub mod app;
pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod log;
pub mod policy;
pub mod record;
pub mod state;
pub mod window;

pub use alert::{Alert, AlertCategory, AlertSink, ConsoleSink, WebhookSink};
pub use cli::Config;
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::DeliveryError;
pub use log::{FileTail, LineSource};
pub use policy::{AlertPolicy, DispatchOutcome};
