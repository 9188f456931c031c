//! The logging-operator custom resources, one [`ManifestKind`] per kind.
//!
//! [`ManifestKind`]: crate::manifest::ManifestKind

pub mod common;
pub mod extensions;
pub mod flow;
pub mod fluentbit;
pub mod logging;
pub mod logging_route;
pub mod output;
pub mod syslog_ng_flow;
pub mod syslog_ng_output;

pub use extensions::{EventTailer, HostTailer};
pub use flow::{ClusterFlow, Flow};
pub use fluentbit::FluentbitAgent;
pub use logging::Logging;
pub use logging_route::LoggingRoute;
pub use output::{ClusterOutput, Output};
pub use syslog_ng_flow::{SyslogNgClusterFlow, SyslogNgFlow};
pub use syslog_ng_output::{SyslogNgClusterOutput, SyslogNgOutput};
