//! OAI-PMH side of the bridge: Dublin Core serialization and record import.
//!
//! Records are serialized with [`dublin_core::serialize`], wrapped in a
//! [`Submission`] and handed to a [`Sink`] by the [`Importer`].

pub mod dublin_core;
mod dispatcher;
pub mod mock;
mod sink;

pub use dispatcher::Importer;
pub use dublin_core::{serialize, SerializeError, METADATA_PREFIX};
pub use mock::MockSink;
pub use sink::{from_config as sink_from_config, CliSink, HttpSink, Sink, SinkError, Submission};
