//! Seeding nodes: generate records for one kind, write them to a
//! [`DataSink`](crate::traits::DataSink), and publish the stored ids to the
//! nodes that reference them.

mod factory;
mod node;
mod record;

pub use factory::RecordFactory;
pub use node::seed_node;
pub use record::{reference_field, Id, Ids, Record};
