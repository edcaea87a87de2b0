#[cfg(not(target_endian = "little"))]
compile_error!("henkan-core requires a little-endian platform");

pub mod candidates;
pub mod dict;
pub mod engine;
pub mod feature;
pub mod grammar;
pub mod learn;
pub(crate) mod numeric;
pub mod pos;
pub mod record;
pub mod segment;
pub mod settings;
pub mod splitter;
pub mod unicode;

#[cfg(test)]
mod testutil;

pub use engine::Engine;
pub use segment::Segment;
