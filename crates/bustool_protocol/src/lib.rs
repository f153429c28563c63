//! Protocol descriptors: the declarative value objects a bus description is
//! made of.
//!
//! An [`AsymmetricBus`] is a bus template with a controller role and a device
//! role, a parameter list, a clock, a transaction handshake and an ordered
//! list of [`Signal`]s. Other entities refer to a template through a
//! [`BusInstance`], which adopts one of the two roles.

#![warn(missing_docs)]

pub mod access;
pub mod bus;
pub mod clock;
pub mod errors;
pub mod instance;
pub mod param;
pub mod signal;
pub mod span;
pub mod trans;

pub use access::MapReader;
pub use bus::AsymmetricBus;
pub use clock::{ClockKind, ClockSpec};
pub use errors::ProtocolError;
pub use instance::{BusInstance, Role};
pub use param::Parameter;
pub use signal::{Direction, Signal};
pub use span::Span;
pub use trans::TransSpec;
