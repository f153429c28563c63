//! Bus ports placed inside other entities.

use bustool_expr::Expression;
use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::bus::AsymmetricBus;
use crate::clock::ClockKind;

/// One of the two asymmetric endpoints of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The initiating side.
    Controller,
    /// The responding side.
    Device,
}

impl Role {
    /// Returns the opposite role.
    pub fn flip(self) -> Self {
        match self {
            Role::Controller => Role::Device,
            Role::Device => Role::Controller,
        }
    }
}

/// A port that carries one bus template in one role.
///
/// `role` is the view the enclosing module adopts: a multiplexer facing a
/// controller takes the device view on that port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusInstance {
    /// Port name.
    pub id: String,
    /// Optional description.
    pub desc: Option<String>,
    /// The shared template.
    #[serde(serialize_with = "serialize_bus_id")]
    pub bus: Arc<AsymmetricBus>,
    /// The adopted role.
    pub role: Role,
    /// Number of replicated ports. Defaults to `1`.
    pub count: Expression,
}

fn serialize_bus_id<S: Serializer>(bus: &Arc<AsymmetricBus>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&bus.id)
}

impl BusInstance {
    /// Creates a single port.
    pub fn new(id: impl Into<String>, bus: Arc<AsymmetricBus>, role: Role) -> Self {
        Self {
            id: id.into(),
            desc: None,
            bus,
            role,
            count: Expression::constant(1),
        }
    }

    /// Sets the description.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Sets the replication count.
    pub fn with_count(mut self, count: Expression) -> Self {
        self.count = count;
        self
    }

    /// Returns the interface view name, e.g. `bus_a.target`.
    pub fn view(&self) -> String {
        format!("{}.{}", self.bus.id, self.bus.role_name(self.role))
    }

    /// Returns `true` unless the count is the constant `1`.
    pub fn is_replicated(&self) -> bool {
        self.count.as_constant() != Some(1)
    }

    /// Returns the dotted member names `port.signal` for every template
    /// signal, followed by the clock when the bus carries its own.
    pub fn member_paths(&self) -> impl Iterator<Item = String> + '_ {
        let clock = match self.bus.clock.kind {
            ClockKind::BusClock => Some(self.bus.clock.signal.as_str()),
            ClockKind::ExtClock => None,
        };
        self.bus
            .signals
            .iter()
            .map(|s| s.id.as_str())
            .chain(clock)
            .map(move |member| format!("{}.{member}", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockSpec;
    use crate::signal::Signal;
    use crate::span::Span;
    use crate::trans::TransSpec;

    fn bus() -> Arc<AsymmetricBus> {
        Arc::new(AsymmetricBus {
            id: "bus_a".into(),
            desc: None,
            controller: "host".into(),
            device: "target".into(),
            parameters: Vec::new(),
            transaction: TransSpec {
                request: Expression::var("req"),
                accept: Expression::constant(1),
                stall: Expression::constant(0),
            },
            clock: ClockSpec {
                kind: ClockKind::ExtClock,
                signal: "clk".into(),
                rising: true,
            },
            address: None,
            signals: vec![
                Signal::new("req", Span::default()),
                Signal::new("ack", Span::default()),
            ],
        })
    }

    #[test]
    fn view_follows_role() {
        let port = BusInstance::new("ctl", bus(), Role::Device);
        assert_eq!(port.view(), "bus_a.target");
        assert_eq!(Role::Device.flip(), Role::Controller);
    }

    #[test]
    fn members_and_replication() {
        let port = BusInstance::new("dev", bus(), Role::Controller)
            .with_count(Expression::var("N"));
        assert!(port.is_replicated());
        let members: Vec<_> = port.member_paths().collect();
        assert_eq!(members, ["dev.req", "dev.ack"]);
    }

    #[test]
    fn bus_clock_is_a_member() {
        let mut template = (*bus()).clone();
        template.clock.kind = ClockKind::BusClock;
        let port = BusInstance::new("ctl", Arc::new(template), Role::Device);
        let members: Vec<_> = port.member_paths().collect();
        assert_eq!(members, ["ctl.req", "ctl.ack", "ctl.clk"]);
    }

    #[test]
    fn serializes_bus_by_id() {
        let port = BusInstance::new("ctl", bus(), Role::Device);
        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["bus"], "bus_a");
        assert_eq!(json["role"], "device");
    }
}
