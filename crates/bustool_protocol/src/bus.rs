//! Asymmetric bus templates.

use bustool_common::Node;
use serde::Serialize;
use std::collections::HashSet;

use crate::access::MapReader;
use crate::clock::ClockSpec;
use crate::errors::ProtocolError;
use crate::instance::Role;
use crate::param::Parameter;
use crate::signal::Signal;
use crate::trans::TransSpec;

/// A bus protocol template with a controller role and a device role.
///
/// Templates are shared read-only by every entity that instantiates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsymmetricBus {
    /// Template name, also the emitted interface name.
    pub id: String,
    /// Optional description.
    pub desc: Option<String>,
    /// Name of the controller role.
    pub controller: String,
    /// Name of the device role.
    pub device: String,
    /// Template parameters, in document order.
    pub parameters: Vec<Parameter>,
    /// Transaction handshake.
    pub transaction: TransSpec,
    /// Clock source.
    pub clock: ClockSpec,
    /// Id of the signal carrying the address, if any.
    pub address: Option<String>,
    /// Signals, in document order. Ids are unique.
    pub signals: Vec<Signal>,
}

impl AsymmetricBus {
    /// Parses an `asymmetric_bus` entity definition.
    pub fn parse(id: &str, node: &Node) -> Result<Self, ProtocolError> {
        let map = MapReader::new(node)?;

        let mut parameters = Vec::new();
        if let Some(params) = map.optional_mapping("parameters")? {
            for (key, value) in params.entries() {
                let param = Parameter::parse(key, value)
                    .map_err(|e| e.within(&format!("parameters.{key}")))?;
                parameters.push(param);
            }
        }

        let mut signals = Vec::new();
        for (key, value) in map.require_mapping("signals")?.entries() {
            let signal =
                Signal::parse(key, value).map_err(|e| e.within(&format!("signals.{key}")))?;
            signals.push(signal);
        }

        let bus = Self {
            id: id.to_string(),
            desc: map.optional_str("desc")?.map(str::to_string),
            controller: map.require_str("controller")?.to_string(),
            device: map.require_str("device")?.to_string(),
            parameters,
            transaction: TransSpec::parse(map.require("transaction")?)
                .map_err(|e| e.within("transaction"))?,
            clock: ClockSpec::parse(map.require("clock")?).map_err(|e| e.within("clock"))?,
            address: map.optional_str("addr")?.map(str::to_string),
            signals,
        };
        bus.validate()?;
        log::debug!(
            "parsed bus `{}` with {} signals and {} parameters",
            bus.id,
            bus.signals.len(),
            bus.parameters.len()
        );
        Ok(bus)
    }

    /// Checks that signal ids are unique and that the address signal exists.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let mut seen = HashSet::new();
        for signal in &self.signals {
            if !seen.insert(signal.id.as_str()) {
                return Err(ProtocolError::DuplicateIdentifier {
                    field: "signals".to_string(),
                    id: signal.id.clone(),
                });
            }
        }
        if let Some(addr) = &self.address {
            if !seen.contains(addr.as_str()) {
                return Err(ProtocolError::UnknownAddressSignal { id: addr.clone() });
            }
        }
        Ok(())
    }

    /// Looks up a signal by id.
    pub fn signal(&self, id: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    /// Returns the address signal, if the template declares one.
    pub fn address_signal(&self) -> Option<&Signal> {
        self.address.as_deref().and_then(|id| self.signal(id))
    }

    /// Returns the name of `role` (the interface view adopted by a port).
    pub fn role_name(&self, role: Role) -> &str {
        match role {
            Role::Controller => &self.controller,
            Role::Device => &self.device,
        }
    }
}
