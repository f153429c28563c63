//! Bus clock source.

use bustool_common::Node;
use serde::Serialize;

use crate::access::MapReader;
use crate::errors::ProtocolError;

/// Where a bus gets its clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    /// A free-standing clock input next to the bus ports.
    ExtClock,
    /// A clock wire carried inside the bus itself.
    BusClock,
}

/// The clock driving a bus and the edge it is sampled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockSpec {
    /// Clock source.
    pub kind: ClockKind,
    /// Clock signal id.
    pub signal: String,
    /// `true` for rising edge, `false` for falling edge.
    pub rising: bool,
}

impl ClockSpec {
    const TYPES: &'static [&'static str] = &["ext_clock", "bus_clock"];
    const EDGES: &'static [&'static str] = &["rising", "falling"];

    /// Parses `{type, signal, edge}`, validating both enumerations.
    pub fn parse(node: &Node) -> Result<Self, ProtocolError> {
        let map = MapReader::new(node)?;
        let kind = match map.require_enum("type", Self::TYPES)? {
            "bus_clock" => ClockKind::BusClock,
            _ => ClockKind::ExtClock,
        };
        let signal = map.require_str("signal")?.to_string();
        let rising = map.require_enum("edge", Self::EDGES)? == "rising";
        Ok(Self {
            kind,
            signal,
            rising,
        })
    }

    /// Returns how a module holding a bus port named `port` refers to the clock.
    pub fn reference(&self, port: &str) -> String {
        match self.kind {
            ClockKind::ExtClock => self.signal.clone(),
            ClockKind::BusClock => format!("{port}.{}", self.signal),
        }
    }

    /// Returns the edge keyword (`posedge` or `negedge`).
    pub fn edge_keyword(&self) -> &'static str {
        if self.rising {
            "posedge"
        } else {
            "negedge"
        }
    }
}
