//! Many-to-many crossbars.

use bustool_diagnostics::DiagnosticSink;
use bustool_expr::Expression;
use bustool_ir::EntityDecl;
use bustool_protocol::{AsymmetricBus, BusInstance, MapReader, Parameter, ProtocolError, Role};
use std::sync::Arc;

use crate::errors::warn_arbiter_not_synthesized;

/// Replicated ports of a crossbar default to two.
const DEFAULT_COUNT: i64 = 2;

/// A crossbar as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CrossbarDef {
    arbiter: String,
    ctl_count: Option<String>,
    dev_count: Option<String>,
}

impl CrossbarDef {
    /// Reads `arbiter: {type}`, `ctl_count?` and `dev_count?`.
    pub(crate) fn parse(map: &MapReader<'_>) -> Result<Self, ProtocolError> {
        let arbiter = map
            .require_mapping("arbiter")?
            .require_str("type")
            .map_err(|e| e.within("arbiter"))?;
        Ok(Self {
            arbiter: arbiter.to_string(),
            ctl_count: map.optional_str("ctl_count")?.map(str::to_string),
            dev_count: map.optional_str("dev_count")?.map(str::to_string),
        })
    }

    pub(crate) fn resolve(&self, bus: &AsymmetricBus) -> Crossbar {
        Crossbar {
            arbiter: self.arbiter.clone(),
            ctl_count: self
                .ctl_count
                .clone()
                .unwrap_or_else(|| format!("{}_count", bus.controller)),
            dev_count: self
                .dev_count
                .clone()
                .unwrap_or_else(|| format!("{}_count", bus.device)),
        }
    }
}

/// An analyzed crossbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossbar {
    /// Arbiter type, recorded but not synthesized.
    pub arbiter: String,
    /// Name of the controller-count parameter.
    pub ctl_count: String,
    /// Name of the device-count parameter.
    pub dev_count: String,
}

impl Crossbar {
    pub(crate) fn generate(
        &self,
        entity: &str,
        bus: &Arc<AsymmetricBus>,
        decl: &mut EntityDecl,
        sink: &DiagnosticSink,
    ) {
        for (name, role) in [(&self.ctl_count, &bus.controller), (&self.dev_count, &bus.device)] {
            decl.parameters.push(Parameter::new(
                name.clone(),
                Some(format!("Number of {role} ports.")),
                Expression::constant(DEFAULT_COUNT),
            ));
        }
        decl.ports.push(
            BusInstance::new("ctl", Arc::clone(bus), Role::Device)
                .with_desc("Controller ports.")
                .with_count(Expression::var(self.ctl_count.as_str()))
                .into(),
        );
        decl.ports.push(
            BusInstance::new("dev", Arc::clone(bus), Role::Controller)
                .with_desc("Device ports.")
                .with_count(Expression::var(self.dev_count.as_str()))
                .into(),
        );
        sink.emit(warn_arbiter_not_synthesized(entity, &self.arbiter));
    }
}
