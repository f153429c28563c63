//! Address-decoded bus multiplexers.
//!
//! A multiplexer connects one controller to `dev_count` devices of the same
//! bus. Each device owns an address window given by the `map_addr` and
//! `map_mask` inputs. The generated body has four parts:
//!
//! 1. a decode loop computing the one-hot `<dev>_sel` vector,
//! 2. a forward loop driving every output signal into every device, gated
//!    by the select bit for `masked` signals,
//! 3. a capture loop collecting every input signal into `raw_<sig>`,
//! 4. per input signal, a pipeline register delaying the select vector by
//!    the signal's `time`, and a selector driving the controller side.
//!
//! Each return signal gets its own delayed select vector, so select timing
//! always matches the latency of the data it picks.

use bustool_diagnostics::DiagnosticSink;
use bustool_expr::{ExprError, Expression, Op};
use bustool_ir::{Assign, BlockStatement, Decl, EntityDecl, For, GenBlock, Instance, Statement};
use bustool_protocol::{
    AsymmetricBus, BusInstance, ClockKind, Direction, MapReader, Parameter, ProtocolError, Role,
    Signal, Span,
};
use indexmap::IndexMap;
use std::sync::Arc;

use crate::errors::{warn_unrouted_signal, ElabError};

/// Elaboration-time loop variable over device indices.
const LOOP_VAR: &str = "x";

/// Default number of device ports.
const DEFAULT_DEV_COUNT: i64 = 2;

/// A multiplexer as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BusMuxDef {
    ctl_port: String,
    dev_port: String,
    dev_count: Option<String>,
}

impl BusMuxDef {
    /// Reads `ctl_port?`, `dev_port?` and `dev_count?`.
    pub(crate) fn parse(map: &MapReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            ctl_port: map.optional_str("ctl_port")?.unwrap_or("ctl").to_string(),
            dev_port: map.optional_str("dev_port")?.unwrap_or("dev").to_string(),
            dev_count: map.optional_str("dev_count")?.map(str::to_string),
        })
    }

    pub(crate) fn resolve(&self, bus: &AsymmetricBus) -> BusMux {
        let aliases = bus
            .parameters
            .iter()
            .map(|p| (p.id.clone(), format!("{}.{}", self.ctl_port, p.id)))
            .collect();
        BusMux {
            ctl_port: self.ctl_port.clone(),
            dev_port: self.dev_port.clone(),
            dev_count: self
                .dev_count
                .clone()
                .unwrap_or_else(|| format!("{}_count", bus.device)),
            aliases,
        }
    }
}

/// An analyzed multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMux {
    /// Name of the controller-facing bus port.
    pub ctl_port: String,
    /// Name of the replicated device-facing bus port.
    pub dev_port: String,
    /// Name of the device-count parameter.
    pub dev_count: String,
    /// Bus parameters, reached through the controller port.
    pub aliases: IndexMap<String, String>,
}

impl BusMux {
    pub(crate) fn generate(
        &self,
        entity: &str,
        bus: &Arc<AsymmetricBus>,
        decl: &mut EntityDecl,
        sink: &DiagnosticSink,
    ) -> Result<(), ElabError> {
        let addr = bus
            .address_signal()
            .ok_or_else(|| ElabError::MissingAddressSignal {
                entity: entity.to_string(),
                bus: bus.id.clone(),
            })?;

        self.declare_ports(bus, addr, decl);
        self.decode(addr, decl)
            .map_err(failed(entity, "address decode"))?;
        self.forward(bus, decl)
            .map_err(failed(entity, "forward path"))?;
        self.returns(bus, decl)
            .map_err(failed(entity, "return path"))?;

        for signal in bus.signals.iter().filter(|s| s.direction.is_none()) {
            sink.emit(warn_unrouted_signal(entity, &bus.id, &signal.id));
        }
        decl.aliases
            .extend(self.aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn count(&self) -> Expression {
        Expression::var(self.dev_count.as_str())
    }

    fn select(&self) -> String {
        format!("{}_sel", self.dev_port)
    }

    /// `<ctl>.<sig>`, resolved through the controller port's members.
    fn ctl_member(&self, signal: &str) -> Expression {
        Expression::var(format!("{}.{signal}", self.ctl_port))
    }

    /// `<dev>[x].<sig>`; replicated members are not in scope, so this is raw.
    fn dev_member(&self, signal: &str) -> Expression {
        Expression::raw(format!("{}[{LOOP_VAR}].{signal}", self.dev_port))
    }

    fn device_loop(&self, body: Vec<BlockStatement>) -> Result<Statement, ExprError> {
        Ok(Statement::GenBlock(GenBlock {
            body: vec![BlockStatement::For(For::counting(
                LOOP_VAR,
                self.count(),
                body,
            )?)],
        }))
    }

    fn declare_ports(&self, bus: &Arc<AsymmetricBus>, addr: &Signal, decl: &mut EntityDecl) {
        decl.parameters.push(Parameter::new(
            self.dev_count.clone(),
            Some(format!("Number of {} ports.", bus.device)),
            Expression::constant(DEFAULT_DEV_COUNT),
        ));
        if bus.clock.kind == ClockKind::ExtClock {
            decl.ports.push(
                Signal::new(bus.clock.signal.clone(), Span::default())
                    .with_desc("Pipeline clock.")
                    .with_direction(Direction::Input)
                    .into(),
            );
        }
        decl.ports.push(
            BusInstance::new(self.ctl_port.clone(), Arc::clone(bus), Role::Device)
                .with_desc("Controller port.")
                .into(),
        );
        decl.ports.push(
            BusInstance::new(self.dev_port.clone(), Arc::clone(bus), Role::Controller)
                .with_desc("Device ports.")
                .with_count(self.count())
                .into(),
        );
        for (id, desc) in [("map_addr", "Base addresses."), ("map_mask", "Address bitmasks.")] {
            decl.ports.push(
                Signal::new(id, addr.span.clone())
                    .with_desc(desc)
                    .with_direction(Direction::Input)
                    .with_count(self.count())
                    .into(),
            );
        }
    }

    /// `sel[x] = (map_addr[x] & map_mask[x]) == (ctl.addr & map_mask[x])`.
    fn decode(&self, addr: &Signal, decl: &mut EntityDecl) -> Result<(), ExprError> {
        let select = self.select();
        decl.body.push(Statement::GenVar(Decl::new(LOOP_VAR)));
        decl.body.push(Statement::Signal(
            Signal::new(select.as_str(), Span::from_width(self.count())?)
                .with_desc("Selected device."),
        ));

        let mask = || index("map_mask");
        let base = Expression::binary(Op::AndB, index("map_addr")?, mask()?)?;
        let requested = Expression::binary(Op::AndB, self.ctl_member(&addr.id), mask()?)?;
        let matches = Expression::binary(Op::Eq, base, requested)?;
        let assign = Assign::new(index(&select)?, matches);
        decl.body
            .push(self.device_loop(vec![BlockStatement::Assign(assign)])?);
        Ok(())
    }

    fn forward(&self, bus: &AsymmetricBus, decl: &mut EntityDecl) -> Result<(), ExprError> {
        let mut body = Vec::new();
        for signal in signals(bus, Direction::Output) {
            let value = if signal.masked {
                Expression::operation(
                    Op::If,
                    vec![
                        index(&self.select())?,
                        self.ctl_member(&signal.id),
                        Expression::constant(0),
                    ],
                )?
            } else {
                self.ctl_member(&signal.id)
            };
            body.push(BlockStatement::Assign(Assign::new(
                self.dev_member(&signal.id),
                value,
            )));
        }
        if !body.is_empty() {
            decl.body.push(self.device_loop(body)?);
        }
        Ok(())
    }

    fn returns(&self, bus: &AsymmetricBus, decl: &mut EntityDecl) -> Result<(), ExprError> {
        let inputs: Vec<&Signal> = signals(bus, Direction::Input).collect();
        if inputs.is_empty() {
            return Ok(());
        }

        let mut capture = Vec::new();
        for signal in &inputs {
            let raw = format!("raw_{}", signal.id);
            decl.body.push(Statement::Signal(
                Signal::new(raw.as_str(), signal.span.clone())
                    .with_desc("Raw return signals.")
                    .with_count(self.count()),
            ));
            capture.push(BlockStatement::Assign(Assign::new(
                index(&raw)?,
                self.dev_member(&signal.id),
            )));
        }
        decl.body.push(self.device_loop(capture)?);

        let clock = Expression::var(bus.clock.reference(&self.ctl_port));
        let select = self.select();
        for signal in &inputs {
            let delayed = format!("{select}_{}", signal.id);
            let select_span = Span::from_width(self.count())?;
            decl.body.push(Statement::Signal(
                Signal::new(delayed.as_str(), select_span.clone())
                    .with_desc("Delayed selector signals."),
            ));
            decl.body.push(Statement::Instance(
                Instance::new("hu_pipeline_reg", format!("plr_{}", signal.id))
                    .param("regtype", bit_vector(&select_span)?)
                    .param("depth", signal.time.clone())
                    .port("clk", clock.clone())
                    .port("d", Expression::var(select.as_str()))
                    .port("q", Expression::var(delayed.as_str())),
            ));
            decl.body.push(Statement::Instance(
                Instance::new("hu_selector", format!("sel_{}", signal.id))
                    .param("seltype", bit_vector(&signal.span)?)
                    .param("width", self.count())
                    .port("sel", Expression::var(delayed.as_str()))
                    .port("d", Expression::var(format!("raw_{}", signal.id)))
                    .port("q", self.ctl_member(&signal.id)),
            ));
        }
        Ok(())
    }
}

fn signals(bus: &AsymmetricBus, direction: Direction) -> impl Iterator<Item = &Signal> {
    bus.signals
        .iter()
        .filter(move |s| s.direction == Some(direction))
}

/// `name[x]`.
fn index(name: &str) -> Result<Expression, ExprError> {
    Expression::binary(Op::Index, Expression::var(name), Expression::var(LOOP_VAR))
}

/// `bit[msb:lsb]`, the packed type handed to helper cells.
fn bit_vector(span: &Span) -> Result<Expression, ExprError> {
    Expression::operation(
        Op::Slice,
        vec![Expression::raw("bit"), span.msb.clone(), span.lsb.clone()],
    )
}

fn failed(entity: &str, context: &str) -> impl FnOnce(ExprError) -> ElabError {
    let entity = entity.to_string();
    let context = context.to_string();
    move |source| ElabError::Expr {
        entity,
        context,
        source,
    }
}
