//! Lowering of bus templates to interfaces.

use bustool_ir::{EntityDecl, EntityKind, RoleView, Statement};
use bustool_protocol::{AsymmetricBus, ClockKind, Direction, Signal, Span};

/// Builds the interface declaration of `bus`.
///
/// The interface carries the bus parameters and declares every signal. A
/// bus-sourced clock becomes the only port. One view is emitted per role:
/// the controller view keeps each signal's direction, the device view flips
/// it, and signals without a direction appear in neither.
pub fn lower_bus(bus: &AsymmetricBus) -> EntityDecl {
    let mut decl = EntityDecl::new(EntityKind::Interface, bus.id.clone());
    decl.desc = bus.desc.clone();
    decl.parameters = bus.parameters.clone();

    let clock = match bus.clock.kind {
        ClockKind::BusClock => Some(bus.clock.signal.as_str()),
        ClockKind::ExtClock => None,
    };
    if let Some(clk) = clock {
        decl.ports.push(
            Signal::new(clk, Span::default())
                .with_direction(Direction::Input)
                .into(),
        );
    }

    for signal in &bus.signals {
        let mut body = signal.clone();
        body.direction = None;
        decl.body.push(Statement::Signal(body));
    }

    for (role, flip) in [(&bus.controller, false), (&bus.device, true)] {
        let mut signals: Vec<(String, Direction)> = clock
            .map(|clk| (clk.to_string(), Direction::Input))
            .into_iter()
            .collect();
        signals.extend(bus.signals.iter().filter_map(|s| {
            let dir = s.direction?;
            Some((s.id.clone(), if flip { dir.flip() } else { dir }))
        }));
        decl.body.push(Statement::RoleView(RoleView {
            role: role.clone(),
            desc: None,
            signals,
        }));
    }

    log::debug!(
        "lowered bus `{}` to an interface with {} signals",
        bus.id,
        bus.signals.len()
    );
    decl
}
