//! The entity renderer.

use bustool_expr::{ExprError, Expression};
use bustool_ir::{
    Binding, Block, BlockStatement, EntityDecl, GenBlock, If, Instance, Port, RoleView,
    Statement,
};
use bustool_protocol::{BusInstance, Parameter, Signal, Span};
use rayon::prelude::*;
use std::io::{self, Write};

use crate::errors::RenderError;
use crate::scope::EntityScope;
use crate::writer::Writer;

/// The assignment token used inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignForm {
    /// `assign target = value;` at module level and in generate regions.
    Continuous,
    /// `target = value;` in combinational blocks.
    Blocking,
    /// `target <= value;` in clocked blocks.
    NonBlocking,
}

impl AssignForm {
    fn format(self, target: &str, value: &str) -> String {
        match self {
            AssignForm::Continuous => format!("assign {target} = {value};"),
            AssignForm::Blocking => format!("{target} = {value};"),
            AssignForm::NonBlocking => format!("{target} <= {value};"),
        }
    }
}

/// Renders one [`EntityDecl`] as SystemVerilog.
///
/// The scope is built and checked for duplicate names when the renderer is
/// created, so a declaration that renders at all renders with a consistent
/// namespace.
pub struct EntityRenderer<'a> {
    decl: &'a EntityDecl,
    scope: EntityScope,
}

impl<'a> EntityRenderer<'a> {
    /// Builds the scope of `decl`.
    pub fn new(decl: &'a EntityDecl) -> Result<Self, RenderError> {
        let scope = EntityScope::build(decl)?;
        Ok(Self { decl, scope })
    }

    /// Returns the entity scope.
    pub fn scope(&self) -> &EntityScope {
        &self.scope
    }

    /// Writes the whole entity: comment, header, parameter list, port list,
    /// body and closing keyword.
    pub fn render<W: Write>(&self, w: &mut Writer<W>) -> Result<(), RenderError> {
        let decl = self.decl;
        log::trace!("rendering {} `{}`", decl.kind.keyword(), decl.id);

        comment(w, decl.desc.as_deref())?;
        w.write(&format!("{} {}", decl.kind.keyword(), decl.id));

        if !decl.parameters.is_empty() {
            w.line(" #(")?;
            w.push_indent();
            for (i, param) in decl.parameters.iter().enumerate() {
                let sep = separator(i, decl.parameters.len());
                self.parameter(w, param, sep)?;
            }
            w.pop_indent();
            w.write(")");
        }

        if !decl.ports.is_empty() {
            w.line(" (")?;
            w.push_indent();
            for (i, port) in decl.ports.iter().enumerate() {
                let sep = separator(i, decl.ports.len());
                match port {
                    Port::Signal(signal) => self.signal(w, signal, sep, true)?,
                    Port::Bus(bus) => self.bus_port(w, bus, sep)?,
                }
            }
            w.pop_indent();
            w.write(")");
        }
        w.line(";")?;

        w.push_indent();
        for stmt in &decl.body {
            self.statement(w, stmt)?;
        }
        w.pop_indent();

        w.line(&format!("end{}", decl.kind.keyword()))?;
        Ok(())
    }

    fn expr(&self, expr: &Expression, context: impl FnOnce() -> String) -> Result<String, RenderError> {
        expr.render(&self.scope).map_err(|source| self.expr_error(source, context()))
    }

    fn expr_error(&self, source: ExprError, context: String) -> RenderError {
        RenderError::Expr {
            entity: self.decl.id.clone(),
            context,
            source,
        }
    }

    fn range(&self, span: &Span, id: &str) -> Result<String, RenderError> {
        let range = span
            .render_range(&self.scope)
            .map_err(|source| self.expr_error(source, format!("span of `{id}`")))?;
        Ok(if range.is_empty() {
            range
        } else {
            format!(" {range}")
        })
    }

    fn dimension(&self, count: &Expression, id: &str) -> Result<String, RenderError> {
        if count.as_constant() == Some(1) {
            return Ok(String::new());
        }
        let count = self.expr(count, || format!("count of `{id}`"))?;
        Ok(format!("[{count}]"))
    }

    fn parameter<W: Write>(
        &self,
        w: &mut Writer<W>,
        param: &Parameter,
        sep: &str,
    ) -> Result<(), RenderError> {
        comment(w, param.desc.as_deref())?;
        let default = self.expr(&param.default, || format!("default of `{}`", param.id))?;
        w.line(&format!("parameter {} = {default}{sep}", param.id))?;
        Ok(())
    }

    fn signal<W: Write>(
        &self,
        w: &mut Writer<W>,
        signal: &Signal,
        sep: &str,
        is_port: bool,
    ) -> Result<(), RenderError> {
        comment(w, signal.desc.as_deref())?;
        if is_port {
            let dir = signal.direction.map_or("input", |d| d.keyword());
            w.write(&format!("{dir} "));
        }
        let range = self.range(&signal.span, &signal.id)?;
        let dims = self.dimension(&signal.count, &signal.id)?;
        w.line(&format!("logic{range} {}{dims}{sep}", signal.id))?;
        Ok(())
    }

    fn bus_port<W: Write>(
        &self,
        w: &mut Writer<W>,
        bus: &BusInstance,
        sep: &str,
    ) -> Result<(), RenderError> {
        comment(w, bus.desc.as_deref())?;
        let dims = self.dimension(&bus.count, &bus.id)?;
        w.line(&format!("{} {}{dims}{sep}", bus.view(), bus.id))?;
        Ok(())
    }

    fn statement<W: Write>(&self, w: &mut Writer<W>, stmt: &Statement) -> Result<(), RenderError> {
        match stmt {
            Statement::Signal(signal) => self.signal(w, signal, ";", false),
            Statement::Parameter(param) => self.parameter(w, param, ";"),
            Statement::GenVar(decl) => {
                comment(w, decl.desc.as_deref())?;
                Ok(w.line(&format!("genvar {};", decl.id))?)
            }
            Statement::Integer(decl) => {
                comment(w, decl.desc.as_deref())?;
                Ok(w.line(&format!("integer {};", decl.id))?)
            }
            Statement::Assign(assign) => {
                self.assign(w, &assign.target, &assign.value, AssignForm::Continuous)
            }
            Statement::Block(block) => self.always(w, block),
            Statement::GenBlock(block) => self.generate(w, block),
            Statement::Instance(inst) => self.instance(w, inst),
            Statement::RoleView(view) => self.role_view(w, view),
        }
    }

    fn assign<W: Write>(
        &self,
        w: &mut Writer<W>,
        target: &Expression,
        value: &Expression,
        form: AssignForm,
    ) -> Result<(), RenderError> {
        let target_text = self.expr(target, || "assignment target".to_string())?;
        let value_text = self.expr(value, || format!("value assigned to `{target}`"))?;
        w.line(&form.format(&target_text, &value_text))?;
        Ok(())
    }

    fn always<W: Write>(&self, w: &mut Writer<W>, block: &Block) -> Result<(), RenderError> {
        let form = match &block.clock {
            Some(clock) => {
                let name = self.expr(&Expression::var(clock.signal.as_str()), || {
                    "block clock".to_string()
                })?;
                let edge = if clock.rising { "posedge" } else { "negedge" };
                w.line(&format!("always @({edge} {name}) begin"))?;
                AssignForm::NonBlocking
            }
            None => {
                w.line("always @(*) begin")?;
                AssignForm::Blocking
            }
        };
        self.nested(w, &block.body, form)?;
        w.line("end")?;
        Ok(())
    }

    fn generate<W: Write>(&self, w: &mut Writer<W>, block: &GenBlock) -> Result<(), RenderError> {
        w.line("generate")?;
        self.nested(w, &block.body, AssignForm::Continuous)?;
        w.line("endgenerate")?;
        Ok(())
    }

    fn nested<W: Write>(
        &self,
        w: &mut Writer<W>,
        body: &[BlockStatement],
        form: AssignForm,
    ) -> Result<(), RenderError> {
        w.push_indent();
        for stmt in body {
            self.block_statement(w, stmt, form)?;
        }
        w.pop_indent();
        Ok(())
    }

    fn block_statement<W: Write>(
        &self,
        w: &mut Writer<W>,
        stmt: &BlockStatement,
        form: AssignForm,
    ) -> Result<(), RenderError> {
        match stmt {
            BlockStatement::GenVar(decl) => w.line(&format!("genvar {};", decl.id))?,
            BlockStatement::Integer(decl) => w.line(&format!("integer {};", decl.id))?,
            BlockStatement::Assign(assign) => {
                self.assign(w, &assign.target, &assign.value, form)?
            }
            BlockStatement::For(f) => {
                let init = self.expr(&f.init, || "loop initializer".to_string())?;
                let cond = self.expr(&f.cond, || "loop condition".to_string())?;
                let step = self.expr(&f.step, || "loop step".to_string())?;
                w.line(&format!("for ({init}; {cond}; {step}) begin"))?;
                self.nested(w, &f.body, form)?;
                w.line("end")?;
            }
            BlockStatement::While(l) => {
                let cond = self.expr(&l.cond, || "loop condition".to_string())?;
                w.line(&format!("while ({cond}) begin"))?;
                self.nested(w, &l.body, form)?;
                w.line("end")?;
            }
            BlockStatement::If(branch) => self.conditional(w, branch, form)?,
        }
        Ok(())
    }

    fn conditional<W: Write>(
        &self,
        w: &mut Writer<W>,
        branch: &If,
        form: AssignForm,
    ) -> Result<(), RenderError> {
        let cond = self.expr(&branch.cond, || "condition".to_string())?;
        w.line(&format!("if ({cond}) begin"))?;
        self.nested(w, &branch.body, form)?;
        for (cond, body) in &branch.elifs {
            let cond = self.expr(cond, || "else-if condition".to_string())?;
            w.line(&format!("end else if ({cond}) begin"))?;
            self.nested(w, body, form)?;
        }
        if let Some(body) = &branch.else_body {
            w.line("end else begin")?;
            self.nested(w, body, form)?;
        }
        w.line("end")?;
        Ok(())
    }

    fn binding(&self, binding: &Binding, inst: &str, name: &str) -> Result<String, RenderError> {
        match binding {
            Binding::Expr(expr) => self.expr(expr, || format!("binding `.{name}` of `{inst}`")),
            Binding::Text(text) => Ok(text.clone()),
        }
    }

    fn instance<W: Write>(&self, w: &mut Writer<W>, inst: &Instance) -> Result<(), RenderError> {
        comment(w, inst.desc.as_deref())?;
        if inst.params.is_empty() {
            w.write(&format!("{} {} (", inst.module_type, inst.id));
        } else {
            w.line(&format!("{} #(", inst.module_type))?;
            w.push_indent();
            for (i, (name, binding)) in inst.params.iter().enumerate() {
                let value = self.binding(binding, &inst.id, name)?;
                w.line(&format!(".{name}({value}){}", separator(i, inst.params.len())))?;
            }
            w.pop_indent();
            w.write(&format!(") {} (", inst.id));
        }

        if inst.ports.is_empty() {
            w.line(");")?;
            return Ok(());
        }
        w.newline()?;
        w.push_indent();
        for (i, (name, binding)) in inst.ports.iter().enumerate() {
            let value = self.binding(binding, &inst.id, name)?;
            w.line(&format!(".{name}({value}){}", separator(i, inst.ports.len())))?;
        }
        w.pop_indent();
        w.line(");")?;
        Ok(())
    }

    fn role_view<W: Write>(&self, w: &mut Writer<W>, view: &RoleView) -> Result<(), RenderError> {
        comment(w, view.desc.as_deref())?;
        let members: Vec<String> = view
            .signals
            .iter()
            .map(|(id, dir)| format!("{} {id}", dir.keyword()))
            .collect();
        w.line(&format!("modport {} ({});", view.role, members.join(", ")))?;
        Ok(())
    }
}

fn separator(index: usize, len: usize) -> &'static str {
    if index + 1 < len {
        ","
    } else {
        ""
    }
}

/// Emits each line of `text` as a `//` comment.
fn comment<W: Write>(w: &mut Writer<W>, text: Option<&str>) -> io::Result<()> {
    if let Some(text) = text {
        for line in text.lines() {
            w.line(&format!("// {line}"))?;
        }
    }
    Ok(())
}

/// Renders `decl` into a string with the given indent unit and line ending.
pub fn render_to_string(
    decl: &EntityDecl,
    indent: &str,
    line_ending: &str,
) -> Result<String, RenderError> {
    let renderer = EntityRenderer::new(decl)?;
    let mut writer = Writer::with_format(Vec::new(), indent, line_ending);
    renderer.render(&mut writer)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes)
        .map_err(|e| RenderError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Renders each declaration into its own buffer, in parallel, keeping order.
pub fn render_all(
    decls: &[EntityDecl],
    indent: &str,
    line_ending: &str,
) -> Result<Vec<String>, RenderError> {
    decls
        .par_iter()
        .map(|decl| render_to_string(decl, indent, line_ending))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustool_expr::Op;
    use bustool_ir::{Assign, ClockEdge, Decl, EntityKind, For};
    use bustool_protocol::Direction;

    fn render(decl: &EntityDecl) -> String {
        render_to_string(decl, "    ", "\n").unwrap()
    }

    fn var(name: &str) -> Expression {
        Expression::var(name)
    }

    #[test]
    fn empty_module() {
        let decl = EntityDecl::new(EntityKind::Module, "empty");
        assert_eq!(render(&decl), "module empty;\nendmodule\n");
    }

    #[test]
    fn header_with_parameters_and_ports() {
        let mut decl = EntityDecl::new(EntityKind::Module, "top");
        decl.desc = Some("Top level.\nSecond line.".into());
        decl.parameters.push(Parameter::new(
            "W",
            Some("Width.".into()),
            Expression::constant(8),
        ));
        decl.parameters
            .push(Parameter::new("N", None, Expression::constant(2)));
        decl.ports.push(Signal::new("clk", Span::default()).into());
        decl.ports.push(
            Signal::new(
                "data",
                Span::from_width(var("W")).unwrap(),
            )
            .with_direction(Direction::Output)
            .with_count(var("N"))
            .into(),
        );
        let expected = "\
// Top level.
// Second line.
module top #(
    // Width.
    parameter W = 8,
    parameter N = 2
) (
    input logic clk,
    output logic [W - 1:0] data[N]
);
endmodule
";
        assert_eq!(render(&decl), expected);
    }

    #[test]
    fn ports_without_parameters() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.ports.push(Signal::new("a", Span::default()).into());
        assert_eq!(render(&decl), "module m (\n    input logic a\n);\nendmodule\n");
    }

    #[test]
    fn clocked_and_combinational_blocks() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.ports.push(Signal::new("clk", Span::default()).into());
        decl.body.push(Statement::Signal(Signal::new("q", Span::default())));
        decl.body.push(Statement::Signal(Signal::new("d", Span::default())));
        let assign = || BlockStatement::Assign(Assign::new(var("q"), var("d")));
        decl.body.push(Statement::Block(Block {
            clock: Some(ClockEdge {
                signal: "clk".into(),
                rising: false,
            }),
            body: vec![assign()],
        }));
        decl.body.push(Statement::Block(Block {
            clock: None,
            body: vec![assign()],
        }));
        let out = render(&decl);
        assert!(out.contains("    always @(negedge clk) begin\n        q <= d;\n    end\n"));
        assert!(out.contains("    always @(*) begin\n        q = d;\n    end\n"));
    }

    #[test]
    fn generate_loop_uses_continuous_assignments() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.parameters
            .push(Parameter::new("N", None, Expression::constant(4)));
        decl.body.push(Statement::GenVar(Decl::new("x")));
        decl.body.push(Statement::Signal(
            Signal::new("v", Span::from_width(var("N")).unwrap()),
        ));
        let target = Expression::binary(Op::Index, var("v"), var("x")).unwrap();
        let body = vec![BlockStatement::Assign(Assign::new(target, Expression::constant(0)))];
        decl.body.push(Statement::GenBlock(GenBlock {
            body: vec![BlockStatement::For(For::counting("x", var("N"), body).unwrap())],
        }));
        let out = render(&decl);
        let expected = "\
    genvar x;
    logic [N - 1:0] v;
    generate
        for (x = 0; x < N; x = x + 1) begin
            assign v[x] = 0;
        end
    endgenerate
";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn if_chain_keeps_order() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        for id in ["a", "b", "y"] {
            decl.body.push(Statement::Signal(Signal::new(id, Span::default())));
        }
        let set = |v: i64| vec![BlockStatement::Assign(Assign::new(var("y"), Expression::constant(v)))];
        let chain = If::new(var("a"), set(1))
            .else_if(var("b"), set(2))
            .otherwise(set(3));
        decl.body.push(Statement::Block(Block {
            clock: None,
            body: vec![BlockStatement::If(chain)],
        }));
        let out = render(&decl);
        let expected = "\
        if (a) begin
            y = 1;
        end else if (b) begin
            y = 2;
        end else begin
            y = 3;
        end
";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn instance_rendering() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        for id in ["clk", "d", "q"] {
            decl.body.push(Statement::Signal(Signal::new(id, Span::default())));
        }
        decl.body.push(Statement::Instance(
            Instance::new("hu_pipeline_reg", "plr_q")
                .param("regtype", Binding::Text("bit".into()))
                .param("depth", Expression::constant(2))
                .port("clk", var("clk"))
                .port("d", var("d"))
                .port("q", var("q")),
        ));
        let out = render(&decl);
        let expected = "\
    hu_pipeline_reg #(
        .regtype(bit),
        .depth(2)
    ) plr_q (
        .clk(clk),
        .d(d),
        .q(q)
    );
";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn instance_without_parameters() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.body.push(Statement::Instance(Instance::new("cell", "u0")));
        assert!(render(&decl).contains("    cell u0 ();\n"));
    }

    #[test]
    fn role_view_line() {
        let mut decl = EntityDecl::new(EntityKind::Interface, "bus_a");
        decl.body.push(Statement::RoleView(RoleView {
            role: "host".into(),
            desc: Some("Signals from host perspective.".into()),
            signals: vec![
                ("req".into(), Direction::Output),
                ("ack".into(), Direction::Input),
            ],
        }));
        let out = render(&decl);
        assert!(out.contains("    // Signals from host perspective.\n    modport host (output req, input ack);\n"));
        assert!(out.ends_with("endinterface\n"));
    }

    #[test]
    fn unbound_name_is_reported_with_context() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.body.push(Statement::Assign(Assign::new(var("ghost"), Expression::constant(1))));
        let err = render_to_string(&decl, "    ", "\n").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Expr { ref context, source: ExprError::UnboundVariable { .. }, .. }
                if context == "assignment target"
        ));
    }

    #[test]
    fn duplicate_fails_before_any_output() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.body.push(Statement::Signal(Signal::new("x", Span::default())));
        decl.body.push(Statement::Signal(Signal::new("x", Span::default())));
        assert!(matches!(
            EntityRenderer::new(&decl),
            Err(RenderError::DuplicateIdentifier { ref id, .. }) if id == "x"
        ));
    }

    #[test]
    fn render_all_keeps_order() {
        let decls: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|id| EntityDecl::new(EntityKind::Module, *id))
            .collect();
        let out = render_all(&decls, "    ", "\n").unwrap();
        assert_eq!(out, ["module a;\nendmodule\n", "module b;\nendmodule\n", "module c;\nendmodule\n"]);
    }

    #[test]
    fn crlf_and_tab_indent() {
        let mut decl = EntityDecl::new(EntityKind::Module, "m");
        decl.body.push(Statement::GenVar(Decl::new("x")));
        let out = render_to_string(&decl, "\t", "\r\n").unwrap();
        assert_eq!(out, "module m;\r\n\tgenvar x;\r\nendmodule\r\n");
    }
}
