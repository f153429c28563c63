//! Body statements and procedural statements.

use bustool_expr::{ExprError, Expression, Op};
use bustool_protocol::{Direction, Parameter, Signal};
use indexmap::IndexMap;
use serde::Serialize;

/// A statement at entity body level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// A local signal declaration.
    Signal(Signal),
    /// A local parameter declaration.
    Parameter(Parameter),
    /// A generate loop variable.
    GenVar(Decl),
    /// An integer loop variable.
    Integer(Decl),
    /// A continuous assignment.
    Assign(Assign),
    /// An `always` region.
    Block(Block),
    /// A `generate` region.
    GenBlock(GenBlock),
    /// A sub-module instantiation.
    Instance(Instance),
    /// A named view of an interface (`modport`).
    RoleView(RoleView),
}

/// A statement inside an `always`, `generate`, loop or branch body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockStatement {
    /// A generate loop variable.
    GenVar(Decl),
    /// An integer loop variable.
    Integer(Decl),
    /// An assignment, rendered with the form of the enclosing region.
    Assign(Assign),
    /// A counted loop.
    For(For),
    /// A conditional loop.
    While(While),
    /// A conditional with optional `else if` and `else` branches.
    If(If),
}

/// A declaration that only carries a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decl {
    /// Declared name.
    pub id: String,
    /// Optional description.
    pub desc: Option<String>,
}

impl Decl {
    /// Creates an undocumented declaration.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: None,
        }
    }
}

/// `target = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assign {
    /// The assigned location, resolved through the entity scope.
    pub target: Expression,
    /// The assigned value.
    pub value: Expression,
}

impl Assign {
    /// Creates an assignment.
    pub fn new(target: Expression, value: Expression) -> Self {
        Self { target, value }
    }
}

/// The clock edge a sequential block is sensitive to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockEdge {
    /// Clock name, resolved through the entity scope.
    pub signal: String,
    /// `true` for `posedge`, `false` for `negedge`.
    pub rising: bool,
}

/// An `always` region. Clocked blocks use non-blocking assignments,
/// combinational blocks use blocking assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Sensitivity edge, `None` for a combinational block.
    pub clock: Option<ClockEdge>,
    /// Block body.
    pub body: Vec<BlockStatement>,
}

/// A `generate` region. Assignments inside it are continuous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenBlock {
    /// Region body.
    pub body: Vec<BlockStatement>,
}

/// `for (init; cond; step) begin ... end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct For {
    /// Initialization, usually a `$set`.
    pub init: Expression,
    /// Loop condition.
    pub cond: Expression,
    /// Step, usually a `$set`.
    pub step: Expression,
    /// Loop body.
    pub body: Vec<BlockStatement>,
}

impl For {
    /// Builds `for (var = 0; var < limit; var = var + 1)`.
    pub fn counting(
        var: &str,
        limit: Expression,
        body: Vec<BlockStatement>,
    ) -> Result<Self, ExprError> {
        let v = || Expression::var(var);
        Ok(Self {
            init: Expression::binary(Op::Set, v(), Expression::constant(0))?,
            cond: Expression::binary(Op::Lt, v(), limit)?,
            step: Expression::binary(
                Op::Set,
                v(),
                Expression::binary(Op::Add, v(), Expression::constant(1))?,
            )?,
            body,
        })
    }
}

/// `while (cond) begin ... end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct While {
    /// Loop condition.
    pub cond: Expression,
    /// Loop body.
    pub body: Vec<BlockStatement>,
}

/// `if` with ordered `else if` branches and an optional `else`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct If {
    /// Primary condition.
    pub cond: Expression,
    /// Primary body.
    pub body: Vec<BlockStatement>,
    /// `else if` branches in the order they were added.
    pub elifs: Vec<(Expression, Vec<BlockStatement>)>,
    /// `else` body.
    pub else_body: Option<Vec<BlockStatement>>,
}

impl If {
    /// Creates an `if` without further branches.
    pub fn new(cond: Expression, body: Vec<BlockStatement>) -> Self {
        Self {
            cond,
            body,
            elifs: Vec::new(),
            else_body: None,
        }
    }

    /// Appends an `else if` branch.
    pub fn else_if(mut self, cond: Expression, body: Vec<BlockStatement>) -> Self {
        self.elifs.push((cond, body));
        self
    }

    /// Sets the `else` branch.
    pub fn otherwise(mut self, body: Vec<BlockStatement>) -> Self {
        self.else_body = Some(body);
        self
    }
}

/// A value bound to an instance parameter or port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Binding {
    /// An expression rendered through the entity scope.
    Expr(Expression),
    /// Literal text.
    Text(String),
}

impl From<Expression> for Binding {
    fn from(expr: Expression) -> Self {
        Binding::Expr(expr)
    }
}

/// `module_type #(.p(v)) id (.port(v));`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    /// Instantiated module name.
    pub module_type: String,
    /// Instance name.
    pub id: String,
    /// Optional description.
    pub desc: Option<String>,
    /// Parameter bindings, in emission order.
    pub params: IndexMap<String, Binding>,
    /// Port bindings, in emission order.
    pub ports: IndexMap<String, Binding>,
}

impl Instance {
    /// Creates an instance with no bindings.
    pub fn new(module_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            module_type: module_type.into(),
            id: id.into(),
            desc: None,
            params: IndexMap::new(),
            ports: IndexMap::new(),
        }
    }

    /// Binds a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Binds a port.
    pub fn port(mut self, name: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.ports.insert(name.into(), value.into());
        self
    }
}

/// The signals of an interface as seen from one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleView {
    /// Role name, the emitted `modport` name.
    pub role: String,
    /// Optional description.
    pub desc: Option<String>,
    /// Member signals and their directions from this role's side.
    pub signals: Vec<(String, Direction)>,
}
