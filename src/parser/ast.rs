// ABOUTME: Abstract syntax tree for parsed notification templates
// ABOUTME: Defines text, action, if, and range nodes plus pipelines, commands, and operands

/// Source location of a token or node, byte offsets plus line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// A top-level piece of a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied through to the output untouched.
    Text(String),
    /// An action whose pipeline result is written to the output,
    /// unless the pipeline declares a variable.
    Action(Pipeline),
    If(Branch),
    Range(Branch),
}

/// Shared shape of `if` and `range` blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipe: Pipeline,
    pub body: Vec<Node>,
    pub else_body: Vec<Node>,
    pub span: Span,
}

/// A chain of commands joined by `|`, optionally binding variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Variable names bound by this pipeline, each including the leading `$`.
    pub decls: Vec<String>,
    /// True when the pipeline assigns with `=` instead of declaring with `:=`.
    pub assign: bool,
    pub cmds: Vec<Command>,
    pub span: Span,
}

/// One command in a pipeline: an operand followed by its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Expr>,
    pub span: Span,
}

/// An operand inside a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil(Span),
    Bool(bool, Span),
    Int(i64, Span),
    Float(f64, Span),
    Str(String, Span),
    /// The cursor `.`, the value the surrounding block executes against.
    Dot(Span),
    /// A field chain rooted at the cursor, like `.Trigger.Name`.
    Field(Vec<String>, Span),
    /// A variable reference with an optional field chain, like `$v.Metric`.
    Variable(String, Vec<String>, Span),
    /// A call to a registered helper function.
    Func(String, Span),
    /// A parenthesized pipeline, with an optional field chain on its result.
    Paren(Box<Pipeline>, Vec<String>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Nil(span)
            | Expr::Bool(_, span)
            | Expr::Int(_, span)
            | Expr::Float(_, span)
            | Expr::Str(_, span)
            | Expr::Dot(span)
            | Expr::Field(_, span)
            | Expr::Variable(_, _, span)
            | Expr::Func(_, span)
            | Expr::Paren(_, _, span) => *span,
        }
    }
}
