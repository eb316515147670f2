// ABOUTME: Walks a parsed template tree and renders it against a context
// ABOUTME: Handles variable scoping, pipeline evaluation, field access, and output escaping

use std::collections::HashMap;

use crate::parser::{Branch, Command, Expr, Node, Pipeline, Span};

use super::context::RenderContext;
use super::error::RenderError;
use super::helpers::FuncRegistry;
use super::value::{html_escape, Value};

/// Render parsed nodes against a context, returning the raw output.
pub(crate) fn execute(
    nodes: &[Node],
    context: &RenderContext,
    funcs: &FuncRegistry,
) -> Result<String, RenderError> {
    let root = Value::Context(context.clone());
    let mut globals = HashMap::new();
    globals.insert("$".to_string(), root.clone());
    let mut executor = Executor {
        funcs,
        scopes: vec![globals],
        out: String::new(),
    };
    executor.walk(nodes, &root)?;
    Ok(executor.out)
}

/// Execution state: the helper registry, the variable scope stack,
/// and the output accumulated so far.
struct Executor<'a> {
    funcs: &'a FuncRegistry,
    scopes: Vec<HashMap<String, Value>>,
    out: String,
}

impl Executor<'_> {
    fn walk(&mut self, nodes: &[Node], dot: &Value) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Action(pipe) => self.run_action(pipe, dot)?,
                Node::If(branch) => self.run_if(branch, dot)?,
                Node::Range(branch) => self.run_range(branch, dot)?,
            }
        }
        Ok(())
    }

    /// Evaluate an action pipeline. A pipeline that binds variables
    /// produces no output, everything else is escaped and written.
    fn run_action(&mut self, pipe: &Pipeline, dot: &Value) -> Result<(), RenderError> {
        let value = self.eval_pipeline(pipe, dot)?;
        if pipe.decls.is_empty() {
            html_escape(&mut self.out, &value.to_string());
        }
        Ok(())
    }

    /// Variables bound by the condition or inside the block stay local to it.
    fn run_if(&mut self, branch: &Branch, dot: &Value) -> Result<(), RenderError> {
        self.push_scope();
        let result = self.run_if_scoped(branch, dot);
        self.pop_scope();
        result
    }

    fn run_if_scoped(&mut self, branch: &Branch, dot: &Value) -> Result<(), RenderError> {
        let value = self.eval_pipeline(&branch.pipe, dot)?;
        if value.is_truthy() {
            self.walk(&branch.body, dot)
        } else {
            self.walk(&branch.else_body, dot)
        }
    }

    fn run_range(&mut self, branch: &Branch, dot: &Value) -> Result<(), RenderError> {
        self.push_scope();
        let result = self.run_range_scoped(branch, dot);
        self.pop_scope();
        result
    }

    /// Iterate a list, rebinding the loop variables and resetting the
    /// iteration scope each pass. An empty list runs the else branch.
    fn run_range_scoped(&mut self, branch: &Branch, dot: &Value) -> Result<(), RenderError> {
        let value = self.eval_pipeline(&branch.pipe, dot)?;
        let items = match value {
            Value::List(items) => items,
            other => {
                return Err(RenderError::new(
                    format!("range can't iterate over {}", other.type_name()),
                    branch.pipe.span,
                ));
            }
        };
        if items.is_empty() {
            return self.walk(&branch.else_body, dot);
        }
        for (index, item) in items.iter().enumerate() {
            self.push_scope();
            let result = self
                .bind_loop_vars(&branch.pipe, index as i64, item)
                .and_then(|()| self.walk(&branch.body, item));
            self.pop_scope();
            result?;
        }
        Ok(())
    }

    /// One declared variable receives the element, two receive index
    /// and element.
    fn bind_loop_vars(
        &mut self,
        pipe: &Pipeline,
        index: i64,
        item: &Value,
    ) -> Result<(), RenderError> {
        match pipe.decls.as_slice() {
            [] => Ok(()),
            [value_name] => self.bind(pipe, value_name, item.clone()),
            [index_name, value_name] => {
                self.bind(pipe, index_name, Value::Int(index))?;
                self.bind(pipe, value_name, item.clone())
            }
            _ => Err(RenderError::new(
                "too many declarations in range",
                pipe.span,
            )),
        }
    }

    fn bind(&mut self, pipe: &Pipeline, name: &str, value: Value) -> Result<(), RenderError> {
        if pipe.assign {
            self.set_var(name, value, pipe.span)
        } else {
            self.declare(name, value);
            Ok(())
        }
    }

    /// Run the commands left to right, feeding each result into the next
    /// command as its final argument, then bind any declared variables.
    fn eval_pipeline(&mut self, pipe: &Pipeline, dot: &Value) -> Result<Value, RenderError> {
        let mut value = Value::Null;
        let mut piped: Option<Value> = None;
        for cmd in &pipe.cmds {
            value = self.eval_command(cmd, dot, piped.take())?;
            piped = Some(value.clone());
        }
        for name in &pipe.decls {
            self.bind(pipe, name, value.clone())?;
        }
        Ok(value)
    }

    fn eval_command(
        &mut self,
        cmd: &Command,
        dot: &Value,
        piped: Option<Value>,
    ) -> Result<Value, RenderError> {
        let Some((first, rest)) = cmd.args.split_first() else {
            return Err(RenderError::new("empty command", cmd.span));
        };
        let mut args = Vec::with_capacity(rest.len() + 1);
        for arg in rest {
            args.push(self.eval_arg(arg, dot)?);
        }
        if let Some(value) = piped {
            args.push(value);
        }
        match first {
            Expr::Func(name, span) => self
                .funcs
                .call(name, &args)
                .map_err(|err| RenderError::from_func(err, *span)),
            Expr::Field(chain, span) => self.resolve_chain(dot.clone(), chain, args, *span),
            Expr::Variable(name, chain, span) => {
                let base = self.lookup(name, *span)?;
                self.resolve_chain(base, chain, args, *span)
            }
            Expr::Paren(pipe, chain, span) => {
                let base = self.eval_pipeline(pipe, dot)?;
                self.resolve_chain(base, chain, args, *span)
            }
            Expr::Dot(span) => {
                if args.is_empty() {
                    Ok(dot.clone())
                } else {
                    Err(RenderError::new(
                        "can't give argument to non-function .",
                        *span,
                    ))
                }
            }
            Expr::Nil(span) => Err(RenderError::new("nil is not a command", *span)),
            literal => {
                if args.is_empty() {
                    self.eval_arg(literal, dot)
                } else {
                    Err(RenderError::new(
                        "can't give argument to non-function",
                        literal.span(),
                    ))
                }
            }
        }
    }

    /// Evaluate a command argument. Arguments never see the piped value.
    fn eval_arg(&mut self, expr: &Expr, dot: &Value) -> Result<Value, RenderError> {
        match expr {
            Expr::Nil(_) => Ok(Value::Null),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Int(i, _) => Ok(Value::Int(*i)),
            Expr::Float(f, _) => Ok(Value::Float(*f)),
            Expr::Str(s, _) => Ok(Value::Str(s.clone())),
            Expr::Dot(_) => Ok(dot.clone()),
            Expr::Field(chain, span) => {
                self.resolve_chain(dot.clone(), chain, Vec::new(), *span)
            }
            Expr::Variable(name, chain, span) => {
                let base = self.lookup(name, *span)?;
                self.resolve_chain(base, chain, Vec::new(), *span)
            }
            Expr::Func(name, span) => self
                .funcs
                .call(name, &[])
                .map_err(|err| RenderError::from_func(err, *span)),
            Expr::Paren(pipe, chain, span) => {
                let base = self.eval_pipeline(pipe, dot)?;
                self.resolve_chain(base, chain, Vec::new(), *span)
            }
        }
    }

    /// Walk a field chain. Arguments only make sense on the final
    /// segment, where they turn the access into a method call.
    fn resolve_chain(
        &mut self,
        base: Value,
        chain: &[String],
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RenderError> {
        let Some((last, walked)) = chain.split_last() else {
            if args.is_empty() {
                return Ok(base);
            }
            return Err(RenderError::new(
                "can't give argument to non-function",
                span,
            ));
        };
        let mut current = base;
        for name in walked {
            current = access(&current, name, &[], span)?;
        }
        access(&current, last, &args, span)
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind a variable in the innermost scope, shadowing any outer binding.
    fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Reassign an existing variable, searching scopes innermost first.
    fn set_var(&mut self, name: &str, value: Value, span: Span) -> Result<(), RenderError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(RenderError::new(
            format!("undefined variable: {name}"),
            span,
        ))
    }

    fn lookup(&self, name: &str, span: Span) -> Result<Value, RenderError> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Ok(value.clone());
            }
        }
        Err(RenderError::new(
            format!("undefined variable: {name}"),
            span,
        ))
    }
}

/// Resolve one name on a value, trying methods before data fields.
fn access(value: &Value, name: &str, args: &[Value], span: Span) -> Result<Value, RenderError> {
    if let Some(result) = value.call_method(name, args) {
        return result.map_err(|err| RenderError::from_func(err, span));
    }
    if args.is_empty() {
        if let Some(field) = value.field(name) {
            return Ok(field);
        }
    } else if value.field(name).is_some() {
        return Err(RenderError::new(
            format!("can't give argument to non-method {name}"),
            span,
        ));
    }
    Err(no_field_error(value, name, span))
}

fn no_field_error(value: &Value, name: &str, span: Span) -> RenderError {
    match value {
        Value::Null => RenderError::new(format!("nil pointer evaluating field {name}"), span),
        other => RenderError::new(
            format!("can't evaluate field {name} in type {}", other.type_name()),
            span,
        ),
    }
}
