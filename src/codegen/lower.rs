//! Statement lowering
//!
//! Turns the LLNF body of one top-level declaration into a C++ function.
//! Every binder is renamed to a fresh numeral (`x_<n>` for values, `lbl_<n>`
//! for join points). Join points become labeled blocks placed after the block
//! that defines them, and jumps become parameter assignments plus `goto`:
//!
//! ```text
//! {                          // block of the let-chain
//!     obj* x_2;              // join point parameter, declared up front
//!     ...
//!     x_2 = x_1;             // jmp j x
//!     goto lbl_3;
//!     lbl_3: {               // join point body
//!         return x_2;
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use log::debug;

use crate::config::EmitConfig;
use crate::env::{DeclKind, Environment};
use crate::errors::{EmitError, EmitResult};
use crate::foreign::{base_cpp_name, base_init_name, cpp_name};
use crate::llnf::{Binding, Body, Code, CompDecl, Literal, Op, Param, Terminal, Value, VarId};
use crate::name::Name;
use crate::types::{lower_type, LlType};

// ============================================================================
// Local context
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum LocalKind {
    Value(LlType),
    /// Result of a void instruction; bound but never stored
    Void,
    JoinPoint,
}

#[derive(Debug, Clone, PartialEq)]
struct Local {
    idx: u32,
    kind: LocalKind,
}

/// Live locals of the function being lowered. Extending returns a new
/// context, so a nested block can grow its own copy without affecting the
/// enclosing one.
#[derive(Debug, Clone, Default)]
struct LocalContext {
    locals: im::HashMap<VarId, Local>,
}

impl LocalContext {
    fn with_local(&self, var: VarId, idx: u32, kind: LocalKind) -> Self {
        let mut ctx = self.clone();
        ctx.locals.insert(var, Local { idx, kind });
        ctx
    }

    fn get(&self, var: VarId) -> EmitResult<&Local> {
        self.locals.get(&var).ok_or(EmitError::UnboundLocal(var))
    }

    /// C++ name of a value local
    fn value(&self, var: VarId) -> EmitResult<String> {
        match self.get(var)? {
            Local {
                idx,
                kind: LocalKind::Value(_),
            } => Ok(format!("x_{}", idx)),
            _ => Err(EmitError::NotAValue(var)),
        }
    }

    fn value_type(&self, var: VarId) -> EmitResult<&LlType> {
        match &self.get(var)?.kind {
            LocalKind::Value(ty) => Ok(ty),
            _ => Err(EmitError::NotAValue(var)),
        }
    }

    fn values(&self, vars: &[VarId]) -> EmitResult<Vec<String>> {
        vars.iter().map(|v| self.value(*v)).collect()
    }
}

/// Join point as seen by jumps: its label and parameter locals. Jumps
/// resolve the target through the local context first, so the table is only
/// consulted for join points in lexical scope.
#[derive(Debug, Clone)]
struct JoinPoint {
    label: u32,
    params: Vec<u32>,
}

/// A non-join binding waiting for its statement to be emitted
enum Pending<'b> {
    Void(&'b Value, LocalContext),
    Assign {
        idx: u32,
        ty: &'b LlType,
        value: &'b Value,
        ctx: LocalContext,
    },
}

/// Join point body emitted after the block that defines it
struct Deferred<'b> {
    label: u32,
    body: &'b Body,
    ctx: LocalContext,
}

// ============================================================================
// Function emitter
// ============================================================================

/// Lowers one top-level declaration. The fresh-name counter and join-point
/// table live exactly as long as this value.
pub struct FnEmitter<'a, W: Write> {
    out: &'a mut W,
    env: &'a Environment,
    config: &'a EmitConfig,
    next_idx: u32,
    join_points: HashMap<VarId, JoinPoint>,
}

impl<'a, W: Write> FnEmitter<'a, W> {
    pub fn new(out: &'a mut W, env: &'a Environment, config: &'a EmitConfig) -> Self {
        FnEmitter {
            out,
            env,
            config,
            next_idx: 1,
            join_points: HashMap::new(),
        }
    }

    fn fresh(&mut self) -> u32 {
        let idx = self.next_idx;
        self.next_idx += 1;
        idx
    }

    /// Emit the C++ definition of `decl`: a named function for a function
    /// literal, or the `_init_` function of a computed constant.
    pub fn emit_decl(mut self, decl: &CompDecl) -> EmitResult<()> {
        debug!("lowering {}", decl.name);
        let env = self.env;
        let declared = env
            .find(&decl.name)
            .ok_or_else(|| EmitError::UnknownDeclaration(decl.name.clone()))?;
        let ret = lower_type(declared.ll_type.result_type())?;

        let mut ctx = LocalContext::default();
        match &decl.code {
            Code::Fn { params, body } => {
                check_signature(&decl.name, &declared.ll_type, params)?;
                write!(self.out, "{} {}(", ret, base_cpp_name(self.env, &decl.name))?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str(", ")?;
                    }
                    let idx = self.fresh();
                    write!(self.out, "{} x_{}", lower_type(&param.ty)?, idx)?;
                    ctx = ctx.with_local(param.var, idx, LocalKind::Value(param.ty.clone()));
                }
                self.out.write_str(") ")?;
                self.emit_block(body, ctx, 0)
            }
            Code::Const(body) => {
                write!(self.out, "{} {}() ", ret, base_init_name(self.env, &decl.name))?;
                self.emit_block(body, ctx, 0)
            }
        }
    }

    /// Emit `{`, the body at `depth + 1`, and the closing brace at `depth`.
    /// The caller has already written whatever precedes the opening brace.
    fn emit_block(&mut self, body: &Body, ctx: LocalContext, depth: usize) -> EmitResult<()> {
        self.out.write_str("{\n")?;
        self.emit_body(body, ctx, depth + 1)?;
        writeln!(self.out, "{}}}", self.config.pad(depth))?;
        Ok(())
    }

    fn emit_body(&mut self, body: &Body, mut ctx: LocalContext, depth: usize) -> EmitResult<()> {
        let pad = self.config.pad(depth);
        let mut pending = Vec::new();
        let mut deferred = Vec::new();

        // Declarations first, so jumps from any nested block can assign into
        // join point parameters.
        for binding in &body.bindings {
            match binding {
                Binding::Join { var, params, body } => {
                    let mut jp_ctx = ctx.clone();
                    let mut param_idxs = Vec::with_capacity(params.len());
                    for param in params {
                        let idx = self.fresh();
                        writeln!(self.out, "{}{} x_{};", pad, lower_type(&param.ty)?, idx)?;
                        jp_ctx = jp_ctx.with_local(param.var, idx, LocalKind::Value(param.ty.clone()));
                        param_idxs.push(idx);
                    }
                    let label = self.fresh();
                    jp_ctx = jp_ctx.with_local(*var, label, LocalKind::JoinPoint);
                    self.join_points.insert(
                        *var,
                        JoinPoint {
                            label,
                            params: param_idxs,
                        },
                    );
                    ctx = ctx.with_local(*var, label, LocalKind::JoinPoint);
                    deferred.push(Deferred {
                        label,
                        body,
                        ctx: jp_ctx,
                    });
                }
                Binding::Let { var, ty, value } if ty.is_void() => {
                    pending.push(Pending::Void(value, ctx.clone()));
                    let idx = self.fresh();
                    ctx = ctx.with_local(*var, idx, LocalKind::Void);
                }
                Binding::Let { var, ty, value } => {
                    let idx = self.fresh();
                    writeln!(self.out, "{}{} x_{};", pad, lower_type(ty)?, idx)?;
                    pending.push(Pending::Assign {
                        idx,
                        ty,
                        value,
                        ctx: ctx.clone(),
                    });
                    ctx = ctx.with_local(*var, idx, LocalKind::Value(ty.clone()));
                }
            }
        }

        for instr in pending {
            match instr {
                Pending::Void(value, ctx) => self.emit_void(value, &ctx, &pad)?,
                Pending::Assign { idx, ty, value, ctx } => {
                    self.emit_assign(idx, ty, value, &ctx, &pad)?
                }
            }
        }

        self.emit_terminal(&body.terminal, &ctx, depth)?;

        for jp in deferred {
            write!(self.out, "{}lbl_{}: ", pad, jp.label)?;
            self.emit_block(jp.body, jp.ctx, depth)?;
        }
        Ok(())
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    fn emit_void(&mut self, value: &Value, ctx: &LocalContext, pad: &str) -> EmitResult<()> {
        match value {
            Value::Op(Op::Inc(x)) => writeln!(self.out, "{}lean::inc({});", pad, ctx.value(*x)?)?,
            Value::Op(Op::Dec(x)) => writeln!(self.out, "{}lean::dec({});", pad, ctx.value(*x)?)?,
            Value::Op(Op::Cnstr { .. }) => {
                return Err(EmitError::InvalidInstruction(
                    "constructor allocation bound to a void local".to_string(),
                ))
            }
            other => {
                let expr = self.value_expr(other, None, ctx)?;
                writeln!(self.out, "{}{};", pad, expr)?;
            }
        }
        Ok(())
    }

    fn emit_assign(
        &mut self,
        idx: u32,
        ty: &LlType,
        value: &Value,
        ctx: &LocalContext,
        pad: &str,
    ) -> EmitResult<()> {
        match value {
            Value::Op(Op::Cnstr {
                tag,
                scalar_size,
                fields,
            }) => {
                writeln!(
                    self.out,
                    "{}x_{} = lean::alloc_cnstr({}, {}, {});",
                    pad,
                    idx,
                    tag,
                    fields.len(),
                    scalar_size
                )?;
                for (i, field) in ctx.values(fields)?.iter().enumerate() {
                    writeln!(self.out, "{}lean::cnstr_set(x_{}, {}, {});", pad, idx, i, field)?;
                }
            }
            other => {
                let expr = self.value_expr(other, Some(ty), ctx)?;
                writeln!(self.out, "{}x_{} = {};", pad, idx, expr)?;
            }
        }
        Ok(())
    }

    /// Right-hand side of a single-statement instruction. `ty` is the type
    /// of the receiving local, `None` for void instructions.
    fn value_expr(&self, value: &Value, ty: Option<&LlType>, ctx: &LocalContext) -> EmitResult<String> {
        let expr = match value {
            Value::Call { func, args } => {
                format!("{}({})", self.callee(func), ctx.values(args)?.join(", "))
            }
            Value::Const(name) => self.callee(name),
            Value::Neutral => "lean::box(0)".to_string(),
            Value::Var(x) => ctx.value(*x)?,
            Value::Lit(Literal::Num(n)) => match ty {
                Some(LlType::Object) => format!("lean::mk_nat_obj({}u)", n),
                Some(LlType::UInt64 | LlType::USize) => format!("{}ull", n),
                _ => n.to_string(),
            },
            Value::Lit(Literal::Str(s)) => format!("lean::mk_string(\"{}\")", escape_string(s)),
            Value::Op(Op::Proj { index, var }) => {
                format!("lean::cnstr_get({}, {})", ctx.value(*var)?, index)
            }
            Value::Op(Op::Box(x)) => format!("lean::box({})", ctx.value(*x)?),
            Value::Op(Op::Unbox(x)) => format!("lean::unbox({})", ctx.value(*x)?),
            Value::Op(Op::Apply { func, args }) => {
                if args.is_empty() {
                    return Err(EmitError::InvalidInstruction(format!(
                        "closure application of {} without arguments",
                        func
                    )));
                }
                let mut operands = vec![ctx.value(*func)?];
                operands.extend(ctx.values(args)?);
                format!("lean::apply_{}({})", args.len(), operands.join(", "))
            }
            Value::Op(op @ (Op::Inc(_) | Op::Dec(_) | Op::Cnstr { .. })) => {
                return Err(EmitError::InvalidInstruction(format!(
                    "{:?} cannot be used as an expression",
                    op
                )))
            }
        };
        Ok(expr)
    }

    /// Identifier used to reference a declaration from a function body
    fn callee(&self, name: &Name) -> String {
        match self.env.find(name).map(|d| &d.kind) {
            Some(DeclKind::Builtin { cpp_name }) => cpp_name.clone(),
            _ => cpp_name(self.env, name),
        }
    }

    // ========================================================================
    // Terminals
    // ========================================================================

    fn emit_terminal(&mut self, terminal: &Terminal, ctx: &LocalContext, depth: usize) -> EmitResult<()> {
        let pad = self.config.pad(depth);
        match terminal {
            Terminal::Cases { scrutinee, branches } => {
                let x = ctx.value(*scrutinee)?;
                if ctx.value_type(*scrutinee)?.is_object() {
                    writeln!(self.out, "{}switch (lean::obj_tag({})) {{", pad, x)?;
                } else {
                    writeln!(self.out, "{}switch ({}) {{", pad, x)?;
                }
                for (i, branch) in branches.iter().enumerate() {
                    write!(self.out, "{}case {}: ", pad, i)?;
                    self.emit_block(branch, ctx.clone(), depth)?;
                }
                writeln!(self.out, "{}}}", pad)?;
            }
            Terminal::Jmp { target, args } => {
                // Sibling-branch join points are not in lexical scope
                let jp = match ctx.get(*target) {
                    Ok(Local {
                        kind: LocalKind::JoinPoint,
                        ..
                    }) => self
                        .join_points
                        .get(target)
                        .cloned()
                        .ok_or(EmitError::UnknownJoinPoint(*target))?,
                    Ok(_) => {
                        return Err(EmitError::InvalidTerminal(format!(
                            "jump to {}, which is not a join point",
                            target
                        )))
                    }
                    Err(_) => return Err(EmitError::UnknownJoinPoint(*target)),
                };
                if jp.params.len() != args.len() {
                    return Err(EmitError::JumpArity {
                        join_point: *target,
                        expected: jp.params.len(),
                        found: args.len(),
                    });
                }
                for (param, arg) in jp.params.iter().zip(args) {
                    writeln!(self.out, "{}x_{} = {};", pad, param, ctx.value(*arg)?)?;
                }
                writeln!(self.out, "{}goto lbl_{};", pad, jp.label)?;
            }
            Terminal::Ret(x) => {
                writeln!(self.out, "{}return {};", pad, ctx.value(*x)?)?;
            }
        }
        Ok(())
    }
}

/// The parameters of a function literal must be exactly the domains of its
/// declared arrow type, which is what the forward declaration prints.
fn check_signature(name: &Name, declared: &LlType, params: &[Param]) -> EmitResult<()> {
    let expected = declared.param_types();
    if !declared.is_pi()
        || expected.len() != params.len()
        || expected.iter().zip(params).any(|(ty, p)| **ty != p.ty)
    {
        return Err(EmitError::SignatureMismatch {
            decl: name.clone(),
            declared: declared.to_string(),
        });
    }
    Ok(())
}

/// Escape a string for a C++ literal. Non-printable and non-ASCII bytes
/// become fixed-width octal escapes so a following digit stays literal.
fn escape_string(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_ascii_graphic() || c == ' ' => result.push(c),
            c => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    result.push_str(&format!("\\{:03o}", b));
                }
            }
        }
    }
    result
}

/// Lower one declaration into `out`
pub fn emit_fn<W: Write>(
    out: &mut W,
    env: &Environment,
    config: &EmitConfig,
    decl: &CompDecl,
) -> EmitResult<()> {
    FnEmitter::new(out, env, config).emit_decl(decl)
}
