//! Second walk over a fully decorated tree: lowers every function to a
//! subroutine of the abstract machine.
//!
//! Expressions lower to a [`CodeAttribs`]: the cell holding the value (or
//! an array base plus a separate offset temp), and the code that computes
//! it. Statements lower straight to instruction lists.

use crate::decor::TreeDecoration;
use crate::symtab::SymTable;
use crate::types::{TypeId, TypesMgr};
use asm::{CodeCounters, Instruction, InstructionList, Subroutine};
use ast::{BinOp, Call, Expr, ExprKind, LeftExpr, LeftExprKind, Stmnt, UnOp};

/// Caller-provided slot for non-void returns.
const RESULT_ADDRESS: &str = "_result";

/// Residual address of a lowered expression.
///
/// A non-empty `offs` means `addr` is an array base and the value lives at
/// `addr[offs]`; the split stays explicit because assignment and read
/// statements store through it with `XLOAD` instead of reading it.
#[derive(Debug)]
pub struct CodeAttribs {
    pub addr: String,
    pub offs: Option<String>,
    pub code: InstructionList,
}

impl CodeAttribs {
    fn plain(addr: impl Into<String>, code: InstructionList) -> Self {
        Self {
            addr: addr.into(),
            offs: None,
            code,
        }
    }
}

pub struct CodeGen<'a> {
    types: &'a TypesMgr,
    symbols: &'a mut SymTable,
    decor: &'a TreeDecoration,
    counters: CodeCounters,
    current_function: Option<TypeId>,
}

impl<'a> CodeGen<'a> {
    pub fn new(types: &'a TypesMgr, symbols: &'a mut SymTable, decor: &'a TreeDecoration) -> Self {
        Self {
            types,
            symbols,
            decor,
            counters: CodeCounters::new(),
            current_function: None,
        }
    }

    pub fn program(&mut self, prog: &ast::Program) -> asm::Program {
        let mut code = asm::Program::new();
        self.symbols.push_this_scope(self.decor.get_scope(prog.id));
        for func in &prog.functions {
            let subr = self.function(func);
            code.add_subroutine(subr);
        }
        self.symbols.pop_scope();
        code
    }

    fn function(&mut self, func: &ast::Function) -> Subroutine {
        self.symbols.push_this_scope(self.decor.get_scope(func.id));
        let mut subr = Subroutine::new(func.name.text.clone());
        self.counters.reset();

        let func_ty = self.decor.get_type(func.id);
        self.current_function = Some(func_ty);

        let ret_ty = self.types.func_return_type(func_ty);
        if !self.types.is_void(ret_ty) {
            subr.add_param(
                RESULT_ADDRESS,
                self.types.to_string(ret_ty),
                self.types.is_array(ret_ty),
            );
        }

        for param in &func.params {
            let param_ty = self.decor.get_type(param.ty.id);
            if self.types.is_array(param_ty) {
                let elem = self.types.array_elem_type(param_ty);
                subr.add_param(param.name.text.clone(), self.types.to_string(elem), true);
            } else {
                subr.add_param(
                    param.name.text.clone(),
                    self.types.to_string(param_ty),
                    false,
                );
            }
        }

        for dec in &func.decls {
            let ty = self.decor.get_type(dec.ty.id);
            let size = self.types.size_of(ty);
            for name in &dec.names {
                subr.add_var(name.text.clone(), self.types.to_string_basic(ty), size);
            }
        }

        let code = self.statements(&func.body) | Instruction::Return;
        subr.set_instructions(code);
        self.symbols.pop_scope();
        subr
    }

    fn statements(&mut self, stmnts: &[Stmnt]) -> InstructionList {
        let mut code = InstructionList::new();
        for stmnt in stmnts {
            code = code | self.stmnt(stmnt);
        }
        code
    }

    fn stmnt(&mut self, stmnt: &Stmnt) -> InstructionList {
        match stmnt {
            Stmnt::Assign { target, value } => self.assign(target, value),
            Stmnt::If { cond, then, r#else } => self.if_stmnt(cond, then, r#else.as_deref()),
            Stmnt::While { cond, body } => self.while_stmnt(cond, body),
            Stmnt::Call(call) => self.call(call).code,
            Stmnt::Read(target) => self.read(target),
            Stmnt::WriteExpr(e) => self.write_expr(e),
            Stmnt::WriteString(lexeme) => Instruction::Writes(lexeme.clone()).into(),
            Stmnt::Return(e) => self.return_stmnt(e.as_ref()),
        }
    }

    fn assign(&mut self, target: &LeftExpr, value: &Expr) -> InstructionList {
        let CodeAttribs {
            addr: lhs_addr,
            offs: lhs_offs,
            code: lhs_code,
        } = self.left_expr(target);
        let lhs_ty = self.decor.get_type(target.id);

        let CodeAttribs {
            addr: rhs_addr,
            offs: rhs_offs,
            code: rhs_code,
        } = self.expr(value);
        let rhs_ty = self.decor.get_type(value.id);

        let mut code = lhs_code | rhs_code;

        if self.types.is_array(lhs_ty) && self.types.is_array(rhs_ty) {
            // element-by-element copy; the checker guarantees the element
            // types already match
            let elem = self.types.array_elem_type(lhs_ty);
            let elem_size = self.types.size_of(elem);
            let total = self.types.array_size(lhs_ty) * elem_size;

            let iterator = self.counters.new_temp();
            let elem_size_addr = self.counters.new_temp();
            let total_addr = self.counters.new_temp();
            let cond_addr = self.counters.new_temp();
            let temp = self.counters.new_temp();

            let cond_code = InstructionList::from(Instruction::Lt {
                dst: cond_addr.clone(),
                lhs: iterator.clone(),
                rhs: total_addr.clone(),
            });
            let body = Instruction::Loadx {
                dst: temp.clone(),
                base: rhs_addr,
                offs: iterator.clone(),
            } | Instruction::Xload {
                base: lhs_addr,
                offs: iterator.clone(),
                src: temp,
            } | Instruction::Add {
                dst: iterator.clone(),
                lhs: iterator.clone(),
                rhs: elem_size_addr.clone(),
            };

            code = code
                | Instruction::Iload {
                    dst: iterator,
                    value: "0".into(),
                }
                | Instruction::Iload {
                    dst: elem_size_addr,
                    value: elem_size.to_string(),
                }
                | Instruction::Iload {
                    dst: total_addr,
                    value: total.to_string(),
                };
            code | self.loop_skeleton(cond_code, &cond_addr, body)
        } else {
            let src = if let Some(offs) = rhs_offs {
                let temp = self.counters.new_temp();
                code = code
                    | Instruction::Loadx {
                        dst: temp.clone(),
                        base: rhs_addr,
                        offs,
                    };
                self.coerce(&mut code, lhs_ty, rhs_ty, temp)
            } else {
                self.coerce(&mut code, lhs_ty, rhs_ty, rhs_addr)
            };

            match lhs_offs {
                Some(offs) => {
                    code | Instruction::Xload {
                        base: lhs_addr,
                        offs,
                        src,
                    }
                }
                None => {
                    code | Instruction::Load {
                        dst: lhs_addr,
                        src,
                    }
                }
            }
        }
    }

    fn if_stmnt(&mut self, cond: &Expr, then: &[Stmnt], r#else: Option<&[Stmnt]>) -> InstructionList {
        let CodeAttribs {
            addr: cond_addr,
            code: cond_code,
            ..
        } = self.expr(cond);
        let then_code = self.statements(then);

        let suffix = self.counters.new_if_label();
        let endif_label = format!("endif{suffix}");

        match r#else {
            Some(r#else) => {
                let else_code = self.statements(r#else);
                let else_label = format!("else{suffix}");
                cond_code
                    | Instruction::Fjump {
                        cond: cond_addr,
                        label: else_label.clone(),
                    }
                    | then_code
                    | Instruction::Ujump(endif_label.clone())
                    | Instruction::Label(else_label)
                    | else_code
                    | Instruction::Label(endif_label)
            }
            None => {
                cond_code
                    | Instruction::Fjump {
                        cond: cond_addr,
                        label: endif_label.clone(),
                    }
                    | then_code
                    | Instruction::Label(endif_label)
            }
        }
    }

    fn while_stmnt(&mut self, cond: &Expr, body: &[Stmnt]) -> InstructionList {
        let CodeAttribs {
            addr: cond_addr,
            code: cond_code,
            ..
        } = self.expr(cond);
        let body_code = self.statements(body);
        self.loop_skeleton(cond_code, &cond_addr, body_code)
    }

    /// `LABEL whileK; cond; FJUMP cond endwhileK; body; UJUMP whileK;
    /// LABEL endwhileK` — shared by while statements and the array copy.
    fn loop_skeleton(
        &mut self,
        cond_code: InstructionList,
        cond_addr: &str,
        body: InstructionList,
    ) -> InstructionList {
        let suffix = self.counters.new_while_label();
        let while_label = format!("while{suffix}");
        let end_label = format!("endwhile{suffix}");
        Instruction::Label(while_label.clone())
            | cond_code
            | Instruction::Fjump {
                cond: cond_addr.into(),
                label: end_label.clone(),
            }
            | body
            | Instruction::Ujump(while_label)
            | Instruction::Label(end_label)
    }

    fn read(&mut self, target: &LeftExpr) -> InstructionList {
        let CodeAttribs { addr, offs, code } = self.left_expr(target);
        let ty = self.decor.get_type(target.id);

        let temp = self.counters.new_temp();
        let read = if self.types.is_float(ty) {
            Instruction::Readf(temp.clone())
        } else if self.types.is_character(ty) {
            Instruction::Readc(temp.clone())
        } else {
            Instruction::Readi(temp.clone())
        };
        let code = code | read;

        match offs {
            Some(offs) => {
                code | Instruction::Xload {
                    base: addr,
                    offs,
                    src: temp,
                }
            }
            None => {
                code | Instruction::Load {
                    dst: addr,
                    src: temp,
                }
            }
        }
    }

    fn write_expr(&mut self, e: &Expr) -> InstructionList {
        let CodeAttribs { addr, code, .. } = self.expr(e);
        let ty = self.decor.get_type(e.id);
        if self.types.is_float(ty) {
            code | Instruction::Writef(addr)
        } else if self.types.is_character(ty) {
            code | Instruction::Writec(addr)
        } else {
            code | Instruction::Writei(addr)
        }
    }

    fn return_stmnt(&mut self, e: Option<&Expr>) -> InstructionList {
        let mut code = InstructionList::new();
        if let Some(e) = e {
            let attribs = self.expr(e);
            code = attribs.code;
            let expr_ty = self.decor.get_type(e.id);
            let func_ty = self.current_function.expect("return outside a function");
            let ret_ty = self.types.func_return_type(func_ty);

            let value = self.coerce(&mut code, ret_ty, expr_ty, attribs.addr);
            code = code
                | Instruction::Load {
                    dst: RESULT_ADDRESS.into(),
                    src: value,
                };
        }
        code | Instruction::Return
    }

    fn call(&mut self, call: &Call) -> CodeAttribs {
        let func_ty = self.decor.get_type(call.callee.id);
        let ret_ty = self.types.func_return_type(func_ty);
        let non_void = !self.types.is_void(ret_ty);

        let mut code = InstructionList::new();

        // reserve the return slot before any argument
        if non_void {
            code = code | Instruction::Push(None);
        }

        for (i, arg) in call.args.iter().enumerate() {
            let CodeAttribs {
                addr,
                code: mut arg_code,
                ..
            } = self.expr(arg);
            let param_ty = self.types.param_type(func_ty, i);
            let arg_ty = self.decor.get_type(arg.id);
            let addr = self.coerce(&mut arg_code, param_ty, arg_ty, addr);
            let addr = self.reference(&mut arg_code, param_ty, addr);
            code = code | arg_code | Instruction::Push(Some(addr));
        }

        code = code | Instruction::Call(call.callee.text.clone());

        for _ in &call.args {
            code = code | Instruction::Pop(None);
        }

        let temp = self.counters.new_temp();
        if non_void {
            code = code | Instruction::Pop(Some(temp.clone()));
        }
        CodeAttribs::plain(temp, code)
    }

    fn expr(&mut self, e: &Expr) -> CodeAttribs {
        match &e.kind {
            ExprKind::BoolLit(b) => {
                let temp = self.counters.new_temp();
                let code = Instruction::Iload {
                    dst: temp.clone(),
                    value: if *b { "1" } else { "0" }.into(),
                };
                CodeAttribs::plain(temp, code.into())
            }
            ExprKind::IntLit(lexeme) => {
                let temp = self.counters.new_temp();
                let code = Instruction::Iload {
                    dst: temp.clone(),
                    value: lexeme.clone(),
                };
                CodeAttribs::plain(temp, code.into())
            }
            ExprKind::FloatLit(lexeme) => {
                let temp = self.counters.new_temp();
                let code = Instruction::Fload {
                    dst: temp.clone(),
                    value: lexeme.clone(),
                };
                CodeAttribs::plain(temp, code.into())
            }
            ExprKind::CharLit(lexeme) => {
                // only the outer delimiters go; escape sequences inside the
                // lexeme are carried through unchanged
                let inner = &lexeme[1..lexeme.len() - 1];
                let temp = self.counters.new_temp();
                let code = Instruction::Chload {
                    dst: temp.clone(),
                    value: inner.into(),
                };
                CodeAttribs::plain(temp, code.into())
            }
            ExprKind::Left(le) => {
                let CodeAttribs { addr, offs, code } = self.left_expr(le);
                match offs {
                    Some(offs) => {
                        let temp = self.counters.new_temp();
                        let code = code
                            | Instruction::Loadx {
                                dst: temp.clone(),
                                base: addr,
                                offs,
                            };
                        CodeAttribs::plain(temp, code)
                    }
                    None => CodeAttribs::plain(addr, code),
                }
            }
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Unary { op, operand } => self.unary(*op, operand),
            ExprKind::Binary { op, lhs, rhs } => {
                if op.logical() {
                    self.logical(*op, lhs, rhs)
                } else if op.relational() {
                    self.relational(*op, lhs, rhs)
                } else {
                    self.arithmetic(*op, lhs, rhs)
                }
            }
            ExprKind::Call(call) => self.call(call),
        }
    }

    fn left_expr(&mut self, le: &LeftExpr) -> CodeAttribs {
        match &le.kind {
            LeftExprKind::Ident(name) => {
                let mut code = InstructionList::new();
                let addr = self.dereference(&mut code, &name.text);
                CodeAttribs::plain(addr, code)
            }
            LeftExprKind::Index { array, index } => {
                let mut base_code = InstructionList::new();
                let base = self.dereference(&mut base_code, &array.text);
                let CodeAttribs {
                    addr: index_addr,
                    code: index_code,
                    ..
                } = self.expr(index);

                let size_addr = self.counters.new_temp();
                let offs = self.counters.new_temp();
                // the indexing node carries the element type
                let elem = self.decor.get_type(le.id);
                let elem_size = self.types.size_of(elem);

                let code = base_code
                    | index_code
                    | Instruction::Iload {
                        dst: size_addr.clone(),
                        value: elem_size.to_string(),
                    }
                    | Instruction::Mul {
                        dst: offs.clone(),
                        lhs: index_addr,
                        rhs: size_addr,
                    };
                CodeAttribs {
                    addr: base,
                    offs: Some(offs),
                    code,
                }
            }
        }
    }

    fn unary(&mut self, op: UnOp, operand: &Expr) -> CodeAttribs {
        let CodeAttribs { addr, code, .. } = self.expr(operand);
        let ty = self.decor.get_type(operand.id);

        let temp = self.counters.new_temp();
        let instr = if self.types.is_boolean(ty) {
            Instruction::Not {
                dst: temp.clone(),
                src: addr,
            }
        } else if self.types.is_float(ty) {
            match op {
                UnOp::Neg => Instruction::Fneg {
                    dst: temp.clone(),
                    src: addr,
                },
                _ => Instruction::Fload {
                    dst: temp.clone(),
                    value: addr,
                },
            }
        } else {
            match op {
                UnOp::Neg => Instruction::Neg {
                    dst: temp.clone(),
                    src: addr,
                },
                _ => Instruction::Iload {
                    dst: temp.clone(),
                    value: addr,
                },
            }
        };
        CodeAttribs::plain(temp, code | instr)
    }

    fn arithmetic(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let CodeAttribs {
            addr: addr1,
            code: code1,
            ..
        } = self.expr(lhs);
        let CodeAttribs {
            addr: addr2,
            code: code2,
            ..
        } = self.expr(rhs);
        let mut code = code1 | code2;
        let t1 = self.decor.get_type(lhs.id);
        let t2 = self.decor.get_type(rhs.id);

        if op == BinOp::Mod {
            // a % b  ==  a - b * (a / b)
            let quotient = self.counters.new_temp();
            let scaled = self.counters.new_temp();
            let dst = self.counters.new_temp();
            code = code
                | Instruction::Div {
                    dst: quotient.clone(),
                    lhs: addr1.clone(),
                    rhs: addr2.clone(),
                }
                | Instruction::Mul {
                    dst: scaled.clone(),
                    lhs: addr2,
                    rhs: quotient,
                }
                | Instruction::Sub {
                    dst: dst.clone(),
                    lhs: addr1,
                    rhs: scaled,
                };
            CodeAttribs::plain(dst, code)
        } else if self.types.is_float(t1) || self.types.is_float(t2) {
            // each side coerces when the *other* side is the float
            let lhs = self.coerce(&mut code, t2, t1, addr1);
            let rhs = self.coerce(&mut code, t1, t2, addr2);
            let dst = self.counters.new_temp();
            let instr = match op {
                BinOp::Mul => Instruction::Fmul {
                    dst: dst.clone(),
                    lhs,
                    rhs,
                },
                BinOp::Div => Instruction::Fdiv {
                    dst: dst.clone(),
                    lhs,
                    rhs,
                },
                BinOp::Sub => Instruction::Fsub {
                    dst: dst.clone(),
                    lhs,
                    rhs,
                },
                _ => Instruction::Fadd {
                    dst: dst.clone(),
                    lhs,
                    rhs,
                },
            };
            CodeAttribs::plain(dst, code | instr)
        } else {
            let dst = self.counters.new_temp();
            let instr = match op {
                BinOp::Mul => Instruction::Mul {
                    dst: dst.clone(),
                    lhs: addr1,
                    rhs: addr2,
                },
                BinOp::Div => Instruction::Div {
                    dst: dst.clone(),
                    lhs: addr1,
                    rhs: addr2,
                },
                BinOp::Sub => Instruction::Sub {
                    dst: dst.clone(),
                    lhs: addr1,
                    rhs: addr2,
                },
                _ => Instruction::Add {
                    dst: dst.clone(),
                    lhs: addr1,
                    rhs: addr2,
                },
            };
            CodeAttribs::plain(dst, code | instr)
        }
    }

    fn relational(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let CodeAttribs {
            addr: addr1,
            code: code1,
            ..
        } = self.expr(lhs);
        let CodeAttribs {
            addr: addr2,
            code: code2,
            ..
        } = self.expr(rhs);
        let mut code = code1 | code2;
        let t1 = self.decor.get_type(lhs.id);
        let t2 = self.decor.get_type(rhs.id);

        if self.types.is_float(t1) || self.types.is_float(t2) {
            let lhs = self.coerce(&mut code, t2, t1, addr1);
            let rhs = self.coerce(&mut code, t1, t2, addr2);
            match op {
                BinOp::Neq => {
                    let eq = self.counters.new_temp();
                    code = code
                        | Instruction::Feq {
                            dst: eq.clone(),
                            lhs,
                            rhs,
                        };
                    let dst = self.counters.new_temp();
                    code = code
                        | Instruction::Not {
                            dst: dst.clone(),
                            src: eq,
                        };
                    CodeAttribs::plain(dst, code)
                }
                _ => {
                    let dst = self.counters.new_temp();
                    let instr = match op {
                        BinOp::Lt => Instruction::Flt {
                            dst: dst.clone(),
                            lhs,
                            rhs,
                        },
                        BinOp::Le => Instruction::Fle {
                            dst: dst.clone(),
                            lhs,
                            rhs,
                        },
                        // > and >= reuse FLT/FLE with the operands swapped
                        BinOp::Gt => Instruction::Flt {
                            dst: dst.clone(),
                            lhs: rhs,
                            rhs: lhs,
                        },
                        BinOp::Ge => Instruction::Fle {
                            dst: dst.clone(),
                            lhs: rhs,
                            rhs: lhs,
                        },
                        _ => Instruction::Feq {
                            dst: dst.clone(),
                            lhs,
                            rhs,
                        },
                    };
                    CodeAttribs::plain(dst, code | instr)
                }
            }
        } else {
            match op {
                BinOp::Neq => {
                    let eq = self.counters.new_temp();
                    code = code
                        | Instruction::Eq {
                            dst: eq.clone(),
                            lhs: addr1,
                            rhs: addr2,
                        };
                    let dst = self.counters.new_temp();
                    code = code
                        | Instruction::Not {
                            dst: dst.clone(),
                            src: eq,
                        };
                    CodeAttribs::plain(dst, code)
                }
                _ => {
                    let dst = self.counters.new_temp();
                    let instr = match op {
                        BinOp::Lt => Instruction::Lt {
                            dst: dst.clone(),
                            lhs: addr1,
                            rhs: addr2,
                        },
                        BinOp::Le => Instruction::Le {
                            dst: dst.clone(),
                            lhs: addr1,
                            rhs: addr2,
                        },
                        BinOp::Gt => Instruction::Lt {
                            dst: dst.clone(),
                            lhs: addr2,
                            rhs: addr1,
                        },
                        BinOp::Ge => Instruction::Le {
                            dst: dst.clone(),
                            lhs: addr2,
                            rhs: addr1,
                        },
                        _ => Instruction::Eq {
                            dst: dst.clone(),
                            lhs: addr1,
                            rhs: addr2,
                        },
                    };
                    CodeAttribs::plain(dst, code | instr)
                }
            }
        }
    }

    fn logical(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> CodeAttribs {
        let CodeAttribs {
            addr: addr1,
            code: code1,
            ..
        } = self.expr(lhs);
        let CodeAttribs {
            addr: addr2,
            code: code2,
            ..
        } = self.expr(rhs);
        let code = code1 | code2;

        // both operands evaluate; there is no short circuit
        let dst = self.counters.new_temp();
        let instr = match op {
            BinOp::And => Instruction::And {
                dst: dst.clone(),
                lhs: addr1,
                rhs: addr2,
            },
            _ => Instruction::Or {
                dst: dst.clone(),
                lhs: addr1,
                rhs: addr2,
            },
        };
        CodeAttribs::plain(dst, code | instr)
    }

    /// Widen an integer value when a float is expected; anything else is
    /// already in shape.
    fn coerce(
        &mut self,
        code: &mut InstructionList,
        dest_ty: TypeId,
        src_ty: TypeId,
        addr: String,
    ) -> String {
        if self.types.is_integer(src_ty) && self.types.is_float(dest_ty) {
            let dst = self.counters.new_temp();
            code.push(Instruction::Float {
                dst: dst.clone(),
                src: addr,
            });
            dst
        } else {
            addr
        }
    }

    /// Arguments bound to array formals pass an address. A local array
    /// contributes its own address; a parameter already holds one.
    fn reference(
        &mut self,
        code: &mut InstructionList,
        param_ty: TypeId,
        addr: String,
    ) -> String {
        if self.symbols.is_local_var(&addr) && self.types.is_array(param_ty) {
            let dst = self.counters.new_temp();
            code.push(Instruction::Aload {
                dst: dst.clone(),
                src: addr,
            });
            dst
        } else {
            addr
        }
    }

    /// An array parameter's cell holds an address, so reading through the
    /// name takes one extra hop.
    fn dereference(&mut self, code: &mut InstructionList, name: &str) -> String {
        if self.symbols.is_parameter(name) && self.types.is_array(self.symbols.get_type(name)) {
            let dst = self.counters.new_temp();
            code.push(Instruction::Load {
                dst: dst.clone(),
                src: name.into(),
            });
            dst
        } else {
            name.into()
        }
    }
}
