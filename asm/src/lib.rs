//! Program model for the stack-oriented abstract machine: instructions,
//! subroutines, and the textual form consumed by the downstream tools.

mod counters;
mod instr;

pub use counters::CodeCounters;
pub use instr::{Instruction, InstructionList};

use std::fmt;

/// A formal parameter slot. Array parameters hold an address; the flag is
/// part of the rendered declaration.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: String,
    pub is_array: bool,
}

/// A local cell group: `size` consecutive cells declared under one name.
#[derive(Debug, Clone)]
pub struct Var {
    pub name: String,
    pub ty: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Subroutine {
    pub name: String,
    params: Vec<Param>,
    vars: Vec<Var>,
    instructions: InstructionList,
}

impl Subroutine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            vars: Vec::new(),
            instructions: InstructionList::new(),
        }
    }

    pub fn add_param(&mut self, name: impl Into<String>, ty: impl Into<String>, is_array: bool) {
        self.params.push(Param {
            name: name.into(),
            ty: ty.into(),
            is_array,
        });
    }

    pub fn add_var(&mut self, name: impl Into<String>, ty: impl Into<String>, size: usize) {
        self.vars.push(Var {
            name: name.into(),
            ty: ty.into(),
            size,
        });
    }

    pub fn set_instructions(&mut self, instructions: InstructionList) {
        self.instructions = instructions;
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn instructions(&self) -> &InstructionList {
        &self.instructions
    }
}

impl fmt::Display for Subroutine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "subroutine {}", self.name)?;
        for Param { name, ty, is_array } in &self.params {
            if *is_array {
                writeln!(f, "  param {name} {ty} array")?;
            } else {
                writeln!(f, "  param {name} {ty}")?;
            }
        }
        for Var { name, ty, size } in &self.vars {
            writeln!(f, "  var {name} {ty} {size}")?;
        }
        for instr in &self.instructions {
            writeln!(f, "  {instr}")?;
        }
        Ok(())
    }
}

/// The emitted program: subroutines in source order.
#[derive(Debug, Clone, Default)]
pub struct Program(Vec<Subroutine>);

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subroutine(&mut self, subr: Subroutine) {
        self.0.push(subr);
    }

    pub fn subroutines(&self) -> &[Subroutine] {
        &self.0
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, subr) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{subr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subroutine_renders_header_decls_and_body() {
        let mut subr = Subroutine::new("main");
        subr.add_param("_result", "int", false);
        subr.add_param("v", "int", true);
        subr.add_var("a", "int", 3);
        subr.set_instructions(InstructionList::from(Instruction::Return));

        let rendered = subr.to_string();
        assert_eq!(
            rendered,
            "subroutine main\n  param _result int\n  param v int array\n  var a int 3\n  RETURN\n",
        );
    }
}
