use crate::arena::{Arena, Handle};
use crate::ir::types::Type;

/// A constant value installed by one of the `OpConstant*` instructions.
#[derive(Debug, Clone)]
pub struct Constant {
    pub ty: Handle<Type>,
    pub inner: ConstantInner,
}

#[derive(Debug, Clone)]
pub enum ConstantInner {
    Sint(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// `OpConstantComposite`: an ordered list of constituent constants.
    Composite(Vec<Handle<Constant>>),
}

impl Constant {
    /// Renders the constant the way it should appear at a use site: plain
    /// literals for scalars, `T(a, b, …)` constructor syntax for
    /// composites.
    pub fn render(&self, types: &Arena<Type>, constants: &Arena<Constant>) -> String {
        match self.inner {
            ConstantInner::Sint(v) => v.to_string(),
            ConstantInner::Uint(v) => v.to_string(),
            ConstantInner::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    format!("{:.1}", v)
                } else {
                    format!("{}", v)
                }
            }
            ConstantInner::Bool(v) => v.to_string(),
            ConstantInner::Composite(ref components) => {
                let type_name = types
                    .get(self.ty)
                    .map(|t| t.name.as_str())
                    .unwrap_or("_");
                let args: Vec<String> = components
                    .iter()
                    .map(|&c| {
                        constants
                            .get(c)
                            .map(|inner| inner.render(types, constants))
                            .unwrap_or_else(|| format!("_{}", c.id()))
                    })
                    .collect();
                format!("{}({})", type_name, args.join(", "))
            }
        }
    }
}
