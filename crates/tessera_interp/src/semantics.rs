//! Behavioral models for fabric primitives.
//!
//! A [`PrimitiveModel`] expands a module instance's outputs into pure IR
//! over the instance's input and parameter expressions. The expansion is
//! the primitive's semantics: the interpreter evaluates it, and a solver
//! front-end can translate it.
//!
//! The LUT expansion follows the usual half-table cascade: each input bit
//! selects the upper or lower half of the remaining init slice, most
//! significant input first, so input `j` carries index weight `2^j`.

use crate::error::InterpError;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use tessera_ir::{Expr, ModuleInstance, PortDirection};

/// A behavioral model for one primitive module.
pub trait PrimitiveModel {
    /// Expands the primitive's outputs into pure IR.
    ///
    /// `inputs` binds input port names to the expressions driving them;
    /// `params` binds parameter names to their value expressions.
    fn expand(
        &self,
        module: &str,
        inputs: &IndexMap<String, Expr>,
        params: &IndexMap<String, Expr>,
    ) -> Result<IndexMap<String, Expr>, InterpError>;
}

/// How a LUT receives its index bits.
#[derive(Debug, Clone)]
pub enum LutInputs {
    /// One single-bit port per index bit, least significant first.
    Bits(Vec<String>),
    /// One bus port carrying all index bits.
    Bus {
        /// The bus port name.
        port: String,
        /// The bus width (the LUT's input count).
        width: u32,
    },
}

/// A generic `k`-input lookup table.
#[derive(Debug, Clone)]
pub struct LutModel {
    /// Where the index bits come from.
    pub inputs: LutInputs,
    /// The output port name.
    pub output: String,
    /// The parameter holding the `2^k`-bit truth table.
    pub init_param: String,
}

impl LutModel {
    /// A LUT indexed by individual single-bit ports.
    pub fn bits(ports: &[&str], output: &str, init_param: &str) -> Self {
        Self {
            inputs: LutInputs::Bits(ports.iter().map(|p| p.to_string()).collect()),
            output: output.to_string(),
            init_param: init_param.to_string(),
        }
    }

    /// A LUT indexed by one bus port.
    pub fn bus(port: &str, width: u32, output: &str, init_param: &str) -> Self {
        Self {
            inputs: LutInputs::Bus {
                port: port.to_string(),
                width,
            },
            output: output.to_string(),
            init_param: init_param.to_string(),
        }
    }

    fn index_bits(
        &self,
        module: &str,
        inputs: &IndexMap<String, Expr>,
    ) -> Result<Vec<Expr>, InterpError> {
        match &self.inputs {
            LutInputs::Bits(ports) => ports
                .iter()
                .map(|p| input(module, inputs, p))
                .collect(),
            LutInputs::Bus { port, width } => {
                let bus = input(module, inputs, port)?;
                (0..*width)
                    .map(|j| Expr::bit(j, bus.clone()).map_err(InterpError::from))
                    .collect()
            }
        }
    }
}

impl PrimitiveModel for LutModel {
    fn expand(
        &self,
        module: &str,
        inputs: &IndexMap<String, Expr>,
        params: &IndexMap<String, Expr>,
    ) -> Result<IndexMap<String, Expr>, InterpError> {
        let bits = self.index_bits(module, inputs)?;
        let init = param(module, params, &self.init_param)?;
        let out = lut_select(&init, &bits)?;
        Ok(IndexMap::from([(self.output.clone(), out)]))
    }
}

/// Selects one bit of `init` using `bits` as the index (bit `j` weighs
/// `2^j`).
fn lut_select(init: &Expr, bits: &[Expr]) -> Result<Expr, InterpError> {
    let mut value = init.clone();
    for j in (0..bits.len()).rev() {
        let half = 1u32 << j;
        value = Expr::mux(
            bits[j].clone(),
            Expr::extract(2 * half - 1, half, value.clone())?,
            Expr::extract(half - 1, 0, value)?,
        )?;
    }
    Ok(value)
}

/// The Lattice CCU2C: two carry lanes, each with a 4-input LUT deciding
/// propagation. The lane output is the LUT value xor the incoming carry;
/// the carry propagates when the LUT value is set and otherwise reloads
/// from the `A` input.
#[derive(Debug, Clone, Default)]
pub struct Ccu2cModel;

impl PrimitiveModel for Ccu2cModel {
    fn expand(
        &self,
        module: &str,
        inputs: &IndexMap<String, Expr>,
        params: &IndexMap<String, Expr>,
    ) -> Result<IndexMap<String, Expr>, InterpError> {
        let mut carry = input(module, inputs, "CIN")?;
        let mut outputs = IndexMap::new();
        for lane in 0..2u32 {
            let a = input(module, inputs, &format!("A{lane}"))?;
            let index = [
                a.clone(),
                input(module, inputs, &format!("B{lane}"))?,
                input(module, inputs, &format!("C{lane}"))?,
                input(module, inputs, &format!("D{lane}"))?,
            ];
            let init = param(module, params, &format!("INIT{lane}"))?;
            let s = lut_select(&init, &index)?;
            outputs.insert(format!("S{lane}"), xor1(&s, &carry)?);
            carry = Expr::mux(s, carry, a)?;
        }
        outputs.insert("COUT".to_string(), carry);
        Ok(outputs)
    }
}

/// The Xilinx CARRY8: an eight-lane carry chain. Lane `i` produces
/// `S[i] xor carry` and propagates the carry when `S[i]` is set, loading
/// `DI[i]` otherwise. `O` collects the lane outputs, `CO` the per-lane
/// carries.
#[derive(Debug, Clone, Default)]
pub struct Carry8Model;

impl PrimitiveModel for Carry8Model {
    fn expand(
        &self,
        module: &str,
        inputs: &IndexMap<String, Expr>,
        _params: &IndexMap<String, Expr>,
    ) -> Result<IndexMap<String, Expr>, InterpError> {
        let mut carry = input(module, inputs, "CI")?;
        let di = input(module, inputs, "DI")?;
        let s = input(module, inputs, "S")?;
        let mut lane_outs = Vec::with_capacity(8);
        let mut lane_carries = Vec::with_capacity(8);
        for i in 0..8 {
            let s_i = Expr::bit(i, s.clone())?;
            lane_outs.push(xor1(&s_i, &carry)?);
            carry = Expr::mux(s_i, carry, Expr::bit(i, di.clone())?)?;
            lane_carries.push(carry.clone());
        }
        Ok(IndexMap::from([
            ("O".to_string(), Expr::concat(lane_outs.into_iter().rev().collect())?),
            ("CO".to_string(), Expr::concat(lane_carries.into_iter().rev().collect())?),
        ]))
    }
}

/// The module-semantics table, keyed by `(module name, filepath)`.
#[derive(Default)]
pub struct SemanticsTable {
    models: HashMap<(String, String), Box<dyn PrimitiveModel>>,
}

impl SemanticsTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model for a module.
    pub fn insert(
        &mut self,
        module: impl Into<String>,
        filepath: impl Into<String>,
        model: Box<dyn PrimitiveModel>,
    ) {
        self.models.insert((module.into(), filepath.into()), model);
    }

    /// Looks up the model for a module.
    pub fn get(&self, module: &str, filepath: &str) -> Option<&dyn PrimitiveModel> {
        self.models
            .get(&(module.to_string(), filepath.to_string()))
            .map(|b| b.as_ref())
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Debug for SemanticsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&(String, String)> = self.models.keys().collect();
        keys.sort();
        f.debug_struct("SemanticsTable").field("modules", &keys).finish()
    }
}

/// Expands a module instance's outputs through the table.
pub fn expand_instance(
    instance: &ModuleInstance,
    table: &SemanticsTable,
) -> Result<IndexMap<String, Expr>, InterpError> {
    let model = table
        .get(&instance.module_name, &instance.filepath)
        .ok_or_else(|| InterpError::UnknownModule {
            module: instance.module_name.clone(),
            filepath: instance.filepath.clone(),
        })?;
    let inputs: IndexMap<String, Expr> = instance
        .ports
        .iter()
        .filter(|p| p.direction == PortDirection::Input)
        .filter_map(|p| p.value.clone().map(|v| (p.name.clone(), v)))
        .collect();
    let params: IndexMap<String, Expr> = instance
        .params
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect();
    model.expand(&instance.module_name, &inputs, &params)
}

/// The semantics tables for the shipped architecture descriptions.
///
/// Unknown names yield an empty table the caller can populate.
pub fn builtin_semantics(arch_name: &str) -> SemanticsTable {
    let mut table = SemanticsTable::new();
    match arch_name {
        "lattice_ecp5" => {
            table.insert(
                "LUT4",
                "lattice_ecp5/LUT4.v",
                Box::new(LutModel::bits(&["A", "B", "C", "D"], "Z", "INIT")),
            );
            table.insert("CCU2C", "lattice_ecp5/CCU2C.v", Box::new(Ccu2cModel));
        }
        "xilinx_ultrascale_plus" => {
            table.insert(
                "LUT6",
                "xilinx_ultrascale_plus/LUT6.v",
                Box::new(LutModel::bits(
                    &["I0", "I1", "I2", "I3", "I4", "I5"],
                    "O",
                    "INIT",
                )),
            );
            table.insert(
                "LUT2",
                "xilinx_ultrascale_plus/LUT2.v",
                Box::new(LutModel::bits(&["I0", "I1"], "O", "INIT")),
            );
            table.insert(
                "CARRY8",
                "xilinx_ultrascale_plus/CARRY8.v",
                Box::new(Carry8Model),
            );
        }
        "sofa" => {
            table.insert(
                "frac_lut4",
                "sofa/frac_lut4.v",
                Box::new(LutModel::bus("in", 4, "lut4_out", "sram")),
            );
        }
        _ => {}
    }
    table
}

fn input(
    module: &str,
    inputs: &IndexMap<String, Expr>,
    name: &str,
) -> Result<Expr, InterpError> {
    inputs.get(name).cloned().ok_or_else(|| InterpError::MissingPort {
        module: module.to_string(),
        port: name.to_string(),
    })
}

fn param(
    module: &str,
    params: &IndexMap<String, Expr>,
    name: &str,
) -> Result<Expr, InterpError> {
    params.get(name).cloned().ok_or_else(|| InterpError::MissingParam {
        module: module.to_string(),
        param: name.to_string(),
    })
}

/// One-bit exclusive or, spelled with the IR's mux and constants.
fn xor1(x: &Expr, y: &Expr) -> Result<Expr, InterpError> {
    let not_y = Expr::mux(y.clone(), Expr::constant_u64(0, 1), Expr::constant_u64(1, 1))?;
    Ok(Expr::mux(x.clone(), not_y, y.clone())?)
}
