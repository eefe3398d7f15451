//! The recursive interface synthesizer.
//!
//! [`realize`] instantiates a requested interface on a target fabric.
//! Rules are tried in a fixed order and the first match wins; selection
//! within a rule follows the architecture's declared implementation order.
//! This determinism is load-bearing: reusing an internal-data token
//! requires recreating the identical synthesis tree.
//!
//! 1. A direct implementation, when the architecture has one.
//! 2. A smaller LUT on a larger one, extra inputs tied high. The first
//!    larger LUT in declared order is taken, which is deliberately not
//!    cost-driven.
//! 3. A larger LUT from two smaller ones multiplexed on the last input.
//! 4. A carry of non-native width by chaining the fabric's carry tile.
//! 5. A carry rebuilt from LUTs and muxes when the fabric has none.
//! 6. A 2-way mux on a 3-input LUT when the fabric has no mux primitive.

use crate::error::SynthError;
use crate::internal_data::InternalData;
use indexmap::IndexMap;
use log::debug;
use tessera_arch::{
    ArchitectureDescription, InterfaceId, InterfaceImpl, InterfaceKind, TemplateConn,
};
use tessera_ir::{Expr, Param, Port, Session, SymbolId};

/// Recursion budget for interface composition.
///
/// Some fabrics send LUT composition into a loop: a larger LUT is built
/// from muxes, and the muxes are built from larger LUTs. The budget turns
/// that loop into [`SynthError::DepthLimit`].
pub const REALIZE_DEPTH_LIMIT: usize = 256;

/// Realizes the interface `id` on `arch`.
///
/// `port_map` binds interface input names to caller expressions. The
/// returned expression is a hash-map literal from interface output names to
/// expressions; project with [`Expr::map_get`].
///
/// If `internal` is supplied, it must be the token returned by a previous
/// call that took the same synthesis path; its symbols are threaded back
/// into the freshly recreated instantiation instead of allocating new ones.
pub fn realize(
    arch: &ArchitectureDescription,
    id: &InterfaceId,
    port_map: &IndexMap<String, Expr>,
    internal: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    realize_at(arch, id, port_map, internal, session, 0)
}

fn realize_at(
    arch: &ArchitectureDescription,
    id: &InterfaceId,
    port_map: &IndexMap<String, Expr>,
    internal: Option<&InternalData>,
    session: &mut Session,
    depth: usize,
) -> Result<(Expr, InternalData), SynthError> {
    if depth > REALIZE_DEPTH_LIMIT {
        return Err(SynthError::DepthLimit {
            id: id.to_string(),
            arch: arch.name.clone(),
        });
    }

    if let Some(imp) = arch.find(id) {
        debug!("realize {id} on {}: direct {}", arch.name, imp.module.module_name);
        return realize_direct(imp, port_map, internal, session);
    }

    match id.kind {
        InterfaceKind::Lut => {
            let k = id.lut_inputs().ok_or_else(|| not_realizable(arch, id))?;
            if let Some(larger) = arch.first_lut_larger(k) {
                debug!("realize {id} on {}: tie {} inputs of LUT{larger} high", arch.name, larger - k);
                let mut pm = port_map.clone();
                for i in k..larger {
                    pm.insert(format!("I{i}"), Expr::constant_u64(1, 1));
                }
                return realize_at(arch, &InterfaceId::lut(larger), &pm, internal, session, depth + 1);
            }
            if k >= 2 && arch.first_lut_smaller(k).is_some() {
                debug!("realize {id} on {}: split into two LUT{} and a mux", arch.name, k - 1);
                return realize_lut_split(arch, k, port_map, internal, session, depth);
            }
            Err(not_realizable(arch, id))
        }
        InterfaceKind::Carry => {
            let w = id.carry_width().ok_or_else(|| not_realizable(arch, id))?;
            if let Some(tile_w) = arch.first_carry_width() {
                debug!("realize {id} on {}: chain carry{tile_w} tiles", arch.name);
                return realize_carry_retile(arch, w, tile_w, port_map, internal, session, depth);
            }
            if arch.first_lut_at_least(2).is_some() {
                debug!("realize {id} on {}: rebuild carry from LUTs and muxes", arch.name);
                return realize_carry_from_luts(arch, w, port_map, internal, session, depth);
            }
            Err(not_realizable(arch, id))
        }
        InterfaceKind::Mux => {
            if id.param("num_inputs") == Some(2) && !arch.lut_sizes().is_empty() {
                debug!("realize {id} on {}: as LUT3", arch.name);
                let mut pm = IndexMap::new();
                pm.insert("I0".to_string(), port(port_map, "I0")?);
                pm.insert("I1".to_string(), port(port_map, "I1")?);
                pm.insert("I2".to_string(), port(port_map, "S")?);
                return realize_at(arch, &InterfaceId::lut(3), &pm, internal, session, depth + 1);
            }
            Err(not_realizable(arch, id))
        }
    }
}

/// Instantiates a direct implementation: allocate (or thread) the internal
/// state, evaluate the template's wiring, build the instance, and apply the
/// output projection.
fn realize_direct(
    imp: &InterfaceImpl,
    port_map: &IndexMap<String, Expr>,
    internal: Option<&InternalData>,
    session: &mut Session,
) -> Result<(Expr, InternalData), SynthError> {
    let data = match internal {
        None => InternalData::Fields(
            imp.internal_state
                .iter()
                .map(|(name, width)| {
                    let hint = format!("{}_{}", imp.module.module_name, name);
                    (name.clone(), session.fresh_bitvec(&hint, *width))
                })
                .collect(),
        ),
        Some(token) => {
            let fields = token.fields("direct implementation state")?;
            let matches = fields.len() == imp.internal_state.len()
                && fields.iter().zip(imp.internal_state.iter()).all(
                    |((fname, sym), (sname, width))| {
                        fname == sname
                            && session.contains(*sym)
                            && session.sort_of(*sym).width() == *width
                    },
                );
            if !matches {
                return Err(SynthError::InternalDataShape {
                    context: "direct implementation state",
                });
            }
            token.clone()
        }
    };

    // Input wiring resolves against the port map first, then the internal
    // state.
    let state_exprs: IndexMap<String, Expr> = data
        .fields("direct implementation state")?
        .iter()
        .map(|(name, sym)| {
            let width = session.sort_of(*sym).width();
            (name.clone(), Expr::symbol(*sym, width))
        })
        .collect();
    let mut bindings = port_map.clone();
    for (name, expr) in &state_exprs {
        bindings.entry(name.clone()).or_insert_with(|| expr.clone());
    }

    let mut ports = Vec::with_capacity(imp.module.ports.len());
    for tp in &imp.module.ports {
        match &tp.conn {
            TemplateConn::Wired(wiring) => {
                ports.push(Port::input(tp.name.clone(), wiring.eval(&bindings)?, tp.width)?);
            }
            TemplateConn::Named(_) => ports.push(Port::output(tp.name.clone(), tp.width)),
        }
    }

    // Parameters resolve against the internal state only.
    let params = imp
        .module
        .params
        .iter()
        .map(|p| Ok(Param::new(p.name.clone(), p.wiring.eval(&state_exprs)?)))
        .collect::<Result<Vec<_>, SynthError>>()?;

    let instance = Expr::instance(
        imp.module.module_name.clone(),
        ports,
        params,
        imp.module.filepath.clone(),
    );

    // The output projection sees the primitive's named outputs, then
    // everything the input wiring saw.
    let mut proj = IndexMap::new();
    for tp in &imp.module.ports {
        if let TemplateConn::Named(symbol) = &tp.conn {
            proj.insert(symbol.clone(), Expr::get_output(instance.clone(), tp.name.clone())?);
        }
    }
    for (name, expr) in &bindings {
        proj.entry(name.clone()).or_insert_with(|| expr.clone());
    }

    let entries = imp
        .outputs
        .iter()
        .map(|(name, wiring)| Ok((name.clone(), wiring.eval(&proj)?)))
        .collect::<Result<Vec<_>, SynthError>>()?;
    Ok((Expr::map(entries)?, data))
}

/// A `LUT{k}` as two `LUT{k-1}` cofactors multiplexed on the last input.
fn realize_lut_split(
    arch: &ArchitectureDescription,
    k: u64,
    port_map: &IndexMap<String, Expr>,
    internal: Option<&InternalData>,
    session: &mut Session,
    depth: usize,
) -> Result<(Expr, InternalData), SynthError> {
    let (d0, d1, dm) = match internal {
        Some(token) => {
            let parts = token.tuple_n(3, "lut split")?;
            (Some(&parts[0]), Some(&parts[1]), Some(&parts[2]))
        }
        None => (None, None, None),
    };

    let mut shared = IndexMap::new();
    for i in 0..k - 1 {
        let name = format!("I{i}");
        shared.insert(name.clone(), port(port_map, &name)?);
    }
    let select = port(port_map, &format!("I{}", k - 1))?;

    let sub = InterfaceId::lut(k - 1);
    let (lut0, d0) = realize_at(arch, &sub, &shared, d0, session, depth + 1)?;
    let (lut1, d1) = realize_at(arch, &sub, &shared, d1, session, depth + 1)?;

    let mut mux_pm = IndexMap::new();
    mux_pm.insert("I0".to_string(), Expr::map_get(lut0, "O")?);
    mux_pm.insert("I1".to_string(), Expr::map_get(lut1, "O")?);
    mux_pm.insert("S".to_string(), select);
    let (mux, dm) = realize_at(arch, &InterfaceId::mux(2), &mux_pm, dm, session, depth + 1)?;

    let out = Expr::map_get(mux, "O")?;
    Ok((
        Expr::map(vec![("O".to_string(), out)])?,
        InternalData::Tuple(vec![d0, d1, dm]),
    ))
}

/// A `carry{w}` chained out of the fabric's native `carry{tile_w}` tiles.
///
/// All tiles share one internal-data token; two fresh 1-bit holes pad the
/// last tile's unused lanes.
fn realize_carry_retile(
    arch: &ArchitectureDescription,
    w: u64,
    tile_w: u64,
    port_map: &IndexMap<String, Expr>,
    internal: Option<&InternalData>,
    session: &mut Session,
    depth: usize,
) -> Result<(Expr, InternalData), SynthError> {
    let (threaded_tile, di_pad, s_pad) = match internal {
        Some(token) => {
            let parts = token.tuple_n(3, "carry retile")?;
            (
                Some(parts[0].clone()),
                parts[1].leaf("carry retile DI padding")?,
                parts[2].leaf("carry retile S padding")?,
            )
        }
        None => (
            None,
            session.fresh_bitvec("carry_di_pad", 1),
            session.fresh_bitvec("carry_s_pad", 1),
        ),
    };

    let ci = port(port_map, "CI")?;
    let di = port(port_map, "DI")?;
    let s = port(port_map, "S")?;

    let tiles = w.div_ceil(tile_w);
    let tile_id = InterfaceId::carry(tile_w);
    let mut carry = ci;
    let mut tile_token = threaded_tile;
    let mut tile_outs = Vec::with_capacity(tiles as usize);
    for t in 0..tiles {
        let lo = (t * tile_w) as u32;
        let hi = (((t + 1) * tile_w).min(w) - 1) as u32;
        let mut pm = IndexMap::new();
        pm.insert("CI".to_string(), carry.clone());
        pm.insert("DI".to_string(), pad_slice(&di, hi, lo, tile_w as u32, di_pad)?);
        pm.insert("S".to_string(), pad_slice(&s, hi, lo, tile_w as u32, s_pad)?);
        let (tile, token) = realize_at(arch, &tile_id, &pm, tile_token.as_ref(), session, depth + 1)?;
        carry = Expr::map_get(tile.clone(), "CO")?;
        tile_outs.push(Expr::map_get(tile, "O")?);
        tile_token = Some(token);
    }

    let stacked = Expr::concat(tile_outs.into_iter().rev().collect())?;
    let out = Expr::extract(w as u32 - 1, 0, stacked)?;
    let data = InternalData::Tuple(vec![
        tile_token.expect("at least one tile"),
        InternalData::Leaf(di_pad),
        InternalData::Leaf(s_pad),
    ]);
    Ok((
        Expr::map(vec![("O".to_string(), out), ("CO".to_string(), carry)])?,
        data,
    ))
}

/// Extracts `[hi:lo]` from a bus and fills the tile's upper lanes with the
/// padding hole when the slice is short.
fn pad_slice(bus: &Expr, hi: u32, lo: u32, tile_w: u32, pad: SymbolId) -> Result<Expr, SynthError> {
    let slice = Expr::extract(hi, lo, bus.clone())?;
    let have = hi - lo + 1;
    if have == tile_w {
        return Ok(slice);
    }
    let mut parts = vec![Expr::symbol(pad, 1); (tile_w - have) as usize];
    parts.push(slice);
    Ok(Expr::concat(parts)?)
}

/// A carry rebuilt from LUTs and muxes on fabrics with no carry primitive.
///
/// The one-bit base is `CO = MUX2(I0=DI, I1=CI, S=S)` and `O = LUT2(S, CI)`;
/// wider carries split one bit off the bottom and chain the carry-out.
fn realize_carry_from_luts(
    arch: &ArchitectureDescription,
    w: u64,
    port_map: &IndexMap<String, Expr>,
    internal: Option<&InternalData>,
    session: &mut Session,
    depth: usize,
) -> Result<(Expr, InternalData), SynthError> {
    let (first, second) = match internal {
        Some(token) => {
            let parts = token.tuple_n(2, "carry from luts")?;
            (Some(&parts[0]), Some(&parts[1]))
        }
        None => (None, None),
    };

    let ci = port(port_map, "CI")?;
    let di = port(port_map, "DI")?;
    let s = port(port_map, "S")?;

    if w == 1 {
        let mut mux_pm = IndexMap::new();
        mux_pm.insert("I0".to_string(), di);
        mux_pm.insert("I1".to_string(), ci.clone());
        mux_pm.insert("S".to_string(), s.clone());
        let (mux, d_mux) = realize_at(arch, &InterfaceId::mux(2), &mux_pm, first, session, depth + 1)?;

        let mut lut_pm = IndexMap::new();
        lut_pm.insert("I0".to_string(), s);
        lut_pm.insert("I1".to_string(), ci);
        let (lut, d_lut) = realize_at(arch, &InterfaceId::lut(2), &lut_pm, second, session, depth + 1)?;

        let co = Expr::map_get(mux, "O")?;
        let o = Expr::map_get(lut, "O")?;
        return Ok((
            Expr::map(vec![("O".to_string(), o), ("CO".to_string(), co)])?,
            InternalData::Tuple(vec![d_mux, d_lut]),
        ));
    }

    let mut low_pm = IndexMap::new();
    low_pm.insert("CI".to_string(), ci);
    low_pm.insert("DI".to_string(), Expr::bit(0, di.clone())?);
    low_pm.insert("S".to_string(), Expr::bit(0, s.clone())?);
    let (low, d_low) = realize_at(arch, &InterfaceId::carry(1), &low_pm, first, session, depth + 1)?;

    let mut high_pm = IndexMap::new();
    high_pm.insert("CI".to_string(), Expr::map_get(low.clone(), "CO")?);
    high_pm.insert("DI".to_string(), Expr::extract(w as u32 - 1, 1, di)?);
    high_pm.insert("S".to_string(), Expr::extract(w as u32 - 1, 1, s)?);
    let (high, d_high) =
        realize_at(arch, &InterfaceId::carry(w - 1), &high_pm, second, session, depth + 1)?;

    let o = Expr::concat(vec![
        Expr::map_get(high.clone(), "O")?,
        Expr::map_get(low, "O")?,
    ])?;
    let co = Expr::map_get(high, "CO")?;
    Ok((
        Expr::map(vec![("O".to_string(), o), ("CO".to_string(), co)])?,
        InternalData::Tuple(vec![d_low, d_high]),
    ))
}

fn port(port_map: &IndexMap<String, Expr>, name: &str) -> Result<Expr, SynthError> {
    port_map.get(name).cloned().ok_or_else(|| SynthError::MissingPort {
        port: name.to_string(),
    })
}

fn not_realizable(arch: &ArchitectureDescription, id: &InterfaceId) -> SynthError {
    SynthError::InterfaceNotRealizable {
        id: id.to_string(),
        arch: arch.name.clone(),
    }
}
