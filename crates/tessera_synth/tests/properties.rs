//! Cross-cutting properties of the synthesizer and sketch generators,
//! exercised on the shipped architecture descriptions.

use indexmap::IndexMap;
use std::path::Path;
use tessera_arch::{load_architecture, ArchitectureDescription, InterfaceId};
use tessera_ir::{Expr, Session, SpecExpr};
use tessera_synth::{
    bitwise, bitwise_with_carry, comparison, multiply, realize, shift, InternalData,
    SynthesisQuery,
};

fn fabric(name: &str) -> ArchitectureDescription {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../architecture_descriptions")
        .join(format!("{name}.yml"));
    load_architecture(&path).unwrap()
}

fn ab(width: u32) -> Vec<Expr> {
    vec![Expr::var("a", width), Expr::var("b", width)]
}

type Generator = fn(
    &ArchitectureDescription,
    &[Expr],
    usize,
    u32,
    Option<&InternalData>,
    &mut Session,
) -> Result<(Expr, InternalData), tessera_synth::SynthError>;

const GENERATORS: &[(&str, Generator, u32)] = &[
    ("bitwise", bitwise, 6),
    ("bitwise_with_carry", bitwise_with_carry, 6),
    ("comparison", comparison, 1),
    ("multiply", multiply, 6),
    ("shift", shift, 6),
];

#[test]
fn widths_are_preserved_across_fabrics() {
    for arch_name in ["lattice_ecp5", "xilinx_ultrascale_plus", "sofa"] {
        let arch = fabric(arch_name);
        for (name, generate, out_width) in GENERATORS {
            let mut session = Session::new();
            let (out, _) = generate(&arch, &ab(6), 2, 6, None, &mut session)
                .unwrap_or_else(|e| panic!("{name} on {arch_name}: {e}"));
            assert_eq!(
                out.width(),
                Some(*out_width),
                "{name} on {arch_name} advertised the wrong width"
            );
        }
    }
}

#[test]
fn token_shapes_are_deterministic() {
    for arch_name in ["lattice_ecp5", "xilinx_ultrascale_plus", "sofa"] {
        let arch = fabric(arch_name);
        for (name, generate, _) in GENERATORS {
            let mut s1 = Session::new();
            let (_, d1) = generate(&arch, &ab(4), 2, 4, None, &mut s1).unwrap();
            let mut s2 = Session::new();
            let (_, d2) = generate(&arch, &ab(4), 2, 4, None, &mut s2).unwrap();
            assert!(
                d1.same_shape(&d2),
                "{name} on {arch_name} produced differing token shapes"
            );
        }
    }
}

#[test]
fn threaded_tokens_reuse_every_symbol() {
    for arch_name in ["lattice_ecp5", "xilinx_ultrascale_plus", "sofa"] {
        let arch = fabric(arch_name);
        for (name, generate, _) in GENERATORS {
            let mut session = Session::new();
            let (first, token) = generate(&arch, &ab(4), 2, 4, None, &mut session).unwrap();
            let allocated = session.len();
            let (second, _) =
                generate(&arch, &ab(4), 2, 4, Some(&token), &mut session).unwrap();
            assert_eq!(
                session.len(),
                allocated,
                "{name} on {arch_name} allocated under a threaded token"
            );
            let first_syms: std::collections::HashSet<_> =
                first.symbols().into_iter().collect();
            for sym in second.symbols() {
                assert!(
                    first_syms.contains(&sym),
                    "{name} on {arch_name} leaked a fresh symbol"
                );
            }
        }
    }
}

#[test]
fn generation_is_idempotent_per_session_seed() {
    // Fresh sessions allocate the same ids in the same order, so two
    // independent runs build structurally identical IR.
    for arch_name in ["lattice_ecp5", "xilinx_ultrascale_plus", "sofa"] {
        let arch = fabric(arch_name);
        for (name, generate, _) in GENERATORS {
            let mut s1 = Session::new();
            let (e1, _) = generate(&arch, &ab(3), 2, 3, None, &mut s1).unwrap();
            let mut s2 = Session::new();
            let (e2, _) = generate(&arch, &ab(3), 2, 3, None, &mut s2).unwrap();
            assert_eq!(e1, e2, "{name} on {arch_name} is not deterministic");
        }
    }
}

#[test]
fn lut_only_fabric_realizes_the_whole_catalog() {
    let arch = fabric("sofa");
    for k in 1..=8u64 {
        let mut session = Session::new();
        let pm: IndexMap<String, Expr> = (0..k)
            .map(|i| (format!("I{i}"), Expr::var(format!("x{i}"), 1)))
            .collect();
        realize(&arch, &InterfaceId::lut(k), &pm, None, &mut session)
            .unwrap_or_else(|e| panic!("LUT{k} on sofa: {e}"));
    }

    let mut session = Session::new();
    let pm = IndexMap::from([
        ("I0".to_string(), Expr::var("a", 1)),
        ("I1".to_string(), Expr::var("b", 1)),
        ("S".to_string(), Expr::var("s", 1)),
    ]);
    realize(&arch, &InterfaceId::mux(2), &pm, None, &mut session).unwrap();

    for w in 1..=10u64 {
        let mut session = Session::new();
        let pm = IndexMap::from([
            ("CI".to_string(), Expr::var("ci", 1)),
            ("DI".to_string(), Expr::var("di", w as u32)),
            ("S".to_string(), Expr::var("s", w as u32)),
        ]);
        realize(&arch, &InterfaceId::carry(w), &pm, None, &mut session)
            .unwrap_or_else(|e| panic!("carry{w} on sofa: {e}"));
    }
}

#[test]
fn equivalence_queries_cover_sketch_holes() {
    let arch = fabric("lattice_ecp5");
    let mut session = Session::new();
    let (sketch, token) = bitwise(&arch, &ab(8), 2, 8, None, &mut session).unwrap();
    let spec = SpecExpr::and(SpecExpr::var("a", 8), SpecExpr::var("b", 8)).unwrap();
    let query = SynthesisQuery::equivalence(spec, sketch).unwrap();

    assert_eq!(query.free_vars.len(), 2);
    // Every symbol in the token is quantified over in the query.
    let holes: std::collections::HashSet<_> = query.holes.iter().copied().collect();
    for sym in token.symbols() {
        assert!(holes.contains(&sym));
    }
}
