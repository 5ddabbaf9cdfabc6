//! Molecular formula and weight

use super::elements;
use super::smiles::MolGraph;
use std::collections::BTreeMap;

/// Element symbol -> atom count, hydrogens included.
pub fn element_counts(graph: &MolGraph) -> BTreeMap<&'static str, u32> {
    let mut counts: BTreeMap<&'static str, u32> = BTreeMap::new();
    for (idx, atom) in graph.atoms.iter().enumerate() {
        if atom.element.number == 0 {
            continue;
        }
        *counts.entry(atom.element.symbol).or_default() += 1;
        let h = graph.hydrogen_count(idx) as u32;
        if h > 0 {
            *counts.entry("H").or_default() += h;
        }
    }
    counts
}

/// Formula in Hill order: C, then H, then the rest alphabetically. Without
/// carbon every element, hydrogen included, is alphabetical.
pub fn hill_formula(graph: &MolGraph) -> String {
    let mut counts = element_counts(graph);
    let mut out = String::new();
    let mut emit = |symbol: &str, n: u32| {
        out.push_str(symbol);
        if n > 1 {
            out.push_str(&n.to_string());
        }
    };

    if let Some(c) = counts.remove("C") {
        emit("C", c);
        if let Some(h) = counts.remove("H") {
            emit("H", h);
        }
    }
    for (symbol, n) in counts {
        emit(symbol, n);
    }
    out
}

/// Average molecular weight in g/mol.
pub fn molecular_weight(graph: &MolGraph) -> f64 {
    let h = elements::hydrogen().mass;
    graph
        .atoms
        .iter()
        .enumerate()
        .map(|(idx, atom)| atom.element.mass + h * graph.hydrogen_count(idx) as f64)
        .sum()
}

/// Net formal charge over all atoms.
pub fn net_charge(graph: &MolGraph) -> i32 {
    graph.atoms.iter().map(|a| a.charge as i32).sum()
}
