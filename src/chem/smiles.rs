//! SMILES parser
//!
//! Parses the OpenSMILES subset used for lab records into a [`MolGraph`]:
//! organic-subset and bracket atoms, bond symbols, branches, ring closures
//! (including `%nn`) and `.` disconnections. Stereo marks (`@`, `/`, `\`) are
//! accepted and dropped.

use super::elements::{self, Element};
use std::collections::BTreeMap;

/// Errors raised while parsing SMILES. Positions are character offsets.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },

    #[error("unterminated bracket atom starting at position {pos}")]
    UnterminatedBracket { pos: usize },

    #[error("branch opened at position {pos} is never closed")]
    UnclosedBranch { pos: usize },

    #[error("unmatched ')' at position {pos}")]
    UnmatchedBranch { pos: usize },

    #[error("ring bond {ring} opened at position {pos} is never closed")]
    UnclosedRing { ring: u32, pos: usize },

    #[error("ring bond {ring} at position {pos} would bond an atom to itself or duplicate a bond")]
    InvalidRing { ring: u32, pos: usize },

    #[error("bond at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },

    #[error("number at position {pos} is too large")]
    NumberTooLarge { pos: usize },

    #[error("{what} {value} at position {pos} is out of range")]
    ValueOutOfRange { what: &'static str, value: u32, pos: usize },

    #[error("charge {charge} at position {pos} is outside -{max}..+{max}", max = MAX_CHARGE)]
    ChargeOutOfRange { charge: i64, pos: usize },

    #[error("more than {max} atoms at position {pos}", max = MAX_ATOMS)]
    TooManyAtoms { pos: usize },
}

/// Largest formal charge written in a bracket atom.
pub const MAX_CHARGE: i8 = 15;

/// Largest molecule accepted; depiction is quadratic in the atom count.
pub const MAX_ATOMS: usize = 500;

type Result<T> = std::result::Result<T, SmilesError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the valence sum. Aromatic bonds count as one; the
    /// extra pi electron is accounted for per atom.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,
    pub aromatic: bool,
    /// Written inside `[...]`; bracket atoms never get implicit hydrogens
    pub bracket: bool,
    /// Explicit hydrogen count of a bracket atom
    pub hydrogens: u8,
    pub charge: i8,
    pub isotope: Option<u16>,
    pub class: Option<u32>,
}

impl Atom {
    fn organic(element: &'static Element, aromatic: bool) -> Self {
        Self { element, aromatic, bracket: false, hydrogens: 0, charge: 0, isotope: None, class: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
    /// Bond written as a ring closure
    pub ring_closure: bool,
}

/// Molecular graph produced by [`parse`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolGraph {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
}

impl MolGraph {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Neighbouring atom indices with the connecting bond.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.bonds.iter().filter_map(move |b| {
            if b.a == atom {
                Some((b.b, b))
            } else if b.b == atom {
                Some((b.a, b))
            } else {
                None
            }
        })
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.neighbors(atom).count()
    }

    fn has_bond(&self, a: usize, b: usize) -> bool {
        self.bonds.iter().any(|bond| (bond.a == a && bond.b == b) || (bond.a == b && bond.b == a))
    }

    /// Implicit hydrogens of an atom, from the lowest default valence that can
    /// accommodate its bonds.
    pub fn implicit_hydrogens(&self, atom: usize) -> u8 {
        let a = &self.atoms[atom];
        if a.bracket || a.element.valences.is_empty() {
            return 0;
        }
        let mut used: u32 = self.neighbors(atom).map(|(_, b)| u32::from(b.order.valence())).sum();
        // Aromatic O/S donate a lone pair, and a three-connected aromatic N/P
        // has no pi bond left to contribute.
        let lone_pair_donor = matches!(a.element.symbol, "O" | "S" | "Se")
            || (matches!(a.element.symbol, "N" | "P") && used >= 3);
        if a.aromatic && !lone_pair_donor {
            used += 1;
        }
        a.element
            .valences
            .iter()
            .find(|&&v| u32::from(v) >= used)
            .and_then(|&v| u8::try_from(u32::from(v) - used).ok())
            .unwrap_or(0)
    }

    /// Total hydrogens attached to an atom (implicit + bracket count).
    pub fn hydrogen_count(&self, atom: usize) -> u8 {
        self.atoms[atom].hydrogens.saturating_add(self.implicit_hydrogens(atom))
    }

    /// Connected components as lists of atom indices, in input order.
    pub fn fragments(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut out = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(atom) = stack.pop() {
                component.push(atom);
                for (next, _) in self.neighbors(atom) {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
            component.sort_unstable();
            out.push(component);
        }
        out
    }
}

struct RingOpening {
    atom: usize,
    bond: Option<BondOrder>,
    pos: usize,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    graph: MolGraph,
    prev: Option<usize>,
    pending: Option<(BondOrder, usize)>,
    branches: Vec<(Option<usize>, usize)>,
    rings: BTreeMap<u32, RingOpening>,
}

/// Parse a SMILES string.
pub fn parse(input: &str) -> Result<MolGraph> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
        graph: MolGraph::default(),
        prev: None,
        pending: None,
        branches: Vec::new(),
        rings: BTreeMap::new(),
    };
    parser.run()?;
    Ok(parser.graph)
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom, start)?;
                }
                'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' | 'b' | 'c' | 'n' | 'o' | 'p' | 's' | '*' => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom, start)?;
                }
                '(' => {
                    if self.prev.is_none() {
                        return Err(SmilesError::UnexpectedChar { ch, pos: start });
                    }
                    self.branches.push((self.prev, start));
                    self.pos += 1;
                }
                ')' => {
                    let (prev, _) = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnmatchedBranch { pos: start })?;
                    if let Some((_, pos)) = self.pending {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    self.prev = prev;
                    self.pos += 1;
                }
                '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                    if self.prev.is_none() || self.pending.is_some() {
                        return Err(SmilesError::UnexpectedChar { ch, pos: start });
                    }
                    let order = match ch {
                        '=' => BondOrder::Double,
                        '#' => BondOrder::Triple,
                        '$' => BondOrder::Quadruple,
                        ':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    self.pending = Some((order, start));
                    self.pos += 1;
                }
                '0'..='9' | '%' => {
                    let ring = self.ring_number()?;
                    self.ring_bond(ring, start)?;
                }
                '.' => {
                    if let Some((_, pos)) = self.pending {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                _ => return Err(SmilesError::UnexpectedChar { ch, pos: start }),
            }
        }

        if let Some((_, pos)) = self.pending {
            return Err(SmilesError::DanglingBond { pos });
        }
        if let Some((_, pos)) = self.branches.first() {
            return Err(SmilesError::UnclosedBranch { pos: *pos });
        }
        if let Some((ring, opening)) = self.rings.iter().next() {
            return Err(SmilesError::UnclosedRing { ring: *ring, pos: opening.pos });
        }
        if self.graph.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.graph.atoms[a].aromatic && self.graph.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn push_atom(&mut self, atom: Atom, pos: usize) -> Result<()> {
        let idx = self.graph.atoms.len();
        if idx >= MAX_ATOMS {
            return Err(SmilesError::TooManyAtoms { pos });
        }
        self.graph.atoms.push(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, idx),
            };
            self.graph.bonds.push(Bond { a: prev, b: idx, order, ring_closure: false });
        }
        self.pending = None;
        self.prev = Some(idx);
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom> {
        let ch = self.chars[self.pos];
        let single = ch.to_string();
        let (symbol, aromatic, len) = match (ch, self.peek_at(1)) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            ('*', _) => ("*", false, 1),
            _ => (single.as_str(), false, 1),
        };
        let element = elements::lookup(symbol)
            .ok_or_else(|| SmilesError::UnknownElement { symbol: symbol.to_string(), pos: self.pos })?;
        self.pos += len;
        Ok(Atom::organic(element, aromatic))
    }

    fn chars_str(&self, len: usize) -> String {
        self.chars[self.pos..(self.pos + len).min(self.chars.len())].iter().collect()
    }

    /// Unsigned decimal at the cursor, `None` when there are no digits.
    fn number(&mut self) -> Result<Option<u32>> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or(SmilesError::NumberTooLarge { pos: start })?;
            self.pos += 1;
        }
        Ok((self.pos > start).then_some(value))
    }

    fn bracket_atom(&mut self) -> Result<Atom> {
        let open = self.pos;
        self.pos += 1;

        let isotope = match self.number()? {
            Some(n) => {
                let isotope = u16::try_from(n)
                    .map_err(|_| SmilesError::ValueOutOfRange { what: "isotope", value: n, pos: open + 1 })?;
                Some(isotope)
            }
            None => None,
        };

        let sym_pos = self.pos;
        let first = self.peek().ok_or(SmilesError::UnterminatedBracket { pos: open })?;
        let (element, aromatic) = if first.is_ascii_uppercase() || first == '*' {
            let two: String = self.chars_str(2);
            match self.peek_at(1).filter(char::is_ascii_lowercase).and_then(|_| elements::lookup(&two)) {
                Some(e) => {
                    self.pos += 2;
                    (e, false)
                }
                None => {
                    let one = first.to_string();
                    let e = elements::lookup(&one)
                        .ok_or(SmilesError::UnknownElement { symbol: one, pos: sym_pos })?;
                    self.pos += 1;
                    (e, false)
                }
            }
        } else if first.is_ascii_lowercase() {
            let two: String = self.chars_str(2);
            let (symbol, len) = match two.as_str() {
                "se" => ("Se", 2),
                "as" => ("As", 2),
                _ => match first {
                    'b' => ("B", 1),
                    'c' => ("C", 1),
                    'n' => ("N", 1),
                    'o' => ("O", 1),
                    'p' => ("P", 1),
                    's' => ("S", 1),
                    _ => {
                        return Err(SmilesError::UnknownElement { symbol: first.to_string(), pos: sym_pos });
                    }
                },
            };
            self.pos += len;
            (elements::lookup(symbol).ok_or(SmilesError::UnknownElement { symbol: symbol.into(), pos: sym_pos })?, true)
        } else {
            return Err(SmilesError::UnexpectedChar { ch: first, pos: sym_pos });
        };

        // chirality
        while self.peek() == Some('@') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_uppercase() && c != 'H') {
            // @TH1, @SP2 and friends
            self.pos += 1;
            self.number()?;
        }

        let mut hydrogens = 0;
        if self.peek() == Some('H') {
            let h_pos = self.pos;
            self.pos += 1;
            let n = self.number()?.unwrap_or(1);
            hydrogens = u8::try_from(n)
                .map_err(|_| SmilesError::ValueOutOfRange { what: "hydrogen count", value: n, pos: h_pos })?;
        }

        let mut charge: i8 = 0;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            let sign_pos = self.pos;
            self.pos += 1;
            let magnitude = match self.number()? {
                Some(n) => n,
                None => {
                    let mut repeats = 1u32;
                    while self.peek() == Some(sign) {
                        repeats = repeats.saturating_add(1);
                        self.pos += 1;
                    }
                    repeats
                }
            };
            let signed = if sign == '+' { i64::from(magnitude) } else { -i64::from(magnitude) };
            charge = i8::try_from(signed)
                .ok()
                .filter(|c| (-MAX_CHARGE..=MAX_CHARGE).contains(c))
                .ok_or(SmilesError::ChargeOutOfRange { charge: signed, pos: sign_pos })?;
        }

        let mut class = None;
        if self.peek() == Some(':') {
            self.pos += 1;
            class = self.number()?;
        }

        match self.peek() {
            Some(']') => self.pos += 1,
            Some(ch) => return Err(SmilesError::UnexpectedChar { ch, pos: self.pos }),
            None => return Err(SmilesError::UnterminatedBracket { pos: open }),
        }

        Ok(Atom { element, aromatic, bracket: true, hydrogens, charge, isotope, class })
    }

    fn ring_number(&mut self) -> Result<u32> {
        let ch = self.chars[self.pos];
        if ch == '%' {
            let start = self.pos;
            let digits: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
            if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(SmilesError::UnexpectedChar { ch, pos: start });
            }
            self.pos += 3;
            Ok(digits.parse().unwrap_or(0))
        } else {
            self.pos += 1;
            Ok(ch.to_digit(10).unwrap_or(0))
        }
    }

    fn ring_bond(&mut self, ring: u32, pos: usize) -> Result<()> {
        let atom = self.prev.ok_or(SmilesError::UnexpectedChar { ch: self.chars[pos], pos })?;
        let bond = self.pending.take().map(|(order, _)| order);

        match self.rings.remove(&ring) {
            Some(opening) => {
                if opening.atom == atom || self.graph.has_bond(opening.atom, atom) {
                    return Err(SmilesError::InvalidRing { ring, pos });
                }
                let order = bond
                    .or(opening.bond)
                    .unwrap_or_else(|| self.default_order(opening.atom, atom));
                self.graph.bonds.push(Bond { a: opening.atom, b: atom, order, ring_closure: true });
            }
            None => {
                self.rings.insert(ring, RingOpening { atom, bond, pos });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_with_branch() {
        let g = parse("CC(=O)O").unwrap();
        assert_eq!(g.atom_count(), 4);
        assert_eq!(g.bonds.len(), 3);
        assert_eq!(g.bonds[1].order, BondOrder::Double);
        assert_eq!(g.degree(1), 3);
        assert_eq!(g.implicit_hydrogens(0), 3);
        assert_eq!(g.implicit_hydrogens(3), 1);
    }

    #[test]
    fn test_parse_benzene_ring() {
        let g = parse("c1ccccc1").unwrap();
        assert_eq!(g.atom_count(), 6);
        assert_eq!(g.bonds.len(), 6);
        assert!(g.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(g.bonds.iter().filter(|b| b.ring_closure).count(), 1);
        assert!((0..6).all(|i| g.implicit_hydrogens(i) == 1));
    }

    #[test]
    fn test_pyridine_nitrogen_has_no_hydrogen() {
        let g = parse("c1ccncc1").unwrap();
        assert_eq!(g.implicit_hydrogens(3), 0);
    }

    #[test]
    fn test_thiophene_sulfur_has_no_hydrogen() {
        let g = parse("c1ccsc1").unwrap();
        assert_eq!(g.implicit_hydrogens(3), 0);
        assert_eq!(g.implicit_hydrogens(0), 1);
    }

    #[test]
    fn test_bracket_atoms() {
        let g = parse("[13CH3][NH4+].[O-2]").unwrap();
        assert_eq!(g.atoms[0].isotope, Some(13));
        assert_eq!(g.atoms[0].hydrogens, 3);
        assert_eq!(g.atoms[1].charge, 1);
        assert_eq!(g.atoms[1].hydrogens, 4);
        assert_eq!(g.atoms[2].charge, -2);
        assert_eq!(g.fragments().len(), 2);
    }

    #[test]
    fn test_two_letter_elements() {
        let g = parse("ClCCl").unwrap();
        assert_eq!(g.atoms[0].element.symbol, "Cl");
        assert_eq!(g.atoms[2].element.symbol, "Cl");
        let g = parse("[Mg+2].[O-]S(=O)(=O)[O-]").unwrap();
        assert_eq!(g.atoms[0].element.symbol, "Mg");
        assert_eq!(g.atoms[0].charge, 2);
    }

    #[test]
    fn test_percent_ring_numbers() {
        let g = parse("C%12CCCCC%12").unwrap();
        assert_eq!(g.bonds.len(), 6);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("   "), Err(SmilesError::Empty));
        assert_eq!(parse("C1CC"), Err(SmilesError::UnclosedRing { ring: 1, pos: 1 }));
        assert_eq!(parse("CC(C"), Err(SmilesError::UnclosedBranch { pos: 2 }));
        assert_eq!(parse("CC)"), Err(SmilesError::UnmatchedBranch { pos: 2 }));
        assert_eq!(parse("CC="), Err(SmilesError::DanglingBond { pos: 2 }));
        assert!(matches!(parse("C[Xx]"), Err(SmilesError::UnknownElement { .. })));
        assert!(matches!(parse("C?"), Err(SmilesError::UnexpectedChar { ch: '?', pos: 1 })));
        assert!(matches!(parse("[CH4"), Err(SmilesError::UnterminatedBracket { pos: 0 })));
        assert!(matches!(parse("C11"), Err(SmilesError::InvalidRing { ring: 1, .. })));
    }

    #[test]
    fn test_charge_limits() {
        assert_eq!(parse("[Fe+15]").unwrap().atoms[0].charge, 15);
        assert_eq!(parse("[C---]").unwrap().atoms[0].charge, -3);
        assert_eq!(parse("[C-128]"), Err(SmilesError::ChargeOutOfRange { charge: -128, pos: 2 }));
        assert_eq!(parse("[Fe+200]"), Err(SmilesError::ChargeOutOfRange { charge: 200, pos: 3 }));
        let many = format!("[C{}]", "+".repeat(130));
        assert_eq!(parse(&many), Err(SmilesError::ChargeOutOfRange { charge: 130, pos: 2 }));
    }

    #[test]
    fn test_bracket_numbers_out_of_range() {
        assert_eq!(
            parse("[70000C]"),
            Err(SmilesError::ValueOutOfRange { what: "isotope", value: 70000, pos: 1 })
        );
        assert_eq!(
            parse("[CH300]"),
            Err(SmilesError::ValueOutOfRange { what: "hydrogen count", value: 300, pos: 2 })
        );
        assert_eq!(parse("[99999999999C]"), Err(SmilesError::NumberTooLarge { pos: 1 }));
        assert_eq!(parse("[C:99999999999]"), Err(SmilesError::NumberTooLarge { pos: 3 }));
    }

    #[test]
    fn test_hypervalent_atom_has_no_implicit_hydrogens() {
        let g = parse(&format!("C{}", "(#C)".repeat(90))).unwrap();
        assert_eq!(g.implicit_hydrogens(0), 0);
        assert_eq!(g.hydrogen_count(0), 0);
        // each terminal carbon keeps one hydrogen
        assert_eq!(g.implicit_hydrogens(1), 1);
    }

    #[test]
    fn test_atom_limit() {
        assert_eq!(parse(&"C".repeat(MAX_ATOMS)).unwrap().atom_count(), MAX_ATOMS);
        assert_eq!(
            parse(&"C".repeat(MAX_ATOMS + 1)),
            Err(SmilesError::TooManyAtoms { pos: MAX_ATOMS })
        );
    }
}
