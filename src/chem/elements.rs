//! Periodic table subset used by the SMILES parser and formula code.

/// Static element data.
#[derive(Debug, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub number: u8,
    /// Standard atomic weight (g/mol)
    pub mass: f64,
    /// Default valences for implicit-hydrogen calculation, ascending.
    /// Empty for elements that never take implicit hydrogens.
    pub valences: &'static [u8],
    /// CPK-style drawing colour
    pub color: &'static str,
}

macro_rules! element {
    ($sym:literal, $num:literal, $mass:literal, [$($v:literal),*], $color:literal) => {
        Element { symbol: $sym, number: $num, mass: $mass, valences: &[$($v),*], color: $color }
    };
}

pub static ELEMENTS: &[Element] = &[
    element!("*", 0, 0.0, [], "#909090"),
    element!("H", 1, 1.008, [], "#404040"),
    element!("He", 2, 4.0026, [], "#D9FFFF"),
    element!("Li", 3, 6.94, [], "#CC80FF"),
    element!("Be", 4, 9.0122, [], "#C2FF00"),
    element!("B", 5, 10.81, [3], "#FFB5B5"),
    element!("C", 6, 12.011, [4], "#202020"),
    element!("N", 7, 14.007, [3, 5], "#3050F8"),
    element!("O", 8, 15.999, [2], "#FF0D0D"),
    element!("F", 9, 18.998, [1], "#90E050"),
    element!("Ne", 10, 20.180, [], "#B3E3F5"),
    element!("Na", 11, 22.990, [], "#AB5CF2"),
    element!("Mg", 12, 24.305, [], "#8AFF00"),
    element!("Al", 13, 26.982, [], "#BFA6A6"),
    element!("Si", 14, 28.085, [], "#F0C8A0"),
    element!("P", 15, 30.974, [3, 5], "#FF8000"),
    element!("S", 16, 32.06, [2, 4, 6], "#C8A000"),
    element!("Cl", 17, 35.45, [1], "#1FB01F"),
    element!("Ar", 18, 39.95, [], "#80D1E3"),
    element!("K", 19, 39.098, [], "#8F40D4"),
    element!("Ca", 20, 40.078, [], "#3DFF00"),
    element!("Ti", 22, 47.867, [], "#BFC2C7"),
    element!("Cr", 24, 51.996, [], "#8A99C7"),
    element!("Mn", 25, 54.938, [], "#9C7AC7"),
    element!("Fe", 26, 55.845, [], "#E06633"),
    element!("Co", 27, 58.933, [], "#F090A0"),
    element!("Ni", 28, 58.693, [], "#50D050"),
    element!("Cu", 29, 63.546, [], "#C88033"),
    element!("Zn", 30, 65.38, [], "#7D80B0"),
    element!("As", 33, 74.922, [], "#BD80E3"),
    element!("Se", 34, 78.971, [], "#FFA100"),
    element!("Br", 35, 79.904, [1], "#A62929"),
    element!("Ag", 47, 107.87, [], "#C0C0C0"),
    element!("Sn", 50, 118.71, [], "#668080"),
    element!("I", 53, 126.90, [1], "#940094"),
    element!("Ba", 56, 137.33, [], "#00C900"),
    element!("Pt", 78, 195.08, [], "#D0D0E0"),
    element!("Au", 79, 196.97, [], "#FFD123"),
    element!("Hg", 80, 200.59, [], "#B8B8D0"),
    element!("Pb", 82, 207.2, [], "#575961"),
];

/// Look up an element by its (case-sensitive) symbol.
pub fn lookup(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

pub fn hydrogen() -> &'static Element {
    &ELEMENTS[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("Cl").unwrap().number, 17);
        assert_eq!(lookup("C").unwrap().valences, &[4]);
        assert!(lookup("cl").is_none());
        assert_eq!(hydrogen().symbol, "H");
    }
}
