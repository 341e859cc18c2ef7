//! Periodic-table data needed for SMILES parsing and descriptors.

/// Static properties of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub atomic_number: u8,
    /// Mass of the most abundant isotope, in Da.
    pub monoisotopic_mass: f64,
    /// Allowed valences for implicit-hydrogen assignment, ascending.
    /// Empty for elements that never receive implicit hydrogens.
    pub valences: &'static [u8],
}

pub const HYDROGEN_MASS: f64 = 1.007_825_032_23;
pub const ELECTRON_MASS: f64 = 0.000_548_579_909_46;

macro_rules! el {
    ($sym:expr, $z:expr, $m:expr, [$($v:expr),*]) => {
        Element { symbol: $sym, atomic_number: $z, monoisotopic_mass: $m, valences: &[$($v),*] }
    };
}

static ELEMENTS: &[Element] = &[
    el!("H", 1, 1.007_825_032_23, [1]),
    el!("He", 2, 4.002_603_254_13, []),
    el!("Li", 3, 7.016_003_436_6, []),
    el!("Be", 4, 9.012_183_065, []),
    el!("B", 5, 11.009_305_36, [3]),
    el!("C", 6, 12.0, [4]),
    el!("N", 7, 14.003_074_004_43, [3, 5]),
    el!("O", 8, 15.994_914_619_57, [2]),
    el!("F", 9, 18.998_403_162_73, [1]),
    el!("Ne", 10, 19.992_440_176_2, []),
    el!("Na", 11, 22.989_769_282, []),
    el!("Mg", 12, 23.985_041_697, []),
    el!("Al", 13, 26.981_538_41, []),
    el!("Si", 14, 27.976_926_534_65, [4]),
    el!("P", 15, 30.973_761_998_42, [3, 5]),
    el!("S", 16, 31.972_071_174_4, [2, 4, 6]),
    el!("Cl", 17, 34.968_852_682, [1]),
    el!("Ar", 18, 39.962_383_123_7, []),
    el!("K", 19, 38.963_706_486_4, []),
    el!("Ca", 20, 39.962_590_863, []),
    el!("Sc", 21, 44.955_908_28, []),
    el!("Ti", 22, 47.947_941_98, []),
    el!("V", 23, 50.943_957_04, []),
    el!("Cr", 24, 51.940_506_23, []),
    el!("Mn", 25, 54.938_043_91, []),
    el!("Fe", 26, 55.934_936_33, []),
    el!("Co", 27, 58.933_194_29, []),
    el!("Ni", 28, 57.935_342_41, []),
    el!("Cu", 29, 62.929_597_72, []),
    el!("Zn", 30, 63.929_142_01, []),
    el!("Ga", 31, 68.925_573_5, []),
    el!("Ge", 32, 73.921_177_761, []),
    el!("As", 33, 74.921_594_57, [3, 5]),
    el!("Se", 34, 79.916_521_8, [2, 4, 6]),
    el!("Br", 35, 78.918_337_6, [1]),
    el!("Kr", 36, 83.911_497_728_2, []),
    el!("Rb", 37, 84.911_789_737_9, []),
    el!("Sr", 38, 87.905_612_5, []),
    el!("Y", 39, 88.905_840_3, []),
    el!("Zr", 40, 89.904_697_7, []),
    el!("Nb", 41, 92.906_373_0, []),
    el!("Mo", 42, 97.905_404_82, []),
    el!("Tc", 43, 97.907_212_4, []),
    el!("Ru", 44, 101.904_344_1, []),
    el!("Rh", 45, 102.905_498, []),
    el!("Pd", 46, 105.903_480_4, []),
    el!("Ag", 47, 106.905_091_6, []),
    el!("Cd", 48, 113.903_365_09, []),
    el!("In", 49, 114.903_878_776, []),
    el!("Sn", 50, 119.902_201_63, []),
    el!("Sb", 51, 120.903_812, []),
    el!("Te", 52, 129.906_222_748, [2, 4, 6]),
    el!("I", 53, 126.904_471_9, [1]),
    el!("Xe", 54, 131.904_155_085_6, []),
    el!("Cs", 55, 132.905_451_961, []),
    el!("Ba", 56, 137.905_247, []),
    el!("La", 57, 138.906_363_1, []),
    el!("Gd", 64, 157.924_112_3, []),
    el!("Lu", 71, 174.940_779_1, []),
    el!("Hf", 72, 179.946_557_0, []),
    el!("Ta", 73, 180.947_999_8, []),
    el!("W", 74, 183.950_932_6, []),
    el!("Re", 75, 186.955_750_1, []),
    el!("Os", 76, 191.961_477_0, []),
    el!("Ir", 77, 192.962_921_6, []),
    el!("Pt", 78, 194.964_791_7, []),
    el!("Au", 79, 196.966_568_79, []),
    el!("Hg", 80, 201.970_643_4, []),
    el!("Tl", 81, 204.974_427_8, []),
    el!("Pb", 82, 207.976_652_5, []),
    el!("Bi", 83, 208.980_399_1, []),
    el!("Po", 84, 208.982_430_8, []),
    el!("Ra", 88, 226.025_410_3, []),
    el!("Ac", 89, 227.027_752_3, []),
    el!("Th", 90, 232.038_055_8, []),
    el!("U", 92, 238.050_788_4, []),
];

/// Look up an element by its capitalised symbol.
pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by atomic number.
pub fn by_number(z: u8) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.atomic_number == z)
}

/// Elements that may be written in lower case (aromatic) in SMILES.
pub fn aromatic_symbol(symbol: &str) -> Option<&'static Element> {
    match symbol {
        "b" => by_symbol("B"),
        "c" => by_symbol("C"),
        "n" => by_symbol("N"),
        "o" => by_symbol("O"),
        "p" => by_symbol("P"),
        "s" => by_symbol("S"),
        "se" => by_symbol("Se"),
        "as" => by_symbol("As"),
        "te" => by_symbol("Te"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(by_symbol("Cl").unwrap().atomic_number, 17);
        assert_eq!(by_number(6).unwrap().symbol, "C");
        assert!(by_symbol("Xx").is_none());
    }

    #[test]
    fn test_aromatic_symbols() {
        assert_eq!(aromatic_symbol("c").unwrap().symbol, "C");
        assert_eq!(aromatic_symbol("se").unwrap().symbol, "Se");
        assert!(aromatic_symbol("f").is_none());
    }
}
