//! SMILES parser.
//!
//! Supports the OpenSMILES subset found in registry exports: organic-subset
//! and bracket atoms (isotope, chirality, hydrogen count, charge, atom class),
//! branches, ring closures including `%nn`, all bond symbols, `.` separated
//! fragments and lower-case aromatic atoms. Stereo information is parsed and
//! discarded. Parsing stops at the first whitespace, so a trailing title is
//! ignored.

use std::collections::HashMap;
use thiserror::Error;

use ferroscreen_common::ScreenError;

use crate::element::{self, Element};
use crate::molecule::{Atom, Bond, BondOrder, Molecule};
use crate::rings;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("unclosed bracket atom starting at position {0}")]
    UnclosedBracket(usize),

    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedBranch(usize),

    #[error("ring closure {0} is never closed")]
    UnclosedRing(u16),

    #[error("ring closure {0} joins an atom to itself or to an existing neighbour")]
    InvalidRingBond(u16),

    #[error("bond at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("explicit valence of atom {atom} ({symbol}) is greater than permitted")]
    Valence { atom: usize, symbol: &'static str },

    #[error("non-ring atom {0} marked aromatic")]
    NonRingAromatic(usize),

    #[error("{what} at position {pos} is out of range")]
    OutOfRange { what: &'static str, pos: usize },
}

impl From<SmilesError> for ScreenError {
    fn from(e: SmilesError) -> Self {
        ScreenError::InvalidStructure(e.to_string())
    }
}

/// Parse a SMILES string into a molecule with implicit hydrogens assigned
/// and rings and aromaticity perceived.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let text = smiles.trim_start();
    let text = text.split_whitespace().next().unwrap_or("");
    if text.is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut parser = Parser::new(text);
    parser.parse()?;
    let mut mol = parser.finish()?;
    rings::perceive(&mut mol)?;
    Ok(mol)
}

// ── Parser state ──────────────────────────────────────────────────────────────

struct Parser {
    chars: Vec<char>,
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    prev: Option<usize>,
    pending: Option<(BondOrder, usize)>,
    branches: Vec<usize>,
    open_rings: HashMap<u16, (usize, Option<BondOrder>)>,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            prev: None,
            pending: None,
            branches: Vec::new(),
            open_rings: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn unexpected(&self) -> SmilesError {
        match self.peek() {
            Some(ch) => SmilesError::UnexpectedChar { ch, pos: self.pos },
            None => SmilesError::DanglingBond(self.pos),
        }
    }

    fn parse(&mut self) -> Result<(), SmilesError> {
        while let Some(ch) = self.peek() {
            match ch {
                '(' => {
                    let Some(prev) = self.prev else {
                        return Err(SmilesError::UnbalancedBranch(self.pos));
                    };
                    if self.pending.is_some() {
                        return Err(self.unexpected());
                    }
                    self.branches.push(prev);
                    self.pos += 1;
                }
                ')' => {
                    if let Some((_, p)) = self.pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    let Some(back) = self.branches.pop() else {
                        return Err(SmilesError::UnbalancedBranch(self.pos));
                    };
                    self.prev = Some(back);
                    self.pos += 1;
                }
                '.' => {
                    if let Some((_, p)) = self.pending {
                        return Err(SmilesError::DanglingBond(p));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                    if self.pending.is_some() || self.prev.is_none() {
                        return Err(self.unexpected());
                    }
                    let order = match ch {
                        '=' => BondOrder::Double,
                        '#' => BondOrder::Triple,
                        '$' => BondOrder::Quadruple,
                        ':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    self.pending = Some((order, self.pos));
                    self.pos += 1;
                }
                '0'..='9' | '%' => self.ring_closure()?,
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.add_atom(atom);
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.add_atom(atom);
                }
            }
        }

        if let Some((_, p)) = self.pending {
            return Err(SmilesError::DanglingBond(p));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnbalancedBranch(self.chars.len()));
        }
        if let Some(&id) = self.open_rings.keys().min() {
            return Err(SmilesError::UnclosedRing(id));
        }
        if self.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn add_atom(&mut self, atom: Atom) {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, idx),
            };
            self.bonds.push(Bond { a: prev, b: idx, order, in_ring: false });
        }
        self.prev = Some(idx);
    }

    fn ring_closure(&mut self) -> Result<(), SmilesError> {
        let Some(atom) = self.prev else {
            return Err(self.unexpected());
        };
        let id: u16 = if self.peek() == Some('%') {
            let (d1, d2) = (self.peek_at(1), self.peek_at(2));
            match (d1.and_then(|c| c.to_digit(10)), d2.and_then(|c| c.to_digit(10))) {
                (Some(a), Some(b)) => {
                    self.pos += 3;
                    (a * 10 + b) as u16
                }
                _ => return Err(self.unexpected()),
            }
        } else {
            let d = self.peek().and_then(|c| c.to_digit(10)).unwrap_or(0);
            self.pos += 1;
            d as u16
        };

        let pending = self.pending.take().map(|(o, _)| o);
        match self.open_rings.remove(&id) {
            Some((other, opened_with)) => {
                let already_bonded = self
                    .bonds
                    .iter()
                    .any(|b| (b.a == atom && b.b == other) || (b.a == other && b.b == atom));
                if other == atom || already_bonded {
                    return Err(SmilesError::InvalidRingBond(id));
                }
                let order = pending
                    .or(opened_with)
                    .unwrap_or_else(|| self.default_order(other, atom));
                self.bonds.push(Bond { a: other, b: atom, order, in_ring: false });
            }
            None => {
                self.open_rings.insert(id, (atom, pending));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let ch = self.peek().ok_or(SmilesError::Empty)?;
        let two: String = self.chars[self.pos..self.chars.len().min(self.pos + 2)].iter().collect();

        let (el, aromatic, width): (&'static Element, bool, usize) = match ch {
            'C' if two == "Cl" => (lookup("Cl")?, false, 2),
            'B' if two == "Br" => (lookup("Br")?, false, 2),
            'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' => (lookup(&ch.to_string())?, false, 1),
            'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                let el = element::aromatic_symbol(&ch.to_string())
                    .ok_or_else(|| SmilesError::UnknownElement(ch.to_string()))?;
                (el, true, 1)
            }
            _ => return Err(self.unexpected()),
        };
        self.pos += width;

        Ok(Atom {
            element: el,
            aromatic,
            charge: 0,
            isotope: None,
            hydrogens: 0,
            bracket: false,
            in_ring: false,
        })
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        self.pos += 1; // '['

        // isotope
        let isotope = match self.read_number()? {
            Some(n) => Some(u16::try_from(n).map_err(|_| self.out_of_range("isotope", start + 1))?),
            None => None,
        };

        // element symbol
        let first = self.peek().ok_or(SmilesError::UnclosedBracket(start))?;
        let second = self.peek_at(1);
        let (el, aromatic) = if first.is_ascii_uppercase() {
            let two = second
                .filter(|c| c.is_ascii_lowercase())
                .map(|c| format!("{first}{c}"))
                .and_then(|s| element::by_symbol(&s));
            match two {
                Some(el) => {
                    self.pos += 2;
                    (el, false)
                }
                None => {
                    self.pos += 1;
                    (lookup(&first.to_string())?, false)
                }
            }
        } else if first.is_ascii_lowercase() {
            let two = second
                .filter(|c| c.is_ascii_lowercase())
                .map(|c| format!("{first}{c}"))
                .and_then(|s| element::aromatic_symbol(&s));
            match two {
                Some(el) => {
                    self.pos += 2;
                    (el, true)
                }
                None => {
                    let el = element::aromatic_symbol(&first.to_string())
                        .ok_or_else(|| SmilesError::UnknownElement(first.to_string()))?;
                    self.pos += 1;
                    (el, true)
                }
            }
        } else if first == '*' {
            return Err(SmilesError::UnknownElement("*".to_string()));
        } else {
            return Err(self.unexpected());
        };

        // chirality: @, @@, @TH1, @AL2, @SP3, @TB10, @OH22
        if self.peek() == Some('@') {
            self.pos += 1;
            if self.peek() == Some('@') {
                self.pos += 1;
            } else {
                let class: String = self.chars[self.pos..self.chars.len().min(self.pos + 2)]
                    .iter()
                    .collect();
                if matches!(class.as_str(), "TH" | "AL" | "SP" | "TB" | "OH")
                    && self.peek_at(2).map(|c| c.is_ascii_digit()).unwrap_or(false)
                {
                    self.pos += 2;
                    self.read_number()?;
                }
            }
        }

        // hydrogen count
        let mut hydrogens = 0u8;
        if self.peek() == Some('H') {
            self.pos += 1;
            let at = self.pos;
            hydrogens = match self.read_number()? {
                Some(n) => u8::try_from(n).map_err(|_| self.out_of_range("hydrogen count", at))?,
                None => 1,
            };
        }

        // charge
        let mut charge: i8 = 0;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            let unit: i8 = if sign == '+' { 1 } else { -1 };
            let at = self.pos;
            self.pos += 1;
            if let Some(n) = self.read_number()? {
                charge = i8::try_from(i64::from(unit) * i64::from(n))
                    .map_err(|_| self.out_of_range("charge", at))?;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    charge = charge.checked_add(unit).ok_or_else(|| self.out_of_range("charge", at))?;
                    self.pos += 1;
                }
            }
        }

        // atom class
        if self.peek() == Some(':') {
            self.pos += 1;
            if self.read_number()?.is_none() {
                return Err(self.unexpected());
            }
        }

        if self.peek() != Some(']') {
            return match self.peek() {
                Some(_) => Err(self.unexpected()),
                None => Err(SmilesError::UnclosedBracket(start)),
            };
        }
        self.pos += 1;

        Ok(Atom {
            element: el,
            aromatic,
            charge,
            isotope,
            hydrogens,
            bracket: true,
            in_ring: false,
        })
    }

    /// Digits at the cursor; `Ok(None)` when there are none.
    fn read_number(&mut self) -> Result<Option<u32>, SmilesError> {
        let start = self.pos;
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .map(Some)
            .map_err(|_| self.out_of_range("number", start))
    }

    fn out_of_range(&self, what: &'static str, pos: usize) -> SmilesError {
        SmilesError::OutOfRange { what, pos }
    }

    /// Build the molecule: adjacency, implicit hydrogens, and explicit `[H]`
    /// atoms folded into their heavy neighbour.
    fn finish(self) -> Result<Molecule, SmilesError> {
        let Parser { mut atoms, bonds, .. } = self;

        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (i, b) in bonds.iter().enumerate() {
            adjacency[b.a].push((b.b, i));
            adjacency[b.b].push((b.a, i));
        }

        for (idx, atom) in atoms.iter_mut().enumerate() {
            if atom.bracket {
                continue;
            }
            let bond_sum: u32 = adjacency[idx]
                .iter()
                .map(|&(_, bi)| bonds[bi].order.valence() as u32)
                .sum();
            atom.hydrogens = implicit_hydrogens(atom, bond_sum)
                .ok_or(SmilesError::Valence { atom: idx, symbol: atom.element.symbol })?;
        }

        fold_hydrogens(atoms, bonds)
    }
}

fn lookup(symbol: &str) -> Result<&'static Element, SmilesError> {
    element::by_symbol(symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))
}

/// Implicit hydrogens of an organic-subset atom; `None` when the bonds
/// already exceed the highest allowed valence.
fn implicit_hydrogens(atom: &Atom, bond_sum: u32) -> Option<u8> {
    let valences = atom.element.valences;
    if valences.is_empty() {
        return Some(0);
    }
    if atom.aromatic {
        let target = valences[0] as u32;
        return Some(target.saturating_sub(bond_sum + 1) as u8);
    }
    valences
        .iter()
        .map(|&v| v as u32)
        .find(|&v| v >= bond_sum)
        .map(|v| (v - bond_sum) as u8)
}

/// Remove plain `[H]` atoms bonded to a heavy atom and count them on that atom.
fn fold_hydrogens(mut atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Molecule, SmilesError> {
    let foldable = |i: usize, atoms: &[Atom], bonds: &[Bond]| {
        let a = &atoms[i];
        if !a.is_hydrogen() || a.charge != 0 || a.isotope.is_some() || a.hydrogens != 0 {
            return false;
        }
        let mut partners = bonds.iter().filter(|b| b.a == i || b.b == i);
        match (partners.next(), partners.next()) {
            (Some(b), None) => b.order == BondOrder::Single && !atoms[b.other(i)].is_hydrogen(),
            _ => false,
        }
    };

    let remove: Vec<bool> = (0..atoms.len()).map(|i| foldable(i, &atoms, &bonds)).collect();
    for b in &bonds {
        let heavy = if remove[b.a] {
            b.b
        } else if remove[b.b] {
            b.a
        } else {
            continue;
        };
        atoms[heavy].hydrogens = atoms[heavy]
            .hydrogens
            .checked_add(1)
            .ok_or(SmilesError::OutOfRange { what: "hydrogen count", pos: heavy })?;
    }

    let mut remap = vec![usize::MAX; atoms.len()];
    let mut kept = Vec::with_capacity(atoms.len());
    for (i, atom) in atoms.into_iter().enumerate() {
        if !remove[i] {
            remap[i] = kept.len();
            kept.push(atom);
        }
    }

    let kept_bonds: Vec<Bond> = bonds
        .into_iter()
        .filter(|b| !remove[b.a] && !remove[b.b])
        .map(|b| Bond { a: remap[b.a], b: remap[b.b], ..b })
        .collect();

    let mut adjacency = vec![Vec::new(); kept.len()];
    for (i, b) in kept_bonds.iter().enumerate() {
        adjacency[b.a].push((b.b, i));
        adjacency[b.b].push((b.a, i));
    }

    Ok(Molecule { atoms: kept, bonds: kept_bonds, adjacency, rings: Vec::new() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethanol() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        let h: Vec<u8> = mol.atoms.iter().map(|a| a.hydrogens).collect();
        assert_eq!(h, vec![3, 2, 1]);
    }

    #[test]
    fn test_benzene_aromatic() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert!(mol.atoms.iter().all(|a| a.aromatic && a.hydrogens == 1 && a.in_ring));
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn test_kekule_benzene_perceived_aromatic() {
        let mol = parse_smiles("C1=CC=CC=C1").unwrap();
        assert!(mol.atoms.iter().all(|a| a.aromatic));
        assert!(mol.atoms.iter().all(|a| a.hydrogens == 1));
    }

    #[test]
    fn test_branches_and_double_bonds() {
        // acetic acid
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.atoms[1].hydrogens, 0);
        assert_eq!(mol.atoms[3].hydrogens, 1);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atoms[0].charge, 1);
        assert_eq!(mol.atoms[0].hydrogens, 4);

        let mol = parse_smiles("[13CH4]").unwrap();
        assert_eq!(mol.atoms[0].isotope, Some(13));

        let mol = parse_smiles("C[C@@H](N)C(=O)O").unwrap();
        assert_eq!(mol.atoms[1].hydrogens, 1);

        let mol = parse_smiles("[O-][N+](=O)C").unwrap();
        assert_eq!(mol.atoms[0].charge, -1);
        assert_eq!(mol.atoms[1].charge, 1);
    }

    #[test]
    fn test_pyrrole_and_pyridine() {
        let pyrrole = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(pyrrole.atoms[3].hydrogens, 1);
        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.atoms[3].hydrogens, 0);
        let methylpyrrole = parse_smiles("Cn1cccc1").unwrap();
        assert_eq!(methylpyrrole.atoms[1].hydrogens, 0);
    }

    #[test]
    fn test_explicit_hydrogens_folded() {
        let mol = parse_smiles("[H]OC([H])([H])[H]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.atoms[0].hydrogens, 1);
        assert_eq!(mol.atoms[1].hydrogens, 3);
    }

    #[test]
    fn test_percent_ring_closure_and_fragments() {
        let mol = parse_smiles("C%10CCCCC%10.[Na+].[Cl-]").unwrap();
        assert_eq!(mol.atom_count(), 8);
        assert_eq!(mol.fragment_count(), 3);
        assert!(mol.atoms[0].in_ring);
    }

    #[test]
    fn test_trailing_title_ignored() {
        let mol = parse_smiles("CCO ethanol").unwrap();
        assert_eq!(mol.atom_count(), 3);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(parse_smiles(""), Err(SmilesError::Empty));
        assert!(matches!(parse_smiles("C1CC"), Err(SmilesError::UnclosedRing(1))));
        assert!(matches!(parse_smiles("CC(C"), Err(SmilesError::UnbalancedBranch(_))));
        assert!(matches!(parse_smiles("CC)C"), Err(SmilesError::UnbalancedBranch(_))));
        assert!(matches!(parse_smiles("C[Xx]"), Err(SmilesError::UnknownElement(_))));
        assert!(matches!(parse_smiles("C[CH4"), Err(SmilesError::UnclosedBracket(_))));
        assert!(matches!(parse_smiles("CC="), Err(SmilesError::DanglingBond(_))));
        assert!(matches!(parse_smiles("C(C)(C)(C)(C)C"), Err(SmilesError::Valence { .. })));
        assert!(matches!(parse_smiles("cc"), Err(SmilesError::NonRingAromatic(_))));
        assert!(matches!(parse_smiles("not_a_smiles"), Err(_)));
    }

    #[test]
    fn test_oversized_bracket_numbers_rejected() {
        for smiles in ["[CH300]", "[99999C]", "[C+4294967295]", "[C-2147483648]", "[C+200]", "[99999999999C]"] {
            assert!(
                matches!(parse_smiles(smiles), Err(SmilesError::OutOfRange { .. })),
                "{smiles} should be out of range"
            );
        }
        let pluses = format!("[C{}]", "+".repeat(130));
        assert!(matches!(parse_smiles(&pluses), Err(SmilesError::OutOfRange { what: "charge", .. })));
        assert_eq!(parse_smiles("[C-128]").map(|m| m.atoms[0].charge), Ok(-128));
    }

    #[test]
    fn test_folded_hydrogens_overflow_is_an_error() {
        let mol = parse_smiles("[CH254][H]").unwrap();
        assert_eq!(mol.atoms[0].hydrogens, 255);
        assert!(matches!(parse_smiles("[CH255][H]"), Err(SmilesError::OutOfRange { .. })));
    }

    #[test]
    fn test_error_converts_to_invalid_structure() {
        let err: ScreenError = parse_smiles("C1CC").unwrap_err().into();
        assert!(matches!(err, ScreenError::InvalidStructure(_)));
    }
}
