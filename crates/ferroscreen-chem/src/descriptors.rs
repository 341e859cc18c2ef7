//! Molecular descriptors used by the drug-likeness rules.
//!
//! H-bond donor/acceptor counts follow the Lipinski definitions (the same
//! SMARTS semantics the common cheminformatics toolkits use). logP is the
//! Wildman-Crippen atom-contribution sum over a condensed type table.

use serde::Serialize;

use ferroscreen_common::{ScreenError, Table, Value};

use crate::element::{ELECTRON_MASS, HYDROGEN_MASS};
use crate::molecule::{Atom, BondOrder, Molecule};
use crate::smiles::parse_smiles;

/// All descriptors the built-in filters need, computed in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Descriptors {
    pub molecular_weight: f64,
    pub heavy_atoms: usize,
    pub n_hbd: usize,
    pub n_hba: usize,
    pub logp: f64,
    pub rotatable_bonds: usize,
}

impl Descriptors {
    pub fn compute(mol: &Molecule) -> Self {
        Self {
            molecular_weight: exact_mass(mol),
            heavy_atoms: heavy_atom_count(mol),
            n_hbd: num_h_donors(mol),
            n_hba: num_h_acceptors(mol),
            logp: crippen_logp(mol),
            rotatable_bonds: rotatable_bonds(mol),
        }
    }

    pub fn from_smiles(smiles: &str) -> Result<Self, ScreenError> {
        let mol = parse_smiles(smiles)
            .map_err(|e| ScreenError::InvalidStructure(format!("Invalid SMILES string: {smiles} ({e})")))?;
        Ok(Self::compute(&mol))
    }
}

pub const DESCRIPTOR_COLUMNS: [&str; 6] = [
    "molecular_weight",
    "heavy_atoms",
    "n_hbd",
    "n_hba",
    "logp",
    "rotatable_bonds",
];

/// Append one column per descriptor. Rows whose structure is missing or
/// unparseable get null cells.
pub fn append_descriptors(table: &Table, structure_field: &str) -> Result<Table, ScreenError> {
    let col = table.require_column(structure_field)?;
    let values = table
        .rows()
        .iter()
        .map(|row| match row[col].as_str().map(Descriptors::from_smiles) {
            Some(Ok(d)) => vec![
                Value::Float(d.molecular_weight),
                Value::Int(d.heavy_atoms as i64),
                Value::Int(d.n_hbd as i64),
                Value::Int(d.n_hba as i64),
                Value::Float(d.logp),
                Value::Int(d.rotatable_bonds as i64),
            ],
            _ => vec![Value::Null; DESCRIPTOR_COLUMNS.len()],
        })
        .collect();
    let names: Vec<String> = DESCRIPTOR_COLUMNS.iter().map(|c| c.to_string()).collect();
    table.with_columns(&names, values)
}

/// Monoisotopic mass including implicit hydrogens, corrected for charge.
pub fn exact_mass(mol: &Molecule) -> f64 {
    mol.atoms
        .iter()
        .map(|a| a.mass() + a.hydrogens as f64 * HYDROGEN_MASS - a.charge as f64 * ELECTRON_MASS)
        .sum()
}

pub fn heavy_atom_count(mol: &Molecule) -> usize {
    mol.heavy_atom_indices().count()
}

/// Integer valence of an atom (aromatic half bonds rounded).
fn int_valence(mol: &Molecule, atom: usize) -> u32 {
    mol.valence(atom).round() as u32
}

fn is_one_of(atom: &Atom, numbers: &[u8]) -> bool {
    numbers.contains(&atom.atomic_number())
}

/// Lipinski donors: `N;!H0;v3`, `N;!H0;+1;v4`, `O,S;H1;+0`, `n;H1;+0`.
pub fn num_h_donors(mol: &Molecule) -> usize {
    (0..mol.atom_count())
        .filter(|&i| {
            let a = &mol.atoms[i];
            let h = mol.total_hydrogens(i);
            let v = int_valence(mol, i);
            match (a.atomic_number(), a.aromatic) {
                (7, false) => h > 0 && (v == 3 || (a.charge == 1 && v == 4)),
                (7, true) => h == 1 && a.charge == 0,
                (8, false) | (16, false) => h == 1 && a.charge == 0,
                _ => false,
            }
        })
        .count()
}

/// Lipinski acceptors: hydroxyl O/S not on an acid-like centre, ether and
/// carbonyl O/S, anionic O/S, non-amide trivalent N, pyridine-type `n`,
/// aromatic `o`/`s`, and F.
pub fn num_h_acceptors(mol: &Molecule) -> usize {
    (0..mol.atom_count())
        .filter(|&i| is_acceptor(mol, i))
        .count()
}

fn is_acceptor(mol: &Molecule, i: usize) -> bool {
    let a = &mol.atoms[i];
    let h = mol.total_hydrogens(i);
    let v = int_valence(mol, i);

    match a.atomic_number() {
        8 | 16 if a.aromatic => a.charge == 0,
        8 | 16 => {
            if a.charge < 0 {
                return true;
            }
            if v != 2 {
                return false;
            }
            if h == 0 {
                return true;
            }
            // [O,S;H1;v2]-[!$(*=[O,N,P,S])]
            h == 1
                && mol.neighbors(i).any(|(n, b)| {
                    b.order == BondOrder::Single
                        && !mol.has_bond_to(n, BondOrder::Double, |x| is_one_of(x, &[7, 8, 15, 16]))
                })
        }
        7 if a.aromatic => h == 0 && a.charge == 0,
        7 => {
            // N;v3 not bonded to an atom with a non-ring double bond to O,N,P,S
            v == 3
                && !mol.neighbors(i).any(|(n, b)| {
                    b.order == BondOrder::Single
                        && mol.neighbors(n).any(|(m, nb)| {
                            m != i
                                && nb.order == BondOrder::Double
                                && !nb.in_ring
                                && is_one_of(&mol.atoms[m], &[7, 8, 15, 16])
                        })
                })
        }
        9 => true,
        _ => false,
    }
}

/// Rotatable bonds under the strict definition: single non-ring bonds
/// between non-terminal heavy atoms, except bonds touching a triple-bonded
/// atom or a CF3/CCl3/CBr3/t-butyl carbon, and the C(=X)-Y bond of amides,
/// esters, thioesters and amidines.
pub fn rotatable_bonds(mol: &Molecule) -> usize {
    mol.bonds
        .iter()
        .filter(|b| b.order == BondOrder::Single && !b.in_ring)
        .filter(|b| {
            rotor_end(mol, b.a) && rotor_end(mol, b.b) && !(amide_end(mol, b.a) && amide_end(mol, b.b))
        })
        .count()
}

fn rotor_end(mol: &Molecule, atom: usize) -> bool {
    !mol.atoms[atom].is_hydrogen()
        && mol.heavy_degree(atom) > 1
        && !mol.neighbors(atom).any(|(_, b)| b.order == BondOrder::Triple)
        && !symmetric_cap(mol, atom)
}

/// Aliphatic carbon carrying three F, three Cl, three Br or three methyls.
fn symmetric_cap(mol: &Molecule, atom: usize) -> bool {
    let a = &mol.atoms[atom];
    if !a.is_carbon() || a.aromatic {
        return false;
    }
    let count = |pred: &dyn Fn(usize) -> bool| mol.neighbors(atom).filter(|&(n, _)| pred(n)).count();
    [9u8, 17, 35]
        .iter()
        .any(|&z| count(&|n| mol.atoms[n].atomic_number() == z) >= 3)
        || count(&|n| mol.atoms[n].is_carbon() && !mol.atoms[n].aromatic && mol.total_hydrogens(n) == 3) >= 3
}

/// Trigonal aliphatic carbon double-bonded to N, O or S (or to N+ when
/// `cationic`).
fn acyl_carbon(mol: &Molecule, atom: usize, cationic: bool) -> bool {
    let a = &mol.atoms[atom];
    a.is_carbon()
        && !a.aromatic
        && mol.heavy_degree(atom) == 3
        && mol.neighbors(atom).any(|(n, b)| {
            let x = &mol.atoms[n];
            b.order == BondOrder::Double
                && if cationic {
                    x.atomic_number() == 7 && x.charge > 0
                } else {
                    is_one_of(x, &[7, 8, 16])
                }
        })
}

/// Heteroatom that can sit on the single-bond side of an acyl carbon:
/// any N, aliphatic O, or non-terminal aliphatic S.
fn acyl_partner(mol: &Molecule, atom: usize, cationic: bool) -> bool {
    let a = &mol.atoms[atom];
    match a.atomic_number() {
        7 => !cationic || mol.heavy_degree(atom) > 1,
        8 => !cationic && !a.aromatic,
        16 => !cationic && !a.aromatic && mol.heavy_degree(atom) > 1,
        _ => false,
    }
}

/// Either end of an acyclic C(=X)-Y linkage.
fn amide_end(mol: &Molecule, atom: usize) -> bool {
    [false, true].into_iter().any(|cationic| {
        mol.neighbors(atom).any(|(n, b)| {
            b.order == BondOrder::Single
                && !b.in_ring
                && ((acyl_carbon(mol, atom, cationic) && acyl_partner(mol, n, cationic))
                    || (acyl_partner(mol, atom, cationic) && acyl_carbon(mol, n, cationic)))
        })
    })
}

// ── Wildman-Crippen logP ─────────────────────────────────────────────────────

/// Octanol/water partition coefficient as the sum of atom contributions.
pub fn crippen_logp(mol: &Molecule) -> f64 {
    (0..mol.atom_count())
        .map(|i| {
            let heavy = if mol.atoms[i].is_hydrogen() {
                HYDROCARBON_H
            } else {
                heavy_contribution(mol, i)
            };
            heavy + mol.atoms[i].hydrogens as f64 * hydrogen_contribution(mol, i)
        })
        .sum()
}

const HYDROCARBON_H: f64 = 0.123;

fn is_common_organic(atom: &Atom) -> bool {
    is_one_of(atom, &[1, 6, 7, 8, 15, 16, 9, 17, 35, 53])
}

/// Exocyclic (non-aromatic) substituent of an aromatic atom, with its bond.
fn substituent(mol: &Molecule, atom: usize) -> Option<(usize, BondOrder)> {
    mol.neighbors(atom)
        .find(|(n, b)| b.order != BondOrder::Aromatic && !mol.atoms[*n].is_hydrogen())
        .map(|(n, b)| (n, b.order))
}

fn heavy_contribution(mol: &Molecule, i: usize) -> f64 {
    let a = &mol.atoms[i];
    match a.atomic_number() {
        6 if a.aromatic => aromatic_carbon(mol, i),
        6 => aliphatic_carbon(mol, i),
        7 => nitrogen(mol, i),
        8 => oxygen(mol, i),
        16 if a.aromatic => 0.6237,
        16 if a.charge != 0 => -0.0024,
        16 => 0.6482,
        9 => 0.4202,
        17 => 0.6895,
        35 => 0.8456,
        53 => 0.8857,
        15 => 0.8612,
        3 | 11 | 19 | 37 | 55 => -0.3808,
        _ => -0.0025,
    }
}

fn aromatic_carbon(mol: &Molecule, i: usize) -> f64 {
    if mol.atoms[i].hydrogens > 0 {
        return 0.1581; // C18
    }
    let Some((s, order)) = substituent(mol, i) else {
        return 0.2955; // C19, fusion atom
    };
    let sub = &mol.atoms[s];
    if order == BondOrder::Double && is_one_of(sub, &[6, 7, 8]) {
        return -0.8186; // C25
    }
    match sub.atomic_number() {
        9 => 0.0,
        17 => 0.245,
        35 => 0.198,
        53 => 0.0,
        _ if sub.aromatic => 0.2713,
        6 => 0.136,
        7 => 0.4619,
        8 => 0.5437,
        16 => 0.1893,
        _ => -0.5443,
    }
}

fn aliphatic_carbon(mol: &Molecule, i: usize) -> f64 {
    let h = mol.total_hydrogens(i);
    let doubles: Vec<usize> = mol
        .neighbors(i)
        .filter(|(_, b)| b.order == BondOrder::Double)
        .map(|(n, _)| n)
        .collect();

    if mol.neighbors(i).any(|(_, b)| b.order == BondOrder::Triple) || doubles.len() >= 2 {
        return 0.0017; // C7
    }
    if let Some(&partner) = doubles.first() {
        if !mol.atoms[partner].is_carbon() {
            return -0.2783; // C5
        }
        let conjugated = mol.atoms[partner].aromatic || mol.neighbors(i).any(|(n, _)| mol.atoms[n].aromatic);
        return if conjugated { 0.264 } else { 0.1551 }; // C26 / C6
    }

    let heavy: Vec<&Atom> = mol
        .neighbors(i)
        .map(|(n, _)| &mol.atoms[n])
        .filter(|n| !n.is_hydrogen())
        .collect();

    if heavy.iter().any(|n| !is_common_organic(n)) {
        return 0.2148; // C27
    }
    if let Some(ar) = heavy.iter().find(|n| n.aromatic) {
        return match h {
            3 if ar.is_carbon() => 0.08452, // C8
            3 => -0.1444,                   // C9
            2 => -0.0516,                   // C10
            1 => 0.1193,                    // C11
            _ => -0.0967,                   // C12
        };
    }
    if heavy.iter().any(|n| n.is_hetero()) {
        return if h >= 2 { -0.2035 } else { -0.2051 }; // C3 / C4
    }
    if h >= 2 { 0.1441 } else { 0.0 } // C1 / C2
}

fn nitrogen(mol: &Molecule, i: usize) -> f64 {
    let a = &mol.atoms[i];
    let h = mol.total_hydrogens(i);

    if a.aromatic {
        return if a.charge > 0 { -1.119 } else { -0.3239 }; // N12 / N11
    }
    if a.charge > 0 {
        return if h > 0 { -1.950 } else { -0.3396 }; // N10 / N13
    }
    if a.charge < 0 {
        return 0.2887; // N14
    }
    if mol.neighbors(i).any(|(_, b)| b.order == BondOrder::Triple) {
        return 0.01508; // N9
    }
    if mol.neighbors(i).any(|(_, b)| b.order == BondOrder::Double) {
        return if h > 0 { 0.08387 } else { 0.1836 }; // N5 / N6
    }

    let aryl = mol.neighbors(i).any(|(n, _)| mol.atoms[n].aromatic);
    match (h, aryl) {
        (h, false) if h >= 2 => -1.019, // N1
        (2, true) => -1.027,            // N3
        (1, false) => -0.7096,          // N2
        (1, true) => -0.5188,           // N4
        (_, false) => -0.3187,          // N7
        (_, true) => -0.4458,           // N8
    }
}

fn oxygen(mol: &Molecule, i: usize) -> f64 {
    let a = &mol.atoms[i];
    if a.aromatic {
        return 0.1552; // O1
    }

    if a.charge < 0 {
        let Some((n, _)) = mol.neighbors(i).next() else {
            return -1.189;
        };
        let nb = &mol.atoms[n];
        return match nb.atomic_number() {
            7 => 0.0335,  // O5, N-oxide
            16 => -0.3339, // O6
            6 if mol.has_bond_to(n, BondOrder::Double, |x| x.atomic_number() == 8) => -1.326, // O12
            _ => -1.189,   // O7
        };
    }

    if let Some((partner, _)) = mol.neighbors(i).find(|(_, b)| b.order == BondOrder::Double) {
        let p = &mol.atoms[partner];
        return match p.atomic_number() {
            7 | 8 => 0.0335,           // O5
            6 if p.aromatic => 0.1788, // O8
            6 => carbonyl_oxygen(mol, partner, i),
            _ => -0.1188,              // OS
        };
    }

    if mol.total_hydrogens(i) > 0 {
        return -0.2893; // O2
    }
    if mol.neighbors(i).any(|(n, _)| mol.atoms[n].aromatic) {
        -0.4195 // O4
    } else {
        -0.0684 // O3
    }
}

fn carbonyl_oxygen(mol: &Molecule, carbon: usize, oxygen: usize) -> f64 {
    let others: Vec<&Atom> = mol
        .neighbors(carbon)
        .filter(|&(n, _)| n != oxygen)
        .map(|(n, _)| &mol.atoms[n])
        .collect();
    let hetero = others.iter().filter(|n| n.is_hetero()).count();
    if hetero >= 2 {
        0.4833 // O11
    } else if others.iter().any(|n| n.aromatic) {
        0.1129 // O10
    } else {
        -0.1526 // O9
    }
}

/// Contribution of each hydrogen attached to heavy atom `i`.
fn hydrogen_contribution(mol: &Molecule, i: usize) -> f64 {
    match mol.atoms[i].atomic_number() {
        1 | 6 => HYDROCARBON_H, // H1
        7 => 0.2142,            // H3
        8 => {
            let acidic = mol.neighbors(i).any(|(n, _)| {
                let nb = &mol.atoms[n];
                is_one_of(nb, &[8, 16])
                    || (nb.is_carbon()
                        && !nb.aromatic
                        && mol.has_bond_to(n, BondOrder::Double, |x| is_one_of(x, &[6, 7, 8, 16])))
            });
            if mol.neighbors(i).any(|(n, _)| mol.atoms[n].atomic_number() == 7) {
                0.2142 // H3
            } else if acidic {
                0.298 // H4
            } else {
                -0.2677 // H2
            }
        }
        _ => -0.2677, // H2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(smiles: &str) -> Descriptors {
        Descriptors::from_smiles(smiles).unwrap()
    }

    #[test]
    fn test_ethanol() {
        let d = desc("CCO");
        assert!((d.molecular_weight - 46.0419).abs() < 1e-3);
        assert_eq!(d.heavy_atoms, 3);
        assert_eq!(d.n_hbd, 1);
        assert_eq!(d.n_hba, 1);
        assert_eq!(d.rotatable_bonds, 0);
        assert!((d.logp - (-0.0014)).abs() < 1e-3);
    }

    #[test]
    fn test_eicosane_is_lipophilic() {
        let d = desc("CCCCCCCCCCCCCCCCCCCC");
        assert_eq!(d.heavy_atoms, 20);
        assert!((d.molecular_weight - 282.3287).abs() < 1e-3);
        assert!(d.logp > 7.5 && d.logp < 8.5, "logp = {}", d.logp);
        assert_eq!(d.rotatable_bonds, 17);
        assert_eq!(d.n_hbd + d.n_hba, 0);
    }

    #[test]
    fn test_aspirin() {
        let d = desc("CC(=O)Oc1ccccc1C(=O)O");
        assert_eq!(d.heavy_atoms, 13);
        assert!((d.molecular_weight - 180.0423).abs() < 1e-3);
        assert_eq!(d.n_hbd, 1);
        // ester O, two carbonyl O; the acid OH is excluded
        assert_eq!(d.n_hba, 3);
        assert!(d.logp > 0.5 && d.logp < 2.0, "logp = {}", d.logp);
    }

    #[test]
    fn test_amide_nitrogen_is_not_acceptor() {
        let acetamide = desc("CC(N)=O");
        assert_eq!(acetamide.n_hba, 1);
        assert_eq!(acetamide.n_hbd, 1);

        let amine = desc("CCN");
        assert_eq!(amine.n_hba, 1);
    }

    #[test]
    fn test_charge_corrects_mass() {
        let neutral = desc("CC(=O)O").molecular_weight;
        let anion = desc("CC(=O)[O-]").molecular_weight;
        assert!((neutral - anion - HYDROGEN_MASS + ELECTRON_MASS).abs() < 1e-6);
    }

    #[test]
    fn test_triple_bond_not_rotatable() {
        assert_eq!(desc("CC#CC").rotatable_bonds, 0);
        assert_eq!(desc("CCCC").rotatable_bonds, 1);
    }

    #[test]
    fn test_strict_rotatable_bonds() {
        let imatinib = desc("Cc1ccc(NC(=O)c2ccc(CN3CCN(C)CC3)cc2)cc1Nc1nccc(-c2cccnc2)n1");
        assert_eq!(imatinib.rotatable_bonds, 7);
        // the amide C-N is rigid, both bonds next to it rotate
        assert_eq!(desc("CCC(=O)NCC").rotatable_bonds, 2);
        assert_eq!(desc("CCOC(=O)CC").rotatable_bonds, 2);
        assert_eq!(desc("CC(C)(C)CC").rotatable_bonds, 0);
        assert_eq!(desc("FC(F)(F)CCC").rotatable_bonds, 1);
    }

    #[test]
    fn test_append_descriptors() {
        let table = Table::from_rows(
            ["compound_id", "smiles"],
            vec![vec!["C1".into(), "CCO".into()], vec!["C2".into(), "C1CC".into()]],
        )
        .unwrap();
        let out = append_descriptors(&table, "smiles").unwrap();
        assert_eq!(out.columns().len(), 2 + DESCRIPTOR_COLUMNS.len());
        assert_eq!(out.get(0, "heavy_atoms"), Some(&Value::Int(3)));
        assert_eq!(out.get(1, "logp"), Some(&Value::Null));
    }

    #[test]
    fn test_invalid_smiles() {
        let err = Descriptors::from_smiles("C1CC").unwrap_err();
        assert!(matches!(err, ScreenError::InvalidStructure(_)));
    }
}
