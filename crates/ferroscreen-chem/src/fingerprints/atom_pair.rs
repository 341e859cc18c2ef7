//! Hashed atom-pair fingerprint.
//!
//! Every pair of heavy atoms in the same fragment contributes the feature
//! (code of atom 1, topological distance, code of atom 2), with the two
//! atom codes ordered so the feature does not depend on atom numbering.

use crate::molecule::{BondOrder, Molecule};

use super::hashing::{bit_for, hash_values};

/// Pairs further apart than this are ignored.
const MAX_DISTANCE: usize = 30;

fn pi_electrons(mol: &Molecule, atom: usize) -> u32 {
    if mol.atoms[atom].aromatic {
        return 1;
    }
    mol.neighbors(atom)
        .map(|(_, b)| match b.order {
            BondOrder::Double => 1,
            BondOrder::Triple => 2,
            _ => 0,
        })
        .sum()
}

fn atom_code(mol: &Molecule, atom: usize) -> u32 {
    let z = mol.atoms[atom].atomic_number() as u32;
    let pi = pi_electrons(mol, atom).min(3);
    let degree = (mol.heavy_degree(atom) as u32).min(7);
    (z << 5) | (pi << 3) | degree
}

pub fn encode(mol: &Molecule, n_bits: usize) -> Vec<u8> {
    let mut bits = vec![0u8; n_bits];
    let heavy: Vec<usize> = mol.heavy_atom_indices().collect();
    let codes: Vec<u32> = (0..mol.atom_count()).map(|i| atom_code(mol, i)).collect();

    for (k, &i) in heavy.iter().enumerate() {
        let dist = mol.distances_from(i);
        for &j in &heavy[k + 1..] {
            let Some(d) = dist[j] else { continue };
            if d > MAX_DISTANCE {
                continue;
            }
            let (lo, hi) = if codes[i] <= codes[j] { (codes[i], codes[j]) } else { (codes[j], codes[i]) };
            let feature = hash_values(&[lo, d as u32, hi]);
            bits[bit_for(feature, n_bits)] = 1;
        }
    }

    bits
}
