//! Circular (Morgan / ECFP-like) fingerprint.
//!
//! Each heavy atom starts from an invariant built from element, heavy
//! degree, attached hydrogens, charge, isotope and ring membership. Every
//! iteration folds in the sorted (bond, neighbour identifier) pairs, so an
//! identifier at iteration `r` describes the atom's environment of radius `r`.
//! All identifiers from iterations `0..=radius` are hashed into the vector.

use crate::molecule::Molecule;

use super::hashing::{bit_for, combine, hash_values};

fn initial_invariant(mol: &Molecule, atom: usize) -> u32 {
    let a = &mol.atoms[atom];
    hash_values(&[
        a.atomic_number() as u32,
        mol.heavy_degree(atom) as u32,
        mol.total_hydrogens(atom) as u32,
        a.charge as i32 as u32,
        a.isotope.unwrap_or(0) as u32,
        a.in_ring as u32,
    ])
}

pub fn encode(mol: &Molecule, radius: u32, n_bits: usize) -> Vec<u8> {
    let mut bits = vec![0u8; n_bits];
    let heavy: Vec<usize> = mol.heavy_atom_indices().collect();

    let mut ids = vec![0u32; mol.atom_count()];
    for &i in &heavy {
        ids[i] = initial_invariant(mol, i);
        bits[bit_for(ids[i], n_bits)] = 1;
    }

    for iteration in 0..radius {
        let mut next = ids.clone();
        for &i in &heavy {
            let mut env: Vec<(u32, u32)> = mol
                .neighbors(i)
                .filter(|(n, _)| !mol.atoms[*n].is_hydrogen())
                .map(|(n, b)| (b.order.code(), ids[n]))
                .collect();
            env.sort_unstable();

            let mut h = combine(iteration + 1, ids[i]);
            for (bond, neighbour) in env {
                h = combine(h, bond);
                h = combine(h, neighbour);
            }
            next[i] = h;
            bits[bit_for(h, n_bits)] = 1;
        }
        ids = next;
    }

    bits
}
