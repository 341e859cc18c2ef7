//! Hashed linear-path (Daylight-like) fingerprint.
//!
//! Enumerates every simple bond path of 1 to `max_path` bonds. A path is
//! hashed from its atom and bond labels read in both directions, keeping the
//! smaller value, and sets two bits.

use std::collections::HashSet;

use crate::molecule::Molecule;

use super::hashing::{bit_for, combine, hash_values};

fn atom_label(mol: &Molecule, atom: usize) -> u32 {
    let a = &mol.atoms[atom];
    ((a.atomic_number() as u32) << 1) | a.aromatic as u32
}

fn path_hash(labels: &[u32], bonds: &[u32]) -> u32 {
    let mut h = hash_values(&[bonds.len() as u32, labels[0]]);
    for (bond, label) in bonds.iter().zip(&labels[1..]) {
        h = combine(h, *bond);
        h = combine(h, *label);
    }
    h
}

pub fn encode(mol: &Molecule, max_path: usize, n_bits: usize) -> Vec<u8> {
    let mut bits = vec![0u8; n_bits];
    let mut seen: HashSet<Vec<usize>> = HashSet::new();

    for start in mol.heavy_atom_indices() {
        let mut atoms = vec![start];
        let mut bonds = Vec::new();
        walk(mol, max_path, &mut atoms, &mut bonds, &mut |atoms: &[usize], bonds: &[usize]| {
            let mut key = bonds.to_vec();
            key.sort_unstable();
            if !seen.insert(key) {
                return;
            }
            let labels: Vec<u32> = atoms.iter().map(|&a| atom_label(mol, a)).collect();
            let codes: Vec<u32> = bonds.iter().map(|&b| mol.bonds[b].order.code()).collect();
            let forward = path_hash(&labels, &codes);

            let rev_labels: Vec<u32> = labels.iter().rev().copied().collect();
            let rev_codes: Vec<u32> = codes.iter().rev().copied().collect();
            let backward = path_hash(&rev_labels, &rev_codes);

            let h = forward.min(backward);
            bits[bit_for(h, n_bits)] = 1;
            bits[bit_for(combine(h, 0x5bd1_e995), n_bits)] = 1;
        });
    }

    bits
}

fn walk<F>(mol: &Molecule, max_path: usize, atoms: &mut Vec<usize>, bonds: &mut Vec<usize>, emit: &mut F)
where
    F: FnMut(&[usize], &[usize]),
{
    if !bonds.is_empty() {
        emit(atoms, bonds);
    }
    if bonds.len() == max_path {
        return;
    }
    let last = atoms[atoms.len() - 1];
    for &(next, bond) in &mol.adjacency[last] {
        if mol.atoms[next].is_hydrogen() {
            continue;
        }
        // ring closure back onto the path start still forms a valid cycle path
        let closes_ring = atoms.len() > 2 && next == atoms[0] && !bonds.contains(&bond);
        if atoms.contains(&next) && !closes_ring {
            continue;
        }
        atoms.push(next);
        bonds.push(bond);
        if closes_ring {
            emit(atoms, bonds);
        } else {
            walk(mol, max_path, atoms, bonds, emit);
        }
        atoms.pop();
        bonds.pop();
    }
}
