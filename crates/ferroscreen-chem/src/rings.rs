//! Ring and aromaticity perception.
//!
//! Ring bonds are the non-bridge bonds of the graph. For every ring bond the
//! shortest cycle through it is collected; duplicates are removed. Kekulé
//! five- and six-membered rings are flagged aromatic when their pi electron
//! count satisfies 4n+2, repeating until fused systems stop changing.

use std::collections::{HashSet, VecDeque};

use crate::molecule::{BondOrder, Molecule};
use crate::smiles::SmilesError;

pub fn perceive(mol: &mut Molecule) -> Result<(), SmilesError> {
    let bridges = find_bridges(mol);
    for (i, bond) in mol.bonds.iter_mut().enumerate() {
        bond.in_ring = !bridges[i];
    }
    for atom in mol.atoms.iter_mut() {
        atom.in_ring = false;
    }
    for i in 0..mol.bonds.len() {
        if mol.bonds[i].in_ring {
            let (a, b) = (mol.bonds[i].a, mol.bonds[i].b);
            mol.atoms[a].in_ring = true;
            mol.atoms[b].in_ring = true;
        }
    }

    if let Some(idx) = mol.atoms.iter().position(|a| a.aromatic && !a.in_ring) {
        return Err(SmilesError::NonRingAromatic(idx));
    }

    mol.rings = smallest_cycles(mol);
    perceive_aromaticity(mol);
    Ok(())
}

/// Tarjan bridge detection. `true` marks a bridge (acyclic) bond.
fn find_bridges(mol: &Molecule) -> Vec<bool> {
    let n = mol.atoms.len();
    let mut bridge = vec![false; mol.bonds.len()];
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        // (atom, bond used to enter, next adjacency position)
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        disc[root] = timer;
        low[root] = timer;
        timer += 1;

        while let Some(top) = stack.last_mut() {
            let (atom, via) = (top.0, top.1);
            if top.2 < mol.adjacency[atom].len() {
                let (nb, bond) = mol.adjacency[atom][top.2];
                top.2 += 1;
                if Some(bond) == via {
                    continue;
                }
                if disc[nb] == usize::MAX {
                    disc[nb] = timer;
                    low[nb] = timer;
                    timer += 1;
                    stack.push((nb, Some(bond), 0));
                } else {
                    low[atom] = low[atom].min(disc[nb]);
                }
            } else {
                stack.pop();
                if let (Some(bond), Some(&(parent, _, _))) = (via, stack.last()) {
                    low[parent] = low[parent].min(low[atom]);
                    if low[atom] > disc[parent] {
                        bridge[bond] = true;
                    }
                }
            }
        }
    }
    bridge
}

/// Shortest cycle through each ring bond, deduplicated and sorted by size.
/// Each cycle lists atoms in ring order.
fn smallest_cycles(mol: &Molecule) -> Vec<Vec<usize>> {
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut cycles = Vec::new();

    for (bi, bond) in mol.bonds.iter().enumerate() {
        if !bond.in_ring {
            continue;
        }
        let Some(path) = shortest_path_avoiding(mol, bond.a, bond.b, bi) else {
            continue;
        };
        let mut key = path.clone();
        key.sort_unstable();
        if seen.insert(key) {
            cycles.push(path);
        }
    }

    cycles.sort_by_key(|c| c.len());
    cycles
}

fn shortest_path_avoiding(mol: &Molecule, from: usize, to: usize, skip: usize) -> Option<Vec<usize>> {
    let mut parent = vec![usize::MAX; mol.atoms.len()];
    let mut queue = VecDeque::new();
    parent[from] = from;
    queue.push_back(from);

    while let Some(a) = queue.pop_front() {
        if a == to {
            break;
        }
        for &(n, bi) in &mol.adjacency[a] {
            if bi == skip || !mol.bonds[bi].in_ring || parent[n] != usize::MAX {
                continue;
            }
            parent[n] = a;
            queue.push_back(n);
        }
    }

    if parent[to] == usize::MAX {
        return None;
    }
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        cur = parent[cur];
        path.push(cur);
    }
    Some(path)
}

fn perceive_aromaticity(mol: &mut Molecule) {
    loop {
        let mut changed = false;
        for r in 0..mol.rings.len() {
            let ring = mol.rings[r].clone();
            if !(5..=6).contains(&ring.len()) || ring.iter().all(|&a| mol.atoms[a].aromatic) {
                continue;
            }
            let electrons: Option<u32> = ring.iter().map(|&a| pi_electrons(mol, a, &ring)).sum();
            if matches!(electrons, Some(e) if e % 4 == 2) {
                mark_aromatic(mol, &ring);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Pi electrons `atom` donates to `ring`; `None` if it breaks conjugation.
fn pi_electrons(mol: &Molecule, atom: usize, ring: &[usize]) -> Option<u32> {
    let a = &mol.atoms[atom];

    let ring_double = mol
        .neighbors(atom)
        .any(|(n, b)| b.order == BondOrder::Double && ring.contains(&n));
    if ring_double {
        return Some(1);
    }

    if a.aromatic {
        return Some(match a.atomic_number() {
            6 => match a.charge {
                c if c < 0 => 2,
                c if c > 0 => 0,
                _ => 1,
            },
            7 | 15 => {
                if a.hydrogens > 0 || mol.heavy_degree(atom) == 3 {
                    2
                } else {
                    1
                }
            }
            _ => 2,
        });
    }

    let exo_double = mol
        .neighbors(atom)
        .find(|(n, b)| b.order == BondOrder::Double && !ring.contains(n));
    if let Some((n, _)) = exo_double {
        return if a.is_carbon() && mol.atoms[n].is_hetero() { Some(0) } else { None };
    }

    let saturated = mol
        .neighbors(atom)
        .all(|(_, b)| b.order == BondOrder::Single);
    if !saturated {
        return None;
    }

    match (a.atomic_number(), a.charge) {
        (7, 0) | (15, 0) if mol.connectivity(atom) == 3 => Some(2),
        (8, 0) | (16, 0) | (34, 0) | (52, 0) if mol.connectivity(atom) == 2 => Some(2),
        (6, c) if c < 0 => Some(2),
        (6, c) if c > 0 => Some(0),
        _ => None,
    }
}

fn mark_aromatic(mol: &mut Molecule, ring: &[usize]) {
    for &a in ring {
        mol.atoms[a].aromatic = true;
    }
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
        if let Some(&(_, bi)) = mol.adjacency[a].iter().find(|&&(n, _)| n == b) {
            mol.bonds[bi].order = BondOrder::Aromatic;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::smiles::parse_smiles;

    #[test]
    fn test_ring_flags_on_substituted_ring() {
        let mol = parse_smiles("CC1CCCCC1").unwrap();
        assert!(!mol.atoms[0].in_ring);
        assert!(mol.atoms[1..].iter().all(|a| a.in_ring));
        assert_eq!(mol.rings.len(), 1);
        assert_eq!(mol.rings[0].len(), 6);
        assert!(!mol.bonds[0].in_ring);
    }

    #[test]
    fn test_fused_rings() {
        let naphthalene = parse_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(naphthalene.rings.len(), 2);
        assert!(naphthalene.rings.iter().all(|r| r.len() == 6));
    }

    #[test]
    fn test_kekule_naphthalene_fully_aromatic() {
        let mol = parse_smiles("C1=CC=C2C=CC=CC2=C1").unwrap();
        assert!(mol.atoms.iter().all(|a| a.aromatic));
    }

    #[test]
    fn test_non_aromatic_rings() {
        let cyclohexene = parse_smiles("C1=CCCCC1").unwrap();
        assert!(cyclohexene.atoms.iter().all(|a| !a.aromatic));

        let quinone = parse_smiles("O=C1C=CC(=O)C=C1").unwrap();
        assert!(quinone.atoms.iter().all(|a| !a.aromatic));
    }

    #[test]
    fn test_kekule_heteroaromatics() {
        let furan = parse_smiles("C1=COC=C1").unwrap();
        assert!(furan.atoms.iter().all(|a| a.aromatic));

        let pyridine = parse_smiles("C1=CC=NC=C1").unwrap();
        assert!(pyridine.atoms.iter().all(|a| a.aromatic));
    }

    #[test]
    fn test_acyclic_has_no_rings() {
        let mol = parse_smiles("CCCCCC").unwrap();
        assert!(mol.rings.is_empty());
        assert!(mol.bonds.iter().all(|b| !b.in_ring));
    }
}
