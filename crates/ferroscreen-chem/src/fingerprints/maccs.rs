//! MACCS 166 structural keys (167 bits, bit 0 unused).
//!
//! Keys are expressed with three small matchers over the heavy-atom graph:
//! linear chains of atom/bond predicates, "star" centres with a set of
//! distinct neighbours, and ring queries. Chain matches are counted once
//! per distinct atom set, which is what the `> n` count keys use.
//! Key 2 (atomic number > 103) never fires for supported elements.

use std::collections::HashSet;

use crate::molecule::{Bond, BondOrder, Molecule};

pub const MACCS_LEN: usize = 167;

type AtomPred = fn(&Molecule, usize) -> bool;
type BondPred = fn(&Bond) -> bool;

// ── Atom predicates ───────────────────────────────────────────────────────────

fn a(m: &Molecule, i: usize) -> bool { !m.atoms[i].is_hydrogen() }
fn q(m: &Molecule, i: usize) -> bool { m.atoms[i].is_hetero() }
fn qh(m: &Molecule, i: usize) -> bool { q(m, i) && m.total_hydrogens(i) > 0 }
fn c(m: &Molecule, i: usize) -> bool { m.atoms[i].is_carbon() }
fn n(m: &Molecule, i: usize) -> bool { m.atoms[i].atomic_number() == 7 }
fn o(m: &Molecule, i: usize) -> bool { m.atoms[i].atomic_number() == 8 }
fn s(m: &Molecule, i: usize) -> bool { m.atoms[i].atomic_number() == 16 }
fn x(m: &Molecule, i: usize) -> bool { m.atoms[i].is_halogen() }
fn ch2(m: &Molecule, i: usize) -> bool { c(m, i) && m.total_hydrogens(i) == 2 }
fn ch3(m: &Molecule, i: usize) -> bool { c(m, i) && m.total_hydrogens(i) == 3 }

// ── Bond predicates ───────────────────────────────────────────────────────────

fn any(_: &Bond) -> bool { true }
fn single(b: &Bond) -> bool { b.order == BondOrder::Single }
fn double(b: &Bond) -> bool { b.order == BondOrder::Double }
fn triple(b: &Bond) -> bool { b.order == BondOrder::Triple }
fn arom(b: &Bond) -> bool { b.order == BondOrder::Aromatic }
fn not_arom(b: &Bond) -> bool { b.order != BondOrder::Aromatic }
fn ring(b: &Bond) -> bool { b.in_ring }
fn chain_b(b: &Bond) -> bool { !b.in_ring }
fn ring_double(b: &Bond) -> bool { b.in_ring && b.order == BondOrder::Double }

// ── Matchers ──────────────────────────────────────────────────────────────────

/// Distinct atom sets matching `atoms[0] -bonds[0]- atoms[1] ...` as a simple path.
fn chain(m: &Molecule, atoms: &[AtomPred], bonds: &[BondPred]) -> usize {
    debug_assert_eq!(atoms.len(), bonds.len() + 1);
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut path = Vec::with_capacity(atoms.len());
    for start in 0..m.atom_count() {
        if atoms[0](m, start) {
            path.push(start);
            extend(m, atoms, bonds, &mut path, &mut seen);
            path.pop();
        }
    }
    seen.len()
}

fn extend(
    m: &Molecule,
    atoms: &[AtomPred],
    bonds: &[BondPred],
    path: &mut Vec<usize>,
    seen: &mut HashSet<Vec<usize>>,
) {
    let k = path.len();
    if k == atoms.len() {
        let mut key = path.clone();
        key.sort_unstable();
        seen.insert(key);
        return;
    }
    let last = path[k - 1];
    for (nb, bond) in m.neighbors(last) {
        if path.contains(&nb) || !bonds[k - 1](bond) || !atoms[k](m, nb) {
            continue;
        }
        path.push(nb);
        extend(m, atoms, bonds, path, seen);
        path.pop();
    }
}

/// Chain where every bond may be anything.
fn path(m: &Molecule, atoms: &[AtomPred]) -> usize {
    let bonds = vec![any as BondPred; atoms.len() - 1];
    chain(m, atoms, &bonds)
}

/// Number of atoms matching `centre` that have distinct neighbours
/// satisfying each `(bond, atom)` arm.
fn star(m: &Molecule, centre: AtomPred, arms: &[(BondPred, AtomPred)]) -> usize {
    (0..m.atom_count())
        .filter(|&i| centre(m, i) && assign(m, i, arms, &mut Vec::new()))
        .count()
}

fn assign(m: &Molecule, centre: usize, arms: &[(BondPred, AtomPred)], used: &mut Vec<usize>) -> bool {
    let Some(((bp, ap), rest)) = arms.split_first() else {
        return true;
    };
    for (nb, bond) in m.neighbors(centre) {
        if used.contains(&nb) || !bp(bond) || !ap(m, nb) {
            continue;
        }
        used.push(nb);
        if assign(m, centre, rest, used) {
            return true;
        }
        used.pop();
    }
    false
}

fn arms(preds: &[AtomPred]) -> Vec<(BondPred, AtomPred)> {
    preds.iter().map(|&p| (any as BondPred, p)).collect()
}

fn count_atoms(m: &Molecule, pred: AtomPred) -> usize {
    (0..m.atom_count()).filter(|&i| pred(m, i)).count()
}

fn has_element(m: &Molecule, numbers: &[u8]) -> bool {
    m.atoms.iter().any(|at| numbers.contains(&at.atomic_number()))
}

fn ring_count(m: &Molecule, size: impl Fn(usize) -> bool) -> usize {
    m.rings.iter().filter(|r| size(r.len())).count()
}

fn ring_with(m: &Molecule, size: usize, pred: AtomPred) -> bool {
    m.rings.iter().any(|r| r.len() == size && r.iter().any(|&i| pred(m, i)))
}

fn heterocycle(m: &Molecule, pred: AtomPred) -> bool {
    m.rings.iter().any(|r| r.iter().any(|&i| pred(m, i)))
}

// ── Keys ──────────────────────────────────────────────────────────────────────

pub fn encode(m: &Molecule) -> Vec<u8> {
    let mut bits = vec![0u8; MACCS_LEN];
    let mut set = |key: usize, on: bool| {
        if on {
            bits[key] = 1;
        }
    };

    let other = |mol: &Molecule, i: usize| {
        !matches!(mol.atoms[i].atomic_number(), 1 | 6 | 7 | 8 | 9 | 14 | 15 | 16 | 17 | 35 | 53)
    };

    set(1, m.atoms.iter().any(|at| at.isotope.is_some()));
    set(3, has_element(m, &[32, 33, 34, 50, 51, 52, 82, 83, 84]));
    set(4, m.atoms.iter().any(|at| (89..=103).contains(&at.atomic_number())));
    set(5, has_element(m, &[21, 22, 39, 40, 72]));
    set(6, m.atoms.iter().any(|at| (57..=71).contains(&at.atomic_number())));
    set(7, has_element(m, &[23, 24, 25, 41, 42, 43, 73, 74, 75]));
    set(8, ring_with(m, 4, q));
    set(9, has_element(m, &[26, 27, 28, 44, 45, 46, 76, 77, 78]));
    set(10, has_element(m, &[4, 12, 20, 38, 56, 88]));
    set(11, ring_count(m, |l| l == 4) > 0);
    set(12, has_element(m, &[29, 30, 47, 48, 79, 80]));
    set(13, star(m, n, &arms(&[o, c, c])) > 0);
    set(14, chain(m, &[s, s], &[single]) > 0);
    set(15, star(m, c, &arms(&[o, o, o])) > 0);
    set(16, ring_with(m, 3, q));
    set(17, chain(m, &[c, c], &[triple]) > 0);
    set(18, has_element(m, &[5, 13, 31, 49, 81]));
    set(19, ring_count(m, |l| l == 7) > 0);
    set(20, has_element(m, &[14]));
    set(21, star(m, c, &[(double, c), (any, q), (any, q)]) > 0);
    set(22, ring_count(m, |l| l == 3) > 0);
    set(23, star(m, c, &arms(&[n, o, o])) > 0);
    set(24, chain(m, &[n, o], &[single]) > 0);
    set(25, star(m, c, &arms(&[n, n, n])) > 0);
    set(26, star(m, c, &[(ring_double, c), (ring, a), (ring, a)]) > 0);
    set(27, has_element(m, &[53]));
    set(28, star(m, ch2, &arms(&[q, q])) > 0);
    set(29, has_element(m, &[15]));
    set(30, star(m, q, &arms(&[c, c, c, a])) > 0);
    set(31, path(m, &[q, x]) > 0);
    set(32, path(m, &[c, s, n]) > 0);
    set(33, path(m, &[n, s]) > 0);
    set(34, chain(m, &[ch2, a], &[double]) > 0);
    set(35, has_element(m, &[3, 11, 19, 37, 55, 87]));
    set(36, heterocycle(m, s));
    set(37, star(m, c, &arms(&[n, o, n])) > 0);
    set(38, star(m, c, &arms(&[n, c, n])) > 0);
    set(39, star(m, s, &arms(&[o, o, o])) > 0);
    set(40, chain(m, &[s, o], &[single]) > 0);
    set(41, chain(m, &[c, n], &[triple]) > 0);
    set(42, has_element(m, &[9]));
    set(43, path(m, &[qh, a, qh]) > 0);
    set(44, count_atoms(m, other) > 0);
    set(45, chain(m, &[c, c, n], &[double, any]) > 0);
    set(46, has_element(m, &[35]));
    set(47, path(m, &[s, a, n]) > 0);
    set(48, star(m, q, &arms(&[o, o, o])) > 0);
    set(49, m.atoms.iter().any(|at| at.charge != 0));
    set(50, star(m, c, &[(double, c), (any, c), (any, c)]) > 0);
    set(51, path(m, &[c, s, o]) > 0);
    set(52, path(m, &[n, n]) > 0);
    set(53, path(m, &[qh, a, a, a, qh]) > 0);
    set(54, path(m, &[qh, a, a, qh]) > 0);
    set(55, path(m, &[o, s, o]) > 0);
    set(56, star(m, n, &arms(&[o, o, c])) > 0);
    set(57, heterocycle(m, o));
    set(58, path(m, &[q, s, q]) > 0);
    set(59, chain(m, &[s, a, a], &[not_arom, arom]) > 0);
    set(60, chain(m, &[s, o], &[double]) > 0);
    set(61, star(m, s, &arms(&[a, a, a])) > 0);
    set(62, chain(m, &[a, a, a, a], &[ring, chain_b, ring]) > 0);
    set(63, chain(m, &[n, o], &[double]) > 0);
    set(64, chain(m, &[a, a, s], &[ring, chain_b]) > 0);
    set(65, chain(m, &[c, n], &[arom]) > 0);
    set(66, star(m, c, &arms(&[c, c, c, a])) > 0);
    set(67, path(m, &[q, s]) > 0);
    set(68, path(m, &[qh, qh]) > 0);
    set(69, path(m, &[q, qh]) > 0);
    set(70, path(m, &[q, n, q]) > 0);
    set(71, path(m, &[n, o]) > 0);
    set(72, path(m, &[o, a, a, o]) > 0);
    set(73, chain(m, &[s, a], &[double]) > 0);
    set(74, path(m, &[ch3, a, ch3]) > 0);
    set(75, chain(m, &[a, n, a], &[chain_b, ring]) > 0);
    set(76, star(m, c, &[(double, c), (any, a), (any, a)]) > 0);
    set(77, path(m, &[n, a, n]) > 0);
    set(78, chain(m, &[c, n], &[double]) > 0);
    set(79, path(m, &[n, a, a, n]) > 0);
    set(80, path(m, &[n, a, a, a, n]) > 0);
    set(81, star(m, a, &arms(&[s, a, a])) > 0);
    set(82, path(m, &[a, ch2, qh]) > 0);
    set(83, ring_with(m, 5, q));
    set(84, m.atoms.iter().enumerate().any(|(i, at)| at.atomic_number() == 7 && m.total_hydrogens(i) == 2));
    set(85, star(m, n, &arms(&[c, c, c])) > 0);
    set(86, path(m, &[ch2, q, ch2]) > 0);
    set(87, chain(m, &[x, a, a], &[chain_b, ring]) > 0);
    set(88, has_element(m, &[16]));
    set(89, path(m, &[o, a, a, a, o]) > 0);
    set(90, path(m, &[qh, a, a, ch2, a]) > 0);
    set(91, path(m, &[qh, a, a, a, ch2, a]) > 0);
    set(92, star(m, c, &arms(&[o, n, c])) > 0);
    set(93, path(m, &[q, ch3]) > 0);
    set(94, path(m, &[q, n]) > 0);
    set(95, path(m, &[n, a, a, o]) > 0);
    set(96, ring_count(m, |l| l == 5) > 0);
    set(97, path(m, &[n, a, a, a, o]) > 0);
    set(98, ring_with(m, 6, q));
    set(99, chain(m, &[c, c], &[double]) > 0);
    set(100, path(m, &[a, ch2, n]) > 0);
    set(101, ring_count(m, |l| l >= 8) > 0);
    set(102, path(m, &[q, o]) > 0);
    set(103, has_element(m, &[17]));
    set(104, path(m, &[qh, a, ch2, a]) > 0);
    set(105, star(m, a, &[(ring, a), (ring, a), (ring, a)]) > 0);
    set(106, star(m, a, &arms(&[q, q, q])) > 0);
    set(107, star(m, a, &arms(&[x, a, a])) > 0);
    set(108, path(m, &[ch3, a, a, a, ch2, a]) > 0);
    set(109, path(m, &[a, ch2, o]) > 0);
    set(110, path(m, &[n, c, o]) > 0);
    set(111, path(m, &[n, a, ch2, a]) > 0);
    set(112, star(m, a, &arms(&[a, a, a, a])) > 0);
    set(113, chain(m, &[o, a, a], &[not_arom, arom]) > 0);
    set(114, path(m, &[ch3, ch2, a]) > 0);
    set(115, path(m, &[ch3, a, ch2, a]) > 0);
    set(116, path(m, &[ch3, a, a, ch2, a]) > 0);
    set(117, path(m, &[n, a, o]) > 0);
    set(118, path(m, &[a, ch2, ch2, a]) > 1);
    set(119, chain(m, &[n, a], &[double]) > 0);
    set(120, (0..m.atom_count()).filter(|&i| m.atoms[i].in_ring && q(m, i)).count() > 1);
    set(121, heterocycle(m, n));
    set(122, star(m, n, &arms(&[a, a, a])) > 0);
    set(123, path(m, &[o, c, o]) > 0);
    set(124, path(m, &[q, q]) > 0);
    set(125, m.rings.iter().filter(|r| r.iter().all(|&i| m.atoms[i].aromatic)).count() > 1);
    set(126, chain(m, &[a, o, a], &[chain_b, chain_b]) > 0);
    set(127, chain(m, &[a, a, o], &[ring, chain_b]) > 1);
    set(128, path(m, &[a, ch2, a, a, a, ch2, a]) > 0);
    set(129, path(m, &[a, ch2, a, a, ch2, a]) > 0);
    set(130, path(m, &[q, q]) > 1);
    set(131, count_atoms(m, qh) > 1);
    set(132, path(m, &[o, a, ch2, a]) > 0);
    set(133, chain(m, &[a, a, n], &[ring, chain_b]) > 0);
    set(134, count_atoms(m, x) > 0);
    set(135, chain(m, &[n, a, a], &[not_arom, arom]) > 0);
    set(136, chain(m, &[o, a], &[double]) > 1);
    set(137, heterocycle(m, q));
    set(138, path(m, &[q, ch2, a]) > 1);
    set(139, m.atoms.iter().enumerate().any(|(i, at)| at.atomic_number() == 8 && m.total_hydrogens(i) > 0));
    set(140, count_atoms(m, o) > 3);
    set(141, count_atoms(m, ch3) > 2);
    set(142, count_atoms(m, n) > 1);
    set(143, chain(m, &[a, a, o], &[ring, chain_b]) > 0);
    set(144, chain(m, &[a, a, a, a], &[not_arom, arom, not_arom]) > 0);
    set(145, ring_count(m, |l| l == 6) > 1);
    set(146, count_atoms(m, o) > 2);
    set(147, path(m, &[a, ch2, ch2, a]) > 0);
    set(148, star(m, q, &arms(&[a, a, a])) > 0);
    set(149, count_atoms(m, ch3) > 1);
    set(150, chain(m, &[a, a, a, a], &[chain_b, ring, chain_b]) > 0);
    set(151, m.atoms.iter().enumerate().any(|(i, at)| at.atomic_number() == 7 && m.total_hydrogens(i) > 0));
    set(152, star(m, c, &arms(&[o, c, c])) > 0);
    set(153, path(m, &[q, ch2, a]) > 0);
    set(154, chain(m, &[c, o], &[double]) > 0);
    set(155, chain(m, &[a, ch2, a], &[chain_b, chain_b]) > 0);
    set(156, star(m, a, &arms(&[n, a, a])) > 0);
    set(157, chain(m, &[c, o], &[single]) > 0);
    set(158, chain(m, &[c, n], &[single]) > 0);
    set(159, count_atoms(m, o) > 1);
    set(160, count_atoms(m, ch3) > 0);
    set(161, count_atoms(m, n) > 0);
    set(162, m.atoms.iter().any(|at| at.aromatic));
    set(163, ring_count(m, |l| l == 6) > 0);
    set(164, count_atoms(m, o) > 0);
    set(165, !m.rings.is_empty());
    set(166, m.fragment_count() > 1);

    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn keys(smiles: &str) -> Vec<usize> {
        encode(&parse_smiles(smiles).unwrap())
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == 1)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_length_and_unused_bit_zero() {
        let fp = encode(&parse_smiles("c1ccccc1O").unwrap());
        assert_eq!(fp.len(), MACCS_LEN);
        assert_eq!(fp[0], 0);
    }

    #[test]
    fn test_phenol_keys() {
        let k = keys("Oc1ccccc1");
        for key in [139, 162, 163, 164, 165] {
            assert!(k.contains(&key), "missing key {key}");
        }
        assert!(!k.contains(&161)); // no nitrogen
        assert!(!k.contains(&166)); // single fragment
    }

    #[test]
    fn test_ethanol_keys() {
        let k = keys("CCO");
        assert!(k.contains(&157)); // C-O
        assert!(k.contains(&160)); // CH3
        assert!(k.contains(&139)); // OH
        assert!(!k.contains(&165)); // no ring
    }

    #[test]
    fn test_salt_and_halogen_keys() {
        let k = keys("CC(=O)[O-].[Na+]");
        assert!(k.contains(&35)); // group IA
        assert!(k.contains(&49)); // charge
        assert!(k.contains(&154)); // C=O
        assert!(k.contains(&166)); // fragments

        let k = keys("ClC(Cl)Cl");
        assert!(k.contains(&103));
        assert!(k.contains(&134));
        assert!(k.contains(&107));
    }
}
