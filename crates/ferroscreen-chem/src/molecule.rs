//! Molecular graph produced by the SMILES parser.

use crate::element::Element;

/// Bond multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to an atom's valence. Aromatic bonds count as 1; the
    /// extra half-bond of an aromatic atom is added per atom, not per bond.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    /// Small integer code used when hashing bond environments.
    pub fn code(self) -> u32 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Aromatic => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Total attached hydrogens (explicit bracket count or implicit).
    pub hydrogens: u8,
    /// Written inside `[...]`.
    pub bracket: bool,
    pub in_ring: bool,
}

impl Atom {
    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }

    pub fn symbol(&self) -> &'static str {
        self.element.symbol
    }

    pub fn is(&self, symbol: &str) -> bool {
        self.element.symbol == symbol
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.atomic_number == 1
    }

    pub fn is_carbon(&self) -> bool {
        self.element.atomic_number == 6
    }

    /// Any heavy atom other than carbon.
    pub fn is_hetero(&self) -> bool {
        !self.is_carbon() && !self.is_hydrogen()
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self.element.atomic_number, 9 | 17 | 35 | 53 | 85)
    }

    /// Mass of the atom itself, isotope-aware, without hydrogens.
    pub fn mass(&self) -> f64 {
        match self.isotope {
            Some(a) => a as f64,
            None => self.element.monoisotopic_mass,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
    pub in_ring: bool,
}

impl Bond {
    pub fn other(&self, atom: usize) -> usize {
        if self.a == atom { self.b } else { self.a }
    }
}

/// Heavy-atom graph with hydrogens folded into their parent atoms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// Per atom: `(neighbour, bond index)`.
    pub adjacency: Vec<Vec<(usize, usize)>>,
    /// Smallest rings found during perception, as atom index cycles.
    pub rings: Vec<Vec<usize>>,
}

impl Molecule {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.adjacency[atom].iter().map(move |&(n, b)| (n, &self.bonds[b]))
    }

    /// Number of non-hydrogen neighbours.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .filter(|&&(n, _)| !self.atoms[n].is_hydrogen())
            .count()
    }

    /// Hydrogens on `atom`, counting both folded and explicit `[H]` neighbours.
    pub fn total_hydrogens(&self, atom: usize) -> usize {
        let explicit = self.adjacency[atom]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].is_hydrogen())
            .count();
        self.atoms[atom].hydrogens as usize + explicit
    }

    /// Total connections (explicit neighbours plus folded hydrogens), the
    /// SMARTS `X` primitive.
    pub fn connectivity(&self, atom: usize) -> usize {
        self.adjacency[atom].len() + self.atoms[atom].hydrogens as usize
    }

    /// Sum of bond valences plus hydrogens, the SMARTS `v` primitive.
    /// Aromatic bonds count 1.5.
    pub fn valence(&self, atom: usize) -> f64 {
        let bonds: f64 = self
            .neighbors(atom)
            .map(|(_, b)| match b.order {
                BondOrder::Aromatic => 1.5,
                o => o.valence() as f64,
            })
            .sum();
        bonds + self.atoms[atom].hydrogens as f64
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bi)| &self.bonds[bi])
    }

    /// Whether `atom` carries a bond of `order` to a neighbour satisfying `pred`.
    pub fn has_bond_to<F>(&self, atom: usize, order: BondOrder, pred: F) -> bool
    where
        F: Fn(&Atom) -> bool,
    {
        self.neighbors(atom)
            .any(|(n, b)| b.order == order && pred(&self.atoms[n]))
    }

    pub fn heavy_atom_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.atoms.len()).filter(move |&i| !self.atoms[i].is_hydrogen())
    }

    /// Number of disconnected components (`.`-separated fragments).
    pub fn fragment_count(&self) -> usize {
        let mut seen = vec![false; self.atoms.len()];
        let mut fragments = 0;
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            fragments += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(a) = stack.pop() {
                for &(n, _) in &self.adjacency[a] {
                    if !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
        fragments
    }

    /// Topological distances (bond counts) from `start`; `None` = unreachable.
    pub fn distances_from(&self, start: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.atoms.len()];
        let mut queue = std::collections::VecDeque::new();
        dist[start] = Some(0);
        queue.push_back(start);
        while let Some(a) = queue.pop_front() {
            let d = dist[a].unwrap_or(0);
            for &(n, _) in &self.adjacency[a] {
                if dist[n].is_none() {
                    dist[n] = Some(d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    /// Ring sizes that contain `atom`.
    pub fn ring_sizes_of(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.rings.iter().filter(move |r| r.contains(&atom)).map(|r| r.len())
    }
}
