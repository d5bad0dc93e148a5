use std::borrow::Borrow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use anyhow::Result;
use rustfst::semirings::{ReverseBack, Semiring, SemiringProperties};

/// Two-dimensional lattice cost: graph (LM + pronunciation + transition)
/// and acoustic, both as negative log-likelihoods.
///
/// `⊗` adds component-wise; `⊕` keeps the better weight, comparing
/// `graph + acoustic` first and `graph - acoustic` to break ties. Zero is
/// `(inf, inf)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LatticeWeight {
    pub graph: f32,
    pub acoustic: f32,
}

impl LatticeWeight {
    pub const fn new(graph: f32, acoustic: f32) -> Self {
        Self { graph, acoustic }
    }

    /// Combined cost `graph + acoustic`.
    pub fn cost(&self) -> f32 {
        self.graph + self.acoustic
    }

    /// True when either component is `+inf`.
    pub fn is_infinite(&self) -> bool {
        self.graph == f32::INFINITY || self.acoustic == f32::INFINITY
    }

    fn compare(&self, other: &Self) -> Ordering {
        let cost = |w: &Self| f64::from(w.graph) + f64::from(w.acoustic);
        let diff = |w: &Self| f64::from(w.graph) - f64::from(w.acoustic);
        cost(self)
            .total_cmp(&cost(other))
            .then_with(|| diff(self).total_cmp(&diff(other)))
    }
}

impl Eq for LatticeWeight {}

impl Hash for LatticeWeight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph.to_bits().hash(state);
        self.acoustic.to_bits().hash(state);
    }
}

impl Semiring for LatticeWeight {
    type Type = LatticeWeight;
    type ReverseWeight = LatticeWeight;

    fn zero() -> Self {
        Self::new(f32::INFINITY, f32::INFINITY)
    }

    fn one() -> Self {
        Self::new(0.0, 0.0)
    }

    fn new(value: Self::Type) -> Self {
        value
    }

    fn plus_assign<P: Borrow<Self>>(&mut self, rhs: P) -> Result<()> {
        let rhs = rhs.borrow();
        if rhs.compare(self) == Ordering::Less {
            *self = *rhs;
        }
        Ok(())
    }

    fn times_assign<P: Borrow<Self>>(&mut self, rhs: P) -> Result<()> {
        let rhs = rhs.borrow();
        if self.is_infinite() || rhs.is_infinite() {
            *self = Self::zero();
        } else {
            self.graph += rhs.graph;
            self.acoustic += rhs.acoustic;
        }
        Ok(())
    }

    fn approx_equal<P: Borrow<Self>>(&self, rhs: P, delta: f32) -> bool {
        let rhs = rhs.borrow();
        if self.is_infinite() || rhs.is_infinite() {
            return self.is_infinite() && rhs.is_infinite();
        }
        (self.graph - rhs.graph).abs() <= delta && (self.acoustic - rhs.acoustic).abs() <= delta
    }

    fn value(&self) -> &Self::Type {
        self
    }

    fn take_value(self) -> Self::Type {
        self
    }

    fn set_value(&mut self, value: Self::Type) {
        *self = value;
    }

    fn is_zero(&self) -> bool {
        self.is_infinite()
    }

    fn reverse(&self) -> Result<Self::ReverseWeight> {
        Ok(*self)
    }

    fn properties() -> SemiringProperties {
        SemiringProperties::LEFT_SEMIRING
            | SemiringProperties::RIGHT_SEMIRING
            | SemiringProperties::COMMUTATIVE
            | SemiringProperties::IDEMPOTENT
            | SemiringProperties::PATH
    }
}

impl ReverseBack<LatticeWeight> for LatticeWeight {
    fn reverse_back(&self) -> Result<LatticeWeight> {
        Ok(*self)
    }
}

/// Lattice weight plus the frame alignment (transition ids) of the arc.
///
/// `⊗` concatenates alignments, so it is not commutative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd)]
pub struct CompactLatticeWeight {
    pub weight: LatticeWeight,
    pub alignment: Vec<u32>,
}

impl CompactLatticeWeight {
    pub fn new(graph: f32, acoustic: f32) -> Self {
        Self {
            weight: LatticeWeight::new(graph, acoustic),
            alignment: Vec::new(),
        }
    }

    pub fn with_alignment(mut self, alignment: Vec<u32>) -> Self {
        self.alignment = alignment;
        self
    }
}

impl Semiring for CompactLatticeWeight {
    type Type = CompactLatticeWeight;
    type ReverseWeight = CompactLatticeWeight;

    fn zero() -> Self {
        Self {
            weight: LatticeWeight::zero(),
            alignment: Vec::new(),
        }
    }

    fn one() -> Self {
        Self {
            weight: LatticeWeight::one(),
            alignment: Vec::new(),
        }
    }

    fn new(value: Self::Type) -> Self {
        value
    }

    fn plus_assign<P: Borrow<Self>>(&mut self, rhs: P) -> Result<()> {
        let rhs = rhs.borrow();
        let take_rhs = match rhs.weight.compare(&self.weight) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => rhs.alignment.len() < self.alignment.len(),
        };
        if take_rhs {
            self.clone_from(rhs);
        }
        Ok(())
    }

    fn times_assign<P: Borrow<Self>>(&mut self, rhs: P) -> Result<()> {
        let rhs = rhs.borrow();
        self.weight.times_assign(rhs.weight)?;
        if self.weight.is_zero() {
            self.weight = LatticeWeight::zero();
            self.alignment.clear();
        } else {
            self.alignment.extend_from_slice(&rhs.alignment);
        }
        Ok(())
    }

    fn approx_equal<P: Borrow<Self>>(&self, rhs: P, delta: f32) -> bool {
        let rhs = rhs.borrow();
        self.weight.approx_equal(rhs.weight, delta) && self.alignment == rhs.alignment
    }

    fn value(&self) -> &Self::Type {
        self
    }

    fn take_value(self) -> Self::Type {
        self
    }

    fn set_value(&mut self, value: Self::Type) {
        *self = value;
    }

    fn is_zero(&self) -> bool {
        self.weight.is_zero()
    }

    fn reverse(&self) -> Result<Self::ReverseWeight> {
        let mut reversed = self.clone();
        reversed.alignment.reverse();
        Ok(reversed)
    }

    fn properties() -> SemiringProperties {
        SemiringProperties::LEFT_SEMIRING
            | SemiringProperties::RIGHT_SEMIRING
            | SemiringProperties::IDEMPOTENT
            | SemiringProperties::PATH
    }
}

impl ReverseBack<CompactLatticeWeight> for CompactLatticeWeight {
    fn reverse_back(&self) -> Result<CompactLatticeWeight> {
        self.reverse()
    }
}
