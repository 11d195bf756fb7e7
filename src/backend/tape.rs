//! Reverse-mode differentiation on a recorded graph.
//!
//! Gradients of a real loss `L` with respect to a complex array `z` are
//! stored as `dL/dRe(z) + i dL/dIm(z)`. Under that convention the adjoint
//! of the centered FFT is its inverse, a product passes the gradient times
//! the conjugate of the other factor, and conjugation conjugates.

use super::Backend;
use crate::error::{CurveletError, Result};
use crate::fourier::Fourier2d;
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

enum Op {
    Leaf,
    Fft2 { input: GradTensor, fourier: Fourier2d },
    Ifft2 { input: GradTensor, fourier: Fourier2d },
    Mul(GradTensor, GradTensor),
    Conj(GradTensor),
    Scale(GradTensor, f64),
    Add(GradTensor, GradTensor),
    Sum(GradTensor),
    SquaredNorm(GradTensor),
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "leaf",
            Op::Fft2 { .. } => "fft2",
            Op::Ifft2 { .. } => "ifft2",
            Op::Mul(..) => "mul",
            Op::Conj(_) => "conj",
            Op::Scale(..) => "scale",
            Op::Add(..) => "add",
            Op::Sum(_) => "sum",
            Op::SquaredNorm(_) => "squared_norm",
        }
    }

    fn parents(&self) -> Vec<GradTensor> {
        match self {
            Op::Leaf => Vec::new(),
            Op::Fft2 { input, .. } | Op::Ifft2 { input, .. } => vec![input.clone()],
            Op::Conj(x) | Op::Scale(x, _) | Op::Sum(x) | Op::SquaredNorm(x) => vec![x.clone()],
            Op::Mul(a, b) | Op::Add(a, b) => vec![a.clone(), b.clone()],
        }
    }

    /// Gradient contributions to each parent given the output gradient.
    fn backward(&self, grad: &Array2<Complex64>) -> Result<Vec<(GradTensor, Array2<Complex64>)>> {
        Ok(match self {
            Op::Leaf => Vec::new(),
            Op::Fft2 { input, fourier } => vec![(input.clone(), fourier.inverse(&grad.view())?)],
            Op::Ifft2 { input, fourier } => vec![(input.clone(), fourier.forward(&grad.view())?)],
            Op::Mul(a, b) => {
                let ga = grad * &b.0.borrow().value.mapv(|v| v.conj());
                let gb = grad * &a.0.borrow().value.mapv(|v| v.conj());
                vec![(a.clone(), ga), (b.clone(), gb)]
            }
            Op::Conj(x) => vec![(x.clone(), grad.mapv(|v| v.conj()))],
            Op::Scale(x, factor) => vec![(x.clone(), grad * Complex64::new(*factor, 0.0))],
            Op::Add(a, b) => vec![(a.clone(), grad.clone()), (b.clone(), grad.clone())],
            Op::Sum(x) => {
                let g = Array2::from_elem(x.dim(), grad[[0, 0]]);
                vec![(x.clone(), g)]
            }
            Op::SquaredNorm(x) => {
                let seed = 2.0 * grad[[0, 0]].re;
                let g = x.0.borrow().value.mapv(|v| v * seed);
                vec![(x.clone(), g)]
            }
        })
    }
}

struct Node {
    value: Array2<Complex64>,
    grad: Option<Array2<Complex64>>,
    requires_grad: bool,
    op: Op,
}

/// A complex 2D array that records how it was computed.
///
/// Cloning shares the node. Not thread safe.
#[derive(Clone)]
pub struct GradTensor(Rc<RefCell<Node>>);

impl fmt::Debug for GradTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        f.debug_struct("GradTensor")
            .field("dim", &node.value.dim())
            .field("op", &node.op.name())
            .field("requires_grad", &node.requires_grad)
            .finish()
    }
}

impl GradTensor {
    fn from_node(value: Array2<Complex64>, requires_grad: bool, op: Op) -> Self {
        GradTensor(Rc::new(RefCell::new(Node {
            value,
            grad: None,
            requires_grad,
            op,
        })))
    }

    fn from_op(value: Array2<Complex64>, op: Op) -> Self {
        let requires_grad = op.parents().iter().any(GradTensor::requires_grad);
        Self::from_node(value, requires_grad, op)
    }

    /// A leaf whose gradient is tracked.
    pub fn variable(value: Array2<Complex64>) -> Self {
        Self::from_node(value, true, Op::Leaf)
    }

    pub fn constant(value: Array2<Complex64>) -> Self {
        Self::from_node(value, false, Op::Leaf)
    }

    fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn value(&self) -> Array2<Complex64> {
        self.0.borrow().value.clone()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.0.borrow().value.dim()
    }

    pub fn requires_grad(&self) -> bool {
        self.0.borrow().requires_grad
    }

    /// Accumulated gradient, if a backward pass reached this tensor.
    pub fn grad(&self) -> Option<Array2<Complex64>> {
        self.0.borrow().grad.clone()
    }

    pub fn zero_grad(&self) {
        self.0.borrow_mut().grad = None;
    }

    /// Sum of all entries as a 1x1 tensor.
    pub fn sum(&self) -> GradTensor {
        let total = self.0.borrow().value.sum();
        Self::from_op(Array2::from_elem((1, 1), total), Op::Sum(self.clone()))
    }

    /// `sum(|z|^2)` as a real 1x1 tensor; the usual scalar loss.
    pub fn squared_norm(&self) -> GradTensor {
        let total: f64 = self.0.borrow().value.iter().map(|v| v.norm_sqr()).sum();
        Self::from_op(
            Array2::from_elem((1, 1), Complex64::new(total, 0.0)),
            Op::SquaredNorm(self.clone()),
        )
    }

    /// First entry; the loss value of a 1x1 tensor.
    pub fn item(&self) -> Complex64 {
        self.0.borrow().value[[0, 0]]
    }

    /// Backpropagates a unit seed, i.e. the gradient of `sum(Re(self))`.
    pub fn backward(&self) -> Result<()> {
        let seed = Array2::from_elem(self.dim(), Complex64::new(1.0, 0.0));
        self.backward_with_grad(seed)
    }

    pub fn backward_with_grad(&self, grad: Array2<Complex64>) -> Result<()> {
        CurveletError::check_shape("seed gradient", self.dim(), grad.dim())?;

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        fn collect(t: &GradTensor, order: &mut Vec<GradTensor>, visited: &mut HashSet<usize>) {
            if !visited.insert(t.key()) {
                return;
            }
            let parents = t.0.borrow().op.parents();
            for parent in &parents {
                collect(parent, order, visited);
            }
            order.push(t.clone());
        }
        collect(self, &mut order, &mut visited);

        let mut pending: HashMap<usize, Array2<Complex64>> = HashMap::new();
        pending.insert(self.key(), grad);
        for tensor in order.iter().rev() {
            let Some(grad) = pending.remove(&tensor.key()) else {
                continue;
            };
            if !tensor.requires_grad() {
                continue;
            }
            let contributions = tensor.0.borrow().op.backward(&grad)?;
            tensor.accumulate(grad);
            for (parent, g) in contributions {
                if parent.requires_grad() {
                    pending
                        .entry(parent.key())
                        .and_modify(|acc| *acc += &g)
                        .or_insert(g);
                }
            }
        }
        Ok(())
    }

    fn accumulate(&self, g: Array2<Complex64>) {
        let mut node = self.0.borrow_mut();
        match node.grad.as_mut() {
            Some(existing) => *existing += &g,
            None => node.grad = Some(g),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TapeBackend;

impl Backend for TapeBackend {
    type Array = GradTensor;

    fn name(&self) -> &'static str {
        "tape"
    }

    fn lift(&self, x: &ArrayView2<Complex64>) -> GradTensor {
        GradTensor::constant(x.to_owned())
    }

    fn dim(&self, x: &GradTensor) -> (usize, usize) {
        x.dim()
    }

    fn fft2(&self, fourier: &Fourier2d, x: &GradTensor) -> Result<GradTensor> {
        let value = fourier.forward(&x.0.borrow().value.view())?;
        Ok(GradTensor::from_op(
            value,
            Op::Fft2 {
                input: x.clone(),
                fourier: fourier.clone(),
            },
        ))
    }

    fn ifft2(&self, fourier: &Fourier2d, x: &GradTensor) -> Result<GradTensor> {
        let value = fourier.inverse(&x.0.borrow().value.view())?;
        Ok(GradTensor::from_op(
            value,
            Op::Ifft2 {
                input: x.clone(),
                fourier: fourier.clone(),
            },
        ))
    }

    fn mul(&self, a: &GradTensor, b: &GradTensor) -> GradTensor {
        let value = &a.0.borrow().value * &b.0.borrow().value;
        GradTensor::from_op(value, Op::Mul(a.clone(), b.clone()))
    }

    fn conj(&self, x: &GradTensor) -> GradTensor {
        let value = x.0.borrow().value.mapv(|v| v.conj());
        GradTensor::from_op(value, Op::Conj(x.clone()))
    }

    fn scale(&self, x: &GradTensor, factor: f64) -> GradTensor {
        let value = &x.0.borrow().value * Complex64::new(factor, 0.0);
        GradTensor::from_op(value, Op::Scale(x.clone(), factor))
    }

    fn add(&self, a: &GradTensor, b: &GradTensor) -> GradTensor {
        let value = &a.0.borrow().value + &b.0.borrow().value;
        GradTensor::from_op(value, Op::Add(a.clone(), b.clone()))
    }

    fn primal(&self, x: &GradTensor) -> Array2<Complex64> {
        x.value()
    }
}
