use crate::prelude::*;

type Node = Arc<Mutex<TensorBase>>;

pub struct TensorBase {
    data: DynArray,
    requires_grad: bool,
    depends_on: Option<GradFn>,
    grad: Option<DynArray>,
}

impl TensorBase {
    fn leaf(data: DynArray) -> Self {
        Self {
            data,
            requires_grad: false,
            depends_on: None,
            grad: None,
        }
    }

    fn tracks_grad(&self) -> bool {
        self.requires_grad || self.depends_on.is_some()
    }

    fn accumulate(&mut self, back: DynArray) {
        self.grad = Some(match self.grad.take() {
            Some(grad) => grad + &back,
            None => back,
        });
    }
}

/// A shared handle to an n-dimensional `f32` array that records the
/// operations applied to it, so gradients can flow back with [`Tensor::backward`].
///
/// Cloning a `Tensor` clones the handle, not the data.
#[derive(Clone)]
pub struct Tensor(Node);

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.0.lock().unwrap();
        match base.depends_on.as_ref() {
            Some(dep) => write!(f, "Tensor({:?}, grad_fn=<{}>)", base.data, dep),
            None if base.requires_grad => write!(f, "Tensor({:?}, requires_grad=true)", base.data),
            None => write!(f, "Tensor({:?})", base.data),
        }
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let base = self.0.lock().unwrap();
        match base.depends_on.as_ref() {
            Some(dep) => write!(f, "Tensor({}, grad_fn=<{}>)", base.data, dep),
            None if base.requires_grad => write!(f, "Tensor({}, requires_grad=true)", base.data),
            None => write!(f, "Tensor({})", base.data),
        }
    }
}

pub trait ToDynArray {
    fn into_dyn(self) -> DynArray;
}

macro_rules! to_dyn_array {
    ($($ty:ty),+) => {$(
        impl ToDynArray for $ty {
            fn into_dyn(self) -> DynArray {
                self.into_dyn()
            }
        }
    )*};
}

to_dyn_array!(Array1<f32>, Array2<f32>, DynArray);

impl ToDynArray for Vec<f32> {
    fn into_dyn(self) -> DynArray {
        Array::from_vec(self).into_dyn()
    }
}

impl Tensor {
    pub fn new<T: ToDynArray>(data: T) -> Self {
        Self(Arc::new(Mutex::new(TensorBase::leaf(data.into_dyn()))))
    }

    /// Result of an operation. The graph edge is only kept when recording is
    /// enabled and at least one parent takes part in differentiation.
    fn from_op(data: DynArray, grad_fn: GradFn) -> Self {
        let tracked = grad_enabled()
            && grad_fn
                .parents()
                .iter()
                .any(|parent| parent.lock().unwrap().tracks_grad());
        let mut base = TensorBase::leaf(data);
        if tracked {
            base.depends_on = Some(grad_fn);
        }
        Self(Arc::new(Mutex::new(base)))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(DynArray::zeros(shape))
    }

    pub fn requires_grad(&self, boolean: bool) -> Self {
        self.0.lock().unwrap().requires_grad = boolean;
        self.clone()
    }

    pub fn detach(&self) -> Self {
        Self::new(self.data())
    }

    pub fn shape(&self) -> Vec<usize> {
        self.0.lock().unwrap().data.shape().into()
    }

    /// Copy of the underlying array.
    pub fn data(&self) -> DynArray {
        self.0.lock().unwrap().data.clone()
    }

    /// The single value held by a one-element tensor, such as a loss.
    pub fn item(&self) -> f32 {
        let base = self.0.lock().unwrap();
        assert_eq!(
            base.data.len(),
            1,
            "item() called on a tensor of shape {:?}",
            base.data.shape()
        );
        base.data.iter().copied().sum()
    }

    pub fn grad(&self) -> Option<Tensor> {
        self.0.lock().unwrap().grad.clone().map(Tensor::new)
    }

    pub fn zero_grad(&self) {
        self.0.lock().unwrap().grad = None;
    }

    /// Backpropagates from this tensor, seeding it with ones.
    ///
    /// Nodes are visited in reverse topological order, so a tensor reached
    /// through several paths receives the sum of all contributions before it
    /// passes its gradient on. The recorded graph is released afterwards.
    pub fn backward(&self) {
        assert!(
            self.0.lock().unwrap().depends_on.is_some(),
            "tensor doesn't have a grad_fn"
        );

        let mut order = Vec::new();
        topological_order(&self.0, &mut HashSet::new(), &mut order);

        {
            let mut base = self.0.lock().unwrap();
            let seed = DynArray::ones(base.data.raw_dim());
            base.accumulate(seed);
        }

        for node in order.iter().rev() {
            let (grad_fn, back) = {
                let mut base = node.lock().unwrap();
                (base.depends_on.take(), base.grad.clone())
            };
            if let (Some(grad_fn), Some(back)) = (grad_fn, back) {
                grad_fn.backward(&back);
            }
        }
    }

    pub fn dot(&self, rhs: &Tensor) -> Self {
        let lhs_data = self.data();
        let rhs_data = rhs.data();
        let data = matrix(&lhs_data).dot(&matrix(&rhs_data)).into_dyn();
        Self::from_op(data, GradFn::Dot(self.0.clone(), rhs.0.clone()))
    }

    pub fn pow(&self, num: f32) -> Self {
        let data = self.data().mapv(|v| v.powf(num));
        Self::from_op(data, GradFn::Pow(num, self.0.clone()))
    }

    pub fn mean(&self) -> Self {
        let data = self.data();
        let mean = data.mean().unwrap_or(f32::NAN);
        Self::from_op(arr0(mean).into_dyn(), GradFn::Mean(self.0.clone()))
    }

    pub fn relu(&self) -> Self {
        let data = self.data().mapv(|v| v.max(0.0));
        Self::from_op(data, GradFn::Relu(self.0.clone()))
    }
}

impl TensorOptimize for Tensor {
    fn optimize(&self, delta: Tensor) {
        let delta = delta.data();
        let mut base = self.0.lock().unwrap();
        let updated = &base.data - &delta;
        base.data = updated;
    }
}

fn topological_order(node: &Node, visited: &mut HashSet<*const Mutex<TensorBase>>, order: &mut Vec<Node>) {
    if !visited.insert(Arc::as_ptr(node)) {
        return;
    }
    let parents: Vec<Node> = match node.lock().unwrap().depends_on {
        Some(ref grad_fn) => grad_fn.parents().into_iter().cloned().collect(),
        None => Vec::new(),
    };
    for parent in &parents {
        topological_order(parent, visited, order);
    }
    order.push(node.clone());
}

fn matrix(data: &DynArray) -> ArrayView2<'_, f32> {
    match data.view().into_dimensionality::<Ix2>() {
        Ok(view) => view,
        Err(_) => panic!("dot expects 2-d operands, got shape {:?}", data.shape()),
    }
}

/// Sums a broadcast gradient back down to the shape of the operand it flows into.
fn unbroadcast(mut grad: DynArray, shape: &[usize]) -> DynArray {
    while grad.ndim() > shape.len() {
        grad = grad.sum_axis(Axis(0));
    }
    for (axis, &dim) in shape.iter().enumerate() {
        if dim == 1 && grad.shape()[axis] != 1 {
            grad = grad.sum_axis(Axis(axis)).insert_axis(Axis(axis));
        }
    }
    grad
}

fn send_back(node: &Node, back: DynArray) {
    let mut base = node.lock().unwrap();
    if base.tracks_grad() {
        let back = unbroadcast(back, base.data.shape());
        base.accumulate(back);
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $variant:ident, $op:tt) => {
        impl $trait<&Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, rhs: &Tensor) -> Tensor {
                let data = &self.data() $op &rhs.data();
                Tensor::from_op(data, GradFn::$variant(self.0.clone(), rhs.0.clone()))
            }
        }

        impl $trait<Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, rhs: Tensor) -> Tensor {
                &self $op &rhs
            }
        }

        impl $trait<&Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, rhs: &Tensor) -> Tensor {
                &self $op rhs
            }
        }

        impl $trait<Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, rhs: Tensor) -> Tensor {
                self $op &rhs
            }
        }
    };
}

binary_op!(Add, add, Add, +);
binary_op!(Sub, sub, Sub, -);
binary_op!(Mul, mul, Mul, *);

impl Mul<f32> for &Tensor {
    type Output = Tensor;

    fn mul(self, rhs: f32) -> Tensor {
        let data = self.data() * rhs;
        Tensor::from_op(data, GradFn::MulN(rhs, self.0.clone()))
    }
}

impl Mul<f32> for Tensor {
    type Output = Tensor;

    fn mul(self, rhs: f32) -> Tensor {
        &self * rhs
    }
}

pub enum GradFn {
    Add(Node, Node),
    Sub(Node, Node),
    Mul(Node, Node),
    MulN(f32, Node),
    Dot(Node, Node),
    Pow(f32, Node),
    Mean(Node),
    Relu(Node),
}

impl GradFn {
    fn parents(&self) -> Vec<&Node> {
        use GradFn::*;
        match self {
            Add(a, b) | Sub(a, b) | Mul(a, b) | Dot(a, b) => vec![a, b],
            MulN(_, a) | Pow(_, a) | Mean(a) | Relu(a) => vec![a],
        }
    }

    fn backward(&self, back: &DynArray) {
        use GradFn::*;
        match self {
            Add(lhs, rhs) => {
                send_back(lhs, back.clone());
                send_back(rhs, back.clone());
            }
            Sub(lhs, rhs) => {
                send_back(lhs, back.clone());
                send_back(rhs, -back.clone());
            }
            Mul(lhs, rhs) => {
                let lhs_data = lhs.lock().unwrap().data.clone();
                let rhs_data = rhs.lock().unwrap().data.clone();
                send_back(lhs, back * &rhs_data);
                send_back(rhs, back * &lhs_data);
            }
            MulN(number, tensor) => send_back(tensor, back * *number),
            Dot(lhs, rhs) => {
                let lhs_data = lhs.lock().unwrap().data.clone();
                let rhs_data = rhs.lock().unwrap().data.clone();
                let back = matrix(back);
                send_back(lhs, back.dot(&matrix(&rhs_data).t()).into_dyn());
                send_back(rhs, matrix(&lhs_data).t().dot(&back).into_dyn());
            }
            Pow(number, tensor) => {
                let data = tensor.lock().unwrap().data.clone();
                send_back(tensor, data.mapv(|v| *number * v.powf(*number - 1.0)) * back);
            }
            Mean(tensor) => {
                let shape = tensor.lock().unwrap().data.raw_dim();
                let num = shape.size() as f32;
                send_back(tensor, DynArray::from_elem(shape, 1.0 / num) * back);
            }
            Relu(tensor) => {
                let mask = tensor
                    .lock()
                    .unwrap()
                    .data
                    .mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
                send_back(tensor, mask * back);
            }
        }
    }
}

impl fmt::Display for GradFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use GradFn::*;
        match self {
            Add(_, _) => write!(f, "AddBackward"),
            Sub(_, _) => write!(f, "SubBackward"),
            Mul(_, _) | MulN(_, _) => write!(f, "MulBackward"),
            Dot(_, _) => write!(f, "DotBackward"),
            Pow(_, _) => write!(f, "PowBackward"),
            Mean(_) => write!(f, "MeanBackward"),
            Relu(_) => write!(f, "ReluBackward"),
        }
    }
}
