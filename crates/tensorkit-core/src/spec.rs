use crate::{DType, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: DType,
    pub rank: usize,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    /// Concrete shape with every dynamic axis set to `dynamic`.
    pub fn concrete_shape(&self, dynamic: usize) -> Shape {
        let dims: Vec<usize> = self.dims.iter().map(|d| d.unwrap_or(dynamic)).collect();
        Shape::from_slice(&dims)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}
