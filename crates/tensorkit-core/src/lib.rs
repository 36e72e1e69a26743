pub mod artifact;
pub mod backend;
pub mod dims;
pub mod error;
pub mod labels;
pub mod spec;
pub mod tensor;
pub mod topk;

pub use artifact::*;
pub use backend::*;
pub use dims::*;
pub use error::*;
pub use labels::*;
pub use spec::*;
pub use tensor::*;
pub use topk::*;
