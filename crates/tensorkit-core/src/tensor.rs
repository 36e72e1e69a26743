use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use smallvec::SmallVec;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

impl FromStr for Device {
    type Err = Error;

    /// Accepts `cpu`, `cuda:N`, `gpu:N` and the `/device:GPU:N` / `/gpu:N`
    /// placement strings. An empty string selects the CPU.
    fn from_str(raw: &str) -> Result<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        let s = lowered
            .strip_prefix("/device:")
            .or_else(|| lowered.strip_prefix('/'))
            .unwrap_or(&lowered);

        if s.is_empty() || s == "cpu" || s.starts_with("cpu:") {
            return Ok(Device::Cpu);
        }

        if let Some(rest) = s.strip_prefix("cuda:").or_else(|| s.strip_prefix("gpu:")) {
            let device_id: u32 = rest.parse().map_err(|_| {
                Error::invalid_argument(format!("invalid cuda device id in {raw:?}"))
            })?;
            return Ok(Device::Cuda { device_id });
        }

        Err(Error::invalid_argument(format!(
            "unsupported device: {raw} (expected cpu or cuda:N)"
        )))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda { device_id } => write!(f, "cuda:{device_id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::U8 => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    /// Size of axis `axis`, or `None` past the last axis.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.0.get(axis).copied()
    }
    pub fn dims(&self) -> &[usize] {
        &self.0
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str("]")
    }
}

#[derive(Clone, Debug)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
    pub device: Device,
}

/// A dense, row-major tensor whose elements live in little-endian CPU bytes.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            desc: TensorDesc {
                dtype,
                shape,
                device: Device::Cpu,
            },
            bytes,
        }
    }

    pub fn from_f32(shape: Shape, data: &[f32]) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(Error::invalid_argument(format!(
                "f32 data has {} elements, shape {shape} needs {}",
                data.len(),
                shape.numel()
            )));
        }
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();
        Ok(Self::from_cpu_bytes(DType::F32, shape, Bytes::from(bytes)))
    }

    /// A tensor of `dtype` with every byte zeroed.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        let len = shape.numel() * dtype.byte_size();
        Self::from_cpu_bytes(dtype, shape, Bytes::from(vec![0u8; len]))
    }

    pub fn dtype(&self) -> DType {
        self.desc.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.desc.shape
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Decodes the elements as `f32`, widening integer dtypes.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>> {
        let size = self.desc.dtype.byte_size();
        if !self.bytes.len().is_multiple_of(size) {
            return Err(Error::invalid_argument(format!(
                "{:?} tensor has invalid byte length {}",
                self.desc.dtype,
                self.bytes.len()
            )));
        }
        let chunks = self.bytes.chunks_exact(size);
        let values: Vec<f32> = match self.desc.dtype {
            DType::F32 => chunks
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            DType::I64 => chunks
                .map(|b| {
                    i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32
                })
                .collect(),
            DType::I32 => chunks
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32)
                .collect(),
            DType::U8 => self.bytes.iter().map(|&b| f32::from(b)).collect(),
            DType::F16 => {
                return Err(Error::invalid_argument(
                    "f16 tensors cannot be decoded yet",
                ))
            }
        };
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_strings() {
        assert_eq!("".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("/cpu:0".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!(
            "cuda:1".parse::<Device>().unwrap(),
            Device::Cuda { device_id: 1 }
        );
        assert_eq!(
            "/device:GPU:2".parse::<Device>().unwrap(),
            Device::Cuda { device_id: 2 }
        );
        assert_eq!(
            "/gpu:0".parse::<Device>().unwrap(),
            Device::Cuda { device_id: 0 }
        );
        assert!("tpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn shape_accessors() {
        let shape = Shape::from_slice(&[1, 224, 224, 3]);
        assert_eq!(shape.rank(), 4);
        assert_eq!(shape.dim(3), Some(3));
        assert_eq!(shape.dim(4), None);
        assert_eq!(shape.numel(), 224 * 224 * 3);
        assert_eq!(shape.to_string(), "[1, 224, 224, 3]");
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
    }

    #[test]
    fn f32_roundtrip_through_bytes() {
        let data = [0.5f32, -1.0, 3.25, 8.0];
        let t = Tensor::from_f32(Shape::from_slice(&[2, 2]), &data).unwrap();
        assert_eq!(t.byte_len(), 16);
        assert_eq!(t.to_f32_vec().unwrap(), data);
    }

    #[test]
    fn from_f32_rejects_wrong_length() {
        assert!(Tensor::from_f32(Shape::from_slice(&[3]), &[1.0, 2.0]).is_err());
    }

    #[test]
    fn integer_tensors_widen() {
        let bytes: Vec<u8> = [3i64, -2].iter().flat_map(|v| v.to_le_bytes()).collect();
        let t = Tensor::from_cpu_bytes(DType::I64, Shape::from_slice(&[2]), Bytes::from(bytes));
        assert_eq!(t.to_f32_vec().unwrap(), vec![3.0, -2.0]);

        let t = Tensor::zeros(DType::U8, Shape::from_slice(&[2, 3]));
        assert_eq!(t.to_f32_vec().unwrap(), vec![0.0; 6]);
    }
}
