use bytes::Bytes;
use std::fmt::Debug;

use ort::{
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session, SessionInputValue,
    },
    tensor::{PrimitiveTensorElementType, TensorElementType},
    value::{DynValue, ValueRef, ValueType},
};
use tensorkit_core::{
    Backend, BackendGraph, BackendSession, DType, Device, Error, GraphSource, IOName, ModelSpec,
    OptimizationLevel, Result, SessionOptions, Shape, Tensor, TensorSpec,
};
use tracing::{debug, error};

pub struct OrtBackend;

impl OrtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed ONNX graph. Sessions are committed from the retained bytes.
pub struct OrtGraph {
    origin: String,
    bytes: Vec<u8>,
    spec: ModelSpec,
}

impl OrtGraph {
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

pub struct OrtSession {
    spec: ModelSpec,
    session: Session,
    input_names: Vec<String>,
    device: Device,
}

impl OrtSession {
    pub fn device(&self) -> Device {
        self.device
    }
}

/// Wraps runtime errors with context, logging them on the way out.
trait RuntimeContext<T> {
    fn runtime_context<F: FnOnce() -> String>(self, context: F) -> Result<T>;
}

impl<T> RuntimeContext<T> for ort::Result<T> {
    fn runtime_context<F: FnOnce() -> String>(self, context: F) -> Result<T> {
        self.map_err(|e| {
            let err = Error::runtime(context(), e);
            error!("{err}");
            err
        })
    }
}

fn logged(err: Error) -> Error {
    error!("{err}");
    err
}

impl Backend for OrtBackend {
    type Graph = OrtGraph;
    type Session = OrtSession;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load_graph(&self, source: &GraphSource) -> Result<Self::Graph> {
        let origin = source.describe();
        let bytes = match source {
            GraphSource::Path(path) => std::fs::read(path).map_err(|e| logged(Error::io(path, e)))?,
            GraphSource::Bytes(bytes) => bytes.clone(),
        };

        // Parsed once here so a corrupt graph fails at load, not at create_session.
        let context = || format!("error loading graph {origin}");
        let parsed = Session::builder()
            .runtime_context(context)?
            .with_optimization_level(GraphOptimizationLevel::Disable)
            .runtime_context(context)?
            .commit_from_memory(&bytes)
            .runtime_context(context)?;
        let spec = build_model_spec(&parsed).map_err(logged)?;

        debug!(
            graph = %origin,
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            "loaded graph"
        );
        Ok(OrtGraph {
            origin,
            bytes,
            spec,
        })
    }

    fn create_session(
        &self,
        graph: &Self::Graph,
        device: &str,
        options: &SessionOptions,
    ) -> Result<Self::Session> {
        let device: Device = device.parse().map_err(logged)?;
        let context = || format!("error creating session for graph {}", graph.origin);

        let mut builder = Session::builder()
            .runtime_context(context)?
            .with_optimization_level(optimization_level(options.optimization))
            .runtime_context(context)?;
        if let Some(threads) = options.intra_threads {
            builder = builder.with_intra_threads(threads).runtime_context(context)?;
        }
        let builder = place_on_device(builder, device).map_err(logged)?;

        let session = builder
            .commit_from_memory(&graph.bytes)
            .runtime_context(context)?;

        let input_names = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();

        debug!(graph = %graph.origin, %device, "created session");
        Ok(OrtSession {
            spec: graph.spec.clone(),
            session,
            input_names,
            device,
        })
    }
}

impl BackendGraph for OrtGraph {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }
}

impl BackendSession for OrtSession {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn run(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        if inputs.len() != self.input_names.len() {
            return Err(Error::invalid_argument(format!(
                "expected {} inputs, got {}",
                self.input_names.len(),
                inputs.len()
            )));
        }

        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, input) in self.input_names.iter().zip(inputs) {
            let value = to_ort_input(input)?;
            ort_inputs.push((name.clone(), SessionInputValue::from(value)));
        }

        let outputs = self
            .session
            .run(ort_inputs)
            .runtime_context(|| "session run failed".to_string())?;
        let mut out_tensors = Vec::with_capacity(outputs.len());
        for (_, value) in outputs.iter() {
            out_tensors.push(from_ort_output(&value)?);
        }

        Ok(out_tensors)
    }
}

fn optimization_level(level: OptimizationLevel) -> GraphOptimizationLevel {
    match level {
        OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
        OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
        OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
        OptimizationLevel::All => GraphOptimizationLevel::Level3,
    }
}

fn place_on_device(builder: SessionBuilder, device: Device) -> Result<SessionBuilder> {
    match device {
        Device::Cpu => Ok(builder),
        #[cfg(feature = "cuda")]
        Device::Cuda { device_id } => {
            use ort::execution_providers::CUDAExecutionProvider;
            let ep = CUDAExecutionProvider::default()
                .with_device_id(device_id as i32)
                .build();
            builder
                .with_execution_providers([ep])
                .runtime_context(|| format!("failed to enable CUDA provider on {device}"))
        }
        #[cfg(not(feature = "cuda"))]
        Device::Cuda { .. } => Err(Error::invalid_argument(format!(
            "{device} requested but tensorkit-backend-ort was built without the `cuda` feature"
        ))),
    }
}

/// Element types the runtime and [`DType`] both understand.
const ELEMENT_TYPES: [(TensorElementType, DType); 5] = [
    (TensorElementType::Float32, DType::F32),
    (TensorElementType::Float16, DType::F16),
    (TensorElementType::Int64, DType::I64),
    (TensorElementType::Int32, DType::I32),
    (TensorElementType::Uint8, DType::U8),
];

fn dtype_of(ty: TensorElementType) -> Result<DType> {
    ELEMENT_TYPES
        .iter()
        .find(|(known, _)| *known == ty)
        .map(|&(_, dtype)| dtype)
        .ok_or_else(|| Error::invalid_argument(format!("unsupported tensor element type: {ty}")))
}

fn build_model_spec(session: &Session) -> Result<ModelSpec> {
    let inputs = session
        .inputs
        .iter()
        .map(|input| io_spec(&input.name, &input.input_type))
        .collect::<Result<Vec<_>>>()?;
    let outputs = session
        .outputs
        .iter()
        .map(|output| io_spec(&output.name, &output.output_type))
        .collect::<Result<Vec<_>>>()?;
    Ok(ModelSpec { inputs, outputs })
}

/// Negative runtime dims are symbolic and come back as `None`.
fn io_spec(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    match value_type {
        ValueType::Tensor { ty, shape, .. } => Ok(TensorSpec {
            name: IOName(name.to_owned()),
            dtype: dtype_of(*ty)?,
            rank: shape.len(),
            dims: shape.iter().map(|&d| usize::try_from(d).ok()).collect(),
        }),
        other => Err(Error::invalid_argument(format!(
            "{name}: only tensor inputs and outputs are supported, found {other:?}"
        ))),
    }
}

fn to_ort_input(tensor: Tensor) -> Result<DynValue> {
    let expected = tensor.shape().numel() * tensor.dtype().byte_size();
    if tensor.byte_len() != expected {
        return Err(Error::invalid_argument(format!(
            "input of shape {} holds {} bytes, expected {expected}",
            tensor.shape(),
            tensor.byte_len()
        )));
    }

    let shape = tensor.shape().dims().to_vec();
    match tensor.dtype() {
        DType::F32 => owned_value(shape, tensor.to_f32_vec()?),
        DType::I64 => owned_value(shape, decode_le(&tensor.bytes, i64::from_le_bytes)),
        DType::I32 => owned_value(shape, decode_le(&tensor.bytes, i32::from_le_bytes)),
        DType::U8 => owned_value(shape, tensor.bytes.to_vec()),
        DType::F16 => Err(Error::invalid_argument("f16 inputs are not supported yet")),
    }
}

fn owned_value<T>(shape: Vec<usize>, data: Vec<T>) -> Result<DynValue>
where
    T: PrimitiveTensorElementType + Debug + Clone + 'static,
{
    let value = ort::value::Tensor::from_array((shape, data))
        .runtime_context(|| "failed to build input tensor".to_string())?;
    Ok(value.into_dyn())
}

fn from_ort_output(value: &ValueRef<'_>) -> Result<Tensor> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        return Err(Error::invalid_argument("non-tensor outputs are not supported"));
    };

    let dtype = dtype_of(*ty)?;
    let shape = Shape(shape.iter().map(|&d| usize::try_from(d).unwrap_or(0)).collect());
    let bytes = match dtype {
        DType::F32 => extract_le(value, f32::to_le_bytes)?,
        DType::I64 => extract_le(value, i64::to_le_bytes)?,
        DType::I32 => extract_le(value, i32::to_le_bytes)?,
        DType::U8 => extract_le(value, u8::to_le_bytes)?,
        DType::F16 => return Err(Error::invalid_argument("f16 outputs are not supported yet")),
    };
    Ok(Tensor::from_cpu_bytes(dtype, shape, bytes))
}

fn extract_le<T, const N: usize>(value: &ValueRef<'_>, to_le: fn(T) -> [u8; N]) -> Result<Bytes>
where
    T: PrimitiveTensorElementType + Copy,
{
    let array = value
        .try_extract_array::<T>()
        .runtime_context(|| "failed to extract output tensor".to_string())?;
    let slice = array
        .as_slice()
        .ok_or_else(|| Error::invalid_argument("non-contiguous output tensor"))?;
    Ok(encode_le(slice, to_le))
}

fn decode_le<T, const N: usize>(bytes: &Bytes, from_le: fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|b| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(b);
            from_le(buf)
        })
        .collect()
}

fn encode_le<T: Copy, const N: usize>(slice: &[T], to_le: fn(T) -> [u8; N]) -> Bytes {
    slice.iter().flat_map(|&v| to_le(v)).collect::<Vec<u8>>().into()
}
