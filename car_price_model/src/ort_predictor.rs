use crate::{
    config::{ModelConfig, OptimizationLevel},
    error::ModelError,
    predictor::Predictor,
    record::{FeatureRow, FeatureValue},
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    tensor::TensorElementType,
    value::{DynValue, Tensor, ValueType},
};
use std::{fmt, sync::Mutex};

/// Element type of a declared model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Int64,
    Int32,
    Float32,
    Float64,
    Text,
}

impl InputKind {
    fn from_element_type(ty: TensorElementType) -> Option<Self> {
        match ty {
            TensorElementType::Int64 => Some(Self::Int64),
            TensorElementType::Int32 => Some(Self::Int32),
            TensorElementType::Float32 => Some(Self::Float32),
            TensorElementType::Float64 => Some(Self::Float64),
            TensorElementType::String => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Int64 => "int64",
            InputKind::Int32 => "int32",
            InputKind::Float32 => "float32",
            InputKind::Float64 => "float64",
            InputKind::Text => "string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Float32,
    Float64,
}

/// A declared input. `rank` is 1 for a `[N]` column and 2 for `[N, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub name: String,
    pub kind: OutputKind,
}

/// What a loaded model declares: its inputs and the numeric output read as
/// the prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub inputs: Vec<InputSpec>,
    pub output: OutputSpec,
}

impl fmt::Display for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<String> = self
            .inputs
            .iter()
            .map(|input| format!("{}:{}", input.name, input.kind.as_str()))
            .collect();
        write!(f, "({}) -> {}", inputs.join(", "), self.output.name)
    }
}

/// Largest integer magnitudes a float32 and a float64 hold exactly.
const F32_EXACT_INT: i64 = 1 << 24;
const F64_EXACT_INT: i64 = 1 << 53;

/// A single cell, converted from a feature value to the element type the
/// model declares.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    I64(i64),
    I32(i32),
    F32(f32),
    F64(f64),
    Text(String),
}

impl Cell {
    fn convert(input: &InputSpec, value: &FeatureValue) -> Result<Self, ModelError> {
        let cell = match (input.kind, value) {
            (InputKind::Int64, FeatureValue::Int(v)) => Cell::I64(*v),
            (InputKind::Int32, FeatureValue::Int(v)) => {
                Cell::I32(i32::try_from(*v).map_err(|_| {
                    ModelError::SchemaMismatch(format!(
                        "field `{}` value {} does not fit the model's int32 input",
                        input.name, v
                    ))
                })?)
            }
            (InputKind::Float32, FeatureValue::Int(v)) => {
                Cell::F32(exact_int(input, *v, F32_EXACT_INT)? as f32)
            }
            (InputKind::Float64, FeatureValue::Int(v)) => {
                Cell::F64(exact_int(input, *v, F64_EXACT_INT)? as f64)
            }
            (InputKind::Float32, FeatureValue::Float(v)) => Cell::F32(*v as f32),
            (InputKind::Float64, FeatureValue::Float(v)) => Cell::F64(*v),
            (InputKind::Text, FeatureValue::Text(v)) => Cell::Text(v.clone()),
            (kind, value) => {
                return Err(ModelError::SchemaMismatch(format!(
                    "field `{}` is {} {} but the model expects {}",
                    input.name,
                    value.kind(),
                    value,
                    kind.as_str()
                )))
            }
        };
        Ok(cell)
    }

    /// Builds a one-row tensor of the given rank: `[1]` or `[1, 1]`.
    fn into_value(self, rank: usize) -> Result<DynValue, ort::Error> {
        let shape = vec![1_i64; rank];
        let value = match self {
            Cell::I64(v) => Tensor::from_array((shape, vec![v]))?.into_dyn(),
            Cell::I32(v) => Tensor::from_array((shape, vec![v]))?.into_dyn(),
            Cell::F32(v) => Tensor::from_array((shape, vec![v]))?.into_dyn(),
            Cell::F64(v) => Tensor::from_array((shape, vec![v]))?.into_dyn(),
            Cell::Text(v) => Tensor::from_string_array((shape, &[v][..]))?.into_dyn(),
        };
        Ok(value)
    }
}

fn exact_int(input: &InputSpec, value: i64, limit: i64) -> Result<i64, ModelError> {
    if value.unsigned_abs() > limit.unsigned_abs() {
        return Err(ModelError::SchemaMismatch(format!(
            "field `{}` value {} cannot be represented exactly by the model's {} input",
            input.name,
            value,
            input.kind.as_str()
        )));
    }
    Ok(value)
}

/// Rank of a one-row input: `[N]` gives 1, `[N, 1]` gives 2. Any other
/// layout cannot be filled from a single record.
fn input_rank(name: &str, shape: &[i64]) -> Result<usize, ModelError> {
    let row_dim_ok = |dim: i64| dim == -1 || dim == 1;
    match shape {
        [rows] if row_dim_ok(*rows) => Ok(1),
        [rows, 1] if row_dim_ok(*rows) => Ok(2),
        [rows, -1] if row_dim_ok(*rows) => Ok(2),
        _ => Err(ModelError::IncompatibleSchema(format!(
            "input `{}` has shape {:?}, expected [N] or [N, 1]",
            name, shape
        ))),
    }
}

fn graph_optimization_level(level: OptimizationLevel) -> GraphOptimizationLevel {
    match level {
        OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
        OptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        OptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        OptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
    }
}

fn inspect_schema(session: &Session) -> Result<ModelSchema, ModelError> {
    if session.inputs.is_empty() {
        return Err(ModelError::IncompatibleSchema(
            "model declares no inputs".to_string(),
        ));
    }

    let inputs = session
        .inputs
        .iter()
        .map(|input| {
            let unsupported = || {
                ModelError::IncompatibleSchema(format!(
                    "input `{}` has unsupported type {:?}",
                    input.name, input.input_type
                ))
            };
            let ValueType::Tensor { ty, shape, .. } = &input.input_type else {
                return Err(unsupported());
            };
            let kind = InputKind::from_element_type(*ty).ok_or_else(unsupported)?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            Ok(InputSpec {
                name: input.name.clone(),
                kind,
                rank: input_rank(&input.name, &dims)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let output = session
        .outputs
        .iter()
        .find_map(|output| {
            let kind = match output.output_type.tensor_type()? {
                TensorElementType::Float32 => OutputKind::Float32,
                TensorElementType::Float64 => OutputKind::Float64,
                _ => return None,
            };
            Some(OutputSpec {
                name: output.name.clone(),
                kind,
            })
        })
        .ok_or_else(|| {
            let declared: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
            ModelError::IncompatibleSchema(format!(
                "no float output among [{}]",
                declared.join(", ")
            ))
        })?;

    Ok(ModelSchema { inputs, output })
}

/// [`Predictor`] backed by an ONNX Runtime session.
pub struct OrtPredictor {
    session: Mutex<Session>,
    schema: ModelSchema,
}

impl OrtPredictor {
    pub fn from_bytes(bytes: &[u8], model_config: &ModelConfig) -> Result<Self, ModelError> {
        if bytes.is_empty() {
            return Err(ModelError::Deserialization(
                "model artifact is empty".to_string(),
            ));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Deserialization(format!("session builder: {}", e)))?
            .with_optimization_level(graph_optimization_level(model_config.optimization_level))
            .map_err(|e| ModelError::Deserialization(format!("optimization level: {}", e)))?
            .with_intra_threads(model_config.intra_threads)
            .map_err(|e| ModelError::Deserialization(format!("intra threads: {}", e)))?
            .commit_from_memory(bytes)
            .map_err(|e| ModelError::Deserialization(e.to_string()))?;

        let schema = inspect_schema(&session)?;
        tracing::info!(schema = %schema, "Model loaded");

        Ok(Self {
            session: Mutex::new(session),
            schema,
        })
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn build_inputs(&self, features: &FeatureRow) -> Result<Vec<(String, DynValue)>, ModelError> {
        let cells = self
            .schema
            .inputs
            .iter()
            .map(|input| {
                let value = features.get(&input.name).ok_or_else(|| {
                    ModelError::SchemaMismatch(format!("missing field `{}`", input.name))
                })?;
                Ok((input, Cell::convert(input, value)?))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        for name in features.names() {
            if !self.schema.inputs.iter().any(|input| input.name == name) {
                tracing::debug!("Ignoring field `{}` the model does not declare", name);
            }
        }

        cells
            .into_iter()
            .map(|(input, cell)| {
                let value = cell.into_value(input.rank).map_err(|e| {
                    ModelError::Inference(format!(
                        "failed to build tensor `{}`: {}",
                        input.name, e
                    ))
                })?;
                Ok((input.name.clone(), value))
            })
            .collect()
    }

    fn run_inference(&self, inputs: Vec<(String, DynValue)>) -> Result<f64, ModelError> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Inference(format!("session mutex poisoned: {}", e)))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let output_name = self.schema.output.name.as_str();
        let output = outputs.get(output_name).ok_or_else(|| {
            ModelError::Inference(format!("output `{}` missing from results", output_name))
        })?;

        let first = match self.schema.output.kind {
            OutputKind::Float32 => output
                .try_extract_tensor::<f32>()
                .map(|(_, data)| data.first().map(|v| *v as f64)),
            OutputKind::Float64 => output
                .try_extract_tensor::<f64>()
                .map(|(_, data)| data.first().copied()),
        }
        .map_err(|e| ModelError::Inference(format!("failed to extract tensor: {}", e)))?;

        first.ok_or_else(|| ModelError::Inference(format!("output `{}` is empty", output_name)))
    }
}

impl Predictor for OrtPredictor {
    fn predict(&self, features: &FeatureRow) -> Result<f64, ModelError> {
        let inputs = self.build_inputs(features)?;
        let value = self.run_inference(inputs)?;

        if !value.is_finite() {
            return Err(ModelError::Inference(format!(
                "model returned a non-finite value ({})",
                value
            )));
        }

        tracing::debug!(prediction = value, "Prediction complete");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, kind: InputKind) -> InputSpec {
        InputSpec {
            name: name.to_string(),
            kind,
            rank: 2,
        }
    }

    #[test]
    fn test_integer_fields_widen_to_numeric_inputs() {
        let year = FeatureValue::Int(2020);

        assert_eq!(
            Cell::convert(&spec("year", InputKind::Int64), &year),
            Ok(Cell::I64(2020))
        );
        assert_eq!(
            Cell::convert(&spec("year", InputKind::Int32), &year),
            Ok(Cell::I32(2020))
        );
        assert_eq!(
            Cell::convert(&spec("year", InputKind::Float32), &year),
            Ok(Cell::F32(2020.0))
        );
        assert_eq!(
            Cell::convert(&spec("year", InputKind::Float64), &year),
            Ok(Cell::F64(2020.0))
        );
    }

    #[test]
    fn test_lossy_conversions_are_schema_mismatches() {
        let cases = [
            (spec("engine_size", InputKind::Int64), FeatureValue::Float(3.0)),
            (spec("brand", InputKind::Float32), FeatureValue::Text("Ferrari".into())),
            (spec("year", InputKind::Text), FeatureValue::Int(2020)),
            (spec("mileage", InputKind::Int32), FeatureValue::Int(i64::MAX)),
            (spec("mileage", InputKind::Float32), FeatureValue::Int(16_777_217)),
            (spec("mileage", InputKind::Float64), FeatureValue::Int(i64::MIN)),
        ];

        for (input, value) in cases {
            match Cell::convert(&input, &value) {
                Err(ModelError::SchemaMismatch(message)) => {
                    assert!(message.contains(&input.name), "{}", message)
                }
                other => panic!("expected schema mismatch for {}, got {:?}", input.name, other),
            }
        }
    }

    #[test]
    fn test_type_mismatch_names_the_value() {
        let err = Cell::convert(&spec("year", InputKind::Text), &FeatureValue::Int(2020));
        assert_eq!(
            err,
            Err(ModelError::SchemaMismatch(
                "field `year` is integer 2020 but the model expects string".to_string()
            ))
        );
    }

    #[test]
    fn test_large_integers_that_floats_hold_exactly() {
        assert_eq!(
            Cell::convert(
                &spec("mileage", InputKind::Float32),
                &FeatureValue::Int(16_777_216)
            ),
            Ok(Cell::F32(16_777_216.0))
        );
        assert_eq!(
            Cell::convert(
                &spec("mileage", InputKind::Float64),
                &FeatureValue::Int(16_777_217)
            ),
            Ok(Cell::F64(16_777_217.0))
        );
    }

    #[test]
    fn test_input_rank_from_declared_shape() {
        assert_eq!(input_rank("year", &[-1]), Ok(1));
        assert_eq!(input_rank("year", &[1]), Ok(1));
        assert_eq!(input_rank("year", &[-1, 1]), Ok(2));
        assert_eq!(input_rank("year", &[1, -1]), Ok(2));

        for shape in [&[][..], &[-1, 3][..], &[4][..], &[-1, 1, 1][..]] {
            match input_rank("year", shape) {
                Err(ModelError::IncompatibleSchema(message)) => {
                    assert!(message.contains("`year`"), "{}", message)
                }
                other => panic!("expected incompatible schema for {:?}, got {:?}", shape, other),
            }
        }
    }

    #[test]
    fn test_input_kind_from_element_type() {
        assert_eq!(
            InputKind::from_element_type(TensorElementType::String),
            Some(InputKind::Text)
        );
        assert_eq!(InputKind::from_element_type(TensorElementType::Bool), None);
    }

    #[test]
    fn test_empty_bytes_fail_before_session_creation() {
        let result = OrtPredictor::from_bytes(&[], &ModelConfig::default());
        assert!(matches!(result, Err(ModelError::Deserialization(_))));
    }

    #[test]
    fn test_schema_display() {
        let schema = ModelSchema {
            inputs: vec![spec("year", InputKind::Int64), spec("brand", InputKind::Text)],
            output: OutputSpec {
                name: "variable".to_string(),
                kind: OutputKind::Float32,
            },
        };
        assert_eq!(schema.to_string(), "(year:int64, brand:string) -> variable");
    }
}
