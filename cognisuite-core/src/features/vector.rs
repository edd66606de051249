//! Vector graphics studio.
//!
//! Streams generated SVG markup, EPS PostScript, or ReportLab Python (for
//! PDF) together with the backend's validation verdict.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::consumer::{PayloadMerger, Status, StreamingConsumer, nested_or_top};
use crate::error::CogniError;
use crate::execution::{StreamRequest, Transport};
use crate::streaming::StreamHandle;

pub const SUPPORTED_FORMATS_PATH: &str = "/api/supported-formats";
pub const VALIDATE_PATH: &str = "/api/validate-vector";

/// File name used by [`VectorStudio::save`] when given a directory.
pub const DEFAULT_FILE_STEM: &str = "generated_vector";

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CogniError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(CogniError::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum!(VectorFormat { Svg => "svg", Eps => "eps", Pdf => "pdf" });
wire_enum!(Style {
    Modern => "modern",
    Minimalist => "minimalist",
    Detailed => "detailed",
    Artistic => "artistic"
});
wire_enum!(Complexity { Simple => "simple", Medium => "medium", Complex => "complex" });
wire_enum!(ColorScheme {
    Default => "default",
    Monochrome => "monochrome",
    Vibrant => "vibrant",
    Pastel => "pastel"
});

impl Default for VectorFormat {
    fn default() -> Self {
        VectorFormat::Svg
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::Modern
    }
}

impl Default for Complexity {
    fn default() -> Self {
        Complexity::Medium
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme::Default
    }
}

impl VectorFormat {
    pub fn endpoint(self) -> &'static str {
        match self {
            VectorFormat::Svg => "/api/generate-svg",
            VectorFormat::Eps => "/api/generate-eps",
            VectorFormat::Pdf => "/api/generate-pdf",
        }
    }

    /// PDF output is ReportLab source, hence `py`.
    pub fn file_extension(self) -> &'static str {
        match self {
            VectorFormat::Svg => "svg",
            VectorFormat::Eps => "eps",
            VectorFormat::Pdf => "py",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            VectorFormat::Svg => "image/svg+xml",
            VectorFormat::Eps => "application/postscript",
            VectorFormat::Pdf => "text/x-python",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorRequest {
    pub prompt: String,
    pub format: VectorFormat,
    pub style: Style,
    pub complexity: Complexity,
    pub color_scheme: ColorScheme,
}

impl VectorRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: VectorFormat::default(),
            style: Style::default(),
            complexity: Complexity::default(),
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn with_format(mut self, format: VectorFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.color_scheme = color_scheme;
        self
    }

    /// Complexity and colour scheme only apply to SVG and are omitted otherwise.
    pub fn to_stream_request(&self) -> StreamRequest {
        let request = StreamRequest::new(self.format.endpoint())
            .param("prompt", &self.prompt)
            .param("style", self.style);
        match self.format {
            VectorFormat::Svg => request
                .param("complexity", self.complexity)
                .param("color_scheme", self.color_scheme),
            VectorFormat::Eps | VectorFormat::Pdf => request,
        }
    }
}

/// Accumulated generation result for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorOutput {
    pub format: VectorFormat,
    pub code: String,
    pub is_valid: bool,
    pub validation_errors: Vec<String>,
    pub generation_attempts: u32,
    pub generation_metadata: Map<String, Value>,
}

impl VectorOutput {
    pub fn new(format: VectorFormat) -> Self {
        Self {
            format,
            code: String::new(),
            is_valid: false,
            validation_errors: Vec::new(),
            generation_attempts: 0,
            generation_metadata: Map::new(),
        }
    }
}

impl Default for VectorOutput {
    fn default() -> Self {
        Self::new(VectorFormat::default())
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

impl PayloadMerger for VectorOutput {
    fn merge(&mut self, payload: &Value) {
        if let Some(output) = payload.get("output").filter(|o| o.is_object()) {
            let svg = match self.format {
                VectorFormat::Svg => output.get("svg_code").and_then(Value::as_str),
                _ => None,
            };
            let code = svg
                .filter(|s| !s.is_empty())
                .or_else(|| output.get("vector_code").and_then(Value::as_str))
                .filter(|s| !s.is_empty());
            if let Some(code) = code {
                self.code = code.to_string();
            }

            self.is_valid = nested_or_top(payload, "is_valid")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            self.validation_errors = string_list(nested_or_top(payload, "validation_errors"));
            self.generation_attempts = nested_or_top(payload, "generation_attempts")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(1);
            self.generation_metadata = output
                .get("generation_metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
        }

        if let Some(error) = crate::consumer::payload_error(payload) {
            self.validation_errors = vec![error];
            self.is_valid = false;
        }
    }

    fn on_failure(&mut self, message: &str) {
        self.validation_errors = vec![message.to_string()];
        self.is_valid = false;
    }

    fn server_error_message(&self) -> &'static str {
        "An error occurred during generation"
    }

    fn connect_error_message(&self) -> &'static str {
        "Connection error occurred. Please try again."
    }
}

/// Option lists advertised by `GET /api/supported-formats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SupportedFormats {
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub complexity_levels: Vec<String>,
    #[serde(default)]
    pub color_schemes: Vec<String>,
}

/// Verdict from `GET /api/validate-vector`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct VectorStudio {
    consumer: StreamingConsumer<VectorOutput>,
}

impl VectorStudio {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            consumer: StreamingConsumer::new(transport, "vector", VectorOutput::default()),
        }
    }

    pub async fn start_generate(
        &mut self,
        request: &VectorRequest,
    ) -> Result<StreamHandle, CogniError> {
        if request.prompt.trim().is_empty() {
            return Err(CogniError::invalid_input("prompt must not be empty"));
        }
        let format = request.format;
        self.consumer
            .start(request.to_stream_request(), move |state| {
                *state = VectorOutput::new(format)
            })
            .await
    }

    pub async fn generate(&mut self, request: &VectorRequest) -> Result<Status, CogniError> {
        self.start_generate(request).await?;
        Ok(self.consumer.drive().await)
    }

    pub fn cancel(&mut self) -> bool {
        self.consumer.cancel()
    }

    pub fn output(&self) -> &VectorOutput {
        self.consumer.state()
    }

    pub fn status(&self) -> Status {
        self.consumer.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.consumer.view().error_message()
    }

    pub fn consumer_mut(&mut self) -> &mut StreamingConsumer<VectorOutput> {
        &mut self.consumer
    }

    /// Write the generated code to `path`.
    ///
    /// A directory gets `generated_vector.<ext>` inside it. Returns the
    /// path written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf, CogniError> {
        let output = self.output();
        if output.code.is_empty() {
            return Err(CogniError::invalid_input("nothing generated yet"));
        }

        let path = path.as_ref();
        let target = if tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            path.join(format!(
                "{DEFAULT_FILE_STEM}.{}",
                output.format.file_extension()
            ))
        } else {
            path.to_path_buf()
        };

        tokio::fs::write(&target, output.code.as_bytes()).await?;
        tracing::info!(target: "cognisuite::vector", path=%target.display(), mime=output.format.mime_type(), "vector code saved");
        Ok(target)
    }

    pub async fn supported_formats(&self) -> Result<SupportedFormats, CogniError> {
        let body = self
            .consumer
            .transport()
            .get_json("vector formats", &StreamRequest::new(SUPPORTED_FORMATS_PATH))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn validate(
        &self,
        code: &str,
        format: VectorFormat,
    ) -> Result<ValidationReport, CogniError> {
        let request = StreamRequest::new(VALIDATE_PATH)
            .param("code", code)
            .param("format", format);
        let body = self
            .consumer
            .transport()
            .get_json("vector validate", &request)
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}
