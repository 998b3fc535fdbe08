use serde::{Deserialize, Serialize};

use super::engine::StyleId;
use super::native::Result;

/// One speaker entry of the engine's metas JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerMeta {
    pub name: String,
    pub styles: Vec<StyleMeta>,
    pub version: String,
    pub speaker_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// One speaking style of a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleMeta {
    pub id: StyleId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub style_type: StyleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleType {
    #[default]
    Talk,
    SingingTeacher,
    FrameDecode,
    Sing,
}

impl SpeakerMeta {
    pub fn parse_list(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Inference devices the ONNX runtime reports as usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportedDevices {
    pub cpu: bool,
    pub cuda: bool,
    pub dml: bool,
}

impl SupportedDevices {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn has_gpu(&self) -> bool {
        self.cuda || self.dml
    }
}
