use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::Module;
use crate::schemas::datetime::deserialize_option_datetime;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    #[validate(length(min = 1, message = "class_offering_id must not be empty"))]
    pub(crate) class_offering_id: String,
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 100, message = "kind must not be empty"))]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "startTime", deserialize_with = "deserialize_option_datetime")]
    pub(crate) start_time: Option<PrimitiveDateTime>,
    #[serde(default, alias = "endTime", deserialize_with = "deserialize_option_datetime")]
    pub(crate) end_time: Option<PrimitiveDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "kind must not be empty"))]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "startTime", deserialize_with = "deserialize_option_datetime")]
    pub(crate) start_time: Option<PrimitiveDateTime>,
    #[serde(default, alias = "endTime", deserialize_with = "deserialize_option_datetime")]
    pub(crate) end_time: Option<PrimitiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleQuery {
    #[serde(default)]
    pub(crate) class_offering_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) class_offering_id: String,
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) description: Option<String>,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Module> for ModuleResponse {
    fn from(module: Module) -> Self {
        Self {
            id: module.id,
            class_offering_id: module.class_offering_id,
            name: module.name,
            kind: module.kind,
            description: module.description,
            start_time: format_optional(module.start_time),
            end_time: format_optional(module.end_time),
            created_by: module.created_by,
            created_at: format_primitive(module.created_at),
            updated_at: format_primitive(module.updated_at),
        }
    }
}
