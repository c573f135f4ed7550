use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub class_name: String,
    pub teacher: String,
}

impl Class {
    /// The editable fields, as sent on create and update
    pub fn payload(&self) -> ClassPayload {
        ClassPayload {
            class_name: self.class_name.clone(),
            teacher: self.teacher.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassPayload {
    pub class_name: String,
    pub teacher: String,
}
