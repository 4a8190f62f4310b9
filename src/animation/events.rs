use std::fmt::Write as _;

use serde::Deserialize;

/// A named callback fired by the runtime at a frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallbackPoint {
    pub name: String,
    pub frame: u32,
}

/// Spawns `entity` attached to `attach` at a frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateEntity {
    pub frame: u32,
    pub entity: String,
    pub attach: String,
}

/// Events carried in the animation trailer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtraData {
    pub callback_points: Vec<CallbackPoint>,
    pub create_entities: Vec<CreateEntity>,
}

impl ExtraData {
    pub fn callback(&mut self, name: impl Into<String>, frame: u32) -> &mut Self {
        self.callback_points.push(CallbackPoint {
            name: name.into(),
            frame,
        });
        self
    }

    pub fn entity(&mut self, frame: u32, entity: impl Into<String>, attach: impl Into<String>) -> &mut Self {
        self.create_entities.push(CreateEntity {
            frame,
            entity: entity.into(),
            attach: attach.into(),
        });
        self
    }

    /// Renders the events as runtime script blocks, callbacks first.
    #[must_use]
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        for cb in &self.callback_points {
            let _ = write!(
                script,
                "CallbackPoint\n{{\n\tname = \"{}\"\n\tframe = {}\n}}\n",
                cb.name, cb.frame
            );
        }
        for ce in &self.create_entities {
            let _ = write!(
                script,
                "CreateEntity\n{{\n\tframe = {}\n\tentity = \"{}\"\n\tattach = \"{}\"\n}}\n",
                ce.frame, ce.entity, ce.attach
            );
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lists_callbacks_before_entities() {
        let mut extra = ExtraData::default();
        extra.entity(4, "fx/spark.ent", "hand").callback("step", 12);

        assert_eq!(
            extra.to_script(),
            "CallbackPoint\n{\n\tname = \"step\"\n\tframe = 12\n}\n\
             CreateEntity\n{\n\tframe = 4\n\tentity = \"fx/spark.ent\"\n\tattach = \"hand\"\n}\n"
        );
    }
}
