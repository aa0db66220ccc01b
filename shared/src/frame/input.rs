use lumen_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

/// Stage of a pointer or touch contact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputPhase {
    Began,
    Moved,
    Ended,
}

impl Serde for InputPhase {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let byte: u8 = match self {
            InputPhase::Began => 0,
            InputPhase::Moved => 1,
            InputPhase::Ended => 2,
        };
        byte.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(InputPhase::Began),
            1 => Ok(InputPhase::Moved),
            2 => Ok(InputPhase::Ended),
            _ => Err(SerdeErr::InvalidValue {
                type_name: "InputPhase",
            }),
        }
    }

    fn byte_length(&self) -> usize {
        1
    }
}

/// Raw pointer input forwarded from a display to the server. Mouse input uses
/// touch id -1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub phase: InputPhase,
    pub touch_id: i32,
    pub x: f32,
    pub y: f32,
}

impl InputEvent {
    pub const MOUSE_ID: i32 = -1;

    pub fn new(phase: InputPhase, touch_id: i32, x: f32, y: f32) -> Self {
        Self {
            phase,
            touch_id,
            x,
            y,
        }
    }

    pub fn mouse(phase: InputPhase, x: f32, y: f32) -> Self {
        Self::new(phase, Self::MOUSE_ID, x, y)
    }
}

impl Serde for InputEvent {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.phase.ser(writer);
        self.touch_id.ser(writer);
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            phase: InputPhase::de(reader)?,
            touch_id: i32::de(reader)?,
            x: f32::de(reader)?,
            y: f32::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        1 + 4 + 4 + 4
    }
}
