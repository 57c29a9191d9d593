//! Typed data formats for shader input/output slots
//!
//! A [`DataFormat`] pairs a scalar element type with an arity of 1 to 4.
//! Shader buffers hold one 32-bit word per component regardless of the
//! element type; the byte width only matters for packed vertex attribute
//! data coming from the caller.

use crate::error::{RasterError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int,
    Float,
    Double,
    Byte,
    Short,
}

impl ElementType {
    /// Width of one packed component in bytes
    pub const fn width(self) -> usize {
        match self {
            ElementType::Int | ElementType::Float => 4,
            ElementType::Double => 8,
            ElementType::Byte => 1,
            ElementType::Short => 2,
        }
    }

    /// Type the software pipeline stores this element as once it has been
    /// unpacked into 32-bit words
    pub const fn internal(self) -> ElementType {
        match self {
            ElementType::Int | ElementType::Byte | ElementType::Short => ElementType::Int,
            ElementType::Float | ElementType::Double => ElementType::Float,
        }
    }
}

/// Element type and component count of one slot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataFormat {
    element: ElementType,
    arity: u8,
}

impl DataFormat {
    pub const FLOAT: DataFormat = DataFormat::new_unchecked(ElementType::Float, 1);
    pub const VEC2: DataFormat = DataFormat::new_unchecked(ElementType::Float, 2);
    pub const VEC3: DataFormat = DataFormat::new_unchecked(ElementType::Float, 3);
    pub const VEC4: DataFormat = DataFormat::new_unchecked(ElementType::Float, 4);
    pub const INT: DataFormat = DataFormat::new_unchecked(ElementType::Int, 1);
    pub const IVEC2: DataFormat = DataFormat::new_unchecked(ElementType::Int, 2);
    pub const IVEC3: DataFormat = DataFormat::new_unchecked(ElementType::Int, 3);
    pub const IVEC4: DataFormat = DataFormat::new_unchecked(ElementType::Int, 4);

    const fn new_unchecked(element: ElementType, arity: u8) -> Self {
        Self { element, arity }
    }

    pub fn new(element: ElementType, arity: u8) -> Result<Self> {
        if !(1..=4).contains(&arity) {
            return Err(RasterError::InvalidArity(arity));
        }
        Ok(Self { element, arity })
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn arity(&self) -> usize {
        self.arity as usize
    }

    /// Packed size of one value: arity × element width
    pub fn byte_size(&self) -> usize {
        self.arity() * self.element.width()
    }

    /// Same arity, stored as the pipeline's internal int/float word type
    pub fn internal(&self) -> DataFormat {
        Self::new_unchecked(self.element.internal(), self.arity)
    }

    pub fn is_float(&self) -> bool {
        self.element == ElementType::Float
    }

    /// Canonical Rust spelling of the value, for diagnostics only
    pub fn native_type_name(&self) -> &'static str {
        use ElementType::*;
        match (self.element, self.arity) {
            (Int, 1) => "i32",
            (Int, 2) => "[i32; 2]",
            (Int, 3) => "[i32; 3]",
            (Int, 4) => "[i32; 4]",
            (Float, 1) => "f32",
            (Float, 2) => "[f32; 2]",
            (Float, 3) => "[f32; 3]",
            (Float, 4) => "[f32; 4]",
            (Double, 1) => "f64",
            (Double, 2) => "[f64; 2]",
            (Double, 3) => "[f64; 3]",
            (Double, 4) => "[f64; 4]",
            (Byte, 1) => "i8",
            (Byte, 2) => "[i8; 2]",
            (Byte, 3) => "[i8; 3]",
            (Byte, 4) => "[i8; 4]",
            (Short, 1) => "i16",
            (Short, 2) => "[i16; 2]",
            (Short, 3) => "[i16; 3]",
            (Short, 4) => "[i16; 4]",
            _ => "?",
        }
    }
}

impl fmt::Debug for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.native_type_name())
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {:?}", self.arity, self.element)
    }
}
