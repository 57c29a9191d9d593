//! Slot-segmented word buffer used for every shader input and output
//!
//! A [`ShaderBuffer`] is a flat `Vec<u32>` divided into slots, one per
//! [`DataFormat`], each `arity` words wide. A cursor walks the slots in
//! order: every typed `read_*`/`write_*` call consumes the current slot and
//! advances to the next one, so a shader reads its inputs and writes its
//! outputs in declaration order without naming them.
//!
//! The buffers are scratch storage. The rasterizer allocates a handful per
//! program and reuses them for every vertex and fragment, so nothing here
//! allocates after construction.
//!
//! # Conversions
//!
//! Words hold raw bits. Float slots store `f32` bits, int slots store `i32`
//! bits. Typed accessors convert as follows:
//!
//! | slot  | accessor | write                 | read                    |
//! |-------|----------|-----------------------|-------------------------|
//! | int   | int      | identity              | identity                |
//! | int   | float    | store the `f32` bits  | reinterpret the bits    |
//! | float | int      | numeric `i32 as f32`  | numeric `f32 as i32`    |
//! | float | float    | identity              | identity                |
//!
//! Byte, Short and Double slots cannot be accessed through typed accessors;
//! vertex attribute conversion unpacks them into int/float slots first.
//!
//! # Arity mismatch
//!
//! Accessing more components than the slot declares reads zeros and drops
//! the extra writes. Accessing fewer still advances past the whole slot.
//! Reads past the final slot return zeros and writes are dropped.

use crate::error::{RasterError, Result};
use crate::format::{DataFormat, ElementType};
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct ShaderBuffer {
    words: Vec<u32>,
    formats: Vec<DataFormat>,
    /// Start word of each slot plus one trailing entry holding the total length
    offsets: Vec<usize>,
    cursor: usize,
    slot: usize,
}

impl ShaderBuffer {
    pub fn new(formats: &[DataFormat]) -> Self {
        let mut buffer = Self {
            words: Vec::new(),
            formats: Vec::new(),
            offsets: Vec::new(),
            cursor: 0,
            slot: 0,
        };
        buffer.set_formats(formats);
        buffer
    }

    /// Re-segment the buffer, reusing its allocation where possible
    ///
    /// Contents are zeroed and the cursor rewound.
    pub fn set_formats(&mut self, formats: &[DataFormat]) {
        self.formats.clear();
        self.formats.extend_from_slice(formats);
        self.offsets.clear();
        let mut total = 0;
        for format in formats {
            self.offsets.push(total);
            total += format.arity();
        }
        self.offsets.push(total);
        self.words.clear();
        self.words.resize(total, 0);
        self.cursor = 0;
        self.slot = 0;
    }

    pub fn formats(&self) -> &[DataFormat] {
        &self.formats
    }

    pub fn slot_count(&self) -> usize {
        self.formats.len()
    }

    /// Capacity in words: the sum of all slot arities
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word range covered by slot `index`
    pub fn slot_range(&self, index: usize) -> Range<usize> {
        self.offsets[index]..self.offsets[index + 1]
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Index of the slot the cursor is in
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Format of the slot the cursor is in, `None` past the final slot
    pub fn current_format(&self) -> Option<DataFormat> {
        self.formats.get(self.slot).copied()
    }

    /// Rewind for a new write phase
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.slot = 0;
    }

    /// End the write phase and rewind for reading; data is left untouched
    pub fn flip(&mut self) {
        self.cursor = 0;
        self.slot = 0;
    }

    /// Skip the rest of the current slot and move to the next one
    pub fn advance(&mut self) {
        if self.slot < self.formats.len() {
            self.slot += 1;
            self.cursor = self.offsets[self.slot];
        }
    }

    /// Copy contents from a buffer with the same layout; cursor is rewound
    pub fn copy_from(&mut self, other: &ShaderBuffer) {
        debug_assert_eq!(self.formats, other.formats);
        self.words.copy_from_slice(&other.words);
        self.cursor = 0;
        self.slot = 0;
    }

    /// Four floats starting at `word`, used for the position slot
    #[inline]
    pub fn vec4_at(&self, word: usize) -> [f32; 4] {
        [
            f32::from_bits(self.words[word]),
            f32::from_bits(self.words[word + 1]),
            f32::from_bits(self.words[word + 2]),
            f32::from_bits(self.words[word + 3]),
        ]
    }

    #[inline]
    pub fn set_vec4_at(&mut self, word: usize, v: [f32; 4]) {
        for (dst, src) in self.words[word..word + 4].iter_mut().zip(v) {
            *dst = src.to_bits();
        }
    }

    // -- raw access -------------------------------------------------------

    /// Read one word without conversion; 0 past the end
    #[inline]
    pub fn read_raw(&mut self) -> u32 {
        match self.words.get(self.cursor).copied() {
            Some(word) => {
                self.cursor += 1;
                self.sync_slot();
                word
            }
            None => 0,
        }
    }

    /// Write one word without conversion; dropped past the end
    #[inline]
    pub fn write_raw(&mut self, word: u32) {
        if let Some(dst) = self.words.get_mut(self.cursor) {
            *dst = word;
            self.cursor += 1;
            self.sync_slot();
        }
    }

    #[inline]
    fn sync_slot(&mut self) {
        while self.slot < self.formats.len() && self.cursor >= self.offsets[self.slot + 1] {
            self.slot += 1;
        }
    }

    // -- typed access -----------------------------------------------------

    fn checked_element(&self, accessor: &'static str) -> Result<Option<ElementType>> {
        match self.current_format() {
            None => Ok(None),
            Some(format) => match format.element() {
                ElementType::Int | ElementType::Float => Ok(Some(format.element())),
                element => Err(RasterError::UnsupportedFormat { element, accessor }),
            },
        }
    }

    /// Take up to `N` words from the current slot, zero-filling past its arity
    fn take<const N: usize>(&mut self) -> [u32; N] {
        let mut out = [0u32; N];
        let range = self.slot_range(self.slot);
        let available = range.len().min(N);
        out[..available].copy_from_slice(&self.words[range.start..range.start + available]);
        self.advance();
        out
    }

    /// Store up to the slot's arity of `values`, dropping the rest
    fn put<const N: usize>(&mut self, values: [u32; N]) {
        let range = self.slot_range(self.slot);
        let count = range.len().min(N);
        self.words[range.start..range.start + count].copy_from_slice(&values[..count]);
        self.advance();
    }

    /// Read `N` floats from the current slot
    pub fn read_floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        if self.checked_element("float")?.is_none() {
            return Ok([0.0; N]);
        }
        // Float slots hold f32 bits; int slots are reinterpreted, not converted
        Ok(self.take::<N>().map(f32::from_bits))
    }

    /// Read `N` ints from the current slot
    pub fn read_ints<const N: usize>(&mut self) -> Result<[i32; N]> {
        let Some(element) = self.checked_element("int")? else {
            return Ok([0; N]);
        };
        let words = self.take::<N>();
        Ok(match element {
            ElementType::Float => words.map(|w| f32::from_bits(w) as i32),
            _ => words.map(|w| w as i32),
        })
    }

    /// Write `N` floats into the current slot
    pub fn write_floats<const N: usize>(&mut self, values: [f32; N]) -> Result<()> {
        if self.checked_element("float")?.is_none() {
            return Ok(());
        }
        self.put(values.map(f32::to_bits));
        Ok(())
    }

    /// Write `N` ints into the current slot
    pub fn write_ints<const N: usize>(&mut self, values: [i32; N]) -> Result<()> {
        let Some(element) = self.checked_element("int")? else {
            return Ok(());
        };
        let words = match element {
            ElementType::Float => values.map(|v| (v as f32).to_bits()),
            _ => values.map(|v| v as u32),
        };
        self.put(words);
        Ok(())
    }

    pub fn read_float(&mut self) -> Result<f32> {
        Ok(self.read_floats::<1>()?[0])
    }

    pub fn read_vec2(&mut self) -> Result<[f32; 2]> {
        self.read_floats()
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        self.read_floats()
    }

    pub fn read_vec4(&mut self) -> Result<[f32; 4]> {
        self.read_floats()
    }

    pub fn read_int(&mut self) -> Result<i32> {
        Ok(self.read_ints::<1>()?[0])
    }

    pub fn read_ivec2(&mut self) -> Result<[i32; 2]> {
        self.read_ints()
    }

    pub fn read_ivec3(&mut self) -> Result<[i32; 3]> {
        self.read_ints()
    }

    pub fn read_ivec4(&mut self) -> Result<[i32; 4]> {
        self.read_ints()
    }

    pub fn write_float(&mut self, v: f32) -> Result<()> {
        self.write_floats([v])
    }

    pub fn write_vec2(&mut self, v: [f32; 2]) -> Result<()> {
        self.write_floats(v)
    }

    pub fn write_vec3(&mut self, v: [f32; 3]) -> Result<()> {
        self.write_floats(v)
    }

    pub fn write_vec4(&mut self, v: [f32; 4]) -> Result<()> {
        self.write_floats(v)
    }

    pub fn write_int(&mut self, v: i32) -> Result<()> {
        self.write_ints([v])
    }

    pub fn write_ivec2(&mut self, v: [i32; 2]) -> Result<()> {
        self.write_ints(v)
    }

    pub fn write_ivec3(&mut self, v: [i32; 3]) -> Result<()> {
        self.write_ints(v)
    }

    pub fn write_ivec4(&mut self, v: [i32; 4]) -> Result<()> {
        self.write_ints(v)
    }
}
