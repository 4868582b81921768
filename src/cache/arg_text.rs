//! Argument Text Module
//!
//! Renders memoized call arguments as text through serde.
//!
//! Unlike JSON, the rendering keeps every value distinct that a caller
//! could tell apart: `NaN`, `inf` and `-inf` are written as such rather than
//! collapsing into `null`, `None` differs from `Some(())`, and map keys may be
//! any serializable value.

use std::fmt::Display;

use serde::ser::{self, Serialize};
use thiserror::Error;

// == Render Error ==
/// Raised when an argument's `Serialize` impl reports a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RenderError(String);

impl ser::Error for RenderError {
    fn custom<T: Display>(msg: T) -> Self {
        RenderError(msg.to_string())
    }
}

/// Renders `args` as text.
///
/// Tuples render positionally, `(a, b)` as `("a", 1)`; strings are quoted
/// and escaped so their content cannot be mistaken for separators.
pub fn render<A>(args: &A) -> Result<String, RenderError>
where
    A: Serialize + ?Sized,
{
    let mut writer = ArgWriter::default();
    args.serialize(&mut writer)?;
    Ok(writer.out)
}

// == Arg Writer ==
#[derive(Debug, Default)]
struct ArgWriter {
    out: String,
    /// One flag per open compound value: no element written yet
    first: Vec<bool>,
}

impl ArgWriter {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn open(&mut self, text: &str) {
        self.out.push_str(text);
        self.first.push(true);
    }

    fn separate(&mut self) {
        if let Some(first) = self.first.last_mut() {
            if !*first {
                self.out.push_str(", ");
            }
            *first = false;
        }
    }

    fn close(&mut self, text: &str) {
        self.first.pop();
        self.out.push_str(text);
    }

    fn element<T>(&mut self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.separate();
        value.serialize(self)
    }

    fn field<T>(&mut self, name: &str, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.separate();
        self.push(name);
        self.push(": ");
        value.serialize(self)
    }
}

impl<'a> ser::Serializer for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<(), RenderError> {
        self.push(if v { "true" } else { "false" });
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), RenderError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<(), RenderError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<(), RenderError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<(), RenderError> {
        self.push(&v.to_string());
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), RenderError> {
        self.push(&v.to_string());
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), RenderError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<(), RenderError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<(), RenderError> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<(), RenderError> {
        self.push(&v.to_string());
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), RenderError> {
        self.push(&v.to_string());
        Ok(())
    }

    // Debug formatting keeps the fraction (`1.0`) and names non-finite values
    fn serialize_f32(self, v: f32) -> Result<(), RenderError> {
        self.push(&format!("{v:?}"));
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<(), RenderError> {
        self.push(&format!("{v:?}"));
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<(), RenderError> {
        self.push(&format!("{v:?}"));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), RenderError> {
        self.push(&format!("{v:?}"));
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), RenderError> {
        self.push(&format!("b{v:?}"));
        Ok(())
    }

    fn serialize_none(self) -> Result<(), RenderError> {
        self.push("None");
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.push("Some(");
        value.serialize(&mut *self)?;
        self.push(")");
        Ok(())
    }

    fn serialize_unit(self) -> Result<(), RenderError> {
        self.push("()");
        Ok(())
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), RenderError> {
        self.push(name);
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), RenderError> {
        self.push(&format!("{name}::{variant}"));
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.push(name);
        self.push("(");
        value.serialize(&mut *self)?;
        self.push(")");
        Ok(())
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.push(&format!("{name}::{variant}("));
        value.serialize(&mut *self)?;
        self.push(")");
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, RenderError> {
        self.open("[");
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, RenderError> {
        self.open("(");
        Ok(self)
    }

    fn serialize_tuple_struct(self, name: &'static str, _len: usize) -> Result<Self, RenderError> {
        self.push(name);
        self.open("(");
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self, RenderError> {
        self.push(&format!("{name}::{variant}"));
        self.open("(");
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, RenderError> {
        self.open("{");
        Ok(self)
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self, RenderError> {
        self.push(name);
        self.open(" { ");
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self, RenderError> {
        self.push(&format!("{name}::{variant}"));
        self.open(" { ");
        Ok(self)
    }
}

impl<'a> ser::SerializeSeq for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close("]");
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close(")");
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close(")");
        Ok(())
    }
}

impl<'a> ser::SerializeTupleVariant for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.element(value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close(")");
        Ok(())
    }
}

impl<'a> ser::SerializeMap for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.element(key)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.push(": ");
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close("}");
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close(" }");
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for &'a mut ArgWriter {
    type Ok = ();
    type Error = RenderError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<(), RenderError> {
        self.close(" }");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Ticker {
        category: String,
        symbol: String,
    }

    #[derive(Serialize)]
    enum Side {
        Buy,
        Limit(f64),
    }

    #[test]
    fn test_render_positional_tuple() {
        assert_eq!(render(&("a", 1)).unwrap(), r#"("a", 1)"#);
        assert_eq!(render(&(1.0f64, 1u8)).unwrap(), "(1.0, 1)");
    }

    #[test]
    fn test_render_non_finite_floats_distinct() {
        let rendered: Vec<String> = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY]
            .iter()
            .map(|v| render(v).unwrap())
            .collect();
        assert_eq!(rendered, ["NaN", "inf", "-inf"]);

        assert_eq!(render(&None::<f64>).unwrap(), "None");
        assert_eq!(render(&Some(f64::NAN)).unwrap(), "Some(NaN)");
    }

    #[test]
    fn test_render_quotes_strings() {
        // One argument containing a separator differs from two arguments
        assert_ne!(render(&("a, b",)).unwrap(), render(&("a", "b")).unwrap());
    }

    #[test]
    fn test_render_struct_and_enum() {
        let ticker = Ticker {
            category: "linear".to_string(),
            symbol: "BTCUSDT".to_string(),
        };
        assert_eq!(
            render(&ticker).unwrap(),
            r#"Ticker { category: "linear", symbol: "BTCUSDT" }"#
        );
        assert_eq!(render(&Side::Buy).unwrap(), "Side::Buy");
        assert_eq!(render(&Side::Limit(2.5)).unwrap(), "Side::Limit(2.5)");
    }

    #[test]
    fn test_render_nested_collections() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), vec![3, 4]);
        map.insert((5, 6), vec![]);
        assert_eq!(render(&map).unwrap(), "{(1, 2): [3, 4], (5, 6): []}");
    }

    #[test]
    fn test_render_reports_custom_errors() {
        struct Refuses;

        impl Serialize for Refuses {
            fn serialize<S: ser::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(ser::Error::custom("not renderable"))
            }
        }

        assert_eq!(
            render(&Refuses).unwrap_err(),
            RenderError("not renderable".to_string())
        );
    }
}
