//! Default response-body serialization.
//!
//! [`Context::write`](crate::Context::write) hands its argument to the
//! context's [`DataWriter`]. The default writer renders:
//!
//! - bytes and strings verbatim
//! - [`Data::Empty`] as nothing
//! - any other value in its plain text form (`123`, `true`, JSON for objects)
//!
//! Replace it per router with [`crate::Mux::set_data_writer`].

use serde_json::Value;

use crate::error::Result;
use crate::response::Response;

/// Value handed to a [`DataWriter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Writes nothing
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    /// Any other value, rendered through its text representation
    Value(Value),
}

impl From<()> for Data {
    fn from(_: ()) -> Self {
        Data::Empty
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::Text(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::Text(value)
    }
}

impl From<&[u8]> for Data {
    fn from(value: &[u8]) -> Self {
        Data::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::Bytes(value)
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Data::Value(value)
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        value.map_or(Data::Empty, Into::into)
    }
}

macro_rules! data_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Data {
                fn from(value: $ty) -> Self {
                    Data::Value(Value::from(value))
                }
            }
        )*
    };
}

data_from_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool);

/// Writes handler data into a response body.
pub trait DataWriter: Send + Sync {
    fn write(&self, res: &mut Response, data: Data) -> Result<()>;
}

/// Writer used unless a router installs its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDataWriter;

impl DataWriter for DefaultDataWriter {
    fn write(&self, res: &mut Response, data: Data) -> Result<()> {
        match data {
            Data::Empty | Data::Value(Value::Null) => {}
            Data::Bytes(bytes) => res.write_bytes(&bytes),
            Data::Text(text) => res.write_str(&text),
            Data::Value(Value::String(text)) => res.write_str(&text),
            Data::Value(other) => res.write_str(&other.to_string()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(data: impl Into<Data>) -> String {
        let mut res = Response::new();
        DefaultDataWriter.write(&mut res, data.into()).unwrap();
        res.body_string()
    }

    #[test]
    fn test_default_writer_scalars() {
        assert_eq!(render(123), "123");
        assert_eq!(render(-7i64), "-7");
        assert_eq!(render(true), "true");
        assert_eq!(render(1.5), "1.5");
    }

    #[test]
    fn test_default_writer_json_values() {
        assert_eq!(render(json!("plain")), "plain");
        assert_eq!(render(json!(null)), "");
        assert_eq!(render(json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(render(None::<String>), "");
        assert_eq!(render(Some("x")), "x");
    }
}
