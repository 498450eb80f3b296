//! Textual parse/format rules for bindable value types.

use crate::error::ValueError;

/// A value type that can be bound in a [`Registry`](crate::Registry).
///
/// Each implementation supplies its own textual grammar; the registry and
/// the file store never branch on the concrete type. The trait is open:
/// user-defined types (typically enumerations backed by a keyword set)
/// participate by implementing it.
///
/// # Round-trip
///
/// `parse_text` must accept everything `format_text` produces for the same
/// type, so a saved file loads back to equal values.
pub trait ConfigValue: Clone + Send + Sync + 'static {
    /// Parse a value from its textual form.
    ///
    /// # Errors
    /// Returns [`ValueError`] if the text is not valid for this type.
    fn parse_text(text: &str) -> Result<Self, ValueError>
    where
        Self: Sized;

    /// Format the value in the same grammar `parse_text` accepts.
    fn format_text(&self) -> String;
}

// Numeric parsers trim surrounding whitespace, mirroring stream-extraction
// tolerance in hand-edited files ("port = 8080 ").
macro_rules! impl_config_value_via_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                fn parse_text(text: &str) -> Result<Self, ValueError> {
                    text.trim()
                        .parse()
                        .map_err(|_| ValueError::new::<$ty>(text))
                }

                fn format_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_config_value_via_from_str!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl ConfigValue for bool {
    fn parse_text(text: &str) -> Result<Self, ValueError> {
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ValueError::new::<bool>(text)),
        }
    }

    fn format_text(&self) -> String {
        self.to_string()
    }
}

impl ConfigValue for String {
    fn parse_text(text: &str) -> Result<Self, ValueError> {
        // Verbatim: embedded and trailing whitespace are part of the value.
        Ok(text.to_string())
    }

    fn format_text(&self) -> String {
        self.clone()
    }
}
