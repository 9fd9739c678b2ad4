// Typed cell conversion for table rows.
// Strict mode rejects malformed text; lenient mode mimics stream extraction:
// read the longest usable prefix and fall back to the type's zero value.
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConversionMode {
    #[default]
    Strict,
    Lenient,
}

/// A type that can be read out of a single cell's text.
pub trait FromCell: Sized + Default {
    const TYPE_NAME: &'static str;

    /// Parse the whole (trimmed) cell.
    fn parse_cell(text: &str) -> Option<Self>;

    /// Parse the longest leading portion of the cell, after leading whitespace.
    fn parse_prefix(text: &str) -> Option<Self>;
}

pub fn convert<T: FromCell>(text: &str, mode: ConversionMode) -> Result<T, Error> {
    match mode {
        ConversionMode::Strict => T::parse_cell(text.trim()).ok_or_else(|| {
            Error::new(ErrorKind::Conversion)
                .with_message(format!("cannot read {:?} as {}", text, T::TYPE_NAME))
        }),
        ConversionMode::Lenient => Ok(T::parse_prefix(text.trim_start()).unwrap_or_default()),
    }
}

impl FromCell for String {
    const TYPE_NAME: &'static str = "string";

    fn parse_cell(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn parse_prefix(text: &str) -> Option<Self> {
        text.split_whitespace().next().map(str::to_string)
    }
}

impl FromCell for bool {
    const TYPE_NAME: &'static str = "bool";

    fn parse_cell(text: &str) -> Option<Self> {
        match text {
            "1" => Some(true),
            "0" => Some(false),
            _ if text.eq_ignore_ascii_case("true") => Some(true),
            _ if text.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    fn parse_prefix(text: &str) -> Option<Self> {
        match text.as_bytes().first() {
            Some(b'1') => Some(true),
            Some(b'0') => Some(false),
            _ => None,
        }
    }
}

fn signed_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 { 0 } else { end + digits }
}

fn unsigned_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'+') {
        end = 1;
    }
    let digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 { 0 } else { end + digits }
}

// Candidate float characters; the longest parseable prefix wins.
fn float_prefix<T: std::str::FromStr>(text: &str) -> Option<T> {
    let candidate = text
        .bytes()
        .take_while(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        .count();
    (1..=candidate)
        .rev()
        .find_map(|len| text[..len].parse::<T>().ok())
}

macro_rules! signed_cell {
    ($($ty:ty),*) => {$(
        impl FromCell for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn parse_cell(text: &str) -> Option<Self> {
                text.parse().ok()
            }

            fn parse_prefix(text: &str) -> Option<Self> {
                text[..signed_prefix_len(text)].parse().ok()
            }
        }
    )*};
}

macro_rules! unsigned_cell {
    ($($ty:ty),*) => {$(
        impl FromCell for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn parse_cell(text: &str) -> Option<Self> {
                text.parse().ok()
            }

            fn parse_prefix(text: &str) -> Option<Self> {
                text[..unsigned_prefix_len(text)].parse().ok()
            }
        }
    )*};
}

macro_rules! float_cell {
    ($($ty:ty),*) => {$(
        impl FromCell for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn parse_cell(text: &str) -> Option<Self> {
                let value: $ty = text.parse().ok()?;
                value.is_finite().then_some(value)
            }

            fn parse_prefix(text: &str) -> Option<Self> {
                float_prefix::<$ty>(text).filter(|value| value.is_finite())
            }
        }
    )*};
}

signed_cell!(i32, i64);
unsigned_cell!(u32, u64, usize);
float_cell!(f32, f64);
